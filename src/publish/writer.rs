//! Partition artifacts
//!
//! One writer call selects a client's rows, computes its metrics, serializes the
//! artifact and stores it under the partition's deterministic key. Writes are not
//! retried; any storage failure surfaces as [`PublishError::PartitionWrite`].

use super::budget::OperationBudget;
use super::context::JobContext;
use super::layout;
use super::planner::PartitionKey;
use crate::error::{PublishError, PublishResult};
use crate::results::{ResultRow, ResultSet};
use crate::storage::{ObjectStore, StorageError, JSON_CONTENT_TYPE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, info};

/// Aggregates of one partition.
///
/// Sums and averages keep "no value" apart from zero internally; the reported figures
/// substitute 0 so artifacts and manifests never carry null metrics.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PartitionMetrics {
    pub row_count: usize,
    /// Sum of non-null amounts, `None` if every amount was null
    pub amount_total: Option<f64>,
    /// Mean of non-null factors, `None` if every factor was null
    pub factor_average: Option<f64>,
}

impl PartitionMetrics {
    pub fn compute<'a>(results: &ResultSet, rows: impl IntoIterator<Item = &'a ResultRow>) -> Self {
        let mut row_count = 0;
        let mut amount_total: Option<f64> = None;
        let mut factor_sum = 0.0;
        let mut factor_count = 0usize;

        for row in rows {
            row_count += 1;
            if let Some(amount) = results.amount_of(row) {
                *amount_total.get_or_insert(0.0) += amount;
            }
            if let Some(factor) = results.factor_of(row) {
                factor_sum += factor;
                factor_count += 1;
            }
        }

        Self {
            row_count,
            amount_total,
            factor_average: (factor_count > 0).then(|| factor_sum / factor_count as f64),
        }
    }

    /// False when a sum overflowed; such metrics would serialize as null
    pub fn is_finite(&self) -> bool {
        self.amount_total.map_or(true, f64::is_finite)
            && self.factor_average.map_or(true, f64::is_finite)
    }

    pub fn reported_amount_total(&self) -> f64 {
        self.amount_total.unwrap_or(0.0)
    }

    pub fn reported_factor_average(&self) -> f64 {
        self.factor_average.unwrap_or(0.0)
    }
}

/// Metrics as they appear in the artifact document
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportedMetrics {
    pub monto_total: f64,
    pub factor_promedio: f64,
}

impl Serialize for PartitionMetrics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ReportedMetrics {
            monto_total: self.reported_amount_total(),
            factor_promedio: self.reported_factor_average(),
        }
        .serialize(serializer)
    }
}

/// The document stored for one partition
#[derive(Debug, Serialize)]
pub struct PartitionArtifact<'a> {
    pub job_id: &'a str,
    #[serde(rename = "cliente")]
    pub client: &'a PartitionKey,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "total_registros")]
    pub row_count: usize,
    #[serde(rename = "metricas")]
    pub metrics: PartitionMetrics,
    #[serde(rename = "datos")]
    pub rows: Vec<&'a ResultRow>,
}

impl PartitionArtifact<'_> {
    pub fn to_json(&self) -> Result<Vec<u8>, StorageError> {
        serde_json::to_vec(self).map_err(StorageError::serialization)
    }
}

/// Header fields of a stored artifact, as read back by consumers
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArtifactHeader {
    pub job_id: String,
    #[serde(rename = "cliente")]
    pub client: PartitionKey,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "total_registros")]
    pub row_count: usize,
    #[serde(rename = "metricas")]
    pub metrics: ReportedMetrics,
}

/// Outcome of one successful partition write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionSummary {
    #[serde(rename = "cliente")]
    pub client: PartitionKey,
    #[serde(rename = "registros")]
    pub row_count: usize,
    #[serde(rename = "monto_total")]
    pub amount_total: f64,
    /// Storage location of the artifact
    #[serde(rename = "s3_path")]
    pub location: String,
}

/// Writes partition artifacts for one job
pub struct PartitionWriter<'a> {
    store: &'a dyn ObjectStore,
    ctx: &'a JobContext,
    budget: OperationBudget,
}

impl<'a> PartitionWriter<'a> {
    pub fn new(store: &'a dyn ObjectStore, ctx: &'a JobContext) -> Self {
        Self {
            store,
            ctx,
            budget: OperationBudget::unlimited(),
        }
    }

    pub fn with_budget(mut self, budget: OperationBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Select the partition's rows and assemble its artifact
    pub fn build_artifact<'r>(
        &'r self,
        key: &'r PartitionKey,
        results: &'r ResultSet,
    ) -> PartitionArtifact<'r> {
        let rows: Vec<&ResultRow> = results
            .rows()
            .iter()
            .filter(|row| {
                PartitionKey::from_value(results.client_of(row))
                    .map(|k| k == *key)
                    .unwrap_or(false)
            })
            .collect();
        let metrics = PartitionMetrics::compute(results, rows.iter().copied());

        PartitionArtifact {
            job_id: self.ctx.job_id(),
            client: key,
            timestamp: self.ctx.now(),
            row_count: rows.len(),
            metrics,
            rows,
        }
    }

    /// Write one partition and report its summary
    pub async fn write(
        &self,
        key: &PartitionKey,
        results: &ResultSet,
    ) -> PublishResult<PartitionSummary> {
        let storage_key = layout::partition_key(self.ctx.job_id(), key.as_str());
        let wrap = |source: StorageError| PublishError::PartitionWrite {
            client: key.to_string(),
            key: storage_key.clone(),
            source,
        };

        let artifact = self.build_artifact(key, results);
        if !artifact.metrics.is_finite() {
            return Err(PublishError::validation(format!(
                "metrics of client {} overflow: {:?}",
                key, artifact.metrics
            )));
        }
        let body = artifact.to_json().map_err(wrap)?;
        debug!(
            "Writing partition {} ({} rows, {} bytes) to {}",
            key,
            artifact.row_count,
            body.len(),
            storage_key
        );

        self.budget
            .run(self.store.put_object(&storage_key, body, JSON_CONTENT_TYPE))
            .await
            .map_err(wrap)?;

        let summary = PartitionSummary {
            client: key.clone(),
            row_count: artifact.row_count,
            amount_total: artifact.metrics.reported_amount_total(),
            location: self.store.location(&storage_key),
        };
        info!(
            "Saved partition {}: {} rows, amount {:.2} -> {}",
            summary.client, summary.row_count, summary.amount_total, summary.location
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::context::{FixedClock, JobParameters};
    use crate::results::FieldValue;
    use crate::storage::MemoryObjectStore;
    use chrono::TimeZone;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn context() -> JobContext {
        JobContext::new(
            "job-1",
            JobParameters {
                price_threshold: 3000.0,
                material_status: "Disponible".to_string(),
                counters: "7051602".to_string(),
            },
        )
        .unwrap()
        .with_clock(Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
        )))
    }

    fn row(client: &str, amount: impl Into<FieldValue>, factor: impl Into<FieldValue>) -> ResultRow {
        ResultRow::new()
            .with("Cliente", client)
            .with("Material", "Ibuprofeno 400mg")
            .with("Importe", amount)
            .with("Factor_4", factor)
    }

    #[test]
    fn test_metrics_ignore_nulls() {
        let set = ResultSet::from_rows(vec![
            row("A", 100i64, 1.0),
            row("A", FieldValue::Null, 3.0),
            row("A", 50.5, FieldValue::Null),
        ]);
        let metrics = PartitionMetrics::compute(&set, set.rows());

        assert_eq!(metrics.row_count, 3);
        assert_eq!(metrics.amount_total, Some(150.5));
        assert_eq!(metrics.factor_average, Some(2.0));
    }

    #[test]
    fn test_all_null_metrics_report_zero() {
        let set = ResultSet::from_rows(vec![row("A", FieldValue::Null, FieldValue::Null)]);
        let metrics = PartitionMetrics::compute(&set, set.rows());

        assert_eq!(metrics.amount_total, None);
        assert_eq!(metrics.reported_amount_total(), 0.0);
        assert_eq!(
            serde_json::to_value(metrics).unwrap(),
            json!({"monto_total": 0.0, "factor_promedio": 0.0})
        );
    }

    #[test]
    fn test_zero_sum_is_distinct_from_null_sum() {
        let set = ResultSet::from_rows(vec![row("A", 5i64, 1.0), row("A", -5i64, 1.0)]);
        let metrics = PartitionMetrics::compute(&set, set.rows());
        assert_eq!(metrics.amount_total, Some(0.0));
    }

    #[tokio::test]
    async fn test_overflowing_metrics_are_not_written() {
        let ctx = context();
        let store = MemoryObjectStore::new("bucket");
        let set = ResultSet::from_rows(vec![row("A", 1.0e308, 1.0), row("A", 1.0e308, 1.0)]);

        let metrics = PartitionMetrics::compute(&set, set.rows());
        assert!(!metrics.is_finite());

        let err = PartitionWriter::new(&store, &ctx)
            .write(&PartitionKey::from("A"), &set)
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Validation { .. }));
        assert_eq!(store.len().await, 0);
    }

    #[test]
    fn test_text_amounts_count_toward_total() {
        let set = ResultSet::from_rows(vec![row("A", "100.50", "2.0"), row("A", 10i64, 1.0)]);
        let metrics = PartitionMetrics::compute(&set, set.rows());

        assert_eq!(metrics.amount_total, Some(110.5));
        assert_eq!(metrics.factor_average, Some(1.5));
    }

    #[tokio::test]
    async fn test_write_stores_artifact_at_deterministic_key() {
        let ctx = context();
        let store = MemoryObjectStore::new("bucket");
        let set = ResultSet::from_rows(vec![
            row("A", 100i64, 1.0),
            row("B", 50i64, 2.0),
            row("A", 200i64, 3.0),
        ]);

        let writer = PartitionWriter::new(&store, &ctx);
        let summary = writer.write(&PartitionKey::from("A"), &set).await.unwrap();

        assert_eq!(summary.row_count, 2);
        assert_eq!(summary.amount_total, 300.0);
        assert_eq!(
            summary.location,
            "memory://bucket/results/job-1/clients/client_A.json"
        );

        let stored = store
            .object("results/job-1/clients/client_A.json")
            .await
            .unwrap();
        assert_eq!(stored.content_type, "application/json");
        let doc: Value = serde_json::from_slice(&stored.body).unwrap();
        assert_eq!(doc["job_id"], json!("job-1"));
        assert_eq!(doc["cliente"], json!("A"));
        assert_eq!(doc["timestamp"], json!("2024-01-15T10:30:00Z"));
        assert_eq!(doc["total_registros"], json!(2));
        assert_eq!(doc["metricas"], json!({"monto_total": 300.0, "factor_promedio": 2.0}));
        assert_eq!(doc["datos"].as_array().unwrap().len(), 2);
        assert_eq!(doc["datos"][1]["Importe"], json!(200));
    }

    #[tokio::test]
    async fn test_artifact_keeps_non_ascii_unescaped() {
        let ctx = context();
        let store = MemoryObjectStore::new("bucket");
        let set = ResultSet::from_rows(vec![row("A", 1i64, 1.0).with("Descripción", "Niño")]);

        PartitionWriter::new(&store, &ctx)
            .write(&PartitionKey::from("A"), &set)
            .await
            .unwrap();

        let stored = store
            .object("results/job-1/clients/client_A.json")
            .await
            .unwrap();
        let text = String::from_utf8(stored.body).unwrap();
        assert!(text.contains("\"Descripción\":\"Niño\""));
    }

    #[tokio::test]
    async fn test_storage_failure_is_partition_write_error() {
        let ctx = context();
        let store = MemoryObjectStore::new("bucket");
        store
            .fail_writes_to("results/job-1/clients/client_A.json", "AccessDenied")
            .await;
        let set = ResultSet::from_rows(vec![row("A", 1i64, 1.0)]);

        let err = PartitionWriter::new(&store, &ctx)
            .write(&PartitionKey::from("A"), &set)
            .await
            .unwrap_err();

        match err {
            PublishError::PartitionWrite { client, key, .. } => {
                assert_eq!(client, "A");
                assert_eq!(key, "results/job-1/clients/client_A.json");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rewrite_overwrites_same_key() {
        let ctx = context();
        let store = MemoryObjectStore::new("bucket");
        let set = ResultSet::from_rows(vec![row("A", 1i64, 1.0)]);
        let writer = PartitionWriter::new(&store, &ctx);

        writer.write(&PartitionKey::from("A"), &set).await.unwrap();
        let first = store.object("results/job-1/clients/client_A.json").await.unwrap();
        writer.write(&PartitionKey::from("A"), &set).await.unwrap();
        let second = store.object("results/job-1/clients/client_A.json").await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(first, second);
    }
}
