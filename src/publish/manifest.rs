//! Job manifest assembly

use super::collector::AggregateTotals;
use super::context::{JobContext, JobParameters};
use super::writer::PartitionSummary;
use crate::storage::StorageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Final state recorded in a manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestStatus {
    Completed,
    Failed,
}

impl fmt::Display for ManifestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestStatus::Completed => write!(f, "completed"),
            ManifestStatus::Failed => write!(f, "failed"),
        }
    }
}

/// The completion document written once per job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobManifest {
    pub job_id: String,
    pub timestamp: DateTime<Utc>,
    pub status: ManifestStatus,
    #[serde(rename = "total_clientes")]
    pub total_clients: usize,
    #[serde(rename = "total_registros")]
    pub total_rows: usize,
    #[serde(rename = "clientes")]
    pub partitions: Vec<PartitionSummary>,
    #[serde(rename = "parametros")]
    pub parameters: JobParameters,
}

impl JobManifest {
    pub fn to_json(&self) -> Result<Vec<u8>, StorageError> {
        serde_json::to_vec(self).map_err(StorageError::serialization)
    }

    pub fn is_completed(&self) -> bool {
        self.status == ManifestStatus::Completed
    }

    /// Check the totals against the partition list
    pub fn totals_consistent(&self) -> bool {
        self.total_clients == self.partitions.len()
            && self.total_rows == self.partitions.iter().map(|p| p.row_count).sum::<usize>()
    }
}

/// Assembles the manifest of a successful run. Pure; touches no storage.
pub struct ManifestBuilder<'a> {
    ctx: &'a JobContext,
}

impl<'a> ManifestBuilder<'a> {
    pub fn new(ctx: &'a JobContext) -> Self {
        Self { ctx }
    }

    pub fn build(&self, totals: AggregateTotals) -> JobManifest {
        JobManifest {
            job_id: self.ctx.job_id().to_string(),
            timestamp: self.ctx.now(),
            status: ManifestStatus::Completed,
            total_clients: totals.total_clients,
            total_rows: totals.total_rows,
            partitions: totals.summaries,
            parameters: self.ctx.parameters().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::context::FixedClock;
    use crate::publish::planner::PartitionKey;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;

    fn context() -> JobContext {
        JobContext::new(
            "job-1",
            JobParameters {
                price_threshold: 3000.0,
                material_status: "Disponible".to_string(),
                counters: "7051602,7051603".to_string(),
            },
        )
        .unwrap()
        .with_clock(Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
        )))
    }

    fn totals() -> AggregateTotals {
        AggregateTotals {
            summaries: vec![
                PartitionSummary {
                    client: PartitionKey::from("A"),
                    row_count: 2,
                    amount_total: 300.0,
                    location: "s3://bucket/results/job-1/clients/client_A.json".to_string(),
                },
                PartitionSummary {
                    client: PartitionKey::from("B"),
                    row_count: 1,
                    amount_total: 50.0,
                    location: "s3://bucket/results/job-1/clients/client_B.json".to_string(),
                },
            ],
            total_rows: 3,
            total_clients: 2,
        }
    }

    #[test]
    fn test_manifest_document_shape() {
        let ctx = context();
        let manifest = ManifestBuilder::new(&ctx).build(totals());

        assert!(manifest.is_completed());
        assert!(manifest.totals_consistent());
        assert_eq!(
            serde_json::to_value(&manifest).unwrap(),
            json!({
                "job_id": "job-1",
                "timestamp": "2024-01-15T10:30:00Z",
                "status": "completed",
                "total_clientes": 2,
                "total_registros": 3,
                "clientes": [
                    {"cliente": "A", "registros": 2, "monto_total": 300.0,
                     "s3_path": "s3://bucket/results/job-1/clients/client_A.json"},
                    {"cliente": "B", "registros": 1, "monto_total": 50.0,
                     "s3_path": "s3://bucket/results/job-1/clients/client_B.json"}
                ],
                "parametros": {
                    "limite_precio": 3000.0,
                    "estatus_material": "Disponible",
                    "mostradores": "7051602,7051603"
                }
            })
        );
    }

    #[test]
    fn test_manifest_reads_back() {
        let ctx = context();
        let manifest = ManifestBuilder::new(&ctx).build(totals());
        let bytes = manifest.to_json().unwrap();
        let parsed: JobManifest = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, manifest);
    }

    #[test]
    fn test_inconsistent_totals_detected() {
        let ctx = context();
        let mut manifest = ManifestBuilder::new(&ctx).build(totals());
        manifest.total_rows = 4;
        assert!(!manifest.totals_consistent());
    }
}
