//! Job parameters supplied by the launching process

use super::counters::CounterDefaults;
use super::options::PublishOptions;
use crate::results::ColumnMapping;
use crate::storage::StorageConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Everything a publication run is parameterized by
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Job identifier, used verbatim in storage keys
    #[serde(default)]
    pub job_id: String,

    /// Bucket receiving artifacts and the manifest
    #[serde(default)]
    pub bucket: String,

    /// Status table holding the job's status record
    #[serde(default)]
    pub status_table: String,

    /// Price threshold the computation ran with
    #[serde(default = "default_price_threshold")]
    pub price_threshold: f64,

    /// Material status filter the computation ran with
    #[serde(default = "default_material_status")]
    pub material_status: String,

    /// Comma-separated counter identifiers
    #[serde(default)]
    pub counters: String,

    #[serde(default)]
    pub columns: ColumnMapping,

    #[serde(default)]
    pub counter_defaults: CounterDefaults,

    #[serde(default)]
    pub publish: PublishOptions,

    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_price_threshold() -> f64 {
    3000.0
}

fn default_material_status() -> String {
    "Disponible".to_string()
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            job_id: String::new(),
            bucket: String::new(),
            status_table: String::new(),
            price_threshold: default_price_threshold(),
            material_status: default_material_status(),
            counters: String::new(),
            columns: ColumnMapping::default(),
            counter_defaults: CounterDefaults::default(),
            publish: PublishOptions::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl JobConfig {
    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse job configuration")
    }

    /// Load configuration from an optional TOML file, then apply environment overrides
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                debug!("Loaded job configuration from {}", path.display());
                Self::from_toml(&content)?
            }
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Overlay `IPP_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(job_id) = std::env::var("IPP_JOB_ID") {
            self.job_id = job_id;
        }
        if let Ok(bucket) = std::env::var("IPP_BUCKET_NAME") {
            self.bucket = bucket;
        }
        if let Ok(table) = std::env::var("IPP_STATUS_TABLE") {
            self.status_table = table;
        }
        if let Ok(threshold) = std::env::var("IPP_PRICE_THRESHOLD") {
            self.price_threshold = threshold
                .trim()
                .parse()
                .with_context(|| format!("IPP_PRICE_THRESHOLD is not a number: {}", threshold))?;
        }
        if let Ok(status) = std::env::var("IPP_MATERIAL_STATUS") {
            self.material_status = status;
        }
        if let Ok(counters) = std::env::var("IPP_COUNTERS") {
            self.counters = counters;
        }
        if let Ok(parallel) = std::env::var("IPP_MAX_PARALLEL") {
            self.publish.max_parallel = parallel
                .trim()
                .parse()
                .with_context(|| format!("IPP_MAX_PARALLEL is not a number: {}", parallel))?;
        }
        self.storage.apply_env();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::BackendType;
    use std::time::Duration;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
        job_id = "ipp-20240115-001"
        bucket = "invenadro-ipp-raw"
        status_table = "ipp-jobs"
        price_threshold = 2500.0
        counters = "7051602,7051603"

        [columns]
        amount = "Importe_Total"

        [publish]
        max_parallel = 2
        partition_timeout = "30s"

        [storage]
        backend = "memory"
    "#;

    #[test]
    fn test_from_toml_with_defaults() {
        let config = JobConfig::from_toml(SAMPLE).unwrap();

        assert_eq!(config.job_id, "ipp-20240115-001");
        assert_eq!(config.price_threshold, 2500.0);
        assert_eq!(config.material_status, "Disponible");
        assert_eq!(config.columns.amount, "Importe_Total");
        assert_eq!(config.columns.client, "Cliente");
        assert_eq!(config.publish.max_parallel, 2);
        assert_eq!(config.publish.partition_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.storage.backend, BackendType::Memory);
        assert!(config.counter_defaults.flags.include_refrigerated);
    }

    #[test]
    fn test_from_toml_rejects_bad_types() {
        assert!(JobConfig::from_toml("price_threshold = \"high\"").is_err());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("job.toml");
        tokio::fs::write(&path, SAMPLE).await.unwrap();

        let config = JobConfig::load(Some(&path)).await.unwrap();
        assert_eq!(config.bucket, "invenadro-ipp-raw");
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = JobConfig::load(Some(&temp_dir.path().join("none.toml"))).await;
        assert!(result.is_err());
    }
}
