//! Storage factory for creating storage instances

use std::sync::Arc;

use super::backends::{FileObjectStore, FileStatusStore, MemoryObjectStore, MemoryStatusStore};
#[cfg(feature = "dynamodb")]
use super::backends::DynamoStatusStore;
#[cfg(feature = "s3")]
use super::backends::S3ObjectStore;
use super::config::{BackendType, StorageConfig};
use super::error::StorageResult;
use super::traits::{ObjectStore, StatusStore};

/// The object store and status store a publication run writes to
#[derive(Clone)]
pub struct StorageHandles {
    pub objects: Arc<dyn ObjectStore>,
    pub statuses: Arc<dyn StatusStore>,
}

/// Factory for creating storage instances
pub struct StorageFactory;

impl StorageFactory {
    /// Create the stores for `bucket` and `status_table` from explicit configuration
    pub async fn from_config(
        config: &StorageConfig,
        bucket: &str,
        status_table: &str,
    ) -> StorageResult<StorageHandles> {
        match config.backend {
            BackendType::File => Ok(StorageHandles {
                objects: Arc::new(FileObjectStore::new(&config.base_dir, bucket).await?),
                statuses: Arc::new(FileStatusStore::new(&config.base_dir, status_table).await?),
            }),
            BackendType::Memory => Ok(StorageHandles {
                objects: Arc::new(MemoryObjectStore::new(bucket)),
                statuses: Arc::new(MemoryStatusStore::new()),
            }),
            BackendType::Aws => Self::aws(config, bucket, status_table).await,
        }
    }

    #[cfg(all(feature = "s3", feature = "dynamodb"))]
    async fn aws(
        config: &StorageConfig,
        bucket: &str,
        status_table: &str,
    ) -> StorageResult<StorageHandles> {
        Ok(StorageHandles {
            objects: Arc::new(S3ObjectStore::new(config, bucket).await?),
            statuses: Arc::new(DynamoStatusStore::new(config, status_table).await?),
        })
    }

    #[cfg(not(all(feature = "s3", feature = "dynamodb")))]
    async fn aws(
        _config: &StorageConfig,
        _bucket: &str,
        _status_table: &str,
    ) -> StorageResult<StorageHandles> {
        Err(super::error::StorageError::configuration(
            "AWS backend not enabled. Enable with --features aws",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_factory_creates_file_backend() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::file(temp_dir.path());

        let handles = StorageFactory::from_config(&config, "bucket", "jobs")
            .await
            .unwrap();
        assert_eq!(handles.objects.backend_type(), "file");
        assert_eq!(handles.statuses.backend_type(), "file");
        assert!(temp_dir.path().join("bucket").is_dir());
        assert!(temp_dir.path().join("status/jobs").is_dir());
    }

    #[tokio::test]
    async fn test_factory_creates_memory_backend() {
        let config = StorageConfig {
            backend: BackendType::Memory,
            ..Default::default()
        };

        let handles = StorageFactory::from_config(&config, "bucket", "jobs")
            .await
            .unwrap();
        assert_eq!(handles.objects.location("k"), "memory://bucket/k");
    }

    #[cfg(not(all(feature = "s3", feature = "dynamodb")))]
    #[tokio::test]
    async fn test_factory_rejects_disabled_aws_backend() {
        let config = StorageConfig {
            backend: BackendType::Aws,
            ..Default::default()
        };

        let result = StorageFactory::from_config(&config, "bucket", "jobs").await;
        assert!(result.is_err());
    }
}
