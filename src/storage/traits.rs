//! Core trait definitions for the storage abstraction layer

use async_trait::async_trait;

use super::error::StorageResult;
use super::types::{JobStatusRecord, JobStatusUpdate};

/// Object storage holding partition artifacts and manifests
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write an object, replacing any existing object under the same key
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> StorageResult<()>;

    /// Read an object, `None` if the key does not exist
    async fn get_object(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Check whether an object exists
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// List keys under a prefix, sorted
    async fn list_keys(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Externally meaningful location of a key (e.g. `s3://bucket/key`)
    fn location(&self, key: &str) -> String;

    /// Short backend name for logs
    fn backend_type(&self) -> &'static str;
}

/// Keyed job status records
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Conditionally update an existing record.
    ///
    /// Fails with [`StorageError::NotFound`](super::StorageError::NotFound) when no
    /// record exists for `job_id`; records are never created here.
    async fn update_status(&self, job_id: &str, update: &JobStatusUpdate) -> StorageResult<()>;

    /// Load a record
    async fn get_status(&self, job_id: &str) -> StorageResult<Option<JobStatusRecord>>;

    /// Short backend name for logs
    fn backend_type(&self) -> &'static str;
}
