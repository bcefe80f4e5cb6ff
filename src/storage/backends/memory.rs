//! In-memory storage backend for testing

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::storage::{
    error::{StorageError, StorageResult},
    traits::{ObjectStore, StatusStore},
    types::{JobStatusRecord, JobStatusUpdate},
};

/// An object held by [`MemoryObjectStore`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// Fault injected into writes for a key
#[derive(Debug, Clone)]
enum WriteFault {
    Fail(String),
    Delay(Duration),
}

/// In-memory object store.
///
/// Records the order of successful writes and supports injecting failures or delays
/// for individual keys.
#[derive(Clone)]
pub struct MemoryObjectStore {
    bucket: String,
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,
    write_log: Arc<RwLock<Vec<String>>>,
    faults: Arc<RwLock<HashMap<String, WriteFault>>>,
}

impl MemoryObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::new(RwLock::new(BTreeMap::new())),
            write_log: Arc::new(RwLock::new(Vec::new())),
            faults: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Make every write to `key` fail with a backend error
    pub async fn fail_writes_to(&self, key: impl Into<String>, message: impl Into<String>) {
        self.faults
            .write()
            .await
            .insert(key.into(), WriteFault::Fail(message.into()));
    }

    /// Make every write to `key` sleep before completing
    pub async fn delay_writes_to(&self, key: impl Into<String>, delay: Duration) {
        self.faults
            .write()
            .await
            .insert(key.into(), WriteFault::Delay(delay));
    }

    pub async fn clear_faults(&self) {
        self.faults.write().await.clear();
    }

    /// Keys in the order their writes completed
    pub async fn write_log(&self) -> Vec<String> {
        self.write_log.read().await.clone()
    }

    pub async fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> StorageResult<()> {
        let fault = self.faults.read().await.get(key).cloned();
        match fault {
            Some(WriteFault::Fail(message)) => return Err(StorageError::backend(message)),
            Some(WriteFault::Delay(delay)) => tokio::time::sleep(delay).await,
            None => {}
        }

        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        self.write_log.write().await.push(key.to_string());
        Ok(())
    }

    async fn get_object(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self
            .objects
            .read()
            .await
            .get(key)
            .map(|object| object.body.clone()))
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn list_keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        Ok(self
            .objects
            .read()
            .await
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn location(&self, key: &str) -> String {
        format!("memory://{}/{}", self.bucket, key)
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}

/// In-memory status store
#[derive(Clone, Default)]
pub struct MemoryStatusStore {
    records: Arc<RwLock<HashMap<String, JobStatusRecord>>>,
    failure: Arc<RwLock<Option<String>>>,
    updates: Arc<RwLock<Vec<(String, JobStatusUpdate)>>>,
}

impl MemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record, as the job launcher would
    pub async fn create_record(&self, record: JobStatusRecord) {
        self.records
            .write()
            .await
            .insert(record.job_id.clone(), record);
    }

    /// Make every update fail with a backend error
    pub async fn fail_updates(&self, message: impl Into<String>) {
        *self.failure.write().await = Some(message.into());
    }

    /// Every update accepted so far, in order
    pub async fn updates(&self) -> Vec<(String, JobStatusUpdate)> {
        self.updates.read().await.clone()
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn update_status(&self, job_id: &str, update: &JobStatusUpdate) -> StorageResult<()> {
        if let Some(message) = self.failure.read().await.clone() {
            return Err(StorageError::backend(message));
        }

        let mut records = self.records.write().await;
        let record = records
            .get_mut(job_id)
            .ok_or_else(|| StorageError::not_found(format!("job status record {}", job_id)))?;
        record.apply(update);
        self.updates
            .write()
            .await
            .push((job_id.to_string(), update.clone()));
        Ok(())
    }

    async fn get_status(&self, job_id: &str) -> StorageResult<Option<JobStatusRecord>> {
        Ok(self.records.read().await.get(job_id).cloned())
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}
