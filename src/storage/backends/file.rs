//! File-based storage backend implementation

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::storage::{
    error::{StorageError, StorageResult},
    traits::{ObjectStore, StatusStore},
    types::{JobStatusRecord, JobStatusUpdate},
};

/// Object store laid out as `base_dir/<bucket>/<key>`
pub struct FileObjectStore {
    bucket: String,
    root: PathBuf,
}

impl FileObjectStore {
    /// Create a new file object store, creating the bucket directory if needed
    pub async fn new(base_dir: &Path, bucket: &str) -> StorageResult<Self> {
        let root = base_dir.join(bucket);
        fs::create_dir_all(&root).await?;

        Ok(Self {
            bucket: bucket.to_string(),
            root,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Resolve a key to a path, refusing keys that would escape the bucket
    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        let mut path = self.root.clone();
        for segment in key.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\')
            {
                return Err(StorageError::configuration(format!(
                    "Invalid object key: {}",
                    key
                )));
            }
            path.push(segment);
        }
        Ok(path)
    }
}

/// Write to a temporary sibling and rename into place
async fn write_atomic(path: &Path, body: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StorageError::configuration(format!("Invalid path: {}", path.display())))?;
    let temp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    fs::write(&temp_path, body).await?;
    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(StorageError::Io(e));
    }
    Ok(())
}

async fn read_optional(path: &Path) -> StorageResult<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::Io(e)),
    }
}

#[async_trait]
impl ObjectStore for FileObjectStore {
    async fn put_object(&self, key: &str, body: Vec<u8>, _content_type: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        debug!("Writing {} bytes to {}", body.len(), path.display());
        write_atomic(&path, &body).await
    }

    async fn get_object(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        read_optional(&self.path_for(key)?).await
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(fs::try_exists(self.path_for(key)?).await?)
    }

    async fn list_keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::Io(e)),
            };
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(relative) = path.strip_prefix(&self.root) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                let is_temp = relative
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with('.') && n.ends_with(".tmp"))
                    .unwrap_or(false);
                if !is_temp && key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn location(&self, key: &str) -> String {
        let path = self.root.join(key);
        let absolute = std::path::absolute(&path).unwrap_or(path);
        format!("file://{}", absolute.display())
    }

    fn backend_type(&self) -> &'static str {
        "file"
    }
}

/// Status records stored as `base_dir/status/<table>/<job_id>.json`
pub struct FileStatusStore {
    dir: PathBuf,
}

impl FileStatusStore {
    pub async fn new(base_dir: &Path, table: &str) -> StorageResult<Self> {
        let dir = base_dir.join("status").join(table);
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn record_path(&self, job_id: &str) -> StorageResult<PathBuf> {
        if job_id.is_empty() || job_id.contains('/') || job_id.contains('\\') || job_id == ".." {
            return Err(StorageError::configuration(format!(
                "Invalid job id for status record: {}",
                job_id
            )));
        }
        Ok(self.dir.join(format!("{}.json", job_id)))
    }

    /// Seed a record, as the job launcher would
    pub async fn create_record(&self, record: &JobStatusRecord) -> StorageResult<()> {
        let path = self.record_path(&record.job_id)?;
        let body = serde_json::to_vec_pretty(record)?;
        write_atomic(&path, &body).await
    }
}

#[async_trait]
impl StatusStore for FileStatusStore {
    async fn update_status(&self, job_id: &str, update: &JobStatusUpdate) -> StorageResult<()> {
        let path = self.record_path(job_id)?;
        let bytes = read_optional(&path)
            .await?
            .ok_or_else(|| StorageError::not_found(format!("job status record {}", job_id)))?;

        let mut record: JobStatusRecord = serde_json::from_slice(&bytes)?;
        record.apply(update);

        let body = serde_json::to_vec_pretty(&record)?;
        write_atomic(&path, &body).await
    }

    async fn get_status(&self, job_id: &str) -> StorageResult<Option<JobStatusRecord>> {
        match read_optional(&self.record_path(job_id)?).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn backend_type(&self) -> &'static str {
        "file"
    }
}
