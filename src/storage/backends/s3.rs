//! S3 storage backend implementation

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::sync::Arc;
use tracing::{debug, info};

use crate::storage::{
    config::StorageConfig,
    error::{StorageError, StorageResult},
    traits::ObjectStore,
};

/// S3 object store for a single bucket
pub struct S3ObjectStore {
    client: Arc<Client>,
    bucket: String,
}

impl S3ObjectStore {
    /// Create new S3 backend and check the bucket is reachable
    pub async fn new(config: &StorageConfig, bucket: &str) -> StorageResult<Self> {
        info!("Initializing S3 backend for bucket {}", bucket);

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));
        if let Some(ref endpoint) = config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let aws_config = loader.load().await;

        // Custom endpoints (LocalStack, MinIO) need path-style addressing
        let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
            .force_path_style(config.endpoint.is_some())
            .build();
        let client = Client::from_conf(s3_config);

        client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| {
                StorageError::connection(format!("Failed to access S3 bucket {}: {}", bucket, e))
            })?;

        Ok(Self {
            client: Arc::new(client),
            bucket: bucket.to_string(),
        })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> StorageResult<()> {
        debug!("Putting s3://{}/{} ({} bytes)", self.bucket, key, body.len());

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StorageError::backend(format!("Failed to put {}: {}", key, e)))?;

        Ok(())
    }

    async fn get_object(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        debug!("Getting s3://{}/{}", self.bucket, key);

        match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(result) => {
                let bytes = result
                    .body
                    .collect()
                    .await
                    .map_err(|e| StorageError::backend(format!("Failed to read {}: {}", key, e)))?
                    .into_bytes();
                Ok(Some(bytes.to_vec()))
            }
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    Ok(None)
                } else {
                    Err(StorageError::backend(format!(
                        "Failed to get {}: {}",
                        key, service_error
                    )))
                }
            }
        }
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    Err(StorageError::backend(format!(
                        "Failed to stat {}: {}",
                        key, service_error
                    )))
                }
            }
        }
    }

    async fn list_keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let response = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| {
                    StorageError::backend(format!("Failed to list {}: {}", prefix, e))
                })?;

            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );

            match response.next_continuation_token() {
                Some(token) if response.is_truncated() == Some(true) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn location(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }

    fn backend_type(&self) -> &'static str {
        "s3"
    }
}
