//! Completion signal
//!
//! Downstream consumers watch for `results/{job_id}/metadata.json`. Its presence is the
//! only completion marker, so the manifest is the last object a successful run writes.

use super::budget::OperationBudget;
use super::layout;
use super::manifest::JobManifest;
use crate::error::{PublishError, PublishResult};
use crate::storage::{ObjectStore, StorageError, JSON_CONTENT_TYPE};
use tracing::info;

pub struct CompletionSignaler<'a> {
    store: &'a dyn ObjectStore,
    budget: OperationBudget,
}

impl<'a> CompletionSignaler<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self {
            store,
            budget: OperationBudget::unlimited(),
        }
    }

    pub fn with_budget(mut self, budget: OperationBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Write the manifest and return its storage location
    pub async fn signal(&self, manifest: &JobManifest) -> PublishResult<String> {
        let key = layout::manifest_key(&manifest.job_id);
        let wrap = |source: StorageError| PublishError::ManifestWrite {
            job_id: manifest.job_id.clone(),
            key: key.clone(),
            source,
        };

        let body = manifest.to_json().map_err(wrap)?;
        self.budget
            .run(self.store.put_object(&key, body, JSON_CONTENT_TYPE))
            .await
            .map_err(wrap)?;

        let location = self.store.location(&key);
        info!("Manifest for job {} saved to {}", manifest.job_id, location);
        Ok(location)
    }
}
