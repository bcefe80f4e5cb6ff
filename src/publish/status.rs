//! Job status record updates

use super::budget::OperationBudget;
use super::context::JobContext;
use super::layout;
use super::manifest::JobManifest;
use crate::error::{PublishError, PublishResult};
use crate::storage::{JobStatusUpdate, ObjectStore, StatusStore};
use tracing::info;

/// Applies the single end-of-run update to a job's status record.
///
/// The record must already exist; an absent record is an error, never created here.
pub struct StatusRecorder<'a> {
    statuses: &'a dyn StatusStore,
    objects: &'a dyn ObjectStore,
    ctx: &'a JobContext,
    budget: OperationBudget,
}

impl<'a> StatusRecorder<'a> {
    pub fn new(
        statuses: &'a dyn StatusStore,
        objects: &'a dyn ObjectStore,
        ctx: &'a JobContext,
    ) -> Self {
        Self {
            statuses,
            objects,
            ctx,
            budget: OperationBudget::unlimited(),
        }
    }

    pub fn with_budget(mut self, budget: OperationBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Location of the job's result prefix
    pub fn result_location(&self) -> String {
        self.objects.location(&layout::job_prefix(self.ctx.job_id()))
    }

    /// Mark the job completed with the manifest's totals
    pub async fn record_completed(&self, manifest: &JobManifest) -> PublishResult<JobStatusUpdate> {
        let update = JobStatusUpdate::completed(
            self.result_location(),
            self.ctx.now(),
            manifest.total_clients,
            manifest.total_rows,
        );
        self.apply(&update).await?;
        info!(
            "Status for job {} set to completed ({} clients, {} rows)",
            self.ctx.job_id(),
            manifest.total_clients,
            manifest.total_rows
        );
        Ok(update)
    }

    /// Mark the job failed with the error that aborted it
    pub async fn record_failed(&self, cause: &PublishError) -> PublishResult<JobStatusUpdate> {
        let update = JobStatusUpdate::failed(
            self.ctx.now(),
            format!("{}: {}", cause.kind(), cause),
        );
        self.apply(&update).await?;
        info!("Status for job {} set to failed", self.ctx.job_id());
        Ok(update)
    }

    async fn apply(&self, update: &JobStatusUpdate) -> PublishResult<()> {
        let job_id = self.ctx.job_id();
        self.budget
            .run(self.statuses.update_status(job_id, update))
            .await
            .map_err(|source| PublishError::StatusUpdate {
                job_id: job_id.to_string(),
                source,
            })
    }
}
