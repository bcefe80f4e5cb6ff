//! Publication driver
//!
//! Runs the stages in order:
//!
//! 1. plan partitions (pure, fails before any write)
//! 2. write every partition, at most `max_parallel` at a time
//! 3. check the aggregate totals
//! 4. build and write the manifest, the last object write of the run
//! 5. update the status record
//!
//! The first error aborts the run. Artifacts already written stay in storage.

use super::budget::OperationBudget;
use super::collector::AggregateCollector;
use super::context::JobContext;
use super::manifest::{JobManifest, ManifestBuilder};
use super::planner::plan_partitions;
use super::signaler::CompletionSignaler;
use super::status::StatusRecorder;
use super::writer::PartitionWriter;
use crate::config::PublishOptions;
use crate::error::{PublishError, PublishResult};
use crate::results::ResultSet;
use crate::storage::{ObjectStore, StatusStore, StorageHandles};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Outcome of a successful publication
#[derive(Debug, Clone)]
pub struct PublishReport {
    pub manifest: JobManifest,
    pub manifest_location: String,
    pub result_location: String,
    pub elapsed: Duration,
}

/// Publishes result sets to an object store and status store
pub struct PublishPipeline {
    objects: Arc<dyn ObjectStore>,
    statuses: Arc<dyn StatusStore>,
    options: PublishOptions,
}

impl PublishPipeline {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        statuses: Arc<dyn StatusStore>,
        options: PublishOptions,
    ) -> Self {
        Self {
            objects,
            statuses,
            options,
        }
    }

    pub fn from_handles(handles: StorageHandles, options: PublishOptions) -> Self {
        Self::new(handles.objects, handles.statuses, options)
    }

    pub fn options(&self) -> &PublishOptions {
        &self.options
    }

    /// Publish one job's result set
    pub async fn publish(&self, ctx: &JobContext, results: &ResultSet) -> PublishResult<PublishReport> {
        let started = Instant::now();
        let budget = OperationBudget::starting_now(
            self.options.partition_timeout,
            self.options.job_deadline,
        );

        match self.run(ctx, results, budget).await {
            Ok((manifest, manifest_location, result_location)) => {
                let report = PublishReport {
                    manifest,
                    manifest_location,
                    result_location,
                    elapsed: started.elapsed(),
                };
                let manifest = &report.manifest;
                info!(
                    "Published job {}: {} clients, {} rows ({:.1} rows per client) in {:.2?}",
                    ctx.job_id(),
                    manifest.total_clients,
                    manifest.total_rows,
                    manifest.total_rows as f64 / manifest.total_clients.max(1) as f64,
                    report.elapsed
                );
                info!("Results: {}", report.result_location);
                info!("Manifest: {}", report.manifest_location);
                Ok(report)
            }
            Err(err) => {
                error!(
                    "Publication of job {} failed after {:.2?}: {}",
                    ctx.job_id(),
                    started.elapsed(),
                    err
                );
                if err.may_leave_orphans() {
                    warn!(
                        "Artifacts already written for job {} were left in place without a manifest",
                        ctx.job_id()
                    );
                }
                self.record_failure(ctx, &err, budget).await;
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        ctx: &JobContext,
        results: &ResultSet,
        budget: OperationBudget,
    ) -> PublishResult<(JobManifest, String, String)> {
        let plan = plan_partitions(results)?;
        info!(
            "Publishing job {}: {} rows across {} clients (max {} concurrent writes)",
            ctx.job_id(),
            plan.total_rows(),
            plan.len(),
            self.options.parallelism()
        );
        for counter in ctx.counter_configs() {
            debug!(
                "Job {} counter {}: type {}, target amount {:.2}",
                ctx.job_id(),
                counter.counter,
                counter.inventory_type,
                counter.target_amount
            );
        }

        let writer = PartitionWriter::new(self.objects.as_ref(), ctx).with_budget(budget);
        let writer = &writer;
        let mut collector = AggregateCollector::new(plan.total_rows());
        let mut writes = stream::iter(plan.keys())
            .map(move |key| writer.write(key, results))
            .buffered(self.options.parallelism());

        // Results arrive in plan order; returning early drops the in-flight writes.
        while let Some(summary) = writes.next().await {
            collector.record(summary?);
        }
        debug!("All {} partitions written for job {}", collector.len(), ctx.job_id());

        let totals = collector.finish()?;
        let manifest = ManifestBuilder::new(ctx).build(totals);

        let manifest_location = CompletionSignaler::new(self.objects.as_ref())
            .with_budget(budget)
            .signal(&manifest)
            .await?;

        let recorder = StatusRecorder::new(self.statuses.as_ref(), self.objects.as_ref(), ctx)
            .with_budget(budget);
        let update = recorder.record_completed(&manifest).await?;
        let result_location = update.result_location.unwrap_or_default();

        Ok((manifest, manifest_location, result_location))
    }

    /// Best-effort "failed" status write; its own failure never replaces `cause`
    async fn record_failure(&self, ctx: &JobContext, cause: &PublishError, budget: OperationBudget) {
        if !self.options.record_failure_status {
            return;
        }
        if matches!(cause, PublishError::StatusUpdate { .. }) {
            debug!("Skipping failed status write; the status store already rejected an update");
            return;
        }

        let recorder = StatusRecorder::new(self.statuses.as_ref(), self.objects.as_ref(), ctx)
            .with_budget(budget);
        if let Err(status_err) = recorder.record_failed(cause).await {
            warn!(
                "Could not mark job {} as failed: {}",
                ctx.job_id(),
                status_err
            );
        }
    }
}
