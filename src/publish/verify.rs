//! Consumer-side publication check
//!
//! Reads a job's manifest back from object storage and confirms it describes a complete
//! publication: completed status, consistent totals, and every listed artifact present
//! with the row count the manifest claims.

use super::layout;
use super::manifest::JobManifest;
use super::writer::ArtifactHeader;
use crate::storage::{ObjectStore, StorageResult};
use tracing::{debug, warn};

/// Findings of one verification
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub job_id: String,
    /// The manifest, when one was found and could be parsed
    pub manifest: Option<JobManifest>,
    pub artifacts_checked: usize,
    pub issues: Vec<String>,
}

impl VerificationReport {
    pub fn is_valid(&self) -> bool {
        self.manifest.is_some() && self.issues.is_empty()
    }
}

/// Verify the publication of `job_id`.
///
/// Storage failures are returned as errors; inconsistencies are collected as issues.
pub async fn verify_publication(
    store: &dyn ObjectStore,
    job_id: &str,
) -> StorageResult<VerificationReport> {
    let mut report = VerificationReport {
        job_id: job_id.to_string(),
        ..Default::default()
    };

    let manifest_key = layout::manifest_key(job_id);
    let Some(body) = store.get_object(&manifest_key).await? else {
        report
            .issues
            .push(format!("manifest {} not found", store.location(&manifest_key)));
        return Ok(report);
    };

    let manifest: JobManifest = match serde_json::from_slice(&body) {
        Ok(manifest) => manifest,
        Err(e) => {
            report.issues.push(format!("manifest is not valid: {}", e));
            return Ok(report);
        }
    };

    if manifest.job_id != job_id {
        report.issues.push(format!(
            "manifest belongs to job {}, expected {}",
            manifest.job_id, job_id
        ));
    }
    if !manifest.is_completed() {
        report
            .issues
            .push(format!("manifest status is {}", manifest.status));
    }
    if !manifest.totals_consistent() {
        report.issues.push(format!(
            "manifest totals ({} clients, {} rows) disagree with its partition list",
            manifest.total_clients, manifest.total_rows
        ));
    }

    for partition in &manifest.partitions {
        let key = layout::partition_key(job_id, partition.client.as_str());
        report.artifacts_checked += 1;

        let Some(body) = store.get_object(&key).await? else {
            report.issues.push(format!("artifact {} is missing", key));
            continue;
        };
        match serde_json::from_slice::<ArtifactHeader>(&body) {
            Ok(header) if header.row_count != partition.row_count => {
                report.issues.push(format!(
                    "artifact {} has {} rows, manifest lists {}",
                    key, header.row_count, partition.row_count
                ));
            }
            Ok(header) if header.client != partition.client => {
                report.issues.push(format!(
                    "artifact {} belongs to client {}, manifest lists {}",
                    key, header.client, partition.client
                ));
            }
            Ok(_) => debug!("Artifact {} verified", key),
            Err(e) => report
                .issues
                .push(format!("artifact {} is not valid: {}", key, e)),
        }
    }

    for issue in &report.issues {
        warn!("Job {}: {}", job_id, issue);
    }
    report.manifest = Some(manifest);
    Ok(report)
}
