//! Deterministic storage key layout
//!
//! ```text
//! results/{job_id}/clients/client_{client_id}.json   one per partition
//! results/{job_id}/metadata.json                     one per job, written last
//! ```

use crate::error::{PublishError, PublishResult};

const RESULTS_ROOT: &str = "results";
const CLIENT_FILE_PREFIX: &str = "client_";
const CLIENT_FILE_SUFFIX: &str = ".json";

/// Longest key segment, in bytes; matches the usual filesystem NAME_MAX
pub const MAX_SEGMENT_LEN: usize = 255;

/// Longest client id whose `client_{id}.json` file name still fits one segment
pub const MAX_CLIENT_ID_LEN: usize =
    MAX_SEGMENT_LEN - CLIENT_FILE_PREFIX.len() - CLIENT_FILE_SUFFIX.len();

/// Check that `value` can be used verbatim as one segment of a storage key
pub fn validate_segment(field: &str, value: &str) -> PublishResult<()> {
    validate_segment_len(field, value, MAX_SEGMENT_LEN)
}

/// Check a client id, which is embedded in the partition file name
pub fn validate_client_id(field: &str, value: &str) -> PublishResult<()> {
    validate_segment_len(field, value, MAX_CLIENT_ID_LEN)
}

fn validate_segment_len(field: &str, value: &str, max_len: usize) -> PublishResult<()> {
    if value.is_empty() {
        return Err(PublishError::invalid_field(field, format!("{} must not be empty", field)));
    }
    if value.len() > max_len {
        return Err(PublishError::invalid_field(
            field,
            format!("{} exceeds {} bytes", field, max_len),
        ));
    }
    if value == "." || value == ".." {
        return Err(PublishError::invalid_field(
            field,
            format!("{} must not be a relative path component: {:?}", field, value),
        ));
    }
    if let Some(c) = value
        .chars()
        .find(|c| matches!(c, '/' | '\\') || c.is_control())
    {
        return Err(PublishError::invalid_field(
            field,
            format!("{} contains forbidden character {:?}: {:?}", field, c, value),
        ));
    }
    Ok(())
}

/// Prefix holding every object of a job
pub fn job_prefix(job_id: &str) -> String {
    format!("{}/{}/", RESULTS_ROOT, job_id)
}

/// Key of one partition artifact
pub fn partition_key(job_id: &str, client_id: &str) -> String {
    format!(
        "{}/{}/clients/{}{}{}",
        RESULTS_ROOT, job_id, CLIENT_FILE_PREFIX, client_id, CLIENT_FILE_SUFFIX
    )
}

/// Key of the job manifest
pub fn manifest_key(job_id: &str) -> String {
    format!("{}/{}/metadata.json", RESULTS_ROOT, job_id)
}
