//! Shared types for the storage abstraction layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content type of every artifact and manifest this crate writes
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Lifecycle state written into a job status record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single update applied to a job status record at the end of a run
#[derive(Debug, Clone, PartialEq)]
pub struct JobStatusUpdate {
    pub status: JobState,
    /// Result prefix location; absent on failure
    pub result_location: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub total_clients: Option<usize>,
    pub total_rows: Option<usize>,
    pub error_message: Option<String>,
}

impl JobStatusUpdate {
    pub fn completed(
        result_location: String,
        updated_at: DateTime<Utc>,
        total_clients: usize,
        total_rows: usize,
    ) -> Self {
        Self {
            status: JobState::Completed,
            result_location: Some(result_location),
            updated_at,
            total_clients: Some(total_clients),
            total_rows: Some(total_rows),
            error_message: None,
        }
    }

    pub fn failed(updated_at: DateTime<Utc>, error_message: impl Into<String>) -> Self {
        Self {
            status: JobState::Failed,
            result_location: None,
            updated_at,
            total_clients: None,
            total_rows: None,
            error_message: Some(error_message.into()),
        }
    }
}

/// A job status record as kept by the status store.
///
/// Records are created by the process that launches the job; `status` holds whatever
/// lifecycle value that process or this crate last wrote. Attributes this crate does not
/// know about are preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusRecord {
    pub job_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_result_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_clientes: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_registros: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl JobStatusRecord {
    /// A freshly created record, as the launching process would write it
    pub fn new(job_id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: status.into(),
            s3_result_path: None,
            updated_at: None,
            total_clientes: None,
            total_registros: None,
            error_message: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Apply an update in place; fields the update leaves unset are kept
    pub fn apply(&mut self, update: &JobStatusUpdate) {
        self.status = update.status.as_str().to_string();
        self.updated_at = Some(update.updated_at.to_rfc3339());
        if let Some(location) = &update.result_location {
            self.s3_result_path = Some(location.clone());
        }
        if let Some(clients) = update.total_clients {
            self.total_clientes = Some(clients);
        }
        if let Some(rows) = update.total_rows {
            self.total_registros = Some(rows);
        }
        if let Some(message) = &update.error_message {
            self.error_message = Some(message.clone());
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == JobState::Completed.as_str()
    }
}
