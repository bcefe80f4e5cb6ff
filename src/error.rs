//! Error types for result publication
//!
//! Every stage of the pipeline returns [`PublishResult`]; the first error aborts the run
//! and reaches the caller unmodified. Nothing already written is rolled back.

use crate::storage::StorageError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type for publication operations
pub type PublishResult<T> = Result<T, PublishError>;

/// Main error type for the publication pipeline
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Failed to write partition for client {client} to {key}: {source}")]
    PartitionWrite {
        client: String,
        key: String,
        #[source]
        source: StorageError,
    },

    #[error(
        "Aggregated row count {aggregated} does not match result set row count {expected}"
    )]
    AggregationMismatch { expected: usize, aggregated: usize },

    #[error("Failed to write manifest for job {job_id} to {key}: {source}")]
    ManifestWrite {
        job_id: String,
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("Failed to update status record for job {job_id}: {source}")]
    StatusUpdate {
        job_id: String,
        #[source]
        source: StorageError,
    },

    #[error("Invalid configuration: {message}")]
    Configuration { message: String },
}

/// Error category, stable across message changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    #[serde(rename = "validation_error")]
    Validation,
    #[serde(rename = "partition_write_error")]
    PartitionWrite,
    #[serde(rename = "aggregation_mismatch_error")]
    AggregationMismatch,
    #[serde(rename = "manifest_write_error")]
    ManifestWrite,
    #[serde(rename = "status_update_error")]
    StatusUpdate,
    #[serde(rename = "configuration_error")]
    Configuration,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation_error",
            Self::PartitionWrite => "partition_write_error",
            Self::AggregationMismatch => "aggregation_mismatch_error",
            Self::ManifestWrite => "manifest_write_error",
            Self::StatusUpdate => "status_update_error",
            Self::Configuration => "configuration_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PublishError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a validation error attributed to a field
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::PartitionWrite { .. } => ErrorKind::PartitionWrite,
            Self::AggregationMismatch { .. } => ErrorKind::AggregationMismatch,
            Self::ManifestWrite { .. } => ErrorKind::ManifestWrite,
            Self::StatusUpdate { .. } => ErrorKind::StatusUpdate,
            Self::Configuration { .. } => ErrorKind::Configuration,
        }
    }

    /// Underlying storage failure, if any
    pub fn storage_source(&self) -> Option<&StorageError> {
        match self {
            Self::PartitionWrite { source, .. }
            | Self::ManifestWrite { source, .. }
            | Self::StatusUpdate { source, .. } => Some(source),
            _ => None,
        }
    }

    /// True when data artifacts may exist in storage without a manifest
    pub fn may_leave_orphans(&self) -> bool {
        matches!(
            self,
            Self::PartitionWrite { .. } | Self::AggregationMismatch { .. } | Self::ManifestWrite { .. }
        )
    }

    /// Process exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Validation => 2,
            ErrorKind::Configuration => 3,
            ErrorKind::PartitionWrite => 10,
            ErrorKind::AggregationMismatch => 11,
            ErrorKind::ManifestWrite => 12,
            ErrorKind::StatusUpdate => 13,
        }
    }
}
