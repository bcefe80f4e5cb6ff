//! Errors raised by object and status stores

use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure of a single storage operation.
///
/// Stores never retry; the pipeline wraps these into the error kind of the stage that
/// issued the operation.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Key, record or bucket does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A conditional write was rejected
    #[error("Condition failed: {0}")]
    Conflict(String),

    /// Store settings are unusable (bad key, missing feature, bad region)
    #[error("Storage configuration error: {0}")]
    Configuration(String),

    /// The backend could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// The backend rejected or failed the request
    #[error("Backend error: {0}")]
    Backend(String),

    /// The operation exceeded its time budget
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

impl StorageError {
    pub fn serialization<E: fmt::Display>(err: E) -> Self {
        Self::Serialization(err.to_string())
    }

    pub fn not_found<E: fmt::Display>(item: E) -> Self {
        Self::NotFound(item.to_string())
    }

    pub fn conflict<E: fmt::Display>(msg: E) -> Self {
        Self::Conflict(msg.to_string())
    }

    pub fn configuration<E: fmt::Display>(msg: E) -> Self {
        Self::Configuration(msg.to_string())
    }

    pub fn connection<E: fmt::Display>(msg: E) -> Self {
        Self::Connection(msg.to_string())
    }

    pub fn backend<E: fmt::Display>(msg: E) -> Self {
        Self::Backend(msg.to_string())
    }

    /// Transient failures a caller may choose to retry; the pipeline itself never does
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Connection(_) | Self::Timeout(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(StorageError::not_found("results/job/metadata.json").is_not_found());
        assert!(StorageError::Timeout(Duration::from_secs(1)).is_timeout());
        assert!(StorageError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(!StorageError::conflict("attribute_exists(job_id)").is_transient());
    }

    #[test]
    fn test_serde_json_errors_convert() {
        let err: StorageError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn test_timeout_message() {
        let err = StorageError::Timeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "Operation timed out after 5s");
    }
}
