//! Storage configuration types and utilities

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage backend type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// Local directory tree (default)
    #[default]
    File,
    /// Memory storage (for testing)
    Memory,
    /// S3 for objects, DynamoDB for status records
    Aws,
}

impl BackendType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "file" => Some(Self::File),
            "memory" => Some(Self::Memory),
            "aws" | "s3" => Some(Self::Aws),
            _ => None,
        }
    }
}

/// Main storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage backend type
    #[serde(default)]
    pub backend: BackendType,

    /// Root directory for the file backend
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// AWS region for the aws backend
    #[serde(default = "default_region")]
    pub region: String,

    /// Custom endpoint for S3-compatible stores and local DynamoDB
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_base_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".ipp-publisher"))
        .unwrap_or_else(|| PathBuf::from("/tmp").join(".ipp-publisher"))
}

fn default_region() -> String {
    "mx-central-1".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendType::default(),
            base_dir: default_base_dir(),
            region: default_region(),
            endpoint: None,
        }
    }
}

impl StorageConfig {
    /// File backend rooted at `base_dir`
    pub fn file(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendType::File,
            base_dir: base_dir.into(),
            ..Default::default()
        }
    }

    /// Overlay `IPP_STORAGE_*` / `IPP_AWS_*` environment variables
    pub fn apply_env(&mut self) {
        if let Some(backend) = std::env::var("IPP_STORAGE_TYPE")
            .ok()
            .and_then(|s| BackendType::parse(&s))
        {
            self.backend = backend;
        }
        if let Ok(dir) = std::env::var("IPP_STORAGE_DIR") {
            self.base_dir = PathBuf::from(dir);
        }
        if let Ok(region) = std::env::var("IPP_AWS_REGION") {
            self.region = region;
        }
        if let Ok(endpoint) = std::env::var("IPP_AWS_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_type_default() {
        assert_eq!(BackendType::default(), BackendType::File);
    }

    #[test]
    fn test_backend_type_serialization() {
        assert_eq!(serde_json::to_string(&BackendType::Aws).unwrap(), r#""aws""#);
        let backend: BackendType = serde_json::from_str(r#""memory""#).unwrap();
        assert_eq!(backend, BackendType::Memory);
    }

    #[test]
    fn test_backend_type_parse() {
        assert_eq!(BackendType::parse("FILE"), Some(BackendType::File));
        assert_eq!(BackendType::parse("s3"), Some(BackendType::Aws));
        assert_eq!(BackendType::parse("postgres"), None);
    }

    #[test]
    fn test_storage_config_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.backend, BackendType::File);
        assert_eq!(config.region, "mx-central-1");
        assert!(config.endpoint.is_none());
        assert!(config.base_dir.to_string_lossy().contains(".ipp-publisher"));
    }

    #[test]
    fn test_storage_config_from_partial_toml() {
        let config: StorageConfig = toml::from_str(
            r#"
            backend = "aws"
            endpoint = "http://localhost:4566"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend, BackendType::Aws);
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:4566"));
        assert_eq!(config.region, "mx-central-1");
    }
}
