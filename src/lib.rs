//! # ipp-publisher
//!
//! Publishes the output of a batch pricing/inventory computation: rows are partitioned
//! by client, each partition is stored as a self-describing JSON artifact, a manifest
//! listing every partition is written last as the completion signal, and the job's
//! status record is updated for pollers.
//!
//! ## Usage
//!
//! ```bash
//! ipp-publisher publish --config job.toml --results results.csv
//! ipp-publisher verify --config job.toml
//! ```
//!
//! ## Modules
//!
//! - `publish` - The publication pipeline and its stages
//! - `results` - Result rows, typed values and result set loading
//! - `storage` - Object and status store abstractions with memory, file and AWS backends
//! - `config` - Job configuration, counter derivation and publication options
//! - `error` - Pipeline error kinds
//! - `app` - Logging and process-level error handling for the CLI

pub mod app;
pub mod config;
pub mod error;
pub mod publish;
pub mod results;
pub mod storage;

pub use config::{JobConfig, PublishOptions};
pub use error::{ErrorKind, PublishError, PublishResult};
pub use publish::{verify_publication, JobContext, JobManifest, PublishPipeline, PublishReport};
pub use results::{FieldValue, ResultRow, ResultSet};
