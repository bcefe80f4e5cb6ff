//! Storage abstraction layer
//!
//! Object storage receives partition artifacts and the job manifest; the status store
//! holds the externally created job status records. Both sit behind traits so the
//! pipeline runs unchanged against memory, local files or AWS.

pub mod backends;
pub mod config;
pub mod error;
pub mod factory;
pub mod traits;
pub mod types;

pub use backends::{FileObjectStore, FileStatusStore, MemoryObjectStore, MemoryStatusStore};
pub use config::{BackendType, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use factory::{StorageFactory, StorageHandles};
pub use traits::{ObjectStore, StatusStore};
pub use types::{JobState, JobStatusRecord, JobStatusUpdate, JSON_CONTENT_TYPE};
