//! Storage backend implementations

pub mod file;
pub mod memory;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;
#[cfg(feature = "s3")]
pub mod s3;

pub use file::{FileObjectStore, FileStatusStore};
pub use memory::{MemoryObjectStore, MemoryStatusStore, StoredObject};

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoStatusStore;
#[cfg(feature = "s3")]
pub use s3::S3ObjectStore;
