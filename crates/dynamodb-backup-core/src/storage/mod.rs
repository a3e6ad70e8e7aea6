//! Storage backend abstraction and implementations.
//!
//! - **S3**: AWS S3 and S3-compatible services, where backups live
//! - **Memory**: In-memory storage (for testing)

mod backend;
mod memory;
mod s3;

pub use backend::{ListedObject, ObjectMetadata, StorageBackend};
pub use memory::MemoryBackend;
pub use s3::{S3Backend, S3Config};
