//! Storage backend trait definition.

use async_trait::async_trait;
use bytes::Bytes;

use crate::Result;

/// Metadata about a stored object
#[derive(Debug, Clone)]
pub struct ObjectMetadata {
    /// Size in bytes
    pub size: u64,
    /// Last modified timestamp (epoch milliseconds)
    pub last_modified: i64,
}

/// An object returned by a listing
#[derive(Debug, Clone)]
pub struct ListedObject {
    /// Full key
    pub key: String,
    /// Object metadata
    pub meta: ObjectMetadata,
}

/// Trait for storage backends
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write data to a key
    async fn put(&self, key: &str, data: Bytes) -> Result<()>;

    /// Write a JSON document to a key
    async fn put_json(&self, key: &str, data: Bytes) -> Result<()> {
        self.put(key, data).await
    }

    /// Read data from a key
    async fn get(&self, key: &str) -> Result<Bytes>;

    /// List objects with their metadata under a prefix
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ListedObject>>;

    /// List the immediate "directories" below a prefix.
    ///
    /// Returned prefixes carry no trailing delimiter, e.g. listing `daily`
    /// yields `daily/2025`.
    async fn list_prefixes(&self, prefix: &str) -> Result<Vec<String>>;
}
