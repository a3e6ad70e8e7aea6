//! In-memory storage backend for testing.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use std::sync::Arc;

use super::{ListedObject, ObjectMetadata, StorageBackend};
use crate::error::StorageError;
use crate::{Error, Result};

/// In-memory storage backend using object_store
///
/// This backend is primarily useful for testing purposes as it doesn't
/// persist data between runs.
pub struct MemoryBackend {
    store: Arc<InMemory>,
}

impl MemoryBackend {
    /// Create a new in-memory storage backend
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn map_err(op: &str, key: &str, e: object_store::Error) -> Error {
    match e {
        object_store::Error::NotFound { .. } => Error::Storage(StorageError::NotFound(key.to_string())),
        _ => Error::Storage(StorageError::Backend(format!("Memory {} failed: {}", op, e))),
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        let path = Path::from(key);
        self.store
            .put(&path, PutPayload::from_bytes(data))
            .await
            .map_err(|e| map_err("PUT", key, e))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes> {
        let path = Path::from(key);
        let result = self
            .store
            .get(&path)
            .await
            .map_err(|e| map_err("GET", key, e))?;

        result
            .bytes()
            .await
            .map_err(|e| Error::Storage(StorageError::Backend(format!("Failed to read bytes: {}", e))))
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ListedObject>> {
        let prefix_path = Path::from(prefix);
        let mut objects = Vec::new();
        let mut stream = self.store.list(Some(&prefix_path));

        while let Some(result) = stream.next().await {
            let meta = result.map_err(|e| map_err("LIST", prefix, e))?;
            objects.push(ListedObject {
                key: meta.location.to_string(),
                meta: ObjectMetadata {
                    size: meta.size as u64,
                    last_modified: meta.last_modified.timestamp_millis(),
                },
            });
        }

        Ok(objects)
    }

    async fn list_prefixes(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix_path = Path::from(prefix);
        let listing = self
            .store
            .list_with_delimiter(Some(&prefix_path))
            .await
            .map_err(|e| map_err("LIST", prefix, e))?;

        Ok(listing
            .common_prefixes
            .into_iter()
            .map(|p| p.to_string())
            .collect())
    }
}
