//! S3 storage backend using object_store.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::{Attribute, Attributes, ObjectMeta, ObjectStore, PutOptions, PutPayload};
use std::sync::Arc;
use tracing::{debug, info};

use super::{ListedObject, ObjectMetadata, StorageBackend};
use crate::error::StorageError;
use crate::{Error, Result};

/// S3 storage backend configuration
#[derive(Debug, Clone)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,
    /// AWS region of the bucket
    pub region: Option<String>,
    /// Custom endpoint (for S3-compatible services like MinIO)
    pub endpoint: Option<String>,
    /// Allow HTTP (insecure) connections
    pub allow_http: bool,
}

impl S3Config {
    /// Bucket in `region`, optionally behind a custom endpoint. Plain
    /// `http://` endpoints enable insecure connections.
    pub fn new(bucket: &str, region: &str, endpoint: Option<&str>) -> Self {
        Self {
            bucket: bucket.to_string(),
            region: Some(region.to_string()),
            endpoint: endpoint.map(str::to_string),
            allow_http: endpoint.is_some_and(|e| e.starts_with("http://")),
        }
    }
}

/// S3 storage backend
///
/// Credentials are read from the standard `AWS_*` environment variables.
pub struct S3Backend {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl S3Backend {
    /// Create a new S3 backend
    pub fn new(config: S3Config) -> Result<Self> {
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(&config.bucket);

        if let Some(region) = &config.region {
            builder = builder.with_region(region);
        }

        if let Some(endpoint) = &config.endpoint {
            builder = builder.with_endpoint(endpoint);
            builder = builder.with_virtual_hosted_style_request(false);
        }

        if config.allow_http {
            builder = builder.with_allow_http(true);
        }

        let store = builder.build().map_err(|e| {
            Error::Storage(StorageError::Backend(format!(
                "Failed to create S3 client: {}",
                e
            )))
        })?;

        info!(
            "Created S3 backend for bucket: {}, region: {:?}",
            config.bucket, config.region
        );

        Ok(Self {
            store: Arc::new(store),
            bucket: config.bucket,
        })
    }
}

fn backend_err(op: &str, e: object_store::Error) -> Error {
    match e {
        object_store::Error::NotFound { path, .. } => Error::Storage(StorageError::NotFound(path)),
        other => Error::Storage(StorageError::Backend(format!("S3 {} failed: {}", op, other))),
    }
}

fn to_metadata(meta: &ObjectMeta) -> ObjectMetadata {
    ObjectMetadata {
        size: meta.size as u64,
        last_modified: meta.last_modified.timestamp_millis(),
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        let path = Path::from(key);
        debug!("S3 PUT: s3://{}/{}", self.bucket, path);

        self.store
            .put(&path, PutPayload::from_bytes(data))
            .await
            .map_err(|e| backend_err("PUT", e))?;

        Ok(())
    }

    async fn put_json(&self, key: &str, data: Bytes) -> Result<()> {
        let path = Path::from(key);
        debug!("S3 PUT (json): s3://{}/{}", self.bucket, path);

        let opts = PutOptions {
            attributes: Attributes::from_iter([(Attribute::ContentType, "application/json")]),
            ..Default::default()
        };

        self.store
            .put_opts(&path, PutPayload::from_bytes(data), opts)
            .await
            .map_err(|e| backend_err("PUT", e))?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes> {
        let path = Path::from(key);
        debug!("S3 GET: s3://{}/{}", self.bucket, path);

        let result = self
            .store
            .get(&path)
            .await
            .map_err(|e| backend_err("GET", e))?;

        result.bytes().await.map_err(|e| {
            Error::Storage(StorageError::Backend(format!(
                "Failed to read S3 response: {}",
                e
            )))
        })
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ListedObject>> {
        let prefix_path = Path::from(prefix);
        debug!("S3 LIST: s3://{}/{}", self.bucket, prefix_path);

        let mut objects = Vec::new();
        let mut stream = self.store.list(Some(&prefix_path));

        while let Some(result) = stream.next().await {
            let meta = result.map_err(|e| backend_err("LIST", e))?;
            objects.push(ListedObject {
                key: meta.location.to_string(),
                meta: to_metadata(&meta),
            });
        }

        Ok(objects)
    }

    async fn list_prefixes(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix_path = Path::from(prefix);
        debug!("S3 LIST (delimiter): s3://{}/{}", self.bucket, prefix_path);

        let listing = self
            .store
            .list_with_delimiter(Some(&prefix_path))
            .await
            .map_err(|e| backend_err("LIST", e))?;

        Ok(listing
            .common_prefixes
            .into_iter()
            .map(|p| p.to_string())
            .collect())
    }
}
