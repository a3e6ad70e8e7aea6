pub mod backup;
pub mod export_schema;
pub mod list;
pub mod output;
pub mod restore;
pub mod status;
pub mod trigger;

use anyhow::Result;
use dynamodb_backup_core::storage::{S3Backend, S3Config, StorageBackend};
use dynamodb_backup_core::BackupConfig;
use std::sync::Arc;
use tracing::info;

/// Storage backend for the configured bucket, in the target region.
pub(crate) fn backup_storage(config: &BackupConfig) -> Result<Arc<dyn StorageBackend>> {
    info!(
        "Using bucket s3://{}/ ({})",
        config.s3_bucket, config.target_region
    );
    let s3_config = S3Config::new(
        &config.s3_bucket,
        &config.target_region,
        config.s3_endpoint.as_deref(),
    );
    Ok(Arc::new(S3Backend::new(s3_config)?))
}
