//! Restore engine orchestration.
//!
//! A restore never touches the source table: data is imported into a new
//! table named `<table>-restored-<YYYYmmdd-HHMMSS>`.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use super::monitor::ImportMonitor;
use crate::config::PollOptions;
use crate::dynamo::{ImportJob, ImportRequest, ImportStatus, TableService};
use crate::layout::BackupDate;
use crate::locator::{BackupLocation, BackupLocator};
use crate::schema::{SchemaCache, TableSchema};
use crate::storage::StorageBackend;
use crate::{Error, Result};

/// Where the schema of a restore came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaSource {
    /// `table_schema.json` stored alongside the export
    Backup,
    /// Local schema cache file
    LocalCache,
}

/// A submitted import
#[derive(Debug, Clone, Serialize)]
pub struct StartedRestore {
    pub source: BackupLocation,
    pub new_table_name: String,
    pub schema_source: SchemaSource,
    pub import: ImportJob,
}

/// Final state of a restore
#[derive(Debug, Clone, Serialize)]
pub struct RestoreReport {
    pub source: BackupLocation,
    pub new_table_name: String,
    pub schema_source: SchemaSource,
    pub import_arn: String,
    pub status: ImportStatus,
    pub processed_item_count: Option<i64>,
    pub imported_item_count: Option<i64>,
    pub failure_message: Option<String>,
}

impl RestoreReport {
    fn new(started: StartedRestore, job: ImportJob) -> Self {
        Self {
            source: started.source,
            new_table_name: started.new_table_name,
            schema_source: started.schema_source,
            import_arn: job.import_arn,
            status: job.status,
            processed_item_count: job.processed_item_count,
            imported_item_count: job.imported_item_count,
            failure_message: job.failure_message,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == ImportStatus::Completed
    }
}

/// Name of the table a restore creates
pub fn restored_table_name(table: &str, now: DateTime<Local>) -> String {
    format!("{}-restored-{}", table, now.format("%Y%m%d-%H%M%S"))
}

/// Restore engine importing daily backups into new tables
pub struct RestoreEngine {
    tables: Arc<dyn TableService>,
    storage: Arc<dyn StorageBackend>,
    bucket: String,
    locator: BackupLocator,
    cache: SchemaCache,
    monitor: ImportMonitor,
}

impl RestoreEngine {
    /// Create a restore engine.
    ///
    /// `tables` must be connected to the target region.
    pub fn new(
        tables: Arc<dyn TableService>,
        storage: Arc<dyn StorageBackend>,
        bucket: impl Into<String>,
        cache: SchemaCache,
        poll: PollOptions,
    ) -> Self {
        Self {
            locator: BackupLocator::new(Arc::clone(&storage)),
            monitor: ImportMonitor::new(Arc::clone(&tables), poll),
            tables,
            storage,
            bucket: bucket.into(),
            cache,
        }
    }

    /// Signal shutdown.
    ///
    /// Before submission the restore stops without importing; afterwards
    /// only monitoring stops.
    pub fn shutdown(&self) {
        self.monitor.shutdown();
    }

    /// Get a clone of the shutdown sender for external signal handling
    pub fn shutdown_handle(&self) -> watch::Sender<bool> {
        self.monitor.shutdown_handle()
    }

    /// Locate, submit and monitor a restore of `table`.
    ///
    /// Without a date the most recent backup is used.
    pub async fn run(&self, table: &str, date: Option<&BackupDate>) -> Result<RestoreReport> {
        let started = self.start(table, date).await?;
        let job = self.monitor.watch(&started.import.import_arn).await?;

        match job.status {
            ImportStatus::Completed => info!(
                "Import completed: processed {} items, imported {} items",
                count(job.processed_item_count),
                count(job.imported_item_count)
            ),
            _ => warn!(
                "Import ended with status {}: {}",
                job.status,
                job.failure_message.as_deref().unwrap_or("Unknown")
            ),
        }

        Ok(RestoreReport::new(started, job))
    }

    /// Locate the backup and submit the import without waiting for it.
    pub async fn start(&self, table: &str, date: Option<&BackupDate>) -> Result<StartedRestore> {
        let source = match date {
            Some(date) => self.locator.find_by_date(table, date).await?,
            None => self.locator.find_latest(table).await?,
        };
        info!("Using backup s3://{}/{}", self.bucket, source.data_prefix);

        let (schema, schema_source) = self.load_schema(&source).await?;

        if self.monitor.is_shutdown() {
            return Err(Error::Interrupted(format!(
                "no import of {} was submitted",
                table
            )));
        }

        let new_table_name = restored_table_name(table, Local::now());
        info!("Restoring {} into new table {}", table, new_table_name);

        let import = self
            .tables
            .import_table(&ImportRequest {
                bucket: self.bucket.clone(),
                data_prefix: source.data_prefix.clone(),
                schema: schema.renamed(&new_table_name),
            })
            .await?;
        info!("Import submitted: {} ({})", import.import_arn, import.status);

        Ok(StartedRestore {
            source,
            new_table_name,
            schema_source,
            import,
        })
    }

    /// Schema stored with the backup, else the local cache.
    pub async fn load_schema(&self, source: &BackupLocation) -> Result<(TableSchema, SchemaSource)> {
        let key = source.schema_key();
        let stored = match self.storage.get(&key).await {
            Ok(data) => TableSchema::from_json(&data),
            Err(e) => Err(e),
        };

        let backup_error = match stored {
            Ok(schema) => {
                info!("Loaded table schema from s3://{}/{}", self.bucket, key);
                return Ok((schema, SchemaSource::Backup));
            }
            Err(e) => {
                warn!("Cannot load table schema from s3://{}/{}: {}, trying local file", self.bucket, key, e);
                e
            }
        };

        match self.cache.load().await {
            Ok(schema) => {
                if schema.table_name != source.table_name {
                    warn!(
                        "Local schema describes table {}, restoring {}",
                        schema.table_name, source.table_name
                    );
                }
                info!("Loaded table schema from {}", self.cache.path().display());
                Ok((schema, SchemaSource::LocalCache))
            }
            Err(cache_error) => Err(Error::SchemaUnavailable {
                table: source.table_name.clone(),
                reason: format!("backup copy: {}; local copy: {}", backup_error, cache_error),
            }),
        }
    }
}

fn count(value: Option<i64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}
