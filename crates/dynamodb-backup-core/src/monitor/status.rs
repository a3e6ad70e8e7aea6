//! Read-only backup status report.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::TableEntry;
use crate::dynamo::{ExportJob, TableService};
use crate::layout::{backup_path, BackupDate};
use crate::storage::StorageBackend;
use crate::Result;

/// Export jobs listed per table
pub const RECENT_EXPORTS: usize = 5;

/// Days of storage usage listed per table, today included
pub const RECENT_DAYS: u32 = 7;

/// Object count and size below a prefix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PrefixUsage {
    pub object_count: usize,
    pub total_bytes: u64,
}

impl PrefixUsage {
    pub fn megabytes(&self) -> f64 {
        self.total_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Storage usage of one daily backup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyUsage {
    pub date: BackupDate,
    pub usage: PrefixUsage,
}

/// Status of one configured table
#[derive(Debug, Clone, Serialize)]
pub struct TableStatus {
    pub table_name: String,
    /// Most recent export jobs, newest first
    pub exports: Vec<ExportJob>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_error: Option<String>,
    /// Today's backup, `None` when absent
    pub today: Option<PrefixUsage>,
    /// Days with a backup among the recent ones, newest first
    pub recent: Vec<DailyUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_error: Option<String>,
}

/// Status of all configured tables
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub checked_at: DateTime<Local>,
    pub bucket: String,
    pub table_count: usize,
    pub tables: Vec<TableStatus>,
}

/// Builds [`StatusReport`]s from the export service and object storage
pub struct StatusMonitor {
    tables: Arc<dyn TableService>,
    storage: Arc<dyn StorageBackend>,
    bucket: String,
}

impl StatusMonitor {
    pub fn new(
        tables: Arc<dyn TableService>,
        storage: Arc<dyn StorageBackend>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            tables,
            storage,
            bucket: bucket.into(),
        }
    }

    /// Report on `entries` as of now
    pub async fn check(&self, entries: &[TableEntry]) -> StatusReport {
        self.check_on(entries, BackupDate::today()).await
    }

    /// Report on `entries` treating `today` as the current date.
    ///
    /// Failures are recorded per table and never abort the report.
    pub async fn check_on(&self, entries: &[TableEntry], today: BackupDate) -> StatusReport {
        let mut tables = Vec::with_capacity(entries.len());

        for entry in entries {
            let mut status = TableStatus {
                table_name: entry.table_name.clone(),
                exports: Vec::new(),
                export_error: None,
                today: None,
                recent: Vec::new(),
                storage_error: None,
            };

            match self.recent_exports(entry).await {
                Ok(exports) => status.exports = exports,
                Err(e) => {
                    warn!("Failed to list exports of {}: {}", entry.table_name, e);
                    status.export_error = Some(e.to_string());
                }
            }

            match self.recent_usage(&entry.table_name, today).await {
                Ok(recent) => {
                    status.today = recent
                        .first()
                        .filter(|d| d.date == today)
                        .map(|d| d.usage);
                    status.recent = recent;
                }
                Err(e) => {
                    warn!("Failed to check storage of {}: {}", entry.table_name, e);
                    status.storage_error = Some(e.to_string());
                }
            }

            tables.push(status);
        }

        StatusReport {
            checked_at: Local::now(),
            bucket: self.bucket.clone(),
            table_count: entries.len(),
            tables,
        }
    }

    async fn recent_exports(&self, entry: &TableEntry) -> Result<Vec<ExportJob>> {
        let table_arn = if entry.table_arn.trim().is_empty() {
            self.tables.describe_table(&entry.table_name).await?.table_arn
        } else {
            entry.table_arn.clone()
        };
        self.tables.list_exports(&table_arn, RECENT_EXPORTS).await
    }

    /// Usage of each of the last days that holds any object, newest first
    async fn recent_usage(&self, table: &str, today: BackupDate) -> Result<Vec<DailyUsage>> {
        let mut recent = Vec::new();
        for offset in 0..RECENT_DAYS {
            let date = today.days_before(offset);
            let usage = self.usage(&backup_path(&date, table)).await?;
            if usage.object_count > 0 {
                recent.push(DailyUsage { date, usage });
            } else {
                debug!("No backup of {} on {}", table, date);
            }
        }
        Ok(recent)
    }

    async fn usage(&self, prefix: &str) -> Result<PrefixUsage> {
        let objects = self.storage.list_objects(prefix).await?;
        Ok(PrefixUsage {
            object_count: objects.len(),
            total_bytes: objects.iter().map(|o| o.meta.size).sum(),
        })
    }
}
