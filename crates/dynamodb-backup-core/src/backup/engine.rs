//! Backup engine orchestration.

use bytes::Bytes;
use std::sync::Arc;
use tracing::{error, info};

use super::report::{BackupReport, TableBackupResult};
use crate::dynamo::{ExportJob, ExportRequest, TableService};
use crate::layout::{backup_path, schema_key, table_name_from_identifier, BackupDate};
use crate::storage::StorageBackend;
use crate::Result;

/// Backup engine exporting tables to the daily tree
pub struct BackupEngine {
    tables: Arc<dyn TableService>,
    storage: Arc<dyn StorageBackend>,
    bucket: String,
}

impl BackupEngine {
    /// Create a backup engine writing to `bucket` through `storage`
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

    /// Back up every table under today's date
    pub async fn run(&self, identifiers: &[String]) -> BackupReport {
        self.run_for_date(identifiers, BackupDate::today()).await
    }

    /// Back up every table under `date`.
    ///
    /// Tables are processed one at a time; a failing table is recorded in the
    /// report and the run moves on.
    pub async fn run_for_date(&self, identifiers: &[String], date: BackupDate) -> BackupReport {
        info!(
            "Backing up {} tables to s3://{}/ for {}",
            identifiers.len(),
            self.bucket,
            date
        );

        let mut results = Vec::with_capacity(identifiers.len());
        for identifier in identifiers {
            let table_name = table_name_from_identifier(identifier);

            match self.backup_table(identifier, &date).await {
                Ok(job) => {
                    info!(
                        "Export started for {}: {} ({})",
                        table_name, job.export_arn, job.status
                    );
                    results.push(TableBackupResult::started(table_name, job.export_arn, job.status));
                }
                Err(e) => {
                    error!("Backup of table {} failed: {}", table_name, e);
                    results.push(TableBackupResult::failed(table_name, e.to_string()));
                }
            }
        }

        let report = BackupReport::new(&date, results);
        info!(
            "Backup run finished: {}/{} tables started",
            report.success_count, report.total_tables
        );
        report
    }

    /// Upload the schema of one table, then start its export
    async fn backup_table(&self, identifier: &str, date: &BackupDate) -> Result<ExportJob> {
        let table_name = table_name_from_identifier(identifier);
        let prefix = backup_path(date, table_name);
        info!("Starting backup of {} to s3://{}/{}", identifier, self.bucket, prefix);

        let details = self.tables.describe_table(identifier).await?;

        let key = schema_key(&prefix);
        let body = details.schema.to_json()?;
        self.storage.put_json(&key, Bytes::from(body)).await?;
        info!("Table schema saved to s3://{}/{}", self.bucket, key);

        // Plain names are resolved to the ARN the export API requires
        let table_arn = if identifier.starts_with("arn:") {
            identifier.to_string()
        } else {
            details.table_arn
        };

        self.tables
            .export_table(&ExportRequest {
                table_arn,
                bucket: self.bucket.clone(),
                prefix,
            })
            .await
    }
}
