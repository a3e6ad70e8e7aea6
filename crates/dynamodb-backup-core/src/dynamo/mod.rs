//! Managed table service: schema lookup, point-in-time export and bulk import.
//!
//! The orchestrators talk to DynamoDB only through [`TableService`], so a run
//! constructs one client per region and passes it in explicitly.

mod aws;
mod memory;

pub use aws::{load_sdk_config, DynamoDbService};
pub use memory::InMemoryTableService;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::TableSchema;
use crate::Result;

/// Table schema plus the ARN the export API needs
#[derive(Debug, Clone)]
pub struct TableDetails {
    pub table_arn: String,
    pub schema: TableSchema,
}

/// Point-in-time export of a whole table to S3.
///
/// Exports are always written as `DYNAMODB_JSON` with AES256 server-side
/// encryption.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub table_arn: String,
    pub bucket: String,
    pub prefix: String,
}

/// Export job status as reported by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportStatus {
    InProgress,
    Completed,
    Failed,
    #[serde(untagged)]
    Other(String),
}

impl ExportStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "IN_PROGRESS" => ExportStatus::InProgress,
            "COMPLETED" => ExportStatus::Completed,
            "FAILED" => ExportStatus::Failed,
            other => ExportStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ExportStatus::InProgress => "IN_PROGRESS",
            ExportStatus::Completed => "COMPLETED",
            ExportStatus::Failed => "FAILED",
            ExportStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Export job summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJob {
    pub export_arn: String,
    pub status: ExportStatus,
    #[serde(default)]
    pub export_time: Option<DateTime<Utc>>,
}

/// Bulk import of exported data into a new table
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub bucket: String,
    /// Data prefix of the export (`.../AWSDynamoDB/<export-id>/data/`)
    pub data_prefix: String,
    /// Creation parameters of the new table
    pub schema: TableSchema,
}

/// Import job status.
///
/// A job returned by the import call is in the submitted state; polling moves
/// it through `InProgress` to `Completed`, `Failed` or `Cancelled`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStatus {
    InProgress,
    Completed,
    Cancelling,
    Cancelled,
    Failed,
    #[serde(untagged)]
    Other(String),
}

impl ImportStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "IN_PROGRESS" => ImportStatus::InProgress,
            "COMPLETED" => ImportStatus::Completed,
            "CANCELLING" => ImportStatus::Cancelling,
            "CANCELLED" => ImportStatus::Cancelled,
            "FAILED" => ImportStatus::Failed,
            other => ImportStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ImportStatus::InProgress => "IN_PROGRESS",
            ImportStatus::Completed => "COMPLETED",
            ImportStatus::Cancelling => "CANCELLING",
            ImportStatus::Cancelled => "CANCELLED",
            ImportStatus::Failed => "FAILED",
            ImportStatus::Other(s) => s,
        }
    }

    /// No further transitions happen from this status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ImportStatus::Completed | ImportStatus::Failed | ImportStatus::Cancelled
        )
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Import job snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportJob {
    pub import_arn: String,
    pub status: ImportStatus,
    #[serde(default)]
    pub processed_item_count: Option<i64>,
    #[serde(default)]
    pub imported_item_count: Option<i64>,
    #[serde(default)]
    pub failure_message: Option<String>,
}

/// Operations the backup tooling needs from the table service
#[async_trait]
pub trait TableService: Send + Sync {
    /// Describe a table by name or ARN and reduce it to its schema.
    ///
    /// Returns `Error::TableNotFound` when the table does not exist.
    async fn describe_table(&self, table: &str) -> Result<TableDetails>;

    /// Start a point-in-time export
    async fn export_table(&self, request: &ExportRequest) -> Result<ExportJob>;

    /// Most recent exports of a table, newest first
    async fn list_exports(&self, table_arn: &str, limit: usize) -> Result<Vec<ExportJob>>;

    /// Start a bulk import into a new table
    async fn import_table(&self, request: &ImportRequest) -> Result<ImportJob>;

    /// Current state of an import
    async fn describe_import(&self, import_arn: &str) -> Result<ImportJob>;
}
