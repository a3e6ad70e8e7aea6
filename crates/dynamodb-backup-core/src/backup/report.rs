//! Backup run report.

use serde::{Deserialize, Serialize};

use crate::dynamo::ExportStatus;
use crate::layout::BackupDate;

/// Result of one table within a backup run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableBackupResult {
    pub table_name: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_arn: Option<String>,
    /// Initial export status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ExportStatus>,
    /// Error message, verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TableBackupResult {
    pub fn started(table_name: impl Into<String>, export_arn: String, status: ExportStatus) -> Self {
        Self {
            table_name: table_name.into(),
            success: true,
            export_arn: Some(export_arn),
            status: Some(status),
            error: None,
        }
    }

    pub fn failed(table_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            success: false,
            export_arn: None,
            status: None,
            error: Some(error.into()),
        }
    }
}

/// Overall outcome of a backup run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupOutcome {
    AllSucceeded,
    Partial,
    Failed,
}

/// Summary of a backup run over several tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupReport {
    /// `YYYY-MM-DD`
    pub backup_date: String,
    pub total_tables: usize,
    pub success_count: usize,
    pub results: Vec<TableBackupResult>,
}

impl BackupReport {
    pub fn new(date: &BackupDate, results: Vec<TableBackupResult>) -> Self {
        Self {
            backup_date: date.iso(),
            total_tables: results.len(),
            success_count: results.iter().filter(|r| r.success).count(),
            results,
        }
    }

    pub fn failure_count(&self) -> usize {
        self.total_tables - self.success_count
    }

    /// An empty run counts as fully successful.
    pub fn outcome(&self) -> BackupOutcome {
        if self.success_count == self.total_tables {
            BackupOutcome::AllSucceeded
        } else if self.success_count == 0 {
            BackupOutcome::Failed
        } else {
            BackupOutcome::Partial
        }
    }

    /// 200 when every table succeeded, 207 otherwise
    pub fn status_code(&self) -> u16 {
        match self.outcome() {
            BackupOutcome::AllSucceeded => 200,
            _ => 207,
        }
    }
}
