//! DynamoDB Backup Core Library
//!
//! This crate provides the core functionality for backing up DynamoDB tables
//! to S3 as daily point-in-time exports, locating those backups, restoring
//! them into new tables and reporting on their status.

pub mod backup;
pub mod config;
pub mod dynamo;
pub mod error;
pub mod extract;
pub mod layout;
pub mod locator;
pub mod monitor;
pub mod restore;
pub mod schema;
pub mod storage;

pub use backup::{BackupEngine, BackupOutcome, BackupReport, ScheduledResponse, TableBackupResult};
pub use config::{BackupConfig, Config, PollOptions, ScheduledBackupConfig, TableEntry};
pub use dynamo::{DynamoDbService, ExportJob, ExportStatus, ImportJob, ImportStatus, TableService};
pub use error::{Error, Result};
pub use extract::export_schema;
pub use layout::BackupDate;
pub use locator::{BackupLocation, BackupLocator};
pub use monitor::{FunctionInvoker, LambdaInvoker, StatusMonitor, StatusReport};
pub use restore::{ImportMonitor, RestoreEngine, RestoreReport, SchemaSource};
pub use schema::{SchemaCache, TableSchema};
pub use storage::{S3Backend, S3Config, StorageBackend};
