//! Daily backup of configured tables.

pub mod engine;
pub mod report;
pub mod scheduled;

pub use engine::BackupEngine;
pub use report::{BackupOutcome, BackupReport, TableBackupResult};
pub use scheduled::{run_from_env as run_scheduled, ScheduledResponse};
