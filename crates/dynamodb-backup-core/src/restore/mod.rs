//! Restore of daily backups into new tables.

pub mod engine;
pub mod monitor;

pub use engine::{restored_table_name, RestoreEngine, RestoreReport, SchemaSource, StartedRestore};
pub use monitor::ImportMonitor;
