//! Backup status monitoring and remote triggering.

pub mod status;
pub mod trigger;

pub use status::{DailyUsage, PrefixUsage, StatusMonitor, StatusReport, TableStatus};
pub use trigger::{trigger_backup, FunctionInvoker, InvocationResult, LambdaInvoker, DEFAULT_FUNCTION_NAME};
