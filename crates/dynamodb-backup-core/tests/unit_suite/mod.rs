//! Unit tests for dynamodb-backup-core.

pub mod backup;
pub mod helpers;
pub mod locator;
pub mod monitor;
pub mod restore;
pub mod schema;
