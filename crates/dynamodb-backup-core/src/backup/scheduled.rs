//! Environment-driven entry point of the scheduled backup job.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

use super::engine::BackupEngine;
use super::report::BackupOutcome;
use crate::config::ScheduledBackupConfig;
use crate::dynamo::DynamoDbService;
use crate::storage::{S3Backend, S3Config};
use crate::Result;

/// Response of the scheduled job, in the shape the function runtime returns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: serde_json::Value,
}

impl ScheduledResponse {
    fn empty_table_list() -> Self {
        Self {
            status_code: 400,
            body: json!({"success": false, "error": "TABLE_ARNS is empty"}),
        }
    }

    /// Outcome of the run this response reports. A rejected request counts
    /// as failed.
    pub fn outcome(&self) -> BackupOutcome {
        match self.status_code {
            200 => BackupOutcome::AllSucceeded,
            207 if self.body["success_count"].as_u64().unwrap_or(0) > 0 => BackupOutcome::Partial,
            _ => BackupOutcome::Failed,
        }
    }
}

/// Run the job for `config` with an already constructed engine.
pub async fn handle(config: &ScheduledBackupConfig, engine: &BackupEngine) -> Result<ScheduledResponse> {
    if config.tables.is_empty() {
        error!("TABLE_ARNS is empty");
        return Ok(ScheduledResponse::empty_table_list());
    }

    let report = engine.run(&config.tables).await;
    Ok(ScheduledResponse {
        status_code: report.status_code(),
        body: serde_json::to_value(&report)?,
    })
}

/// Read the job configuration from the environment, connect the clients and
/// run the job.
pub async fn run_from_env() -> Result<ScheduledResponse> {
    let config = ScheduledBackupConfig::from_env()?;
    let tables = DynamoDbService::connect(&config.source_region, None).await;
    let storage = S3Backend::new(S3Config::new(&config.s3_bucket, &config.s3_region, None))?;

    let engine = BackupEngine::new(Arc::new(tables), Arc::new(storage), config.s3_bucket.clone());
    handle(&config, &engine).await
}
