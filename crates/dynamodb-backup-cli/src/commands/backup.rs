use anyhow::Result;
use dynamodb_backup_core::backup::{run_scheduled, BackupEngine, BackupOutcome, BackupReport};
use dynamodb_backup_core::dynamo::DynamoDbService;
use dynamodb_backup_core::Config;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

use super::backup_storage;
use super::output::{emit, OutputFormat};

/// Back up the tables listed in the configuration file.
pub async fn run(config_path: &str, format: OutputFormat) -> Result<ExitCode> {
    info!("Loading configuration from: {}", config_path);
    let config = Config::load(config_path)?.backup_config;

    let tables = DynamoDbService::connect(&config.source_region, None).await;
    let storage = backup_storage(&config)?;
    let engine = BackupEngine::new(Arc::new(tables), storage, config.s3_bucket.clone());

    let report = engine.run(&config.table_identifiers()).await;
    emit(format, &report, print_report)?;

    Ok(ExitCode::from(exit_status(report.outcome())))
}

/// Back up the tables named by the scheduled job's environment variables.
pub async fn run_from_env(format: OutputFormat) -> Result<ExitCode> {
    let response = run_scheduled().await?;
    emit(format, &response, |r| {
        println!("Status code: {}", r.status_code);
        match serde_json::to_string_pretty(&r.body) {
            Ok(body) => println!("{}", body),
            Err(_) => println!("{}", r.body),
        }
    })?;

    Ok(ExitCode::from(exit_status(response.outcome())))
}

/// 0 all succeeded, 2 partial, 1 failed
fn exit_status(outcome: BackupOutcome) -> u8 {
    match outcome {
        BackupOutcome::AllSucceeded => 0,
        BackupOutcome::Partial => 2,
        BackupOutcome::Failed => 1,
    }
}

fn print_report(report: &BackupReport) {
    println!("=== DynamoDB Backup ===");
    println!("Backup date: {}", report.backup_date);
    println!(
        "Tables:      {}/{} exports started",
        report.success_count, report.total_tables
    );
    println!();

    for result in &report.results {
        if result.success {
            println!(
                "  [OK]     {} | {} | {}",
                result.table_name,
                result.status.as_ref().map(|s| s.as_str()).unwrap_or("-"),
                result.export_arn.as_deref().unwrap_or("-")
            );
        } else {
            println!(
                "  [FAILED] {} | {}",
                result.table_name,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}
