use anyhow::Result;
use dynamodb_backup_core::dynamo::DynamoDbService;
use dynamodb_backup_core::monitor::{StatusMonitor, StatusReport};
use dynamodb_backup_core::Config;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

use super::backup_storage;
use super::output::{emit, OutputFormat};

/// Show recent exports and stored backups of the configured tables.
pub async fn run(config_path: &str, format: OutputFormat) -> Result<ExitCode> {
    info!("Loading configuration from: {}", config_path);
    let config = Config::load(config_path)?.backup_config;

    let tables = DynamoDbService::connect(&config.source_region, None).await;
    let monitor = StatusMonitor::new(Arc::new(tables), backup_storage(&config)?, config.s3_bucket.clone());

    let report = monitor.check(&config.tables).await;
    emit(format, &report, |r| print_report(r, &config.target_region))?;

    Ok(ExitCode::SUCCESS)
}

fn print_report(report: &StatusReport, region: &str) {
    println!("=== DynamoDB backup status ===");
    println!("Checked at: {}", report.checked_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Tables:     {}", report.table_count);
    println!("S3 bucket:  {} ({})", report.bucket, region);

    for table in &report.tables {
        println!();
        println!("--- Table: {} ---", table.table_name);

        println!("Recent exports:");
        match &table.export_error {
            Some(error) => println!("  Failed to list exports: {}", error),
            None if table.exports.is_empty() => println!("  none"),
            None => {
                for export in &table.exports {
                    let time = export
                        .export_time
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_else(|| "unknown".to_string());
                    println!("  {} | {}", time, export.status);
                }
            }
        }

        println!("Stored backups:");
        if let Some(error) = &table.storage_error {
            println!("  Failed to check S3: {}", error);
            continue;
        }
        match &table.today {
            Some(usage) => println!(
                "  Today: {} files, {:.2} MB",
                usage.object_count,
                usage.megabytes()
            ),
            None => println!("  Today: not found"),
        }
        println!("  Last 7 days:");
        for day in &table.recent {
            println!("    {}: {:.2} MB", day.date, day.usage.megabytes());
        }
    }
}
