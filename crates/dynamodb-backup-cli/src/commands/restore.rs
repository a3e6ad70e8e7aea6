use anyhow::Result;
use dynamodb_backup_core::dynamo::DynamoDbService;
use dynamodb_backup_core::restore::{RestoreEngine, RestoreReport};
use dynamodb_backup_core::schema::SchemaCache;
use dynamodb_backup_core::{BackupDate, Config, Error};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use super::backup_storage;
use super::output::{emit, OutputFormat};

/// Restore `table` into a new table in `region`.
pub async fn run(
    config_path: &str,
    table: &str,
    region: &str,
    date: Option<&str>,
    format: OutputFormat,
) -> Result<ExitCode> {
    info!("Loading configuration from: {}", config_path);
    let config = Config::load(config_path)?.backup_config;
    let date: Option<BackupDate> = date.map(str::parse).transpose()?;

    let tables = DynamoDbService::connect(region, None).await;
    let engine = RestoreEngine::new(
        Arc::new(tables),
        backup_storage(&config)?,
        config.s3_bucket.clone(),
        SchemaCache::new(&config.schema_cache_path),
        config.restore_poll.clone(),
    );

    info!("Restoring {} into region {}", table, region);

    // Ctrl-C before submission skips the import; afterwards it stops
    // monitoring while the import keeps running server-side
    let shutdown = engine.shutdown_handle();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, stopping restore");
            shutdown.send_replace(true);
        }
    });

    match engine.run(table, date.as_ref()).await {
        Ok(report) => {
            emit(format, &report, print_report)?;
            Ok(if report.succeeded() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Err(e) => {
            error!("Restore failed: {}", e);
            // Schema hints only; other failures already name their cause
            if matches!(e, Error::SchemaUnavailable { .. } | Error::InvalidSchema(_)) {
                eprintln!();
                eprintln!("Hints:");
                eprintln!("1. Check that {} exists and is valid", config.schema_cache_path.display());
                eprintln!("2. Re-export the table schema with:");
                eprintln!("   dynamodb-backup export-schema {} {}", table, config.source_region);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_report(report: &RestoreReport) {
    println!("=== DynamoDB Restore ===");
    println!("Source table: {}", report.source.table_name);
    println!("Backup date:  {}", report.source.date);
    println!("Backup data:  {}", report.source.data_prefix);
    println!("New table:    {}", report.new_table_name);
    println!("Import ARN:   {}", report.import_arn);
    println!("Status:       {}", report.status);

    if report.succeeded() {
        println!(
            "Processed items: {}",
            report
                .processed_item_count
                .map_or_else(|| "N/A".to_string(), |c| c.to_string())
        );
        println!(
            "Imported items:  {}",
            report
                .imported_item_count
                .map_or_else(|| "N/A".to_string(), |c| c.to_string())
        );
    } else {
        println!(
            "Failure reason: {}",
            report.failure_message.as_deref().unwrap_or("Unknown")
        );
    }
}
