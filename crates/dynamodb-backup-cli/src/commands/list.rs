use anyhow::Result;
use dynamodb_backup_core::locator::{BackupLocator, DEFAULT_LIST_LIMIT};
use dynamodb_backup_core::{BackupDate, Config};
use serde::Serialize;
use std::process::ExitCode;
use tracing::{info, warn};

use super::backup_storage;
use super::output::{emit, OutputFormat};

#[derive(Serialize)]
struct TableBackups {
    table_name: String,
    dates: Vec<BackupDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct BackupListing {
    bucket: String,
    region: String,
    tables: Vec<TableBackups>,
}

/// List backups of one table, or of every configured table.
pub async fn run(config_path: &str, table: Option<&str>, format: OutputFormat) -> Result<ExitCode> {
    info!("Loading configuration from: {}", config_path);
    let config = Config::load(config_path)?.backup_config;

    let locator = BackupLocator::new(backup_storage(&config)?);
    let names: Vec<String> = match table {
        Some(name) => vec![name.to_string()],
        None => config.table_names().into_iter().map(str::to_string).collect(),
    };

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let entry = match locator.list_dates(&name, DEFAULT_LIST_LIMIT).await {
            Ok(dates) => TableBackups {
                table_name: name,
                dates,
                error: None,
            },
            Err(e) => {
                warn!("Failed to list backups of {}: {}", name, e);
                TableBackups {
                    table_name: name,
                    dates: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        };
        tables.push(entry);
    }

    let listing = BackupListing {
        bucket: config.s3_bucket,
        region: config.target_region,
        tables,
    };
    emit(format, &listing, print_listing)?;

    Ok(ExitCode::SUCCESS)
}

fn print_listing(listing: &BackupListing) {
    println!("=== Available backups ===");
    println!("S3 bucket: {} ({})", listing.bucket, listing.region);

    for table in &listing.tables {
        println!();
        println!("--- Table: {} ---", table.table_name);
        println!("Most recent backups (up to {}):", DEFAULT_LIST_LIMIT);
        if let Some(error) = &table.error {
            println!("  Failed to list backups: {}", error);
        } else if table.dates.is_empty() {
            println!("  No backups found");
        } else {
            for date in &table.dates {
                println!("  {}", date);
            }
        }
    }
}
