use anyhow::Result;
use dynamodb_backup_core::dynamo::DynamoDbService;
use dynamodb_backup_core::schema::{SchemaCache, DEFAULT_SCHEMA_CACHE};
use dynamodb_backup_core::{export_schema, Config};
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error};

pub async fn run(config_path: &str, table: &str, region: &str) -> Result<ExitCode> {
    // The configuration is optional here; it only relocates the schema file
    let cache_path = if Path::new(config_path).exists() {
        Config::load(config_path)?.backup_config.schema_cache_path
    } else {
        debug!("No configuration at {}, using {}", config_path, DEFAULT_SCHEMA_CACHE);
        DEFAULT_SCHEMA_CACHE.into()
    };
    let cache = SchemaCache::new(cache_path);

    let service = DynamoDbService::connect(region, None).await;
    let schema = match export_schema(&service, table, &cache).await {
        Ok(schema) => schema,
        Err(e) => {
            error!("Schema export failed: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    println!("Table schema exported to {}", cache.path().display());
    println!();
    println!("Table info:");
    println!("  Table name:   {}", schema.table_name);
    println!("  Key schema:   {}", schema.key_summary());
    println!("  Billing mode: {}", schema.billing_mode.as_str());
    if schema.gsi_count() > 0 {
        println!("  GSI count:    {}", schema.gsi_count());
    }

    Ok(ExitCode::SUCCESS)
}
