//! Schema extraction into the local cache.

use tracing::info;

use crate::dynamo::TableService;
use crate::schema::{SchemaCache, TableSchema};
use crate::Result;

/// Describe `table`, reduce it to its schema and overwrite the local cache.
///
/// Fails with `Error::TableNotFound` when the table does not exist; provider
/// errors (permissions included) propagate unchanged.
pub async fn export_schema(
    service: &dyn TableService,
    table: &str,
    cache: &SchemaCache,
) -> Result<TableSchema> {
    info!("Exporting schema of table: {}", table);

    let details = service.describe_table(table).await?;
    let schema = details.schema;
    schema.validate()?;
    cache.save(&schema).await?;

    info!(
        table = %schema.table_name,
        keys = %schema.key_summary(),
        billing_mode = schema.billing_mode.as_str(),
        gsi_count = schema.gsi_count(),
        "Schema exported"
    );

    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamo::InMemoryTableService;
    use crate::schema::{
        AttributeDefinition, AttributeType, BillingMode, KeyRole, KeySchemaElement,
    };
    use crate::Error;

    fn users() -> TableSchema {
        TableSchema {
            table_name: "Users".to_string(),
            attribute_definitions: vec![AttributeDefinition {
                attribute_name: "user_id".to_string(),
                attribute_type: AttributeType::String,
            }],
            key_schema: vec![KeySchemaElement {
                attribute_name: "user_id".to_string(),
                key_type: KeyRole::Partition,
            }],
            billing_mode: BillingMode::OnDemand,
            provisioned_throughput: None,
            global_secondary_indexes: None,
            local_secondary_indexes: None,
        }
    }

    #[tokio::test]
    async fn test_export_overwrites_cache() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = SchemaCache::new(dir.path().join("table_schema.json"));
        tokio::fs::write(cache.path(), b"stale").await.unwrap();

        let service = InMemoryTableService::new();
        service.add_table(users());

        let schema = export_schema(&service, "Users", &cache).await.unwrap();
        assert_eq!(schema, users());
        assert_eq!(cache.load().await.unwrap(), users());
    }

    #[tokio::test]
    async fn test_export_accepts_arn() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = SchemaCache::new(dir.path().join("table_schema.json"));
        let service = InMemoryTableService::new();
        service.add_table(users());

        let arn = service.table_arn("Users");
        let schema = export_schema(&service, &arn, &cache).await.unwrap();
        assert_eq!(schema.table_name, "Users");
    }

    #[tokio::test]
    async fn test_missing_table_leaves_cache_untouched() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = SchemaCache::new(dir.path().join("table_schema.json"));
        let service = InMemoryTableService::new();

        let err = export_schema(&service, "Missing", &cache).await.unwrap_err();
        assert!(matches!(err, Error::TableNotFound(_)));
        assert!(!cache.path().exists());
    }
}
