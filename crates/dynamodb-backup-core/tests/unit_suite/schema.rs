//! Schema extraction unit tests.

use dynamodb_backup_core::dynamo::InMemoryTableService;
use dynamodb_backup_core::export_schema;
use dynamodb_backup_core::schema::{BillingMode, SchemaCache, TableSchema};
use tempfile::TempDir;

use super::helpers::orders_schema;

#[tokio::test]
async fn extract_write_and_parse_round_trip() {
    let dir = TempDir::new().unwrap();
    let cache = SchemaCache::new(dir.path().join("table_schema.json"));
    let service = InMemoryTableService::new();
    service.add_table(orders_schema());

    let extracted = export_schema(&service, "Orders", &cache).await.unwrap();
    let written = std::fs::read(cache.path()).unwrap();

    assert_eq!(TableSchema::from_json(&written).unwrap(), extracted);
    assert_eq!(extracted, orders_schema());
}

#[test]
fn schema_file_uses_wire_names() {
    let json = orders_schema().to_json().unwrap();

    assert!(json.contains("\"TableName\": \"Orders\""));
    assert!(json.contains("\"KeyType\": \"RANGE\""));
    assert!(json.contains("\"BillingMode\": \"PAY_PER_REQUEST\""));
    assert!(json.contains("\"ProjectionType\": \"KEYS_ONLY\""));
    assert!(!json.contains("LocalSecondaryIndexes"));
}

#[test]
fn legacy_schema_without_billing_mode_loads() {
    let json = br#"{
        "TableName": "Users",
        "AttributeDefinitions": [{"AttributeName": "user_id", "AttributeType": "S"}],
        "KeySchema": [{"AttributeName": "user_id", "KeyType": "HASH"}]
    }"#;

    let schema = TableSchema::from_json(json).unwrap();
    assert_eq!(schema.billing_mode, BillingMode::OnDemand);
    assert!(schema.global_secondary_indexes.is_none());
}

#[test]
fn undefined_key_attribute_is_rejected() {
    let json = br#"{
        "TableName": "Users",
        "AttributeDefinitions": [{"AttributeName": "id", "AttributeType": "S"}],
        "KeySchema": [{"AttributeName": "user_id", "KeyType": "HASH"}]
    }"#;

    assert!(TableSchema::from_json(json).is_err());
}
