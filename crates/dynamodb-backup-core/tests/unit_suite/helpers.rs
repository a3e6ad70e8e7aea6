//! Test helper utilities.
//!
//! Provides table schemas, fixtures and storage shortcuts used across the
//! unit tests.

use bytes::Bytes;
use dynamodb_backup_core::dynamo::InMemoryTableService;
use dynamodb_backup_core::schema::{
    AttributeDefinition, AttributeType, BillingMode, KeyRole, KeySchemaElement, Projection,
    ProjectionType, SecondaryIndex, TableSchema,
};
use dynamodb_backup_core::storage::{MemoryBackend, StorageBackend};
use dynamodb_backup_core::BackupDate;
use std::sync::Arc;

pub const BUCKET: &str = "test-backups";

fn attribute(name: &str, attribute_type: AttributeType) -> AttributeDefinition {
    AttributeDefinition {
        attribute_name: name.to_string(),
        attribute_type,
    }
}

fn key(name: &str, key_type: KeyRole) -> KeySchemaElement {
    KeySchemaElement {
        attribute_name: name.to_string(),
        key_type,
    }
}

/// Orders table: composite key plus one GSI
pub fn orders_schema() -> TableSchema {
    TableSchema {
        table_name: "Orders".to_string(),
        attribute_definitions: vec![
            attribute("customer_id", AttributeType::String),
            attribute("order_ts", AttributeType::Number),
            attribute("status", AttributeType::String),
        ],
        key_schema: vec![
            key("customer_id", KeyRole::Partition),
            key("order_ts", KeyRole::Sort),
        ],
        billing_mode: BillingMode::OnDemand,
        provisioned_throughput: None,
        global_secondary_indexes: Some(vec![SecondaryIndex {
            index_name: "status-index".to_string(),
            key_schema: vec![key("status", KeyRole::Partition)],
            projection: Projection {
                projection_type: ProjectionType::KeysOnly,
                non_key_attributes: vec![],
            },
            provisioned_throughput: None,
        }]),
        local_secondary_indexes: None,
    }
}

/// Users table: partition key only
pub fn users_schema() -> TableSchema {
    TableSchema {
        table_name: "Users".to_string(),
        attribute_definitions: vec![attribute("user_id", AttributeType::String)],
        key_schema: vec![key("user_id", KeyRole::Partition)],
        billing_mode: BillingMode::OnDemand,
        provisioned_throughput: None,
        global_secondary_indexes: None,
        local_secondary_indexes: None,
    }
}

pub fn date(s: &str) -> BackupDate {
    s.parse().expect("valid test date")
}

/// Table service writing fake exports into a shared in-memory bucket
pub fn fixture() -> (Arc<InMemoryTableService>, Arc<MemoryBackend>) {
    let storage = Arc::new(MemoryBackend::new());
    let service = InMemoryTableService::new().with_storage(storage.clone());
    service.add_table(orders_schema());
    service.add_table(users_schema());
    (Arc::new(service), storage)
}

pub async fn put(storage: &MemoryBackend, key: &str, data: &'static [u8]) {
    storage
        .put(key, Bytes::from_static(data))
        .await
        .expect("put test object");
}

/// Lay out an export directory with one data file
pub async fn put_export(storage: &MemoryBackend, date: &str, table: &str, export_id: &str) {
    let key = format!(
        "daily/{}/{}/AWSDynamoDB/{}/data/part-0000.json.gz",
        date, table, export_id
    );
    put(storage, &key, b"{\"Item\":{}}\n").await;
}
