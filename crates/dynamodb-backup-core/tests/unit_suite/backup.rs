//! Backup engine unit tests.
//!
//! Tests for the daily backup run including:
//! - Schema upload and export request per table
//! - Partial failure accounting
//! - ARN resolution for plain table names

use dynamodb_backup_core::backup::{BackupEngine, BackupOutcome};
use dynamodb_backup_core::dynamo::{ExportStatus, InMemoryTableService};
use dynamodb_backup_core::locator::BackupLocator;
use dynamodb_backup_core::schema::TableSchema;
use dynamodb_backup_core::storage::{MemoryBackend, StorageBackend};
use std::sync::Arc;

use super::helpers::{date, fixture, orders_schema, BUCKET};

fn engine(service: Arc<InMemoryTableService>, storage: Arc<MemoryBackend>) -> BackupEngine {
    BackupEngine::new(service, storage, BUCKET)
}

#[tokio::test]
async fn all_tables_succeed() {
    let (service, storage) = fixture();
    let identifiers = vec![service.table_arn("Orders"), service.table_arn("Users")];

    let report = engine(service.clone(), storage.clone())
        .run_for_date(&identifiers, date("2025/10/26"))
        .await;

    assert_eq!(report.backup_date, "2025-10-26");
    assert_eq!(report.total_tables, 2);
    assert_eq!(report.success_count, 2);
    assert_eq!(report.outcome(), BackupOutcome::AllSucceeded);
    assert_eq!(report.status_code(), 200);

    for result in &report.results {
        assert!(result.success);
        assert!(result.export_arn.is_some());
        assert_eq!(result.status, Some(ExportStatus::InProgress));
        assert!(result.error.is_none());
    }
    assert_eq!(report.results[0].table_name, "Orders");
    assert_eq!(report.results[1].table_name, "Users");
}

#[tokio::test]
async fn schema_is_stored_next_to_export() {
    let (service, storage) = fixture();
    let identifiers = vec![service.table_arn("Orders")];

    engine(service.clone(), storage.clone())
        .run_for_date(&identifiers, date("2025/10/26"))
        .await;

    let data = storage
        .get("daily/2025/10/26/Orders/table_schema.json")
        .await
        .unwrap();
    assert_eq!(TableSchema::from_json(&data).unwrap(), orders_schema());

    let exports = service.exports();
    assert_eq!(exports.len(), 1);
    let (request, _) = &exports[0];
    assert_eq!(request.bucket, BUCKET);
    assert_eq!(request.prefix, "daily/2025/10/26/Orders");
    assert_eq!(request.table_arn, service.table_arn("Orders"));
}

#[tokio::test]
async fn failing_export_is_captured_and_others_continue() {
    let (service, storage) = fixture();
    service.fail_exports(
        "Orders",
        "PointInTimeRecoveryUnavailableException: PITR is not enabled",
    );
    let identifiers = vec![service.table_arn("Orders"), service.table_arn("Users")];

    let report = engine(service.clone(), storage)
        .run_for_date(&identifiers, date("2025/10/26"))
        .await;

    assert_eq!(report.total_tables, 2);
    assert_eq!(report.success_count, 1);
    assert_eq!(report.outcome(), BackupOutcome::Partial);
    assert_eq!(report.status_code(), 207);

    let orders = &report.results[0];
    assert_eq!(orders.table_name, "Orders");
    assert!(!orders.success);
    assert!(orders.export_arn.is_none());
    assert!(orders
        .error
        .as_deref()
        .unwrap()
        .contains("PointInTimeRecoveryUnavailableException: PITR is not enabled"));

    let users = &report.results[1];
    assert!(users.success);
    assert_eq!(service.exports().len(), 1);
}

#[tokio::test]
async fn missing_table_is_reported_per_table() {
    let (service, storage) = fixture();
    let identifiers = vec![
        "arn:aws:dynamodb:us-east-1:123456789012:table/Ghost".to_string(),
        service.table_arn("Users"),
    ];

    let report = engine(service, storage.clone())
        .run_for_date(&identifiers, date("2025/10/26"))
        .await;

    assert_eq!(report.success_count, 1);
    assert_eq!(report.results[0].table_name, "Ghost");
    assert!(report.results[0].error.as_deref().unwrap().contains("Ghost"));
    let err = storage
        .get("daily/2025/10/26/Ghost/table_schema.json")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn all_tables_failing_is_failed_outcome() {
    let (service, storage) = fixture();
    service.fail_exports("Orders", "AccessDeniedException");
    service.fail_exports("Users", "AccessDeniedException");
    let identifiers = vec!["Orders".to_string(), "Users".to_string()];

    let report = engine(service, storage)
        .run_for_date(&identifiers, date("2025/10/26"))
        .await;

    assert_eq!(report.success_count, 0);
    assert_eq!(report.failure_count(), 2);
    assert_eq!(report.outcome(), BackupOutcome::Failed);
    assert_eq!(report.status_code(), 207);
}

#[tokio::test]
async fn plain_table_name_resolves_arn() {
    let (service, storage) = fixture();

    let report = engine(service.clone(), storage)
        .run_for_date(&["Users".to_string()], date("2025/10/26"))
        .await;

    assert_eq!(report.success_count, 1);
    let (request, _) = &service.exports()[0];
    assert_eq!(request.table_arn, service.table_arn("Users"));
    assert_eq!(request.prefix, "daily/2025/10/26/Users");
}

#[tokio::test]
async fn backup_is_found_by_locator() {
    let (service, storage) = fixture();
    let identifiers = vec![service.table_arn("Orders"), service.table_arn("Users")];

    engine(service, storage.clone())
        .run_for_date(&identifiers, date("2025/10/26"))
        .await;

    let locator = BackupLocator::new(storage);
    let location = locator.find_latest("Users").await.unwrap();
    assert_eq!(location.date, date("2025/10/26"));
    assert!(location
        .data_prefix
        .starts_with("daily/2025/10/26/Users/AWSDynamoDB/"));
    assert!(location.data_prefix.ends_with("/data/"));
    assert_eq!(location.schema_key(), "daily/2025/10/26/Users/table_schema.json");
}
