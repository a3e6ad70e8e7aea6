//! Backup locator unit tests.

use dynamodb_backup_core::locator::BackupLocator;
use dynamodb_backup_core::storage::MemoryBackend;
use dynamodb_backup_core::Error;
use std::sync::Arc;

use super::helpers::{date, put, put_export};

#[tokio::test]
async fn find_latest_picks_most_recent_date() {
    let storage = Arc::new(MemoryBackend::new());
    put_export(&storage, "2025/10/01", "Orders", "01727740800000-aaaa").await;
    put_export(&storage, "2025/10/26", "Orders", "01729900800000-bbbb").await;
    put_export(&storage, "2025/09/30", "Orders", "01727654400000-cccc").await;

    let locator = BackupLocator::new(storage);
    let location = locator.find_latest("Orders").await.unwrap();

    assert_eq!(location.date, date("2025/10/26"));
    assert_eq!(location.export_id, "01729900800000-bbbb");
    assert_eq!(
        location.data_prefix,
        "daily/2025/10/26/Orders/AWSDynamoDB/01729900800000-bbbb/data/"
    );
}

#[tokio::test]
async fn find_latest_crosses_year_boundary() {
    let storage = Arc::new(MemoryBackend::new());
    put_export(&storage, "2024/12/31", "Orders", "old").await;
    put_export(&storage, "2025/01/02", "Orders", "new").await;

    let locator = BackupLocator::new(storage);
    let location = locator.find_latest("Orders").await.unwrap();
    assert_eq!(location.date, date("2025/01/02"));
}

#[tokio::test]
async fn find_latest_does_not_fall_back_to_older_dates() {
    let storage = Arc::new(MemoryBackend::new());
    put_export(&storage, "2025/10/01", "Orders", "old").await;
    put_export(&storage, "2025/10/26", "Users", "users-export").await;

    let locator = BackupLocator::new(storage);
    let err = locator.find_latest("Orders").await.unwrap_err();

    assert!(matches!(err, Error::ExportNotFound(_)));
    assert!(err.to_string().contains("2025/10/26"));
}

#[tokio::test]
async fn find_latest_without_backups_is_not_found() {
    let storage = Arc::new(MemoryBackend::new());
    let locator = BackupLocator::new(storage);

    let err = locator.find_latest("Orders").await.unwrap_err();
    assert!(matches!(err, Error::BackupNotFound(_)));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn find_latest_with_schema_only_is_not_found() {
    let storage = Arc::new(MemoryBackend::new());
    put(&storage, "daily/2025/10/26/Orders/table_schema.json", b"{}").await;

    let locator = BackupLocator::new(storage);
    let err = locator.find_latest("Orders").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn find_by_date_returns_that_date() {
    let storage = Arc::new(MemoryBackend::new());
    put_export(&storage, "2025/10/01", "Orders", "first").await;
    put_export(&storage, "2025/10/26", "Orders", "second").await;

    let locator = BackupLocator::new(storage);
    let location = locator
        .find_by_date("Orders", &date("2025/10/01"))
        .await
        .unwrap();

    assert_eq!(location.prefix, "daily/2025/10/01/Orders");
    assert_eq!(
        location.data_prefix,
        "daily/2025/10/01/Orders/AWSDynamoDB/first/data/"
    );
}

#[tokio::test]
async fn find_by_date_without_table_is_not_found() {
    let storage = Arc::new(MemoryBackend::new());
    put_export(&storage, "2025/10/26", "Users", "users-export").await;

    let locator = BackupLocator::new(storage);
    let err = locator
        .find_by_date("Orders", &date("2025/10/26"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ExportNotFound(_)));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn list_dates_newest_first_for_table_only() {
    let storage = Arc::new(MemoryBackend::new());
    put_export(&storage, "2025/09/30", "Orders", "a").await;
    put(&storage, "daily/2025/10/01/Orders/table_schema.json", b"{}").await;
    put_export(&storage, "2025/10/02", "Users", "b").await;
    put_export(&storage, "2025/10/03", "OrdersArchive", "c").await;
    put_export(&storage, "2025/10/26", "Orders", "d").await;

    let locator = BackupLocator::new(storage);
    let dates = locator.list_dates("Orders", 30).await.unwrap();

    assert_eq!(
        dates,
        vec![date("2025/10/26"), date("2025/10/01"), date("2025/09/30")]
    );
}

#[tokio::test]
async fn list_dates_without_backups_is_empty() {
    let storage = Arc::new(MemoryBackend::new());
    let locator = BackupLocator::new(storage);

    let dates = locator.list_dates("Orders", 30).await.unwrap();
    assert!(dates.is_empty());
}
