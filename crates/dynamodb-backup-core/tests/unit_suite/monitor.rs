//! Status monitor unit tests.

use dynamodb_backup_core::backup::BackupEngine;
use dynamodb_backup_core::config::TableEntry;
use dynamodb_backup_core::monitor::StatusMonitor;

use super::helpers::{date, fixture, put, BUCKET};

fn entry(name: &str, arn: &str) -> TableEntry {
    TableEntry {
        table_name: name.to_string(),
        table_arn: arn.to_string(),
    }
}

#[tokio::test]
async fn reports_exports_and_daily_usage() {
    let (service, storage) = fixture();
    let engine = BackupEngine::new(service.clone(), storage.clone(), BUCKET);
    let orders = vec![service.table_arn("Orders")];
    engine.run_for_date(&orders, date("2025/10/24")).await;
    engine.run_for_date(&orders, date("2025/10/26")).await;
    // Outside the seven-day window
    put(&storage, "daily/2025/10/19/Orders/table_schema.json", b"{}").await;

    let monitor = StatusMonitor::new(service.clone(), storage, BUCKET);
    let report = monitor
        .check_on(&[entry("Orders", &service.table_arn("Orders"))], date("2025/10/26"))
        .await;

    assert_eq!(report.table_count, 1);
    let status = &report.tables[0];
    assert!(status.export_error.is_none());
    assert!(status.storage_error.is_none());
    assert_eq!(status.exports.len(), 2);

    // schema, one data file and the manifest summary
    let today = status.today.unwrap();
    assert_eq!(today.object_count, 3);
    assert!(today.total_bytes > 0);

    let days: Vec<_> = status.recent.iter().map(|d| d.date).collect();
    assert_eq!(days, vec![date("2025/10/26"), date("2025/10/24")]);
}

#[tokio::test]
async fn missing_today_backup_is_none() {
    let (service, storage) = fixture();
    let engine = BackupEngine::new(service.clone(), storage.clone(), BUCKET);
    engine
        .run_for_date(&["Users".to_string()], date("2025/10/25"))
        .await;

    let monitor = StatusMonitor::new(service.clone(), storage, BUCKET);
    let report = monitor
        .check_on(&[entry("Users", "")], date("2025/10/26"))
        .await;

    let status = &report.tables[0];
    assert!(status.today.is_none());
    assert_eq!(status.recent.len(), 1);
    // ARN resolved through the table description
    assert_eq!(status.exports.len(), 1);
}

#[tokio::test]
async fn export_listing_failure_is_captured() {
    let (service, storage) = fixture();
    let monitor = StatusMonitor::new(service, storage, BUCKET);

    let report = monitor
        .check_on(&[entry("Ghost", ""), entry("Users", "")], date("2025/10/26"))
        .await;

    assert_eq!(report.tables.len(), 2);
    assert!(report.tables[0].export_error.is_some());
    assert!(report.tables[0].storage_error.is_none());
    assert!(report.tables[1].export_error.is_none());
    assert!(report.tables[1].exports.is_empty());
}
