//! Restore engine unit tests.
//!
//! Tests for restore functionality including:
//! - Schema source preference (backup copy over local cache)
//! - Import request construction
//! - Terminal import states

use bytes::Bytes;
use dynamodb_backup_core::config::PollOptions;
use dynamodb_backup_core::dynamo::{ImportStatus, InMemoryTableService};
use dynamodb_backup_core::restore::{RestoreEngine, SchemaSource};
use dynamodb_backup_core::schema::SchemaCache;
use dynamodb_backup_core::storage::{MemoryBackend, StorageBackend};
use dynamodb_backup_core::Error;
use std::sync::Arc;
use tempfile::TempDir;

use super::helpers::{date, orders_schema, put, put_export, users_schema, BUCKET};

struct Fixture {
    service: Arc<InMemoryTableService>,
    storage: Arc<MemoryBackend>,
    cache: SchemaCache,
    _dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        Self {
            service: Arc::new(InMemoryTableService::new()),
            storage: Arc::new(MemoryBackend::new()),
            cache: SchemaCache::new(dir.path().join("table_schema.json")),
            _dir: dir,
        }
    }

    fn engine(&self) -> RestoreEngine {
        RestoreEngine::new(
            self.service.clone(),
            self.storage.clone(),
            BUCKET,
            self.cache.clone(),
            PollOptions::default(),
        )
    }

    async fn store_schema(&self, date: &str) {
        let json = orders_schema().to_json().unwrap();
        self.storage
            .put(
                &format!("daily/{}/Orders/table_schema.json", date),
                Bytes::from(json),
            )
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn prefers_schema_stored_with_backup() {
    let fx = Fixture::new();
    put_export(&fx.storage, "2025/10/26", "Orders", "export-1").await;
    fx.store_schema("2025/10/26").await;
    fx.cache.save(&users_schema()).await.unwrap();

    let started = fx.engine().start("Orders", None).await.unwrap();

    assert_eq!(started.schema_source, SchemaSource::Backup);
    let imports = fx.service.imports();
    assert_eq!(imports.len(), 1);
    assert_eq!(
        imports[0].schema,
        orders_schema().renamed(&started.new_table_name)
    );
}

#[tokio::test]
async fn falls_back_to_cache_when_stored_schema_is_malformed() {
    let fx = Fixture::new();
    put_export(&fx.storage, "2025/10/26", "Orders", "export-1").await;
    put(&fx.storage, "daily/2025/10/26/Orders/table_schema.json", b"{not json").await;
    fx.cache.save(&orders_schema()).await.unwrap();

    let started = fx.engine().start("Orders", None).await.unwrap();

    assert_eq!(started.schema_source, SchemaSource::LocalCache);
    assert_eq!(fx.service.imports()[0].schema.key_schema, orders_schema().key_schema);
}

#[tokio::test]
async fn falls_back_to_cache_when_stored_schema_is_missing() {
    let fx = Fixture::new();
    put_export(&fx.storage, "2025/10/26", "Orders", "export-1").await;
    fx.cache.save(&orders_schema()).await.unwrap();

    let started = fx.engine().start("Orders", None).await.unwrap();
    assert_eq!(started.schema_source, SchemaSource::LocalCache);
}

#[tokio::test]
async fn missing_schema_everywhere_fails_without_import() {
    let fx = Fixture::new();
    put_export(&fx.storage, "2025/10/26", "Orders", "export-1").await;

    let err = fx.engine().start("Orders", None).await.unwrap_err();

    assert!(matches!(err, Error::SchemaUnavailable { .. }));
    assert!(err.to_string().contains("export-schema"));
    assert!(fx.service.imports().is_empty());
}

#[tokio::test]
async fn import_targets_new_table_and_data_prefix() {
    let fx = Fixture::new();
    put_export(&fx.storage, "2025/10/01", "Orders", "older").await;
    put_export(&fx.storage, "2025/10/26", "Orders", "newer").await;
    fx.store_schema("2025/10/01").await;
    fx.store_schema("2025/10/26").await;

    let started = fx
        .engine()
        .start("Orders", Some(&date("2025/10/01")))
        .await
        .unwrap();

    assert!(started.new_table_name.starts_with("Orders-restored-"));
    // -restored-YYYYmmdd-HHMMSS
    assert_eq!(started.new_table_name.len(), "Orders-restored-".len() + 15);

    let request = &fx.service.imports()[0];
    assert_eq!(request.bucket, BUCKET);
    assert_eq!(
        request.data_prefix,
        "daily/2025/10/01/Orders/AWSDynamoDB/older/data/"
    );
    assert_eq!(request.schema.table_name, started.new_table_name);
}

#[tokio::test]
async fn restore_for_missing_date_is_not_found() {
    let fx = Fixture::new();
    put_export(&fx.storage, "2025/10/26", "Orders", "export-1").await;
    fx.cache.save(&orders_schema()).await.unwrap();

    let err = fx
        .engine()
        .start("Orders", Some(&date("2025/10/25")))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(fx.service.imports().is_empty());
}

#[tokio::test]
async fn run_reports_completed_import() {
    let fx = Fixture::new();
    put_export(&fx.storage, "2025/10/26", "Orders", "export-1").await;
    fx.store_schema("2025/10/26").await;
    fx.service.script_import(vec![ImportStatus::Completed]);

    let report = fx.engine().run("Orders", None).await.unwrap();

    assert!(report.succeeded());
    assert_eq!(report.status, ImportStatus::Completed);
    assert_eq!(report.processed_item_count, Some(100));
    assert_eq!(report.imported_item_count, Some(100));
    assert_eq!(report.source.date, date("2025/10/26"));
}

#[tokio::test(start_paused = true)]
async fn run_reports_failed_import() {
    let fx = Fixture::new();
    put_export(&fx.storage, "2025/10/26", "Orders", "export-1").await;
    fx.store_schema("2025/10/26").await;
    fx.service
        .script_import(vec![ImportStatus::InProgress, ImportStatus::Failed]);

    let report = fx.engine().run("Orders", None).await.unwrap();

    assert!(!report.succeeded());
    assert_eq!(report.status, ImportStatus::Failed);
    assert!(report.failure_message.is_some());
    assert_eq!(fx.service.describe_import_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_before_run_interrupts_without_import() {
    let fx = Fixture::new();
    put_export(&fx.storage, "2025/10/26", "Orders", "export-1").await;
    fx.store_schema("2025/10/26").await;
    fx.service.script_import(vec![ImportStatus::InProgress]);

    let engine = fx.engine();
    engine.shutdown();
    let err = engine.run("Orders", None).await.unwrap_err();

    assert!(matches!(err, Error::Interrupted(_)));
    assert!(err.to_string().contains("interrupted"));
    assert!(fx.service.imports().is_empty());
    assert_eq!(fx.service.describe_import_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn shutdown_handle_signal_before_run_is_kept() {
    let fx = Fixture::new();
    put_export(&fx.storage, "2025/10/26", "Orders", "export-1").await;
    fx.store_schema("2025/10/26").await;

    let engine = fx.engine();
    engine.shutdown_handle().send_replace(true);
    let err = engine.run("Orders", None).await.unwrap_err();

    assert!(matches!(err, Error::Interrupted(_)));
}
