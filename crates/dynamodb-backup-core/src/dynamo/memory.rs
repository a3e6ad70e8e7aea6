//! In-memory table service for testing.
//!
//! Tables are registered up front; exports and imports are recorded so tests
//! can inspect them. When constructed with a storage backend, an export also
//! writes a fake export tree (`AWSDynamoDB/<export-id>/data/...`) under the
//! requested prefix, the way the real service does.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use super::{
    ExportJob, ExportRequest, ExportStatus, ImportJob, ImportRequest, ImportStatus, TableDetails,
    TableService,
};
use crate::error::ProviderError;
use crate::layout::{data_path, export_root, table_name_from_identifier};
use crate::schema::TableSchema;
use crate::storage::StorageBackend;
use crate::{Error, Result};

#[derive(Default)]
struct State {
    tables: HashMap<String, TableDetails>,
    export_failures: HashMap<String, String>,
    exports: Vec<(ExportRequest, ExportJob)>,
    imports: Vec<(ImportRequest, ImportJob)>,
    import_script: VecDeque<ImportStatus>,
    poll_failures: u32,
    describe_import_calls: u32,
    next_id: u64,
}

/// Table service holding its state in memory
pub struct InMemoryTableService {
    state: Mutex<State>,
    storage: Option<Arc<dyn StorageBackend>>,
    account: String,
    region: String,
}

impl Default for InMemoryTableService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTableService {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            storage: None,
            account: "123456789012".to_string(),
            region: "us-east-1".to_string(),
        }
    }

    /// Write fake export trees into `storage` on every export
    pub fn with_storage(mut self, storage: Arc<dyn StorageBackend>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// ARN the service reports for a table name
    pub fn table_arn(&self, name: &str) -> String {
        format!(
            "arn:aws:dynamodb:{}:{}:table/{}",
            self.region, self.account, name
        )
    }

    /// Register a table
    pub fn add_table(&self, schema: TableSchema) {
        let details = TableDetails {
            table_arn: self.table_arn(&schema.table_name),
            schema,
        };
        self.state
            .lock()
            .tables
            .insert(details.schema.table_name.clone(), details);
    }

    /// Make exports of `table` fail with `message`
    pub fn fail_exports(&self, table: &str, message: &str) {
        self.state
            .lock()
            .export_failures
            .insert(table.to_string(), message.to_string());
    }

    /// Statuses returned by successive `describe_import` calls; the last one repeats
    pub fn script_import(&self, statuses: Vec<ImportStatus>) {
        self.state.lock().import_script = statuses.into();
    }

    /// Make the next `count` `describe_import` calls fail
    pub fn fail_import_polls(&self, count: u32) {
        self.state.lock().poll_failures = count;
    }

    /// Exports started so far
    pub fn exports(&self) -> Vec<(ExportRequest, ExportJob)> {
        self.state.lock().exports.clone()
    }

    /// Imports started so far
    pub fn imports(&self) -> Vec<ImportRequest> {
        self.state
            .lock()
            .imports
            .iter()
            .map(|(req, _)| req.clone())
            .collect()
    }

    /// Number of `describe_import` calls, failed ones included
    pub fn describe_import_calls(&self) -> u32 {
        self.state.lock().describe_import_calls
    }

    fn next_id(&self) -> u64 {
        let mut state = self.state.lock();
        state.next_id += 1;
        state.next_id
    }
}

#[async_trait]
impl TableService for InMemoryTableService {
    async fn describe_table(&self, table: &str) -> Result<TableDetails> {
        let name = table_name_from_identifier(table);
        self.state
            .lock()
            .tables
            .get(name)
            .cloned()
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    async fn export_table(&self, request: &ExportRequest) -> Result<ExportJob> {
        let name = table_name_from_identifier(&request.table_arn).to_string();

        if let Some(message) = self.state.lock().export_failures.get(&name) {
            return Err(Error::Provider(ProviderError::api(
                "ExportTableToPointInTime",
                message.clone(),
            )));
        }

        let id = self.next_id();
        let export_id = format!("{:013}-{:08x}", 1_700_000_000_000u64 + id, id);
        let job = ExportJob {
            export_arn: format!("{}/export/{}", request.table_arn, export_id),
            status: ExportStatus::InProgress,
            export_time: Some(chrono::Utc::now()),
        };

        if let Some(storage) = &self.storage {
            let export_prefix = format!("{}/{}", export_root(&request.prefix), export_id);
            let data = data_path(&export_prefix);
            storage
                .put(
                    &format!("{}{}.json.gz", data, export_id),
                    Bytes::from_static(b"{\"Item\":{}}\n"),
                )
                .await?;
            storage
                .put(
                    &format!("{}/manifest-summary.json", export_prefix),
                    Bytes::from_static(b"{}"),
                )
                .await?;
        }

        self.state.lock().exports.push((request.clone(), job.clone()));
        Ok(job)
    }

    async fn list_exports(&self, table_arn: &str, limit: usize) -> Result<Vec<ExportJob>> {
        let state = self.state.lock();
        Ok(state
            .exports
            .iter()
            .rev()
            .filter(|(req, _)| req.table_arn == table_arn)
            .take(limit)
            .map(|(_, job)| job.clone())
            .collect())
    }

    async fn import_table(&self, request: &ImportRequest) -> Result<ImportJob> {
        let id = self.next_id();
        let job = ImportJob {
            import_arn: format!(
                "{}/import/{:020}",
                self.table_arn(&request.schema.table_name),
                id
            ),
            status: ImportStatus::InProgress,
            processed_item_count: None,
            imported_item_count: None,
            failure_message: None,
        };
        self.state.lock().imports.push((request.clone(), job.clone()));
        Ok(job)
    }

    async fn describe_import(&self, import_arn: &str) -> Result<ImportJob> {
        let mut state = self.state.lock();
        state.describe_import_calls += 1;

        if state.poll_failures > 0 {
            state.poll_failures -= 1;
            return Err(Error::Provider(ProviderError::api(
                "DescribeImport",
                "ThrottlingException: Rate exceeded",
            )));
        }

        let status = if state.import_script.len() > 1 {
            state.import_script.pop_front()
        } else {
            state.import_script.front().cloned()
        }
        .unwrap_or(ImportStatus::Completed);

        let job = state
            .imports
            .iter_mut()
            .find(|(_, job)| job.import_arn == import_arn)
            .map(|(_, job)| job)
            .ok_or_else(|| ProviderError::api("DescribeImport", format!("unknown import {}", import_arn)))?;

        job.status = status.clone();
        match status {
            ImportStatus::Completed => {
                job.processed_item_count = Some(100);
                job.imported_item_count = Some(100);
            }
            ImportStatus::Failed => {
                job.failure_message = Some("Schema mismatch in imported data".to_string());
            }
            _ => {}
        }

        Ok(job.clone())
    }
}
