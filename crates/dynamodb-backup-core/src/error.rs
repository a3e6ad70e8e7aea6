//! Error types for the DynamoDB backup core library.

use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the DynamoDB backup library.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration missing or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// No usable table schema, neither in the backup nor in the local cache
    #[error("Table schema unavailable for {table}: {reason}. Run `dynamodb-backup export-schema {table} <region>` first")]
    SchemaUnavailable { table: String, reason: String },

    /// Table schema violates its structural invariants
    #[error("Invalid table schema: {0}")]
    InvalidSchema(String),

    /// DynamoDB / Lambda API error
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Table not found
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// No backup dates exist at all
    #[error("No backup available: {0}")]
    BackupNotFound(String),

    /// Date directory exists but holds no export for the table
    #[error("No export found for {0}")]
    ExportNotFound(String),

    /// Import polling gave up before a terminal status
    #[error("Import monitoring stopped: {0}")]
    ImportMonitor(String),

    /// Shutdown was signalled before the operation finished
    #[error("Restore interrupted: {0}")]
    Interrupted(String),
}

impl Error {
    /// Whether the error reports a missing table, backup date or export directory.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::TableNotFound(_)
                | Error::BackupNotFound(_)
                | Error::ExportNotFound(_)
                | Error::Storage(StorageError::NotFound(_))
        )
    }
}

/// Errors returned by the managed database and function services
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ProviderError {
    /// SDK call failed
    #[error("{operation} failed: {message}")]
    Api { operation: String, message: String },

    /// Response was missing a field the service always returns
    #[error("{operation} returned an incomplete response: missing {field}")]
    MissingField { operation: String, field: String },

    /// Request could not be built from the local data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    pub(crate) fn api(operation: &str, message: impl Into<String>) -> Self {
        ProviderError::Api {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn missing(operation: &str, field: &str) -> Self {
        ProviderError::MissingField {
            operation: operation.to_string(),
            field: field.to_string(),
        }
    }
}

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Object not found
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Storage backend error
    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
