//! Configuration structures for backup, restore and monitoring.
//!
//! The operator tools read a JSON file:
//!
//! ```json
//! {
//!   "backup_config": {
//!     "tables": [{"table_name": "Orders", "table_arn": "arn:aws:dynamodb:...:table/Orders"}],
//!     "s3_bucket": "my-backups",
//!     "source_region": "us-east-1",
//!     "target_region": "us-west-2"
//!   }
//! }
//! ```
//!
//! The scheduled backup job is configured from environment variables instead,
//! see [`ScheduledBackupConfig::from_env`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::layout::parse_table_list;
use crate::monitor::DEFAULT_FUNCTION_NAME;
use crate::schema::DEFAULT_SCHEMA_CACHE;
use crate::{Error, Result};

/// Default configuration file name
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Top-level configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub backup_config: BackupConfig,
}

/// Tables, bucket and regions of a backup deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Tables included in the daily backup
    pub tables: Vec<TableEntry>,

    /// Bucket holding the `daily/` tree
    pub s3_bucket: String,

    /// Region of the source tables
    pub source_region: String,

    /// Region of the bucket, and default region for restores
    pub target_region: String,

    /// Custom S3 endpoint (LocalStack, MinIO)
    #[serde(default)]
    pub s3_endpoint: Option<String>,

    /// Local schema cache file
    #[serde(default = "default_schema_cache_path")]
    pub schema_cache_path: PathBuf,

    /// Name of the deployed scheduled backup function
    #[serde(default = "default_backup_function_name")]
    pub backup_function_name: String,

    /// Import polling behaviour
    #[serde(default)]
    pub restore_poll: PollOptions,
}

/// One configured table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    pub table_name: String,
    pub table_arn: String,
}

fn default_schema_cache_path() -> PathBuf {
    PathBuf::from(DEFAULT_SCHEMA_CACHE)
}

fn default_backup_function_name() -> String {
    DEFAULT_FUNCTION_NAME.to_string()
}

/// Import status polling options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOptions {
    /// Seconds between status checks (default: 30)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Give up after this many seconds (default: 12 hours)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Consecutive failed status checks tolerated (default: 5)
    #[serde(default = "default_max_poll_errors")]
    pub max_poll_errors: u32,

    /// Upper bound of the backoff after failed checks (default: 300)
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
            max_poll_errors: default_max_poll_errors(),
            max_backoff_secs: default_max_backoff_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    30
}

fn default_timeout_secs() -> u64 {
    12 * 60 * 60
}

fn default_max_poll_errors() -> u32 {
    5
}

fn default_max_backoff_secs() -> u64 {
    300
}

impl PollOptions {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(Error::Config(
                "restore_poll.interval_secs must be > 0".to_string(),
            ));
        }
        if self.timeout_secs < self.interval_secs {
            return Err(Error::Config(format!(
                "restore_poll.timeout_secs ({}) < interval_secs ({})",
                self.timeout_secs, self.interval_secs
            )));
        }
        if self.max_poll_errors == 0 {
            return Err(Error::Config(
                "restore_poll.max_poll_errors must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load and validate the configuration file.
    ///
    /// A missing or malformed file is reported as `Error::Config` naming the path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!("configuration file {} does not exist", path.display()))
            } else {
                Error::Config(format!("cannot read {}: {}", path.display(), e))
            }
        })?;
        Self::from_json(&content)
            .map_err(|e| Error::Config(format!("{} is malformed: {}", path.display(), e)))
    }

    /// Parse and validate configuration JSON
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let backup = &self.backup_config;

        if backup.s3_bucket.trim().is_empty() {
            return Err(Error::Config("s3_bucket must not be empty".to_string()));
        }
        if backup.source_region.trim().is_empty() || backup.target_region.trim().is_empty() {
            return Err(Error::Config(
                "source_region and target_region are required".to_string(),
            ));
        }
        for table in &backup.tables {
            if table.table_name.trim().is_empty() {
                return Err(Error::Config("table_name must not be empty".to_string()));
            }
        }

        backup.restore_poll.validate()
    }
}

impl BackupConfig {
    /// Configured table names, in file order
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.table_name.as_str()).collect()
    }

    /// Identifiers handed to the backup orchestrator (ARN when known)
    pub fn table_identifiers(&self) -> Vec<String> {
        self.tables
            .iter()
            .map(|t| {
                if t.table_arn.trim().is_empty() {
                    t.table_name.clone()
                } else {
                    t.table_arn.clone()
                }
            })
            .collect()
    }
}

/// Configuration of the scheduled backup job, read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledBackupConfig {
    /// Table ARNs (or names) from `TABLE_ARNS`
    pub tables: Vec<String>,
    /// `S3_BUCKET`
    pub s3_bucket: String,
    /// `S3_REGION` (default: us-west-2)
    pub s3_region: String,
    /// `SOURCE_REGION` (default: us-east-1)
    pub source_region: String,
}

impl ScheduledBackupConfig {
    /// Read the job configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the job configuration through `lookup`.
    ///
    /// An empty table list is accepted here; the job reports it as a bad
    /// request.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let tables = lookup("TABLE_ARNS")
            .map(|v| parse_table_list(&v))
            .ok_or_else(|| Error::Config("TABLE_ARNS is not set".to_string()))?;

        let s3_bucket = lookup("S3_BUCKET")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::Config("S3_BUCKET is not set".to_string()))?;

        Ok(Self {
            tables,
            s3_bucket,
            s3_region: lookup("S3_REGION").unwrap_or_else(|| "us-west-2".to_string()),
            source_region: lookup("SOURCE_REGION").unwrap_or_else(|| "us-east-1".to_string()),
        })
    }
}
