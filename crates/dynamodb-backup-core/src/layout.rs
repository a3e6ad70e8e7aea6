//! Object storage layout for daily backups.
//!
//! Every backup lives under a prefix derived from its logical date and table
//! name:
//!
//! ```text
//! daily/<YYYY>/<MM>/<DD>/<table-name>/
//!   table_schema.json
//!   AWSDynamoDB/<export-id>/data/<data files>
//! ```
//!
//! All components build keys through the functions in this module so the
//! orchestrators and the locator cannot drift apart.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Root prefix of all daily backups
pub const DAILY_ROOT: &str = "daily";

/// Name of the schema object stored next to each export
pub const SCHEMA_FILE: &str = "table_schema.json";

/// Directory the export service writes under the requested prefix
pub const EXPORT_DIR: &str = "AWSDynamoDB";

/// Directory holding the data files inside an export
pub const DATA_DIR: &str = "data";

/// Logical date of a backup, rendered zero-padded as `YYYY/MM/DD`.
///
/// Zero padding makes lexicographic order on the rendered form equal to
/// chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BackupDate(NaiveDate);

impl BackupDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Today's date in local time, matching the scheduled job's clock.
    pub fn today() -> Self {
        Self(chrono::Local::now().date_naive())
    }

    /// The date `days` days earlier.
    pub fn days_before(&self, days: u32) -> Self {
        Self(self.0 - chrono::Duration::days(i64::from(days)))
    }

    /// ISO form `YYYY-MM-DD`, used in backup reports.
    pub fn iso(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for BackupDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}/{:02}/{:02}",
            self.0.year(),
            self.0.month(),
            self.0.day()
        )
    }
}

impl FromStr for BackupDate {
    type Err = Error;

    /// Accepts `YYYY/MM/DD` and `YYYY-MM-DD`.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim().trim_matches('/');
        NaiveDate::parse_from_str(trimmed, "%Y/%m/%d")
            .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
            .map(Self)
            .map_err(|_| Error::Config(format!("Invalid backup date '{}', expected YYYY/MM/DD", s)))
    }
}

impl Serialize for BackupDate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BackupDate {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Prefix of one table's backup for one day, without trailing slash.
pub fn backup_path(date: &BackupDate, table: &str) -> String {
    format!("{}/{}/{}", DAILY_ROOT, date, table)
}

/// Key of the schema object for a backup prefix.
pub fn schema_key(prefix: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), SCHEMA_FILE)
}

/// Directory under which the export service places export-id directories.
pub fn export_root(prefix: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), EXPORT_DIR)
}

/// Data prefix of one export, with trailing slash as the import service expects.
pub fn data_path(export_prefix: &str) -> String {
    format!("{}/{}/", export_prefix.trim_end_matches('/'), DATA_DIR)
}

/// Short table name from a table ARN (`arn:...:table/Orders` → `Orders`).
///
/// Plain table names pass through unchanged.
pub fn table_name_from_identifier(identifier: &str) -> &str {
    let identifier = identifier.trim();
    identifier.rsplit('/').next().unwrap_or(identifier)
}

/// Parse a comma-separated list of table identifiers, dropping blanks.
pub fn parse_table_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extract the backup date from a key below `daily/`, e.g. `daily/2025/10/26/...`.
pub fn date_from_key(key: &str) -> Option<BackupDate> {
    let rest = key.strip_prefix(DAILY_ROOT)?.trim_start_matches('/');
    let mut parts = rest.splitn(4, '/');
    let year = parts.next()?;
    let month = parts.next()?;
    let day = parts.next()?;
    format!("{}/{}/{}", year, month, day).parse().ok()
}
