//! Discovery of daily backups in object storage.
//!
//! The locator walks the `daily/<YYYY>/<MM>/<DD>/` tree one level at a time
//! with delimiter listings. Date components are zero padded, so the
//! lexicographic maximum at each level is the most recent one.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::layout::{
    backup_path, data_path, date_from_key, export_root, schema_key, BackupDate, DAILY_ROOT,
};
use crate::storage::StorageBackend;
use crate::{Error, Result};

/// Default number of dates returned by [`BackupLocator::list_dates`]
pub const DEFAULT_LIST_LIMIT: usize = 30;

/// A located export of one table on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupLocation {
    pub date: BackupDate,
    pub table_name: String,
    /// `daily/<date>/<table>`
    pub prefix: String,
    /// Export id chosen by the export service
    pub export_id: String,
    /// `daily/<date>/<table>/AWSDynamoDB/<export-id>/data/`
    pub data_prefix: String,
}

impl BackupLocation {
    /// Key of the schema stored alongside the export
    pub fn schema_key(&self) -> String {
        schema_key(&self.prefix)
    }
}

/// Finds backups below `daily/` in one bucket
pub struct BackupLocator {
    storage: Arc<dyn StorageBackend>,
}

impl BackupLocator {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Most recent backup of `table`.
    ///
    /// Takes the newest date directory under `daily/` and looks for the
    /// table's export there. Fails with `Error::BackupNotFound` when no date
    /// directory exists and with `Error::ExportNotFound` when the newest date
    /// holds no export of the table.
    pub async fn find_latest(&self, table: &str) -> Result<BackupLocation> {
        let date = self.latest_date().await?;
        let location = self.find_by_date(table, &date).await?;
        info!("Latest backup of {} is from {}", table, date);
        Ok(location)
    }

    /// Backup of `table` taken on `date`.
    ///
    /// When several export ids exist the most recently written one is used.
    pub async fn find_by_date(&self, table: &str, date: &BackupDate) -> Result<BackupLocation> {
        let prefix = backup_path(date, table);
        let root = export_root(&prefix);

        let export_ids = self.storage.list_prefixes(&root).await?;
        if export_ids.is_empty() {
            return Err(Error::ExportNotFound(format!("{} on {}", table, date)));
        }

        let export_prefix = if export_ids.len() == 1 {
            export_ids.into_iter().next()
        } else {
            self.newest_export(&root, export_ids).await?
        }
        .ok_or_else(|| Error::ExportNotFound(format!("{} on {}", table, date)))?;

        let export_id = last_segment(&export_prefix).to_string();
        debug!("Found export {} for {} on {}", export_id, table, date);

        Ok(BackupLocation {
            date: *date,
            table_name: table.to_string(),
            data_prefix: data_path(&export_prefix),
            prefix,
            export_id,
        })
    }

    /// Dates (newest first, at most `limit`) with any object below
    /// `daily/<date>/<table>/`.
    pub async fn list_dates(&self, table: &str, limit: usize) -> Result<Vec<BackupDate>> {
        let mut dates = Vec::new();
        if limit == 0 {
            return Ok(dates);
        }

        for year in self.children_desc(DAILY_ROOT).await? {
            for month in self.children_desc(&year).await? {
                for day in self.children_desc(&month).await? {
                    let Some(date) = date_from_key(&day) else {
                        continue;
                    };
                    let tables = self.storage.list_prefixes(&day).await?;
                    if tables.iter().any(|p| last_segment(p) == table) {
                        dates.push(date);
                        if dates.len() >= limit {
                            return Ok(dates);
                        }
                    }
                }
            }
        }

        Ok(dates)
    }

    /// Newest `YYYY/MM/DD` directory, one listing per level
    async fn latest_date(&self) -> Result<BackupDate> {
        let not_found = || Error::BackupNotFound(format!("no date directories under {}/", DAILY_ROOT));

        let year = self.newest_child(DAILY_ROOT).await?.ok_or_else(not_found)?;
        let month = self.newest_child(&year).await?.ok_or_else(not_found)?;
        let day = self.newest_child(&month).await?.ok_or_else(not_found)?;

        date_from_key(&day).ok_or_else(|| {
            debug!("Newest prefix {} is not a date", day);
            not_found()
        })
    }

    async fn newest_child(&self, prefix: &str) -> Result<Option<String>> {
        Ok(self.storage.list_prefixes(prefix).await?.into_iter().max())
    }

    /// Immediate child prefixes, lexicographically descending
    async fn children_desc(&self, prefix: &str) -> Result<Vec<String>> {
        let mut children = self.storage.list_prefixes(prefix).await?;
        children.sort_unstable_by(|a, b| b.cmp(a));
        Ok(children)
    }

    /// Export directory with the most recent object, ties broken by id
    async fn newest_export(&self, root: &str, export_ids: Vec<String>) -> Result<Option<String>> {
        let objects = self.storage.list_objects(root).await?;

        let newest = export_ids
            .into_iter()
            .map(|export| {
                let dir = format!("{}/", export);
                let written = objects
                    .iter()
                    .filter(|o| o.key.starts_with(&dir))
                    .map(|o| o.meta.last_modified)
                    .max()
                    .unwrap_or(i64::MIN);
                (written, export)
            })
            .max();

        Ok(newest.map(|(_, export)| export))
    }
}

fn last_segment(prefix: &str) -> &str {
    let prefix = prefix.trim_end_matches('/');
    prefix.rsplit('/').next().unwrap_or(prefix)
}
