//! File-backed record store.
//!
//! Each day lives in its own pretty-printed JSON document named
//! `<YYYY-MM-DD>.json` under the store root, so the data can be inspected
//! and fixed by hand. Writes go to a uniquely named temporary file first and
//! are renamed over the target, so readers only ever see a complete old or a
//! complete new document.

use crate::store::record::{DayRecord, HabitEntry};
use chrono::{NaiveDate, Utc};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

/// Date format used for document names.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors raised by the record store.
///
/// A missing document is never an error; see [`RecordStore::read`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document exists but could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The document or its directory could not be written
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The document exists but does not parse as a day record
    #[error("corrupt habit document {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The record could not be serialized
    #[error("failed to encode habit document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persists one [`DayRecord`] per calendar date.
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the day documents.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document for `date`.
    pub fn document_path(&self, date: NaiveDate) -> PathBuf {
        self.root.join(format!("{}.json", date.format(DATE_FORMAT)))
    }

    /// Replace the record for `date` with `habits`.
    ///
    /// The previous document, if any, is overwritten as a whole. Returns the
    /// record as persisted, with `last_updated` set to now.
    pub async fn write(
        &self,
        date: NaiveDate,
        habits: Vec<HabitEntry>,
    ) -> Result<DayRecord, StoreError> {
        let record = DayRecord {
            date,
            habits,
            last_updated: Some(Utc::now()),
        };
        let json = serde_json::to_string_pretty(&record)?;

        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StoreError::Write {
                path: self.root.clone(),
                source,
            })?;

        let target = self.document_path(date);
        let tmp = self.root.join(format!(
            ".{}.{}.tmp",
            date.format(DATE_FORMAT),
            Uuid::new_v4().simple()
        ));

        if let Err(source) = fs::write(&tmp, json).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StoreError::Write { path: tmp, source });
        }

        if let Err(source) = fs::rename(&tmp, &target).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StoreError::Write {
                path: target,
                source,
            });
        }

        tracing::debug!(
            "Wrote {} habits for {} to {:?}",
            record.habits.len(),
            date,
            target
        );

        Ok(record)
    }

    /// Load the record for `date`.
    ///
    /// Returns an empty record with no `last_updated` if nothing has been
    /// synced for that date.
    pub async fn read(&self, date: NaiveDate) -> Result<DayRecord, StoreError> {
        let path = self.document_path(date);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(DayRecord::empty(date)),
            Err(source) => return Err(StoreError::Read { path, source }),
        };

        let mut record: DayRecord =
            serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?;

        // The file name is the key; a hand-edited date field does not move the record.
        if record.date != date {
            tracing::warn!(
                "Document {:?} claims date {}, using {}",
                path,
                record.date,
                date
            );
            record.date = date;
        }

        Ok(record)
    }

    /// Check whether a document exists for `date`.
    pub async fn exists(&self, date: NaiveDate) -> Result<bool, StoreError> {
        let path = self.document_path(date);
        fs::try_exists(&path)
            .await
            .map_err(|source| StoreError::Read { path, source })
    }

    /// All dates that have a stored document, oldest first.
    ///
    /// Files that are not named after a date are ignored.
    pub async fn dates(&self) -> Result<Vec<NaiveDate>, StoreError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.root.clone(),
                    source,
                })
            }
        };

        let mut dates = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| StoreError::Read {
                path: self.root.clone(),
                source,
            })?
        {
            let path = entry.path();
            if path.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Ok(date) = NaiveDate::parse_from_str(stem, DATE_FORMAT) {
                dates.push(date);
            }
        }

        dates.sort();
        Ok(dates)
    }
}
