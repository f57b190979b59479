//! Local filesystem storage implementation.
//!
//! Keeps the whole record set in one JSON document. Writes go to a
//! temporary file that is renamed over the document, so a crash mid-write
//! leaves the previous version intact.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Record, StoredRecord};
use crate::storage::{RecordStore, StoreDocument};

/// JSON document store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by the document at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create an empty document if none exists yet.
    ///
    /// Returns `true` when a new document was written.
    pub async fn ensure_initialized(&self) -> Result<bool> {
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(false);
        }
        self.write_document(&StoreDocument::default()).await?;
        log::info!("Record store created: {}", self.path.display());
        Ok(true)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Read the document, returning None if the file doesn't exist.
    async fn read_document(&self) -> Result<Option<StoreDocument>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Write the document atomically (write to temp, then rename).
    async fn write_document(&self, document: &StoreDocument) -> Result<()> {
        self.ensure_dir().await?;
        let bytes = serde_json::to_vec_pretty(document)?;

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn load_all(&self) -> Result<Vec<Record>> {
        match self.read_document().await {
            Ok(Some(document)) => Ok(document.into_records()),
            Ok(None) => {
                log::warn!("No record store at {}", self.path.display());
                Ok(Vec::new())
            }
            Err(e) => Err(AppError::store_read(format!(
                "{}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn append_many(&self, records: &[Record]) -> Result<()> {
        // A document that exists but cannot be parsed must not be replaced.
        let mut document = self
            .read_document()
            .await
            .map_err(|e| AppError::store_write(format!("{}: {e}", self.path.display())))?
            .unwrap_or_default();

        let now = Utc::now();
        document.records.extend(
            records
                .iter()
                .cloned()
                .map(|record| StoredRecord::new(record, now)),
        );
        document.count = document.records.len();
        document.updated_at = now;

        self.write_document(&document)
            .await
            .map_err(|e| AppError::store_write(format!("{}: {e}", self.path.display())))?;

        log::info!(
            "Appended {} record(s) to {} ({} total)",
            records.len(),
            self.path.display(),
            document.count
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
