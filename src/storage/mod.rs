//! Storage abstractions for circular persistence.
//!
//! The store is append-only: every run reads the full set of known records
//! and appends the ones it has not seen before. Nothing is ever rewritten
//! or removed.
//!
//! ## Document Layout
//!
//! ```text
//! {
//!   "updated_at": "2026-01-01T00:00:00Z",
//!   "count": 2,
//!   "records": [
//!     { "id": "<sha256>", "name": "...", "link": "...", "date": "...", "first_seen": "..." },
//!     ...
//!   ]
//! }
//! ```

pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Record, StoredRecord};

// Re-export for convenience
pub use local::JsonFileStore;

/// Serialized form of the whole store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreDocument {
    /// ISO 8601 timestamp of last append
    pub updated_at: DateTime<Utc>,
    /// Total record count
    pub count: usize,
    pub records: Vec<StoredRecord>,
}

impl StoreDocument {
    pub fn new(records: Vec<StoredRecord>) -> Self {
        Self {
            updated_at: Utc::now(),
            count: records.len(),
            records,
        }
    }

    /// Plain records in insertion order.
    pub fn into_records(self) -> Vec<Record> {
        self.records.into_iter().map(|r| r.record).collect()
    }
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Trait for record storage backends.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read every persisted record.
    async fn load_all(&self) -> Result<Vec<Record>>;

    /// Append records. Existing records are never modified.
    async fn append_many(&self, records: &[Record]) -> Result<()>;

    /// Number of persisted records.
    async fn count(&self) -> Result<usize> {
        Ok(self.load_all().await?.len())
    }

    /// Human-readable location of the store, for logs.
    fn location(&self) -> String;
}
