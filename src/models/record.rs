//! Circular record data structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Placeholder when an anchor carries no usable `href`.
pub const NO_LINK: &str = "No link found";

/// Placeholder when the anchor text holds no date.
pub const NO_DATE: &str = "No date found";

/// A circular scraped from the listings page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    /// Anchor text, usually "<Company> Placement Circular <date>"
    pub name: String,

    /// Target of the anchor or [`NO_LINK`]
    pub link: String,

    /// `DD.MM.YYYY` substring of the name or [`NO_DATE`]
    pub date: String,
}

/// Identity of a record for deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordKey<'a> {
    pub name: &'a str,
    pub link: &'a str,
}

impl Record {
    pub fn new(name: impl Into<String>, link: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: link.into(),
            date: date.into(),
        }
    }

    /// The `(name, link)` pair that identifies this record.
    pub fn key(&self) -> RecordKey<'_> {
        RecordKey {
            name: &self.name,
            link: &self.link,
        }
    }

    /// Stable hex fingerprint of the identity key.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.name.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.link.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// A record as it sits in the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredRecord {
    pub id: String,

    #[serde(flatten)]
    pub record: Record,

    /// When this tracker first persisted the record
    pub first_seen: DateTime<Utc>,
}

impl StoredRecord {
    pub fn new(record: Record, first_seen: DateTime<Utc>) -> Self {
        Self {
            id: record.fingerprint(),
            record,
            first_seen,
        }
    }
}
