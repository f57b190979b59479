// src/models/mod.rs

//! Domain models for the tracker.

mod config;
mod record;

// Re-export all public types
pub use config::{
    Config, ExtractConfig, MailConfig, PipelineConfig, ServerConfig, SourceConfig, StorageConfig,
};
pub use record::{NO_DATE, NO_LINK, Record, RecordKey, StoredRecord};
