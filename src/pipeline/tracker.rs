// src/pipeline/tracker.rs

//! One check of the listings page.
//!
//! `FETCH → EXTRACT → LOAD_KNOWN → DIFF → {PERSIST + NOTIFY_NEW | NOTIFY_NONE}`
//!
//! - Fetch failure aborts the run before any side effect.
//! - A failed store read counts as "nothing known yet" and the run goes on.
//! - A failed store write aborts the run before anything is announced.
//! - Mail failures are logged; persisted records stay persisted.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{Config, PipelineConfig, Record};
use crate::pipeline::diff::{collapse_duplicates, detect_new};
use crate::services::{EmailNotifier, HttpFetcher, PageSource, RecordExtractor};
use crate::storage::{JsonFileStore, RecordStore};
use crate::utils::http::create_async_client;

/// How a completed run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Nothing new; the no-updates notice was attempted
    NoNewRecords,
    /// New records were persisted; the digest was attempted
    Persisted,
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Records extracted from the page
    pub scraped: usize,
    /// Records in the store before this run
    pub known: usize,
    /// Records persisted and announced by this run
    pub new: usize,
    /// New records held back by the per-run cap
    pub deferred: usize,
    /// Whether the notification was delivered
    pub notified: bool,
}

/// The change-detection pipeline and its collaborators.
pub struct Tracker {
    source_url: String,
    source: Arc<dyn PageSource>,
    extractor: RecordExtractor,
    store: Arc<dyn RecordStore>,
    notifier: EmailNotifier,
    settings: PipelineConfig,
    run_lock: Mutex<()>,
}

impl Tracker {
    pub fn new(
        source_url: impl Into<String>,
        source: Arc<dyn PageSource>,
        extractor: RecordExtractor,
        store: Arc<dyn RecordStore>,
        notifier: EmailNotifier,
        settings: PipelineConfig,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            source,
            extractor,
            store,
            notifier,
            settings,
            run_lock: Mutex::new(()),
        }
    }

    /// Wire the production collaborators from configuration.
    ///
    /// One HTTP client is shared by the fetcher and the mail transport.
    pub fn from_config(config: &Config, dry_run: bool) -> Result<Self> {
        let client = create_async_client(&config.source)?;
        let extractor = RecordExtractor::new(&config.extract)?;
        let store = JsonFileStore::new(&config.storage.path);
        let notifier = EmailNotifier::from_config(&config.mail, client.clone(), dry_run);

        Ok(Self::new(
            &config.source.url,
            Arc::new(HttpFetcher::new(client)),
            extractor,
            Arc::new(store),
            notifier,
            config.pipeline.clone(),
        ))
    }

    /// Run one check. Overlapping calls fail with [`AppError::RunInProgress`].
    pub async fn run(&self) -> Result<RunReport> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| AppError::RunInProgress)?;

        log::info!("Checking {} for new circulars", self.source_url);

        let markup = self.source.fetch_markup(&self.source_url).await?;
        let current = self.extractor.extract(&markup);
        log::info!("Extracted {} circular(s)", current.len());

        let known = match self.store.load_all().await {
            Ok(known) => known,
            Err(e) => {
                log::warn!("Could not read known circulars, treating all as new: {e}");
                Vec::new()
            }
        };

        let mut fresh = detect_new(&current, &known);
        if self.settings.collapse_duplicates {
            let before = fresh.len();
            fresh = collapse_duplicates(fresh);
            if fresh.len() < before {
                log::warn!(
                    "Dropped {} repeated circular(s) within this fetch",
                    before - fresh.len()
                );
            }
        }

        if fresh.is_empty() {
            log::info!("No new circulars");
            let notified = self.notify(None).await;
            return Ok(RunReport {
                outcome: RunOutcome::NoNewRecords,
                scraped: current.len(),
                known: known.len(),
                new: 0,
                deferred: 0,
                notified,
            });
        }

        let cap = self.settings.max_new_per_run;
        let deferred = fresh.len().saturating_sub(cap);
        if deferred > 0 {
            log::warn!(
                "{} new circulars exceed the cap of {cap}; deferring {deferred} to a later run",
                fresh.len()
            );
            fresh.truncate(cap);
        }

        self.store.append_many(&fresh).await?;
        log::info!(
            "Persisted {} new circular(s) to {}",
            fresh.len(),
            self.store.location()
        );

        let notified = self.notify(Some(&fresh)).await;
        Ok(RunReport {
            outcome: RunOutcome::Persisted,
            scraped: current.len(),
            known: known.len(),
            new: fresh.len(),
            deferred,
            notified,
        })
    }

    /// Send the digest (or the no-updates notice); never fails the run.
    async fn notify(&self, fresh: Option<&[Record]>) -> bool {
        let result = match fresh {
            Some(records) => self.notifier.notify_new_records(records).await,
            None => self.notifier.notify_no_new_records().await,
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                log::error!("Notification failed: {e}");
                false
            }
        }
    }
}
