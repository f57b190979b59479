// src/test_support.rs

//! Test doubles for the tracker's collaborators.

use std::sync::Mutex;

use async_trait::async_trait;
use axum::{Router, http::StatusCode};
use tokio::net::TcpListener;
use tokio::sync::Notify;

use crate::error::{AppError, Result};
use crate::models::Record;
use crate::services::{EmailMessage, MailTransport, PageSource};
use crate::storage::RecordStore;

// =============================================================================
// Page sources
// =============================================================================

/// Serves fixed markup, or fails every fetch.
pub struct StaticPage {
    markup: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl StaticPage {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: Some(markup.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            markup: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for StaticPage {
    async fn fetch_markup(&self, url: &str) -> Result<String> {
        self.calls.lock().unwrap().push(url.to_string());
        self.markup
            .clone()
            .ok_or_else(|| AppError::fetch(url, "HTTP status 503 Service Unavailable"))
    }
}

/// Blocks inside `fetch_markup` until released, then serves its markup.
#[derive(Default)]
pub struct GatedPage {
    pub entered: Notify,
    pub release: Notify,
    markup: String,
}

impl GatedPage {
    pub fn serving(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl PageSource for GatedPage {
    async fn fetch_markup(&self, _url: &str) -> Result<String> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self.markup.clone())
    }
}

/// Markup in the listings page shape with one anchor per record.
pub fn listing_page(records: &[Record]) -> String {
    let items: String = records
        .iter()
        .map(|r| format!("<li><a href=\"{}\">{}</a></li>\n", r.link, r.name))
        .collect();
    format!("<html><body><div dir=\"ltr\"><ul>\n{items}</ul></div></body></html>")
}

/// `count` distinct records numbered from `start`.
pub fn numbered_records(start: usize, count: usize) -> Vec<Record> {
    (start..start + count)
        .map(|n| {
            Record::new(
                format!("Company{n} Placement Circular 01.01.2024"),
                format!("https://example.com/circulars/{n}"),
                "01.01.2024",
            )
        })
        .collect()
}

// =============================================================================
// Local HTTP endpoints
// =============================================================================

/// Serve `status` for every request on a loopback port. Returns the base URL.
pub async fn status_server(status: StatusCode) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(move || async move { (status, "status server") });
    tokio::spawn(async move { axum::serve(listener, app).await });
    format!("http://{addr}")
}

/// A loopback URL with nothing listening behind it.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}

// =============================================================================
// Record store
// =============================================================================

/// In-memory store with switchable read and write failures.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<Record>>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn load_all(&self) -> Result<Vec<Record>> {
        if self.fail_reads {
            return Err(AppError::store_read("simulated read failure"));
        }
        Ok(self.records())
    }

    async fn append_many(&self, records: &[Record]) -> Result<()> {
        if self.fail_writes {
            return Err(AppError::store_write("simulated write failure"));
        }
        self.records.lock().unwrap().extend_from_slice(records);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

// =============================================================================
// Mail transport
// =============================================================================

/// Captures every message it is asked to send.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<EmailMessage>>,
    fail: bool,
}

impl RecordingTransport {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        if self.fail {
            return Err(AppError::notify("simulated mail API outage"));
        }
        Ok(())
    }
}
