// src/services/notifier.rs

//! Digest rendering and mail dispatch.
//!
//! [`EmailNotifier`] turns a batch of new circulars into an HTML digest and
//! hands it to a [`MailTransport`]. Two transports exist:
//! - `ResendTransport`: posts to the Resend HTTP API
//! - `LogTransport`: logs the message instead of sending it (dry runs)

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use maud::{DOCTYPE, html};
use regex::Regex;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{MailConfig, Record};

/// Subject used when a run finds nothing new.
pub const NO_UPDATES_SUBJECT: &str = "No new circulars found";

const NO_UPDATES_TEXT: &str =
    "The latest check of the placement circulars page found no new circulars.";

static COMPANY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)\s*Placement Circular").expect("static regex"));

/// Message body variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailBody {
    Html(String),
    Text(String),
}

/// A fully rendered email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: MailBody,
}

/// Something that can deliver an [`EmailMessage`].
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Renders digests and dispatches them through a transport.
#[derive(Clone)]
pub struct EmailNotifier {
    transport: Arc<dyn MailTransport>,
    sender: String,
    recipient: String,
}

impl EmailNotifier {
    pub fn new(
        transport: Arc<dyn MailTransport>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            sender: sender.into(),
            recipient: recipient.into(),
        }
    }

    /// Build a notifier from `[mail]` settings.
    ///
    /// Without an API key, or when `dry_run` is set, messages are only logged.
    pub fn from_config(config: &MailConfig, client: Client, dry_run: bool) -> Self {
        let transport: Arc<dyn MailTransport> = match (&config.api_key, dry_run) {
            (Some(key), false) => Arc::new(ResendTransport::new(client, &config.api_base, key)),
            _ => {
                log::info!("Mail delivery disabled; digests will be logged only");
                Arc::new(LogTransport)
            }
        };
        Self::new(transport, &config.sender, &config.recipient)
    }

    /// Send the digest for a non-empty batch of new records.
    pub async fn notify_new_records(&self, records: &[Record]) -> Result<()> {
        if records.is_empty() {
            return Err(AppError::notify("refusing to send an empty digest"));
        }
        let message = EmailMessage {
            from: self.sender.clone(),
            to: self.recipient.clone(),
            subject: digest_subject(records),
            body: MailBody::Html(render_digest(records)),
        };
        self.transport.send(&message).await?;
        log::info!("Digest for {} new circular(s) sent", records.len());
        Ok(())
    }

    /// Send the fixed "nothing new" notice.
    pub async fn notify_no_new_records(&self) -> Result<()> {
        let message = EmailMessage {
            from: self.sender.clone(),
            to: self.recipient.clone(),
            subject: NO_UPDATES_SUBJECT.to_string(),
            body: MailBody::Text(NO_UPDATES_TEXT.to_string()),
        };
        self.transport.send(&message).await?;
        log::info!("No-updates notice sent");
        Ok(())
    }
}

/// Company part of a circular name: the text before "Placement Circular",
/// or the whole name when the phrase is absent.
pub fn company_name(name: &str) -> &str {
    COMPANY_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|company| !company.is_empty())
        .unwrap_or(name)
}

/// Subject line naming the first two companies.
pub fn digest_subject(records: &[Record]) -> String {
    let companies: Vec<&str> = records
        .iter()
        .take(2)
        .map(|r| company_name(&r.name))
        .collect();
    format!("{} and more...", companies.join(", "))
}

/// HTML table digest of the given records.
pub fn render_digest(records: &[Record]) -> String {
    const CELL: &str = "border: 1px solid #ddd; padding: 8px;";

    let markup = html! {
        (DOCTYPE)
        html {
            body {
                h2 style="color: #4CAF50;" { "New Company Circulars Added" }
                table style="width: 100%; border-collapse: collapse;" {
                    thead {
                        tr {
                            th style=(CELL) { "Company Name" }
                            th style=(CELL) { "Link" }
                            th style=(CELL) { "Date" }
                        }
                    }
                    tbody {
                        @for record in records {
                            tr {
                                td style=(CELL) { (record.name) }
                                td style=(CELL) { a href=(record.link) { (record.link) } }
                                td style=(CELL) { (record.date) }
                            }
                        }
                    }
                }
            }
        }
    };
    markup.into_string()
}

/// Request body of the Resend `POST /emails` call.
#[derive(Debug, Serialize)]
struct ResendEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

impl<'a> From<&'a EmailMessage> for ResendEmail<'a> {
    fn from(message: &'a EmailMessage) -> Self {
        let (html, text) = match &message.body {
            MailBody::Html(html) => (Some(html.as_str()), None),
            MailBody::Text(text) => (None, Some(text.as_str())),
        };
        Self {
            from: &message.from,
            to: [&message.to],
            subject: &message.subject,
            html,
            text,
        }
    }
}

/// Delivers mail through the Resend HTTP API.
#[derive(Clone)]
pub struct ResendTransport {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl ResendTransport {
    pub fn new(client: Client, api_base: &str, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: format!("{}/emails", api_base.trim_end_matches('/')),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl MailTransport for ResendTransport {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&ResendEmail::from(message))
            .send()
            .await
            .map_err(AppError::notify)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::notify(format!("mail API returned {status}: {body}")));
        }
        Ok(())
    }
}

/// Logs messages instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        log::info!(
            "[dry-run] mail to {:?}: {}",
            message.to,
            message.subject
        );
        match &message.body {
            MailBody::Html(html) => log::debug!("{html}"),
            MailBody::Text(text) => log::debug!("{text}"),
        }
        Ok(())
    }
}
