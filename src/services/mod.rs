//! Service layer for the tracker.
//!
//! This module contains the collaborators of a check:
//! - Page fetching (`HttpFetcher`)
//! - Record extraction (`RecordExtractor`)
//! - Digest rendering and mail dispatch (`EmailNotifier`)

mod extractor;
mod fetcher;
mod notifier;

pub use extractor::RecordExtractor;
pub use fetcher::{HttpFetcher, PageSource};
pub use notifier::{
    EmailMessage, EmailNotifier, LogTransport, MailBody, MailTransport, NO_UPDATES_SUBJECT,
    ResendTransport, company_name, digest_subject, render_digest,
};
