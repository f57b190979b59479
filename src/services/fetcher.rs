// src/services/fetcher.rs

//! Listings page fetcher.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::SourceConfig;
use crate::utils::http::create_async_client;

/// Source of raw listings markup.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Retrieve the markup at `url`.
    ///
    /// Network failures and non-success statuses are errors.
    async fn fetch_markup(&self, url: &str) -> Result<String>;
}

/// Fetches pages over HTTP with a shared client.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a fetcher with a client configured from `[source]`.
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        Ok(Self::new(create_async_client(config)?))
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch_markup(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch(url, format!("HTTP status {status}")));
        }

        let markup = response.text().await.map_err(|e| AppError::fetch(url, e))?;
        log::debug!("Fetched {} bytes from {}", markup.len(), url);
        Ok(markup)
    }
}
