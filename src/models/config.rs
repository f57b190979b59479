//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Listings page and HTTP client settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Markup extraction rules
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Record store location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Change detection behavior
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Mail delivery
    #[serde(default)]
    pub mail: MailConfig,

    /// Trigger endpoint
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Override settings from process environment variables.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override settings from a key lookup.
    ///
    /// Recognized keys: `WEBSITE_URL`, `STORE_PATH`, `EMAIL_SENDER`,
    /// `EMAIL_RECIPIENT`, `RESEND_API_KEY`, `CRON_SECRET`, `BIND_ADDR`,
    /// `MAX_NEW_PER_RUN`. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("WEBSITE_URL") {
            self.source.url = url;
        }
        if let Some(path) = get("STORE_PATH") {
            self.storage.path = PathBuf::from(path);
        }
        if let Some(sender) = get("EMAIL_SENDER") {
            self.mail.sender = sender;
        }
        if let Some(recipient) = get("EMAIL_RECIPIENT") {
            self.mail.recipient = recipient;
        }
        if let Some(key) = get("RESEND_API_KEY") {
            self.mail.api_key = Some(key);
        }
        if let Some(secret) = get("CRON_SECRET") {
            self.server.cron_secret = Some(secret);
        }
        if let Some(bind) = get("BIND_ADDR") {
            self.server.bind = bind;
        }
        if let Some(cap) = get("MAX_NEW_PER_RUN") {
            match cap.parse() {
                Ok(n) => self.pipeline.max_new_per_run = n,
                Err(_) => log::warn!("Ignoring MAX_NEW_PER_RUN={cap:?}: not a number"),
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.source.url.trim().is_empty() {
            return Err(AppError::validation("source.url is empty"));
        }
        url::Url::parse(&self.source.url)?;
        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::validation("source.user_agent is empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        if self.pipeline.max_new_per_run == 0 {
            return Err(AppError::validation("pipeline.max_new_per_run must be > 0"));
        }
        scraper::Selector::parse(&self.extract.anchor_selector)
            .map_err(|e| AppError::selector(&self.extract.anchor_selector, format!("{e:?}")))?;
        regex::Regex::new(&self.extract.date_pattern).map_err(|e| {
            AppError::validation(format!("extract.date_pattern does not compile: {e}"))
        })?;
        if self.mail.api_key.is_some() {
            if self.mail.sender.trim().is_empty() {
                return Err(AppError::validation("mail.sender is empty"));
            }
            if self.mail.recipient.trim().is_empty() {
                return Err(AppError::validation("mail.recipient is empty"));
            }
        }
        Ok(())
    }
}

/// Listings page and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// URL of the listings page
    #[serde(default)]
    pub url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Markup extraction rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// CSS selector matching one anchor per circular
    #[serde(default = "defaults::anchor_selector")]
    pub anchor_selector: String,

    /// Pattern for the date embedded in the anchor text
    #[serde(default = "defaults::date_pattern")]
    pub date_pattern: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            anchor_selector: defaults::anchor_selector(),
            date_pattern: defaults::date_pattern(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON document holding every persisted circular
    #[serde(default = "defaults::store_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: defaults::store_path(),
        }
    }
}

/// Change detection behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Upper bound on records persisted and announced per run
    #[serde(default = "defaults::max_new_per_run")]
    pub max_new_per_run: usize,

    /// Drop repeated (name, link) pairs within one fetch before persisting
    #[serde(default = "defaults::collapse_duplicates")]
    pub collapse_duplicates: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_new_per_run: defaults::max_new_per_run(),
            collapse_duplicates: defaults::collapse_duplicates(),
        }
    }
}

/// Mail delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub sender: String,

    #[serde(default)]
    pub recipient: String,

    /// Mail API key. Without it messages are only logged.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "defaults::mail_api_base")]
    pub api_base: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            sender: String::new(),
            recipient: String::new(),
            api_key: None,
            api_base: defaults::mail_api_base(),
        }
    }
}

/// Trigger endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::bind")]
    pub bind: String,

    /// Shared secret expected as `Authorization: Bearer <secret>`
    #[serde(default)]
    pub cron_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: defaults::bind(),
            cron_secret: None,
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Source defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; circular-tracker/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Extraction defaults
    pub fn anchor_selector() -> String {
        r#"div[dir="ltr"] ul a"#.into()
    }
    pub fn date_pattern() -> String {
        r"\d{2}\.\d{2}\.\d{4}".into()
    }

    pub fn store_path() -> PathBuf {
        PathBuf::from("storage/circulars.json")
    }

    // Pipeline defaults
    pub fn max_new_per_run() -> usize {
        50
    }
    pub fn collapse_duplicates() -> bool {
        true
    }

    pub fn mail_api_base() -> String {
        "https://api.resend.com".into()
    }

    pub fn bind() -> String {
        "0.0.0.0:3000".into()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.source.url = "https://example.com/placements".to_string();
        config
    }

    #[test]
    fn validate_configured_url_ok() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_url() {
        assert!(Config::default().validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = valid_config();
        config.source.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_cap() {
        let mut config = valid_config();
        config.pipeline.max_new_per_run = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_selector() {
        let mut config = valid_config();
        config.extract.anchor_selector = "[[invalid".to_string();
        assert!(matches!(
            config.validate(),
            Err(AppError::Selector { .. })
        ));
    }

    #[test]
    fn validate_requires_addresses_with_api_key() {
        let mut config = valid_config();
        config.mail.api_key = Some("re_123".to_string());
        assert!(config.validate().is_err());

        config.mail.sender = "tracker@example.com".to_string();
        config.mail.recipient = "me@example.com".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [source]
            url = "https://example.com/list"

            [pipeline]
            max_new_per_run = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.source.url, "https://example.com/list");
        assert_eq!(config.source.timeout_secs, 30);
        assert_eq!(config.pipeline.max_new_per_run, 10);
        assert!(config.pipeline.collapse_duplicates);
        assert_eq!(config.extract.anchor_selector, r#"div[dir="ltr"] ul a"#);
    }

    #[test]
    fn overrides_replace_fields() {
        let env: HashMap<&str, &str> = [
            ("WEBSITE_URL", "https://example.com/env"),
            ("STORE_PATH", "/tmp/store.json"),
            ("EMAIL_SENDER", "from@example.com"),
            ("EMAIL_RECIPIENT", "to@example.com"),
            ("RESEND_API_KEY", "re_abc"),
            ("CRON_SECRET", "s3cret"),
            ("MAX_NEW_PER_RUN", "7"),
            ("BIND_ADDR", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.source.url, "https://example.com/env");
        assert_eq!(config.storage.path, PathBuf::from("/tmp/store.json"));
        assert_eq!(config.mail.sender, "from@example.com");
        assert_eq!(config.mail.recipient, "to@example.com");
        assert_eq!(config.mail.api_key.as_deref(), Some("re_abc"));
        assert_eq!(config.server.cron_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.pipeline.max_new_per_run, 7);
        // Empty values leave the default in place
        assert_eq!(config.server.bind, "0.0.0.0:3000");
    }

    #[test]
    fn overrides_ignore_unparsable_cap() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == "MAX_NEW_PER_RUN").then(|| "lots".to_string()));
        assert_eq!(config.pipeline.max_new_per_run, 50);
    }
}
