// src/services/extractor.rs

//! Record extraction from listings markup.
//!
//! Every anchor matched by the configured selector becomes one [`Record`]:
//! its text is the name, its `href` the link, and the first date-shaped
//! substring of the text the date. Missing fields get sentinel values.

use regex::Regex;
use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{ExtractConfig, NO_DATE, NO_LINK, Record};
use crate::utils::normalize_whitespace;

/// Pure markup-to-records extractor.
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    anchor_sel: Selector,
    date_re: Regex,
}

impl RecordExtractor {
    /// Compile the selector and date pattern from configuration.
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        let anchor_sel = Self::parse_selector(&config.anchor_selector)?;
        let date_re = Regex::new(&config.date_pattern).map_err(|e| {
            AppError::config(format!(
                "Invalid date pattern '{}': {e}",
                config.date_pattern
            ))
        })?;
        Ok(Self {
            anchor_sel,
            date_re,
        })
    }

    /// Extract records in document order.
    pub fn extract(&self, markup: &str) -> Vec<Record> {
        let document = Html::parse_document(markup);

        document
            .select(&self.anchor_sel)
            .map(|anchor| {
                let raw_name: String = anchor.text().collect();
                let name = normalize_whitespace(&raw_name);

                let link = anchor
                    .value()
                    .attr("href")
                    .map(str::trim)
                    .filter(|href| !href.is_empty())
                    .unwrap_or(NO_LINK)
                    .to_string();

                let date = self
                    .date_re
                    .find(&name)
                    .map_or(NO_DATE, |m| m.as_str())
                    .to_string();

                Record { name, link, date }
            })
            .collect()
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}
