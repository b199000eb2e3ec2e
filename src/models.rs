//! Data models for scraped articles and their personalized representations.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Article`]: A news article as dumped by the scraping stage and consumed
//!   by the merge pipeline
//! - [`PersonalizedContent`]: An article's title/summary after (or instead of)
//!   a stance-conditioned rewrite by the hosted model
//!
//! Raw dumps are only partially populated, so every [`Article`] field carries
//! a serde default; the merge pipeline's validity filter is what rejects
//! records whose required fields are missing.

use serde::{Deserialize, Serialize};

/// A single news article.
///
/// Records enter the system from per-source JSON dumps written by external
/// scrapers, pass through the merge pipeline (normalization, filtering,
/// deduplication), and become immutable once written to the merged
/// collection. The serve layer only ever reads them.
///
/// # Field Notes
///
/// * `url` is the deduplication key once normalized to scheme+host+path.
/// * `image` and `top_image` are redundant in the scraper dumps; the merge
///   pipeline keeps them synchronized.
/// * `publish_date` also deserializes from the scraper-dump spelling
///   `publishDate`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Article {
    /// The article URL; normalized by the merge pipeline.
    #[serde(default)]
    pub url: String,
    /// The article headline.
    #[serde(default)]
    pub title: String,
    /// The full scraped body text.
    #[serde(default)]
    pub raw_text: String,
    /// Scraper-generated summary, when the source stage produced one.
    #[serde(default)]
    pub summary: Option<String>,
    /// Lead image URL.
    #[serde(default)]
    pub image: Option<String>,
    /// Redundant lead image field carried over from the scraping library.
    #[serde(default)]
    pub top_image: Option<String>,
    /// Ordered keyword list, passed through unchanged.
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    /// Publication timestamp as emitted by the scraper, passed through unchanged.
    #[serde(default, alias = "publishDate")]
    pub publish_date: Option<String>,
    /// Byline authors, passed through unchanged.
    #[serde(default)]
    pub authors: Option<Vec<String>>,
}

impl Article {
    /// Extract the outlet name (before .com/.org/etc) from the article URL.
    /// For example: "https://lite.cnn.com/article" -> "cnn"
    pub fn source_tag(&self) -> Option<String> {
        if let Ok(parsed) = url::Url::parse(&self.url) {
            if let Some(host) = parsed.host_str() {
                // Split by dots and get the domain before the TLD
                let parts: Vec<&str> = host.split('.').collect();
                // Handle cases like "lite.cnn.com" -> "cnn" or "cnn.com" -> "cnn"
                if parts.len() >= 2 {
                    return Some(parts[parts.len() - 2].to_string());
                }
            }
        }
        None
    }
}

/// Title and summary for one displayed card.
///
/// Produced by the personalization flow: either the hosted model's reframed
/// copy (`reframed == true`) or, after any failure, the article's original
/// title and summary unchanged (`reframed == false`). The model is asked for
/// a strict `{"title": …, "summary": …}` object, which this struct also
/// deserializes directly.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PersonalizedContent {
    pub title: String,
    pub summary: String,
    /// Whether the hosted model's rewrite was actually applied.
    #[serde(default)]
    pub reframed: bool,
}
