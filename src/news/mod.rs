//! News ingestion module
//!
//! Polls breaking news from a search provider and holds it in a
//! deduplicated, TTL-bounded cache until paired with active markets.

mod brave;
mod cache;

pub use brave::{BraveConfig, BraveNewsClient};
pub use cache::NewsCache;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A news article keyed by its source URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    /// Article URL, the unique identifier
    pub url: String,
    /// Article headline
    pub headline: String,
    /// Article summary/snippet
    pub summary: String,
    /// News source name, when the provider reports one
    pub source: Option<String>,
    /// Publication time, when the provider reports one
    pub published_at: Option<DateTime<Utc>>,
    /// When the article was fetched
    pub fetched_at: DateTime<Utc>,
    /// Whether the article has been paired against all active markets
    pub consumed: bool,
}

impl NewsItem {
    /// Create an unconsumed item fetched now
    pub fn new(url: impl Into<String>, headline: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headline: headline.into(),
            summary: summary.into(),
            source: None,
            published_at: None,
            fetched_at: Utc::now(),
            consumed: false,
        }
    }
}

/// Trait for news provider implementations
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Search recent news for a query within a freshness window
    async fn search(
        &self,
        query: &str,
        freshness: &str,
        max_results: usize,
    ) -> anyhow::Result<Vec<NewsItem>>;
}
