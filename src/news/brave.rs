//! Brave Search client for news discovery
//!
//! Queries the Brave news search endpoint for recent articles. Results carry
//! a URL, headline, and snippet; only news results have reliable timestamps.

use super::{NewsItem, NewsProvider};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Brave Search API base URL
pub const BRAVE_API_URL: &str = "https://api.search.brave.com/res/v1/news/search";

/// Configuration for the Brave Search client
#[derive(Debug, Clone)]
pub struct BraveConfig {
    /// Base URL for the news search endpoint
    pub base_url: String,
    /// Subscription token; requests fail without one
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for BraveConfig {
    fn default() -> Self {
        Self {
            base_url: BRAVE_API_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Client for the Brave Search news API
pub struct BraveNewsClient {
    config: BraveConfig,
    client: Client,
}

impl BraveNewsClient {
    /// Create a new client with the given configuration
    pub fn with_config(config: BraveConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl NewsProvider for BraveNewsClient {
    async fn search(
        &self,
        query: &str,
        freshness: &str,
        max_results: usize,
    ) -> anyhow::Result<Vec<NewsItem>> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Brave API key not configured"))?;

        tracing::debug!(query = %query, freshness = %freshness, "Searching news");

        let count = max_results.min(50).to_string();
        let response = self
            .client
            .get(&self.config.base_url)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", api_key)
            .query(&[
                ("q", query),
                ("count", count.as_str()),
                ("freshness", freshness),
                ("search_lang", "en"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Brave Search error: {} - {}", status, body);
        }

        let payload: BraveNewsResponse = response.json().await?;
        let items: Vec<NewsItem> = payload
            .results
            .into_iter()
            .filter(|r| !r.url.is_empty())
            .map(convert_to_item)
            .collect();

        tracing::info!(query = %query, results = items.len(), "News search complete");

        Ok(items)
    }
}

/// Convert a raw Brave result into a news item
fn convert_to_item(result: BraveNewsResult) -> NewsItem {
    let published_at = result
        .page_age
        .as_deref()
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    NewsItem {
        url: result.url,
        headline: result.title,
        summary: result.description.unwrap_or_default(),
        source: result.meta_url.and_then(|m| m.hostname),
        published_at,
        fetched_at: Utc::now(),
        consumed: false,
    }
}

/// Response from the news search endpoint
#[derive(Debug, Deserialize)]
struct BraveNewsResponse {
    #[serde(default)]
    results: Vec<BraveNewsResult>,
}

/// A single news result
#[derive(Debug, Deserialize)]
struct BraveNewsResult {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    description: Option<String>,
    /// Page timestamp in RFC 3339, when known
    page_age: Option<String>,
    meta_url: Option<BraveMetaUrl>,
}

/// Source metadata attached to a result
#[derive(Debug, Deserialize)]
struct BraveMetaUrl {
    hostname: Option<String>,
}
