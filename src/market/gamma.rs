//! Gamma API client for market discovery
//!
//! Fetches active markets from Polymarket's Gamma API. Outcome prices come
//! back as a JSON-encoded string pair ("[\"0.60\", \"0.40\"]") and are
//! parsed into yes/no decimals.

use super::{MarketProvider, MarketSnapshot};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// Gamma API base URL
pub const GAMMA_API_URL: &str = "https://gamma-api.polymarket.com";

/// Configuration for the Gamma client
#[derive(Debug, Clone)]
pub struct GammaConfig {
    /// Base URL for the Gamma API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum markets per listing request
    pub limit: usize,
}

impl Default for GammaConfig {
    fn default() -> Self {
        Self {
            base_url: GAMMA_API_URL.to_string(),
            timeout: Duration::from_secs(10),
            limit: 100,
        }
    }
}

/// Client for Polymarket's Gamma API
pub struct GammaClient {
    config: GammaConfig,
    client: Client,
}

impl GammaClient {
    /// Create a new client with custom configuration
    pub fn with_config(config: GammaConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    async fn fetch_markets(&self, query: &[(&str, String)]) -> anyhow::Result<Vec<GammaMarket>> {
        let url = format!("{}/markets", self.config.base_url);

        tracing::debug!(url = %url, "Fetching markets from Gamma API");

        let response = self.client.get(&url).query(query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gamma API error: {} - {}", status, body);
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl MarketProvider for GammaClient {
    async fn list_markets(&self) -> anyhow::Result<Vec<MarketSnapshot>> {
        let raw = self
            .fetch_markets(&[
                ("active", "true".to_string()),
                ("closed", "false".to_string()),
                ("limit", self.config.limit.to_string()),
            ])
            .await?;

        let now = Utc::now();
        let mut snapshots = Vec::new();
        for market in raw {
            match convert_to_snapshot(market, now) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => tracing::debug!(error = %e, "Skipping unparseable market"),
            }
        }

        tracing::info!(market_count = snapshots.len(), "Found active markets");

        Ok(snapshots)
    }

    async fn get_price(&self, market_id: &str) -> anyhow::Result<Decimal> {
        let raw = self
            .fetch_markets(&[("id", market_id.to_string())])
            .await?;

        let market = raw
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Market {} not found", market_id))?;

        let prices = market
            .outcome_prices
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Market {} has no outcome prices", market_id))?;
        let (yes, _no) = parse_outcome_prices(prices)?;
        Ok(yes)
    }
}

/// Convert a raw Gamma market into a snapshot
fn convert_to_snapshot(gamma: GammaMarket, now: DateTime<Utc>) -> anyhow::Result<MarketSnapshot> {
    let prices = gamma
        .outcome_prices
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("Missing outcomePrices"))?;
    let (yes_price, no_price) = parse_outcome_prices(prices)?;

    let end_date = gamma
        .end_date
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(MarketSnapshot {
        market_id: gamma.id,
        question: gamma.question,
        end_date,
        yes_price,
        no_price,
        refreshed_at: now,
    })
}

/// Parse outcome prices from a JSON string pair
///
/// Format: "[\"0.60\", \"0.40\"]" where the first entry is the yes price
fn parse_outcome_prices(prices_str: &str) -> anyhow::Result<(Decimal, Decimal)> {
    let prices: Vec<String> = serde_json::from_str(prices_str)
        .map_err(|e| anyhow::anyhow!("Failed to parse outcomePrices: {} - {}", prices_str, e))?;

    if prices.len() < 2 {
        anyhow::bail!("Expected 2 outcome prices, got {}: {}", prices.len(), prices_str);
    }

    let yes = Decimal::from_str(&prices[0])?;
    let no = Decimal::from_str(&prices[1])?;
    Ok((yes, no))
}

/// Raw market response from the Gamma API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GammaMarket {
    /// Market identifier
    id: String,
    /// Market question
    question: String,
    /// Outcome prices as a JSON string
    outcome_prices: Option<String>,
    /// Market end date
    end_date: Option<String>,
}
