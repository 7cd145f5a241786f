//! Market data module
//!
//! Discovers active prediction markets via the Gamma API and holds their
//! last-known prices in a TTL-bounded cache.

mod cache;
mod gamma;

pub use cache::MarketCache;
pub use gamma::{GammaClient, GammaConfig};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A binary prediction market with its last-known prices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Unique market identifier
    pub market_id: String,
    /// Market question text
    pub question: String,
    /// Market end date, when known
    pub end_date: Option<DateTime<Utc>>,
    /// Current yes-share price in [0, 1]
    pub yes_price: Decimal,
    /// Current no-share price in [0, 1]
    pub no_price: Decimal,
    /// When the prices were last refreshed
    pub refreshed_at: DateTime<Utc>,
}

/// Market data errors
#[derive(Debug, Error)]
pub enum MarketDataError {
    /// Prices out of range or yes + no too far from 1.0
    #[error("invalid price data for market {market_id}: yes={yes} no={no}")]
    InvalidPriceData {
        market_id: String,
        yes: Decimal,
        no: Decimal,
    },
    /// Price refresh targeted a market that is not cached
    #[error("unknown market {0}")]
    UnknownMarket(String),
}

/// Trait for market data provider implementations
#[async_trait]
pub trait MarketProvider: Send + Sync {
    /// List currently active markets with their prices
    async fn list_markets(&self) -> anyhow::Result<Vec<MarketSnapshot>>;
    /// Fetch the current yes-price for a single market
    async fn get_price(&self, market_id: &str) -> anyhow::Result<Decimal>;
}
