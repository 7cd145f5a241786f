//! Discrepancy detection module
//!
//! Compares expected prices from impact reasoning against live market
//! prices to decide whether an actionable opportunity exists.

mod discrepancy;

pub use discrepancy::DiscrepancyDetector;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Recommended follow-up for an opportunity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendedAction {
    /// Keep watching; the core never places orders
    Watch,
}

/// A news/market pairing whose predicted and actual prices diverge
///
/// Ephemeral: exists only within one cycle's processing of one pair.
#[derive(Debug, Clone)]
pub struct Opportunity {
    /// Affected market
    pub market_id: String,
    /// Related news article URL
    pub news_url: String,
    /// Live yes-price when evaluated
    pub current_price: Decimal,
    /// Price implied by the impact assessment
    pub expected_price: Decimal,
    /// |expected - current|
    pub discrepancy: Decimal,
    /// Confidence carried over from the assessment
    pub confidence: Decimal,
    /// Whether confidence cleared the configured threshold
    pub meets_confidence: bool,
    /// Whether the discrepancy cleared the configured margin
    pub meets_margin: bool,
    /// Recommended follow-up
    pub action: RecommendedAction,
}
