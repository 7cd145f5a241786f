//! Impact reasoning module
//!
//! Asks a reasoning model how a news article should move a market's price.
//! The primary strategy calls an external model; when that fails or is not
//! configured, a deterministic keyword heuristic takes over. Assessing a
//! pair never errors, it only degrades.

mod fallback;
mod gemini;

pub use fallback::{FallbackReasoner, FALLBACK_CONFIDENCE, FALLBACK_MAGNITUDE};
pub use gemini::{GeminiConfig, GeminiReasoner};

use crate::market::MarketSnapshot;
use crate::news::NewsItem;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Expected price direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceDirection {
    Up,
    Down,
    Neutral,
}

/// Which reasoning strategy produced an assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentSource {
    /// External reasoning model
    Primary,
    /// Deterministic keyword heuristic
    Fallback,
}

/// Raw reasoning output before price derivation
#[derive(Debug, Clone)]
pub struct RawAssessment {
    /// How relevant the news is to the market, in [0, 1]
    pub relevance: Decimal,
    /// Expected direction of the price move
    pub direction: PriceDirection,
    /// Confidence in the assessment, in [0, 1]
    pub confidence: Decimal,
    /// Expected move magnitude, in [0, 1]
    pub expected_magnitude: Decimal,
    /// Explanation of the impact
    pub reasoning: String,
}

/// Assessment of one news item's impact on one market
///
/// Re-derived every time a pair is evaluated since the market price moves;
/// never cached across cycles.
#[derive(Debug, Clone)]
pub struct ImpactAssessment {
    /// Related news article URL
    pub news_url: String,
    /// Affected market
    pub market_id: String,
    /// Relevance score in [0, 1]
    pub relevance: Decimal,
    /// Expected price direction
    pub direction: PriceDirection,
    /// Confidence in [0, 1]
    pub confidence: Decimal,
    /// Expected move magnitude in [0, 1]
    pub expected_magnitude: Decimal,
    /// Current price shifted by the signed magnitude, clamped to [0, 1]
    pub expected_price: Decimal,
    /// Explanation of the impact
    pub reasoning: String,
    /// Strategy that produced this assessment
    pub source: AssessmentSource,
}

impl ImpactAssessment {
    /// Derive a full assessment from raw reasoning output
    ///
    /// The expected price is always computed locally from the market's
    /// current yes-price, never trusted from the remote model. All scores
    /// are clamped into [0, 1].
    pub fn derive(
        news: &NewsItem,
        market: &MarketSnapshot,
        raw: RawAssessment,
        source: AssessmentSource,
    ) -> Self {
        let unit = |v: Decimal| v.clamp(Decimal::ZERO, Decimal::ONE);
        let relevance = unit(raw.relevance);
        let confidence = unit(raw.confidence);
        let magnitude = unit(raw.expected_magnitude);

        let current = market.yes_price;
        let expected_price = match raw.direction {
            PriceDirection::Up => current + magnitude,
            PriceDirection::Down => current - magnitude,
            PriceDirection::Neutral => current,
        };

        Self {
            news_url: news.url.clone(),
            market_id: market.market_id.clone(),
            relevance,
            direction: raw.direction,
            confidence,
            expected_magnitude: magnitude,
            expected_price: unit(expected_price),
            reasoning: raw.reasoning,
            source,
        }
    }
}

/// Common contract for reasoning strategies
#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Assess how a news article should move a market's price
    async fn assess(
        &self,
        news: &NewsItem,
        market: &MarketSnapshot,
    ) -> anyhow::Result<RawAssessment>;
}

/// Primary-then-fallback impact reasoner
///
/// Always tries the primary strategy first, bounded by a timeout; any
/// failure degrades to the fallback heuristic. The output carries the
/// strategy that produced it.
pub struct ImpactReasoner {
    primary: Option<Arc<dyn Reasoner>>,
    fallback: FallbackReasoner,
    timeout: Duration,
}

impl ImpactReasoner {
    /// Create a reasoner; `primary` is None when no model is configured
    pub fn new(
        primary: Option<Arc<dyn Reasoner>>,
        fallback: FallbackReasoner,
        timeout: Duration,
    ) -> Self {
        Self {
            primary,
            fallback,
            timeout,
        }
    }

    /// Assess a news/market pair, degrading to the fallback on any failure
    pub async fn assess(&self, news: &NewsItem, market: &MarketSnapshot) -> ImpactAssessment {
        if let Some(primary) = &self.primary {
            match tokio::time::timeout(self.timeout, primary.assess(news, market)).await {
                Ok(Ok(raw)) => {
                    return ImpactAssessment::derive(news, market, raw, AssessmentSource::Primary)
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        market_id = %market.market_id,
                        news_url = %news.url,
                        error = %e,
                        "Primary reasoner failed, using fallback"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        market_id = %market.market_id,
                        news_url = %news.url,
                        timeout_secs = self.timeout.as_secs(),
                        "Primary reasoner timed out, using fallback"
                    );
                }
            }
        }

        let raw = self.fallback.evaluate(news, market);
        ImpactAssessment::derive(news, market, raw, AssessmentSource::Fallback)
    }
}
