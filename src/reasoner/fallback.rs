//! Deterministic keyword-overlap fallback
//!
//! Substitute reasoning used whenever the primary model is unavailable.
//! Relevance is the ratio of market-question tokens that also appear in the
//! article text. Direction stays neutral unless the overlap is strong, in
//! which case a small polarity keyword list decides; ambiguous matches lean
//! up. Confidence is a fixed low constant to reflect reduced trust.

use super::{PriceDirection, RawAssessment, Reasoner};
use crate::market::MarketSnapshot;
use crate::news::NewsItem;
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeSet;

/// Fixed confidence assigned to every fallback assessment
pub const FALLBACK_CONFIDENCE: Decimal = dec!(0.4);

/// Fixed move magnitude assumed by the fallback
pub const FALLBACK_MAGNITUDE: Decimal = dec!(0.1);

/// Words suggesting the yes-price should rise
const POSITIVE_KEYWORDS: &[&str] = &[
    "win", "wins", "gain", "gains", "success", "approve", "approves", "pass", "passes", "yes",
    "up", "rise", "rises", "surge",
];

/// Words suggesting the yes-price should fall
const NEGATIVE_KEYWORDS: &[&str] = &[
    "lose", "loses", "fail", "fails", "reject", "rejects", "no", "down", "fall", "falls", "drop",
    "drops", "resign", "resigns",
];

/// Keyword-overlap reasoning strategy
pub struct FallbackReasoner {
    /// Overlap ratio above which a direction is inferred
    strong_overlap: Decimal,
}

impl FallbackReasoner {
    /// Create a fallback with a custom strong-overlap threshold
    pub fn new(strong_overlap: Decimal) -> Self {
        Self { strong_overlap }
    }

    /// Evaluate a news/market pair; infallible and free of randomness
    pub fn evaluate(&self, news: &NewsItem, market: &MarketSnapshot) -> RawAssessment {
        let question_tokens = tokenize(&market.question);
        let article_text = format!("{} {}", news.headline, news.summary);
        let article_tokens = tokenize(&article_text);

        let overlap = question_tokens.intersection(&article_tokens).count();
        let relevance = (Decimal::from(overlap)
            / Decimal::from(question_tokens.len().max(1)))
        .min(Decimal::ONE);

        let direction = if relevance > self.strong_overlap {
            infer_direction(&article_tokens)
        } else {
            PriceDirection::Neutral
        };

        RawAssessment {
            relevance,
            direction,
            confidence: FALLBACK_CONFIDENCE,
            expected_magnitude: FALLBACK_MAGNITUDE,
            reasoning: format!(
                "Keyword analysis: {} of {} question tokens matched (relevance {:.2}), direction {:?}",
                overlap,
                question_tokens.len(),
                relevance,
                direction
            ),
        }
    }
}

impl Default for FallbackReasoner {
    fn default() -> Self {
        Self::new(dec!(0.3))
    }
}

#[async_trait]
impl Reasoner for FallbackReasoner {
    async fn assess(
        &self,
        news: &NewsItem,
        market: &MarketSnapshot,
    ) -> anyhow::Result<RawAssessment> {
        Ok(self.evaluate(news, market))
    }
}

/// Lowercased alphanumeric tokens of a text
fn tokenize(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Polarity vote over the article tokens; ties and no-matches lean up
fn infer_direction(article_tokens: &BTreeSet<String>) -> PriceDirection {
    let hits = |keywords: &[&str]| {
        keywords
            .iter()
            .filter(|k| article_tokens.contains(**k))
            .count()
    };
    let positive = hits(POSITIVE_KEYWORDS);
    let negative = hits(NEGATIVE_KEYWORDS);

    if negative > positive {
        PriceDirection::Down
    } else {
        PriceDirection::Up
    }
}
