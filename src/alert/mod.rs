//! Alerting module
//!
//! Turns opportunities into deduplicated, severity-classified alerts with
//! per-market cooldowns and a bounded in-memory history.

mod manager;

pub use manager::{AlertManager, AlertStats};

use crate::detector::Opportunity;
use crate::market::MarketSnapshot;
use crate::news::NewsItem;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Alert severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AlertSeverity::Info => "INFO",
            AlertSeverity::Warning => "WARNING",
            AlertSeverity::Critical => "CRITICAL",
        };
        write!(f, "{label}")
    }
}

/// An emitted alert; immutable after creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Unique alert identifier
    pub id: Uuid,
    /// Alert severity
    pub severity: AlertSeverity,
    /// Affected market
    pub market_id: String,
    /// Market question text
    pub market_question: String,
    /// Related news article URL
    pub news_url: String,
    /// Related news headline
    pub news_headline: String,
    /// Confidence behind the alert
    pub confidence: Decimal,
    /// Expected-vs-current price discrepancy
    pub discrepancy: Decimal,
    /// Live price when the alert fired
    pub current_price: Decimal,
    /// Price implied by the reasoning
    pub expected_price: Decimal,
    /// Human-readable alert message
    pub message: String,
    /// Reasoning behind the assessment
    pub reasoning: String,
    /// When the alert was created
    pub created_at: DateTime<Utc>,
}

impl Alert {
    /// Build an alert for an opportunity that cleared all gates
    pub fn from_opportunity(
        opportunity: &Opportunity,
        news: &NewsItem,
        market: &MarketSnapshot,
        reasoning: &str,
        severity: AlertSeverity,
        now: DateTime<Utc>,
    ) -> Self {
        let direction = if opportunity.expected_price > opportunity.current_price {
            "up"
        } else {
            "down"
        };
        let message = format!(
            "News '{}' suggests price should move {} from {:.2} to {:.2} (discrepancy {:.2})",
            news.headline,
            direction,
            opportunity.current_price,
            opportunity.expected_price,
            opportunity.discrepancy,
        );

        Self {
            id: Uuid::new_v4(),
            severity,
            market_id: market.market_id.clone(),
            market_question: market.question.clone(),
            news_url: news.url.clone(),
            news_headline: news.headline.clone(),
            confidence: opportunity.confidence,
            discrepancy: opportunity.discrepancy,
            current_price: opportunity.current_price,
            expected_price: opportunity.expected_price,
            message,
            reasoning: reasoning.to_string(),
            created_at: now,
        }
    }

    /// Render the alert as a console block
    pub fn format_console(&self) -> String {
        format!(
            "[{}] {}\n\
             Market: {}\n\
             News: {}\n\
             Current: {:.4}  Expected: {:.4}  Discrepancy: {:.4}  Confidence: {:.2}\n\
             Reasoning: {}\n\
             News URL: {}\n\
             Alert ID: {}",
            self.severity,
            self.message,
            self.market_question,
            self.news_headline,
            self.current_price,
            self.expected_price,
            self.discrepancy,
            self.confidence,
            self.reasoning,
            self.news_url,
            self.id,
        )
    }
}
