//! Alert lifecycle management

use super::{Alert, AlertSeverity};
use crate::config::AlertsConfig;
use crate::detector::Opportunity;
use crate::market::MarketSnapshot;
use crate::news::NewsItem;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};

/// Aggregate statistics over the retained alert history
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertStats {
    pub total: usize,
    pub info: usize,
    pub warning: usize,
    pub critical: usize,
    pub avg_confidence: Decimal,
}

/// Turns opportunities into cooldown-gated, severity-classified alerts
///
/// Holds the only cross-cycle alerting state: a bounded insertion-ordered
/// history and a per-market cooldown table. Both are mutated exclusively by
/// the orchestrator's single active cycle.
pub struct AlertManager {
    config: AlertsConfig,
    history: VecDeque<Alert>,
    cooldowns: HashMap<String, DateTime<Utc>>,
}

impl AlertManager {
    /// Create a manager with the given configuration
    pub fn new(config: AlertsConfig) -> Self {
        Self {
            config,
            history: VecDeque::new(),
            cooldowns: HashMap::new(),
        }
    }

    /// Create a manager with default configuration
    pub fn with_defaults() -> Self {
        Self::new(AlertsConfig::default())
    }

    /// Process one opportunity, returning the alert if one was emitted
    ///
    /// Suppresses markets still inside their cooldown window; the cooldown
    /// entry is only updated when an alert actually fires.
    pub fn process(
        &mut self,
        opportunity: &Opportunity,
        news: &NewsItem,
        market: &MarketSnapshot,
        reasoning: &str,
        now: DateTime<Utc>,
    ) -> Option<Alert> {
        let cooldown = Duration::seconds(self.config.cooldown_secs as i64);
        if let Some(last) = self.cooldowns.get(&opportunity.market_id) {
            if now - *last < cooldown {
                tracing::debug!(
                    market_id = %opportunity.market_id,
                    "Alert suppressed by cooldown"
                );
                return None;
            }
        }

        let severity = self.classify(opportunity.confidence, opportunity.discrepancy);
        let alert = Alert::from_opportunity(opportunity, news, market, reasoning, severity, now);

        self.history.push_back(alert.clone());
        while self.history.len() > self.config.history_capacity {
            self.history.pop_front();
        }
        self.cooldowns.insert(opportunity.market_id.clone(), now);

        tracing::info!(
            alert_id = %alert.id,
            severity = %alert.severity,
            market_id = %alert.market_id,
            confidence = %alert.confidence,
            discrepancy = %alert.discrepancy,
            "Alert created"
        );

        Some(alert)
    }

    /// Classify severity; first match wins
    ///
    /// INFO is only reachable when the detector's gates are configured
    /// below the WARNING bars; with defaults every opportunity clears at
    /// least WARNING.
    pub fn classify(&self, confidence: Decimal, discrepancy: Decimal) -> AlertSeverity {
        if confidence >= self.config.critical_confidence
            && discrepancy >= self.config.critical_margin
        {
            AlertSeverity::Critical
        } else if confidence >= self.config.warning_confidence
            && discrepancy >= self.config.warning_margin
        {
            AlertSeverity::Warning
        } else {
            AlertSeverity::Info
        }
    }

    /// Recent alerts, most recent first
    pub fn recent(&self, limit: usize) -> Vec<&Alert> {
        self.history.iter().rev().take(limit).collect()
    }

    /// Number of retained alerts
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Markets currently inside their cooldown window
    pub fn active_cooldowns(&self, now: DateTime<Utc>) -> usize {
        let cooldown = Duration::seconds(self.config.cooldown_secs as i64);
        self.cooldowns
            .values()
            .filter(|last| now - **last < cooldown)
            .count()
    }

    /// Statistics over the retained history
    pub fn stats(&self) -> AlertStats {
        let mut stats = AlertStats {
            total: self.history.len(),
            ..AlertStats::default()
        };
        if self.history.is_empty() {
            return stats;
        }

        let mut confidence_sum = Decimal::ZERO;
        for alert in &self.history {
            match alert.severity {
                AlertSeverity::Info => stats.info += 1,
                AlertSeverity::Warning => stats.warning += 1,
                AlertSeverity::Critical => stats.critical += 1,
            }
            confidence_sum += alert.confidence;
        }
        stats.avg_confidence = confidence_sum / Decimal::from(self.history.len());
        stats
    }
}
