//! Discrepancy detection

use super::{Opportunity, RecommendedAction};
use crate::config::DetectorConfig;
use crate::market::MarketSnapshot;
use crate::reasoner::ImpactAssessment;

/// Detects opportunities from impact assessments
///
/// An opportunity requires confidence AND discrepancy to clear their
/// thresholds; a highly confident but small-magnitude prediction produces
/// nothing, and vice versa. Pairs below the relevance floor are skipped
/// before either gate is evaluated.
pub struct DiscrepancyDetector {
    config: DetectorConfig,
}

impl DiscrepancyDetector {
    /// Create a detector with the given thresholds
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Create a detector with default thresholds
    pub fn with_defaults() -> Self {
        Self::new(DetectorConfig::default())
    }

    /// Evaluate one assessment against the market's current price
    pub fn evaluate(
        &self,
        assessment: &ImpactAssessment,
        market: &MarketSnapshot,
    ) -> Option<Opportunity> {
        if assessment.relevance < self.config.relevance_floor {
            tracing::debug!(
                market_id = %assessment.market_id,
                relevance = %assessment.relevance,
                "Skipping low-relevance pair"
            );
            return None;
        }

        let current_price = market.yes_price;
        let discrepancy = (assessment.expected_price - current_price).abs();
        let meets_confidence = assessment.confidence >= self.config.confidence_threshold;
        let meets_margin = discrepancy >= self.config.min_margin;

        if !(meets_confidence && meets_margin) {
            tracing::debug!(
                market_id = %assessment.market_id,
                confidence = %assessment.confidence,
                discrepancy = %discrepancy,
                "Below detection thresholds"
            );
            return None;
        }

        Some(Opportunity {
            market_id: assessment.market_id.clone(),
            news_url: assessment.news_url.clone(),
            current_price,
            expected_price: assessment.expected_price,
            discrepancy,
            confidence: assessment.confidence,
            meets_confidence,
            meets_margin,
            action: RecommendedAction::Watch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoner::{AssessmentSource, PriceDirection};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn market(yes: Decimal) -> MarketSnapshot {
        MarketSnapshot {
            market_id: "m1".to_string(),
            question: "Will it happen?".to_string(),
            end_date: None,
            yes_price: yes,
            no_price: Decimal::ONE - yes,
            refreshed_at: Utc::now(),
        }
    }

    fn assessment(
        relevance: Decimal,
        confidence: Decimal,
        expected_price: Decimal,
    ) -> ImpactAssessment {
        ImpactAssessment {
            news_url: "https://n.example.com/a".to_string(),
            market_id: "m1".to_string(),
            relevance,
            direction: PriceDirection::Down,
            confidence,
            expected_magnitude: dec!(0.1),
            expected_price,
            reasoning: "test".to_string(),
            source: AssessmentSource::Primary,
        }
    }

    #[test]
    fn test_emits_when_both_gates_pass() {
        let detector = DiscrepancyDetector::with_defaults();
        let opp = detector
            .evaluate(&assessment(dec!(0.9), dec!(0.75), dec!(0.52)), &market(dec!(0.60)))
            .unwrap();
        assert_eq!(opp.discrepancy, dec!(0.08));
        assert!(opp.meets_confidence);
        assert!(opp.meets_margin);
        assert_eq!(opp.action, RecommendedAction::Watch);
    }

    #[test]
    fn test_confident_but_small_margin_is_rejected() {
        let detector = DiscrepancyDetector::with_defaults();
        // confidence 0.75 passes, discrepancy 0.03 < 0.05 fails
        let opp = detector.evaluate(
            &assessment(dec!(0.9), dec!(0.75), dec!(0.57)),
            &market(dec!(0.60)),
        );
        assert!(opp.is_none());
    }

    #[test]
    fn test_large_margin_but_low_confidence_is_rejected() {
        let detector = DiscrepancyDetector::with_defaults();
        // discrepancy 0.20 passes, confidence 0.65 < 0.7 fails
        let opp = detector.evaluate(
            &assessment(dec!(0.9), dec!(0.65), dec!(0.40)),
            &market(dec!(0.60)),
        );
        assert!(opp.is_none());
    }

    #[test]
    fn test_below_relevance_floor_is_skipped() {
        let detector = DiscrepancyDetector::with_defaults();
        // would pass both gates, but relevance 0.4 < 0.5
        let opp = detector.evaluate(
            &assessment(dec!(0.4), dec!(0.9), dec!(0.30)),
            &market(dec!(0.60)),
        );
        assert!(opp.is_none());
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        let detector = DiscrepancyDetector::with_defaults();
        // exactly at both defaults: confidence 0.7, discrepancy 0.05
        let opp = detector.evaluate(
            &assessment(dec!(0.5), dec!(0.70), dec!(0.55)),
            &market(dec!(0.60)),
        );
        assert!(opp.is_some());
    }

    #[test]
    fn test_relaxed_thresholds_admit_weak_opportunity() {
        let detector = DiscrepancyDetector::new(DetectorConfig {
            relevance_floor: dec!(0.1),
            confidence_threshold: dec!(0.3),
            min_margin: dec!(0.01),
        });
        let opp = detector.evaluate(
            &assessment(dec!(0.2), dec!(0.4), dec!(0.58)),
            &market(dec!(0.60)),
        );
        assert!(opp.is_some());
    }
}
