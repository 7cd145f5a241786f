//! TTL-bounded market snapshot cache

use super::{MarketDataError, MarketSnapshot};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// In-memory market store keyed by market id
///
/// Snapshots are validated on ingestion; a rejected upsert keeps whatever
/// was cached before. Entries are never deleted, only flagged stale once
/// their age exceeds the TTL so callers can decide to refetch.
pub struct MarketCache {
    entries: BTreeMap<String, MarketSnapshot>,
    ttl: Duration,
    tolerance: Decimal,
}

impl MarketCache {
    /// Create a cache with the given TTL and price-sum tolerance
    pub fn new(ttl_secs: u64, tolerance: Decimal) -> Self {
        Self {
            entries: BTreeMap::new(),
            ttl: Duration::seconds(ttl_secs as i64),
            tolerance,
        }
    }

    /// Validate and store a snapshot
    ///
    /// Rejects prices outside [0, 1] and price sums further than the
    /// tolerance from 1.0. On rejection the previous snapshot is retained.
    pub fn upsert(&mut self, snapshot: MarketSnapshot) -> Result<(), MarketDataError> {
        self.validate(&snapshot.market_id, snapshot.yes_price, snapshot.no_price)?;
        self.entries.insert(snapshot.market_id.clone(), snapshot);
        Ok(())
    }

    /// Update a cached market's prices from a fresh yes-price
    pub fn refresh_price(
        &mut self,
        market_id: &str,
        yes_price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), MarketDataError> {
        let no_price = Decimal::ONE - yes_price;
        self.validate(market_id, yes_price, no_price)?;
        let entry = self
            .entries
            .get_mut(market_id)
            .ok_or_else(|| MarketDataError::UnknownMarket(market_id.to_string()))?;
        entry.yes_price = yes_price;
        entry.no_price = no_price;
        entry.refreshed_at = now;
        Ok(())
    }

    /// Get a cached snapshot and whether its age exceeds the TTL
    pub fn get_or_stale(
        &self,
        market_id: &str,
        now: DateTime<Utc>,
    ) -> Option<(&MarketSnapshot, bool)> {
        self.entries
            .get(market_id)
            .map(|snapshot| (snapshot, now - snapshot.refreshed_at > self.ttl))
    }

    /// Ids of cached markets whose snapshots have gone stale
    pub fn stale_ids(&self, now: DateTime<Utc>) -> Vec<String> {
        self.entries
            .values()
            .filter(|s| now - s.refreshed_at > self.ttl)
            .map(|s| s.market_id.clone())
            .collect()
    }

    /// All cached snapshots in stable id order
    pub fn snapshots(&self) -> impl Iterator<Item = &MarketSnapshot> {
        self.entries.values()
    }

    /// Number of cached markets
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn validate(
        &self,
        market_id: &str,
        yes: Decimal,
        no: Decimal,
    ) -> Result<(), MarketDataError> {
        let in_range = |p: Decimal| p >= Decimal::ZERO && p <= Decimal::ONE;
        let sum_ok = (yes + no - Decimal::ONE).abs() <= self.tolerance;
        if !in_range(yes) || !in_range(no) || !sum_ok {
            return Err(MarketDataError::InvalidPriceData {
                market_id: market_id.to_string(),
                yes,
                no,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot(id: &str, yes: Decimal, no: Decimal, refreshed_at: DateTime<Utc>) -> MarketSnapshot {
        MarketSnapshot {
            market_id: id.to_string(),
            question: format!("Question for {id}?"),
            end_date: None,
            yes_price: yes,
            no_price: no,
            refreshed_at,
        }
    }

    #[test]
    fn test_upsert_valid() {
        let mut cache = MarketCache::new(300, dec!(0.05));
        let now = Utc::now();
        cache.upsert(snapshot("m1", dec!(0.60), dec!(0.40), now)).unwrap();
        let (cached, stale) = cache.get_or_stale("m1", now).unwrap();
        assert_eq!(cached.yes_price, dec!(0.60));
        assert!(!stale);
    }

    #[test]
    fn test_upsert_rejects_out_of_range() {
        let mut cache = MarketCache::new(300, dec!(0.05));
        let now = Utc::now();
        let result = cache.upsert(snapshot("m1", dec!(1.20), dec!(-0.20), now));
        assert!(matches!(result, Err(MarketDataError::InvalidPriceData { .. })));
        assert!(cache.get_or_stale("m1", now).is_none());
    }

    #[test]
    fn test_upsert_rejects_sum_outside_tolerance() {
        let mut cache = MarketCache::new(300, dec!(0.05));
        let now = Utc::now();
        // 0.70 + 0.20 = 0.90, off by 0.10 > 0.05
        let result = cache.upsert(snapshot("m1", dec!(0.70), dec!(0.20), now));
        assert!(result.is_err());
    }

    #[test]
    fn test_rejection_retains_previous_snapshot() {
        let mut cache = MarketCache::new(300, dec!(0.05));
        let now = Utc::now();
        cache.upsert(snapshot("m1", dec!(0.55), dec!(0.45), now)).unwrap();
        let bad = cache.upsert(snapshot("m1", dec!(0.90), dec!(0.30), now));
        assert!(bad.is_err());
        let (cached, _) = cache.get_or_stale("m1", now).unwrap();
        assert_eq!(cached.yes_price, dec!(0.55));
    }

    #[test]
    fn test_staleness_after_ttl() {
        let mut cache = MarketCache::new(300, dec!(0.05));
        let now = Utc::now();
        cache.upsert(snapshot("m1", dec!(0.50), dec!(0.50), now)).unwrap();

        let (_, stale) = cache.get_or_stale("m1", now + Duration::seconds(299)).unwrap();
        assert!(!stale);
        let (_, stale) = cache.get_or_stale("m1", now + Duration::seconds(301)).unwrap();
        assert!(stale);
        assert_eq!(cache.stale_ids(now + Duration::seconds(301)), vec!["m1"]);
    }

    #[test]
    fn test_refresh_price() {
        let mut cache = MarketCache::new(300, dec!(0.05));
        let now = Utc::now();
        cache.upsert(snapshot("m1", dec!(0.50), dec!(0.50), now)).unwrap();

        let later = now + Duration::seconds(400);
        cache.refresh_price("m1", dec!(0.65), later).unwrap();
        let (cached, stale) = cache.get_or_stale("m1", later).unwrap();
        assert_eq!(cached.yes_price, dec!(0.65));
        assert_eq!(cached.no_price, dec!(0.35));
        assert!(!stale);
    }

    #[test]
    fn test_refresh_price_unknown_market() {
        let mut cache = MarketCache::new(300, dec!(0.05));
        let result = cache.refresh_price("missing", dec!(0.50), Utc::now());
        assert!(matches!(result, Err(MarketDataError::UnknownMarket(_))));
    }

    #[test]
    fn test_snapshots_stable_order() {
        let mut cache = MarketCache::new(300, dec!(0.05));
        let now = Utc::now();
        cache.upsert(snapshot("m2", dec!(0.50), dec!(0.50), now)).unwrap();
        cache.upsert(snapshot("m1", dec!(0.50), dec!(0.50), now)).unwrap();
        let ids: Vec<&str> = cache.snapshots().map(|s| s.market_id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
    }
}
