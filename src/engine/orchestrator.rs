//! Cycle orchestration
//!
//! Drives the detection loop: FETCH_NEWS, FETCH_MARKETS, PAIR_AND_REASON,
//! DETECT, ALERT, SLEEP. News fetching and market refreshing run on their
//! own sub-intervals checked at the top of each cycle, so ordering stays
//! deterministic with no background timers. A shutdown signal is checked at
//! every stage boundary; an in-progress stage always completes.

use super::CycleSummary;
use crate::alert::AlertManager;
use crate::config::Config;
use crate::detector::{DiscrepancyDetector, Opportunity};
use crate::market::{MarketCache, MarketProvider, MarketSnapshot};
use crate::news::{NewsCache, NewsItem, NewsProvider};
use crate::reasoner::{AssessmentSource, ImpactAssessment, ImpactReasoner};
use crate::telemetry::{increment_counter, set_gauge, CounterMetric, GaugeMetric};
use chrono::{DateTime, Duration, Utc};
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;

/// Single-loop detection pipeline
///
/// Owns all cross-cycle state (the caches and the alert manager) as
/// injected-at-construction values; only one cycle is ever in flight.
pub struct CycleOrchestrator {
    config: Config,
    news_provider: Arc<dyn NewsProvider>,
    market_provider: Arc<dyn MarketProvider>,
    reasoner: ImpactReasoner,
    detector: DiscrepancyDetector,
    news_cache: NewsCache,
    market_cache: MarketCache,
    alerts: AlertManager,
    last_news_fetch: Option<DateTime<Utc>>,
    last_market_refresh: Option<DateTime<Utc>>,
    next_query: usize,
    cycles_completed: u64,
    last_summary: Option<CycleSummary>,
}

impl CycleOrchestrator {
    /// Create an orchestrator with fresh caches
    pub fn new(
        config: Config,
        news_provider: Arc<dyn NewsProvider>,
        market_provider: Arc<dyn MarketProvider>,
        reasoner: ImpactReasoner,
    ) -> Self {
        let news_cache = NewsCache::new(config.news.cache_ttl_secs, config.news.cache_capacity);
        let market_cache = MarketCache::new(
            config.markets.cache_ttl_secs,
            config.markets.price_tolerance,
        );
        let detector = DiscrepancyDetector::new(config.detector.clone());
        let alerts = AlertManager::new(config.alerts.clone());

        Self {
            config,
            news_provider,
            market_provider,
            reasoner,
            detector,
            news_cache,
            market_cache,
            alerts,
            last_news_fetch: None,
            last_market_refresh: None,
            next_query: 0,
            cycles_completed: 0,
            last_summary: None,
        }
    }

    /// Run detection cycles until the shutdown signal flips
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let interval = std::time::Duration::from_secs(self.config.engine.cycle_interval_secs);
        tracing::info!(
            interval_secs = interval.as_secs(),
            queries = self.config.news.queries.len(),
            "Detection loop starting"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let summary = self.run_cycle_inner(Utc::now(), Some(&shutdown)).await;
            tracing::info!(
                cycle = summary.cycle,
                news = summary.news_processed,
                markets = summary.markets_evaluated,
                opportunities = summary.opportunities,
                alerts = summary.alerts_emitted,
                errors = summary.errors.len(),
                "Cycle complete"
            );

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => break,
            }
        }

        tracing::info!(cycles = self.cycles_completed, "Detection loop stopped");
        Ok(())
    }

    /// Run a single detection cycle at the given instant
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> CycleSummary {
        self.run_cycle_inner(now, None).await
    }

    async fn run_cycle_inner(
        &mut self,
        now: DateTime<Utc>,
        shutdown: Option<&watch::Receiver<bool>>,
    ) -> CycleSummary {
        let stopped = |shutdown: Option<&watch::Receiver<bool>>| {
            shutdown.map(|rx| *rx.borrow()).unwrap_or(false)
        };
        let mut summary = CycleSummary::new(self.cycles_completed + 1, now);

        self.fetch_news(now, &mut summary).await;
        if stopped(shutdown) {
            return self.finish_cycle(summary, now);
        }

        self.fetch_markets(now, &mut summary).await;
        if stopped(shutdown) {
            return self.finish_cycle(summary, now);
        }

        let assessments = self.pair_and_reason(&mut summary).await;
        if stopped(shutdown) {
            return self.finish_cycle(summary, now);
        }

        let detected = self.detect(&assessments, now, &mut summary);
        if stopped(shutdown) {
            return self.finish_cycle(summary, now);
        }

        self.emit_alerts(&detected, now, &mut summary);
        self.finish_cycle(summary, now)
    }

    /// FETCH_NEWS: poll the news provider on its own interval
    async fn fetch_news(&mut self, now: DateTime<Utc>, summary: &mut CycleSummary) {
        let interval = Duration::seconds(self.config.news.fetch_interval_secs as i64);
        let due = self
            .last_news_fetch
            .map_or(true, |last| now - last >= interval);

        if due {
            let queries = &self.config.news.queries;
            let query = queries[self.next_query % queries.len()].clone();
            self.next_query += 1;

            match self
                .news_provider
                .search(&query, &self.config.news.freshness, self.config.news.max_results)
                .await
            {
                Ok(items) => {
                    self.last_news_fetch = Some(now);
                    for mut item in items {
                        item.fetched_at = now;
                        if self.news_cache.put(item) {
                            summary.news_fetched += 1;
                        }
                    }
                    tracing::debug!(query = %query, new = summary.news_fetched, "News fetch complete");
                }
                Err(e) => {
                    tracing::warn!(query = %query, error = %e, "News fetch failed, continuing with cached news");
                    summary.record_error(format!("news search failed: {e}"));
                }
            }
        }

        self.news_cache.evict_expired(now);
    }

    /// FETCH_MARKETS: full refresh on its own interval, otherwise refetch
    /// stale snapshots individually
    async fn fetch_markets(&mut self, now: DateTime<Utc>, summary: &mut CycleSummary) {
        let interval = Duration::seconds(self.config.markets.refresh_interval_secs as i64);
        let due = self
            .last_market_refresh
            .map_or(true, |last| now - last >= interval);

        if due {
            match self.market_provider.list_markets().await {
                Ok(snapshots) => {
                    self.last_market_refresh = Some(now);
                    for mut snapshot in snapshots {
                        snapshot.refreshed_at = now;
                        if let Err(e) = self.market_cache.upsert(snapshot) {
                            tracing::warn!(error = %e, "Rejected market snapshot");
                            summary.record_error(e.to_string());
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Market refresh failed, continuing with cached prices");
                    summary.record_error(format!("market refresh failed: {e}"));
                }
            }
            return;
        }

        for market_id in self.market_cache.stale_ids(now) {
            match self.market_provider.get_price(&market_id).await {
                Ok(price) => {
                    if let Err(e) = self.market_cache.refresh_price(&market_id, price, now) {
                        tracing::warn!(market_id = %market_id, error = %e, "Rejected price refresh");
                        summary.record_error(e.to_string());
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        market_id = %market_id,
                        error = %e,
                        "Price refetch failed, using stale snapshot"
                    );
                    summary.record_error(format!("price refetch failed for {market_id}: {e}"));
                }
            }
        }
    }

    /// PAIR_AND_REASON: assess every unconsumed news item against every
    /// active market
    ///
    /// Reasoning calls run concurrently under a bounded limit; `buffered`
    /// yields results in pair order, so downstream stages see a stable
    /// news-then-market ordering regardless of completion order.
    async fn pair_and_reason(&mut self, summary: &mut CycleSummary) -> Vec<ImpactAssessment> {
        let news: Vec<NewsItem> = self
            .news_cache
            .all_unconsumed()
            .into_iter()
            .take(self.config.engine.max_news_per_cycle)
            .collect();
        let markets: Vec<MarketSnapshot> = self
            .market_cache
            .snapshots()
            .take(self.config.engine.max_markets_per_cycle)
            .cloned()
            .collect();

        summary.news_processed = news.len();
        summary.markets_evaluated = markets.len();

        if news.is_empty() || markets.is_empty() {
            return Vec::new();
        }

        let mut pairs = Vec::with_capacity(news.len() * markets.len());
        for item in &news {
            for market in &markets {
                pairs.push((item, market));
            }
        }

        let reasoner = &self.reasoner;
        let assessments: Vec<ImpactAssessment> =
            stream::iter(pairs.into_iter().map(|(item, market)| reasoner.assess(item, market)))
                .buffered(self.config.engine.reasoning_concurrency)
                .collect()
                .await;

        for item in &news {
            self.news_cache.mark_consumed(&item.url);
        }

        summary.assessments = assessments.len();
        summary.fallback_assessments = assessments
            .iter()
            .filter(|a| a.source == AssessmentSource::Fallback)
            .count();

        assessments
    }

    /// DETECT: evaluate each assessment against the live market price
    fn detect(
        &self,
        assessments: &[ImpactAssessment],
        now: DateTime<Utc>,
        summary: &mut CycleSummary,
    ) -> Vec<(Opportunity, String)> {
        let mut detected = Vec::new();
        for assessment in assessments {
            let Some((market, stale)) = self.market_cache.get_or_stale(&assessment.market_id, now)
            else {
                continue;
            };
            if stale {
                tracing::debug!(market_id = %market.market_id, "Evaluating against stale price");
            }
            if let Some(opportunity) = self.detector.evaluate(assessment, market) {
                tracing::info!(
                    market_id = %opportunity.market_id,
                    current_price = %opportunity.current_price,
                    expected_price = %opportunity.expected_price,
                    discrepancy = %opportunity.discrepancy,
                    confidence = %opportunity.confidence,
                    "Opportunity detected"
                );
                detected.push((opportunity, assessment.reasoning.clone()));
            }
        }
        summary.opportunities = detected.len();
        detected
    }

    /// ALERT: hand opportunities to the alert manager in detection order
    fn emit_alerts(
        &mut self,
        detected: &[(Opportunity, String)],
        now: DateTime<Utc>,
        summary: &mut CycleSummary,
    ) {
        for (opportunity, reasoning) in detected {
            let Some(news) = self.news_cache.get(&opportunity.news_url) else {
                continue;
            };
            let Some((market, _)) = self.market_cache.get_or_stale(&opportunity.market_id, now)
            else {
                continue;
            };
            if let Some(alert) = self.alerts.process(opportunity, news, market, reasoning, now) {
                tracing::info!(severity = %alert.severity, message = %alert.message, "ALERT");
                summary.alerts_emitted += 1;
            }
        }
    }

    /// Record metrics and retain the summary
    fn finish_cycle(&mut self, mut summary: CycleSummary, now: DateTime<Utc>) -> CycleSummary {
        summary.finished_at = Some(Utc::now());
        self.cycles_completed += 1;

        increment_counter(CounterMetric::CyclesCompleted, 1);
        increment_counter(CounterMetric::NewsIngested, summary.news_fetched as u64);
        increment_counter(
            CounterMetric::FallbackAssessments,
            summary.fallback_assessments as u64,
        );
        increment_counter(CounterMetric::OpportunitiesFound, summary.opportunities as u64);
        increment_counter(CounterMetric::AlertsEmitted, summary.alerts_emitted as u64);
        increment_counter(CounterMetric::CycleErrors, summary.errors.len() as u64);
        set_gauge(GaugeMetric::NewsCacheSize, self.news_cache.len() as f64);
        set_gauge(GaugeMetric::MarketCacheSize, self.market_cache.len() as f64);
        set_gauge(GaugeMetric::AlertHistorySize, self.alerts.history_len() as f64);
        set_gauge(
            GaugeMetric::ActiveCooldowns,
            self.alerts.active_cooldowns(now) as f64,
        );

        self.last_summary = Some(summary.clone());
        summary
    }

    /// Read-only alert feed and statistics
    pub fn alert_manager(&self) -> &AlertManager {
        &self.alerts
    }

    /// Read-only news cache occupancy
    pub fn news_cache(&self) -> &NewsCache {
        &self.news_cache
    }

    /// Read-only market cache occupancy
    pub fn market_cache(&self) -> &MarketCache {
        &self.market_cache
    }

    /// The most recent cycle summary
    pub fn last_summary(&self) -> Option<&CycleSummary> {
        self.last_summary.as_ref()
    }

    /// Completed cycle count
    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoner::{FallbackReasoner, PriceDirection, RawAssessment, Reasoner};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockNewsProvider {
        items: Mutex<Vec<NewsItem>>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl MockNewsProvider {
        fn with_items(items: Vec<NewsItem>) -> Self {
            Self {
                items: Mutex::new(items),
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                items: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl NewsProvider for MockNewsProvider {
        async fn search(
            &self,
            _query: &str,
            _freshness: &str,
            _max_results: usize,
        ) -> anyhow::Result<Vec<NewsItem>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("rate limited");
            }
            Ok(self.items.lock().unwrap().clone())
        }
    }

    struct MockMarketProvider {
        snapshots: Mutex<Vec<MarketSnapshot>>,
        price: Mutex<Decimal>,
        list_calls: AtomicUsize,
        price_calls: AtomicUsize,
    }

    impl MockMarketProvider {
        fn with_markets(snapshots: Vec<MarketSnapshot>) -> Self {
            Self {
                snapshots: Mutex::new(snapshots),
                price: Mutex::new(dec!(0.50)),
                list_calls: AtomicUsize::new(0),
                price_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MarketProvider for MockMarketProvider {
        async fn list_markets(&self) -> anyhow::Result<Vec<MarketSnapshot>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.snapshots.lock().unwrap().clone())
        }

        async fn get_price(&self, _market_id: &str) -> anyhow::Result<Decimal> {
            self.price_calls.fetch_add(1, Ordering::SeqCst);
            Ok(*self.price.lock().unwrap())
        }
    }

    struct FixedReasoner(RawAssessment);

    #[async_trait]
    impl Reasoner for FixedReasoner {
        async fn assess(
            &self,
            _news: &NewsItem,
            _market: &MarketSnapshot,
        ) -> anyhow::Result<RawAssessment> {
            Ok(self.0.clone())
        }
    }

    fn news_item(url: &str) -> NewsItem {
        NewsItem::new(url, format!("headline {url}"), "summary")
    }

    fn market(id: &str, yes: Decimal) -> MarketSnapshot {
        MarketSnapshot {
            market_id: id.to_string(),
            question: format!("Question {id}?"),
            end_date: None,
            yes_price: yes,
            no_price: Decimal::ONE - yes,
            refreshed_at: Utc::now(),
        }
    }

    fn fixed_reasoner(direction: PriceDirection, magnitude: Decimal) -> ImpactReasoner {
        ImpactReasoner::new(
            Some(Arc::new(FixedReasoner(RawAssessment {
                relevance: dec!(0.9),
                direction,
                confidence: dec!(0.85),
                expected_magnitude: magnitude,
                reasoning: "mock reasoning".to_string(),
            }))),
            FallbackReasoner::default(),
            std::time::Duration::from_secs(5),
        )
    }

    fn test_config() -> Config {
        toml::from_str("").unwrap()
    }

    #[tokio::test]
    async fn test_empty_cycle_is_normal() {
        let news = Arc::new(MockNewsProvider::with_items(Vec::new()));
        let markets = Arc::new(MockMarketProvider::with_markets(Vec::new()));
        let mut orchestrator = CycleOrchestrator::new(
            test_config(),
            news,
            markets,
            fixed_reasoner(PriceDirection::Down, dec!(0.30)),
        );

        let summary = orchestrator.run_cycle(Utc::now()).await;
        assert_eq!(summary.news_processed, 0);
        assert_eq!(summary.markets_evaluated, 0);
        assert_eq!(summary.opportunities, 0);
        assert!(summary.errors.is_empty());
    }

    #[tokio::test]
    async fn test_detection_emits_alert() {
        let news = Arc::new(MockNewsProvider::with_items(vec![news_item(
            "https://n.example.com/rates",
        )]));
        let markets = Arc::new(MockMarketProvider::with_markets(vec![market(
            "m1",
            dec!(0.60),
        )]));
        let mut orchestrator = CycleOrchestrator::new(
            test_config(),
            news,
            markets,
            fixed_reasoner(PriceDirection::Down, dec!(0.30)),
        );

        let summary = orchestrator.run_cycle(Utc::now()).await;
        assert_eq!(summary.assessments, 1);
        assert_eq!(summary.opportunities, 1);
        assert_eq!(summary.alerts_emitted, 1);
        assert_eq!(orchestrator.alert_manager().history_len(), 1);
    }

    #[tokio::test]
    async fn test_news_fetch_respects_interval() {
        let news = Arc::new(MockNewsProvider::with_items(Vec::new()));
        let markets = Arc::new(MockMarketProvider::with_markets(Vec::new()));
        let mut orchestrator = CycleOrchestrator::new(
            test_config(),
            Arc::clone(&news) as Arc<dyn NewsProvider>,
            markets,
            fixed_reasoner(PriceDirection::Neutral, dec!(0.0)),
        );

        let now = Utc::now();
        orchestrator.run_cycle(now).await;
        orchestrator.run_cycle(now + Duration::seconds(30)).await;
        assert_eq!(news.calls.load(Ordering::SeqCst), 1);

        orchestrator.run_cycle(now + Duration::seconds(61)).await;
        assert_eq!(news.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_news_consumed_after_pairing() {
        let news = Arc::new(MockNewsProvider::with_items(vec![news_item(
            "https://n.example.com/a",
        )]));
        let markets = Arc::new(MockMarketProvider::with_markets(vec![market(
            "m1",
            dec!(0.60),
        )]));
        let mut orchestrator = CycleOrchestrator::new(
            test_config(),
            news,
            markets,
            fixed_reasoner(PriceDirection::Down, dec!(0.30)),
        );

        let now = Utc::now();
        let first = orchestrator.run_cycle(now).await;
        assert_eq!(first.news_processed, 1);

        // Same article is still cached but consumed; nothing to pair.
        let second = orchestrator.run_cycle(now + Duration::seconds(10)).await;
        assert_eq!(second.news_processed, 0);
        assert_eq!(second.assessments, 0);
    }

    #[tokio::test]
    async fn test_news_failure_degrades_gracefully() {
        let news = Arc::new(MockNewsProvider::failing());
        let markets = Arc::new(MockMarketProvider::with_markets(vec![market(
            "m1",
            dec!(0.60),
        )]));
        let mut orchestrator = CycleOrchestrator::new(
            test_config(),
            news,
            markets,
            fixed_reasoner(PriceDirection::Down, dec!(0.30)),
        );

        let summary = orchestrator.run_cycle(Utc::now()).await;
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.markets_evaluated, 1);
        assert_eq!(summary.alerts_emitted, 0);
    }

    #[tokio::test]
    async fn test_stale_markets_refetched_between_refreshes() {
        let mut config = test_config();
        config.markets.cache_ttl_secs = 60;
        config.markets.refresh_interval_secs = 600;

        let news = Arc::new(MockNewsProvider::with_items(Vec::new()));
        let markets = Arc::new(MockMarketProvider::with_markets(vec![market(
            "m1",
            dec!(0.50),
        )]));
        let mut orchestrator = CycleOrchestrator::new(
            config,
            news,
            Arc::clone(&markets) as Arc<dyn MarketProvider>,
            fixed_reasoner(PriceDirection::Neutral, dec!(0.0)),
        );

        let now = Utc::now();
        orchestrator.run_cycle(now).await;
        assert_eq!(markets.list_calls.load(Ordering::SeqCst), 1);

        *markets.price.lock().unwrap() = dec!(0.70);
        orchestrator.run_cycle(now + Duration::seconds(120)).await;
        assert_eq!(markets.list_calls.load(Ordering::SeqCst), 1);
        assert_eq!(markets.price_calls.load(Ordering::SeqCst), 1);

        let (snapshot, stale) = orchestrator
            .market_cache()
            .get_or_stale("m1", now + Duration::seconds(120))
            .unwrap();
        assert_eq!(snapshot.yes_price, dec!(0.70));
        assert!(!stale);
    }

    #[tokio::test]
    async fn test_shutdown_stops_after_current_stage() {
        let news = Arc::new(MockNewsProvider::with_items(vec![news_item(
            "https://n.example.com/a",
        )]));
        let markets = Arc::new(MockMarketProvider::with_markets(vec![market(
            "m1",
            dec!(0.60),
        )]));
        let mut orchestrator = CycleOrchestrator::new(
            test_config(),
            news,
            markets,
            fixed_reasoner(PriceDirection::Down, dec!(0.30)),
        );

        let (tx, rx) = watch::channel(true);
        let summary = orchestrator.run_cycle_inner(Utc::now(), Some(&rx)).await;
        drop(tx);

        // First stage ran, nothing was paired or alerted.
        assert_eq!(summary.news_fetched, 1);
        assert_eq!(summary.assessments, 0);
        assert_eq!(summary.alerts_emitted, 0);
    }
}
