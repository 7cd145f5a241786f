//! Prometheus metrics

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Completed detection cycles
    CyclesCompleted,
    /// New articles ingested into the news cache
    NewsIngested,
    /// Assessments served by the fallback heuristic
    FallbackAssessments,
    /// Opportunities that cleared the detector gates
    OpportunitiesFound,
    /// Alerts emitted past cooldown
    AlertsEmitted,
    /// Recoverable errors absorbed during a cycle
    CycleErrors,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Cached news items
    NewsCacheSize,
    /// Cached market snapshots
    MarketCacheSize,
    /// Alerts retained in history
    AlertHistorySize,
    /// Markets currently inside their cooldown window
    ActiveCooldowns,
}

impl CounterMetric {
    fn name(self) -> &'static str {
        match self {
            CounterMetric::CyclesCompleted => "sentinel_cycles_total",
            CounterMetric::NewsIngested => "sentinel_news_ingested_total",
            CounterMetric::FallbackAssessments => "sentinel_fallback_assessments_total",
            CounterMetric::OpportunitiesFound => "sentinel_opportunities_total",
            CounterMetric::AlertsEmitted => "sentinel_alerts_total",
            CounterMetric::CycleErrors => "sentinel_cycle_errors_total",
        }
    }
}

impl GaugeMetric {
    fn name(self) -> &'static str {
        match self {
            GaugeMetric::NewsCacheSize => "sentinel_news_cache_size",
            GaugeMetric::MarketCacheSize => "sentinel_market_cache_size",
            GaugeMetric::AlertHistorySize => "sentinel_alert_history_size",
            GaugeMetric::ActiveCooldowns => "sentinel_active_cooldowns",
        }
    }
}

/// Increment a counter
pub fn increment_counter(metric: CounterMetric, value: u64) {
    metrics::counter!(metric.name()).increment(value);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    metrics::gauge!(metric.name()).set(value);
}
