//! Configuration types for poly-sentinel

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use thiserror::Error;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub markets: MarketsConfig,
    #[serde(default)]
    pub reasoner: ReasonerConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// News polling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NewsConfig {
    /// Search queries rotated round-robin across cycles
    #[serde(default = "default_queries")]
    pub queries: Vec<String>,

    /// Seconds between news provider fetches
    #[serde(default = "default_news_interval")]
    pub fetch_interval_secs: u64,

    /// Maximum articles requested per search
    #[serde(default = "default_news_max_results")]
    pub max_results: usize,

    /// Provider freshness window: "pd" (day), "pw" (week), "pm" (month)
    #[serde(default = "default_freshness")]
    pub freshness: String,

    /// Seconds a cached article stays eligible for pairing
    #[serde(default = "default_news_ttl")]
    pub cache_ttl_secs: u64,

    /// Maximum cached articles before oldest-first eviction
    #[serde(default = "default_news_capacity")]
    pub cache_capacity: usize,

    /// Brave Search API key (falls back to BRAVE_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Market data configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MarketsConfig {
    /// Gamma API base URL
    #[serde(default = "default_gamma_url")]
    pub gamma_base_url: String,

    /// Seconds between full market list refreshes
    #[serde(default = "default_market_refresh")]
    pub refresh_interval_secs: u64,

    /// Seconds before a cached snapshot counts as stale
    #[serde(default = "default_market_ttl")]
    pub cache_ttl_secs: u64,

    /// Allowed deviation of yes + no from 1.0
    #[serde(default = "default_price_tolerance")]
    pub price_tolerance: Decimal,

    /// HTTP request timeout in seconds
    #[serde(default = "default_market_timeout")]
    pub request_timeout_secs: u64,
}

/// Impact reasoning configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ReasonerConfig {
    /// Gemini API key (falls back to GEMINI_API_KEY); unset means fallback-only
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier for the primary reasoner
    #[serde(default = "default_reasoner_model")]
    pub model: String,

    /// Base URL for the generative language API
    #[serde(default = "default_reasoner_url")]
    pub base_url: String,

    /// Seconds before a primary reasoning call is abandoned
    #[serde(default = "default_reasoner_timeout")]
    pub timeout_secs: u64,

    /// Token overlap ratio above which the fallback infers a direction
    #[serde(default = "default_strong_overlap")]
    pub fallback_strong_overlap: Decimal,
}

/// Discrepancy detection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    /// Assessments below this relevance are not evaluated
    #[serde(default = "default_relevance_floor")]
    pub relevance_floor: Decimal,

    /// Minimum confidence for an opportunity
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: Decimal,

    /// Minimum expected-vs-current price discrepancy
    #[serde(default = "default_min_margin")]
    pub min_margin: Decimal,
}

/// Alerting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AlertsConfig {
    /// Seconds to suppress repeat alerts for the same market
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,

    /// Alerts retained in memory before oldest-first eviction
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Confidence bar for CRITICAL severity
    #[serde(default = "default_critical_confidence")]
    pub critical_confidence: Decimal,

    /// Discrepancy bar for CRITICAL severity
    #[serde(default = "default_critical_margin")]
    pub critical_margin: Decimal,

    /// Confidence bar for WARNING severity
    #[serde(default = "default_warning_confidence")]
    pub warning_confidence: Decimal,

    /// Discrepancy bar for WARNING severity
    #[serde(default = "default_warning_margin")]
    pub warning_margin: Decimal,
}

/// Cycle orchestration configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Seconds between detection cycles
    #[serde(default = "default_cycle_interval")]
    pub cycle_interval_secs: u64,

    /// Maximum news items entering the pairing stage per cycle
    #[serde(default = "default_max_news")]
    pub max_news_per_cycle: usize,

    /// Maximum markets entering the pairing stage per cycle
    #[serde(default = "default_max_markets")]
    pub max_markets_per_cycle: usize,

    /// Concurrent reasoning calls in flight within one cycle
    #[serde(default = "default_concurrency")]
    pub reasoning_concurrency: usize,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Expose Prometheus metrics over HTTP
    #[serde(default)]
    pub metrics_enabled: bool,
}

fn default_queries() -> Vec<String> {
    vec!["breaking news politics".to_string()]
}
fn default_news_interval() -> u64 {
    60
}
fn default_news_max_results() -> usize {
    10
}
fn default_freshness() -> String {
    "pd".to_string()
}
fn default_news_ttl() -> u64 {
    86_400
}
fn default_news_capacity() -> usize {
    500
}
fn default_gamma_url() -> String {
    "https://gamma-api.polymarket.com".to_string()
}
fn default_market_refresh() -> u64 {
    300
}
fn default_market_ttl() -> u64 {
    300
}
fn default_price_tolerance() -> Decimal {
    dec!(0.05)
}
fn default_market_timeout() -> u64 {
    10
}
fn default_reasoner_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_reasoner_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_reasoner_timeout() -> u64 {
    30
}
fn default_strong_overlap() -> Decimal {
    dec!(0.3)
}
fn default_relevance_floor() -> Decimal {
    dec!(0.5)
}
fn default_confidence_threshold() -> Decimal {
    dec!(0.7)
}
fn default_min_margin() -> Decimal {
    dec!(0.05)
}
fn default_cooldown() -> u64 {
    300
}
fn default_history_capacity() -> usize {
    100
}
fn default_critical_confidence() -> Decimal {
    dec!(0.8)
}
fn default_critical_margin() -> Decimal {
    dec!(0.10)
}
fn default_warning_confidence() -> Decimal {
    dec!(0.7)
}
fn default_warning_margin() -> Decimal {
    dec!(0.05)
}
fn default_cycle_interval() -> u64 {
    60
}
fn default_max_news() -> usize {
    5
}
fn default_max_markets() -> usize {
    10
}
fn default_concurrency() -> usize {
    10
}
fn default_metrics_port() -> u16 {
    9090
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            queries: default_queries(),
            fetch_interval_secs: default_news_interval(),
            max_results: default_news_max_results(),
            freshness: default_freshness(),
            cache_ttl_secs: default_news_ttl(),
            cache_capacity: default_news_capacity(),
            api_key: None,
        }
    }
}

impl Default for MarketsConfig {
    fn default() -> Self {
        Self {
            gamma_base_url: default_gamma_url(),
            refresh_interval_secs: default_market_refresh(),
            cache_ttl_secs: default_market_ttl(),
            price_tolerance: default_price_tolerance(),
            request_timeout_secs: default_market_timeout(),
        }
    }
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_reasoner_model(),
            base_url: default_reasoner_url(),
            timeout_secs: default_reasoner_timeout(),
            fallback_strong_overlap: default_strong_overlap(),
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            relevance_floor: default_relevance_floor(),
            confidence_threshold: default_confidence_threshold(),
            min_margin: default_min_margin(),
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown(),
            history_capacity: default_history_capacity(),
            critical_confidence: default_critical_confidence(),
            critical_margin: default_critical_margin(),
            warning_confidence: default_warning_confidence(),
            warning_margin: default_warning_margin(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: default_cycle_interval(),
            max_news_per_cycle: default_max_news(),
            max_markets_per_cycle: default_max_markets(),
            reasoning_concurrency: default_concurrency(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_port: default_metrics_port(),
            log_level: default_log_level(),
            metrics_enabled: false,
        }
    }
}

/// Configuration errors fatal at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A threshold left the unit interval
    #[error("{field} must be within [0, 1], got {value}")]
    ThresholdOutOfRange { field: &'static str, value: Decimal },
    /// A capacity or limit was set to zero
    #[error("{field} must be greater than zero")]
    ZeroLimit { field: &'static str },
    /// No search queries configured
    #[error("news.queries must not be empty")]
    NoQueries,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Reject fatal configuration before the first cycle runs
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit_fields = [
            ("markets.price_tolerance", self.markets.price_tolerance),
            (
                "reasoner.fallback_strong_overlap",
                self.reasoner.fallback_strong_overlap,
            ),
            ("detector.relevance_floor", self.detector.relevance_floor),
            (
                "detector.confidence_threshold",
                self.detector.confidence_threshold,
            ),
            ("detector.min_margin", self.detector.min_margin),
            (
                "alerts.critical_confidence",
                self.alerts.critical_confidence,
            ),
            ("alerts.critical_margin", self.alerts.critical_margin),
            ("alerts.warning_confidence", self.alerts.warning_confidence),
            ("alerts.warning_margin", self.alerts.warning_margin),
        ];
        for (field, value) in unit_fields {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(ConfigError::ThresholdOutOfRange { field, value });
            }
        }

        let nonzero_fields = [
            ("news.cache_capacity", self.news.cache_capacity),
            ("news.max_results", self.news.max_results),
            ("alerts.history_capacity", self.alerts.history_capacity),
            ("engine.max_news_per_cycle", self.engine.max_news_per_cycle),
            (
                "engine.max_markets_per_cycle",
                self.engine.max_markets_per_cycle,
            ),
            (
                "engine.reasoning_concurrency",
                self.engine.reasoning_concurrency,
            ),
        ];
        for (field, value) in nonzero_fields {
            if value == 0 {
                return Err(ConfigError::ZeroLimit { field });
            }
        }

        if self.news.queries.is_empty() {
            return Err(ConfigError::NoQueries);
        }

        Ok(())
    }
}
