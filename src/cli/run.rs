//! Run command implementation

use crate::config::Config;
use crate::engine::CycleOrchestrator;
use crate::market::{GammaClient, GammaConfig, MarketProvider};
use crate::news::{BraveConfig, BraveNewsClient, NewsProvider};
use crate::reasoner::{FallbackReasoner, GeminiConfig, GeminiReasoner, ImpactReasoner, Reasoner};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Args, Debug)]
pub struct RunArgs {}

impl RunArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let mut orchestrator = build_orchestrator(config)?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
        });

        orchestrator.run(shutdown_rx).await
    }
}

/// Wire providers and the reasoner from configuration
pub fn build_orchestrator(config: Config) -> anyhow::Result<CycleOrchestrator> {
    let news_api_key = config
        .news
        .api_key
        .clone()
        .or_else(|| std::env::var("BRAVE_API_KEY").ok());
    if news_api_key.is_none() {
        tracing::warn!("No Brave API key configured; news fetches will fail until one is set");
    }
    let news_provider: Arc<dyn NewsProvider> = Arc::new(BraveNewsClient::with_config(BraveConfig {
        api_key: news_api_key,
        ..BraveConfig::default()
    })?);

    let market_provider: Arc<dyn MarketProvider> = Arc::new(GammaClient::with_config(GammaConfig {
        base_url: config.markets.gamma_base_url.clone(),
        timeout: Duration::from_secs(config.markets.request_timeout_secs),
        ..GammaConfig::default()
    })?);

    let reasoner_timeout = Duration::from_secs(config.reasoner.timeout_secs);
    let gemini_api_key = config
        .reasoner
        .api_key
        .clone()
        .or_else(|| std::env::var("GEMINI_API_KEY").ok());
    let primary: Option<Arc<dyn Reasoner>> = match gemini_api_key {
        Some(api_key) => Some(Arc::new(GeminiReasoner::with_config(GeminiConfig {
            base_url: config.reasoner.base_url.clone(),
            model: config.reasoner.model.clone(),
            api_key,
            timeout: reasoner_timeout,
        })?)),
        None => {
            tracing::warn!("No Gemini API key configured; using fallback reasoning only");
            None
        }
    };
    let reasoner = ImpactReasoner::new(
        primary,
        FallbackReasoner::new(config.reasoner.fallback_strong_overlap),
        reasoner_timeout,
    );

    Ok(CycleOrchestrator::new(
        config,
        news_provider,
        market_provider,
        reasoner,
    ))
}
