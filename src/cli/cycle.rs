//! Cycle command implementation

use super::run::build_orchestrator;
use crate::config::Config;
use chrono::Utc;
use clap::Args;

#[derive(Args, Debug)]
pub struct CycleArgs {
    /// Override the configured search queries for this cycle
    #[arg(short, long)]
    pub query: Option<String>,
}

impl CycleArgs {
    pub async fn execute(&self, mut config: Config) -> anyhow::Result<()> {
        if let Some(query) = &self.query {
            config.news.queries = vec![query.clone()];
        }

        let mut orchestrator = build_orchestrator(config)?;
        let summary = orchestrator.run_cycle(Utc::now()).await;

        for alert in orchestrator.alert_manager().recent(summary.alerts_emitted) {
            println!("\n{}", alert.format_console());
        }
        println!("\n{}", summary.render());

        Ok(())
    }
}
