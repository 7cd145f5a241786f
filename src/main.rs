use clap::Parser;
use poly_sentinel::cli::{Cli, Commands};
use poly_sentinel::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        toml::from_str(include_str!("../config.toml.example")).expect("Invalid default config")
    });

    // Fatal configuration is rejected before the first cycle
    config.validate()?;

    // Initialize telemetry
    let _guard = poly_sentinel::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting detection loop");
            args.execute(config).await?;
        }
        Commands::Cycle(args) => {
            tracing::info!("Running single detection cycle");
            args.execute(config).await?;
        }
        Commands::Status => {
            println!("poly-sentinel status");
            println!("  Mode: Detection only (no trading)");
            println!("  Status: Not running");
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Queries: {:?}", config.news.queries);
            println!(
                "  Intervals: news={}s markets={}s cycle={}s",
                config.news.fetch_interval_secs,
                config.markets.refresh_interval_secs,
                config.engine.cycle_interval_secs
            );
            println!(
                "  Detector: confidence>={} margin>={} relevance>={}",
                config.detector.confidence_threshold,
                config.detector.min_margin,
                config.detector.relevance_floor
            );
            println!(
                "  Alerts: cooldown={}s history={}",
                config.alerts.cooldown_secs, config.alerts.history_capacity
            );
        }
    }

    Ok(())
}
