//! CLI interface for poly-sentinel
//!
//! Provides subcommands for:
//! - `run`: Start the continuous detection loop
//! - `cycle`: Run a single detection cycle and print its summary
//! - `status`: Show current state
//! - `config`: Show configuration

mod cycle;
mod run;

pub use cycle::CycleArgs;
pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "poly-sentinel")]
#[command(about = "News-driven price discrepancy alerting for Polymarket prediction markets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the continuous detection loop
    Run(RunArgs),
    /// Run a single detection cycle
    Cycle(CycleArgs),
    /// Show current state
    Status,
    /// Show configuration
    Config,
}
