//! Headless match runner.
//!
//! Runs seeded skirmishes without graphics and reports outcomes as
//! JSON, one report per line. Designed for CI checks and balance
//! smoke-testing.
//!
//! # Usage
//!
//! ```bash
//! # Run a single match
//! cargo run -p fief_headless -- run --seed 7
//!
//! # Run a seed batch and summarize
//! cargo run -p fief_headless -- batch --seed 0 --count 25
//! ```
//!
//! Reports go to stdout; logs go to stderr.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fief_headless::runner::{run_batch, run_match, MatchConfig, MatchOutcome};

#[derive(Parser)]
#[command(name = "fief_headless")]
#[command(about = "Headless Fief match runner for CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single match
    Run {
        /// Match seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Tick duration in milliseconds
        #[arg(long, default_value = "50")]
        tick_ms: u64,

        /// Maximum ticks before timeout
        #[arg(long, default_value = "12000")]
        max_ticks: u64,
    },

    /// Run a batch of matches over consecutive seeds
    Batch {
        /// First seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Number of matches
        #[arg(short, long, default_value = "10")]
        count: u64,

        /// Tick duration in milliseconds
        #[arg(long, default_value = "50")]
        tick_ms: u64,

        /// Maximum ticks per match before timeout
        #[arg(long, default_value = "12000")]
        max_ticks: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Run {
            seed,
            tick_ms,
            max_ticks,
        } => {
            let report = run_match(&MatchConfig {
                seed,
                tick_ms,
                max_ticks,
            });
            match serde_json::to_string(&report) {
                Ok(line) => println!("{line}"),
                Err(e) => eprintln!("failed to encode report: {e}"),
            }
        }
        Commands::Batch {
            seed,
            count,
            tick_ms,
            max_ticks,
        } => {
            let reports = run_batch(
                &MatchConfig {
                    seed,
                    tick_ms,
                    max_ticks,
                },
                count,
            );
            for report in &reports {
                match serde_json::to_string(report) {
                    Ok(line) => println!("{line}"),
                    Err(e) => eprintln!("failed to encode report: {e}"),
                }
            }

            let ai_wins = reports
                .iter()
                .filter(|r| r.outcome == MatchOutcome::Winner(fief_core::prelude::Owner::Ai))
                .count();
            let timeouts = reports
                .iter()
                .filter(|r| r.outcome == MatchOutcome::Timeout)
                .count();
            tracing::info!(
                total = reports.len(),
                ai_wins,
                timeouts,
                "batch complete"
            );
        }
    }
}
