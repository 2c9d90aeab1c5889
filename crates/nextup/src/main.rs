//! NextUp: event-driven task ranking and completion projection.
//!
//! Subcommands:
//! - `rank`: one-shot pipeline run over the demo store, JSON to stdout
//! - `simulate`: event-driven scheduler demo (debounce, coalescing, reruns)

use std::time::Duration;

use clap::{Parser, Subcommand};
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nextup_core::ScoringKind;

mod demo;
mod rank;
mod simulate;

fn parse_scoring(s: &str) -> Result<ScoringKind, String> {
    match s.to_lowercase().as_str() {
        "importance" => Ok(ScoringKind::Importance),
        "weighted" => Ok(ScoringKind::Weighted),
        _ => Err(format!(
            "invalid scoring strategy '{}', expected importance or weighted",
            s
        )),
    }
}

#[derive(Parser)]
#[command(name = "nextup")]
#[command(about = "Task ranking and completion projection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline once for an owner and print the queue as JSON
    Rank {
        /// Owner to rank; omit to process every owner
        #[arg(long)]
        owner: Option<String>,

        /// Scoring strategy (importance or weighted)
        #[arg(long, env = "NEXTUP_SCORING", value_parser = parse_scoring, default_value = "importance")]
        scoring: ScoringKind,

        /// Write ranks and projections back to the store
        #[arg(long)]
        write: bool,
    },

    /// Drive the scheduler with a scripted event burst
    Simulate {
        /// Debounce window in milliseconds
        #[arg(long, env = "NEXTUP_DEBOUNCE_MS", default_value = "300")]
        debounce_ms: u64,

        /// Scoring strategy (importance or weighted)
        #[arg(long, env = "NEXTUP_SCORING", value_parser = parse_scoring, default_value = "importance")]
        scoring: ScoringKind,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "nextup=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Rank {
            owner,
            scoring,
            write,
        } => rank::run(owner, scoring, write).await,

        Commands::Simulate {
            debounce_ms,
            scoring,
        } => simulate::run(Duration::from_millis(debounce_ms), scoring).await,
    }
}
