//! One-shot pipeline run against the demo store.

use std::sync::Arc;

use chrono::Local;
use miette::{IntoDiagnostic, Result};
use tracing::info;

use nextup_core::ScoringKind;
use nextup_scheduler::{PipelineConfig, RankingPipeline};
use nextup_store::{TaskScope, TokenBucket};

use crate::demo;

pub async fn run(owner: Option<String>, scoring: ScoringKind, write: bool) -> Result<()> {
    let store = demo::seed();
    let config = PipelineConfig {
        write_enabled: write,
        scoring,
        ..PipelineConfig::default()
    };
    let pipeline = RankingPipeline::new(
        Arc::clone(&store),
        Arc::clone(&store),
        Arc::clone(&store),
        TokenBucket::new(3, 3.0),
        config,
    );

    let scope = match owner {
        Some(name) => TaskScope::owner(name),
        None => TaskScope::AllOwners,
    };
    let report = pipeline.run(scope, Local::now().naive_local()).await;

    if let Some(summary) = report.writeback {
        info!(
            written = summary.written,
            skipped_archived = summary.skipped_archived,
            failed = summary.failed,
            "write-back summary"
        );
    }

    let json = serde_json::to_string_pretty(&report.processed).into_diagnostic()?;
    println!("{json}");
    Ok(())
}
