//! The end-to-end ranking pipeline: load, rank, project, write back.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use tracing::{debug, info};

use nextup_core::{
    ExcludedStatuses, ProcessedTask, ProjectionConfig, ProjectionEngine, ScoringKind,
    SiblingLookup, rank_tasks,
};
use nextup_store::{
    RankWriter, RetryConfig, TaskScope, TaskSink, TaskSource, TokenBucket, WritebackSummary,
};

use crate::worker::UserProcessor;

/// Pipeline behavior knobs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// When false, runs compute everything but never touch the store.
    pub write_enabled: bool,
    pub scoring: ScoringKind,
    pub projection: ProjectionConfig,
    pub excluded: ExcludedStatuses,
    pub retry: RetryConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            write_enabled: true,
            scoring: ScoringKind::default(),
            projection: ProjectionConfig::default(),
            excluded: ExcludedStatuses::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// What one run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub processed: Vec<ProcessedTask>,
    /// None when writes are disabled.
    pub writeback: Option<WritebackSummary>,
}

/// One user's tasks through the whole pipeline.
///
/// The store seams are generic so tests and the simulator can plug the
/// in-memory store in for all three.
pub struct RankingPipeline<S, W, L>
where
    S: TaskSource,
    W: TaskSink,
    L: SiblingLookup,
{
    source: Arc<S>,
    sink: Arc<W>,
    lookup: Arc<L>,
    limiter: TokenBucket,
    config: PipelineConfig,
}

impl<S, W, L> RankingPipeline<S, W, L>
where
    S: TaskSource,
    W: TaskSink,
    L: SiblingLookup,
{
    pub fn new(
        source: Arc<S>,
        sink: Arc<W>,
        lookup: Arc<L>,
        limiter: TokenBucket,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            sink,
            lookup,
            limiter,
            config,
        }
    }

    /// Run the pipeline for one scope at a fixed point in time.
    pub async fn run(&self, scope: TaskScope, now: NaiveDateTime) -> RunReport {
        let tasks = self.source.load_tasks(scope).await;
        debug!(count = tasks.len(), "loaded tasks");

        let scorer = self.config.scoring.strategy(now.date());
        let ranked = rank_tasks(&tasks, &self.config.excluded, scorer.as_ref());

        let engine = ProjectionEngine::new(self.config.projection.clone());
        let processed = engine
            .assign_projections(ranked, self.lookup.as_ref(), now)
            .await;

        let writeback = if self.config.write_enabled {
            let writer = RankWriter::new(self.sink.as_ref(), &self.limiter, self.config.retry.clone());
            Some(writer.write_all(&processed).await)
        } else {
            debug!("writes disabled, skipping write-back");
            None
        };

        info!(
            tasks = processed.len(),
            written = writeback.as_ref().map(|s| s.written).unwrap_or(0),
            "pipeline run finished"
        );
        RunReport {
            processed,
            writeback,
        }
    }
}

#[async_trait]
impl<S, W, L> UserProcessor for RankingPipeline<S, W, L>
where
    S: TaskSource,
    W: TaskSink,
    L: SiblingLookup,
{
    async fn process(&self, _user_id: &str, user_name: &str) -> Result<(), String> {
        let now = Local::now().naive_local();
        let report = self.run(TaskScope::owner(user_name), now).await;
        match report.writeback {
            Some(summary) if summary.failed > 0 => {
                Err(format!("{} task writes failed", summary.failed))
            }
            _ => Ok(()),
        }
    }
}
