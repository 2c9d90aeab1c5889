//! Rate-limited, retrying write-back of processed tasks.

use std::time::Duration;

use tracing::{debug, error, warn};

use nextup_core::ProcessedTask;

use crate::error::WriteError;
use crate::ratelimit::TokenBucket;
use crate::traits::TaskSink;

/// Retry policy for conflicting writes.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts per task, first try included.
    pub max_attempts: u32,
    /// Base backoff; attempt n sleeps `backoff * n` (linear).
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(150),
        }
    }
}

/// Outcome counts for one write-back pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WritebackSummary {
    pub written: usize,
    pub skipped_archived: usize,
    pub failed: usize,
}

/// Writes ranks and projections back through a sink, one task at a time.
///
/// Every attempt takes a token from the shared bucket first. Failures are
/// per task and never abort the pass: archived tasks are skipped, conflicts
/// retried with linear backoff up to the configured bound, anything else
/// logged and abandoned.
pub struct RankWriter<'a, S: TaskSink + ?Sized> {
    sink: &'a S,
    limiter: &'a TokenBucket,
    retry: RetryConfig,
}

impl<'a, S: TaskSink + ?Sized> RankWriter<'a, S> {
    pub fn new(sink: &'a S, limiter: &'a TokenBucket, retry: RetryConfig) -> Self {
        Self {
            sink,
            limiter,
            retry,
        }
    }

    pub async fn write_all(&self, tasks: &[ProcessedTask]) -> WritebackSummary {
        let mut summary = WritebackSummary::default();
        for task in tasks {
            self.write_one(task, &mut summary).await;
        }
        debug!(
            written = summary.written,
            skipped_archived = summary.skipped_archived,
            failed = summary.failed,
            "write-back pass complete"
        );
        summary
    }

    async fn write_one(&self, task: &ProcessedTask, summary: &mut WritebackSummary) {
        let mut attempt = 0;
        loop {
            self.limiter.acquire().await;
            match self
                .sink
                .write_rank(&task.task.id, task.queue_rank, task.projected_completion)
                .await
            {
                Ok(()) => {
                    summary.written += 1;
                    return;
                }
                Err(WriteError::Archived) => {
                    warn!(task = %task.task.id, title = %task.task.title, "skipping archived task");
                    summary.skipped_archived += 1;
                    return;
                }
                Err(WriteError::Conflict) => {
                    attempt += 1;
                    if attempt >= self.retry.max_attempts {
                        warn!(
                            task = %task.task.id,
                            attempts = attempt,
                            "conflict persisted, giving up"
                        );
                        summary.failed += 1;
                        return;
                    }
                    tokio::time::sleep(self.retry.backoff * attempt).await;
                }
                Err(WriteError::Other(message)) => {
                    error!(task = %task.task.id, error = %message, "write failed");
                    summary.failed += 1;
                    return;
                }
            }
        }
    }
}
