//! Scripted scheduler demo: a burst of overlapping events per user should
//! collapse into one pipeline run each.

use std::sync::Arc;
use std::time::Duration;

use miette::Result;
use tokio::time::sleep;
use tracing::{info, warn};

use nextup_core::ScoringKind;
use nextup_scheduler::{PipelineConfig, RankingPipeline, Scheduler, SchedulerConfig};
use nextup_store::{IdentityResolver, MemoryStore, TokenBucket};

use crate::demo;

pub async fn run(debounce: Duration, scoring: ScoringKind) -> Result<()> {
    info!("scheduler simulation start");

    let store = demo::seed();
    let config = PipelineConfig {
        scoring,
        ..PipelineConfig::default()
    };
    let pipeline = Arc::new(RankingPipeline::new(
        Arc::clone(&store),
        Arc::clone(&store),
        Arc::clone(&store),
        TokenBucket::new(3, 3.0),
        config,
    ));

    let scheduler = Scheduler::start(
        SchedulerConfig {
            debounce,
            ..SchedulerConfig::default()
        },
        pipeline,
    );

    // Alice, Bob, Alice, Carol, Alice, Carol, Bob: all inside the window,
    // so each user should be processed exactly once.
    let burst = [
        "U-ALICE", "U-BOB", "U-ALICE", "U-CAROL", "U-ALICE", "U-CAROL", "U-BOB",
    ];
    for external_ref in burst {
        route(&scheduler, store.as_ref(), external_ref).await;
        sleep(debounce / 6).await;
    }

    // Let the debounce elapse and the worker drain the queue.
    sleep(debounce * 5).await;
    scheduler.stop().await;

    for write in store.writes() {
        info!(
            task = %write.task_id,
            rank = write.rank,
            projected = %write.projected_completion,
            "written"
        );
    }
    info!(writes = store.write_count(), "simulation complete");
    Ok(())
}

/// Resolve an external user reference and feed the event in; unresolvable
/// events are dropped, not errors.
async fn route(scheduler: &Scheduler, store: &MemoryStore, external_ref: &str) {
    match store.resolve(external_ref).await {
        Some(user) => {
            info!(user = %user.display_name, "event");
            scheduler.route_event(&user.id, &user.display_name);
        }
        None => warn!(external_ref, "unknown user reference, dropping event"),
    }
}
