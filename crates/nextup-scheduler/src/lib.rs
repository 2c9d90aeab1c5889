//! Event-driven scheduling for NextUp.
//!
//! Incoming store events are debounced per user, coalesced into a ready
//! queue, and drained by a single worker that runs the ranking pipeline
//! for one user at a time. Events arriving mid-run set a rerun flag so
//! the user is processed again immediately after the current run.

mod pipeline;
mod queue;
mod router;
mod scheduler;
mod state;
mod worker;

pub use pipeline::{PipelineConfig, RankingPipeline, RunReport};
pub use queue::ReadyQueue;
pub use router::DebounceRouter;
pub use scheduler::{Scheduler, SchedulerConfig};
pub use state::{PerUserState, SchedulerState};
pub use worker::{UserProcessor, Worker};
