//! Single worker draining the ready queue.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, warn};

use crate::state::SchedulerState;

/// Processes one user's tasks end to end.
///
/// Errors are strings by contract: the worker logs them and moves on, it
/// never retries a run (a failed run is repaired by the next event).
#[async_trait]
pub trait UserProcessor: Send + Sync {
    async fn process(&self, user_id: &str, user_name: &str) -> Result<(), String>;
}

/// Drains the ready queue one user at a time.
///
/// Single-worker by design: at most one pipeline run is in flight, so
/// per-user runs can never overlap and the store sees bounded load.
pub struct Worker {
    state: Arc<Mutex<SchedulerState>>,
    processor: Arc<dyn UserProcessor>,
    idle_poll: Duration,
}

impl Worker {
    pub fn new(
        state: Arc<Mutex<SchedulerState>>,
        processor: Arc<dyn UserProcessor>,
        idle_poll: Duration,
    ) -> Self {
        Self {
            state,
            processor,
            idle_poll,
        }
    }

    /// Run until the shutdown signal flips to true.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("worker starting");

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            match self.take_next() {
                Some((user_id, user_name)) => {
                    let started = Instant::now();
                    info!(user = %user_name, "processing user");
                    match self.processor.process(&user_id, &user_name).await {
                        Ok(()) => {
                            info!(user = %user_name, elapsed = ?started.elapsed(), "run complete");
                        }
                        Err(e) => {
                            error!(user = %user_name, error = %e, "run failed");
                        }
                    }
                    self.finish_run(&user_id);
                }
                None => {
                    tokio::select! {
                        _ = shutdown_rx.changed() => {}
                        _ = sleep(self.idle_poll) => {}
                    }
                }
            }
        }

        info!("worker shut down");
    }

    /// Dequeue the next ready user and mark them as processing.
    fn take_next(&self) -> Option<(String, String)> {
        let mut guard = self.state.lock().expect("scheduler state lock poisoned");
        let st = &mut *guard;
        let user_id = st.ready.pop()?;
        match st.users.get_mut(&user_id) {
            Some(user) => {
                user.in_queue = false;
                user.is_processing = true;
                // Anything requested before this run starts is satisfied
                // by the run itself.
                user.rerun_requested = false;
                let user_name = user.user_name.clone();
                Some((user_id, user_name))
            }
            None => {
                // Queue and state map are updated under the same lock, so
                // this means a bookkeeping bug, not a race.
                warn!(user = %user_id, "queued user has no state record, dropping");
                None
            }
        }
    }

    /// Clear the processing flag; re-enqueue immediately if events arrived
    /// mid-run. The rerun skips the debounce window on purpose: the user
    /// already waited once.
    fn finish_run(&self, user_id: &str) {
        let mut guard = self.state.lock().expect("scheduler state lock poisoned");
        let st = &mut *guard;
        if let Some(user) = st.users.get_mut(user_id) {
            user.is_processing = false;
            if user.rerun_requested {
                user.rerun_requested = false;
                if st.ready.push(user_id) {
                    user.in_queue = true;
                    debug!(user = %user_id, "rerun requested, requeued without debounce");
                }
            }
        }
    }
}
