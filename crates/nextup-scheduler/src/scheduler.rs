//! Scheduler facade: wiring, lifecycle, event ingress.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::router::DebounceRouter;
use crate::state::SchedulerState;
use crate::worker::{UserProcessor, Worker};

/// Scheduler tuning knobs.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Quiet period after the last event before a user's run starts.
    pub debounce: Duration,
    /// Worker poll interval while the ready queue is empty.
    pub idle_poll: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(10),
            idle_poll: Duration::from_millis(25),
        }
    }
}

/// Owns the shared state, the debounce router, and the worker task.
pub struct Scheduler {
    state: Arc<Mutex<SchedulerState>>,
    router: DebounceRouter,
    shutdown_tx: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// Spawn the worker and return a running scheduler.
    pub fn start(config: SchedulerConfig, processor: Arc<dyn UserProcessor>) -> Self {
        let state = Arc::new(Mutex::new(SchedulerState::new()));
        let router = DebounceRouter::new(Arc::clone(&state), config.debounce);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = Worker::new(Arc::clone(&state), processor, config.idle_poll);
        let handle = tokio::spawn(worker.run(shutdown_rx));

        info!(debounce = ?config.debounce, "scheduler started");
        Self {
            state,
            router,
            shutdown_tx,
            worker: Mutex::new(Some(handle)),
        }
    }

    /// Feed one store event into the debounce machinery.
    pub fn route_event(&self, user_id: &str, user_name: &str) {
        self.router.on_event(user_id, user_name);
    }

    /// Graceful shutdown: stop the worker after its current run and cancel
    /// every pending debounce timer. Idempotent.
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(true);

        {
            let mut guard = self.state.lock().expect("scheduler state lock poisoned");
            for user in guard.users.values_mut() {
                if let Some(timer) = user.timer.take() {
                    timer.abort();
                }
            }
        }

        let handle = self
            .worker
            .lock()
            .expect("worker handle lock poisoned")
            .take();
        if let Some(handle) = handle
            && handle.await.is_err()
        {
            warn!("worker task panicked during shutdown");
        }
        info!("scheduler stopped");
    }
}
