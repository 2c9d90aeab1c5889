//! Per-user debounce routing.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::state::{PerUserState, SchedulerState};

/// Routes raw store events into per-user debounce timers.
///
/// Every event restarts the user's timer, so a burst of edits collapses
/// into a single run once the user goes quiet for the debounce window.
/// Events that land while a run is in flight skip the timer entirely and
/// set the rerun flag instead.
#[derive(Clone)]
pub struct DebounceRouter {
    state: Arc<Mutex<SchedulerState>>,
    debounce: Duration,
}

impl DebounceRouter {
    pub fn new(state: Arc<Mutex<SchedulerState>>, debounce: Duration) -> Self {
        Self { state, debounce }
    }

    /// Record an event for a user and (re)arm their debounce timer.
    pub fn on_event(&self, user_id: &str, user_name: &str) {
        let mut guard = self.state.lock().expect("scheduler state lock poisoned");
        let user = guard
            .users
            .entry(user_id.to_string())
            .or_insert_with(|| PerUserState::new(user_name));
        user.user_name = user_name.to_string();
        user.last_event = Some(Instant::now());

        if user.is_processing {
            user.rerun_requested = true;
            debug!(user = %user_id, "event during run, rerun requested");
            return;
        }
        if user.in_queue {
            debug!(user = %user_id, "event while queued, coalesced");
            return;
        }

        // Restart the debounce window.
        if let Some(timer) = user.timer.take() {
            timer.abort();
        }
        user.timer_generation += 1;
        let generation = user.timer_generation;
        let state = Arc::clone(&self.state);
        let id = user_id.to_string();
        let debounce = self.debounce;
        let handle = tokio::spawn(async move {
            sleep(debounce).await;
            fire_timer(&state, &id, generation);
        });
        user.timer = Some(handle.abort_handle());
        debug!(user = %user_id, debounce = ?self.debounce, "debounce timer armed");
    }
}

/// Debounce elapsed: move the user into the ready queue.
fn fire_timer(state: &Mutex<SchedulerState>, user_id: &str, generation: u64) {
    let mut guard = state.lock().expect("scheduler state lock poisoned");
    let st = &mut *guard;
    let Some(user) = st.users.get_mut(user_id) else {
        return;
    };
    if user.timer_generation != generation {
        // A newer event re-armed the timer after this one was spawned.
        return;
    }
    user.timer = None;
    if user.is_processing {
        user.rerun_requested = true;
        return;
    }
    if st.ready.push(user_id) {
        user.in_queue = true;
        debug!(user = %user_id, "debounce elapsed, queued for processing");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paused_router(debounce: Duration) -> (DebounceRouter, Arc<Mutex<SchedulerState>>) {
        let state = Arc::new(Mutex::new(SchedulerState::new()));
        (DebounceRouter::new(Arc::clone(&state), debounce), state)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_events_queues_once() {
        let (router, state) = paused_router(Duration::from_secs(10));

        for _ in 0..5 {
            router.on_event("u-1", "Alice");
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        tokio::time::sleep(Duration::from_secs(11)).await;

        let guard = state.lock().unwrap();
        assert_eq!(guard.ready.len(), 1);
        let user = guard.users.get("u-1").unwrap();
        assert!(user.in_queue);
        assert!(user.timer.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn each_event_restarts_the_window() {
        let (router, state) = paused_router(Duration::from_secs(10));

        router.on_event("u-1", "Alice");
        tokio::time::sleep(Duration::from_secs(8)).await;
        router.on_event("u-1", "Alice");
        tokio::time::sleep(Duration::from_secs(8)).await;

        // 16s after the first event, but only 8s after the last one.
        assert!(state.lock().unwrap().ready.is_empty());

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(state.lock().unwrap().ready.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn event_during_run_sets_rerun_flag() {
        let (router, state) = paused_router(Duration::from_secs(10));

        router.on_event("u-1", "Alice");
        state
            .lock()
            .unwrap()
            .users
            .get_mut("u-1")
            .unwrap()
            .is_processing = true;

        router.on_event("u-1", "Alice");
        tokio::time::sleep(Duration::from_secs(11)).await;

        let guard = state.lock().unwrap();
        let user = guard.users.get("u-1").unwrap();
        assert!(user.rerun_requested);
        // The first timer still fires, but a processing user is never queued.
        assert!(guard.ready.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_users_queue_independently() {
        let (router, state) = paused_router(Duration::from_secs(10));

        router.on_event("u-1", "Alice");
        router.on_event("u-2", "Bob");
        tokio::time::sleep(Duration::from_secs(11)).await;

        let guard = state.lock().unwrap();
        assert_eq!(guard.ready.len(), 2);
        assert!(guard.ready.contains("u-1"));
        assert!(guard.ready.contains("u-2"));
    }
}
