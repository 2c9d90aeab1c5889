//! Per-user scheduling state.

use std::collections::HashMap;

use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::queue::ReadyQueue;

/// Everything the scheduler tracks about one user.
#[derive(Debug)]
pub struct PerUserState {
    /// Display name used to scope store loads.
    pub user_name: String,
    /// When the most recent event for this user arrived.
    pub last_event: Option<Instant>,
    /// Pending debounce timer, if one is armed.
    pub timer: Option<AbortHandle>,
    /// Bumped whenever a new timer is armed; a firing timer whose
    /// generation no longer matches has been superseded and must not act.
    pub timer_generation: u64,
    pub in_queue: bool,
    pub is_processing: bool,
    /// An event arrived during the current run; process again right after.
    pub rerun_requested: bool,
}

impl PerUserState {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            last_event: None,
            timer: None,
            timer_generation: 0,
            in_queue: false,
            is_processing: false,
            rerun_requested: false,
        }
    }
}

/// Shared mutable state behind the scheduler's single lock.
///
/// Held only for short, non-awaiting critical sections; the worker and
/// every timer release it before doing any async work.
#[derive(Debug, Default)]
pub struct SchedulerState {
    pub users: HashMap<String, PerUserState>,
    pub ready: ReadyQueue,
}

impl SchedulerState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_user_state_is_idle() {
        let state = PerUserState::new("Alice");
        assert_eq!(state.user_name, "Alice");
        assert!(state.timer.is_none());
        assert!(!state.in_queue);
        assert!(!state.is_processing);
        assert!(!state.rerun_requested);
    }
}
