//! FIFO ready queue with membership dedup.

use std::collections::{HashSet, VecDeque};

/// Users whose debounce has elapsed and who are waiting for the worker.
///
/// A user appears at most once; pushing a queued user is a no-op so a
/// burst of timers cannot schedule duplicate runs.
#[derive(Debug, Default)]
pub struct ReadyQueue {
    order: VecDeque<String>,
    members: HashSet<String>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a user. Returns false if the user was already queued.
    pub fn push(&mut self, user_id: &str) -> bool {
        if !self.members.insert(user_id.to_string()) {
            return false;
        }
        self.order.push_back(user_id.to_string());
        true
    }

    pub fn pop(&mut self) -> Option<String> {
        let user_id = self.order.pop_front()?;
        self.members.remove(&user_id);
        Some(user_id)
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.members.contains(user_id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
