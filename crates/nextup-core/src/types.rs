//! Task model shared across the pipeline.

use std::collections::HashSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Stable task identifier, owned by the external store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Grouping reference linking related tasks for projection inheritance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectiveId(pub String);

impl ObjectiveId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ObjectiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectiveId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ObjectiveId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Priority label carried by a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// A unit of work as the pipeline sees it: an in-memory, read-only
/// snapshot of what the external store returned for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// Owner identity, the grouping key. Empty means ineligible.
    pub owner: String,
    /// Lifecycle status; the excluded set is checked against this verbatim.
    pub status: String,
    /// Original effort estimate in fractional days.
    pub estimate_days: Option<f64>,
    /// Remaining effort in fractional days; falls back to `estimate_days`.
    pub estimate_remaining_days: Option<f64>,
    pub due: Option<NaiveDate>,
    pub priority: Option<Priority>,
    /// Direct parent reference, same identifier space.
    pub parent: Option<TaskId>,
    /// Externally computed importance score.
    pub importance: Option<f64>,
    pub started_at: Option<NaiveDateTime>,
    pub labels: Vec<String>,
    pub objective: Option<ObjectiveId>,
}

impl Task {
    pub fn new(
        id: impl Into<TaskId>,
        title: impl Into<String>,
        owner: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            owner: owner.into(),
            status: status.into(),
            estimate_days: None,
            estimate_remaining_days: None,
            due: None,
            priority: None,
            parent: None,
            importance: None,
            started_at: None,
            labels: Vec::new(),
            objective: None,
        }
    }

    pub fn with_estimate(mut self, days: f64) -> Self {
        self.estimate_days = Some(days);
        self
    }

    pub fn with_remaining(mut self, days: f64) -> Self {
        self.estimate_remaining_days = Some(days);
        self
    }

    pub fn with_due(mut self, due: NaiveDate) -> Self {
        self.due = Some(due);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_parent(mut self, parent: impl Into<TaskId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_importance(mut self, importance: f64) -> Self {
        self.importance = Some(importance);
        self
    }

    pub fn with_started_at(mut self, started_at: NaiveDateTime) -> Self {
        self.started_at = Some(started_at);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn with_objective(mut self, objective: impl Into<ObjectiveId>) -> Self {
        self.objective = Some(objective.into());
        self
    }

    /// Remaining effort used everywhere downstream: remaining, falling back
    /// to the original estimate, falling back to zero.
    pub fn effective_estimate(&self) -> f64 {
        self.estimate_remaining_days
            .or(self.estimate_days)
            .unwrap_or(0.0)
    }

    /// Eligible iff the owner key is non-empty and the status is not excluded.
    pub fn is_eligible(&self, excluded: &ExcludedStatuses) -> bool {
        !self.owner.trim().is_empty() && !excluded.contains(&self.status)
    }
}

/// A task with its assigned position within its owner's queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedTask {
    pub task: Task,
    /// 1-based position within the owner's ordered list.
    pub queue_rank: u32,
    /// The score that produced this position.
    pub queue_score: f64,
}

/// A ranked task with its completion projection; the only entity written
/// back to the external store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedTask {
    pub task: Task,
    pub queue_rank: u32,
    pub queue_score: f64,
    pub projected_completion: NaiveDate,
    /// Normalized remaining estimate (blank treated as zero).
    pub estimate_remaining_days: f64,
}

/// Statuses excluded from processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedStatuses(HashSet<String>);

impl ExcludedStatuses {
    pub fn new<I, S>(statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(statuses.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, status: &str) -> bool {
        self.0.contains(status)
    }
}

impl Default for ExcludedStatuses {
    fn default() -> Self {
        Self::new([
            "Backlogged",
            "Done",
            "Live in Dev",
            "Ready for QA",
            "Live in Staging",
            "Blocked",
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_estimate_prefers_remaining() {
        let task = Task::new("t1", "Task", "Alice", "In Progress")
            .with_estimate(5.0)
            .with_remaining(2.0);
        assert_eq!(task.effective_estimate(), 2.0);
    }

    #[test]
    fn effective_estimate_falls_back_to_estimate_then_zero() {
        let task = Task::new("t1", "Task", "Alice", "In Progress").with_estimate(5.0);
        assert_eq!(task.effective_estimate(), 5.0);

        let task = Task::new("t2", "Task", "Alice", "In Progress");
        assert_eq!(task.effective_estimate(), 0.0);
    }

    #[test]
    fn eligibility_requires_owner_and_allowed_status() {
        let excluded = ExcludedStatuses::default();

        let task = Task::new("t1", "Task", "Alice", "In Progress");
        assert!(task.is_eligible(&excluded));

        let unowned = Task::new("t2", "Task", "   ", "In Progress");
        assert!(!unowned.is_eligible(&excluded));

        let done = Task::new("t3", "Task", "Alice", "Done");
        assert!(!done.is_eligible(&excluded));
    }

    #[test]
    fn excluded_statuses_default_set() {
        let excluded = ExcludedStatuses::default();
        for status in [
            "Backlogged",
            "Done",
            "Live in Dev",
            "Ready for QA",
            "Live in Staging",
            "Blocked",
        ] {
            assert!(excluded.contains(status), "{status} should be excluded");
        }
        assert!(!excluded.contains("In Progress"));
    }
}
