//! In-memory store double for tests and the simulator.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

use nextup_core::{ExcludedStatuses, ObjectiveId, SiblingLookup, Task, TaskId};

use crate::error::WriteError;
use crate::traits::{IdentityResolver, TaskScope, TaskSink, TaskSource, UserIdentity};

/// One recorded write-back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub task_id: TaskId,
    pub rank: u32,
    pub projected_completion: NaiveDate,
}

#[derive(Default)]
struct Inner {
    tasks: Vec<Task>,
    users: Vec<UserIdentity>,
    /// Projections visible to sibling lookup; seeded and updated by writes.
    projections: HashMap<TaskId, NaiveDate>,
    writes: Vec<RecordedWrite>,
    archived: HashSet<TaskId>,
    /// Remaining conflicts to induce per task before a write succeeds.
    pending_conflicts: HashMap<TaskId, u32>,
}

/// In-memory `TaskSource + TaskSink + SiblingLookup + IdentityResolver`.
///
/// Mirrors the external store's observable behavior: loads are filtered to
/// eligible tasks, writes can be scripted to conflict or hit archived
/// tasks, and sibling lookup sees previously written projections.
#[derive(Default)]
pub struct MemoryStore {
    excluded: ExcludedStatuses,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            excluded: ExcludedStatuses::default(),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn add_task(&self, task: Task) {
        self.inner.lock().expect("store lock poisoned").tasks.push(task);
    }

    pub fn add_user(&self, id: impl Into<String>, display_name: impl Into<String>) {
        self.inner
            .lock()
            .expect("store lock poisoned")
            .users
            .push(UserIdentity {
                id: id.into(),
                display_name: display_name.into(),
            });
    }

    /// Seed a projection as if a previous run had written it.
    pub fn seed_projection(&self, task_id: impl Into<TaskId>, date: NaiveDate) {
        self.inner
            .lock()
            .expect("store lock poisoned")
            .projections
            .insert(task_id.into(), date);
    }

    pub fn mark_archived(&self, task_id: impl Into<TaskId>) {
        self.inner
            .lock()
            .expect("store lock poisoned")
            .archived
            .insert(task_id.into());
    }

    /// Make the next `count` writes to a task fail with a conflict.
    pub fn induce_conflicts(&self, task_id: impl Into<TaskId>, count: u32) {
        self.inner
            .lock()
            .expect("store lock poisoned")
            .pending_conflicts
            .insert(task_id.into(), count);
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.inner.lock().expect("store lock poisoned").writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.inner.lock().expect("store lock poisoned").writes.len()
    }
}

#[async_trait]
impl TaskSource for MemoryStore {
    async fn load_tasks(&self, scope: TaskScope) -> Vec<Task> {
        let inner = self.inner.lock().expect("store lock poisoned");
        inner
            .tasks
            .iter()
            .filter(|t| t.is_eligible(&self.excluded))
            .filter(|t| match &scope {
                TaskScope::AllOwners => true,
                TaskScope::Owner(owner) => &t.owner == owner,
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TaskSink for MemoryStore {
    async fn write_rank(
        &self,
        task_id: &TaskId,
        rank: u32,
        projected_completion: NaiveDate,
    ) -> Result<(), WriteError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        if inner.archived.contains(task_id) {
            return Err(WriteError::Archived);
        }
        if let Some(remaining) = inner.pending_conflicts.get_mut(task_id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(WriteError::Conflict);
            }
        }
        debug!(task = %task_id, rank, projected = %projected_completion, "recorded write");
        inner.projections.insert(task_id.clone(), projected_completion);
        inner.writes.push(RecordedWrite {
            task_id: task_id.clone(),
            rank,
            projected_completion,
        });
        Ok(())
    }
}

#[async_trait]
impl SiblingLookup for MemoryStore {
    async fn latest_projection_for_objective(&self, objective: &ObjectiveId) -> Option<NaiveDate> {
        let inner = self.inner.lock().expect("store lock poisoned");
        inner
            .tasks
            .iter()
            .filter(|t| t.objective.as_ref() == Some(objective))
            .filter_map(|t| inner.projections.get(&t.id))
            .max()
            .copied()
    }
}

#[async_trait]
impl IdentityResolver for MemoryStore {
    async fn resolve(&self, external_ref: &str) -> Option<UserIdentity> {
        let inner = self.inner.lock().expect("store lock poisoned");
        inner
            .users
            .iter()
            .find(|u| u.id == external_ref || u.display_name.eq_ignore_ascii_case(external_ref))
            .cloned()
    }
}
