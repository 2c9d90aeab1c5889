//! Collaborator traits consumed by the pipeline.

use async_trait::async_trait;
use chrono::NaiveDate;

use nextup_core::{Task, TaskId};

use crate::error::WriteError;

/// Which slice of the store a load covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskScope {
    AllOwners,
    Owner(String),
}

impl TaskScope {
    pub fn owner(name: impl Into<String>) -> Self {
        Self::Owner(name.into())
    }
}

/// Reads task snapshots from the external store.
///
/// Loads are server-side filtered to eligible tasks (and to one owner when
/// scoped). Implementations must tolerate partial failure by returning
/// whatever was loaded so far rather than raising; a failed page fetch is
/// logged on their side, never surfaced here.
#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn load_tasks(&self, scope: TaskScope) -> Vec<Task>;
}

/// Writes a task's rank and projection back to the external store.
#[async_trait]
pub trait TaskSink: Send + Sync {
    async fn write_rank(
        &self,
        task_id: &TaskId,
        rank: u32,
        projected_completion: NaiveDate,
    ) -> Result<(), WriteError>;
}

/// A resolved external user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: String,
    pub display_name: String,
}

/// Maps an external user reference to a stable identity.
///
/// Resolution failures are non-fatal: the ingress drops the event when
/// this returns `None`.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, external_ref: &str) -> Option<UserIdentity>;
}
