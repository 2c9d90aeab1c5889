//! Write-error taxonomy for the external store.

use thiserror::Error;

/// Classified failure of a single write to the external store.
///
/// The classification drives retry policy: archived tasks are skipped,
/// conflicts are retried a bounded number of times, anything else is
/// logged and abandoned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    /// The task is no longer editable (archived or deleted concurrently).
    #[error("task is archived")]
    Archived,

    /// A concurrent edit collided with ours.
    #[error("concurrent edit conflict")]
    Conflict,

    /// Anything else; not retried.
    #[error("write failed: {0}")]
    Other(String),
}
