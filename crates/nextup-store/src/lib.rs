//! Seams to the external task store.
//!
//! The real request/response shims live outside this system; this crate
//! defines the traits the pipeline consumes, the write-error taxonomy, the
//! token-bucket rate limiter every outbound call goes through, the retrying
//! rank writer, and an in-memory store used by tests and the simulator.

mod error;
mod memory;
mod ratelimit;
mod traits;
mod writeback;

pub use error::WriteError;
pub use memory::{MemoryStore, RecordedWrite};
pub use ratelimit::TokenBucket;
pub use traits::{IdentityResolver, TaskScope, TaskSink, TaskSource, UserIdentity};
pub use writeback::{RankWriter, RetryConfig, WritebackSummary};
