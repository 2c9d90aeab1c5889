//! Core engines for NextUp queue processing.
//!
//! This crate holds the pure (or nearly pure) parts of the system:
//! - The task model shared by every other crate
//! - The ranking engine (eligibility, scoring, hierarchy-aware ordering)
//! - Business-calendar arithmetic (whole-day and intraday)
//! - The projection engine that turns a ranked queue into completion dates
//!
//! Everything here is driven by explicit inputs (`now` is always a
//! parameter) so the engines are deterministic under test.

mod calendar;
mod projection;
mod ranking;
mod scoring;
mod types;

pub use calendar::{InvalidWorkday, Workday, add_business_days, add_business_hours, is_weekend, roll_to_monday};
pub use projection::{
    NoSiblingLookup, ProjectionConfig, ProjectionEngine, ProjectionMode, SiblingLookup,
};
pub use ranking::{build_hierarchy, rank_tasks};
pub use scoring::{ImportanceScore, ScoreStrategy, ScoringKind, WeightedHeuristic};
pub use types::{
    ExcludedStatuses, ObjectiveId, Priority, ProcessedTask, RankedTask, Task, TaskId,
};
