//! Seed data for the demo store.

use std::sync::Arc;

use chrono::{Duration, Local};

use nextup_core::{Priority, Task};
use nextup_store::MemoryStore;

/// A small team with enough variety to exercise the whole pipeline:
/// hierarchy, excluded statuses, a zero-estimate head-of-queue, and a
/// QA task inheriting its sibling's projection.
pub fn seed() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let today = Local::now().date_naive();

    store.add_user("U-ALICE", "Alice");
    store.add_user("U-BOB", "Bob");
    store.add_user("U-CAROL", "Carol");

    store.add_task(
        Task::new("t-auth", "Auth flow rework", "Alice", "In Progress")
            .with_importance(90.0)
            .with_priority(Priority::High)
            .with_due(today + Duration::days(3))
            .with_estimate(2.0)
            .with_remaining(1.0)
            .with_objective("obj-auth"),
    );
    store.add_task(
        Task::new("t-auth-ui", "Auth login screen", "Alice", "Todo")
            .with_importance(70.0)
            .with_priority(Priority::Medium)
            .with_parent("t-auth")
            .with_estimate(1.5),
    );
    store.add_task(
        Task::new("t-quick", "Update onboarding doc", "Alice", "Todo").with_importance(95.0),
    );
    store.add_task(
        Task::new("t-old", "Decommissioned importer", "Alice", "Done").with_importance(100.0),
    );

    store.add_task(
        Task::new("t-search", "Search indexing", "Bob", "In Progress")
            .with_importance(80.0)
            .with_priority(Priority::High)
            .with_due(today + Duration::days(7))
            .with_estimate(3.0),
    );
    store.add_task(
        Task::new("t-search-qa", "Verify search results", "Bob", "Todo")
            .with_importance(40.0)
            .with_label("QA")
            .with_objective("obj-search")
            .with_estimate(0.5),
    );
    store.add_task(
        Task::new("t-search-impl", "Query parser", "Carol", "In Progress")
            .with_importance(60.0)
            .with_objective("obj-search")
            .with_estimate(2.0),
    );

    store.add_task(
        Task::new("t-billing", "Billing retries", "Carol", "Todo")
            .with_importance(85.0)
            .with_priority(Priority::Low)
            .with_due(today + Duration::days(30))
            .with_estimate(12.0),
    );

    store
}
