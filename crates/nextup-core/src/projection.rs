//! Completion-date projection for ranked queues.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::{Workday, add_business_days, add_business_hours};
use crate::types::{ObjectiveId, ProcessedTask, RankedTask};

/// Lookup for the latest projection already assigned to any sibling task
/// sharing an objective. Misses and failures are indistinguishable: both
/// return `None` and projection falls through to normal computation.
#[async_trait]
pub trait SiblingLookup: Send + Sync {
    async fn latest_projection_for_objective(&self, objective: &ObjectiveId) -> Option<NaiveDate>;
}

/// Lookup that never finds a sibling; for callers without objective data.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSiblingLookup;

#[async_trait]
impl SiblingLookup for NoSiblingLookup {
    async fn latest_projection_for_objective(&self, _objective: &ObjectiveId) -> Option<NaiveDate> {
        None
    }
}

/// Calendar granularity for projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMode {
    /// Whole business days; each owner accumulates a running day total.
    BusinessDay,
    /// Hour precision within the work window; each owner carries a
    /// time-of-day cursor from task to task.
    Intraday,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    pub mode: ProjectionMode,
    pub workday: Workday,
    /// Label tag that marks a task for sibling projection inheritance.
    pub qa_label: String,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            mode: ProjectionMode::Intraday,
            workday: Workday::default(),
            qa_label: "QA".to_string(),
        }
    }
}

pub struct ProjectionEngine {
    config: ProjectionConfig,
}

impl ProjectionEngine {
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    /// Assign a projected completion date to every ranked task.
    ///
    /// Tasks are grouped per owner and walked in rank order; each owner has
    /// an independent projection cursor. `now` anchors tasks without a
    /// recorded start time and the first-task zero-estimate special case.
    pub async fn assign_projections(
        &self,
        ranked: Vec<RankedTask>,
        lookup: &dyn SiblingLookup,
        now: NaiveDateTime,
    ) -> Vec<ProcessedTask> {
        let mut owners: Vec<String> = Vec::new();
        let mut by_owner: HashMap<String, Vec<RankedTask>> = HashMap::new();
        for task in ranked {
            let owner = task.task.owner.clone();
            by_owner
                .entry(owner.clone())
                .or_insert_with(|| {
                    owners.push(owner);
                    Vec::new()
                })
                .push(task);
        }

        // Sibling lookups are memoized for the lifetime of one run,
        // including misses.
        let mut objective_cache: HashMap<ObjectiveId, Option<NaiveDate>> = HashMap::new();
        let mut processed = Vec::new();

        for owner in owners {
            let mut queue = by_owner.remove(&owner).unwrap_or_default();
            queue.sort_by_key(|t| t.queue_rank);

            let mut business_days_so_far = 0.0;
            let mut cursor: Option<NaiveDateTime> = None;

            for (position, ranked_task) in queue.into_iter().enumerate() {
                let estimate = ranked_task.task.effective_estimate();

                if let Some(inherited) = self
                    .qa_inherited_projection(&ranked_task, lookup, &mut objective_cache)
                    .await
                {
                    debug!(
                        task = %ranked_task.task.title,
                        projected = %inherited,
                        "inherited sibling projection"
                    );
                    processed.push(finish(ranked_task, inherited, estimate));
                    continue;
                }

                let anchor_start = ranked_task.task.started_at.unwrap_or(now);
                let mut projected = match self.config.mode {
                    ProjectionMode::Intraday => {
                        let anchor = match cursor {
                            Some(cursor) => cursor.max(anchor_start),
                            None => anchor_start,
                        };
                        let completion = add_business_hours(
                            anchor,
                            self.config.workday.days_to_hours(estimate),
                            self.config.workday,
                        );
                        cursor = Some(completion);
                        completion.date()
                    }
                    ProjectionMode::BusinessDay => {
                        business_days_so_far += estimate;
                        add_business_days(anchor_start.date(), business_days_so_far)
                    }
                };

                // The next task in line with no estimate should look
                // actionable immediately.
                if position == 0 && estimate == 0.0 {
                    projected = add_business_days(now.date(), 0.0);
                }

                processed.push(finish(ranked_task, projected, estimate));
            }
        }

        processed
    }

    /// Inherited projection for QA-labeled tasks with an objective, if any
    /// sibling already has one.
    async fn qa_inherited_projection(
        &self,
        ranked_task: &RankedTask,
        lookup: &dyn SiblingLookup,
        cache: &mut HashMap<ObjectiveId, Option<NaiveDate>>,
    ) -> Option<NaiveDate> {
        let task = &ranked_task.task;
        if !task.labels.iter().any(|l| l == &self.config.qa_label) {
            return None;
        }
        let objective = task.objective.as_ref()?;
        if let Some(cached) = cache.get(objective) {
            return *cached;
        }
        let found = lookup.latest_projection_for_objective(objective).await;
        cache.insert(objective.clone(), found);
        found
    }
}

fn finish(ranked: RankedTask, projected: NaiveDate, estimate: f64) -> ProcessedTask {
    ProcessedTask {
        task: ranked.task,
        queue_rank: ranked.queue_rank,
        queue_score: ranked.queue_score,
        projected_completion: projected,
        estimate_remaining_days: estimate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Task;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // Monday 2025-06-02 10:00
    fn monday_morning() -> NaiveDateTime {
        date(2025, 6, 2).and_hms_opt(10, 0, 0).unwrap()
    }

    fn ranked(task: Task, rank: u32) -> RankedTask {
        RankedTask {
            task,
            queue_rank: rank,
            queue_score: 1.0,
        }
    }

    fn intraday_engine() -> ProjectionEngine {
        ProjectionEngine::new(ProjectionConfig {
            mode: ProjectionMode::Intraday,
            ..ProjectionConfig::default()
        })
    }

    fn business_day_engine() -> ProjectionEngine {
        ProjectionEngine::new(ProjectionConfig {
            mode: ProjectionMode::BusinessDay,
            ..ProjectionConfig::default()
        })
    }

    /// Lookup returning a fixed date, recording which objectives were asked.
    struct FixedLookup {
        answer: Option<NaiveDate>,
        calls: Mutex<Vec<ObjectiveId>>,
    }

    impl FixedLookup {
        fn new(answer: Option<NaiveDate>) -> Self {
            Self {
                answer,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SiblingLookup for FixedLookup {
        async fn latest_projection_for_objective(
            &self,
            objective: &ObjectiveId,
        ) -> Option<NaiveDate> {
            self.calls.lock().unwrap().push(objective.clone());
            self.answer
        }
    }

    #[tokio::test]
    async fn intraday_cursor_chains_across_owner_queue() {
        let engine = intraday_engine();
        let tasks = vec![
            ranked(
                Task::new("t1", "First", "Alice", "In Progress").with_remaining(0.5),
                1,
            ),
            ranked(
                Task::new("t2", "Second", "Alice", "In Progress").with_remaining(0.5),
                2,
            ),
        ];
        let out = engine
            .assign_projections(tasks, &NoSiblingLookup, monday_morning())
            .await;
        // 10:00 + 4h = 14:00 Monday; next 4h spill into Tuesday.
        assert_eq!(out[0].projected_completion, date(2025, 6, 2));
        assert_eq!(out[1].projected_completion, date(2025, 6, 3));
    }

    #[tokio::test]
    async fn business_day_mode_accumulates_running_total() {
        let engine = business_day_engine();
        let tasks = vec![
            ranked(
                Task::new("t1", "First", "Alice", "In Progress").with_remaining(2.0),
                1,
            ),
            ranked(
                Task::new("t2", "Second", "Alice", "In Progress").with_remaining(3.0),
                2,
            ),
        ];
        let out = engine
            .assign_projections(tasks, &NoSiblingLookup, monday_morning())
            .await;
        // Monday + 2 business days = Wednesday; + 5 total = next Monday.
        assert_eq!(out[0].projected_completion, date(2025, 6, 4));
        assert_eq!(out[1].projected_completion, date(2025, 6, 9));
    }

    #[tokio::test]
    async fn first_task_with_zero_estimate_projects_to_today() {
        let engine = business_day_engine();
        let tasks = vec![
            ranked(Task::new("t1", "Next up", "Alice", "In Progress"), 1),
            ranked(
                Task::new("t2", "Second", "Alice", "In Progress").with_remaining(1.0),
                2,
            ),
        ];
        let out = engine
            .assign_projections(tasks, &NoSiblingLookup, monday_morning())
            .await;
        assert_eq!(out[0].projected_completion, date(2025, 6, 2));
    }

    #[tokio::test]
    async fn first_task_zero_estimate_on_weekend_rolls_to_monday() {
        let engine = business_day_engine();
        let saturday = date(2025, 6, 7).and_hms_opt(12, 0, 0).unwrap();
        let tasks = vec![ranked(Task::new("t1", "Next up", "Alice", "In Progress"), 1)];
        let out = engine
            .assign_projections(tasks, &NoSiblingLookup, saturday)
            .await;
        assert_eq!(out[0].projected_completion, date(2025, 6, 9));
    }

    #[tokio::test]
    async fn zero_estimate_later_in_queue_keeps_computed_date() {
        let engine = business_day_engine();
        let tasks = vec![
            ranked(
                Task::new("t1", "First", "Alice", "In Progress").with_remaining(2.0),
                1,
            ),
            ranked(Task::new("t2", "Second", "Alice", "In Progress"), 2),
        ];
        let out = engine
            .assign_projections(tasks, &NoSiblingLookup, monday_morning())
            .await;
        // Second task adds nothing but inherits the running total.
        assert_eq!(out[1].projected_completion, date(2025, 6, 4));
    }

    #[tokio::test]
    async fn qa_task_inherits_latest_sibling_projection() {
        let engine = intraday_engine();
        let inherited = date(2025, 7, 1);
        let lookup = FixedLookup::new(Some(inherited));
        let tasks = vec![ranked(
            Task::new("qa", "Verify release", "Alice", "In Progress")
                .with_remaining(1.0)
                .with_label("QA")
                .with_objective("obj-1"),
            1,
        )];
        let out = engine
            .assign_projections(tasks, &lookup, monday_morning())
            .await;
        assert_eq!(out[0].projected_completion, inherited);
    }

    #[tokio::test]
    async fn qa_task_without_sibling_falls_through_to_normal_computation() {
        let engine = intraday_engine();
        let lookup = FixedLookup::new(None);
        let tasks = vec![ranked(
            Task::new("qa", "Verify release", "Alice", "In Progress")
                .with_remaining(0.5)
                .with_label("QA")
                .with_objective("obj-1"),
            1,
        )];
        let out = engine
            .assign_projections(tasks, &lookup, monday_morning())
            .await;
        assert_eq!(out[0].projected_completion, date(2025, 6, 2));
        assert_eq!(lookup.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sibling_lookup_is_cached_per_objective_within_a_run() {
        let engine = intraday_engine();
        let lookup = FixedLookup::new(Some(date(2025, 7, 1)));
        let qa = |id: &str| {
            ranked(
                Task::new(id, id, "Alice", "In Progress")
                    .with_label("QA")
                    .with_objective("obj-1"),
                1,
            )
        };
        let mut first = qa("qa1");
        first.queue_rank = 1;
        let mut second = qa("qa2");
        second.queue_rank = 2;

        engine
            .assign_projections(vec![first, second], &lookup, monday_morning())
            .await;
        assert_eq!(lookup.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unlabeled_task_with_objective_skips_lookup() {
        let engine = intraday_engine();
        let lookup = FixedLookup::new(Some(date(2025, 7, 1)));
        let tasks = vec![ranked(
            Task::new("t1", "Plain", "Alice", "In Progress")
                .with_remaining(0.5)
                .with_objective("obj-1"),
            1,
        )];
        engine
            .assign_projections(tasks, &lookup, monday_morning())
            .await;
        assert!(lookup.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn owners_keep_independent_cursors() {
        let engine = intraday_engine();
        let tasks = vec![
            ranked(
                Task::new("a1", "A1", "Alice", "In Progress").with_remaining(1.0),
                1,
            ),
            ranked(
                Task::new("b1", "B1", "Bob", "In Progress").with_remaining(0.25),
                1,
            ),
        ];
        let out = engine
            .assign_projections(tasks, &NoSiblingLookup, monday_morning())
            .await;
        // Bob's short task is unaffected by Alice consuming a full day.
        let bob = out.iter().find(|t| t.task.owner == "Bob").unwrap();
        assert_eq!(bob.projected_completion, date(2025, 6, 2));
    }

    #[tokio::test]
    async fn started_at_anchors_ahead_of_cursor() {
        let engine = intraday_engine();
        let wednesday = date(2025, 6, 4).and_hms_opt(8, 0, 0).unwrap();
        let tasks = vec![
            ranked(
                Task::new("t1", "First", "Alice", "In Progress").with_remaining(0.25),
                1,
            ),
            ranked(
                Task::new("t2", "Scheduled later", "Alice", "In Progress")
                    .with_remaining(0.25)
                    .with_started_at(wednesday),
                2,
            ),
        ];
        let out = engine
            .assign_projections(tasks, &NoSiblingLookup, monday_morning())
            .await;
        // Second task starts at its own start time, not Monday's cursor.
        assert_eq!(out[1].projected_completion, date(2025, 6, 4));
    }
}
