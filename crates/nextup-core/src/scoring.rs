//! Queue scoring strategies.
//!
//! The authoritative rule is importance-only. The richer weighted heuristic
//! predates it and is kept selectable until product settles on one; see
//! DESIGN.md for the decision record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Priority, Task};

/// A scoring function over tasks. Higher scores rank earlier.
pub trait ScoreStrategy: Send + Sync {
    fn score(&self, task: &Task) -> f64;
}

/// Importance-only scoring: the task's externally computed importance,
/// defaulting to zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportanceScore;

impl ScoreStrategy for ImportanceScore {
    fn score(&self, task: &Task) -> f64 {
        task.importance.unwrap_or(0.0)
    }
}

/// Multi-factor heuristic: priority weight, due-date urgency buckets, a
/// parent-reference bonus, and a size penalty for long tasks. Clamped at
/// zero. Due-date urgency is measured against the supplied `today`.
#[derive(Debug, Clone, Copy)]
pub struct WeightedHeuristic {
    pub today: NaiveDate,
}

impl WeightedHeuristic {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    fn priority_points(priority: Option<Priority>) -> f64 {
        match priority {
            Some(Priority::High) => 100.0,
            Some(Priority::Medium) => 60.0,
            Some(Priority::Low) => 20.0,
            None => 0.0,
        }
    }

    fn due_points(&self, due: Option<NaiveDate>) -> f64 {
        let Some(due) = due else { return 0.0 };
        let days_until = (due - self.today).num_days();
        match days_until {
            i64::MIN..=0 => 50.0,
            1..=3 => 40.0,
            4..=7 => 30.0,
            8..=14 => 20.0,
            15..=30 => 10.0,
            _ => 0.0,
        }
    }

    fn size_penalty(estimate_days: f64) -> f64 {
        if estimate_days > 10.0 {
            20.0
        } else if estimate_days > 5.0 {
            10.0
        } else {
            0.0
        }
    }
}

impl ScoreStrategy for WeightedHeuristic {
    fn score(&self, task: &Task) -> f64 {
        let mut score = Self::priority_points(task.priority);
        score += self.due_points(task.due);
        if task.parent.is_some() {
            score += 25.0;
        }
        score -= Self::size_penalty(task.estimate_days.unwrap_or(0.0));
        score.max(0.0)
    }
}

/// Which scoring strategy a run should use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringKind {
    #[default]
    Importance,
    Weighted,
}

impl ScoringKind {
    pub fn strategy(&self, today: NaiveDate) -> Box<dyn ScoreStrategy> {
        match self {
            ScoringKind::Importance => Box::new(ImportanceScore),
            ScoringKind::Weighted => Box::new(WeightedHeuristic::new(today)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    #[test]
    fn importance_score_defaults_to_zero() {
        let scorer = ImportanceScore;
        let task = Task::new("t1", "Task", "Alice", "In Progress");
        assert_eq!(scorer.score(&task), 0.0);

        let task = task.with_importance(42.5);
        assert_eq!(scorer.score(&task), 42.5);
    }

    #[test_case(0, 50.0 ; "overdue today")]
    #[test_case(-5, 50.0 ; "overdue past")]
    #[test_case(3, 40.0 ; "due very soon")]
    #[test_case(7, 30.0 ; "due this week")]
    #[test_case(14, 20.0 ; "due in two weeks")]
    #[test_case(30, 10.0 ; "due in a month")]
    #[test_case(31, 0.0 ; "beyond a month")]
    fn weighted_due_buckets(offset_days: i64, expected: f64) {
        let scorer = WeightedHeuristic::new(today());
        let task = Task::new("t1", "Task", "Alice", "In Progress")
            .with_due(today() + chrono::Duration::days(offset_days));
        assert_eq!(scorer.score(&task), expected);
    }

    #[test]
    fn weighted_combines_factors() {
        let scorer = WeightedHeuristic::new(today());
        // High priority (100) + due tomorrow (40) + parent bonus (25)
        // - long-task penalty (10 for > 5 days)
        let task = Task::new("t1", "Task", "Alice", "In Progress")
            .with_priority(Priority::High)
            .with_due(today() + chrono::Duration::days(1))
            .with_parent("t0")
            .with_estimate(6.0);
        assert_eq!(scorer.score(&task), 155.0);
    }

    #[test]
    fn weighted_never_negative() {
        let scorer = WeightedHeuristic::new(today());
        let task = Task::new("t1", "Task", "Alice", "In Progress").with_estimate(20.0);
        assert_eq!(scorer.score(&task), 0.0);
    }

    #[test]
    fn scoring_kind_selects_strategy() {
        let task = Task::new("t1", "Task", "Alice", "In Progress")
            .with_importance(7.0)
            .with_priority(Priority::High);
        assert_eq!(ScoringKind::Importance.strategy(today()).score(&task), 7.0);
        assert_eq!(ScoringKind::Weighted.strategy(today()).score(&task), 100.0);
    }
}
