//! Per-owner queue ranking.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::scoring::ScoreStrategy;
use crate::types::{ExcludedStatuses, RankedTask, Task, TaskId};

/// Map each task to its direct children (single level, not transitive).
/// Only parent references that resolve to a task in the input are recorded.
pub fn build_hierarchy(tasks: &[Task]) -> HashMap<&TaskId, Vec<&TaskId>> {
    let known: HashSet<&TaskId> = tasks.iter().map(|t| &t.id).collect();
    let mut children: HashMap<&TaskId, Vec<&TaskId>> = HashMap::new();
    for task in tasks {
        if let Some(parent) = &task.parent
            && known.contains(parent)
        {
            children.entry(parent).or_default().push(&task.id);
        }
    }
    children
}

/// Rank the eligible tasks, grouped per owner.
///
/// Within each owner's group: higher score first, then a direct parent
/// sorts before its child, then original input order. Ranks are assigned
/// 1..n per owner with no gaps. Owners appear in first-seen input order,
/// so identical input always yields identical output.
pub fn rank_tasks(
    tasks: &[Task],
    excluded: &ExcludedStatuses,
    scorer: &dyn ScoreStrategy,
) -> Vec<RankedTask> {
    let mut owners: Vec<&str> = Vec::new();
    let mut by_owner: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, task) in tasks.iter().enumerate() {
        if !task.is_eligible(excluded) {
            continue;
        }
        let owner = task.owner.as_str();
        by_owner
            .entry(owner)
            .or_insert_with(|| {
                owners.push(owner);
                Vec::new()
            })
            .push(index);
    }

    // Hierarchy is built over the full input, matching how parent
    // references are recorded upstream.
    let children = build_hierarchy(tasks);
    let is_direct_parent = |a: &Task, b: &Task| {
        children
            .get(&a.id)
            .is_some_and(|kids| kids.contains(&&b.id))
    };

    let mut ranked = Vec::new();
    for owner in owners {
        let indices = &by_owner[owner];
        debug!(owner, count = indices.len(), "ranking owner queue");

        let mut scored: Vec<(usize, f64)> = indices
            .iter()
            .map(|&i| (i, scorer.score(&tasks[i])))
            .collect();

        scored.sort_by(|&(ia, sa), &(ib, sb)| match sb.total_cmp(&sa) {
            Ordering::Equal => {
                let a = &tasks[ia];
                let b = &tasks[ib];
                if is_direct_parent(a, b) {
                    Ordering::Less
                } else if is_direct_parent(b, a) {
                    Ordering::Greater
                } else {
                    ia.cmp(&ib)
                }
            }
            order => order,
        });

        for (position, (index, score)) in scored.into_iter().enumerate() {
            ranked.push(RankedTask {
                task: tasks[index].clone(),
                queue_rank: (position + 1) as u32,
                queue_score: score,
            });
        }
    }

    ranked
}
