//! Placement order for the list scheduler.
//!
//! Tasks are placed highest priority first; `Task::order` breaks ties. Because
//! `order` is unique per task the resulting order is total.

use std::cmp::Ordering;

use crate::models::Task;

/// Sort key for task placement (lower = placed earlier).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SortKey {
    pub neg_priority: f64,
    pub order: u64,
}

impl SortKey {
    pub fn for_task(task: &Task) -> Self {
        Self {
            neg_priority: -task.priority,
            order: task.order,
        }
    }
}

/// Compare f64 values for sorting, treating incomparable values as equal.
fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

impl Eq for SortKey {}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_f64(self.neg_priority, other.neg_priority).then(self.order.cmp(&other.order))
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Indices into `tasks` in placement order.
pub fn placement_order(tasks: &[Task]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..tasks.len()).collect();
    indices.sort_by_key(|&i| SortKey::for_task(&tasks[i]));
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Requirements;

    fn make_task(id: u64, priority: f64, order: u64) -> Task {
        Task {
            id,
            name: format!("t{}", id),
            project_id: None,
            priority,
            duration: 1,
            dependency_ids: vec![],
            requirements: Requirements::new(),
            order,
        }
    }

    #[test]
    fn test_priority_descending() {
        let tasks = vec![make_task(1, 1.0, 0), make_task(2, 5.0, 1000), make_task(3, 3.0, 2000)];
        let order: Vec<u64> = placement_order(&tasks).iter().map(|&i| tasks[i].id).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn test_order_breaks_ties() {
        let tasks = vec![make_task(1, 2.0, 2001), make_task(2, 2.0, 2000), make_task(3, 2.0, 0)];
        let order: Vec<u64> = placement_order(&tasks).iter().map(|&i| tasks[i].id).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }
}
