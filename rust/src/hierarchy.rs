//! Project duration derived from the critical path through its phases.
//!
//! Only edges between two phases of the same project count here; cross-project
//! dependencies are the scheduler's business.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;

use crate::models::{ItemId, LineItem};

/// Authored duration of an item, treating missing or malformed values as 0.
pub fn authored_duration(item: &LineItem) -> f64 {
    match item.duration_months {
        Some(d) if d.is_finite() && d > 0.0 => d,
        _ => 0.0,
    }
}

/// Memoized longest-path evaluation over one project's phase subgraph.
struct PhaseGraph<'a> {
    phases: FxHashMap<ItemId, &'a LineItem>,
    finish: FxHashMap<ItemId, f64>,
    on_path: FxHashSet<ItemId>,
}

impl<'a> PhaseGraph<'a> {
    fn new(items: &'a [LineItem], project_id: ItemId) -> Self {
        let phases: FxHashMap<ItemId, &LineItem> = items
            .iter()
            .filter(|item| item.parent_id == Some(project_id))
            .map(|item| (item.id, item))
            .collect();
        Self {
            finish: FxHashMap::with_capacity_and_hasher(phases.len(), Default::default()),
            on_path: FxHashSet::default(),
            phases,
        }
    }

    /// finish(p) = duration(p) + max(0, finish(dep) for intra-project deps).
    ///
    /// A phase reached again while still on the active path contributes only its
    /// own duration, which cuts any cycle at a deterministic point.
    fn finish(&mut self, id: ItemId) -> f64 {
        if let Some(&cached) = self.finish.get(&id) {
            return cached;
        }
        let phase = match self.phases.get(&id) {
            Some(p) => *p,
            None => return 0.0,
        };
        let own = authored_duration(phase);
        if self.on_path.contains(&id) {
            return own;
        }

        self.on_path.insert(id);
        let mut longest_dep = 0.0_f64;
        for dep_id in &phase.dependency_ids {
            if !self.phases.contains_key(dep_id) {
                continue;
            }
            longest_dep = longest_dep.max(self.finish(*dep_id));
        }
        self.on_path.remove(&id);

        let value = own + longest_dep;
        self.finish.insert(id, value);
        value
    }
}

/// Duration of a project: the longest finish over its phases, or 0 without phases.
pub fn project_duration(items: &[LineItem], project_id: ItemId) -> f64 {
    let mut graph = PhaseGraph::new(items, project_id);
    // Walk phases in authored order so cycle cut points are stable.
    let ids: Vec<ItemId> = items
        .iter()
        .filter(|item| item.parent_id == Some(project_id))
        .map(|item| item.id)
        .collect();

    ids.into_iter()
        .map(|id| graph.finish(id))
        .fold(0.0, f64::max)
}

/// Derived duration of every project that owns phases.
pub fn derived_project_durations(items: &[LineItem]) -> BTreeMap<ItemId, f64> {
    let parents: FxHashSet<ItemId> = items.iter().filter_map(|item| item.parent_id).collect();
    items
        .iter()
        .filter(|item| item.is_project() && parents.contains(&item.id))
        .map(|item| (item.id, project_duration(items, item.id)))
        .collect()
}

/// Duration shown for an item: derived for projects with phases, authored otherwise.
pub fn effective_duration(items: &[LineItem], item: &LineItem) -> f64 {
    let owns_phases = item.is_project() && items.iter().any(|i| i.parent_id == Some(item.id));
    if owns_phases {
        project_duration(items, item.id)
    } else {
        authored_duration(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(id: ItemId, parent: ItemId, duration: f64, deps: Vec<ItemId>) -> LineItem {
        LineItem::new(id, format!("phase {}", id))
            .with_parent(parent)
            .with_duration(duration)
            .with_dependencies(deps)
    }

    #[test]
    fn test_project_without_phases() {
        let items = vec![LineItem::new(1, "solo").with_duration(4.0)];
        assert_eq!(project_duration(&items, 1), 0.0);
        assert_eq!(effective_duration(&items, &items[0]), 4.0);
    }

    #[test]
    fn test_parallel_phases_take_max() {
        let items = vec![
            LineItem::new(1, "p"),
            phase(2, 1, 3.0, vec![]),
            phase(3, 1, 5.0, vec![]),
        ];
        assert_eq!(project_duration(&items, 1), 5.0);
    }

    #[test]
    fn test_chain_sums_durations() {
        let items = vec![
            LineItem::new(1, "p"),
            phase(2, 1, 2.0, vec![]),
            phase(3, 1, 3.0, vec![2]),
            phase(4, 1, 1.0, vec![3]),
        ];
        assert_eq!(project_duration(&items, 1), 6.0);
    }

    #[test]
    fn test_diamond_uses_longest_branch() {
        let items = vec![
            LineItem::new(1, "p"),
            phase(2, 1, 1.0, vec![]),
            phase(3, 1, 4.0, vec![2]),
            phase(4, 1, 2.0, vec![2]),
            phase(5, 1, 1.0, vec![3, 4]),
        ];
        assert_eq!(project_duration(&items, 1), 6.0);
    }

    #[test]
    fn test_cross_project_edges_ignored() {
        let items = vec![
            LineItem::new(1, "p"),
            LineItem::new(10, "other").with_duration(50.0),
            phase(2, 1, 2.0, vec![10]),
        ];
        assert_eq!(project_duration(&items, 1), 2.0);
    }

    #[test]
    fn test_self_reference_is_finite() {
        let items = vec![LineItem::new(1, "p"), phase(2, 1, 3.0, vec![2])];
        let duration = project_duration(&items, 1);
        assert!(duration.is_finite());
        assert_eq!(duration, 6.0);
    }

    #[test]
    fn test_two_cycle_is_finite_and_deterministic() {
        let items = vec![
            LineItem::new(1, "p"),
            phase(2, 1, 2.0, vec![3]),
            phase(3, 1, 3.0, vec![2]),
        ];
        let first = project_duration(&items, 1);
        let second = project_duration(&items, 1);
        assert!(first.is_finite());
        assert_eq!(first, second);
        // 2 -> 3 -> (2 on path: 2) = 2 + 3 + 2
        assert_eq!(first, 7.0);
    }

    #[test]
    fn test_derived_durations_only_for_projects_with_phases() {
        let items = vec![
            LineItem::new(1, "p").with_duration(99.0),
            phase(2, 1, 2.0, vec![]),
            LineItem::new(3, "solo").with_duration(4.0),
        ];
        let derived = derived_project_durations(&items);
        assert_eq!(derived.len(), 1);
        assert_eq!(derived.get(&1), Some(&2.0));
        assert_eq!(effective_duration(&items, &items[0]), 2.0);
    }
}
