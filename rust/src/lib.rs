//! Portfolio planning core: hierarchy durations, task compilation, capacity
//! constrained scheduling, manual overrides, utilization, and the interactive
//! drag and rebalance solvers.
//!
//! Everything here is a pure function of a [`PlanSnapshot`]; [`PlanState`]
//! wraps that with edit histories and a drag preview.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod calendar;
pub mod compiler;
mod config;
pub mod drag;
pub mod edits;
pub mod hierarchy;
pub mod interner;
pub mod logging;
mod models;
pub mod normalize;
pub mod repository;
pub mod scheduler;
pub mod sorting;
pub mod state;
pub mod utilization;

#[cfg(feature = "python")]
mod python;

pub use calendar::PlanCalendar;
pub use compiler::compile_tasks;
pub use config::SchedulerConfig;
pub use drag::{solve_drag, DragConflict, DragResolution};
pub use edits::EditError;
pub use hierarchy::derived_project_durations;
pub use models::{
    Capacities, ItemId, LineItem, Override, Overrides, PlanSnapshot, Requirements, ScheduledTask,
    Task, MAX_MONTHS,
};
pub use normalize::{normalize_snapshot, snapshot_from_json, snapshot_from_value};
pub use repository::{InMemoryRepository, RepositoryError, SnapshotRepository};
pub use scheduler::{apply_overrides, base_schedule, rebalance, Placement, Placements};
pub use state::PlanState;
pub use utilization::{aggregate_utilization, Utilization};

/// Everything derived from one snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanView {
    /// Final schedule, one entry per task in compiled order.
    pub schedule: Vec<ScheduledTask>,
    /// Placements the base scheduler chose before overrides.
    pub base: Placements,
    pub utilization: Utilization,
    /// Derived duration of every project that owns phases.
    pub project_durations: BTreeMap<ItemId, f64>,
}

impl PlanView {
    pub fn scheduled(&self, id: ItemId) -> Option<&ScheduledTask> {
        self.schedule.iter().find(|s| s.id() == id)
    }
}

/// Run the derived pipeline over a snapshot using its own overrides.
pub fn compute_plan(snapshot: &PlanSnapshot, config: &SchedulerConfig) -> PlanView {
    compute_plan_with(snapshot, &snapshot.scheduler_overrides, config)
}

/// Run the derived pipeline with a substitute override set (e.g. a drag preview).
pub fn compute_plan_with(
    snapshot: &PlanSnapshot,
    overrides: &Overrides,
    config: &SchedulerConfig,
) -> PlanView {
    let tasks = compile_tasks(&snapshot.line_items, config);
    let base = base_schedule(&tasks, &snapshot.team_capacities, config);
    let schedule = apply_overrides(&tasks, &base, overrides);
    let utilization = aggregate_utilization(
        &schedule,
        &snapshot.disciplines,
        &snapshot.team_capacities,
        config,
    );

    PlanView {
        schedule,
        base,
        utilization,
        project_durations: derived_project_durations(&snapshot.line_items),
    }
}

/// Resolve a drag of `item_id` against the snapshot's current final schedule.
pub fn drag_plan(
    snapshot: &PlanSnapshot,
    item_id: ItemId,
    proposed_start: i64,
    config: &SchedulerConfig,
) -> DragResolution {
    let view = compute_plan(snapshot, config);
    solve_drag(
        &view.schedule,
        &snapshot.scheduler_overrides,
        item_id,
        proposed_start,
        config,
    )
}

/// Recompute every unfrozen task around the snapshot's frozen pins.
pub fn rebalance_plan(snapshot: &PlanSnapshot, config: &SchedulerConfig) -> Overrides {
    let tasks = compile_tasks(&snapshot.line_items, config);
    rebalance(
        &tasks,
        &snapshot.team_capacities,
        &snapshot.scheduler_overrides,
        config,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(items: Vec<LineItem>, capacities: &[(&str, f64)]) -> PlanSnapshot {
        PlanSnapshot {
            line_items: items,
            disciplines: capacities.iter().map(|(n, _)| n.to_string()).collect(),
            team_capacities: capacities.iter().map(|(n, c)| (n.to_string(), *c)).collect(),
            scheduler_overrides: Overrides::new(),
        }
    }

    fn span(view: &PlanView, id: ItemId) -> (i64, i64) {
        let s = view.scheduled(id).unwrap();
        (s.start_month, s.end_month)
    }

    #[test]
    fn test_scenario_capacity_contention() {
        let plan = snapshot(
            vec![
                LineItem::new(1, "A").with_priority(2.0).with_duration(3.0).with_requirement("X", 1.0),
                LineItem::new(2, "B").with_priority(1.0).with_duration(2.0).with_requirement("X", 1.0),
            ],
            &[("X", 1.0)],
        );
        let view = compute_plan(&plan, &SchedulerConfig::default());
        assert_eq!(span(&view, 1), (0, 3));
        assert_eq!(span(&view, 2), (3, 5));
        assert_eq!(view.utilization.by_discipline["X"][0..5], [100.0; 5]);
    }

    #[test]
    fn test_scenario_phases_and_derived_duration() {
        let plan = snapshot(
            vec![
                LineItem::new(1, "P").with_priority(1.0),
                LineItem::new(2, "P1").with_parent(1).with_duration(2.0),
                LineItem::new(3, "P2").with_parent(1).with_duration(3.0).with_dependencies(vec![2]),
            ],
            &[],
        );
        let view = compute_plan(&plan, &SchedulerConfig::default());
        assert_eq!(span(&view, 2), (0, 2));
        assert_eq!(span(&view, 3), (2, 5));
        assert_eq!(view.project_durations[&1], 5.0);
        assert!(view.scheduled(1).is_none());
    }

    #[test]
    fn test_scenario_rebalance_around_frozen() {
        let mut plan = snapshot(
            vec![
                LineItem::new(1, "frozen").with_priority(1.0).with_duration(2.0).with_requirement("X", 1.0),
                LineItem::new(2, "low").with_priority(0.0).with_duration(2.0).with_requirement("X", 1.0),
                LineItem::new(3, "filler").with_priority(2.0).with_duration(5.0).with_requirement("X", 1.0),
            ],
            &[("X", 1.0)],
        );
        plan.scheduler_overrides.insert(1, Override::frozen(5));
        let config = SchedulerConfig::default();

        plan.scheduler_overrides = rebalance_plan(&plan, &config);
        let view = compute_plan(&plan, &config);
        assert_eq!(span(&view, 1), (5, 7));
        assert_eq!(span(&view, 2), (7, 9));
        assert!(view.utilization.overbooked_months("X").is_empty());
    }

    #[test]
    fn test_scenario_drag_pushes_dependent() {
        let plan = snapshot(
            vec![
                LineItem::new(1, "A").with_duration(2.0),
                LineItem::new(2, "B").with_duration(2.0).with_dependencies(vec![1]),
            ],
            &[],
        );
        let config = SchedulerConfig::default();
        let resolution = drag_plan(&plan, 1, 4, &config);
        assert_eq!(resolution.overrides[&1], Override::frozen(4));
        assert_eq!(resolution.overrides[&2], Override::frozen(6));
    }

    #[test]
    fn test_scenario_drag_blocked_by_frozen_wall() {
        let mut plan = snapshot(
            vec![
                LineItem::new(1, "A").with_duration(2.0),
                LineItem::new(2, "B").with_duration(2.0).with_dependencies(vec![1]),
            ],
            &[],
        );
        plan.scheduler_overrides.insert(2, Override::frozen(2));
        let config = SchedulerConfig::default();

        let resolution = drag_plan(&plan, 1, 4, &config);
        assert_eq!(resolution.start_month, 0);
        assert!(resolution.is_noop());
        assert_eq!(resolution.overrides[&2], Override::frozen(2));
    }

    #[test]
    fn test_preview_overrides_shadow_snapshot() {
        let plan = snapshot(vec![LineItem::new(1, "A").with_duration(1.0)], &[]);
        let preview = Overrides::from([(1, Override::frozen(9))]);
        let view = compute_plan_with(&plan, &preview, &SchedulerConfig::default());
        assert_eq!(span(&view, 1), (9, 10));
        assert!(plan.scheduler_overrides.is_empty());
    }

    #[test]
    fn test_extreme_stored_values_still_schedule() {
        let plan = snapshot_from_json(
            r#"{
                "disciplines": ["X"],
                "teamCapacities": {"X": 1},
                "lineItems": [
                    {"id": 1, "durationMonths": 2},
                    {"id": 2, "durationMonths": 1e10}
                ],
                "schedulerOverrides": {"1": {"startMonth": 1e30, "frozen": true}}
            }"#,
        )
        .unwrap();
        let config = SchedulerConfig::default();
        let view = compute_plan(&plan, &config);
        assert_eq!(span(&view, 1), (MAX_MONTHS, MAX_MONTHS + 2));
        assert_eq!(span(&view, 2), (0, MAX_MONTHS));
        let horizon = MAX_MONTHS + 2 + config.horizon_padding_months;
        assert_eq!(view.utilization.horizon_months, horizon);
        assert_eq!(view.utilization.by_discipline["X"].len() as i64, horizon);
    }

    #[test]
    fn test_identical_input_gives_identical_bytes() {
        let plan = snapshot(
            vec![
                LineItem::new(1, "P").with_priority(1.0),
                LineItem::new(2, "P1").with_parent(1).with_duration(2.5).with_requirement("X", 0.5),
                LineItem::new(3, "Q").with_priority(1.0).with_duration(4.0).with_requirement("X", 0.75),
                LineItem::new(4, "R").with_duration(1.0).with_dependencies(vec![1, 3]),
            ],
            &[("X", 1.0), ("Y", 0.0)],
        );
        let config = SchedulerConfig::default();
        let first = serde_json::to_string(&compute_plan(&plan, &config)).unwrap();
        let second = serde_json::to_string(&compute_plan(&plan.clone(), &config)).unwrap();
        assert_eq!(first, second);
    }
}
