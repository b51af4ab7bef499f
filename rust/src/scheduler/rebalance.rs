//! Batch recomputation around frozen pins.

use rustc_hash::FxHashMap;

use crate::config::SchedulerConfig;
use crate::log_changes;
use crate::models::{Capacities, ItemId, Override, Overrides, Task};

use super::core::ListScheduler;
use super::overrides::pinned_start;

/// Hold every frozen task where it is and re-pack everything else.
///
/// Returns a complete override set: frozen tasks keep `frozen = true` at their
/// pinned month, every other task gets a soft pin (`frozen = false`) at its
/// newly computed month so a later rebalance may still move it. Overrides for
/// ids that are no longer tasks are dropped.
pub fn rebalance(
    tasks: &[Task],
    capacities: &Capacities,
    overrides: &Overrides,
    config: &SchedulerConfig,
) -> Overrides {
    let pinned: FxHashMap<ItemId, i64> = tasks
        .iter()
        .filter_map(|task| {
            overrides
                .get(&task.id)
                .filter(|pin| pin.frozen)
                .map(|pin| (task.id, pinned_start(pin)))
        })
        .collect();

    let placements = ListScheduler::new(tasks, capacities, config).schedule(&pinned);

    let result: Overrides = tasks
        .iter()
        .filter_map(|task| {
            let placement = placements.get(&task.id)?;
            let pin = if pinned.contains_key(&task.id) {
                Override::frozen(placement.start_month)
            } else {
                Override::soft(placement.start_month)
            };
            Some((task.id, pin))
        })
        .collect();

    log_changes!(
        config.verbosity,
        "Rebalanced {} tasks around {} frozen",
        result.len(),
        pinned.len()
    );
    result
}
