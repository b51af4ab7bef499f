//! Capacity- and dependency-aware greedy list scheduling.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::SchedulerConfig;
use crate::models::{Capacities, ItemId, Task, MAX_MONTHS};
use crate::sorting::placement_order;
use crate::{log_changes, log_checks, log_debug};

use super::ledger::UsageLedger;

/// Where the scheduler put a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub start_month: i64,
    pub end_month: i64,
}

impl Placement {
    pub fn new(start_month: i64, duration: i64) -> Self {
        Self {
            start_month,
            end_month: start_month.saturating_add(duration),
        }
    }
}

/// Task id -> placement, ordered by id.
pub type Placements = BTreeMap<ItemId, Placement>;

/// Greedy list scheduler with an optional pre-pinned subset.
///
/// Pinned tasks are committed first at their pinned months, whatever that does
/// to capacity. Every other task is then placed in priority order at the
/// earliest month that is no earlier than the end of its already-placed
/// dependencies and that fits in the remaining capacity.
pub struct ListScheduler<'a> {
    tasks: &'a [Task],
    config: &'a SchedulerConfig,
    ledger: UsageLedger,
    placements: Placements,
}

impl<'a> ListScheduler<'a> {
    pub fn new(tasks: &'a [Task], capacities: &Capacities, config: &'a SchedulerConfig) -> Self {
        Self {
            tasks,
            config,
            ledger: UsageLedger::new(capacities, config.capacity_epsilon),
            placements: Placements::new(),
        }
    }

    /// Run the scheduler. `pinned` maps task id -> fixed start month.
    pub fn schedule(mut self, pinned: &FxHashMap<ItemId, i64>) -> Placements {
        let verbosity = self.config.verbosity;

        // Phase 0: commit pinned tasks unconditionally (authored order)
        for task in self.tasks {
            let Some(&start) = pinned.get(&task.id) else {
                continue;
            };
            let start = start.clamp(0, MAX_MONTHS);
            let demand = self.ledger.demand(task);
            self.ledger.commit(&demand, start, task.duration);
            self.placements
                .insert(task.id, Placement::new(start, task.duration));
            log_debug!(verbosity, "  Pinned task {} at month {}", task.id, start);
        }

        // Phase 1: place everything else in priority order
        for idx in placement_order(self.tasks) {
            let task = &self.tasks[idx];
            if pinned.contains_key(&task.id) {
                continue;
            }

            // Dependencies not placed yet contribute nothing (forward-only).
            let earliest = task
                .dependency_ids
                .iter()
                .filter_map(|dep_id| self.placements.get(dep_id))
                .map(|p| p.end_month)
                .max()
                .unwrap_or(0)
                .max(0);

            let demand = self.ledger.demand(task);
            let (start, found) = self.ledger.first_fit(
                &demand,
                earliest,
                task.duration,
                self.config.probe_limit_months,
            );
            if !found {
                log_checks!(
                    verbosity,
                    "    No capacity for task {} within {} months of {}, placing at {}",
                    task.id,
                    self.config.probe_limit_months,
                    earliest,
                    start
                );
            }

            self.ledger.commit(&demand, start, task.duration);
            self.placements
                .insert(task.id, Placement::new(start, task.duration));
            log_changes!(
                verbosity,
                "  Scheduled task {} (priority={}) from month {} to {}",
                task.id,
                task.priority,
                start,
                start + task.duration
            );
        }

        self.placements
    }
}

/// Base schedule: list scheduling with nothing pinned.
pub fn base_schedule(
    tasks: &[Task],
    capacities: &Capacities,
    config: &SchedulerConfig,
) -> Placements {
    ListScheduler::new(tasks, capacities, config).schedule(&FxHashMap::default())
}
