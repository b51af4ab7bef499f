//! Per-discipline, per-month load derived from the final schedule.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::SchedulerConfig;
use crate::models::{Capacities, ScheduledTask};
use crate::scheduler::UsageLedger;

/// Load percentages for every discipline over a common horizon.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utilization {
    /// Number of months covered by every series.
    pub horizon_months: i64,
    /// Discipline -> percentage per month (index = month).
    pub by_discipline: BTreeMap<String, Vec<f64>>,
}

impl Utilization {
    /// Months where a discipline is booked beyond its capacity.
    pub fn overbooked_months(&self, discipline: &str) -> Vec<i64> {
        self.by_discipline
            .get(discipline)
            .map(|series| {
                series
                    .iter()
                    .enumerate()
                    .filter(|(_, pct)| **pct > 100.0 + 1e-6)
                    .map(|(month, _)| month as i64)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Horizon for the histograms: max(min_horizon, last end + padding).
pub fn horizon_months(schedule: &[ScheduledTask], config: &SchedulerConfig) -> i64 {
    let last_end = schedule.iter().map(|t| t.end_month).max().unwrap_or(0);
    config
        .min_horizon_months
        .max(last_end + config.horizon_padding_months)
}

/// usage / capacity * 100, or 100/0 for a discipline without capacity.
fn percentage(usage: f64, capacity: f64) -> f64 {
    if capacity > 0.0 {
        usage / capacity * 100.0
    } else if usage > 0.0 {
        100.0
    } else {
        0.0
    }
}

/// Aggregate the final schedule into load percentages for each listed discipline.
pub fn aggregate_utilization(
    schedule: &[ScheduledTask],
    disciplines: &[String],
    capacities: &Capacities,
    config: &SchedulerConfig,
) -> Utilization {
    let mut ledger = UsageLedger::new(capacities, config.capacity_epsilon);
    for scheduled in schedule {
        let demand = ledger.demand(&scheduled.task);
        ledger.commit(&demand, scheduled.start_month, scheduled.duration());
    }

    let horizon = horizon_months(schedule, config);
    let by_discipline = disciplines
        .iter()
        .map(|name| {
            let capacity = capacities.get(name).copied().unwrap_or(0.0);
            let series = (0..horizon)
                .map(|month| percentage(ledger.usage(name, month), capacity))
                .collect();
            (name.clone(), series)
        })
        .collect();

    Utilization {
        horizon_months: horizon,
        by_discipline,
    }
}
