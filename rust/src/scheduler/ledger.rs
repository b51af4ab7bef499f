//! Per-discipline, per-month committed usage.

use crate::interner::{DisciplineId, DisciplineTable};
use crate::models::{Capacities, Task};

/// Tracks how many FTE of each discipline are committed in each month.
///
/// Rows grow on demand, so months past the last commit read as zero usage.
#[derive(Clone, Debug)]
pub struct UsageLedger {
    disciplines: DisciplineTable,
    /// usage[discipline][month]
    usage: Vec<Vec<f64>>,
    epsilon: f64,
}

/// A task's demand resolved to ledger rows.
pub type Demand = Vec<(DisciplineId, f64)>;

impl UsageLedger {
    /// Create an empty ledger for the given capacity table.
    pub fn new(capacities: &Capacities, epsilon: f64) -> Self {
        let disciplines = DisciplineTable::from_capacities(capacities);
        let usage = vec![Vec::new(); disciplines.len()];
        Self {
            disciplines,
            usage,
            epsilon,
        }
    }

    /// Row for a discipline, creating a zero-capacity row for unknown names.
    fn row(&mut self, name: &str) -> DisciplineId {
        let id = self.disciplines.row(name);
        if id as usize >= self.usage.len() {
            self.usage.push(Vec::new());
        }
        id
    }

    /// Resolve a task's positive requirements to ledger rows.
    pub fn demand(&mut self, task: &Task) -> Demand {
        task.demand()
            .map(|(name, fte)| (self.row(name), fte))
            .collect()
    }

    pub fn capacity(&self, discipline: &str) -> f64 {
        self.disciplines.capacity(discipline)
    }

    /// Committed usage of a discipline in a month.
    pub fn usage(&self, discipline: &str, month: i64) -> f64 {
        match self.disciplines.get(discipline) {
            Some(id) => self.usage_at(id, month),
            None => 0.0,
        }
    }

    fn usage_at(&self, id: DisciplineId, month: i64) -> f64 {
        if month < 0 {
            return 0.0;
        }
        self.usage[id as usize]
            .get(month as usize)
            .copied()
            .unwrap_or(0.0)
    }

    /// True if `demand` fits on top of committed usage for every month in
    /// `[start, start + duration)`. A discipline with capacity <= 0 never fits.
    pub fn fits(&self, demand: &Demand, start: i64, duration: i64) -> bool {
        for &(id, fte) in demand {
            let capacity = self.disciplines.capacity_of(id);
            if capacity <= 0.0 {
                return false;
            }
            for month in start..start + duration {
                if self.usage_at(id, month) + fte > capacity + self.epsilon {
                    return false;
                }
            }
        }
        true
    }

    /// Earliest month in `[earliest, earliest + probe_limit]` where `demand` fits.
    ///
    /// Returns `(month, true)` on success, or `(earliest + probe_limit, false)`
    /// when nothing fits within the probe window.
    pub fn first_fit(
        &self,
        demand: &Demand,
        earliest: i64,
        duration: i64,
        probe_limit: i64,
    ) -> (i64, bool) {
        for month in earliest..=earliest + probe_limit {
            if self.fits(demand, month, duration) {
                return (month, true);
            }
        }
        (earliest + probe_limit, false)
    }

    /// Add `demand` to every month in `[start, start + duration)` unconditionally.
    pub fn commit(&mut self, demand: &Demand, start: i64, duration: i64) {
        if duration <= 0 {
            return;
        }
        let start = start.max(0) as usize;
        let end = start + duration as usize;
        for &(id, fte) in demand {
            let row = &mut self.usage[id as usize];
            if row.len() < end {
                row.resize(end, 0.0);
            }
            for slot in &mut row[start..end] {
                *slot += fte;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Requirements;

    fn task_needing(reqs: &[(&str, f64)]) -> Task {
        Task {
            id: 1,
            name: "t".to_string(),
            project_id: None,
            priority: 0.0,
            duration: 2,
            dependency_ids: vec![],
            requirements: reqs
                .iter()
                .map(|(name, fte)| (name.to_string(), *fte))
                .collect::<Requirements>(),
            order: 0,
        }
    }

    fn capacities(entries: &[(&str, f64)]) -> Capacities {
        entries.iter().map(|(n, c)| (n.to_string(), *c)).collect()
    }

    #[test]
    fn test_empty_ledger_fits() {
        let mut ledger = UsageLedger::new(&capacities(&[("x", 1.0)]), 1e-9);
        let demand = ledger.demand(&task_needing(&[("x", 1.0)]));
        assert!(ledger.fits(&demand, 0, 12));
    }

    #[test]
    fn test_commit_blocks_overlap() {
        let mut ledger = UsageLedger::new(&capacities(&[("x", 1.0)]), 1e-9);
        let demand = ledger.demand(&task_needing(&[("x", 1.0)]));
        ledger.commit(&demand, 0, 2);
        assert!(!ledger.fits(&demand, 1, 2));
        assert!(ledger.fits(&demand, 2, 2));
        assert_eq!(ledger.usage("x", 1), 1.0);
        assert_eq!(ledger.usage("x", 2), 0.0);
    }

    #[test]
    fn test_epsilon_tolerance() {
        let mut ledger = UsageLedger::new(&capacities(&[("x", 0.3)]), 1e-9);
        let demand = ledger.demand(&task_needing(&[("x", 0.1)]));
        ledger.commit(&demand, 0, 1);
        ledger.commit(&demand, 0, 1);
        // 0.1 + 0.1 + 0.1 exceeds 0.3 by float error only
        assert!(ledger.fits(&demand, 0, 1));
    }

    #[test]
    fn test_zero_capacity_never_fits() {
        let mut ledger = UsageLedger::new(&capacities(&[("x", 0.0)]), 1e-9);
        let demand = ledger.demand(&task_needing(&[("x", 0.5)]));
        assert!(!ledger.fits(&demand, 0, 1));
    }

    #[test]
    fn test_unknown_discipline_has_zero_capacity() {
        let mut ledger = UsageLedger::new(&capacities(&[("x", 4.0)]), 1e-9);
        let demand = ledger.demand(&task_needing(&[("ghost", 0.5)]));
        assert_eq!(ledger.capacity("ghost"), 0.0);
        assert!(!ledger.fits(&demand, 0, 1));
    }

    #[test]
    fn test_first_fit_cap() {
        let mut ledger = UsageLedger::new(&capacities(&[("x", 1.0)]), 1e-9);
        let demand = ledger.demand(&task_needing(&[("x", 2.0)]));
        assert_eq!(ledger.first_fit(&demand, 3, 1, 240), (243, false));
    }

    #[test]
    fn test_first_fit_skips_busy_months() {
        let mut ledger = UsageLedger::new(&capacities(&[("x", 1.0)]), 1e-9);
        let demand = ledger.demand(&task_needing(&[("x", 1.0)]));
        ledger.commit(&demand, 1, 2);
        assert_eq!(ledger.first_fit(&demand, 0, 2, 240), (3, true));
        assert_eq!(ledger.first_fit(&demand, 0, 1, 240), (0, true));
    }
}
