//! Dense indexing of disciplines.
//!
//! The usage ledger probes capacity once per month per discipline per
//! candidate start, so disciplines are resolved to `u32` rows up front and
//! capacities are held in a parallel `Vec`.

use rustc_hash::FxHashMap;

use crate::models::Capacities;

/// Row index of a discipline inside a [`DisciplineTable`].
pub type DisciplineId = u32;

/// Discipline names and their monthly capacities, indexed by [`DisciplineId`].
#[derive(Debug, Clone, Default)]
pub struct DisciplineTable {
    rows: FxHashMap<String, DisciplineId>,
    names: Vec<String>,
    capacities: Vec<f64>,
}

impl DisciplineTable {
    /// One row per capacity-table entry, in the table's (sorted) order.
    pub fn from_capacities(capacities: &Capacities) -> Self {
        let mut table = Self {
            rows: FxHashMap::with_capacity_and_hasher(capacities.len(), Default::default()),
            names: Vec::with_capacity(capacities.len()),
            capacities: Vec::with_capacity(capacities.len()),
        };
        for (name, capacity) in capacities {
            let id = table.row(name);
            table.capacities[id as usize] = *capacity;
        }
        table
    }

    /// Row for `name`. A discipline not in the capacity table gets a new row
    /// with capacity 0, so tasks requiring it never fit.
    pub fn row(&mut self, name: &str) -> DisciplineId {
        if let Some(&id) = self.rows.get(name) {
            return id;
        }
        let id = self.names.len() as DisciplineId;
        self.names.push(name.to_string());
        self.capacities.push(0.0);
        self.rows.insert(name.to_string(), id);
        id
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<DisciplineId> {
        self.rows.get(name).copied()
    }

    #[inline]
    pub fn name(&self, id: DisciplineId) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    #[inline]
    pub fn capacity_of(&self, id: DisciplineId) -> f64 {
        self.capacities.get(id as usize).copied().unwrap_or(0.0)
    }

    /// Capacity by name; 0 for unknown disciplines.
    pub fn capacity(&self, name: &str) -> f64 {
        self.get(name).map(|id| self.capacity_of(id)).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
