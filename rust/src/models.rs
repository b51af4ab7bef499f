//! Core data types for the portfolio planner.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Note: We use BTreeMap for everything that is serialized or iterated into a
// result so that identical inputs always produce byte-identical outputs.

/// Identifier of a line item (project or phase). Always positive.
pub type ItemId = u64;

/// Discipline name -> FTE required per month.
pub type Requirements = BTreeMap<String, f64>;

/// Discipline name -> FTE available per month.
pub type Capacities = BTreeMap<String, f64>;

/// Task id -> manual pin.
pub type Overrides = BTreeMap<ItemId, Override>;

/// Upper bound on any start month or task duration (100 years).
///
/// Inputs beyond it are clamped so month arithmetic and per-month ledgers
/// stay finite.
pub const MAX_MONTHS: i64 = 1200;

/// A project (no parent) or one of its phases (parent is the owning project).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<ItemId>,
    #[serde(default)]
    pub dependency_ids: Vec<ItemId>,
    /// Only meaningful on projects.
    #[serde(default)]
    pub priority: Option<f64>,
    /// Authored for phases and standalone projects. Derived for projects with phases.
    #[serde(default)]
    pub duration_months: Option<f64>,
    #[serde(default)]
    pub requirements: Requirements,
}

impl LineItem {
    /// Create a top-level item with no duration, dependencies or requirements.
    pub fn new(id: ItemId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id: None,
            dependency_ids: Vec::new(),
            priority: None,
            duration_months: None,
            requirements: Requirements::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: ItemId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_duration(mut self, months: f64) -> Self {
        self.duration_months = Some(months);
        self
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_dependencies(mut self, ids: impl IntoIterator<Item = ItemId>) -> Self {
        self.dependency_ids = ids.into_iter().collect();
        self
    }

    pub fn with_requirement(mut self, discipline: impl Into<String>, fte: f64) -> Self {
        self.requirements.insert(discipline.into(), fte);
        self
    }

    /// True for top-level items.
    pub fn is_project(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A manual pin of a task's start month.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Override {
    pub start_month: i64,
    /// Frozen pins are walls for the drag solver and fixed points for rebalance.
    #[serde(default)]
    pub frozen: bool,
}

impl Override {
    pub fn frozen(start_month: i64) -> Self {
        Self {
            start_month,
            frozen: true,
        }
    }

    pub fn soft(start_month: i64) -> Self {
        Self {
            start_month,
            frozen: false,
        }
    }
}

/// The atomic schedulable unit: a phase, or a project without phases.
///
/// Derived from line items on every read, never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: ItemId,
    pub name: String,
    /// Owning project for phases, `None` for standalone projects.
    pub project_id: Option<ItemId>,
    pub priority: f64,
    /// Whole months, at least 1.
    pub duration: i64,
    pub dependency_ids: Vec<ItemId>,
    pub requirements: Requirements,
    /// Collision-free tie-break key.
    pub order: u64,
}

impl Task {
    /// Disciplines this task actually draws on (positive FTE only).
    pub fn demand(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.requirements
            .iter()
            .filter(|(_, fte)| **fte > 0.0)
            .map(|(name, fte)| (name.as_str(), *fte))
    }
}

/// A task with its final placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTask {
    #[serde(flatten)]
    pub task: Task,
    pub start_month: i64,
    /// Always `start_month + duration`.
    pub end_month: i64,
    pub frozen: bool,
}

impl ScheduledTask {
    pub fn new(task: Task, start_month: i64, frozen: bool) -> Self {
        let end_month = start_month.saturating_add(task.duration);
        Self {
            task,
            start_month,
            end_month,
            frozen,
        }
    }

    pub fn id(&self) -> ItemId {
        self.task.id
    }

    pub fn duration(&self) -> i64 {
        self.task.duration
    }
}

/// Everything the planner persists and consumes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSnapshot {
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub disciplines: Vec<String>,
    #[serde(default)]
    pub team_capacities: Capacities,
    #[serde(default)]
    pub scheduler_overrides: Overrides,
}

impl PlanSnapshot {
    /// Look up a line item by id.
    pub fn item(&self, id: ItemId) -> Option<&LineItem> {
        self.line_items.iter().find(|item| item.id == id)
    }

    /// Phases owned by `project_id`, in authored order.
    pub fn phases_of(&self, project_id: ItemId) -> impl Iterator<Item = &LineItem> + '_ {
        self.line_items
            .iter()
            .filter(move |item| item.parent_id == Some(project_id))
    }

    /// True if `id` is a project that owns at least one phase.
    pub fn has_phases(&self, id: ItemId) -> bool {
        self.phases_of(id).next().is_some()
    }

    /// Smallest id larger than every id in use.
    pub fn next_id(&self) -> ItemId {
        self.line_items.iter().map(|item| item.id).max().unwrap_or(0) + 1
    }

    /// Capacity of a discipline, 0 when the capacity table has no entry.
    pub fn capacity(&self, discipline: &str) -> f64 {
        self.team_capacities.get(discipline).copied().unwrap_or(0.0)
    }
}
