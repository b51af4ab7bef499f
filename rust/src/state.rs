//! The single owner of mutable plan state.
//!
//! Holds the committed snapshot, two independent undo/redo histories
//! (structure and overrides) and an in-flight drag preview. Every edit goes
//! through a pure transition in [`crate::edits`] or the solvers; the derived
//! view is recomputed from scratch on demand.

use std::collections::VecDeque;

use crate::config::SchedulerConfig;
use crate::drag::{solve_drag, DragResolution};
use crate::edits::{self, EditError};
use crate::models::{ItemId, Override, Overrides, PlanSnapshot, ScheduledTask};
use crate::repository::{RepositoryError, SnapshotRepository};
use crate::{compute_plan, compute_plan_with, log_changes, log_debug, rebalance_plan, PlanView};

/// An in-flight drag.
#[derive(Clone, Debug)]
struct DragSession {
    item_id: ItemId,
    /// Committed final schedule at the moment the drag began.
    schedule: Vec<ScheduledTask>,
    last_proposed: Option<i64>,
    preview: Option<DragResolution>,
}

/// Plan snapshot plus edit histories.
#[derive(Clone, Debug)]
pub struct PlanState {
    snapshot: PlanSnapshot,
    config: SchedulerConfig,
    structure_undo: VecDeque<PlanSnapshot>,
    structure_redo: Vec<PlanSnapshot>,
    override_undo: Vec<Overrides>,
    override_redo: Vec<Overrides>,
    drag: Option<DragSession>,
}

/// Move `target`'s structure into place while keeping the current overrides.
///
/// Pins for ids that the target lacks are dropped; pins the target carries
/// for ids the current overrides lack (e.g. phases removed by a cascade
/// delete) come back.
fn swap_structure(current: &PlanSnapshot, target: PlanSnapshot) -> PlanSnapshot {
    let mut next = target;
    let mut overrides = current.scheduler_overrides.clone();
    for (id, pin) in &next.scheduler_overrides {
        overrides.entry(*id).or_insert(*pin);
    }
    overrides.retain(|id, _| next.item(*id).is_some());
    next.scheduler_overrides = overrides;
    next
}

impl PlanState {
    pub fn new(snapshot: PlanSnapshot, config: SchedulerConfig) -> Self {
        Self {
            snapshot,
            config,
            structure_undo: VecDeque::new(),
            structure_redo: Vec::new(),
            override_undo: Vec::new(),
            override_redo: Vec::new(),
            drag: None,
        }
    }

    /// Load from a repository, starting empty when nothing is stored.
    pub fn load(
        repository: &impl SnapshotRepository,
        config: SchedulerConfig,
    ) -> Result<Self, RepositoryError> {
        let snapshot = repository.get()?.unwrap_or_default();
        Ok(Self::new(snapshot, config))
    }

    /// Persist the committed snapshot. A drag preview is never saved.
    pub fn save(&self, repository: &mut impl SnapshotRepository) -> Result<(), RepositoryError> {
        repository.put(&self.snapshot)
    }

    pub fn snapshot(&self) -> &PlanSnapshot {
        &self.snapshot
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Derived view, with the drag preview (if any) shadowing committed overrides.
    pub fn view(&self) -> PlanView {
        match self.drag.as_ref().and_then(|d| d.preview.as_ref()) {
            Some(preview) => compute_plan_with(&self.snapshot, &preview.overrides, &self.config),
            None => compute_plan(&self.snapshot, &self.config),
        }
    }

    // ----- structural edits -----

    fn apply_structural(
        &mut self,
        edit: impl FnOnce(&PlanSnapshot) -> Result<PlanSnapshot, EditError>,
    ) -> Result<(), EditError> {
        let next = edit(&self.snapshot)?;
        if next == self.snapshot {
            return Ok(());
        }
        self.drag = None;
        let previous = std::mem::replace(&mut self.snapshot, next);
        self.structure_undo.push_back(previous);
        while self.structure_undo.len() > self.config.structural_history_limit {
            self.structure_undo.pop_front();
        }
        self.structure_redo.clear();
        Ok(())
    }

    pub fn add_item(&mut self, name: &str, parent_id: Option<ItemId>) -> Result<ItemId, EditError> {
        let (next, id) = edits::add_item(&self.snapshot, name, parent_id)?;
        self.apply_structural(|_| Ok(next))?;
        Ok(id)
    }

    pub fn rename_item(&mut self, id: ItemId, name: &str) -> Result<(), EditError> {
        self.apply_structural(|s| edits::rename_item(s, id, name))
    }

    pub fn set_duration(&mut self, id: ItemId, months: Option<f64>) -> Result<(), EditError> {
        self.apply_structural(|s| edits::set_duration(s, id, months))
    }

    pub fn set_priority(&mut self, id: ItemId, priority: Option<f64>) -> Result<(), EditError> {
        self.apply_structural(|s| edits::set_priority(s, id, priority))
    }

    pub fn set_requirement(&mut self, id: ItemId, discipline: &str, fte: f64) -> Result<(), EditError> {
        self.apply_structural(|s| edits::set_requirement(s, id, discipline, fte))
    }

    pub fn set_dependencies(&mut self, id: ItemId, dependency_ids: &[ItemId]) -> Result<(), EditError> {
        self.apply_structural(|s| edits::set_dependencies(s, id, dependency_ids))
    }

    pub fn reparent(&mut self, id: ItemId, parent_id: Option<ItemId>) -> Result<(), EditError> {
        self.apply_structural(|s| edits::reparent(s, id, parent_id))
    }

    pub fn delete_item(&mut self, id: ItemId) -> Result<(), EditError> {
        self.apply_structural(|s| edits::delete_item(s, id))
    }

    pub fn add_discipline(&mut self, name: &str) -> Result<(), EditError> {
        self.apply_structural(|s| edits::add_discipline(s, name))
    }

    pub fn rename_discipline(&mut self, from: &str, to: &str) -> Result<(), EditError> {
        self.apply_structural(|s| edits::rename_discipline(s, from, to))
    }

    pub fn remove_discipline(&mut self, name: &str) -> Result<(), EditError> {
        self.apply_structural(|s| edits::remove_discipline(s, name))
    }

    pub fn set_capacity(&mut self, name: &str, capacity: f64) -> Result<(), EditError> {
        self.apply_structural(|s| edits::set_capacity(s, name, capacity))
    }

    pub fn can_undo_structure(&self) -> bool {
        !self.structure_undo.is_empty()
    }

    pub fn can_redo_structure(&self) -> bool {
        !self.structure_redo.is_empty()
    }

    pub fn undo_structure(&mut self) -> bool {
        let Some(target) = self.structure_undo.pop_back() else {
            return false;
        };
        self.drag = None;
        let restored = swap_structure(&self.snapshot, target);
        let current = std::mem::replace(&mut self.snapshot, restored);
        self.structure_redo.push(current);
        true
    }

    pub fn redo_structure(&mut self) -> bool {
        let Some(target) = self.structure_redo.pop() else {
            return false;
        };
        self.drag = None;
        let restored = swap_structure(&self.snapshot, target);
        let current = std::mem::replace(&mut self.snapshot, restored);
        self.structure_undo.push_back(current);
        true
    }

    // ----- override edits -----

    /// Replace the committed overrides, recording history. No-op when equal.
    fn commit_overrides(&mut self, next: Overrides) -> bool {
        if next == self.snapshot.scheduler_overrides {
            return false;
        }
        let previous = std::mem::replace(&mut self.snapshot.scheduler_overrides, next);
        self.override_undo.push(previous);
        self.override_redo.clear();
        true
    }

    /// Recompute every unfrozen task around the frozen pins.
    pub fn rebalance(&mut self) -> bool {
        self.drag = None;
        let next = rebalance_plan(&self.snapshot, &self.config);
        self.commit_overrides(next)
    }

    /// Discard every override so the base schedule shows through.
    pub fn reset(&mut self) -> bool {
        self.drag = None;
        log_changes!(
            self.config.verbosity,
            "Reset {} overrides",
            self.snapshot.scheduler_overrides.len()
        );
        self.commit_overrides(Overrides::new())
    }

    /// Freeze a task at its current final position, or unfreeze it in place.
    ///
    /// Returns false when `task_id` is not a scheduled task.
    pub fn toggle_freeze(&mut self, task_id: ItemId) -> bool {
        self.drag = None;
        let pin = match self.snapshot.scheduler_overrides.get(&task_id) {
            Some(pin) => Override {
                start_month: pin.start_month,
                frozen: !pin.frozen,
            },
            None => {
                let view = compute_plan(&self.snapshot, &self.config);
                match view.scheduled(task_id) {
                    Some(scheduled) => Override::frozen(scheduled.start_month),
                    None => return false,
                }
            }
        };
        let mut next = self.snapshot.scheduler_overrides.clone();
        next.insert(task_id, pin);
        self.commit_overrides(next)
    }

    pub fn can_undo_overrides(&self) -> bool {
        !self.override_undo.is_empty()
    }

    pub fn can_redo_overrides(&self) -> bool {
        !self.override_redo.is_empty()
    }

    pub fn undo_overrides(&mut self) -> bool {
        let Some(previous) = self.override_undo.pop() else {
            return false;
        };
        self.drag = None;
        let current = std::mem::replace(&mut self.snapshot.scheduler_overrides, previous);
        self.override_redo.push(current);
        true
    }

    pub fn redo_overrides(&mut self) -> bool {
        let Some(next) = self.override_redo.pop() else {
            return false;
        };
        self.drag = None;
        let current = std::mem::replace(&mut self.snapshot.scheduler_overrides, next);
        self.override_undo.push(current);
        true
    }

    // ----- drag session -----

    /// Start dragging a task, or a project with phases.
    ///
    /// Returns false (and starts nothing) when the id names neither.
    pub fn begin_drag(&mut self, item_id: ItemId) -> bool {
        let view = compute_plan(&self.snapshot, &self.config);
        let draggable = view
            .schedule
            .iter()
            .any(|s| s.id() == item_id || s.task.project_id == Some(item_id));
        if !draggable {
            self.drag = None;
            return false;
        }
        self.drag = Some(DragSession {
            item_id,
            schedule: view.schedule,
            last_proposed: None,
            preview: None,
        });
        true
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Update the preview for a new proposed month. The solver only runs when
    /// the month differs from the previous call.
    pub fn drag_to(&mut self, proposed_start: i64) -> Option<&DragResolution> {
        let overrides = &self.snapshot.scheduler_overrides;
        let config = &self.config;
        let session = self.drag.as_mut()?;
        if session.last_proposed != Some(proposed_start) {
            session.preview = Some(solve_drag(
                &session.schedule,
                overrides,
                session.item_id,
                proposed_start,
                config,
            ));
            session.last_proposed = Some(proposed_start);
        } else {
            log_debug!(config.verbosity, "Drag preview for {} unchanged", proposed_start);
        }
        session.preview.as_ref()
    }

    /// Finish the drag. Commits the preview unless the row ends up where it
    /// started. Returns true when overrides changed.
    pub fn end_drag(&mut self) -> bool {
        let Some(session) = self.drag.take() else {
            return false;
        };
        match session.preview {
            Some(preview) if !preview.is_noop() => {
                log_changes!(
                    self.config.verbosity,
                    "Commit drag of {} by {} months",
                    session.item_id,
                    preview.displacement()
                );
                self.commit_overrides(preview.overrides)
            }
            _ => false,
        }
    }

    /// Abandon the drag; committed overrides are untouched.
    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }
}
