//! Structural edits to a plan snapshot.
//!
//! Every edit takes the current snapshot and returns a new one, or an
//! [`EditError`] when applying it would break a hierarchy or discipline
//! invariant. Numeric inputs are sanitized the same way stored data is.

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::models::{ItemId, LineItem, PlanSnapshot};

/// Reasons a structural edit is refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Unknown line item: {0}")]
    UnknownItem(ItemId),
    #[error("Line item {0} cannot be its own parent")]
    SelfParent(ItemId),
    #[error("Parent {0} is not a top-level project")]
    InvalidParent(ItemId),
    #[error("Project {0} owns phases and cannot become a phase")]
    ProjectHasPhases(ItemId),
    #[error("Discipline name must not be empty")]
    EmptyDisciplineName,
    #[error("Unknown discipline: {0}")]
    UnknownDiscipline(String),
    #[error("Discipline already exists: {0}")]
    DuplicateDiscipline(String),
}

fn finite_non_negative(value: f64) -> Option<f64> {
    (value.is_finite() && value >= 0.0).then_some(value)
}

fn item_mut(snapshot: &mut PlanSnapshot, id: ItemId) -> Result<&mut LineItem, EditError> {
    snapshot
        .line_items
        .iter_mut()
        .find(|item| item.id == id)
        .ok_or(EditError::UnknownItem(id))
}

/// A parent must be an existing top-level item other than the child itself.
fn check_parent(snapshot: &PlanSnapshot, child: Option<ItemId>, parent: ItemId) -> Result<(), EditError> {
    if child == Some(parent) {
        return Err(EditError::SelfParent(parent));
    }
    match snapshot.item(parent) {
        Some(item) if item.is_project() => Ok(()),
        _ => Err(EditError::InvalidParent(parent)),
    }
}

fn check_discipline(snapshot: &PlanSnapshot, name: &str) -> Result<(), EditError> {
    if snapshot.disciplines.iter().any(|d| d == name) {
        Ok(())
    } else {
        Err(EditError::UnknownDiscipline(name.to_string()))
    }
}

fn clean_discipline_name(name: &str) -> Result<String, EditError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(EditError::EmptyDisciplineName);
    }
    Ok(trimmed.to_string())
}

/// Append a new item with the next free id. Returns the new snapshot and the id.
pub fn add_item(
    snapshot: &PlanSnapshot,
    name: &str,
    parent_id: Option<ItemId>,
) -> Result<(PlanSnapshot, ItemId), EditError> {
    if let Some(parent) = parent_id {
        check_parent(snapshot, None, parent)?;
    }
    let id = snapshot.next_id();
    let mut item = LineItem::new(id, name);
    item.parent_id = parent_id;

    let mut next = snapshot.clone();
    next.line_items.push(item);
    Ok((next, id))
}

pub fn rename_item(snapshot: &PlanSnapshot, id: ItemId, name: &str) -> Result<PlanSnapshot, EditError> {
    let mut next = snapshot.clone();
    item_mut(&mut next, id)?.name = name.to_string();
    Ok(next)
}

/// Set or clear the authored duration. Non-finite or negative values clear it.
pub fn set_duration(
    snapshot: &PlanSnapshot,
    id: ItemId,
    months: Option<f64>,
) -> Result<PlanSnapshot, EditError> {
    let mut next = snapshot.clone();
    item_mut(&mut next, id)?.duration_months = months.and_then(finite_non_negative);
    Ok(next)
}

/// Set or clear a project's priority. Phases have no priority; the edit is
/// accepted and ignored for them.
pub fn set_priority(
    snapshot: &PlanSnapshot,
    id: ItemId,
    priority: Option<f64>,
) -> Result<PlanSnapshot, EditError> {
    let mut next = snapshot.clone();
    let item = item_mut(&mut next, id)?;
    if item.is_project() {
        item.priority = priority.filter(|p| p.is_finite());
    }
    Ok(next)
}

/// Set the FTE an item needs from one discipline. Bad values become 0.
pub fn set_requirement(
    snapshot: &PlanSnapshot,
    id: ItemId,
    discipline: &str,
    fte: f64,
) -> Result<PlanSnapshot, EditError> {
    check_discipline(snapshot, discipline)?;
    let mut next = snapshot.clone();
    item_mut(&mut next, id)?
        .requirements
        .insert(discipline.to_string(), finite_non_negative(fte).unwrap_or(0.0));
    Ok(next)
}

/// Replace an item's dependency list. Unknown ids, the item itself and
/// repeats are dropped.
pub fn set_dependencies(
    snapshot: &PlanSnapshot,
    id: ItemId,
    dependency_ids: &[ItemId],
) -> Result<PlanSnapshot, EditError> {
    let existing: FxHashSet<ItemId> = snapshot.line_items.iter().map(|i| i.id).collect();
    let mut seen = FxHashSet::default();
    let deps: Vec<ItemId> = dependency_ids
        .iter()
        .copied()
        .filter(|dep| *dep != id && existing.contains(dep) && seen.insert(*dep))
        .collect();

    let mut next = snapshot.clone();
    item_mut(&mut next, id)?.dependency_ids = deps;
    Ok(next)
}

/// Move an item under another project, or to the top level with `None`.
/// Clears the item's priority.
pub fn reparent(
    snapshot: &PlanSnapshot,
    id: ItemId,
    parent_id: Option<ItemId>,
) -> Result<PlanSnapshot, EditError> {
    if snapshot.item(id).is_none() {
        return Err(EditError::UnknownItem(id));
    }
    if let Some(parent) = parent_id {
        check_parent(snapshot, Some(id), parent)?;
        if snapshot.has_phases(id) {
            return Err(EditError::ProjectHasPhases(id));
        }
    }

    let mut next = snapshot.clone();
    let item = item_mut(&mut next, id)?;
    item.parent_id = parent_id;
    item.priority = None;
    Ok(next)
}

/// Delete an item and, for a project, all of its phases. Removed ids are
/// stripped from every dependency list and their overrides are dropped.
pub fn delete_item(snapshot: &PlanSnapshot, id: ItemId) -> Result<PlanSnapshot, EditError> {
    if snapshot.item(id).is_none() {
        return Err(EditError::UnknownItem(id));
    }
    let removed: FxHashSet<ItemId> = std::iter::once(id)
        .chain(snapshot.phases_of(id).map(|phase| phase.id))
        .collect();

    let mut next = snapshot.clone();
    next.line_items.retain(|item| !removed.contains(&item.id));
    for item in &mut next.line_items {
        item.dependency_ids.retain(|dep| !removed.contains(dep));
    }
    next.scheduler_overrides.retain(|task_id, _| !removed.contains(task_id));
    Ok(next)
}

/// Add a discipline with zero capacity.
pub fn add_discipline(snapshot: &PlanSnapshot, name: &str) -> Result<PlanSnapshot, EditError> {
    let name = clean_discipline_name(name)?;
    if snapshot.disciplines.contains(&name) {
        return Err(EditError::DuplicateDiscipline(name));
    }
    let mut next = snapshot.clone();
    next.team_capacities.insert(name.clone(), 0.0);
    next.disciplines.push(name);
    Ok(next)
}

/// Rename a discipline everywhere it appears: the list, the capacity table
/// and every requirements map.
pub fn rename_discipline(
    snapshot: &PlanSnapshot,
    from: &str,
    to: &str,
) -> Result<PlanSnapshot, EditError> {
    check_discipline(snapshot, from)?;
    let to = clean_discipline_name(to)?;
    if to == from {
        return Ok(snapshot.clone());
    }
    if snapshot.disciplines.contains(&to) {
        return Err(EditError::DuplicateDiscipline(to));
    }

    let mut next = snapshot.clone();
    for name in &mut next.disciplines {
        if name == from {
            *name = to.clone();
        }
    }
    if let Some(capacity) = next.team_capacities.remove(from) {
        next.team_capacities.insert(to.clone(), capacity);
    }
    for item in &mut next.line_items {
        if let Some(fte) = item.requirements.remove(from) {
            item.requirements.insert(to.clone(), fte);
        }
    }
    Ok(next)
}

/// Remove a discipline along with its capacity and every requirement on it.
pub fn remove_discipline(snapshot: &PlanSnapshot, name: &str) -> Result<PlanSnapshot, EditError> {
    check_discipline(snapshot, name)?;
    let mut next = snapshot.clone();
    next.disciplines.retain(|d| d != name);
    next.team_capacities.remove(name);
    for item in &mut next.line_items {
        item.requirements.remove(name);
    }
    Ok(next)
}

/// Set a discipline's monthly FTE capacity. Bad values become 0.
pub fn set_capacity(snapshot: &PlanSnapshot, name: &str, capacity: f64) -> Result<PlanSnapshot, EditError> {
    check_discipline(snapshot, name)?;
    let mut next = snapshot.clone();
    next.team_capacities
        .insert(name.to_string(), finite_non_negative(capacity).unwrap_or(0.0));
    Ok(next)
}
