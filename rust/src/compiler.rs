//! Flattens the project/phase hierarchy into schedulable tasks.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::SchedulerConfig;
use crate::hierarchy::authored_duration;
use crate::models::{ItemId, LineItem, Task, MAX_MONTHS};

/// Whole-month task length: rounded, within `[1, MAX_MONTHS]`.
pub fn task_duration(item: &LineItem) -> i64 {
    authored_duration(item).round().clamp(1.0, MAX_MONTHS as f64) as i64
}

/// The project that owns `item`, if its parent is a real top-level item.
///
/// A phase pointing at a missing item or at another phase is treated as
/// top-level so the compiler stays total on malformed hierarchies.
fn owning_project(item: &LineItem, by_id: &FxHashMap<ItemId, &LineItem>) -> Option<ItemId> {
    let parent_id = item.parent_id?;
    match by_id.get(&parent_id) {
        Some(parent) if parent.is_project() && parent_id != item.id => Some(parent_id),
        _ => None,
    }
}

/// Compile line items into tasks.
///
/// * A top-level item with no phases becomes one standalone task.
/// * A top-level item with phases contributes only its phases, each inheriting
///   the project's priority.
/// * `order = project_sequence * stride + phase_sequence` (stride alone for a
///   standalone project), so no two tasks share an order value.
/// * A dependency on a project with phases stands for all of its phases.
///   Dependencies on ids that no longer exist, or on the task itself, are dropped.
pub fn compile_tasks(items: &[LineItem], config: &SchedulerConfig) -> Vec<Task> {
    let by_id: FxHashMap<ItemId, &LineItem> = items.iter().map(|item| (item.id, item)).collect();

    let mut projects: Vec<&LineItem> = Vec::new();
    let mut phases_by_project: FxHashMap<ItemId, Vec<&LineItem>> = FxHashMap::default();
    for item in items {
        match owning_project(item, &by_id) {
            Some(project_id) => phases_by_project.entry(project_id).or_default().push(item),
            None => projects.push(item),
        }
    }

    let resolve_deps = |item: &LineItem| -> Vec<ItemId> {
        let mut seen: FxHashSet<ItemId> = FxHashSet::default();
        let mut resolved = Vec::with_capacity(item.dependency_ids.len());
        for dep_id in &item.dependency_ids {
            if !by_id.contains_key(dep_id) {
                continue;
            }
            match phases_by_project.get(dep_id) {
                Some(phases) => {
                    for phase in phases {
                        if phase.id != item.id && seen.insert(phase.id) {
                            resolved.push(phase.id);
                        }
                    }
                }
                None => {
                    if *dep_id != item.id && seen.insert(*dep_id) {
                        resolved.push(*dep_id);
                    }
                }
            }
        }
        resolved
    };

    let mut tasks = Vec::with_capacity(items.len());
    for (project_seq, project) in projects.iter().enumerate() {
        let priority = project.priority.filter(|p| p.is_finite()).unwrap_or(0.0);
        let base_order = project_seq as u64 * config.order_stride;

        match phases_by_project.get(&project.id) {
            None => tasks.push(Task {
                id: project.id,
                name: project.name.clone(),
                project_id: None,
                priority,
                duration: task_duration(project),
                dependency_ids: resolve_deps(project),
                requirements: project.requirements.clone(),
                order: base_order,
            }),
            Some(phases) => {
                for (phase_seq, phase) in phases.iter().enumerate() {
                    tasks.push(Task {
                        id: phase.id,
                        name: phase.name.clone(),
                        project_id: Some(project.id),
                        priority,
                        duration: task_duration(phase),
                        dependency_ids: resolve_deps(phase),
                        requirements: phase.requirements.clone(),
                        order: base_order + phase_seq as u64,
                    });
                }
            }
        }
    }

    tasks
}
