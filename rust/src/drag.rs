//! Drag constraint solver.
//!
//! Turns "move this row to month N" into a complete override set: the dragged
//! task (or every phase of a dragged project) pinned at its new month, plus
//! the minimal ripple that keeps dependency order intact. Dependents that
//! would start before a moved task ends are pushed to that end; predecessors
//! that would end after a moved task starts are pulled back. Every task the
//! ripple touches is pinned frozen.
//!
//! Tasks that were already frozen are walls. A candidate that would move one
//! is rejected and the next candidate one month closer to the original
//! position is tried, down to the original position itself; if even that
//! fails, the input overrides come back untouched.
//!
//! A predecessor pulled back past month 0 stops at 0 when a single task is
//! dragged. When a whole project is dragged the shift is shrunk instead, so
//! the phases keep their spacing relative to what they depend on.
//!
//! Proposed months past the end of the schedule plus the placement window
//! are treated as that bound.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeSet, VecDeque};

use crate::config::SchedulerConfig;
use crate::models::{ItemId, Override, Overrides, ScheduledTask};
use crate::{log_changes, log_checks, log_debug};

/// Why a candidate position was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragConflict {
    /// The move would have to shift a task frozen by an earlier action.
    FrozenWall(ItemId),
    /// A predecessor would have to start before month 0 during a project shift.
    BelowZero(ItemId),
}

/// Outcome of one drag evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct DragResolution {
    /// Complete override set (a superset of the input overrides).
    pub overrides: Overrides,
    /// Start month the dragged row actually lands on.
    pub start_month: i64,
    /// Start month of the dragged row before the drag.
    pub original_start: i64,
    /// Tasks whose pins were written by this drag, ascending.
    pub moved: Vec<ItemId>,
}

impl DragResolution {
    fn unchanged(overrides: &Overrides, original_start: i64) -> Self {
        Self {
            overrides: overrides.clone(),
            start_month: original_start,
            original_start,
            moved: Vec::new(),
        }
    }

    /// Net displacement of the dragged row in months.
    pub fn displacement(&self) -> i64 {
        self.start_month - self.original_start
    }

    /// True when committing this resolution would change nothing meaningful.
    pub fn is_noop(&self) -> bool {
        self.displacement() == 0
    }
}

/// Dependency graph over the current final schedule.
struct DragGraph {
    start: FxHashMap<ItemId, i64>,
    duration: FxHashMap<ItemId, i64>,
    deps: FxHashMap<ItemId, Vec<ItemId>>,
    dependents: FxHashMap<ItemId, Vec<ItemId>>,
}

impl DragGraph {
    fn new(schedule: &[ScheduledTask]) -> Self {
        let mut start = FxHashMap::with_capacity_and_hasher(schedule.len(), Default::default());
        let mut duration = FxHashMap::with_capacity_and_hasher(schedule.len(), Default::default());
        for scheduled in schedule {
            start.insert(scheduled.id(), scheduled.start_month);
            duration.insert(scheduled.id(), scheduled.duration());
        }

        let mut deps: FxHashMap<ItemId, Vec<ItemId>> = FxHashMap::default();
        let mut dependents: FxHashMap<ItemId, Vec<ItemId>> = FxHashMap::default();
        for scheduled in schedule {
            for dep_id in &scheduled.task.dependency_ids {
                if !start.contains_key(dep_id) || *dep_id == scheduled.id() {
                    continue;
                }
                deps.entry(scheduled.id()).or_default().push(*dep_id);
                dependents.entry(*dep_id).or_default().push(scheduled.id());
            }
        }

        Self {
            start,
            duration,
            deps,
            dependents,
        }
    }

    fn len(&self) -> usize {
        self.start.len()
    }

    fn duration(&self, id: ItemId) -> i64 {
        self.duration.get(&id).copied().unwrap_or(1)
    }

    fn deps(&self, id: ItemId) -> &[ItemId] {
        self.deps.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    fn dependents(&self, id: ItemId) -> &[ItemId] {
        self.dependents.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Latest current end across the whole schedule.
    fn last_end(&self) -> i64 {
        self.start
            .iter()
            .map(|(id, start)| start.saturating_add(self.duration(*id)))
            .max()
            .unwrap_or(0)
    }

    /// Latest current end among a task's dependencies.
    fn dependency_floor(&self, id: ItemId) -> i64 {
        self.deps(id)
            .iter()
            .map(|dep| self.start[dep] + self.duration(*dep))
            .max()
            .unwrap_or(0)
    }
}

#[derive(Clone, Copy, Debug)]
enum Direction {
    Forward,
    Backward,
}

/// One attempt at placing the dragged row and rippling the consequences.
struct Propagation<'a> {
    graph: &'a DragGraph,
    overrides: &'a Overrides,
    /// Tasks positioned by the drag itself; the ripple never moves them.
    anchored: FxHashSet<ItemId>,
    positions: FxHashMap<ItemId, i64>,
    moved: BTreeSet<ItemId>,
    pushed: FxHashSet<ItemId>,
    pulled: FxHashSet<ItemId>,
    /// Stop pulls at month 0 instead of rejecting the candidate.
    clamp_pulls: bool,
    verbosity: u8,
}

impl<'a> Propagation<'a> {
    fn new(graph: &'a DragGraph, overrides: &'a Overrides, verbosity: u8) -> Self {
        Self {
            graph,
            overrides,
            anchored: FxHashSet::default(),
            positions: graph.start.clone(),
            moved: BTreeSet::new(),
            pushed: FxHashSet::default(),
            pulled: FxHashSet::default(),
            clamp_pulls: false,
            verbosity,
        }
    }

    fn clamping_pulls(mut self) -> Self {
        self.clamp_pulls = true;
        self
    }

    fn position(&self, id: ItemId) -> i64 {
        self.positions.get(&id).copied().unwrap_or(0)
    }

    fn is_wall(&self, id: ItemId) -> bool {
        !self.anchored.contains(&id)
            && self.overrides.get(&id).map(|pin| pin.frozen).unwrap_or(false)
    }

    fn shift(&mut self, id: ItemId, start: i64) -> Result<(), DragConflict> {
        if self.is_wall(id) {
            return Err(DragConflict::FrozenWall(id));
        }
        log_debug!(
            self.verbosity,
            "    Ripple: task {} {} -> {}",
            id,
            self.position(id),
            start
        );
        self.positions.insert(id, start);
        self.moved.insert(id);
        Ok(())
    }

    /// Place the anchored moves and propagate until dependency order holds.
    ///
    /// A task pushed later is never pulled back and vice versa; on a cycle
    /// the opposing constraint is simply left violated. Pushes only increase
    /// and pulls only decrease a position, and the worklist is capped at
    /// (n+1)^2 steps, so this terminates on cyclic graphs too.
    fn run(mut self, moves: &[(ItemId, i64)]) -> Result<Self, DragConflict> {
        let mut worklist: VecDeque<(ItemId, Direction)> = VecDeque::new();
        for &(id, start) in moves {
            self.anchored.insert(id);
            self.positions.insert(id, start);
            self.moved.insert(id);
        }
        for &(id, _) in moves {
            worklist.push_back((id, Direction::Forward));
            worklist.push_back((id, Direction::Backward));
        }

        let graph = self.graph;
        let budget = (graph.len() + 1) * (graph.len() + 1);
        let mut steps = 0;
        while let Some((id, direction)) = worklist.pop_front() {
            steps += 1;
            if steps > budget {
                log_checks!(
                    self.verbosity,
                    "    Propagation budget exhausted after {} steps (cyclic dependencies?)",
                    budget
                );
                break;
            }

            match direction {
                Direction::Forward => {
                    let end = self.position(id) + graph.duration(id);
                    for &dependent in graph.dependents(id) {
                        if self.anchored.contains(&dependent)
                            || self.pulled.contains(&dependent)
                            || self.position(dependent) >= end
                        {
                            continue;
                        }
                        self.shift(dependent, end)?;
                        self.pushed.insert(dependent);
                        worklist.push_back((dependent, Direction::Forward));
                        worklist.push_back((dependent, Direction::Backward));
                    }
                }
                Direction::Backward => {
                    let start = self.position(id);
                    for &dep in graph.deps(id) {
                        let dep_duration = graph.duration(dep);
                        if self.anchored.contains(&dep)
                            || self.pushed.contains(&dep)
                            || self.position(dep) + dep_duration <= start
                        {
                            continue;
                        }
                        let mut pulled = start - dep_duration;
                        if pulled < 0 {
                            if !self.clamp_pulls {
                                return Err(DragConflict::BelowZero(dep));
                            }
                            pulled = 0;
                        }
                        self.shift(dep, pulled)?;
                        self.pulled.insert(dep);
                        worklist.push_back((dep, Direction::Backward));
                    }
                }
            }
        }

        Ok(self)
    }

    fn into_overrides(self, base: &Overrides) -> (Overrides, Vec<ItemId>) {
        let mut overrides = base.clone();
        for id in &self.moved {
            overrides.insert(*id, Override::frozen(self.position(*id)));
        }
        (overrides, self.moved.into_iter().collect())
    }
}

/// Candidate values from `from` stepping one at a time toward `to`, inclusive.
fn candidates_toward(from: i64, to: i64) -> impl Iterator<Item = i64> {
    let step = (to - from).signum();
    (0..=(to - from).unsigned_abs()).map(move |k| from + step * k as i64)
}

/// Resolve a drag of `item_id` (a task, or a project with phases) to `proposed_start`.
///
/// Pure: the schedule and overrides are only read, and identical inputs give
/// identical resolutions.
pub fn solve_drag(
    schedule: &[ScheduledTask],
    overrides: &Overrides,
    item_id: ItemId,
    proposed_start: i64,
    config: &SchedulerConfig,
) -> DragResolution {
    let graph = DragGraph::new(schedule);
    let horizon = graph.last_end().saturating_add(config.probe_limit_months);
    let proposed_start = proposed_start.clamp(0, horizon.max(0));

    if graph.start.contains_key(&item_id) {
        return solve_task_drag(&graph, overrides, item_id, proposed_start, config);
    }

    let phases: Vec<(ItemId, i64)> = schedule
        .iter()
        .filter(|s| s.task.project_id == Some(item_id))
        .map(|s| (s.id(), s.start_month))
        .collect();
    if phases.is_empty() {
        return DragResolution::unchanged(overrides, 0);
    }
    solve_group_drag(&graph, overrides, &phases, proposed_start, config)
}

fn solve_task_drag(
    graph: &DragGraph,
    overrides: &Overrides,
    task_id: ItemId,
    proposed_start: i64,
    config: &SchedulerConfig,
) -> DragResolution {
    let verbosity = config.verbosity;
    let original = graph.start[&task_id];
    let clamped = proposed_start.max(graph.dependency_floor(task_id));

    for candidate in candidates_toward(clamped, original) {
        let propagation = Propagation::new(graph, overrides, verbosity).clamping_pulls();
        match propagation.run(&[(task_id, candidate)]) {
            Ok(propagation) => {
                let (result, moved) = propagation.into_overrides(overrides);
                log_changes!(
                    verbosity,
                    "Drag task {}: {} -> {} ({} pins)",
                    task_id,
                    original,
                    candidate,
                    moved.len()
                );
                return DragResolution {
                    overrides: result,
                    start_month: candidate,
                    original_start: original,
                    moved,
                };
            }
            Err(conflict) => {
                log_checks!(
                    verbosity,
                    "  Drag task {} to {} rejected: {:?}",
                    task_id,
                    candidate,
                    conflict
                );
            }
        }
    }

    DragResolution::unchanged(overrides, original)
}

fn solve_group_drag(
    graph: &DragGraph,
    overrides: &Overrides,
    phases: &[(ItemId, i64)],
    proposed_start: i64,
    config: &SchedulerConfig,
) -> DragResolution {
    let verbosity = config.verbosity;
    let original = phases.iter().map(|(_, start)| *start).min().unwrap_or(0);
    for delta in candidates_toward(proposed_start - original, 0) {
        let moves: Vec<(ItemId, i64)> = phases
            .iter()
            .map(|(id, start)| (*id, start + delta))
            .collect();
        match Propagation::new(graph, overrides, verbosity).run(&moves) {
            Ok(propagation) => {
                let (result, moved) = propagation.into_overrides(overrides);
                log_changes!(
                    verbosity,
                    "Drag project ({} phases) by {} months ({} pins)",
                    phases.len(),
                    delta,
                    moved.len()
                );
                return DragResolution {
                    overrides: result,
                    start_month: original + delta,
                    original_start: original,
                    moved,
                };
            }
            Err(conflict) => {
                log_checks!(
                    verbosity,
                    "  Project shift by {} rejected: {:?}",
                    delta,
                    conflict
                );
            }
        }
    }

    DragResolution::unchanged(overrides, original)
}
