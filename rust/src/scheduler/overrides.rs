//! Merging manual pins over the base schedule.

use crate::models::{Override, Overrides, ScheduledTask, Task, MAX_MONTHS};

use super::core::Placements;

/// Start month an override actually pins to, within `[0, MAX_MONTHS]`.
pub fn pinned_start(pin: &Override) -> i64 {
    pin.start_month.clamp(0, MAX_MONTHS)
}

/// Produce the final schedule.
///
/// A task with an override sits exactly where the override says, frozen or
/// not; everything else keeps its base placement. No feasibility checks are
/// repeated here, so overrides may overbook capacity or start before a
/// dependency ends.
pub fn apply_overrides(
    tasks: &[Task],
    base: &Placements,
    overrides: &Overrides,
) -> Vec<ScheduledTask> {
    tasks
        .iter()
        .map(|task| match overrides.get(&task.id) {
            Some(pin) => ScheduledTask::new(task.clone(), pinned_start(pin), pin.frozen),
            None => {
                let start = base.get(&task.id).map(|p| p.start_month).unwrap_or(0);
                ScheduledTask::new(task.clone(), start, false)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Requirements;
    use crate::scheduler::core::Placement;

    fn make_task(id: u64, duration: i64) -> Task {
        Task {
            id,
            name: format!("t{}", id),
            project_id: None,
            priority: 0.0,
            duration,
            dependency_ids: vec![],
            requirements: Requirements::new(),
            order: id * 1000,
        }
    }

    #[test]
    fn test_no_override_uses_base() {
        let tasks = vec![make_task(1, 2)];
        let base = Placements::from([(1, Placement::new(3, 2))]);
        let result = apply_overrides(&tasks, &base, &Overrides::new());
        assert_eq!(result[0].start_month, 3);
        assert_eq!(result[0].end_month, 5);
        assert!(!result[0].frozen);
    }

    #[test]
    fn test_override_wins() {
        let tasks = vec![make_task(1, 2), make_task(2, 4)];
        let base = Placements::from([(1, Placement::new(0, 2)), (2, Placement::new(0, 4))]);
        let overrides = Overrides::from([(1, Override::frozen(7)), (2, Override::soft(1))]);
        let result = apply_overrides(&tasks, &base, &overrides);
        assert_eq!((result[0].start_month, result[0].end_month, result[0].frozen), (7, 9, true));
        assert_eq!((result[1].start_month, result[1].end_month, result[1].frozen), (1, 5, false));
    }

    #[test]
    fn test_negative_override_clamped() {
        let tasks = vec![make_task(1, 2)];
        let overrides = Overrides::from([(1, Override::frozen(-4))]);
        let result = apply_overrides(&tasks, &Placements::new(), &overrides);
        assert_eq!(result[0].start_month, 0);
        assert_eq!(result[0].end_month, 2);
    }

    #[test]
    fn test_far_future_override_clamped() {
        let tasks = vec![make_task(1, 2)];
        let overrides = Overrides::from([(1, Override::frozen(i64::MAX))]);
        let result = apply_overrides(&tasks, &Placements::new(), &overrides);
        assert_eq!(result[0].start_month, MAX_MONTHS);
        assert_eq!(result[0].end_month, MAX_MONTHS + 2);
    }

    #[test]
    fn test_stale_override_ignored() {
        let tasks = vec![make_task(1, 1)];
        let base = Placements::from([(1, Placement::new(2, 1))]);
        let overrides = Overrides::from([(42, Override::frozen(9))]);
        let result = apply_overrides(&tasks, &base, &overrides);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].start_month, 2);
    }
}
