use crate::prelude::*;

/// Result of an EDF-VD schedulability check over a candidate task set.
/// `allocator.c::edfvd_schedulability_check`'s sentinel `-73` becomes
/// `Infeasible`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Admission {
    Schedulable { threshold_criticality: u32, x: f64 },
    Infeasible,
}

/// Check whether `union` (the tasks already allocated to a core, together
/// with one candidate under consideration) admits an EDF-VD virtual-deadline
/// assignment. Pure: does not touch any task's `virtual_deadline` — see
/// [`apply_virtual_deadlines`].
pub fn admit(union: &[Task], max_criticality: u32) -> Admission {
    if utilization_own(union, 1, max_criticality) <= 1.0 {
        return Admission::Schedulable { threshold_criticality: max_criticality, x: 1.0 };
    }

    for t in (1..max_criticality).rev() {
        let own_lo = utilization_own(union, 1, t);
        if own_lo >= 1.0 {
            continue;
        }

        let x_lb = utilization_at_level(union, t + 1, max_criticality, t) / (1.0 - own_lo);
        let own_hi = utilization_own(union, t + 1, max_criticality);
        let x_ub = (1.0 - own_hi) / own_lo;

        if x_lb <= x_ub {
            let x = (x_lb + x_ub) / 2.0;
            return Admission::Schedulable { threshold_criticality: t, x };
        }
    }

    Admission::Infeasible
}

/// Write `virtual_deadline` on every task in `tasks` for which `predicate`
/// holds, per an [`Admission::Schedulable`] result. A no-op on
/// [`Admission::Infeasible`] — the caller should have already rejected that
/// candidate before reaching here.
pub fn apply_virtual_deadlines(tasks: &mut [Task], admission: Admission, mut predicate: impl FnMut(&Task) -> bool) {
    let Admission::Schedulable { threshold_criticality, x } = admission else { return };

    for task in tasks.iter_mut().filter(|t| predicate(t)) {
        task.virtual_deadline = if task.criticality <= threshold_criticality {
            task.deadline.into()
        } else {
            VTime::from(task.deadline) * x
        };
    }
}

/// `U_own(lo..hi)`: sum, over tasks whose criticality falls in `[lo, hi]`,
/// of utilization at their own criticality level.
fn utilization_own(tasks: &[Task], lo: u32, hi: u32) -> f64 {
    tasks.iter()
        .filter(|t| t.criticality >= lo && t.criticality <= hi)
        .map(Task::own_utilization)
        .sum()
}

/// `U_at_level(lo..hi)`: sum, over tasks whose criticality falls in
/// `[lo, hi]`, of utilization evaluated at the fixed `level` (not each
/// task's own criticality).
fn utilization_at_level(tasks: &[Task], lo: u32, hi: u32, level: u32) -> f64 {
    tasks.iter()
        .filter(|t| t.criticality >= lo && t.criticality <= hi)
        .map(|t| t.utilization_at(level))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(task_no: u32, criticality: u32, wcet: &[u64], period: u64) -> Task {
        Task::new(
            task_no,
            Tick::zero(),
            Tick(period),
            Tick(period),
            criticality,
            &wcet.iter().map(|&w| Tick(w)).collect::<Vec<_>>(),
        )
    }

    #[test]
    fn pure_edf_when_own_utilization_at_most_one() {
        let tasks = vec![task(1, 2, &[2, 4], 10), task(2, 1, &[3], 5)];
        let result = admit(&tasks, 2);
        assert_eq!(result, Admission::Schedulable { threshold_criticality: 2, x: 1.0 });
    }

    #[test]
    fn infeasible_when_no_threshold_satisfies_bounds() {
        // Mirrors scenario 3 of the end-to-end test vectors: single core,
        // two tasks, U_own = 1.2 > 1, x_lb > x_ub at the only candidate threshold.
        let tasks = vec![task(1, 2, &[3, 6], 10), task(2, 1, &[6], 10)];
        assert_eq!(admit(&tasks, 2), Admission::Infeasible);
    }

    #[test]
    fn schedulable_with_intermediate_threshold() {
        let tasks = vec![
            task(1, 3, &[1, 2, 3], 10), // crit 3
            task(2, 1, &[6], 10),       // crit 1, heavy LO load
        ];
        // U_own = 0.3 + 0.6 = 0.9 <= 1.0 -> pure EDF at L_max
        assert_eq!(admit(&tasks, 3), Admission::Schedulable { threshold_criticality: 3, x: 1.0 });
    }

    #[test]
    fn apply_sets_virtual_deadline_by_threshold() {
        let mut tasks = vec![task(1, 2, &[3, 6], 10), task(2, 1, &[5], 10)];
        let admission = Admission::Schedulable { threshold_criticality: 1, x: 0.5 };
        apply_virtual_deadlines(&mut tasks, admission, |_| true);
        assert_eq!(tasks[0].virtual_deadline, VTime::from(tasks[0].deadline) * 0.5);
        assert_eq!(tasks[1].virtual_deadline, tasks[1].deadline.into());
    }
}
