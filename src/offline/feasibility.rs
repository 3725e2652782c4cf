use crate::prelude::*;

/// LCM of every task's period, via iterated `gcd` folding — `tasks.c`'s
/// `calculate_superhyperperiod` generalized from pairwise `hcf` to `num`'s
/// `integer::lcm`.
pub fn hyperperiod(tasks: &[Task]) -> Tick {
    let period_ns = tasks.iter()
        .map(|t| t.period.0)
        .fold(1u64, num::integer::lcm);

    Tick(period_ns)
}

/// Minimum cores required under the MCS feasibility condition: for every
/// criticality level, the tasks that still execute at that level (those
/// with criticality strictly above it — `tasks.c::get_min_cores_reqd`'s
/// early `break` on `criticality <= level`, preserved here) must have total
/// utilization summable onto the returned number of cores.
pub fn min_cores_required(tasks: &[Task], max_criticality: u32) -> usize {
    let max_utilization_sum = (1..=max_criticality)
        .map(|level| {
            tasks.iter()
                .filter(|t| t.criticality > level)
                .map(|t| t.utilization_at(level))
                .sum::<f64>()
        })
        .fold(0.0, f64::max);

    max_utilization_sum.ceil() as usize
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
    fn hyperperiod_is_lcm_of_periods() {
        let tasks = vec![task(1, 1, &[2], 10), task(2, 1, &[3], 15)];
        assert_eq!(hyperperiod(&tasks), Tick(30));
    }

    #[test]
    fn min_cores_excludes_tasks_at_or_below_the_level() {
        // Single task, criticality 1: at level 1, criticality > level is false, so
        // nothing is summed and the minimum is zero cores for MC feasibility purposes.
        let tasks = vec![task(1, 1, &[5], 10)];
        assert_eq!(min_cores_required(&tasks, 1), 0);
    }

    #[test]
    fn min_cores_counts_strictly_higher_criticality_tasks() {
        // Two HI tasks (criticality 2) each utilization 0.5 at level 1 -> sum 1.0 -> ceil 1
        let tasks = vec![task(1, 2, &[5, 5], 10), task(2, 2, &[5, 5], 10)];
        assert_eq!(min_cores_required(&tasks, 2), 1);
    }
}
