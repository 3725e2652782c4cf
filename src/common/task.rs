use crate::prelude::*;

/// A core's 1-based index, once a task has been allocated to one.
pub type CoreId = u32;

/// `spec.md` §9 redesign item: the sentinel `NOT_ALLOCATED = -73` becomes a
/// tagged variant instead of a magic number.
#[derive(Clone, Copy, Debug)]
#[derive(PartialEq, Eq)]
pub enum Allocation {
    Unassigned,
    OnCore(CoreId),
}

impl Allocation {
    pub fn is_on_core(&self, core_no: CoreId) -> bool {
        matches!(self, Allocation::OnCore(c) if *c == core_no)
    }
}

/// Immutable after admission, except `allocated_core` and `virtual_deadline`
/// which the offline partitioner fills in (`spec.md` §3).
#[derive(Clone, Debug)]
pub struct Task {
    pub task_no: u32,
    pub phase: Tick,
    pub period: Tick,
    pub deadline: Tick,
    pub criticality: u32,

    /// Per-level WCET. Only `wcet_own[0..criticality]` is independently
    /// specified by the input; entries at and beyond `criticality` are
    /// filled in with `wcet_own[criticality - 1]` so lookups at any level
    /// up to `MAX_LEVELS` don't need a bounds check (`tasks.c`'s own
    /// handling of "criticality levels beyond the task's own").
    wcet_own: [Tick; limits::MAX_LEVELS],

    /// `utilization[k] = wcet_own[k] / period`, precomputed the same way.
    utilization: [f64; limits::MAX_LEVELS],

    pub allocated_core: Allocation,
    pub virtual_deadline: VTime,
}

impl Task {
    pub fn new(task_no: u32, phase: Tick, period: Tick, deadline: Tick, criticality: u32, wcet: &[Tick]) -> Self {
        assert_eq!(wcet.len(), criticality as usize, "wcet must have one entry per criticality level");

        let mut wcet_own = [Tick::zero(); limits::MAX_LEVELS];
        let mut utilization = [0.0; limits::MAX_LEVELS];

        for (k, &w) in wcet.iter().enumerate() {
            wcet_own[k] = w;
            utilization[k] = w.0 as f64 / period.0 as f64;
        }
        for k in (criticality as usize)..limits::MAX_LEVELS {
            wcet_own[k] = wcet_own[criticality as usize - 1];
            utilization[k] = utilization[criticality as usize - 1];
        }

        Self {
            task_no,
            phase,
            period,
            deadline,
            criticality,
            wcet_own,
            utilization,
            allocated_core: Allocation::Unassigned,
            virtual_deadline: deadline.into(),
        }
    }

    /// WCET at 1-based level `level`.
    pub fn wcet_at(&self, level: u32) -> Tick {
        self.wcet_own[level as usize - 1]
    }

    /// Utilization at 1-based level `level`.
    pub fn utilization_at(&self, level: u32) -> f64 {
        self.utilization[level as usize - 1]
    }

    /// Utilization at the task's own criticality level.
    pub fn own_utilization(&self) -> f64 {
        self.utilization_at(self.criticality)
    }

    /// Low-Period classification (`spec.md` §4.3): `2·(period − wcet[0]) <
    /// LPD_THRESHOLD`.
    pub fn is_low_period(&self) -> bool {
        let margin = 2 * (self.period.0 as i64 - self.wcet_at(1).0 as i64);
        margin < limits::LPD_THRESHOLD as i64
    }
}

/// Sort tasks by (criticality descending, own-level utilization descending)
/// — `spec.md` §4.1, grounded on `tasks.c::quick_sort`/`partition_array`.
/// A stable comparator sort is used in place of the original's hand-rolled
/// quicksort; the ordering property (P-L1/L2 style idempotence) holds for
/// any deterministic sort.
pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        b.criticality.cmp(&a.criticality)
            .then_with(|| ordered_float::OrderedFloat(b.own_utilization()).cmp(&ordered_float::OrderedFloat(a.own_utilization())))
    });
}

pub fn is_sorted_by_criticality_and_utilization(tasks: &[Task]) -> bool {
    tasks.windows(2).all(|w| {
        w[0].criticality > w[1].criticality ||
        (w[0].criticality == w[1].criticality && w[0].own_utilization() >= w[1].own_utilization())
    })
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
    fn utilization_beyond_own_criticality_holds_steady() {
        let t = task(1, 2, &[2, 4], 10);
        assert_eq!(t.utilization_at(1), 0.2);
        assert_eq!(t.utilization_at(2), 0.4);
        // level 3 is beyond criticality 2, should equal level-2 value
        assert_eq!(t.utilization_at(3), 0.4);
    }

    #[test]
    fn sort_is_idempotent() {
        let mut tasks = vec![
            task(1, 1, &[3], 10),
            task(2, 2, &[2, 4], 10),
            task(3, 2, &[5, 6], 12),
        ];
        sort_tasks(&mut tasks);
        let once = tasks.iter().map(|t| t.task_no).collect::<Vec<_>>();
        sort_tasks(&mut tasks);
        let twice = tasks.iter().map(|t| t.task_no).collect::<Vec<_>>();
        assert_eq!(once, twice);
        assert!(is_sorted_by_criticality_and_utilization(&tasks));
    }

    #[test]
    fn low_period_classification() {
        // period=10, wcet=9 -> 2*(10-9) = 2 < 10 -> LPD
        let t = task(1, 1, &[9], 10);
        assert!(t.is_low_period());
        // period=10, wcet=2 -> 2*(10-2) = 16 >= 10 -> not LPD
        let t = task(1, 1, &[2], 10);
        assert!(!t.is_low_period());
    }
}
