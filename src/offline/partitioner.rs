use crate::prelude::*;
use super::edf_vd::{self, Admission};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoreType {
    Shutdownable,
    NonShutdownable,
}

/// Static (post-partitioning) per-core fields — `allocator.c`'s `Cores`
/// structure, minus the runtime fields that belong to [`crate::runtime::Core`].
#[derive(Clone, Copy, Debug)]
pub struct Core {
    pub core_no: CoreId,
    pub utilization: f64,
    pub remaining_capacity: f64,
    pub threshold_criticality: u32,
    pub core_type: CoreType,
}

impl Core {
    fn new(core_no: CoreId, max_criticality: u32) -> Self {
        Self {
            core_no,
            utilization: 0.0,
            remaining_capacity: 1.0,
            threshold_criticality: max_criticality,
            core_type: CoreType::Shutdownable,
        }
    }
}

#[derive(Debug)]
pub enum PartitionError {
    /// `allocator.c::offline_task_allocator`'s `-1` return: allocation would
    /// need more than `limits::MAX_CORES` cores.
    TooManyCores,
}

/// `(a / 2) + (a % 2)`, i.e. `⌈a/2⌉` — the WFD/FFD split threshold formula
/// used throughout `allocator.c`.
fn ceil_half(n: u32) -> u32 {
    n.div_ceil(2)
}

struct TasksetInfo {
    hi_crit_util: f64,
    lo_crit_util: f64,
    lpd_hi_crit_util: f64,
    lpd_lo_crit_util: f64,
}

/// `tasks.c::get_taskset_info`.
fn taskset_info(tasks: &[Task], hi_level_threshold: u32) -> TasksetInfo {
    let mut info = TasksetInfo { hi_crit_util: 0.0, lo_crit_util: 0.0, lpd_hi_crit_util: 0.0, lpd_lo_crit_util: 0.0 };

    for task in tasks {
        let util = task.own_utilization();
        if task.criticality > hi_level_threshold {
            info.hi_crit_util += util;
            if task.is_low_period() {
                info.lpd_hi_crit_util += util;
            }
        } else {
            info.lo_crit_util += util;
            if task.is_low_period() {
                info.lpd_lo_crit_util += util;
            }
        }
    }

    info
}

/// Partition `tasks` (already sorted by [`sort_tasks`]) onto as few cores as
/// possible, respecting the MCS feasibility floor `min_cores`.
/// `allocator.c::offline_task_allocator`.
pub fn partition(tasks: &mut [Task], min_cores: usize, max_criticality: u32) -> Result<Vec<Core>, PartitionError> {
    let hi_level_threshold = ceil_half(max_criticality);
    let info = taskset_info(tasks, hi_level_threshold);

    let mut cores: Vec<Core> = Vec::new();

    let lpd_total = info.lpd_hi_crit_util + info.lpd_lo_crit_util;
    if lpd_total > 0.0 {
        let min_lpd_cores = lpd_total.ceil() as usize;

        let wfd_threshold_crit =
            if info.lpd_hi_crit_util > 0.0 && info.lpd_hi_crit_util / lpd_total <= limits::HI_CRIT_WFD_SHARE_THRESHOLD {
                hi_level_threshold
            } else {
                max_criticality
            };

        open_cores_up_to(&mut cores, min_lpd_cores, max_criticality);
        allocate_phase(tasks, &mut cores, Task::is_low_period, wfd_threshold_crit, max_criticality, true)?;
    }

    let total = info.hi_crit_util + info.lo_crit_util;
    let wfd_threshold_crit =
        if info.hi_crit_util > 0.0 && info.hi_crit_util / total <= limits::HI_CRIT_WFD_SHARE_THRESHOLD {
            hi_level_threshold
        } else {
            max_criticality
        };

    open_cores_up_to(&mut cores, min_cores, max_criticality);
    allocate_phase(
        tasks,
        &mut cores,
        |t| t.allocated_core == Allocation::Unassigned,
        wfd_threshold_crit,
        max_criticality,
        false,
    )?;

    Ok(cores)
}

fn open_cores_up_to(cores: &mut Vec<Core>, count: usize, max_criticality: u32) {
    while cores.len() < count {
        let core_no = cores.len() as CoreId + 1;
        cores.push(Core::new(core_no, max_criticality));
    }
}

/// One allocation pass over `tasks` in (already-sorted) order, acting only on
/// entries matching `selector`. The criticality-transition reset check always
/// compares against the immediately preceding array entry, selected or not —
/// `allocator.c`'s `tasks_arr[i-1]` reference is positional, not filtered.
fn allocate_phase(
    tasks: &mut [Task],
    cores: &mut Vec<Core>,
    selector: impl Fn(&Task) -> bool,
    wfd_threshold_crit: u32,
    max_criticality: u32,
    mark_non_shutdownable: bool,
) -> Result<(), PartitionError> {
    for i in 0..tasks.len() {
        if !selector(&tasks[i]) {
            continue;
        }

        if i != 0 && tasks[i - 1].criticality > tasks[i].criticality {
            reset_core_capacities(tasks, cores, tasks[i].criticality);
        }

        let fit =
            if tasks[i].criticality > wfd_threshold_crit {
                worst_fit_core_idx(tasks, cores, i, max_criticality)
            } else {
                first_fit_core_idx(tasks, cores, i, max_criticality)
            };

        let (core_idx, admission) = match fit {
            Some(found) => found,
            None => {
                if cores.len() >= limits::MAX_CORES {
                    return Err(PartitionError::TooManyCores);
                }
                let core_no = cores.len() as CoreId + 1;
                cores.push(Core::new(core_no, max_criticality));
                (cores.len() - 1, Admission::Schedulable { threshold_criticality: max_criticality, x: 1.0 })
            }
        };

        allocate_task_to_core(tasks, cores, core_idx, i, admission);
        if mark_non_shutdownable {
            cores[core_idx].core_type = CoreType::NonShutdownable;
        }
    }

    Ok(())
}

/// `allocator.c::reset_core_capacities`, generalized: since unallocated tasks
/// never match any core's `core_no`, there is no need for the original's
/// explicit `task_array_idx` cutoff — the filter on `allocated_core` already
/// restricts the sum to tasks processed so far.
fn reset_core_capacities(tasks: &[Task], cores: &mut [Core], level: u32) {
    for core in cores.iter_mut() {
        let allocated_util: f64 = tasks.iter()
            .filter(|t| t.allocated_core.is_on_core(core.core_no))
            .map(|t| t.utilization_at(level))
            .sum();
        core.remaining_capacity = 1.0 - allocated_util;
    }
}

fn union_with_candidate(tasks: &[Task], core_no: CoreId, candidate_no: u32) -> Vec<Task> {
    tasks.iter()
        .filter(|t| t.allocated_core.is_on_core(core_no) || t.task_no == candidate_no)
        .cloned()
        .collect()
}

/// `allocator.c::get_worst_fit_core_idx`: among cores that fit, keep the one
/// maximizing remaining capacity after placement.
fn worst_fit_core_idx(tasks: &[Task], cores: &mut [Core], task_idx: usize, max_criticality: u32) -> Option<(usize, Admission)> {
    let util = tasks[task_idx].own_utilization();
    let candidate_no = tasks[task_idx].task_no;

    let mut best: Option<(usize, f64, Admission)> = None;

    for j in 0..cores.len() {
        if cores[j].remaining_capacity < util {
            continue;
        }
        let remaining_after = cores[j].remaining_capacity - util;
        if let Some((_, best_remaining, _)) = best {
            if remaining_after <= best_remaining {
                continue;
            }
        }

        if util + cores[j].utilization > 1.0 {
            let union = union_with_candidate(tasks, cores[j].core_no, candidate_no);
            if let Admission::Schedulable { threshold_criticality, x } = edf_vd::admit(&union, max_criticality) {
                if threshold_criticality > 0 && threshold_criticality < max_criticality {
                    cores[j].threshold_criticality = threshold_criticality;
                    best = Some((j, remaining_after, Admission::Schedulable { threshold_criticality, x }));
                }
            }
        } else {
            cores[j].threshold_criticality = max_criticality;
            best = Some((j, remaining_after, Admission::Schedulable { threshold_criticality: max_criticality, x: 1.0 }));
        }
    }

    best.map(|(idx, _, admission)| (idx, admission))
}

/// `allocator.c::get_first_fit_core_idx`: first core (lowest index) that fits.
fn first_fit_core_idx(tasks: &[Task], cores: &mut [Core], task_idx: usize, max_criticality: u32) -> Option<(usize, Admission)> {
    let util = tasks[task_idx].own_utilization();
    let candidate_no = tasks[task_idx].task_no;

    for j in 0..cores.len() {
        if cores[j].remaining_capacity < util {
            continue;
        }

        if util + cores[j].utilization > 1.0 {
            let union = union_with_candidate(tasks, cores[j].core_no, candidate_no);
            if let Admission::Schedulable { threshold_criticality, x } = edf_vd::admit(&union, max_criticality) {
                if threshold_criticality > 0 && threshold_criticality < max_criticality {
                    cores[j].threshold_criticality = threshold_criticality;
                    return Some((j, Admission::Schedulable { threshold_criticality, x }));
                }
            }
        } else {
            cores[j].threshold_criticality = max_criticality;
            return Some((j, Admission::Schedulable { threshold_criticality: max_criticality, x: 1.0 }));
        }
    }

    None
}

fn allocate_task_to_core(tasks: &mut [Task], cores: &mut [Core], core_idx: usize, task_idx: usize, admission: Admission) {
    let util = tasks[task_idx].own_utilization();
    let core_no = cores[core_idx].core_no;

    cores[core_idx].remaining_capacity -= util;
    cores[core_idx].utilization += util;
    tasks[task_idx].allocated_core = Allocation::OnCore(core_no);

    if let Admission::Schedulable { threshold_criticality, .. } = admission {
        cores[core_idx].threshold_criticality = threshold_criticality;
    }

    edf_vd::apply_virtual_deadlines(tasks, admission, |t| t.allocated_core.is_on_core(core_no));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offline::feasibility;

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
    fn single_edf_schedulable_task_needs_one_core() {
        let mut tasks = vec![task(1, 1, &[3], 10)];
        let min_cores = feasibility::min_cores_required(&tasks, 1).max(1);
        let cores = partition(&mut tasks, min_cores, 1).unwrap();
        assert_eq!(cores.len(), 1);
        assert_eq!(tasks[0].allocated_core, Allocation::OnCore(1));
        assert_eq!(tasks[0].virtual_deadline, tasks[0].deadline.into());
    }

    #[test]
    fn two_level_fits_on_one_core_with_pure_edf() {
        // Matches end-to-end scenario 2: U_own = 0.4 + 0.6 = 1.0 <= 1
        let mut tasks = vec![task(1, 2, &[2, 4], 10), task(2, 1, &[3], 5)];
        sort_tasks(&mut tasks);
        let cores = partition(&mut tasks, 1, 2).unwrap();
        assert_eq!(cores.len(), 1);
        assert!(tasks.iter().all(|t| t.allocated_core == Allocation::OnCore(1)));
    }

    #[test]
    fn infeasible_single_core_opens_a_second() {
        // Matches end-to-end scenario 3: needs two cores.
        let mut tasks = vec![task(1, 2, &[3, 6], 10), task(2, 1, &[6], 10)];
        sort_tasks(&mut tasks);
        let cores = partition(&mut tasks, 1, 2).unwrap();
        assert_eq!(cores.len(), 2);
    }

    #[test]
    fn too_many_cores_is_reported() {
        // Force-fail by requiring more distinct heavy tasks than MAX_CORES allows.
        let mut tasks: Vec<Task> = (1..=(limits::MAX_CORES as u32 + 1))
            .map(|n| task(n, 1, &[9], 10))
            .collect();
        sort_tasks(&mut tasks);
        let result = partition(&mut tasks, 1, 1);
        assert!(matches!(result, Err(PartitionError::TooManyCores)));
    }
}
