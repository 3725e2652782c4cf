use crate::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobStatus {
    Ready,
    Preempted,
}

/// A single release instance of a task — `scheduler.c`'s `Jobs` structure.
#[derive(Clone, Debug)]
pub struct Job {
    pub job_no: u64,
    pub task_no: u32,
    pub allocated_core: CoreId,
    pub arrival_time: VTime,
    pub sched_deadline: VTime,
    pub execution_time: VTime,
    pub wcet_budget: [VTime; limits::MAX_LEVELS],
    pub job_criticality: u32,
    pub status: JobStatus,
}

impl Job {
    pub fn wcet_budget_at(&self, level: u32) -> VTime {
        self.wcet_budget[level as usize - 1]
    }

    pub fn wcet_budget_at_mut(&mut self, level: u32) -> &mut VTime {
        &mut self.wcet_budget[level as usize - 1]
    }
}

/// The next release instant of `task` at or after `now + TIME_GRANULARITY`.
/// `scheduler.c::get_next_job_arrival`. `now` is generally fractional (a
/// job's remaining execution time is randomized), but the result is always
/// an exact integer tick since `phase` and `period` are integers.
pub fn next_job_arrival(task: &Task, now: VTime) -> VTime {
    let delta = now.as_f64() + limits::TIME_GRANULARITY - task.phase.0 as f64;

    let instance = if delta > 0.0 {
        (delta / task.period.0 as f64).ceil() as u64
    } else {
        0
    };

    VTime::new(task.phase.0 as f64 + instance as f64 * task.period.0 as f64)
}

/// Whether `now` (expected to already be an exact tick value — a scheduler
/// decision point, not a mid-execution instant) is itself a release instant
/// of `task`. Integer arithmetic in place of a hand-rolled `find_modulo`
/// float loop.
pub fn is_arrival_instant(task: &Task, now: VTime) -> bool {
    let now_ticks = now.as_f64().round() as i64;
    let phase = task.phase.0 as i64;
    let period = task.period.0 as i64;

    now_ticks >= phase && (now_ticks - phase) % period == 0
}

fn wcet_budget_array(task: &Task) -> [VTime; limits::MAX_LEVELS] {
    let mut wcet_budget = [VTime::zero(); limits::MAX_LEVELS];
    for (level, slot) in wcet_budget.iter_mut().enumerate() {
        let level = level as u32 + 1;
        *slot =
            if level <= task.criticality {
                task.wcet_at(level).into()
            } else {
                task.wcet_at(task.criticality).into()
            };
    }
    wcet_budget
}

fn sched_deadline_for(task: &Task, threshold_criticality: u32, current_level: u32, arrival_time: VTime) -> VTime {
    if current_level <= threshold_criticality {
        arrival_time + task.virtual_deadline
    } else {
        arrival_time + task.deadline.into()
    }
}

fn allocated_core_of(task: &Task) -> CoreId {
    match task.allocated_core {
        Allocation::OnCore(core_no) => core_no,
        Allocation::Unassigned => unreachable!("jobs are only created for admitted tasks"),
    }
}

/// Instantiate the job released by `task` at the exact tick `arrival_time`.
/// `scheduler.c::create_job_structure`.
pub fn create_job(
    task: &Task,
    threshold_criticality: u32,
    current_level: u32,
    arrival_time: VTime,
    rng: &mut impl rand::Rng,
) -> Job {
    let arrival_ticks = arrival_time.as_f64().round() as u64;
    let job_no = (arrival_ticks - task.phase.0) / task.period.0;

    let own_wcet = task.wcet_at(task.criticality).0;
    let execution_time = VTime::new((rng.random_range(0..own_wcet) + 1) as f64);

    Job {
        job_no,
        task_no: task.task_no,
        allocated_core: allocated_core_of(task),
        arrival_time,
        sched_deadline: sched_deadline_for(task, threshold_criticality, current_level, arrival_time),
        execution_time,
        wcet_budget: wcet_budget_array(task),
        job_criticality: task.criticality,
        status: JobStatus::Ready,
    }
}

/// Instantiate a job the slack analyzer anticipates but does not actually
/// dispatch (`dp_slack.c::add_anticipated_arrivals`'s
/// `create_job_structure` call). Its `execution_time` is never consulted —
/// an anticipated job's `arrival_time` is always in the future relative to
/// the instant it is anticipated at, so the slack calculation's "already
/// arrived" branch never reads it — but the field is populated anyway so
/// the value carries the same invariants as a real job.
pub fn create_anticipated_job(task: &Task, threshold_criticality: u32, current_level: u32, arrival_time: VTime) -> Job {
    let arrival_ticks = arrival_time.as_f64().round() as u64;
    let job_no = (arrival_ticks - task.phase.0) / task.period.0;

    Job {
        job_no,
        task_no: task.task_no,
        allocated_core: allocated_core_of(task),
        arrival_time,
        sched_deadline: sched_deadline_for(task, threshold_criticality, current_level, arrival_time),
        execution_time: task.wcet_at(task.criticality).into(),
        wcet_budget: wcet_budget_array(task),
        job_criticality: task.criticality,
        status: JobStatus::Ready,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(criticality: u32, wcet: &[u64], period: u64) -> Task {
        let mut t = Task::new(1, Tick::zero(), Tick(period), Tick(period), criticality, &wcet.iter().map(|&w| Tick(w)).collect::<Vec<_>>());
        t.allocated_core = Allocation::OnCore(1);
        t
    }

    #[test]
    fn next_arrival_skips_to_first_release_when_now_before_phase() {
        let t = task(1, &[3], 10);
        assert_eq!(next_job_arrival(&t, VTime::new(-0.01)), VTime::new(0.0));
    }

    #[test]
    fn next_arrival_after_first_release() {
        let t = task(1, &[3], 10);
        assert_eq!(next_job_arrival(&t, VTime::new(5.0)), VTime::new(10.0));
    }

    #[test]
    fn is_arrival_instant_matches_release_ticks() {
        let t = task(1, &[3], 10);
        assert!(is_arrival_instant(&t, VTime::new(20.0)));
        assert!(!is_arrival_instant(&t, VTime::new(15.0)));
    }

    #[test]
    fn job_budgets_extend_beyond_own_criticality() {
        let t = task(2, &[2, 4], 10);
        let mut rng = rand::rng();
        let job = create_job(&t, 2, 2, VTime::zero(), &mut rng);
        assert_eq!(job.wcet_budget_at(1), VTime::new(2.0));
        assert_eq!(job.wcet_budget_at(2), VTime::new(4.0));
        assert_eq!(job.wcet_budget_at(3), VTime::new(4.0));
    }
}
