use crate::prelude::*;
use super::core::RuntimeCore;
use super::queue::RunQueue;
use super::decision::{accept_above, tasks_on_core};
use super::job;

/// Copy every job in `run_queue` that is still accepted at criticality
/// `level` into a fresh dummy queue, in EDF order.
/// `dp_slack.c::copy_jobs_to_dummy_queue`.
fn copy_accepted_jobs(run_queue: &RunQueue, threshold_criticality: u32, level: u32) -> RunQueue {
    let mut dummy = RunQueue::new();
    for job in run_queue.iter() {
        if job.job_criticality >= accept_above(level, threshold_criticality) {
            dummy.insert(job.clone());
        }
    }
    dummy
}

/// Insert anticipated releases (successive instances starting at
/// `get_next_job_arrival(seed_time)`) strictly before `max_arrival_time`
/// into `dummy`. `dp_slack.c::add_anticipated_arrivals`.
fn add_anticipated_arrivals(
    dummy: &mut RunQueue,
    max_arrival_time: VTime,
    tasks: &[Task],
    core_no: CoreId,
    threshold_criticality: u32,
    level: u32,
    seed_time: VTime,
) {
    for task in tasks_on_core(tasks, core_no) {
        if task.criticality < accept_above(level, threshold_criticality) {
            continue;
        }

        let mut next_arrival = job::next_job_arrival(task, seed_time);
        while next_arrival < max_arrival_time {
            dummy.insert(job::create_anticipated_job(task, threshold_criticality, level, next_arrival));
            next_arrival = next_arrival + VTime::from(task.period);
        }
    }
}

/// Dynamic-procrastination slack: how long execution of every dummy-queue
/// job can be deferred without missing `latest_arrival`, at WCET budgets
/// for criticality `level`. `dp_slack.c::calculate_slack_available`.
///
/// Walks `dummy` from tail to head, deleting each visited node by popping
/// it, which sidesteps a `temp = temp->prev` re-read entirely: a `Vec`'s
/// new tail after `pop()` *is* the predecessor, with no stale pointer to
/// dereference.
fn calculate_slack_available(dummy: &mut RunQueue, latest_arrival: VTime, max_deadline: VTime, now: VTime, level: u32) -> VTime {
    let mut latest_start = max_deadline;
    let mut window_consumed = VTime::zero();

    while let Some(job) = dummy.pop_tail() {
        if job.sched_deadline > max_deadline {
            // Case A: only partially executes before max_deadline.
            let span = job.sched_deadline - job.arrival_time;
            let share = (max_deadline - job.arrival_time) * (job.wcet_budget_at(level).as_f64() / span.as_f64());
            latest_start = latest_start - share;
        } else if job.sched_deadline > latest_arrival {
            // Case B: must complete, deadline within (latest_arrival, max_deadline].
            latest_start = VTime::min(latest_start, job.sched_deadline);
            latest_start = latest_start - if job.arrival_time > now { job.wcet_budget_at(level) } else { job.execution_time };
        } else {
            // Case C: deadline at/before latest_arrival, consumes the discarded job's window.
            window_consumed = window_consumed + if job.arrival_time > now { job.wcet_budget_at(level) } else { job.execution_time };
        }
    }

    if latest_start >= latest_arrival {
        (latest_arrival - now) - window_consumed
    } else {
        (latest_start - now) - window_consumed
    }
}

/// Slack available, at criticality `level`, on `core_no` before
/// `latest_arrival`, given the jobs currently in `run_queue` plus
/// anticipated future releases. `dp_slack.c::get_dynamic_procrastination_slack`'s
/// per-level body (the outer loop over levels lives in [`populate_core_slack`]
/// and in `runtime::discarded`, matching the two call sites upstream).
pub fn available_at(
    run_queue: &RunQueue,
    tasks: &[Task],
    core_no: CoreId,
    threshold_criticality: u32,
    latest_arrival: VTime,
    level: u32,
    now: VTime,
    hyperperiod: Tick,
) -> VTime {
    let mut dummy = copy_accepted_jobs(run_queue, threshold_criticality, level);
    add_anticipated_arrivals(&mut dummy, latest_arrival, tasks, core_no, threshold_criticality, level, now);

    let max_deadline = VTime::min(
        dummy.max_deadline().unwrap_or_else(|| VTime::from(hyperperiod)),
        VTime::from(hyperperiod),
    );

    let seed = latest_arrival - VTime::new(limits::TIME_GRANULARITY);
    add_anticipated_arrivals(&mut dummy, max_deadline, tasks, core_no, threshold_criticality, level, seed);

    calculate_slack_available(&mut dummy, latest_arrival, max_deadline, now, level)
}

/// Populate `core.slack_available` for every level in `current_level..=max_criticality`
/// — used by the shutdown-evaluation step.
pub fn populate_core_slack(
    core: &mut RuntimeCore,
    tasks: &[Task],
    latest_arrival: VTime,
    current_level: u32,
    max_criticality: u32,
    now: VTime,
    hyperperiod: Tick,
) {
    for level in current_level..=max_criticality {
        let slack = available_at(&core.run_queue, tasks, core.core_no, core.threshold_criticality, latest_arrival, level, now, hyperperiod);
        core.set_slack_at(level, slack);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offline::CoreType;

    fn task(task_no: u32, phase: u64, period: u64, core_no: CoreId) -> Task {
        let mut t = Task::new(task_no, Tick(phase), Tick(period), Tick(period), 1, &[Tick(3)]);
        t.allocated_core = Allocation::OnCore(core_no);
        t
    }

    #[test]
    fn empty_queue_and_no_future_task_gives_full_window_as_slack() {
        let run_queue = RunQueue::new();
        let tasks: Vec<Task> = vec![];
        let slack = available_at(&run_queue, &tasks, 1, 1, VTime::new(20.0), 1, VTime::zero(), Tick(100));
        assert_eq!(slack, VTime::new(20.0));
    }

    #[test]
    fn anticipated_arrival_before_latest_consumes_window() {
        let run_queue = RunQueue::new();
        let tasks = vec![task(1, 0, 10, 1)];
        // next arrival at t=10 with wcet 3, deadline 10 (so sched_deadline=20 <= latest_arrival? depends)
        let slack = available_at(&run_queue, &tasks, 1, 1, VTime::new(25.0), 1, VTime::zero(), Tick(100));
        // one job releases at 10, deadline 20 (<=25) -> falls under case B or C depending on max_deadline
        assert!(slack.as_f64() < 25.0);
    }

    #[test]
    fn populate_core_slack_fills_every_requested_level() {
        let mut core = RuntimeCore::new(1, 2, CoreType::Shutdownable, 1);
        let tasks: Vec<Task> = vec![];
        populate_core_slack(&mut core, &tasks, VTime::new(10.0), 1, 2, VTime::zero(), Tick(50));
        assert!(core.slack_at(1).is_some());
        assert!(core.slack_at(2).is_some());
    }
}
