use crate::prelude::*;
use super::core::RuntimeCore;
use super::queue::RunQueue;
use super::decision::tasks_on_core;
use super::job;
use super::slack;

/// Drop discarded-queue jobs that can no longer complete even if scheduled
/// immediately at the current level: `sched_deadline - wcet_budget[current_level]
/// < now`. `dp_slack.c::schedule_discarded_job`'s deadline-miss sweep;
/// a missed deadline in the discarded queue is silently dropped.
fn drop_missed_deadlines(discarded: &mut [RunQueue], current_level: u32, now: VTime) {
    for level_queue in discarded.iter_mut().take(current_level as usize - 1) {
        level_queue.extract_if_all(|job| job.sched_deadline - job.wcet_budget_at(current_level) < now);
    }
}

fn highest_nonempty_upto(discarded: &[RunQueue], limit: usize) -> Option<usize> {
    (0..limit).rev().find(|&i| !discarded[i].is_empty())
}

/// Attempt to admit discarded jobs back into `core`'s run queue: try the
/// highest-criticality non-empty discarded queue first, falling back to the
/// next lower one as each empties. Grounded on `dp_slack.c::schedule_discarded_job`,
/// with the next-arrival anticipation below indexing the owning task's own
/// criticality, not the discarded-queue level it happened to sit in.
pub fn schedule_discarded_job(
    core: &mut RuntimeCore,
    discarded: &mut [RunQueue],
    tasks: &[Task],
    current_level: u32,
    max_criticality: u32,
    hyperperiod: Tick,
    now: VTime,
) {
    drop_missed_deadlines(discarded, current_level, now);

    let Some(mut i) = highest_nonempty_upto(discarded, current_level as usize - 1) else { return };

    while !discarded[i].is_empty() {
        let Some(candidate) = discarded[i].pop_head() else { break };

        let mut slack_ok = true;

        for level in current_level..=max_criticality {
            let mut available = slack::available_at(
                &core.run_queue,
                tasks,
                core.core_no,
                core.threshold_criticality,
                candidate.sched_deadline,
                level,
                now,
                hyperperiod,
            );

            // Expected completion of the run queue's own work up to the
            // candidate's deadline, at this level's WCET budgets.
            let expected_completion = now + core.run_queue.iter()
                .take_while(|j| j.sched_deadline <= candidate.sched_deadline)
                .map(|j| j.wcet_budget_at(level))
                .sum::<VTime>();

            // Reserve bandwidth for higher-criticality discarded jobs
            // (criticality in (discarded-queue level, current_level)) that
            // would arrive before the candidate is expected to complete.
            for task in tasks_on_core(tasks, core.core_no) {
                if task.criticality > (i as u32 + 1) && task.criticality < current_level {
                    let next_arrival = job::next_job_arrival(task, now);
                    if next_arrival < expected_completion {
                        available = available - VTime::from(task.wcet_at(level));
                    }
                }
            }

            if available < candidate.wcet_budget_at(candidate.job_criticality) {
                slack_ok = false;
            }
        }

        if slack_ok {
            core.run_queue.insert(candidate);
        }

        if discarded[i].is_empty() {
            match highest_nonempty_upto(discarded, i) {
                Some(lower) => i = lower,
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offline::CoreType;
    use crate::runtime::job::JobStatus;

    fn job(task_no: u32, deadline: f64, crit: u32) -> Job {
        Job {
            job_no: 0,
            task_no,
            allocated_core: 1,
            arrival_time: VTime::zero(),
            sched_deadline: VTime::new(deadline),
            execution_time: VTime::new(1.0),
            wcet_budget: [VTime::new(1.0); limits::MAX_LEVELS],
            job_criticality: crit,
            status: JobStatus::Ready,
        }
    }

    #[test]
    fn ample_slack_readmits_discarded_job() {
        let mut core = RuntimeCore::new(1, 2, CoreType::Shutdownable, 2);
        let tasks: Vec<Task> = vec![];
        let mut discarded = vec![RunQueue::new()];
        discarded[0].insert(job(1, 50.0, 1));

        schedule_discarded_job(&mut core, &mut discarded, &tasks, 2, 2, Tick(1000), VTime::zero());

        assert!(discarded[0].is_empty());
        assert_eq!(core.run_queue.len(), 1);
    }

    #[test]
    fn missed_deadline_is_dropped_silently() {
        let mut core = RuntimeCore::new(1, 2, CoreType::Shutdownable, 2);
        let tasks: Vec<Task> = vec![];
        let mut discarded = vec![RunQueue::new()];
        // deadline already effectively passed: deadline - budget < now
        let mut stale = job(1, 0.5, 1);
        stale.wcet_budget = [VTime::new(1.0); limits::MAX_LEVELS];
        discarded[0].insert(stale);

        schedule_discarded_job(&mut core, &mut discarded, &tasks, 2, 2, Tick(1000), VTime::new(1.0));

        assert!(discarded[0].is_empty());
        assert_eq!(core.run_queue.len(), 0);
    }
}
