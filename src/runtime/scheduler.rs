use crate::prelude::*;
use super::core::{RuntimeCore, CoreStatus, CurrentJob};
use super::decision::{self, accept_above, DecisionEvents};
use super::discarded;
use super::job;
use super::queue::RunQueue;
use super::slack;

use rand::SeedableRng;
use rand::rngs::StdRng;

/// One core's status over the `[from, to)` interval just simulated, for the
/// CLI's schedule trace — `scheduler.c`'s per-tick trace printfs, lifted out
/// of the scheduler loop itself so reporting stays a pure function of this
/// data (`cli-bin::report`).
#[derive(Clone, Debug)]
pub enum CoreIntervalStatus {
    Idle { core_no: CoreId },
    Running { core_no: CoreId, task_no: u32, job_no: u64, preempted: bool },
    PoweredDown { core_no: CoreId },
}

#[derive(Clone, Debug)]
pub struct IntervalReport {
    pub from: VTime,
    pub to: VTime,
    /// `Some(new_level)` when criticality escalation fired during this step.
    pub mode_change: Option<u32>,
    pub per_core: Vec<CoreIntervalStatus>,
}

/// Owns every piece of runtime state the scheduler loop touches and drives
/// it through the per-decision-point loop — `scheduler.c::main`'s
/// `while (timecount < hyperperiod)` body, restructured as one `step()` call
/// per iteration so the CLI can drive it and collect a report per step.
pub struct Scheduler {
    pub tasks: Vec<Task>,
    pub cores: Vec<RuntimeCore>,
    /// Per-criticality-level global discarded-job queues, indexed `level - 1`,
    /// one entry for every level below `max_criticality` (a job discarded at
    /// the top level has nowhere lower to wait). `dp_slack.c`'s `dhead` array.
    pub discarded: Vec<RunQueue>,
    /// Jobs accepted on a core that was `Shutdown` at arrival time, held
    /// until that core wakes and pulls its own jobs back out.
    pub pending: RunQueue,
    pub current_level: u32,
    pub max_criticality: u32,
    pub hyperperiod: Tick,
    pub timecount: VTime,
    rng: StdRng,
}

impl Scheduler {
    pub fn new(
        tasks: Vec<Task>,
        cores: Vec<crate::offline::partitioner::Core>,
        max_criticality: u32,
        hyperperiod: Tick,
        seed: u64,
    ) -> Self {
        let runtime_cores = cores
            .into_iter()
            .map(|c| RuntimeCore::new(c.core_no, c.threshold_criticality, c.core_type, 1))
            .collect();

        let discarded = (0..max_criticality.saturating_sub(1)).map(|_| RunQueue::new()).collect();

        Self {
            tasks,
            cores: runtime_cores,
            discarded,
            pending: RunQueue::new(),
            current_level: 1,
            max_criticality,
            hyperperiod,
            timecount: VTime::zero(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn recompute_all_decisions(&mut self, now: VTime) {
        for idx in 0..self.cores.len() {
            self.cores[idx].decision =
                decision::next_decision_for_core(&self.cores[idx], &self.tasks, self.current_level, now, self.hyperperiod);
        }
    }

    fn global_next_decision(&self) -> VTime {
        self.cores.iter().map(|c| c.decision.time).fold(VTime::from(self.hyperperiod), VTime::min)
    }

    /// Run to completion (`timecount` reaches the hyperperiod), returning one
    /// [`IntervalReport`] per decision point.
    pub fn run(&mut self) -> Vec<IntervalReport> {
        let mut reports = Vec::new();

        self.recompute_all_decisions(VTime::new(-limits::TIME_GRANULARITY));
        self.timecount = self.global_next_decision();

        while self.timecount < VTime::from(self.hyperperiod) {
            reports.push(self.step());
        }

        reports
    }

    /// Advance from `self.timecount` to the next decision point in eight
    /// steps, mirroring `scheduler.c::main`'s loop body.
    fn step(&mut self) -> IntervalReport {
        let now = self.timecount;

        self.preempt_running_jobs();
        self.admit_arrivals(now);
        self.evaluate_shutdown(now);

        if self.current_level > 1 {
            for idx in 0..self.cores.len() {
                if self.cores[idx].status == CoreStatus::Active {
                    discarded::schedule_discarded_job(
                        &mut self.cores[idx],
                        &mut self.discarded,
                        &self.tasks,
                        self.current_level,
                        self.max_criticality,
                        self.hyperperiod,
                        now,
                    );
                }
            }
        }

        let mode_change = self.handle_criticality_escalation(now);
        self.wake_cores(now);
        self.dispatch();

        self.recompute_all_decisions(now);
        let mut next = self.global_next_decision();
        if next > VTime::from(self.hyperperiod) {
            next = VTime::from(self.hyperperiod);
        }

        let per_core = self.advance_clocks(now, next);
        self.timecount = next;

        IntervalReport { from: now, to: next, mode_change, per_core }
    }

    /// Step 1: requeue every active core's currently-executing job, marked
    /// `Preempted`, if it still has remaining execution time. `curr_exe_job`
    /// itself is left untouched — it is wholesale replaced at [`Self::dispatch`]
    /// regardless, so there is nothing to clear here. `scheduler.c`'s
    /// preemption block.
    fn preempt_running_jobs(&mut self) {
        for core in &mut self.cores {
            if core.status != CoreStatus::Active {
                continue;
            }
            if let CurrentJob::Running(job) = &core.curr_exe_job {
                if job.execution_time > VTime::zero() {
                    let mut preempted = job.clone();
                    preempted.status = JobStatus::Preempted;
                    core.run_queue.insert(preempted);
                }
            }
        }
    }

    /// Step 2: instantiate every task releasing exactly at `now`, routing
    /// each new job to its core's run queue (or the global pending queue, if
    /// that core is asleep), or to the matching discarded queue if criticality
    /// filtering rejects it. `scheduler.c`'s arrival block.
    fn admit_arrivals(&mut self, now: VTime) {
        for core_idx in 0..self.cores.len() {
            let fires = self.cores[core_idx].decision.time == now
                && self.cores[core_idx].decision.events.contains(DecisionEvents::JOB_ARRIVAL);
            if !fires {
                continue;
            }

            let core_no = self.cores[core_idx].core_no;
            let threshold = self.cores[core_idx].threshold_criticality;
            let accept_level = accept_above(self.current_level, threshold);

            for t_idx in 0..self.tasks.len() {
                if !self.tasks[t_idx].allocated_core.is_on_core(core_no) {
                    continue;
                }
                if !job::is_arrival_instant(&self.tasks[t_idx], now) {
                    continue;
                }

                let new_job = job::create_job(&self.tasks[t_idx], threshold, self.current_level, now, &mut self.rng);

                if new_job.job_criticality >= accept_level {
                    if self.cores[core_idx].status == CoreStatus::Active {
                        self.cores[core_idx].run_queue.insert(new_job);
                    } else {
                        self.pending.insert(new_job);
                    }
                } else {
                    self.discarded[(new_job.job_criticality - 1) as usize].insert(new_job);
                }
            }
        }
    }

    /// Step 3: for every active core whose run queue just emptied, decide
    /// whether to power it down, and for how long. `scheduler.c`'s shutdown
    /// block / `dp_slack.c::get_dynamic_procrastination_slack`'s shutdown
    /// call site.
    fn evaluate_shutdown(&mut self, now: VTime) {
        for core_idx in 0..self.cores.len() {
            if self.cores[core_idx].status != CoreStatus::Active {
                continue;
            }
            if !self.cores[core_idx].run_queue.is_empty() {
                continue;
            }

            let core_no = self.cores[core_idx].core_no;
            let threshold = self.cores[core_idx].threshold_criticality;
            let accept_level = accept_above(self.current_level, threshold);

            let mut next_arrival = VTime::from(self.hyperperiod);
            let mut min_task_deadline = Tick::zero();
            for task in decision::tasks_on_core(&self.tasks, core_no) {
                if task.criticality < accept_level {
                    continue;
                }
                let arrival = job::next_job_arrival(task, now);
                if arrival < next_arrival {
                    next_arrival = arrival;
                    min_task_deadline = task.deadline;
                }
            }

            if next_arrival >= now + VTime::new(limits::SHUTDOWN_THRESHOLD) {
                self.cores[core_idx].wakeup_time = WakeTime::At(next_arrival);
                self.cores[core_idx].status = CoreStatus::Shutdown;
                continue;
            }

            let latest_arrival = next_arrival + VTime::from(min_task_deadline);
            slack::populate_core_slack(
                &mut self.cores[core_idx], &self.tasks, latest_arrival,
                self.current_level, self.max_criticality, now, self.hyperperiod,
            );

            let all_sufficient = (self.current_level..=self.max_criticality).all(|level| {
                self.cores[core_idx].slack_at(level).map_or(false, |s| s.as_f64() >= limits::SHUTDOWN_THRESHOLD)
            });

            if all_sufficient {
                if let Some(wakeup) = self.cores[core_idx].slack_at(self.current_level) {
                    self.cores[core_idx].wakeup_time = WakeTime::At(wakeup);
                    self.cores[core_idx].status = CoreStatus::Shutdown;
                }
            }
        }
    }

    /// Step 5: bump `current_level` when a `JOB_WCET_EXCEEDED` event fired
    /// anywhere this tick, reclaim the running job on every affected core,
    /// discard any now-unacceptable queued jobs, and rewrite deadlines for
    /// cores whose threshold the new level just crossed into HI mode.
    /// `scheduler.c`'s escalation block.
    fn handle_criticality_escalation(&mut self, now: VTime) -> Option<u32> {
        let escalate = self.cores.iter().any(|c| {
            c.status == CoreStatus::Active
                && c.decision.time == now
                && c.decision.events.contains(DecisionEvents::JOB_WCET_EXCEEDED)
        });

        if !escalate {
            for core in &mut self.cores {
                if core.status == CoreStatus::Active
                    && core.decision.time == now
                    && core.decision.events.contains(DecisionEvents::JOB_OVERRUN)
                {
                    core.curr_exe_job = CurrentJob::Idle;
                }
            }
            return None;
        }

        self.current_level += 1;
        let new_level = self.current_level;

        for core_idx in 0..self.cores.len() {
            let fires_now = self.cores[core_idx].decision.time == now;
            self.cores[core_idx].core_criticality += 1;

            if self.cores[core_idx].status == CoreStatus::Active && fires_now {
                let events = self.cores[core_idx].decision.events;
                if events.contains(DecisionEvents::JOB_WCET_EXCEEDED) {
                    if let CurrentJob::Running(job) = &self.cores[core_idx].curr_exe_job {
                        if job.execution_time == VTime::zero() {
                            let mut preempted = job.clone();
                            preempted.status = JobStatus::Preempted;
                            self.cores[core_idx].run_queue.insert(preempted);
                            self.cores[core_idx].curr_exe_job = CurrentJob::Idle;
                        }
                    }
                } else if events.contains(DecisionEvents::JOB_OVERRUN) {
                    self.cores[core_idx].curr_exe_job = CurrentJob::Idle;
                }
            }

            let threshold = self.cores[core_idx].threshold_criticality;
            let accept_level = accept_above(new_level, threshold);

            let rejected = self.cores[core_idx].run_queue.extract_if_all(|j| j.job_criticality < accept_level);
            for job in rejected {
                self.discarded[(job.job_criticality - 1) as usize].insert(job);
            }

            if new_level > threshold {
                let tasks = &self.tasks;
                for job in self.cores[core_idx].run_queue.iter_mut() {
                    if let Some(task) = tasks.iter().find(|t| t.task_no == job.task_no) {
                        job.sched_deadline = job.arrival_time + VTime::from(task.deadline);
                    }
                }
                self.cores[core_idx].run_queue.merge_sort();
            }
        }

        Some(new_level)
    }

    /// Step 6: wake cores whose `WAKEUP_CORE` event fired, handing back
    /// whatever jobs arrived for them while asleep.
    fn wake_cores(&mut self, now: VTime) {
        for core_idx in 0..self.cores.len() {
            let wakes = self.cores[core_idx].status == CoreStatus::Shutdown
                && self.cores[core_idx].decision.time == now
                && self.cores[core_idx].decision.events.contains(DecisionEvents::WAKEUP_CORE);
            if !wakes {
                continue;
            }

            self.cores[core_idx].status = CoreStatus::Active;
            self.cores[core_idx].wakeup_time = WakeTime::Never;

            let core_no = self.cores[core_idx].core_no;
            let transferred = self.pending.extract_if_all(|j| j.allocated_core == core_no);
            for job in transferred {
                self.cores[core_idx].run_queue.insert(job);
            }
        }
    }

    /// Step 7: pull the earliest-deadline job off every active core's run
    /// queue. `scheduler.c::schedule_next_job`.
    fn dispatch(&mut self) {
        for core in &mut self.cores {
            if core.status == CoreStatus::Active {
                core.curr_exe_job = match core.run_queue.pop_head() {
                    Some(job) => CurrentJob::Running(job),
                    None => CurrentJob::Idle,
                };
            }
        }
    }

    /// Step 8: advance every core's clock from `now` to `next`, decrementing
    /// the dispatched job's remaining execution time and per-level WCET
    /// budgets, and build this interval's trace entries.
    fn advance_clocks(&mut self, now: VTime, next: VTime) -> Vec<CoreIntervalStatus> {
        let elapsed = next - now;
        let mut per_core = Vec::with_capacity(self.cores.len());

        for core in &mut self.cores {
            match core.status {
                CoreStatus::Active => match &mut core.curr_exe_job {
                    CurrentJob::Running(job) => {
                        job.execution_time = job.execution_time - elapsed;
                        for level in 1..=self.max_criticality {
                            let budget = job.wcet_budget_at(level);
                            *job.wcet_budget_at_mut(level) = budget - elapsed;
                        }
                        per_core.push(CoreIntervalStatus::Running {
                            core_no: core.core_no,
                            task_no: job.task_no,
                            job_no: job.job_no,
                            preempted: job.status == JobStatus::Preempted,
                        });
                    }
                    CurrentJob::Idle => {
                        core.idle_time = core.idle_time + elapsed;
                        per_core.push(CoreIntervalStatus::Idle { core_no: core.core_no });
                    }
                },
                CoreStatus::Shutdown => {
                    per_core.push(CoreIntervalStatus::PoweredDown { core_no: core.core_no });
                }
            }
        }

        per_core
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offline::partitioner::Core as OfflineCore;
    use crate::offline::CoreType;

    fn single_task_core() -> (Vec<Task>, Vec<OfflineCore>) {
        let mut task = Task::new(1, Tick::zero(), Tick(10), Tick(10), 1, &[Tick(3)]);
        task.allocated_core = Allocation::OnCore(1);
        let core = OfflineCore {
            core_no: 1,
            utilization: 0.3,
            remaining_capacity: 0.7,
            threshold_criticality: 1,
            core_type: CoreType::NonShutdownable,
        };
        (vec![task], vec![core])
    }

    #[test]
    fn single_lo_task_runs_to_completion_every_hyperperiod() {
        let (tasks, cores) = single_task_core();
        let mut scheduler = Scheduler::new(tasks, cores, 1, Tick(10), 42);
        let reports = scheduler.run();
        assert!(!reports.is_empty());
        assert_eq!(scheduler.timecount, VTime::new(10.0));
    }

    #[test]
    fn no_escalation_with_a_single_criticality_level() {
        let (tasks, cores) = single_task_core();
        let mut scheduler = Scheduler::new(tasks, cores, 1, Tick(20), 7);
        scheduler.run();
        assert_eq!(scheduler.current_level, 1);
    }

    #[test]
    fn idle_core_with_no_tasks_converges_immediately_to_the_hyperperiod() {
        // With no tasks at all there is nothing to arrive, so the very first
        // decision point already lands on the hyperperiod and the loop never
        // executes a single step.
        let core = OfflineCore {
            core_no: 1,
            utilization: 0.0,
            remaining_capacity: 1.0,
            threshold_criticality: 1,
            core_type: CoreType::Shutdownable,
        };
        let mut scheduler = Scheduler::new(vec![], vec![core], 1, Tick(50), 1);
        let reports = scheduler.run();
        assert!(reports.is_empty());
        assert_eq!(scheduler.timecount, VTime::new(50.0));
    }

    #[test]
    fn idle_intervals_between_releases_report_idle_status() {
        let (tasks, cores) = single_task_core();
        let mut scheduler = Scheduler::new(tasks, cores, 1, Tick(10), 3);
        let reports = scheduler.run();
        assert!(reports.iter().any(|r| matches!(r.per_core.first(), Some(CoreIntervalStatus::Idle { .. }))));
    }
}
