use crate::prelude::*;
use super::core::{RuntimeCore, CoreStatus, CurrentJob};
use super::job;

bitflags::bitflags! {
    /// The set of events that can fire at a scheduling decision point.
    /// `bitflags` in place of hand-added `int` constants, the way kernel
    /// and scheduler crates typically model a decision-event set.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct DecisionEvents: u8 {
        const JOB_ARRIVAL        = 0b0000_0001;
        const JOB_TERMINATION    = 0b0000_0010;
        const JOB_WCET_EXCEEDED  = 0b0000_0100;
        const JOB_OVERRUN        = 0b0000_1000;
        const WAKEUP_CORE        = 0b0001_0000;
    }
}

/// Next scheduling decision point for a single core: `(time, event_mask)`.
/// `scheduler.c::get_next_decision_point`, split into a per-core half (this
/// function) and the global `min` over cores, which the scheduler loop does
/// directly over each core's cached [`Decision`].
#[derive(Clone, Copy, Debug)]
pub struct Decision {
    pub time: VTime,
    pub events: DecisionEvents,
}

/// Tasks owned by `core_no`, filtered by whatever acceptance predicate the
/// caller needs (run queue membership, slack anticipation, ...).
pub fn tasks_on_core<'a>(tasks: &'a [Task], core_no: CoreId) -> impl Iterator<Item = &'a Task> {
    tasks.iter().filter(move |t| t.allocated_core.is_on_core(core_no))
}

/// The criticality level at/below which jobs are discarded rather than
/// accepted, for the current system criticality `level` on a core whose
/// EDF-VD threshold is `threshold`. `scheduler.c::accept_above_criticality_level`.
pub fn accept_above(level: u32, threshold: u32) -> u32 {
    if level <= threshold { level } else { threshold + 1 }
}

fn min_arrival_for_core(core: &RuntimeCore, tasks: &[Task], now: VTime, hyperperiod: Tick) -> VTime {
    tasks_on_core(tasks, core.core_no)
        .map(|t| job::next_job_arrival(t, now))
        .fold(VTime::from(hyperperiod), VTime::min)
}

/// Compute the next decision point for a single core.
pub fn next_decision_for_core(core: &RuntimeCore, tasks: &[Task], current_level: u32, now: VTime, hyperperiod: Tick) -> Decision {
    let min_arrival = min_arrival_for_core(core, tasks, now, hyperperiod);
    let mut decision = Decision { time: min_arrival, events: DecisionEvents::JOB_ARRIVAL };

    match core.status {
        CoreStatus::Active => {
            if let CurrentJob::Running(job) = &core.curr_exe_job {
                let budget = job.wcet_budget_at(current_level);
                if job.execution_time <= budget {
                    let termination = now + job.execution_time;
                    fold_event(&mut decision, termination, DecisionEvents::JOB_TERMINATION);
                } else {
                    let exceeded_at = now + budget;
                    let event = if job.job_criticality > current_level {
                        DecisionEvents::JOB_WCET_EXCEEDED
                    } else {
                        DecisionEvents::JOB_OVERRUN
                    };
                    fold_event(&mut decision, exceeded_at, event);
                }
            }
        }
        CoreStatus::Shutdown => {
            if let Some(wakeup) = core.wakeup_time.at() {
                fold_event(&mut decision, wakeup, DecisionEvents::WAKEUP_CORE);
            }
        }
    }

    decision
}

/// Earlier candidate replaces the decision outright; an exactly-equal
/// candidate ORs its event into the existing mask — `scheduler.c`'s
/// repeated "replace, or OR if equal" pattern.
fn fold_event(decision: &mut Decision, candidate_time: VTime, event: DecisionEvents) {
    if candidate_time < decision.time {
        decision.time = candidate_time;
        decision.events = event;
    } else if candidate_time == decision.time {
        decision.events |= event;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::core::{RuntimeCore, WakeTime};

    fn task(task_no: u32, phase: u64, period: u64, core_no: CoreId) -> Task {
        let mut t = Task::new(task_no, Tick(phase), Tick(period), Tick(period), 1, &[Tick(3)]);
        t.allocated_core = Allocation::OnCore(core_no);
        t
    }

    #[test]
    fn idle_active_core_reports_only_arrival() {
        let core = RuntimeCore::new(1, 1, crate::offline::CoreType::Shutdownable, 1);
        let tasks = vec![task(1, 0, 10, 1)];
        let decision = next_decision_for_core(&core, &tasks, 1, VTime::zero(), Tick(100));
        assert_eq!(decision.time, VTime::new(10.0));
        assert_eq!(decision.events, DecisionEvents::JOB_ARRIVAL);
    }

    #[test]
    fn shutdown_core_reports_wakeup_when_earlier_than_arrival() {
        let mut core = RuntimeCore::new(1, 1, crate::offline::CoreType::Shutdownable, 1);
        core.status = CoreStatus::Shutdown;
        core.wakeup_time = WakeTime::At(VTime::new(5.0));
        let tasks = vec![task(1, 0, 10, 1)];
        let decision = next_decision_for_core(&core, &tasks, 1, VTime::zero(), Tick(100));
        assert_eq!(decision.time, VTime::new(5.0));
        assert!(decision.events.contains(DecisionEvents::WAKEUP_CORE));
    }

    #[test]
    fn equal_times_or_events_together() {
        let mut core = RuntimeCore::new(1, 1, crate::offline::CoreType::Shutdownable, 1);
        core.status = CoreStatus::Shutdown;
        core.wakeup_time = WakeTime::At(VTime::new(10.0));
        let tasks = vec![task(1, 0, 10, 1)];
        let decision = next_decision_for_core(&core, &tasks, 1, VTime::zero(), Tick(100));
        assert_eq!(decision.time, VTime::new(10.0));
        assert!(decision.events.contains(DecisionEvents::JOB_ARRIVAL));
        assert!(decision.events.contains(DecisionEvents::WAKEUP_CORE));
    }
}
