use crate::prelude::*;
use crate::offline::CoreType;
use super::decision::Decision;
use super::decision::DecisionEvents;
use super::queue::RunQueue;

/// The `status == SHUTDOWN` boolean plus a `wakeup_time` sentinel (`NA = -1`)
/// become a pair of tagged enums instead of magic values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoreStatus {
    Active,
    Shutdown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WakeTime {
    Never,
    At(VTime),
}

impl WakeTime {
    pub fn at(&self) -> Option<VTime> {
        match self {
            WakeTime::At(t) => Some(*t),
            WakeTime::Never => None,
        }
    }
}

/// `IDLE_TASK_NO = 0` becomes a tagged variant holding the actual running
/// [`Job`] rather than a job struct permanently parked at a sentinel task
/// number.
#[derive(Clone, Debug)]
pub enum CurrentJob {
    Idle,
    Running(Job),
}

impl CurrentJob {
    pub fn is_idle(&self) -> bool {
        matches!(self, CurrentJob::Idle)
    }

    pub fn as_job(&self) -> Option<&Job> {
        match self {
            CurrentJob::Running(j) => Some(j),
            CurrentJob::Idle => None,
        }
    }

    pub fn as_job_mut(&mut self) -> Option<&mut Job> {
        match self {
            CurrentJob::Running(j) => Some(j),
            CurrentJob::Idle => None,
        }
    }
}

/// Per-core runtime state — `scheduler.c`'s `Cores` structure, minus the
/// static (post-partitioning) fields that live on [`crate::offline::partitioner::Core`].
/// A `Scheduler` owns one of these per allocated core.
#[derive(Clone, Debug)]
pub struct RuntimeCore {
    pub core_no: CoreId,
    pub threshold_criticality: u32,
    pub core_type: CoreType,

    pub status: CoreStatus,
    pub wakeup_time: WakeTime,
    pub operating_frequency: f64,
    pub core_criticality: u32,
    /// Slack at levels `[current_level ..= max_criticality]`, indexed by
    /// `level - 1` exactly like `Task::wcet_own` — entries below the
    /// current level are unused and left `None`.
    pub slack_available: [Option<VTime>; limits::MAX_LEVELS],
    pub idle_time: VTime,
    pub curr_exe_job: CurrentJob,
    pub run_queue: RunQueue,
    pub decision: Decision,
}

impl RuntimeCore {
    pub fn new(core_no: CoreId, threshold_criticality: u32, core_type: CoreType, current_level: u32) -> Self {
        Self {
            core_no,
            threshold_criticality,
            core_type,
            status: CoreStatus::Active,
            wakeup_time: WakeTime::Never,
            operating_frequency: limits::BASE_OPERATING_FREQUENCY,
            core_criticality: current_level,
            slack_available: [None; limits::MAX_LEVELS],
            idle_time: VTime::zero(),
            curr_exe_job: CurrentJob::Idle,
            run_queue: RunQueue::new(),
            decision: Decision { time: VTime::zero(), events: DecisionEvents::empty() },
        }
    }

    pub fn slack_at(&self, level: u32) -> Option<VTime> {
        self.slack_available[level as usize - 1]
    }

    pub fn set_slack_at(&mut self, level: u32, value: VTime) {
        self.slack_available[level as usize - 1] = Some(value);
    }
}
