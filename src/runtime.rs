pub mod job;
pub mod queue;
pub mod core;
pub mod decision;
pub mod slack;
pub mod discarded;
pub mod scheduler;

pub mod prelude {
    pub use super::job::{Job, JobStatus};
    pub use super::queue::RunQueue;
    pub use super::core::{RuntimeCore, CoreStatus, CurrentJob, WakeTime};
    pub use super::decision::{Decision, DecisionEvents};
    pub use super::scheduler::{Scheduler, IntervalReport, CoreIntervalStatus};
}
