use crate::prelude::*;

pub use partitioner::CoreType;

pub mod prelude {
    pub use super::{
        Error,
        admit_and_partition,
    };
    pub use super::feasibility;
    pub use super::edf_vd::Admission;
    pub use super::partitioner::{Core, CoreType, PartitionError};
}

pub mod feasibility;
pub mod edf_vd;
pub mod partitioner;

#[derive(Debug)]
pub enum Error {
    /// MCS feasibility floor exceeds what the partitioner could place —
    /// surfaced by the partitioner itself as [`PartitionError::TooManyCores`].
    Partition(partitioner::PartitionError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Partition(partitioner::PartitionError::TooManyCores) =>
                write!(f, "task set requires more cores than the configured maximum"),
        }
    }
}

impl std::error::Error for Error {}

/// Offline preprocessing driver: sort, compute the MCS feasibility floor and
/// hyperperiod, then partition — `driver.c::main`'s offline section, minus
/// input parsing (handled by [`crate::common::taskset_serde`]) and reporting
/// (handled by the CLI's report module).
pub fn admit_and_partition(tasks: &mut Vec<Task>, max_criticality: u32) -> Result<(Vec<partitioner::Core>, Tick), Error> {
    sort_tasks(tasks);

    let min_cores = feasibility::min_cores_required(tasks, max_criticality).max(1);
    let hyperperiod = feasibility::hyperperiod(tasks);

    let cores = partitioner::partition(tasks, min_cores, max_criticality)
        .map_err(Error::Partition)?;

    Ok((cores, hyperperiod))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_task_admits_and_partitions_onto_one_core() {
        let mut tasks = vec![Task::new(1, Tick::zero(), Tick(10), Tick(10), 1, &[Tick(3)])];
        let (cores, hyperperiod) = admit_and_partition(&mut tasks, 1).unwrap();
        assert_eq!(cores.len(), 1);
        assert_eq!(hyperperiod, Tick(10));
    }
}
