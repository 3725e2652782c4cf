use crate::prelude::*;

/// EDF-ordered queue of [`Job`]s. `scheduler.c`'s intrusive doubly-linked
/// `RQ_HEAD`/`RQ_NODE` pair becomes a single owning `Vec`. A `Vec` of owned
/// [`Job`] values has no aliasing to worry about — removal is by value, not
/// by pointer, so there is nothing analogous to a `temp->prev`
/// use-after-free hazard to guard against.
#[derive(Clone, Debug, Default)]
pub struct RunQueue {
    jobs: Vec<Job>,
}

impl RunQueue {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Job> {
        self.jobs.iter_mut()
    }

    /// Insert `job` keeping the queue sorted by `sched_deadline` ascending.
    /// Ties keep insertion order: `partition_point` on `<=` walks past every
    /// existing job with a deadline no later than the new one, so the new
    /// job lands after them — `scheduler.c::update_run_queue`.
    pub fn insert(&mut self, job: Job) {
        let pos = self.jobs.partition_point(|j| j.sched_deadline <= job.sched_deadline);
        self.jobs.insert(pos, job);
    }

    /// Dequeue the earliest-deadline job, or `None` on an empty queue — the
    /// caller (`runtime::scheduler`) maps this to the IDLE sentinel.
    /// `scheduler.c::schedule_next_job`.
    pub fn pop_head(&mut self) -> Option<Job> {
        if self.jobs.is_empty() { None } else { Some(self.jobs.remove(0)) }
    }

    pub fn peek_head(&self) -> Option<&Job> {
        self.jobs.first()
    }

    /// Remove the job identified by `(task_no, job_no)`.
    /// `scheduler.c::delete_job_from_queue`.
    pub fn remove(&mut self, task_no: u32, job_no: u64) -> Option<Job> {
        let pos = self.jobs.iter().position(|j| j.task_no == task_no && j.job_no == job_no)?;
        Some(self.jobs.remove(pos))
    }

    /// Remove and return the last (tail, latest-deadline) job.
    pub fn pop_tail(&mut self) -> Option<Job> {
        self.jobs.pop()
    }

    pub fn max_deadline(&self) -> Option<VTime> {
        self.jobs.last().map(|j| j.sched_deadline)
    }

    /// Re-sort the queue by `sched_deadline` after an external mutation has
    /// rewritten deadlines in place (criticality escalation crossing a
    /// core's threshold). `scheduler.c::merge_sort`;
    /// a stable sort over an owned `Vec` gives the same result with none of
    /// the pointer-partitioning machinery, and preserves insertion order
    /// among ties exactly like the recursive list-merge did.
    pub fn merge_sort(&mut self) {
        self.jobs.sort_by(|a, b| a.sched_deadline.cmp(&b.sched_deadline));
    }

    /// Remove every job for which `predicate` holds, returning them in
    /// queue order. Used by escalation's discard-below-level step and by
    /// the discarded-queue deadline-miss sweep.
    pub fn extract_if_all(&mut self, mut predicate: impl FnMut(&Job) -> bool) -> Vec<Job> {
        let mut extracted = Vec::new();
        self.jobs.retain(|j| {
            if predicate(j) {
                extracted.push(j.clone());
                false
            } else {
                true
            }
        });
        extracted
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Job> + '_ {
        self.jobs.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(task_no: u32, job_no: u64, deadline: f64) -> Job {
        Job {
            job_no,
            task_no,
            allocated_core: 1,
            arrival_time: VTime::zero(),
            sched_deadline: VTime::new(deadline),
            execution_time: VTime::zero(),
            wcet_budget: [VTime::zero(); limits::MAX_LEVELS],
            job_criticality: 1,
            status: JobStatus::Ready,
        }
    }

    #[test]
    fn insert_keeps_edf_order() {
        let mut q = RunQueue::new();
        q.insert(job(1, 0, 5.0));
        q.insert(job(2, 0, 3.0));
        q.insert(job(3, 0, 8.0));
        let order: Vec<_> = q.iter().map(|j| j.task_no).collect();
        assert_eq!(order, vec![2, 1, 3]);
    }

    #[test]
    fn ties_preserve_insertion_order() {
        let mut q = RunQueue::new();
        q.insert(job(1, 0, 5.0));
        q.insert(job(2, 0, 5.0));
        let order: Vec<_> = q.iter().map(|j| j.task_no).collect();
        assert_eq!(order, vec![1, 2]);
    }

    #[test]
    fn pop_head_returns_none_on_empty_queue() {
        let mut q = RunQueue::new();
        assert!(q.pop_head().is_none());
    }

    #[test]
    fn merge_sort_of_sorted_queue_is_unchanged() {
        let mut q = RunQueue::new();
        q.insert(job(1, 0, 3.0));
        q.insert(job(2, 0, 5.0));
        let before: Vec<_> = q.iter().map(|j| j.task_no).collect();
        q.merge_sort();
        let after: Vec<_> = q.iter().map(|j| j.task_no).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn remove_by_identity() {
        let mut q = RunQueue::new();
        q.insert(job(1, 0, 3.0));
        q.insert(job(2, 0, 5.0));
        let removed = q.remove(1, 0).unwrap();
        assert_eq!(removed.task_no, 1);
        assert_eq!(q.len(), 1);
    }
}
