use mcs_sched::prelude::*;
use mcs_sched::offline::partitioner::Core;
use mcs_sched::runtime::scheduler::{CoreIntervalStatus, IntervalReport};

/// `tasks.c::print_sorted_array` / `print_taskset_info`.
pub fn print_sorted_tasks(tasks: &[Task]) {
    println!(" Sorted task structure array\n");
    for task in tasks {
        println!(" Task {} \tCriticality: {} \tUtilization:{}", task.task_no, task.criticality, task.own_utilization());
    }
    println!();
}

/// `allocator.c`'s per-core allocation printout.
pub fn print_core_allocations(cores: &[Core], tasks: &[Task]) {
    for core in cores {
        let core_tasks: Vec<u32> = tasks.iter()
            .filter(|t| t.allocated_core.is_on_core(core.core_no))
            .map(|t| t.task_no)
            .collect();

        println!("\n Core {}: {} tasks allocated", core.core_no, core_tasks.len());
        println!(" Total core utilization: {} \n Core remaining capacity: {}", core.utilization, core.remaining_capacity);
        println!(" Core threshold criticality: {}", core.threshold_criticality);
        print!(" Task ids: ");
        for task_no in &core_tasks {
            print!("{} \t", task_no);
        }
        println!("\n");
    }
    println!(" ------------------------------------------------------------------------------");
}

pub fn print_hyperperiod(hyperperiod: Tick) {
    println!(" Hyperperiod: {}\n", hyperperiod);
}

/// One trace line per decision-point interval — `scheduler.c`'s `Time: ...`
/// printf block, plus the `Current level updated` annotation on mode change.
pub fn print_interval(report: &IntervalReport) {
    if let Some(new_level) = report.mode_change {
        println!("\n Current level updated to {}\n", new_level);
    }

    print!(" Time: {} to {} \t", report.from, report.to);
    for status in &report.per_core {
        match status {
            CoreIntervalStatus::Idle { core_no } => print!(" Core: {} IDLE task \t\t", core_no),
            CoreIntervalStatus::Running { core_no, task_no, job_no, preempted: false } =>
                print!(" Core: {} Task {} Job {}   \t", core_no, task_no, job_no),
            CoreIntervalStatus::Running { core_no, task_no, job_no, preempted: true } =>
                print!(" Core: {} Task {} Job {} # \t", core_no, task_no, job_no),
            CoreIntervalStatus::PoweredDown { core_no } => print!(" Core: {} POWERED DOWN \t\t", core_no),
        }
    }
    println!();
}
