use mcs_sched::prelude::*;

pub mod prelude {
    pub use super::args::Args;
}

pub mod args;
pub mod report;

fn main() {
    let args = match <Args as clap::Parser>::try_parse() {
        Ok(args) => args,
        Err(err) => {
            use clap::error::ErrorKind::*;

            let exit_code = match err.kind() {
                DisplayHelp |
                DisplayHelpOnMissingArgumentOrSubcommand |
                DisplayVersion => 0,
                _ => 2,
            };

            err.print().unwrap();
            std::process::exit(exit_code);
        },
    };

    let quiet = args.quiet;
    match run(args) {
        Ok(admitted) => {
            if quiet {
                std::process::exit(if admitted { 0 } else { 1 });
            }
        },
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(if quiet { 2 } else { 1 });
        },
    }
}

/// Drive the whole engine end to end: parse, admit & partition, simulate,
/// report. Returns `Ok(false)` (rather than `Err`) for MCS infeasibility or
/// a partitioning failure, matching `spec.md` §7's "report and exit, do not
/// run the scheduler" policy without treating it as a hard error.
fn run(args: Args) -> Result<bool, Box<dyn std::error::Error>> {
    let taskset = parse_taskset(&args.taskset_file, args.taskset_file_ty)?;
    let mut tasks = taskset.tasks;
    let max_criticality = taskset.max_criticality;

    if !args.quiet {
        report::print_sorted_tasks(&tasks);
    }

    let (cores, hyperperiod) = match mcs_sched::offline::admit_and_partition(&mut tasks, max_criticality) {
        Ok(result) => result,
        Err(err) => {
            if !args.quiet {
                println!(" {err}");
            }
            return Ok(false);
        }
    };

    if !args.quiet {
        report::print_core_allocations(&cores, &tasks);
        report::print_hyperperiod(hyperperiod);
    }

    let mut scheduler = mcs_sched::runtime::scheduler::Scheduler::new(tasks, cores, max_criticality, hyperperiod, args.seed);
    let reports = scheduler.run();

    if !args.quiet {
        for interval in &reports {
            report::print_interval(interval);
        }
    }

    Ok(true)
}
