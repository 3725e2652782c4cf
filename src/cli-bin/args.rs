use mcs_sched::common::taskset_serde::TasksetFileType;

const DEFAULT_AFTER_HELP: &str = "Refer to the crate's documentation for further help";

/// Command-line arguments for the scheduler engine — there is exactly one
/// algorithm, so unlike the teacher's `-a`/`-p`/`-n` trio this just names
/// the taskset, its format, and an RNG seed for deterministic execution
/// times.
#[derive(clap::Parser, Debug)]
#[command(after_help=DEFAULT_AFTER_HELP)]
pub struct Args {
    /// Taskset data file
    #[arg(short='i', value_name="TASKSET FILE")]
    pub taskset_file: String,

    /// Taskset file type
    #[arg(value_enum, short='f', long="format", value_name="FORMAT", default_value="auto")]
    pub taskset_file_ty: TasksetFileType,

    /// RNG seed for job execution-time sampling
    #[arg(long="seed", value_name="SEED", default_value="0")]
    pub seed: u64,

    /// Quiet mode / Exit code as analysis result
    ///
    /// When enabled, the trace is suppressed and a zero exit code means the
    /// taskset was admitted and partitioned successfully, a one means
    /// infeasibility or a partitioning failure, any other code means that an
    /// error has happened.
    #[arg(short='q', default_value="false", action=clap::ArgAction::SetTrue)]
    pub quiet: bool,
}
