use crate::prelude::*;

pub mod prelude {
    pub use super::{
        TaskSet,
        TasksetFileType,
        TasksetParseError,
        parse_taskset,
    };
}

/// A parsed task set together with the declared maximum criticality level,
/// since downstream admission/partitioning logic (`spec.md` §4.2/§4.3)
/// needs `L_max` even when every task's own criticality is lower.
#[derive(Clone, Debug)]
pub struct TaskSet {
    pub tasks: Vec<Task>,
    pub max_criticality: u32,
}

#[derive(Debug)]
#[derive(Clone, Copy)]
#[derive(PartialEq, Eq)]
#[derive(clap::ValueEnum)]
pub enum TasksetFileType {
    Auto,
    Json,
    Plain,
}

#[derive(Debug)]
pub enum TasksetParseError {
    IOError(std::io::Error),
    JSONError(serde_json::Error),
    PlainParseError(String),
}

pub fn parse_taskset(path: &str, typ: TasksetFileType) -> Result<TaskSet, TasksetParseError> {
    use TasksetFileType::*;

    let path_obj = std::path::Path::new(path);
    let resolved =
        if typ == TasksetFileType::Auto {
            if path_obj.extension().is_some_and(|ext| ext == "json") {
                TasksetFileType::Json
            } else {
                TasksetFileType::Plain
            }
        } else { typ };

    let data = std::fs::read_to_string(path)?;

    match resolved {
        Auto => unreachable!("Auto is resolved above"),
        Json => json_deserialize_taskset(&data),
        Plain => plain_deserialize_taskset(&data),
    }
}

// -----------------------------------------------------------------------------
// JSON format — programmatic equivalent of the plain-text grammar below.
// -----------------------------------------------------------------------------

#[derive(serde::Serialize, serde::Deserialize)]
struct TaskRecord {
    phase: u64,
    period: u64,
    deadline: u64,
    criticality: u32,
    wcet: Vec<u64>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct TaskSetRecord {
    max_criticality: u32,
    tasks: Vec<TaskRecord>,
}

fn json_deserialize_taskset(data: &str) -> Result<TaskSet, TasksetParseError> {
    let record: TaskSetRecord = serde_json::from_str(data)?;

    let tasks = record.tasks.iter().enumerate()
        .map(|(i, r)| {
            if r.wcet.len() != r.criticality as usize {
                return Err(TasksetParseError::PlainParseError(format!(
                    "task {}: expected {} WCET values for criticality {}, got {}",
                    i + 1, r.criticality, r.criticality, r.wcet.len()
                )));
            }

            Ok(Task::new(
                (i + 1) as u32,
                Tick(r.phase),
                Tick(r.period),
                Tick(r.deadline),
                r.criticality,
                &r.wcet.iter().map(|&w| Tick(w)).collect::<Vec<_>>(),
            ))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TaskSet { tasks, max_criticality: record.max_criticality })
}

// -----------------------------------------------------------------------------
// Plain-text format (`spec.md` §6 `input.txt` grammar):
//
//   num_tasks
//   max_criticality
//   phase period deadline criticality wcet_1 .. wcet_criticality   (x num_tasks)
//
// Whitespace-separated, line breaks are cosmetic only — mirrors the original
// `fscanf`-based reader in `tasks.c::fetch_task_parameters`, which does not
// care about newline placement either.
// -----------------------------------------------------------------------------

fn plain_deserialize_taskset(data: &str) -> Result<TaskSet, TasksetParseError> {
    let mut tokens = data.split_ascii_whitespace();

    let num_tasks: usize = next_token(&mut tokens, "num_tasks")?;
    let max_criticality: u32 = next_token(&mut tokens, "max_criticality")?;

    let tasks = (0..num_tasks)
        .map(|i| {
            let phase: u64 = next_token(&mut tokens, "phase")?;
            let period: u64 = next_token(&mut tokens, "period")?;
            let deadline: u64 = next_token(&mut tokens, "deadline")?;
            let criticality: u32 = next_token(&mut tokens, "criticality")?;

            let wcet = (0..criticality)
                .map(|_| next_token(&mut tokens, "wcet"))
                .collect::<Result<Vec<u64>, _>>()?;

            Ok(Task::new(
                (i + 1) as u32,
                Tick(phase),
                Tick(period),
                Tick(deadline),
                criticality,
                &wcet.iter().map(|&w| Tick(w)).collect::<Vec<_>>(),
            ))
        })
        .collect::<Result<Vec<_>, TasksetParseError>>()?;

    Ok(TaskSet { tasks, max_criticality })
}

fn next_token<T: std::str::FromStr>(tokens: &mut std::str::SplitAsciiWhitespace, field: &str) -> Result<T, TasksetParseError> {
    let raw = tokens.next()
        .ok_or_else(|| TasksetParseError::PlainParseError(format!("unexpected end of input while reading '{field}'")))?;

    raw.parse().map_err(|_| TasksetParseError::PlainParseError(format!("failed to parse '{field}' from '{raw}'")))
}

// =============================================================================

impl std::fmt::Display for TasksetParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Taskset Parse Error, ")?;
        match self {
            TasksetParseError::IOError(error) => write!(f, "IO: {error}")?,
            TasksetParseError::JSONError(error) => write!(f, "JSON: {error}")?,
            TasksetParseError::PlainParseError(error) => write!(f, "Plain: {error}")?,
        };

        Ok(())
    }
}

impl std::error::Error for TasksetParseError {}

impl From<std::io::Error> for TasksetParseError {
    fn from(value: std::io::Error) -> Self {
        Self::IOError(value)
    }
}

impl From<serde_json::Error> for TasksetParseError {
    fn from(value: serde_json::Error) -> Self {
        Self::JSONError(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_format_round_trip() {
        let data = "\
            2\n2\n\
            0 10 10 2 2 4\n\
            0 5 5 1 3\n";

        let set = plain_deserialize_taskset(data).unwrap();
        assert_eq!(set.max_criticality, 2);
        assert_eq!(set.tasks.len(), 2);
        assert_eq!(set.tasks[0].criticality, 2);
        assert_eq!(set.tasks[0].wcet_at(1), Tick(2));
        assert_eq!(set.tasks[0].wcet_at(2), Tick(4));
        assert_eq!(set.tasks[1].criticality, 1);
        assert_eq!(set.tasks[1].wcet_at(1), Tick(3));
    }

    #[test]
    fn json_format_matches_plain() {
        let json = r#"{
            "max_criticality": 2,
            "tasks": [
                { "phase": 0, "period": 10, "deadline": 10, "criticality": 2, "wcet": [2, 4] },
                { "phase": 0, "period": 5, "deadline": 5, "criticality": 1, "wcet": [3] }
            ]
        }"#;

        let set = json_deserialize_taskset(json).unwrap();
        assert_eq!(set.tasks.len(), 2);
        assert_eq!(set.tasks[0].wcet_at(2), Tick(4));
    }

    #[test]
    fn malformed_wcet_count_is_rejected() {
        let data = "1\n1\n0 10 10 2 5\n"; // criticality 2 but only 1 wcet value
        assert!(plain_deserialize_taskset(data).is_err());
    }
}