//! Line-by-line reading of JSON objective logs with filtering.
use std::{
    collections::{BTreeMap, HashMap},
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    learning::ObjectiveRecord,
    log_query::{
        errors::{QueryError, QueryResult},
        filter::DataFilter,
    },
};

/// One decoded log line, as written by `JsonLogOutput`.
pub type JsonLogEntry = ObjectiveRecord;

pub const PARTITION_ITERATIONS: &str = "partition_iterations";
pub const PARTITION_INDEX: &str = "partition_index";
pub const OBJECTIVE: &str = "objective";

/// A log entry that passed every filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub log_filename: String,
    /// 1-based count of lines seen so far for the entry's partition.
    pub partition_iterations: usize,
    pub entry: JsonLogEntry,
}

/// Whether `entry` passes `filter` on `field`.
///
/// Array-valued parameters pass only if every element passes.
fn passes(
    entry: &JsonLogEntry, partition_iterations: usize, field: &str, filter: &DataFilter,
) -> QueryResult<bool> {
    let keep = match field {
        PARTITION_ITERATIONS => !filter.ignore(partition_iterations as f64),
        PARTITION_INDEX => !filter.ignore(entry.partition_index as f64),
        OBJECTIVE => !filter.ignore(entry.objective),
        name => {
            if let Some(values) = entry.float_params.get(name) {
                values.iter().all(|&v| !filter.ignore(v))
            } else if let Some(values) = entry.int_params.get(name) {
                values.iter().all(|&v| !filter.ignore(v as f64))
            } else {
                return Err(QueryError::UnknownField { name: name.to_string() });
            }
        }
    };
    Ok(keep)
}

/// Decode and filter every line of `reader`.
///
/// Undecodable lines are skipped with a warning and do not advance any
/// partition's iteration count.
///
/// # Errors
/// - [`QueryError::UnknownField`] if a filter names a field an entry lacks.
/// - [`QueryError::Io`] if a line cannot be read.
pub fn read_log_entries<R: BufRead>(
    reader: R, log_filename: &str, filters: &BTreeMap<String, DataFilter>,
) -> QueryResult<Vec<QueryLogEntry>> {
    let mut partition_iterations: HashMap<usize, usize> = HashMap::new();
    let mut entries = Vec::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| QueryError::Io {
            path: log_filename.to_string(),
            reason: e.to_string(),
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: JsonLogEntry = match serde_json::from_str(&line) {
            Ok(entry) => entry,
            Err(err) => {
                let reason = err.to_string();
                warn!(line = line_number + 1, error = reason.as_str(); "skipping undecodable log line");
                continue;
            }
        };
        let count = partition_iterations.entry(entry.partition_index).or_default();
        *count += 1;
        let iterations = *count;

        let mut include = true;
        for (field, filter) in filters {
            if !passes(&entry, iterations, field, filter)? {
                include = false;
                break;
            }
        }
        if include {
            entries.push(QueryLogEntry {
                log_filename: log_filename.to_string(),
                partition_iterations: iterations,
                entry,
            });
        }
    }
    Ok(entries)
}

/// Open and filter a log file; see [`read_log_entries`].
pub fn read_log_file(
    path: impl AsRef<Path>, filters: &BTreeMap<String, DataFilter>,
) -> QueryResult<Vec<QueryLogEntry>> {
    let path = path.as_ref();
    let name = path.display().to_string();
    let file =
        File::open(path).map_err(|e| QueryError::Io { path: name.clone(), reason: e.to_string() })?;
    read_log_entries(BufReader::new(file), &name, filters)
}
