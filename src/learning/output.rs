//! Objective output sinks.
//!
//! Every evaluator run emits one [`ObjectiveRecord`] per partition. Sinks
//! are shared across copied evaluators and worker threads, so they take
//! `&self` and guard any mutable state with a `parking_lot::Mutex`.
use std::{collections::BTreeMap, io::Write};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{
    params::NamedParams,
    simulator::{SimError, SimResult},
};

/// One partition's objective after an evaluator run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveRecord {
    pub partition_index: usize,
    pub time: f64,
    pub objective: f64,
    pub float_params: BTreeMap<String, Vec<f64>>,
    pub int_params: BTreeMap<String, Vec<i64>>,
}

impl ObjectiveRecord {
    pub fn new(partition_index: usize, time: f64, objective: f64, params: &NamedParams) -> Self {
        Self {
            partition_index,
            time,
            objective,
            float_params: params.float_params.clone(),
            int_params: params.int_params.clone(),
        }
    }
}

/// Destination for objective records.
pub trait ObjectiveOutput: Send + Sync {
    fn output(&self, record: &ObjectiveRecord) -> SimResult<()>;
}

/// Discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NilOutput;

impl ObjectiveOutput for NilOutput {
    fn output(&self, _record: &ObjectiveRecord) -> SimResult<()> {
        Ok(())
    }
}

/// Collects records in memory.
#[derive(Debug, Default)]
pub struct MemoryOutput {
    records: Mutex<Vec<ObjectiveRecord>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far.
    pub fn records(&self) -> Vec<ObjectiveRecord> {
        self.records.lock().clone()
    }
}

impl ObjectiveOutput for MemoryOutput {
    fn output(&self, record: &ObjectiveRecord) -> SimResult<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

/// Writes one JSON object per line.
pub struct JsonLogOutput {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonLogOutput {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer: Mutex::new(writer) }
    }
}

impl ObjectiveOutput for JsonLogOutput {
    fn output(&self, record: &ObjectiveRecord) -> SimResult<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| SimError::Output { reason: e.to_string() })?;
        let mut writer = self.writer.lock();
        writeln!(writer, "{line}")
            .and_then(|()| writer.flush())
            .map_err(|e| SimError::Output { reason: e.to_string() })
    }
}
