//! Replay of recorded streams through the step engine.
//!
//! After step `n` the engine's current time is `times[n]` and each replayed
//! partition's row 0 is `states[n]`, so a filter scoring row 0 sees the
//! recorded observation at its recorded time.
use std::sync::Arc;

use ndarray::Array1;

use crate::{
    data::stream::StreamData,
    params::NamedParams,
    simulator::{
        Iteration, Settings, SimError, SimResult, StateHistory, TerminationCondition,
        TimestepFunction, TimestepsHistory,
    },
};

/// Emits the recorded state for the current step number.
#[derive(Debug, Clone)]
pub struct MemoryIteration {
    data: Arc<StreamData>,
    partition_index: usize,
}

impl MemoryIteration {
    pub fn new(data: Arc<StreamData>) -> Self {
        Self { data, partition_index: 0 }
    }

    pub fn data(&self) -> &StreamData {
        &self.data
    }
}

impl Iteration for MemoryIteration {
    fn configure(&mut self, partition_index: usize, settings: &Settings) -> SimResult<()> {
        let expected = settings.state_widths.get(partition_index).copied().unwrap_or_default();
        if self.data.state_width() != expected {
            return Err(SimError::StateWidthMismatch {
                partition_index,
                expected,
                found: self.data.state_width(),
            });
        }
        self.partition_index = partition_index;
        Ok(())
    }

    fn iterate(
        &mut self, _params: &NamedParams, partition_index: usize, _state_histories: &[StateHistory],
        timesteps_history: &TimestepsHistory,
    ) -> SimResult<Array1<f64>> {
        let step = timesteps_history.current_step_number;
        self.data
            .state(step)
            .cloned()
            .ok_or(SimError::StreamExhausted { partition_index, step })
    }

    fn boxed_clone(&self) -> Box<dyn Iteration> {
        Box::new(self.clone())
    }
}

/// Advances time by the recorded gap leading into the current step.
#[derive(Debug, Clone)]
pub struct MemoryTimestepFunction {
    data: Arc<StreamData>,
}

impl MemoryTimestepFunction {
    pub fn new(data: Arc<StreamData>) -> Self {
        Self { data }
    }
}

impl TimestepFunction for MemoryTimestepFunction {
    fn next_increment(&self, timesteps_history: &TimestepsHistory) -> SimResult<f64> {
        let step = timesteps_history.current_step_number;
        self.data.increment(step).ok_or(SimError::StreamExhausted { partition_index: 0, step })
    }
}

/// Stops once every recorded row after the first has been replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOfStreamTermination {
    pub last_step: usize,
}

impl EndOfStreamTermination {
    pub fn new(data: &StreamData) -> Self {
        Self { last_step: data.len().saturating_sub(1) }
    }
}

impl TerminationCondition for EndOfStreamTermination {
    fn terminate(
        &self, _state_histories: &[StateHistory], timesteps_history: &TimestepsHistory,
    ) -> bool {
        timesteps_history.current_step_number >= self.last_step
    }
}

/// Settings replaying `streams` side by side, one partition per stream.
///
/// The first stream's row 0 seeds the initial time; every partition gets the
/// same history depth and its index as RNG seed.
///
/// # Errors
/// - [`SimError::InvalidSettings`] if `streams` and `params` differ in length
///   or there are no streams.
pub fn replay_settings(
    streams: &[Arc<StreamData>], params: Vec<NamedParams>, history_depth: usize,
) -> SimResult<Settings> {
    if streams.is_empty() || streams.len() != params.len() {
        return Err(SimError::InvalidSettings {
            reason: format!("{} streams for {} parameter sets", streams.len(), params.len()),
        });
    }
    let init_state_values = streams
        .iter()
        .map(|s| s.state(0).map(|row| row.to_vec()).unwrap_or_default())
        .collect();
    let settings = Settings {
        params,
        init_state_values,
        init_time_value: streams[0].time(0).unwrap_or_default(),
        seeds: (0..streams.len() as u64).collect(),
        state_widths: streams.iter().map(|s| s.state_width()).collect(),
        state_history_depths: vec![history_depth; streams.len()],
        timesteps_history_depth: history_depth,
    };
    settings.validate()?;
    Ok(settings)
}
