//! simulator::coordinator: the step-engine contract and a sequential driver.
//!
//! Purpose
//! -------
//! Define the narrow interface the learning core consumes from a
//! step-simulation engine ([`Iteration`], [`TimestepFunction`],
//! [`TerminationCondition`]) and provide [`PartitionCoordinator`], a
//! minimal driver that advances every partition once per step.
//!
//! Key behaviors
//! -------------
//! - Each step: bump the step number, ask the timestep function for the
//!   next increment, call every partition's `iterate` against the pre-step
//!   histories, then push the new states and the new time.
//! - `run` steps until the termination condition holds.
//!
//! Invariants & assumptions
//! ------------------------
//! - Iterations never see a partially updated step: all states are
//!   collected before any history is pushed.
//! - An iteration's output width must equal its partition's state width.
//!
//! Conventions
//! -----------
//! - `current_step_number` is 0 before the first step and equals the
//!   number of completed steps afterwards.
use ndarray::{Array1, Array2};

use crate::{
    params::NamedParams,
    simulator::{
        errors::{SimError, SimResult},
        history::{StateHistory, TimestepsHistory},
        settings::Settings,
    },
};

/// One partition's per-step advance function.
pub trait Iteration: Send + Sync {
    /// Reset internal state from the static settings of `partition_index`.
    fn configure(&mut self, partition_index: usize, settings: &Settings) -> SimResult<()>;

    /// Produce the partition's next state.
    fn iterate(
        &mut self, params: &NamedParams, partition_index: usize, state_histories: &[StateHistory],
        timesteps_history: &TimestepsHistory,
    ) -> SimResult<Array1<f64>>;

    /// Clone behind a box so heterogeneous iterations can be duplicated.
    fn boxed_clone(&self) -> Box<dyn Iteration>;
}

impl Iteration for Box<dyn Iteration> {
    fn configure(&mut self, partition_index: usize, settings: &Settings) -> SimResult<()> {
        (**self).configure(partition_index, settings)
    }

    fn iterate(
        &mut self, params: &NamedParams, partition_index: usize, state_histories: &[StateHistory],
        timesteps_history: &TimestepsHistory,
    ) -> SimResult<Array1<f64>> {
        (**self).iterate(params, partition_index, state_histories, timesteps_history)
    }

    fn boxed_clone(&self) -> Box<dyn Iteration> {
        (**self).boxed_clone()
    }
}

impl Clone for Box<dyn Iteration> {
    fn clone(&self) -> Self {
        (**self).boxed_clone()
    }
}

/// Decides how far time advances on the next step.
pub trait TimestepFunction: Send + Sync {
    fn next_increment(&self, timesteps_history: &TimestepsHistory) -> SimResult<f64>;
}

/// Decides when a run is over; checked before every step.
pub trait TerminationCondition: Send + Sync {
    fn terminate(
        &self, state_histories: &[StateHistory], timesteps_history: &TimestepsHistory,
    ) -> bool;
}

/// Fixed increment every step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantTimestep {
    pub step_size: f64,
}

impl TimestepFunction for ConstantTimestep {
    fn next_increment(&self, _timesteps_history: &TimestepsHistory) -> SimResult<f64> {
        Ok(self.step_size)
    }
}

/// Stop after `max_steps` steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberOfStepsTermination {
    pub max_steps: usize,
}

impl TerminationCondition for NumberOfStepsTermination {
    fn terminate(
        &self, _state_histories: &[StateHistory], timesteps_history: &TimestepsHistory,
    ) -> bool {
        timesteps_history.current_step_number >= self.max_steps
    }
}

/// Sequential driver over a slice of iterations, one per partition.
pub struct PartitionCoordinator<'a, T: Iteration> {
    settings: &'a Settings,
    iterations: &'a mut [T],
    timestep_function: &'a dyn TimestepFunction,
    termination: &'a dyn TerminationCondition,
    state_histories: Vec<StateHistory>,
    timesteps_history: TimestepsHistory,
}

impl<'a, T: Iteration> PartitionCoordinator<'a, T> {
    /// Build fresh histories from `settings`.
    ///
    /// Iterations are not configured here; callers own that lifecycle.
    ///
    /// # Errors
    /// - [`SimError::InvalidSettings`] from [`Settings::validate`].
    /// - [`SimError::PartitionCountMismatch`] if `iterations` does not have
    ///   one entry per partition.
    pub fn new(
        settings: &'a Settings, iterations: &'a mut [T], timestep_function: &'a dyn TimestepFunction,
        termination: &'a dyn TerminationCondition,
    ) -> SimResult<Self> {
        settings.validate()?;
        if iterations.len() != settings.partitions() {
            return Err(SimError::PartitionCountMismatch {
                expected: settings.partitions(),
                found: iterations.len(),
            });
        }
        let state_histories = settings
            .init_state_values
            .iter()
            .zip(&settings.state_history_depths)
            .map(|(init, &depth)| StateHistory::new(Array1::from(init.clone()).view(), depth))
            .collect();
        let timesteps_history =
            TimestepsHistory::new(settings.init_time_value, settings.timesteps_history_depth);
        Ok(Self {
            settings,
            iterations,
            timestep_function,
            termination,
            state_histories,
            timesteps_history,
        })
    }

    pub fn state_histories(&self) -> &[StateHistory] {
        &self.state_histories
    }

    pub fn timesteps_history(&self) -> &TimestepsHistory {
        &self.timesteps_history
    }

    pub fn ready_to_terminate(&self) -> bool {
        self.termination.terminate(&self.state_histories, &self.timesteps_history)
    }

    /// Advance every partition by one step.
    ///
    /// # Errors
    /// - [`SimError::InvalidTimestep`] for a non-finite or non-positive increment.
    /// - [`SimError::StateWidthMismatch`] if an iteration returns the wrong width.
    /// - Any error raised by an iteration.
    pub fn step(&mut self) -> SimResult<()> {
        self.timesteps_history.current_step_number += 1;
        let increment = self.timestep_function.next_increment(&self.timesteps_history)?;
        if !increment.is_finite() || increment <= 0.0 {
            return Err(SimError::InvalidTimestep { value: increment });
        }
        self.timesteps_history.next_increment = increment;

        let mut next_states = Vec::with_capacity(self.iterations.len());
        for (index, iteration) in self.iterations.iter_mut().enumerate() {
            let state = iteration.iterate(
                &self.settings.params[index],
                index,
                &self.state_histories,
                &self.timesteps_history,
            )?;
            let expected = self.settings.state_widths[index];
            if state.len() != expected {
                return Err(SimError::StateWidthMismatch {
                    partition_index: index,
                    expected,
                    found: state.len(),
                });
            }
            next_states.push(state);
        }
        for (history, state) in self.state_histories.iter_mut().zip(&next_states) {
            history.push(state.view());
        }
        let next_time = self.timesteps_history.current_time() + increment;
        self.timesteps_history.push(next_time);
        Ok(())
    }

    /// Step until the termination condition holds.
    pub fn run(&mut self) -> SimResult<()> {
        while !self.ready_to_terminate() {
            self.step()?;
        }
        Ok(())
    }
}

/// Stack a slice of equal-width rows into a history matrix, most recent first.
pub fn rows_to_history(rows: &[Array1<f64>]) -> StateHistory {
    let width = rows.first().map_or(0, Array1::len);
    let mut values = Array2::zeros((rows.len(), width));
    for (mut target, row) in values.rows_mut().into_iter().zip(rows) {
        target.assign(row);
    }
    StateHistory::from_rows(values)
}
