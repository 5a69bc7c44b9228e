//! Engine step that emits the kernel-weighted mean of a partition's history.
//!
//! The partition's next state is the [`Statistics`] mean of rows `1..depth`
//! weighted against row 0, so iterating it carries the reweighted estimate
//! forward in time. The kernel is refreshed from the step's params on every
//! call, which lets the same parameters drive both this step and the
//! filter likelihood.
use ndarray::Array1;

use crate::{
    filter::{errors::FilterError, kernel::ConditionalProbability, statistics::Statistics},
    params::NamedParams,
    simulator::{Iteration, Settings, SimResult, StateHistory, TimestepsHistory},
};

#[derive(Debug, Clone, PartialEq)]
pub struct ReweightingIteration {
    kernel: ConditionalProbability,
}

impl ReweightingIteration {
    pub fn new(kernel: ConditionalProbability) -> Self {
        Self { kernel }
    }

    pub fn kernel(&self) -> &ConditionalProbability {
        &self.kernel
    }
}

impl Iteration for ReweightingIteration {
    fn configure(&mut self, partition_index: usize, settings: &Settings) -> SimResult<()> {
        self.kernel.configure(partition_index, settings)?;
        Ok(())
    }

    /// # Errors
    /// Kernel parameter failures and every [`Statistics::compute`] error
    /// (shallow window, negative or all-zero weights).
    fn iterate(
        &mut self, params: &NamedParams, partition_index: usize, state_histories: &[StateHistory],
        timesteps_history: &TimestepsHistory,
    ) -> SimResult<Array1<f64>> {
        let history = state_histories.get(partition_index).ok_or(
            FilterError::PartitionOutOfRange { partition_index, partitions: state_histories.len() },
        )?;
        self.kernel.set_params(params)?;
        Ok(Statistics::compute(&self.kernel, history, timesteps_history)?.mean)
    }

    fn boxed_clone(&self) -> Box<dyn Iteration> {
        Box::new(self.clone())
    }
}
