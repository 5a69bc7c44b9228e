//! Per-step log-likelihood of a partition's current observation.
use ndarray::Array1;

use crate::{
    filter::{
        data_linking::DataLinkingLikelihood,
        errors::{FilterError, FilterResult},
        kernel::ConditionalProbability,
        statistics::Statistics,
    },
    params::NamedParams,
    simulator::{Settings, StateHistory, TimestepsHistory},
};

/// Kernel + weighted statistics + observation model.
///
/// Each evaluation refreshes the kernel from the candidate params, computes
/// the statistics of the partition's past rows and scores its row 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityFilterLikelihood {
    kernel: ConditionalProbability,
    data_link: DataLinkingLikelihood,
}

impl ProbabilityFilterLikelihood {
    pub fn new(kernel: ConditionalProbability, data_link: DataLinkingLikelihood) -> Self {
        Self { kernel, data_link }
    }

    pub fn kernel(&self) -> &ConditionalProbability {
        &self.kernel
    }

    pub fn configure(&mut self, partition_index: usize, settings: &Settings) -> FilterResult<()> {
        if partition_index >= settings.partitions() {
            return Err(FilterError::PartitionOutOfRange {
                partition_index,
                partitions: settings.partitions(),
            });
        }
        self.kernel.configure(partition_index, settings)?;
        self.data_link.configure(partition_index, settings);
        Ok(())
    }

    /// Statistics of `partition_index`'s window under `params`.
    pub fn statistics(
        &mut self, params: &NamedParams, partition_index: usize, state_histories: &[StateHistory],
        timesteps_history: &TimestepsHistory,
    ) -> FilterResult<Statistics> {
        let history = state_histories.get(partition_index).ok_or(
            FilterError::PartitionOutOfRange { partition_index, partitions: state_histories.len() },
        )?;
        self.kernel.set_params(params)?;
        Statistics::compute(&self.kernel, history, timesteps_history)
    }

    /// Log-likelihood of the partition's current observation.
    ///
    /// # Errors
    /// Propagates parameter, weighting and distribution failures.
    pub fn evaluate(
        &mut self, params: &NamedParams, partition_index: usize, state_histories: &[StateHistory],
        timesteps_history: &TimestepsHistory,
    ) -> FilterResult<f64> {
        let statistics =
            self.statistics(params, partition_index, state_histories, timesteps_history)?;
        self.data_link.evaluate(&statistics, state_histories[partition_index].current())
    }

    /// Draw a new observation from the partition's current statistics.
    pub fn generate_new_samples(
        &mut self, params: &NamedParams, partition_index: usize, state_histories: &[StateHistory],
        timesteps_history: &TimestepsHistory,
    ) -> FilterResult<Array1<f64>> {
        let statistics =
            self.statistics(params, partition_index, state_histories, timesteps_history)?;
        self.data_link.generate_new_samples(&statistics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::data_linking::DataLinkFamily;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // The composed evaluation equals the data link scored on the uniform
    // statistics of the worked example.
    //
    // Given
    // -----
    // - History [5, 4, 3] at times [2, 1, 0], Uniform kernel, Gamma link.
    //
    // Expect
    // ------
    // - Gamma(shape 49, rate 14) log density at x = 5.
    fn evaluate_scores_current_row_against_past_rows() {
        // Arrange
        let mut filter = ProbabilityFilterLikelihood::new(
            ConditionalProbability::Uniform,
            DataLinkingLikelihood::new(DataLinkFamily::Gamma),
        );
        let histories = vec![StateHistory::from_rows(array![[5.0], [4.0], [3.0]])];
        let times = TimestepsHistory {
            values: array![2.0, 1.0, 0.0],
            next_increment: 1.0,
            current_step_number: 2,
        };

        // Act
        let ll = filter.evaluate(&NamedParams::new(), 0, &histories, &times).unwrap();

        // Assert
        let x = 5.0f64;
        let expected = 49.0 * 14.0f64.ln() - statrs::function::gamma::ln_gamma(49.0)
            + 48.0 * x.ln()
            - 14.0 * x;
        assert_relative_eq!(ll, expected, epsilon = 1e-9);
    }

    #[test]
    fn unknown_partition_is_rejected() {
        let mut filter = ProbabilityFilterLikelihood::new(
            ConditionalProbability::Uniform,
            DataLinkingLikelihood::new(DataLinkFamily::Normal),
        );
        let times = TimestepsHistory::new(0.0, 2);

        let err = filter.evaluate(&NamedParams::new(), 1, &[], &times);

        assert_eq!(err, Err(FilterError::PartitionOutOfRange { partition_index: 1, partitions: 0 }));
    }
}
