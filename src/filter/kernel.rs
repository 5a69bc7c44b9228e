//! Conditional-probability kernels that weight past observations.
//!
//! Every kernel maps a (current, past) observation pair and their times to a
//! non-negative weight. [`Statistics`](crate::filter::Statistics) turns these
//! weights into a weighted mean and covariance.
use ndarray::ArrayView1;

use crate::{
    filter::{
        errors::FilterResult,
        gaussian_process::{CovarianceKernel, GaussianProcessProbability},
    },
    params::NamedParams,
    simulator::Settings,
};

pub const EXPONENTIAL_WEIGHTING_TIMESCALE: &str = "exponential_weighting_timescale";

/// Closed set of weighting kernels.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionalProbability {
    /// Every past observation counts equally.
    Uniform,
    /// `exp((t_past - t_now) / timescale)`; the timescale is read from
    /// `exponential_weighting_timescale` on every `set_params`.
    ExponentialTimeWeighting { timescale: f64 },
    /// Gaussian transition density between mean-corrected states.
    GaussianProcess(GaussianProcessProbability),
}

impl ConditionalProbability {
    pub fn exponential() -> Self {
        ConditionalProbability::ExponentialTimeWeighting { timescale: 1.0 }
    }

    pub fn gaussian_process(kernel: CovarianceKernel) -> Self {
        ConditionalProbability::GaussianProcess(GaussianProcessProbability::new(kernel))
    }

    /// Load static configuration for `partition_index` and apply its params.
    pub fn configure(&mut self, partition_index: usize, settings: &Settings) -> FilterResult<()> {
        match self {
            ConditionalProbability::GaussianProcess(gp) => gp.configure(partition_index, settings),
            _ => self.set_params(&settings.params[partition_index]),
        }
    }

    /// Refresh the kernel from candidate parameters.
    ///
    /// # Errors
    /// `MissingFloatParam`/`EmptyParam` when a required parameter is absent.
    pub fn set_params(&mut self, params: &NamedParams) -> FilterResult<()> {
        match self {
            ConditionalProbability::Uniform => Ok(()),
            ConditionalProbability::ExponentialTimeWeighting { timescale } => {
                *timescale = params.float_scalar(EXPONENTIAL_WEIGHTING_TIMESCALE)?;
                Ok(())
            }
            ConditionalProbability::GaussianProcess(gp) => gp.set_params(params),
        }
    }

    pub fn evaluate(
        &self, current_state: ArrayView1<f64>, past_state: ArrayView1<f64>, current_time: f64,
        past_time: f64,
    ) -> f64 {
        match self {
            ConditionalProbability::Uniform => 1.0,
            ConditionalProbability::ExponentialTimeWeighting { timescale } => {
                ((past_time - current_time) / timescale).exp()
            }
            ConditionalProbability::GaussianProcess(gp) => {
                gp.evaluate(current_state, past_state, current_time, past_time)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn uniform_weight_is_one() {
        let x = array![1.0];
        let kernel = ConditionalProbability::Uniform;

        assert_eq!(kernel.evaluate(x.view(), x.view(), 10.0, 0.0), 1.0);
    }

    #[test]
    // Purpose
    // -------
    // The exponential weight decays with age at the configured timescale.
    //
    // Given
    // -----
    // - timescale = 2, age = 4.
    //
    // Expect
    // ------
    // - weight = e^{-2}.
    fn exponential_weight_decays_with_age() {
        // Arrange
        let mut kernel = ConditionalProbability::exponential();
        let params = NamedParams::new().with_float(EXPONENTIAL_WEIGHTING_TIMESCALE, vec![2.0]);
        kernel.set_params(&params).unwrap();
        let x = array![0.0];

        // Act
        let weight = kernel.evaluate(x.view(), x.view(), 5.0, 1.0);

        // Assert
        assert_relative_eq!(weight, (-2.0f64).exp(), epsilon = 1e-15);
    }

    #[test]
    // Purpose
    // -------
    // Missing timescale is an error, never a silent default.
    fn exponential_requires_timescale() {
        let mut kernel = ConditionalProbability::exponential();

        assert!(kernel.set_params(&NamedParams::new()).is_err());
    }
}
