//! Gaussian-process transition density used as a conditional probability.
//!
//! The weight between a current and a past observation is the joint
//! Gaussian density of their deviations from time-dependent means, with a
//! covariance supplied by a [`CovarianceKernel`]. The density is returned
//! as a raw probability (not a log), so it composes with the other kernels
//! in weighted sums. Very small densities underflow to exactly zero.
use std::collections::HashMap;

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView1};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    filter::errors::{FilterError, FilterResult},
    params::NamedParams,
    simulator::Settings,
};

pub const INITIAL_MEANS: &str = "initial_means";
pub const TIMES_TO_FIT: &str = "times_to_fit";
pub const UPPER_TRIANGLE_COVARIANCE: &str = "upper_triangle_covariance_matrix";

const LN_TWO_PI: f64 = 1.837_877_066_409_345_3;
const MEAN_NOISE_HALF_WIDTH: f64 = 1e-4;

/// Name of the per-time mean parameter for `time` (six decimal places).
pub fn time_means_name(time: f64) -> String {
    format!("means_at_time_{time:.6}")
}

/// Covariance kernels available to [`GaussianProcessProbability`].
#[derive(Debug, Clone, PartialEq)]
pub enum CovarianceKernel {
    /// Time-invariant covariance read from the row-major upper triangle
    /// parameter `upper_triangle_covariance_matrix`.
    Constant { covariance: Array2<f64> },
}

impl CovarianceKernel {
    pub fn constant() -> Self {
        CovarianceKernel::Constant { covariance: Array2::zeros((0, 0)) }
    }

    pub fn configure(&mut self, partition_index: usize, settings: &Settings) -> FilterResult<()> {
        let width = settings.state_widths[partition_index];
        match self {
            CovarianceKernel::Constant { covariance } => {
                *covariance = Array2::zeros((width, width));
            }
        }
        self.set_params(&settings.params[partition_index])
    }

    /// Fill the covariance from the current parameters.
    ///
    /// # Errors
    /// - `MissingFloatParam` when the upper-triangle parameter is absent.
    /// - [`FilterError::DimensionMismatch`] when it does not hold exactly
    ///   `w (w + 1) / 2` entries.
    pub fn set_params(&mut self, params: &NamedParams) -> FilterResult<()> {
        match self {
            CovarianceKernel::Constant { covariance } => {
                let width = covariance.nrows();
                let upper = params.float(UPPER_TRIANGLE_COVARIANCE)?;
                let expected = width * (width + 1) / 2;
                if upper.len() != expected {
                    return Err(FilterError::DimensionMismatch { expected, found: upper.len() });
                }
                let mut entries = upper.iter();
                for row in 0..width {
                    for col in row..width {
                        if let Some(&value) = entries.next() {
                            covariance[[row, col]] = value;
                            covariance[[col, row]] = value;
                        }
                    }
                }
                Ok(())
            }
        }
    }

    pub fn covariance(
        &self, _current_state: ArrayView1<f64>, _past_state: ArrayView1<f64>, _current_time: f64,
        _past_time: f64,
    ) -> &Array2<f64> {
        match self {
            CovarianceKernel::Constant { covariance } => covariance,
        }
    }
}

/// Gaussian-process weighting with per-time means.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianProcessProbability {
    kernel: CovarianceKernel,
    means_in_time: HashMap<u64, Array1<f64>>,
    initial_means: Array1<f64>,
    state_width: usize,
}

impl GaussianProcessProbability {
    pub fn new(kernel: CovarianceKernel) -> Self {
        Self {
            kernel,
            means_in_time: HashMap::new(),
            initial_means: Array1::zeros(0),
            state_width: 0,
        }
    }

    /// Register masked `means_at_time_*` parameters for every entry of
    /// `times_to_fit`, initialised to `initial_means` plus uniform noise in
    /// `[-1e-4, 1e-4)`.
    ///
    /// Call this while assembling settings, before configuring the filter.
    ///
    /// # Errors
    /// `MissingFloatParam` when `initial_means` is absent.
    pub fn seed_time_means(params: &mut NamedParams, seed: u64) -> FilterResult<()> {
        let initial = params.float(INITIAL_MEANS)?.to_vec();
        let times = params.float(TIMES_TO_FIT).map(<[f64]>::to_vec).unwrap_or_default();
        let mut rng = StdRng::seed_from_u64(seed);
        for time in times {
            let values = initial
                .iter()
                .map(|mean| mean + rng.gen_range(-MEAN_NOISE_HALF_WIDTH..MEAN_NOISE_HALF_WIDTH))
                .collect();
            params.float_params_mask.insert(time_means_name(time), vec![true; initial.len()]);
            params.set_float(&time_means_name(time), values);
        }
        Ok(())
    }

    pub fn configure(&mut self, partition_index: usize, settings: &Settings) -> FilterResult<()> {
        let params = &settings.params[partition_index];
        self.state_width = settings.state_widths[partition_index];
        let initial = params.float(INITIAL_MEANS)?;
        if initial.len() != self.state_width {
            return Err(FilterError::DimensionMismatch {
                expected: self.state_width,
                found: initial.len(),
            });
        }
        self.initial_means = Array1::from(initial.to_vec());
        self.means_in_time.clear();
        self.kernel.configure(partition_index, settings)?;
        self.set_params(params)
    }

    /// Refresh per-time means and the covariance kernel.
    ///
    /// # Errors
    /// - `MissingFloatParam` for a listed time without its `means_at_time_*`.
    /// - [`FilterError::DimensionMismatch`] when a per-time mean does not
    ///   match the configured state width.
    pub fn set_params(&mut self, params: &NamedParams) -> FilterResult<()> {
        if let Ok(times) = params.float(TIMES_TO_FIT) {
            for &time in times {
                let means = params.float(&time_means_name(time))?;
                if means.len() != self.state_width {
                    return Err(FilterError::DimensionMismatch {
                        expected: self.state_width,
                        found: means.len(),
                    });
                }
                self.means_in_time.insert(time.to_bits(), Array1::from(means.to_vec()));
            }
        }
        self.kernel.set_params(params)
    }

    fn mean_at(&self, time: f64) -> &Array1<f64> {
        self.means_in_time.get(&time.to_bits()).unwrap_or(&self.initial_means)
    }

    /// Gaussian transition density between the two deviations.
    ///
    /// Returns `NaN` when the covariance has no Cholesky factor.
    pub fn evaluate(
        &self, current_state: ArrayView1<f64>, past_state: ArrayView1<f64>, current_time: f64,
        past_time: f64,
    ) -> f64 {
        let width = self.state_width;
        let current_diff = &current_state - self.mean_at(current_time);
        let past_diff = &past_state - self.mean_at(past_time);
        let covariance = self.kernel.covariance(current_state, past_state, current_time, past_time);
        let matrix = DMatrix::from_fn(width, width, |i, j| covariance[[i, j]]);
        let Some(cholesky) = matrix.cholesky() else {
            return f64::NAN;
        };
        let solved = cholesky.solve(&DVector::from_iterator(width, current_diff.iter().copied()));
        let quadratic: f64 = solved.iter().zip(past_diff.iter()).map(|(a, b)| a * b).sum();
        let log_det: f64 = 2.0 * cholesky.l().diagonal().iter().map(|d| d.ln()).sum::<f64>();
        (-0.5 * quadratic - 0.5 * width as f64 * LN_TWO_PI - 0.5 * log_det).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Covariance assembly from the upper triangle, per-time mean seeding, and
    // the density against a hand-computed Gaussian.
    // -------------------------------------------------------------------------

    fn settings(params: NamedParams, width: usize) -> Settings {
        Settings {
            params: vec![params],
            init_state_values: vec![vec![0.0; width]],
            init_time_value: 0.0,
            seeds: vec![3],
            state_widths: vec![width],
            state_history_depths: vec![3],
            timesteps_history_depth: 3,
        }
    }

    #[test]
    // Purpose
    // -------
    // The upper triangle is read row-major into a symmetric matrix.
    fn constant_kernel_fills_symmetric_matrix() {
        // Arrange
        let params =
            NamedParams::new().with_float(UPPER_TRIANGLE_COVARIANCE, vec![1.0, 0.5, 0.2, 2.0, 0.3, 3.0]);
        let mut kernel = CovarianceKernel::constant();

        // Act
        kernel.configure(0, &settings(params, 3)).unwrap();

        // Assert
        let zeros = array![0.0, 0.0, 0.0];
        let cov = kernel.covariance(zeros.view(), zeros.view(), 0.0, 0.0);
        assert_eq!(cov, &array![[1.0, 0.5, 0.2], [0.5, 2.0, 0.3], [0.2, 0.3, 3.0]]);
    }

    #[test]
    // Purpose
    // -------
    // A triangle of the wrong size is rejected.
    fn constant_kernel_rejects_wrong_triangle_length() {
        let params = NamedParams::new().with_float(UPPER_TRIANGLE_COVARIANCE, vec![1.0, 2.0]);
        let mut kernel = CovarianceKernel::constant();

        let err = kernel.configure(0, &settings(params, 2));

        assert_eq!(err, Err(FilterError::DimensionMismatch { expected: 3, found: 2 }));
    }

    #[test]
    // Purpose
    // -------
    // With identity covariance and zero means the weight is the standard
    // bivariate normal product form exp(-x·y/2) / (2π).
    fn density_matches_hand_computed_value() {
        // Arrange
        let params = NamedParams::new()
            .with_float(INITIAL_MEANS, vec![0.0, 0.0])
            .with_float(UPPER_TRIANGLE_COVARIANCE, vec![1.0, 0.0, 1.0]);
        let mut gp = GaussianProcessProbability::new(CovarianceKernel::constant());
        gp.configure(0, &settings(params, 2)).unwrap();
        let current = array![1.0, 2.0];
        let past = array![0.5, -1.0];

        // Act
        let weight = gp.evaluate(current.view(), past.view(), 1.0, 0.0);

        // Assert
        let expected = (-0.5_f64 * (0.5 - 2.0)).exp() / (2.0 * std::f64::consts::PI);
        assert_relative_eq!(weight, expected, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // A per-time mean of the wrong width is rejected before it can reach the
    // density.
    //
    // Given
    // -----
    // - State width 2 with `means_at_time_1.000000 = [0, 0, 0]`.
    //
    // Expect
    // ------
    // - `configure` and a later `set_params` both return `DimensionMismatch`.
    fn per_time_means_must_match_state_width() {
        // Arrange
        let good = NamedParams::new()
            .with_float(INITIAL_MEANS, vec![0.0, 0.0])
            .with_float(UPPER_TRIANGLE_COVARIANCE, vec![1.0, 0.0, 1.0]);
        let bad = good
            .clone()
            .with_float(TIMES_TO_FIT, vec![1.0])
            .with_float(&time_means_name(1.0), vec![0.0, 0.0, 0.0]);
        let mut gp = GaussianProcessProbability::new(CovarianceKernel::constant());

        // Act
        let configured = gp.configure(0, &settings(bad.clone(), 2));
        gp.configure(0, &settings(good, 2)).unwrap();
        let refreshed = gp.set_params(&bad);

        // Assert
        let expected = Err(FilterError::DimensionMismatch { expected: 2, found: 3 });
        assert_eq!(configured, expected);
        assert_eq!(refreshed, expected);
    }

    #[test]
    // Purpose
    // -------
    // An indefinite covariance yields the NaN sentinel instead of a weight.
    fn indefinite_covariance_returns_nan() {
        let params = NamedParams::new()
            .with_float(INITIAL_MEANS, vec![0.0, 0.0])
            .with_float(UPPER_TRIANGLE_COVARIANCE, vec![1.0, 2.0, 1.0]);
        let mut gp = GaussianProcessProbability::new(CovarianceKernel::constant());
        gp.configure(0, &settings(params, 2)).unwrap();
        let x = array![1.0, 1.0];

        assert!(gp.evaluate(x.view(), x.view(), 1.0, 0.0).is_nan());
    }

    #[test]
    // Purpose
    // -------
    // Seeding registers masked per-time means close to the initial means, and
    // the kernel then uses them for matching times.
    //
    // Given
    // -----
    // - initial_means = [5.0], times_to_fit = [2.0].
    //
    // Expect
    // ------
    // - `means_at_time_2.000000` exists, is masked, and lies within 1e-4 of 5.
    fn seed_time_means_registers_masked_params() {
        // Arrange
        let mut params = NamedParams::new()
            .with_float(INITIAL_MEANS, vec![5.0])
            .with_float(TIMES_TO_FIT, vec![2.0])
            .with_float(UPPER_TRIANGLE_COVARIANCE, vec![1.0]);

        // Act
        GaussianProcessProbability::seed_time_means(&mut params, 11).unwrap();

        // Assert
        let name = time_means_name(2.0);
        assert_eq!(name, "means_at_time_2.000000");
        let seeded = params.float(&name).unwrap()[0];
        assert!((seeded - 5.0).abs() < 1e-4);
        assert_eq!(params.float_params_mask[&name], vec![true]);

        let mut gp = GaussianProcessProbability::new(CovarianceKernel::constant());
        gp.configure(0, &settings(params, 1)).unwrap();
        assert_relative_eq!(gp.mean_at(2.0)[0], seeded);
        assert_relative_eq!(gp.mean_at(1.0)[0], 5.0);
    }
}
