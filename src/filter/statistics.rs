//! Kernel-weighted mean and covariance over a partition's history window.
//!
//! History row 0 is the observation being scored, so only rows
//! `1..depth` contribute. Each row is weighted by the kernel against row 0,
//! the mean is normalised by the weight total, and the covariance is the
//! weighted outer product of deviations normalised by the same total (no
//! Bessel correction).
use nalgebra::{Cholesky, DMatrix, DVector, Dyn};
use ndarray::{Array1, Array2, ArrayView1};

use crate::{
    filter::{
        errors::{FilterError, FilterResult},
        kernel::ConditionalProbability,
    },
    simulator::{StateHistory, TimestepsHistory},
};

/// Weighted mean and covariance of one history window.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub mean: Array1<f64>,
    pub covariance: Array2<f64>,
}

impl Statistics {
    /// Pair a mean with a square covariance of matching dimension.
    ///
    /// # Errors
    /// [`FilterError::DimensionMismatch`] if the shapes disagree.
    pub fn new(mean: Array1<f64>, covariance: Array2<f64>) -> FilterResult<Self> {
        let dim = mean.len();
        if covariance.nrows() != dim || covariance.ncols() != dim {
            return Err(FilterError::DimensionMismatch { expected: dim, found: covariance.nrows() });
        }
        Ok(Self { mean, covariance })
    }

    /// Weight every past row of `state_history` with `kernel` and reduce.
    ///
    /// # Errors
    /// - [`FilterError::EmptyWindow`] for histories shallower than 2.
    /// - [`FilterError::NegativeWeight`] on the first negative weight.
    /// - [`FilterError::ZeroWeightSum`] when all weights are zero.
    pub fn compute(
        kernel: &ConditionalProbability, state_history: &StateHistory,
        timesteps_history: &TimestepsHistory,
    ) -> FilterResult<Self> {
        Self::compute_with(
            |current, past, current_time, past_time| {
                kernel.evaluate(current, past, current_time, past_time)
            },
            state_history,
            timesteps_history,
        )
    }

    pub(crate) fn compute_with<W>(
        weight_of: W, state_history: &StateHistory, timesteps_history: &TimestepsHistory,
    ) -> FilterResult<Self>
    where
        W: Fn(ArrayView1<f64>, ArrayView1<f64>, f64, f64) -> f64,
    {
        let depth = state_history.depth();
        if depth < 2 {
            return Err(FilterError::EmptyWindow { depth });
        }
        if timesteps_history.depth() < depth {
            return Err(FilterError::DimensionMismatch {
                expected: depth,
                found: timesteps_history.depth(),
            });
        }
        let current = state_history.current();
        let current_time = timesteps_history.values[0];

        let mut weights = Vec::with_capacity(depth - 1);
        for index in 1..depth {
            let weight = weight_of(
                current,
                state_history.row(index),
                current_time,
                timesteps_history.values[index],
            );
            if weight < 0.0 {
                return Err(FilterError::NegativeWeight { index, weight });
            }
            weights.push(weight);
        }
        let total: f64 = weights.iter().sum();
        if total == 0.0 {
            return Err(FilterError::ZeroWeightSum);
        }

        let width = state_history.state_width();
        let mut mean = Array1::<f64>::zeros(width);
        for (offset, &weight) in weights.iter().enumerate() {
            mean.scaled_add(weight, &state_history.row(offset + 1));
        }
        mean /= total;

        let mut covariance = Array2::<f64>::zeros((width, width));
        for (offset, &weight) in weights.iter().enumerate() {
            let diff = &state_history.row(offset + 1) - &mean;
            let column = diff.view().insert_axis(ndarray::Axis(1));
            let row = diff.view().insert_axis(ndarray::Axis(0));
            covariance.scaled_add(weight, &column.dot(&row));
        }
        covariance /= total;

        Ok(Self { mean, covariance })
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    pub fn variance(&self, index: usize) -> f64 {
        self.covariance[[index, index]]
    }

    /// Cholesky factor of the covariance, derived on demand.
    ///
    /// # Errors
    /// [`FilterError::CovarianceNotPositiveDefinite`] if no factor exists.
    pub fn cholesky(&self) -> FilterResult<Cholesky<f64, Dyn>> {
        let dim = self.dim();
        DMatrix::from_fn(dim, dim, |i, j| self.covariance[[i, j]])
            .cholesky()
            .ok_or(FilterError::CovarianceNotPositiveDefinite)
    }

    /// Inverse covariance through the Cholesky factor.
    pub fn inverse_covariance(&self) -> FilterResult<Array2<f64>> {
        let inverse = self.cholesky()?.inverse();
        let dim = self.dim();
        Ok(Array2::from_shape_fn((dim, dim), |(i, j)| inverse[(i, j)]))
    }

    /// `ln |Σ|` through the Cholesky factor.
    pub fn log_det_covariance(&self) -> FilterResult<f64> {
        let factor = self.cholesky()?;
        Ok(2.0 * factor.l().diagonal().iter().map(|d| d.ln()).sum::<f64>())
    }

    /// Solve `Σ x = rhs` through the Cholesky factor.
    pub(crate) fn solve(factor: &Cholesky<f64, Dyn>, rhs: ArrayView1<f64>) -> Array1<f64> {
        let solved = factor.solve(&DVector::from_iterator(rhs.len(), rhs.iter().copied()));
        Array1::from_iter(solved.iter().copied())
    }
}
