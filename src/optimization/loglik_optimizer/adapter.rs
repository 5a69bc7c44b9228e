//! Adapter that exposes an [`ObjectiveEvaluator`] as an `argmin` problem.
//!
//! Maximizing the evaluator's total log-likelihood `ℓ(θ)` becomes minimizing
//! `c(θ) = -ℓ(θ)`. Every cost evaluation works on its own copy of both the
//! evaluator and the parameter sets, so concurrent probes never share
//! mutable state.
use std::cell::RefCell;

use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;
use rayon::prelude::*;

use crate::{
    learning::ObjectiveEvaluator,
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{
            traits::OptimiserOptions,
            types::{Cost, Grad, Theta},
            validation::validate_grad,
        },
    },
    params::{NamedParams, ParamsMapping},
};

/// Bridges an evaluator and its masked parameter layout to argmin.
///
/// - `CostFunction::cost` returns `-ℓ(θ)`.
/// - `Gradient::gradient` returns a central-difference gradient of the cost,
///   computed either by `finitediff` on the calling thread or by `rayon`
///   across copied evaluators when `options.parallel_trials` is set.
pub struct EvaluatorProblem<'a> {
    pub evaluator: &'a ObjectiveEvaluator,
    pub params: &'a [NamedParams],
    pub mapping: &'a ParamsMapping,
    pub options: &'a OptimiserOptions,
}

impl<'a> EvaluatorProblem<'a> {
    pub fn new(
        evaluator: &'a ObjectiveEvaluator, params: &'a [NamedParams], mapping: &'a ParamsMapping,
        options: &'a OptimiserOptions,
    ) -> Self {
        Self { evaluator, params, mapping, options }
    }

    /// Log-likelihood of `theta` on a fresh evaluator copy.
    ///
    /// # Errors
    /// - Parameter layout errors from `unflatten`.
    /// - Any engine or filter error raised by the run.
    pub fn log_likelihood(&self, theta: &Theta) -> OptResult<f64> {
        let mut evaluator = self.evaluator.copy()?;
        let mut params = self.params.to_vec();
        self.mapping.unflatten(theta, &mut params)?;
        Ok(evaluator.evaluate(&params)?)
    }

    /// `-ℓ(θ)`, rejecting `NaN`.
    ///
    /// A log-likelihood of `-∞` (data impossible under θ) maps to a cost of
    /// `+∞` so simplex solvers can step away from it.
    ///
    /// # Errors
    /// [`OptError::NonFiniteCost`] for `NaN` or `+∞` log-likelihoods, plus
    /// anything raised by [`EvaluatorProblem::log_likelihood`].
    pub fn negated(&self, theta: &Theta) -> OptResult<Cost> {
        let value = self.log_likelihood(theta)?;
        if value.is_nan() || value == f64::INFINITY {
            return Err(OptError::NonFiniteCost { value });
        }
        Ok(-value)
    }

    /// Central differences with one independent evaluator copy per probe.
    fn parallel_central_diff(&self, theta: &Theta) -> OptResult<Grad> {
        let step = f64::EPSILON.sqrt();
        let partials: OptResult<Vec<f64>> = (0..theta.len())
            .into_par_iter()
            .map(|index| {
                let h = step * theta[index].abs().max(1.0);
                let mut forward = theta.clone();
                forward[index] += h;
                let mut backward = theta.clone();
                backward[index] -= h;
                Ok((self.negated(&forward)? - self.negated(&backward)?) / (2.0 * h))
            })
            .collect();
        Ok(Grad::from(partials?))
    }

    /// Central differences via `finitediff`, capturing the first cost error.
    ///
    /// The finite-difference closure must return `f64`, so errors are stashed
    /// in a cell and `NaN` is returned in their place.
    fn sequential_central_diff(&self, theta: &Theta) -> OptResult<Grad> {
        let closure_err: RefCell<Option<OptError>> = RefCell::new(None);
        let cost_func = |theta: &Theta| -> f64 {
            match self.negated(theta) {
                Ok(value) => value,
                Err(e) => {
                    let mut slot = closure_err.borrow_mut();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                    f64::NAN
                }
            }
        };
        let grad = theta.central_diff(&cost_func);
        if let Some(err) = closure_err.take() {
            return Err(err);
        }
        Ok(grad)
    }
}

impl CostFunction for EvaluatorProblem<'_> {
    type Param = Theta;
    type Output = Cost;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.negated(theta)?)
    }
}

impl Gradient for EvaluatorProblem<'_> {
    type Param = Theta;
    type Gradient = Grad;

    /// Finite-difference gradient of the cost.
    ///
    /// # Errors
    /// - Any error raised by a probe's cost evaluation.
    /// - [`OptError::InvalidGradient`] if an entry is non-finite.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let grad = if self.options.parallel_trials {
            self.parallel_central_diff(theta)?
        } else {
            self.sequential_central_diff(theta)?
        };
        validate_grad(&grad)?;
        Ok(grad)
    }
}
