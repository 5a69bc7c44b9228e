//! Execution helpers that run an `argmin` solver on an [`EvaluatorProblem`]
//! and return a crate-friendly [`OptimOutcome`].
use argmin::core::{Executor, IterState, Solver, State};

use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        adapter::EvaluatorProblem,
        traits::{OptimOutcome, OptimiserOptions},
        types::{Grad, Theta},
    },
};

/// Solver state for gradient-based runs.
pub type GradientState = IterState<Theta, Grad, (), (), (), f64>;

/// Solver state for derivative-free runs.
pub type SimplexState = IterState<Theta, (), (), (), (), f64>;

/// Run a gradient-based solver from `theta0`.
///
/// # Errors
/// - Any argmin runtime error, including errors raised by cost or gradient
///   evaluations (recovered as the original [`OptError`](crate::optimization::OptError)).
/// - Validation errors when constructing the [`OptimOutcome`].
pub fn run_lbfgs<'a, S>(
    theta0: Theta, opts: &OptimiserOptions, problem: EvaluatorProblem<'a>, solver: S,
) -> OptResult<OptimOutcome>
where
    S: Solver<EvaluatorProblem<'a>, GradientState>,
{
    let mut optimizer = Executor::new(problem, solver).configure(|state| state.param(theta0));
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }
    let mut result = optimizer.run()?.state().clone();
    OptimOutcome::new(
        result.take_best_param(),
        -result.get_best_cost(),
        result.get_termination_status().clone(),
        result.get_iter(),
        result.get_func_counts().clone(),
        result.take_gradient(),
    )
}

/// Run a simplex solver; its starting point is carried by the solver itself.
///
/// # Errors
/// As for [`run_lbfgs`].
pub fn run_nelder_mead<'a, S>(
    opts: &OptimiserOptions, problem: EvaluatorProblem<'a>, solver: S,
) -> OptResult<OptimOutcome>
where
    S: Solver<EvaluatorProblem<'a>, SimplexState>,
{
    let mut optimizer = Executor::new(problem, solver);
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }
    let mut result = optimizer.run()?.state().clone();
    OptimOutcome::new(
        result.take_best_param(),
        -result.get_best_cost(),
        result.get_termination_status().clone(),
        result.get_iter(),
        result.get_func_counts().clone(),
        None,
    )
}
