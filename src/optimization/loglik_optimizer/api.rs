//! High-level entry point for refitting evaluator parameters.
//!
//! [`OptimisationAlgorithm::run`] flattens the masked entries of the
//! current parameters, maximizes the evaluator's total log-likelihood over
//! them with the configured argmin solver and writes the optimum back into
//! a copy of the parameters. Unmasked entries pass through unchanged.
use log::{debug, info};

use crate::{
    learning::ObjectiveEvaluator,
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{
            adapter::EvaluatorProblem,
            builders::{build_nelder_mead, build_optimizer_hager_zhang, build_optimizer_more_thuente},
            run::{run_lbfgs, run_nelder_mead},
            traits::{LineSearcher, OptimOutcome, OptimiserOptions, SolverMethod},
        },
    },
    params::{NamedParams, ParamsMapping},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptimisationAlgorithm {
    pub options: OptimiserOptions,
}

impl OptimisationAlgorithm {
    pub fn new(options: OptimiserOptions) -> Self {
        Self { options }
    }

    /// Refit the masked parameters and return the updated parameter sets.
    ///
    /// # Errors
    /// As for [`OptimisationAlgorithm::run_with_outcome`].
    pub fn run(
        &self, evaluator: &ObjectiveEvaluator, previous_params: &[NamedParams],
    ) -> OptResult<Vec<NamedParams>> {
        self.run_with_outcome(evaluator, previous_params).map(|(params, _)| params)
    }

    /// Refit and also return the solver diagnostics.
    ///
    /// # Errors
    /// - [`OptError::NoFreeParameters`] if nothing is masked.
    /// - [`OptError::NotConverged`] if the solver stopped without a
    ///   terminating status.
    /// - Any cost, gradient or solver error raised during the run.
    pub fn run_with_outcome(
        &self, evaluator: &ObjectiveEvaluator, previous_params: &[NamedParams],
    ) -> OptResult<(Vec<NamedParams>, OptimOutcome)> {
        let mapping = ParamsMapping::new(previous_params)?;
        if mapping.is_empty() {
            return Err(OptError::NoFreeParameters);
        }
        let theta0 = mapping.flatten(previous_params)?;
        debug!(dimension = mapping.len(); "starting optimisation");
        let problem = EvaluatorProblem::new(evaluator, previous_params, &mapping, &self.options);
        let outcome = match self.options.method {
            SolverMethod::NelderMead => {
                let solver = build_nelder_mead(&theta0, &self.options)?;
                run_nelder_mead(&self.options, problem, solver)?
            }
            SolverMethod::Lbfgs(LineSearcher::MoreThuente) => {
                let solver = build_optimizer_more_thuente(&self.options)?;
                run_lbfgs(theta0, &self.options, problem, solver)?
            }
            SolverMethod::Lbfgs(LineSearcher::HagerZhang) => {
                let solver = build_optimizer_hager_zhang(&self.options)?;
                run_lbfgs(theta0, &self.options, problem, solver)?
            }
        };
        if !outcome.converged {
            return Err(OptError::NotConverged { status: outcome.status });
        }
        info!(
            log_likelihood = outcome.value,
            iterations = outcome.iterations,
            status = outcome.status.as_str();
            "optimisation finished"
        );
        let mut params = previous_params.to_vec();
        mapping.unflatten(&outcome.theta_hat, &mut params)?;
        Ok((params, outcome))
    }
}
