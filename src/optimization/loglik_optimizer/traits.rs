//! Configuration and result types for parameter refitting.
//!
//! - [`SolverMethod`] and [`LineSearcher`]: which argmin solver to run.
//! - [`OptimiserOptions`] and [`Tolerances`]: validated solver configuration.
//! - [`OptimOutcome`]: normalized result of one optimisation run.
//!
//! Convention: we *maximize* the evaluator's total log-likelihood `ℓ(θ)` by
//! minimizing the cost `c(θ) = -ℓ(θ)`.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        FnEvalMap, Grad, Theta,
        types::{DEFAULT_LBFGS_MEM, DEFAULT_SIMPLEX_STEP},
        validation::{
            validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad,
            verify_tol_simplex,
        },
    },
};
use argmin::core::TerminationStatus;
use argmin_math::ArgminL2Norm;
use std::str::FromStr;

/// Choice of line search used inside the L-BFGS solver.
///
/// Parsing accepts case-insensitive names (`"MoreThuente"`, `"HagerZhang"`).
/// Unknown names return `OptError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Solver family used by [`crate::optimization::OptimisationAlgorithm`].
///
/// `NelderMead` is derivative free; `Lbfgs` takes finite-difference
/// gradients of the cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverMethod {
    NelderMead,
    Lbfgs(LineSearcher),
}

impl FromStr for SolverMethod {
    type Err = OptError;

    /// Accepts `"NelderMead"`, `"Lbfgs"` (More–Thuente) or
    /// `"Lbfgs:<line searcher>"`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        match lower.split_once(':') {
            None if lower == "neldermead" => Ok(SolverMethod::NelderMead),
            None if lower == "lbfgs" => Ok(SolverMethod::Lbfgs(LineSearcher::MoreThuente)),
            Some(("lbfgs", searcher)) => Ok(SolverMethod::Lbfgs(searcher.parse()?)),
            _ => Err(OptError::InvalidMethod {
                name: s.to_string(),
                reason: "Valid options are 'NelderMead', 'Lbfgs' or 'Lbfgs:<line searcher>'.",
            }),
        }
    }
}

/// Numerical tolerances and iteration limits.
///
/// - `tol_grad`: L-BFGS stops when the gradient norm falls below this.
/// - `tol_cost`: L-BFGS stops when the change in cost falls below this.
/// - `tol_simplex`: Nelder–Mead stops when the standard deviation of the
///   simplex costs falls below this.
/// - `max_iter`: hard cap on the number of iterations.
///
/// At least one field must be provided (see [`Tolerances::new`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub tol_simplex: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if every field is `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] /
    ///   [`OptError::InvalidTolSimplex`] for non-finite or non-positive values.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, tol_simplex: Option<f64>,
        max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && tol_simplex.is_none() && max_iter.is_none()
        {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_grad(tol_grad)?;
        verify_tol_cost(tol_cost)?;
        verify_tol_simplex(tol_simplex)?;
        if max_iter == Some(0) {
            return Err(OptError::InvalidMaxIter {
                max_iter: 0,
                reason: "Maximum iterations must be greater than zero.",
            });
        }
        Ok(Self { tol_grad, tol_cost, tol_simplex, max_iter })
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self { tol_grad: Some(1e-6), tol_cost: None, tol_simplex: Some(1e-8), max_iter: Some(300) }
    }
}

/// Optimiser-level configuration.
///
/// - `method`: solver family.
/// - `tols`: tolerances and iteration cap.
/// - `lbfgs_mem`: L-BFGS history size; `None` uses [`DEFAULT_LBFGS_MEM`].
/// - `simplex_step`: offset of each initial simplex vertex from `θ0`.
/// - `parallel_trials`: evaluate finite-difference probes concurrently on
///   copied evaluators.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimiserOptions {
    pub method: SolverMethod,
    pub tols: Tolerances,
    pub lbfgs_mem: Option<usize>,
    pub simplex_step: f64,
    pub parallel_trials: bool,
}

impl OptimiserOptions {
    /// Create validated options.
    ///
    /// # Errors
    /// - [`OptError::InvalidLBFGSMem`] if `lbfgs_mem == Some(0)`.
    /// - [`OptError::InvalidStepSize`] if `simplex_step` is not finite and
    ///   positive.
    pub fn new(
        method: SolverMethod, tols: Tolerances, lbfgs_mem: Option<usize>, simplex_step: f64,
        parallel_trials: bool,
    ) -> OptResult<Self> {
        if lbfgs_mem == Some(0) {
            return Err(OptError::InvalidLBFGSMem {
                mem: 0,
                reason: "L-BFGS memory must be greater than zero.",
            });
        }
        if !simplex_step.is_finite() || simplex_step <= 0.0 {
            return Err(OptError::InvalidStepSize {
                step: simplex_step,
                reason: "Simplex step must be finite and positive.",
            });
        }
        Ok(Self { method, tols, lbfgs_mem, simplex_step, parallel_trials })
    }

    pub fn lbfgs_mem(&self) -> usize {
        self.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM)
    }
}

impl Default for OptimiserOptions {
    fn default() -> Self {
        Self {
            method: SolverMethod::NelderMead,
            tols: Tolerances::default(),
            lbfgs_mem: None,
            simplex_step: DEFAULT_SIMPLEX_STEP,
            parallel_trials: false,
        }
    }
}

/// Result of one optimisation run.
///
/// - `theta_hat`: best parameter vector found.
/// - `value`: best **log-likelihood** value `ℓ(θ̂)` (not the cost).
/// - `converged`: `true` if the solver reported a terminating status.
/// - `status`: human-readable termination status string.
/// - `iterations`: number of optimizer iterations performed.
/// - `fn_evals`: argmin's counters, e.g. `cost_count`, `gradient_count`.
/// - `grad_norm`: norm of the last available gradient, if present.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from raw solver state.
    ///
    /// # Errors
    /// - Propagates validation errors for `theta_hat` or `value`.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let (converged, status) = match termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            other => (true, format!("{other:?}")),
        };
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self {
            theta_hat,
            value,
            converged,
            status,
            iterations: iterations as usize,
            fn_evals,
            grad_norm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn solver_method_parses_case_insensitively() {
        assert_eq!("neldermead".parse::<SolverMethod>(), Ok(SolverMethod::NelderMead));
        assert_eq!(
            "LBFGS".parse::<SolverMethod>(),
            Ok(SolverMethod::Lbfgs(LineSearcher::MoreThuente))
        );
        assert_eq!(
            "lbfgs:HagerZhang".parse::<SolverMethod>(),
            Ok(SolverMethod::Lbfgs(LineSearcher::HagerZhang))
        );
        assert!(matches!("bfgs".parse::<SolverMethod>(), Err(OptError::InvalidMethod { .. })));
        assert!(matches!(
            "lbfgs:armijo".parse::<SolverMethod>(),
            Err(OptError::InvalidLineSearch { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Option constructors reject unusable settings up front.
    fn options_are_validated() {
        assert_eq!(Tolerances::new(None, None, None, None), Err(OptError::NoTolerancesProvided));
        assert!(matches!(
            Tolerances::new(None, None, None, Some(0)),
            Err(OptError::InvalidMaxIter { .. })
        ));
        let tols = Tolerances::default();
        assert!(matches!(
            OptimiserOptions::new(SolverMethod::NelderMead, tols, Some(0), 0.1, false),
            Err(OptError::InvalidLBFGSMem { .. })
        ));
        assert!(matches!(
            OptimiserOptions::new(SolverMethod::NelderMead, tols, None, -1.0, false),
            Err(OptError::InvalidStepSize { .. })
        ));
    }

    #[test]
    fn outcome_reports_not_terminated_as_unconverged() {
        let outcome = OptimOutcome::new(
            Some(array![1.0]),
            -2.0,
            TerminationStatus::NotTerminated,
            3,
            FnEvalMap::new(),
            None,
        )
        .unwrap();

        assert!(!outcome.converged);
        assert_eq!(outcome.status, "Not terminated");
        assert_eq!(outcome.iterations, 3);
    }
}
