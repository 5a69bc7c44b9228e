//! loglik_optimizer: argmin-powered refitting of masked filter parameters.
//!
//! Purpose
//! -------
//! Maximize an [`ObjectiveEvaluator`](crate::learning::ObjectiveEvaluator)'s
//! total log-likelihood over the masked entries of its partitions'
//! parameters, using either Nelder–Mead or L-BFGS with finite-difference
//! gradients.
//!
//! Key behaviors
//! -------------
//! - [`adapter::EvaluatorProblem`] turns `ℓ(θ)` into the cost `c(θ) = -ℓ(θ)`,
//!   copying the evaluator and parameters on every evaluation.
//! - [`builders`] construct solvers from [`OptimiserOptions`]; [`run`]
//!   executes them and normalizes the result into an [`OptimOutcome`].
//! - [`OptimisationAlgorithm`] is the single user-facing entry point.
//!
//! Invariants & assumptions
//! ------------------------
//! - `θ` follows the layout of `params::ParamsMapping`; unmasked entries
//!   are never moved.
//! - A `NaN` log-likelihood is an error; `-∞` is a valid (worst) value.
//! - Non-convergence and solver errors are fatal to the run and surface as
//!   [`OptError`](crate::optimization::OptError).
//!
//! Testing notes
//! -------------
//! - Unit tests cover option parsing, validation and solver construction.
//! - `tests/integration_refit.rs` refits a replayed stream end to end with
//!   both solver families.
pub mod adapter;
pub mod api;
pub mod builders;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::adapter::EvaluatorProblem;
pub use self::api::OptimisationAlgorithm;
pub use self::traits::{LineSearcher, OptimOutcome, OptimiserOptions, SolverMethod, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, DEFAULT_SIMPLEX_STEP, FnEvalMap, Grad, Theta};

pub mod prelude {
    pub use super::api::OptimisationAlgorithm;
    pub use super::traits::{LineSearcher, OptimOutcome, OptimiserOptions, SolverMethod, Tolerances};
    pub use super::types::{Cost, Grad, Theta};
}
