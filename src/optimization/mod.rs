//! optimization: parameter refitting and its unified error surface.
//!
//! Purpose
//! -------
//! Provide the numerical optimiser used by offline fits and by online
//! learners' periodic refits, plus a single error enum ([`OptError`]) that
//! normalizes option mistakes, numerical failures, engine errors and
//! backend solver errors.
//!
//! Conventions
//! -----------
//! - All solvers maximize a log-likelihood `ℓ(θ)` by minimizing
//!   `c(θ) = -ℓ(θ)`; user-facing outcomes are expressed in terms of `ℓ`.
//! - Public entry points that can fail return [`OptResult<T>`]; callers
//!   never see raw Argmin errors.
//!
//! Downstream usage
//! ----------------
//! - `learning::OnlineLearningIteration` and the binary call
//!   [`OptimisationAlgorithm::run`], usually via `optimization::prelude::*`.
pub mod errors;
pub mod loglik_optimizer;

pub use self::errors::{OptError, OptResult};
pub use self::loglik_optimizer::{
    LineSearcher, OptimOutcome, OptimisationAlgorithm, OptimiserOptions, SolverMethod, Tolerances,
};

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
}
