//! filter: the probability-reweighting filter.
//!
//! Purpose
//! -------
//! Turn a partition's rolling history into a per-step log-likelihood: a
//! kernel weights every past observation against the current one, the
//! weights produce an empirical mean and covariance, and an observation
//! model scores the current observation against them.
//!
//! Key behaviors
//! -------------
//! - [`ConditionalProbability`] is the closed set of weighting kernels
//!   (uniform, exponential time weighting, Gaussian process).
//! - [`Statistics`] computes the kernel-weighted mean and covariance over
//!   history rows `1..depth`.
//! - [`DataLinkingLikelihood`] scores data under Normal, Gamma, Poisson or
//!   NegativeBinomial families and can sample from them.
//! - [`ProbabilityFilterLikelihood`] composes the three.
//! - [`ReweightingIteration`] steps a partition forward with the weighted
//!   mean of its own history as the next state.
//!
//! Invariants & assumptions
//! ------------------------
//! - Kernel weights are non-negative; a negative weight is an error.
//! - Row 0 of a history is the observation being scored and never
//!   contributes to its own statistics.
//! - Statistics are rebuilt on every evaluation and never cached.
//!
//! Downstream usage
//! ----------------
//! - `learning::ObjectiveIteration` evaluates a [`ProbabilityFilterLikelihood`]
//!   once per post-burn-in step and accumulates the result.
//! - [`ReweightingIteration`] plugs straight into a
//!   `simulator::PartitionCoordinator` as a partition's step function.
//!
//! Testing notes
//! -------------
//! - Unit tests pin the worked three-entry example (mean 3.5, variance
//!   0.25), the uniform/exponential equivalence and hand-computed
//!   moment-matched densities.
pub mod data_linking;
pub mod errors;
pub mod gaussian_process;
pub mod kernel;
pub mod likelihood;
pub mod reweighting;
pub mod statistics;

pub use self::data_linking::{DataLinkFamily, DataLinkingLikelihood};
pub use self::errors::{FilterError, FilterResult};
pub use self::gaussian_process::{CovarianceKernel, GaussianProcessProbability};
pub use self::kernel::ConditionalProbability;
pub use self::likelihood::ProbabilityFilterLikelihood;
pub use self::reweighting::ReweightingIteration;
pub use self::statistics::Statistics;
