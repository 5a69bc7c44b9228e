//! learnadex: online probability-reweighting filters and their learners.
//!
//! Purpose
//! -------
//! Estimate the parameters of a weighting kernel that decides how much each
//! past observation of a time series counts toward an empirical mean and
//! covariance, score the live observation against that empirical
//! distribution and optimise the resulting log-likelihood offline, online
//! over sliding windows, or across concurrent learners.
//!
//! Key behaviors
//! -------------
//! - [`filter`] composes a kernel, weighted statistics and an observation
//!   model into a per-step log-likelihood.
//! - [`learning`] accumulates that likelihood over engine runs, refits
//!   parameters over sliding windows and coordinates learner rounds.
//! - [`optimization`] wraps argmin solvers over the masked parameters.
//! - [`simulator`] and [`data`] provide the minimal step engine and the
//!   replayed streams that drive everything else.
//! - [`log_query`] filters the JSON objective logs a run produces.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every partition carries its own [`params::NamedParams`]; only masked
//!   entries are ever moved by an optimiser.
//! - Kernel weights are non-negative; a negative weight is fatal.
//! - Evaluators are reset after every evaluation, so repeated calls with the
//!   same parameters agree.
//!
//! Downstream usage
//! ----------------
//! - The `learnadex` binary loads a [`config::RunConfig`], replays a CSV
//!   stream and prints the fitted parameters.
//! - Library users typically build an [`learning::ObjectiveEvaluator`] by
//!   hand and call [`optimization::OptimisationAlgorithm::run`] or drive
//!   a [`learning::LearningOptimiser`].
//!
//! Testing notes
//! -------------
//! - Every module carries unit tests; `tests/` holds end-to-end runs over
//!   replayed streams.
pub mod config;
pub mod data;
pub mod filter;
pub mod learning;
pub mod log_query;
pub mod optimization;
pub mod params;
pub mod simulator;
