//! learning: objectives, evaluators and the loops that refit parameters.
//!
//! Purpose
//! -------
//! Turn the probability filter's per-step log-likelihood into something an
//! optimiser can maximize, and run that optimisation either offline over a
//! whole stream, online over sliding windows, or across concurrent learners.
//!
//! Key behaviors
//! -------------
//! - [`ObjectiveIteration`] accumulates post-burn-in log-likelihoods around
//!   any step function.
//! - [`ObjectiveEvaluator`] runs one engine pass per candidate parameter set
//!   and reports per-partition records to an [`ObjectiveOutput`] sink.
//! - [`OnlineLearningIteration`] keeps a [`SlidingWindow`] per streamer and
//!   periodically refits their parameters.
//! - [`LearningOptimiser`] runs independent learners in barrier-synchronised
//!   rounds driven by a [`MetaAlgorithm`].
//!
//! Conventions
//! -----------
//! - Output sinks are passed explicitly as `Arc<dyn ObjectiveOutput>`; there
//!   is no process-wide logger of records.
//! - Engine-level failures surface as `SimError`; coordination failures as
//!   [`LearningError`].
pub mod errors;
pub mod evaluator;
pub mod objective;
pub mod online;
pub mod optimiser;
pub mod output;
pub mod window;

pub use self::errors::{LearningError, LearningResult};
pub use self::evaluator::ObjectiveEvaluator;
pub use self::objective::ObjectiveIteration;
pub use self::online::{
    LEARNER_HISTORY_DEPTHS, OnlineLearningConfig, OnlineLearningIteration, REFIT_STEPS,
    STREAMER_PARTITION_INDICES,
};
pub use self::optimiser::{LearnerBest, LearningOptimiser, MetaAlgorithm, PerturbationSearch};
pub use self::output::{JsonLogOutput, MemoryOutput, NilOutput, ObjectiveOutput, ObjectiveRecord};
pub use self::window::SlidingWindow;
