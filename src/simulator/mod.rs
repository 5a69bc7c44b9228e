//! simulator: the step-engine contract consumed by the learning core.
//!
//! Purpose
//! -------
//! Provide the partitioned step-simulation surface the filter and learners
//! plug into: rolling state/time histories, static per-partition settings,
//! the [`Iteration`] trait, and a small sequential [`PartitionCoordinator`]
//! that drives iterations until a [`TerminationCondition`] holds.
//!
//! Key behaviors
//! -------------
//! - [`StateHistory`] and [`TimestepsHistory`] keep fixed-depth buffers,
//!   most recent first.
//! - [`Settings`] carries params, initial states, seeds, widths and depths
//!   for every partition and validates their consistency.
//! - The coordinator calls every iteration against the same pre-step
//!   histories, then commits all new states at once.
//!
//! Invariants & assumptions
//! ------------------------
//! - History depth and state width are constant for the lifetime of a run.
//! - Iterations are `Send + Sync` so evaluators holding them can be shared
//!   with worker threads and copied per optimizer trial.
//!
//! Downstream usage
//! ----------------
//! - `learning::ObjectiveEvaluator` builds one coordinator per evaluation.
//! - `data` supplies replay iterations, timestep functions and an
//!   end-of-stream termination for recorded streams.
pub mod coordinator;
pub mod errors;
pub mod history;
pub mod settings;

pub use self::coordinator::{
    ConstantTimestep, Iteration, NumberOfStepsTermination, PartitionCoordinator,
    TerminationCondition, TimestepFunction, rows_to_history,
};
pub use self::errors::{SimError, SimResult};
pub use self::history::{StateHistory, TimestepsHistory};
pub use self::settings::Settings;
