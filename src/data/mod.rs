//! data: recorded streams and their replay through the step engine.
//!
//! Purpose
//! -------
//! Load time series from CSV (or an online learner's window) and replay
//! them as partitions so the filter can score recorded observations.
//!
//! Key behaviors
//! -------------
//! - [`StreamData`] ingests CSV with skip-and-warn handling of bad rows.
//! - [`MemoryIteration`], [`MemoryTimestepFunction`] and
//!   [`EndOfStreamTermination`] replay a stream step by step.
//! - [`replay_settings`] builds engine settings for a set of streams.
//!
//! Downstream usage
//! ----------------
//! - The binary replays one CSV stream; online learners replay their
//!   sliding windows when refitting.
pub mod errors;
pub mod memory;
pub mod stream;

pub use self::errors::{DataError, DataResult};
pub use self::memory::{
    EndOfStreamTermination, MemoryIteration, MemoryTimestepFunction, replay_settings,
};
pub use self::stream::StreamData;
