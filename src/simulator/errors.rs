use crate::{
    data::DataError, filter::errors::FilterError, optimization::errors::OptError,
    params::ParamError,
};

/// Result alias for step-engine operations.
pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    // ---- Settings ----
    /// Per-partition settings vectors disagree in length or content.
    InvalidSettings {
        reason: String,
    },
    /// The engine was given a different number of iterations than partitions.
    PartitionCountMismatch {
        expected: usize,
        found: usize,
    },

    // ---- Stepping ----
    /// An iteration returned a state of the wrong width.
    StateWidthMismatch {
        partition_index: usize,
        expected: usize,
        found: usize,
    },
    /// A replayed stream has no record for the requested step.
    StreamExhausted {
        partition_index: usize,
        step: usize,
    },
    /// Time increments must be finite and strictly positive.
    InvalidTimestep {
        value: f64,
    },

    // ---- Online learning ----
    /// Streamers feeding one online learner must share the same window depth.
    WindowDepthMismatch {
        partition_index: usize,
        streamer_index: usize,
        expected: usize,
        found: usize,
    },

    // ---- Output ----
    /// An objective output sink failed to write.
    Output {
        reason: String,
    },

    // ---- Wrapped ----
    Param(ParamError),
    Filter(FilterError),
    Data(DataError),
    Optimisation(Box<OptError>),
}

impl std::error::Error for SimError {}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Settings ----
            SimError::InvalidSettings { reason } => write!(f, "Invalid settings: {reason}"),
            SimError::PartitionCountMismatch { expected, found } => {
                write!(f, "Partition count mismatch: expected {expected}, found {found}")
            }

            // ---- Stepping ----
            SimError::StateWidthMismatch { partition_index, expected, found } => {
                write!(
                    f,
                    "Partition {partition_index} produced a state of width {found}, expected {expected}"
                )
            }
            SimError::StreamExhausted { partition_index, step } => {
                write!(f, "Partition {partition_index} has no recorded data for step {step}")
            }
            SimError::InvalidTimestep { value } => {
                write!(f, "Invalid time increment {value}: must be finite and > 0")
            }

            // ---- Online learning ----
            SimError::WindowDepthMismatch { partition_index, streamer_index, expected, found } => {
                write!(
                    f,
                    "Partition {partition_index}: streamer {streamer_index} has history depth {found}, expected {expected}"
                )
            }

            // ---- Output ----
            SimError::Output { reason } => write!(f, "Objective output failed: {reason}"),

            // ---- Wrapped ----
            SimError::Param(err) => write!(f, "{err}"),
            SimError::Filter(err) => write!(f, "{err}"),
            SimError::Data(err) => write!(f, "{err}"),
            SimError::Optimisation(err) => write!(f, "{err}"),
        }
    }
}

impl From<ParamError> for SimError {
    fn from(err: ParamError) -> Self {
        SimError::Param(err)
    }
}

impl From<FilterError> for SimError {
    fn from(err: FilterError) -> Self {
        SimError::Filter(err)
    }
}

impl From<DataError> for SimError {
    fn from(err: DataError) -> Self {
        SimError::Data(err)
    }
}

impl From<OptError> for SimError {
    fn from(err: OptError) -> Self {
        SimError::Optimisation(Box::new(err))
    }
}
