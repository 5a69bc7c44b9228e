/// Result alias for stream ingestion.
pub type DataResult<T> = Result<T, DataError>;

#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    /// Reading the source failed.
    Io {
        path: String,
        reason: String,
    },
    /// No usable rows survived ingestion.
    EmptyStream,
    /// At least one state column is required.
    NoStateColumns,
    /// Times and states must pair up one to one.
    LengthMismatch {
        times: usize,
        states: usize,
    },
    /// Rows must all have the same state width.
    RaggedStates {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// Times must strictly increase.
    NonIncreasingTime {
        row: usize,
        time: f64,
    },
}

impl std::error::Error for DataError {}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::Io { path, reason } => write!(f, "Failed to read '{path}': {reason}"),
            DataError::EmptyStream => write!(f, "Stream contains no usable rows"),
            DataError::NoStateColumns => write!(f, "At least one state column is required"),
            DataError::LengthMismatch { times, states } => {
                write!(f, "Stream has {times} times but {states} states")
            }
            DataError::RaggedStates { row, expected, found } => {
                write!(f, "Row {row} has width {found}, expected {expected}")
            }
            DataError::NonIncreasingTime { row, time } => {
                write!(f, "Row {row} time {time} does not increase on the previous row")
            }
        }
    }
}
