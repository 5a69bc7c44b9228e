/// Result alias for log querying.
pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Opening or reading a log file failed.
    Io {
        path: String,
        reason: String,
    },
    /// A filter value is not a number.
    InvalidNumber {
        value: String,
    },
    /// A filter names a field the log entry does not carry.
    UnknownField {
        name: String,
    },
}

impl std::error::Error for QueryError {}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::Io { path, reason } => write!(f, "Failed to read log '{path}': {reason}"),
            QueryError::InvalidNumber { value } => {
                write!(f, "Invalid filter value '{value}': expected a number")
            }
            QueryError::UnknownField { name } => {
                write!(f, "Field '{name}' is not available in the log entries")
            }
        }
    }
}
