use crate::params::ParamError;

/// Result alias for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

#[derive(Debug, Clone, PartialEq)]
pub enum FilterError {
    // ---- Weights ----
    /// A kernel returned a negative weight; kernels must be non-negative measures.
    NegativeWeight {
        index: usize,
        weight: f64,
    },
    /// Every weight in the window was zero.
    ZeroWeightSum,
    /// Statistics need at least one past row besides the current one.
    EmptyWindow {
        depth: usize,
    },

    // ---- Shapes ----
    /// Vector or matrix dimensions disagree.
    DimensionMismatch {
        expected: usize,
        found: usize,
    },
    /// Partition index outside of the supplied histories or settings.
    PartitionOutOfRange {
        partition_index: usize,
        partitions: usize,
    },

    // ---- Distributions ----
    /// Covariance matrix is not positive definite.
    CovarianceNotPositiveDefinite,
    /// Mean/variance pair has no valid moment-matched parameters.
    InvalidMoments {
        family: &'static str,
        dim: usize,
        mean: f64,
        variance: f64,
    },
    /// A distribution constructor rejected its parameters.
    Distribution {
        family: &'static str,
        reason: String,
    },

    // ---- Params ----
    Param(ParamError),
}

impl std::error::Error for FilterError {}

impl std::fmt::Display for FilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Weights ----
            FilterError::NegativeWeight { index, weight } => {
                write!(f, "Negative kernel weight {weight} at history index {index}")
            }
            FilterError::ZeroWeightSum => write!(f, "Kernel weights sum to zero"),
            FilterError::EmptyWindow { depth } => {
                write!(f, "History depth {depth} leaves no past observations to weight")
            }

            // ---- Shapes ----
            FilterError::DimensionMismatch { expected, found } => {
                write!(f, "Dimension mismatch: expected {expected}, found {found}")
            }
            FilterError::PartitionOutOfRange { partition_index, partitions } => {
                write!(f, "Partition {partition_index} out of range for {partitions} partitions")
            }

            // ---- Distributions ----
            FilterError::CovarianceNotPositiveDefinite => {
                write!(f, "Covariance matrix is not positive definite")
            }
            FilterError::InvalidMoments { family, dim, mean, variance } => {
                write!(
                    f,
                    "No valid {family} parameters for dimension {dim}: mean {mean}, variance {variance}"
                )
            }
            FilterError::Distribution { family, reason } => {
                write!(f, "Invalid {family} distribution: {reason}")
            }

            // ---- Params ----
            FilterError::Param(err) => write!(f, "{err}"),
        }
    }
}

impl From<ParamError> for FilterError {
    fn from(err: ParamError) -> Self {
        FilterError::Param(err)
    }
}
