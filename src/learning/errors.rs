use crate::{optimization::OptError, params::ParamError, simulator::SimError};

/// Result alias for learner coordination.
pub type LearningResult<T> = Result<T, LearningError>;

#[derive(Debug, Clone, PartialEq)]
pub enum LearningError {
    // ---- Coordination ----
    /// A learner's worker hung up before reporting its objective.
    LearnerDisconnected {
        learner_index: usize,
    },
    /// A learner's worker panicked mid-round.
    LearnerPanicked {
        learner_index: usize,
    },
    /// The optimiser needs at least one learner.
    NoLearners,
    /// Histories must retain at least one round.
    InvalidHistoryDepth {
        depth: usize,
    },
    /// The meta-algorithm returned a parameter set for the wrong number of
    /// partitions.
    ParamCountMismatch {
        learner_index: usize,
        expected: usize,
        found: usize,
    },

    // ---- Meta-algorithm ----
    /// Perturbation scales must be finite and positive.
    InvalidStepSize {
        step: f64,
        reason: &'static str,
    },

    // ---- Wrapped ----
    Param(ParamError),
    Simulation(SimError),
    Optimisation(OptError),
}

impl std::error::Error for LearningError {}

impl std::fmt::Display for LearningError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Coordination ----
            LearningError::LearnerDisconnected { learner_index } => {
                write!(f, "Learner {learner_index} disconnected before reporting")
            }
            LearningError::LearnerPanicked { learner_index } => {
                write!(f, "Learner {learner_index} panicked during its round")
            }
            LearningError::NoLearners => write!(f, "At least one learner is required"),
            LearningError::InvalidHistoryDepth { depth } => {
                write!(f, "Invalid history depth {depth}: must be at least 1")
            }
            LearningError::ParamCountMismatch { learner_index, expected, found } => {
                write!(
                    f,
                    "Learner {learner_index} received {found} parameter sets, expected {expected}"
                )
            }

            // ---- Meta-algorithm ----
            LearningError::InvalidStepSize { step, reason } => {
                write!(f, "Invalid step size {step}: {reason}")
            }

            // ---- Wrapped ----
            LearningError::Param(err) => write!(f, "{err}"),
            LearningError::Simulation(err) => write!(f, "{err}"),
            LearningError::Optimisation(err) => write!(f, "{err}"),
        }
    }
}

impl From<ParamError> for LearningError {
    fn from(err: ParamError) -> Self {
        LearningError::Param(err)
    }
}

impl From<SimError> for LearningError {
    fn from(err: SimError) -> Self {
        LearningError::Simulation(err)
    }
}

impl From<OptError> for LearningError {
    fn from(err: OptError) -> Self {
        LearningError::Optimisation(err)
    }
}
