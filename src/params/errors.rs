/// Result alias for named-parameter operations.
pub type ParamResult<T> = Result<T, ParamError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ParamError {
    // ---- Lookup ----
    /// A float parameter was requested that the partition does not define.
    MissingFloatParam {
        name: String,
    },
    /// An int parameter was requested that the partition does not define.
    MissingIntParam {
        name: String,
    },
    /// A parameter exists but holds no values.
    EmptyParam {
        name: String,
    },

    // ---- Masks ----
    /// Mask length must match the parameter's value length.
    MaskShapeMismatch {
        name: String,
        values: usize,
        mask: usize,
    },
    /// A mask was supplied for a name with no values.
    MaskWithoutValues {
        name: String,
    },

    // ---- Mapping ----
    /// Flat optimizer vector does not match the masked layout.
    ThetaLengthMismatch {
        expected: usize,
        actual: usize,
    },
    /// Number of partitions differs from the mapping's layout.
    PartitionCountMismatch {
        expected: usize,
        actual: usize,
    },
}

impl std::error::Error for ParamError {}

impl std::fmt::Display for ParamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Lookup ----
            ParamError::MissingFloatParam { name } => {
                write!(f, "Missing float parameter '{name}'")
            }
            ParamError::MissingIntParam { name } => {
                write!(f, "Missing int parameter '{name}'")
            }
            ParamError::EmptyParam { name } => {
                write!(f, "Parameter '{name}' holds no values")
            }

            // ---- Masks ----
            ParamError::MaskShapeMismatch { name, values, mask } => {
                write!(f, "Mask for '{name}' has length {mask}, expected {values}")
            }
            ParamError::MaskWithoutValues { name } => {
                write!(f, "Mask given for '{name}' which has no values")
            }

            // ---- Mapping ----
            ParamError::ThetaLengthMismatch { expected, actual } => {
                write!(f, "Theta length mismatch: expected {expected}, actual {actual}")
            }
            ParamError::PartitionCountMismatch { expected, actual } => {
                write!(f, "Partition count mismatch: expected {expected}, actual {actual}")
            }
        }
    }
}
