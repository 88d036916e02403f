use thiserror::Error;

/// Error types for the cefrag library.
#[derive(Error, Debug)]
pub enum CefragError {
    /// The requested ladder family is not one of the known size standards.
    #[error("'{0}' is not a valid ladder")]
    LadderNotFound(String),

    /// A peak-shape model that is not implemented was requested.
    #[error("{0} is not implemented! Options: [gauss, voigt, lorentzian]")]
    NotImplemented(String),

    /// The custom peak table does not have exactly the required columns.
    #[error("Wrong columns in custom peak table: found {found:?}, expected {expected:?}")]
    WrongColumns {
        found: Vec<String>,
        expected: Vec<String>,
    },

    /// A custom peak table cell could not be interpreted.
    #[error("Invalid custom peak table: {0}")]
    InvalidCustomPeaks(String),

    /// Two custom peak windows share at least one basepair position.
    #[error("Overlapping intervals in custom peak table, starting at value: {start}")]
    OverlappingInterval { start: i64 },

    /// The ladder graph search produced no candidate of the required length.
    #[error("No ladder combination found: {0}")]
    NoCombination(String),

    /// The calibration never became injective within the allowed attempts.
    #[error("There is a problem with the fitting of the model to the ladder: {0}")]
    ModelFitting(String),

    /// An assay index past the number of assays was requested.
    #[error("The sample only contains {count} assays, got index {index}. Indexing starts at 0.")]
    AssayIndexOutOfRange { index: usize, count: usize },

    /// Error indicating a mismatch in matrix or vector dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error indicating the optimizer failed to converge.
    #[error("Algorithm failed to converge: {0}")]
    ConvergenceFailure(String),

    /// Linear algebra error.
    #[error("Linear algebra error: {0}")]
    LinearAlgebraError(String),

    /// Error for parameter-related problems.
    #[error("Parameter error: {0}")]
    ParameterError(String),

    /// Error for boundary constraint violations.
    #[error("Bounds error: {0}")]
    BoundsError(String),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CefragError {
    /// Whether the error means the sample data itself could not be analysed,
    /// as opposed to a configuration or usage mistake.
    pub fn is_data_quality(&self) -> bool {
        matches!(
            self,
            CefragError::NoCombination(_)
                | CefragError::ModelFitting(_)
                | CefragError::OverlappingInterval { .. }
        )
    }
}

impl From<crate::parameters::BoundsError> for CefragError {
    fn from(err: crate::parameters::BoundsError) -> Self {
        CefragError::BoundsError(format!("{}", err))
    }
}

impl From<crate::parameters::ParameterError> for CefragError {
    fn from(err: crate::parameters::ParameterError) -> Self {
        CefragError::ParameterError(format!("{}", err))
    }
}

/// Result type alias for cefrag operations.
pub type Result<T> = std::result::Result<T, CefragError>;
