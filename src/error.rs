//! Error types for the response evaluator.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, EvalError>;

/// Broad classification of an [`EvalError`], used by callers deciding whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Dataset could not be loaded. The previous dataset stays in place.
    Data,
    /// The action needs user input first (e.g. a selection).
    Validation,
    /// Navigation past the first or last item.
    Bounds,
    /// Persistence failed. In-memory results are kept so saving can be retried.
    Io,
    /// Bad configuration or bad input handed to the core.
    Config,
}

/// Errors that can occur while running an evaluation session.
#[derive(Error, Debug)]
pub enum EvalError {
    /// The dataset file does not exist.
    #[error("Dataset not found at '{0}'")]
    DatasetNotFound(PathBuf),

    /// A dataset line is not a valid `{input, output}` record.
    #[error("Malformed record at {path}:{line}: {message}")]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Commit attempted before any option was selected.
    #[error("No option selected for question {index}")]
    NoSelectionMade { index: usize },

    /// Retreat attempted on the first question.
    #[error("Already at the first question")]
    AtFirst,

    /// Advance attempted on the last question.
    #[error("Already at the last question ({index})")]
    AtLast { index: usize },

    /// Operation needs a loaded, non-empty dataset.
    #[error("No dataset loaded")]
    NoDataset,

    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One result artifact was written but the other was not.
    #[error("Results written to '{written}' but writing '{failed}' failed: {source}")]
    PartialWrite {
        written: PathBuf,
        failed: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A saved result log does not fit the dataset it is resumed against.
    #[error("Invalid results: {0}")]
    InvalidResults(String),

    /// Configuration file or value error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EvalError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::DatasetNotFound(_) | EvalError::MalformedRecord { .. } => ErrorKind::Data,
            EvalError::NoSelectionMade { .. } => ErrorKind::Validation,
            EvalError::AtFirst | EvalError::AtLast { .. } | EvalError::NoDataset => {
                ErrorKind::Bounds
            }
            EvalError::Io { .. } | EvalError::PartialWrite { .. } | EvalError::Serialization(_) => {
                ErrorKind::Io
            }
            EvalError::InvalidResults(_) | EvalError::Config(_) => ErrorKind::Config,
        }
    }
}

impl From<serde_json::Error> for EvalError {
    fn from(err: serde_json::Error) -> Self {
        EvalError::Serialization(err.to_string())
    }
}
