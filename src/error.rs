//! Error types for the composable-matrix library.

use thiserror::Error;

/// Main error type for the library.
///
/// Only programming errors (bad indices, bad shapes, unknown names) and
/// configuration problems surface here. Numerically degenerate input never
/// produces an error.
#[derive(Error, Debug)]
pub enum MatrixError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index {index} out of bounds for {axis} of length {len}")]
    IndexOutOfBounds {
        axis: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Missing annotation '{0}'")]
    MissingAnnotation(String),

    #[error("Duplicate annotation '{0}'")]
    DuplicateAnnotation(String),

    #[error("Unknown group member '{member}' in group '{group}'")]
    UnknownGroup { group: String, member: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

impl MatrixError {
    /// Row index out of bounds.
    pub fn row_out_of_bounds(index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds {
            axis: "rows",
            index,
            len,
        }
    }

    /// Column index out of bounds.
    pub fn col_out_of_bounds(index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds {
            axis: "columns",
            index,
            len,
        }
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, MatrixError>;
