//! Error types for grid filters.

use thiserror::Error;

/// Errors produced by the filter library.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("invalid argument: {name} = {value} ({reason})")]
    InvalidArgument {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("invalid grid layout: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl FilterError {
    pub(crate) fn invalid(
        name: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        FilterError::InvalidArgument {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn shape(expected: &[usize], actual: &[usize]) -> Self {
        FilterError::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}

/// Result alias for filter operations.
pub type Result<T> = std::result::Result<T, FilterError>;
