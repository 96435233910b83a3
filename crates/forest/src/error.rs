//! Error types for fitting and querying regression models.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForestError {
    #[error("Cannot fit a model on zero samples")]
    EmptyInput,

    #[error("Feature matrix has {rows} rows but target has {targets} values")]
    LengthMismatch { rows: usize, targets: usize },

    #[error("Row {row} has {found} features, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Model has not been fitted yet")]
    NotFitted,

    #[error("Model was fitted on {expected} features but input has {found}")]
    FeatureCountMismatch { expected: usize, found: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, ForestError>;
