//! Error types for the box-office pipeline.
//!
//! - `EncodingError`: a required scalar is missing or not a number
//! - `ValidationError`: an inference request is out of bounds (all violations at once)
//! - `InsufficientDataError`: a partition is too small to fit or score on
//! - `UnknownLabelWarning`: not an error; a label the vocabulary has never seen
//!
//! `PipelineError` covers a training run, `PredictError` a single prediction.

use data_loader::{DataLoadError, Field};
use forest::ForestError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A scalar field could not be turned into a number
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodingError {
    #[error("Missing required field '{field}'")]
    MissingField { field: Field },

    #[error("Field '{field}' is not a number: '{value}'")]
    NotNumeric { field: Field, value: String },

    #[error("Field '{field}' is not a whole number: '{value}'")]
    NotInteger { field: Field, value: String },
}

impl EncodingError {
    pub fn field(&self) -> Field {
        match self {
            EncodingError::MissingField { field }
            | EncodingError::NotNumeric { field, .. }
            | EncodingError::NotInteger { field, .. } => *field,
        }
    }
}

/// One violated bound on an inference request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub field: Field,
    /// Human-readable bound, e.g. "1 ..= 12"
    pub constraint: String,
    pub value: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {} (expected {})", self.field, self.value, self.constraint)
    }
}

/// Every bound an inference request violated
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Request failed validation: {}", format_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A train or test partition is too small
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Insufficient data: {partition} partition has {rows} rows, need at least {minimum}")]
pub struct InsufficientDataError {
    pub partition: &'static str,
    pub rows: usize,
    pub minimum: usize,
}

/// A category/country label absent from the frozen vocabulary.
///
/// The label is encoded as "no match" in every indicator column; this
/// value lets callers see that it happened.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnknownLabelWarning {
    pub field: Field,
    pub label: String,
}

impl fmt::Display for UnknownLabelWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} label '{}' ignored", self.field, self.label)
    }
}

/// Errors that end a training run. Nothing is published when one occurs.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to load corpus: {0}")]
    Load(#[from] DataLoadError),

    #[error("Row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: EncodingError,
    },

    #[error(transparent)]
    InsufficientData(#[from] InsufficientDataError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Training was cancelled before any candidate finished")]
    Cancelled,

    #[error("None of the {candidates} finished candidates produced a finite test error")]
    NoUsableCandidate { candidates: usize },

    #[error("Model error: {0}")]
    Model(#[from] ForestError),

    #[error("Schema has {found} columns but vocabulary implies {expected}")]
    SchemaMismatch { expected: usize, found: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Errors from a single prediction
#[derive(Error, Debug)]
pub enum PredictError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Encoded request has {found} columns, model expects {expected}")]
    SchemaMismatch { expected: usize, found: usize },

    #[error("Model error: {0}")]
    Model(#[from] ForestError),
}

/// Convenience type alias for training Results
pub type Result<T> = std::result::Result<T, PipelineError>;
