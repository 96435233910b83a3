//! Error types for the data-loader crate.
//!
//! Every failure while turning a box-office CSV into raw records ends up as a
//! `DataLoadError`. Cell-level problems (a rating that isn't a number) are NOT
//! reported here: cells are kept as text and coerced later by the pipeline.

use thiserror::Error;

/// Errors that can occur while loading a training corpus
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The CSV reader rejected a row (unbalanced quotes, ragged row, ...)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The bytes are not valid in the declared encoding
    #[error("File is not valid {encoding}: found malformed byte sequence")]
    Decode { encoding: &'static str },

    /// A required column is absent from the header row
    #[error("Missing required column '{column}' (accepted headers: {accepted})")]
    MissingColumn { column: String, accepted: String },

    /// The corpus has no header row at all
    #[error("Corpus is empty: no header row found")]
    EmptyCorpus,

    /// An encoding name we don't know how to decode
    #[error("Unknown corpus encoding '{0}' (expected utf-8, gbk or latin-1)")]
    UnknownEncoding(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
