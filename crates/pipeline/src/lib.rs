//! Box-office prediction pipeline.
//!
//! This crate provides:
//! - Vocabulary extraction over the multi-valued category/country columns
//! - FeatureEncoder for turning one movie into a fixed-order numeric vector
//! - DatasetBuilder and seeded train/test splitting
//! - ModelSelector for sweeping random-forest ensemble sizes
//! - Predictor for validated single-movie inference
//!
//! ## Architecture
//! Training runs in stages:
//! 1. `Vocabulary::extract` collects every category and country label
//! 2. `DatasetBuilder` encodes each record against that vocabulary
//! 3. `Dataset::split` holds out a seeded test partition
//! 4. `ModelSelector` fits one forest per candidate size and keeps the best
//!
//! The output is a `TrainedPipeline`; inference reuses its vocabulary and
//! schema so requests are encoded exactly like training rows.
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{train_from_corpus, CancelToken, TrainingConfig};
//!
//! let config = TrainingConfig::default();
//! let pipeline = train_from_corpus("movies.csv", &config, &CancelToken::new())?;
//! let prediction = pipeline.predict(&request)?;
//! for warning in &prediction.warnings {
//!     eprintln!("{warning}");
//! }
//! ```

pub mod cancel;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod predictor;
pub mod record;
pub mod schema;
pub mod selector;
pub mod trained;
pub mod vocabulary;

// Re-export main types
pub use cancel::CancelToken;
pub use config::TrainingConfig;
pub use dataset::{Dataset, DatasetBuilder, Partition, Split};
pub use error::{
    EncodingError, InsufficientDataError, PipelineError, PredictError, Result, UnknownLabelWarning,
    ValidationError, Violation,
};
pub use features::{encode, Encoding, FeatureEncoder, FeatureVector};
pub use predictor::{validate, Prediction, Predictor, ValidationBounds};
pub use record::MovieRecord;
pub use schema::FeatureSchema;
pub use selector::{select_best, CandidateSizes, CurvePoint, ModelSelector, Selection};
pub use trained::{train, train_from_corpus, SelectionReport, TrainedPipeline, TrainingMetadata};
pub use vocabulary::Vocabulary;
