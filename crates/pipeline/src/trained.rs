//! Training entry point and the trained artifact.
//!
//! ## Algorithm
//! 1. Extract the vocabulary from the training records
//! 2. Encode every record into the design matrix
//! 3. Split rows into train/test with the configured seed
//! 4. Sweep candidate ensemble sizes and keep the best model
//!
//! The result is one immutable `TrainedPipeline` bundling the vocabulary,
//! the column schema and the model, so encoder and model can't be paired
//! with the wrong counterpart.

use crate::cancel::CancelToken;
use crate::config::TrainingConfig;
use crate::dataset::DatasetBuilder;
use crate::error::{PipelineError, PredictError, Result};
use crate::features::FeatureEncoder;
use crate::predictor::{predict_with, Prediction, ValidationBounds};
use crate::schema::FeatureSchema;
use crate::selector::{CurvePoint, ModelSelector};
use crate::vocabulary::Vocabulary;
use data_loader::{parse_corpus, RawMovieRecord};
use forest::RandomForestRegressor;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Diagnostics from model selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionReport {
    pub n_estimators: usize,
    /// One point per finished candidate, ascending by ensemble size
    pub curve: Vec<CurvePoint>,
    /// Aligned to the schema columns
    pub feature_importances: Vec<f64>,
    /// R² of the selected model on the test partition
    pub test_r2: f64,
    /// True if the sweep was cancelled and selection used a partial curve
    pub partial: bool,
}

/// How the pipeline was trained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    pub seed: u64,
    pub test_fraction: f64,
    pub total_rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub candidates: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedPipeline {
    vocabulary: Vocabulary,
    schema: FeatureSchema,
    model: RandomForestRegressor,
    bounds: ValidationBounds,
    report: SelectionReport,
    metadata: TrainingMetadata,
}

/// Train a pipeline on parsed records.
///
/// # Errors
/// - `InvalidConfig` for a config `TrainingConfig::validate` rejects
/// - `Row` naming the first record that can't be encoded
/// - `InsufficientData` for a corpus too small to split and fit
/// - `Cancelled` if the token tripped before any candidate finished
pub fn train(records: &[RawMovieRecord], config: &TrainingConfig, cancel: &CancelToken) -> Result<TrainedPipeline> {
    config.validate()?;
    let start = Instant::now();

    let vocabulary = Vocabulary::extract(records);
    let dataset = DatasetBuilder::new(FeatureEncoder::new(&vocabulary)).build(records)?;
    let split = dataset.split(config.test_fraction, config.seed)?;

    let selector = ModelSelector::new(&config.candidates)?
        .with_seed(config.seed)
        .with_min_train_rows(config.min_train_rows)
        .with_max_depth(config.max_depth);
    let selection = selector.select(&split, cancel)?;
    let test_r2 = 1.0 - selection.test_error;

    info!(
        rows = dataset.len(),
        n_estimators = selection.n_estimators,
        test_r2,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Training complete"
    );

    Ok(TrainedPipeline {
        metadata: TrainingMetadata {
            seed: config.seed,
            test_fraction: config.test_fraction,
            total_rows: dataset.len(),
            train_rows: split.train.len(),
            test_rows: split.test.len(),
            candidates: selector.candidates().to_vec(),
        },
        report: SelectionReport {
            n_estimators: selection.n_estimators,
            curve: selection.curve,
            feature_importances: selection.feature_importances,
            test_r2,
            partial: selection.cancelled,
        },
        schema: dataset.schema,
        model: selection.model,
        bounds: config.bounds.clone(),
        vocabulary,
    })
}

/// Load a corpus file and train on it.
pub fn train_from_corpus(
    path: impl AsRef<Path>,
    config: &TrainingConfig,
    cancel: &CancelToken,
) -> Result<TrainedPipeline> {
    let records = parse_corpus(path.as_ref(), config.encoding)?;
    train(&records, config, cancel)
}

impl TrainedPipeline {
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn model(&self) -> &RandomForestRegressor {
        &self.model
    }

    pub fn bounds(&self) -> &ValidationBounds {
        &self.bounds
    }

    pub fn report(&self) -> &SelectionReport {
        &self.report
    }

    pub fn metadata(&self) -> &TrainingMetadata {
        &self.metadata
    }

    /// Predict with the bounds this pipeline was trained with
    pub fn predict(&self, raw: &RawMovieRecord) -> std::result::Result<Prediction, PredictError> {
        predict_with(self, &self.bounds, raw)
    }

    /// The `k` most important columns, highest first.
    pub fn top_importances(&self, k: usize) -> Vec<(&str, f64)> {
        let mut pairs: Vec<(&str, f64)> = self
            .schema
            .columns()
            .iter()
            .map(String::as_str)
            .zip(self.report.feature_importances.iter().copied())
            .collect();
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        pairs.truncate(k);
        pairs
    }

    /// Write the pipeline as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer(writer, self)?;
        info!(path = %path.as_ref().display(), "Saved trained pipeline");
        Ok(())
    }

    /// Read a pipeline written by `save`.
    ///
    /// # Errors
    /// `SchemaMismatch` if the stored schema doesn't match the stored
    /// vocabulary or the model width.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let pipeline: TrainedPipeline = serde_json::from_reader(reader)?;
        pipeline.check_consistency()?;
        info!(
            path = %path.as_ref().display(),
            columns = pipeline.schema.width(),
            "Loaded trained pipeline"
        );
        Ok(pipeline)
    }

    fn check_consistency(&self) -> Result<()> {
        let expected = FeatureSchema::for_vocabulary(&self.vocabulary);
        if expected != self.schema {
            return Err(PipelineError::SchemaMismatch {
                expected: expected.width(),
                found: self.schema.width(),
            });
        }
        if self.model.n_features() != self.schema.width() {
            return Err(PipelineError::SchemaMismatch {
                expected: self.schema.width(),
                found: self.model.n_features(),
            });
        }
        Ok(())
    }
}
