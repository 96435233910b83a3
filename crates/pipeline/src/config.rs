//! Training configuration.
//!
//! Every field has a default, so `{}` is a valid config file:
//!
//! ```json
//! {
//!   "seed": 123,
//!   "test_fraction": 0.3,
//!   "candidates": { "start": 1, "stop": 300, "step": 5 },
//!   "min_train_rows": 10,
//!   "max_depth": null,
//!   "encoding": "utf-8"
//! }
//! ```
//!
//! `candidates` may also be a plain list such as `[10, 50, 100]`.

use crate::error::{PipelineError, Result};
use crate::predictor::ValidationBounds;
use crate::selector::{CandidateSizes, DEFAULT_MIN_TRAIN_ROWS, DEFAULT_SEED};
use data_loader::CorpusEncoding;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::Path;

pub const DEFAULT_TEST_FRACTION: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Seed for the split and for every forest
    pub seed: u64,
    /// Share of rows held out for scoring, in (0, 1)
    pub test_fraction: f64,
    pub candidates: CandidateSizes,
    pub min_train_rows: usize,
    pub max_depth: Option<usize>,
    #[serde(serialize_with = "encoding_to_str", deserialize_with = "encoding_from_str")]
    pub encoding: CorpusEncoding,
    pub bounds: ValidationBounds,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            test_fraction: DEFAULT_TEST_FRACTION,
            candidates: CandidateSizes::default(),
            min_train_rows: DEFAULT_MIN_TRAIN_ROWS,
            max_depth: None,
            encoding: CorpusEncoding::default(),
            bounds: ValidationBounds::default(),
        }
    }
}

impl TrainingConfig {
    /// Read a JSON config; missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: TrainingConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_test_fraction(mut self, test_fraction: f64) -> Self {
        self.test_fraction = test_fraction;
        self
    }

    pub fn with_candidates(mut self, candidates: CandidateSizes) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_min_train_rows(mut self, min_train_rows: usize) -> Self {
        self.min_train_rows = min_train_rows;
        self
    }

    /// Reject settings no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "test_fraction must be between 0 and 1 (exclusive), got {}",
                self.test_fraction
            )));
        }
        if self.min_train_rows == 0 {
            return Err(PipelineError::InvalidConfig(
                "min_train_rows must be at least 1".to_string(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(PipelineError::InvalidConfig(
                "max_depth must be at least 1".to_string(),
            ));
        }
        self.candidates.sizes()?;
        Ok(())
    }
}

fn encoding_to_str<S: Serializer>(encoding: &CorpusEncoding, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(encoding.label())
}

fn encoding_from_str<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<CorpusEncoding, D::Error> {
    let label = String::deserialize(deserializer)?;
    label.parse().map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrainingConfig::default();
        assert_eq!(config.seed, 123);
        assert_eq!(config.test_fraction, 0.3);
        assert_eq!(config.min_train_rows, 10);
        assert_eq!(config.candidates.sizes().unwrap().len(), 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TrainingConfig =
            serde_json::from_str(r#"{"seed": 7, "candidates": [10, 50], "encoding": "gbk"}"#).unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.candidates, CandidateSizes::List(vec![10, 50]));
        assert_eq!(config.encoding, CorpusEncoding::Gbk);
        assert_eq!(config.test_fraction, 0.3);
        assert_eq!(config.bounds, ValidationBounds::default());
    }

    #[test]
    fn test_grid_candidates_from_json() {
        let config: TrainingConfig =
            serde_json::from_str(r#"{"candidates": {"start": 1, "stop": 20, "step": 5}}"#).unwrap();
        assert_eq!(config.candidates.sizes().unwrap(), vec![1, 6, 11, 16]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(TrainingConfig::default().with_test_fraction(1.0).validate().is_err());
        assert!(TrainingConfig::default().with_min_train_rows(0).validate().is_err());
        assert!(
            TrainingConfig::default()
                .with_candidates(CandidateSizes::List(vec![]))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_unknown_encoding_is_rejected() {
        let result: std::result::Result<TrainingConfig, _> = serde_json::from_str(r#"{"encoding": "ebcdic"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"test_fraction": 0.25}"#).unwrap();

        let config = TrainingConfig::from_json_file(&path).unwrap();
        assert_eq!(config.test_fraction, 0.25);

        std::fs::write(&path, r#"{"test_fraction": 2.0}"#).unwrap();
        assert!(matches!(
            TrainingConfig::from_json_file(&path),
            Err(PipelineError::InvalidConfig(_))
        ));
    }
}
