//! Inference on a single movie.
//!
//! ## Algorithm
//! 1. Coerce the request's scalar fields (`EncodingError` on failure)
//! 2. Check every bound, collecting all violations into one `ValidationError`
//! 3. Encode with the frozen vocabulary and check the width against the schema
//! 4. Predict with the trained forest
//!
//! The cumulative box office cell of a request, if any, is never read.
//!
//! ## Example Usage
//! ```ignore
//! let predictor = Predictor::new(Arc::new(TrainedPipeline::load("model.json")?));
//! let prediction = predictor.predict(&request)?;
//! println!("{:.0}", prediction.value);
//! ```

use crate::error::{PredictError, UnknownLabelWarning, ValidationError, Violation};
use crate::features::FeatureEncoder;
use crate::record::MovieRecord;
use crate::trained::TrainedPipeline;
use data_loader::{Field, RawMovieRecord};
use forest::Regressor;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::debug;

/// Accepted ranges for an inference request.
///
/// Length, counts and box office figures must also be non-negative; that
/// bound is fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationBounds {
    pub year: RangeInclusive<i64>,
    pub month: RangeInclusive<i64>,
    pub day: RangeInclusive<i64>,
    pub rating: RangeInclusive<f64>,
}

impl Default for ValidationBounds {
    fn default() -> Self {
        Self {
            year: 1900..=2100,
            month: 1..=12,
            day: 1..=31,
            rating: 0.0..=10.0,
        }
    }
}

/// Predicted cumulative box office plus any unknown-label warnings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub value: f64,
    pub warnings: Vec<UnknownLabelWarning>,
}

/// Check every bound and report all violations at once.
pub fn validate(record: &MovieRecord, bounds: &ValidationBounds) -> Result<(), ValidationError> {
    let mut violations = Vec::new();

    check_range(&mut violations, Field::Year, record.year, &bounds.year);
    check_range(&mut violations, Field::Month, record.month, &bounds.month);
    check_range(&mut violations, Field::Day, record.day, &bounds.day);
    check_range(&mut violations, Field::Rating, record.rating, &bounds.rating);

    for (field, value) in [
        (Field::Length, record.length),
        (Field::RatingCount, record.rating_count),
        (Field::WishCount, record.wish_count),
        (Field::FirstDayBox, record.first_day_box),
        (Field::FirstWeekBox, record.first_week_box),
    ] {
        if value < 0.0 {
            violations.push(Violation {
                field,
                constraint: ">= 0".to_string(),
                value: value.to_string(),
            });
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { violations })
    }
}

fn check_range<T>(violations: &mut Vec<Violation>, field: Field, value: T, range: &RangeInclusive<T>)
where
    T: PartialOrd + Display,
{
    if !range.contains(&value) {
        violations.push(Violation {
            field,
            constraint: format!("{} ..= {}", range.start(), range.end()),
            value: value.to_string(),
        });
    }
}

/// Shared handle for serving predictions from a trained pipeline
#[derive(Debug, Clone)]
pub struct Predictor {
    pipeline: Arc<TrainedPipeline>,
    bounds: ValidationBounds,
}

impl Predictor {
    /// Use the bounds the pipeline was trained with.
    pub fn new(pipeline: Arc<TrainedPipeline>) -> Self {
        let bounds = pipeline.bounds().clone();
        Self { pipeline, bounds }
    }

    pub fn with_bounds(mut self, bounds: ValidationBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn pipeline(&self) -> &Arc<TrainedPipeline> {
        &self.pipeline
    }

    /// Predict cumulative box office for one movie.
    ///
    /// # Errors
    /// - `Encoding` if a scalar is missing or not numeric
    /// - `Validation` listing every out-of-range field
    /// - `SchemaMismatch` if the encoded width disagrees with the model
    pub fn predict(&self, raw: &RawMovieRecord) -> Result<Prediction, PredictError> {
        predict_with(&self.pipeline, &self.bounds, raw)
    }
}

pub(crate) fn predict_with(
    pipeline: &TrainedPipeline,
    bounds: &ValidationBounds,
    raw: &RawMovieRecord,
) -> Result<Prediction, PredictError> {
    let record = MovieRecord::from_raw(raw)?;
    validate(&record, bounds)?;

    let encoding = FeatureEncoder::new(pipeline.vocabulary()).encode_record(&record);
    let expected = pipeline.schema().width();
    if encoding.vector.len() != expected {
        return Err(PredictError::SchemaMismatch {
            expected,
            found: encoding.vector.len(),
        });
    }

    let value = pipeline.model().predict_one(encoding.vector.as_slice())?;
    debug!(title = %record.title, value, "Predicted box office");

    Ok(Prediction {
        value,
        warnings: encoding.warnings,
    })
}
