//! Core trait shared by every regression model in this crate.

use crate::error::{ForestError, Result};
use crate::metrics::r_squared;

/// A supervised regressor over dense `f64` rows.
///
/// ## Design Note
/// - `Send + Sync` so fitted models can be shared across threads behind an `Arc`
/// - Rows are `&[Vec<f64>]`; every row must have the same width
pub trait Regressor: Send + Sync {
    /// Returns the name of this model (for logging/debugging)
    fn name(&self) -> &str;

    /// Fit the model on `x` (n_samples × n_features) and targets `y`.
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()>;

    /// Predict one row.
    fn predict_one(&self, row: &[f64]) -> Result<f64>;

    /// Predict every row of `x`.
    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        x.iter().map(|row| self.predict_one(row)).collect()
    }

    /// R² of the model's predictions against `y`.
    fn score(&self, x: &[Vec<f64>], y: &[f64]) -> Result<f64> {
        if x.len() != y.len() {
            return Err(ForestError::LengthMismatch {
                rows: x.len(),
                targets: y.len(),
            });
        }
        let predictions = self.predict(x)?;
        Ok(r_squared(y, &predictions))
    }
}

/// Check that `x` and `y` describe a non-empty rectangular training set.
///
/// Returns the number of features.
pub(crate) fn validate_training_set(x: &[Vec<f64>], y: &[f64]) -> Result<usize> {
    if x.is_empty() {
        return Err(ForestError::EmptyInput);
    }
    if x.len() != y.len() {
        return Err(ForestError::LengthMismatch {
            rows: x.len(),
            targets: y.len(),
        });
    }

    let n_features = x[0].len();
    if let Some((row, found)) = x
        .iter()
        .map(Vec::len)
        .enumerate()
        .find(|&(_, len)| len != n_features)
    {
        return Err(ForestError::RaggedRows {
            row,
            expected: n_features,
            found,
        });
    }
    Ok(n_features)
}
