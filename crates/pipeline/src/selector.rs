//! Ensemble-size model selection.
//!
//! ## Algorithm
//! 1. For each candidate ensemble size (ascending), fit a random forest on
//!    the training partition with the configured seed
//! 2. Record `1 - R²` on the training and test partitions
//! 3. Pick the candidate with the lowest test error; the smallest ensemble
//!    wins ties
//! 4. Refit the winner (same seed, so the same model) and report its
//!    feature importances
//!
//! Candidates are independent and run in parallel on rayon. Only the
//! error curve is kept while sweeping, not every fitted forest.

use crate::cancel::CancelToken;
use crate::dataset::{Partition, Split};
use crate::error::{InsufficientDataError, PipelineError, Result};
use forest::{RandomForestRegressor, Regressor};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Smallest training partition the selector will fit on
pub const DEFAULT_MIN_TRAIN_ROWS: usize = 10;

/// Default seed for both the split and the forests
pub const DEFAULT_SEED: u64 = 123;

/// Which ensemble sizes to try
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CandidateSizes {
    /// `start, start + step, ...` while `< stop`
    Grid { start: usize, stop: usize, step: usize },
    /// Explicit sizes
    List(Vec<usize>),
}

impl Default for CandidateSizes {
    fn default() -> Self {
        // 1, 6, 11, ..., 296
        CandidateSizes::Grid {
            start: 1,
            stop: 300,
            step: 5,
        }
    }
}

impl CandidateSizes {
    /// Expand to a sorted, de-duplicated list of positive sizes.
    pub fn sizes(&self) -> Result<Vec<usize>> {
        let mut sizes = match self {
            CandidateSizes::Grid { step: 0, .. } => {
                return Err(PipelineError::InvalidConfig(
                    "candidate grid step must be positive".to_string(),
                ));
            }
            CandidateSizes::Grid { start, stop, step } => (*start..*stop).step_by(*step).collect(),
            CandidateSizes::List(list) => list.clone(),
        };
        sizes.sort_unstable();
        sizes.dedup();

        if sizes.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "no candidate ensemble sizes to try".to_string(),
            ));
        }
        if sizes[0] == 0 {
            return Err(PipelineError::InvalidConfig(
                "ensemble size 0 is not a valid candidate".to_string(),
            ));
        }
        Ok(sizes)
    }
}

/// Errors of one candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub n_estimators: usize,
    /// `1 - R²` on the training partition
    pub train_error: f64,
    /// `1 - R²` on the test partition
    pub test_error: f64,
}

/// Outcome of a sweep
#[derive(Debug, Clone)]
pub struct Selection {
    pub n_estimators: usize,
    pub test_error: f64,
    pub model: RandomForestRegressor,
    /// Every finished candidate, ascending by ensemble size
    pub curve: Vec<CurvePoint>,
    /// One weight per feature column, aligned to the schema
    pub feature_importances: Vec<f64>,
    /// True when the sweep was cut short
    pub cancelled: bool,
}

/// Lowest test error; ties go to the smaller ensemble.
///
/// NaN errors never win.
pub fn select_best(curve: &[CurvePoint]) -> Option<&CurvePoint> {
    curve
        .iter()
        .filter(|point| !point.test_error.is_nan())
        .min_by(|a, b| {
            a.test_error
                .total_cmp(&b.test_error)
                .then(a.n_estimators.cmp(&b.n_estimators))
        })
}

/// `select_best`, or the reason there is no winner
fn pick_winner(curve: &[CurvePoint], cancelled: bool) -> Result<CurvePoint> {
    match select_best(curve) {
        Some(best) => Ok(*best),
        None if curve.is_empty() && cancelled => Err(PipelineError::Cancelled),
        None => Err(PipelineError::NoUsableCandidate {
            candidates: curve.len(),
        }),
    }
}

#[derive(Debug, Clone)]
pub struct ModelSelector {
    candidates: Vec<usize>,
    seed: u64,
    min_train_rows: usize,
    max_depth: Option<usize>,
}

impl ModelSelector {
    /// Create a selector over the given candidate sizes.
    pub fn new(candidates: &CandidateSizes) -> Result<Self> {
        Ok(Self {
            candidates: candidates.sizes()?,
            seed: DEFAULT_SEED,
            min_train_rows: DEFAULT_MIN_TRAIN_ROWS,
            max_depth: None,
        })
    }

    /// Seed for every candidate forest (default: 123)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Minimum training rows (default: 10)
    pub fn with_min_train_rows(mut self, min: usize) -> Self {
        self.min_train_rows = min.max(1);
        self
    }

    /// Depth limit for every tree (default: unlimited)
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn candidates(&self) -> &[usize] {
        &self.candidates
    }

    /// Sweep every candidate and pick the best.
    ///
    /// # Errors
    /// - `InsufficientData` if the training partition is below the minimum
    ///   or the test partition is empty
    /// - `Cancelled` if the token tripped before any candidate finished
    /// - `NoUsableCandidate` if every finished candidate scored NaN
    pub fn select(&self, split: &Split, cancel: &CancelToken) -> Result<Selection> {
        self.check_partitions(split)?;
        info!(
            candidates = self.candidates.len(),
            train_rows = split.train.len(),
            test_rows = split.test.len(),
            "Starting ensemble-size sweep"
        );

        let finished = self
            .candidates
            .par_iter()
            .map(|&n_estimators| -> Result<Option<CurvePoint>> {
                if cancel.should_stop() {
                    return Ok(None);
                }
                self.score_candidate(n_estimators, split).map(Some)
            })
            .collect::<Result<Vec<_>>>()?;
        let curve: Vec<CurvePoint> = finished.into_iter().flatten().collect();

        let cancelled = curve.len() < self.candidates.len();
        if cancelled {
            warn!(
                finished = curve.len(),
                total = self.candidates.len(),
                "Sweep cancelled; selecting among finished candidates"
            );
        }

        let best = pick_winner(&curve, cancelled)?;
        let model = self.fit_candidate(best.n_estimators, &split.train)?;
        let feature_importances = model.feature_importances()?;

        info!(
            n_estimators = best.n_estimators,
            test_error = best.test_error,
            "Selected ensemble size"
        );
        Ok(Selection {
            n_estimators: best.n_estimators,
            test_error: best.test_error,
            model,
            curve,
            feature_importances,
            cancelled,
        })
    }

    fn check_partitions(&self, split: &Split) -> Result<()> {
        if split.train.len() < self.min_train_rows {
            return Err(InsufficientDataError {
                partition: "train",
                rows: split.train.len(),
                minimum: self.min_train_rows,
            }
            .into());
        }
        if split.test.is_empty() {
            return Err(InsufficientDataError {
                partition: "test",
                rows: 0,
                minimum: 1,
            }
            .into());
        }
        Ok(())
    }

    fn fit_candidate(&self, n_estimators: usize, train: &Partition) -> Result<RandomForestRegressor> {
        let mut model = RandomForestRegressor::new(n_estimators).with_random_state(self.seed);
        if let Some(max_depth) = self.max_depth {
            model = model.with_max_depth(max_depth);
        }
        model.fit(&train.x, &train.y)?;
        Ok(model)
    }

    fn score_candidate(&self, n_estimators: usize, split: &Split) -> Result<CurvePoint> {
        let model = self.fit_candidate(n_estimators, &split.train)?;
        let point = CurvePoint {
            n_estimators,
            train_error: 1.0 - model.score(&split.train.x, &split.train.y)?,
            test_error: 1.0 - model.score(&split.test.x, &split.test.y)?,
        };
        debug!(
            n_estimators,
            train_error = point.train_error,
            test_error = point.test_error,
            "Scored candidate"
        );
        Ok(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(n_estimators: usize, test_error: f64) -> CurvePoint {
        CurvePoint {
            n_estimators,
            train_error: 0.0,
            test_error,
        }
    }

    fn partition(rows: std::ops::Range<usize>) -> Partition {
        Partition {
            indices: rows.clone().collect(),
            x: rows.clone().map(|i| vec![i as f64, (i % 4) as f64]).collect(),
            y: rows.map(|i| 3.0 * i as f64 + 2.0).collect(),
        }
    }

    fn split(train_rows: usize, test_rows: usize) -> Split {
        Split {
            train: partition(0..train_rows),
            test: partition(train_rows..train_rows + test_rows),
        }
    }

    #[test]
    fn test_tie_goes_to_smaller_ensemble() {
        let curve = vec![point(5, 0.2), point(10, 0.2), point(15, 0.3)];
        assert_eq!(select_best(&curve).unwrap().n_estimators, 5);

        let unordered = vec![point(10, 0.2), point(5, 0.2)];
        assert_eq!(select_best(&unordered).unwrap().n_estimators, 5);
    }

    #[test]
    fn test_select_best_ignores_nan() {
        let curve = vec![point(1, f64::NAN), point(6, 0.9)];
        assert_eq!(select_best(&curve).unwrap().n_estimators, 6);
        assert!(select_best(&[]).is_none());
    }

    #[test]
    fn test_candidate_grid() {
        let sizes = CandidateSizes::default().sizes().unwrap();
        assert_eq!(sizes.len(), 60);
        assert_eq!(&sizes[..3], &[1, 6, 11]);
        assert_eq!(*sizes.last().unwrap(), 296);

        let list = CandidateSizes::List(vec![10, 5, 10]).sizes().unwrap();
        assert_eq!(list, vec![5, 10]);

        assert!(CandidateSizes::List(vec![]).sizes().is_err());
        assert!(CandidateSizes::List(vec![0, 3]).sizes().is_err());
        assert!(CandidateSizes::Grid { start: 1, stop: 10, step: 0 }.sizes().is_err());
    }

    #[test]
    fn test_insufficient_training_rows() {
        let selector = ModelSelector::new(&CandidateSizes::List(vec![1, 2])).unwrap();
        let err = selector.select(&split(3, 2), &CancelToken::new()).unwrap_err();

        match err {
            PipelineError::InsufficientData(e) => {
                assert_eq!(e.partition, "train");
                assert_eq!(e.rows, 3);
                assert_eq!(e.minimum, 10);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_test_partition() {
        let selector = ModelSelector::new(&CandidateSizes::List(vec![1])).unwrap();
        let err = selector.select(&split(12, 0), &CancelToken::new()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InsufficientData(InsufficientDataError { partition: "test", .. })
        ));
    }

    #[test]
    fn test_sweep_produces_full_curve() {
        let selector = ModelSelector::new(&CandidateSizes::List(vec![1, 3, 5]))
            .unwrap()
            .with_seed(123);
        let selection = selector.select(&split(14, 4), &CancelToken::new()).unwrap();

        let sizes: Vec<usize> = selection.curve.iter().map(|p| p.n_estimators).collect();
        assert_eq!(sizes, vec![1, 3, 5]);
        assert_eq!(selection.model.n_estimators(), selection.n_estimators);
        assert_eq!(selection.feature_importances.len(), 2);
        assert!(!selection.cancelled);
        assert_eq!(
            select_best(&selection.curve).unwrap().n_estimators,
            selection.n_estimators
        );
    }

    #[test]
    fn test_sweep_is_reproducible() {
        let selector = ModelSelector::new(&CandidateSizes::List(vec![1, 2, 4, 8])).unwrap();
        let a = selector.select(&split(12, 4), &CancelToken::new()).unwrap();
        let b = selector.select(&split(12, 4), &CancelToken::new()).unwrap();

        assert_eq!(a.n_estimators, b.n_estimators);
        assert_eq!(a.curve, b.curve);
        assert_eq!(a.model, b.model);
    }

    #[test]
    fn test_cancelled_before_start() {
        let selector = ModelSelector::new(&CandidateSizes::List(vec![1, 2])).unwrap();
        let token = CancelToken::new();
        token.cancel();

        let err = selector.select(&split(12, 4), &token).unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled));
    }

    #[test]
    fn test_partial_sweep_keeps_best_finished() {
        let selector = ModelSelector::new(&CandidateSizes::List(vec![1, 2, 4, 8])).unwrap();
        let token = CancelToken::with_budget(2);

        let selection = selector.select(&split(12, 4), &token).unwrap();

        assert!(selection.cancelled);
        assert!(token.is_cancelled());
        assert_eq!(selection.curve.len(), 2);
        assert_eq!(
            select_best(&selection.curve).unwrap().n_estimators,
            selection.n_estimators
        );
        assert_eq!(selection.model.n_estimators(), selection.n_estimators);
    }

    #[test]
    fn test_all_nan_curve_is_not_reported_as_cancelled() {
        let curve = vec![point(1, f64::NAN), point(6, f64::NAN)];
        assert!(matches!(
            pick_winner(&curve, false),
            Err(PipelineError::NoUsableCandidate { candidates: 2 })
        ));
        assert!(matches!(pick_winner(&[], true), Err(PipelineError::Cancelled)));
        assert_eq!(pick_winner(&[point(6, 0.5)], true).unwrap().n_estimators, 6);
    }
}
