//! Random forest regressor.
//!
//! ## Algorithm
//! 1. For tree `i`, seed an RNG with `random_state + i`
//! 2. Draw `n_samples` row indices with replacement (bootstrap sample)
//! 3. Fit a `DecisionTreeRegressor` on that sample
//! 4. Predict by averaging all trees
//!
//! Every tree owns its RNG, so trees fit in parallel on rayon and the
//! result does not depend on scheduling.

use crate::error::{ForestError, Result};
use crate::traits::{validate_training_set, Regressor};
use crate::tree::DecisionTreeRegressor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    trees: Vec<DecisionTreeRegressor>,
    n_estimators: usize,
    n_features: usize,
    max_depth: Option<usize>,
    min_samples_leaf: usize,
    random_state: Option<u64>,
}

impl RandomForestRegressor {
    /// Create an unfitted forest of `n_estimators` trees.
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            n_features: 0,
            max_depth: None,
            min_samples_leaf: 1,
            random_state: None,
        }
    }

    /// Limit the depth of every tree (default: unlimited)
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Minimum rows per leaf in every tree (default: 1)
    pub fn with_min_samples_leaf(mut self, min: usize) -> Self {
        self.min_samples_leaf = min.max(1);
        self
    }

    /// Seed the bootstrap sampling. Without a seed, one is drawn at fit time.
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn random_state(&self) -> Option<u64> {
        self.random_state
    }

    pub fn trees(&self) -> &[DecisionTreeRegressor] {
        &self.trees
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Mean of per-tree importances, normalised to sum to 1.
    pub fn feature_importances(&self) -> Result<Vec<f64>> {
        if self.trees.is_empty() {
            return Err(ForestError::NotFitted);
        }

        let mut total = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (acc, v) in total.iter_mut().zip(tree.feature_importances()?) {
                *acc += v;
            }
        }

        let sum: f64 = total.iter().sum();
        if sum > 0.0 {
            total.iter_mut().for_each(|v| *v /= sum);
        }
        Ok(total)
    }
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Regressor for RandomForestRegressor {
    fn name(&self) -> &str {
        "RandomForestRegressor"
    }

    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ForestError::InvalidParameter(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        let n_features = validate_training_set(x, y)?;
        let n_samples = x.len();
        let base_seed = self
            .random_state
            .unwrap_or_else(|| rand::rng().random::<u64>());
        let max_depth = self.max_depth;
        let min_samples_leaf = self.min_samples_leaf;

        let trees = (0..self.n_estimators)
            .into_par_iter()
            .map(|i| -> Result<DecisionTreeRegressor> {
                let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(i as u64));
                let bootstrap: Vec<usize> = (0..n_samples)
                    .map(|_| rng.random_range(0..n_samples))
                    .collect();

                let mut tree = DecisionTreeRegressor::new().with_min_samples_leaf(min_samples_leaf);
                if let Some(max_depth) = max_depth {
                    tree = tree.with_max_depth(max_depth);
                }
                tree.fit_indices(x, y, &bootstrap)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            n_estimators = self.n_estimators,
            n_samples, n_features, "Fitted random forest"
        );
        self.trees = trees;
        self.n_features = n_features;
        Ok(())
    }

    fn predict_one(&self, row: &[f64]) -> Result<f64> {
        if self.trees.is_empty() {
            return Err(ForestError::NotFitted);
        }
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.predict_one(row)?;
        }
        Ok(sum / self.trees.len() as f64)
    }
}
