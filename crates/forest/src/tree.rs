//! CART regression tree.
//!
//! ## Algorithm
//! At each node, every feature is scanned in sorted order and the split
//! that most reduces the sum of squared errors (SSE) is chosen. Thresholds
//! sit halfway between consecutive distinct values; rows with
//! `value <= threshold` go left. Leaves predict the mean target.
//!
//! Trees are fitted on a list of row indices rather than a copied matrix,
//! so a bootstrap sample (with repeated indices) costs nothing extra.

use crate::error::{ForestError, Result};
use crate::traits::{validate_training_set, Regressor};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        /// SSE removed by this split, used for feature importances
        impurity_decrease: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict(&self, row: &[f64]) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn accumulate_importances(&self, importances: &mut [f64]) {
        if let TreeNode::Split {
            feature,
            impurity_decrease,
            left,
            right,
            ..
        } = self
        {
            importances[*feature] += impurity_decrease;
            left.accumulate_importances(importances);
            right.accumulate_importances(importances);
        }
    }
}

/// Decision tree regressor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    root: Option<TreeNode>,
    n_features: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
}

impl DecisionTreeRegressor {
    /// Create an unfitted tree with no depth limit.
    pub fn new() -> Self {
        Self {
            root: None,
            n_features: 0,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }

    /// Limit tree depth (default: unlimited)
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Minimum rows a node needs before it may split (default: 2)
    pub fn with_min_samples_split(mut self, min: usize) -> Self {
        self.min_samples_split = min.max(2);
        self
    }

    /// Minimum rows on each side of a split (default: 1)
    pub fn with_min_samples_leaf(mut self, min: usize) -> Self {
        self.min_samples_leaf = min.max(1);
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.root.is_some()
    }

    /// Depth of the fitted tree (a lone leaf is depth 0)
    pub fn depth(&self) -> Option<usize> {
        self.root.as_ref().map(TreeNode::depth)
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    /// Fit on the rows named by `indices`. Indices may repeat.
    pub(crate) fn fit_indices(&mut self, x: &[Vec<f64>], y: &[f64], indices: &[usize]) -> Result<()> {
        let n_features = validate_training_set(x, y)?;
        if indices.is_empty() {
            return Err(ForestError::EmptyInput);
        }

        let mut indices = indices.to_vec();
        let builder = TreeBuilder {
            x,
            y,
            n_features,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
        };
        self.root = Some(builder.build(&mut indices, 0));
        self.n_features = n_features;
        Ok(())
    }

    /// Per-feature SSE reduction, normalised to sum to 1.
    ///
    /// All zeros when the tree never split.
    pub fn feature_importances(&self) -> Result<Vec<f64>> {
        let root = self.root.as_ref().ok_or(ForestError::NotFitted)?;
        let mut importances = vec![0.0; self.n_features];
        root.accumulate_importances(&mut importances);

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }
        Ok(importances)
    }
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Regressor for DecisionTreeRegressor {
    fn name(&self) -> &str {
        "DecisionTreeRegressor"
    }

    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()> {
        let indices: Vec<usize> = (0..x.len()).collect();
        self.fit_indices(x, y, &indices)
    }

    fn predict_one(&self, row: &[f64]) -> Result<f64> {
        let root = self.root.as_ref().ok_or(ForestError::NotFitted)?;
        if row.len() != self.n_features {
            return Err(ForestError::FeatureCountMismatch {
                expected: self.n_features,
                found: row.len(),
            });
        }
        Ok(root.predict(row))
    }
}

// =============================================================================
// Tree construction
// =============================================================================

struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [f64],
    n_features: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl TreeBuilder<'_> {
    fn build(&self, indices: &mut [usize], depth: usize) -> TreeNode {
        let n = indices.len();
        let mean = indices.iter().map(|&i| self.y[i]).sum::<f64>() / n as f64;
        let sse: f64 = indices.iter().map(|&i| (self.y[i] - mean).powi(2)).sum();

        let leaf = TreeNode::Leaf {
            value: mean,
            n_samples: n,
        };
        if n < self.min_samples_split
            || self.max_depth.is_some_and(|max| depth >= max)
            || sse <= 0.0
        {
            return leaf;
        }

        let Some(best) = self.find_best_split(indices, mean, sse) else {
            return leaf;
        };

        // Partition in place: left rows first
        let mut boundary = 0;
        for k in 0..n {
            if self.x[indices[k]][best.feature] <= best.threshold {
                indices.swap(k, boundary);
                boundary += 1;
            }
        }
        let (left, right) = indices.split_at_mut(boundary);

        TreeNode::Split {
            feature: best.feature,
            threshold: best.threshold,
            impurity_decrease: best.gain,
            left: Box::new(self.build(left, depth + 1)),
            right: Box::new(self.build(right, depth + 1)),
        }
    }

    /// Best split over all features; first feature wins ties.
    fn find_best_split(&self, indices: &[usize], mean: f64, sse: f64) -> Option<BestSplit> {
        let n = indices.len();
        let mut best: Option<BestSplit> = None;
        let mut order = indices.to_vec();

        for feature in 0..self.n_features {
            order.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));

            // Work on deviations from the node mean to keep sums small
            let total: f64 = order.iter().map(|&i| self.y[i] - mean).sum();
            let total_sq = sse;
            let mut left_sum = 0.0;
            let mut left_sq = 0.0;

            for k in 0..n - 1 {
                let d = self.y[order[k]] - mean;
                left_sum += d;
                left_sq += d * d;

                let here = self.x[order[k]][feature];
                let next = self.x[order[k + 1]][feature];
                if here == next {
                    continue;
                }

                let n_left = k + 1;
                let n_right = n - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let right_sum = total - left_sum;
                let right_sq = total_sq - left_sq;
                let sse_left = left_sq - left_sum * left_sum / n_left as f64;
                let sse_right = right_sq - right_sum * right_sum / n_right as f64;
                let gain = sse - (sse_left + sse_right);

                if gain > best.as_ref().map_or(0.0, |b| b.gain) {
                    best = Some(BestSplit {
                        feature,
                        threshold: midpoint(here, next),
                        gain,
                    });
                }
            }
        }

        best
    }
}

/// Threshold between two distinct sorted values.
///
/// Must satisfy `here <= t < next` so the partition matches the scored
/// split; for adjacent floats the midpoint can round up to `next`.
fn midpoint(here: f64, next: f64) -> f64 {
    let mid = here + (next - here) / 2.0;
    if mid < next { mid } else { here }
}
