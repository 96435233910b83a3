//! # Forest Crate
//!
//! Regression models used by the box-office pipeline.
//!
//! ## Components
//!
//! ### DecisionTreeRegressor
//! CART tree splitting on the largest reduction in squared error.
//!
//! ### RandomForestRegressor
//! Bagged ensemble of regression trees:
//! - every tree is fitted on a bootstrap sample of the training rows
//! - every tree gets its own seeded RNG (`random_state + tree_index`)
//! - predictions are the mean over trees
//! - impurity-based feature importances are normalised to sum to 1
//!
//! ## Example Usage
//!
//! ```ignore
//! use forest::{RandomForestRegressor, Regressor};
//!
//! let mut rf = RandomForestRegressor::new(50).with_random_state(123);
//! rf.fit(&x_train, &y_train)?;
//! let r2 = rf.score(&x_test, &y_test)?;
//! let importances = rf.feature_importances()?;
//! ```

pub mod error;
pub mod metrics;
pub mod random_forest;
pub mod traits;
pub mod tree;

pub use error::{ForestError, Result};
pub use metrics::r_squared;
pub use random_forest::RandomForestRegressor;
pub use traits::Regressor;
pub use tree::{DecisionTreeRegressor, TreeNode};
