//! Feature column order.
//!
//! Layout of every feature vector:
//!
//! ```text
//! [title_length, year, month, day, length, rating, rating_count,
//!  wish_count, first_day_box, first_week_box]
//! ++ category:<label> for each category label, sorted
//! ++ country:<label>  for each country label, sorted
//! ```
//!
//! The schema is derived from the vocabulary and stored with the trained
//! model; the encoder writes columns in exactly this order.

use crate::vocabulary::Vocabulary;
use serde::{Deserialize, Serialize};

/// Names of the non-indicator columns, in order
pub const BASE_COLUMNS: [&str; 10] = [
    "title_length",
    "year",
    "month",
    "day",
    "length",
    "rating",
    "rating_count",
    "wish_count",
    "first_day_box",
    "first_week_box",
];

pub const CATEGORY_PREFIX: &str = "category:";
pub const COUNTRY_PREFIX: &str = "country:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    /// Column list implied by a vocabulary
    pub fn for_vocabulary(vocabulary: &Vocabulary) -> Self {
        let columns = BASE_COLUMNS
            .iter()
            .map(|name| name.to_string())
            .chain(
                vocabulary
                    .category_labels()
                    .iter()
                    .map(|label| format!("{CATEGORY_PREFIX}{label}")),
            )
            .chain(
                vocabulary
                    .country_labels()
                    .iter()
                    .map(|label| format!("{COUNTRY_PREFIX}{label}")),
            )
            .collect();
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}
