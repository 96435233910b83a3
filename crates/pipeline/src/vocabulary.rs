//! Vocabulary extraction.
//!
//! The vocabulary is the set of category labels and country labels seen in
//! the training corpus. It is built once per training run and then frozen:
//! every encoding, at training and at inference time, reads the same value.
//!
//! Labels live in `BTreeSet`s, so iteration order is the canonical
//! (lexicographic) order that indicator columns follow.

use data_loader::{Field, RawMovieRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    category_labels: BTreeSet<String>,
    country_labels: BTreeSet<String>,
}

impl Vocabulary {
    /// Union every category and country label across the corpus.
    ///
    /// Rows with empty or missing label cells contribute nothing.
    pub fn extract(records: &[RawMovieRecord]) -> Self {
        let mut vocabulary = Self::default();
        for record in records {
            vocabulary
                .category_labels
                .extend(record.labels(Field::Category).into_iter().map(str::to_string));
            vocabulary
                .country_labels
                .extend(record.labels(Field::Country).into_iter().map(str::to_string));
        }

        tracing::info!(
            categories = vocabulary.category_labels.len(),
            countries = vocabulary.country_labels.len(),
            "Extracted vocabulary from {} rows",
            records.len()
        );
        vocabulary
    }

    /// Build a vocabulary from explicit label lists
    pub fn from_labels<C, K>(categories: C, countries: K) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        K: IntoIterator,
        K::Item: Into<String>,
    {
        Self {
            category_labels: categories.into_iter().map(Into::into).collect(),
            country_labels: countries.into_iter().map(Into::into).collect(),
        }
    }

    /// Category labels in canonical order
    pub fn category_labels(&self) -> &BTreeSet<String> {
        &self.category_labels
    }

    /// Country labels in canonical order
    pub fn country_labels(&self) -> &BTreeSet<String> {
        &self.country_labels
    }

    /// Total number of indicator columns this vocabulary produces
    pub fn indicator_count(&self) -> usize {
        self.category_labels.len() + self.country_labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicator_count() == 0
    }
}
