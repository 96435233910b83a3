//! Feature encoding for box-office regression.
//!
//! This module turns one movie record into the fixed-order numeric vector
//! described in [`crate::schema`]. Training rows and inference requests go
//! through the same `encode_record`, so the two can't drift apart.

use crate::error::{EncodingError, UnknownLabelWarning};
use crate::record::MovieRecord;
use crate::schema::BASE_COLUMNS;
use crate::vocabulary::Vocabulary;
use data_loader::{Field, RawMovieRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// Numeric encoding of one movie, columns ordered per `FeatureSchema`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }

    /// The category indicator block
    pub fn category_indicators(&self, vocabulary: &Vocabulary) -> &[f64] {
        let start = BASE_COLUMNS.len();
        &self.0[start..start + vocabulary.category_labels().len()]
    }

    /// The country indicator block
    pub fn country_indicators(&self, vocabulary: &Vocabulary) -> &[f64] {
        let start = BASE_COLUMNS.len() + vocabulary.category_labels().len();
        &self.0[start..start + vocabulary.country_labels().len()]
    }
}

/// Result of encoding one record
#[derive(Debug, Clone, PartialEq)]
pub struct Encoding {
    pub vector: FeatureVector,
    /// Labels the vocabulary didn't know; empty for in-vocabulary records
    pub warnings: Vec<UnknownLabelWarning>,
}

/// Encodes records against a frozen vocabulary.
///
/// Holds nothing but a borrow of the vocabulary, so encoding is pure and
/// the encoder is cheap to create wherever one is needed.
#[derive(Debug, Clone, Copy)]
pub struct FeatureEncoder<'a> {
    vocabulary: &'a Vocabulary,
}

impl<'a> FeatureEncoder<'a> {
    pub fn new(vocabulary: &'a Vocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &'a Vocabulary {
        self.vocabulary
    }

    /// Width of every vector this encoder produces
    pub fn width(&self) -> usize {
        BASE_COLUMNS.len() + self.vocabulary.indicator_count()
    }

    /// Coerce and encode a raw record.
    ///
    /// # Errors
    /// `EncodingError` when a required scalar is missing or not numeric.
    pub fn encode(&self, raw: &RawMovieRecord) -> Result<Encoding, EncodingError> {
        let record = MovieRecord::from_raw(raw)?;
        Ok(self.encode_record(&record))
    }

    /// Encode an already-coerced record. Never fails.
    pub fn encode_record(&self, record: &MovieRecord) -> Encoding {
        let mut values = Vec::with_capacity(self.width());

        // Base columns, same order as BASE_COLUMNS
        values.push(record.title_length() as f64);
        values.push(record.year as f64);
        values.push(record.month as f64);
        values.push(record.day as f64);
        values.push(record.length);
        values.push(record.rating);
        values.push(record.rating_count);
        values.push(record.wish_count);
        values.push(record.first_day_box);
        values.push(record.first_week_box);

        push_indicators(&mut values, self.vocabulary.category_labels(), &record.categories);
        push_indicators(&mut values, self.vocabulary.country_labels(), &record.countries);

        let mut warnings = unknown_labels(Field::Category, self.vocabulary.category_labels(), &record.categories);
        warnings.extend(unknown_labels(
            Field::Country,
            self.vocabulary.country_labels(),
            &record.countries,
        ));
        for warning in &warnings {
            warn!(title = %record.title, "{}", warning);
        }

        debug_assert_eq!(values.len(), self.width());
        Encoding {
            vector: FeatureVector(values),
            warnings,
        }
    }
}

/// Encode a raw record with a vocabulary in one call
pub fn encode(raw: &RawMovieRecord, vocabulary: &Vocabulary) -> Result<Encoding, EncodingError> {
    FeatureEncoder::new(vocabulary).encode(raw)
}

/// One 1/0 column per vocabulary label, in vocabulary order
fn push_indicators(values: &mut Vec<f64>, vocabulary: &BTreeSet<String>, labels: &BTreeSet<String>) {
    values.extend(
        vocabulary
            .iter()
            .map(|label| if labels.contains(label) { 1.0 } else { 0.0 }),
    );
}

fn unknown_labels(
    field: Field,
    vocabulary: &BTreeSet<String>,
    labels: &BTreeSet<String>,
) -> Vec<UnknownLabelWarning> {
    labels
        .difference(vocabulary)
        .map(|label| UnknownLabelWarning {
            field,
            label: label.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::clannad;
    use crate::schema::FeatureSchema;

    fn sample_vocabulary() -> Vocabulary {
        Vocabulary::from_labels(["爱情", "科幻"], ["中国", "美国"])
    }

    #[test]
    fn test_encode_is_deterministic() {
        let vocabulary = sample_vocabulary();
        let raw = clannad().with(Field::Category, "科幻,爱情");

        assert_eq!(encode(&raw, &vocabulary).unwrap(), encode(&raw, &vocabulary).unwrap());
    }

    #[test]
    fn test_base_columns() {
        let vocabulary = sample_vocabulary();
        let encoding = encode(&clannad(), &vocabulary).unwrap();

        assert_eq!(
            &encoding.vector.as_slice()[..10],
            &[7.0, 2007.0, 9.0, 15.0, 120.0, 9.9, 1234567.0, 1234567.0, 11111111.0, 22222222.0]
        );
    }

    #[test]
    fn test_indicators_follow_sorted_vocabulary() {
        let vocabulary = sample_vocabulary();
        let raw = clannad()
            .with(Field::Category, "科幻,爱情")
            .with(Field::Country, "中国");
        let encoding = encode(&raw, &vocabulary).unwrap();

        assert_eq!(encoding.vector.category_indicators(&vocabulary), &[1.0, 1.0]);
        assert_eq!(encoding.vector.country_indicators(&vocabulary), &[1.0, 0.0]);
        assert!(encoding.warnings.is_empty());
    }

    #[test]
    fn test_unknown_label_adds_no_column_and_warns() {
        let vocabulary = sample_vocabulary();
        let raw = clannad().with(Field::Category, "爱情").with(Field::Country, "日本");
        let encoding = encode(&raw, &vocabulary).unwrap();

        assert_eq!(encoding.vector.len(), 14);
        assert_eq!(encoding.vector.country_indicators(&vocabulary), &[0.0, 0.0]);
        assert_eq!(
            encoding.warnings,
            vec![UnknownLabelWarning {
                field: Field::Country,
                label: "日本".to_string()
            }]
        );
    }

    #[test]
    fn test_width_is_independent_of_token_count() {
        let vocabulary = sample_vocabulary();
        let expected = 10 + 2 + 2;
        let schema = FeatureSchema::for_vocabulary(&vocabulary);

        for (category, country) in [("", ""), ("爱情", "中国"), ("爱情,科幻,动作,喜剧", "中国,美国,日本,法国")] {
            let raw = clannad().with(Field::Category, category).with(Field::Country, country);
            let encoding = encode(&raw, &vocabulary).unwrap();
            assert_eq!(encoding.vector.len(), expected);
            assert_eq!(encoding.vector.len(), schema.width());
        }
    }

    #[test]
    fn test_encoding_error_is_surfaced() {
        let raw = clannad().with(Field::Rating, "eleven");
        let err = encode(&raw, &sample_vocabulary()).unwrap_err();
        assert_eq!(err.field(), Field::Rating);
    }

    #[test]
    fn test_csv_row_and_request_encode_identically() {
        let vocabulary = Vocabulary::from_labels(["爱情"], ["日本"]);
        let text = "电影名称,电影类型,出品国家,上映年份,上映月份,上映日期,电影时长,电影评分,打分人数,想看人数,累计票房,首日票房,首周票房\n\
                    \x20Clannad ,爱情,日本,2007,9,15,120,9.9,1234567,1234567,,11111111,22222222\n";
        let rows = data_loader::parse_corpus_str(text).unwrap();
        let request = clannad()
            .with(Field::Title, " Clannad ")
            .with(Field::Category, "爱情")
            .with(Field::Country, "日本");

        let from_csv = encode(&rows[0], &vocabulary).unwrap();
        let from_request = encode(&request, &vocabulary).unwrap();
        assert_eq!(from_csv.vector.as_slice()[0], 7.0);
        assert_eq!(from_csv.vector, from_request.vector);
    }
}
