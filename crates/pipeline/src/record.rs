//! Typed movie record.
//!
//! `MovieRecord::from_raw` is the single place where text cells become
//! numbers, so training rows and inference requests are coerced the same way.

use crate::error::EncodingError;
use data_loader::{Field, RawMovieRecord};
use std::collections::BTreeSet;

/// A movie row with every scalar coerced.
///
/// The regression target is not part of this type: it is read separately
/// for training rows and ignored on inference requests.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieRecord {
    pub title: String,
    pub categories: BTreeSet<String>,
    pub countries: BTreeSet<String>,
    pub year: i64,
    pub month: i64,
    pub day: i64,
    /// Minutes
    pub length: f64,
    /// 0-10
    pub rating: f64,
    pub rating_count: f64,
    pub wish_count: f64,
    pub first_day_box: f64,
    pub first_week_box: f64,
}

impl MovieRecord {
    /// Coerce a raw record.
    ///
    /// Fails on the first missing or non-numeric scalar. Missing
    /// category/country cells are fine and yield empty label sets.
    pub fn from_raw(raw: &RawMovieRecord) -> Result<Self, EncodingError> {
        let title = raw
            .get(Field::Title)
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .ok_or(EncodingError::MissingField { field: Field::Title })?
            .to_string();

        Ok(Self {
            title,
            categories: label_set(raw, Field::Category),
            countries: label_set(raw, Field::Country),
            year: parse_integer(raw, Field::Year)?,
            month: parse_integer(raw, Field::Month)?,
            day: parse_integer(raw, Field::Day)?,
            length: parse_number(raw, Field::Length)?,
            rating: parse_number(raw, Field::Rating)?,
            rating_count: parse_number(raw, Field::RatingCount)?,
            wish_count: parse_number(raw, Field::WishCount)?,
            first_day_box: parse_number(raw, Field::FirstDayBox)?,
            first_week_box: parse_number(raw, Field::FirstWeekBox)?,
        })
    }

    /// Number of characters in the title (Unicode scalar values, not bytes)
    pub fn title_length(&self) -> usize {
        self.title.chars().count()
    }
}

fn label_set(raw: &RawMovieRecord, field: Field) -> BTreeSet<String> {
    raw.labels(field).into_iter().map(str::to_string).collect()
}

/// Parse a required finite float.
pub(crate) fn parse_number(raw: &RawMovieRecord, field: Field) -> Result<f64, EncodingError> {
    let text = raw.get(field).ok_or(EncodingError::MissingField { field })?;
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| EncodingError::NotNumeric {
            field,
            value: text.to_string(),
        })
}

/// Parse a required whole number; "2007" and "2007.0" are both accepted.
fn parse_integer(raw: &RawMovieRecord, field: Field) -> Result<i64, EncodingError> {
    let text = raw.get(field).ok_or(EncodingError::MissingField { field })?;
    if let Ok(v) = text.trim().parse::<i64>() {
        return Ok(v);
    }

    let v = parse_number(raw, field)?;
    if v.fract() != 0.0 || v.abs() > i64::MAX as f64 {
        return Err(EncodingError::NotInteger {
            field,
            value: text.to_string(),
        });
    }
    Ok(v as i64)
}
