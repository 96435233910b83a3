//! Core domain types for the box-office corpus.
//!
//! This module defines the raw shape of a scraped movie row:
//! - `Field` names every column the pipeline knows about
//! - `RawMovieRecord` keeps each cell as text, exactly as it was read
//! - `CorpusEncoding` declares how the corpus file was encoded

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DataLoadError;

/// Delimiter used inside the multi-valued category/country cells.
pub const LABEL_DELIMITER: char = ',';

// =============================================================================
// Field
// =============================================================================

/// One column of a movie record.
///
/// The order of `Field::ALL` matches the scraper's CSV layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    Title,
    Category,
    Country,
    Year,
    Month,
    Day,
    Length,
    Rating,
    RatingCount,
    WishCount,
    CumulativeBox,
    FirstDayBox,
    FirstWeekBox,
}

impl Field {
    /// All fields in CSV order
    pub const ALL: [Field; 13] = [
        Field::Title,
        Field::Category,
        Field::Country,
        Field::Year,
        Field::Month,
        Field::Day,
        Field::Length,
        Field::Rating,
        Field::RatingCount,
        Field::WishCount,
        Field::CumulativeBox,
        Field::FirstDayBox,
        Field::FirstWeekBox,
    ];

    /// Canonical (English) name, also used as feature column name
    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Category => "category",
            Field::Country => "country",
            Field::Year => "year",
            Field::Month => "month",
            Field::Day => "day",
            Field::Length => "length",
            Field::Rating => "rating",
            Field::RatingCount => "rating_count",
            Field::WishCount => "wish_count",
            Field::CumulativeBox => "cumulative_box",
            Field::FirstDayBox => "first_day_box",
            Field::FirstWeekBox => "first_week_box",
        }
    }

    /// Header written by the box-office scraper
    pub fn scraper_header(self) -> &'static str {
        match self {
            Field::Title => "电影名称",
            Field::Category => "电影类型",
            Field::Country => "出品国家",
            Field::Year => "上映年份",
            Field::Month => "上映月份",
            Field::Day => "上映日期",
            Field::Length => "电影时长",
            Field::Rating => "电影评分",
            Field::RatingCount => "打分人数",
            Field::WishCount => "想看人数",
            Field::CumulativeBox => "累计票房",
            Field::FirstDayBox => "首日票房",
            Field::FirstWeekBox => "首周票房",
        }
    }

    /// Does a header cell refer to this field?
    pub fn matches_header(self, header: &str) -> bool {
        let header = header.trim();
        header == self.scraper_header() || header.eq_ignore_ascii_case(self.name())
    }

    /// Whether the field holds comma-joined labels rather than a scalar
    pub fn is_multi_valued(self) -> bool {
        matches!(self, Field::Category | Field::Country)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// RawMovieRecord
// =============================================================================

/// A movie row before any coercion.
///
/// Used both for training rows (read from CSV) and inference requests
/// (built from user input). `None` means the cell was absent or blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMovieRecord {
    pub title: Option<String>,
    pub category: Option<String>,
    pub country: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
    pub day: Option<String>,
    pub length: Option<String>,
    pub rating: Option<String>,
    pub rating_count: Option<String>,
    pub wish_count: Option<String>,
    /// Training target; ignored on inference
    pub cumulative_box: Option<String>,
    pub first_day_box: Option<String>,
    pub first_week_box: Option<String>,
}

impl RawMovieRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a cell by field
    pub fn get(&self, field: Field) -> Option<&str> {
        self.slot(field).as_deref()
    }

    /// Write a cell by field. Blank values are stored as `None`.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        *self.slot_mut(field) = if value.trim().is_empty() {
            None
        } else {
            Some(value)
        };
    }

    /// Builder-style `set`
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Split a multi-valued cell into trimmed, non-empty labels.
    ///
    /// A missing cell yields no labels. Order follows the cell text.
    pub fn labels(&self, field: Field) -> Vec<&str> {
        self.get(field).map(split_labels).unwrap_or_default()
    }

    fn slot(&self, field: Field) -> &Option<String> {
        match field {
            Field::Title => &self.title,
            Field::Category => &self.category,
            Field::Country => &self.country,
            Field::Year => &self.year,
            Field::Month => &self.month,
            Field::Day => &self.day,
            Field::Length => &self.length,
            Field::Rating => &self.rating,
            Field::RatingCount => &self.rating_count,
            Field::WishCount => &self.wish_count,
            Field::CumulativeBox => &self.cumulative_box,
            Field::FirstDayBox => &self.first_day_box,
            Field::FirstWeekBox => &self.first_week_box,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Title => &mut self.title,
            Field::Category => &mut self.category,
            Field::Country => &mut self.country,
            Field::Year => &mut self.year,
            Field::Month => &mut self.month,
            Field::Day => &mut self.day,
            Field::Length => &mut self.length,
            Field::Rating => &mut self.rating,
            Field::RatingCount => &mut self.rating_count,
            Field::WishCount => &mut self.wish_count,
            Field::CumulativeBox => &mut self.cumulative_box,
            Field::FirstDayBox => &mut self.first_day_box,
            Field::FirstWeekBox => &mut self.first_week_box,
        }
    }
}

/// Split a comma-joined label cell
///
/// Example: "爱情, 科幻,," -> ["爱情", "科幻"]
pub fn split_labels(text: &str) -> Vec<&str> {
    text.split(LABEL_DELIMITER)
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .collect()
}

// =============================================================================
// CorpusEncoding
// =============================================================================

/// Text encoding of a corpus file.
///
/// The scraper writes UTF-8, but corpora re-saved on Chinese Windows
/// machines come back as GBK, so the encoding has to be declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CorpusEncoding {
    #[default]
    #[serde(alias = "utf8")]
    Utf8,
    Gbk,
    #[serde(alias = "latin1")]
    Latin1,
}

impl CorpusEncoding {
    pub fn label(self) -> &'static str {
        match self {
            CorpusEncoding::Utf8 => "utf-8",
            CorpusEncoding::Gbk => "gbk",
            CorpusEncoding::Latin1 => "latin-1",
        }
    }
}

impl fmt::Display for CorpusEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CorpusEncoding {
    type Err = DataLoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(CorpusEncoding::Utf8),
            "gbk" | "gb2312" | "gb18030" => Ok(CorpusEncoding::Gbk),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(CorpusEncoding::Latin1),
            _ => Err(DataLoadError::UnknownEncoding(s.to_string())),
        }
    }
}
