//! # Data Loader Crate
//!
//! This crate loads the box-office training corpus produced by the scraper.
//!
//! ## Main Components
//!
//! - **types**: Raw record, field names and corpus encodings
//! - **parser**: Decode and parse the CSV into `RawMovieRecord`s
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{parse_corpus, CorpusEncoding, Field};
//! use std::path::Path;
//!
//! let records = parse_corpus(Path::new("data/sample_corpus.csv"), CorpusEncoding::Utf8)?;
//! println!("{} rows, first title: {:?}", records.len(), records[0].get(Field::Title));
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use parser::{parse_corpus, parse_corpus_bytes, parse_corpus_str};
pub use types::{split_labels, CorpusEncoding, Field, RawMovieRecord, LABEL_DELIMITER};

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;

    #[test]
    fn test_record_set_and_get() {
        let record = RawMovieRecord::new()
            .with(Field::Title, "Clannad")
            .with(Field::Rating, "9.9")
            .with(Field::Country, "   ");

        assert_eq!(record.get(Field::Title), Some("Clannad"));
        assert_eq!(record.get(Field::Rating), Some("9.9"));
        // Blank input is stored as missing
        assert_eq!(record.get(Field::Country), None);
        assert_eq!(record.get(Field::Year), None);
    }

    #[test]
    fn test_split_labels() {
        assert_eq!(split_labels("爱情,校园"), vec!["爱情", "校园"]);
        assert_eq!(split_labels(" 爱情 ,, 校园,"), vec!["爱情", "校园"]);
        assert!(split_labels("").is_empty());
        assert!(split_labels(",").is_empty());
    }

    #[test]
    fn test_field_headers() {
        assert!(Field::Title.matches_header("电影名称"));
        assert!(Field::RatingCount.matches_header("Rating_Count"));
        assert!(!Field::Year.matches_header("上映月份"));
        assert!(Field::Category.is_multi_valued());
        assert!(!Field::Rating.is_multi_valued());
    }

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("UTF-8".parse::<CorpusEncoding>().unwrap(), CorpusEncoding::Utf8);
        assert_eq!("gbk".parse::<CorpusEncoding>().unwrap(), CorpusEncoding::Gbk);
        assert_eq!("latin1".parse::<CorpusEncoding>().unwrap(), CorpusEncoding::Latin1);
        assert!(matches!(
            "ebcdic".parse::<CorpusEncoding>(),
            Err(DataLoadError::UnknownEncoding(_))
        ));
    }

    #[test]
    fn test_parse_corpus_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "title,category,country,year,month,day,length,rating,rating_count,wish_count,cumulative_box,first_day_box,first_week_box"
        )
        .unwrap();
        writeln!(file, "你好，李焕英,\"喜剧,剧情\",中国大陆,2021,2,12,128,9.4,1500000,280000,541300,29300,253600").unwrap();

        let records = parse_corpus(file.path(), CorpusEncoding::Utf8).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].labels(Field::Category), vec!["喜剧", "剧情"]);
    }

    #[test]
    fn test_missing_file() {
        let err = parse_corpus(Path::new("does/not/exist.csv"), CorpusEncoding::Utf8).unwrap_err();
        assert!(matches!(err, DataLoadError::FileNotFound { .. }));
    }
}
