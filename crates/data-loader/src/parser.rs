//! Parser for box-office corpus files.
//!
//! The scraper produces one CSV with a header row:
//! 电影名称,电影类型,出品国家,上映年份,上映月份,上映日期,电影时长,电影评分,
//! 打分人数,想看人数,累计票房,首日票房,首周票房[,票房预测]
//!
//! Columns are located by header name (Chinese or English), so column order
//! and trailing extra columns don't matter. Cells stay as text; numeric
//! coercion is the feature encoder's job.

use crate::error::{DataLoadError, Result};
use crate::types::{CorpusEncoding, Field, RawMovieRecord};
use std::borrow::Cow;
use std::fs;
use std::path::Path;

/// Read and parse a corpus file in the declared encoding
pub fn parse_corpus(path: &Path, encoding: CorpusEncoding) -> Result<Vec<RawMovieRecord>> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })?;

    let records = parse_corpus_bytes(&bytes, encoding)?;
    tracing::info!(
        path = %path.display(),
        %encoding,
        rows = records.len(),
        "Parsed box-office corpus"
    );
    Ok(records)
}

/// Parse an in-memory corpus
pub fn parse_corpus_bytes(bytes: &[u8], encoding: CorpusEncoding) -> Result<Vec<RawMovieRecord>> {
    let decoded = decode(bytes, encoding)?;
    let text: &str = &decoded;
    parse_corpus_str(text.strip_prefix('\u{feff}').unwrap_or(text))
}

/// Parse already-decoded CSV text
pub fn parse_corpus_str(text: &str) -> Result<Vec<RawMovieRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(DataLoadError::EmptyCorpus);
    }
    let columns = locate_columns(&headers)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue; // Skip blank lines
        }

        let mut record = RawMovieRecord::new();
        for &(field, idx) in &columns {
            if let Some(cell) = row.get(idx) {
                record.set(field, cell.trim());
            }
        }
        records.push(record);
    }

    Ok(records)
}

/// Map every known field to its column index in the header row
fn locate_columns(headers: &csv::StringRecord) -> Result<Vec<(Field, usize)>> {
    Field::ALL
        .iter()
        .map(|&field| {
            headers
                .iter()
                .position(|header| field.matches_header(header))
                .map(|idx| (field, idx))
                .ok_or_else(|| DataLoadError::MissingColumn {
                    column: field.name().to_string(),
                    accepted: format!("{} / {}", field.scraper_header(), field.name()),
                })
        })
        .collect()
}

/// Decode raw bytes into a string
///
/// Malformed input is an error: replacing bad bytes with U+FFFD would
/// silently invent new category labels.
fn decode(bytes: &[u8], encoding: CorpusEncoding) -> Result<Cow<'_, str>> {
    let decoded = match encoding {
        CorpusEncoding::Utf8 => {
            encoding_rs::UTF_8.decode_without_bom_handling_and_without_replacement(bytes)
        }
        CorpusEncoding::Gbk => {
            encoding_rs::GBK.decode_without_bom_handling_and_without_replacement(bytes)
        }
        // ISO-8859-1 maps every byte directly to the same Unicode code point
        CorpusEncoding::Latin1 => Some(Cow::Owned(bytes.iter().map(|&b| b as char).collect())),
    };

    decoded.ok_or(DataLoadError::Decode {
        encoding: encoding.label(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "电影名称,电影类型,出品国家,上映年份,上映月份,上映日期,电影时长,电影评分,打分人数,想看人数,累计票房,首日票房,首周票房";

    #[test]
    fn test_parse_scraper_headers() {
        let text = format!(
            "{HEADER}\n长津湖,\"战争,历史\",中国大陆,2021,9,30,176,9.5,1840000,310000,577500,20610,188350\n"
        );
        let records = parse_corpus_str(&text).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get(Field::Title), Some("长津湖"));
        assert_eq!(records[0].labels(Field::Category), vec!["战争", "历史"]);
        assert_eq!(records[0].get(Field::CumulativeBox), Some("577500"));
    }

    #[test]
    fn test_parse_english_headers_in_any_order_with_extra_column() {
        let text = "rating,title,category,country,year,month,day,length,rating_count,wish_count,cumulative_box,first_day_box,first_week_box,票房预测\n\
                    8.1,Clannad,爱情,日本,2007,9,15,120,100,200,3000,10,20,0\n";
        let records = parse_corpus_str(text).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get(Field::Rating), Some("8.1"));
        assert_eq!(records[0].get(Field::Title), Some("Clannad"));
    }

    #[test]
    fn test_missing_column_is_rejected() {
        let text = "title,category\nA,B\n";
        let err = parse_corpus_str(text).unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumn { ref column, .. } if column == "country"));
    }

    #[test]
    fn test_blank_cells_become_none_and_blank_lines_skip() {
        let text = format!("{HEADER}\nX,,,2020,1,1,90,7.0,1,1,1,1,1\n,,,,,,,,,,,,\n");
        let records = parse_corpus_str(&text).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get(Field::Category), None);
        assert!(records[0].labels(Field::Country).is_empty());
    }

    #[test]
    fn test_decode_gbk() {
        let text = format!("{HEADER}\n你好,剧情,中国,2020,1,1,90,7.0,1,1,1,1,1\n");
        let (bytes, _, had_errors) = encoding_rs::GBK.encode(&text);
        assert!(!had_errors);

        let records = parse_corpus_bytes(&bytes, CorpusEncoding::Gbk).unwrap();
        assert_eq!(records[0].get(Field::Title), Some("你好"));
        assert_eq!(records[0].get(Field::Country), Some("中国"));

        // The same bytes are not valid UTF-8
        assert!(matches!(
            parse_corpus_bytes(&bytes, CorpusEncoding::Utf8),
            Err(DataLoadError::Decode { .. })
        ));
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let text = format!("\u{feff}{HEADER}\nA,剧情,中国,2020,1,1,90,7.0,1,1,1,1,1\n");
        let records = parse_corpus_bytes(text.as_bytes(), CorpusEncoding::Utf8).unwrap();
        assert_eq!(records[0].get(Field::Title), Some("A"));
    }

    #[test]
    fn test_latin1_maps_bytes_to_code_points() {
        let decoded = decode(&[0x4c, 0xe9, 0x6f, 0x6e], CorpusEncoding::Latin1).unwrap();
        assert_eq!(decoded, "Léon");
    }
}
