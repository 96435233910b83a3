//! Design matrix construction and train/test splitting.

use crate::error::{EncodingError, PipelineError, Result};
use crate::features::FeatureEncoder;
use crate::record::parse_number;
use crate::schema::FeatureSchema;
use data_loader::{Field, RawMovieRecord};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use tracing::info;

/// Encoded corpus: one row of `x` and one target in `y` per record
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub schema: FeatureSchema,
    pub x: Vec<Vec<f64>>,
    pub y: Vec<f64>,
}

/// One side of a split, with the corpus row index of every row
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Partition {
    pub indices: Vec<usize>,
    pub x: Vec<Vec<f64>>,
    pub y: Vec<f64>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: Partition,
    pub test: Partition,
}

/// Applies a `FeatureEncoder` to every training row
pub struct DatasetBuilder<'a> {
    encoder: FeatureEncoder<'a>,
}

impl<'a> DatasetBuilder<'a> {
    pub fn new(encoder: FeatureEncoder<'a>) -> Self {
        Self { encoder }
    }

    /// Encode every record and read its `cumulative_box` target.
    ///
    /// Rows are encoded in parallel; output order matches input order.
    ///
    /// # Errors
    /// `PipelineError::Row` naming the first bad row (0-based, header excluded).
    pub fn build(&self, records: &[RawMovieRecord]) -> Result<Dataset> {
        let rows = records
            .par_iter()
            .enumerate()
            .map(|(row, raw)| {
                self.encode_row(raw)
                    .map_err(|source| PipelineError::Row { row, source })
            })
            .collect::<Result<Vec<_>>>()?;

        let (x, y): (Vec<Vec<f64>>, Vec<f64>) = rows.into_iter().unzip();
        let schema = FeatureSchema::for_vocabulary(self.encoder.vocabulary());
        info!(rows = x.len(), columns = schema.width(), "Built design matrix");

        Ok(Dataset { schema, x, y })
    }

    fn encode_row(&self, raw: &RawMovieRecord) -> std::result::Result<(Vec<f64>, f64), EncodingError> {
        let encoding = self.encoder.encode(raw)?;
        let target = parse_number(raw, Field::CumulativeBox)?;
        Ok((encoding.vector.into_inner(), target))
    }
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Random train/test split.
    ///
    /// Row indices are shuffled with a `StdRng` seeded by `seed`; the first
    /// `ceil(n * test_fraction)` shuffled rows form the test partition. The
    /// same seed and corpus size always give the same partition.
    ///
    /// # Errors
    /// `InvalidConfig` unless `0 < test_fraction < 1`.
    pub fn split(&self, test_fraction: f64, seed: u64) -> Result<Split> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "test_fraction must be between 0 and 1 (exclusive), got {test_fraction}"
            )));
        }

        let n = self.len();
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut StdRng::seed_from_u64(seed));

        let n_test = (n as f64 * test_fraction).ceil() as usize;
        let (test_idx, train_idx) = order.split_at(n_test.min(n));

        Ok(Split {
            train: self.partition(train_idx),
            test: self.partition(test_idx),
        })
    }

    fn partition(&self, indices: &[usize]) -> Partition {
        Partition {
            indices: indices.to_vec(),
            x: indices.iter().map(|&i| self.x[i].clone()).collect(),
            y: indices.iter().map(|&i| self.y[i]).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::encode;
    use crate::record::tests::clannad;
    use crate::vocabulary::Vocabulary;

    fn corpus(n: usize) -> Vec<RawMovieRecord> {
        (0..n)
            .map(|i| {
                clannad()
                    .with(Field::Title, format!("Movie {i}"))
                    .with(Field::Category, if i % 2 == 0 { "剧情" } else { "喜剧,剧情" })
                    .with(Field::CumulativeBox, format!("{}", 1000 * (i + 1)))
            })
            .collect()
    }

    #[test]
    fn test_rows_match_direct_encoding() {
        let records = corpus(6);
        let vocabulary = Vocabulary::extract(&records);
        let dataset = DatasetBuilder::new(FeatureEncoder::new(&vocabulary))
            .build(&records)
            .unwrap();

        assert_eq!(dataset.len(), 6);
        for (row, raw) in dataset.x.iter().zip(&records) {
            assert_eq!(row.as_slice(), encode(raw, &vocabulary).unwrap().vector.as_slice());
        }
        assert_eq!(dataset.y[2], 3000.0);
    }

    #[test]
    fn test_missing_target_names_row() {
        let mut records = corpus(4);
        records[2].cumulative_box = None;
        let vocabulary = Vocabulary::extract(&records);

        let err = DatasetBuilder::new(FeatureEncoder::new(&vocabulary))
            .build(&records)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Row {
                row: 2,
                source: EncodingError::MissingField { field: Field::CumulativeBox }
            }
        ));
    }

    #[test]
    fn test_split_is_reproducible() {
        let records = corpus(18);
        let vocabulary = Vocabulary::extract(&records);
        let dataset = DatasetBuilder::new(FeatureEncoder::new(&vocabulary))
            .build(&records)
            .unwrap();

        let a = dataset.split(0.25, 123).unwrap();
        let b = dataset.split(0.25, 123).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.test.len(), 5);
        assert_eq!(a.train.len(), 13);

        // Partitions cover every row exactly once
        let mut all: Vec<usize> = a.train.indices.iter().chain(&a.test.indices).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..18).collect::<Vec<_>>());

        let c = dataset.split(0.25, 7).unwrap();
        assert_ne!(a.test.indices, c.test.indices);
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        let records = corpus(3);
        let vocabulary = Vocabulary::extract(&records);
        let dataset = DatasetBuilder::new(FeatureEncoder::new(&vocabulary))
            .build(&records)
            .unwrap();

        for fraction in [0.0, 1.0, -0.5, f64::NAN] {
            assert!(matches!(
                dataset.split(fraction, 1),
                Err(PipelineError::InvalidConfig(_))
            ));
        }
    }
}
