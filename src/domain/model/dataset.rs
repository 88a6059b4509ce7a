//! Feature/target extraction and train/test splitting.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::FeatureMatrix;
use crate::domain::error::SigtraderError;
use crate::domain::table::{FeatureTable, PNL_COLUMN, PREDICTED_COLUMN};

pub const DEFAULT_TEST_SIZE: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 42;

/// Every column except the target (and any simulation output columns)
/// becomes a feature. Target values must be 0 or 1.
pub fn prepare_features_and_target(
    table: &FeatureTable,
    target_column: &str,
) -> Result<(FeatureMatrix, Vec<u8>), SigtraderError> {
    let target = table.require_column(target_column)?;
    let labels = labels_from(target_column, target)?;
    let features =
        FeatureMatrix::from_table(table, &[target_column, PREDICTED_COLUMN, PNL_COLUMN]);
    Ok((features, labels))
}

pub(crate) fn labels_from(column: &str, values: &[f64]) -> Result<Vec<u8>, SigtraderError> {
    values
        .iter()
        .enumerate()
        .map(|(row, &v)| {
            if v == 0.0 {
                Ok(0)
            } else if v == 1.0 {
                Ok(1)
            } else {
                Err(SigtraderError::Model {
                    reason: format!("{} must be 0 or 1, got {} at row {}", column, v, row),
                })
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub x_train: FeatureMatrix,
    pub x_test: FeatureMatrix,
    pub y_train: Vec<u8>,
    pub y_test: Vec<u8>,
}

/// Shuffle rows with a seeded RNG and hold out `ceil(n * test_size)` of them.
pub fn train_test_split(
    x: &FeatureMatrix,
    y: &[u8],
    test_size: f64,
    seed: u64,
) -> Result<TrainTestSplit, SigtraderError> {
    if x.len() != y.len() {
        return Err(SigtraderError::Model {
            reason: format!("{} feature rows but {} labels", x.len(), y.len()),
        });
    }
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(SigtraderError::invalid_parameter(
            "test_size",
            format!("must be in (0, 1), got {}", test_size),
        ));
    }

    let n = x.len();
    let n_test = (n as f64 * test_size).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(SigtraderError::Model {
            reason: format!(
                "cannot split {} rows with test_size {}: train or test set would be empty",
                n, test_size
            ),
        });
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    let (test_idx, train_idx) = indices.split_at(n_test);

    Ok(TrainTestSplit {
        x_train: x.take_rows(train_idx),
        x_test: x.take_rows(test_idx),
        y_train: train_idx.iter().map(|&i| y[i]).collect(),
        y_test: test_idx.iter().map(|&i| y[i]).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(n: usize) -> (FeatureMatrix, Vec<u8>) {
        let x = FeatureMatrix {
            names: vec!["f".into()],
            rows: (0..n).map(|i| vec![i as f64]).collect(),
        };
        let y = (0..n).map(|i| (i % 2) as u8).collect();
        (x, y)
    }

    #[test]
    fn prepare_excludes_target() {
        let table = FeatureTable::with_len(3)
            .with_column("sma_20", vec![1.0, 2.0, 3.0])
            .unwrap()
            .with_column("target", vec![0.0, 1.0, 0.0])
            .unwrap();
        let (x, y) = prepare_features_and_target(&table, "target").unwrap();
        assert_eq!(x.names, vec!["sma_20"]);
        assert_eq!(y, vec![0, 1, 0]);
    }

    #[test]
    fn prepare_missing_target_fails() {
        let table = FeatureTable::with_len(1)
            .with_column("a", vec![1.0])
            .unwrap();
        let err = prepare_features_and_target(&table, "target").unwrap_err();
        assert!(matches!(err, SigtraderError::MissingColumn { .. }));
    }

    #[test]
    fn prepare_rejects_non_binary_target() {
        let table = FeatureTable::with_len(2)
            .with_column("target", vec![0.0, 0.5])
            .unwrap();
        assert!(prepare_features_and_target(&table, "target").is_err());
    }

    #[test]
    fn split_sizes() {
        let (x, y) = matrix(10);
        let split = train_test_split(&x, &y, 0.2, 42).unwrap();
        assert_eq!(split.x_test.len(), 2);
        assert_eq!(split.x_train.len(), 8);
        assert_eq!(split.y_test.len(), 2);
        assert_eq!(split.y_train.len(), 8);
    }

    #[test]
    fn split_rounds_test_size_up() {
        let (x, y) = matrix(11);
        let split = train_test_split(&x, &y, 0.2, 42).unwrap();
        assert_eq!(split.x_test.len(), 3);
    }

    #[test]
    fn split_is_partition() {
        let (x, y) = matrix(20);
        let split = train_test_split(&x, &y, 0.25, 7).unwrap();
        let mut seen: Vec<usize> = split
            .x_train
            .rows
            .iter()
            .chain(&split.x_test.rows)
            .map(|r| r[0] as usize)
            .collect();
        seen.sort();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
        for (row, &label) in split.x_train.rows.iter().zip(&split.y_train) {
            assert_eq!(label, (row[0] as usize % 2) as u8);
        }
    }

    #[test]
    fn split_is_deterministic_for_seed() {
        let (x, y) = matrix(30);
        let a = train_test_split(&x, &y, 0.2, 42).unwrap();
        let b = train_test_split(&x, &y, 0.2, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn split_rejects_bad_test_size() {
        let (x, y) = matrix(10);
        assert!(train_test_split(&x, &y, 0.0, 42).is_err());
        assert!(train_test_split(&x, &y, 1.0, 42).is_err());
    }

    #[test]
    fn split_rejects_too_few_rows() {
        let (x, y) = matrix(1);
        assert!(train_test_split(&x, &y, 0.2, 42).is_err());
    }
}
