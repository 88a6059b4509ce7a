//! Binary buy-signal classifiers and the feature matrix they consume.
//!
//! - `FeatureMatrix`: row-major numeric features with column names
//! - `Classifier`: trait implemented by every trained model
//! - `dataset`: feature/target extraction and seeded train/test split
//! - `tree` / `forest`: CART decision tree and random forest
//! - `evaluation`: accuracy, confusion matrix, per-class report

pub mod dataset;
pub mod evaluation;
pub mod forest;
pub mod tree;

pub use dataset::{
    prepare_features_and_target, train_test_split, TrainTestSplit, DEFAULT_SEED, DEFAULT_TEST_SIZE,
};
pub use evaluation::{evaluate_model, ClassReport, ModelEvaluation};
pub use forest::{ForestParams, RandomForest};
pub use tree::{DecisionTree, TreeParams};

use super::error::SigtraderError;
use super::table::FeatureTable;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureMatrix {
    pub names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// All table columns except `excluding`, one row per table row.
    pub fn from_table(table: &FeatureTable, excluding: &[&str]) -> Self {
        let names = table.feature_names(excluding);
        let columns: Vec<&[f64]> = names
            .iter()
            .filter_map(|n| table.column(n))
            .collect();
        let rows = (0..table.len())
            .map(|r| columns.iter().map(|c| c[r]).collect())
            .collect();
        FeatureMatrix { names, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.names.len()
    }

    /// Reorder columns to `names`. Fails if any name is absent.
    pub fn select(&self, names: &[String]) -> Result<FeatureMatrix, SigtraderError> {
        let positions = names
            .iter()
            .map(|n| {
                self.names
                    .iter()
                    .position(|have| have == n)
                    .ok_or_else(|| SigtraderError::missing_column(n.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let rows = self
            .rows
            .iter()
            .map(|row| positions.iter().map(|&p| row[p]).collect())
            .collect();
        Ok(FeatureMatrix {
            names: names.to_vec(),
            rows,
        })
    }

    /// Subset of rows by index, in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> FeatureMatrix {
        FeatureMatrix {
            names: self.names.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }
}

/// A trained binary classifier: 1 = buy, 0 = no signal.
pub trait Classifier {
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<u8>, SigtraderError>;

    /// Feature names in training order, when the model tracks them.
    fn feature_names(&self) -> &[String] {
        &[]
    }

    /// Normalized impurity-based importances aligned with `feature_names`.
    fn feature_importances(&self) -> Option<&[f64]> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> FeatureTable {
        FeatureTable::with_len(2)
            .with_column("a", vec![1.0, 2.0])
            .unwrap()
            .with_column("target", vec![0.0, 1.0])
            .unwrap()
            .with_column("b", vec![3.0, 4.0])
            .unwrap()
    }

    #[test]
    fn from_table_excludes_columns() {
        let m = FeatureMatrix::from_table(&sample_table(), &["target"]);
        assert_eq!(m.names, vec!["a", "b"]);
        assert_eq!(m.rows, vec![vec![1.0, 3.0], vec![2.0, 4.0]]);
    }

    #[test]
    fn select_reorders() {
        let m = FeatureMatrix::from_table(&sample_table(), &["target"]);
        let s = m.select(&["b".to_string(), "a".to_string()]).unwrap();
        assert_eq!(s.rows[0], vec![3.0, 1.0]);
    }

    #[test]
    fn select_missing_name_fails() {
        let m = FeatureMatrix::from_table(&sample_table(), &["target"]);
        assert!(m.select(&["zzz".to_string()]).is_err());
    }

    #[test]
    fn take_rows_in_order() {
        let m = FeatureMatrix::from_table(&sample_table(), &[]);
        let t = m.take_rows(&[1, 0]);
        assert_eq!(t.rows[0], vec![2.0, 1.0, 4.0]);
    }
}
