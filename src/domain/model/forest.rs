//! Random forest: bootstrap-sampled decision trees with per-split feature
//! subsampling, averaged leaf probabilities.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::tree::{DecisionTree, TreeParams};
use super::{Classifier, FeatureMatrix};
use crate::domain::error::SigtraderError;

#[derive(Debug, Clone, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    feature_names: Vec<String>,
    importances: Vec<f64>,
}

impl RandomForest {
    pub fn fit(
        x: &FeatureMatrix,
        y: &[u8],
        params: &ForestParams,
    ) -> Result<Self, SigtraderError> {
        if params.n_trees == 0 {
            return Err(SigtraderError::invalid_parameter("n_trees", "must be at least 1"));
        }
        if x.is_empty() {
            return Err(SigtraderError::Model {
                reason: "cannot fit a forest on an empty training set".into(),
            });
        }

        let n = x.len();
        let max_features = (x.n_features() as f64).sqrt().floor().max(1.0) as usize;
        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            max_features: Some(max_features),
        };

        let mut master = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_trees);
        for _ in 0..params.n_trees {
            let mut rng = StdRng::seed_from_u64(master.gen_range(0..u64::MAX));
            let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            trees.push(DecisionTree::fit_sample(x, y, &sample, &tree_params, &mut rng)?);
        }

        let mut importances = vec![0.0; x.n_features()];
        for tree in &trees {
            if let Some(imp) = tree.feature_importances() {
                for (acc, v) in importances.iter_mut().zip(imp) {
                    *acc += v;
                }
            }
        }
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }

        debug!(
            trees = trees.len(),
            rows = n,
            features = x.n_features(),
            max_features,
            "trained random forest"
        );

        Ok(RandomForest {
            trees,
            feature_names: x.names.clone(),
            importances,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean buy-class probability across trees for each row.
    pub fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<f64>, SigtraderError> {
        let aligned = features.select(&self.feature_names)?;
        let n_trees = self.trees.len() as f64;
        Ok(aligned
            .rows
            .iter()
            .map(|row| {
                self.trees
                    .iter()
                    .map(|t| t.predict_proba_row(row))
                    .sum::<f64>()
                    / n_trees
            })
            .collect())
    }
}

impl Classifier for RandomForest {
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<u8>, SigtraderError> {
        Ok(self
            .predict_proba(features)?
            .into_iter()
            .map(|p| u8::from(p > 0.5))
            .collect())
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn feature_importances(&self) -> Option<&[f64]> {
        Some(&self.importances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> (FeatureMatrix, Vec<u8>) {
        let rows: Vec<Vec<f64>> = (0..60)
            .map(|i| vec![i as f64, ((i * 7) % 5) as f64, 1.0])
            .collect();
        let y = (0..60).map(|i| u8::from(i >= 30)).collect();
        (
            FeatureMatrix {
                names: vec!["trend".into(), "noise".into(), "flat".into()],
                rows,
            },
            y,
        )
    }

    fn small_params() -> ForestParams {
        ForestParams {
            n_trees: 15,
            ..ForestParams::default()
        }
    }

    #[test]
    fn learns_threshold() {
        let (x, y) = dataset();
        let forest = RandomForest::fit(&x, &y, &small_params()).unwrap();
        let predicted = forest.predict(&x).unwrap();
        let correct = predicted.iter().zip(&y).filter(|(p, t)| p == t).count();
        assert!(correct >= 55, "only {} of 60 correct", correct);
    }

    #[test]
    fn deterministic_for_seed() {
        let (x, y) = dataset();
        let a = RandomForest::fit(&x, &y, &small_params()).unwrap();
        let b = RandomForest::fit(&x, &y, &small_params()).unwrap();
        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }

    #[test]
    fn importances_normalized() {
        let (x, y) = dataset();
        let forest = RandomForest::fit(&x, &y, &small_params()).unwrap();
        let imp = forest.feature_importances().unwrap();
        assert_eq!(imp.len(), 3);
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert_eq!(imp[2], 0.0);
        assert!(imp[0] > imp[1]);
    }

    #[test]
    fn zero_trees_rejected() {
        let (x, y) = dataset();
        let params = ForestParams {
            n_trees: 0,
            ..ForestParams::default()
        };
        assert!(RandomForest::fit(&x, &y, &params).is_err());
    }

    #[test]
    fn predict_requires_training_features() {
        let (x, y) = dataset();
        let forest = RandomForest::fit(&x, &y, &small_params()).unwrap();
        let missing = FeatureMatrix {
            names: vec!["trend".into()],
            rows: vec![vec![1.0]],
        };
        assert!(forest.predict(&missing).is_err());
    }
}
