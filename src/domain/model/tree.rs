//! CART decision tree for binary labels, split on Gini impurity.

use rand::rngs::StdRng;
use rand::seq::index;

use super::{Classifier, FeatureMatrix};
use crate::domain::error::SigtraderError;

#[derive(Debug, Clone, PartialEq)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    /// Features considered per split; `None` means all.
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 2,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        /// Fraction of training samples in this leaf labelled 1.
        p_buy: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    root: Node,
    feature_names: Vec<String>,
    importances: Vec<f64>,
}

fn gini(counts: [usize; 2]) -> f64 {
    let n = (counts[0] + counts[1]) as f64;
    if n == 0.0 {
        return 0.0;
    }
    let p0 = counts[0] as f64 / n;
    let p1 = counts[1] as f64 / n;
    1.0 - p0 * p0 - p1 * p1
}

fn class_counts(y: &[u8], idx: &[usize]) -> [usize; 2] {
    let mut counts = [0usize; 2];
    for &i in idx {
        counts[usize::from(y[i] == 1)] += 1;
    }
    counts
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct Builder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [u8],
    params: &'a TreeParams,
    n_features: usize,
    importances: Vec<f64>,
    rng: &'a mut StdRng,
}

impl Builder<'_> {
    fn build(&mut self, idx: &[usize], depth: usize) -> Node {
        let counts = class_counts(self.y, idx);
        let leaf = Node::Leaf {
            p_buy: counts[1] as f64 / idx.len().max(1) as f64,
        };
        if depth >= self.params.max_depth
            || idx.len() < self.params.min_samples_split
            || counts[0] == 0
            || counts[1] == 0
        {
            return leaf;
        }

        let Some(best) = self.best_split(idx, counts) else {
            return leaf;
        };

        self.importances[best.feature] += best.gain;
        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = idx
            .iter()
            .copied()
            .partition(|&i| self.x[i][best.feature] <= best.threshold);

        Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: Box::new(self.build(&left_idx, depth + 1)),
            right: Box::new(self.build(&right_idx, depth + 1)),
        }
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        match self.params.max_features {
            Some(k) if k < self.n_features => {
                index::sample(&mut *self.rng, self.n_features, k.max(1)).into_vec()
            }
            _ => (0..self.n_features).collect(),
        }
    }

    /// Best split among the sampled features, widening to every feature
    /// when the sample has no valid threshold.
    fn best_split(&mut self, idx: &[usize], counts: [usize; 2]) -> Option<BestSplit> {
        let candidates = self.candidate_features();
        let widened = candidates.len() < self.n_features;
        self.best_split_over(&candidates, idx, counts).or_else(|| {
            if widened {
                let all: Vec<usize> = (0..self.n_features).collect();
                self.best_split_over(&all, idx, counts)
            } else {
                None
            }
        })
    }

    /// Best threshold over `features` by weighted impurity decrease.
    fn best_split_over(
        &self,
        features: &[usize],
        idx: &[usize],
        counts: [usize; 2],
    ) -> Option<BestSplit> {
        let n = idx.len() as f64;
        let parent = gini(counts);
        let mut best: Option<BestSplit> = None;

        for &feature in features {
            let mut sorted: Vec<usize> = idx.to_vec();
            sorted.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));

            let mut left = [0usize; 2];
            for pos in 0..sorted.len() - 1 {
                let i = sorted[pos];
                left[usize::from(self.y[i] == 1)] += 1;

                let here = self.x[i][feature];
                let next = self.x[sorted[pos + 1]][feature];
                if here == next {
                    continue;
                }

                let right = [counts[0] - left[0], counts[1] - left[1]];
                let n_left = (pos + 1) as f64;
                let n_right = n - n_left;
                let child = (n_left * gini(left) + n_right * gini(right)) / n;
                let gain = n * (parent - child);

                if gain > 0.0 && best.as_ref().is_none_or(|b| gain > b.gain) {
                    best = Some(BestSplit {
                        feature,
                        threshold: (here + next) / 2.0,
                        gain,
                    });
                }
            }
        }
        best
    }
}

impl DecisionTree {
    /// Fit on the rows of `x` listed in `sample` (duplicates allowed, as in
    /// a bootstrap draw).
    pub fn fit_sample(
        x: &FeatureMatrix,
        y: &[u8],
        sample: &[usize],
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Result<Self, SigtraderError> {
        if x.is_empty() || sample.is_empty() {
            return Err(SigtraderError::Model {
                reason: "cannot fit a tree on an empty training set".into(),
            });
        }
        if x.len() != y.len() {
            return Err(SigtraderError::Model {
                reason: format!("{} feature rows but {} labels", x.len(), y.len()),
            });
        }

        let mut builder = Builder {
            x: &x.rows,
            y,
            params,
            n_features: x.n_features(),
            importances: vec![0.0; x.n_features()],
            rng,
        };
        let root = builder.build(sample, 0);

        let total: f64 = builder.importances.iter().sum();
        let importances = if total > 0.0 {
            builder.importances.iter().map(|v| v / total).collect()
        } else {
            builder.importances
        };

        Ok(DecisionTree {
            root,
            feature_names: x.names.clone(),
            importances,
        })
    }

    pub fn fit(
        x: &FeatureMatrix,
        y: &[u8],
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Result<Self, SigtraderError> {
        let all: Vec<usize> = (0..x.len()).collect();
        Self::fit_sample(x, y, &all, params, rng)
    }

    /// Probability of the buy class for one row in training column order.
    pub fn predict_proba_row(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { p_buy } => return *p_buy,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { &**left } else { &**right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        walk(&self.root)
    }
}

impl Classifier for DecisionTree {
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<u8>, SigtraderError> {
        let aligned = features.select(&self.feature_names)?;
        Ok(aligned
            .rows
            .iter()
            .map(|row| u8::from(self.predict_proba_row(row) > 0.5))
            .collect())
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn feature_importances(&self) -> Option<&[f64]> {
        Some(&self.importances)
    }
}
