//! Decision tree classifier

use super::models::{check_fit_input, check_predict_input, Model};
use crate::error::{SensorFaultError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with the predicted class code
    Leaf { value: f64, n_samples: usize },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// Impurity criterion
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub enum Criterion {
    /// Gini impurity
    #[default]
    Gini,
    /// Entropy
    Entropy,
}

impl Criterion {
    fn impurity(&self, counts: &[usize], total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let n = total as f64;
        match self {
            Criterion::Gini => 1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>(),
            Criterion::Entropy => -counts
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / n;
                    p * p.ln()
                })
                .sum::<f64>(),
        }
    }
}

/// Features considered at each split
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Square root of n_features
    Sqrt,
    /// Log2 of n_features
    Log2,
    /// Fixed number
    Fixed(usize),
    /// All features
    #[default]
    All,
}

impl MaxFeatures {
    pub fn resolve(&self, n_features: usize) -> usize {
        match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().ceil() as usize,
            MaxFeatures::Fixed(n) => (*n).min(n_features),
            MaxFeatures::All => n_features,
        }
        .max(1)
    }
}

/// Best split candidate for one feature
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// CART classification tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features drawn at each split
    pub max_features: MaxFeatures,
    /// Impurity criterion
    pub criterion: Criterion,
    /// Seed for feature subsampling
    pub random_state: u64,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
    /// Sorted class codes seen during fit
    classes: Vec<f64>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            criterion: Criterion::Gini,
            random_state: 42,
            n_features: 0,
            feature_importances: None,
            classes: Vec::new(),
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Set criterion
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
        importances: &mut [f64],
    ) -> TreeNode {
        let n_samples = indices.len();
        let counts = self.class_counts(y, indices);
        let leaf = TreeNode::Leaf {
            value: self.majority(&counts),
            n_samples,
        };

        let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        if is_pure
            || n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
        {
            return leaf;
        }

        let parent_impurity = self.criterion.impurity(&counts, n_samples);
        let Some(best) = self.find_best_split(x, y, indices, parent_impurity, rng) else {
            return leaf;
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, best.feature_idx]] <= best.threshold);

        importances[best.feature_idx] += n_samples as f64 * best.gain;

        let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, rng, importances));
        let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, rng, importances));

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left,
            right,
            n_samples,
        }
    }

    /// Scan the drawn features in parallel; each sweeps its sorted values once
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        indices: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<SplitCandidate> {
        let n_draw = self.max_features.resolve(self.n_features);
        let mut features: Vec<usize> = if n_draw < self.n_features {
            sample(rng, self.n_features, n_draw).into_vec()
        } else {
            (0..self.n_features).collect()
        };
        features.sort_unstable();

        let n_classes = self.classes.len();
        let n = indices.len();
        let total = self.class_counts(y, indices);

        let candidates: Vec<Option<SplitCandidate>> = features
            .par_iter()
            .map(|&feature_idx| {
                let mut pairs: Vec<(f64, usize)> =
                    indices.iter().map(|&i| (x[[i, feature_idx]], y[i])).collect();
                pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

                let mut left = vec![0usize; n_classes];
                let mut best: Option<SplitCandidate> = None;

                for i in 0..n - 1 {
                    left[pairs[i].1] += 1;
                    if pairs[i].0 >= pairs[i + 1].0 {
                        continue;
                    }
                    let n_left = i + 1;
                    let n_right = n - n_left;
                    if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                        continue;
                    }

                    let right: Vec<usize> = total.iter().zip(&left).map(|(t, l)| t - l).collect();
                    let weighted = (n_left as f64 * self.criterion.impurity(&left, n_left)
                        + n_right as f64 * self.criterion.impurity(&right, n_right))
                        / n as f64;
                    let gain = parent_impurity - weighted;

                    if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                        best = Some(SplitCandidate {
                            feature_idx,
                            threshold: (pairs[i].0 + pairs[i + 1].0) / 2.0,
                            gain,
                        });
                    }
                }
                best
            })
            .collect();

        // Lowest feature index wins equal gains
        candidates.into_iter().flatten().fold(None, |acc, c| match acc {
            Some(a) if a.gain >= c.gain => Some(a),
            _ => Some(c),
        })
    }

    fn class_counts(&self, y: &[usize], indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.classes.len()];
        for &i in indices {
            counts[y[i]] += 1;
        }
        counts
    }

    /// Most common class; the smallest code wins ties
    fn majority(&self, counts: &[usize]) -> f64 {
        let mut best = 0;
        for (idx, &c) in counts.iter().enumerate() {
            if c > counts[best] {
                best = idx;
            }
        }
        self.classes.get(best).copied().unwrap_or(0.0)
    }

    fn predict_sample(node: &TreeNode, sample: ArrayView1<f64>) -> f64 {
        match node {
            TreeNode::Leaf { value, .. } => *value,
            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
                ..
            } => {
                if sample[*feature_idx] <= *threshold {
                    Self::predict_sample(left, sample)
                } else {
                    Self::predict_sample(right, sample)
                }
            }
        }
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get tree depth
    pub fn get_depth(&self) -> usize {
        fn depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        self.root.as_ref().map_or(0, depth)
    }
}

impl Model for DecisionTree {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;

        let mut classes: Vec<f64> = y.iter().map(|v| v.round()).collect();
        classes.sort_by(|a, b| a.total_cmp(b));
        classes.dedup();

        // Class positions, so impurity works on dense count vectors
        let codes: Vec<usize> = y
            .iter()
            .map(|v| {
                classes
                    .binary_search_by(|c| c.total_cmp(&v.round()))
                    .map_err(|_| SensorFaultError::DataError(format!("unexpected label {}", v)))
            })
            .collect::<Result<_>>()?;

        self.classes = classes;
        self.n_features = x.ncols();

        let mut importances = vec![0.0; self.n_features];
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.root = Some(self.build_tree(x, &codes, &indices, 0, &mut rng, &mut importances));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|imp| *imp /= total);
        }
        self.feature_importances = Some(Array1::from_vec(importances));
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(SensorFaultError::ModelNotFitted)?;
        check_predict_input(x, self.n_features)?;

        let predictions: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| Self::predict_sample(root, x.row(i)))
            .collect();
        Ok(Array1::from_vec(predictions))
    }

    fn is_fitted(&self) -> bool {
        self.root.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_classifier_fits_separable_data() {
        let x = array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.predict(&x).unwrap(), y);
        assert_eq!(tree.get_depth(), 2);
    }

    #[test]
    fn test_max_depth() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y = array![0.0, 1.0, 0.0, 1.0, 0.0, 1.0];

        let mut tree = DecisionTree::new().with_max_depth(2);
        tree.fit(&x, &y).unwrap();
        assert!(tree.get_depth() <= 3);
    }

    #[test]
    fn test_feature_importances() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new().with_criterion(Criterion::Entropy);
        tree.fit(&x, &y).unwrap();

        let importances = tree.feature_importances().unwrap();
        assert_eq!(importances[0], 1.0);
        assert_eq!(importances[1], 0.0);
    }

    #[test]
    fn test_min_samples_leaf_blocks_split() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new().with_min_samples_leaf(2);
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.get_depth(), 1);
        assert_eq!(tree.predict(&x).unwrap(), array![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_multiclass_and_shape_check() {
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![0.0, 0.0, 1.0, 1.0, 2.0, 2.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.predict(&x).unwrap(), y);
        assert!(tree.predict(&array![[0.0, 1.0]]).is_err());
    }
}
