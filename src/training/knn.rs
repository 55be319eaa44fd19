//! K-Nearest Neighbors classifier

use super::models::{check_fit_input, check_predict_input, Model};
use crate::error::{SensorFaultError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

/// Distance metric for KNN
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Euclidean distance (L2)
    #[default]
    Euclidean,
    /// Manhattan distance (L1)
    Manhattan,
}

/// Weighting scheme for neighbors
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum WeightScheme {
    /// All neighbors have equal weight
    #[default]
    Uniform,
    /// Closer neighbors have more weight (inverse distance)
    Distance,
}

/// KNN configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNNConfig {
    /// Number of neighbors
    pub n_neighbors: usize,
    /// Distance metric
    pub metric: DistanceMetric,
    /// Weighting scheme
    pub weights: WeightScheme,
}

impl Default for KNNConfig {
    fn default() -> Self {
        Self {
            n_neighbors: 5,
            metric: DistanceMetric::Euclidean,
            weights: WeightScheme::Uniform,
        }
    }
}

/// K-Nearest Neighbors Classifier
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KNNClassifier {
    config: KNNConfig,
    x_train: Option<Array2<f64>>,
    y_train: Option<Array1<f64>>,
}

impl KNNClassifier {
    pub fn new(config: KNNConfig) -> Self {
        Self {
            config,
            x_train: None,
            y_train: None,
        }
    }

    /// Create with default config and specified k
    pub fn with_k(k: usize) -> Self {
        Self::new(KNNConfig {
            n_neighbors: k,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &KNNConfig {
        &self.config
    }
}

impl Model for KNNClassifier {
    /// Stores the training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        if self.config.n_neighbors == 0 {
            return Err(SensorFaultError::InvalidParameter {
                name: "n_neighbors".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        self.x_train = Some(x.clone());
        self.y_train = Some(y.clone());
        Ok(())
    }

    /// Predict class labels (parallelized over samples)
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (x_train, y_train) = match (&self.x_train, &self.y_train) {
            (Some(x_train), Some(y_train)) => (x_train, y_train),
            _ => return Err(SensorFaultError::ModelNotFitted),
        };
        check_predict_input(x, x_train.ncols())?;

        let k = self.config.n_neighbors.min(x_train.nrows());
        let predictions: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let neighbors = find_k_nearest(x.row(i), x_train, y_train, k, self.config.metric);
                vote_classify(&neighbors, self.config.weights)
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    fn is_fitted(&self) -> bool {
        self.x_train.is_some()
    }
}

/// Max-heap entry keeping the k smallest distances; ties go to the earlier row
#[derive(Debug, Clone, Copy)]
struct Neighbor {
    dist: f64,
    row: usize,
    label: f64,
}

impl PartialEq for Neighbor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Neighbor {}
impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .partial_cmp(&other.dist)
            .unwrap_or(Ordering::Equal)
            .then(self.row.cmp(&other.row))
    }
}

/// Find k nearest neighbors using a max-heap, O(n log k)
fn find_k_nearest(
    point: ArrayView1<f64>,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    k: usize,
    metric: DistanceMetric,
) -> Vec<Neighbor> {
    let mut heap = BinaryHeap::with_capacity(k + 1);

    for (row, sample) in x_train.rows().into_iter().enumerate() {
        let candidate = Neighbor {
            dist: compute_distance(point, sample, metric),
            row,
            label: y_train[row],
        };
        if heap.len() < k {
            heap.push(candidate);
        } else if let Some(top) = heap.peek() {
            if candidate < *top {
                heap.pop();
                heap.push(candidate);
            }
        }
    }

    heap.into_sorted_vec()
}

fn compute_distance(a: ArrayView1<f64>, b: ArrayView1<f64>, metric: DistanceMetric) -> f64 {
    match metric {
        DistanceMetric::Euclidean => a
            .iter()
            .zip(b.iter())
            .map(|(ai, bi)| {
                let d = ai - bi;
                d * d
            })
            .sum::<f64>()
            .sqrt(),
        DistanceMetric::Manhattan => a.iter().zip(b.iter()).map(|(ai, bi)| (ai - bi).abs()).sum(),
    }
}

/// Classify by weighted majority vote; the smallest label wins ties
fn vote_classify(neighbors: &[Neighbor], weights: WeightScheme) -> f64 {
    let mut votes: BTreeMap<i64, f64> = BTreeMap::new();
    for n in neighbors {
        let weight = match weights {
            WeightScheme::Uniform => 1.0,
            WeightScheme::Distance => 1.0 / (n.dist + 1e-10),
        };
        *votes.entry(n.label.round() as i64).or_insert(0.0) += weight;
    }
    votes
        .into_iter()
        .fold(None, |best: Option<(i64, f64)>, (label, w)| match best {
            Some((_, bw)) if bw >= w => best,
            _ => Some((label, w)),
        })
        .map(|(label, _)| label as f64)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_knn_classifier() {
        let x = array![[0.0, 0.0], [0.1, 0.1], [0.2, 0.0], [5.0, 5.0], [5.1, 5.0], [5.0, 5.2]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut knn = KNNClassifier::with_k(3);
        knn.fit(&x, &y).unwrap();

        let pred = knn.predict(&array![[0.05, 0.05], [4.9, 5.1]]).unwrap();
        assert_eq!(pred, array![0.0, 1.0]);
    }

    #[test]
    fn test_distance_weighting_breaks_majority() {
        let x = array![[0.0], [3.0], [3.1]];
        let y = array![1.0, 0.0, 0.0];
        let mut knn = KNNClassifier::new(KNNConfig {
            n_neighbors: 3,
            weights: WeightScheme::Distance,
            ..Default::default()
        });
        knn.fit(&x, &y).unwrap();
        assert_eq!(knn.predict(&array![[0.1]]).unwrap(), array![1.0]);
    }

    #[test]
    fn test_k_larger_than_train_and_not_fitted() {
        let knn = KNNClassifier::with_k(10);
        assert!(matches!(knn.predict(&array![[0.0]]), Err(SensorFaultError::ModelNotFitted)));

        let mut knn = KNNClassifier::with_k(10);
        knn.fit(&array![[0.0], [1.0]], &array![0.0, 1.0]).unwrap();
        assert_eq!(knn.predict(&array![[0.9]]).unwrap().len(), 1);
    }
}
