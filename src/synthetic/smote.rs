//! SMOTE oversampling

use crate::error::{SensorFaultError, Result};
use crate::synthetic::{class_counts, class_indices, nearest_neighbors, ResampleResult, Sampler};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// SMOTE (Synthetic Minority Over-sampling Technique).
///
/// Every class below the majority count is grown to it by interpolating
/// between a random class member and one of its `k` nearest same-class
/// neighbours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SMOTE {
    /// Number of nearest neighbors
    k_neighbors: usize,
    /// Random seed
    seed: u64,
    /// Target samples per class
    target_counts: Option<BTreeMap<i64, usize>>,
}

impl SMOTE {
    pub fn new() -> Self {
        Self {
            k_neighbors: 5,
            seed: 42,
            target_counts: None,
        }
    }

    /// Set number of neighbors
    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k.max(1);
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn k_neighbors(&self) -> usize {
        self.k_neighbors
    }
}

impl Default for SMOTE {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for SMOTE {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(SensorFaultError::ShapeError {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }

        let counts = class_counts(y);
        if counts.len() < 2 {
            return Err(SensorFaultError::ValidationError(
                "Need at least 2 classes for SMOTE".to_string(),
            ));
        }

        let max_count = counts.values().copied().max().unwrap_or(0);
        self.target_counts = Some(counts.keys().map(|&class| (class, max_count)).collect());
        Ok(())
    }

    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        let targets = self
            .target_counts
            .as_ref()
            .ok_or_else(|| SensorFaultError::ValidationError("SMOTE not fitted".to_string()))?;

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let indices = class_indices(y);

        let mut synthetic_x: Vec<Vec<f64>> = Vec::new();
        let mut synthetic_y: Vec<i64> = Vec::new();
        let mut n_synthetic = Vec::with_capacity(targets.len());

        for (&class, &target_count) in targets {
            let class_idx = match indices.get(&class) {
                Some(idx) if !idx.is_empty() => idx,
                _ => {
                    n_synthetic.push(0);
                    continue;
                }
            };
            let n_to_generate = target_count.saturating_sub(class_idx.len());
            if n_to_generate == 0 {
                n_synthetic.push(0);
                continue;
            }

            let k = self.k_neighbors.min(class_idx.len() - 1);
            let neighbors: Vec<Vec<usize>> = class_idx
                .iter()
                .map(|&i| nearest_neighbors(x, i, class_idx, k))
                .collect();

            for _ in 0..n_to_generate {
                let pick = rng.gen_range(0..class_idx.len());
                let sample = x.row(class_idx[pick]);
                // A lone class member has no neighbours and is duplicated
                let neighbor = match neighbors[pick].as_slice() {
                    [] => sample,
                    nn => x.row(nn[rng.gen_range(0..nn.len())]),
                };
                let gap: f64 = rng.gen();

                synthetic_x.push(
                    sample
                        .iter()
                        .zip(neighbor.iter())
                        .map(|(&p, &n)| p + gap * (n - p))
                        .collect(),
                );
                synthetic_y.push(class);
            }

            n_synthetic.push(n_to_generate);
        }

        // Original rows first, synthetic rows appended
        let n_original = x.nrows();
        let n_total = n_original + synthetic_x.len();
        let result_x = Array2::from_shape_fn((n_total, x.ncols()), |(i, j)| {
            if i < n_original {
                x[[i, j]]
            } else {
                synthetic_x[i - n_original][j]
            }
        });

        let mut all_y: Vec<i64> = y.to_vec();
        all_y.extend_from_slice(&synthetic_y);

        Ok(ResampleResult {
            x: result_x,
            y: Array1::from_vec(all_y),
            n_synthetic,
            n_removed: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_imbalanced_data() -> (Array2<f64>, Array1<i64>) {
        // 20 majority around (0, 0), 5 minority around (10, 10)
        let mut data = Vec::new();
        let mut labels = Vec::new();

        for i in 0..20 {
            data.push((i % 5) as f64);
            data.push((i / 5) as f64);
            labels.push(0i64);
        }
        for i in 0..5 {
            data.push(10.0 + (i % 3) as f64);
            data.push(10.0 + (i / 3) as f64);
            labels.push(1i64);
        }

        (
            Array2::from_shape_vec((25, 2), data).unwrap(),
            Array1::from_vec(labels),
        )
    }

    #[test]
    fn test_smote_balances_classes() {
        let (x, y) = create_imbalanced_data();
        let mut smote = SMOTE::new().with_k_neighbors(3).with_seed(42);
        let result = smote.fit_resample(&x, &y).unwrap();

        let counts = class_counts(&result.y);
        assert_eq!(counts[&0], 20);
        assert_eq!(counts[&1], 20);
        assert_eq!(result.n_synthetic, vec![0, 15]);
        assert_eq!(result.x.nrows(), 40);
    }

    #[test]
    fn test_smote_preserves_original_and_stays_in_hull() {
        let (x, y) = create_imbalanced_data();
        let result = SMOTE::new().fit_resample(&x, &y).unwrap();

        for i in 0..x.nrows() {
            assert_eq!(result.x.row(i), x.row(i));
        }
        for i in x.nrows()..result.x.nrows() {
            assert!(result.x[[i, 0]] >= 10.0 && result.x[[i, 0]] <= 12.0);
            assert!(result.x[[i, 1]] >= 10.0 && result.x[[i, 1]] <= 11.0);
        }
    }

    #[test]
    fn test_smote_deterministic() {
        let (x, y) = create_imbalanced_data();
        let a = SMOTE::new().with_seed(7).fit_resample(&x, &y).unwrap();
        let b = SMOTE::new().with_seed(7).fit_resample(&x, &y).unwrap();
        assert_eq!(a.x, b.x);
        assert_eq!(a.y, b.y);
    }

    #[test]
    fn test_single_class_rejected() {
        let x = Array2::zeros((4, 2));
        let y = Array1::from_vec(vec![1, 1, 1, 1]);
        assert!(matches!(
            SMOTE::new().fit_resample(&x, &y),
            Err(SensorFaultError::ValidationError(_))
        ));
    }

    #[test]
    fn test_lone_minority_sample_duplicated() {
        let x = ndarray::array![[0.0], [1.0], [2.0], [9.0]];
        let y = ndarray::array![0, 0, 0, 1];
        let result = SMOTE::new().fit_resample(&x, &y).unwrap();
        assert_eq!(result.y.len(), 6);
        assert_eq!(result.x[[4, 0]], 9.0);
        assert_eq!(result.x[[5, 0]], 9.0);
    }
}
