//! Cross-validation splitters

use crate::error::{SensorFaultError, Result};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cross-validation strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CVStrategy {
    /// Stratified K-Fold (maintains class distribution)
    StratifiedKFold { n_splits: usize, shuffle: bool },
}

impl Default for CVStrategy {
    fn default() -> Self {
        CVStrategy::StratifiedKFold {
            n_splits: 3,
            shuffle: true,
        }
    }
}

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Cross-validation splitter
pub struct CrossValidator {
    strategy: CVStrategy,
    random_state: u64,
}

impl CrossValidator {
    pub fn new(strategy: CVStrategy) -> Self {
        Self {
            strategy,
            random_state: 42,
        }
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn n_splits(&self) -> usize {
        match self.strategy {
            CVStrategy::StratifiedKFold { n_splits, .. } => n_splits,
        }
    }

    /// Generate train/test splits; `y` holds class codes
    pub fn split(&self, y: &Array1<f64>) -> Result<Vec<CVSplit>> {
        let n_splits = self.n_splits();
        if n_splits < 2 {
            return Err(SensorFaultError::ValidationError(
                "n_splits must be at least 2".to_string(),
            ));
        }

        match self.strategy {
            CVStrategy::StratifiedKFold { shuffle, .. } => self.stratified_k_fold_split(y, n_splits, shuffle),
        }
    }

    /// Every class is dealt round-robin over the folds, so each fold holds
    /// `count / n_splits` (rounded) samples of every class.
    fn stratified_k_fold_split(&self, y: &Array1<f64>, n_splits: usize, shuffle: bool) -> Result<Vec<CVSplit>> {
        let mut class_indices: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (idx, &val) in y.iter().enumerate() {
            class_indices.entry(val.round() as i64).or_default().push(idx);
        }

        if let Some((class, members)) = class_indices.iter().find(|(_, m)| m.len() < n_splits) {
            return Err(SensorFaultError::ValidationError(format!(
                "class {} has {} samples, fewer than n_splits ({})",
                class,
                members.len(),
                n_splits
            )));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        if shuffle {
            for indices in class_indices.values_mut() {
                indices.shuffle(&mut rng);
            }
        }

        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); n_splits];
        // Offset each class so remainders do not all pile onto the first folds
        let mut offset = 0;
        for indices in class_indices.values() {
            for (i, &idx) in indices.iter().enumerate() {
                folds[(i + offset) % n_splits].push(idx);
            }
            offset += indices.len();
        }

        Ok(assemble(folds))
    }
}

fn assemble(folds: Vec<Vec<usize>>) -> Vec<CVSplit> {
    (0..folds.len())
        .map(|fold_idx| {
            let mut test_indices = folds[fold_idx].clone();
            test_indices.sort_unstable();
            let mut train_indices: Vec<usize> = folds
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != fold_idx)
                .flat_map(|(_, f)| f.iter().copied())
                .collect();
            train_indices.sort_unstable();
            CVSplit {
                train_indices,
                test_indices,
                fold_idx,
            }
        })
        .collect()
}

/// Cross-validation results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CVResults {
    /// Scores for each fold
    pub scores: Vec<f64>,
    /// Mean score across folds
    pub mean_score: f64,
    /// Standard deviation of scores
    pub std_score: f64,
}

impl CVResults {
    /// Create CV results from fold scores
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n_folds = scores.len().max(1) as f64;
        let mean_score = scores.iter().sum::<f64>() / n_folds;
        let variance = scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>() / n_folds;

        Self {
            scores,
            mean_score,
            std_score: variance.sqrt(),
        }
    }
}
