//! Class rebalancing
//!
//! Provides the samplers used on the transformed training split:
//! - SMOTE (Synthetic Minority Over-sampling Technique)
//! - Tomek link cleaning
//! - SMOTE followed by Tomek cleaning

mod smote;
mod tomek;
mod smote_tomek;

pub use smote::SMOTE;
pub use tomek::TomekLinks;
pub use smote_tomek::SmoteTomek;

use crate::error::Result;
use ndarray::{Array1, Array2, ArrayView1};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

/// Result of resampling
#[derive(Debug, Clone)]
pub struct ResampleResult {
    /// Resampled features
    pub x: Array2<f64>,
    /// Resampled labels
    pub y: Array1<i64>,
    /// Synthetic samples generated per class, in class order
    pub n_synthetic: Vec<usize>,
    /// Rows removed by cleaning
    pub n_removed: usize,
}

/// Trait for samplers
pub trait Sampler: Send + Sync {
    /// Fit the sampler on data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()>;

    /// Resample data
    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult>;

    /// Fit and resample in one step
    fn fit_resample(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        self.fit(x, y)?;
        self.resample(x, y)
    }
}

/// Class distribution, ordered by label
pub fn class_counts(y: &Array1<i64>) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for &label in y.iter() {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Row indices of each class, ordered by label
pub fn class_indices(y: &Array1<i64>) -> BTreeMap<i64, Vec<usize>> {
    let mut indices = BTreeMap::new();
    for (i, &label) in y.iter().enumerate() {
        indices.entry(label).or_insert_with(Vec::new).push(i);
    }
    indices
}

/// Label with the largest count; the smallest label wins ties
pub(crate) fn majority_class(counts: &BTreeMap<i64, usize>) -> Option<i64> {
    counts
        .iter()
        .fold(None, |best: Option<(i64, usize)>, (&label, &count)| match best {
            Some((_, c)) if c >= count => best,
            _ => Some((label, count)),
        })
        .map(|(label, _)| label)
}

/// Distance/index pair ordered by distance, then index
#[derive(Debug, Clone, Copy)]
struct DistIdx(f64, usize);

impl PartialEq for DistIdx {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for DistIdx {}
impl PartialOrd for DistIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for DistIdx {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .partial_cmp(&other.0)
            .unwrap_or(Ordering::Equal)
            .then(self.1.cmp(&other.1))
    }
}

pub(crate) fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(ai, bi)| (ai - bi).powi(2)).sum()
}

/// The `k` rows of `candidates` closest to row `query` of `x`, nearest
/// first, `query` itself excluded. Bounded max-heap, O(n log k).
pub(crate) fn nearest_neighbors(
    x: &Array2<f64>,
    query: usize,
    candidates: &[usize],
    k: usize,
) -> Vec<usize> {
    if k == 0 {
        return Vec::new();
    }
    let point = x.row(query);
    let mut heap: BinaryHeap<DistIdx> = BinaryHeap::with_capacity(k + 1);

    for &i in candidates {
        if i == query {
            continue;
        }
        let candidate = DistIdx(squared_distance(point, x.row(i)), i);
        if heap.len() < k {
            heap.push(candidate);
        } else if let Some(&max) = heap.peek() {
            if candidate < max {
                heap.pop();
                heap.push(candidate);
            }
        }
    }

    heap.into_sorted_vec().into_iter().map(|DistIdx(_, i)| i).collect()
}
