//! Tomek link cleaning

use crate::error::{SensorFaultError, Result};
use crate::synthetic::{class_counts, majority_class, nearest_neighbors, ResampleResult, Sampler};
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Removes the majority-class member of every Tomek link.
///
/// Two samples form a link when they are each other's nearest neighbour and
/// carry different labels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomekLinks {
    /// Class whose link members are dropped
    majority: Option<i64>,
}

impl TomekLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed majority class instead of the one observed at fit time
    pub fn with_majority_class(mut self, class: i64) -> Self {
        self.majority = Some(class);
        self
    }

    /// All links as `(i, j)` pairs with `i < j`, in row order
    pub fn find_links(x: &Array2<f64>, y: &Array1<i64>) -> Vec<(usize, usize)> {
        let all: Vec<usize> = (0..x.nrows()).collect();
        let nearest: Vec<Option<usize>> = all
            .par_iter()
            .map(|&i| nearest_neighbors(x, i, &all, 1).first().copied())
            .collect();

        nearest
            .iter()
            .enumerate()
            .filter_map(|(i, nn)| {
                let j = (*nn)?;
                (i < j && nearest[j] == Some(i) && y[i] != y[j]).then_some((i, j))
            })
            .collect()
    }
}

impl Sampler for TomekLinks {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(SensorFaultError::ShapeError {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }
        if self.majority.is_none() {
            self.majority = majority_class(&class_counts(y));
        }
        Ok(())
    }

    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        let majority = self.majority.ok_or_else(|| {
            SensorFaultError::ValidationError("Tomek links not fitted".to_string())
        })?;

        let mut drop = vec![false; x.nrows()];
        for (i, j) in Self::find_links(x, y) {
            if y[i] == majority {
                drop[i] = true;
            }
            if y[j] == majority {
                drop[j] = true;
            }
        }

        let keep: Vec<usize> = (0..x.nrows()).filter(|&i| !drop[i]).collect();
        let n_removed = x.nrows() - keep.len();

        Ok(ResampleResult {
            x: x.select(Axis(0), &keep),
            y: y.select(Axis(0), &keep),
            n_synthetic: Vec::new(),
            n_removed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_find_mutual_links() {
        // 2 and 3 straddle the boundary; 0/1 and 4/5 are same-class pairs
        let x = array![[0.0], [0.1], [1.0], [1.05], [2.0], [2.1]];
        let y = array![0, 0, 0, 1, 1, 1];
        assert_eq!(TomekLinks::find_links(&x, &y), vec![(2, 3)]);
    }

    #[test]
    fn test_removes_majority_member_only() {
        let x = array![[0.0], [0.1], [0.2], [1.0], [1.05], [2.0], [2.1]];
        let y = array![0, 0, 0, 0, 1, 1, 1];
        let result = TomekLinks::new().fit_resample(&x, &y).unwrap();

        assert_eq!(result.n_removed, 1);
        assert_eq!(result.y.to_vec(), vec![0, 0, 0, 1, 1, 1]);
        assert!(result.x.column(0).iter().all(|&v| v != 1.0));
    }

    #[test]
    fn test_no_links_keeps_everything() {
        let x = array![[0.0], [0.1], [5.0], [5.1]];
        let y = array![0, 0, 1, 1];
        let result = TomekLinks::new().fit_resample(&x, &y).unwrap();
        assert_eq!(result.n_removed, 0);
        assert_eq!(result.x, x);
    }
}
