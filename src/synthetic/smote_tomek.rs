//! Combined over- and under-sampling

use crate::error::Result;
use crate::synthetic::{
    class_counts, majority_class, ResampleResult, Sampler, TomekLinks, SMOTE,
};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// SMOTE oversampling followed by Tomek link cleaning.
///
/// The majority class is fixed before oversampling, since SMOTE leaves all
/// classes tied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmoteTomek {
    smote: SMOTE,
    tomek: TomekLinks,
}

impl SmoteTomek {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.smote = self.smote.with_k_neighbors(k);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.smote = self.smote.with_seed(seed);
        self
    }
}

impl Sampler for SmoteTomek {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        self.smote.fit(x, y)?;
        if let Some(majority) = majority_class(&class_counts(y)) {
            self.tomek = TomekLinks::new().with_majority_class(majority);
        }
        Ok(())
    }

    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        let oversampled = self.smote.resample(x, y)?;
        let mut cleaned = self.tomek.resample(&oversampled.x, &oversampled.y)?;

        debug!(
            rows_in = x.nrows(),
            synthetic = oversampled.n_synthetic.iter().sum::<usize>(),
            removed = cleaned.n_removed,
            rows_out = cleaned.x.nrows(),
            "Rebalanced classes"
        );

        cleaned.n_synthetic = oversampled.n_synthetic;
        Ok(cleaned)
    }
}
