//! Categorical column drift

use crate::drift::{DriftDetector, DriftResult};
use crate::error::{SensorFaultError, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use std::collections::BTreeMap;

/// Chi-square test of homogeneity on the 2 x K table of category counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChiSquareTest {
    alpha: f64,
}

impl ChiSquareTest {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    /// Chi-square statistic and degrees of freedom
    pub fn statistic(reference: &[String], current: &[String]) -> (f64, usize) {
        let mut table: BTreeMap<&str, [f64; 2]> = BTreeMap::new();
        for v in reference {
            table.entry(v.as_str()).or_insert([0.0; 2])[0] += 1.0;
        }
        for v in current {
            table.entry(v.as_str()).or_insert([0.0; 2])[1] += 1.0;
        }

        let rows = [reference.len() as f64, current.len() as f64];
        let total = rows[0] + rows[1];
        let chi2 = table
            .values()
            .map(|counts| {
                let col = counts[0] + counts[1];
                (0..2)
                    .map(|r| {
                        let expected = rows[r] * col / total;
                        (counts[r] - expected).powi(2) / expected
                    })
                    .sum::<f64>()
            })
            .sum();

        (chi2, table.len().saturating_sub(1))
    }
}

impl Default for ChiSquareTest {
    fn default() -> Self {
        Self::new(0.05)
    }
}

impl DriftDetector for ChiSquareTest {
    type Value = String;

    fn stattest_name(&self) -> &'static str {
        "chi-square p_value"
    }

    fn detect(&self, reference: &[String], current: &[String]) -> Result<DriftResult> {
        if reference.is_empty() || current.is_empty() {
            return Err(SensorFaultError::ValidationError(
                "Empty samples provided".to_string(),
            ));
        }

        let (chi2, dof) = Self::statistic(reference, current);
        if dof == 0 {
            // One shared category, the distributions cannot differ
            return Ok(DriftResult::from_p_value(0.0, 1.0, self.alpha));
        }

        let dist = ChiSquared::new(dof as f64)
            .map_err(|e| SensorFaultError::DataError(format!("chi-square: {}", e)))?;
        let p = (1.0 - dist.cdf(chi2)).clamp(0.0, 1.0);
        Ok(DriftResult::from_p_value(chi2, p, self.alpha))
    }

    fn threshold(&self) -> f64 {
        self.alpha
    }
}
