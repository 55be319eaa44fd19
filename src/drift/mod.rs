//! Drift detection module
//!
//! Compares a reference and a current table column by column and aggregates
//! the per-column verdicts into a dataset-level drift report.

mod numeric;
mod categorical;
mod report;

pub use numeric::KolmogorovSmirnovTest;
pub use categorical::ChiSquareTest;
pub use report::{ColumnDriftResult, DatasetDriftDetector, DriftReport};

use crate::error::{Result, SensorFaultError};
use serde::{Deserialize, Serialize};

/// Drift detection result for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftResult {
    /// Whether drift was detected
    pub drift_detected: bool,
    /// Test statistic
    pub statistic: f64,
    /// P-value of the test
    pub p_value: f64,
    /// Significance level used
    pub threshold: f64,
}

impl DriftResult {
    /// Verdict for a p-value at significance `threshold`
    pub fn from_p_value(statistic: f64, p_value: f64, threshold: f64) -> Self {
        Self {
            drift_detected: p_value < threshold,
            statistic,
            p_value,
            threshold,
        }
    }
}

/// Trait for per-column two-sample drift tests
pub trait DriftDetector: Send + Sync {
    /// Sample element type
    type Value;

    /// Name written to the drift report
    fn stattest_name(&self) -> &'static str;

    /// Detect drift between reference and current samples
    fn detect(&self, reference: &[Self::Value], current: &[Self::Value]) -> Result<DriftResult>;

    /// Significance level
    fn threshold(&self) -> f64;
}

/// Drift detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftConfig {
    /// Per-column significance level
    pub significance: f64,
    /// Dataset drifts when the drifted share of compared columns exceeds this
    pub drift_share: f64,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            significance: 0.05,
            drift_share: 0.5,
        }
    }
}

impl DriftConfig {
    /// Builder method to set the per-column significance level
    pub fn with_significance(mut self, alpha: f64) -> Self {
        self.significance = alpha;
        self
    }

    /// Builder method to set the dataset drift share
    pub fn with_drift_share(mut self, share: f64) -> Self {
        self.drift_share = share;
        self
    }

    /// Reject settings that would make every verdict meaningless
    pub fn validate(&self) -> Result<()> {
        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(SensorFaultError::InvalidParameter {
                name: "significance".to_string(),
                value: self.significance.to_string(),
                reason: "must lie strictly between 0 and 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.drift_share) {
            return Err(SensorFaultError::InvalidParameter {
                name: "drift_share".to_string(),
                value: self.drift_share.to_string(),
                reason: "must lie between 0 and 1".to_string(),
            });
        }
        Ok(())
    }
}
