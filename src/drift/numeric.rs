//! Numeric column drift

use crate::drift::{DriftDetector, DriftResult};
use crate::error::{SensorFaultError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Two-sample Kolmogorov-Smirnov test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KolmogorovSmirnovTest {
    /// Significance level (alpha)
    alpha: f64,
}

impl KolmogorovSmirnovTest {
    /// Create new KS test
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    /// Largest gap between the two empirical CDFs
    pub fn statistic(reference: &[f64], current: &[f64]) -> f64 {
        let mut a: Vec<f64> = reference.iter().copied().filter(|v| !v.is_nan()).collect();
        let mut b: Vec<f64> = current.iter().copied().filter(|v| !v.is_nan()).collect();
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        a.sort_by(|x, y| x.partial_cmp(y).unwrap_or(Ordering::Equal));
        b.sort_by(|x, y| x.partial_cmp(y).unwrap_or(Ordering::Equal));

        let (n1, n2) = (a.len() as f64, b.len() as f64);
        let (mut i, mut j) = (0, 0);
        let mut d: f64 = 0.0;

        // Walk both sorted samples, stepping past ties together
        while i < a.len() && j < b.len() {
            let x = a[i].min(b[j]);
            while i < a.len() && a[i] <= x {
                i += 1;
            }
            while j < b.len() && b[j] <= x {
                j += 1;
            }
            d = d.max((i as f64 / n1 - j as f64 / n2).abs());
        }
        d
    }

    /// Asymptotic p-value for statistic `d` with sample sizes `n1`, `n2`
    pub fn p_value(d: f64, n1: usize, n2: usize) -> f64 {
        let ne = (n1 * n2) as f64 / (n1 + n2) as f64;
        let sqrt_ne = ne.sqrt();
        kolmogorov_q((sqrt_ne + 0.12 + 0.11 / sqrt_ne) * d)
    }
}

impl Default for KolmogorovSmirnovTest {
    fn default() -> Self {
        Self::new(0.05)
    }
}

/// Survival function of the Kolmogorov distribution
fn kolmogorov_q(lambda: f64) -> f64 {
    if lambda < 0.2 {
        return 1.0;
    }
    let a2 = -2.0 * lambda * lambda;
    let mut sign = 1.0;
    let mut sum = 0.0;
    let mut prev_term: f64 = 0.0;

    for j in 1..=100 {
        let j = j as f64;
        let term = sign * 2.0 * (a2 * j * j).exp();
        sum += term;
        if term.abs() <= 1e-10 * prev_term.abs() || term.abs() <= 1e-16 * sum.abs() {
            return sum.clamp(0.0, 1.0);
        }
        sign = -sign;
        prev_term = term;
    }
    // No convergence only happens for tiny lambda
    1.0
}

impl DriftDetector for KolmogorovSmirnovTest {
    type Value = f64;

    fn stattest_name(&self) -> &'static str {
        "K-S p_value"
    }

    fn detect(&self, reference: &[f64], current: &[f64]) -> Result<DriftResult> {
        if reference.is_empty() || current.is_empty() {
            return Err(SensorFaultError::ValidationError(
                "Empty samples provided".to_string(),
            ));
        }

        let d = Self::statistic(reference, current);
        let p = Self::p_value(d, reference.len(), current.len());
        Ok(DriftResult::from_p_value(d, p, self.alpha))
    }

    fn threshold(&self) -> f64 {
        self.alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_samples_no_drift() {
        let data: Vec<f64> = (0..200).map(|i| (i as f64 * 0.37).sin()).collect();
        let result = KolmogorovSmirnovTest::default().detect(&data, &data).unwrap();
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
        assert!(!result.drift_detected);
    }

    #[test]
    fn test_shifted_samples_drift() {
        // Integers keep the overlapping half exactly tied
        let reference: Vec<f64> = (0..200).map(f64::from).collect();
        let current: Vec<f64> = (100..300).map(f64::from).collect();
        let result = KolmogorovSmirnovTest::default().detect(&reference, &current).unwrap();

        assert!((result.statistic - 0.5).abs() < 1e-9);
        assert!(result.p_value < 1e-6);
        assert!(result.drift_detected);
    }

    #[test]
    fn test_statistic_with_ties() {
        let d = KolmogorovSmirnovTest::statistic(&[1.0, 1.0, 2.0, 2.0], &[1.0, 2.0, 2.0, 2.0]);
        assert!((d - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_kolmogorov_q_known_values() {
        // Q(1.36) is the classic 5% critical point
        assert!((kolmogorov_q(1.36) - 0.049).abs() < 0.002);
        assert!((kolmogorov_q(1.0) - 0.27).abs() < 0.005);
        assert_eq!(kolmogorov_q(0.0), 1.0);
    }

    #[test]
    fn test_empty_rejected() {
        assert!(KolmogorovSmirnovTest::default().detect(&[], &[1.0]).is_err());
    }
}
