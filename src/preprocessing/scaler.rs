//! Robust feature scaling

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Parameters of one fitted column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    /// Median
    pub center: f64,
    /// Interquartile range, 1.0 when degenerate
    pub scale: f64,
}

impl ScalerParams {
    pub fn scale_value(&self, x: f64) -> f64 {
        (x - self.center) / self.scale
    }

    pub fn unscale_value(&self, x: f64) -> f64 {
        x * self.scale + self.center
    }
}

/// Median / IQR scaler, resistant to sensor spikes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RobustScaler;

impl RobustScaler {
    /// Compute parameters for one column of imputed values
    pub fn fit_column(&self, values: &[f64]) -> ScalerParams {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let center = quantile(&sorted, 0.5);
        let iqr = quantile(&sorted, 0.75) - quantile(&sorted, 0.25);
        let scale = if iqr == 0.0 || !iqr.is_finite() { 1.0 } else { iqr };

        ScalerParams {
            center: if center.is_finite() { center } else { 0.0 },
            scale,
        }
    }

    pub fn transform_column(&self, values: &[f64], params: &ScalerParams) -> Vec<f64> {
        values.iter().map(|&x| params.scale_value(x)).collect()
    }
}

/// Linear-interpolated quantile of sorted data; 0.0 for empty input
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = pos.floor() as usize;
            let upper = pos.ceil() as usize;
            let frac = pos - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * frac
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_interpolation() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert!((quantile(&data, 0.5) - 2.5).abs() < 1e-12);
        assert!((quantile(&data, 0.25) - 1.75).abs() < 1e-12);
        assert!((quantile(&data, 0.75) - 3.25).abs() < 1e-12);
        assert_eq!(quantile(&[], 0.5), 0.0);
        assert_eq!(quantile(&[7.0], 0.9), 7.0);
    }

    #[test]
    fn test_robust_params_ignore_outlier() {
        let scaler = RobustScaler;
        let params = scaler.fit_column(&[1.0, 2.0, 3.0, 4.0, 5.0, 10_000.0]);
        assert!((params.center - 3.5).abs() < 1e-12);
        assert!(params.scale < 10.0);

        let scaled = scaler.transform_column(&[3.5], &params);
        assert_eq!(scaled, vec![0.0]);
    }

    #[test]
    fn test_constant_column_scale_is_one() {
        let params = RobustScaler.fit_column(&[4.0, 4.0, 4.0]);
        assert_eq!(params.center, 4.0);
        assert_eq!(params.scale, 1.0);
        assert_eq!(params.unscale_value(params.scale_value(9.0)), 9.0);
    }
}
