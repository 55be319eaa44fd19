//! Missing value imputation

use serde::{Deserialize, Serialize};

/// Replaces every missing value with one fixed constant, whatever the
/// column's distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantImputer {
    fill_value: f64,
}

impl Default for ConstantImputer {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl ConstantImputer {
    pub fn new(fill_value: f64) -> Self {
        Self { fill_value }
    }

    pub fn fill_value(&self) -> f64 {
        self.fill_value
    }

    /// Fill nulls and NaNs
    pub fn impute(&self, values: &[Option<f64>]) -> Vec<f64> {
        values
            .iter()
            .map(|v| match v {
                Some(x) if !x.is_nan() => *x,
                _ => self.fill_value,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_fill() {
        let imputer = ConstantImputer::default();
        let out = imputer.impute(&[Some(1.0), None, Some(f64::NAN), Some(-2.5)]);
        assert_eq!(out, vec![1.0, 0.0, 0.0, -2.5]);
    }

    #[test]
    fn test_custom_fill_value() {
        let imputer = ConstantImputer::new(-1.0);
        assert_eq!(imputer.impute(&[None, None]), vec![-1.0, -1.0]);
    }
}
