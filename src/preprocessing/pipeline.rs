//! Fit-once feature transform pipeline

use super::{numeric_values, ConstantImputer, RobustScaler, ScalerParams};
use crate::error::{SensorFaultError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// Unfitted imputation + robust scaling pipeline
#[derive(Debug, Clone, Default)]
pub struct TransformPipeline {
    imputer: ConstantImputer,
    scaler: RobustScaler,
}

impl TransformPipeline {
    pub fn new(fill_value: f64) -> Self {
        Self {
            imputer: ConstantImputer::new(fill_value),
            scaler: RobustScaler,
        }
    }

    /// Fit on training features. Every column of `features` becomes a feature.
    pub fn fit(&self, features: &DataFrame) -> Result<FittedTransform> {
        let start = Instant::now();

        let feature_names: Vec<String> = features
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();
        if feature_names.is_empty() {
            return Err(SensorFaultError::DataError(
                "no feature columns to fit".to_string(),
            ));
        }
        if features.height() == 0 {
            return Err(SensorFaultError::DataError(
                "cannot fit transform on an empty table".to_string(),
            ));
        }

        let params = feature_names
            .par_iter()
            .map(|name| {
                let imputed = self.imputer.impute(&numeric_values(features, name)?);
                Ok(self.scaler.fit_column(&imputed))
            })
            .collect::<Result<Vec<ScalerParams>>>()?;

        debug!(
            n_features = feature_names.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fitted feature transform"
        );

        Ok(FittedTransform {
            feature_names,
            imputer: self.imputer,
            scaler: self.scaler,
            params,
        })
    }
}

/// Imputation and scaling parameters learned from the training split.
/// Immutable after fitting; `apply` never touches the parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedTransform {
    feature_names: Vec<String>,
    imputer: ConstantImputer,
    scaler: RobustScaler,
    params: Vec<ScalerParams>,
}

impl FittedTransform {
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn params(&self) -> &[ScalerParams] {
        &self.params
    }

    /// Impute and scale `df` into a dense matrix. Columns are selected by the
    /// fitted names, so extra columns (such as the target) are ignored.
    pub fn apply(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let columns = self
            .feature_names
            .par_iter()
            .zip(self.params.par_iter())
            .map(|(name, params)| {
                let imputed = self.imputer.impute(&numeric_values(df, name)?);
                Ok(self.scaler.transform_column(&imputed, params))
            })
            .collect::<Result<Vec<Vec<f64>>>>()?;

        let mut out = Array2::zeros((df.height(), self.n_features()));
        for (j, column) in columns.into_iter().enumerate() {
            out.column_mut(j).assign(&Array1::from(column));
        }
        Ok(out)
    }
}
