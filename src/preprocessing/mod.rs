//! Feature preprocessing
//!
//! Provides the pieces of the data-transformation stage:
//! - Constant imputation of missing feature values
//! - Robust scaling (median / interquartile range)
//! - The fit-once feature transform pipeline
//! - Target label encoding

mod imputer;
mod scaler;
mod pipeline;
mod encoder;
pub mod transformation;

pub use imputer::ConstantImputer;
pub use scaler::{quantile, RobustScaler, ScalerParams};
pub use pipeline::{FittedTransform, TransformPipeline};
pub use encoder::LabelEncoder;
pub use transformation::DataTransformation;

use crate::error::{SensorFaultError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Column kind as seen by validation and drift detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Unknown,
}

/// Classify a polars dtype
pub fn column_kind(dtype: &DataType) -> ColumnKind {
    match dtype {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Float32
        | DataType::Float64 => ColumnKind::Numeric,
        DataType::String | DataType::Boolean => ColumnKind::Categorical,
        _ => ColumnKind::Unknown,
    }
}

/// Read a column as optional `f64` values.
///
/// String columns are parsed; a value that fails to parse is an error
/// naming the column rather than a silent null.
pub fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| SensorFaultError::DataError(format!("column '{}' not found", name)))?;
    let series = column.as_materialized_series();
    let nulls_before = series.null_count();

    let cast = series.cast(&DataType::Float64)?;
    if cast.null_count() > nulls_before {
        return Err(SensorFaultError::DataError(format!(
            "column '{}' contains non-numeric values",
            name
        )));
    }

    Ok(cast.f64()?.into_iter().collect())
}

/// Read a column as optional string values
pub fn label_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| SensorFaultError::DataError(format!("column '{}' not found", name)))?;
    let cast = column.as_materialized_series().cast(&DataType::String)?;
    Ok(cast
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_kind() {
        assert_eq!(column_kind(&DataType::Int64), ColumnKind::Numeric);
        assert_eq!(column_kind(&DataType::Float32), ColumnKind::Numeric);
        assert_eq!(column_kind(&DataType::String), ColumnKind::Categorical);
        assert_eq!(column_kind(&DataType::Boolean), ColumnKind::Categorical);
        assert_eq!(column_kind(&DataType::Date), ColumnKind::Unknown);
    }

    #[test]
    fn test_numeric_values_parses_strings() {
        let df = df!(
            "a" => &[Some("1.5"), None, Some("3")],
            "b" => &["x", "2", "3"]
        )
        .unwrap();

        assert_eq!(numeric_values(&df, "a").unwrap(), vec![Some(1.5), None, Some(3.0)]);
        let err = numeric_values(&df, "b").unwrap_err();
        assert!(err.to_string().contains("'b'"));
        assert!(numeric_values(&df, "c").is_err());
    }

    #[test]
    fn test_label_values() {
        let df = df!("class" => &["neg", "pos"], "code" => &[0i32, 1]).unwrap();
        assert_eq!(
            label_values(&df, "class").unwrap(),
            vec![Some("neg".to_string()), Some("pos".to_string())]
        );
        assert_eq!(label_values(&df, "code").unwrap()[1].as_deref(), Some("1"));
    }
}
