//! Dataset drift detection and report

use crate::drift::{ChiSquareTest, DriftConfig, DriftDetector, DriftResult, KolmogorovSmirnovTest};
use crate::error::{SensorFaultError, Result};
use crate::preprocessing::{column_kind, label_values, numeric_values, ColumnKind};
use crate::utils::write_yaml_file;
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Per-column entry of the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDriftResult {
    /// `num` or `cat`
    pub column_type: String,
    pub stattest_name: String,
    pub stattest_threshold: f64,
    /// P-value of the test
    pub drift_score: f64,
    pub drift_detected: bool,
}

/// Structured drift report, persisted verbatim as YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub number_of_columns: usize,
    pub number_of_drifted_columns: usize,
    pub share_of_drifted_columns: f64,
    pub dataset_drift: bool,
    pub drift_share: f64,
    pub drift_by_columns: BTreeMap<String, ColumnDriftResult>,
    /// Columns that could not be compared, with the reason
    pub skipped_columns: Vec<String>,
}

impl DriftReport {
    /// Write the report, replacing any previous one
    pub fn save(&self, path: &Path) -> Result<()> {
        write_yaml_file(path, self, true)
    }

    pub fn drifted_columns(&self) -> Vec<&str> {
        self.drift_by_columns
            .iter()
            .filter(|(_, r)| r.drift_detected)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

enum ColumnOutcome {
    Compared(String, ColumnDriftResult),
    Skipped(String),
}

/// Runs one test per shared column and aggregates the verdicts
#[derive(Debug, Clone, Default)]
pub struct DatasetDriftDetector {
    config: DriftConfig,
}

impl DatasetDriftDetector {
    pub fn new(config: DriftConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DriftConfig {
        &self.config
    }

    /// Compare `current` against `reference`.
    ///
    /// Columns are compared in reference order; the result equals a
    /// sequential run.
    pub fn detect(&self, reference: &DataFrame, current: &DataFrame) -> Result<DriftReport> {
        self.config.validate()?;

        let shared: Vec<String> = reference
            .get_column_names()
            .into_iter()
            .filter(|name| current.column(name.as_str()).is_ok())
            .map(|name| name.to_string())
            .collect();

        let outcomes: Vec<ColumnOutcome> = shared
            .par_iter()
            .map(|name| self.compare_column(reference, current, name))
            .collect();

        let mut drift_by_columns = BTreeMap::new();
        let mut skipped_columns = Vec::new();
        for outcome in outcomes {
            match outcome {
                ColumnOutcome::Compared(name, result) => {
                    drift_by_columns.insert(name, result);
                }
                ColumnOutcome::Skipped(reason) => {
                    warn!(reason = %reason, "Skipping column in drift detection");
                    skipped_columns.push(reason);
                }
            }
        }

        let number_of_columns = drift_by_columns.len();
        if number_of_columns == 0 {
            return Err(SensorFaultError::DataError(
                "no columns could be compared for drift".to_string(),
            ));
        }

        let number_of_drifted_columns = drift_by_columns
            .values()
            .filter(|r| r.drift_detected)
            .count();
        let share_of_drifted_columns = number_of_drifted_columns as f64 / number_of_columns as f64;

        debug!(
            number_of_columns,
            number_of_drifted_columns,
            skipped = skipped_columns.len(),
            "Computed drift report"
        );

        Ok(DriftReport {
            number_of_columns,
            number_of_drifted_columns,
            share_of_drifted_columns,
            dataset_drift: share_of_drifted_columns > self.config.drift_share,
            drift_share: self.config.drift_share,
            drift_by_columns,
            skipped_columns,
        })
    }

    fn compare_column(&self, reference: &DataFrame, current: &DataFrame, name: &str) -> ColumnOutcome {
        let kind = match reference.column(name) {
            Ok(column) => column_kind(column.dtype()),
            Err(_) => ColumnKind::Unknown,
        };

        let result = match kind {
            ColumnKind::Numeric => {
                let test = KolmogorovSmirnovTest::new(self.config.significance);
                numeric_sample(reference, name)
                    .and_then(|r| Ok((r, numeric_sample(current, name)?)))
                    .and_then(|(r, c)| run_test(&test, &r, &c, name))
                    .map(|res| to_column_result(&test, "num", res))
            }
            ColumnKind::Categorical => {
                let test = ChiSquareTest::new(self.config.significance);
                label_sample(reference, name)
                    .and_then(|r| Ok((r, label_sample(current, name)?)))
                    .and_then(|(r, c)| run_test(&test, &r, &c, name))
                    .map(|res| to_column_result(&test, "cat", res))
            }
            ColumnKind::Unknown => Err(SensorFaultError::DataError(format!(
                "{}: unsupported dtype",
                name
            ))),
        };

        match result {
            Ok(r) => ColumnOutcome::Compared(name.to_string(), r),
            Err(SensorFaultError::DataError(reason)) => ColumnOutcome::Skipped(reason),
            Err(e) => ColumnOutcome::Skipped(format!("{}: {}", name, e)),
        }
    }
}

fn numeric_sample(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    Ok(numeric_values(df, name)?
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .collect())
}

fn label_sample(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    Ok(label_values(df, name)?.into_iter().flatten().collect())
}

fn run_test<T: DriftDetector>(
    test: &T,
    reference: &[T::Value],
    current: &[T::Value],
    name: &str,
) -> Result<DriftResult> {
    if reference.is_empty() || current.is_empty() {
        return Err(SensorFaultError::DataError(format!(
            "{}: all values missing",
            name
        )));
    }
    test.detect(reference, current)
}

fn to_column_result<T: DriftDetector>(test: &T, column_type: &str, result: DriftResult) -> ColumnDriftResult {
    ColumnDriftResult {
        column_type: column_type.to_string(),
        stattest_name: test.stattest_name().to_string(),
        stattest_threshold: test.threshold(),
        drift_score: result.p_value,
        drift_detected: result.drift_detected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(offset: f64, pos_share: usize) -> DataFrame {
        let n = 100;
        let a: Vec<f64> = (0..n).map(|i| i as f64 + offset).collect();
        let b: Vec<i64> = (0..n).map(|i| (i % 7) as i64).collect();
        let class: Vec<&str> = (0..n).map(|i| if i < pos_share { "pos" } else { "neg" }).collect();
        df!("a" => a, "b" => b, "class" => class).unwrap()
    }

    #[test]
    fn test_identical_tables_no_drift() {
        let df = table(0.0, 10);
        let report = DatasetDriftDetector::default().detect(&df, &df).unwrap();
        assert_eq!(report.number_of_columns, 3);
        assert_eq!(report.number_of_drifted_columns, 0);
        assert!(!report.dataset_drift);
        assert_eq!(report.drift_by_columns["class"].column_type, "cat");
    }

    #[test]
    fn test_majority_drift_flags_dataset() {
        let reference = table(0.0, 10);
        let current = table(80.0, 70);
        let report = DatasetDriftDetector::default().detect(&reference, &current).unwrap();

        assert_eq!(report.drifted_columns(), vec!["a", "class"]);
        assert_eq!(report.number_of_drifted_columns, 2);
        assert!(report.dataset_drift);
    }

    #[test]
    fn test_half_drift_is_not_dataset_drift() {
        let reference = df!("a" => (0..50).map(f64::from).collect::<Vec<_>>(),
                            "b" => (0..50).map(f64::from).collect::<Vec<_>>())
        .unwrap();
        let current = df!("a" => (100..150).map(f64::from).collect::<Vec<_>>(),
                          "b" => (0..50).map(f64::from).collect::<Vec<_>>())
        .unwrap();
        let report = DatasetDriftDetector::default().detect(&reference, &current).unwrap();
        assert_eq!(report.share_of_drifted_columns, 0.5);
        assert!(!report.dataset_drift);
    }

    #[test]
    fn test_all_null_column_skipped() {
        let reference = df!("a" => &[1.0, 2.0, 3.0], "empty" => &[None::<f64>, None, None]).unwrap();
        let report = DatasetDriftDetector::default().detect(&reference, &reference).unwrap();
        assert_eq!(report.number_of_columns, 1);
        assert_eq!(report.skipped_columns.len(), 1);
        assert!(report.skipped_columns[0].starts_with("empty"));
    }

    #[test]
    fn test_nothing_comparable_fails() {
        let reference = df!("x" => &[1.0]).unwrap();
        let current = df!("y" => &[1.0]).unwrap();
        assert!(matches!(
            DatasetDriftDetector::default().detect(&reference, &current),
            Err(SensorFaultError::DataError(_))
        ));
    }

    #[test]
    fn test_out_of_range_significance_rejected() {
        let df = table(0.0, 10);
        for alpha in [0.0, 1.0, 1.5, f64::NAN] {
            let detector = DatasetDriftDetector::new(DriftConfig::default().with_significance(alpha));
            assert!(matches!(
                detector.detect(&df, &df),
                Err(SensorFaultError::InvalidParameter { ref name, .. }) if name == "significance"
            ));
        }
        let detector = DatasetDriftDetector::new(DriftConfig::default().with_drift_share(1.2));
        assert!(detector.detect(&df, &df).is_err());
    }

    #[test]
    fn test_significance_used_as_given() {
        assert_eq!(KolmogorovSmirnovTest::new(0.8).threshold(), 0.8);
        assert_eq!(ChiSquareTest::new(0.0001).threshold(), 0.0001);
    }

    #[test]
    fn test_report_saved_as_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drift_report/report.yaml");
        let df = table(0.0, 10);
        let report = DatasetDriftDetector::default().detect(&df, &df).unwrap();
        report.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("number_of_columns: 3"));
        assert!(text.contains("dataset_drift: false"));
        let back: DriftReport = crate::utils::read_yaml_file(&path).unwrap();
        assert_eq!(back, report);
    }
}
