//! Data validation stage
//!
//! Checks both ingested splits against the schema document and, when they
//! conform, measures drift from train (reference) to test (current).

pub mod schema;

pub use schema::{missing_columns, mismatched_types, validate_column_count, ColumnSpec, Schema};

use crate::config::DataValidationConfig;
use crate::drift::{DatasetDriftDetector, DriftReport};
use crate::entity::{DataIngestionArtifact, DataValidationArtifact};
use crate::error::{PipelineStage, Result, StageContext};
use crate::utils::read_csv;
use polars::prelude::*;
use tracing::{info, warn};

const STAGE: PipelineStage = PipelineStage::DataValidation;

/// Validation messages accumulated over both splits
fn schema_failures(df: &DataFrame, schema: &Schema, split: &str, strict: bool) -> String {
    let mut message = String::new();

    if !validate_column_count(df, schema) {
        message.push_str(&format!("Columns are missing in {} dataframe. ", split));
    }

    if strict {
        let missing = missing_columns(df, schema);
        if !missing.is_empty() {
            message.push_str(&format!(
                "Expected columns absent from {} dataframe: {}. ",
                split,
                missing.join(", ")
            ));
        }
        let mismatched = mismatched_types(df, schema);
        if !mismatched.is_empty() {
            message.push_str(&format!(
                "Column types differ in {} dataframe: {}. ",
                split,
                mismatched.join(", ")
            ));
        }
    }

    message
}

pub struct DataValidation {
    ingestion_artifact: DataIngestionArtifact,
    config: DataValidationConfig,
    schema: Schema,
}

impl DataValidation {
    /// Load the schema document up front; a missing or malformed document
    /// is a configuration error.
    pub fn new(ingestion_artifact: DataIngestionArtifact, config: DataValidationConfig) -> Result<Self> {
        let schema = Schema::from_yaml_file(&config.schema_file_path).stage(STAGE, "load_schema")?;
        Ok(Self::with_schema(ingestion_artifact, config, schema))
    }

    pub fn with_schema(
        ingestion_artifact: DataIngestionArtifact,
        config: DataValidationConfig,
        schema: Schema,
    ) -> Self {
        Self {
            ingestion_artifact,
            config,
            schema,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Drift between the two splits; the report is written before returning
    pub fn detect_dataset_drift(&self, reference: &DataFrame, current: &DataFrame) -> Result<DriftReport> {
        let report = DatasetDriftDetector::new(self.config.drift.clone()).detect(reference, current)?;
        report.save(&self.config.drift_report_file_path)?;
        Ok(report)
    }

    pub fn initiate_data_validation(&self) -> Result<DataValidationArtifact> {
        info!("Entered data validation");

        let train_df = read_csv(&self.ingestion_artifact.trained_file_path).stage(STAGE, "read_train")?;
        let test_df = read_csv(&self.ingestion_artifact.test_file_path).stage(STAGE, "read_test")?;

        let strict = self.config.strict_schema;
        let mut message = schema_failures(&train_df, &self.schema, "training", strict);
        message.push_str(&schema_failures(&test_df, &self.schema, "test", strict));

        if !message.is_empty() {
            warn!(%message, "Data validation failed");
            return Ok(DataValidationArtifact {
                validation_status: false,
                message,
                drift_status: None,
                drift_report_file_path: None,
            });
        }

        let report = self
            .detect_dataset_drift(&train_df, &test_df)
            .stage(STAGE, "detect_dataset_drift")?;

        if report.dataset_drift {
            warn!(
                drifted = report.number_of_drifted_columns,
                columns = report.number_of_columns,
                "Dataset drift detected between train and test"
            );
        } else {
            info!(
                drifted = report.number_of_drifted_columns,
                columns = report.number_of_columns,
                "No dataset drift"
            );
        }

        Ok(DataValidationArtifact {
            validation_status: true,
            message,
            drift_status: Some(report.dataset_drift),
            drift_report_file_path: Some(self.config.drift_report_file_path.clone()),
        })
    }
}
