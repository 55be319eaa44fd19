//! Stage artifacts
//!
//! Artifacts are the only channel between stages: each stage returns one
//! after its outputs are fully written, and the next stage reads its inputs
//! from the recorded paths.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataIngestionArtifact {
    pub trained_file_path: PathBuf,
    pub test_file_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValidationArtifact {
    pub validation_status: bool,
    /// Accumulated human-readable validation failures (empty when valid)
    pub message: String,
    /// Dataset-level drift verdict; `None` when validation failed
    pub drift_status: Option<bool>,
    /// Written only when validation passed
    pub drift_report_file_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTransformationArtifact {
    pub transformer_object_file_path: PathBuf,
    pub label_encoder_object_file_path: PathBuf,
    pub transformed_train_file_path: PathBuf,
    pub transformed_test_file_path: PathBuf,
}

/// Held-out classification metrics of the selected model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetricArtifact {
    pub accuracy: f64,
    pub f1_score: f64,
    pub precision_score: f64,
    pub recall_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTrainerArtifact {
    pub trained_model_file_path: PathBuf,
    pub metric_artifact: ClassificationMetricArtifact,
    pub best_model_name: String,
    /// Mean cross-validated score of the selected model
    pub best_score: f64,
}
