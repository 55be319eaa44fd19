//! Error types for the sensor fault pipeline

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, SensorFaultError>;

/// Pipeline stage an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    DataIngestion,
    DataValidation,
    DataTransformation,
    ModelTrainer,
    Prediction,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::DataIngestion => "data_ingestion",
            PipelineStage::DataValidation => "data_validation",
            PipelineStage::DataTransformation => "data_transformation",
            PipelineStage::ModelTrainer => "model_trainer",
            PipelineStage::Prediction => "prediction",
        };
        f.write_str(name)
    }
}

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum SensorFaultError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Unseen label '{label}' in column '{column}'")]
    UnseenLabel { column: String, label: String },

    #[error("Candidate '{candidate}' cannot be cross-validated: {reason}")]
    InsufficientSamples { candidate: String, reason: String },

    #[error("No model reached the expected score {expected:.4}: best was '{best_model}' with {best_score:.4}")]
    NoAcceptableModel {
        best_model: String,
        best_score: f64,
        expected: f64,
    },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("[{stage}::{operation}] {source}")]
    Stage {
        stage: PipelineStage,
        operation: String,
        #[source]
        source: Box<SensorFaultError>,
    },
}

impl SensorFaultError {
    /// Innermost error, skipping stage context wrappers
    pub fn root(&self) -> &SensorFaultError {
        match self {
            SensorFaultError::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<polars::error::PolarsError> for SensorFaultError {
    fn from(err: polars::error::PolarsError) -> Self {
        SensorFaultError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for SensorFaultError {
    fn from(err: serde_json::Error) -> Self {
        SensorFaultError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for SensorFaultError {
    fn from(err: serde_yaml::Error) -> Self {
        SensorFaultError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for SensorFaultError {
    fn from(err: bincode::Error) -> Self {
        SensorFaultError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for SensorFaultError {
    fn from(err: ndarray::ShapeError) -> Self {
        SensorFaultError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

/// Attach stage/operation context to errors leaving a pipeline stage
pub trait StageContext<T> {
    fn stage(self, stage: PipelineStage, operation: &str) -> Result<T>;
}

impl<T, E: Into<SensorFaultError>> StageContext<T> for std::result::Result<T, E> {
    fn stage(self, stage: PipelineStage, operation: &str) -> Result<T> {
        self.map_err(|e| SensorFaultError::Stage {
            stage,
            operation: operation.to_string(),
            source: Box::new(e.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SensorFaultError::DataError("test error".to_string());
        assert_eq!(err.to_string(), "Data error: test error");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SensorFaultError = io_err.into();
        assert!(matches!(err, SensorFaultError::IoError(_)));
    }

    #[test]
    fn test_stage_context_names_stage_and_operation() {
        let res: Result<()> = Err(SensorFaultError::UnseenLabel {
            column: "class".to_string(),
            label: "unknown".to_string(),
        });
        let err = res
            .stage(PipelineStage::DataTransformation, "encode_labels")
            .unwrap_err();

        let msg = err.to_string();
        assert!(msg.starts_with("[data_transformation::encode_labels]"));
        assert!(msg.contains("unknown"));
        assert!(matches!(err.root(), SensorFaultError::UnseenLabel { .. }));
    }
}
