//! Sensor fault classification pipeline
//!
//! Batch training for a sensor-fault classifier:
//! - Ingestion of raw sensor records and a seeded train/test split
//! - Schema validation and train/test drift detection
//! - Robust feature scaling, label encoding and SMOTE-Tomek rebalancing
//! - Grid-searched model selection with a minimum-score gate
//!
//! # Modules
//!
//! ## Stages
//! - [`ingestion`] - Data sources and the train/test split
//! - [`validation`] - Schema document and the validation stage
//! - [`preprocessing`] - Feature transform, label encoder, transformation stage
//! - [`training`] - Candidate classifiers, model search, trainer stage
//! - [`pipeline`] - Orchestrator running the stages in order
//!
//! ## Algorithms
//! - [`drift`] - Kolmogorov-Smirnov and chi-square drift tests
//! - [`synthetic`] - SMOTE, Tomek links and their combination
//!
//! ## Serving
//! - [`estimator`] - Packaged model, artifact store and model resolver
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Configuration and artifacts
pub mod config;
pub mod entity;

// Stages
pub mod ingestion;
pub mod validation;
pub mod preprocessing;
pub mod training;
pub mod pipeline;

// Algorithms
pub mod drift;
pub mod synthetic;

// Serving
pub mod estimator;

// Utilities
pub mod utils;
pub mod logging;
pub mod cli;

pub use error::{SensorFaultError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{PipelineStage, SensorFaultError, Result};

    // Configuration
    pub use crate::config::{
        DataIngestionConfig, DataTransformationConfig, DataValidationConfig, ModelTrainerConfig,
        TrainingPipelineConfig,
    };
    pub use crate::entity::{
        ClassificationMetricArtifact, DataIngestionArtifact, DataTransformationArtifact,
        DataValidationArtifact, ModelTrainerArtifact,
    };

    // Stages
    pub use crate::ingestion::{CsvDataSource, DataIngestion, DataSource};
    pub use crate::validation::{DataValidation, Schema};
    pub use crate::preprocessing::{DataTransformation, FittedTransform, LabelEncoder, TransformPipeline};
    pub use crate::training::{Classifier, Model, ModelKind, ModelSearchConfig, ModelSelector, ModelTrainer};
    pub use crate::pipeline::{PipelineOutcome, StageConfigs, TrainPipeline};

    // Drift detection
    pub use crate::drift::{DatasetDriftDetector, DriftConfig, DriftReport};

    // Synthetic data
    pub use crate::synthetic::{Sampler, SmoteTomek, SMOTE, TomekLinks};

    // Serving
    pub use crate::estimator::{ArtifactStore, LocalArtifactStore, ModelResolver, SensorFaultModel};
}
