//! Pipeline configuration
//!
//! Every stage gets its own config struct whose file paths hang off the
//! timestamped artifact directory of a [`TrainingPipelineConfig`].

pub mod constants;

use crate::drift::DriftConfig;
use chrono::{DateTime, Local};
use constants::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration of one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingPipelineConfig {
    pub pipeline_name: String,
    /// `<artifact root>/<timestamp>`
    pub artifact_dir: PathBuf,
    pub timestamp: String,
    /// Schema document shared by validation and transformation
    pub schema_file_path: PathBuf,
    pub target_column: String,
}

impl Default for TrainingPipelineConfig {
    fn default() -> Self {
        Self::new(ARTIFACT_DIR, Local::now())
    }
}

impl TrainingPipelineConfig {
    /// Create a config rooted at `artifact_root`, stamped with `timestamp`
    pub fn new(artifact_root: impl AsRef<Path>, timestamp: DateTime<Local>) -> Self {
        let timestamp = timestamp.format("%m_%d_%Y_%H_%M_%S").to_string();
        Self {
            pipeline_name: PIPELINE_NAME.to_string(),
            artifact_dir: artifact_root.as_ref().join(&timestamp),
            timestamp,
            schema_file_path: PathBuf::from(SCHEMA_FILE_PATH),
            target_column: TARGET_COLUMN.to_string(),
        }
    }

    /// Builder method to set the schema document path
    pub fn with_schema_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_file_path = path.into();
        self
    }

    /// Builder method to set the target column
    pub fn with_target_column(mut self, target: impl Into<String>) -> Self {
        self.target_column = target.into();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataIngestionConfig {
    pub data_ingestion_dir: PathBuf,
    pub feature_store_file_path: PathBuf,
    pub training_file_path: PathBuf,
    pub testing_file_path: PathBuf,
    pub train_test_split_ratio: f64,
    pub random_state: u64,
}

impl DataIngestionConfig {
    pub fn new(pipeline: &TrainingPipelineConfig) -> Self {
        let data_ingestion_dir = pipeline.artifact_dir.join(DATA_INGESTION_DIR_NAME);
        let ingested = data_ingestion_dir.join(DATA_INGESTION_INGESTED_DIR);
        Self {
            feature_store_file_path: data_ingestion_dir
                .join(DATA_INGESTION_FEATURE_STORE_DIR)
                .join(FILE_NAME),
            training_file_path: ingested.join(TRAIN_FILE_NAME),
            testing_file_path: ingested.join(TEST_FILE_NAME),
            data_ingestion_dir,
            train_test_split_ratio: DATA_INGESTION_TRAIN_TEST_SPLIT_RATIO,
            random_state: RANDOM_STATE,
        }
    }

    /// Builder method to set the test fraction
    pub fn with_split_ratio(mut self, ratio: f64) -> Self {
        self.train_test_split_ratio = ratio;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataValidationConfig {
    pub data_validation_dir: PathBuf,
    pub drift_report_file_path: PathBuf,
    pub schema_file_path: PathBuf,
    /// Also check column names and declared kinds, not only the count
    pub strict_schema: bool,
    pub drift: DriftConfig,
}

impl DataValidationConfig {
    pub fn new(pipeline: &TrainingPipelineConfig) -> Self {
        let data_validation_dir = pipeline.artifact_dir.join(DATA_VALIDATION_DIR_NAME);
        Self {
            drift_report_file_path: data_validation_dir
                .join(DATA_VALIDATION_DRIFT_REPORT_DIR)
                .join(DATA_VALIDATION_DRIFT_REPORT_FILE_NAME),
            data_validation_dir,
            schema_file_path: pipeline.schema_file_path.clone(),
            strict_schema: false,
            drift: DriftConfig::default(),
        }
    }

    /// Builder method to enable name/type checks
    pub fn with_strict_schema(mut self, strict: bool) -> Self {
        self.strict_schema = strict;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTransformationConfig {
    pub data_transformation_dir: PathBuf,
    pub transformed_train_file_path: PathBuf,
    pub transformed_test_file_path: PathBuf,
    pub transformer_object_file_path: PathBuf,
    pub label_encoder_object_file_path: PathBuf,
    pub target_column: String,
    /// Constant substituted for missing feature values
    pub fill_value: f64,
    /// Neighbours used when synthesizing minority samples
    pub k_neighbors: usize,
    pub random_state: u64,
}

impl DataTransformationConfig {
    pub fn new(pipeline: &TrainingPipelineConfig) -> Self {
        let dir = pipeline.artifact_dir.join(DATA_TRANSFORMATION_DIR_NAME);
        let data_dir = dir.join(DATA_TRANSFORMATION_TRANSFORMED_DATA_DIR);
        let object_dir = dir.join(DATA_TRANSFORMATION_TRANSFORMED_OBJECT_DIR);
        Self {
            transformed_train_file_path: data_dir.join(TRANSFORMED_TRAIN_FILE_NAME),
            transformed_test_file_path: data_dir.join(TRANSFORMED_TEST_FILE_NAME),
            transformer_object_file_path: object_dir.join(PREPROCESSING_OBJECT_FILE_NAME),
            label_encoder_object_file_path: object_dir.join(LABEL_ENCODER_OBJECT_FILE_NAME),
            data_transformation_dir: dir,
            target_column: pipeline.target_column.clone(),
            fill_value: 0.0,
            k_neighbors: 5,
            random_state: RANDOM_STATE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelTrainerConfig {
    pub model_trainer_dir: PathBuf,
    pub trained_model_file_path: PathBuf,
    /// Minimum cross-validated score a model must reach
    pub expected_score: f64,
    pub model_config_file_path: PathBuf,
}

impl ModelTrainerConfig {
    pub fn new(pipeline: &TrainingPipelineConfig) -> Self {
        let model_trainer_dir = pipeline.artifact_dir.join(MODEL_TRAINER_DIR_NAME);
        Self {
            trained_model_file_path: model_trainer_dir
                .join(MODEL_TRAINER_TRAINED_MODEL_DIR)
                .join(MODEL_FILE_NAME),
            model_trainer_dir,
            expected_score: MODEL_TRAINER_EXPECTED_SCORE,
            model_config_file_path: PathBuf::from(MODEL_TRAINER_MODEL_CONFIG_FILE_PATH),
        }
    }

    /// Builder method to set the minimum acceptable score
    pub fn with_expected_score(mut self, score: f64) -> Self {
        self.expected_score = score;
        self
    }

    /// Builder method to set the model search document path
    pub fn with_model_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_config_file_path = path.into();
        self
    }
}
