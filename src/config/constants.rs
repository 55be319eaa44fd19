//! Pipeline-wide constants

pub const TARGET_COLUMN: &str = "class";
pub const PIPELINE_NAME: &str = "sensor_fault";
pub const ARTIFACT_DIR: &str = "artifact";
pub const LOG_DIR: &str = "logs";

pub const FILE_NAME: &str = "sensor_fault.csv";
pub const TRAIN_FILE_NAME: &str = "train.csv";
pub const TEST_FILE_NAME: &str = "test.csv";
pub const PREPROCESSING_OBJECT_FILE_NAME: &str = "preprocessing.bin";
pub const LABEL_ENCODER_OBJECT_FILE_NAME: &str = "target_encoder.bin";
pub const MODEL_FILE_NAME: &str = "model.bin";
pub const SCHEMA_FILE_PATH: &str = "config/schema.yaml";

/// Literal used for missing values in the raw sensor exports
pub const MISSING_VALUE_TOKEN: &str = "na";

// Data ingestion
pub const DATA_INGESTION_DIR_NAME: &str = "data_ingestion";
pub const DATA_INGESTION_FEATURE_STORE_DIR: &str = "feature_store";
pub const DATA_INGESTION_INGESTED_DIR: &str = "ingested";
pub const DATA_INGESTION_TRAIN_TEST_SPLIT_RATIO: f64 = 0.2;

// Data validation
pub const DATA_VALIDATION_DIR_NAME: &str = "data_validation";
pub const DATA_VALIDATION_DRIFT_REPORT_DIR: &str = "drift_report";
pub const DATA_VALIDATION_DRIFT_REPORT_FILE_NAME: &str = "report.yaml";

// Data transformation
pub const DATA_TRANSFORMATION_DIR_NAME: &str = "data_transformation";
pub const DATA_TRANSFORMATION_TRANSFORMED_DATA_DIR: &str = "transformed";
pub const DATA_TRANSFORMATION_TRANSFORMED_OBJECT_DIR: &str = "transformed_object";
pub const TRANSFORMED_TRAIN_FILE_NAME: &str = "train.bin";
pub const TRANSFORMED_TEST_FILE_NAME: &str = "test.bin";

// Model trainer
pub const MODEL_TRAINER_DIR_NAME: &str = "model_trainer";
pub const MODEL_TRAINER_TRAINED_MODEL_DIR: &str = "trained_model";
pub const MODEL_TRAINER_EXPECTED_SCORE: f64 = 0.6;
pub const MODEL_TRAINER_MODEL_CONFIG_FILE_PATH: &str = "config/model.yaml";

/// Seed shared by the split, the rebalancer and cross-validation
pub const RANDOM_STATE: u64 = 42;
