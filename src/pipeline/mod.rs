//! Training pipeline orchestrator
//!
//! Runs ingestion, validation, transformation and training in order. Each
//! stage starts only after the previous one has returned its artifact.

use crate::config::{
    DataIngestionConfig, DataTransformationConfig, DataValidationConfig, ModelTrainerConfig,
    TrainingPipelineConfig,
};
use crate::entity::{DataValidationArtifact, ModelTrainerArtifact};
use crate::error::Result;
use crate::ingestion::{DataIngestion, DataSource};
use crate::preprocessing::DataTransformation;
use crate::training::{ModelSearchConfig, ModelTrainer};
use crate::validation::{DataValidation, Schema};
use tracing::{info, warn};

/// Per-stage configuration of one run
#[derive(Debug, Clone)]
pub struct StageConfigs {
    pub ingestion: DataIngestionConfig,
    pub validation: DataValidationConfig,
    pub transformation: DataTransformationConfig,
    pub trainer: ModelTrainerConfig,
}

impl StageConfigs {
    pub fn new(pipeline: &TrainingPipelineConfig) -> Self {
        Self {
            ingestion: DataIngestionConfig::new(pipeline),
            validation: DataValidationConfig::new(pipeline),
            transformation: DataTransformationConfig::new(pipeline),
            trainer: ModelTrainerConfig::new(pipeline),
        }
    }
}

/// How a run ended when no stage raised an error
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Completed(ModelTrainerArtifact),
    /// The schema check failed; later stages did not run
    ValidationFailed(DataValidationArtifact),
}

pub struct TrainPipeline {
    configs: StageConfigs,
    schema: Schema,
    search: ModelSearchConfig,
}

impl TrainPipeline {
    /// Loads the schema and model-search documents, so a bad document
    /// fails here rather than after ingestion.
    pub fn new(configs: StageConfigs) -> Result<Self> {
        let schema = Schema::from_yaml_file(&configs.validation.schema_file_path)?;
        let search = ModelSearchConfig::from_yaml_file(&configs.trainer.model_config_file_path)?;
        Ok(Self {
            configs,
            schema,
            search,
        })
    }

    pub fn configs(&self) -> &StageConfigs {
        &self.configs
    }

    pub fn run(&self, source: &dyn DataSource) -> Result<PipelineOutcome> {
        info!("Starting training pipeline");

        let ingestion_artifact =
            DataIngestion::new(self.configs.ingestion.clone()).initiate_data_ingestion(source)?;

        let validation_artifact = DataValidation::with_schema(
            ingestion_artifact.clone(),
            self.configs.validation.clone(),
            self.schema.clone(),
        )
        .initiate_data_validation()?;

        if !validation_artifact.validation_status {
            warn!(message = %validation_artifact.message, "Stopping pipeline after failed validation");
            return Ok(PipelineOutcome::ValidationFailed(validation_artifact));
        }

        let transformation_artifact =
            DataTransformation::new(ingestion_artifact, self.configs.transformation.clone())
                .initiate_data_transformation()?;

        let trainer_artifact = ModelTrainer::with_search_config(
            transformation_artifact,
            self.configs.trainer.clone(),
            self.search.clone(),
        )
        .initiate_model_trainer()?;

        info!(
            model = %trainer_artifact.best_model_name,
            score = trainer_artifact.best_score,
            path = %trainer_artifact.trained_model_file_path.display(),
            "Training pipeline completed"
        );
        Ok(PipelineOutcome::Completed(trainer_artifact))
    }
}
