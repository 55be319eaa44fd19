//! Model trainer stage

use super::metrics::ClassificationMetrics;
use super::search_space::ModelSearchConfig;
use super::selector::ModelSelector;
use crate::config::ModelTrainerConfig;
use crate::entity::{DataTransformationArtifact, ModelTrainerArtifact};
use crate::error::{PipelineStage, Result, StageContext};
use crate::estimator::SensorFaultModel;
use crate::preprocessing::transformation::split_target;
use crate::preprocessing::{FittedTransform, LabelEncoder};
use crate::training::Model;
use crate::utils::{load_array, load_object, save_object};
use tracing::info;

const STAGE: PipelineStage = PipelineStage::ModelTrainer;

pub struct ModelTrainer {
    transformation_artifact: DataTransformationArtifact,
    config: ModelTrainerConfig,
    search: ModelSearchConfig,
}

impl ModelTrainer {
    /// Reads the model-search document named by the config
    pub fn new(transformation_artifact: DataTransformationArtifact, config: ModelTrainerConfig) -> Result<Self> {
        let search = ModelSearchConfig::from_yaml_file(&config.model_config_file_path)
            .stage(STAGE, "load_model_config")?;
        Ok(Self::with_search_config(transformation_artifact, config, search))
    }

    pub fn with_search_config(
        transformation_artifact: DataTransformationArtifact,
        config: ModelTrainerConfig,
        search: ModelSearchConfig,
    ) -> Self {
        Self {
            transformation_artifact,
            config,
            search,
        }
    }

    pub fn initiate_model_trainer(&self) -> Result<ModelTrainerArtifact> {
        info!("Entered model trainer");
        let artifact = &self.transformation_artifact;

        let train_arr = load_array(&artifact.transformed_train_file_path).stage(STAGE, "load_train_array")?;
        let test_arr = load_array(&artifact.transformed_test_file_path).stage(STAGE, "load_test_array")?;
        let (x_train, y_train) = split_target(&train_arr).stage(STAGE, "split_train")?;
        let (x_test, y_test) = split_target(&test_arr).stage(STAGE, "split_test")?;
        let y_train = y_train.mapv(|v| v as f64);
        let y_test = y_test.mapv(|v| v as f64);

        let selection = ModelSelector::new(self.search.clone())
            .select_best(&x_train, &y_train, self.config.expected_score)
            .stage(STAGE, "select_best_model")?;
        let best = selection.into_best();

        let encoder: LabelEncoder =
            load_object(&artifact.label_encoder_object_file_path).stage(STAGE, "load_label_encoder")?;
        let y_pred = best.model.predict(&x_test).stage(STAGE, "predict_test")?;
        let metrics = ClassificationMetrics::compute(&y_test, &y_pred, encoder.n_classes());
        info!(
            model = %best.name,
            accuracy = metrics.accuracy,
            f1 = metrics.f1_score,
            precision = metrics.precision,
            recall = metrics.recall,
            "Held-out metrics"
        );

        let transform: FittedTransform =
            load_object(&artifact.transformer_object_file_path).stage(STAGE, "load_transform")?;
        let packaged = SensorFaultModel::new(transform, best.model).stage(STAGE, "package_model")?;
        save_object(&self.config.trained_model_file_path, &packaged).stage(STAGE, "save_model")?;

        let trainer_artifact = ModelTrainerArtifact {
            trained_model_file_path: self.config.trained_model_file_path.clone(),
            metric_artifact: metrics.into(),
            best_model_name: best.name,
            best_score: best.cv_score,
        };
        info!(artifact = ?trainer_artifact, "Model trainer completed");
        Ok(trainer_artifact)
    }
}
