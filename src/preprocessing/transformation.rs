//! Data transformation stage
//!
//! Fits the feature transform and the label encoder on the training split,
//! applies both to train and test, rebalances the training matrix, and
//! persists the fitted objects and the numeric arrays.

use super::{label_values, FittedTransform, LabelEncoder, TransformPipeline};
use crate::config::DataTransformationConfig;
use crate::entity::{DataIngestionArtifact, DataTransformationArtifact};
use crate::error::{PipelineStage, SensorFaultError, Result, StageContext};
use crate::synthetic::{class_counts, Sampler, SmoteTomek};
use crate::utils::{read_csv, save_array, save_object};
use ndarray::{concatenate, s, Array1, Array2, Axis};
use polars::prelude::*;
use tracing::info;

const STAGE: PipelineStage = PipelineStage::DataTransformation;

/// Append the encoded labels as the last column
pub fn stack_target(features: &Array2<f64>, labels: &Array1<i64>) -> Result<Array2<f64>> {
    let target = labels.mapv(|v| v as f64).insert_axis(Axis(1));
    Ok(concatenate(Axis(1), &[features.view(), target.view()])?)
}

/// Split a stacked array back into features and labels
pub fn split_target(array: &Array2<f64>) -> Result<(Array2<f64>, Array1<i64>)> {
    if array.ncols() < 2 {
        return Err(SensorFaultError::ShapeError {
            expected: "at least one feature column plus the label column".to_string(),
            actual: format!("{} columns", array.ncols()),
        });
    }
    let last = array.ncols() - 1;
    let features = array.slice(s![.., ..last]).to_owned();
    let labels = array.column(last).mapv(|v| v.round() as i64);
    Ok((features, labels))
}

/// Split the target off a raw table
fn features_and_labels(df: &DataFrame, target: &str) -> Result<(DataFrame, Vec<Option<String>>)> {
    let labels = label_values(df, target)?;
    let features = df.drop(target)?;
    Ok((features, labels))
}

pub struct DataTransformation {
    ingestion_artifact: DataIngestionArtifact,
    config: DataTransformationConfig,
}

impl DataTransformation {
    pub fn new(ingestion_artifact: DataIngestionArtifact, config: DataTransformationConfig) -> Self {
        Self {
            ingestion_artifact,
            config,
        }
    }

    pub fn initiate_data_transformation(&self) -> Result<DataTransformationArtifact> {
        info!("Entered data transformation");
        let target = self.config.target_column.as_str();

        let train_df = read_csv(&self.ingestion_artifact.trained_file_path).stage(STAGE, "read_train")?;
        let test_df = read_csv(&self.ingestion_artifact.test_file_path).stage(STAGE, "read_test")?;

        let (train_features, train_labels) =
            features_and_labels(&train_df, target).stage(STAGE, "split_target")?;
        let (_, test_labels) = features_and_labels(&test_df, target).stage(STAGE, "split_target")?;

        // Fit on train only, then apply unchanged to both splits
        let transform: FittedTransform = TransformPipeline::new(self.config.fill_value)
            .fit(&train_features)
            .stage(STAGE, "fit_transform")?;
        let x_train = transform.apply(&train_df).stage(STAGE, "apply_transform")?;
        let x_test = transform.apply(&test_df).stage(STAGE, "apply_transform")?;

        let encoder = LabelEncoder::fit(target, &train_labels).stage(STAGE, "fit_label_encoder")?;
        let y_train = encoder.encode(&train_labels).stage(STAGE, "encode_labels")?;
        let y_test = encoder.encode(&test_labels).stage(STAGE, "encode_labels")?;

        // Only the training split is rebalanced; the test split stays as observed
        let mut sampler = SmoteTomek::new()
            .with_k_neighbors(self.config.k_neighbors)
            .with_seed(self.config.random_state);
        let resampled = sampler
            .fit_resample(&x_train, &y_train)
            .stage(STAGE, "resample_train")?;

        info!(
            before = ?class_counts(&y_train),
            after = ?class_counts(&resampled.y),
            "Rebalanced training split"
        );

        let train_arr = stack_target(&resampled.x, &resampled.y).stage(STAGE, "stack_train")?;
        let test_arr = stack_target(&x_test, &y_test).stage(STAGE, "stack_test")?;

        save_array(&self.config.transformed_train_file_path, &train_arr)
            .stage(STAGE, "save_train_array")?;
        save_array(&self.config.transformed_test_file_path, &test_arr)
            .stage(STAGE, "save_test_array")?;
        save_object(&self.config.transformer_object_file_path, &transform)
            .stage(STAGE, "save_transform")?;
        save_object(&self.config.label_encoder_object_file_path, &encoder)
            .stage(STAGE, "save_label_encoder")?;

        info!(
            n_features = transform.n_features(),
            train_rows = train_arr.nrows(),
            test_rows = test_arr.nrows(),
            "Data transformation completed"
        );

        Ok(DataTransformationArtifact {
            transformer_object_file_path: self.config.transformer_object_file_path.clone(),
            label_encoder_object_file_path: self.config.label_encoder_object_file_path.clone(),
            transformed_train_file_path: self.config.transformed_train_file_path.clone(),
            transformed_test_file_path: self.config.transformed_test_file_path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_stack_and_split_target() {
        let x = array![[0.5, 1.0], [2.0, -3.0]];
        let y = array![1, 0];
        let stacked = stack_target(&x, &y).unwrap();
        assert_eq!(stacked, array![[0.5, 1.0, 1.0], [2.0, -3.0, 0.0]]);

        let (x_back, y_back) = split_target(&stacked).unwrap();
        assert_eq!(x_back, x);
        assert_eq!(y_back, y);
    }

    #[test]
    fn test_split_target_needs_features() {
        assert!(split_target(&array![[1.0], [0.0]]).is_err());
    }
}
