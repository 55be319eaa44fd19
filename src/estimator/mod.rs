//! Packaged estimator and the serving-side model resolver

pub mod store;

pub use store::{ArtifactStore, LocalArtifactStore};

use crate::error::{PipelineStage, Result, SensorFaultError, StageContext};
use crate::preprocessing::FittedTransform;
use crate::training::{Classifier, Model};
use ndarray::Array1;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;
use tracing::info;

/// Fitted feature transform bundled with the selected classifier, so raw
/// tables go in and encoded class codes come out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorFaultModel {
    transform: FittedTransform,
    model: Classifier,
}

impl SensorFaultModel {
    pub fn new(transform: FittedTransform, model: Classifier) -> Result<Self> {
        if !model.is_fitted() {
            return Err(SensorFaultError::ModelNotFitted);
        }
        if transform.n_features() == 0 {
            return Err(SensorFaultError::ValidationError(
                "feature transform has no features".to_string(),
            ));
        }
        Ok(Self { transform, model })
    }

    pub fn transform(&self) -> &FittedTransform {
        &self.transform
    }

    pub fn model(&self) -> &Classifier {
        &self.model
    }

    /// Encoded class codes, one per row; extra columns are ignored
    pub fn predict(&self, df: &DataFrame) -> Result<Array1<i64>> {
        let features = self.transform.apply(df)?;
        let predictions = self.model.predict(&features)?;
        Ok(predictions.mapv(|v| v.round() as i64))
    }
}

impl fmt::Display for SensorFaultModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.model.kind())
    }
}

/// Loads the packaged model from an artifact store on first use and keeps it
pub struct ModelResolver<S: ArtifactStore> {
    store: S,
    model_key: String,
    loaded: OnceLock<SensorFaultModel>,
}

impl<S: ArtifactStore> ModelResolver<S> {
    pub fn new(store: S, model_key: impl Into<String>) -> Self {
        Self {
            store,
            model_key: model_key.into(),
            loaded: OnceLock::new(),
        }
    }

    /// Store failures read as "not present"
    pub fn is_model_present(&self) -> bool {
        self.store.exists(&self.model_key).unwrap_or(false)
    }

    pub fn load_model(&self) -> Result<SensorFaultModel> {
        let bytes = self.store.get(&self.model_key)?;
        Ok(bincode::deserialize(&bytes)?)
    }

    pub fn save_model(&self, from_file: &Path, remove: bool) -> Result<()> {
        self.store.put(from_file, &self.model_key, remove)?;
        info!(key = %self.model_key, "Saved model to artifact store");
        Ok(())
    }

    pub fn predict(&self, df: &DataFrame) -> Result<Array1<i64>> {
        if self.loaded.get().is_none() {
            let model = self.load_model().stage(PipelineStage::Prediction, "load_model")?;
            info!(model = %model, "Loaded model for serving");
            // A concurrent caller may have won the race; either copy is identical
            let _ = self.loaded.set(model);
        }
        match self.loaded.get() {
            Some(model) => model.predict(df),
            None => Err(SensorFaultError::ModelNotFitted),
        }
        .stage(PipelineStage::Prediction, "predict")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::TransformPipeline;
    use crate::training::DecisionTree;
    use crate::utils::save_object;
    use ndarray::array;
    use polars::prelude::*;

    fn packaged() -> SensorFaultModel {
        let df = df!("s1" => &[0.0, 1.0, 10.0, 11.0], "s2" => &[1.0, 1.0, 2.0, 2.0]).unwrap();
        let transform = TransformPipeline::default().fit(&df).unwrap();
        let x = transform.apply(&df).unwrap();

        let mut model = Classifier::DecisionTree(DecisionTree::new());
        model.fit(&x, &array![0.0, 0.0, 1.0, 1.0]).unwrap();
        SensorFaultModel::new(transform, model).unwrap()
    }

    #[test]
    fn test_rejects_unfitted_model() {
        let df = df!("s1" => &[0.0, 1.0]).unwrap();
        let transform = TransformPipeline::default().fit(&df).unwrap();
        let err = SensorFaultModel::new(transform, Classifier::DecisionTree(DecisionTree::new())).unwrap_err();
        assert!(matches!(err, SensorFaultError::ModelNotFitted));
    }

    #[test]
    fn test_predict_ignores_extra_columns() {
        let model = packaged();
        let df = df!("s2" => &[1.0, 2.0], "s1" => &[0.5, 10.5], "class" => &["neg", "pos"]).unwrap();
        assert_eq!(model.predict(&df).unwrap(), array![0, 1]);
        assert_eq!(model.to_string(), "decision_tree");
    }

    #[test]
    fn test_resolver_reports_prediction_stage() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("model.bin");
        save_object(&local, &packaged()).unwrap();
        let resolver = ModelResolver::new(LocalArtifactStore::new(dir.path().join("bucket")), "model.bin");
        resolver.save_model(&local, true).unwrap();

        let err = resolver.predict(&df!("s1" => &[0.0]).unwrap()).unwrap_err();
        assert!(matches!(err, SensorFaultError::Stage { stage: PipelineStage::Prediction, ref operation, .. } if operation == "predict"));
    }

    #[test]
    fn test_resolver_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("model.bin");
        save_object(&local, &packaged()).unwrap();

        let resolver = ModelResolver::new(LocalArtifactStore::new(dir.path().join("bucket")), "sensor/model.bin");
        assert!(!resolver.is_model_present());
        let err = resolver.predict(&df!("s1" => &[0.0], "s2" => &[1.0]).unwrap()).unwrap_err();
        assert!(err.to_string().starts_with("[prediction::load_model]"));
        assert!(matches!(err.root(), SensorFaultError::StorageError(_)));

        resolver.save_model(&local, false).unwrap();
        assert!(resolver.is_model_present());

        let df = df!("s1" => &[0.0, 11.0], "s2" => &[1.0, 2.0]).unwrap();
        assert_eq!(resolver.predict(&df).unwrap(), array![0, 1]);
        // Cached after the first call
        std::fs::remove_file(dir.path().join("bucket/sensor/model.bin")).unwrap();
        assert_eq!(resolver.predict(&df).unwrap(), array![0, 1]);
    }
}
