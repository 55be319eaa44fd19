//! Model trait and the candidate classifier set

use super::decision_tree::DecisionTree;
use super::knn::KNNClassifier;
use super::linear_models::LogisticRegression;
use super::random_forest::RandomForest;
use crate::error::{SensorFaultError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trait for ML models. Labels are encoded class codes stored as `f64`.
pub trait Model: Send + Sync {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Make predictions
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Whether `fit` has completed
    fn is_fitted(&self) -> bool;
}

/// Model families available to the search space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    LogisticRegression,
    KNearestNeighbors,
    DecisionTree,
    RandomForest,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::LogisticRegression => "logistic_regression",
            ModelKind::KNearestNeighbors => "k_nearest_neighbors",
            ModelKind::DecisionTree => "decision_tree",
            ModelKind::RandomForest => "random_forest",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = SensorFaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "logistic_regression" => Ok(ModelKind::LogisticRegression),
            "k_nearest_neighbors" | "knn" => Ok(ModelKind::KNearestNeighbors),
            "decision_tree" => Ok(ModelKind::DecisionTree),
            "random_forest" => Ok(ModelKind::RandomForest),
            other => Err(SensorFaultError::ConfigError(format!(
                "unknown model '{}'",
                other
            ))),
        }
    }
}

/// A fitted or unfitted classifier of any supported family.
/// Serialized as a tagged variant so the concrete model survives a round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Classifier {
    LogisticRegression(LogisticRegression),
    KNearestNeighbors(KNNClassifier),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
}

impl Classifier {
    pub fn kind(&self) -> ModelKind {
        match self {
            Classifier::LogisticRegression(_) => ModelKind::LogisticRegression,
            Classifier::KNearestNeighbors(_) => ModelKind::KNearestNeighbors,
            Classifier::DecisionTree(_) => ModelKind::DecisionTree,
            Classifier::RandomForest(_) => ModelKind::RandomForest,
        }
    }

    fn as_model(&self) -> &dyn Model {
        match self {
            Classifier::LogisticRegression(m) => m,
            Classifier::KNearestNeighbors(m) => m,
            Classifier::DecisionTree(m) => m,
            Classifier::RandomForest(m) => m,
        }
    }

    fn as_model_mut(&mut self) -> &mut dyn Model {
        match self {
            Classifier::LogisticRegression(m) => m,
            Classifier::KNearestNeighbors(m) => m,
            Classifier::DecisionTree(m) => m,
            Classifier::RandomForest(m) => m,
        }
    }
}

impl Model for Classifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.as_model_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.as_model().predict(x)
    }

    fn is_fitted(&self) -> bool {
        self.as_model().is_fitted()
    }
}

/// Shared shape check for `fit`
pub(crate) fn check_fit_input(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(SensorFaultError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(SensorFaultError::ValidationError(
            "cannot fit on zero samples".to_string(),
        ));
    }
    Ok(())
}

/// Shared feature-count check for `predict`
pub(crate) fn check_predict_input(x: &Array2<f64>, n_features: usize) -> Result<()> {
    if x.ncols() != n_features {
        return Err(SensorFaultError::ShapeError {
            expected: format!("{} features", n_features),
            actual: format!("{} features", x.ncols()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_model_kind_parse() {
        assert_eq!("random_forest".parse::<ModelKind>().unwrap(), ModelKind::RandomForest);
        assert_eq!("knn".parse::<ModelKind>().unwrap(), ModelKind::KNearestNeighbors);
        assert!(matches!(
            "xgboost".parse::<ModelKind>(),
            Err(SensorFaultError::ConfigError(_))
        ));
        assert_eq!(ModelKind::DecisionTree.to_string(), "decision_tree");
    }

    #[test]
    fn test_classifier_dispatch_and_serde() {
        let x = array![[0.0], [0.1], [1.0], [1.1]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let mut model = Classifier::DecisionTree(DecisionTree::new());
        assert!(!model.is_fitted());

        model.fit(&x, &y).unwrap();
        assert!(model.is_fitted());
        assert_eq!(model.kind(), ModelKind::DecisionTree);

        let bytes = bincode::serialize(&model).unwrap();
        let back: Classifier = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back.predict(&x).unwrap(), y);
    }
}
