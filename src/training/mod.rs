//! Model training
//!
//! Candidate classifiers behind the [`Model`] trait, stratified
//! cross-validation, the YAML-driven grid search and the trainer stage.

mod models;
pub mod cross_validation;
pub mod decision_tree;
pub mod knn;
pub mod linear_models;
pub mod metrics;
pub mod random_forest;
pub mod search_space;
pub mod selector;
pub mod trainer;

pub use cross_validation::{CVResults, CVSplit, CVStrategy, CrossValidator};
pub use decision_tree::{Criterion, DecisionTree, MaxFeatures, TreeNode};
pub use knn::{DistanceMetric, KNNClassifier, KNNConfig, WeightScheme};
pub use linear_models::LogisticRegression;
pub use metrics::{ClassificationMetrics, Scoring};
pub use models::{Classifier, Model, ModelKind};
pub use random_forest::RandomForest;
pub use search_space::{build_classifier, CandidateSpec, GridSearchConfig, ModelSearchConfig, ParamSet, ParamValue};
pub use selector::{ensure_acceptable, CandidateModelResult, ModelSelector, SelectionResult};
pub use trainer::ModelTrainer;
