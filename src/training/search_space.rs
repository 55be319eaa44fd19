//! Model-search configuration document and hyperparameter grids

use super::decision_tree::{Criterion, DecisionTree, MaxFeatures};
use super::knn::{DistanceMetric, KNNClassifier, KNNConfig, WeightScheme};
use super::linear_models::LogisticRegression;
use super::metrics::Scoring;
use super::models::{Classifier, ModelKind};
use super::random_forest::RandomForest;
use crate::error::{SensorFaultError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// A scalar hyperparameter value as written in YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_usize(&self) -> Option<usize> {
        match self {
            ParamValue::Int(v) if *v >= 0 => Some(*v as usize),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Null => f.write_str("null"),
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Str(v) => f.write_str(v),
        }
    }
}

/// Hyperparameters of one combination, keyed by name
pub type ParamSet = BTreeMap<String, ParamValue>;

/// `grid_search:` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSearchConfig {
    #[serde(default = "default_cv")]
    pub cv: usize,
    #[serde(default)]
    pub scoring: Scoring,
    #[serde(default = "default_random_state")]
    pub random_state: u64,
}

fn default_cv() -> usize {
    3
}

fn default_random_state() -> u64 {
    42
}

impl Default for GridSearchConfig {
    fn default() -> Self {
        Self {
            cv: default_cv(),
            scoring: Scoring::default(),
            random_state: default_random_state(),
        }
    }
}

/// One entry under `model_selection:`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSpec {
    pub model: ModelKind,
    #[serde(default)]
    pub params: ParamSet,
    #[serde(default)]
    pub search_param_grid: BTreeMap<String, Vec<ParamValue>>,
}

impl CandidateSpec {
    /// Every combination of the grid layered over the fixed params.
    /// An empty grid yields the fixed params alone; a grid entry with no
    /// values yields no combinations at all.
    pub fn expand_grid(&self) -> Vec<ParamSet> {
        let mut combos = vec![self.params.clone()];
        for (name, values) in &self.search_param_grid {
            combos = combos
                .into_iter()
                .flat_map(|base| {
                    values.iter().map(move |v| {
                        let mut next = base.clone();
                        next.insert(name.clone(), v.clone());
                        next
                    })
                })
                .collect();
        }
        combos
    }
}

/// Parsed model-search document. Candidates keep document order.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSearchConfig {
    pub grid_search: GridSearchConfig,
    pub candidates: Vec<(String, CandidateSpec)>,
}

impl ModelSearchConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let doc: serde_yaml::Value = serde_yaml::from_str(content)
            .map_err(|e| SensorFaultError::ConfigError(format!("malformed model config: {}", e)))?;
        let serde_yaml::Value::Mapping(root) = doc else {
            return Err(SensorFaultError::ConfigError(
                "model config must be a mapping".to_string(),
            ));
        };

        let grid_search = match root.get("grid_search") {
            Some(value) => serde_yaml::from_value(value.clone())
                .map_err(|e| SensorFaultError::ConfigError(format!("invalid grid_search: {}", e)))?,
            None => GridSearchConfig::default(),
        };

        let selection = match root.get("model_selection") {
            Some(serde_yaml::Value::Mapping(m)) => m,
            _ => {
                return Err(SensorFaultError::ConfigError(
                    "model config has no model_selection mapping".to_string(),
                ))
            }
        };

        // serde_yaml::Mapping preserves insertion order
        let mut candidates = Vec::with_capacity(selection.len());
        for (key, value) in selection {
            let name = key
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| SensorFaultError::ConfigError("candidate names must be strings".to_string()))?;
            let spec: CandidateSpec = serde_yaml::from_value(value.clone())
                .map_err(|e| SensorFaultError::ConfigError(format!("candidate '{}': {}", name, e)))?;
            candidates.push((name, spec));
        }

        let config = Self {
            grid_search,
            candidates,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the whole search space without fitting anything: fold count,
    /// at least one candidate, no empty value lists, and every grid point
    /// buildable into a classifier.
    pub fn validate(&self) -> Result<()> {
        if self.grid_search.cv < 2 {
            return Err(SensorFaultError::ConfigError(format!(
                "grid_search.cv must be at least 2, got {}",
                self.grid_search.cv
            )));
        }
        if self.candidates.is_empty() {
            return Err(SensorFaultError::ConfigError(
                "model_selection lists no candidates".to_string(),
            ));
        }

        for (name, spec) in &self.candidates {
            if let Some((param, _)) = spec.search_param_grid.iter().find(|(_, v)| v.is_empty()) {
                return Err(SensorFaultError::ConfigError(format!(
                    "candidate '{}': search_param_grid entry '{}' has no values",
                    name, param
                )));
            }
            for params in spec.expand_grid() {
                build_classifier(name, spec.model, &params, self.grid_search.random_state)?;
            }
        }
        Ok(())
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SensorFaultError::ConfigError(format!("cannot read model config {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }
}

fn invalid(candidate: &str, name: &str, value: &ParamValue) -> SensorFaultError {
    SensorFaultError::ConfigError(format!(
        "candidate '{}': invalid value {} for parameter '{}'",
        candidate, value, name
    ))
}

fn unknown(candidate: &str, name: &str, kind: ModelKind) -> SensorFaultError {
    SensorFaultError::ConfigError(format!(
        "candidate '{}': unknown parameter '{}' for {}",
        candidate, name, kind
    ))
}

fn usize_param(candidate: &str, name: &str, value: &ParamValue) -> Result<usize> {
    value.as_usize().ok_or_else(|| invalid(candidate, name, value))
}

fn f64_param(candidate: &str, name: &str, value: &ParamValue) -> Result<f64> {
    value.as_f64().ok_or_else(|| invalid(candidate, name, value))
}

/// `null` means unlimited depth
fn depth_param(candidate: &str, name: &str, value: &ParamValue) -> Result<Option<usize>> {
    match value {
        ParamValue::Null => Ok(None),
        other => usize_param(candidate, name, other).map(Some),
    }
}

fn criterion_param(candidate: &str, name: &str, value: &ParamValue) -> Result<Criterion> {
    match value {
        ParamValue::Str(s) if s == "gini" => Ok(Criterion::Gini),
        ParamValue::Str(s) if s == "entropy" => Ok(Criterion::Entropy),
        other => Err(invalid(candidate, name, other)),
    }
}

fn max_features_param(candidate: &str, name: &str, value: &ParamValue) -> Result<MaxFeatures> {
    match value {
        ParamValue::Null => Ok(MaxFeatures::All),
        ParamValue::Str(s) if s == "sqrt" => Ok(MaxFeatures::Sqrt),
        ParamValue::Str(s) if s == "log2" => Ok(MaxFeatures::Log2),
        ParamValue::Int(n) if *n > 0 => Ok(MaxFeatures::Fixed(*n as usize)),
        other => Err(invalid(candidate, name, other)),
    }
}

/// Build an unfitted classifier of `kind` from one parameter combination
pub fn build_classifier(candidate: &str, kind: ModelKind, params: &ParamSet, random_state: u64) -> Result<Classifier> {
    match kind {
        ModelKind::LogisticRegression => {
            let mut model = LogisticRegression::new();
            for (name, value) in params {
                match name.as_str() {
                    "C" | "c" => model.c = f64_param(candidate, name, value)?,
                    "max_iter" => model.max_iter = usize_param(candidate, name, value)?,
                    "learning_rate" => model.learning_rate = f64_param(candidate, name, value)?,
                    "tol" => model.tol = f64_param(candidate, name, value)?,
                    "fit_intercept" => match value {
                        ParamValue::Bool(b) => model.fit_intercept = *b,
                        other => return Err(invalid(candidate, name, other)),
                    },
                    _ => return Err(unknown(candidate, name, kind)),
                }
            }
            Ok(Classifier::LogisticRegression(model))
        }
        ModelKind::KNearestNeighbors => {
            let mut config = KNNConfig::default();
            for (name, value) in params {
                match name.as_str() {
                    "n_neighbors" => config.n_neighbors = usize_param(candidate, name, value)?,
                    "weights" => {
                        config.weights = match value {
                            ParamValue::Str(s) if s == "uniform" => WeightScheme::Uniform,
                            ParamValue::Str(s) if s == "distance" => WeightScheme::Distance,
                            other => return Err(invalid(candidate, name, other)),
                        }
                    }
                    "metric" => {
                        config.metric = match value {
                            ParamValue::Str(s) if s == "euclidean" => DistanceMetric::Euclidean,
                            ParamValue::Str(s) if s == "manhattan" => DistanceMetric::Manhattan,
                            other => return Err(invalid(candidate, name, other)),
                        }
                    }
                    _ => return Err(unknown(candidate, name, kind)),
                }
            }
            Ok(Classifier::KNearestNeighbors(KNNClassifier::new(config)))
        }
        ModelKind::DecisionTree => {
            let mut model = DecisionTree::new().with_random_state(random_state);
            for (name, value) in params {
                match name.as_str() {
                    "max_depth" => model.max_depth = depth_param(candidate, name, value)?,
                    "min_samples_split" => {
                        model = model.with_min_samples_split(usize_param(candidate, name, value)?)
                    }
                    "min_samples_leaf" => {
                        model = model.with_min_samples_leaf(usize_param(candidate, name, value)?)
                    }
                    "criterion" => model.criterion = criterion_param(candidate, name, value)?,
                    "max_features" => model.max_features = max_features_param(candidate, name, value)?,
                    _ => return Err(unknown(candidate, name, kind)),
                }
            }
            Ok(Classifier::DecisionTree(model))
        }
        ModelKind::RandomForest => {
            let mut model = RandomForest::default().with_random_state(random_state);
            for (name, value) in params {
                match name.as_str() {
                    "n_estimators" => model.n_estimators = usize_param(candidate, name, value)?,
                    "max_depth" => model.max_depth = depth_param(candidate, name, value)?,
                    "min_samples_split" => {
                        model = model.with_min_samples_split(usize_param(candidate, name, value)?)
                    }
                    "min_samples_leaf" => {
                        model = model.with_min_samples_leaf(usize_param(candidate, name, value)?)
                    }
                    "criterion" => model.criterion = criterion_param(candidate, name, value)?,
                    "max_features" => model.max_features = max_features_param(candidate, name, value)?,
                    "bootstrap" => match value {
                        ParamValue::Bool(b) => model.bootstrap = *b,
                        other => return Err(invalid(candidate, name, other)),
                    },
                    _ => return Err(unknown(candidate, name, kind)),
                }
            }
            Ok(Classifier::RandomForest(model))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
grid_search:
  cv: 4
  scoring: f1
model_selection:
  zeta:
    model: random_forest
    params:
      n_estimators: 10
    search_param_grid:
      max_depth: [3, null]
      criterion: [gini, entropy]
  alpha:
    model: logistic_regression
"#;

    #[test]
    fn test_parse_keeps_document_order() {
        let config = ModelSearchConfig::from_yaml_str(DOC).unwrap();
        assert_eq!(config.grid_search.cv, 4);
        assert_eq!(config.grid_search.scoring, Scoring::F1);
        assert_eq!(config.grid_search.random_state, 42);

        let names: Vec<&str> = config.candidates.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(config.candidates[1].1.model, ModelKind::LogisticRegression);
    }

    #[test]
    fn test_expand_grid_is_cartesian() {
        let config = ModelSearchConfig::from_yaml_str(DOC).unwrap();
        let combos = config.candidates[0].1.expand_grid();
        assert_eq!(combos.len(), 4);
        assert!(combos.iter().all(|c| c.get("n_estimators") == Some(&ParamValue::Int(10))));
        assert!(combos.contains(&ParamSet::from([
            ("n_estimators".to_string(), ParamValue::Int(10)),
            ("max_depth".to_string(), ParamValue::Null),
            ("criterion".to_string(), ParamValue::Str("entropy".to_string())),
        ])));

        assert_eq!(config.candidates[1].1.expand_grid(), vec![ParamSet::new()]);
    }

    #[test]
    fn test_build_classifier_applies_params() {
        let params = ParamSet::from([
            ("n_estimators".to_string(), ParamValue::Int(7)),
            ("max_depth".to_string(), ParamValue::Int(3)),
        ]);
        match build_classifier("rf", ModelKind::RandomForest, &params, 1).unwrap() {
            Classifier::RandomForest(rf) => {
                assert_eq!(rf.n_estimators, 7);
                assert_eq!(rf.max_depth, Some(3));
                assert_eq!(rf.random_state, 1);
            }
            other => panic!("unexpected {:?}", other.kind()),
        }
    }

    #[test]
    fn test_unknown_param_names_candidate() {
        let params = ParamSet::from([("gamma".to_string(), ParamValue::Float(0.1))]);
        let err = build_classifier("lr_search", ModelKind::LogisticRegression, &params, 0).unwrap_err();
        assert!(matches!(err, SensorFaultError::ConfigError(ref m) if m.contains("lr_search") && m.contains("gamma")));
    }

    #[test]
    fn test_unknown_param_rejected_at_parse() {
        let doc = "model_selection:\n  lr:\n    model: logistic_regression\n    params:\n      gamma: 0.1\n";
        assert!(matches!(
            ModelSearchConfig::from_yaml_str(doc),
            Err(SensorFaultError::ConfigError(ref m)) if m.contains("'lr'") && m.contains("gamma")
        ));

        // Bad value hidden in the second grid point
        let doc = "model_selection:\n  knn:\n    model: k_nearest_neighbors\n    search_param_grid:\n      weights: [uniform, cosine]\n";
        assert!(matches!(
            ModelSearchConfig::from_yaml_str(doc),
            Err(SensorFaultError::ConfigError(ref m)) if m.contains("'knn'") && m.contains("cosine")
        ));
    }

    #[test]
    fn test_cv_below_two_rejected() {
        for cv in [0, 1] {
            let doc = format!("grid_search:\n  cv: {}\nmodel_selection:\n  t:\n    model: decision_tree\n", cv);
            assert!(matches!(
                ModelSearchConfig::from_yaml_str(&doc),
                Err(SensorFaultError::ConfigError(ref m)) if m.contains("cv")
            ));
        }
    }

    #[test]
    fn test_empty_grid_values_rejected() {
        let doc = "model_selection:\n  tree:\n    model: decision_tree\n    search_param_grid:\n      max_depth: []\n";
        assert!(matches!(
            ModelSearchConfig::from_yaml_str(doc),
            Err(SensorFaultError::ConfigError(ref m)) if m.contains("'tree'") && m.contains("max_depth")
        ));
        assert!(matches!(
            ModelSearchConfig::from_yaml_str("model_selection: {}\n"),
            Err(SensorFaultError::ConfigError(_))
        ));
    }

    #[test]
    fn test_unknown_model_and_missing_section() {
        let doc = "model_selection:\n  m:\n    model: xgboost\n";
        assert!(matches!(
            ModelSearchConfig::from_yaml_str(doc),
            Err(SensorFaultError::ConfigError(ref m)) if m.contains("'m'")
        ));
        assert!(matches!(
            ModelSearchConfig::from_yaml_str("grid_search:\n  cv: 3\n"),
            Err(SensorFaultError::ConfigError(_))
        ));
    }
}
