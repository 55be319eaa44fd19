//! Grid search over the configured candidates

use super::cross_validation::{CVResults, CVStrategy, CrossValidator};
use super::models::{Classifier, Model, ModelKind};
use super::search_space::{build_classifier, CandidateSpec, ModelSearchConfig, ParamSet};
use crate::error::{SensorFaultError, Result};
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Best combination of one candidate, refitted on all training data
#[derive(Debug, Clone)]
pub struct CandidateModelResult {
    pub name: String,
    pub kind: ModelKind,
    pub params: ParamSet,
    pub model: Classifier,
    /// Mean cross-validated score
    pub cv_score: f64,
}

/// Every candidate's result in configuration order
#[derive(Debug, Clone)]
pub struct SelectionResult {
    pub candidates: Vec<CandidateModelResult>,
    best_idx: usize,
}

impl SelectionResult {
    pub fn best(&self) -> &CandidateModelResult {
        &self.candidates[self.best_idx]
    }

    pub fn into_best(mut self) -> CandidateModelResult {
        self.candidates.swap_remove(self.best_idx)
    }
}

/// Fails with `NoAcceptableModel` when the best score is under `expected`
pub fn ensure_acceptable(best_score: f64, expected: f64, best_model: &str) -> Result<()> {
    if best_score < expected {
        return Err(SensorFaultError::NoAcceptableModel {
            best_model: best_model.to_string(),
            best_score,
            expected,
        });
    }
    Ok(())
}

pub struct ModelSelector {
    config: ModelSearchConfig,
}

impl ModelSelector {
    pub fn new(config: ModelSearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ModelSearchConfig {
        &self.config
    }

    /// Score every candidate, pick the highest mean CV score (earlier
    /// candidate on ties) and gate it against `min_score`.
    pub fn select_best(&self, x: &Array2<f64>, y: &Array1<f64>, min_score: f64) -> Result<SelectionResult> {
        if self.config.candidates.is_empty() {
            return Err(SensorFaultError::ConfigError(
                "model_selection lists no candidates".to_string(),
            ));
        }

        // Collected in order first so the reported error is the earliest candidate's
        let evaluated: Vec<Result<CandidateModelResult>> = self
            .config
            .candidates
            .par_iter()
            .map(|(name, spec)| self.evaluate_candidate(name, spec, x, y))
            .collect();
        let candidates: Vec<CandidateModelResult> = evaluated.into_iter().collect::<Result<_>>()?;

        let mut best_idx = 0;
        for (idx, c) in candidates.iter().enumerate() {
            info!(candidate = %c.name, model = %c.kind, score = c.cv_score, "Candidate scored");
            if c.cv_score > candidates[best_idx].cv_score {
                best_idx = idx;
            }
        }

        let best = &candidates[best_idx];
        ensure_acceptable(best.cv_score, min_score, &best.name)?;
        info!(best = %best.name, score = best.cv_score, "Selected best model");

        Ok(SelectionResult { candidates, best_idx })
    }

    fn evaluate_candidate(
        &self,
        name: &str,
        spec: &CandidateSpec,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<CandidateModelResult> {
        let grid = &self.config.grid_search;

        let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
        for v in y.iter() {
            *counts.entry(v.round() as i64).or_insert(0) += 1;
        }
        if let Some((class, count)) = counts.iter().find(|(_, &c)| c < grid.cv) {
            return Err(SensorFaultError::InsufficientSamples {
                candidate: name.to_string(),
                reason: format!("class {} has {} samples, fewer than cv = {}", class, count, grid.cv),
            });
        }

        let splits = CrossValidator::new(CVStrategy::StratifiedKFold {
            n_splits: grid.cv,
            shuffle: true,
        })
        .with_random_state(grid.random_state)
        .split(y)
        .map_err(|e| SensorFaultError::InsufficientSamples {
            candidate: name.to_string(),
            reason: e.to_string(),
        })?;

        let mut best: Option<(ParamSet, f64)> = None;
        for params in spec.expand_grid() {
            // Build once up front so a bad parameter fails before any fitting
            let template = build_classifier(name, spec.model, &params, grid.random_state)?;

            let scores = splits
                .iter()
                .map(|split| {
                    let mut model = template.clone();
                    model.fit(&x.select(Axis(0), &split.train_indices), &y.select(Axis(0), &split.train_indices))?;
                    let pred = model.predict(&x.select(Axis(0), &split.test_indices))?;
                    Ok(grid.scoring.score(&y.select(Axis(0), &split.test_indices), &pred, counts.len()))
                })
                .collect::<Result<Vec<f64>>>()?;
            let cv = CVResults::from_scores(scores);
            debug!(candidate = name, ?params, mean = cv.mean_score, std = cv.std_score, "Grid point scored");

            if best.as_ref().map_or(true, |(_, s)| cv.mean_score > *s) {
                best = Some((params, cv.mean_score));
            }
        }

        let (params, cv_score) = best.ok_or_else(|| {
            SensorFaultError::ConfigError(format!("candidate '{}' has an empty search grid", name))
        })?;
        let mut model = build_classifier(name, spec.model, &params, grid.random_state)?;
        model.fit(x, y)?;

        Ok(CandidateModelResult {
            name: name.to_string(),
            kind: spec.model,
            params,
            model,
            cv_score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::search_space::ParamValue;

    fn blobs() -> (Array2<f64>, Array1<f64>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..12 {
            let t = i as f64 * 0.1;
            rows.extend_from_slice(&[t, 1.0 - t]);
            labels.push(0.0);
            rows.extend_from_slice(&[5.0 + t, 6.0 - t]);
            labels.push(1.0);
        }
        (Array2::from_shape_vec((24, 2), rows).unwrap(), Array1::from_vec(labels))
    }

    fn selector(doc: &str) -> ModelSelector {
        ModelSelector::new(ModelSearchConfig::from_yaml_str(doc).unwrap())
    }

    const DOC: &str = r#"
grid_search:
  cv: 3
model_selection:
  tree:
    model: decision_tree
    search_param_grid:
      max_depth: [1, 2]
  knn:
    model: k_nearest_neighbors
    params:
      n_neighbors: 3
"#;

    #[test]
    fn test_select_best_on_separable_data() {
        let (x, y) = blobs();
        let result = selector(DOC).select_best(&x, &y, 0.6).unwrap();

        assert_eq!(result.candidates.len(), 2);
        assert_eq!(result.candidates[0].name, "tree");
        // Both separate perfectly, so the earlier candidate wins the tie
        assert_eq!(result.best().name, "tree");
        assert_eq!(result.best().cv_score, 1.0);
        assert_eq!(result.best().params.get("max_depth"), Some(&ParamValue::Int(1)));
        assert!(result.best().model.is_fitted());
    }

    #[test]
    fn test_gate_rejects_low_scores() {
        let (x, y) = blobs();
        let err = selector(DOC).select_best(&x, &y, 1.01).unwrap_err();
        assert!(matches!(err, SensorFaultError::NoAcceptableModel { ref best_model, .. } if best_model == "tree"));
    }

    #[test]
    fn test_ensure_acceptable() {
        assert!(ensure_acceptable(0.6, 0.6, "m").is_ok());
        assert!(matches!(
            ensure_acceptable(0.55, 0.6, "m"),
            Err(SensorFaultError::NoAcceptableModel { best_score, expected, .. }) if best_score == 0.55 && expected == 0.6
        ));
    }

    #[test]
    fn test_insufficient_samples_names_candidate() {
        let x = Array2::from_shape_vec((5, 1), vec![0.0, 0.1, 0.2, 5.0, 5.1]).unwrap();
        let y = Array1::from_vec(vec![0.0, 0.0, 0.0, 1.0, 1.0]);
        let err = selector(DOC).select_best(&x, &y, 0.0).unwrap_err();
        assert!(matches!(err, SensorFaultError::InsufficientSamples { ref candidate, .. } if candidate == "tree"));
    }

    #[test]
    fn test_empty_model_selection() {
        let config = ModelSearchConfig {
            grid_search: Default::default(),
            candidates: Vec::new(),
        };
        let (x, y) = blobs();
        assert!(matches!(
            ModelSelector::new(config).select_best(&x, &y, 0.0),
            Err(SensorFaultError::ConfigError(_))
        ));
    }
}
