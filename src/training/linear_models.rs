//! Logistic regression

use super::models::{check_fit_input, check_predict_input, Model};
use crate::error::{SensorFaultError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Binary or one-vs-rest multiclass logistic regression, fitted by batch
/// gradient descent with an L2 penalty of strength `1 / c`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Inverse regularization strength
    pub c: f64,
    /// Whether to fit intercept
    pub fit_intercept: bool,
    /// Maximum iterations
    pub max_iter: usize,
    /// Convergence tolerance on the gradient norm
    pub tol: f64,
    /// Learning rate
    pub learning_rate: f64,
    /// Class codes seen during fit
    classes: Vec<f64>,
    /// One weight vector per class (a single one for two classes)
    coefficients: Vec<Array1<f64>>,
    intercepts: Vec<f64>,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self {
            c: 1.0,
            fit_intercept: true,
            max_iter: 1000,
            tol: 1e-6,
            learning_rate: 0.1,
            classes: Vec::new(),
            coefficients: Vec::new(),
            intercepts: Vec::new(),
        }
    }

    /// Set inverse regularization strength
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set learning rate
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }

    /// Fit one binary problem with targets in {0, 1}
    fn fit_binary(&self, x: &Array2<f64>, y: &Array1<f64>) -> (Array1<f64>, f64) {
        let n_samples = x.nrows() as f64;
        let alpha = 1.0 / (self.c * n_samples);
        let mut weights = Array1::<f64>::zeros(x.ncols());
        let mut bias = 0.0;

        for _ in 0..self.max_iter {
            let predictions = Self::sigmoid(&(x.dot(&weights) + bias));
            let errors = &predictions - y;
            let dw = x.t().dot(&errors) / n_samples + alpha * &weights;
            let db = if self.fit_intercept {
                errors.mean().unwrap_or(0.0)
            } else {
                0.0
            };

            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < self.tol {
                break;
            }

            weights = weights - self.learning_rate * dw;
            bias -= self.learning_rate * db;
        }

        (weights, bias)
    }

    /// Probability of each class, one column per class
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted() {
            return Err(SensorFaultError::ModelNotFitted);
        }
        check_predict_input(x, self.coefficients[0].len())?;

        let scores: Vec<Array1<f64>> = self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(w, &b)| Self::sigmoid(&(x.dot(w) + b)))
            .collect();

        let mut proba = Array2::zeros((x.nrows(), self.classes.len()));
        if self.classes.len() == 2 {
            proba.column_mut(1).assign(&scores[0]);
            proba.column_mut(0).assign(&scores[0].mapv(|p| 1.0 - p));
        } else {
            for (j, s) in scores.iter().enumerate() {
                proba.column_mut(j).assign(s);
            }
            for mut row in proba.axis_iter_mut(Axis(0)) {
                let total = row.sum();
                if total > 0.0 {
                    row /= total;
                }
            }
        }
        Ok(proba)
    }
}

impl Model for LogisticRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        if self.c <= 0.0 {
            return Err(SensorFaultError::InvalidParameter {
                name: "C".to_string(),
                value: self.c.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let mut classes: Vec<f64> = y.iter().map(|v| v.round()).collect();
        classes.sort_by(|a, b| a.total_cmp(b));
        classes.dedup();
        if classes.len() < 2 {
            return Err(SensorFaultError::ValidationError(
                "logistic regression needs at least 2 classes".to_string(),
            ));
        }

        // Two classes share one model; more classes get one-vs-rest models
        let positives: &[f64] = if classes.len() == 2 { &classes[1..] } else { &classes };
        let fitted: Vec<(Array1<f64>, f64)> = positives
            .iter()
            .map(|&class| {
                let target = y.mapv(|v| if v.round() == class { 1.0 } else { 0.0 });
                self.fit_binary(x, &target)
            })
            .collect();

        let (coefficients, intercepts): (Vec<Array1<f64>>, Vec<f64>) = fitted.into_iter().unzip();
        self.coefficients = coefficients;
        self.intercepts = intercepts;
        self.classes = classes;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .axis_iter(Axis(0))
            .map(|row| {
                // argmax, first class wins ties
                let best = row
                    .iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |acc, (j, &p)| if p > acc.1 { (j, p) } else { acc });
                self.classes[best.0]
            })
            .collect())
    }

    fn is_fitted(&self) -> bool {
        !self.coefficients.is_empty()
    }
}
