//! Classification metrics and the scoring choice used by model search

use crate::entity::ClassificationMetricArtifact;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Scoring metric for cross-validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scoring {
    #[default]
    Accuracy,
    Precision,
    Recall,
    F1,
}

impl Scoring {
    /// Score predictions over `n_classes` encoded classes
    pub fn score(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>, n_classes: usize) -> f64 {
        let metrics = ClassificationMetrics::compute(y_true, y_pred, n_classes);
        match self {
            Scoring::Accuracy => metrics.accuracy,
            Scoring::Precision => metrics.precision,
            Scoring::Recall => metrics.recall,
            Scoring::F1 => metrics.f1_score,
        }
    }
}

/// Accuracy, precision, recall and F1 over encoded class codes.
///
/// `n_classes` is the size of the label encoding, not the number of classes
/// that happen to appear in the arrays. With at most two classes the
/// positive class is code 1; otherwise precision, recall and F1 are macro
/// averages over codes `0..n_classes`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

impl ClassificationMetrics {
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>, n_classes: usize) -> Self {
        if y_true.is_empty() {
            return Self::default();
        }

        let truth: Vec<i64> = y_true.iter().map(|v| v.round() as i64).collect();
        let pred: Vec<i64> = y_pred.iter().map(|v| v.round() as i64).collect();

        let correct = truth.iter().zip(&pred).filter(|(t, p)| t == p).count();
        let accuracy = correct as f64 / truth.len() as f64;

        let (precision, recall, f1_score) = if n_classes <= 2 {
            per_class(&truth, &pred, 1)
        } else {
            let scores: Vec<(f64, f64, f64)> = (0..n_classes as i64)
                .map(|c| per_class(&truth, &pred, c))
                .collect();
            let n = scores.len() as f64;
            (
                scores.iter().map(|s| s.0).sum::<f64>() / n,
                scores.iter().map(|s| s.1).sum::<f64>() / n,
                scores.iter().map(|s| s.2).sum::<f64>() / n,
            )
        };

        Self {
            accuracy,
            precision,
            recall,
            f1_score,
        }
    }
}

impl From<ClassificationMetrics> for ClassificationMetricArtifact {
    fn from(m: ClassificationMetrics) -> Self {
        ClassificationMetricArtifact {
            accuracy: m.accuracy,
            f1_score: m.f1_score,
            precision_score: m.precision,
            recall_score: m.recall,
        }
    }
}

/// One-vs-rest precision, recall and F1 for `positive`; empty denominators give 0
fn per_class(truth: &[i64], pred: &[i64], positive: i64) -> (f64, f64, f64) {
    let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);
    for (&t, &p) in truth.iter().zip(pred) {
        match (t == positive, p == positive) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }

    let precision = if tp + fp > 0 { tp as f64 / (tp + fp) as f64 } else { 0.0 };
    let recall = if tp + fn_ > 0 { tp as f64 / (tp + fn_) as f64 } else { 0.0 };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    (precision, recall, f1)
}
