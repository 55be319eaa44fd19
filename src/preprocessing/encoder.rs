//! Target label encoding

use crate::error::{SensorFaultError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Bijection between observed labels and `0..k`, classes sorted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    column: String,
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit on training labels. A missing label is an error.
    pub fn fit(column: impl Into<String>, labels: &[Option<String>]) -> Result<Self> {
        let column = column.into();
        let mut classes = BTreeSet::new();
        for (row, label) in labels.iter().enumerate() {
            match label {
                Some(l) => {
                    classes.insert(l.clone());
                }
                None => {
                    return Err(SensorFaultError::DataError(format!(
                        "missing label in column '{}' at row {}",
                        column, row
                    )))
                }
            }
        }
        if classes.is_empty() {
            return Err(SensorFaultError::DataError(format!(
                "no labels to fit in column '{}'",
                column
            )));
        }

        Ok(Self {
            column,
            classes: classes.into_iter().collect(),
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn encode_label(&self, label: &str) -> Result<i64> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map(|idx| idx as i64)
            .map_err(|_| SensorFaultError::UnseenLabel {
                column: self.column.clone(),
                label: label.to_string(),
            })
    }

    pub fn encode(&self, labels: &[Option<String>]) -> Result<Array1<i64>> {
        labels
            .iter()
            .enumerate()
            .map(|(row, label)| match label {
                Some(l) => self.encode_label(l),
                None => Err(SensorFaultError::DataError(format!(
                    "missing label in column '{}' at row {}",
                    self.column, row
                ))),
            })
            .collect::<Result<Vec<i64>>>()
            .map(Array1::from)
    }

    pub fn decode(&self, codes: &[i64]) -> Result<Vec<String>> {
        codes
            .iter()
            .map(|&code| {
                usize::try_from(code)
                    .ok()
                    .and_then(|idx| self.classes.get(idx))
                    .cloned()
                    .ok_or_else(|| SensorFaultError::InvalidParameter {
                        name: "code".to_string(),
                        value: code.to_string(),
                        reason: format!("expected a code in 0..{}", self.classes.len()),
                    })
            })
            .collect()
    }
}
