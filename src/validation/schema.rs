//! Schema document and schema checks

use crate::error::{SensorFaultError, Result};
use crate::preprocessing::{column_kind, ColumnKind};
use crate::utils::read_yaml_file;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// One expected column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    /// Declared dtype as written in the document (`int64`, `category`, ...)
    pub dtype: Option<String>,
}

impl ColumnSpec {
    /// Kind implied by the declared dtype, if recognized
    pub fn kind(&self) -> Option<ColumnKind> {
        let dtype = self.dtype.as_deref()?.to_ascii_lowercase();
        if dtype.starts_with("int")
            || dtype.starts_with("uint")
            || dtype.starts_with("float")
            || dtype == "number"
            || dtype == "numeric"
        {
            Some(ColumnKind::Numeric)
        } else if matches!(
            dtype.as_str(),
            "category" | "categorical" | "object" | "str" | "string" | "bool" | "boolean"
        ) {
            Some(ColumnKind::Categorical)
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawColumn {
    Name(String),
    Typed(BTreeMap<String, String>),
}

#[derive(Debug, Deserialize)]
struct RawSchema {
    columns: Vec<RawColumn>,
    #[serde(default)]
    numerical_columns: Vec<String>,
}

/// Expected table layout, immutable once loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnSpec>,
    numerical_columns: Vec<String>,
}

impl Schema {
    /// Build a schema from bare column names
    pub fn from_names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: names
                .into_iter()
                .map(|n| ColumnSpec { name: n.into(), dtype: None })
                .collect(),
            numerical_columns: Vec::new(),
        }
    }

    /// Build a schema from `(name, dtype)` pairs
    pub fn from_specs(columns: Vec<ColumnSpec>) -> Self {
        Self { columns, numerical_columns: Vec::new() }
    }

    /// Parse a YAML schema document
    pub fn from_yaml_str(doc: &str) -> Result<Self> {
        let raw: RawSchema = serde_yaml::from_str(doc)
            .map_err(|e| SensorFaultError::ConfigError(format!("malformed schema: {}", e)))?;
        Self::from_raw(raw)
    }

    /// Load a YAML schema document from disk
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        Self::from_raw(read_yaml_file(path)?)
    }

    fn from_raw(raw: RawSchema) -> Result<Self> {
        if raw.columns.is_empty() {
            return Err(SensorFaultError::ConfigError(
                "schema lists no columns".to_string(),
            ));
        }

        let mut columns = Vec::with_capacity(raw.columns.len());
        for entry in raw.columns {
            match entry {
                RawColumn::Name(name) => columns.push(ColumnSpec { name, dtype: None }),
                RawColumn::Typed(map) => {
                    if map.len() != 1 {
                        return Err(SensorFaultError::ConfigError(format!(
                            "schema column entry must map one name to one dtype, got {} entries",
                            map.len()
                        )));
                    }
                    for (name, dtype) in map {
                        columns.push(ColumnSpec { name, dtype: Some(dtype) });
                    }
                }
            }
        }

        Ok(Self { columns, numerical_columns: raw.numerical_columns })
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn numerical_columns(&self) -> &[String] {
        &self.numerical_columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// True iff the table has exactly as many columns as the schema expects
pub fn validate_column_count(df: &DataFrame, schema: &Schema) -> bool {
    df.width() == schema.len()
}

/// Schema columns absent from the table, in schema order
pub fn missing_columns(df: &DataFrame, schema: &Schema) -> Vec<String> {
    let present: HashSet<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();

    schema
        .columns()
        .iter()
        .filter(|c| !present.contains(&c.name))
        .map(|c| c.name.clone())
        .collect()
}

/// Columns whose observed kind differs from the declared one.
/// Columns without a recognized declared dtype, or absent from the table,
/// are not reported here.
pub fn mismatched_types(df: &DataFrame, schema: &Schema) -> Vec<String> {
    schema
        .columns()
        .iter()
        .filter_map(|spec| {
            let expected = spec.kind()?;
            let column = df.column(&spec.name).ok()?;
            let observed = column_kind(column.dtype());
            (observed != expected).then(|| {
                format!("{} (expected {:?}, found {:?})", spec.name, expected, observed)
            })
        })
        .collect()
}
