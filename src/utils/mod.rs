//! File helpers shared by the pipeline stages
//!
//! Fitted objects and numeric arrays are stored as bincode blobs, documents
//! as YAML, tables as CSV.

use crate::config::constants::MISSING_VALUE_TOKEN;
use crate::error::{SensorFaultError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::debug;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Read a YAML document into `T`
pub fn read_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| {
        SensorFaultError::ConfigError(format!("cannot open {}: {}", path.display(), e))
    })?;
    serde_yaml::from_reader(BufReader::new(file)).map_err(|e| {
        SensorFaultError::ConfigError(format!("malformed {}: {}", path.display(), e))
    })
}

/// Write `content` as YAML, creating parent directories.
/// With `replace`, an existing file is removed first.
pub fn write_yaml_file<T: Serialize>(path: &Path, content: &T, replace: bool) -> Result<()> {
    if replace && path.exists() {
        fs::remove_file(path)?;
    }
    ensure_parent(path)?;
    let file = File::create(path)?;
    serde_yaml::to_writer(BufWriter::new(file), content)?;
    Ok(())
}

/// Serialize an object to a binary blob
pub fn save_object<T: Serialize>(path: &Path, obj: &T) -> Result<()> {
    debug!(path = %path.display(), "Saving object");
    ensure_parent(path)?;
    let file = File::create(path)?;
    bincode::serialize_into(BufWriter::new(file), obj)?;
    Ok(())
}

/// Deserialize an object from a binary blob
pub fn load_object<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!(path = %path.display(), "Loading object");
    let file = File::open(path)?;
    Ok(bincode::deserialize_from(BufReader::new(file))?)
}

/// Save a numeric matrix
pub fn save_array(path: &Path, array: &Array2<f64>) -> Result<()> {
    save_object(path, array)
}

/// Load a numeric matrix
pub fn load_array(path: &Path) -> Result<Array2<f64>> {
    load_object(path)
}

/// Load a CSV table; the literal `na` is read as missing
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)?;

    let parse_opts = CsvParseOptions::default().with_null_values(Some(
        NullValues::AllColumnsSingle(MISSING_VALUE_TOKEN.into()),
    ));

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(10_000))
        .with_parse_options(parse_opts)
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|e| SensorFaultError::DataError(format!("{}: {}", path.display(), e)))
}

/// Write a table as CSV with a header row
pub fn write_csv(path: &Path, df: &mut DataFrame) -> Result<()> {
    ensure_parent(path)?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::collections::BTreeMap;

    #[test]
    fn test_array_roundtrip_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/train.bin");
        let arr = array![[1.0, 2.0], [3.0, 4.0]];

        save_array(&path, &arr).unwrap();
        assert_eq!(load_array(&path).unwrap(), arr);
    }

    #[test]
    fn test_yaml_replace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.yaml");
        let mut doc = BTreeMap::new();
        doc.insert("dataset_drift".to_string(), false);

        write_yaml_file(&path, &doc, false).unwrap();
        doc.insert("dataset_drift".to_string(), true);
        write_yaml_file(&path, &doc, true).unwrap();

        let back: BTreeMap<String, bool> = read_yaml_file(&path).unwrap();
        assert_eq!(back["dataset_drift"], true);
    }

    #[test]
    fn test_missing_yaml_is_config_error() {
        let err = read_yaml_file::<BTreeMap<String, String>>(Path::new("/nonexistent/schema.yaml"))
            .unwrap_err();
        assert!(matches!(err, SensorFaultError::ConfigError(_)));
    }

    #[test]
    fn test_csv_na_is_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        fs::write(&path, "class,aa_000\nneg,1.5\npos,na\n").unwrap();

        let df = read_csv(&path).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("aa_000").unwrap().null_count(), 1);
    }
}
