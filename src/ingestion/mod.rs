//! Data ingestion stage
//!
//! Pulls the raw sensor table from a [`DataSource`], exports it to the
//! feature store and writes a seeded train/test split.

use crate::config::DataIngestionConfig;
use crate::entity::DataIngestionArtifact;
use crate::error::{PipelineStage, SensorFaultError, Result, StageContext};
use crate::utils::{read_csv, write_csv};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};
use tracing::info;

const STAGE: PipelineStage = PipelineStage::DataIngestion;

/// Where raw records come from. Database-backed sources implement this
/// outside the crate and are handed to the pipeline by the caller.
pub trait DataSource: Send + Sync {
    fn load(&self) -> Result<DataFrame>;
}

/// CSV export of the sensor records
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    path: PathBuf,
}

impl CsvDataSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for CsvDataSource {
    fn load(&self) -> Result<DataFrame> {
        read_csv(&self.path)
    }
}

/// Shuffle with a fixed seed and cut off the test share.
/// The test split gets `ceil(n * ratio)` rows; both splits must be non-empty.
pub fn train_test_split(df: &DataFrame, test_ratio: f64, seed: u64) -> Result<(DataFrame, DataFrame)> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(SensorFaultError::InvalidParameter {
            name: "train_test_split_ratio".to_string(),
            value: test_ratio.to_string(),
            reason: "must be strictly between 0 and 1".to_string(),
        });
    }

    let n = df.height();
    let n_test = (n as f64 * test_ratio).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(SensorFaultError::DataError(format!(
            "cannot split {} rows with test ratio {}",
            n, test_ratio
        )));
    }

    let mut indices: Vec<IdxSize> = (0..n as IdxSize).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_idx = IdxCa::from_vec("idx".into(), indices[..n_test].to_vec());
    let train_idx = IdxCa::from_vec("idx".into(), indices[n_test..].to_vec());
    Ok((df.take(&train_idx)?, df.take(&test_idx)?))
}

pub struct DataIngestion {
    config: DataIngestionConfig,
}

impl DataIngestion {
    pub fn new(config: DataIngestionConfig) -> Self {
        Self { config }
    }

    /// Write the raw table to the feature store and return it
    pub fn export_data_into_feature_store(&self, source: &dyn DataSource) -> Result<DataFrame> {
        let mut df = source.load()?;
        if df.height() == 0 || df.width() == 0 {
            return Err(SensorFaultError::DataError("data source returned an empty table".to_string()));
        }
        write_csv(&self.config.feature_store_file_path, &mut df)?;
        info!(
            rows = df.height(),
            columns = df.width(),
            path = %self.config.feature_store_file_path.display(),
            "Exported data into feature store"
        );
        Ok(df)
    }

    pub fn split_data_as_train_test(&self, df: &DataFrame) -> Result<DataIngestionArtifact> {
        let (mut train, mut test) =
            train_test_split(df, self.config.train_test_split_ratio, self.config.random_state)?;
        write_csv(&self.config.training_file_path, &mut train)?;
        write_csv(&self.config.testing_file_path, &mut test)?;
        info!(train_rows = train.height(), test_rows = test.height(), "Performed train test split");

        Ok(DataIngestionArtifact {
            trained_file_path: self.config.training_file_path.clone(),
            test_file_path: self.config.testing_file_path.clone(),
        })
    }

    pub fn initiate_data_ingestion(&self, source: &dyn DataSource) -> Result<DataIngestionArtifact> {
        info!("Entered data ingestion");
        let df = self
            .export_data_into_feature_store(source)
            .stage(STAGE, "export_feature_store")?;
        self.split_data_as_train_test(&df).stage(STAGE, "train_test_split")
    }
}
