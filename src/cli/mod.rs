//! Command-line interface
//!
//! `train` runs the full pipeline on a CSV export; `predict` scores a CSV
//! with a packaged model and decodes the classes back to label strings.

use clap::{Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::constants::{
    ARTIFACT_DIR, DATA_INGESTION_TRAIN_TEST_SPLIT_RATIO, LOG_DIR, MODEL_TRAINER_EXPECTED_SCORE, MODEL_TRAINER_MODEL_CONFIG_FILE_PATH,
    SCHEMA_FILE_PATH, TARGET_COLUMN,
};
use crate::config::TrainingPipelineConfig;
use crate::error::{PipelineStage, StageContext};
use crate::estimator::SensorFaultModel;
use crate::ingestion::CsvDataSource;
use crate::pipeline::{PipelineOutcome, StageConfigs, TrainPipeline};
use crate::preprocessing::LabelEncoder;
use crate::utils::{load_object, read_csv, write_csv};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    eprint!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    eprintln!("{} {}", ok("done"), dim(detail));
}

// Status goes to stderr so predictions can be piped from stdout
fn section(title: &str) {
    eprintln!();
    eprintln!("  {}", title.white().bold());
    eprintln!("  {}", dim(&"─".repeat(56)));
}

fn kv(key: &str, val: &str) {
    eprintln!("  {:<18} {}", muted(key), val.white());
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "sensor-fault")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sensor fault classification: training pipeline and batch prediction")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run ingestion, validation, transformation and model training
    Train {
        /// Raw sensor CSV export
        #[arg(short, long)]
        data: PathBuf,

        /// Schema document
        #[arg(long, default_value = SCHEMA_FILE_PATH)]
        schema: PathBuf,

        /// Model search document
        #[arg(long, default_value = MODEL_TRAINER_MODEL_CONFIG_FILE_PATH)]
        model_config: PathBuf,

        /// Root directory for timestamped run artifacts
        #[arg(long, default_value = ARTIFACT_DIR)]
        artifact_dir: PathBuf,

        /// Minimum cross-validated score the best model must reach
        #[arg(long, default_value_t = MODEL_TRAINER_EXPECTED_SCORE)]
        expected_score: f64,

        /// Fraction of rows held out for testing
        #[arg(long, default_value_t = DATA_INGESTION_TRAIN_TEST_SPLIT_RATIO)]
        split_ratio: f64,

        /// Also check column names and declared types
        #[arg(long)]
        strict_schema: bool,

        /// Print the trainer artifact as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Directory for log files
        #[arg(long, default_value = LOG_DIR)]
        log_dir: PathBuf,
    },

    /// Predict classes for a CSV with a trained model
    Predict {
        /// Packaged model file
        #[arg(short, long)]
        model: PathBuf,

        /// Fitted label encoder file
        #[arg(short, long)]
        encoder: PathBuf,

        /// Input data file
        #[arg(short, long)]
        data: PathBuf,

        /// Output CSV; printed to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Options of the `train` command beyond the input paths
#[derive(Debug, Clone, Copy)]
pub struct TrainOptions {
    pub expected_score: f64,
    pub split_ratio: f64,
    pub strict_schema: bool,
    pub json: bool,
}

pub fn cmd_train(
    data_path: &Path,
    schema: &Path,
    model_config: &Path,
    artifact_dir: &Path,
    options: TrainOptions,
) -> anyhow::Result<()> {
    section("Train");

    let pipeline_config = TrainingPipelineConfig::new(artifact_dir, chrono::Local::now()).with_schema_file(schema);
    let mut configs = StageConfigs::new(&pipeline_config);
    configs.ingestion = configs.ingestion.with_split_ratio(options.split_ratio);
    configs.validation = configs.validation.with_strict_schema(options.strict_schema);
    configs.trainer = configs
        .trainer
        .with_model_config(model_config)
        .with_expected_score(options.expected_score);

    step_run("Loading configuration");
    let pipeline = TrainPipeline::new(configs)?;
    step_done(&schema.display().to_string());

    step_run(&format!("Running pipeline on {}", data_path.display()));
    let start = Instant::now();
    let outcome = pipeline.run(&CsvDataSource::new(data_path))?;
    step_done(&format!("{:?}", start.elapsed()));

    match outcome {
        PipelineOutcome::Completed(artifact) => {
            eprintln!();
            kv("Model", &artifact.best_model_name.cyan().to_string());
            kv("CV score", &format!("{:.4}", artifact.best_score));
            kv("Accuracy", &format!("{:.4}", artifact.metric_artifact.accuracy));
            kv("Precision", &format!("{:.4}", artifact.metric_artifact.precision_score));
            kv("Recall", &format!("{:.4}", artifact.metric_artifact.recall_score));
            kv("F1", &format!("{:.4}", artifact.metric_artifact.f1_score));
            kv("Saved to", &artifact.trained_model_file_path.display().to_string());
            eprintln!();
            if options.json {
                println!("{}", serde_json::to_string_pretty(&artifact)?);
            }
            Ok(())
        }
        PipelineOutcome::ValidationFailed(artifact) => {
            eprintln!();
            eprintln!("  {} {}", "validation failed:".red().bold(), artifact.message.trim());
            eprintln!();
            anyhow::bail!("data validation failed")
        }
    }
}

pub fn cmd_predict(model_path: &Path, encoder_path: &Path, data_path: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    section("Predict");

    step_run("Loading model");
    let model: SensorFaultModel = load_object(model_path).stage(PipelineStage::Prediction, "load_model")?;
    let encoder: LabelEncoder = load_object(encoder_path).stage(PipelineStage::Prediction, "load_label_encoder")?;
    step_done(&model.to_string());

    step_run("Scoring");
    let start = Instant::now();
    let df = read_csv(data_path).stage(PipelineStage::Prediction, "read_input")?;
    let codes = model.predict(&df).stage(PipelineStage::Prediction, "predict")?;
    let labels = encoder.decode(&codes.to_vec()).stage(PipelineStage::Prediction, "decode_labels")?;
    step_done(&format!("{} rows in {:?}", labels.len(), start.elapsed()));

    let mut out = DataFrame::new(vec![Column::new(TARGET_COLUMN.into(), labels)])?;
    match output {
        Some(path) => {
            write_csv(path, &mut out)?;
            kv("Saved to", &path.display().to_string());
        }
        None => {
            CsvWriter::new(std::io::stdout()).include_header(true).finish(&mut out)?;
        }
    }
    Ok(())
}
