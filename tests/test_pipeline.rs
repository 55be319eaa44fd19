//! Integration test: full training run (ingest → validate → transform → train → predict)

use chrono::Local;
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use sensor_fault::drift::DriftReport;
use sensor_fault::pipeline::{PipelineOutcome, StageConfigs, TrainPipeline};
use sensor_fault::prelude::*;
use sensor_fault::utils::{load_array, load_object, read_csv, read_yaml_file, write_csv};
use std::fs;
use std::path::{Path, PathBuf};

const N_SENSORS: usize = 19;

const MODEL_DOC: &str = r#"
grid_search:
  cv: 3
  scoring: f1
model_selection:
  tree:
    model: decision_tree
    search_param_grid:
      max_depth: [3, null]
  knn:
    model: k_nearest_neighbors
    params:
      n_neighbors: 5
"#;

/// 200 rows, one in five faulty; faulty rows read high on the first three sensors
fn create_sensor_dataset() -> DataFrame {
    let n = 200;
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let labels: Vec<&str> = (0..n).map(|i| if i % 5 == 0 { "pos" } else { "neg" }).collect();

    let mut columns: Vec<Column> = (0..N_SENSORS)
        .map(|j| {
            let values: Vec<f64> = labels
                .iter()
                .map(|&l| {
                    let shift = if l == "pos" && j < 3 { 4.0 } else { 0.0 };
                    rng.gen::<f64>() + shift
                })
                .collect();
            Column::new(format!("s_{:03}", j).into(), values)
        })
        .collect();
    columns.push(Column::new("class".into(), labels));

    DataFrame::new(columns).unwrap()
}

fn write_inputs(dir: &Path, df: &mut DataFrame, schema_names: &[String]) -> (PathBuf, PathBuf, PathBuf) {
    let data = dir.join("sensor.csv");
    write_csv(&data, df).unwrap();

    let schema = dir.join("schema.yaml");
    let mut doc = String::from("columns:\n");
    for name in schema_names {
        doc.push_str(&format!("  - {}\n", name));
    }
    fs::write(&schema, doc).unwrap();

    let model = dir.join("model.yaml");
    fs::write(&model, MODEL_DOC).unwrap();
    (data, schema, model)
}

fn configs(dir: &Path, schema: &Path, model: &Path, expected: f64) -> StageConfigs {
    let pipeline = TrainingPipelineConfig::new(dir.join("artifact"), Local::now()).with_schema_file(schema);
    let mut configs = StageConfigs::new(&pipeline);
    configs.trainer = configs.trainer.with_model_config(model).with_expected_score(expected);
    configs
}

#[test]
fn test_full_training_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut df = create_sensor_dataset();
    let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
    assert_eq!(names.len(), 20);
    let (data, schema, model) = write_inputs(dir.path(), &mut df, &names);

    let configs = configs(dir.path(), &schema, &model, 0.6);
    let pipeline = TrainPipeline::new(configs.clone()).unwrap();
    let outcome = pipeline.run(&CsvDataSource::new(&data)).unwrap();

    let artifact = match outcome {
        PipelineOutcome::Completed(artifact) => artifact,
        PipelineOutcome::ValidationFailed(v) => panic!("validation failed: {}", v.message),
    };
    assert!(artifact.best_score >= 0.6);
    assert!(artifact.metric_artifact.accuracy > 0.9);
    assert!(["tree", "knn"].contains(&artifact.best_model_name.as_str()));

    // 19 scaled sensors plus the encoded label in the last column
    let train_arr = load_array(&configs.transformation.transformed_train_file_path).unwrap();
    let test_arr = load_array(&configs.transformation.transformed_test_file_path).unwrap();
    assert_eq!(train_arr.ncols(), N_SENSORS + 1);
    assert_eq!(test_arr.ncols(), N_SENSORS + 1);
    // Held-out rows are never resampled
    let test_rows = read_csv(&configs.ingestion.testing_file_path).unwrap().height();
    assert_eq!(test_rows, 40);
    assert_eq!(test_arr.nrows(), test_rows);

    // Train and test come from the same distribution
    let report: DriftReport = read_yaml_file(&configs.validation.drift_report_file_path).unwrap();
    assert_eq!(report.number_of_columns, 20);
    assert!(!report.dataset_drift);

    // Serving path: raw table in, label strings out
    let packaged: SensorFaultModel = load_object(&artifact.trained_model_file_path).unwrap();
    let encoder: LabelEncoder = load_object(&configs.transformation.label_encoder_object_file_path).unwrap();
    let codes = packaged.predict(&df).unwrap();
    let predicted = encoder.decode(&codes.to_vec()).unwrap();

    let truth = df.column("class").unwrap().as_materialized_series().clone();
    let truth: Vec<&str> = truth.str().unwrap().into_no_null_iter().collect();
    let correct = predicted.iter().zip(&truth).filter(|(p, t)| p.as_str() == **t).count();
    assert!(correct as f64 / truth.len() as f64 > 0.9);
}

#[test]
fn test_validation_failure_stops_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let mut df = df!(
        "a" => &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0],
        "b" => &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0],
        "c" => &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0],
        "class" => &["neg", "pos", "neg", "pos", "neg", "pos", "neg", "pos", "neg", "pos"]
    )
    .unwrap();
    let names: Vec<String> = ["a", "b", "c", "d", "class"].iter().map(|s| s.to_string()).collect();
    let (data, schema, model) = write_inputs(dir.path(), &mut df, &names);

    let configs = configs(dir.path(), &schema, &model, 0.6);
    let outcome = TrainPipeline::new(configs.clone())
        .unwrap()
        .run(&CsvDataSource::new(&data))
        .unwrap();

    match outcome {
        PipelineOutcome::ValidationFailed(v) => {
            assert!(!v.validation_status);
            assert!(v.message.contains("Columns are missing in training dataframe."));
            assert!(v.message.contains("Columns are missing in test dataframe."));
            assert_eq!(v.drift_status, None);
        }
        PipelineOutcome::Completed(_) => panic!("expected validation failure"),
    }
    assert!(!configs.validation.drift_report_file_path.exists());
    assert!(!configs.transformation.transformed_train_file_path.exists());
}

#[test]
fn test_unreachable_expected_score() {
    let dir = tempfile::tempdir().unwrap();
    let mut df = create_sensor_dataset();
    let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
    let (data, schema, model) = write_inputs(dir.path(), &mut df, &names);

    let configs = configs(dir.path(), &schema, &model, 1.01);
    let err = TrainPipeline::new(configs.clone())
        .unwrap()
        .run(&CsvDataSource::new(&data))
        .unwrap_err();

    assert!(matches!(err.root(), SensorFaultError::NoAcceptableModel { expected, .. } if *expected == 1.01));
    assert!(err.to_string().starts_with("[model_trainer::select_best_model]"));
    assert!(!configs.trainer.trained_model_file_path.exists());
}
