use approx::assert_abs_diff_eq;
use std::fs;
use tempfile::tempdir;
use tumor_lr::fixtures::{SyntheticTumors, to_raw_csv};
use tumor_lr::loader::load_dataset;
use tumor_lr::pipeline::run_analysis;
use tumor_lr::report::write_report;
use tumor_lr::{AnalysisConfig, AnalysisError, Diagnosis};

fn quick_config() -> AnalysisConfig {
    AnalysisConfig {
        cv_folds: 5,
        n_lambda: 10,
        pca_components: 3,
        sweep_max_components: 4,
        ..AnalysisConfig::default()
    }
}

#[test]
fn raw_file_loads_to_reference_shape() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.csv");
    let original = SyntheticTumors::new(569).seed(123).build();
    fs::write(&path, to_raw_csv(&original).unwrap()).unwrap();

    let loaded = load_dataset(&path).unwrap();
    assert_eq!(loaded.dim(), (569, 31));
    assert_eq!(loaded.class_counts(), [357, 212]);
    assert_eq!(loaded.labels, original.labels);
    for (a, b) in loaded.features.iter().zip(original.features.iter()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
    }

    let split = loaded.stratified_split(0.8, 123).unwrap();
    assert_eq!(split.training.len(), 456);
    assert_eq!(split.testing.len(), 113);
}

#[test]
fn split_preserves_class_shares() {
    let data = SyntheticTumors::new(569).seed(5).build();
    let split = data.stratified_split(0.8, 99).unwrap();
    let (train, test) = data.partition(&split).unwrap();

    let share = |d: &tumor_lr::Dataset| {
        d.class_counts()[Diagnosis::Malignant.index()] as f64 / d.n_samples() as f64
    };
    assert_abs_diff_eq!(share(&train), share(&data), epsilon = 0.01);
    assert_abs_diff_eq!(share(&test), share(&data), epsilon = 0.01);
    assert_abs_diff_eq!(test.n_samples() as f64 / 569.0, 0.2, epsilon = 0.01);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let result = load_dataset(dir.path().join("absent.csv"));
    assert!(matches!(result, Err(AnalysisError::Io(_))));
}

#[test]
fn config_file_overrides_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.toml");
    fs::write(&path, "seed = 42\ncv_folds = 5\nrun_loocv = false\n").unwrap();

    let config = AnalysisConfig::from_toml_file(&path).unwrap();
    assert_eq!(config.seed, 42);
    assert_eq!(config.cv_folds, 5);
    assert!(!config.run_loocv);
    assert_abs_diff_eq!(config.correlation_cutoff, 0.9);
}

#[test]
fn full_run_from_disk_with_parallel_loocv() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.csv");
    let data = SyntheticTumors::new(70).seed(31).build();
    fs::write(&path, to_raw_csv(&data).unwrap()).unwrap();

    let config = AnalysisConfig {
        data_path: Some(path),
        parallel: true,
        ..quick_config()
    };
    let outcome = run_analysis(&config, None).unwrap();

    let loocv = outcome.loocv.as_ref().unwrap();
    assert_eq!(loocv.n, 70);
    for evaluation in [&loocv.ridge, &loocv.lasso, &loocv.pca] {
        assert_eq!(evaluation.confusion.total(), 70);
        let errors = evaluation.confusion.false_positives() + evaluation.confusion.false_negatives();
        assert_abs_diff_eq!(
            evaluation.metrics.accuracy + errors as f64 / 70.0,
            1.0,
            epsilon = 1e-12
        );
    }

    let mut rendered = Vec::new();
    write_report(&mut rendered, &outcome).unwrap();
    let text = String::from_utf8(rendered).unwrap();
    assert!(text.contains("dimensions: 70 x 31"));
    assert!(text.contains("Leave-one-out cross-validation (70 folds)"));
    assert!(text.contains("lambda.min"));
}
