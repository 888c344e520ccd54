//! End-to-end analysis: load, clean, split, fit every model, evaluate.

use crate::config::AnalysisConfig;
use crate::dataset::Dataset;
use crate::decomposition::{Pca, PcaLogistic};
use crate::error::{AnalysisError, Result};
use crate::evaluation::{Evaluation, SweepPoint, component_sweep, evaluate};
use crate::linear_model::{CvOptions, CvResult, LogisticRegression, Penalty, cross_validate};
use crate::loader::load_dataset;
use crate::loocv::{LoocvConfig, LoocvReport, run_loocv, run_loocv_parallel};
use crate::preprocessing::reduce_collinearity;
use crate::report::{FeatureSummary, summarize};
use log::info;

/// Everything a run produces, ready for [`crate::report::write_report`].
#[derive(Clone, Debug)]
pub struct AnalysisOutcome {
    pub dim: (usize, usize),
    pub feature_names: Vec<String>,
    pub feature_summaries: Vec<FeatureSummary>,
    pub class_counts: [usize; 2],
    pub retained_features: Vec<String>,
    pub n_train: usize,
    pub n_test: usize,
    pub ridge_cv: CvResult,
    pub lasso_cv: CvResult,
    pub saturated: LogisticRegression,
    pub reduced: LogisticRegression,
    /// PCA fitted on the training split, for the variance-explained curve.
    pub pca: Pca,
    pub sweep: Vec<SweepPoint>,
    /// Holdout results keyed by model name, in fitting order.
    pub holdout: Vec<(String, Evaluation)>,
    pub loocv: Option<LoocvReport>,
}

impl AnalysisOutcome {
    pub fn holdout_evaluation(&self, name: &str) -> Option<&Evaluation> {
        self.holdout.iter().find(|(n, _)| n == name).map(|(_, e)| e)
    }
}

/// Run the analysis on `dataset`, or on the file at `config.data_path` when
/// no dataset is given.
pub fn run_analysis(config: &AnalysisConfig, dataset: Option<Dataset>) -> Result<AnalysisOutcome> {
    config.validate()?;

    let dataset = match dataset {
        Some(dataset) => dataset,
        None => {
            let path = config.data_path.as_ref().ok_or_else(|| {
                AnalysisError::InvalidParameter("no data path configured".to_string())
            })?;
            load_dataset(path)?
        }
    };
    let (rows, columns) = dataset.dim();
    info!("Dataset: {} rows x {} columns", rows, columns);

    let retained_features =
        reduce_collinearity(&dataset.features, &dataset.feature_names, config.correlation_cutoff)?;

    let split = dataset.stratified_split(config.train_fraction, config.seed)?;
    let (train, test) = dataset.partition(&split)?;
    info!("Holdout split: {} training, {} testing rows", train.n_samples(), test.n_samples());
    let y_train = train.label_vector();

    let cv_options = |penalty| {
        CvOptions::new(penalty)
            .n_folds(config.cv_folds)
            .n_lambda(config.n_lambda)
            .seed(config.seed)
    };
    let ridge_cv = cross_validate(&train.features, &y_train, cv_options(Penalty::Ridge))?;
    let lasso_cv = cross_validate(&train.features, &y_train, cv_options(Penalty::Lasso))?;

    let mut holdout = vec![
        ("ridge".to_string(), evaluate(&ridge_cv.model, &test)?),
        ("lasso".to_string(), evaluate(&lasso_cv.model, &test)?),
    ];

    info!("Fitting saturated logistic regression on {} features", train.n_features());
    let mut saturated = LogisticRegression::new();
    saturated.fit(&train.features, &y_train)?;
    holdout.push(("saturated logistic".to_string(), evaluate(&saturated, &test)?));

    info!("Fitting reduced logistic regression on {} features", retained_features.len());
    let train_reduced = train.select_features(&retained_features)?;
    let test_reduced = test.select_features(&retained_features)?;
    let mut reduced = LogisticRegression::new();
    reduced.fit(&train_reduced.features, &y_train)?;
    holdout.push(("reduced logistic".to_string(), evaluate(&reduced, &test_reduced)?));

    let mut pca = Pca::new().scale(true);
    pca.fit(&train.features)?;

    let sweep_max = config.sweep_max_components.min(train.n_features());
    let sweep = component_sweep(&train, &train, sweep_max)?;

    let mut pca_logistic = PcaLogistic::new(config.pca_components);
    pca_logistic.fit(&train.features, &y_train)?;
    holdout.push((
        format!("PCA logistic ({} components)", config.pca_components),
        evaluate(&pca_logistic, &test)?,
    ));

    for (name, evaluation) in &holdout {
        info!("Holdout {}: {}", name, evaluation.metrics);
    }

    let loocv = if config.run_loocv {
        let loocv_config = LoocvConfig {
            ridge_lambda: ridge_cv.lambda_min,
            lasso_lambda: lasso_cv.lambda_min,
            pca_components: config.pca_components,
        };
        let report = if config.parallel {
            run_loocv_parallel(&dataset, loocv_config)?
        } else {
            run_loocv(&dataset, loocv_config)?
        };
        info!(
            "LOOCV accuracy: ridge {:.4}, lasso {:.4}, PCA {:.4}",
            report.ridge.metrics.accuracy, report.lasso.metrics.accuracy, report.pca.metrics.accuracy
        );
        Some(report)
    } else {
        info!("Skipping LOOCV");
        None
    };

    Ok(AnalysisOutcome {
        dim: (rows, columns),
        feature_names: dataset.feature_names.clone(),
        feature_summaries: summarize(&dataset),
        class_counts: dataset.class_counts(),
        retained_features,
        n_train: train.n_samples(),
        n_test: test.n_samples(),
        ridge_cv,
        lasso_cv,
        saturated,
        reduced,
        pca,
        sweep,
        holdout,
        loocv,
    })
}
