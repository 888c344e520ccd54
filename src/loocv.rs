//! Leave-one-out cross-validation of the ridge, lasso and PCA-logistic
//! models.
//!
//! Every fold refits all three models on the dataset minus one row and
//! predicts that row. Each of the N rows is held out exactly once, so a run
//! over the 569-row reference file reports 569 folds and every aggregate
//! confusion matrix totals N. The penalty strengths and the component count are
//! fixed up front in a [`LoocvConfig`] and shared read-only by all folds.

use crate::classifier::Classifier;
use crate::dataset::{Dataset, Diagnosis};
use crate::decomposition::PcaLogistic;
use crate::error::{AnalysisError, Result};
use crate::evaluation::Evaluation;
use crate::linear_model::{PenalizedLogistic, Penalty};
use crate::metrics::ConfusionMatrix;
use log::{debug, info, warn};
use rayon::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoocvConfig {
    pub ridge_lambda: f64,
    pub lasso_lambda: f64,
    pub pca_components: usize,
}

/// Predictions for the single held-out row of one fold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FoldOutcome {
    pub observed: Diagnosis,
    pub ridge: Diagnosis,
    pub lasso: Diagnosis,
    pub pca: Diagnosis,
}

/// One slot per fold, each written exactly once.
#[derive(Debug)]
pub struct FoldAccumulator {
    slots: Vec<Option<FoldOutcome>>,
}

impl FoldAccumulator {
    pub fn with_capacity(n_folds: usize) -> Self {
        Self {
            slots: vec![None; n_folds],
        }
    }

    pub fn record(&mut self, fold: usize, outcome: FoldOutcome) -> Result<()> {
        let n_folds = self.slots.len();
        let slot = self.slots.get_mut(fold).ok_or_else(|| {
            AnalysisError::InvalidParameter(format!("fold {} out of range for {} folds", fold, n_folds))
        })?;
        if slot.is_some() {
            return Err(AnalysisError::InvalidParameter(format!(
                "fold {} recorded twice",
                fold
            )));
        }
        *slot = Some(outcome);
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// One confusion matrix per model over all folds.
    pub fn finish(self) -> Result<LoocvReport> {
        let n = self.slots.len();
        let outcomes = self
            .slots
            .into_iter()
            .enumerate()
            .map(|(fold, slot)| {
                slot.ok_or_else(|| {
                    AnalysisError::EmptyInput(format!("fold {} has no recorded prediction", fold))
                })
            })
            .collect::<Result<Vec<FoldOutcome>>>()?;

        let observed: Vec<Diagnosis> = outcomes.iter().map(|o| o.observed).collect();
        let confusion = |pick: fn(&FoldOutcome) -> Diagnosis| -> Result<Evaluation> {
            let predicted: Vec<Diagnosis> = outcomes.iter().map(pick).collect();
            Ok(ConfusionMatrix::from_labels(&observed, &predicted)?.into())
        };

        Ok(LoocvReport {
            n,
            ridge: confusion(|o| o.ridge)?,
            lasso: confusion(|o| o.lasso)?,
            pca: confusion(|o| o.pca)?,
        })
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LoocvReport {
    pub n: usize,
    pub ridge: Evaluation,
    pub lasso: Evaluation,
    pub pca: Evaluation,
}

/// Fit the three models without `fold`'s row and predict that row.
pub fn run_fold(dataset: &Dataset, fold: usize, config: LoocvConfig) -> Result<FoldOutcome> {
    fit_and_predict(dataset, fold, config).map_err(|source| AnalysisError::FoldFailed {
        fold,
        source: Box::new(source),
    })
}

fn fit_and_predict(dataset: &Dataset, fold: usize, config: LoocvConfig) -> Result<FoldOutcome> {
    let (training, held_out) = dataset.leave_one_out(fold)?;
    let y = training.label_vector();

    let mut ridge = PenalizedLogistic::new(Penalty::Ridge).lambda(config.ridge_lambda);
    ridge.fit(&training.features, &y)?;

    let mut lasso = PenalizedLogistic::new(Penalty::Lasso).lambda(config.lasso_lambda);
    lasso.fit(&training.features, &y)?;

    let mut pca = PcaLogistic::new(config.pca_components);
    pca.fit(&training.features, &y)?;

    let outcome = FoldOutcome {
        observed: held_out.labels[0],
        ridge: single(ridge.predict(&held_out.features)?)?,
        lasso: single(lasso.predict(&held_out.features)?)?,
        pca: single(pca.predict(&held_out.features)?)?,
    };
    debug!("LOOCV fold {}: {:?}", fold, outcome);
    Ok(outcome)
}

fn single(predictions: Vec<Diagnosis>) -> Result<Diagnosis> {
    predictions
        .first()
        .copied()
        .ok_or_else(|| AnalysisError::EmptyInput("no prediction for the held-out row".to_string()))
}

fn announce(dataset: &Dataset, config: LoocvConfig, mode: &str) {
    info!(
        "Running {} LOOCV over {} rows (ridge lambda {:.4e}, lasso lambda {:.4e}, {} components)",
        mode,
        dataset.n_samples(),
        config.ridge_lambda,
        config.lasso_lambda,
        config.pca_components
    );
    warn!(
        "LOOCV reuses lambdas chosen by cross-validation on the holdout training split; \
         those rows also appear as held-out rows here, so the estimate is mildly optimistic"
    );
}

pub fn run_loocv(dataset: &Dataset, config: LoocvConfig) -> Result<LoocvReport> {
    announce(dataset, config, "sequential");

    let n = dataset.n_samples();
    let mut accumulator = FoldAccumulator::with_capacity(n);
    for fold in 0..n {
        accumulator.record(fold, run_fold(dataset, fold, config)?)?;
        if (fold + 1) % 100 == 0 {
            info!("LOOCV: {}/{} folds done", fold + 1, n);
        }
    }
    accumulator.finish()
}

/// Same folds as [`run_loocv`], spread over the rayon thread pool.
pub fn run_loocv_parallel(dataset: &Dataset, config: LoocvConfig) -> Result<LoocvReport> {
    announce(dataset, config, "parallel");

    let n = dataset.n_samples();
    let outcomes = (0..n)
        .into_par_iter()
        .map(|fold| run_fold(dataset, fold, config).map(|outcome| (fold, outcome)))
        .collect::<Result<Vec<(usize, FoldOutcome)>>>()?;

    let mut accumulator = FoldAccumulator::with_capacity(n);
    for (fold, outcome) in outcomes {
        accumulator.record(fold, outcome)?;
    }
    accumulator.finish()
}
