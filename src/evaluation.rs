//! Scoring fitted classifiers against labelled rows.

use crate::classifier::Classifier;
use crate::dataset::Dataset;
use crate::decomposition::PcaLogistic;
use crate::error::{AnalysisError, Result};
use crate::metrics::{ConfusionMatrix, Metrics};
use log::debug;

#[derive(Clone, Copy, Debug)]
pub struct Evaluation {
    pub confusion: ConfusionMatrix,
    pub metrics: Metrics,
}

impl From<ConfusionMatrix> for Evaluation {
    fn from(confusion: ConfusionMatrix) -> Self {
        Self {
            metrics: confusion.metrics(),
            confusion,
        }
    }
}

/// Predict every row of `dataset` and compare with its labels.
pub fn evaluate<C: Classifier + ?Sized>(model: &C, dataset: &Dataset) -> Result<Evaluation> {
    let predicted = model.predict(&dataset.features)?;
    let confusion = ConfusionMatrix::from_labels(&dataset.labels, &predicted)?;
    Ok(confusion.into())
}

/// One row of the component-count diagnostic.
#[derive(Clone, Copy, Debug)]
pub struct SweepPoint {
    pub n_components: usize,
    pub metrics: Metrics,
}

/// Fit a `PcaLogistic` on `train` for each k in `1..=max_components` and
/// score it on `eval`.
pub fn component_sweep(train: &Dataset, eval: &Dataset, max_components: usize) -> Result<Vec<SweepPoint>> {
    if max_components == 0 || max_components > train.n_features() {
        return Err(AnalysisError::InvalidParameter(format!(
            "max_components must be between 1 and {}, got {}",
            train.n_features(),
            max_components
        )));
    }

    let y = train.label_vector();
    (1..=max_components)
        .map(|k| {
            let mut model = PcaLogistic::new(k);
            model.fit(&train.features, &y)?;
            let evaluation = evaluate(&model, eval)?;
            debug!("{} components: {}", k, evaluation.metrics);
            Ok(SweepPoint {
                n_components: k,
                metrics: evaluation.metrics,
            })
        })
        .collect()
}
