//! k-fold selection of the penalty strength for [`PenalizedLogistic`].

use crate::classifier::Classifier;
use crate::error::{AnalysisError, Result};
use crate::linear_model::penalized::{PenalizedLogistic, Penalty, lambda_path};
use crate::metrics::binomial_deviance;
use crate::{Matrix, Vector};
use log::{debug, info};
use ndarray::Axis;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

#[derive(Clone, Copy, Debug)]
pub struct CvOptions {
    pub penalty: Penalty,
    pub n_folds: usize,
    pub n_lambda: usize,
    pub seed: u64,
}

impl CvOptions {
    pub fn new(penalty: Penalty) -> Self {
        Self {
            penalty,
            n_folds: 10,
            n_lambda: 100,
            seed: 123,
        }
    }

    pub fn n_folds(mut self, n_folds: usize) -> Self {
        self.n_folds = n_folds;
        self
    }

    pub fn n_lambda(mut self, n_lambda: usize) -> Self {
        self.n_lambda = n_lambda;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Cross-validated deviance curve and the model refitted at `lambda_min`.
#[derive(Clone, Debug)]
pub struct CvResult {
    pub penalty: Penalty,
    pub lambdas: Vec<f64>,
    pub cv_mean: Vec<f64>,
    pub cv_se: Vec<f64>,
    pub lambda_min: f64,
    pub lambda_1se: f64,
    pub model: PenalizedLogistic,
}

impl CvResult {
    pub fn best_index(&self) -> usize {
        self.lambdas
            .iter()
            .position(|&l| l == self.lambda_min)
            .unwrap_or(0)
    }
}

/// Seeded fold labels: a shuffled `0, 1, .., k-1, 0, 1, ..` sequence.
pub fn fold_assignment(n_samples: usize, n_folds: usize, seed: u64) -> Result<Vec<usize>> {
    if n_folds == 0 || n_folds > n_samples {
        return Err(AnalysisError::InvalidParameter(format!(
            "n_folds must be between 1 and the number of samples ({}), got {}",
            n_samples, n_folds
        )));
    }
    let mut folds: Vec<usize> = (0..n_samples).map(|i| i % n_folds).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    folds.shuffle(&mut rng);
    Ok(folds)
}

pub fn cross_validate(x: &Matrix, y: &Vector, options: CvOptions) -> Result<CvResult> {
    if x.nrows() != y.len() {
        return Err(AnalysisError::DimensionMismatch(
            "Number of samples in X and y must match".to_string(),
        ));
    }
    if options.n_folds < 3 || options.n_folds > x.nrows() {
        return Err(AnalysisError::InvalidParameter(format!(
            "n_folds must be between 3 and the number of samples ({}), got {}",
            x.nrows(),
            options.n_folds
        )));
    }

    let lambdas = lambda_path(x, y, options.penalty, options.n_lambda)?;
    let folds = fold_assignment(x.nrows(), options.n_folds, options.seed)?;
    info!(
        "Cross-validating {} over {} lambdas ({:.3e} .. {:.3e}) with {} folds",
        options.penalty,
        lambdas.len(),
        lambdas[0],
        lambdas[lambdas.len() - 1],
        options.n_folds
    );

    // fold_deviance[f][l]: mean deviance of fold f's rows under lambda l.
    let mut fold_deviance = Vec::with_capacity(options.n_folds);
    let mut fold_sizes = Vec::with_capacity(options.n_folds);

    for fold in 0..options.n_folds {
        let train: Vec<usize> = (0..folds.len()).filter(|&i| folds[i] != fold).collect();
        let test: Vec<usize> = (0..folds.len()).filter(|&i| folds[i] == fold).collect();

        let x_train = x.select(Axis(0), &train);
        let y_train = y.select(Axis(0), &train);
        let x_test = x.select(Axis(0), &test);
        let y_test = y.select(Axis(0), &test);

        let path = PenalizedLogistic::fit_path(&x_train, &y_train, options.penalty, &lambdas, 50, 1e-7)?;
        let deviances = path
            .iter()
            .map(|model| binomial_deviance(&y_test, &model.predict_proba(&x_test)?))
            .collect::<Result<Vec<f64>>>()?;
        debug!("Fold {}: {} held-out rows", fold, test.len());

        fold_deviance.push(deviances);
        fold_sizes.push(test.len() as f64);
    }

    let n = x.nrows() as f64;
    let k = options.n_folds as f64;
    let mut cv_mean = Vec::with_capacity(lambdas.len());
    let mut cv_se = Vec::with_capacity(lambdas.len());
    for l in 0..lambdas.len() {
        let mean = fold_deviance
            .iter()
            .zip(fold_sizes.iter())
            .map(|(d, &size)| d[l] * size)
            .sum::<f64>()
            / n;
        let variance = fold_deviance
            .iter()
            .zip(fold_sizes.iter())
            .map(|(d, &size)| size * (d[l] - mean).powi(2))
            .sum::<f64>()
            / n;
        cv_mean.push(mean);
        cv_se.push((variance / (k - 1.0)).sqrt());
    }

    let best = cv_mean
        .iter()
        .enumerate()
        .fold(0, |best, (i, &m)| if m < cv_mean[best] { i } else { best });
    let lambda_min = lambdas[best];
    let threshold = cv_mean[best] + cv_se[best];
    let lambda_1se = lambdas
        .iter()
        .zip(cv_mean.iter())
        .filter(|(_, m)| **m <= threshold)
        .map(|(&l, _)| l)
        .fold(lambda_min, f64::max);

    let mut model = PenalizedLogistic::new(options.penalty).lambda(lambda_min);
    model.fit(x, y)?;
    info!(
        "{}: lambda.min = {:.4e} (deviance {:.4}), lambda.1se = {:.4e}, {} non-zero coefficients",
        options.penalty,
        lambda_min,
        cv_mean[best],
        lambda_1se,
        model.selected_features().len()
    );

    Ok(CvResult {
        penalty: options.penalty,
        lambdas,
        cv_mean,
        cv_se,
        lambda_min,
        lambda_1se,
        model,
    })
}
