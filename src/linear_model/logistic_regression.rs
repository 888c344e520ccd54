use crate::classifier::Classifier;
use crate::error::{AnalysisError, Result};
use crate::linalg::solve_linear_system;
use crate::{Matrix, Vector};
use log::{debug, warn};
use ndarray::{Axis, s};

/// A fit whose every residual `|y - p|` is below this has separated the
/// classes completely.
const SEPARATION_TOLERANCE: f64 = 1e-6;

/// Maximum-likelihood logistic regression fitted by iteratively reweighted
/// least squares.
#[derive(Clone, Debug)]
pub struct LogisticRegression {
    pub coefficients: Option<Vector>,
    pub intercept: Option<f64>,
    pub deviance: Option<f64>,
    pub converged: bool,
    /// The classes are completely separated; the maximum-likelihood estimate
    /// does not exist and the coefficients are the last IRLS iterate.
    pub separated: bool,
    pub iterations: usize,
    fit_intercept: bool,
    max_iterations: usize,
    tolerance: f64,
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            deviance: None,
            converged: false,
            separated: false,
            iterations: 0,
            fit_intercept: true,
            max_iterations: 25,
            tolerance: 1e-8,
        }
    }

    pub fn with_params(max_iterations: usize, tolerance: f64, fit_intercept: bool) -> Self {
        Self {
            max_iterations,
            tolerance,
            fit_intercept,
            ..Self::new()
        }
    }

    pub fn fit(&mut self, x: &Matrix, y: &Vector) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(AnalysisError::DimensionMismatch(
                "Number of samples in X and y must match".to_string(),
            ));
        }
        validate_labels(y)?;

        let n_samples = x.nrows();
        let n_features = x.ncols();

        // Work on standardized columns for conditioning, map back afterwards.
        let center = if self.fit_intercept {
            x.mean_axis(Axis(0)).unwrap_or_else(|| Vector::zeros(n_features))
        } else {
            Vector::zeros(n_features)
        };
        let scale = column_scales(x, &center)?;

        let offset = usize::from(self.fit_intercept);
        let mut design = Matrix::ones((n_samples, n_features + offset));
        {
            let mut body = design.slice_mut(s![.., offset..]);
            body.assign(x);
            for mut row in body.axis_iter_mut(Axis(0)) {
                row -= &center;
                row /= &scale;
            }
        }

        let (beta, deviance, mut converged, iterations) = self.irls(&design, y)?;
        let fitted = design.dot(&beta).mapv(sigmoid);
        let separated = fitted
            .iter()
            .zip(y.iter())
            .all(|(&p, &label)| (label - p).abs() < SEPARATION_TOLERANCE);
        if separated {
            warn!(
                "Fitted probabilities are numerically 0 or 1 after {} iterations: the classes are \
                 completely separated and the coefficients diverge",
                iterations
            );
            converged = false;
        } else if !converged {
            warn!(
                "Logistic regression did not converge after {} iterations (deviance {:.6})",
                iterations, deviance
            );
        }

        let slopes = beta.slice(s![offset..]).to_owned();
        let coeffs = &slopes / &scale;
        let intercept = if self.fit_intercept {
            beta[0] - coeffs.dot(&center)
        } else {
            0.0
        };

        self.coefficients = Some(coeffs);
        self.intercept = Some(intercept);
        self.deviance = Some(deviance);
        self.converged = converged;
        self.separated = separated;
        self.iterations = iterations;
        Ok(())
    }

    /// Fraction of rows whose thresholded prediction matches the 0/1 label.
    pub fn score(&self, x: &Matrix, y: &Vector) -> Result<f64> {
        let probabilities = self.predict_proba(x)?;
        let accuracy = probabilities
            .iter()
            .zip(y.iter())
            .map(|(&p, &actual)| {
                let predicted = if p >= 0.5 { 1.0 } else { 0.0 };
                if (predicted - actual).abs() < 1e-10 { 1.0 } else { 0.0 }
            })
            .sum::<f64>()
            / y.len() as f64;
        Ok(accuracy)
    }

    fn irls(&self, design: &Matrix, y: &Vector) -> Result<(Vector, f64, bool, usize)> {
        let mut beta = Vector::zeros(design.ncols());
        let mut mu = design.dot(&beta).mapv(sigmoid);
        let mut deviance = residual_deviance(y, &mu);

        for iteration in 1..=self.max_iterations {
            let weights = mu.mapv(|p| (p * (1.0 - p)).max(1e-10));
            let mut weighted = design.clone();
            for (mut row, &w) in weighted.axis_iter_mut(Axis(0)).zip(weights.iter()) {
                row *= w;
            }
            let hessian = design.t().dot(&weighted);
            let gradient = design.t().dot(&(y - &mu));
            let delta = solve_linear_system(&hessian, &gradient)?;

            let mut step = 1.0;
            let mut accepted = None;
            for _ in 0..30 {
                let candidate = &beta + &(&delta * step);
                let candidate_mu = design.dot(&candidate).mapv(sigmoid);
                let candidate_deviance = residual_deviance(y, &candidate_mu);
                if candidate_deviance.is_finite() && candidate_deviance <= deviance + 1e-10 {
                    accepted = Some((candidate, candidate_mu, candidate_deviance));
                    break;
                }
                step *= 0.5;
            }

            let Some((candidate, candidate_mu, candidate_deviance)) = accepted else {
                debug!("Step halving exhausted at iteration {}", iteration);
                return Ok((beta, deviance, false, iteration));
            };

            let change = (deviance - candidate_deviance).abs() / (candidate_deviance.abs() + 0.1);
            debug!(
                "IRLS iteration {}: deviance {:.8} (step {})",
                iteration, candidate_deviance, step
            );
            beta = candidate;
            mu = candidate_mu;
            deviance = candidate_deviance;

            if change < self.tolerance {
                return Ok((beta, deviance, true, iteration));
            }
        }

        Ok((beta, deviance, false, self.max_iterations))
    }
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for LogisticRegression {
    fn predict_proba(&self, x: &Matrix) -> Result<Vector> {
        let coeffs = self
            .coefficients
            .as_ref()
            .ok_or(AnalysisError::NotFitted("LogisticRegression"))?;
        let intercept = self.intercept.unwrap_or(0.0);

        if x.ncols() != coeffs.len() {
            return Err(AnalysisError::DimensionMismatch(format!(
                "Number of features in X ({}) doesn't match training data ({})",
                x.ncols(),
                coeffs.len()
            )));
        }

        let linear_combination = x.dot(coeffs) + intercept;
        Ok(linear_combination.mapv(sigmoid))
    }
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z > 500.0 {
        1.0
    } else if z < -500.0 {
        0.0
    } else {
        1.0 / (1.0 + (-z).exp())
    }
}

/// Labels must be 0/1 and contain both classes.
pub(crate) fn validate_labels(y: &Vector) -> Result<()> {
    if y.is_empty() {
        return Err(AnalysisError::EmptyInput("no training rows".to_string()));
    }
    if y.iter().any(|&label| label != 0.0 && label != 1.0) {
        return Err(AnalysisError::InvalidParameter(
            "Labels must be 0 or 1 for binary classification".to_string(),
        ));
    }
    let positives = y.sum();
    if positives == 0.0 || positives == y.len() as f64 {
        return Err(AnalysisError::SingleClass);
    }
    Ok(())
}

/// Population standard deviation of each column around `center`.
pub(crate) fn column_scales(x: &Matrix, center: &Vector) -> Result<Vector> {
    let n = x.nrows() as f64;
    let mut scales = Vector::zeros(x.ncols());
    for (j, column) in x.axis_iter(Axis(1)).enumerate() {
        let ss = column.iter().map(|&v| (v - center[j]).powi(2)).sum::<f64>();
        let sd = (ss / n).sqrt();
        if !sd.is_finite() || sd <= 1e-12 * (1.0 + center[j].abs()) {
            return Err(AnalysisError::ZeroVariance {
                column: format!("#{}", j),
            });
        }
        scales[j] = sd;
    }
    Ok(scales)
}

/// Residual deviance, `-2 * loglik`.
fn residual_deviance(y_true: &Vector, y_pred: &Vector) -> f64 {
    let epsilon = 1e-15;
    let loglik = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(&y, &p)| {
            let p = p.clamp(epsilon, 1.0 - epsilon);
            y * p.ln() + (1.0 - y) * (1.0 - p).ln()
        })
        .sum::<f64>();
    -2.0 * loglik
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Diagnosis;
    use crate::fixtures::SyntheticTumors;
    use ndarray::array;

    fn overlapping() -> (Matrix, Vector) {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0], [8.0]];
        let y = array![0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_logistic_regression_simple() {
        let (x, y) = overlapping();
        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();

        let predictions = model.predict(&x).unwrap();
        let probabilities = model.predict_proba(&x).unwrap();

        assert_eq!(predictions.len(), 8);
        assert!(model.converged);
        assert!(probabilities[0] < 0.5);
        assert!(probabilities[7] > 0.5);
        assert_eq!(predictions[7], Diagnosis::Malignant);
    }

    #[test]
    fn test_score_equations_hold_at_optimum() {
        let (x, y) = overlapping();
        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();

        let residual = &y - &model.predict_proba(&x).unwrap();
        assert!(residual.sum().abs() < 1e-6);
        assert!(x.column(0).dot(&residual).abs() < 1e-6);
    }

    #[test]
    fn test_logistic_regression_score() {
        let (x, y) = overlapping();
        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();

        let score = model.score(&x, &y).unwrap();
        assert!(score > 0.5);
    }

    #[test]
    fn test_fit_is_invariant_to_row_order() {
        let data = SyntheticTumors::new(150).seed(17).build();
        let subset = data.select_features(&["radius_mean", "texture_mean", "concavity_mean"]).unwrap();
        let reversed: Vec<usize> = (0..150).rev().collect();
        let shuffled = subset.subset(&reversed).unwrap();

        let mut a = LogisticRegression::new();
        a.fit(&subset.features, &subset.label_vector()).unwrap();
        let mut b = LogisticRegression::new();
        b.fit(&shuffled.features, &shuffled.label_vector()).unwrap();

        let pa = a.predict_proba(&subset.features).unwrap();
        let pb = b.predict_proba(&subset.features).unwrap();
        for (u, v) in pa.iter().zip(pb.iter()) {
            assert!((u - v).abs() < 1e-8);
        }
    }

    #[test]
    fn test_complete_separation_keeps_last_estimate() {
        let data = SyntheticTumors::new(456).separation(10.0).seed(19).build();
        let mut model = LogisticRegression::new();
        model.fit(&data.features, &data.label_vector()).unwrap();

        assert!(model.separated);
        assert!(!model.converged);
        let probabilities = model.predict_proba(&data.features).unwrap();
        assert!(probabilities.iter().all(|p| p.is_finite()));
        assert_eq!(model.predict(&data.features).unwrap(), data.labels);
    }

    #[test]
    fn test_overlapping_classes_are_not_separated() {
        let (x, y) = overlapping();
        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();
        assert!(!model.separated);
    }

    #[test]
    fn test_logistic_regression_invalid_labels() {
        let x = array![[1.0], [2.0]];
        let y = array![0.5, 2.0];

        let mut model = LogisticRegression::new();
        assert!(model.fit(&x, &y).is_err());
    }

    #[test]
    fn test_single_class_is_rejected() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![1.0, 1.0, 1.0];
        let mut model = LogisticRegression::new();
        assert!(matches!(model.fit(&x, &y), Err(AnalysisError::SingleClass)));
    }

    #[test]
    fn test_logistic_regression_predict_without_fit() {
        let x = array![[1.0], [2.0]];
        let model = LogisticRegression::new();

        assert!(model.predict(&x).is_err());
        assert!(model.predict_proba(&x).is_err());
    }

    #[test]
    fn test_sigmoid_function() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-10);
        assert!(sigmoid(1000.0) > 0.99);
        assert!(sigmoid(-1000.0) < 0.01);
    }
}
