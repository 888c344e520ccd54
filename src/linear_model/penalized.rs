use crate::classifier::Classifier;
use crate::error::{AnalysisError, Result};
use crate::linear_model::logistic_regression::{column_scales, sigmoid, validate_labels};
use crate::{Matrix, Vector};
use log::{debug, warn};
use ndarray::Axis;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Penalty {
    /// L2: shrinks every coefficient, never to exactly zero.
    Ridge,
    /// L1: drives weak coefficients to exactly zero.
    Lasso,
}

impl Penalty {
    /// Elastic-net mixing weight of the L1 term.
    pub fn l1_ratio(self) -> f64 {
        match self {
            Penalty::Ridge => 0.0,
            Penalty::Lasso => 1.0,
        }
    }
}

impl fmt::Display for Penalty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Penalty::Ridge => write!(f, "ridge"),
            Penalty::Lasso => write!(f, "lasso"),
        }
    }
}

/// Logistic regression with a ridge or lasso penalty on the slopes.
///
/// Minimises `-(1/n) loglik + lambda * [(1 - a)/2 |b|^2 + a |b|_1]` where `a`
/// is the penalty's L1 ratio. Columns are standardized internally and the
/// coefficients are reported on the original scale.
#[derive(Clone, Debug)]
pub struct PenalizedLogistic {
    pub coefficients: Option<Vector>,
    pub intercept: Option<f64>,
    penalty: Penalty,
    lambda: f64,
    max_iter: usize,
    tolerance: f64,
}

impl PenalizedLogistic {
    pub fn new(penalty: Penalty) -> Self {
        Self {
            coefficients: None,
            intercept: None,
            penalty,
            lambda: 1.0,
            max_iter: 50,
            tolerance: 1e-7,
        }
    }

    pub fn lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn penalty(&self) -> Penalty {
        self.penalty
    }

    pub fn lambda_value(&self) -> f64 {
        self.lambda
    }

    pub fn fit(&mut self, x: &Matrix, y: &Vector) -> Result<()> {
        let mut fitted = Self::fit_path(x, y, self.penalty, &[self.lambda], self.max_iter, self.tolerance)?;
        let model = fitted.pop().ok_or_else(|| {
            AnalysisError::EmptyInput("no lambda to fit".to_string())
        })?;
        self.coefficients = model.coefficients;
        self.intercept = model.intercept;
        Ok(())
    }

    /// Fit every lambda in order, warm-starting each from the previous one.
    /// Pass lambdas in decreasing order for the warm starts to help.
    pub fn fit_path(
        x: &Matrix,
        y: &Vector,
        penalty: Penalty,
        lambdas: &[f64],
        max_iter: usize,
        tolerance: f64,
    ) -> Result<Vec<PenalizedLogistic>> {
        if x.nrows() != y.len() {
            return Err(AnalysisError::DimensionMismatch(
                "Number of samples in X and y must match".to_string(),
            ));
        }
        if let Some(bad) = lambdas.iter().find(|l| !l.is_finite() || **l < 0.0) {
            return Err(AnalysisError::InvalidParameter(format!(
                "lambda must be non-negative, got {}",
                bad
            )));
        }
        validate_labels(y)?;

        let (xs, mean, scale) = standardize(x)?;
        let n = xs.nrows() as f64;
        let y_mean = y.mean().unwrap_or(0.5);

        let mut b0 = (y_mean / (1.0 - y_mean)).ln();
        let mut beta = Vector::zeros(xs.ncols());
        let mut models = Vec::with_capacity(lambdas.len());

        for &lambda in lambdas {
            let converged = irls_coordinate_descent(
                &xs, y, n, penalty.l1_ratio(), lambda, &mut b0, &mut beta, max_iter, tolerance,
            );
            if !converged {
                warn!(
                    "{} logistic fit at lambda {:.3e} did not converge in {} iterations",
                    penalty, lambda, max_iter
                );
            }

            let coeffs = &beta / &scale;
            let intercept = b0 - coeffs.dot(&mean);
            models.push(PenalizedLogistic {
                coefficients: Some(coeffs),
                intercept: Some(intercept),
                penalty,
                lambda,
                max_iter,
                tolerance,
            });
        }

        Ok(models)
    }

    /// Indices of the features with a non-zero coefficient.
    pub fn selected_features(&self) -> Vec<usize> {
        self.coefficients
            .as_ref()
            .map(|c| {
                c.iter()
                    .enumerate()
                    .filter(|(_, v)| **v != 0.0)
                    .map(|(j, _)| j)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Classifier for PenalizedLogistic {
    fn predict_proba(&self, x: &Matrix) -> Result<Vector> {
        let coeffs = self
            .coefficients
            .as_ref()
            .ok_or(AnalysisError::NotFitted("PenalizedLogistic"))?;
        let intercept = self.intercept.unwrap_or(0.0);

        if x.ncols() != coeffs.len() {
            return Err(AnalysisError::DimensionMismatch(format!(
                "Number of features in X ({}) doesn't match training data ({})",
                x.ncols(),
                coeffs.len()
            )));
        }

        Ok((x.dot(coeffs) + intercept).mapv(sigmoid))
    }
}

/// Decreasing geometric lambda sequence starting at the smallest lambda that
/// zeroes every slope (computed with an L1 ratio of at least 0.001).
pub fn lambda_path(x: &Matrix, y: &Vector, penalty: Penalty, n_lambda: usize) -> Result<Vec<f64>> {
    if n_lambda == 0 {
        return Err(AnalysisError::InvalidParameter("n_lambda must be positive".to_string()));
    }
    if x.nrows() != y.len() {
        return Err(AnalysisError::DimensionMismatch(
            "Number of samples in X and y must match".to_string(),
        ));
    }
    let (xs, _, _) = standardize(x)?;
    let n = xs.nrows() as f64;
    let y_mean = y.mean().unwrap_or(0.0);
    let centered = y.mapv(|v| v - y_mean);

    let max_gradient = xs
        .axis_iter(Axis(1))
        .map(|column| column.dot(&centered).abs())
        .fold(0.0, f64::max);
    let lambda_max = max_gradient / (n * penalty.l1_ratio().max(1e-3));
    if lambda_max <= 0.0 {
        return Err(AnalysisError::InvalidParameter(
            "features carry no information about the labels".to_string(),
        ));
    }

    let ratio: f64 = if xs.nrows() > xs.ncols() { 1e-4 } else { 1e-2 };
    if n_lambda == 1 {
        return Ok(vec![lambda_max]);
    }
    let step = ratio.ln() / (n_lambda - 1) as f64;
    Ok((0..n_lambda)
        .map(|k| lambda_max * (step * k as f64).exp())
        .collect())
}

fn standardize(x: &Matrix) -> Result<(Matrix, Vector, Vector)> {
    let mean = x
        .mean_axis(Axis(0))
        .ok_or_else(|| AnalysisError::EmptyInput("no training rows".to_string()))?;
    let scale = column_scales(x, &mean)?;
    let mut xs = x.clone();
    for mut row in xs.axis_iter_mut(Axis(0)) {
        row -= &mean;
        row /= &scale;
    }
    Ok((xs, mean, scale))
}

/// IRLS outer loop around weighted coordinate descent, updating `b0` and
/// `beta` in place. Returns whether the coefficients settled.
#[allow(clippy::too_many_arguments)]
fn irls_coordinate_descent(
    xs: &Matrix,
    y: &Vector,
    n: f64,
    l1_ratio: f64,
    lambda: f64,
    b0: &mut f64,
    beta: &mut Vector,
    max_iter: usize,
    tolerance: f64,
) -> bool {
    let l1_penalty = lambda * l1_ratio;
    let l2_penalty = lambda * (1.0 - l1_ratio);
    let n_features = xs.ncols();

    for outer in 0..max_iter {
        let eta = xs.dot(beta) + *b0;
        let p = eta.mapv(sigmoid);
        let w = p.mapv(|pi| (pi * (1.0 - pi)).max(1e-5));
        // Working residual z - eta, with z the IRLS working response.
        let mut r: Vector = (y - &p) / &w;

        let xw2: Vector = xs
            .axis_iter(Axis(1))
            .map(|column| column.iter().zip(w.iter()).map(|(&v, &wi)| wi * v * v).sum::<f64>() / n)
            .collect();
        let w_sum = w.sum();

        let b0_start = *b0;
        let beta_start = beta.clone();

        for _ in 0..1000 {
            let mut max_change = 0.0_f64;

            let shift = w.iter().zip(r.iter()).map(|(&wi, &ri)| wi * ri).sum::<f64>() / w_sum;
            if shift != 0.0 {
                *b0 += shift;
                r.mapv_inplace(|ri| ri - shift);
                max_change = max_change.max(w_sum / n * shift * shift);
            }

            for j in 0..n_features {
                if xw2[j] <= 0.0 {
                    continue;
                }
                let column = xs.column(j);
                let gradient = column
                    .iter()
                    .zip(w.iter())
                    .zip(r.iter())
                    .map(|((&v, &wi), &ri)| wi * v * ri)
                    .sum::<f64>()
                    / n
                    + xw2[j] * beta[j];
                let updated = soft_threshold(gradient, l1_penalty) / (xw2[j] + l2_penalty);
                let delta = updated - beta[j];
                if delta != 0.0 {
                    r.scaled_add(-delta, &column);
                    beta[j] = updated;
                    max_change = max_change.max(xw2[j] * delta * delta);
                }
            }

            if max_change < tolerance * tolerance {
                break;
            }
        }

        let moved = beta
            .iter()
            .zip(beta_start.iter())
            .map(|(a, b)| (a - b).abs())
            .fold((*b0 - b0_start).abs(), f64::max);
        debug!("IRLS pass {} at lambda {:.3e}: max coefficient change {:.3e}", outer, lambda, moved);
        if moved < tolerance {
            return true;
        }
    }

    false
}

fn soft_threshold(z: f64, gamma: f64) -> f64 {
    if z > gamma {
        z - gamma
    } else if z < -gamma {
        z + gamma
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::SyntheticTumors;
    use crate::linear_model::LogisticRegression;

    fn training() -> (Matrix, Vector) {
        let data = SyntheticTumors::new(300).seed(13).build();
        (data.features.clone(), data.label_vector())
    }

    #[test]
    fn test_soft_threshold() {
        assert_eq!(soft_threshold(3.0, 1.0), 2.0);
        assert_eq!(soft_threshold(-3.0, 1.0), -2.0);
        assert_eq!(soft_threshold(0.5, 1.0), 0.0);
    }

    #[test]
    fn test_lambda_path_is_decreasing() {
        let (x, y) = training();
        let path = lambda_path(&x, &y, Penalty::Lasso, 20).unwrap();
        assert_eq!(path.len(), 20);
        assert!(path.windows(2).all(|w| w[0] > w[1]));
        assert!((path[19] / path[0] - 1e-4).abs() < 1e-10);
    }

    #[test]
    fn test_lambda_path_stops_earlier_for_wide_data() {
        let data = SyntheticTumors::new(25).seed(3).build();
        let path = lambda_path(&data.features, &data.label_vector(), Penalty::Ridge, 10).unwrap();
        assert_eq!(path.len(), 10);
        assert!((path[9] / path[0] - 1e-2).abs() < 1e-12);

        let single = lambda_path(&data.features, &data.label_vector(), Penalty::Ridge, 1).unwrap();
        assert_eq!(single, vec![path[0]]);
    }

    #[test]
    fn test_lasso_at_lambda_max_is_empty() {
        let (x, y) = training();
        let path = lambda_path(&x, &y, Penalty::Lasso, 5).unwrap();
        let mut model = PenalizedLogistic::new(Penalty::Lasso).lambda(path[0] * 1.0001);
        model.fit(&x, &y).unwrap();
        assert!(model.selected_features().is_empty());

        let prevalence = y.mean().unwrap();
        let p = model.predict_proba(&x).unwrap();
        assert!((p[0] - prevalence).abs() < 1e-6);
    }

    #[test]
    fn test_lasso_produces_exact_zeros() {
        let (x, y) = training();
        let path = lambda_path(&x, &y, Penalty::Lasso, 10).unwrap();
        let mut model = PenalizedLogistic::new(Penalty::Lasso).lambda(path[2]);
        model.fit(&x, &y).unwrap();

        let selected = model.selected_features();
        assert!(!selected.is_empty());
        assert!(selected.len() < x.ncols());
    }

    #[test]
    fn test_ridge_keeps_every_feature() {
        let (x, y) = training();
        let mut model = PenalizedLogistic::new(Penalty::Ridge).lambda(0.05);
        model.fit(&x, &y).unwrap();
        let coeffs = model.coefficients.as_ref().unwrap();
        assert!(coeffs.iter().all(|&c| c != 0.0));
    }

    #[test]
    fn test_small_ridge_penalty_approaches_mle() {
        let data = SyntheticTumors::new(200).seed(3).build();
        let subset = data.select_features(&["radius_mean", "texture_mean"]).unwrap();
        let y = subset.label_vector();

        let mut mle = LogisticRegression::new();
        mle.fit(&subset.features, &y).unwrap();
        let mut ridge = PenalizedLogistic::new(Penalty::Ridge).lambda(1e-8).tolerance(1e-10);
        ridge.fit(&subset.features, &y).unwrap();

        let a = mle.predict_proba(&subset.features).unwrap();
        let b = ridge.predict_proba(&subset.features).unwrap();
        for (u, v) in a.iter().zip(b.iter()) {
            assert!((u - v).abs() < 1e-4);
        }
    }

    #[test]
    fn test_heavier_penalty_shrinks_more() {
        let (x, y) = training();
        let norm = |lambda: f64| {
            let mut model = PenalizedLogistic::new(Penalty::Ridge).lambda(lambda);
            model.fit(&x, &y).unwrap();
            model.coefficients.unwrap().mapv(|c| c * c).sum()
        };
        assert!(norm(1.0) < norm(0.01));
    }

    #[test]
    fn test_negative_lambda_rejected() {
        let (x, y) = training();
        let mut model = PenalizedLogistic::new(Penalty::Lasso).lambda(-1.0);
        assert!(matches!(model.fit(&x, &y), Err(AnalysisError::InvalidParameter(_))));
    }

    #[test]
    fn test_predict_without_fit() {
        let model = PenalizedLogistic::new(Penalty::Ridge);
        assert!(model.predict_proba(&Matrix::zeros((1, 2))).is_err());
    }
}
