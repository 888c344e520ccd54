use crate::error::{AnalysisError, Result};
use crate::linalg::symmetric_eigen;
use crate::preprocessing::StandardScaler;
use crate::{Matrix, Vector};
use log::debug;
use ndarray::Axis;

/// Principal component analysis on centered (and optionally unit-variance)
/// columns.
///
/// All fitted parameters (center, scale, loadings) come from the rows passed
/// to [`Pca::fit`] and are reused unchanged by [`Pca::transform`].
#[derive(Clone, Debug)]
pub struct Pca {
    /// Loadings, one component per row.
    pub components: Option<Matrix>,
    /// Variance of every component, not only the retained ones.
    pub explained_variance: Option<Vector>,
    pub explained_variance_ratio: Option<Vector>,
    pub mean: Option<Vector>,
    pub scale: Option<Vector>,
    n_components: Option<usize>,
    unit_variance: bool,
}

impl Pca {
    pub fn new() -> Self {
        Self {
            components: None,
            explained_variance: None,
            explained_variance_ratio: None,
            mean: None,
            scale: None,
            n_components: None,
            unit_variance: true,
        }
    }

    pub fn n_components(mut self, n_components: usize) -> Self {
        self.n_components = Some(n_components);
        self
    }

    /// Scale every column to unit (sample) variance before decomposing.
    pub fn scale(mut self, unit_variance: bool) -> Self {
        self.unit_variance = unit_variance;
        self
    }

    pub fn fit(&mut self, x: &Matrix) -> Result<()> {
        if x.nrows() < 2 || x.ncols() == 0 {
            return Err(AnalysisError::EmptyInput(
                "PCA needs at least two samples and one feature".to_string(),
            ));
        }

        let n_samples = x.nrows();
        let n_features = x.ncols();
        let n_components = self.n_components.unwrap_or(n_features.min(n_samples));
        if n_components == 0 || n_components > n_features.min(n_samples) {
            return Err(AnalysisError::InvalidParameter(format!(
                "n_components={} must be between 1 and min(n_samples, n_features)={}",
                n_components,
                n_features.min(n_samples)
            )));
        }

        let (mean, scale) = if self.unit_variance {
            let mut scaler = StandardScaler::new().ddof(1.0);
            scaler.fit(x)?;
            match (scaler.mean(), scaler.std()) {
                (Some(mean), Some(std)) => (mean.clone(), std.clone()),
                _ => return Err(AnalysisError::NotFitted("StandardScaler")),
            }
        } else {
            let mean = x
                .mean_axis(Axis(0))
                .ok_or_else(|| AnalysisError::EmptyInput("no rows".to_string()))?;
            (mean, Vector::ones(n_features))
        };

        let standardized = standardize(x, &mean, &scale);
        let cov = standardized.t().dot(&standardized) / (n_samples as f64 - 1.0);

        let (eigenvalues, eigenvectors) = symmetric_eigen(&cov)?;
        let explained_variance = eigenvalues.mapv(|v| v.max(0.0));

        let mut components = Matrix::zeros((n_components, n_features));
        for k in 0..n_components {
            let mut loading = eigenvectors.column(k).to_owned();
            // Sign convention: largest-magnitude loading is positive.
            let pivot = loading
                .iter()
                .copied()
                .fold(0.0_f64, |best, v| if v.abs() > best.abs() { v } else { best });
            if pivot < 0.0 {
                loading.mapv_inplace(|v| -v);
            }
            components.row_mut(k).assign(&loading);
        }

        let total_variance = explained_variance.sum();
        let explained_variance_ratio = if total_variance > 0.0 {
            &explained_variance / total_variance
        } else {
            Vector::zeros(explained_variance.len())
        };
        debug!(
            "PCA on {}x{}: first component explains {:.3} of the variance",
            n_samples, n_features, explained_variance_ratio[0]
        );

        self.components = Some(components);
        self.explained_variance = Some(explained_variance);
        self.explained_variance_ratio = Some(explained_variance_ratio);
        self.mean = Some(mean);
        self.scale = Some(scale);

        Ok(())
    }

    pub fn transform(&self, x: &Matrix) -> Result<Matrix> {
        let components = self.components.as_ref().ok_or(AnalysisError::NotFitted("PCA"))?;
        let mean = self.mean.as_ref().ok_or(AnalysisError::NotFitted("PCA"))?;
        let scale = self.scale.as_ref().ok_or(AnalysisError::NotFitted("PCA"))?;

        if x.ncols() != mean.len() {
            return Err(AnalysisError::DimensionMismatch(format!(
                "Number of features in X ({}) doesn't match training data ({})",
                x.ncols(),
                mean.len()
            )));
        }

        Ok(standardize(x, mean, scale).dot(&components.t()))
    }

    pub fn fit_transform(&mut self, x: &Matrix) -> Result<Matrix> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Running total of the explained-variance ratios.
    pub fn cumulative_variance_ratio(&self) -> Option<Vector> {
        self.explained_variance_ratio.as_ref().map(|ratio| {
            let mut running = 0.0;
            ratio.mapv(|r| {
                running += r;
                running
            })
        })
    }
}

impl Default for Pca {
    fn default() -> Self {
        Self::new()
    }
}

fn standardize(x: &Matrix, mean: &Vector, scale: &Vector) -> Matrix {
    let mut out = x.clone();
    for mut row in out.axis_iter_mut(Axis(0)) {
        row -= mean;
        row /= scale;
    }
    out
}
