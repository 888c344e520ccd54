use crate::error::{AnalysisError, Result};
use crate::{Matrix, Vector};
use log::{debug, info};
use ndarray::Axis;

/// Column-wise centering and scaling.
#[derive(Clone, Debug)]
pub struct StandardScaler {
    mean: Option<Vector>,
    std: Option<Vector>,
    ddof: f64,
}

impl StandardScaler {
    /// Population standard deviation (`ddof = 0`).
    pub fn new() -> Self {
        Self {
            mean: None,
            std: None,
            ddof: 0.0,
        }
    }

    /// Delta degrees of freedom for the standard deviation; 1 gives the sample sd.
    pub fn ddof(mut self, ddof: f64) -> Self {
        self.ddof = ddof;
        self
    }

    pub fn fit(&mut self, data: &Matrix) -> Result<()> {
        if (data.nrows() as f64) <= self.ddof {
            return Err(AnalysisError::EmptyInput(format!(
                "need more than {} rows to estimate a standard deviation",
                self.ddof
            )));
        }
        let mean = data
            .mean_axis(Axis(0))
            .ok_or_else(|| AnalysisError::EmptyInput("cannot scale an empty matrix".to_string()))?;
        let std = data.std_axis(Axis(0), self.ddof);

        let degenerate = std
            .iter()
            .zip(mean.iter())
            .position(|(&s, &m)| !s.is_finite() || s <= 1e-12 * (1.0 + m.abs()));
        if let Some(j) = degenerate {
            return Err(AnalysisError::ZeroVariance {
                column: format!("#{}", j),
            });
        }

        self.mean = Some(mean);
        self.std = Some(std);
        Ok(())
    }

    pub fn transform(&self, data: &Matrix) -> Result<Matrix> {
        let mean = self.mean.as_ref().ok_or(AnalysisError::NotFitted("StandardScaler"))?;
        let std = self.std.as_ref().ok_or(AnalysisError::NotFitted("StandardScaler"))?;

        if data.ncols() != mean.len() {
            return Err(AnalysisError::DimensionMismatch(format!(
                "scaler fitted on {} columns, got {}",
                mean.len(),
                data.ncols()
            )));
        }

        let mut result = data.clone();
        for mut row in result.axis_iter_mut(Axis(0)) {
            row -= mean;
            row /= std;
        }

        Ok(result)
    }

    pub fn fit_transform(&mut self, data: &Matrix) -> Result<Matrix> {
        self.fit(data)?;
        self.transform(data)
    }

    pub fn mean(&self) -> Option<&Vector> {
        self.mean.as_ref()
    }

    pub fn std(&self) -> Option<&Vector> {
        self.std.as_ref()
    }
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

/// Pearson correlation between every pair of columns.
pub fn correlation_matrix(data: &Matrix) -> Result<Matrix> {
    let standardized = StandardScaler::new().fit_transform(data)?;
    let n = data.nrows() as f64;
    Ok(standardized.t().dot(&standardized) / n)
}

/// Drop one member of every feature pair whose absolute correlation exceeds
/// `cutoff`, returning the names that remain.
///
/// Pairs are visited in column order; of the two, the feature with the larger
/// mean absolute correlation to all others is removed. No pair in the
/// returned set correlates above `cutoff`.
pub fn reduce_collinearity(data: &Matrix, names: &[String], cutoff: f64) -> Result<Vec<String>> {
    if names.len() != data.ncols() {
        return Err(AnalysisError::DimensionMismatch(format!(
            "{} names for {} columns",
            names.len(),
            data.ncols()
        )));
    }
    if !(0.0..=1.0).contains(&cutoff) {
        return Err(AnalysisError::InvalidParameter(format!(
            "correlation cutoff must be in [0, 1], got {}",
            cutoff
        )));
    }

    let corr = correlation_matrix(data)?.mapv(f64::abs);
    let p = corr.ncols();
    let mean_abs: Vec<f64> = (0..p)
        .map(|j| (corr.column(j).sum() - 1.0) / (p.max(2) - 1) as f64)
        .collect();

    let mut removed = vec![false; p];
    for i in 0..p {
        for j in (i + 1)..p {
            if removed[i] || removed[j] || corr[(i, j)] <= cutoff {
                continue;
            }
            let drop = if mean_abs[j] > mean_abs[i] { j } else { i };
            debug!(
                "|r({}, {})| = {:.3} > {}; dropping {}",
                names[i], names[j], corr[(i, j)], cutoff, names[drop]
            );
            removed[drop] = true;
        }
    }

    let retained: Vec<String> = names
        .iter()
        .zip(removed.iter())
        .filter(|(_, gone)| !**gone)
        .map(|(name, _)| name.clone())
        .collect();
    info!(
        "Collinearity reduction at |r| > {}: kept {} of {} features",
        cutoff,
        retained.len(),
        p
    );
    Ok(retained)
}
