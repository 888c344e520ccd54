use crate::classifier::Classifier;
use crate::decomposition::Pca;
use crate::error::{AnalysisError, Result};
use crate::linear_model::LogisticRegression;
use crate::{Matrix, Vector};

/// Logistic regression on the first `k` principal component scores.
///
/// The PCA is refitted on whatever rows `fit` receives, so a held-out row
/// never contributes to the centering, scaling or loadings used to score it.
#[derive(Clone, Debug)]
pub struct PcaLogistic {
    n_components: usize,
    pca: Option<Pca>,
    logistic: Option<LogisticRegression>,
}

impl PcaLogistic {
    pub fn new(n_components: usize) -> Self {
        Self {
            n_components,
            pca: None,
            logistic: None,
        }
    }

    pub fn n_components(&self) -> usize {
        self.n_components
    }

    pub fn fit(&mut self, x: &Matrix, y: &Vector) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(AnalysisError::DimensionMismatch(
                "Number of samples in X and y must match".to_string(),
            ));
        }

        let mut pca = Pca::new().n_components(self.n_components).scale(true);
        let scores = pca.fit_transform(x)?;

        let mut logistic = LogisticRegression::new();
        logistic.fit(&scores, y)?;

        self.pca = Some(pca);
        self.logistic = Some(logistic);
        Ok(())
    }

    pub fn pca(&self) -> Option<&Pca> {
        self.pca.as_ref()
    }

    pub fn logistic(&self) -> Option<&LogisticRegression> {
        self.logistic.as_ref()
    }
}

impl Classifier for PcaLogistic {
    fn predict_proba(&self, x: &Matrix) -> Result<Vector> {
        let pca = self.pca.as_ref().ok_or(AnalysisError::NotFitted("PcaLogistic"))?;
        let logistic = self
            .logistic
            .as_ref()
            .ok_or(AnalysisError::NotFitted("PcaLogistic"))?;
        logistic.predict_proba(&pca.transform(x)?)
    }
}
