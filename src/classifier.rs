use crate::dataset::Diagnosis;
use crate::error::Result;
use crate::{Matrix, Vector};

/// A fitted binary classifier producing P(Malignant) per row.
pub trait Classifier {
    fn predict_proba(&self, x: &Matrix) -> Result<Vector>;

    /// Threshold the probabilities at 0.5.
    fn predict(&self, x: &Matrix) -> Result<Vec<Diagnosis>> {
        Ok(self
            .predict_proba(x)?
            .iter()
            .map(|&p| Diagnosis::from_probability(p))
            .collect())
    }
}
