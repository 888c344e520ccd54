use crate::dataset::Diagnosis;
use crate::error::{AnalysisError, Result};
use crate::Vector;
use std::fmt;

/// 2x2 table of counts: rows are the observed class, columns the predicted
/// class, both ordered Benign then Malignant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfusionMatrix {
    counts: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    pub fn from_labels(observed: &[Diagnosis], predicted: &[Diagnosis]) -> Result<Self> {
        if observed.len() != predicted.len() {
            return Err(AnalysisError::DimensionMismatch(format!(
                "{} observed labels but {} predictions",
                observed.len(),
                predicted.len()
            )));
        }
        if observed.is_empty() {
            return Err(AnalysisError::EmptyInput(
                "no predictions to tabulate".to_string(),
            ));
        }

        let mut counts = [[0usize; 2]; 2];
        for (o, p) in observed.iter().zip(predicted.iter()) {
            counts[o.index()][p.index()] += 1;
        }
        Ok(Self { counts })
    }

    /// Build directly from the four cells.
    pub fn from_counts(
        true_negatives: usize,
        false_positives: usize,
        false_negatives: usize,
        true_positives: usize,
    ) -> Self {
        Self {
            counts: [
                [true_negatives, false_positives],
                [false_negatives, true_positives],
            ],
        }
    }

    pub fn get(&self, observed: Diagnosis, predicted: Diagnosis) -> usize {
        self.counts[observed.index()][predicted.index()]
    }

    pub fn true_positives(&self) -> usize {
        self.get(Diagnosis::Malignant, Diagnosis::Malignant)
    }

    pub fn false_positives(&self) -> usize {
        self.get(Diagnosis::Benign, Diagnosis::Malignant)
    }

    pub fn true_negatives(&self) -> usize {
        self.get(Diagnosis::Benign, Diagnosis::Benign)
    }

    pub fn false_negatives(&self) -> usize {
        self.get(Diagnosis::Malignant, Diagnosis::Benign)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Number of rows predicted as `class`.
    pub fn predicted(&self, class: Diagnosis) -> usize {
        self.counts[0][class.index()] + self.counts[1][class.index()]
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives() + self.true_negatives(), self.total())
    }

    /// TP / (TP + FP); NaN when Malignant is never predicted.
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives(), self.true_positives() + self.false_positives())
    }

    /// TP / (TP + FN); NaN when no row is observed Malignant.
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives(), self.true_positives() + self.false_negatives())
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            accuracy: self.accuracy(),
            precision: self.precision(),
            recall: self.recall(),
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        f64::NAN
    } else {
        numerator as f64 / denominator as f64
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>20} {:>10} {:>10}", "observed \\ predicted", "Benign", "Malignant")?;
        for class in Diagnosis::ALL {
            writeln!(
                f,
                "{:>20} {:>10} {:>10}",
                class.to_string(),
                self.get(class, Diagnosis::Benign),
                self.get(class, Diagnosis::Malignant)
            )?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Metrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accuracy {:.4}  precision {:.4}  recall {:.4}",
            self.accuracy, self.precision, self.recall
        )
    }
}

/// Mean binomial deviance, `-2/n * loglik`, with probabilities clipped away
/// from 0 and 1.
pub fn binomial_deviance(y_true: &Vector, probabilities: &Vector) -> Result<f64> {
    if y_true.len() != probabilities.len() {
        return Err(AnalysisError::DimensionMismatch(
            "y_true and probabilities must have the same length".to_string(),
        ));
    }
    if y_true.is_empty() {
        return Err(AnalysisError::EmptyInput("no observations to score".to_string()));
    }

    let epsilon = 1e-5;
    let loglik = y_true
        .iter()
        .zip(probabilities.iter())
        .map(|(&y, &p)| {
            let p = p.clamp(epsilon, 1.0 - epsilon);
            y * p.ln() + (1.0 - y) * (1.0 - p).ln()
        })
        .sum::<f64>();

    Ok(-2.0 * loglik / y_true.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Diagnosis::{Benign as B, Malignant as M};
    use ndarray::array;

    #[test]
    fn test_confusion_matrix_layout() {
        let observed = [B, B, M, M, M];
        let predicted = [B, M, M, B, M];
        let cm = ConfusionMatrix::from_labels(&observed, &predicted).unwrap();

        assert_eq!(cm.true_negatives(), 1);
        assert_eq!(cm.false_positives(), 1);
        assert_eq!(cm.false_negatives(), 1);
        assert_eq!(cm.true_positives(), 2);
        assert_eq!(cm.total(), 5);
        assert!((cm.accuracy() - 0.6).abs() < 1e-12);
        assert!((cm.accuracy() + (1.0 - cm.accuracy()) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_perfect_precision() {
        let cm = ConfusionMatrix::from_counts(4, 0, 2, 3);
        assert_eq!(cm.precision(), 1.0);
    }

    #[test]
    fn test_zero_recall() {
        let cm = ConfusionMatrix::from_counts(4, 1, 5, 0);
        assert_eq!(cm.recall(), 0.0);
    }

    #[test]
    fn test_no_positive_predictions_gives_nan_precision() {
        let observed = [B, M, M];
        let predicted = [B, B, B];
        let cm = ConfusionMatrix::from_labels(&observed, &predicted).unwrap();
        assert!(cm.precision().is_nan());
        assert_eq!(cm.recall(), 0.0);
        assert_eq!(cm.predicted(M), 0);
    }

    #[test]
    fn test_length_mismatch_and_empty() {
        assert!(ConfusionMatrix::from_labels(&[B], &[B, M]).is_err());
        assert!(ConfusionMatrix::from_labels(&[], &[]).is_err());
    }

    #[test]
    fn test_binomial_deviance() {
        let y = array![1.0, 0.0];
        let p = array![0.5, 0.5];
        let deviance = binomial_deviance(&y, &p).unwrap();
        assert!((deviance - 2.0 * 2.0_f64.ln()).abs() < 1e-12);

        let confident = binomial_deviance(&y, &array![0.99, 0.01]).unwrap();
        assert!(confident < deviance);
    }
}
