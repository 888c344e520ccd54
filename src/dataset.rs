use crate::error::{AnalysisError, Result};
use crate::{Matrix, Vector};
use ndarray::Axis;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Diagnosis of a tumor mass. `Malignant` is the positive class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Diagnosis {
    Benign,
    Malignant,
}

impl Diagnosis {
    pub const ALL: [Diagnosis; 2] = [Diagnosis::Benign, Diagnosis::Malignant];

    /// Binary encoding used by the fitters: Malignant = 1, Benign = 0.
    pub fn as_f64(self) -> f64 {
        match self {
            Diagnosis::Benign => 0.0,
            Diagnosis::Malignant => 1.0,
        }
    }

    /// Class decision for a probability of malignancy.
    pub fn from_probability(p: f64) -> Self {
        if p >= 0.5 {
            Diagnosis::Malignant
        } else {
            Diagnosis::Benign
        }
    }

    pub fn index(self) -> usize {
        match self {
            Diagnosis::Benign => 0,
            Diagnosis::Malignant => 1,
        }
    }
}

impl FromStr for Diagnosis {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "b" | "benign" => Ok(Diagnosis::Benign),
            "m" | "malignant" => Ok(Diagnosis::Malignant),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnosis::Benign => write!(f, "Benign"),
            Diagnosis::Malignant => write!(f, "Malignant"),
        }
    }
}

/// Row indices of a training/testing partition, each sorted ascending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Split {
    pub training: Vec<usize>,
    pub testing: Vec<usize>,
}

#[derive(Clone, Debug)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub features: Matrix,
    pub labels: Vec<Diagnosis>,
}

impl Dataset {
    pub fn new(feature_names: Vec<String>, features: Matrix, labels: Vec<Diagnosis>) -> Result<Self> {
        if features.nrows() != labels.len() {
            return Err(AnalysisError::DimensionMismatch(format!(
                "{} feature rows but {} labels",
                features.nrows(),
                labels.len()
            )));
        }
        if features.ncols() != feature_names.len() {
            return Err(AnalysisError::DimensionMismatch(format!(
                "{} feature columns but {} feature names",
                features.ncols(),
                feature_names.len()
            )));
        }

        Ok(Self {
            feature_names,
            features,
            labels,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// (rows, columns) counting the label column alongside the features.
    pub fn dim(&self) -> (usize, usize) {
        (self.n_samples(), self.n_features() + 1)
    }

    /// Labels encoded as 0/1 with Malignant = 1.
    pub fn label_vector(&self) -> Vector {
        self.labels.iter().map(|d| d.as_f64()).collect()
    }

    pub fn class_counts(&self) -> [usize; 2] {
        let mut counts = [0usize; 2];
        for label in &self.labels {
            counts[label.index()] += 1;
        }
        counts
    }

    /// A new dataset holding the given rows, in the given order.
    pub fn subset(&self, rows: &[usize]) -> Result<Self> {
        if let Some(&bad) = rows.iter().find(|&&r| r >= self.n_samples()) {
            return Err(AnalysisError::InvalidParameter(format!(
                "row index {} out of range for {} samples",
                bad,
                self.n_samples()
            )));
        }
        let features = self.features.select(Axis(0), rows);
        let labels = rows.iter().map(|&r| self.labels[r]).collect();
        Dataset::new(self.feature_names.clone(), features, labels)
    }

    /// Everything except `row`, plus `row` on its own.
    pub fn leave_one_out(&self, row: usize) -> Result<(Self, Self)> {
        if row >= self.n_samples() {
            return Err(AnalysisError::InvalidParameter(format!(
                "row index {} out of range for {} samples",
                row,
                self.n_samples()
            )));
        }
        let rest: Vec<usize> = (0..self.n_samples()).filter(|&r| r != row).collect();
        Ok((self.subset(&rest)?, self.subset(&[row])?))
    }

    /// Keep only the named features, in the order given.
    pub fn select_features<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let columns = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.feature_names
                    .iter()
                    .position(|f| f == name)
                    .ok_or_else(|| AnalysisError::ColumnNotFound(name.to_string()))
            })
            .collect::<Result<Vec<usize>>>()?;

        let features = self.features.select(Axis(1), &columns);
        let feature_names = columns.iter().map(|&c| self.feature_names[c].clone()).collect();
        Dataset::new(feature_names, features, self.labels.clone())
    }

    /// Seeded split preserving each class's share in both halves.
    ///
    /// Every class contributes `ceil(train_fraction * class_size)` rows to the
    /// training side.
    pub fn stratified_split(&self, train_fraction: f64, seed: u64) -> Result<Split> {
        if train_fraction <= 0.0 || train_fraction >= 1.0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "train_fraction must be between 0 and 1, got {}",
                train_fraction
            )));
        }
        if self.n_samples() == 0 {
            return Err(AnalysisError::EmptyInput("cannot split an empty dataset".to_string()));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut training = Vec::with_capacity(self.n_samples());
        let mut testing = Vec::new();

        for class in Diagnosis::ALL {
            let mut rows: Vec<usize> = (0..self.n_samples())
                .filter(|&r| self.labels[r] == class)
                .collect();
            rows.shuffle(&mut rng);
            let n_train = (rows.len() as f64 * train_fraction).ceil() as usize;
            training.extend_from_slice(&rows[..n_train]);
            testing.extend_from_slice(&rows[n_train..]);
        }

        training.sort_unstable();
        testing.sort_unstable();
        Ok(Split { training, testing })
    }

    /// Materialise both halves of a split.
    pub fn partition(&self, split: &Split) -> Result<(Self, Self)> {
        let seen: HashSet<usize> = split.training.iter().copied().collect();
        if split.testing.iter().any(|r| seen.contains(r)) {
            return Err(AnalysisError::InvalidParameter(
                "training and testing rows overlap".to_string(),
            ));
        }
        Ok((self.subset(&split.training)?, self.subset(&split.testing)?))
    }
}
