//! Seeded synthetic data in the diagnostic-dataset layout.
//!
//! Used by the tests and by the `--synthetic` flag of the binary. Rows are
//! driven by three latent factors (size, texture, shape) shifted by the
//! diagnosis, so the radius/perimeter/area columns are strongly collinear and
//! the fractal-dimension columns carry no signal at all.

use crate::dataset::{Dataset, Diagnosis};
use crate::error::Result;
use crate::loader::FEATURE_NAMES;
use crate::{Matrix, Vector};
use ndarray::Array2;
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::StandardNormal;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// Offset, spread, and (size, texture, shape) loadings of each base measurement.
const BASE_MEASUREMENTS: [(f64, f64, [f64; 3]); 10] = [
    (14.0, 3.5, [1.0, 0.0, 0.0]),   // radius
    (19.0, 4.0, [0.0, 1.0, 0.0]),   // texture
    (92.0, 24.0, [1.0, 0.0, 0.1]),  // perimeter
    (650.0, 350.0, [1.0, 0.0, 0.0]), // area
    (0.096, 0.014, [0.0, 0.0, 0.4]), // smoothness
    (0.10, 0.05, [0.2, 0.0, 1.0]),  // compactness
    (0.09, 0.08, [0.3, 0.0, 1.0]),  // concavity
    (0.05, 0.04, [0.6, 0.0, 0.8]),  // concave points
    (0.18, 0.03, [0.0, 0.0, 0.3]),  // symmetry
    (0.063, 0.007, [0.0, 0.0, 0.0]), // fractal dimension
];

/// Noise level and spread multiplier for the mean / se / worst variants.
const VARIANTS: [(f64, f64); 3] = [(0.15, 1.0), (0.9, 0.1), (0.3, 1.4)];

/// Class shift applied to each latent factor for malignant rows.
const MALIGNANT_SHIFT: [f64; 3] = [1.1, 0.5, 0.9];

pub struct SyntheticTumors {
    n_samples: usize,
    n_malignant: usize,
    separation: f64,
    seed: u64,
}

impl SyntheticTumors {
    /// Defaults to the reference dataset's 37% malignant share.
    pub fn new(n_samples: usize) -> Self {
        Self {
            n_samples,
            n_malignant: (n_samples as f64 * 212.0 / 569.0).round() as usize,
            separation: 1.0,
            seed: 0,
        }
    }

    pub fn malignant(mut self, n_malignant: usize) -> Self {
        self.n_malignant = n_malignant.min(self.n_samples);
        self
    }

    /// Multiplier on the malignant shift of every latent factor. Large values
    /// (around 10) make the two classes linearly separable.
    pub fn separation(mut self, separation: f64) -> Self {
        self.separation = separation;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(&self) -> Dataset {
        let n = self.n_samples;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let mut labels: Vec<Diagnosis> = (0..n)
            .map(|i| {
                if i < self.n_malignant {
                    Diagnosis::Malignant
                } else {
                    Diagnosis::Benign
                }
            })
            .collect();
        labels.shuffle(&mut rng);
        let y: Vector = labels.iter().map(|d| d.as_f64()).collect();

        let mut factors: Matrix = Array2::random_using((n, 3), StandardNormal, &mut rng);
        for (f, &shift) in MALIGNANT_SHIFT.iter().enumerate() {
            let mut column = factors.column_mut(f);
            column.scaled_add(shift * self.separation, &y);
        }

        let noise: Matrix = Array2::random_using((n, FEATURE_NAMES.len()), StandardNormal, &mut rng);
        let mut features = Matrix::zeros((n, FEATURE_NAMES.len()));

        for (v, &(noise_level, spread_scale)) in VARIANTS.iter().enumerate() {
            for (k, &(offset, spread, loadings)) in BASE_MEASUREMENTS.iter().enumerate() {
                let j = v * BASE_MEASUREMENTS.len() + k;
                let spread = spread * spread_scale;
                let offset = if v == 1 { offset * 0.1 } else { offset * spread_scale.max(1.0) };
                for i in 0..n {
                    let signal: f64 = (0..3).map(|f| loadings[f] * factors[(i, f)]).sum();
                    features[(i, j)] = offset + spread * (signal + noise_level * noise[(i, j)]);
                }
            }
        }

        let names = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        Dataset {
            feature_names: names,
            features,
            labels,
        }
    }
}

/// Render a dataset in the raw on-disk layout: `id`, `diagnosis`, the 30
/// features, and an empty trailing column.
pub fn to_raw_csv(dataset: &Dataset) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["id".to_string(), "diagnosis".to_string()];
    header.extend(dataset.feature_names.iter().cloned());
    header.push(String::new());
    writer.write_record(&header)?;

    for (i, row) in dataset.features.rows().into_iter().enumerate() {
        let mut record = vec![(842_000 + i).to_string()];
        record.push(match dataset.labels[i] {
            Diagnosis::Benign => "B".to_string(),
            Diagnosis::Malignant => "M".to_string(),
        });
        record.extend(row.iter().map(|v| v.to_string()));
        record.push(String::new());
        writer.write_record(&record)?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_shape_and_balance() {
        let data = SyntheticTumors::new(569).seed(11).build();
        assert_eq!(data.dim(), (569, 31));
        assert_eq!(data.class_counts(), [357, 212]);
    }

    #[test]
    fn test_synthetic_is_seeded() {
        let a = SyntheticTumors::new(50).seed(4).build();
        let b = SyntheticTumors::new(50).seed(4).build();
        assert_eq!(a.features, b.features);
        assert_eq!(a.labels, b.labels);
    }

    #[test]
    fn test_large_separation_splits_the_classes() {
        let data = SyntheticTumors::new(200).separation(10.0).seed(6).build();
        let radius = data.features.column(0);
        let largest_benign = data
            .labels
            .iter()
            .zip(radius.iter())
            .filter(|(d, _)| **d == Diagnosis::Benign)
            .map(|(_, &r)| r)
            .fold(f64::NEG_INFINITY, f64::max);
        let smallest_malignant = data
            .labels
            .iter()
            .zip(radius.iter())
            .filter(|(d, _)| **d == Diagnosis::Malignant)
            .map(|(_, &r)| r)
            .fold(f64::INFINITY, f64::min);
        assert!(largest_benign < smallest_malignant);
    }

    #[test]
    fn test_raw_csv_layout() {
        let data = SyntheticTumors::new(3).seed(2).build();
        let text = to_raw_csv(&data).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("id,diagnosis,radius_mean"));
        assert!(header.ends_with(','));
        assert_eq!(text.lines().count(), 4);
    }
}
