//! Reading and cleaning the raw diagnostic file.
//!
//! The raw layout has 33 columns: `id`, `diagnosis`, the 30 measurements
//! below, and an empty trailing column left behind by a trailing delimiter.
//! Cleaning drops `id` and the empty column and casts `diagnosis` to
//! [`Diagnosis`]. Any deviation from that layout is fatal.

use crate::dataset::{Dataset, Diagnosis};
use crate::error::{AnalysisError, Result};
use crate::Matrix;
use log::{debug, info};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const ID_COLUMN: &str = "id";
pub const LABEL_COLUMN: &str = "diagnosis";

pub const FEATURE_NAMES: [&str; 30] = [
    "radius_mean",
    "texture_mean",
    "perimeter_mean",
    "area_mean",
    "smoothness_mean",
    "compactness_mean",
    "concavity_mean",
    "concave points_mean",
    "symmetry_mean",
    "fractal_dimension_mean",
    "radius_se",
    "texture_se",
    "perimeter_se",
    "area_se",
    "smoothness_se",
    "compactness_se",
    "concavity_se",
    "concave points_se",
    "symmetry_se",
    "fractal_dimension_se",
    "radius_worst",
    "texture_worst",
    "perimeter_worst",
    "area_worst",
    "smoothness_worst",
    "compactness_worst",
    "concavity_worst",
    "concave points_worst",
    "symmetry_worst",
    "fractal_dimension_worst",
];

pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    info!("Loading dataset from {}", path.display());
    let file = File::open(path)?;
    read_dataset(file)
}

pub fn read_dataset<R: Read>(source: R) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let column_of = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| AnalysisError::ColumnNotFound(name.to_string()))
    };

    column_of(ID_COLUMN)?;
    let label_column = column_of(LABEL_COLUMN)?;
    let feature_columns = FEATURE_NAMES
        .iter()
        .map(|name| column_of(*name))
        .collect::<Result<Vec<usize>>>()?;

    let dropped: Vec<&str> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != label_column && !feature_columns.contains(i))
        .map(|(_, h)| if h.is_empty() { "<empty>" } else { h.as_str() })
        .collect();

    let mut values = Vec::new();
    let mut labels = Vec::new();

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let raw_label = &record[label_column];
        let label = raw_label
            .parse::<Diagnosis>()
            .map_err(|_| AnalysisError::UnknownDiagnosis {
                row,
                value: raw_label.to_string(),
            })?;
        labels.push(label);

        for (&column, name) in feature_columns.iter().zip(FEATURE_NAMES.iter()) {
            let raw = &record[column];
            let value = raw.parse::<f64>().map_err(|_| AnalysisError::InvalidValue {
                row,
                column: name.to_string(),
                value: raw.to_string(),
            })?;
            values.push(value);
        }
    }

    if labels.is_empty() {
        return Err(AnalysisError::EmptyInput("the input file has no data rows".to_string()));
    }

    let features = Matrix::from_shape_vec((labels.len(), FEATURE_NAMES.len()), values)
        .map_err(|e| AnalysisError::DimensionMismatch(e.to_string()))?;
    debug!("Dropped columns: {:?}", dropped);
    info!(
        "Loaded {} rows; {} features kept after cleaning",
        labels.len(),
        FEATURE_NAMES.len()
    );

    let names = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
    Dataset::new(names, features, labels)
}
