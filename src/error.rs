use thiserror::Error;

/// Every failure the analysis can report. All of them are fatal for a run.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Could not parse configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("The required column '{0}' was not found in the input file")]
    ColumnNotFound(String),

    #[error("Row {row}, column '{column}': could not parse '{value}' as a number")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Row {row}: unknown diagnosis '{value}', expected 'B' or 'M'")]
    UnknownDiagnosis { row: usize, value: String },

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("{0} not fitted. Call fit() first.")]
    NotFitted(&'static str),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Linear system is singular or nearly singular ({0})")]
    Singular(String),

    #[error("Column '{column}' has zero variance and cannot be scaled to unit variance")]
    ZeroVariance { column: String },

    #[error("Training labels contain a single class; logistic regression needs both")]
    SingleClass,

    #[error("LOOCV fold {fold} failed: {source}")]
    FoldFailed {
        fold: usize,
        #[source]
        source: Box<AnalysisError>,
    },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
