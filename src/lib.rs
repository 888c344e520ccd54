//! Logistic-regression analysis of benign vs malignant tumor masses.
//!
//! The crate loads the 30-feature diagnostic dataset, splits it, fits ridge,
//! lasso, unpenalized and PCA-reduced logistic models, and evaluates them on a
//! holdout split and by leave-one-out cross-validation.
//!
//! ```rust
//! use tumor_lr::fixtures::SyntheticTumors;
//! use tumor_lr::{Classifier, LogisticRegression};
//!
//! let data = SyntheticTumors::new(120).seed(7).build();
//! let mut model = LogisticRegression::new();
//! model.fit(&data.features, &data.label_vector()).unwrap();
//! let predicted = model.predict(&data.features).unwrap();
//! assert_eq!(predicted.len(), 120);
//! ```

pub use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

pub mod classifier;
pub mod config;
pub mod dataset;
pub mod decomposition;
pub mod error;
pub mod evaluation;
pub mod fixtures;
pub mod linalg;
pub mod linear_model;
pub mod loader;
pub mod loocv;
pub mod metrics;
pub mod pipeline;
pub mod preprocessing;
pub mod report;

pub type Vector = Array1<f64>;
pub type Matrix = Array2<f64>;

pub use classifier::Classifier;
pub use config::AnalysisConfig;
pub use dataset::{Dataset, Diagnosis, Split};
pub use decomposition::{Pca, PcaLogistic};
pub use error::{AnalysisError, Result};
pub use evaluation::Evaluation;
pub use linear_model::{CvOptions, CvResult, LogisticRegression, PenalizedLogistic, Penalty};
pub use loocv::{LoocvConfig, LoocvReport};
pub use metrics::{ConfusionMatrix, Metrics};
