//! Logistic models for the benign/malignant decision.
//!
//! - `LogisticRegression`: unpenalized maximum likelihood (IRLS)
//! - `PenalizedLogistic`: ridge (L2) or lasso (L1) penalized fit by
//!   coordinate descent
//! - `cross_validate`: k-fold choice of the penalty strength
//!
//! # Examples
//!
//! ```rust
//! use tumor_lr::linear_model::{cross_validate, CvOptions, Penalty};
//! use tumor_lr::fixtures::SyntheticTumors;
//!
//! let data = SyntheticTumors::new(150).seed(1).build();
//! let options = CvOptions::new(Penalty::Lasso).n_folds(5).n_lambda(10);
//! let cv = cross_validate(&data.features, &data.label_vector(), options).unwrap();
//! println!("lambda.min = {}", cv.lambda_min);
//! ```

mod cross_validation;
mod logistic_regression;
mod penalized;

pub use cross_validation::{CvOptions, CvResult, cross_validate, fold_assignment};
pub use logistic_regression::LogisticRegression;
pub use penalized::{PenalizedLogistic, Penalty, lambda_path};
