//! Dimensionality reduction.
//!
//! - `Pca`: principal components of the centered, unit-variance features
//! - `PcaLogistic`: logistic regression on the leading component scores
//!
//! # Examples
//!
//! ```rust
//! use tumor_lr::decomposition::Pca;
//! use ndarray::array;
//!
//! let x = array![[1.0, 2.0], [3.0, 4.5], [5.0, 6.0], [7.0, 8.5]];
//! let mut pca = Pca::new().n_components(1);
//! let scores = pca.fit_transform(&x).unwrap();
//! assert_eq!(scores.ncols(), 1);
//! ```

mod pca;
mod pca_logistic;

pub use pca::Pca;
pub use pca_logistic::PcaLogistic;
