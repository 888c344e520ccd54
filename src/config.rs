use crate::error::{AnalysisError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Run settings, read from an optional TOML file. Missing keys keep their
/// defaults.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub data_path: Option<PathBuf>,
    pub seed: u64,
    pub train_fraction: f64,
    pub cv_folds: usize,
    pub n_lambda: usize,
    pub correlation_cutoff: f64,
    pub pca_components: usize,
    pub sweep_max_components: usize,
    pub parallel: bool,
    pub run_loocv: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            seed: 123,
            train_fraction: 0.8,
            cv_folds: 10,
            n_lambda: 100,
            correlation_cutoff: 0.9,
            pca_components: 9,
            sweep_max_components: 10,
            parallel: false,
            run_loocv: true,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(invalid(format!(
                "train_fraction must be in (0, 1), got {}",
                self.train_fraction
            )));
        }
        if self.cv_folds < 3 {
            return Err(invalid(format!("cv_folds must be at least 3, got {}", self.cv_folds)));
        }
        if self.n_lambda == 0 {
            return Err(invalid("n_lambda must be positive".to_string()));
        }
        if !(self.correlation_cutoff > 0.0 && self.correlation_cutoff <= 1.0) {
            return Err(invalid(format!(
                "correlation_cutoff must be in (0, 1], got {}",
                self.correlation_cutoff
            )));
        }
        if self.pca_components == 0 {
            return Err(invalid("pca_components must be positive".to_string()));
        }
        if self.sweep_max_components == 0 {
            return Err(invalid("sweep_max_components must be positive".to_string()));
        }
        Ok(())
    }
}

fn invalid(message: String) -> AnalysisError {
    AnalysisError::InvalidParameter(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.seed, 123);
        assert_eq!(config.cv_folds, 10);
        assert_eq!(config.pca_components, 9);
        assert!(config.run_loocv);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AnalysisConfig::from_toml_str(
            "seed = 7\nparallel = true\ndata_path = \"data/wdbc.csv\"\n",
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert!(config.parallel);
        assert_eq!(config.data_path, Some(PathBuf::from("data/wdbc.csv")));
        assert_eq!(config.train_fraction, 0.8);
        assert_eq!(config.n_lambda, 100);
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert!(matches!(
            AnalysisConfig::from_toml_str("train_fraction = 1.5"),
            Err(AnalysisError::InvalidParameter(_))
        ));
        assert!(AnalysisConfig::from_toml_str("cv_folds = 2").is_err());
        assert!(AnalysisConfig::from_toml_str("pca_components = 0").is_err());
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            AnalysisConfig::from_toml_str("seed = \"abc\""),
            Err(AnalysisError::Config(_))
        ));
    }
}
