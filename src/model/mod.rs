pub mod kernel;
pub mod platt;
pub mod svm;

use crate::data::FeatureMatrix;
use crate::error::{Error, Result};
use crate::model::kernel::DEFAULT_CACHE_MB;
use crate::utils::validation;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub use svm::SupportVectorClassifier;

/// Bounds on the number of calibration folds
pub const MIN_PROBABILITY_FOLDS: usize = 2;
pub const MAX_PROBABILITY_FOLDS: usize = 20;

/// Minimal contract of a binary classifier.
///
/// Labels are 0 (negative) and 1 (positive). A fitted model is only read by
/// `predict` and `predict_proba`.
pub trait Classifier {
    /// Fit the model on a feature matrix and its labels
    fn fit(&mut self, x: &FeatureMatrix, y: &[u8]) -> Result<()>;

    /// Hard class predictions, one per row
    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<u8>>;

    /// Probability of the positive class, one per row
    fn predict_proba(&self, x: &FeatureMatrix) -> Result<Vec<f64>>;

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}

/// Kernel family of a support vector classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelKind {
    Linear,
    Rbf,
}

/// Selectable model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModelKind {
    /// Support vector classifier with an RBF kernel
    #[default]
    SvmRbf,
    /// Support vector classifier with a linear kernel
    SvmLinear,
}

impl ModelKind {
    /// Get model kind as string
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::SvmRbf => "svm-rbf",
            ModelKind::SvmLinear => "svm-linear",
        }
    }

    pub fn kernel(&self) -> KernelKind {
        match self {
            ModelKind::SvmRbf => KernelKind::Rbf,
            ModelKind::SvmLinear => KernelKind::Linear,
        }
    }

    /// Create a fresh, unfitted classifier of this kind
    pub fn build(&self, config: &SvmConfig) -> Box<dyn Classifier> {
        Box::new(SupportVectorClassifier::new(self.kernel(), config.clone()))
    }
}

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "svm-rbf" => Ok(ModelKind::SvmRbf),
            "svm-linear" => Ok(ModelKind::SvmLinear),
            _ => Err(Error::domain(format!(
                "unsupported model kind {:?} (expected svm-rbf or svm-linear)",
                s
            ))),
        }
    }
}

impl TryFrom<String> for ModelKind {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ModelKind> for String {
    fn from(kind: ModelKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Support vector classifier settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvmConfig {
    /// Soft-margin penalty
    pub c: f64,
    /// Stopping tolerance on the KKT violation
    pub tolerance: f64,
    /// RBF width; `None` derives it from the training data variance
    pub gamma: Option<f64>,
    /// Folds used to collect decision values for probability calibration
    pub probability_folds: usize,
    /// Solver iteration cap; `None` uses max(10^7, 100 * n)
    pub max_iter: Option<usize>,
    /// Seed for the calibration fold assignment
    pub seed: Option<u64>,
    /// Kernel row cache budget in megabytes
    pub cache_mb: f64,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            tolerance: 1e-3,
            gamma: None,
            probability_folds: 5,
            max_iter: None,
            seed: None,
            cache_mb: DEFAULT_CACHE_MB,
        }
    }
}

impl SvmConfig {
    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        validation::positive(self.c, "C")?;
        validation::positive(self.tolerance, "tolerance")?;
        if let Some(gamma) = self.gamma {
            validation::positive(gamma, "gamma")?;
        }
        validation::in_range(
            self.probability_folds,
            MIN_PROBABILITY_FOLDS,
            MAX_PROBABILITY_FOLDS,
            "probability_folds",
        )?;
        if let Some(max_iter) = self.max_iter {
            validation::positive(max_iter, "max_iter")?;
        }
        validation::positive(self.cache_mb, "cache_mb")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_parse() {
        assert_eq!("svm-rbf".parse::<ModelKind>().unwrap(), ModelKind::SvmRbf);
        assert_eq!("svm-linear".parse::<ModelKind>().unwrap(), ModelKind::SvmLinear);
        assert_eq!(ModelKind::SvmLinear.kernel(), KernelKind::Linear);
    }

    #[test]
    fn test_unsupported_model_kind() {
        let err = "random-forest".parse::<ModelKind>().unwrap_err();
        assert!(matches!(err, Error::Domain(_)));
        assert!(err.to_string().contains("unsupported model kind"));
    }

    #[test]
    fn test_default_model_kind() {
        assert_eq!(ModelKind::default(), ModelKind::SvmRbf);
    }

    #[test]
    fn test_build_names() {
        let config = SvmConfig::default();
        assert_eq!(ModelKind::SvmRbf.build(&config).name(), "svm-rbf");
        assert_eq!(ModelKind::SvmLinear.build(&config).name(), "svm-linear");
    }

    #[test]
    fn test_svm_config_validation() {
        assert!(SvmConfig::default().validate().is_ok());
        assert!(SvmConfig { c: 0.0, ..SvmConfig::default() }.validate().is_err());
        assert!(SvmConfig { gamma: Some(-1.0), ..SvmConfig::default() }.validate().is_err());
        assert!(SvmConfig { cache_mb: 0.0, ..SvmConfig::default() }.validate().is_err());
    }

    #[test]
    fn test_probability_folds_range() {
        for folds in [0, 1, 21] {
            let config = SvmConfig { probability_folds: folds, ..SvmConfig::default() };
            assert!(matches!(config.validate(), Err(Error::Domain(_))));
        }
        for folds in [2, 5, 20] {
            let config = SvmConfig { probability_folds: folds, ..SvmConfig::default() };
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_svm_config_partial_json() {
        let config: SvmConfig = serde_json::from_str(r#"{"c": 10.0}"#).unwrap();
        assert_eq!(config.c, 10.0);
        assert_eq!(config.probability_folds, 5);
    }
}
