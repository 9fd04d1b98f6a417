use crate::data::feature_engineering::FeatureKind;
use crate::data::SplitConfig;
use crate::error::{Error, Result};
use crate::evaluate::DEFAULT_REPORT_PATH;
use crate::model::{ModelKind, SvmConfig};
use crate::utils::validation;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Evaluation run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Feature kinds, concatenated in this order
    pub features: Vec<FeatureKind>,
    /// Classifier to evaluate
    pub model: ModelKind,
    /// Fraction of each class held out for testing
    pub test_ratio: f64,
    /// Seed for shuffling and calibration folds; entropy when absent
    pub seed: Option<u64>,
    /// Prediction report location
    pub report_path: PathBuf,
    /// Optional JSON dump of the metric bundle
    pub metrics_path: Option<PathBuf>,
    /// Support vector classifier settings
    pub svm: SvmConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            features: vec![FeatureKind::BigramOccur],
            model: ModelKind::default(),
            test_ratio: 0.2,
            seed: None,
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
            metrics_path: None,
            svm: SvmConfig::default(),
        }
    }
}

impl RunConfig {
    /// Small, fast configuration for smoke tests
    pub fn quick_test() -> Self {
        Self {
            features: vec![FeatureKind::MonogramComp],
            model: ModelKind::SvmLinear,
            seed: Some(2026),
            ..Default::default()
        }
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn split_config(&self) -> SplitConfig {
        SplitConfig {
            test_ratio: self.test_ratio,
        }
    }

    /// Svm settings with the run seed applied when the svm has none
    pub fn svm_config(&self) -> SvmConfig {
        SvmConfig {
            seed: self.svm.seed.or(self.seed),
            ..self.svm.clone()
        }
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if self.features.is_empty() {
            return Err(Error::domain("at least one feature kind is required"));
        }
        validation::in_open_range(self.test_ratio, 0.0, 1.0, "test_ratio")?;
        self.svm.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.features, vec![FeatureKind::BigramOccur]);
        assert_eq!(config.model, ModelKind::SvmRbf);
        assert_eq!(config.report_path, PathBuf::from("output.csv"));
        assert!(config.validate().is_ok());
        assert!(RunConfig::quick_test().validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config: RunConfig = serde_json::from_str(
            r#"{"features": ["MonogramComp", "BigramComp"], "model": "svm-linear", "svm": {"c": 2.0}}"#,
        )
        .unwrap();

        assert_eq!(config.features, vec![FeatureKind::MonogramComp, FeatureKind::BigramComp]);
        assert_eq!(config.model, ModelKind::SvmLinear);
        assert_eq!(config.svm.c, 2.0);
        assert_eq!(config.test_ratio, 0.2);
    }

    #[test]
    fn test_unknown_identifiers_rejected() {
        assert!(serde_json::from_str::<RunConfig>(r#"{"features": ["QuadgramComp"]}"#).is_err());
        assert!(serde_json::from_str::<RunConfig>(r#"{"model": "knn"}"#).is_err());
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = RunConfig {
            seed: Some(7),
            ..RunConfig::quick_test()
        };
        std::fs::write(&path, config.to_json_string().unwrap()).unwrap();

        assert_eq!(RunConfig::from_json_file(&path).unwrap(), config);
    }

    #[test]
    fn test_validation() {
        let bad_ratio = RunConfig {
            test_ratio: 1.0,
            ..Default::default()
        };
        assert!(matches!(bad_ratio.validate(), Err(Error::Domain(_))));

        let no_features = RunConfig {
            features: vec![],
            ..Default::default()
        };
        assert!(no_features.validate().is_err());

        let mut bad_c = RunConfig::default();
        bad_c.svm.c = -1.0;
        assert!(bad_c.validate().is_err());

        let mut one_fold = RunConfig::default();
        one_fold.svm.probability_folds = 1;
        assert!(one_fold.validate().is_err());
    }

    #[test]
    fn test_svm_seed_inherits_run_seed() {
        let config = RunConfig {
            seed: Some(11),
            ..Default::default()
        };
        assert_eq!(config.svm_config().seed, Some(11));
    }
}
