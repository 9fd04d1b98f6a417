//! # kmersvm: k-mer features for protein sequence classification
//!
//! kmersvm turns protein sequences into fixed-length k-mer feature vectors
//! over the 20 standard amino acids and evaluates a support vector
//! classifier on them.
//!
//! ## Features
//!
//! - Exhaustive k-mer enumeration for k = 1..=3
//! - Composition (rounded fractions) and occurrence (raw counts) features
//! - Feature blocks concatenated in caller order
//! - SVM with linear or RBF kernel and Platt-calibrated probabilities
//! - Accuracy, sensitivity, specificity, F1, MCC and ROC AUC on a held-out split
//! - Support for various input formats (CSV, TSV, gzipped)
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use kmersvm::data::preprocessing::{shuffle_records, split_train_test};
//! use kmersvm::data::{DataLoader, FeatureAssembler, FeatureKind, SplitConfig};
//! use kmersvm::evaluate::EvaluationHarness;
//! use kmersvm::kmer::Alphabet;
//! use kmersvm::model::{ModelKind, SvmConfig};
//!
//! // Load and shuffle
//! let mut records = DataLoader::new().load("data.csv").unwrap();
//! shuffle_records(&mut records, Some(2026));
//!
//! // Monogram composition followed by bigram occurrence
//! let assembler = FeatureAssembler::new(
//!     Alphabet::amino_acids(),
//!     vec![FeatureKind::MonogramComp, FeatureKind::BigramOccur],
//! )
//! .unwrap();
//! let assembled = assembler.assemble(&records).unwrap();
//!
//! // Train once, evaluate on the held-out part
//! let split = split_train_test(&assembled, &SplitConfig::default()).unwrap();
//! let evaluation = EvaluationHarness::new(ModelKind::SvmRbf, SvmConfig::default())
//!     .evaluate_split(&split)
//!     .unwrap();
//! println!("AUC: {:.2}", evaluation.metrics.auc);
//! ```

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod evaluate;
pub mod kmer;
pub mod model;
pub mod utils;

/// Re-export commonly used types
pub use config::RunConfig;
pub use data::loader::DataLoader;
pub use data::{FeatureAssembler, FeatureKind, FeatureMatrix, SequenceRecord};
pub use error::{Error, Result};
pub use evaluate::{Evaluation, EvaluationHarness, MetricBundle};
pub use kmer::{Alphabet, KmerCounter};
pub use model::{Classifier, ModelKind, SvmConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!(
        "{} v{} - k-mer features and SVM evaluation for protein sequences",
        NAME, VERSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_info() {
        let info_str = info();
        assert!(info_str.contains("kmersvm"));
        assert!(info_str.contains(VERSION));
    }
}
