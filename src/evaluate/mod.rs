//! Train-once evaluation of a classifier on a held-out test set.

pub mod metrics;
pub mod report;

use crate::data::{class_counts, FeatureMatrix, TrainTestSplit};
use crate::error::{Error, Result};
use crate::model::{ModelKind, SvmConfig};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

pub use metrics::{ConfusionMatrix, MetricBundle};
pub use report::PredictionRecord;

/// Default location of the prediction report
pub const DEFAULT_REPORT_PATH: &str = "output.csv";

/// Outcome of one evaluation run
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Name of the fitted model
    pub model: String,
    pub metrics: MetricBundle,
    /// Per test record, in test-set order
    pub predictions: Vec<PredictionRecord>,
    /// Positive-class probability per test record
    pub probabilities: Vec<f64>,
}

/// Fits a fresh classifier on the training partition and scores it on the
/// test partition
#[derive(Debug, Clone)]
pub struct EvaluationHarness {
    model: ModelKind,
    svm: SvmConfig,
    report_path: Option<PathBuf>,
    print_summary: bool,
}

impl EvaluationHarness {
    /// Harness writing the report to `output.csv` and printing the summary
    pub fn new(model: ModelKind, svm: SvmConfig) -> Self {
        Self {
            model,
            svm,
            report_path: Some(PathBuf::from(DEFAULT_REPORT_PATH)),
            print_summary: true,
        }
    }

    /// Set the report location; `None` skips writing the report
    pub fn with_report_path(mut self, path: Option<PathBuf>) -> Self {
        self.report_path = path;
        self
    }

    pub fn with_summary(mut self, print_summary: bool) -> Self {
        self.print_summary = print_summary;
        self
    }

    pub fn model(&self) -> ModelKind {
        self.model
    }

    pub fn report_path(&self) -> Option<&Path> {
        self.report_path.as_deref()
    }

    /// Evaluate on a train/test split
    pub fn evaluate_split(&self, split: &TrainTestSplit) -> Result<Evaluation> {
        self.evaluate(
            &split.x_train,
            &split.y_train,
            &split.x_test,
            &split.y_test,
            &split.test_sequences,
        )
    }

    /// Fit on the training data, predict the test data, compute the metric
    /// bundle, write the report and print the summary.
    ///
    /// # Errors
    ///
    /// `Error::DataInsufficiency` when the test or training labels lack a
    /// class, `Error::Domain` on misaligned inputs, and any I/O error from
    /// writing the report.
    pub fn evaluate(
        &self,
        x_train: &FeatureMatrix,
        y_train: &[u8],
        x_test: &FeatureMatrix,
        y_test: &[u8],
        test_sequences: &[String],
    ) -> Result<Evaluation> {
        check_aligned("training", x_train, y_train.len())?;
        check_aligned("test", x_test, y_test.len())?;
        if test_sequences.len() != y_test.len() {
            return Err(Error::domain(format!(
                "{} test sequences for {} test labels",
                test_sequences.len(),
                y_test.len()
            )));
        }
        if x_train.n_cols() != x_test.n_cols() {
            return Err(Error::domain(format!(
                "training has {} features but test has {}",
                x_train.n_cols(),
                x_test.n_cols()
            )));
        }
        check_both_classes("test", y_test)?;
        check_both_classes("training", y_train)?;

        let start = Instant::now();
        let mut classifier = self.model.build(&self.svm);
        classifier.fit(x_train, y_train)?;
        info!(
            "Fitted {} in {}",
            classifier.name(),
            crate::utils::format_duration(start.elapsed().as_secs_f64())
        );

        let predicted = classifier.predict(x_test)?;
        let probabilities = classifier.predict_proba(x_test)?;
        let metrics = MetricBundle::compute(y_test, &predicted, &probabilities)?;
        info!(
            "Test accuracy {:.4}%, AUC {:.4}",
            metrics.accuracy, metrics.auc
        );

        let predictions = report::build_records(test_sequences, y_test, &predicted)?;
        if let Some(path) = &self.report_path {
            report::write_report(path, &predictions)?;
        }
        if self.print_summary {
            metrics.print();
        }

        Ok(Evaluation {
            model: classifier.name().to_string(),
            metrics,
            predictions,
            probabilities,
        })
    }
}

fn check_aligned(name: &str, x: &FeatureMatrix, labels: usize) -> Result<()> {
    if x.n_rows() != labels {
        return Err(Error::domain(format!(
            "{} matrix has {} rows but {} labels",
            name,
            x.n_rows(),
            labels
        )));
    }
    Ok(())
}

fn check_both_classes(name: &str, labels: &[u8]) -> Result<()> {
    let (negatives, positives) = class_counts(labels);
    if negatives == 0 || positives == 0 {
        return Err(Error::insufficient(format!(
            "{} set needs both classes (positive={}, negative={})",
            name, positives, negatives
        )));
    }
    Ok(())
}
