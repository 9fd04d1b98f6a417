//! Binary classification metrics.
//!
//! Confusion matrix, accuracy, F1, Matthews correlation coefficient, recall,
//! sensitivity / specificity and the ROC curve with its trapezoidal AUC.

use crate::data::class_counts;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// 2x2 confusion matrix; rows are true labels, columns predicted labels,
/// both ordered [negative, positive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tn: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
    pub tp: usize,
}

impl ConfusionMatrix {
    /// Accumulate a confusion matrix from true and predicted labels
    pub fn from_labels(actual: &[u8], predicted: &[u8]) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(Error::domain(format!(
                "actual length {} != predicted length {}",
                actual.len(),
                predicted.len()
            )));
        }

        let mut cm = Self::default();
        for (&a, &p) in actual.iter().zip(predicted) {
            match (a == 1, p == 1) {
                (false, false) => cm.tn += 1,
                (false, true) => cm.fp += 1,
                (true, false) => cm.fn_ += 1,
                (true, true) => cm.tp += 1,
            }
        }
        Ok(cm)
    }

    pub fn total(&self) -> usize {
        self.tn + self.fp + self.fn_ + self.tp
    }

    /// Rows [negative, positive] of true labels
    pub fn as_array(&self) -> [[usize; 2]; 2] {
        [[self.tn, self.fp], [self.fn_, self.tp]]
    }

    /// Fraction of correct predictions
    pub fn accuracy(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        (self.tp + self.tn) as f64 / self.total() as f64
    }

    /// TP / (TP + FN), 0.0 when there are no positives
    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    /// TP / (TP + FP), 0.0 when nothing is predicted positive
    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    /// Harmonic mean of precision and recall, 0.0 when undefined
    pub fn f1(&self) -> f64 {
        ratio(2 * self.tp, 2 * self.tp + self.fp + self.fn_)
    }

    /// Matthews correlation coefficient, 0.0 when the denominator vanishes
    pub fn mcc(&self) -> f64 {
        let (tp, tn, fp, fn_) = (
            self.tp as f64,
            self.tn as f64,
            self.fp as f64,
            self.fn_ as f64,
        );
        let denom_sq = (tp + fp) * (tp + fn_) * (tn + fp) * (tn + fn_);
        if denom_sq <= 0.0 {
            return 0.0;
        }
        (tp * tn - fp * fn_) / denom_sq.sqrt()
    }

    /// TP / (TP + FN) * 100
    pub fn sensitivity(&self) -> Result<f64> {
        if self.tp + self.fn_ == 0 {
            return Err(Error::insufficient(
                "sensitivity is undefined without positive test records",
            ));
        }
        Ok(self.tp as f64 / (self.tp + self.fn_) as f64 * 100.0)
    }

    /// TN / (TN + FP) * 100
    pub fn specificity(&self) -> Result<f64> {
        if self.tn + self.fp == 0 {
            return Err(Error::insufficient(
                "specificity is undefined without negative test records",
            ));
        }
        Ok(self.tn as f64 / (self.tn + self.fp) as f64 * 100.0)
    }
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

/// A single point on the ROC curve
#[derive(Debug, Clone, PartialEq)]
pub struct RocPoint {
    /// Score threshold at which this point is computed
    pub threshold: f64,
    pub fpr: f64,
    pub tpr: f64,
}

/// ROC curve with AUC
#[derive(Debug, Clone)]
pub struct RocCurve {
    /// Points from (0, 0) to (1, 1)
    pub points: Vec<RocPoint>,
    /// Area under the curve (trapezoidal rule)
    pub auc: f64,
}

/// Compute the ROC curve of positive-class scores against 0/1 labels.
///
/// Thresholds are the distinct scores in descending order; tied scores move
/// the curve diagonally.
///
/// # Errors
///
/// `Error::DataInsufficiency` when either class is absent, `Error::Domain`
/// on empty or mismatched inputs.
pub fn roc_curve(scores: &[f64], labels: &[u8]) -> Result<RocCurve> {
    if scores.is_empty() {
        return Err(Error::domain("ROC curve needs at least one score"));
    }
    if scores.len() != labels.len() {
        return Err(Error::domain(format!(
            "scores length {} != labels length {}",
            scores.len(),
            labels.len()
        )));
    }

    let (total_neg, total_pos) = class_counts(labels);
    if total_pos == 0 || total_neg == 0 {
        return Err(Error::insufficient(format!(
            "ROC curve needs both classes (positive={}, negative={})",
            total_pos, total_neg
        )));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let (p, n) = (total_pos as f64, total_neg as f64);
    let mut points = vec![RocPoint {
        threshold: f64::INFINITY,
        fpr: 0.0,
        tpr: 0.0,
    }];

    let (mut tp, mut fp) = (0usize, 0usize);
    let mut i = 0;
    while i < order.len() {
        let current = scores[order[i]];
        while i < order.len() && scores[order[i]] == current {
            if labels[order[i]] == 1 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        points.push(RocPoint {
            threshold: current,
            fpr: fp as f64 / n,
            tpr: tp as f64 / p,
        });
    }

    let fpr: Vec<f64> = points.iter().map(|pt| pt.fpr).collect();
    let tpr: Vec<f64> = points.iter().map(|pt| pt.tpr).collect();
    let auc = trapezoidal_auc(&fpr, &tpr);

    Ok(RocCurve { points, auc })
}

/// Area under a piecewise-linear curve given by monotone x values
pub fn trapezoidal_auc(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum()
}

/// Metrics of one evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricBundle {
    pub confusion: ConfusionMatrix,
    /// Percentage of correct predictions
    pub accuracy: f64,
    pub f1: f64,
    pub mcc: f64,
    pub recall: f64,
    /// Area under the ROC curve of positive-class probabilities
    pub auc: f64,
    /// Percentage of positives recovered
    pub sensitivity: f64,
    /// Percentage of negatives recovered
    pub specificity: f64,
}

impl MetricBundle {
    /// Compute all metrics from true labels, hard predictions and
    /// positive-class probabilities.
    ///
    /// # Errors
    ///
    /// `Error::DataInsufficiency` when the true labels lack either class.
    pub fn compute(actual: &[u8], predicted: &[u8], scores: &[f64]) -> Result<Self> {
        let confusion = ConfusionMatrix::from_labels(actual, predicted)?;
        let sensitivity = confusion.sensitivity()?;
        let specificity = confusion.specificity()?;
        let auc = roc_curve(scores, actual)?.auc;

        Ok(Self {
            confusion,
            accuracy: confusion.accuracy() * 100.0,
            f1: confusion.f1(),
            mcc: confusion.mcc(),
            recall: confusion.recall(),
            auc,
            sensitivity,
            specificity,
        })
    }

    /// Formatted summary block
    pub fn report(&self) -> String {
        let rule = " -".repeat(25);
        let cm = &self.confusion;
        let lines = [
            format!("{} Evaluation Report {}", rule, rule),
            format!(
                "True Negative: {}, False Positive: {}, False Negative: {}, True Positive: {}",
                cm.tn, cm.fp, cm.fn_, cm.tp
            ),
            format!("Accuracy: {:.4}%", self.accuracy),
            format!("Sensitivity: {:.2}%", self.sensitivity),
            format!("Specificity: {:.2}%", self.specificity),
            format!("F1_Score: {:.2}", self.f1),
            format!("MCC: {:.2}", self.mcc),
            format!("AUC: {:.2}", self.auc),
        ];
        lines.join("\n")
    }

    /// Print summary to stdout
    pub fn print(&self) {
        println!("{}", self.report());
    }
}
