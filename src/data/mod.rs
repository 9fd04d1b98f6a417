pub mod loader;
pub mod preprocessing;
pub mod feature_engineering;

pub use feature_engineering::{AssembledFeatures, FeatureAssembler, FeatureKind};
pub use loader::DataLoader;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Name of the required sequence column
pub const SEQUENCE_COLUMN: &str = "Sequence";

/// Name of the required label column
pub const LABEL_COLUMN: &str = "Label";

/// Labelled protein sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceRecord {
    /// Residue string
    pub sequence: String,
    /// Class label (0: negative, 1: positive)
    pub label: u8,
}

impl SequenceRecord {
    /// Create a new record
    pub fn new(sequence: impl Into<String>, label: u8) -> Self {
        Self {
            sequence: sequence.into(),
            label,
        }
    }

    /// Check if record belongs to the positive class
    pub fn is_positive(&self) -> bool {
        self.label == 1
    }
}

/// Textual class name used in prediction reports
pub fn label_name(label: u8) -> &'static str {
    if label == 1 {
        "Positive"
    } else {
        "Negative"
    }
}

/// Count (negatives, positives) in a label vector
pub fn class_counts(labels: &[u8]) -> (usize, usize) {
    let positives = labels.iter().filter(|&&l| l == 1).count();
    (labels.len() - positives, positives)
}

/// Dense row-major feature matrix
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    data: Vec<f64>,
    n_rows: usize,
    n_cols: usize,
}

impl FeatureMatrix {
    /// Allocate a zero matrix of the final size
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self {
            data: vec![0.0; n_rows * n_cols],
            n_rows,
            n_cols,
        }
    }

    /// Build a matrix from rows, which must all share one length
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, |r| r.len());

        let mut data = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(Error::domain(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    n_cols
                )));
            }
            data.extend(row);
        }

        Ok(Self {
            data,
            n_rows,
            n_cols,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Get row at index
    pub fn row(&self, index: usize) -> &[f64] {
        &self.data[index * self.n_cols..(index + 1) * self.n_cols]
    }

    /// Get mutable row at index
    pub fn row_mut(&mut self, index: usize) -> &mut [f64] {
        &mut self.data[index * self.n_cols..(index + 1) * self.n_cols]
    }

    /// Iterate over rows in order
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.n_rows).map(move |i| self.row(i))
    }

    /// All values in row-major order
    pub fn values(&self) -> &[f64] {
        &self.data
    }

    /// Copy the given rows, in the given order, into a new matrix
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.n_cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Self {
            data,
            n_rows: indices.len(),
            n_cols: self.n_cols,
        }
    }
}

/// Train/test split configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of each class held out for testing
    pub test_ratio: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self { test_ratio: 0.2 }
    }
}

/// Index-aligned training and test partitions
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: FeatureMatrix,
    pub y_train: Vec<u8>,
    pub train_sequences: Vec<String>,
    pub x_test: FeatureMatrix,
    pub y_test: Vec<u8>,
    pub test_sequences: Vec<String>,
}

impl TrainTestSplit {
    /// Get total number of records
    pub fn total_samples(&self) -> usize {
        self.y_train.len() + self.y_test.len()
    }
}
