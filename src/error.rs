//! Error types shared by the feature and evaluation pipeline.

use thiserror::Error;

/// Unified error type for kmersvm operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid argument or configuration (bad k, empty sequence for
    /// composition, unknown feature identifier, unsupported model kind,
    /// missing dataset columns)
    #[error("domain error: {0}")]
    Domain(String),

    /// The data cannot support the requested computation, e.g. a class
    /// missing from the test set
    #[error("insufficient data: {0}")]
    DataInsufficiency(String),

    /// Malformed field value in an input file
    #[error("parse error: {0}")]
    Parse(String),

    /// I/O error (file not found, permission denied, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader or writer failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration file could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn domain(msg: impl Into<String>) -> Self {
        Error::Domain(msg.into())
    }

    pub(crate) fn insufficient(msg: impl Into<String>) -> Self {
        Error::DataInsufficiency(msg.into())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
