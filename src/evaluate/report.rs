use crate::data::label_name;
use crate::error::{Error, Result};
use crate::utils::ensure_parent_dir;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// One row of the prediction report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRecord {
    #[serde(rename = "Sequence")]
    pub sequence: String,
    #[serde(rename = "True Value")]
    pub true_value: String,
    #[serde(rename = "Prediction")]
    pub prediction: String,
}

impl PredictionRecord {
    pub fn new(sequence: impl Into<String>, actual: u8, predicted: u8) -> Self {
        Self {
            sequence: sequence.into(),
            true_value: label_name(actual).to_string(),
            prediction: label_name(predicted).to_string(),
        }
    }

    pub fn is_correct(&self) -> bool {
        self.true_value == self.prediction
    }
}

/// Pair test sequences with their true and predicted labels
pub fn build_records(
    sequences: &[String],
    actual: &[u8],
    predicted: &[u8],
) -> Result<Vec<PredictionRecord>> {
    if sequences.len() != actual.len() || actual.len() != predicted.len() {
        return Err(Error::domain(format!(
            "report columns differ in length: sequences={}, actual={}, predicted={}",
            sequences.len(),
            actual.len(),
            predicted.len()
        )));
    }

    Ok(sequences
        .iter()
        .zip(actual.iter().zip(predicted))
        .map(|(sequence, (&a, &p))| PredictionRecord::new(sequence.as_str(), a, p))
        .collect())
}

/// Write the prediction report as CSV, one row per test record in test-set order
pub fn write_report<P: AsRef<Path>>(path: P, records: &[PredictionRecord]) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;

    let mut writer = csv::Writer::from_path(path)?;
    if records.is_empty() {
        writer.write_record(["Sequence", "True Value", "Prediction"])?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!("Prediction report written to {:?} ({} rows)", path, records.len());
    Ok(())
}

/// Read a prediction report back
pub fn read_report<P: AsRef<Path>>(path: P) -> Result<Vec<PredictionRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_records() {
        let sequences = vec!["AC".to_string(), "GG".to_string()];
        let records = build_records(&sequences, &[1, 0], &[1, 1]).unwrap();

        assert_eq!(records[0], PredictionRecord::new("AC", 1, 1));
        assert_eq!(records[1].true_value, "Negative");
        assert_eq!(records[1].prediction, "Positive");
        assert!(records[0].is_correct());
        assert!(!records[1].is_correct());
    }

    #[test]
    fn test_build_records_length_mismatch() {
        let sequences = vec!["AC".to_string()];
        assert!(build_records(&sequences, &[1, 0], &[1, 0]).is_err());
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("output.csv");
        let records = vec![
            PredictionRecord::new("ACDE", 1, 0),
            PredictionRecord::new("GGGG", 0, 0),
        ];

        write_report(&path, &records).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "Sequence,True Value,Prediction");
        assert_eq!(lines[1], "ACDE,Positive,Negative");
        assert_eq!(lines[2], "GGGG,Negative,Negative");
        assert_eq!(read_report(&path).unwrap(), records);
    }

    #[test]
    fn test_write_empty_report_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_report(&path, &[]).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim_end(), "Sequence,True Value,Prediction");
    }

    #[test]
    fn test_write_report_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let records = vec![PredictionRecord::new("ACDE", 1, 1)];

        let err = write_report(blocker.join("output.csv"), &records).unwrap_err();
        assert!(matches!(err, Error::Io(_) | Error::Csv(_)));

        let err = write_report(blocker.join("nested").join("output.csv"), &records).unwrap_err();
        assert!(matches!(err, Error::Io(_) | Error::Csv(_)));
        assert!(std::fs::metadata(&blocker).unwrap().is_file());
    }
}
