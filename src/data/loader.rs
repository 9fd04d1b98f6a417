use crate::data::{SequenceRecord, LABEL_COLUMN, SEQUENCE_COLUMN};
use crate::error::{Error, Result};
use csv::{ReaderBuilder, Trim};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Csv,
    Tsv,
    GzippedCsv,
    GzippedTsv,
}

impl FileFormat {
    /// Detect file format from path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str());
        let stem = path.file_stem().and_then(|s| s.to_str());

        match (ext, stem) {
            (Some("gz"), Some(stem)) => {
                if stem.ends_with(".csv") {
                    Ok(FileFormat::GzippedCsv)
                } else if stem.ends_with(".tsv") || stem.ends_with(".txt") {
                    Ok(FileFormat::GzippedTsv)
                } else {
                    Err(Error::domain(format!(
                        "cannot determine format of gzipped file {:?}",
                        path
                    )))
                }
            }
            (Some("csv"), _) => Ok(FileFormat::Csv),
            (Some("tsv"), _) | (Some("txt"), _) => Ok(FileFormat::Tsv),
            _ => Err(Error::domain(format!("unsupported file format: {:?}", path))),
        }
    }

    /// Get delimiter character
    pub fn delimiter(&self) -> u8 {
        match self {
            FileFormat::Csv | FileFormat::GzippedCsv => b',',
            FileFormat::Tsv | FileFormat::GzippedTsv => b'\t',
        }
    }

    /// Check if format is gzipped
    pub fn is_gzipped(&self) -> bool {
        matches!(self, FileFormat::GzippedCsv | FileFormat::GzippedTsv)
    }
}

/// Data loader configuration
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Progress is logged every `batch_size` records
    pub batch_size: usize,
    /// Maximum number of records to load (0 = unlimited)
    pub max_records: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 10000,
            max_records: 0,
        }
    }
}

/// Loader for labelled sequence tables.
///
/// Requires a header row with at least `Sequence` and `Label` columns; any
/// other columns are ignored.
pub struct DataLoader {
    config: LoaderConfig,
}

impl DataLoader {
    /// Create new data loader with default config
    pub fn new() -> Self {
        Self {
            config: LoaderConfig::default(),
        }
    }

    /// Create new data loader with custom config
    pub fn with_config(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Load sequence records from file
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Vec<SequenceRecord>> {
        let path = path.as_ref();
        info!("Loading data from {:?}", path);

        let format = FileFormat::from_path(path)?;
        debug!("Detected file format: {:?}", format);

        let file = File::open(path)?;
        let records = if format.is_gzipped() {
            self.parse_records(BufReader::new(GzDecoder::new(file)), format)?
        } else {
            self.parse_records(BufReader::new(file), format)?
        };

        info!("Loaded {} records", records.len());
        Ok(records)
    }

    /// Parse records from reader
    fn parse_records<R: Read>(&self, reader: R, format: FileFormat) -> Result<Vec<SequenceRecord>> {
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(format.delimiter())
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        debug!("Headers: {:?}", headers);

        let column = |name: &str| -> Result<usize> {
            headers.iter().position(|h| h == name).ok_or_else(|| {
                Error::domain(format!("dataset is missing required column {:?}", name))
            })
        };
        let sequence_idx = column(SEQUENCE_COLUMN)?;
        let label_idx = column(LABEL_COLUMN)?;

        let mut records = Vec::new();

        for result in csv_reader.records() {
            let record = result?;
            let line = record.position().map_or(0, |p| p.line());

            let sequence = record.get(sequence_idx).unwrap_or_default();
            let label = record.get(label_idx).unwrap_or_default();
            let label = parse_label(label)
                .map_err(|e| Error::Parse(format!("line {}: {}", line, e)))?;

            records.push(SequenceRecord::new(sequence, label));

            if self.config.max_records > 0 && records.len() >= self.config.max_records {
                warn!("Reached maximum record limit: {}", self.config.max_records);
                break;
            }

            if self.config.batch_size > 0 && records.len() % self.config.batch_size == 0 {
                debug!("Loaded {} records...", records.len());
            }
        }

        Ok(records)
    }
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a binary class label
fn parse_label(value: &str) -> std::result::Result<u8, String> {
    match value.parse::<u8>() {
        Ok(label @ (0 | 1)) => Ok(label),
        _ => Err(format!("label must be 0 or 1, got {:?}", value)),
    }
}
