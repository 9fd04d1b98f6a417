//! K-mer feature assembly for sequence datasets

use crate::data::{FeatureMatrix, SequenceRecord};
use crate::error::{Error, Result};
use crate::kmer::{Alphabet, CountMode, KmerCounter};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, info};

/// Named k-mer feature block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FeatureKind {
    MonogramComp,
    BigramComp,
    TrigramComp,
    MonogramOccur,
    BigramOccur,
}

/// Identifier, k and counting mode of every feature kind
const FEATURE_TABLE: [(FeatureKind, &str, usize, CountMode); 5] = [
    (FeatureKind::MonogramComp, "MonogramComp", 1, CountMode::Composition),
    (FeatureKind::BigramComp, "BigramComp", 2, CountMode::Composition),
    (FeatureKind::TrigramComp, "TrigramComp", 3, CountMode::Composition),
    (FeatureKind::MonogramOccur, "MonogramOccur", 1, CountMode::Occurrence),
    (FeatureKind::BigramOccur, "BigramOccur", 2, CountMode::Occurrence),
];

impl FeatureKind {
    /// All feature kinds in table order
    pub const ALL: [FeatureKind; 5] = [
        FeatureKind::MonogramComp,
        FeatureKind::BigramComp,
        FeatureKind::TrigramComp,
        FeatureKind::MonogramOccur,
        FeatureKind::BigramOccur,
    ];

    fn entry(&self) -> &'static (FeatureKind, &'static str, usize, CountMode) {
        &FEATURE_TABLE[*self as usize]
    }

    /// Get identifier as string
    pub fn as_str(&self) -> &'static str {
        self.entry().1
    }

    /// K-mer length
    pub fn k(&self) -> usize {
        self.entry().2
    }

    pub fn mode(&self) -> CountMode {
        self.entry().3
    }

    /// Width of this block for the given alphabet
    pub fn dimension(&self, alphabet: &Alphabet) -> usize {
        // k is at most 3 and symbols are single bytes, so this cannot overflow
        alphabet.num_kmers(self.k()).unwrap_or_default()
    }
}

impl FromStr for FeatureKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FEATURE_TABLE
            .iter()
            .find(|(_, name, _, _)| *name == s)
            .map(|(kind, _, _, _)| *kind)
            .ok_or_else(|| {
                let known: Vec<&str> = FEATURE_TABLE.iter().map(|e| e.1).collect();
                Error::domain(format!(
                    "unknown feature identifier {:?} (expected one of {})",
                    s,
                    known.join(", ")
                ))
            })
    }
}

impl TryFrom<String> for FeatureKind {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<FeatureKind> for String {
    fn from(kind: FeatureKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Column range occupied by one feature kind in an assembled row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureBlock {
    pub kind: FeatureKind,
    pub offset: usize,
    pub width: usize,
}

impl FeatureBlock {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.width
    }
}

/// Assembled dataset: feature matrix, labels and sequences, index-aligned
#[derive(Debug, Clone)]
pub struct AssembledFeatures {
    pub features: FeatureMatrix,
    pub labels: Vec<u8>,
    pub sequences: Vec<String>,
    pub blocks: Vec<FeatureBlock>,
}

impl AssembledFeatures {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The columns of `kind` within row `index`, if that kind was assembled
    pub fn block(&self, index: usize, kind: FeatureKind) -> Option<&[f64]> {
        let block = self.blocks.iter().find(|b| b.kind == kind)?;
        Some(&self.features.row(index)[block.range()])
    }
}

/// Applies an ordered list of feature kinds to sequences.
///
/// Row vectors are the concatenation of each kind's block in exactly the
/// order the kinds were given, so a model trained on one layout must be fed
/// the same list at inference time.
pub struct FeatureAssembler {
    alphabet: Alphabet,
    kinds: Vec<FeatureKind>,
    counters: HashMap<usize, KmerCounter>,
    blocks: Vec<FeatureBlock>,
    show_progress: bool,
}

impl FeatureAssembler {
    /// Create an assembler, enumerating each distinct k once
    pub fn new(alphabet: Alphabet, kinds: Vec<FeatureKind>) -> Result<Self> {
        if kinds.is_empty() {
            return Err(Error::domain("at least one feature kind is required"));
        }

        let mut counters = HashMap::new();
        let mut blocks = Vec::with_capacity(kinds.len());
        let mut offset = 0;

        for &kind in &kinds {
            if !counters.contains_key(&kind.k()) {
                let counter = KmerCounter::for_alphabet(&alphabet, kind.k())?;
                debug!("Enumerated {} k-mers for k={}", counter.len(), kind.k());
                counters.insert(kind.k(), counter);
            }

            let width = kind.dimension(&alphabet);
            blocks.push(FeatureBlock { kind, offset, width });
            offset += width;
        }

        Ok(Self {
            alphabet,
            kinds,
            counters,
            blocks,
            show_progress: false,
        })
    }

    /// Show a progress bar while assembling
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn kinds(&self) -> &[FeatureKind] {
        &self.kinds
    }

    pub fn blocks(&self) -> &[FeatureBlock] {
        &self.blocks
    }

    /// Total row width
    pub fn dimension(&self) -> usize {
        self.blocks.iter().map(|b| b.width).sum()
    }

    /// Column names in row order, e.g. `BigramComp_AC`
    pub fn column_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.dimension());
        for block in &self.blocks {
            let counter = &self.counters[&block.kind.k()];
            names.extend(
                counter
                    .kmers()
                    .iter()
                    .map(|kmer| format!("{}_{}", block.kind, kmer)),
            );
        }
        names
    }

    /// Compute a single feature block for one sequence
    pub fn extract(&self, kind: FeatureKind, sequence: &str) -> Result<Vec<f64>> {
        let enumerated;
        let counter = match self.counters.get(&kind.k()) {
            Some(counter) => counter,
            None => {
                enumerated = KmerCounter::for_alphabet(&self.alphabet, kind.k())?;
                &enumerated
            }
        };

        let mut out = vec![0.0; counter.len()];
        write_block(counter, kind.mode(), sequence, &mut out)?;
        Ok(out)
    }

    /// Compute the concatenated row vector for one sequence
    pub fn row(&self, sequence: &str) -> Result<Vec<f64>> {
        let mut out = vec![0.0; self.dimension()];
        self.fill_row(sequence, &mut out)?;
        Ok(out)
    }

    fn fill_row(&self, sequence: &str, out: &mut [f64]) -> Result<()> {
        for block in &self.blocks {
            let counter = &self.counters[&block.kind.k()];
            write_block(counter, block.kind.mode(), sequence, &mut out[block.range()])?;
        }
        Ok(())
    }

    /// Build the feature matrix for every record, in record order
    pub fn assemble(&self, records: &[SequenceRecord]) -> Result<AssembledFeatures> {
        let kinds: Vec<&str> = self.kinds.iter().map(|k| k.as_str()).collect();
        info!(
            "Generating {} features per sequence ({}) for {} sequences",
            self.dimension(),
            kinds.join(" + "),
            records.len()
        );

        let mut features = FeatureMatrix::zeros(records.len(), self.dimension());
        let mut labels = Vec::with_capacity(records.len());
        let mut sequences = Vec::with_capacity(records.len());

        let progress = if self.show_progress {
            ProgressBar::new(records.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::with_template(
            "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} sequences",
        ) {
            progress.set_style(style);
        }

        for (i, record) in records.iter().enumerate() {
            self.fill_row(&record.sequence, features.row_mut(i))
                .map_err(|e| match e {
                    Error::Domain(msg) => Error::Domain(format!("record {}: {}", i, msg)),
                    other => other,
                })?;
            labels.push(record.label);
            sequences.push(record.sequence.clone());
            progress.inc(1);
        }
        progress.finish_and_clear();

        Ok(AssembledFeatures {
            features,
            labels,
            sequences,
            blocks: self.blocks.clone(),
        })
    }
}

fn write_block(
    counter: &KmerCounter,
    mode: CountMode,
    sequence: &str,
    out: &mut [f64],
) -> Result<()> {
    match mode {
        CountMode::Composition => counter.write_composition(sequence, out),
        CountMode::Occurrence => {
            counter.write_occurrence(sequence, out);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<SequenceRecord> {
        vec![
            SequenceRecord::new("MKTAYIAKQR", 1),
            SequenceRecord::new("GGGG", 0),
            SequenceRecord::new("ACDEFGHIKLMNPQRSTVWY", 1),
        ]
    }

    #[test]
    fn test_feature_kind_table() {
        for kind in FeatureKind::ALL {
            assert_eq!(kind.as_str().parse::<FeatureKind>().unwrap(), kind);
        }
        assert_eq!(FeatureKind::TrigramComp.k(), 3);
        assert_eq!(FeatureKind::MonogramOccur.mode(), CountMode::Occurrence);
        assert_eq!(FeatureKind::BigramOccur.dimension(&Alphabet::amino_acids()), 400);
    }

    #[test]
    fn test_unknown_feature_identifier() {
        let err = "DipeptideComp".parse::<FeatureKind>().unwrap_err();
        assert!(matches!(err, Error::Domain(_)));
        assert!(err.to_string().contains("unknown feature identifier"));
    }

    #[test]
    fn test_feature_kind_serde() {
        let kinds: Vec<FeatureKind> =
            serde_json::from_str(r#"["BigramComp", "MonogramOccur"]"#).unwrap();
        assert_eq!(kinds, vec![FeatureKind::BigramComp, FeatureKind::MonogramOccur]);
        assert!(serde_json::from_str::<FeatureKind>(r#""Bogus""#).is_err());
        assert_eq!(
            serde_json::to_string(&FeatureKind::TrigramComp).unwrap(),
            r#""TrigramComp""#
        );
    }

    #[test]
    fn test_concatenation_order() {
        let assembler = FeatureAssembler::new(
            Alphabet::amino_acids(),
            vec![FeatureKind::MonogramComp, FeatureKind::BigramComp],
        )
        .unwrap();
        let assembled = assembler.assemble(&records()).unwrap();

        assert_eq!(assembled.features.n_cols(), 420);
        for (i, record) in records().iter().enumerate() {
            let row = assembled.features.row(i);
            let mono = assembler.extract(FeatureKind::MonogramComp, &record.sequence).unwrap();
            let bi = assembler.extract(FeatureKind::BigramComp, &record.sequence).unwrap();
            assert_eq!(&row[..20], mono.as_slice());
            assert_eq!(&row[20..], bi.as_slice());
        }
    }

    #[test]
    fn test_caller_order_is_preserved() {
        let assembler = FeatureAssembler::new(
            Alphabet::amino_acids(),
            vec![FeatureKind::BigramOccur, FeatureKind::MonogramOccur],
        )
        .unwrap();
        let row = assembler.row("GGGG").unwrap();

        assert_eq!(row.len(), 420);
        // GG is bigram index 5 * 20 + 5, G is monogram index 5
        assert_eq!(row[105], 3.0);
        assert_eq!(row[400 + 5], 4.0);

        let blocks = assembler.blocks();
        assert_eq!(blocks[0].kind, FeatureKind::BigramOccur);
        assert_eq!(blocks[1].offset, 400);
    }

    #[test]
    fn test_assemble_alignment() {
        let assembler =
            FeatureAssembler::new(Alphabet::amino_acids(), vec![FeatureKind::MonogramOccur])
                .unwrap();
        let assembled = assembler.assemble(&records()).unwrap();

        assert_eq!(assembled.len(), 3);
        assert_eq!(assembled.labels, vec![1, 0, 1]);
        assert_eq!(assembled.sequences[1], "GGGG");
        assert_eq!(
            assembled.block(1, FeatureKind::MonogramOccur).unwrap()[5],
            4.0
        );
        assert!(assembled.block(1, FeatureKind::BigramOccur).is_none());
    }

    #[test]
    fn test_repeated_kind_and_trigram_width() {
        let assembler = FeatureAssembler::new(
            Alphabet::amino_acids(),
            vec![FeatureKind::TrigramComp, FeatureKind::MonogramOccur, FeatureKind::MonogramOccur],
        )
        .unwrap();
        assert_eq!(assembler.dimension(), 8040);
        assert_eq!(assembler.column_names().len(), 8040);
        assert_eq!(assembler.column_names()[8000], "MonogramOccur_A");
    }

    #[test]
    fn test_empty_sequence() {
        let empty = vec![SequenceRecord::new("", 0)];

        let occur =
            FeatureAssembler::new(Alphabet::amino_acids(), vec![FeatureKind::BigramOccur]).unwrap();
        let assembled = occur.assemble(&empty).unwrap();
        assert!(assembled.features.row(0).iter().all(|&v| v == 0.0));

        let comp =
            FeatureAssembler::new(Alphabet::amino_acids(), vec![FeatureKind::MonogramComp]).unwrap();
        let err = comp.assemble(&empty).unwrap_err();
        assert!(matches!(err, Error::Domain(_)));
        assert!(err.to_string().contains("record 0"));
    }

    #[test]
    fn test_no_kinds() {
        assert!(FeatureAssembler::new(Alphabet::amino_acids(), vec![]).is_err());
    }
}
