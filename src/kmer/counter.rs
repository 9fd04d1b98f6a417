//! Overlapping k-mer occurrence and composition counting.

use crate::error::{Error, Result};
use crate::kmer::alphabet::Alphabet;
use std::collections::HashMap;

/// Decimal places kept by composition features
pub const COMPOSITION_DECIMALS: i32 = 3;

/// Counts a fixed, ordered list of k-mers in sequences.
///
/// Output vectors follow the order of the list the counter was built from.
/// Occurrences overlap: `AA` occurs twice in `AAA`.
#[derive(Debug, Clone)]
pub struct KmerCounter {
    k: usize,
    kmers: Vec<String>,
    index: HashMap<Vec<u8>, usize>,
}

impl KmerCounter {
    /// Create a counter for an explicit k-mer list.
    ///
    /// All k-mers must share one non-zero length and be distinct.
    pub fn new(kmers: Vec<String>) -> Result<Self> {
        let k = match kmers.first() {
            Some(first) if !first.is_empty() => first.len(),
            Some(_) => return Err(Error::domain("k-mers must not be empty strings")),
            None => return Err(Error::domain("k-mer list must not be empty")),
        };

        let mut index = HashMap::with_capacity(kmers.len());
        for (i, kmer) in kmers.iter().enumerate() {
            if kmer.len() != k {
                return Err(Error::domain(format!(
                    "k-mer {:?} has length {}, expected {}",
                    kmer,
                    kmer.len(),
                    k
                )));
            }
            if index.insert(kmer.as_bytes().to_vec(), i).is_some() {
                return Err(Error::domain(format!("duplicate k-mer {:?}", kmer)));
            }
        }

        Ok(Self { k, kmers, index })
    }

    /// Create a counter over every k-mer of `alphabet`
    pub fn for_alphabet(alphabet: &Alphabet, k: usize) -> Result<Self> {
        Self::new(alphabet.enumerate(k)?)
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of k-mers, i.e. the feature vector length
    pub fn len(&self) -> usize {
        self.kmers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kmers.is_empty()
    }

    pub fn kmers(&self) -> &[String] {
        &self.kmers
    }

    /// Raw overlapping occurrence count of every k-mer in `sequence`.
    ///
    /// Never fails; an empty or too-short sequence yields all zeros.
    pub fn occurrence(&self, sequence: &str) -> Vec<u32> {
        let mut counts = vec![0u32; self.kmers.len()];
        self.count_into(sequence.as_bytes(), &mut counts);
        counts
    }

    /// Fraction of `sequence` made up by each k-mer, rounded to 3 decimals.
    ///
    /// Each value is `occurrences / sequence length` rounded half away from
    /// zero.
    ///
    /// # Errors
    ///
    /// `Error::Domain` for an empty sequence.
    pub fn composition(&self, sequence: &str) -> Result<Vec<f64>> {
        let mut out = vec![0.0; self.kmers.len()];
        self.write_composition(sequence, &mut out)?;
        Ok(out)
    }

    /// Write occurrence counts into a preallocated row segment
    pub fn write_occurrence(&self, sequence: &str, out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.kmers.len());
        for (slot, count) in out.iter_mut().zip(self.occurrence(sequence)) {
            *slot = f64::from(count);
        }
    }

    /// Write composition values into a preallocated row segment
    pub fn write_composition(&self, sequence: &str, out: &mut [f64]) -> Result<()> {
        debug_assert_eq!(out.len(), self.kmers.len());
        let length = sequence.chars().count();
        if length == 0 {
            return Err(Error::domain(
                "composition is undefined for a zero-length sequence",
            ));
        }

        let length = length as f64;
        for (slot, count) in out.iter_mut().zip(self.occurrence(sequence)) {
            *slot = round_to(f64::from(count) / length, COMPOSITION_DECIMALS);
        }
        Ok(())
    }

    fn count_into(&self, sequence: &[u8], counts: &mut [u32]) {
        if sequence.len() < self.k {
            return;
        }
        for window in sequence.windows(self.k) {
            if let Some(&idx) = self.index.get(window) {
                counts[idx] += 1;
            }
        }
    }
}

/// Round half away from zero to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn counter(k: usize) -> KmerCounter {
        KmerCounter::for_alphabet(&Alphabet::amino_acids(), k).unwrap()
    }

    #[test]
    fn test_overlapping_occurrence() {
        let counter = KmerCounter::new(vec!["AA".to_string()]).unwrap();
        assert_eq!(counter.occurrence("AAA"), vec![2]);
        assert_eq!(counter.occurrence("AAAA"), vec![3]);
    }

    #[test]
    fn test_occurrence_follows_list_order() {
        let counter = counter(1);
        let counts = counter.occurrence("ACCDDD");

        assert_eq!(counts.len(), 20);
        assert_eq!(&counts[..4], &[1, 2, 3, 0]);
        assert_eq!(counts.iter().sum::<u32>(), 6);
    }

    #[test]
    fn test_occurrence_empty_sequence() {
        let counter = counter(2);
        let counts = counter.occurrence("");
        assert_eq!(counts.len(), 400);
        assert!(counts.iter().all(|&c| c == 0));

        assert!(counter.occurrence("A").iter().all(|&c| c == 0));
    }

    #[test]
    fn test_symbols_outside_alphabet_are_skipped() {
        let counter = counter(2);
        let counts = counter.occurrence("AXAA");
        let total: u32 = counts.iter().sum();
        assert_eq!(total, 1);
        assert_eq!(counts[0], 1);
    }

    #[test]
    fn test_composition_matches_rounded_occurrence() {
        let sequence = "MKTAYIAKQRQISFVKSHFSRQ";
        for k in 1..=2 {
            let counter = counter(k);
            let occurrence = counter.occurrence(sequence);
            let composition = counter.composition(sequence).unwrap();
            let length = sequence.len() as f64;

            for (comp, occ) in composition.iter().zip(&occurrence) {
                assert_eq!(*comp, round_to(f64::from(*occ) / length, 3));
            }
        }
    }

    #[test]
    fn test_composition_bigram_divides_by_full_length() {
        let counter = counter(2);
        let composition = counter.composition("AAAA").unwrap();
        // 3 overlapping AA windows over a length of 4
        assert_relative_eq!(composition[0], 0.75);
    }

    #[test]
    fn test_composition_rounds_half_away_from_zero() {
        let counter = counter(1);
        let sequence = format!("A{}", "C".repeat(15));
        let composition = counter.composition(&sequence).unwrap();

        // 1/16 = 0.0625
        assert_eq!(composition[0], 0.063);
        // 15/16 = 0.9375
        assert_eq!(composition[1], 0.938);
    }

    #[test]
    fn test_composition_empty_sequence_fails() {
        let counter = counter(1);
        assert!(matches!(counter.composition(""), Err(Error::Domain(_))));
    }

    #[test]
    fn test_invalid_kmer_lists() {
        assert!(KmerCounter::new(vec![]).is_err());
        assert!(KmerCounter::new(vec![String::new()]).is_err());
        assert!(KmerCounter::new(vec!["A".into(), "AC".into()]).is_err());
        assert!(KmerCounter::new(vec!["AC".into(), "AC".into()]).is_err());
    }
}
