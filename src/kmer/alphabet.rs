//! Residue alphabets and exhaustive k-mer enumeration.

use crate::error::{Error, Result};
use itertools::Itertools;

/// The 20 standard amino acids in feature-column order
pub const AMINO_ACIDS: &[u8; 20] = b"ACDEFGHIKLMNPQRSTVWY";

/// Largest supported k-mer length (20^3 = 8000 columns)
pub const MAX_K: usize = 3;

/// Ordered set of distinct ASCII symbols.
///
/// The symbol order drives the enumeration order of every k-mer list built
/// from this alphabet, and therefore the column layout of feature vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<u8>,
}

impl Alphabet {
    /// Create an alphabet from an ordered symbol list
    pub fn new(symbols: &[u8]) -> Result<Self> {
        if symbols.is_empty() {
            return Err(Error::domain("alphabet must contain at least one symbol"));
        }
        if let Some(&b) = symbols.iter().find(|b| !b.is_ascii_graphic()) {
            return Err(Error::domain(format!(
                "alphabet symbol {:#04x} is not a printable ASCII character",
                b
            )));
        }
        if !symbols.iter().all_unique() {
            return Err(Error::domain("alphabet symbols must be distinct"));
        }
        Ok(Self {
            symbols: symbols.to_vec(),
        })
    }

    /// The standard 20-letter amino-acid alphabet
    pub fn amino_acids() -> Self {
        Self {
            symbols: AMINO_ACIDS.to_vec(),
        }
    }

    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Number of k-mers of length `k` (|alphabet|^k), `None` on overflow
    pub fn num_kmers(&self, k: usize) -> Option<usize> {
        u32::try_from(k)
            .ok()
            .and_then(|k| self.symbols.len().checked_pow(k))
    }

    /// Enumerate every k-mer over this alphabet.
    ///
    /// The result is the k-fold Cartesian product of the alphabet with the
    /// rightmost position varying fastest, so for the amino-acid alphabet
    /// `enumerate(2)` starts `AA, AC, AD, ...` and ends `... YW, YY`.
    ///
    /// # Errors
    ///
    /// `Error::Domain` when `k` is 0 or larger than [`MAX_K`].
    pub fn enumerate(&self, k: usize) -> Result<Vec<String>> {
        validate_k(k)?;

        let mut kmers = Vec::with_capacity(self.num_kmers(k).unwrap_or_default());
        kmers.extend(
            (0..k)
                .map(|_| self.symbols.iter().copied())
                .multi_cartesian_product()
                .map(|combo| combo.into_iter().map(char::from).collect::<String>()),
        );

        Ok(kmers)
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::amino_acids()
    }
}

/// Check that a k-mer length is in the supported range
pub fn validate_k(k: usize) -> Result<()> {
    if k == 0 {
        return Err(Error::domain("k-mer length must be at least 1"));
    }
    if k > MAX_K {
        return Err(Error::domain(format!(
            "k-mer length {} exceeds the supported maximum of {}",
            k, MAX_K
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_enumerate_sizes() {
        let alphabet = Alphabet::amino_acids();

        for (k, expected) in [(1, 20), (2, 400), (3, 8000)] {
            let kmers = alphabet.enumerate(k).unwrap();
            assert_eq!(kmers.len(), expected);
            assert!(kmers.iter().all(|m| m.len() == k));

            let distinct: HashSet<_> = kmers.iter().collect();
            assert_eq!(distinct.len(), expected);
        }
    }

    #[test]
    fn test_enumerate_order() {
        let alphabet = Alphabet::amino_acids();

        let monograms = alphabet.enumerate(1).unwrap();
        assert_eq!(monograms.concat(), "ACDEFGHIKLMNPQRSTVWY");

        let bigrams = alphabet.enumerate(2).unwrap();
        assert_eq!(bigrams[0], "AA");
        assert_eq!(bigrams[1], "AC");
        assert_eq!(bigrams[19], "AY");
        assert_eq!(bigrams[20], "CA");
        assert_eq!(bigrams[399], "YY");

        let trigrams = alphabet.enumerate(3).unwrap();
        assert_eq!(trigrams[1], "AAC");
        assert_eq!(trigrams[400], "CAA");
        assert_eq!(trigrams[7999], "YYY");
    }

    #[test]
    fn test_enumerate_is_reproducible() {
        let alphabet = Alphabet::amino_acids();
        assert_eq!(alphabet.enumerate(2).unwrap(), alphabet.enumerate(2).unwrap());
    }

    #[test]
    fn test_enumerate_invalid_k() {
        let alphabet = Alphabet::amino_acids();
        assert!(matches!(alphabet.enumerate(0), Err(Error::Domain(_))));
        assert!(matches!(alphabet.enumerate(4), Err(Error::Domain(_))));
    }

    #[test]
    fn test_custom_alphabet() {
        let alphabet = Alphabet::new(b"BA").unwrap();
        assert_eq!(alphabet.enumerate(2).unwrap(), vec!["BB", "BA", "AB", "AA"]);
        assert_eq!(alphabet.num_kmers(3), Some(8));
    }

    #[test]
    fn test_num_kmers_overflow() {
        let alphabet = Alphabet::amino_acids();
        assert_eq!(alphabet.num_kmers(0), Some(1));
        assert_eq!(alphabet.num_kmers(3), Some(8000));
        assert_eq!(alphabet.num_kmers(100), None);
        assert_eq!(alphabet.num_kmers(usize::MAX), None);
    }

    #[test]
    fn test_invalid_alphabets() {
        assert!(Alphabet::new(b"").is_err());
        assert!(Alphabet::new(b"AA").is_err());
        assert!(Alphabet::new(b"A C").is_err());
    }
}
