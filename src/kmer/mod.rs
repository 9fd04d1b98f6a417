//! K-mer enumeration and counting over a fixed residue alphabet.

pub mod alphabet;
pub mod counter;

pub use alphabet::{Alphabet, AMINO_ACIDS, MAX_K};
pub use counter::KmerCounter;

/// How a k-mer block turns counts into feature values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CountMode {
    /// Occurrences divided by sequence length, rounded to 3 decimals
    Composition,
    /// Raw overlapping occurrence counts
    Occurrence,
}

impl CountMode {
    /// Get mode as string
    pub fn as_str(&self) -> &'static str {
        match self {
            CountMode::Composition => "composition",
            CountMode::Occurrence => "occurrence",
        }
    }
}

impl std::fmt::Display for CountMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
