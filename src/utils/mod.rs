use crate::error::Result;
use std::path::Path;

/// Ensure directory exists
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if !path.as_os_str().is_empty() && !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Ensure the directory holding `file` exists
pub fn ensure_parent_dir<P: AsRef<Path>>(file: P) -> Result<()> {
    match file.as_ref().parent() {
        Some(parent) => ensure_dir(parent),
        None => Ok(()),
    }
}

/// Format duration as human-readable string
pub fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else if secs < 3600.0 {
        format!("{:.1}m", secs / 60.0)
    } else {
        format!("{:.1}h", secs / 3600.0)
    }
}

/// Format number with commas
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();

    for (count, c) in s.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result.chars().rev().collect()
}

/// Random number utilities
pub mod random {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Create RNG with fixed seed
    pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    /// Seeded RNG when a seed is given, entropy-seeded otherwise
    pub fn rng_from_seed(seed: Option<u64>) -> ChaCha8Rng {
        match seed {
            Some(seed) => seeded_rng(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }
}

/// Validation utilities
pub mod validation {
    use crate::error::{Error, Result};
    use std::fmt::Display;

    /// Validate that value is in range
    pub fn in_range<T: PartialOrd + Display>(value: T, min: T, max: T, name: &str) -> Result<()> {
        if !(value >= min && value <= max) {
            return Err(Error::domain(format!(
                "{} must be between {} and {}, got {}",
                name, min, max, value
            )));
        }
        Ok(())
    }

    /// Validate that value is strictly between the bounds
    pub fn in_open_range<T: PartialOrd + Display>(
        value: T,
        min: T,
        max: T,
        name: &str,
    ) -> Result<()> {
        if !(value > min && value < max) {
            return Err(Error::domain(format!(
                "{} must be between {} and {} (exclusive), got {}",
                name, min, max, value
            )));
        }
        Ok(())
    }

    /// Validate that value is positive
    pub fn positive<T: PartialOrd + Default + Display>(value: T, name: &str) -> Result<()> {
        if !(value > T::default()) {
            return Err(Error::domain(format!("{} must be positive, got {}", name, value)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30.0), "30.0s");
        assert_eq!(format_duration(90.0), "1.5m");
        assert_eq!(format_duration(3600.0), "1.0h");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_seeded_rng() {
        let mut a = random::rng_from_seed(Some(42));
        let mut b = random::rng_from_seed(Some(42));
        let mut c = random::rng_from_seed(Some(43));

        let va: Vec<u32> = (0..8).map(|_| a.gen()).collect();
        let vb: Vec<u32> = (0..8).map(|_| b.gen()).collect();
        let vc: Vec<u32> = (0..8).map(|_| c.gen()).collect();

        assert_eq!(va, vb);
        assert_ne!(va, vc);
    }

    #[test]
    fn test_validation() {
        assert!(validation::in_range(0.5, 0.0, 1.0, "value").is_ok());
        assert!(validation::in_range(1.5, 0.0, 1.0, "value").is_err());
        assert!(validation::in_range(f64::NAN, 0.0, 1.0, "value").is_err());

        assert!(validation::in_open_range(0.2, 0.0, 1.0, "value").is_ok());
        assert!(validation::in_open_range(1.0, 0.0, 1.0, "value").is_err());

        assert!(validation::positive(1.0, "value").is_ok());
        assert!(validation::positive(0.0, "value").is_err());
        assert!(validation::positive(0usize, "value").is_err());
    }

    #[test]
    fn test_ensure_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested").join("deeper").join("out.csv");
        ensure_parent_dir(&file).unwrap();
        assert!(file.parent().unwrap().is_dir());
        ensure_parent_dir("plain.csv").unwrap();
    }
}
