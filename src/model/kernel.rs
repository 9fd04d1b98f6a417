//! Kernel functions and an on-demand kernel row cache.

use crate::data::FeatureMatrix;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

/// Default kernel cache budget in megabytes
pub const DEFAULT_CACHE_MB: f64 = 200.0;

/// Kernel of a support-vector classifier
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kernel {
    /// `<x, z>`
    Linear,
    /// `exp(-gamma * |x - z|^2)`
    Rbf { gamma: f64 },
}

impl Kernel {
    /// Evaluate the kernel on two feature rows of equal length
    pub fn compute(&self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            Kernel::Linear => dot(a, b),
            Kernel::Rbf { gamma } => {
                let dist: f64 = a.iter().zip(b).map(|(x, z)| (x - z) * (x - z)).sum();
                (-gamma * dist).exp()
            }
        }
    }
}

impl std::fmt::Display for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kernel::Linear => write!(f, "linear"),
            Kernel::Rbf { gamma } => write!(f, "rbf(gamma={:.6})", gamma),
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, z)| x * z).sum()
}

/// RBF width from the data: `1 / (n_features * Var(X))`, or 1.0 when the
/// matrix has zero variance
pub fn scale_gamma(x: &FeatureMatrix) -> f64 {
    let values = x.values();
    if values.is_empty() || x.n_cols() == 0 {
        return 1.0;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;

    if var > 0.0 {
        1.0 / (x.n_cols() as f64 * var)
    } else {
        1.0
    }
}

/// Kernel rows of a training problem, computed on demand.
///
/// The problem is a subset of rows of a feature matrix given by `indices`;
/// row `i` of the cache holds `K(x[indices[i]], x[indices[t]])` for every
/// `t`. At most `capacity` rows are kept; the least recently used row is
/// evicted first.
pub struct KernelCache<'a> {
    kernel: Kernel,
    x: &'a FeatureMatrix,
    indices: &'a [usize],
    diag: Vec<f64>,
    capacity: usize,
    rows: HashMap<usize, (u64, Rc<[f64]>)>,
    tick: u64,
    evictions: u64,
}

impl<'a> KernelCache<'a> {
    /// Create a cache holding as many rows as fit in `cache_mb` megabytes
    /// (at least two)
    pub fn new(kernel: Kernel, x: &'a FeatureMatrix, indices: &'a [usize], cache_mb: f64) -> Self {
        let n = indices.len();
        let row_bytes = (n.max(1) * std::mem::size_of::<f64>()) as f64;
        let budget_rows = (cache_mb.max(0.0) * 1024.0 * 1024.0 / row_bytes) as usize;
        let capacity = budget_rows.clamp(2, n.max(2));

        debug!(
            "Kernel cache: {} of {} rows ({:.1} MB; a full Gram matrix would take {:.1} MB)",
            capacity.min(n),
            n,
            capacity.min(n) as f64 * row_bytes / (1024.0 * 1024.0),
            n as f64 * row_bytes / (1024.0 * 1024.0)
        );

        let diag = indices
            .iter()
            .map(|&i| kernel.compute(x.row(i), x.row(i)))
            .collect();

        Self {
            kernel,
            x,
            indices,
            diag,
            capacity,
            rows: HashMap::new(),
            tick: 0,
            evictions: 0,
        }
    }

    /// Number of rows in the problem
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// `K(i, i)` for every row
    pub fn diag(&self) -> &[f64] {
        &self.diag
    }

    /// Maximum number of cached rows
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of rows currently held
    pub fn cached_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Kernel row `i` against every row of the problem
    pub fn row(&mut self, i: usize) -> Rc<[f64]> {
        self.tick += 1;
        let tick = self.tick;

        if let Some((last_used, row)) = self.rows.get_mut(&i) {
            *last_used = tick;
            return Rc::clone(row);
        }

        if self.rows.len() >= self.capacity {
            let oldest = self
                .rows
                .iter()
                .min_by_key(|(_, (last_used, _))| *last_used)
                .map(|(&key, _)| key);
            if let Some(key) = oldest {
                self.rows.remove(&key);
                self.evictions += 1;
            }
        }

        let xi = self.x.row(self.indices[i]);
        let row: Rc<[f64]> = self
            .indices
            .iter()
            .map(|&t| self.kernel.compute(xi, self.x.row(t)))
            .collect();
        self.rows.insert(i, (tick, Rc::clone(&row)));
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_kernel() {
        assert_eq!(Kernel::Linear.compute(&[1.0, 2.0], &[3.0, 4.0]), 11.0);
    }

    #[test]
    fn test_rbf_kernel() {
        let kernel = Kernel::Rbf { gamma: 0.5 };
        assert_eq!(kernel.compute(&[1.0, 2.0], &[1.0, 2.0]), 1.0);
        assert_relative_eq!(kernel.compute(&[0.0, 0.0], &[1.0, 1.0]), (-1.0f64).exp());
    }

    fn points() -> FeatureMatrix {
        FeatureMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 2.0], vec![1.0, 1.0]]).unwrap()
    }

    #[test]
    fn test_cache_rows() {
        let x = points();
        let indices = [0, 1, 2];
        let mut cache = KernelCache::new(Kernel::Linear, &x, &indices, DEFAULT_CACHE_MB);

        assert_eq!(cache.diag(), &[1.0, 4.0, 2.0]);
        assert_eq!(&*cache.row(0), &[1.0, 0.0, 1.0]);
        assert_eq!(&*cache.row(2), &[1.0, 2.0, 2.0]);
        assert_eq!(cache.row(1)[2], cache.row(2)[1]);
    }

    #[test]
    fn test_cache_uses_index_view() {
        let x = points();
        let indices = [2, 0];
        let mut cache = KernelCache::new(Kernel::Linear, &x, &indices, DEFAULT_CACHE_MB);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.diag(), &[2.0, 1.0]);
        assert_eq!(&*cache.row(1), &[1.0, 1.0]);
    }

    #[test]
    fn test_cache_evicts_least_recently_used() {
        let x = points();
        let indices = [0, 1, 2];
        // A zero budget still keeps two rows
        let mut cache = KernelCache::new(Kernel::Linear, &x, &indices, 0.0);
        assert_eq!(cache.capacity(), 2);

        cache.row(0);
        cache.row(1);
        cache.row(0);
        cache.row(2);
        assert_eq!(cache.cached_rows(), 2);
        assert_eq!(cache.evictions(), 1);

        // Row 1 was evicted and is recomputed identically
        assert_eq!(&*cache.row(1), &[0.0, 4.0, 2.0]);
        assert_eq!(cache.evictions(), 2);
    }

    #[test]
    fn test_scale_gamma() {
        let x = FeatureMatrix::from_rows(vec![vec![0.0, 2.0], vec![2.0, 0.0]]).unwrap();
        // mean 1, variance 1, two features
        assert_relative_eq!(scale_gamma(&x), 0.5);

        let constant = FeatureMatrix::from_rows(vec![vec![3.0, 3.0]]).unwrap();
        assert_eq!(scale_gamma(&constant), 1.0);
    }
}
