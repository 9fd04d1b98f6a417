//! C-support vector classification with an SMO dual solver.
//!
//! The dual problem
//!
//! ```text
//! min 0.5 a'Qa - e'a   subject to   0 <= a_i <= C,  y'a = 0
//! ```
//!
//! with `Q_ij = y_i y_j K(x_i, x_j)` is solved by sequential minimal
//! optimization, choosing the working pair by maximal violation for the
//! first index and second-order gain for the second. Probabilities come from
//! a Platt sigmoid fitted on cross-validated decision values.

use crate::data::{class_counts, FeatureMatrix};
use crate::error::{Error, Result};
use crate::model::kernel::{scale_gamma, Kernel, KernelCache};
use crate::model::platt::PlattSigmoid;
use crate::model::{Classifier, KernelKind, SvmConfig};
use crate::utils::random::rng_from_seed;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

const TAU: f64 = 1e-12;

/// Solution of the dual problem
#[derive(Debug, Clone)]
struct DualSolution {
    alpha: Vec<f64>,
    rho: f64,
    iterations: usize,
}

/// Solve the SVM dual for ±1 labels, reading kernel rows from `cache`
fn solve_dual(
    cache: &mut KernelCache<'_>,
    y: &[f64],
    c: f64,
    eps: f64,
    max_iter: usize,
) -> DualSolution {
    let n = y.len();
    let diag = cache.diag().to_vec();
    let at_upper = |a: f64| a >= c;
    let at_lower = |a: f64| a <= 0.0;

    let mut alpha = vec![0.0; n];
    let mut grad = vec![-1.0; n];
    let mut iterations = 0;

    while iterations < max_iter {
        // First index: maximal violation of the KKT conditions
        let mut g_max = f64::NEG_INFINITY;
        let mut first = None;
        for t in 0..n {
            if y[t] > 0.0 {
                if !at_upper(alpha[t]) && -grad[t] >= g_max {
                    g_max = -grad[t];
                    first = Some(t);
                }
            } else if !at_lower(alpha[t]) && grad[t] >= g_max {
                g_max = grad[t];
                first = Some(t);
            }
        }
        let Some(i) = first else { break };
        let row_i = cache.row(i);

        // Second index: largest decrease of the objective
        let mut g_max2 = f64::NEG_INFINITY;
        let mut second = None;
        let mut obj_min = f64::INFINITY;
        for t in 0..n {
            let grad_diff = if y[t] > 0.0 {
                if at_lower(alpha[t]) {
                    continue;
                }
                g_max2 = g_max2.max(grad[t]);
                g_max + grad[t]
            } else {
                if at_upper(alpha[t]) {
                    continue;
                }
                g_max2 = g_max2.max(-grad[t]);
                g_max - grad[t]
            };

            if grad_diff > 0.0 {
                let quad = diag[i] + diag[t] - 2.0 * row_i[t];
                let obj = -(grad_diff * grad_diff) / if quad > 0.0 { quad } else { TAU };
                if obj <= obj_min {
                    obj_min = obj;
                    second = Some(t);
                }
            }
        }

        let j = match second {
            Some(j) if g_max + g_max2 >= eps => j,
            _ => break,
        };
        iterations += 1;
        let row_j = cache.row(j);
        let q_ij = y[i] * y[j] * row_i[j];

        let (old_ai, old_aj) = (alpha[i], alpha[j]);
        if y[i] != y[j] {
            let mut quad = diag[i] + diag[j] + 2.0 * q_ij;
            if quad <= 0.0 {
                quad = TAU;
            }
            let delta = (-grad[i] - grad[j]) / quad;
            let diff = alpha[i] - alpha[j];
            alpha[i] += delta;
            alpha[j] += delta;

            if diff > 0.0 {
                if alpha[j] < 0.0 {
                    alpha[j] = 0.0;
                    alpha[i] = diff;
                }
                if alpha[i] > c {
                    alpha[i] = c;
                    alpha[j] = c - diff;
                }
            } else {
                if alpha[i] < 0.0 {
                    alpha[i] = 0.0;
                    alpha[j] = -diff;
                }
                if alpha[j] > c {
                    alpha[j] = c;
                    alpha[i] = c + diff;
                }
            }
        } else {
            let mut quad = diag[i] + diag[j] - 2.0 * q_ij;
            if quad <= 0.0 {
                quad = TAU;
            }
            let delta = (grad[i] - grad[j]) / quad;
            let sum = alpha[i] + alpha[j];
            alpha[i] -= delta;
            alpha[j] += delta;

            if sum > c {
                if alpha[i] > c {
                    alpha[i] = c;
                    alpha[j] = sum - c;
                }
                if alpha[j] > c {
                    alpha[j] = c;
                    alpha[i] = sum - c;
                }
            } else {
                if alpha[j] < 0.0 {
                    alpha[j] = 0.0;
                    alpha[i] = sum;
                }
                if alpha[i] < 0.0 {
                    alpha[i] = 0.0;
                    alpha[j] = sum;
                }
            }
        }

        let delta_i = alpha[i] - old_ai;
        let delta_j = alpha[j] - old_aj;
        for t in 0..n {
            grad[t] += y[t] * (y[i] * row_i[t] * delta_i + y[j] * row_j[t] * delta_j);
        }
    }

    if iterations >= max_iter {
        warn!("SMO stopped at the iteration limit of {}", max_iter);
    }
    debug!(
        "Kernel cache held {} rows with {} evictions",
        cache.cached_rows(),
        cache.evictions()
    );

    // Bias: average over free vectors, midpoint of the feasible range otherwise
    let mut upper = f64::INFINITY;
    let mut lower = f64::NEG_INFINITY;
    let mut free_sum = 0.0;
    let mut free_count = 0usize;
    for t in 0..n {
        let yg = y[t] * grad[t];
        let bounded_above = (at_upper(alpha[t]) && y[t] < 0.0) || (at_lower(alpha[t]) && y[t] > 0.0);
        let bounded_below = (at_upper(alpha[t]) && y[t] > 0.0) || (at_lower(alpha[t]) && y[t] < 0.0);
        if bounded_above {
            upper = upper.min(yg);
        } else if bounded_below {
            lower = lower.max(yg);
        } else {
            free_count += 1;
            free_sum += yg;
        }
    }
    let rho = if free_count > 0 {
        free_sum / free_count as f64
    } else {
        (upper + lower) / 2.0
    };

    DualSolution {
        alpha,
        rho,
        iterations,
    }
}

/// Decision function of a trained two-class SVM
#[derive(Debug, Clone)]
struct BinaryModel {
    kernel: Kernel,
    support: FeatureMatrix,
    /// `alpha_i * y_i` per support vector
    coef: Vec<f64>,
    rho: f64,
}

impl BinaryModel {
    /// Train on the rows of `x` listed in `indices`, with `y[t]` the ±1
    /// label of row `indices[t]`
    fn train(
        x: &FeatureMatrix,
        indices: &[usize],
        y: &[f64],
        kernel: Kernel,
        config: &SvmConfig,
    ) -> Self {
        let mut cache = KernelCache::new(kernel, x, indices, config.cache_mb);
        let max_iter = config
            .max_iter
            .unwrap_or_else(|| 10_000_000usize.max(100 * y.len()));
        let solution = solve_dual(&mut cache, y, config.c, config.tolerance, max_iter);

        let support_local: Vec<usize> =
            (0..y.len()).filter(|&t| solution.alpha[t] > 0.0).collect();
        let support_idx: Vec<usize> = support_local.iter().map(|&t| indices[t]).collect();
        let coef = support_local.iter().map(|&t| solution.alpha[t] * y[t]).collect();

        debug!(
            "SMO finished after {} iterations with {} support vectors, rho={:.6}",
            solution.iterations,
            support_idx.len(),
            solution.rho
        );

        Self {
            kernel,
            support: x.select_rows(&support_idx),
            coef,
            rho: solution.rho,
        }
    }

    fn decision(&self, row: &[f64]) -> f64 {
        self.support
            .rows()
            .zip(&self.coef)
            .map(|(sv, coef)| coef * self.kernel.compute(sv, row))
            .sum::<f64>()
            - self.rho
    }
}

/// Fitted state: the decision function plus its probability calibration
#[derive(Debug, Clone)]
struct FittedSvm {
    model: BinaryModel,
    sigmoid: PlattSigmoid,
    n_features: usize,
}

/// Probability-calibrated binary support vector classifier
#[derive(Debug, Clone)]
pub struct SupportVectorClassifier {
    kernel: KernelKind,
    config: SvmConfig,
    fitted: Option<FittedSvm>,
}

impl SupportVectorClassifier {
    /// Create an unfitted classifier
    pub fn new(kernel: KernelKind, config: SvmConfig) -> Self {
        Self {
            kernel,
            config,
            fitted: None,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Signed distance-like score per row; positive means class 1
    pub fn decision_function(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        let fitted = self.fitted_for(x)?;
        Ok(x.rows().map(|row| fitted.model.decision(row)).collect())
    }

    /// Number of support vectors of the fitted model
    pub fn n_support(&self) -> usize {
        self.fitted.as_ref().map_or(0, |f| f.model.coef.len())
    }

    fn fitted_for(&self, x: &FeatureMatrix) -> Result<&FittedSvm> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or_else(|| Error::domain("classifier must be fitted before prediction"))?;
        if x.n_cols() != fitted.n_features {
            return Err(Error::domain(format!(
                "model was fitted on {} features, got {}",
                fitted.n_features,
                x.n_cols()
            )));
        }
        Ok(fitted)
    }

    fn resolve_kernel(&self, x: &FeatureMatrix) -> Kernel {
        match self.kernel {
            KernelKind::Linear => Kernel::Linear,
            KernelKind::Rbf => Kernel::Rbf {
                gamma: self.config.gamma.unwrap_or_else(|| scale_gamma(x)),
            },
        }
    }

    /// Decision values for Platt scaling from an internal k-fold split.
    ///
    /// Folds whose training part lacks a class contribute +1 / -1 (only one
    /// class seen) or 0 (no data). With too few records per class for two
    /// folds, in-sample decision values are used instead.
    fn calibration_decisions(
        &self,
        x: &FeatureMatrix,
        y: &[f64],
        kernel: Kernel,
        full: &BinaryModel,
    ) -> Vec<f64> {
        let positives = y.iter().filter(|&&v| v > 0.0).count();
        let smallest_class = positives.min(y.len() - positives);
        let folds = self.config.probability_folds.min(smallest_class);

        if folds < 2 {
            debug!("Too few records for cross-validated calibration; using training decisions");
            return x.rows().map(|row| full.decision(row)).collect();
        }

        let n = y.len();
        let mut perm: Vec<usize> = (0..n).collect();
        perm.shuffle(&mut rng_from_seed(self.config.seed));

        let mut decisions = vec![0.0; n];
        for fold in 0..folds {
            let begin = fold * n / folds;
            let end = (fold + 1) * n / folds;
            let held_out = &perm[begin..end];
            let train_idx: Vec<usize> = perm[..begin].iter().chain(&perm[end..]).copied().collect();
            let train_y: Vec<f64> = train_idx.iter().map(|&i| y[i]).collect();

            let pos = train_y.iter().filter(|&&v| v > 0.0).count();
            let neg = train_y.len() - pos;
            match (pos, neg) {
                (0, 0) => held_out.iter().for_each(|&i| decisions[i] = 0.0),
                (_, 0) => held_out.iter().for_each(|&i| decisions[i] = 1.0),
                (0, _) => held_out.iter().for_each(|&i| decisions[i] = -1.0),
                _ => {
                    let model = BinaryModel::train(x, &train_idx, &train_y, kernel, &self.config);
                    for &i in held_out {
                        decisions[i] = model.decision(x.row(i));
                    }
                }
            }
        }
        decisions
    }
}

impl Classifier for SupportVectorClassifier {
    fn fit(&mut self, x: &FeatureMatrix, y: &[u8]) -> Result<()> {
        if x.n_rows() != y.len() {
            return Err(Error::domain(format!(
                "feature matrix has {} rows but {} labels were given",
                x.n_rows(),
                y.len()
            )));
        }
        if let Some(&bad) = y.iter().find(|&&l| l > 1) {
            return Err(Error::domain(format!("labels must be 0 or 1, got {}", bad)));
        }
        let (negatives, positives) = class_counts(y);
        if negatives == 0 || positives == 0 {
            return Err(Error::insufficient(format!(
                "training data needs both classes (positive={}, negative={})",
                positives, negatives
            )));
        }

        let kernel = self.resolve_kernel(x);
        info!(
            "Fitting SVM ({}, C={}) on {} samples with {} features",
            kernel,
            self.config.c,
            x.n_rows(),
            x.n_cols()
        );

        let signed: Vec<f64> = y.iter().map(|&l| if l == 1 { 1.0 } else { -1.0 }).collect();
        let all_rows: Vec<usize> = (0..x.n_rows()).collect();
        let model = BinaryModel::train(x, &all_rows, &signed, kernel, &self.config);

        let decisions = self.calibration_decisions(x, &signed, kernel, &model);
        let positive: Vec<bool> = y.iter().map(|&l| l == 1).collect();
        let sigmoid = PlattSigmoid::fit(&decisions, &positive);
        debug!("Platt sigmoid: A={:.6}, B={:.6}", sigmoid.a, sigmoid.b);

        self.fitted = Some(FittedSvm {
            model,
            sigmoid,
            n_features: x.n_cols(),
        });
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<u8>> {
        Ok(self
            .decision_function(x)?
            .into_iter()
            .map(|f| u8::from(f > 0.0))
            .collect())
    }

    fn predict_proba(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        let fitted = self.fitted_for(x)?;
        Ok(x
            .rows()
            .map(|row| fitted.sigmoid.probability(fitted.model.decision(row)))
            .collect())
    }

    fn name(&self) -> &str {
        match self.kernel {
            KernelKind::Linear => "svm-linear",
            KernelKind::Rbf => "svm-rbf",
        }
    }
}
