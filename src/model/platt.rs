//! Platt scaling: mapping SVM decision values to probabilities.

use tracing::warn;

const MAX_ITER: usize = 100;
const MIN_STEP: f64 = 1e-10;
const SIGMA: f64 = 1e-12;
const EPS: f64 = 1e-5;

/// Sigmoid `P(positive | f) = 1 / (1 + exp(a * f + b))`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlattSigmoid {
    pub a: f64,
    pub b: f64,
}

impl PlattSigmoid {
    /// Fit the sigmoid to decision values by regularized maximum likelihood.
    ///
    /// Targets are prior-corrected (`(N+ + 1) / (N+ + 2)` for positives,
    /// `1 / (N- + 2)` for negatives) and the optimizer is Newton's method
    /// with a backtracking line search.
    pub fn fit(decision_values: &[f64], positive: &[bool]) -> Self {
        debug_assert_eq!(decision_values.len(), positive.len());

        let prior1 = positive.iter().filter(|&&p| p).count() as f64;
        let prior0 = positive.len() as f64 - prior1;

        let hi_target = (prior1 + 1.0) / (prior1 + 2.0);
        let lo_target = 1.0 / (prior0 + 2.0);
        let targets: Vec<f64> = positive
            .iter()
            .map(|&p| if p { hi_target } else { lo_target })
            .collect();

        let objective = |a: f64, b: f64| -> f64 {
            decision_values
                .iter()
                .zip(&targets)
                .map(|(&f, &t)| {
                    let fapb = f * a + b;
                    if fapb >= 0.0 {
                        t * fapb + (1.0 + (-fapb).exp()).ln()
                    } else {
                        (t - 1.0) * fapb + (1.0 + fapb.exp()).ln()
                    }
                })
                .sum()
        };

        let mut a = 0.0;
        let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
        let mut fval = objective(a, b);

        let mut iter = 0;
        while iter < MAX_ITER {
            let (mut h11, mut h22, mut h21) = (SIGMA, SIGMA, 0.0);
            let (mut g1, mut g2) = (0.0, 0.0);

            for (&f, &t) in decision_values.iter().zip(&targets) {
                let fapb = f * a + b;
                let (p, q) = if fapb >= 0.0 {
                    let e = (-fapb).exp();
                    (e / (1.0 + e), 1.0 / (1.0 + e))
                } else {
                    let e = fapb.exp();
                    (1.0 / (1.0 + e), e / (1.0 + e))
                };
                let d2 = p * q;
                h11 += f * f * d2;
                h22 += d2;
                h21 += f * d2;
                let d1 = t - p;
                g1 += f * d1;
                g2 += d1;
            }

            if g1.abs() < EPS && g2.abs() < EPS {
                break;
            }

            let det = h11 * h22 - h21 * h21;
            let da = -(h22 * g1 - h21 * g2) / det;
            let db = -(-h21 * g1 + h11 * g2) / det;
            let gd = g1 * da + g2 * db;

            let mut step = 1.0;
            while step >= MIN_STEP {
                let new_a = a + step * da;
                let new_b = b + step * db;
                let new_f = objective(new_a, new_b);
                if new_f < fval + 0.0001 * step * gd {
                    a = new_a;
                    b = new_b;
                    fval = new_f;
                    break;
                }
                step /= 2.0;
            }

            if step < MIN_STEP {
                warn!("Platt scaling line search failed");
                break;
            }
            iter += 1;
        }

        if iter >= MAX_ITER {
            warn!("Platt scaling reached the maximum of {} iterations", MAX_ITER);
        }

        Self { a, b }
    }

    /// Probability of the positive class for a decision value
    pub fn probability(&self, decision_value: f64) -> f64 {
        let fapb = decision_value * self.a + self.b;
        if fapb >= 0.0 {
            let e = (-fapb).exp();
            e / (1.0 + e)
        } else {
            1.0 / (1.0 + fapb.exp())
        }
    }
}
