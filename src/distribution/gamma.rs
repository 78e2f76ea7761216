//! Gamma distribution parameters and maximum-likelihood fitting with the
//! location fixed at zero.

use serde::{Deserialize, Serialize};
use statrs::distribution::Gamma;
use statrs::function::gamma::{checked_gamma_lr, digamma};
use tracing::debug;

use super::check_non_negative;
use crate::error::{Error, Result};
use crate::statistics::{Mean, Statistic};

const MAX_NEWTON_ITER: usize = 100;
const NEWTON_TOL: f64 = 1e-12;
// ln(x / scale) bracket for the inverse CDF, past where f64 under/overflows
const LOG_BRACKET: (f64, f64) = (-745.0, 710.0);
const BISECTION_STEPS: usize = 64;

/// Validated parameters for a Gamma distribution (shape/scale convention,
/// location 0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GammaParams {
    shape: f64,
    scale: f64,
}

impl GammaParams {
    /// Creates parameters, returning `None` unless both are finite and positive.
    pub fn new(shape: f64, scale: f64) -> Option<Self> {
        if shape.is_finite() && shape > 0.0 && scale.is_finite() && scale > 0.0 {
            Some(Self { shape, scale })
        } else {
            None
        }
    }

    /// Maximum-likelihood fit with location fixed at zero.
    ///
    /// Solves `ln k − ψ(k) = ln(x̄) − mean(ln x)` for the shape `k` by Newton
    /// iteration, then sets `scale = x̄ / k`.
    ///
    /// The likelihood needs `ln x` for every value, so a zero anywhere in the
    /// sample has no finite MLE, nor does a constant sample. Both fail with
    /// [`Error::InvalidInput`], as do empty, negative or non-finite input.
    pub fn fit_mle(sample: &[f64]) -> Result<Self> {
        check_non_negative(sample)?;
        if sample.iter().any(|&x| x <= 0.0) {
            return Err(Error::invalid(
                "gamma MLE with zero location needs strictly positive values",
            ));
        }

        let mean: f64 = Mean.compute(&sample);
        let logs: Vec<f64> = sample.iter().map(|x| x.ln()).collect();
        let mean_log: f64 = Mean.compute(&logs);
        let s = mean.ln() - mean_log;
        if !(s.is_finite() && s > 0.0) {
            return Err(Error::invalid(
                "gamma MLE is undefined for a constant sample",
            ));
        }

        // Choi & Wette starting point, within a few percent of the root
        let mut k = (3.0 - s + ((s - 3.0).powi(2) + 24.0 * s).sqrt()) / (12.0 * s);
        for _ in 0..MAX_NEWTON_ITER {
            let f = k.ln() - digamma(k) - s;
            let df = 1.0 / k - trigamma(k);
            let mut next = k - f / df;
            if next <= 0.0 {
                next = k / 2.0;
            }
            let converged = (next - k).abs() <= NEWTON_TOL * k;
            k = next;
            if converged {
                break;
            }
        }

        let params = Self::new(k, mean / k).ok_or_else(|| {
            Error::invalid(format!("gamma MLE produced invalid shape {k}"))
        })?;
        debug!(shape = params.shape, scale = params.scale, n = sample.len(), "fitted gamma");
        Ok(params)
    }

    /// Shape parameter (k).
    pub fn shape(&self) -> f64 {
        self.shape
    }

    /// Scale parameter (θ).
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Distribution mean (k θ).
    pub fn mean(&self) -> f64 {
        self.shape * self.scale
    }

    /// Distribution variance (k θ²).
    pub fn var(&self) -> f64 {
        self.shape * self.scale * self.scale
    }

    /// Inverse CDF.
    ///
    /// Bisects `ln(x / scale)` over a fixed bracket for a fixed number of
    /// steps, testing the regularized lower incomplete gamma at each midpoint.
    /// Every `p` follows the same sequence of midpoints until it branches off,
    /// so the result is non-decreasing in `p`, and the low tail resolves to
    /// full precision.
    ///
    /// `p <= 0` gives 0, `p >= 1` gives `+∞` and NaN gives NaN.
    pub fn quantile(&self, p: f64) -> f64 {
        if p.is_nan() {
            return f64::NAN;
        }
        if p <= 0.0 {
            return 0.0;
        }
        if p >= 1.0 {
            return f64::INFINITY;
        }

        let (mut lo, mut hi) = LOG_BRACKET;
        for _ in 0..BISECTION_STEPS {
            let mid = 0.5 * (lo + hi);
            // Err only once exp(mid) overflows, which is above any p < 1
            let below = checked_gamma_lr(self.shape, mid.exp()).is_ok_and(|lr| lr < p);
            if below {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        hi.exp() * self.scale
    }

    /// `statrs` distribution. Note that `statrs` parameterises Gamma by
    /// `(shape, rate)` with `rate = 1 / scale`.
    pub fn to_statrs(&self) -> Result<Gamma> {
        Gamma::new(self.shape, 1.0 / self.scale).map_err(|e| Error::Distribution {
            family: "gamma",
            message: e.to_string(),
        })
    }
}

/// ψ′(x) for x > 0: recurrence up to x ≥ 6, then the asymptotic series.
fn trigamma(mut x: f64) -> f64 {
    let mut acc = 0.0;
    while x < 6.0 {
        acc += 1.0 / (x * x);
        x += 1.0;
    }
    let inv = 1.0 / x;
    let inv2 = inv * inv;
    acc + inv
        + inv2 / 2.0
        + inv * inv2 * (1.0 / 6.0 - inv2 * (1.0 / 30.0 - inv2 * (1.0 / 42.0 - inv2 / 30.0)))
}
