use num_traits::Float;

use super::Statistic;
use crate::EmpiricalCDF;
use crate::error::{Error, Result};

/// Empirical quantile with linear interpolation between order statistics.
///
/// With sorted values `x₀ ≤ … ≤ xₙ₋₁` and `h = p (n − 1)`:
/// ```text
/// Q(p) = x⌊h⌋ + (h − ⌊h⌋) (x⌈h⌉ − x⌊h⌋)
/// ```
/// This is the conventional "type 7" definition. `Q(0)` is the minimum and
/// `Q(1)` the maximum. An empty ECDF yields NaN.
#[derive(Debug, Clone, Copy)]
pub struct Quantile {
    p: f64,
}

impl Quantile {
    /// Creates a quantile estimator for probability `p ∈ [0, 1]`.
    pub fn new(p: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&p) {
            return Err(Error::invalid(format!(
                "probability must be in [0, 1], got {p}"
            )));
        }
        Ok(Self { p })
    }

    /// Median (p = 0.5).
    #[inline]
    pub fn median() -> Self {
        Self { p: 0.5 }
    }

    /// Probability of this estimator.
    pub fn p(&self) -> f64 {
        self.p
    }
}

impl<T: Float> Statistic<EmpiricalCDF<T>, T> for Quantile {
    fn compute(&self, ecdf: &EmpiricalCDF<T>) -> T {
        let points = ecdf.points();
        let n = points.len();
        if n == 0 {
            return T::nan();
        }

        let h = self.p * (n - 1) as f64;
        let lo = h.floor() as usize;
        let hi = (h.ceil() as usize).min(n - 1);
        let (Some(&low), Some(&high)) = (points.get(lo), points.get(hi)) else {
            return T::nan();
        };
        if lo == hi {
            return low;
        }

        let frac = T::from(h - lo as f64).unwrap_or_else(T::zero);
        low + frac * (high - low)
    }
}
