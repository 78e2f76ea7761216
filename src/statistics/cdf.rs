use std::cmp::Ordering;

use num_traits::Float;
use serde::{Deserialize, Serialize};

use super::Statistic;

/// Empirical Cumulative Distribution Function (ECDF).
///
/// Represents the step function: Fₙ(x) = (1/n) * Σᵢ I(Xᵢ ≤ x)
///
/// NaN values are **silently filtered** during construction; the remaining
/// values are sorted with IEEE 754 semantics.
#[derive(Debug, Clone)]
pub struct EmpiricalCDF<T> {
    sorted: Vec<T>,
}

/// How ties with the score are counted by [`EmpiricalCDF::percentile_of_score`].
///
/// With `left = #{x < v}` and `right = #{x ≤ v}`:
/// - `Rank`: `(left + right + [right > left]) · 50 / n`, the average rank of
///   the score among its ties. A single tie counts as "at or below".
/// - `Weak`: `right / n · 100`, the ECDF at `v`.
/// - `Strict`: `left / n · 100`.
/// - `Mean`: average of `Weak` and `Strict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PercentileKind {
    /// Average rank of the score among ties.
    #[default]
    Rank,
    /// Fraction at or below the score.
    Weak,
    /// Fraction strictly below the score.
    Strict,
    /// Mean of weak and strict.
    Mean,
}

impl<T> EmpiricalCDF<T> {
    /// Number of (non-NaN) observations.
    #[inline]
    pub fn n(&self) -> usize {
        self.sorted.len()
    }

    /// Sorted observations.
    #[inline]
    pub fn points(&self) -> &[T] {
        &self.sorted
    }

    /// `true` if no observation survived NaN filtering.
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }
}

impl<T> EmpiricalCDF<T>
where
    T: Float,
{
    /// Creates an ECDF from a float slice, dropping NaNs.
    pub fn from_float_slice(data: &[T]) -> Self {
        let mut sorted: Vec<T> = data.iter().copied().filter(|x| !x.is_nan()).collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        Self { sorted }
    }

    /// Evaluates Fₙ(x).
    ///
    /// # Returns
    /// - `f64::NAN` if `x` is NaN or the ECDF is empty
    /// - `0.0` for `-∞`, `1.0` for `+∞`
    /// - otherwise the proportion of values ≤ `x`
    #[inline]
    pub fn eval(&self, x: T) -> f64 {
        if x.is_nan() || self.sorted.is_empty() {
            return f64::NAN;
        }
        if x.is_infinite() {
            return if x.is_sign_positive() { 1.0 } else { 0.0 };
        }
        self.count_leq(x) as f64 / self.n() as f64
    }

    /// Percentile (0–100) of `score` relative to the observations.
    ///
    /// Returns NaN for an empty ECDF or a NaN score.
    pub fn percentile_of_score(&self, score: T, kind: PercentileKind) -> f64 {
        let n = self.n();
        if n == 0 || score.is_nan() {
            return f64::NAN;
        }
        let left = self.count_lt(score) as f64;
        let right = self.count_leq(score) as f64;
        let n = n as f64;

        match kind {
            PercentileKind::Rank => {
                let plus1 = if right > left { 1.0 } else { 0.0 };
                (left + right + plus1) * (50.0 / n)
            }
            PercentileKind::Weak => right / n * 100.0,
            PercentileKind::Strict => left / n * 100.0,
            PercentileKind::Mean => (left + right) * (50.0 / n),
        }
    }

    #[inline]
    fn count_leq(&self, x: T) -> usize {
        self.sorted.partition_point(|&v| v <= x)
    }

    #[inline]
    fn count_lt(&self, x: T) -> usize {
        self.sorted.partition_point(|&v| v < x)
    }
}

/// ECDF statistic constructor.
#[derive(Debug, Clone, Copy, Default)]
pub struct CDF;

impl<D, T> Statistic<D, EmpiricalCDF<T>> for CDF
where
    D: AsRef<[T]>,
    T: Float,
{
    #[inline]
    fn compute(&self, data: &D) -> EmpiricalCDF<T> {
        EmpiricalCDF::from_float_slice(data.as_ref())
    }
}
