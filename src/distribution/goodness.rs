use super::FittedDistribution;
use crate::error::{Error, Result};
use crate::statistics::{CDF, Statistic};

/// Outcome of a Kolmogorov–Smirnov test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsResult {
    /// Supremum distance `D` between the ECDF and the fitted CDF, in `[0, 1]`.
    pub statistic: f64,
    /// Asymptotic two-sided p-value.
    pub p_value: f64,
}

/// Kolmogorov–Smirnov goodness-of-fit test against a fitted distribution.
///
/// ```text
/// D = supₓ |Fₙ(x) − F(x)|
/// ```
///
/// The parameters were estimated from the same sample, so the p-value is
/// optimistic (the Lilliefors caveat); use `D` for ranking families and treat
/// the p-value as indicative only.
#[derive(Debug, Clone, Copy)]
pub struct KSTest<'a> {
    reference: &'a FittedDistribution,
}

impl<'a> KSTest<'a> {
    /// Test against `reference`.
    pub fn new(reference: &'a FittedDistribution) -> Self {
        Self { reference }
    }
}

impl<D> Statistic<D, Result<KsResult>> for KSTest<'_>
where
    D: AsRef<[f64]>,
{
    fn compute(&self, data: &D) -> Result<KsResult> {
        let ecdf = CDF.compute(data);
        let n = ecdf.n();
        if n == 0 {
            return Err(Error::invalid("Kolmogorov-Smirnov test needs a non-empty sample"));
        }
        let n_f = n as f64;

        let mut d_plus_max: f64 = 0.0;
        let mut d_minus_max: f64 = 0.0;
        for (i, &x) in ecdf.points().iter().enumerate() {
            let f_x = self.reference.cdf(x)?;
            // D⁺ = max_i [(i+1)/n − F(x_i)], D⁻ = max_i [F(x_i) − i/n]
            d_plus_max = d_plus_max.max((i + 1) as f64 / n_f - f_x);
            d_minus_max = d_minus_max.max(f_x - i as f64 / n_f);
        }
        let d = d_plus_max.max(d_minus_max).clamp(0.0, 1.0);

        Ok(KsResult {
            statistic: d,
            p_value: asymptotic_p_value(d, n_f),
        })
    }
}

/// `p = 2 Σ_{k≥1} (−1)^(k−1) exp(−2 k² D² n)`, clamped to `[0, 1]`.
fn asymptotic_p_value(d: f64, n: f64) -> f64 {
    if d <= 0.0 {
        return 1.0;
    }
    if d >= 1.0 {
        return 0.0;
    }

    let mut p = 0.0;
    let mut prev_term = f64::INFINITY;
    for k in 1..=100_i32 {
        let exponent = -2.0 * f64::from(k * k) * d * d * n;
        if exponent < -700.0 {
            break;
        }
        let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
        let term = sign * exponent.exp();
        p += term;
        if term.abs() < 1e-15 || term.abs() < prev_term * 1e-12 {
            break;
        }
        prev_term = term.abs();
    }

    (2.0 * p).clamp(0.0, 1.0)
}
