//! Parametric families fitted to annual samples, and their comparison.

mod gamma;
mod goodness;

pub use gamma::GammaParams;
pub use goodness::{KSTest, KsResult};

use std::fmt;

use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, ContinuousCDF, Gamma, LogNormal, Normal};

use crate::error::{Error, Result};
use crate::statistics::{Mean, Statistic, StdDev};

/// Supported parametric families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// Gamma with zero location.
    Gamma,
    /// Normal.
    Normal,
    /// Log-normal with zero location.
    LogNormal,
}

impl Family {
    /// All families, in display order.
    pub const ALL: [Family; 3] = [Family::Gamma, Family::Normal, Family::LogNormal];
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Family::Gamma => "Gamma",
            Family::Normal => "Normal",
            Family::LogNormal => "LogNormal",
        };
        f.write_str(name)
    }
}

/// A family together with its maximum-likelihood parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FittedDistribution {
    /// Gamma(shape, scale), location 0.
    Gamma(GammaParams),
    /// Normal(mean, std).
    Normal {
        /// Mean.
        mean: f64,
        /// Standard deviation.
        std: f64,
    },
    /// LogNormal(mu, sigma) of `ln x`, location 0.
    LogNormal {
        /// Mean of `ln x`.
        mu: f64,
        /// Standard deviation of `ln x`.
        sigma: f64,
    },
}

enum Dist {
    Gamma(Gamma),
    Normal(Normal),
    LogNormal(LogNormal),
}

impl Dist {
    fn cdf(&self, x: f64) -> f64 {
        match self {
            Dist::Gamma(d) => d.cdf(x),
            Dist::Normal(d) => d.cdf(x),
            Dist::LogNormal(d) => d.cdf(x),
        }
    }

    fn ln_pdf(&self, x: f64) -> f64 {
        match self {
            Dist::Gamma(d) => d.ln_pdf(x),
            Dist::Normal(d) => d.ln_pdf(x),
            Dist::LogNormal(d) => d.ln_pdf(x),
        }
    }
}

impl FittedDistribution {
    /// Fits `family` to `sample` by maximum likelihood.
    ///
    /// Gamma and LogNormal need strictly positive values; Normal accepts any
    /// finite sample of at least two distinct values.
    pub fn fit(family: Family, sample: &[f64]) -> Result<Self> {
        match family {
            Family::Gamma => GammaParams::fit_mle(sample).map(FittedDistribution::Gamma),
            Family::Normal => {
                check_finite(sample)?;
                let (mean, std) = mle_moments(sample);
                if std <= 0.0 {
                    return Err(Error::invalid("normal fit needs a non-constant sample"));
                }
                Ok(FittedDistribution::Normal { mean, std })
            }
            Family::LogNormal => {
                check_non_negative(sample)?;
                if sample.iter().any(|&x| x <= 0.0) {
                    return Err(Error::invalid(
                        "log-normal fit with zero location needs strictly positive values",
                    ));
                }
                let logs: Vec<f64> = sample.iter().map(|x| x.ln()).collect();
                let (mu, sigma) = mle_moments(&logs);
                if sigma <= 0.0 {
                    return Err(Error::invalid("log-normal fit needs a non-constant sample"));
                }
                Ok(FittedDistribution::LogNormal { mu, sigma })
            }
        }
    }

    /// Family of this fit.
    pub fn family(&self) -> Family {
        match self {
            FittedDistribution::Gamma(_) => Family::Gamma,
            FittedDistribution::Normal { .. } => Family::Normal,
            FittedDistribution::LogNormal { .. } => Family::LogNormal,
        }
    }

    /// Cumulative probability at `x`.
    pub fn cdf(&self, x: f64) -> Result<f64> {
        Ok(self.dist()?.cdf(x))
    }

    /// Density at `x`.
    pub fn pdf(&self, x: f64) -> Result<f64> {
        Ok(self.dist()?.ln_pdf(x).exp())
    }

    /// Log-likelihood of `sample` under this fit.
    pub fn log_likelihood(&self, sample: &[f64]) -> Result<f64> {
        let dist = self.dist()?;
        Ok(sample.iter().map(|&x| dist.ln_pdf(x)).sum())
    }

    fn dist(&self) -> Result<Dist> {
        Ok(match *self {
            FittedDistribution::Gamma(p) => Dist::Gamma(p.to_statrs()?),
            FittedDistribution::Normal { mean, std } => {
                Dist::Normal(Normal::new(mean, std).map_err(|e| Error::Distribution {
                    family: "normal",
                    message: e.to_string(),
                })?)
            }
            FittedDistribution::LogNormal { mu, sigma } => {
                Dist::LogNormal(LogNormal::new(mu, sigma).map_err(|e| Error::Distribution {
                    family: "log-normal",
                    message: e.to_string(),
                })?)
            }
        })
    }
}

/// Goodness of fit of one family to a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitSummary {
    /// Fitted distribution.
    pub fitted: FittedDistribution,
    /// Log-likelihood of the sample.
    pub log_likelihood: f64,
    /// Kolmogorov–Smirnov distance and asymptotic p-value.
    pub ks: KsResult,
}

/// Fits every family in `families` to `sample` and reports how well each one
/// describes it, in the order given.
#[tracing::instrument(skip(sample), fields(n = sample.len()))]
pub fn compare_families(sample: &[f64], families: &[Family]) -> Result<Vec<FitSummary>> {
    families
        .iter()
        .map(|&family| {
            let fitted = FittedDistribution::fit(family, sample)?;
            Ok(FitSummary {
                fitted,
                log_likelihood: fitted.log_likelihood(sample)?,
                ks: KSTest::new(&fitted).compute(&sample)?,
            })
        })
        .collect()
}

fn mle_moments(values: &[f64]) -> (f64, f64) {
    (Mean, StdDev::new(0)).compute(&values)
}

fn check_finite(sample: &[f64]) -> Result<()> {
    if sample.is_empty() {
        return Err(Error::invalid("sample is empty"));
    }
    if let Some(x) = sample.iter().find(|x| !x.is_finite()) {
        return Err(Error::invalid(format!("sample contains non-finite value {x}")));
    }
    Ok(())
}

pub(crate) fn check_non_negative(sample: &[f64]) -> Result<()> {
    check_finite(sample)?;
    if let Some(x) = sample.iter().find(|&&x| x < 0.0) {
        return Err(Error::invalid(format!(
            "sample contains negative value {x}; support is [0, ∞)"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_distr::{Distribution, LogNormal as LogNormalDist};
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn normal_fit_uses_population_std() {
        let fit = FittedDistribution::fit(Family::Normal, &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0])
            .unwrap();
        assert_eq!(fit, FittedDistribution::Normal { mean: 5.0, std: 2.0 });
    }

    #[test]
    fn lognormal_fit_on_logs() {
        let e = std::f64::consts::E;
        let fit = FittedDistribution::fit(Family::LogNormal, &[1.0, e, e * e]).unwrap();
        match fit {
            FittedDistribution::LogNormal { mu, sigma } => {
                assert_relative_eq!(mu, 1.0, epsilon = 1e-12);
                assert_relative_eq!(sigma, (2.0_f64 / 3.0).sqrt(), epsilon = 1e-12);
            }
            other => panic!("unexpected fit {other:?}"),
        }
    }

    #[test]
    fn cdf_and_pdf_are_consistent() {
        let fit = FittedDistribution::Gamma(GammaParams::new(3.0, 2.0).unwrap());
        assert_relative_eq!(fit.cdf(0.0).unwrap(), 0.0);
        let h = 1e-5;
        let numeric = (fit.cdf(4.0 + h).unwrap() - fit.cdf(4.0 - h).unwrap()) / (2.0 * h);
        assert_relative_eq!(fit.pdf(4.0).unwrap(), numeric, epsilon = 1e-6);
    }

    #[test]
    fn lognormal_sample_prefers_lognormal() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        let dist = LogNormalDist::new(5.0, 0.9).unwrap();
        let sample: Vec<f64> = (0..2_000).map(|_| dist.sample(&mut rng)).collect();

        let summaries = compare_families(&sample, &Family::ALL).unwrap();
        assert_eq!(summaries.len(), 3);
        let best = summaries
            .iter()
            .max_by(|a, b| a.log_likelihood.total_cmp(&b.log_likelihood))
            .unwrap();
        assert_eq!(best.fitted.family(), Family::LogNormal);
        for s in &summaries {
            assert!((0.0..=1.0).contains(&s.ks.statistic));
        }
    }

    #[test]
    fn rejects_negative_for_positive_families() {
        assert!(FittedDistribution::fit(Family::Gamma, &[1.0, -1.0]).is_err());
        assert!(FittedDistribution::fit(Family::LogNormal, &[1.0, -1.0]).is_err());
        assert!(FittedDistribution::fit(Family::Normal, &[1.0, -1.0]).is_ok());
    }
}
