//! Gamma-to-Gamma quantile-mapping bias correction.
//!
//! A Gamma distribution (zero location) is fitted by maximum likelihood to a
//! modeled and an observed reference sample. They need not be paired or of
//! equal length; the match is distributional. The transfer function
//!
//! ```text
//! T(z) = G_obs⁻¹( G_mod(z) )
//! ```
//!
//! then maps every modeled value onto the observed climatology. `G_mod` is
//! monotone and [`GammaParams::quantile`] is non-decreasing in its argument, so
//! `T` is monotone non-decreasing down to the far low tail.
//!
//! Far-tail inputs saturate: when `G_mod(z)` evaluates to exactly 0 or 1,
//! `T(z)` is 0 or `+∞` respectively. This is what the distributions return and
//! is passed through as a valid numeric result, not reported as an error.

use statrs::distribution::{ContinuousCDF, Gamma};
use tracing::debug;

use crate::distribution::GammaParams;
use crate::error::Result;
use crate::series::Ensemble;

/// Monotone mapping from a modeled value to its bias-corrected value.
#[derive(Debug, Clone)]
pub struct TransferFunction {
    modeled: GammaParams,
    observed: GammaParams,
    modeled_dist: Gamma,
}

impl TransferFunction {
    /// Builds the transfer function from already-fitted parameters.
    pub fn from_params(modeled: GammaParams, observed: GammaParams) -> Result<Self> {
        observed.to_statrs()?;
        Ok(Self {
            modeled_dist: modeled.to_statrs()?,
            modeled,
            observed,
        })
    }

    /// Gamma fitted to the modeled reference sample.
    pub fn modeled(&self) -> GammaParams {
        self.modeled
    }

    /// Gamma fitted to the observed reference sample.
    pub fn observed(&self) -> GammaParams {
        self.observed
    }

    /// Corrected value for a single modeled value. NaN maps to NaN.
    #[inline]
    pub fn apply(&self, z: f64) -> f64 {
        if z.is_nan() {
            return f64::NAN;
        }
        self.observed.quantile(self.modeled_dist.cdf(z))
    }
}

/// Fits Gamma distributions to both reference samples and builds
/// `T(z) = G_obs⁻¹(G_mod(z))`.
///
/// Both samples must be non-empty with finite, non-negative values; see
/// [`GammaParams::fit_mle`] for the samples whose MLE does not exist.
#[tracing::instrument(skip_all, fields(n_modeled = modeled.len(), n_observed = observed.len()))]
pub fn fit_and_build_transfer(modeled: &[f64], observed: &[f64]) -> Result<TransferFunction> {
    let modeled_fit = GammaParams::fit_mle(modeled)?;
    let observed_fit = GammaParams::fit_mle(observed)?;
    debug!(
        modeled_shape = modeled_fit.shape(),
        modeled_scale = modeled_fit.scale(),
        observed_shape = observed_fit.shape(),
        observed_scale = observed_fit.scale(),
        "built transfer function"
    );
    TransferFunction::from_params(modeled_fit, observed_fit)
}

/// Applies `transfer` to every value of every run. Run ids and the year axis
/// are preserved.
pub fn apply_transfer(transfer: &TransferFunction, ensemble: &Ensemble) -> Ensemble {
    ensemble.map_values(|z| transfer.apply(z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use itertools::Itertools;

    fn transfer() -> TransferFunction {
        let modeled = [420.0, 310.5, 505.2, 280.0, 390.9, 450.1, 350.0, 299.9];
        let observed = [300.0, 210.0, 365.5, 150.2, 280.7, 330.0, 250.0];
        fit_and_build_transfer(&modeled, &observed).unwrap()
    }

    #[test]
    fn identical_samples_give_identity() {
        let sample = [12.0, 30.5, 8.2, 19.9, 25.0, 14.4];
        let t = fit_and_build_transfer(&sample, &sample).unwrap();
        for &z in &[5.0, 10.0, 20.0, 40.0] {
            assert_relative_eq!(t.apply(z), z, max_relative = 1e-8);
        }
    }

    #[test]
    fn monotone_non_decreasing() {
        let t = transfer();
        let zs: Vec<f64> = (0..=400).map(|i| f64::from(i) * 2.5).collect();
        for (a, b) in zs.iter().tuple_windows() {
            assert!(t.apply(*a) <= t.apply(*b), "T({a}) > T({b})");
        }
    }

    #[test]
    fn monotone_on_a_fine_grid() {
        let t = transfer();
        let fine = (0..=40_000).map(|i| f64::from(i) * 0.0005);
        let coarse = (401..=20_000).map(|i| f64::from(i) * 0.05);
        let mapped = fine.chain(coarse).map(|z| (z, t.apply(z)));
        for ((a, ta), (b, tb)) in mapped.tuple_windows() {
            assert!(ta <= tb, "T({a}) = {ta} > T({b}) = {tb}");
        }
    }

    #[test]
    fn low_tail_matches_probabilities() {
        let t = transfer();
        let m = t.modeled().to_statrs().unwrap();
        let o = t.observed().to_statrs().unwrap();
        for &z in &[0.01, 0.1, 1.0, 5.0, 50.0] {
            let p = m.cdf(z);
            assert!(p > 0.0);
            assert_relative_eq!(o.cdf(t.apply(z)), p, max_relative = 1e-8);
        }
    }

    #[test]
    fn modeled_quantiles_land_on_observed_quantiles() {
        let t = transfer();
        let m = t.modeled();
        let o = t.observed();
        for &p in &[0.05, 0.25, 0.5, 0.75, 0.95] {
            assert_relative_eq!(t.apply(m.quantile(p)), o.quantile(p), max_relative = 1e-6);
        }
    }

    #[test]
    fn tails_saturate_without_error() {
        let t = transfer();
        assert_eq!(t.apply(0.0), 0.0);
        assert_eq!(t.apply(-5.0), 0.0);
        assert!(t.apply(1e9).is_infinite());
        assert!(t.apply(f64::NAN).is_nan());
    }

    #[test]
    fn rejects_invalid_reference_samples() {
        assert!(fit_and_build_transfer(&[], &[1.0, 2.0]).is_err());
        assert!(fit_and_build_transfer(&[1.0, 2.0], &[1.0, -2.0]).is_err());
    }

    #[test]
    fn apply_preserves_ensemble_shape() {
        let t = transfer();
        let e = Ensemble::from_columns(
            &[2000, 2001, 2002],
            vec![vec![300.0, 400.0, 500.0], vec![350.0, 450.0, 550.0]],
        )
        .unwrap();
        let corrected = apply_transfer(&t, &e);
        assert_eq!(corrected.n_runs(), 2);
        assert_eq!(corrected.years(), e.years());
        assert_relative_eq!(corrected.run(1).unwrap().values()[0], t.apply(350.0));
    }
}
