use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{estimate_exceedance_probability, extract_quantile_scheduled};
use crate::config::{DroughtConfig, frequency_to_probability};
use crate::correction::{TransferFunction, apply_transfer, fit_and_build_transfer};
use crate::error::{Error, Result};
use crate::series::{Ensemble, Period, RunMap, YearSeries};
use crate::statistics::{CDF, Mean, Quantile, Statistic, deficit_percent};

/// Mean, median and percentile band of a quantity across runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spread {
    /// Ensemble mean.
    pub mean: f64,
    /// Ensemble median.
    pub median: f64,
    /// Lower band percentile.
    pub lower: f64,
    /// Upper band percentile.
    pub upper: f64,
}

impl Spread {
    /// Summarises per-run values; `band` holds percentiles in `[0, 100]`.
    pub fn of(values: &RunMap<f64>, band: (f64, f64)) -> Result<Self> {
        let values: Vec<f64> = values.values().copied().collect();
        let ecdf = CDF.compute(&values);
        let at = |pct: f64| Quantile::new(pct / 100.0).map(|q| q.compute(&ecdf));
        Ok(Self {
            mean: Mean.compute(&values),
            median: Quantile::median().compute(&ecdf),
            lower: at(band.0)?,
            upper: at(band.1)?,
        })
    }
}

/// One point of an intensity-frequency curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Frequency in percent.
    pub frequency: f64,
    /// Deficit (percent of the observed baseline mean) reached at this
    /// frequency, across runs.
    pub deficit: Spread,
}

/// Results for one comparison period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    /// Period label.
    pub name: String,
    /// Years covered.
    pub period: Period,
    /// Intensity-frequency curve.
    pub curve: Vec<CurvePoint>,
    /// Per-run frequency (percent) of years at or below the HD threshold.
    pub hd_frequency: RunMap<f64>,
    /// Per-run deficit (percent) at the HD frequency.
    pub hd_intensity: RunMap<f64>,
}

/// Corrected-ensemble drought statistics for a set of comparison periods.
#[derive(Debug, Clone)]
pub struct DroughtReport {
    transfer: TransferFunction,
    corrected: Ensemble,
    observed_mean: f64,
    hd_threshold: f64,
    periods: Vec<PeriodSummary>,
    band: (f64, f64),
}

impl DroughtReport {
    /// Corrects `modeled` against `observed` and derives drought statistics.
    ///
    /// Steps:
    /// 1. Fit Gammas to the pooled modeled values and to the observations over
    ///    the reference period, and map every modeled value through the
    ///    resulting transfer function.
    /// 2. Take the observed mean over the baseline period; deficits are
    ///    percentages below it.
    /// 3. The HD threshold is the ensemble mean of each run's quantile at the
    ///    HD frequency over the threshold period.
    /// 4. For every comparison period, build the intensity-frequency curve,
    ///    the bootstrap HD frequency and the HD intensity of every run.
    ///
    /// `rng` only feeds the bootstrap; periods consume it in order.
    #[tracing::instrument(skip_all, fields(runs = modeled.n_runs(), periods = config.periods().len()))]
    pub fn compute<R>(
        config: &DroughtConfig,
        modeled: &Ensemble,
        observed: &YearSeries,
        rng: &mut R,
    ) -> Result<Self>
    where
        R: Rng + ?Sized,
    {
        config.validate()?;
        let schedule = config.bootstrap().schedule();

        let observed_reference = non_empty(observed.window(config.reference()), config.reference())?;
        let transfer = fit_and_build_transfer(&modeled.flatten(config.reference()), &observed_reference)?;
        let corrected = apply_transfer(&transfer, modeled);

        let observed_baseline = non_empty(observed.window(config.baseline()), config.baseline())?;
        let observed_mean: f64 = Mean.compute(&observed_baseline);

        let hd_probability = frequency_to_probability(config.hd_frequency());
        let threshold_quantiles =
            extract_quantile_scheduled(&corrected, hd_probability, config.threshold_period(), schedule)?;
        let hd_threshold = Spread::of(&threshold_quantiles, config.band())?.mean;
        debug!(observed_mean, hd_threshold, "baseline established");

        let mut periods = Vec::with_capacity(config.periods().len());
        for named in config.periods() {
            let period = named.period;
            let deficits = |probability: f64| -> Result<RunMap<f64>> {
                let quantiles = extract_quantile_scheduled(&corrected, probability, period, schedule)?;
                Ok(quantiles
                    .into_iter()
                    .map(|(run, v)| (run, deficit_percent(v, observed_mean)))
                    .collect())
            };

            let curve = config
                .frequencies()
                .iter()
                .map(|&frequency| {
                    let per_run = deficits(frequency_to_probability(frequency))?;
                    Ok(CurvePoint {
                        frequency,
                        deficit: Spread::of(&per_run, config.band())?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let hd_frequency = estimate_exceedance_probability(
                &corrected,
                hd_threshold,
                period,
                config.bootstrap(),
                &mut *rng,
            )?
            .into_iter()
            .map(|(run, p)| (run, 100.0 * p))
            .collect();
            let hd_intensity = deficits(hd_probability)?;

            debug!(period = %named.name, "period summarised");
            periods.push(PeriodSummary {
                name: named.name.clone(),
                period,
                curve,
                hd_frequency,
                hd_intensity,
            });
        }

        Ok(Self {
            transfer,
            corrected,
            observed_mean,
            hd_threshold,
            periods,
            band: config.band(),
        })
    }

    /// Fitted transfer function.
    pub fn transfer(&self) -> &TransferFunction {
        &self.transfer
    }

    /// Bias-corrected ensemble.
    pub fn corrected(&self) -> &Ensemble {
        &self.corrected
    }

    /// Observed baseline mean that deficits are relative to.
    pub fn observed_mean(&self) -> f64 {
        self.observed_mean
    }

    /// Precipitation at or below which a year is a hyper-drought.
    pub fn hd_threshold(&self) -> f64 {
        self.hd_threshold
    }

    /// Per-period results, in configuration order.
    pub fn periods(&self) -> &[PeriodSummary] {
        &self.periods
    }

    /// Summary for the period labelled `name`.
    pub fn period(&self, name: &str) -> Option<&PeriodSummary> {
        self.periods.iter().find(|p| p.name == name)
    }

    /// Percentile band used for across-run spreads.
    pub fn band(&self) -> (f64, f64) {
        self.band
    }
}

fn non_empty(values: Vec<f64>, period: Period) -> Result<Vec<f64>> {
    if values.is_empty() {
        return Err(Error::InsufficientData { run: None, period });
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BootstrapConfig, NamedPeriod};
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn runs(n_runs: usize) -> Ensemble {
        let years: Vec<i32> = (1921..=2070).collect();
        let columns: Vec<Vec<f64>> = (0..n_runs)
            .map(|r| {
                years
                    .iter()
                    .map(|&y| {
                        let phase = f64::from(y) * 0.7 + r as f64;
                        let trend = if y > 2020 { 0.8 } else { 1.0 };
                        trend * (400.0 + 150.0 * phase.sin() + 60.0 * (phase * 2.3).cos())
                    })
                    .collect()
            })
            .collect();
        Ensemble::from_columns(&years, columns).unwrap()
    }

    fn observed() -> YearSeries {
        let values: Vec<f64> = (1921..=2020)
            .map(|y| 350.0 + 120.0 * (f64::from(y) * 1.3).sin())
            .collect();
        YearSeries::consecutive(1921, values).unwrap()
    }

    fn config() -> DroughtConfig {
        DroughtConfig::new().with_bootstrap(BootstrapConfig::new().with_rounds(20))
    }

    #[test]
    fn spread_of_runs() {
        let values: RunMap<f64> = (0..5).map(|i| (i, i as f64)).collect();
        let s = Spread::of(&values, (25.0, 75.0)).unwrap();
        assert_abs_diff_eq!(s.mean, 2.0);
        assert_abs_diff_eq!(s.median, 2.0);
        assert_abs_diff_eq!(s.lower, 1.0);
        assert_abs_diff_eq!(s.upper, 3.0);
    }

    #[test]
    fn report_covers_every_period_and_run() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let report = DroughtReport::compute(&config(), &runs(3), &observed(), &mut rng).unwrap();

        assert_eq!(report.periods().len(), 3);
        for summary in report.periods() {
            assert_eq!(summary.curve.len(), 24);
            assert_eq!(summary.hd_frequency.len(), 3);
            assert_eq!(summary.hd_intensity.len(), 3);
            assert!(summary.hd_frequency.values().all(|f| (0.0..=100.0).contains(f)));
        }
        assert!(report.hd_threshold() > 0.0);
        assert!(report.hd_threshold() < report.observed_mean());
    }

    #[test]
    fn deficits_shrink_with_frequency() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(2);
        let report = DroughtReport::compute(&config(), &runs(2), &observed(), &mut rng).unwrap();
        let present = report.period("Present").unwrap();
        for pair in present.curve.windows(2) {
            assert!(pair[0].deficit.mean >= pair[1].deficit.mean);
        }
    }

    #[test]
    fn drier_future_has_more_hyper_droughts() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let report = DroughtReport::compute(&config(), &runs(4), &observed(), &mut rng).unwrap();
        let present = Spread::of(&report.period("Present").unwrap().hd_frequency, (25.0, 75.0)).unwrap();
        let future = Spread::of(&report.period("Future").unwrap().hd_frequency, (25.0, 75.0)).unwrap();
        assert!(future.mean > present.mean);
    }

    #[test]
    fn observed_outside_reference_is_insufficient() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(4);
        let config = config().with_reference(Period::new(1800, 1850).unwrap());
        let err = DroughtReport::compute(&config, &runs(2), &observed(), &mut rng).unwrap_err();
        assert!(matches!(err, Error::InsufficientData { run: None, .. }));
    }

    #[test]
    fn period_outside_the_runs_names_a_run() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        let config = config().with_periods(vec![NamedPeriod::new(
            "Far",
            Period::new(2200, 2250).unwrap(),
        )]);
        let err = DroughtReport::compute(&config, &runs(2), &observed(), &mut rng).unwrap_err();
        assert!(matches!(err, Error::InsufficientData { run: Some(0), .. }));
    }
}
