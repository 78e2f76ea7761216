//! Configuration for the bootstrap estimator, LOWESS smoothing and the
//! drought-frequency report.
//!
//! All configs are plain builders. They derive `serde` traits so an analysis
//! can be persisted next to its results.

use serde::{Deserialize, Serialize};

use crate::analysis::Schedule;
use crate::error::{Error, Result};
use crate::series::Period;
use crate::statistics::PercentileKind;

/// Settings for [`estimate_exceedance_probability`](crate::estimate_exceedance_probability).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    rounds: usize,
    resample_size: usize,
    kind: PercentileKind,
    schedule: Schedule,
}

impl BootstrapConfig {
    /// Defaults: `rounds = 100`, `resample_size = 100`, `kind = Rank`,
    /// sequential schedule.
    pub fn new() -> Self {
        Self {
            rounds: 100,
            resample_size: 100,
            kind: PercentileKind::Rank,
            schedule: Schedule::Sequential,
        }
    }

    /// Sets the number of bootstrap rounds.
    #[must_use]
    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }

    /// Sets the number of draws per round.
    #[must_use]
    pub fn with_resample_size(mut self, size: usize) -> Self {
        self.resample_size = size;
        self
    }

    /// Sets how ties with the threshold are counted.
    #[must_use]
    pub fn with_kind(mut self, kind: PercentileKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets how runs are scheduled.
    #[must_use]
    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Number of bootstrap rounds.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Draws per round.
    pub fn resample_size(&self) -> usize {
        self.resample_size
    }

    /// Tie handling.
    pub fn kind(&self) -> PercentileKind {
        self.kind
    }

    /// Run scheduling.
    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Rejects zero rounds or an empty resample.
    pub fn validate(&self) -> Result<()> {
        if self.rounds == 0 {
            return Err(Error::invalid("bootstrap rounds must be at least 1"));
        }
        if self.resample_size == 0 {
            return Err(Error::invalid("bootstrap resample size must be at least 1"));
        }
        Ok(())
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings for [`lowess`](crate::lowess).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LowessConfig {
    frac: f64,
    iterations: usize,
}

impl LowessConfig {
    /// Neighbourhood fraction `frac` with three robustness iterations.
    pub fn new(frac: f64) -> Self {
        Self {
            frac,
            iterations: 3,
        }
    }

    /// Neighbourhood of `window` points out of `n`, i.e. `frac = window / n`.
    pub fn with_window(window: usize, n: usize) -> Self {
        Self::new(window as f64 / n.max(1) as f64)
    }

    /// Sets the number of robustness iterations (0 disables reweighting).
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Neighbourhood fraction.
    pub fn frac(&self) -> f64 {
        self.frac
    }

    /// Robustness iterations.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// `frac` must lie in `(0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if !(self.frac > 0.0 && self.frac <= 1.0) {
            return Err(Error::invalid(format!(
                "lowess frac must be in (0, 1], got {}",
                self.frac
            )));
        }
        Ok(())
    }
}

/// A labelled comparison period, e.g. "Present" for 1971-2020.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedPeriod {
    /// Label used in reports.
    pub name: String,
    /// Years covered.
    pub period: Period,
}

impl NamedPeriod {
    /// Creates a labelled period.
    pub fn new(name: impl Into<String>, period: Period) -> Self {
        Self {
            name: name.into(),
            period,
        }
    }
}

/// Settings for [`DroughtReport::compute`](crate::DroughtReport::compute).
///
/// Frequencies are percentages. A frequency `f` is turned into the quantile
/// probability `(f − 1) / 99`, the plotting position of rank `f` among 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroughtConfig {
    reference: Period,
    baseline: Period,
    threshold_period: Period,
    periods: Vec<NamedPeriod>,
    frequencies: Vec<f64>,
    hd_frequency: f64,
    band: (f64, f64),
    bootstrap: BootstrapConfig,
}

impl DroughtConfig {
    /// Defaults for central Chile:
    /// - Gamma fitting over 1921-2020
    /// - observed baseline mean over 1971-2020
    /// - HD threshold taken from 1971-2020
    /// - Past 1921-1970, Present 1971-2020, Future 2021-2070
    /// - frequencies 1..=24 %
    /// - HD frequency 5 %
    /// - 25th-75th percentile band across runs
    pub fn new() -> Self {
        let period = Period::fixed;
        Self {
            reference: period(1921, 2020),
            baseline: period(1971, 2020),
            threshold_period: period(1971, 2020),
            periods: vec![
                NamedPeriod::new("Past", period(1921, 1970)),
                NamedPeriod::new("Present", period(1971, 2020)),
                NamedPeriod::new("Future", period(2021, 2070)),
            ],
            frequencies: (1..=24).map(f64::from).collect(),
            hd_frequency: 5.0,
            band: (25.0, 75.0),
            bootstrap: BootstrapConfig::new(),
        }
    }

    /// Period over which modeled and observed Gammas are fitted.
    #[must_use]
    pub fn with_reference(mut self, reference: Period) -> Self {
        self.reference = reference;
        self
    }

    /// Period of the observed mean that deficits are expressed against.
    #[must_use]
    pub fn with_baseline(mut self, baseline: Period) -> Self {
        self.baseline = baseline;
        self
    }

    /// Period whose HD quantile defines the threshold.
    #[must_use]
    pub fn with_threshold_period(mut self, period: Period) -> Self {
        self.threshold_period = period;
        self
    }

    /// Comparison periods.
    #[must_use]
    pub fn with_periods(mut self, periods: Vec<NamedPeriod>) -> Self {
        self.periods = periods;
        self
    }

    /// Frequencies (percent) of the intensity-frequency curve.
    #[must_use]
    pub fn with_frequencies(mut self, frequencies: Vec<f64>) -> Self {
        self.frequencies = frequencies;
        self
    }

    /// Frequency (percent) that defines a hyper-drought.
    #[must_use]
    pub fn with_hd_frequency(mut self, frequency: f64) -> Self {
        self.hd_frequency = frequency;
        self
    }

    /// Lower and upper percentiles of the across-run band.
    #[must_use]
    pub fn with_band(mut self, lower: f64, upper: f64) -> Self {
        self.band = (lower, upper);
        self
    }

    /// Bootstrap settings for the HD frequency.
    #[must_use]
    pub fn with_bootstrap(mut self, bootstrap: BootstrapConfig) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Fitting period.
    pub fn reference(&self) -> Period {
        self.reference
    }

    /// Baseline period.
    pub fn baseline(&self) -> Period {
        self.baseline
    }

    /// Threshold period.
    pub fn threshold_period(&self) -> Period {
        self.threshold_period
    }

    /// Comparison periods.
    pub fn periods(&self) -> &[NamedPeriod] {
        &self.periods
    }

    /// Curve frequencies in percent.
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// HD frequency in percent.
    pub fn hd_frequency(&self) -> f64 {
        self.hd_frequency
    }

    /// Band percentiles.
    pub fn band(&self) -> (f64, f64) {
        self.band
    }

    /// Bootstrap settings.
    pub fn bootstrap(&self) -> &BootstrapConfig {
        &self.bootstrap
    }

    /// Checks frequencies, band and periods.
    pub fn validate(&self) -> Result<()> {
        let in_range = |f: f64| (1.0..=100.0).contains(&f);
        if let Some(f) = self.frequencies.iter().find(|&&f| !in_range(f)) {
            return Err(Error::invalid(format!(
                "frequency {f}% outside [1, 100]"
            )));
        }
        if !in_range(self.hd_frequency) {
            return Err(Error::invalid(format!(
                "HD frequency {}% outside [1, 100]",
                self.hd_frequency
            )));
        }
        let (lo, hi) = self.band;
        if !((0.0..=100.0).contains(&lo) && (0.0..=100.0).contains(&hi) && lo <= hi) {
            return Err(Error::invalid(format!("invalid percentile band ({lo}, {hi})")));
        }
        if self.periods.is_empty() {
            return Err(Error::invalid("at least one comparison period is required"));
        }
        self.bootstrap.validate()
    }
}

impl Default for DroughtConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Quantile probability for a frequency in percent: `(f − 1) / 99`.
#[inline]
pub fn frequency_to_probability(frequency: f64) -> f64 {
    (frequency - 1.0) / 99.0
}
