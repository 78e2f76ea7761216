use super::{Mean, Statistic, StdDev};
use crate::error::{Error, Result};
use crate::series::{Ensemble, Period, YearSeries};

/// Re-expresses data relative to statistics taken over a reference window.
pub trait Standardize<D> {
    /// Returns the transformed data, keeping its shape.
    fn standardize(&self, data: &D) -> Result<D>;
}

/// Anomaly with respect to the mean over a baseline period.
///
/// For ensembles the baseline mean is pooled over every run, so all runs are
/// shifted by the same amount.
#[derive(Debug, Clone, Copy)]
pub struct Anomaly {
    /// Baseline period.
    pub baseline: Period,
}

impl Anomaly {
    /// Creates an anomaly transform for `baseline`.
    pub fn new(baseline: Period) -> Self {
        Self { baseline }
    }
}

/// Standardized anomaly `(x − μ) / σ`, with μ and σ taken over a reference
/// period. Population standard deviation (`ddof = 0`) by default.
#[derive(Debug, Clone, Copy)]
pub struct StandardizedAnomaly {
    /// Reference period.
    pub reference: Period,
    /// Delta degrees of freedom for σ.
    pub ddof: usize,
}

impl StandardizedAnomaly {
    /// Creates a standardization over `reference` with `ddof = 0`.
    pub fn new(reference: Period) -> Self {
        Self { reference, ddof: 0 }
    }

    /// Uses `ddof` for the standard deviation.
    #[must_use]
    pub fn with_ddof(mut self, ddof: usize) -> Self {
        self.ddof = ddof;
        self
    }

    fn moments(&self, window: &[f64]) -> Result<(f64, f64)> {
        if window.is_empty() {
            return Err(Error::InsufficientData {
                run: None,
                period: self.reference,
            });
        }
        let mean: f64 = Mean.compute(&window);
        let std: f64 = StdDev::new(self.ddof).compute(&window);
        if !(std.is_finite() && std > 0.0) {
            return Err(Error::invalid(format!(
                "standard deviation over {} is {std}; cannot standardize",
                self.reference
            )));
        }
        Ok((mean, std))
    }
}

fn baseline_mean(window: &[f64], baseline: Period) -> Result<f64> {
    if window.is_empty() {
        return Err(Error::InsufficientData {
            run: None,
            period: baseline,
        });
    }
    Ok(Mean.compute(&window))
}

impl Standardize<YearSeries> for Anomaly {
    fn standardize(&self, data: &YearSeries) -> Result<YearSeries> {
        let mean = baseline_mean(&data.window(self.baseline), self.baseline)?;
        data.try_map(|v| v - mean)
    }
}

impl Standardize<Ensemble> for Anomaly {
    fn standardize(&self, data: &Ensemble) -> Result<Ensemble> {
        let mean = baseline_mean(&data.flatten(self.baseline), self.baseline)?;
        Ok(data.map_values(|v| v - mean))
    }
}

impl Standardize<YearSeries> for StandardizedAnomaly {
    fn standardize(&self, data: &YearSeries) -> Result<YearSeries> {
        let (mean, std) = self.moments(&data.window(self.reference))?;
        data.try_map(|v| (v - mean) / std)
    }
}

impl Standardize<Ensemble> for StandardizedAnomaly {
    fn standardize(&self, data: &Ensemble) -> Result<Ensemble> {
        let (mean, std) = self.moments(&data.flatten(self.reference))?;
        Ok(data.map_values(|v| (v - mean) / std))
    }
}

/// Precipitation deficit in percent relative to a climatological mean:
/// `100 (1 − value / reference_mean)`. Positive means drier than normal.
#[inline]
pub fn deficit_percent(value: f64, reference_mean: f64) -> f64 {
    100.0 * (1.0 - value / reference_mean)
}
