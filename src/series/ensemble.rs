use std::collections::BTreeMap;

use super::{Period, YearSeries};
use crate::error::{Error, Result};
use crate::statistics::{Mean, Statistic};

/// Identifier of an ensemble member. Carries identity only, no ordering
/// semantics beyond making iteration deterministic.
pub type RunId = usize;

/// Per-run results, keyed by run identifier.
pub type RunMap<T> = BTreeMap<RunId, T>;

/// Collection of simulated runs sharing one year axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Ensemble {
    runs: RunMap<YearSeries>,
}

impl Ensemble {
    /// Creates an ensemble. Every run must cover exactly the same years.
    pub fn new(runs: RunMap<YearSeries>) -> Result<Self> {
        let Some(first) = runs.values().next() else {
            return Err(Error::invalid("ensemble has no runs"));
        };
        if let Some((id, _)) = runs.iter().find(|(_, s)| s.years() != first.years()) {
            return Err(Error::invalid(format!(
                "run {id} does not share the ensemble year axis"
            )));
        }
        Ok(Self { runs })
    }

    /// Creates an ensemble with run ids `0..columns.len()`, one column per run.
    pub fn from_columns(years: &[i32], columns: Vec<Vec<f64>>) -> Result<Self> {
        let runs = columns
            .into_iter()
            .enumerate()
            .map(|(id, values)| YearSeries::new(years.to_vec(), values).map(|s| (id, s)))
            .collect::<Result<RunMap<_>>>()?;
        Self::new(runs)
    }

    /// Number of runs.
    pub fn n_runs(&self) -> usize {
        self.runs.len()
    }

    /// Shared year axis.
    pub fn years(&self) -> &[i32] {
        self.runs
            .values()
            .next()
            .map_or(&[], YearSeries::years)
    }

    /// Run identifiers in increasing order.
    pub fn run_ids(&self) -> impl Iterator<Item = RunId> + '_ {
        self.runs.keys().copied()
    }

    /// Series of a single run.
    pub fn run(&self, id: RunId) -> Option<&YearSeries> {
        self.runs.get(&id)
    }

    /// Iterates over `(run id, series)`.
    pub fn iter(&self) -> impl Iterator<Item = (RunId, &YearSeries)> + '_ {
        self.runs.iter().map(|(&id, s)| (id, s))
    }

    /// Values of `run` inside `period`.
    ///
    /// Fails with [`Error::InsufficientData`] naming the run if the window is
    /// empty.
    pub fn window(&self, run: RunId, period: Period) -> Result<Vec<f64>> {
        let series = self
            .runs
            .get(&run)
            .ok_or_else(|| Error::invalid(format!("unknown run {run}")))?;
        let values = series.window(period);
        if values.is_empty() {
            return Err(Error::InsufficientData {
                run: Some(run),
                period,
            });
        }
        Ok(values)
    }

    /// All values of all runs inside `period`, year-major.
    pub fn flatten(&self, period: Period) -> Vec<f64> {
        let per_run: Vec<Vec<f64>> = self.runs.values().map(|s| s.window(period)).collect();
        let n_years = per_run.first().map_or(0, Vec::len);
        let mut flat = Vec::with_capacity(n_years * per_run.len());
        let mut columns: Vec<_> = per_run.into_iter().map(Vec::into_iter).collect();
        for _ in 0..n_years {
            flat.extend(columns.iter_mut().filter_map(Iterator::next));
        }
        flat
    }

    /// Applies `f` to every value of every run, keeping ids and year axis.
    pub fn map_values(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            runs: self
                .runs
                .iter()
                .map(|(&id, s)| (id, s.map_unchecked(&f)))
                .collect(),
        }
    }

    /// Cross-run mean for every year.
    pub fn ensemble_mean(&self) -> YearSeries {
        let years = self.years().to_vec();
        let mut columns: Vec<_> = self.runs.values().map(|s| s.values().iter().copied()).collect();
        let values = years
            .iter()
            .map(|_| {
                let column: Vec<f64> = columns.iter_mut().filter_map(Iterator::next).collect();
                Mean.compute(&column)
            })
            .collect();
        YearSeries { years, values }
    }
}
