mod ensemble;
mod read;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use ensemble::{Ensemble, RunId, RunMap};

/// Closed calendar-year interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct Period {
    start: i32,
    end: i32,
}

#[derive(Deserialize)]
struct RawPeriod {
    start: i32,
    end: i32,
}

impl TryFrom<RawPeriod> for Period {
    type Error = Error;

    fn try_from(raw: RawPeriod) -> Result<Self> {
        Self::new(raw.start, raw.end)
    }
}

impl Period {
    /// Creates a period, rejecting `start > end`.
    pub fn new(start: i32, end: i32) -> Result<Self> {
        if start > end {
            return Err(Error::invalid(format!(
                "period start {start} is after its end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// For compile-time constants whose ordering is known.
    pub(crate) const fn fixed(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// First year of the period.
    pub fn start(&self) -> i32 {
        self.start
    }

    /// Last year of the period (inclusive).
    pub fn end(&self) -> i32 {
        self.end
    }

    /// Number of calendar years covered.
    pub fn n_years(&self) -> usize {
        (self.end.abs_diff(self.start) as usize).saturating_add(1)
    }

    /// `true` if `year` falls inside the period (both ends inclusive).
    #[inline]
    pub fn contains(&self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Annual time series: one value per calendar year.
///
/// Years are strictly increasing. Gaps are allowed; a missing year is simply
/// absent, never stored as a placeholder value, so NaN is rejected on
/// construction. Infinite values are kept, since distribution tails may
/// legitimately saturate to `+∞`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearSeries {
    years: Vec<i32>,
    values: Vec<f64>,
}

impl YearSeries {
    /// Creates a series from parallel year and value vectors.
    pub fn new(years: Vec<i32>, values: Vec<f64>) -> Result<Self> {
        if years.len() != values.len() {
            return Err(Error::invalid(format!(
                "length mismatch: {} years but {} values",
                years.len(),
                values.len()
            )));
        }
        if let Some((a, b)) = years.iter().zip(years.iter().skip(1)).find(|(a, b)| a >= b) {
            return Err(Error::invalid(format!(
                "years must be strictly increasing, found {a} followed by {b}"
            )));
        }
        if let Some((year, _)) = years.iter().zip(&values).find(|(_, v)| v.is_nan()) {
            return Err(Error::invalid(format!(
                "NaN value for year {year}; drop missing years instead"
            )));
        }
        Ok(Self { years, values })
    }

    /// Creates a series from `(year, value)` pairs.
    pub fn from_pairs<I: IntoIterator<Item = (i32, f64)>>(pairs: I) -> Result<Self> {
        let (years, values) = pairs.into_iter().unzip();
        Self::new(years, values)
    }

    /// Creates a series of consecutive years starting at `first_year`.
    pub fn consecutive(first_year: i32, values: Vec<f64>) -> Result<Self> {
        let years = (first_year..).take(values.len()).collect();
        Self::new(years, values)
    }

    /// Number of years present.
    pub fn len(&self) -> usize {
        self.years.len()
    }

    /// `true` if the series holds no years.
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Years in increasing order.
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Values aligned with [`YearSeries::years`].
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterates over `(year, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.years.iter().copied().zip(self.values.iter().copied())
    }

    /// Value for `year`, if present.
    pub fn get(&self, year: i32) -> Option<f64> {
        self.years
            .binary_search(&year)
            .ok()
            .and_then(|idx| self.values.get(idx).copied())
    }

    /// Values whose year lies inside `period`, in year order.
    pub fn window(&self, period: Period) -> Vec<f64> {
        self.iter()
            .filter(|&(year, _)| period.contains(year))
            .map(|(_, v)| v)
            .collect()
    }

    /// Sub-series restricted to `period`.
    pub fn select(&self, period: Period) -> Self {
        let (years, values) = self.iter().filter(|&(year, _)| period.contains(year)).unzip();
        Self { years, values }
    }

    /// Sub-series of the years whose value is at or below `threshold`.
    pub fn at_or_below(&self, threshold: f64) -> Self {
        let (years, values) = self.iter().filter(|&(_, v)| v <= threshold).unzip();
        Self { years, values }
    }

    /// Applies `f` to every value, keeping the year axis.
    ///
    /// Fails if `f` produces NaN.
    pub fn try_map(&self, f: impl Fn(f64) -> f64) -> Result<Self> {
        Self::new(self.years.clone(), self.values.iter().map(|&v| f(v)).collect())
    }

    pub(crate) fn map_unchecked(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            years: self.years.clone(),
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }
}

impl AsRef<[f64]> for YearSeries {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}
