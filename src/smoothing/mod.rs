//! Locally weighted scatterplot smoothing of annual series.
//!
//! Used to extract the forced signal from noisy annual global-mean
//! temperature, so `frac` is typically a window of about ten years out of the
//! series length.

use tracing::debug;

use crate::config::LowessConfig;
use crate::error::{Error, Result};
use crate::series::YearSeries;
use crate::statistics::{CDF, Quantile, Statistic};

/// Smooths `series` with robust locally weighted linear regression.
///
/// Each year is fitted by weighted least squares over its
/// `⌊frac · n⌋` nearest years, with tricube distance weights. Each of the
/// `config.iterations()` robustness passes then down-weights years with large
/// residuals using bisquare weights scaled by six median absolute residuals.
///
/// The output keeps the input year axis.
#[tracing::instrument(skip_all, fields(n = series.len(), frac = config.frac()))]
pub fn lowess(series: &YearSeries, config: &LowessConfig) -> Result<YearSeries> {
    config.validate()?;
    if series.values().iter().any(|v| !v.is_finite()) {
        return Err(Error::invalid("lowess input must be finite"));
    }

    let x: Vec<f64> = series.years().iter().map(|&y| f64::from(y)).collect();
    let y = series.values();
    let n = x.len();
    if n < 2 {
        return Ok(series.clone());
    }

    let k = ((config.frac() * n as f64 + 1e-10) as usize).clamp(2, n);
    let mut robustness = vec![1.0; n];
    let mut fitted = fit_all(&x, y, &robustness, k);

    for iteration in 0..config.iterations() {
        let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(yi, fi)| yi - fi).collect();
        let abs: Vec<f64> = residuals.iter().map(|r| r.abs()).collect();
        let scale = Quantile::median().compute(&CDF.compute(&abs));
        if scale <= 1e-12 * y.iter().fold(1.0_f64, |m, v| m.max(v.abs())) {
            debug!(iteration, "residuals vanished, stopping robustness passes");
            break;
        }
        for (w, r) in robustness.iter_mut().zip(&residuals) {
            *w = bisquare(r / (6.0 * scale));
        }
        fitted = fit_all(&x, y, &robustness, k);
    }

    YearSeries::new(series.years().to_vec(), fitted)
}

fn fit_all(x: &[f64], y: &[f64], robustness: &[f64], k: usize) -> Vec<f64> {
    (0..x.len())
        .map(|i| fit_point(x, y, robustness, i, k))
        .collect()
}

/// Weighted linear fit at `x[i]` over the `k` nearest neighbours.
fn fit_point(x: &[f64], y: &[f64], robustness: &[f64], i: usize, k: usize) -> f64 {
    let (Some(&xi), Some(&yi)) = (x.get(i), y.get(i)) else {
        return f64::NAN;
    };
    let n = x.len();

    // x is sorted, so the k nearest points form a contiguous window.
    let reach = |lo: usize| match (x.get(lo), x.get(lo + k - 1)) {
        (Some(a), Some(b)) => (xi - a).max(b - xi),
        _ => f64::INFINITY,
    };
    let first = (i + 1).saturating_sub(k);
    let last = i.min(n - k);
    let lo = (first..=last)
        .min_by(|&a, &b| reach(a).total_cmp(&reach(b)))
        .unwrap_or(first);
    let radius = reach(lo);

    let neighbours: Vec<(f64, f64, f64)> = x
        .iter()
        .zip(y)
        .zip(robustness)
        .skip(lo)
        .take(k)
        .map(|((&xj, &yj), &rj)| {
            let d = if radius > 0.0 { (xj - xi).abs() / radius } else { 0.0 };
            (xj, yj, tricube(d) * rj)
        })
        .collect();

    let (mut sw, mut sx, mut sy) = (0.0, 0.0, 0.0);
    for &(xj, yj, w) in &neighbours {
        sw += w;
        sx += w * xj;
        sy += w * yj;
    }
    if sw <= 0.0 {
        return yi;
    }
    let xm = sx / sw;
    let ym = sy / sw;

    let (mut sxx, mut sxy) = (0.0, 0.0);
    for &(xj, yj, w) in &neighbours {
        sxx += w * (xj - xm) * (xj - xm);
        sxy += w * (xj - xm) * (yj - ym);
    }
    if sxx <= 1e-12 * radius.max(1.0).powi(2) {
        return ym;
    }
    ym + sxy / sxx * (xi - xm)
}

#[inline]
fn tricube(d: f64) -> f64 {
    if d >= 1.0 {
        0.0
    } else {
        (1.0 - d.powi(3)).powi(3)
    }
}

#[inline]
fn bisquare(u: f64) -> f64 {
    if u.abs() >= 1.0 {
        0.0
    } else {
        (1.0 - u * u).powi(2)
    }
}
