use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::debug;

use super::Schedule;
use crate::config::BootstrapConfig;
use crate::error::{Error, Result};
use crate::resample::{Bootstrap, Re};
use crate::series::{Ensemble, Period, RunId, RunMap};
use crate::statistics::{CDF, EmpiricalCDF, PercentileKind, Quantile, Statistic};

/// Quantile of every run's values inside `period`.
///
/// Uses linear interpolation between order statistics, so `probability = 0`
/// is the window minimum and `probability = 1` its maximum.
///
/// # Errors
/// - [`Error::InvalidInput`] if `probability` is outside `[0, 1]`
/// - [`Error::InsufficientData`] naming the first run with no value in
///   `period`
pub fn extract_quantile(
    ensemble: &Ensemble,
    probability: f64,
    period: Period,
) -> Result<RunMap<f64>> {
    extract_quantile_scheduled(ensemble, probability, period, Schedule::Sequential)
}

/// [`extract_quantile`] with an explicit run schedule.
pub fn extract_quantile_scheduled(
    ensemble: &Ensemble,
    probability: f64,
    period: Period,
    schedule: Schedule,
) -> Result<RunMap<f64>> {
    let quantile = Quantile::new(probability)?;
    let ids: Vec<RunId> = ensemble.run_ids().collect();

    schedule.map_runs(&ids, |run| {
        let window = ensemble.window(run, period)?;
        Ok(quantile.compute(&CDF.compute(&window)))
    })
}

/// Bootstrap estimate of the probability that a run is at or below
/// `threshold` inside `period`.
///
/// For every run, `config.rounds()` pools of `config.resample_size()` values
/// are drawn with replacement from the run's window. Each round scores the
/// threshold's percentile rank in the pool (ties counted per
/// `config.kind()`), and the run's estimate is the mean over rounds,
/// expressed as a fraction in `[0, 1]`.
///
/// One seed per run is drawn from `rng` in run-id order before any work
/// starts, and every run resamples from its own generator seeded with it.
/// The result therefore depends only on the state of `rng`, never on
/// `config.schedule()`.
///
/// # Errors
/// - [`Error::InvalidInput`] for a NaN threshold or an invalid config
/// - [`Error::InsufficientData`] naming the first run with no value in
///   `period`
#[tracing::instrument(skip(ensemble, config, rng), fields(runs = ensemble.n_runs()))]
pub fn estimate_exceedance_probability<R>(
    ensemble: &Ensemble,
    threshold: f64,
    period: Period,
    config: &BootstrapConfig,
    rng: &mut R,
) -> Result<RunMap<f64>>
where
    R: Rng + ?Sized,
{
    config.validate()?;
    if threshold.is_nan() {
        return Err(Error::invalid("threshold is NaN"));
    }

    let seeds: RunMap<u64> = ensemble.run_ids().map(|id| (id, rng.next_u64())).collect();
    let ids: Vec<RunId> = seeds.keys().copied().collect();

    let estimates = config.schedule().map_runs(&ids, |run| {
        let window = ensemble.window(run, period)?;
        let seed = seeds
            .get(&run)
            .copied()
            .ok_or_else(|| Error::invalid(format!("no bootstrap seed for run {run}")))?;
        Ok(exceedance_rounds(&window, threshold, config, seed))
    })?;

    debug!(
        rounds = config.rounds(),
        resample_size = config.resample_size(),
        "estimated exceedance probabilities"
    );
    Ok(estimates)
}

fn exceedance_rounds(window: &[f64], threshold: f64, config: &BootstrapConfig, seed: u64) -> f64 {
    let kind: PercentileKind = config.kind();
    let rounds = config.rounds();
    let mut bootstrap = Bootstrap::new(Xoshiro256PlusPlus::seed_from_u64(seed), config.resample_size());

    let total: f64 = bootstrap
        .re(window)
        .take(rounds)
        .map(|pool| {
            let ecdf: EmpiricalCDF<f64> = CDF.compute(&pool);
            ecdf.percentile_of_score(threshold, kind) / 100.0
        })
        .sum();
    total / rounds as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn two_runs() -> Ensemble {
        let years: Vec<i32> = (2001..=2010).collect();
        let run0: Vec<f64> = (1..=10).map(f64::from).collect();
        let run1: Vec<f64> = run0.iter().map(|v| v * 10.0).collect();
        Ensemble::from_columns(&years, vec![run0, run1]).unwrap()
    }

    fn decade() -> Period {
        Period::new(2001, 2010).unwrap()
    }

    #[test]
    fn quantile_per_run() {
        let q = extract_quantile(&two_runs(), 0.5, decade()).unwrap();
        assert_abs_diff_eq!(q[&0], 5.5);
        assert_abs_diff_eq!(q[&1], 55.0);
    }

    #[test]
    fn quantile_bounds_are_min_and_max() {
        let e = two_runs();
        let lo = extract_quantile(&e, 0.0, decade()).unwrap();
        let hi = extract_quantile(&e, 1.0, decade()).unwrap();
        assert_eq!(lo[&1], 10.0);
        assert_eq!(hi[&1], 100.0);
    }

    #[test]
    fn quantile_only_sees_the_window() {
        let q = extract_quantile(&two_runs(), 1.0, Period::new(2001, 2003).unwrap()).unwrap();
        assert_eq!(q[&0], 3.0);
    }

    #[test]
    fn quantile_rejects_probability_out_of_range() {
        let err = extract_quantile(&two_runs(), 1.5, decade()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
    }

    #[test]
    fn empty_window_names_the_run() {
        let err = extract_quantile(&two_runs(), 0.5, Period::new(1950, 1960).unwrap()).unwrap_err();
        match err {
            Error::InsufficientData { run, .. } => assert_eq!(run, Some(0)),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn estimate_over_an_empty_window_names_the_run() {
        let early = Period::new(1990, 1995).unwrap();
        for schedule in [Schedule::Sequential, Schedule::Parallel] {
            let config = BootstrapConfig::new().with_rounds(5).with_schedule(schedule);
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
            let err = estimate_exceedance_probability(&two_runs(), 5.0, early, &config, &mut rng)
                .unwrap_err();
            assert!(
                matches!(err, Error::InsufficientData { run: Some(0), period } if period == early),
                "{schedule:?}: {err}"
            );
        }
    }

    #[test]
    fn threshold_outside_the_range() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
        let config = BootstrapConfig::new().with_rounds(20);
        let below = estimate_exceedance_probability(&two_runs(), 0.0, decade(), &config, &mut rng).unwrap();
        let above = estimate_exceedance_probability(&two_runs(), 1e6, decade(), &config, &mut rng).unwrap();
        assert!(below.values().all(|&p| p == 0.0));
        assert!(above.values().all(|&p| p == 1.0));
    }

    #[test]
    fn same_seed_same_estimate() {
        let config = BootstrapConfig::new().with_rounds(50);
        let a = estimate_exceedance_probability(
            &two_runs(),
            4.0,
            decade(),
            &config,
            &mut Xoshiro256PlusPlus::seed_from_u64(5),
        )
        .unwrap();
        let b = estimate_exceedance_probability(
            &two_runs(),
            4.0,
            decade(),
            &config,
            &mut Xoshiro256PlusPlus::seed_from_u64(5),
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn schedule_does_not_change_the_estimate() {
        let base = BootstrapConfig::new().with_rounds(30);
        let seq = estimate_exceedance_probability(
            &two_runs(),
            35.0,
            decade(),
            &base.clone().with_schedule(Schedule::Sequential),
            &mut Xoshiro256PlusPlus::seed_from_u64(8),
        )
        .unwrap();
        let par = estimate_exceedance_probability(
            &two_runs(),
            35.0,
            decade(),
            &base.with_schedule(Schedule::Parallel),
            &mut Xoshiro256PlusPlus::seed_from_u64(8),
        )
        .unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn nan_threshold_is_rejected() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let err = estimate_exceedance_probability(
            &two_runs(),
            f64::NAN,
            decade(),
            &BootstrapConfig::new(),
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
    }

    #[test]
    fn zero_rounds_is_rejected() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let config = BootstrapConfig::new().with_rounds(0);
        assert!(estimate_exceedance_probability(&two_runs(), 1.0, decade(), &config, &mut rng).is_err());
    }
}
