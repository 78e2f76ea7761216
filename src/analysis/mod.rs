//! Per-run statistics over an ensemble and the drought-frequency report.
//!
//! Every per-run computation is expressed as an independent unit of work, a
//! function from [`RunId`] to a result, and handed to a [`Schedule`]. Units
//! share no mutable state, so sequential and parallel schedules produce the
//! same output.

mod ensemble;
mod report;

pub use ensemble::{
    estimate_exceedance_probability, extract_quantile, extract_quantile_scheduled,
};
pub use report::{CurvePoint, DroughtReport, PeriodSummary, Spread};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::series::{RunId, RunMap};

/// How independent per-run units of work are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schedule {
    /// One run after the other on the calling thread.
    #[default]
    Sequential,
    /// Runs spread over the rayon thread pool. Falls back to sequential
    /// execution when the crate is built without the `rayon` feature.
    Parallel,
}

impl Schedule {
    /// Executes `work` for every id and collects the results by run.
    ///
    /// On failure, the error of the lowest failing run id is returned,
    /// whatever the schedule.
    pub fn map_runs<T, F>(self, ids: &[RunId], work: F) -> Result<RunMap<T>>
    where
        T: Send,
        F: Fn(RunId) -> Result<T> + Sync + Send,
    {
        let results: Vec<(RunId, Result<T>)> = match self {
            Schedule::Sequential => ids.iter().map(|&id| (id, work(id))).collect(),
            Schedule::Parallel => parallel(ids, &work),
        };

        let mut out = RunMap::new();
        for (id, result) in results {
            out.insert(id, result?);
        }
        Ok(out)
    }
}

#[cfg(feature = "rayon")]
fn parallel<T, F>(ids: &[RunId], work: &F) -> Vec<(RunId, Result<T>)>
where
    T: Send,
    F: Fn(RunId) -> Result<T> + Sync + Send,
{
    use rayon::prelude::*;
    ids.par_iter().map(|&id| (id, work(id))).collect()
}

#[cfg(not(feature = "rayon"))]
fn parallel<T, F>(ids: &[RunId], work: &F) -> Vec<(RunId, Result<T>)>
where
    T: Send,
    F: Fn(RunId) -> Result<T> + Sync + Send,
{
    ids.iter().map(|&id| (id, work(id))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn collects_by_run_id() {
        let out = Schedule::Sequential
            .map_runs(&[3, 0, 7], |id| Ok(id * 10))
            .unwrap();
        assert_eq!(out.into_iter().collect::<Vec<_>>(), vec![(0, 0), (3, 30), (7, 70)]);
    }

    #[test]
    fn schedules_agree() {
        let ids: Vec<RunId> = (0..64).collect();
        let work = |id: RunId| Ok((id as f64).sqrt());
        let seq = Schedule::Sequential.map_runs(&ids, work).unwrap();
        let par = Schedule::Parallel.map_runs(&ids, work).unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn reports_lowest_failing_run() {
        let ids: Vec<RunId> = (0..32).collect();
        for schedule in [Schedule::Sequential, Schedule::Parallel] {
            let err = schedule
                .map_runs(&ids, |id| {
                    if id % 10 == 5 {
                        Err(Error::invalid(format!("run {id}")))
                    } else {
                        Ok(id)
                    }
                })
                .unwrap_err();
            assert_eq!(err.to_string(), "invalid input: run 5");
        }
    }
}
