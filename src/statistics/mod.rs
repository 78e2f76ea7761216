/// A statistic computed from a data container `D`, producing `T`.
pub trait Statistic<D, T> {
    /// Computes the statistic.
    fn compute(&self, data: &D) -> T;
}

mod mean;
mod variance;
mod cdf;
mod quantile;
mod anomaly;

pub use mean::Mean;
pub use variance::{StdDev, Variance};
pub use cdf::{CDF, EmpiricalCDF, PercentileKind};
pub use quantile::Quantile;
pub use anomaly::{Anomaly, Standardize, StandardizedAnomaly, deficit_percent};

impl<D, T1, T2, S1, S2> Statistic<D, (T1, T2)> for (S1, S2)
where
    S1: Statistic<D, T1>,
    S2: Statistic<D, T2>,
{
    #[inline]
    fn compute(&self, data: &D) -> (T1, T2) {
        (self.0.compute(data), self.1.compute(data))
    }
}
