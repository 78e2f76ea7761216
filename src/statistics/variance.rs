use num_traits::{Float, FromPrimitive};

use super::mean::compensated_sum;
use super::{Mean, Statistic};

/// Variance with a configurable delta degrees of freedom.
#[derive(Debug, Clone, Copy)]
pub struct Variance {
    /// Delta degrees of freedom subtracted from `n` in the denominator.
    pub ddof: usize,
}

impl Variance {
    /// Creates a new `Variance` estimator with the given degrees of freedom adjustment.
    ///
    /// - `ddof = 0`: population variance, the convention used when
    ///   standardizing climate anomalies
    /// - `ddof = 1`: sample variance (Bessel's correction)
    pub fn new(ddof: usize) -> Self {
        Variance { ddof }
    }
}

impl Default for Variance {
    /// Population variance (`ddof = 0`).
    fn default() -> Self {
        Variance { ddof: 0 }
    }
}

impl<D, T> Statistic<D, T> for Variance
where
    D: AsRef<[T]>,
    T: Float + FromPrimitive,
{
    fn compute(&self, data: &D) -> T {
        let values = data.as_ref();
        if values.len() <= self.ddof {
            return T::nan();
        }
        let mean: T = Mean.compute(data);
        let squares = compensated_sum(values.iter().map(|&x| (x - mean) * (x - mean)));
        T::from_usize(values.len() - self.ddof).map_or_else(T::nan, |dof| squares / dof)
    }
}

/// Standard deviation: square root of [`Variance`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDev {
    /// Delta degrees of freedom.
    pub ddof: usize,
}

impl StdDev {
    /// Creates a standard deviation estimator.
    pub fn new(ddof: usize) -> Self {
        StdDev { ddof }
    }
}

impl<D, T> Statistic<D, T> for StdDev
where
    D: AsRef<[T]>,
    T: Float + FromPrimitive,
{
    fn compute(&self, data: &D) -> T {
        let var: T = Variance::new(self.ddof).compute(data);
        var.sqrt()
    }
}
