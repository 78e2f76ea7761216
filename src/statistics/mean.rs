use num_traits::{Float, FromPrimitive};

use super::Statistic;

/// Arithmetic mean using **Kahan summation**, so long ensembles of annual
/// totals (thousands of mm per value) do not drift.
///
/// Returns NaN for an empty slice.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mean;

impl<D, T> Statistic<D, T> for Mean
where
    D: AsRef<[T]>,
    T: Float + FromPrimitive,
{
    fn compute(&self, data: &D) -> T {
        let values: &[T] = data.as_ref();
        T::from_usize(values.len()).map_or_else(T::nan, |n| compensated_sum(values.iter().copied()) / n)
    }
}

/// Kahan-compensated sum.
pub(super) fn compensated_sum<T: Float>(terms: impl Iterator<Item = T>) -> T {
    let (sum, _) = terms.fold((T::zero(), T::zero()), |(sum, lost), term| {
        let adjusted = term - lost;
        let next = sum + adjusted;
        (next, (next - sum) - adjusted)
    });
    sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn empty_slice_returns_nan() {
        let mean: f64 = Mean.compute(&Vec::<f64>::new());
        assert!(mean.is_nan(), "Empty slice must return NaN (got: {mean})");
    }

    #[test]
    fn exact_integer_means() {
        assert_abs_diff_eq!(Mean.compute(&[1.0_f64, 2.0, 3.0, 4.0, 5.0]), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn kahan_reduces_accumulation_error() {
        let n = 10_000;
        let data: Vec<f32> = vec![0.1_f32; n];
        let expected = 0.1_f32;

        let kahan_mean = Mean.compute(&data);
        let naive_mean: f32 = data.iter().sum::<f32>() / (n as f32);

        let kahan_error = (kahan_mean - expected).abs();
        let naive_error = (naive_mean - expected).abs();
        assert!(
            kahan_error < naive_error * 0.5,
            "Kahan error ({kahan_error:.2e}) should be <50% of naive error ({naive_error:.2e})"
        );
    }

    #[test]
    fn large_annual_totals() {
        // 100 years of ~ 300 mm with a trend
        let data: Vec<f64> = (0..100).map(|i| 300.0 + f64::from(i) * 0.5).collect();
        assert_relative_eq!(Mean.compute(&data), 324.75, epsilon = 1e-10);
    }
}
