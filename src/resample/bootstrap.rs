use rand::Rng;

use super::Re;

/// Uniform resampling with replacement.
///
/// Each resample holds `size` draws, which need not equal the length of the
/// data. The generator is borrowed mutably for the lifetime of the iterator,
/// so consecutive streams continue the same random sequence.
#[derive(Debug, Clone)]
pub struct Bootstrap<R: Rng> {
    /// Random source.
    pub rng: R,
    /// Number of draws per resample.
    pub size: usize,
}

impl<R: Rng> Bootstrap<R> {
    /// Creates a bootstrap drawing `size` values per resample.
    pub fn new(rng: R, size: usize) -> Self {
        Self { rng, size }
    }
}

impl<T: Copy, R: Rng> Re<[T]> for Bootstrap<R> {
    type Item = Vec<T>;

    fn re<'a>(&'a mut self, data: &'a [T]) -> impl Iterator<Item = Self::Item> + 'a {
        BootstrapIter {
            data,
            rng: &mut self.rng,
            size: self.size,
        }
    }
}

/// Iterator returned by [`Bootstrap::re`].
///
/// Yields nothing when the data is empty, since no draw is possible.
pub struct BootstrapIter<'a, T, R: Rng> {
    data: &'a [T],
    rng: &'a mut R,
    size: usize,
}

impl<T: Copy, R: Rng> Iterator for BootstrapIter<'_, T, R> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.data.len();
        if n == 0 {
            return None;
        }
        let rng = &mut *self.rng;
        Some(
            (0..self.size)
                .filter_map(|_| self.data.get(rng.gen_range(0..n)).copied())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn resample_size_is_independent_of_data_length() {
        let data = [1.0, 2.0, 3.0];
        let mut boot = Bootstrap::new(Xoshiro256PlusPlus::seed_from_u64(1), 10);
        let resamples: Vec<Vec<f64>> = boot.re(&data[..]).take(5).collect();
        assert_eq!(resamples.len(), 5);
        for r in &resamples {
            assert_eq!(r.len(), 10);
            assert!(r.iter().all(|v| data.contains(v)));
        }
    }

    #[test]
    fn draws_with_replacement() {
        let data = [1.0, 2.0];
        let mut boot = Bootstrap::new(Xoshiro256PlusPlus::seed_from_u64(3), 50);
        let r = boot.re(&data[..]).next().unwrap();
        assert!(r.contains(&1.0) && r.contains(&2.0));
    }

    #[test]
    fn same_seed_same_stream() {
        let data: Vec<f64> = (0..20).map(f64::from).collect();
        let a: Vec<Vec<f64>> = Bootstrap::new(Xoshiro256PlusPlus::seed_from_u64(9), 8)
            .re(&data[..])
            .take(3)
            .collect();
        let b: Vec<Vec<f64>> = Bootstrap::new(Xoshiro256PlusPlus::seed_from_u64(9), 8)
            .re(&data[..])
            .take(3)
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_data_yields_nothing() {
        let data: [f64; 0] = [];
        let mut boot = Bootstrap::new(Xoshiro256PlusPlus::seed_from_u64(0), 4);
        assert!(boot.re(&data[..]).next().is_none());
    }
}
