mod bootstrap;

pub use bootstrap::{Bootstrap, BootstrapIter};

/// Produces a stream of resamples from `T`.
pub trait Re<T: ?Sized> {
    /// Resampled item.
    type Item;
    /// Iterates over resamples of `t`. The stream is unbounded; callers `take`
    /// as many rounds as they need.
    fn re<'a>(&'a mut self, t: &'a T) -> impl Iterator<Item = Self::Item> + 'a;
}
