//! Seeded random source threaded through every generation step.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic random stream used by the generator.
///
/// Every helper draws exactly one unit sample when it draws at all, so the
/// sequence of decisions for a seed stays stable as long as the order of calls
/// does.
#[derive(Clone, Debug)]
pub struct DungeonRng {
    inner: ChaCha8Rng,
}

impl DungeonRng {
    /// Creates a stream seeded from the provided value.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uniform sample in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Uniform integer in `[min, max]`, or `None` when the range is empty.
    ///
    /// A sample is drawn even when the range is empty.
    pub fn range_inclusive(&mut self, min: u32, max: u32) -> Option<u32> {
        let sample = self.unit();
        if max < min {
            return None;
        }
        let span = f64::from(max - min) + 1.0;
        let offset = (sample * span).floor() as u32;
        Some(min + offset.min(max - min))
    }

    /// Uniform index below `len`; no sample is drawn for empty ranges.
    pub fn index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let offset = (self.unit() * len as f64).floor() as usize;
        Some(offset.min(len - 1))
    }

    /// Uniformly chosen element of the slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        self.index(items.len()).and_then(|index| items.get(index))
    }

    /// Uniformly chosen element among the first half (rounded up) of the slice.
    pub fn pick_from_top<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let top = items.len().div_ceil(2).max(1);
        self.index(top).and_then(|index| items.get(index))
    }

    /// Fair coin flip.
    pub fn coin(&mut self) -> bool {
        self.unit() > 0.5
    }
}
