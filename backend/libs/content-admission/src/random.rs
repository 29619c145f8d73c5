use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Source of uniform samples in `[0, 1)` used for stochastic admission.
///
/// Injected into the controller so tests can supply deterministic sequences.
pub trait RandomSource: Send + Sync {
    fn next_unit(&self) -> f64;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn next_index(&self, len: usize) -> usize {
        let idx = (self.next_unit() * len as f64) as usize;
        idx.min(len.saturating_sub(1))
    }
}

/// [`RandomSource`] backed by a `rand` generator behind a mutex.
pub struct RngSource<R: RngCore + Send> {
    rng: Mutex<R>,
}

impl<R: RngCore + Send> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl RngSource<StdRng> {
    /// Deterministic source: same seed, same sample sequence.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: RngCore + Send> RandomSource for RngSource<R> {
    fn next_unit(&self) -> f64 {
        self.rng.lock().gen::<f64>()
    }

    fn next_index(&self, len: usize) -> usize {
        self.rng.lock().gen_range(0..len.max(1))
    }
}

impl<T: RandomSource + ?Sized> RandomSource for std::sync::Arc<T> {
    fn next_unit(&self) -> f64 {
        (**self).next_unit()
    }

    fn next_index(&self, len: usize) -> usize {
        (**self).next_index(len)
    }
}
