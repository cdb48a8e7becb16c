//! Seed derivation for reproducible strategy randomness
//!
//! Every random stream in the engine descends from one `u64` root seed.
//! A tournament derives one seed per pairing, a series derives one per
//! sample, and each sample hands a separate ChaCha stream to each side,
//! so the two players never consume each other's draws and the results
//! do not depend on execution order.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// RNG handed to strategies that need randomness
pub type StrategyRng = ChaCha8Rng;

/// Deterministic seed tree node
///
/// Same root seed + same index path = same stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedSource {
    state: u64,
}

impl SeedSource {
    pub fn new(seed: u64) -> Self {
        Self { state: mix(seed ^ 0x517cc1b727220a95) }
    }

    /// Derive the child seed at `index`
    pub fn derive(&self, index: u64) -> u64 {
        mix(self.state ^ index.wrapping_mul(0x9e3779b97f4a7c15))
    }

    /// Child node at `index`
    pub fn child(&self, index: u64) -> Self {
        Self { state: self.derive(index) }
    }

    /// ChaCha stream at `index`
    pub fn rng(&self, index: u64) -> StrategyRng {
        ChaCha8Rng::seed_from_u64(self.derive(index))
    }
}

/// splitmix64 finalizer
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e3779b97f4a7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}
