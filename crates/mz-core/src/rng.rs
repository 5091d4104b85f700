//! Deterministic simulation-level RNG.
//!
//! Arbitration itself is deterministic.  The only randomness is the optional
//! shuffling of agent evaluation order, which decides who wins a tie on the
//! tick contention begins.  Seeding it makes those runs reproducible.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Seeded RNG for the evaluation order of agents.
///
/// Used only in single-threaded contexts.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Shuffle a mutable slice in-place (Fisher-Yates).
    #[inline]
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        slice.shuffle(&mut self.0);
    }
}
