//! Tick model.
//!
//! # Design
//!
//! Time is represented as a monotonically increasing `Tick` counter.  There
//! are two clocks in play and both use this type:
//!
//! - the **global** tick, advanced once per arbitration pass by the owning
//!   scheduler, and
//! - each agent's **local** tick, advanced by the agent itself.  Agents that
//!   are paused (unloaded, frozen) stop their local clock while the global
//!   one keeps running.
//!
//! The engine never assumes the two are equal, only that each is monotonic.

use std::fmt;

/// An absolute tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Ticks elapsed from `earlier` to `self`, clamped to zero when `earlier`
    /// lies in the future.
    #[inline]
    pub fn saturating_since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// The tick `n` steps before `self`, clamped at [`Tick::ZERO`].
    #[inline]
    pub fn saturating_rewind(self, n: u64) -> Tick {
        Tick(self.0.saturating_sub(n))
    }
}

impl std::ops::AddAssign<u64> for Tick {
    #[inline]
    fn add_assign(&mut self, rhs: u64) {
        self.0 += rhs;
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}
