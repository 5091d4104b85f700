//! Run parameters of the tick loop.

use mz_core::ArbiterConfig;

use crate::{SimError, SimResult};

/// Top-level simulation configuration.
///
/// Lookahead distances count segments ahead of a train's head: the head
/// itself and the rest of the train sit at distance 0, the next segment at 1.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Number of ticks [`Sim::run`][crate::Sim::run] executes.
    pub total_ticks:    u64,

    /// Seed of the order shuffle.
    pub seed:           u64,

    /// Visit trains in a seeded random order each tick instead of by id.
    pub shuffle_agents: bool,

    /// A slot whose nearest segment is this close is entered hard, all of
    /// it.  Default: 1 (the next segment).
    pub hard_lookahead: u32,

    /// Zones this close are entered at all.  Default: 4.
    pub soft_lookahead: u32,

    pub arbiter:        ArbiterConfig,
}

impl SimConfig {
    /// Check the parameters against each other.
    pub fn validate(&self) -> SimResult<()> {
        if self.hard_lookahead == 0 {
            return Err(SimError::Config(
                "hard_lookahead must be at least 1, or trains never claim the next segment".to_owned(),
            ));
        }
        if self.soft_lookahead < self.hard_lookahead {
            return Err(SimError::Config(format!(
                "soft_lookahead ({}) is shorter than hard_lookahead ({})",
                self.soft_lookahead, self.hard_lookahead,
            )));
        }
        self.arbiter.validate()?;
        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            total_ticks:    100,
            seed:           0,
            shuffle_agents: false,
            hard_lookahead: 1,
            soft_lookahead: 4,
            arbiter:        ArbiterConfig::default(),
        }
    }
}
