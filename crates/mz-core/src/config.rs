//! Arbitration tuning parameters.

use crate::{MzError, MzResult};

/// Timing parameters of the zone arbiter.
///
/// Both values are expressed in ticks.  The defaults reproduce the behaviour
/// trains have always had; they are pending review and may change.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ArbiterConfig {
    /// How long after the slot last granted a hard enter an older, waiting
    /// session keeps precedence over a newcomer on the segments it wants.
    /// Default: 5.
    pub fairness_window_ticks: u64,

    /// How long a session may go without being tracked before the sweep
    /// checks whether its agent still occupies any claimed segment.
    /// Default: 6.
    pub idle_release_ticks: u64,
}

impl ArbiterConfig {
    pub const DEFAULT_FAIRNESS_WINDOW_TICKS: u64 = 5;
    pub const DEFAULT_IDLE_RELEASE_TICKS: u64 = 6;

    /// Reject configurations the sweep cannot work with.
    pub fn validate(&self) -> MzResult<()> {
        if self.idle_release_ticks == 0 {
            return Err(MzError::Config(
                "idle_release_ticks must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            fairness_window_ticks: Self::DEFAULT_FAIRNESS_WINDOW_TICKS,
            idle_release_ticks:    Self::DEFAULT_IDLE_RELEASE_TICKS,
        }
    }
}
