//! Outcomes of an enter attempt.

use std::fmt;

use mz_core::{AgentId, Segment, Tick};

/// The result of trying to enter a slot on one segment.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum EnterResult {
    /// The agent does not pass the slot's filters; the slot does not see it.
    Ignored,
    /// Entered (or may keep approaching).
    Success,
    /// Two hard claims overlap: both agents are inside at once.
    Conflict,
    /// A previously reported conflict is still going on.
    ConflictOngoing,
    /// Another session holds the segment; the agent must stop.
    Occupied,
    /// Still blocked as of last tick, but the segment was recorded so the
    /// order in which waiting agents get access can be resolved.
    OccupiedDiscover,
}

impl EnterResult {
    /// The agent should stop before the segment.
    #[inline]
    pub fn is_occupied(self) -> bool {
        matches!(self, EnterResult::Occupied | EnterResult::OccupiedDiscover)
    }

    /// Two agents physically overlap in the slot.  Happens when a predicted
    /// path changes suddenly or an agent appears inside the zone.
    #[inline]
    pub fn is_conflict(self) -> bool {
        matches!(self, EnterResult::Conflict | EnterResult::ConflictOngoing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EnterResult::Ignored          => "ignored",
            EnterResult::Success          => "success",
            EnterResult::Conflict         => "conflict",
            EnterResult::ConflictOngoing  => "conflict_ongoing",
            EnterResult::Occupied         => "occupied",
            EnterResult::OccupiedDiscover => "occupied_discover",
        }
    }
}

impl fmt::Display for EnterResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Details of a detected hard/hard overlap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConflictEvent {
    /// The agent whose enter attempt found the overlap.
    pub agent:     AgentId,
    /// The agent already holding the segment.
    pub crossed:   AgentId,
    pub slot_name: String,
    pub segment:   Segment,
    /// Global tick the overlap was (last) seen.
    pub tick:      Tick,
}

impl fmt::Display for ConflictEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} crossed {} in slot '{}' at {} ({})",
            self.agent, self.crossed, self.slot_name, self.segment, self.tick
        )
    }
}
