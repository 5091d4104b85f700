//! Plain data row types written by output backends.

use mz_arbiter::ConflictEvent;
use mz_core::Tick;
use mz_sim::{EnterEvent, TickSummary};

/// One enter attempt by one train on one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnterRow {
    pub tick:     u64,
    pub train:    u32,
    pub slot:     u32,
    pub x:        i32,
    pub y:        i32,
    pub z:        i32,
    /// `"full"` or `"smart"`.
    pub mode:     &'static str,
    pub hard:     bool,
    pub distance: u32,
    /// Snake-case `EnterResult` name.
    pub result:   &'static str,
}

impl EnterRow {
    pub fn new(tick: Tick, event: &EnterEvent) -> Self {
        Self {
            tick:     tick.0,
            train:    event.train.0,
            slot:     event.slot.0,
            x:        event.segment.x,
            y:        event.segment.y,
            z:        event.segment.z,
            mode:     event.mode.as_str(),
            hard:     event.hard,
            distance: event.distance,
            result:   event.result.as_str(),
        }
    }
}

/// A first-time overlap between two hard claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictRow {
    pub tick:      u64,
    pub train:     u32,
    pub crossed:   u32,
    pub slot_name: String,
    pub x:         i32,
    pub y:         i32,
    pub z:         i32,
}

impl From<&ConflictEvent> for ConflictRow {
    fn from(event: &ConflictEvent) -> Self {
        Self {
            tick:      event.tick.0,
            train:     event.agent.0,
            crossed:   event.crossed.0,
            slot_name: event.slot_name.clone(),
            x:         event.segment.x,
            y:         event.segment.y,
            z:         event.segment.z,
        }
    }
}

/// Summary statistics for one simulation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummaryRow {
    pub tick:          u64,
    pub running:       u64,
    pub moved:         u64,
    pub waiting:       u64,
    pub finished:      u64,
    pub conflicts:     u64,
    pub hard_sessions: u64,
}

impl From<&TickSummary> for TickSummaryRow {
    fn from(s: &TickSummary) -> Self {
        Self {
            tick:          s.tick.0,
            running:       s.running as u64,
            moved:         s.moved as u64,
            waiting:       s.waiting as u64,
            finished:      s.finished as u64,
            conflicts:     s.conflicts as u64,
            hard_sessions: s.hard_sessions as u64,
        }
    }
}
