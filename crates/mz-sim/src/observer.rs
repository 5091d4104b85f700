//! Simulation observer trait for progress reporting and data collection.

use tracing::{debug, info, trace, warn};

use mz_arbiter::{ConflictEvent, EnterResult};
use mz_core::{AgentId, LockMode, Segment, SlotId, Tick, ZoneId};

/// One `enter` call made by the tick loop.
#[derive(Clone, Debug, PartialEq)]
pub struct EnterEvent {
    pub train:    AgentId,
    pub slot:     SlotId,
    pub segment:  Segment,
    pub mode:     LockMode,
    pub hard:     bool,
    /// Segments between the train's head and the slot.
    pub distance: u32,
    pub result:   EnterResult,
}

/// Per-tick totals handed to [`SimObserver::on_tick_end`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub tick:          Tick,
    /// Trains on the track after this tick's moves.
    pub running:       usize,
    pub moved:         usize,
    /// Trains held in front of an occupied zone.
    pub waiting:       usize,
    pub finished:      usize,
    /// First-time conflicts reported this tick.
    pub conflicts:     usize,
    /// Active hard sessions across all slots.
    pub hard_sessions: usize,
}

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] at key points in the
/// tick loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
pub trait SimObserver {
    /// Called at the very start of each tick, before any processing.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called for every segment a train enters or tries to enter.
    fn on_enter(&mut self, _tick: Tick, _event: &EnterEvent) {}

    /// Called when a train first crosses into another train's claim.
    fn on_conflict(&mut self, _tick: Tick, _event: &ConflictEvent) {}

    /// Called when zone indicators change.
    fn on_indicator(&mut self, _tick: Tick, _zones: &[ZoneId], _on: bool) {}

    /// Called when a train runs off the end of its route.
    fn on_train_finished(&mut self, _tick: Tick, _train: AgentId) {}

    /// Called at the end of each tick.
    fn on_tick_end(&mut self, _tick: Tick, _summary: &TickSummary) {}

    /// Called once after the final tick completes.
    fn on_sim_end(&mut self, _final_tick: Tick) {}
}

/// A [`SimObserver`] that does nothing.  Use when you need to call `run` but
/// don't want progress callbacks.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

/// Forwards every hook to `tracing`.
///
/// Tick summaries go out at `info` every `interval` ticks (0 disables them),
/// conflicts at `warn`, indicator changes and finished trains at `debug`,
/// individual enters at `trace`.
pub struct TracingObserver {
    pub interval: u64,
}

impl TracingObserver {
    pub fn new(interval: u64) -> Self {
        Self { interval }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new(10)
    }
}

impl SimObserver for TracingObserver {
    fn on_enter(&mut self, tick: Tick, event: &EnterEvent) {
        trace!(
            %tick,
            train = %event.train,
            slot = %event.slot,
            segment = %event.segment,
            hard = event.hard,
            result = %event.result,
            "enter",
        );
    }

    fn on_conflict(&mut self, tick: Tick, event: &ConflictEvent) {
        warn!(%tick, "{event}");
    }

    fn on_indicator(&mut self, tick: Tick, zones: &[ZoneId], on: bool) {
        debug!(%tick, zones = zones.len(), on, "indicator");
    }

    fn on_train_finished(&mut self, tick: Tick, train: AgentId) {
        debug!(%tick, %train, "train finished");
    }

    fn on_tick_end(&mut self, tick: Tick, summary: &TickSummary) {
        if self.interval > 0 && tick.0.is_multiple_of(self.interval) {
            info!(
                %tick,
                running = summary.running,
                moved = summary.moved,
                waiting = summary.waiting,
                hard_sessions = summary.hard_sessions,
                "tick",
            );
        }
    }

    fn on_sim_end(&mut self, final_tick: Tick) {
        info!(%final_tick, "simulation finished");
    }
}
