//! `TrackWorld`: the train set seen through the arbiter's collaborator traits.

use rustc_hash::{FxHashMap, FxHashSet};

use mz_arbiter::{AgentClock, FilterEvaluator, IndicatorSink, OccupancyOracle};
use mz_core::{AgentId, Segment, Tick, ZoneId};

use crate::Train;

/// All trains, addressable by id.
///
/// Only running trains have a clock or occupy track.  Pending and finished
/// trains look vanished to the arbiter.
#[derive(Default)]
pub struct TrackWorld {
    trains: Vec<Train>,
    by_id:  FxHashMap<AgentId, usize>,
}

impl TrackWorld {
    /// Trains are kept in ascending id order.
    pub(crate) fn new(mut trains: Vec<Train>) -> Self {
        trains.sort_by_key(|t| t.id);
        let by_id = trains.iter().enumerate().map(|(i, t)| (t.id, i)).collect();
        Self { trains, by_id }
    }

    pub fn train(&self, id: AgentId) -> Option<&Train> {
        self.by_id.get(&id).map(|&i| &self.trains[i])
    }

    pub fn trains(&self) -> &[Train] {
        &self.trains
    }

    pub(crate) fn trains_mut(&mut self) -> &mut [Train] {
        &mut self.trains
    }

    pub fn running(&self) -> impl Iterator<Item = &Train> + '_ {
        self.trains.iter().filter(|t| t.is_running())
    }

    pub fn running_count(&self) -> usize {
        self.running().count()
    }

    /// Trains standing on `segment`.
    pub fn trains_on(&self, segment: Segment) -> Vec<AgentId> {
        self.running()
            .filter(|t| t.occupied().contains(&segment))
            .map(|t| t.id)
            .collect()
    }

    fn running_train(&self, agent: AgentId) -> Option<&Train> {
        self.train(agent).filter(|t| t.is_running())
    }
}

impl AgentClock for TrackWorld {
    fn local_tick(&self, agent: AgentId) -> Option<Tick> {
        self.running_train(agent).map(|t| t.local_tick)
    }
}

impl OccupancyOracle for TrackWorld {
    fn segments_occupied_by(&self, agent: AgentId) -> Vec<Segment> {
        self.running_train(agent)
            .map(|t| t.occupied().to_vec())
            .unwrap_or_default()
    }

    fn is_occupying(&self, agent: AgentId, segment: Segment) -> bool {
        self.running_train(agent)
            .is_some_and(|t| t.occupied().contains(&segment))
    }
}

// ── TagFilter ─────────────────────────────────────────────────────────────────

/// Zone filters over train tags: `tag` admits trains carrying it, `!tag`
/// admits trains without it.
pub struct TagFilter<'a>(pub &'a TrackWorld);

impl FilterEvaluator for TagFilter<'_> {
    fn evaluate(&self, expression: &str, agent: AgentId) -> bool {
        let Some(train) = self.0.train(agent) else {
            return false;
        };
        match expression.strip_prefix('!') {
            Some(tag) => !train.has_tag(tag.trim()),
            None      => train.has_tag(expression),
        }
    }
}

// ── IndicatorLog ──────────────────────────────────────────────────────────────

/// Collects indicator changes during a tick so the loop can forward them to
/// its observer, and remembers which zones are lit.
#[derive(Default)]
pub struct IndicatorLog {
    lit:     FxHashSet<ZoneId>,
    pending: Vec<(Vec<ZoneId>, bool)>,
}

impl IndicatorLog {
    pub fn is_lit(&self, zone: ZoneId) -> bool {
        self.lit.contains(&zone)
    }

    /// Lit zones, ascending.
    pub fn lit_zones(&self) -> Vec<ZoneId> {
        let mut zones: Vec<ZoneId> = self.lit.iter().copied().collect();
        zones.sort_unstable();
        zones
    }

    pub(crate) fn drain(&mut self) -> std::vec::Drain<'_, (Vec<ZoneId>, bool)> {
        self.pending.drain(..)
    }
}

impl IndicatorSink for IndicatorLog {
    fn set_indicator(&mut self, zones: &[ZoneId], on: bool) {
        for &zone in zones {
            if on {
                self.lit.insert(zone);
            } else {
                self.lit.remove(&zone);
            }
        }
        self.pending.push((zones.to_vec(), on));
    }
}
