//! Per-agent arbitration state and the arena that owns it.
//!
//! Sessions refer to each other (a winner remembers which soft sessions it
//! will knock out, the loser remembers who will knock it out).  Those edges
//! are [`SessionKey`]s into the owning slot's [`SessionArena`], never
//! references, and both directions are cleared together.

use mz_core::{AgentId, Segment, SlotId, Tick};

use crate::{AgentClock, ConflictEvent, OccupancyOracle, RailSlotMap};

// ── SessionKey ────────────────────────────────────────────────────────────────

/// Generational index of a session inside its slot's arena.
///
/// A key outlives the session it names; using it after the session was
/// released is detected through the generation and reported as stale.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct SessionKey {
    index:      u32,
    generation: u32,
}

// ── SessionHandle ─────────────────────────────────────────────────────────────

/// What [`track`][crate::MutexZoneSlot::track] hands back to the caller.
///
/// A handle with no key is the stub for a filtered-out agent; entering
/// through it always yields [`EnterResult::Ignored`][crate::EnterResult::Ignored].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct SessionHandle {
    pub agent: AgentId,
    pub slot:  SlotId,
    pub(crate) key: Option<SessionKey>,
}

impl SessionHandle {
    /// `true` for the stub returned to agents the slot's filters reject.
    #[inline]
    pub fn is_ignored(&self) -> bool {
        self.key.is_none()
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// One agent's standing in one slot.
#[derive(Debug)]
pub struct Session {
    pub(crate) agent:        AgentId,
    /// Counts as using (or about to use) the slot.
    pub(crate) active:       bool,
    /// Committed to crossing, not merely predicted.
    pub(crate) hard:         bool,
    /// Global tick `hard` was last set.
    pub(crate) hard_since:   Option<Tick>,
    pub(crate) distance:     f64,
    pub(crate) created_tick: Tick,
    pub(crate) probe_tick:   Tick,
    /// Local tick of the last failed enter.  `None` until the first one.
    pub(crate) blocked_tick: Option<Tick>,
    pub(crate) rails:        RailSlotMap,
    pub(crate) conflict:     Option<ConflictEvent>,

    /// Sessions this one knocks out when their agent next tracks.
    pub(crate) deactivates:    Vec<SessionKey>,
    /// Inverse of `deactivates`.
    pub(crate) deactivated_by: Vec<SessionKey>,
    /// Segment recorded as the reason when `deactivated_by` fires.
    pub(crate) deactivated_on: Option<Segment>,
}

impl Session {
    pub(crate) fn new(agent: AgentId, distance: f64, now: Tick) -> Self {
        Self {
            agent,
            active: true,
            hard: false,
            hard_since: None,
            distance,
            created_tick: now,
            probe_tick: now,
            blocked_tick: None,
            rails: RailSlotMap::new(),
            conflict: None,
            deactivates: Vec::new(),
            deactivated_by: Vec::new(),
            deactivated_on: None,
        }
    }

    #[inline]
    pub fn agent(&self) -> AgentId {
        self.agent
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn is_hard(&self) -> bool {
        self.hard
    }

    /// Closest approach reported since the session last became active.
    #[inline]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    #[inline]
    pub fn created_tick(&self) -> Tick {
        self.created_tick
    }

    #[inline]
    pub fn probe_tick(&self) -> Tick {
        self.probe_tick
    }

    /// Claims in this slot, including the remembered last path.
    #[inline]
    pub fn rails(&self) -> &RailSlotMap {
        &self.rails
    }

    /// Whether a full-locking segment is claimed.
    #[inline]
    pub fn is_occupied_fully(&self) -> bool {
        self.rails.is_full_locking()
    }

    /// The overlap recorded by the last conflicting enter, until a clean
    /// success clears it.
    #[inline]
    pub fn conflict(&self) -> Option<&ConflictEvent> {
        self.conflict.as_ref()
    }

    /// Ticks since creation on the agent's own clock.  Falls back to the last
    /// probe for agents that no longer exist.
    pub fn age(&self, clock: &dyn AgentClock) -> u64 {
        clock
            .local_tick(self.agent)
            .unwrap_or(self.probe_tick)
            .saturating_since(self.created_tick)
    }

    /// Map the local probe tick onto the global timeline.
    pub(crate) fn global_probe_tick(&self, clock: &dyn AgentClock, global: Tick) -> Tick {
        let behind = clock
            .local_tick(self.agent)
            .map_or(0, |now| now.saturating_since(self.probe_tick));
        global.saturating_rewind(behind)
    }

    pub(crate) fn was_blocked_last_tick(&self) -> bool {
        self.blocked_tick
            .is_some_and(|t| self.probe_tick.saturating_since(t) <= 1)
    }

    /// Whether this session still holds `segment`, either through a live
    /// full lock or a live claim on that segment.  Dead claims are evicted.
    pub(crate) fn contains_live(&mut self, segment: Segment, occupancy: &dyn OccupancyOracle) -> bool {
        let (agent, now) = (self.agent, self.probe_tick);
        self.rails.is_fully_locked_and_live(agent, now, occupancy)
            || self.rails.is_smart_locked_and_live(agent, now, segment, occupancy)
    }
}

// ── SessionArena ──────────────────────────────────────────────────────────────

#[derive(Debug)]
struct Entry {
    generation: u32,
    session:    Option<Session>,
    /// Temporarily moved out while its own enter call runs.
    taken:      bool,
}

/// Slot-owned storage for sessions.
///
/// Iteration follows insertion order, which is the order ties are broken in.
#[derive(Debug, Default)]
pub struct SessionArena {
    entries: Vec<Entry>,
    free:    Vec<u32>,
    order:   Vec<SessionKey>,
}

impl SessionArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn insert(&mut self, session: Session) -> SessionKey {
        let key = match self.free.pop() {
            Some(index) => {
                let entry = &mut self.entries[index as usize];
                entry.session = Some(session);
                SessionKey { index, generation: entry.generation }
            }
            None => {
                let index = self.entries.len() as u32;
                self.entries.push(Entry { generation: 0, session: Some(session), taken: false });
                SessionKey { index, generation: 0 }
            }
        };
        self.order.push(key);
        key
    }

    pub fn contains(&self, key: SessionKey) -> bool {
        self.entries
            .get(key.index as usize)
            .is_some_and(|e| e.generation == key.generation && (e.session.is_some() || e.taken))
    }

    pub fn get(&self, key: SessionKey) -> Option<&Session> {
        self.entries
            .get(key.index as usize)
            .filter(|e| e.generation == key.generation)
            .and_then(|e| e.session.as_ref())
    }

    pub fn get_mut(&mut self, key: SessionKey) -> Option<&mut Session> {
        self.entries
            .get_mut(key.index as usize)
            .filter(|e| e.generation == key.generation)
            .and_then(|e| e.session.as_mut())
    }

    /// Move a session out so it can be mutated alongside the others.  The
    /// key stays valid; put it back with [`restore`][Self::restore].
    pub fn take(&mut self, key: SessionKey) -> Option<Session> {
        let entry = self
            .entries
            .get_mut(key.index as usize)
            .filter(|e| e.generation == key.generation)?;
        let session = entry.session.take()?;
        entry.taken = true;
        Some(session)
    }

    pub fn restore(&mut self, key: SessionKey, session: Session) {
        if let Some(entry) = self
            .entries
            .get_mut(key.index as usize)
            .filter(|e| e.generation == key.generation && e.taken)
        {
            entry.session = Some(session);
            entry.taken = false;
        }
    }

    /// Release a session.  Its key, and any copy of it, turns stale.
    pub fn remove(&mut self, key: SessionKey) -> Option<Session> {
        let entry = self
            .entries
            .get_mut(key.index as usize)
            .filter(|e| e.generation == key.generation)?;
        let session = entry.session.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        entry.taken = false;
        self.free.push(key.index);
        self.order.retain(|k| *k != key);
        Some(session)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> &[SessionKey] {
        &self.order
    }

    /// Sessions in insertion order, skipping one that is currently taken.
    pub fn iter(&self) -> impl Iterator<Item = (SessionKey, &Session)> + '_ {
        self.order
            .iter()
            .filter_map(|&k| self.get(k).map(|s| (k, s)))
    }
}
