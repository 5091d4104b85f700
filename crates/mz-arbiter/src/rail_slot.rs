//! Per-segment claim records and the map a session keeps of them.
//!
//! # Claimed vs. remembered
//!
//! A `RailSlotMap` separates "which segments do I currently claim" from
//! "which segments did I last walk through".  Releasing the claims after a
//! lost arbitration (`clear_conflict`) drops every claim at once but keeps the
//! remembered path around for diagnostics until the next `add` starts a fresh
//! attempt.
//!
//! # Liveness
//!
//! A claim confirmed on the owner's current probe tick is live by
//! definition.  An older claim is live only while the occupancy oracle still
//! shows the owner on that segment; otherwise it is evicted on the spot.
//! This is how agents that vanish without releasing stop blocking others.

use rustc_hash::FxHashMap;

use mz_core::{AgentId, LockMode, Segment, Tick};

use crate::OccupancyOracle;

// ── RailSlot ──────────────────────────────────────────────────────────────────

/// A single segment claimed within a slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RailSlot {
    segment:     Segment,
    mode:        LockMode,
    last_probed: Tick,
    /// Claim order within the current attempt.
    seq:         u32,
}

impl RailSlot {
    fn new(segment: Segment, seq: u32) -> Self {
        Self { segment, mode: LockMode::Smart, last_probed: Tick::ZERO, seq }
    }

    /// A `Full` claim sticks: once any zone locked this segment fully, later
    /// smart claims do not downgrade it.
    fn probe(&mut self, mode: LockMode, now: Tick) {
        if mode.is_full() {
            self.mode = LockMode::Full;
        }
        self.last_probed = now;
    }

    #[inline]
    pub fn segment(&self) -> Segment {
        self.segment
    }

    /// The strongest lock mode that claimed this segment.
    #[inline]
    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// Whether this claim locks the whole slot.
    #[inline]
    pub fn is_full_locking(&self) -> bool {
        self.mode.is_full()
    }

    /// Owner-local tick of the last confirmation.
    #[inline]
    pub fn last_probed(&self) -> Tick {
        self.last_probed
    }
}

impl std::fmt::Display for RailSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.segment, self.mode)
    }
}

// ── RailSlotMap ───────────────────────────────────────────────────────────────

/// The segments one session claims in one slot.
#[derive(Debug, Default)]
pub struct RailSlotMap {
    live:     FxHashMap<Segment, RailSlot>,
    /// Subset of `live` that locks the whole slot.
    full:     Vec<Segment>,
    /// `false` after a forced release until the next `add`.
    claimed:  bool,
    /// The segment whose loss caused the last forced release.
    conflict: Option<RailSlot>,
    next_seq: u32,
}

impl RailSlotMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any claimed segment locks the whole slot.
    #[inline]
    pub fn is_full_locking(&self) -> bool {
        !self.full.is_empty()
    }

    /// Number of currently claimed segments.
    pub fn len(&self) -> usize {
        if self.claimed { self.live.len() } else { 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` if `segment` is currently claimed (liveness not checked).
    pub fn contains(&self, segment: Segment) -> bool {
        self.claimed && self.live.contains_key(&segment)
    }

    /// Currently claimed segments in claim order.
    pub fn claimed_segments(&self) -> Vec<Segment> {
        if !self.claimed {
            return Vec::new();
        }
        self.ordered().into_iter().map(|s| s.segment).collect()
    }

    /// Register or refresh a claim on `segment`.
    ///
    /// Returns `true` only when the segment was not claimed before.  The first
    /// `add` after a forced release starts a fresh attempt and forgets the
    /// remembered path.
    pub fn add(&mut self, mode: LockMode, segment: Segment, now: Tick) -> bool {
        if !self.claimed {
            self.claimed = true;
            self.live.clear();
            self.conflict = None;
            self.next_seq = 0;
        }

        let seq = self.next_seq;
        let mut added = false;
        let slot = self.live.entry(segment).or_insert_with(|| {
            added = true;
            RailSlot::new(segment, seq)
        });
        let was_full = slot.is_full_locking();
        slot.probe(mode, now);
        let is_full = slot.is_full_locking();

        if added {
            self.next_seq += 1;
        }
        if !was_full && is_full {
            self.full.push(segment);
        }
        added
    }

    /// Drop one claim.  Returns `false` if it was not claimed.
    pub fn remove(&mut self, segment: Segment) -> bool {
        if !self.claimed {
            return false;
        }
        match self.live.remove(&segment) {
            Some(slot) => {
                if slot.is_full_locking() {
                    self.full.retain(|s| *s != segment);
                }
                true
            }
            None => false,
        }
    }

    /// `true` if a full-locking claim is still live.
    ///
    /// Full-locking claims found dead along the way are evicted, which may
    /// release the whole slot.
    pub fn is_fully_locked_and_live(
        &mut self,
        agent:     AgentId,
        now:       Tick,
        occupancy: &dyn OccupancyOracle,
    ) -> bool {
        while let Some(&segment) = self.full.first() {
            let probed_now = self.live.get(&segment).is_some_and(|s| s.last_probed == now);
            if probed_now || occupancy.is_occupying(agent, segment) {
                return true;
            }
            self.live.remove(&segment);
            self.full.remove(0);
        }
        false
    }

    /// `true` if `segment` itself is claimed and still live.  A dead claim is
    /// evicted.
    pub fn is_smart_locked_and_live(
        &mut self,
        agent:     AgentId,
        now:       Tick,
        segment:   Segment,
        occupancy: &dyn OccupancyOracle,
    ) -> bool {
        if !self.claimed {
            return false;
        }
        let Some(slot) = self.live.get(&segment) else {
            return false;
        };
        if slot.last_probed == now {
            return true;
        }
        // The tail of the agent leaving a segment shows up here.
        if occupancy.is_occupying(agent, segment) {
            return true;
        }
        self.remove(segment);
        false
    }

    /// Evict claims the agent no longer physically occupies, stopping at the
    /// first one it still does.  Returns whether any claim survives.
    pub fn verify_any_segment_still_used(
        &mut self,
        agent:     AgentId,
        occupancy: &dyn OccupancyOracle,
    ) -> bool {
        if !self.claimed {
            return false;
        }
        for segment in self.claimed_segments() {
            if occupancy.is_occupying(agent, segment) {
                return true;
            }
            self.remove(segment);
        }
        false
    }

    /// Release every claim at once, remembering `conflict_segment` (if it was
    /// claimed) as the reason.  Diagnostics only.
    pub fn clear_conflict(&mut self, conflict_segment: Option<Segment>) {
        let previous = self.conflict.take();
        self.claimed = false;
        self.full.clear();
        self.conflict = conflict_segment
            .and_then(|segment| self.live.remove(&segment))
            .or(previous);
    }

    /// Drop claims not confirmed since `now`, so they are checked again from
    /// scratch.
    pub fn clear_old_rails(&mut self, now: Tick) {
        if !self.claimed {
            return;
        }
        let stale: Vec<Segment> = self
            .live
            .values()
            .filter(|s| s.last_probed < now)
            .map(|s| s.segment)
            .collect();
        for segment in stale {
            self.remove(segment);
        }
    }

    /// The last attempted path through the slot, in claim order.  After a
    /// forced release the segment that caused it comes last.
    pub fn last_path(&self) -> Vec<RailSlot> {
        let mut path = self.ordered();
        path.extend(self.conflict);
        path
    }

    /// The segment that caused the last forced release.
    pub fn conflict_segment(&self) -> Option<Segment> {
        self.conflict.map(|s| s.segment)
    }

    fn ordered(&self) -> Vec<RailSlot> {
        let mut slots: Vec<RailSlot> = self.live.values().copied().collect();
        slots.sort_unstable_by_key(|s| s.seq);
        slots
    }
}
