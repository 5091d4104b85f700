//! Unit tests for mz-arbiter.

use std::collections::HashMap;

use mz_core::{AgentId, ArbiterConfig, LockMode, Segment, SlotId, Tick, ZoneId};
use mz_zone::{ZoneDecl, ZoneError};

use crate::{
    filters_match, AgentClock, ArbiterContext, ArbiterError, ArbiterResult, EnterResult,
    FilterEvaluator, IndicatorSink, MutexZoneSlot, OccupancyOracle, RailSlotMap, SessionHandle,
    SlotRegistry,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const S0: Segment = Segment::new(0, 0, 0);
const S1: Segment = Segment::new(1, 0, 0);
const S2: Segment = Segment::new(2, 0, 0);
const FIRST: SlotId = SlotId(0);

const A: AgentId = AgentId(1);
const B: AgentId = AgentId(2);
const C: AgentId = AgentId(3);

/// Agent clocks and physical positions.
#[derive(Default)]
struct World {
    clocks:   HashMap<AgentId, Tick>,
    occupied: HashMap<AgentId, Vec<Segment>>,
}

impl AgentClock for World {
    fn local_tick(&self, agent: AgentId) -> Option<Tick> {
        self.clocks.get(&agent).copied()
    }
}

impl OccupancyOracle for World {
    fn segments_occupied_by(&self, agent: AgentId) -> Vec<Segment> {
        self.occupied.get(&agent).cloned().unwrap_or_default()
    }
}

/// `tag` passes agents carrying the tag, `!tag` those without it.
#[derive(Default)]
struct Tags(HashMap<AgentId, Vec<&'static str>>);

impl FilterEvaluator for Tags {
    fn evaluate(&self, expression: &str, agent: AgentId) -> bool {
        let (negate, tag) = match expression.strip_prefix('!') {
            Some(tag) => (true, tag),
            None      => (false, expression),
        };
        let has = self.0.get(&agent).is_some_and(|tags| tags.iter().any(|t| *t == tag));
        has != negate
    }
}

/// Records every indicator call.
#[derive(Default)]
struct Lamp {
    calls: Vec<(Vec<ZoneId>, bool)>,
}

impl Lamp {
    fn count(&self, on: bool) -> usize {
        self.calls.iter().filter(|(_, state)| *state == on).count()
    }
}

impl IndicatorSink for Lamp {
    fn set_indicator(&mut self, zones: &[ZoneId], on: bool) {
        self.calls.push((zones.to_vec(), on));
    }
}

/// A registry plus the world around it.  Every agent's local clock runs in
/// step with the global tick unless a test moves it.
struct Harness {
    registry: SlotRegistry,
    world:    World,
    tags:     Tags,
    lamp:     Lamp,
    tick:     Tick,
}

impl Harness {
    fn new(decls: impl IntoIterator<Item = ZoneDecl>) -> Self {
        let mut registry = SlotRegistry::new(ArbiterConfig::default()).unwrap();
        for decl in decls {
            registry.add_zone(decl).unwrap();
        }
        Self {
            registry,
            world: World::default(),
            tags:  Tags::default(),
            lamp:  Lamp::default(),
            tick:  Tick::ZERO,
        }
    }

    /// One Full zone named "X" covering S0.
    fn full() -> Self {
        Self::new([ZoneDecl::new(S0, S0, LockMode::Full).named("X")])
    }

    /// One Smart zone covering S0..=S2.
    fn smart() -> Self {
        Self::new([ZoneDecl::new(S0, S2, LockMode::Smart).named("S")])
    }

    fn spawn(&mut self, agents: &[AgentId]) {
        for &agent in agents {
            self.world.clocks.insert(agent, self.tick);
        }
    }

    fn vanish(&mut self, agent: AgentId) {
        self.world.clocks.remove(&agent);
        self.world.occupied.remove(&agent);
    }

    /// Next global tick: every clock advances, then the sweep runs.
    fn advance(&mut self) {
        self.tick += 1;
        for clock in self.world.clocks.values_mut() {
            *clock += 1;
        }
        let mut ctx = ArbiterContext::new(self.tick, &self.world, &self.world, &self.tags, &mut self.lamp);
        self.registry.on_tick(&mut ctx);
    }

    fn advance_to(&mut self, tick: u64) {
        while self.tick.0 < tick {
            self.advance();
        }
    }

    fn try_track(&mut self, slot: SlotId, agent: AgentId, distance: f64) -> ArbiterResult<SessionHandle> {
        let mut ctx = ArbiterContext::new(self.tick, &self.world, &self.world, &self.tags, &mut self.lamp);
        self.registry.slot_mut(slot)?.track(&mut ctx, agent, distance)
    }

    fn track(&mut self, agent: AgentId, distance: f64) -> SessionHandle {
        self.try_track(FIRST, agent, distance).unwrap()
    }

    fn try_enter(
        &mut self,
        slot:    SlotId,
        handle:  &SessionHandle,
        mode:    LockMode,
        segment: Segment,
        hard:    bool,
    ) -> ArbiterResult<EnterResult> {
        let mut ctx = ArbiterContext::new(self.tick, &self.world, &self.world, &self.tags, &mut self.lamp);
        self.registry.slot_mut(slot)?.enter(&mut ctx, handle, mode, segment, hard)
    }

    fn enter(&mut self, handle: &SessionHandle, mode: LockMode, segment: Segment, hard: bool) -> EnterResult {
        self.try_enter(FIRST, handle, mode, segment, hard).unwrap()
    }

    /// `track` followed by a single `enter`.
    fn step(&mut self, agent: AgentId, mode: LockMode, segment: Segment, hard: bool) -> EnterResult {
        let handle = self.track(agent, 1.0);
        self.enter(&handle, mode, segment, hard)
    }

    fn slot(&self) -> &MutexZoneSlot {
        self.registry.slot(FIRST).unwrap()
    }
}

// ── RailSlotMap ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod rail_slot_map {
    use super::*;

    #[test]
    fn add_reports_only_new_segments() {
        let mut map = RailSlotMap::new();
        assert!(map.add(LockMode::Smart, S0, Tick(1)));
        assert!(!map.add(LockMode::Smart, S0, Tick(2)));
        assert!(map.add(LockMode::Smart, S1, Tick(2)));
        assert_eq!(map.len(), 2);
        assert_eq!(map.claimed_segments(), vec![S0, S1]);
    }

    #[test]
    fn full_claim_locks_whole_map_and_sticks() {
        let mut map = RailSlotMap::new();
        map.add(LockMode::Smart, S0, Tick(1));
        assert!(!map.is_full_locking());

        map.add(LockMode::Full, S0, Tick(2));
        assert!(map.is_full_locking());

        // A later smart probe does not downgrade it.
        map.add(LockMode::Smart, S0, Tick(3));
        assert!(map.is_full_locking());
        assert_eq!(map.last_path()[0].mode(), LockMode::Full);
    }

    #[test]
    fn full_lock_is_live_when_probed_this_tick() {
        let world = World::default();
        let mut map = RailSlotMap::new();
        map.add(LockMode::Full, S0, Tick(4));
        assert!(map.is_fully_locked_and_live(A, Tick(4), &world));
    }

    #[test]
    fn stale_full_lock_survives_while_occupied() {
        let mut world = World::default();
        world.occupied.insert(A, vec![S0]);
        let mut map = RailSlotMap::new();
        map.add(LockMode::Full, S0, Tick(4));
        assert!(map.is_fully_locked_and_live(A, Tick(9), &world));
        assert!(map.contains(S0));
    }

    #[test]
    fn stale_full_lock_is_evicted_when_agent_left() {
        let world = World::default();
        let mut map = RailSlotMap::new();
        map.add(LockMode::Full, S0, Tick(4));
        assert!(!map.is_fully_locked_and_live(A, Tick(9), &world));
        assert!(!map.is_full_locking());
        assert!(!map.contains(S0));
    }

    #[test]
    fn smart_lock_checks_single_segment() {
        let mut world = World::default();
        world.occupied.insert(A, vec![S1]);
        let mut map = RailSlotMap::new();
        map.add(LockMode::Smart, S0, Tick(1));
        map.add(LockMode::Smart, S1, Tick(1));

        assert!(map.is_smart_locked_and_live(A, Tick(1), S0, &world));
        assert!(!map.is_smart_locked_and_live(A, Tick(1), S2, &world));

        // Tail left S0 but still sits on S1.
        assert!(!map.is_smart_locked_and_live(A, Tick(3), S0, &world));
        assert!(map.is_smart_locked_and_live(A, Tick(3), S1, &world));
        assert_eq!(map.claimed_segments(), vec![S1]);
    }

    #[test]
    fn verify_stops_at_first_used_segment() {
        let mut world = World::default();
        world.occupied.insert(A, vec![S1]);
        let mut map = RailSlotMap::new();
        map.add(LockMode::Smart, S0, Tick(1));
        map.add(LockMode::Smart, S1, Tick(1));
        map.add(LockMode::Smart, S2, Tick(1));

        assert!(map.verify_any_segment_still_used(A, &world));
        assert_eq!(map.claimed_segments(), vec![S1, S2]);

        world.occupied.clear();
        assert!(!map.verify_any_segment_still_used(A, &world));
        assert!(map.is_empty());
    }

    #[test]
    fn clear_conflict_releases_and_remembers_cause() {
        let mut map = RailSlotMap::new();
        map.add(LockMode::Full, S0, Tick(1));
        map.add(LockMode::Full, S1, Tick(1));

        map.clear_conflict(Some(S1));
        assert!(map.is_empty());
        assert!(!map.is_full_locking());
        assert_eq!(map.conflict_segment(), Some(S1));

        let path: Vec<Segment> = map.last_path().iter().map(|s| s.segment()).collect();
        assert_eq!(path, vec![S0, S1]);
    }

    #[test]
    fn clear_conflict_keeps_previous_cause_for_unclaimed_segment() {
        let mut map = RailSlotMap::new();
        map.add(LockMode::Smart, S0, Tick(1));
        map.clear_conflict(Some(S0));
        map.clear_conflict(Some(S2));
        assert_eq!(map.conflict_segment(), Some(S0));
    }

    #[test]
    fn add_after_release_starts_fresh_attempt() {
        let mut map = RailSlotMap::new();
        map.add(LockMode::Smart, S0, Tick(1));
        map.clear_conflict(Some(S0));

        assert!(map.add(LockMode::Smart, S2, Tick(2)));
        assert_eq!(map.conflict_segment(), None);
        assert_eq!(map.claimed_segments(), vec![S2]);
    }

    #[test]
    fn clear_old_rails_drops_unconfirmed() {
        let mut map = RailSlotMap::new();
        map.add(LockMode::Full, S0, Tick(1));
        map.add(LockMode::Smart, S1, Tick(2));
        map.clear_old_rails(Tick(2));
        assert_eq!(map.claimed_segments(), vec![S1]);
        assert!(!map.is_full_locking());
    }
}

// ── Filters ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod filters {
    use super::*;

    fn tags() -> Tags {
        let mut tags = Tags::default();
        tags.0.insert(A, vec!["express"]);
        tags.0.insert(B, vec!["freight"]);
        tags
    }

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_list_matches_everyone() {
        assert!(filters_match(&[], C, &tags()));
    }

    #[test]
    fn plain_and_ampersand_are_and() {
        let t = tags();
        assert!(filters_match(&list(&["express"]), A, &t));
        assert!(!filters_match(&list(&["express", "&freight"]), A, &t));
        assert!(filters_match(&list(&["express", "&!freight"]), A, &t));
    }

    #[test]
    fn pipe_is_or() {
        let t = tags();
        let l = list(&["express", "|freight"]);
        assert!(filters_match(&l, A, &t));
        assert!(filters_match(&l, B, &t));
        assert!(!filters_match(&l, C, &t));
    }

    #[test]
    fn blank_entries_are_skipped() {
        assert!(filters_match(&list(&["  ", ""]), C, &tags()));
    }
}

// ── Full mode ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod full_mode {
    use super::*;

    #[test]
    fn incumbent_keeps_zone_until_released() {
        let mut h = Harness::full();
        let zone = ZoneId(0);
        h.spawn(&[A, B]);

        h.advance_to(1);
        let a = h.track(A, 5.0);
        assert_eq!(h.enter(&a, LockMode::Full, S0, true), EnterResult::Success);
        assert_eq!(h.lamp.calls, vec![(vec![zone], true)]);

        h.advance_to(2);
        let b = h.track(B, 3.0);
        assert_eq!(h.enter(&b, LockMode::Full, S0, true), EnterResult::Occupied);
        assert_eq!(h.slot().current_sessions(), vec![A]);

        // A stops calling enter; its session outlives the idle window.
        h.advance_to(6);
        assert!(h.slot().session(A).is_some());
        assert_eq!(h.lamp.count(false), 0);

        h.advance_to(7);
        assert!(h.slot().session(A).is_none());
        assert_eq!(h.lamp.calls.last(), Some(&(vec![zone], false)));

        let b = h.track(B, 3.0);
        assert_eq!(h.enter(&b, LockMode::Full, S0, true), EnterResult::Success);
        assert_eq!(h.slot().current_sessions(), vec![B]);
        assert_eq!(h.lamp.count(true), 2);
    }

    #[test]
    fn fairness_window_protects_incumbent() {
        let mut h = Harness::full();
        h.spawn(&[A, B]);

        assert_eq!(h.step(A, LockMode::Full, S0, false), EnterResult::Success);
        h.advance_to(1);
        assert_eq!(h.step(A, LockMode::Full, S0, true), EnterResult::Success);

        h.advance_to(2);
        assert!(h.step(B, LockMode::Full, S0, true).is_occupied());

        for tick in 3..=5 {
            h.advance_to(tick);
            assert_eq!(h.step(A, LockMode::Full, S0, true), EnterResult::Success);
            assert!(h.step(B, LockMode::Full, S0, true).is_occupied(), "tick {tick}");
            assert!(h.step(B, LockMode::Full, S0, false).is_occupied(), "tick {tick}");
        }
    }

    #[test]
    fn at_most_one_hard_session() {
        let mut h = Harness::full();
        h.spawn(&[A, B, C]);
        for tick in 1..=10 {
            h.advance_to(tick);
            for agent in [A, B, C] {
                h.step(agent, LockMode::Full, S0, true);
            }
            let hard = h.slot().sessions().filter(|s| s.is_hard()).count();
            assert!(hard <= 1, "tick {tick}: {hard} hard sessions");
        }
        assert_eq!(h.slot().current_sessions(), vec![A]);
    }

    #[test]
    fn waiting_session_gets_discover_then_success() {
        let mut h = Harness::full();
        h.spawn(&[A, B]);
        h.advance_to(1);
        h.step(A, LockMode::Full, S0, true);
        h.advance_to(2);
        assert_eq!(h.step(B, LockMode::Full, S0, true), EnterResult::Occupied);

        // A vanishes; its session is dropped on the next sweep.
        h.vanish(A);
        h.advance_to(3);
        assert!(h.slot().session(A).is_none());

        // Blocked last tick: the first clean enter only discovers.
        assert_eq!(h.step(B, LockMode::Full, S0, true), EnterResult::OccupiedDiscover);
        h.advance_to(4);
        assert_eq!(h.step(B, LockMode::Full, S0, true), EnterResult::Success);
    }

    #[test]
    fn release_fires_indicator_once() {
        let mut h = Harness::full();
        h.spawn(&[A]);
        h.advance_to(1);
        h.step(A, LockMode::Full, S0, true);

        let mut removals = 0;
        for tick in 2..=20 {
            let before = h.slot().session_count();
            h.advance_to(tick);
            removals += before - h.slot().session_count();
        }
        assert_eq!(removals, 1);
        assert_eq!(h.lamp.count(true), 1);
        assert_eq!(h.lamp.count(false), 1);
    }

    #[test]
    fn occupied_agent_keeps_session_past_idle_window() {
        let mut h = Harness::full();
        h.spawn(&[A, B]);
        h.world.occupied.insert(A, vec![S0]);
        h.advance_to(1);
        h.step(A, LockMode::Full, S0, true);

        h.advance_to(12);
        assert_eq!(h.slot().current_sessions(), vec![A]);
        assert!(h.step(B, LockMode::Full, S0, true).is_occupied());
        // Re-verified at tick 7, the first sweep past the idle window.
        assert_eq!(h.slot().session(A).unwrap().probe_tick(), Tick(7));
    }

    #[test]
    fn distance_keeps_closest_approach_while_active() {
        let mut h = Harness::full();
        h.spawn(&[A, B]);
        h.track(A, 8.0);
        h.track(A, 3.0);
        h.track(A, 6.0);
        assert_eq!(h.slot().session(A).unwrap().distance(), 3.0);

        // Once deactivated the next track replaces it outright.
        h.advance_to(1);
        h.step(B, LockMode::Full, S0, true);
        h.advance_to(2);
        let a = h.track(A, 7.0);
        assert!(h.enter(&a, LockMode::Full, S0, true).is_occupied());
        h.track(A, 9.0);
        assert_eq!(h.slot().session(A).unwrap().distance(), 9.0);
    }
}

// ── Soft claims ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod soft_claims {
    use super::*;

    #[test]
    fn soft_claim_loses_to_older_hard_claim() {
        let mut h = Harness::full();
        h.spawn(&[A, B]);
        h.track(A, 10.0);

        h.advance_to(1);
        assert_eq!(h.step(B, LockMode::Full, S0, false), EnterResult::Success);
        assert_eq!(h.step(A, LockMode::Full, S0, true), EnterResult::Success);
        assert_eq!(h.slot().current_sessions(), vec![A]);
        assert_eq!(h.slot().prospective_sessions(), vec![A, B]);

        // The knock-out lands when B next tracks.
        h.advance_to(2);
        assert!(h.step(B, LockMode::Full, S0, false).is_occupied());
        assert_eq!(h.slot().prospective_sessions(), vec![A]);
        assert!(h.slot().session(B).unwrap().deactivated_by.is_empty());
        assert!(h.slot().session(A).unwrap().deactivates.is_empty());
    }

    #[test]
    fn committed_session_keeps_segment_against_older_soft_claim() {
        let mut h = Harness::smart();
        h.spawn(&[B]);
        h.advance_to(1);
        assert_eq!(h.step(B, LockMode::Smart, S1, false), EnterResult::Success);

        h.advance_to(2);
        h.spawn(&[C]);
        let c = h.track(C, 0.0);
        assert_eq!(h.enter(&c, LockMode::Smart, S0, true), EnterResult::Success);
        // C is younger, but already inside.
        assert_eq!(h.enter(&c, LockMode::Smart, S1, true), EnterResult::Success);
        assert!(h.slot().session(C).unwrap().is_hard());
        assert_eq!(h.slot().current_sessions(), vec![C]);
        assert_eq!(h.slot().session(B).unwrap().deactivated_by.len(), 1);

        h.advance_to(3);
        assert!(h.step(B, LockMode::Smart, S1, false).is_occupied());
        assert_eq!(h.slot().prospective_sessions(), vec![C]);
    }

    #[test]
    fn younger_claim_not_yet_inside_yields_to_older_soft_claim() {
        let mut h = Harness::smart();
        h.spawn(&[B]);
        h.advance_to(1);
        assert_eq!(h.step(B, LockMode::Smart, S1, false), EnterResult::Success);

        h.advance_to(2);
        h.spawn(&[C]);
        assert_eq!(h.step(C, LockMode::Smart, S1, true), EnterResult::Occupied);
        assert!(!h.slot().session(C).unwrap().is_hard());
        assert!(h.slot().current_sessions().is_empty());
        assert_eq!(h.slot().prospective_sessions(), vec![B]);
    }

    #[test]
    fn soft_claim_blocks_younger_soft_claim() {
        let mut h = Harness::full();
        h.spawn(&[A, B]);
        h.advance_to(1);
        assert_eq!(h.step(A, LockMode::Full, S0, false), EnterResult::Success);
        assert_eq!(h.step(B, LockMode::Full, S0, false), EnterResult::Occupied);
        assert_eq!(h.slot().prospective_sessions(), vec![A]);
        assert!(h.slot().current_sessions().is_empty());
    }
}

// ── Smart mode ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod smart_mode {
    use super::*;

    #[test]
    fn disjoint_claims_cross_together() {
        let mut h = Harness::smart();
        h.spawn(&[A, B]);
        h.advance_to(1);
        assert_eq!(h.step(A, LockMode::Smart, S0, true), EnterResult::Success);
        assert_eq!(h.step(B, LockMode::Smart, S1, true), EnterResult::Success);
        assert_eq!(h.slot().current_sessions(), vec![A, B]);
        // One indicator update for the whole slot.
        assert_eq!(h.lamp.count(true), 1);
    }

    #[test]
    fn overlapping_claim_is_occupied_but_discovers_rest_of_path() {
        let mut h = Harness::smart();
        h.spawn(&[A, B]);
        h.advance_to(1);
        h.step(A, LockMode::Smart, S0, true);

        h.advance_to(2);
        let b = h.track(B, 1.0);
        assert_eq!(h.enter(&b, LockMode::Smart, S0, true), EnterResult::Occupied);
        assert_eq!(h.enter(&b, LockMode::Smart, S1, true), EnterResult::OccupiedDiscover);

        let session = h.slot().session(B).unwrap();
        assert!(!session.is_hard());
        assert_eq!(session.rails().claimed_segments(), vec![S1]);
        assert_eq!(session.rails().conflict_segment(), None);
    }

    #[test]
    fn hard_claims_stay_disjoint() {
        let mut h = Harness::smart();
        h.spawn(&[A, B]);
        let paths = [(A, [S0, S1]), (B, [S1, S2])];
        for tick in 1..=8 {
            h.advance_to(tick);
            for (agent, path) in paths {
                let handle = h.track(agent, 0.0);
                for segment in path {
                    h.enter(&handle, LockMode::Smart, segment, true);
                }
            }
            let hard: Vec<Vec<Segment>> = h
                .slot()
                .sessions()
                .filter(|s| s.is_hard() && s.is_active())
                .map(|s| s.rails().claimed_segments())
                .collect();
            if let [first, second] = hard.as_slice() {
                assert!(first.iter().all(|s| !second.contains(s)), "tick {tick}");
            }
        }
    }

    #[test]
    fn older_waiter_keeps_its_turn_within_grace_window() {
        let mut h = Harness::smart();
        h.spawn(&[A, B]);
        h.world.occupied.insert(A, vec![S0]);

        h.advance_to(1);
        h.step(A, LockMode::Smart, S0, true);
        h.advance_to(2);
        let b = h.track(B, 1.0);
        h.enter(&b, LockMode::Smart, S0, true);
        assert_eq!(h.enter(&b, LockMode::Smart, S1, true), EnterResult::OccupiedDiscover);

        h.advance_to(3);
        h.spawn(&[C]);
        assert_eq!(h.step(C, LockMode::Smart, S1, true), EnterResult::Occupied);
    }

    #[test]
    fn newcomer_passes_waiter_after_grace_window() {
        let mut h = Harness::smart();
        h.spawn(&[A, B]);
        h.world.occupied.insert(A, vec![S0]);

        h.advance_to(1);
        h.step(A, LockMode::Smart, S0, true);
        for tick in 2..=8 {
            h.advance_to(tick);
            let b = h.track(B, 1.0);
            assert!(h.enter(&b, LockMode::Smart, S0, true).is_occupied());
            assert_eq!(h.enter(&b, LockMode::Smart, S1, true), EnterResult::OccupiedDiscover);
        }

        h.spawn(&[C]);
        assert_eq!(h.step(C, LockMode::Smart, S1, true), EnterResult::Success);
    }
}

// ── Conflicts ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod conflicts {
    use super::*;

    #[test]
    fn simultaneous_hard_enter_reports_conflict_then_ongoing() {
        let mut h = Harness::full();
        h.spawn(&[A, B]);
        h.advance_to(1);
        let a = h.track(A, 0.0);
        let b = h.track(B, 0.0);
        assert_eq!(h.enter(&a, LockMode::Full, S0, true), EnterResult::Success);
        assert_eq!(h.enter(&b, LockMode::Full, S0, true), EnterResult::Conflict);

        let event = h.slot().conflict(B).unwrap().clone();
        assert_eq!((event.agent, event.crossed, event.segment), (B, A, S0));
        assert_eq!(event.slot_name, "X");

        for tick in 2..=4 {
            h.advance_to(tick);
            assert_eq!(h.step(A, LockMode::Full, S0, true), EnterResult::Success);
            let result = h.step(B, LockMode::Full, S0, true);
            assert_eq!(result, EnterResult::ConflictOngoing, "tick {tick}");
            assert!(result.is_conflict());
        }

        assert!(h.slot().session(A).unwrap().rails().contains(S0));
        assert!(h.slot().session(B).unwrap().rails().contains(S0));
    }

    #[test]
    fn conflict_clears_once_incumbent_is_gone() {
        let mut h = Harness::full();
        h.spawn(&[A, B]);
        h.advance_to(1);
        let a = h.track(A, 0.0);
        let b = h.track(B, 0.0);
        h.enter(&a, LockMode::Full, S0, true);
        h.enter(&b, LockMode::Full, S0, true);

        let mut results = Vec::new();
        for tick in 2..=14 {
            h.advance_to(tick);
            results.push(h.step(B, LockMode::Full, S0, true));
        }
        let first_success = results
            .iter()
            .position(|r| *r == EnterResult::Success)
            .expect("B eventually enters");
        assert!(results[..first_success].iter().all(|r| *r == EnterResult::ConflictOngoing));
        assert!(h.slot().conflict(B).is_none());
        assert_eq!(h.slot().current_sessions(), vec![B]);
    }

    #[test]
    fn path_change_into_held_segment_is_conflict() {
        let mut h = Harness::smart();
        h.spawn(&[A, B]);
        h.advance_to(1);
        h.step(A, LockMode::Smart, S0, true);
        h.step(B, LockMode::Smart, S1, true);

        h.advance_to(2);
        h.step(A, LockMode::Smart, S0, true);
        let b = h.track(B, 0.0);
        h.enter(&b, LockMode::Smart, S1, true);
        assert_eq!(h.enter(&b, LockMode::Smart, S0, true), EnterResult::Conflict);
        // Nobody loses its claim.
        assert_eq!(h.slot().current_sessions(), vec![A, B]);
    }

    #[test]
    fn report_shows_path_and_conflict() {
        let mut h = Harness::full();
        h.spawn(&[A, B]);
        h.advance_to(1);
        h.step(A, LockMode::Full, S0, true);
        h.step(B, LockMode::Full, S0, true);

        let report = h.slot().report(B, &h.world).unwrap();
        assert_eq!(report.state(), "soft");
        let text = report.to_string();
        assert!(text.contains("'X'"), "{text}");
        assert!(text.contains("[0/0/0] full"), "{text}");
        assert!(text.contains("conflict:"), "{text}");

        let text = h.slot().report(A, &h.world).unwrap().to_string();
        assert!(text.contains("hard"), "{text}");
        assert!(!text.contains("conflict:"), "{text}");
    }
}

// ── Filtering ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod filtering {
    use super::*;

    fn express_only() -> Harness {
        let mut h = Harness::new([ZoneDecl::new(S0, S0, LockMode::Full).with_filter("express")]);
        h.tags.0.insert(A, vec!["express"]);
        h.spawn(&[A, B]);
        h
    }

    #[test]
    fn filtered_agent_is_ignored() {
        let mut h = express_only();
        let b = h.track(B, 1.0);
        assert!(b.is_ignored());
        assert_eq!(h.enter(&b, LockMode::Full, S0, true), EnterResult::Ignored);
        assert!(h.slot().session(B).is_none());
        assert_eq!(h.step(A, LockMode::Full, S0, true), EnterResult::Success);
    }

    #[test]
    fn losing_filter_releases_session_and_indicator() {
        let mut h = express_only();
        h.advance_to(1);
        h.step(A, LockMode::Full, S0, true);
        assert_eq!(h.lamp.count(true), 1);

        h.tags.0.remove(&A);
        h.advance_to(2);
        assert!(h.track(A, 1.0).is_ignored());
        assert!(h.slot().session(A).is_none());
        assert_eq!(h.lamp.count(false), 1);
    }
}

// ── Caller errors ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod caller_errors {
    use super::*;

    #[test]
    fn unknown_agent_cannot_track() {
        let mut h = Harness::full();
        let err = h.try_track(FIRST, C, 1.0).unwrap_err();
        assert!(matches!(err, ArbiterError::UnknownAgent(agent) if agent == C));
    }

    #[test]
    fn released_session_handle_is_stale() {
        let mut h = Harness::full();
        h.spawn(&[A, B]);
        let a = h.track(A, 1.0);
        h.vanish(A);
        h.advance();

        // The arena entry is reused by B; the old handle must not reach it.
        h.track(B, 1.0);
        let err = h.try_enter(FIRST, &a, LockMode::Full, S0, true).unwrap_err();
        assert!(matches!(err, ArbiterError::StaleSession(agent) if agent == A));
    }

    #[test]
    fn handle_from_other_slot_is_rejected() {
        let mut h = Harness::new([
            ZoneDecl::new(S0, S0, LockMode::Full).named("one"),
            ZoneDecl::new(S1, S1, LockMode::Full).named("two"),
        ]);
        h.spawn(&[A]);
        let a = h.track(A, 1.0);
        let err = h.try_enter(SlotId(1), &a, LockMode::Full, S1, true).unwrap_err();
        assert!(matches!(err, ArbiterError::ForeignSession { slot, .. } if slot == SlotId(1)));
    }

    #[test]
    fn unknown_slot_is_an_error() {
        let mut h = Harness::full();
        h.spawn(&[A]);
        let err = h.try_track(SlotId(9), A, 1.0).unwrap_err();
        assert!(matches!(err, ArbiterError::UnknownSlot(_)));
    }
}

// ── SlotRegistry ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod registry {
    use super::*;

    fn registry() -> SlotRegistry {
        SlotRegistry::new(ArbiterConfig::default()).unwrap()
    }

    #[test]
    fn named_zones_share_a_slot() {
        let mut r = registry();
        let z0 = r.add_zone(ZoneDecl::new(S0, S0, LockMode::Full).named("X")).unwrap();
        let z1 = r.add_zone(ZoneDecl::new(S2, S2, LockMode::Full).named("X")).unwrap();
        let z2 = r.add_zone(ZoneDecl::new(S1, S1, LockMode::Full)).unwrap();
        let z3 = r.add_zone(ZoneDecl::new(S1, S1, LockMode::Full)).unwrap();

        assert_eq!(r.slot_of(z0), r.slot_of(z1));
        assert_ne!(r.slot_of(z2), r.slot_of(z3));
        assert_eq!(r.slot_count(), 3);
        assert_eq!(r.slot_by_name("X"), r.slot_of(z0));
        assert!(r.slot(r.slot_of(z2).unwrap()).unwrap().is_anonymous());
    }

    #[test]
    fn filters_follow_anchor_order() {
        let mut r = registry();
        r.add_zone(ZoneDecl::new(S0, S0, LockMode::Full).named("X")
            .with_anchor(Segment::new(5, 0, 0)).with_filter("late")).unwrap();
        r.add_zone(ZoneDecl::new(S0, S0, LockMode::Full).named("X")
            .with_anchor(Segment::new(1, 0, 0)).with_filter("early")).unwrap();
        r.add_zone(ZoneDecl::new(S0, S0, LockMode::Full).named("X")).unwrap();

        let slot = r.slot(r.slot_by_name("X").unwrap()).unwrap();
        assert_eq!(slot.filters(), ["early".to_string(), "late".to_string()]);
    }

    #[test]
    fn removing_last_zone_keeps_slot() {
        let mut r = registry();
        let z = r.add_zone(ZoneDecl::new(S0, S0, LockMode::Full).named("X")).unwrap();
        let slot = r.slot_of(z).unwrap();

        r.remove_zone(z).unwrap();
        assert!(!r.slot(slot).unwrap().has_zones());
        assert!(r.zones_at(S0).is_empty());
        assert!(matches!(r.remove_zone(z), Err(ArbiterError::UnknownZone(_))));

        // The name resolves to the same slot again.
        let z = r.add_zone(ZoneDecl::new(S0, S0, LockMode::Full).named("X")).unwrap();
        assert_eq!(r.slot_of(z), Some(slot));
    }

    #[test]
    fn zones_at_uses_geometry() {
        let mut r = registry();
        let wide = r.add_zone(ZoneDecl::new(S0, S2, LockMode::Smart)).unwrap();
        let narrow = r.add_zone(ZoneDecl::new(S1, S1, LockMode::Full)).unwrap();

        let ids = |zones: Vec<&mz_zone::Zone>| zones.iter().map(|z| z.id).collect::<Vec<_>>();
        assert_eq!(ids(r.zones_at(S1)), vec![wide, narrow]);
        assert_eq!(ids(r.zones_at(S0)), vec![wide]);
        assert!(r.zones_at(Segment::new(9, 9, 9)).is_empty());
        assert_eq!(ids(r.zones_near(Segment::new(4, 0, 0), 2)), vec![wide]);
    }

    #[test]
    fn inverted_zone_is_rejected() {
        let mut r = registry();
        let err = r.add_zone(ZoneDecl::new(S2, S0, LockMode::Full)).unwrap_err();
        assert!(matches!(err, ArbiterError::Zone(ZoneError::InvertedBounds { .. })));
        assert_eq!(r.zone_count(), 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ArbiterConfig { idle_release_ticks: 0, ..ArbiterConfig::default() };
        assert!(matches!(SlotRegistry::new(config), Err(ArbiterError::Config(_))));
    }

    #[test]
    fn indicator_covers_every_zone_of_the_slot() {
        let mut h = Harness::new([
            ZoneDecl::new(S0, S0, LockMode::Full).named("X"),
            ZoneDecl::new(S1, S1, LockMode::Full).named("X"),
            ZoneDecl::new(S2, S2, LockMode::Full).named("Y"),
        ]);
        h.spawn(&[A]);
        h.step(A, LockMode::Full, S0, true);
        assert_eq!(h.lamp.calls, vec![(vec![ZoneId(0), ZoneId(1)], true)]);
        assert_eq!(h.slot().indicator(ZoneId(1)), Some(true));
        assert_eq!(h.registry.slot(SlotId(1)).unwrap().indicator(ZoneId(2)), None);
    }

    #[test]
    fn custom_idle_window_is_honoured() {
        let config = ArbiterConfig { idle_release_ticks: 2, ..ArbiterConfig::default() };
        let mut h = Harness::full();
        h.registry = SlotRegistry::new(config).unwrap();
        h.registry.add_zone(ZoneDecl::new(S0, S0, LockMode::Full).named("X")).unwrap();
        h.spawn(&[A]);
        h.step(A, LockMode::Full, S0, true);

        h.advance_to(1);
        assert!(h.slot().session(A).is_some());
        h.advance_to(2);
        assert!(h.slot().session(A).is_none());
    }
}
