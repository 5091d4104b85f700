//! `MutexZoneSlot` — the arbiter for one named group of zones.
//!
//! # Per-tick protocol
//!
//! ```text
//! slot.on_tick(ctx)                       once per global tick
//! for each agent near the slot:
//!     let h = slot.track(ctx, agent, distance)?
//!     for each segment the agent occupies or is about to:
//!         slot.enter(ctx, &h, mode, segment, hard)?
//! ```
//!
//! Every `enter` is decided on the spot against the sessions as they stand
//! right now, including changes made earlier in the same tick.  Agent
//! iteration order therefore decides who wins a tie on the very tick
//! contention starts; the fairness window bounds how long that advantage
//! lasts.
//!
//! # Sessions
//!
//! Each tracked agent has one [`Session`] in the slot's arena.  `track`
//! creates or re-activates it, `enter` arbitrates, and `on_tick` releases
//! sessions whose agent stopped tracking and no longer sits on any claimed
//! segment.

use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use mz_core::{AgentId, ArbiterConfig, LockMode, Segment, SlotId, Tick, ZoneId};
use mz_zone::Zone;

use crate::session::SessionArena;
use crate::{
    filters_match, AgentClock, ArbiterContext, ArbiterError, ArbiterResult, ConflictEvent,
    EnterResult, OccupancyOracle, Session, SessionHandle, SessionKey, SessionReport,
};

/// A zone as seen by its slot: enough to order filters and drive its
/// indicator.
#[derive(Clone, Debug)]
pub struct SlotZone {
    pub id:     ZoneId,
    pub anchor: Segment,
    pub mode:   LockMode,
    filter:     String,
    /// Last state sent to the indicator sink.  `None` until the first send.
    lit:        Option<bool>,
}

/// Arbitration state shared by every zone that uses the same slot name.
#[derive(Debug)]
pub struct MutexZoneSlot {
    id:              SlotId,
    name:            String,
    config:          ArbiterConfig,
    zones:           Vec<SlotZone>,
    /// Non-empty zone filters, ordered by zone anchor.
    filters:         Vec<String>,
    sessions:        SessionArena,
    by_agent:        FxHashMap<AgentId, SessionKey>,
    /// Global tick of the last hard enter granted.
    last_hard_enter: Option<Tick>,
}

impl MutexZoneSlot {
    pub fn new(id: SlotId, name: impl Into<String>, config: ArbiterConfig) -> Self {
        Self {
            id,
            name: name.into(),
            config,
            zones: Vec::new(),
            filters: Vec::new(),
            sessions: SessionArena::new(),
            by_agent: FxHashMap::default(),
            last_hard_enter: None,
        }
    }

    // ── Zones ────────────────────────────────────────────────────────────────

    #[inline]
    pub fn id(&self) -> SlotId {
        self.id
    }

    /// Shared name; empty for an anonymous slot.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }

    #[inline]
    pub fn has_zones(&self) -> bool {
        !self.zones.is_empty()
    }

    pub fn zones(&self) -> &[SlotZone] {
        &self.zones
    }

    /// The merged filter list every tracked agent is checked against.
    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    /// Last indicator state sent for `zone`.
    pub fn indicator(&self, zone: ZoneId) -> Option<bool> {
        self.zones.iter().find(|z| z.id == zone).and_then(|z| z.lit)
    }

    pub fn add_zone(&mut self, zone: &Zone) {
        self.zones.push(SlotZone {
            id:     zone.id,
            anchor: zone.anchor,
            mode:   zone.mode,
            filter: zone.filter.trim().to_owned(),
            lit:    None,
        });
        self.refresh_filters();
    }

    /// Returns `false` if `zone` did not belong to this slot.  Sessions are
    /// kept; a slot without zones simply stops being reached.
    pub fn remove_zone(&mut self, zone: ZoneId) -> bool {
        let before = self.zones.len();
        self.zones.retain(|z| z.id != zone);
        if self.zones.len() == before {
            return false;
        }
        self.refresh_filters();
        true
    }

    fn refresh_filters(&mut self) {
        let mut ordered: Vec<&SlotZone> = self.zones.iter().collect();
        ordered.sort_by_key(|z| z.anchor);
        self.filters = ordered
            .into_iter()
            .filter(|z| !z.filter.is_empty())
            .map(|z| z.filter.clone())
            .collect();
    }

    // ── Arbitration ──────────────────────────────────────────────────────────

    /// Register or refresh `agent`'s interest in the slot.
    ///
    /// An agent rejected by the slot's filters gets an ignored handle, and a
    /// session it held before is released.  Otherwise its session is
    /// created, or re-activated and refreshed to the agent's current tick.
    ///
    /// # Errors
    ///
    /// [`ArbiterError::UnknownAgent`] if the clock does not know `agent`.
    pub fn track(
        &mut self,
        ctx:      &mut ArbiterContext<'_>,
        agent:    AgentId,
        distance: f64,
    ) -> ArbiterResult<SessionHandle> {
        let now = ctx.clock.local_tick(agent).ok_or(ArbiterError::UnknownAgent(agent))?;

        if !filters_match(&self.filters, agent, ctx.filter) {
            let released = self.by_agent.get(&agent).copied().and_then(|key| self.release(key));
            if let Some(released) = released {
                debug!(slot = %self.id, agent = %agent, "agent filtered out, session released");
                if released.hard && !self.has_hard_session() {
                    self.set_indicator(ctx, false);
                }
            }
            return Ok(SessionHandle { agent, slot: self.id, key: None });
        }

        let existing = self.by_agent.get(&agent).copied();
        if let Some((key, mut session)) = existing.and_then(|k| self.sessions.take(k).map(|s| (k, s))) {
            deactivate_by_others(&mut self.sessions, key, &mut session);
            session.probe_tick = now;
            if session.active {
                session.distance = session.distance.min(distance);
            } else {
                session.active = true;
                session.distance = distance;
            }
            self.sessions.restore(key, session);
            return Ok(SessionHandle { agent, slot: self.id, key: Some(key) });
        }

        let key = self.sessions.insert(Session::new(agent, distance, now));
        self.by_agent.insert(agent, key);
        trace!(slot = %self.id, agent = %agent, distance, "session created");
        Ok(SessionHandle { agent, slot: self.id, key: Some(key) })
    }

    /// Try to enter `segment` through a zone of `mode`.
    ///
    /// `hard` means the agent is actually moving onto the segment; a soft
    /// enter only announces the intent.  The segment is registered whatever
    /// the outcome.
    ///
    /// # Errors
    ///
    /// [`ArbiterError::ForeignSession`] if `handle` came from another slot,
    /// [`ArbiterError::StaleSession`] if its session has been released.
    pub fn enter(
        &mut self,
        ctx:     &mut ArbiterContext<'_>,
        handle:  &SessionHandle,
        mode:    LockMode,
        segment: Segment,
        hard:    bool,
    ) -> ArbiterResult<EnterResult> {
        if handle.slot != self.id {
            return Err(ArbiterError::ForeignSession {
                agent:       handle.agent,
                handle_slot: handle.slot,
                slot:        self.id,
            });
        }
        let Some(key) = handle.key else {
            return Ok(EnterResult::Ignored);
        };
        let mut session = self
            .sessions
            .take(key)
            .ok_or(ArbiterError::StaleSession(handle.agent))?;

        let result = self.arbitrate(ctx, key, &mut session, mode, segment, hard);
        self.sessions.restore(key, session);
        Ok(result)
    }

    fn arbitrate(
        &mut self,
        ctx:     &mut ArbiterContext<'_>,
        key:     SessionKey,
        me:      &mut Session,
        mode:    LockMode,
        segment: Segment,
        hard:    bool,
    ) -> EnterResult {
        // A session blocked as of last tick needs one clean tick before it
        // may succeed again.
        let mut success = EnterResult::Success;
        if me.was_blocked_last_tick() {
            success = if me.conflict.is_some() {
                EnterResult::ConflictOngoing
            } else {
                EnterResult::OccupiedDiscover
            };
        }

        let was_full = me.rails.is_full_locking();
        let added = me.rails.add(mode, segment, me.probe_tick);
        let unchanged = hard == me.hard && me.conflict.is_none();
        if unchanged && (was_full || (mode == LockMode::Smart && !added)) {
            return success;
        }

        let my_age = me.age(ctx.clock);
        let my_global_probe = me.global_probe_tick(ctx.clock, ctx.tick);
        let within_grace = self
            .last_hard_enter
            .is_some_and(|t| my_global_probe.saturating_since(t) < self.config.fairness_window_ticks);
        let fresh_or_blocked = me.created_tick == me.probe_tick || me.was_blocked_last_tick();

        for other_key in self.sessions.keys().to_vec() {
            let Some(other) = self.sessions.get_mut(other_key) else {
                continue;
            };
            let other_age = other.age(ctx.clock);

            if !other.active {
                // An older waiter keeps its turn for a while after the slot
                // last let someone in.
                if within_grace
                    && fresh_or_blocked
                    && other_age > my_age
                    && other.contains_live(segment, ctx.occupancy)
                {
                    trace!(slot = %self.id, agent = %me.agent, waiter = %other.agent, %segment,
                           "yielding to older waiting session");
                    return self.back_off(key, me, segment);
                }
                continue;
            }
            if !other.contains_live(segment, ctx.occupancy) {
                continue;
            }

            if hard {
                // A soft claim gives way to an older hard claim, and to any
                // session already committed inside the slot.
                if !other.hard && (my_age > other_age || me.hard) {
                    if !me.deactivates.contains(&other_key) {
                        me.deactivates.push(other_key);
                        other.deactivated_by.push(key);
                        other.deactivated_on = Some(segment);
                    }
                    continue;
                }

                if other.hard {
                    // Both inside at once: either this session already was,
                    // or both committed on this very tick without this one
                    // having been told to wait.
                    let had_conflict = me.conflict.is_some();
                    let same_tick = other.hard_since == Some(ctx.tick) && !me.was_blocked_last_tick();
                    if had_conflict || me.hard || same_tick {
                        let crossed = other.agent;
                        if !had_conflict {
                            warn!(slot = %self.id, name = %self.name, agent = %me.agent,
                                  crossed = %crossed, %segment, tick = %ctx.tick,
                                  "mutex zone conflict");
                        }
                        me.conflict = Some(ConflictEvent {
                            agent:     me.agent,
                            crossed,
                            slot_name: self.name.clone(),
                            segment,
                            tick:      ctx.tick,
                        });
                        me.blocked_tick = Some(me.probe_tick);
                        return if had_conflict {
                            EnterResult::ConflictOngoing
                        } else {
                            EnterResult::Conflict
                        };
                    }
                }
            }

            return self.back_off(key, me, segment);
        }

        if hard && success == EnterResult::Success && !me.hard {
            me.hard = true;
            me.hard_since = Some(ctx.tick);
            self.last_hard_enter = Some(ctx.tick);
            debug!(slot = %self.id, agent = %me.agent, %segment, tick = %ctx.tick, "hard enter");
            self.set_indicator(ctx, true);
        }

        if success == EnterResult::Success && me.conflict.is_some() {
            me.conflict = None;
            me.rails.clear_old_rails(me.probe_tick);
        }

        success
    }

    fn back_off(&mut self, key: SessionKey, me: &mut Session, segment: Segment) -> EnterResult {
        me.hard = false;
        deactivate(&mut self.sessions, key, me, Some(segment));
        EnterResult::Occupied
    }

    /// Release abandoned sessions.  Call once per global tick.
    ///
    /// A session tracked within the idle window is kept as is.  An older one
    /// survives only while its agent still occupies a claimed segment.  When
    /// anything was released and no hard session remains, the indicator goes
    /// off.
    pub fn on_tick(&mut self, ctx: &mut ArbiterContext<'_>) {
        if self.sessions.is_empty() {
            return;
        }
        let idle = self.config.idle_release_ticks;
        let mut released = false;
        for key in self.sessions.keys().to_vec() {
            let keep = match self.sessions.get_mut(key) {
                Some(session) => refresh(session, ctx.clock, ctx.occupancy, idle),
                None => continue,
            };
            if keep {
                continue;
            }
            if let Some(session) = self.release(key) {
                debug!(slot = %self.id, agent = %session.agent, tick = %ctx.tick, "session released");
                released = true;
            }
        }
        if released && !self.has_hard_session() {
            self.set_indicator(ctx, false);
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    /// Agents with genuine possession: active and hard.
    pub fn current_sessions(&self) -> Vec<AgentId> {
        self.sessions
            .iter()
            .filter(|(_, s)| s.active && s.hard)
            .map(|(_, s)| s.agent)
            .collect()
    }

    /// Agents in possession or about to be: every active session.
    pub fn prospective_sessions(&self) -> Vec<AgentId> {
        self.sessions
            .iter()
            .filter(|(_, s)| s.active)
            .map(|(_, s)| s.agent)
            .collect()
    }

    pub fn session(&self, agent: AgentId) -> Option<&Session> {
        self.by_agent.get(&agent).and_then(|&key| self.sessions.get(key))
    }

    /// All sessions in creation order.
    pub fn sessions(&self) -> impl Iterator<Item = &Session> + '_ {
        self.sessions.iter().map(|(_, s)| s)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// The overlap last reported to `agent`, if it is still unresolved.
    pub fn conflict(&self, agent: AgentId) -> Option<&ConflictEvent> {
        self.session(agent).and_then(Session::conflict)
    }

    /// A printable summary of `agent`'s session.
    pub fn report(&self, agent: AgentId, clock: &dyn AgentClock) -> Option<SessionReport> {
        self.session(agent)
            .map(|session| SessionReport::new(self.id, &self.name, session, clock))
    }

    // ── Internals ────────────────────────────────────────────────────────────

    fn has_hard_session(&self) -> bool {
        self.sessions.iter().any(|(_, s)| s.hard)
    }

    /// Remove a session and unlink it from every session it was linked to.
    fn release(&mut self, key: SessionKey) -> Option<Session> {
        let session = self.sessions.remove(key)?;
        if self.by_agent.get(&session.agent) == Some(&key) {
            self.by_agent.remove(&session.agent);
        }
        for &other_key in &session.deactivates {
            if let Some(other) = self.sessions.get_mut(other_key) {
                other.deactivated_by.retain(|k| *k != key);
                if other.deactivated_by.is_empty() {
                    other.deactivated_on = None;
                }
            }
        }
        for &other_key in &session.deactivated_by {
            if let Some(other) = self.sessions.get_mut(other_key) {
                other.deactivates.retain(|k| *k != key);
            }
        }
        Some(session)
    }

    /// Send `on` to every zone whose indicator is not already in that state.
    fn set_indicator(&mut self, ctx: &mut ArbiterContext<'_>, on: bool) {
        let changed: Vec<ZoneId> = self
            .zones
            .iter_mut()
            .filter(|z| z.lit != Some(on))
            .map(|z| {
                z.lit = Some(on);
                z.id
            })
            .collect();
        if !changed.is_empty() {
            ctx.indicator.set_indicator(&changed, on);
        }
    }
}

// ── Session helpers ───────────────────────────────────────────────────────────

/// Mark `session` as no longer using the slot and drop its claims.  Sessions
/// it was going to knock out are let go.
fn deactivate(
    sessions: &mut SessionArena,
    key:      SessionKey,
    session:  &mut Session,
    segment:  Option<Segment>,
) {
    session.active = false;
    session.rails.clear_conflict(segment);
    session.blocked_tick = Some(session.probe_tick);
    for other_key in session.deactivates.drain(..) {
        if let Some(other) = sessions.get_mut(other_key) {
            other.deactivated_by.retain(|k| *k != key);
            if other.deactivated_by.is_empty() {
                other.deactivated_on = None;
            }
        }
    }
}

/// Apply deactivations queued by hard enters of older sessions.
fn deactivate_by_others(sessions: &mut SessionArena, key: SessionKey, session: &mut Session) {
    if session.deactivated_by.is_empty() {
        return;
    }
    for other_key in std::mem::take(&mut session.deactivated_by) {
        if let Some(other) = sessions.get_mut(other_key) {
            other.deactivates.retain(|k| *k != key);
        }
    }
    let segment = session.deactivated_on.take();
    deactivate(sessions, key, session, segment);
}

/// `false` if the session should be released.
fn refresh(
    session:   &mut Session,
    clock:     &dyn AgentClock,
    occupancy: &dyn OccupancyOracle,
    idle:      u64,
) -> bool {
    let Some(now) = clock.local_tick(session.agent) else {
        return false;
    };
    if now.saturating_since(session.probe_tick) < idle {
        return true;
    }
    if !session.rails.verify_any_segment_still_used(session.agent, occupancy) {
        return false;
    }
    session.probe_tick = now;
    true
}
