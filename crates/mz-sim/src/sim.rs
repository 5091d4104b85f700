//! The `Sim` struct and its tick loop.

use tracing::trace;

use mz_arbiter::{ArbiterContext, EnterResult, SlotRegistry};
use mz_core::{LockMode, Segment, SimRng, SlotId, Tick};

use crate::{
    EnterEvent, IndicatorLog, SimConfig, SimObserver, SimResult, TagFilter, TickSummary,
    TrackWorld, Train, TrainState,
};

// ── Per-train plan assembled before arbitration ──────────────────────────────

/// The segments of one slot a train covers or is about to reach.
struct SlotVisit {
    slot:     SlotId,
    /// Distance of the nearest of them.
    distance: u32,
    segments: Vec<(Segment, LockMode)>,
}

/// Group `train`'s upcoming zone segments by slot, nearest slot first.
///
/// A segment covered by several zones of one slot is entered once, as
/// `Full` if any of those zones is.
fn plan_visits(registry: &SlotRegistry, train: &Train, lookahead: u32) -> Vec<SlotVisit> {
    let mut visits: Vec<SlotVisit> = Vec::new();
    for (distance, segment) in train.path_ahead(lookahead) {
        for zone in registry.zones_at(segment) {
            let Some(slot) = registry.slot_of(zone.id) else {
                continue;
            };
            let index = match visits.iter().position(|v| v.slot == slot) {
                Some(i) => i,
                None => {
                    visits.push(SlotVisit { slot, distance, segments: Vec::new() });
                    visits.len() - 1
                }
            };
            let segments = &mut visits[index].segments;
            match segments.iter_mut().find(|(s, _)| *s == segment) {
                Some(entry) => {
                    if zone.mode.is_full() {
                        entry.1 = LockMode::Full;
                    }
                }
                None => segments.push((segment, zone.mode)),
            }
        }
    }
    visits
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// Each tick:
///
/// 1. **Spawn** trains whose spawn tick has come.
/// 2. **Clocks**: every running train's local tick advances by one.
/// 3. **Sweep**: [`SlotRegistry::on_tick`] releases abandoned sessions.
/// 4. **Drive** each running train (ascending id, or a seeded shuffle):
///    track every slot within its lookahead and enter the slot's segments,
///    all hard when the slot's nearest segment is within `hard_lookahead`
///    and all soft otherwise.  Then advance one segment unless a hard enter
///    came back occupied; conflicts do not hold a train.  A train driving
///    off the end of its route despawns.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim {
    pub config: SimConfig,

    /// The tick the next call to `step` will process.
    pub tick: Tick,

    /// Zones and slots.
    pub registry: SlotRegistry,

    pub world: TrackWorld,

    /// Indicator state, fed by the registry.
    pub indicators: IndicatorLog,

    rng: SimRng,
}

impl Sim {
    pub(crate) fn new(config: SimConfig, registry: SlotRegistry, world: TrackWorld) -> Self {
        let rng = SimRng::new(config.seed);
        Self {
            config,
            tick: Tick::ZERO,
            registry,
            world,
            indicators: IndicatorLog::default(),
            rng,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Run the simulation from the current tick to `config.total_ticks`.
    ///
    /// Calls observer hooks at every tick boundary.  Use
    /// [`NoopObserver`][crate::NoopObserver] if you don't need callbacks.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        while self.tick.0 < self.config.total_ticks {
            self.step(observer)?;
        }
        observer.on_sim_end(self.tick);
        Ok(())
    }

    /// Run exactly `n` ticks from the current position (ignores `total_ticks`).
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.step(observer)?;
        }
        Ok(())
    }

    /// Process one tick.
    pub fn step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<TickSummary> {
        let now = self.tick;
        observer.on_tick_start(now);
        let summary = self.process_tick(now, observer)?;
        observer.on_tick_end(now, &summary);
        self.tick += 1;
        Ok(summary)
    }

    /// `true` once every train has finished its route.
    pub fn is_done(&self) -> bool {
        self.world.trains().iter().all(|t| t.finished_at.is_some())
    }

    // ── Core tick processing ──────────────────────────────────────────────

    fn process_tick<O: SimObserver>(&mut self, now: Tick, observer: &mut O) -> SimResult<TickSummary> {
        let mut summary = TickSummary { tick: now, ..TickSummary::default() };

        // ── Phase 1: spawn, then advance local clocks ─────────────────────
        for train in self.world.trains_mut() {
            if train.state == TrainState::Pending && train.spawn_tick <= now {
                train.spawn();
                trace!(tick = %now, train = %train.id, "train spawned");
            }
            if train.is_running() {
                train.local_tick += 1;
            }
        }

        // ── Phase 2: release sweep ────────────────────────────────────────
        {
            let filter = TagFilter(&self.world);
            let mut ctx = ArbiterContext::new(now, &self.world, &self.world, &filter, &mut self.indicators);
            self.registry.on_tick(&mut ctx);
        }
        self.flush_indicators(now, observer);

        // ── Phase 3: drive trains ─────────────────────────────────────────
        let mut order: Vec<usize> = self
            .world
            .trains()
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_running())
            .map(|(i, _)| i)
            .collect();
        if self.config.shuffle_agents {
            self.rng.shuffle(&mut order);
        }

        for index in order {
            let blocked = self.drive(index, now, &mut summary, observer)?;
            self.flush_indicators(now, observer);

            let train = &mut self.world.trains_mut()[index];
            if blocked {
                train.waited += 1;
                summary.waiting += 1;
            } else if train.advance(now) {
                summary.moved += 1;
            } else {
                summary.finished += 1;
                observer.on_train_finished(now, train.id);
                trace!(tick = %now, train = %train.id, "train finished");
            }
        }

        summary.running = self.world.running_count();
        summary.hard_sessions = self
            .registry
            .slots()
            .map(|slot| slot.current_sessions().len())
            .sum();
        Ok(summary)
    }

    /// Arbitrate every slot ahead of one train.  Returns `true` when the
    /// train must hold this tick.
    fn drive<O: SimObserver>(
        &mut self,
        index:    usize,
        now:      Tick,
        summary:  &mut TickSummary,
        observer: &mut O,
    ) -> SimResult<bool> {
        let train = &self.world.trains()[index];
        let agent = train.id;
        let visits = plan_visits(&self.registry, train, self.config.soft_lookahead);

        let filter = TagFilter(&self.world);
        let mut ctx = ArbiterContext::new(now, &self.world, &self.world, &filter, &mut self.indicators);

        let mut blocked = false;
        for visit in visits {
            // One strength for the whole slot, from its nearest segment.
            let hard = visit.distance <= self.config.hard_lookahead;
            let slot = self.registry.slot_mut(visit.slot)?;
            let handle = slot.track(&mut ctx, agent, f64::from(visit.distance))?;
            for (segment, mode) in visit.segments {
                let result = slot.enter(&mut ctx, &handle, mode, segment, hard)?;
                observer.on_enter(now, &EnterEvent {
                    train: agent,
                    slot: visit.slot,
                    segment,
                    mode,
                    hard,
                    distance: visit.distance,
                    result,
                });
                if result == EnterResult::Conflict {
                    if let Some(event) = slot.conflict(agent) {
                        summary.conflicts += 1;
                        observer.on_conflict(now, event);
                    }
                }
                if hard && result.is_occupied() {
                    blocked = true;
                }
            }
        }
        Ok(blocked)
    }

    fn flush_indicators<O: SimObserver>(&mut self, now: Tick, observer: &mut O) {
        for (zones, on) in self.indicators.drain() {
            observer.on_indicator(now, &zones, on);
        }
    }
}
