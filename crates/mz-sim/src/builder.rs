//! Fluent builder for constructing a [`Sim`].

use rustc_hash::FxHashSet;

use mz_arbiter::SlotRegistry;
use mz_zone::ZoneDecl;

use crate::{Sim, SimConfig, SimError, SimResult, TrackWorld, Train};

/// Fluent builder for [`Sim`].
///
/// # Required inputs
///
/// - [`SimConfig`]: total ticks, seed, lookahead distances, arbiter timing
///
/// # Optional inputs (have defaults)
///
/// | Method          | Default        |
/// |-----------------|----------------|
/// | `.zone(d)`      | No zones       |
/// | `.train(t)`     | No trains      |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(SimConfig::default())
///     .zone(ZoneDecl::new(min, max, LockMode::Full).named("junction"))
///     .train(Train::new(AgentId(0), route).length(3))
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder {
    config: SimConfig,
    zones:  Vec<ZoneDecl>,
    trains: Vec<Train>,
}

impl SimBuilder {
    pub fn new(config: SimConfig) -> Self {
        Self { config, zones: Vec::new(), trains: Vec::new() }
    }

    /// Declare a zone.  Zones with the same slot name share one slot.
    pub fn zone(mut self, decl: ZoneDecl) -> Self {
        self.zones.push(decl);
        self
    }

    pub fn zones(mut self, decls: impl IntoIterator<Item = ZoneDecl>) -> Self {
        self.zones.extend(decls);
        self
    }

    pub fn train(mut self, train: Train) -> Self {
        self.trains.push(train);
        self
    }

    pub fn trains(mut self, trains: impl IntoIterator<Item = Train>) -> Self {
        self.trains.extend(trains);
        self
    }

    /// Validate inputs, register the zones, and return a ready-to-run
    /// [`Sim`].
    pub fn build(self) -> SimResult<Sim> {
        self.config.validate()?;

        // ── Validate trains ───────────────────────────────────────────────
        let mut seen = FxHashSet::default();
        for train in &self.trains {
            if train.route.is_empty() {
                return Err(SimError::EmptyRoute(train.id));
            }
            if !seen.insert(train.id) {
                return Err(SimError::DuplicateTrain(train.id));
            }
        }

        // ── Register zones ────────────────────────────────────────────────
        let mut registry = SlotRegistry::new(self.config.arbiter)?;
        for decl in self.zones {
            registry.add_zone(decl)?;
        }

        let world = TrackWorld::new(self.trains);
        Ok(Sim::new(self.config, registry, world))
    }
}
