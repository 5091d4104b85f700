//! The `SlotRegistry` — every zone and every slot in one world.

use rustc_hash::FxHashMap;
use tracing::debug;

use mz_core::{ArbiterConfig, Segment, SlotId, ZoneId};
use mz_zone::{Zone, ZoneDecl, ZoneIndex};

use crate::{ArbiterContext, ArbiterError, ArbiterResult, MutexZoneSlot};

/// Owns all zones and the slots they share.
///
/// Named slots are created on first reference and looked up by name after
/// that; a zone with an empty name gets a fresh anonymous slot of its own.
/// Slots are never deleted, so a `SlotId` stays valid for the registry's
/// lifetime even after its last zone is removed.
pub struct SlotRegistry {
    config:    ArbiterConfig,
    /// Indexed by `SlotId`.
    slots:     Vec<MutexZoneSlot>,
    by_name:   FxHashMap<String, SlotId>,
    zones:     FxHashMap<ZoneId, (Zone, SlotId)>,
    index:     ZoneIndex,
    next_zone: u32,
}

impl SlotRegistry {
    /// # Errors
    ///
    /// [`ArbiterError::Config`] if `config` fails validation.
    pub fn new(config: ArbiterConfig) -> ArbiterResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            slots:     Vec::new(),
            by_name:   FxHashMap::default(),
            zones:     FxHashMap::default(),
            index:     ZoneIndex::new(),
            next_zone: 0,
        })
    }

    #[inline]
    pub fn config(&self) -> &ArbiterConfig {
        &self.config
    }

    // ── Zones ────────────────────────────────────────────────────────────────

    /// Validate and register a zone, attaching it to its slot.
    ///
    /// # Errors
    ///
    /// [`ArbiterError::Zone`] if the declaration's bounds are inverted.
    pub fn add_zone(&mut self, decl: ZoneDecl) -> ArbiterResult<ZoneId> {
        let id = ZoneId(self.next_zone);
        let zone = Zone::new(id, decl)?;
        self.next_zone += 1;

        let slot = self.find_slot(&zone.slot_name);
        self.slots[slot.index()].add_zone(&zone);
        self.index.insert(&zone);
        debug!(zone = %id, slot = %slot, name = %zone.slot_name, mode = %zone.mode, "zone added");
        self.zones.insert(id, (zone, slot));
        Ok(id)
    }

    /// Remove a zone.  Its slot stays, possibly without zones.
    ///
    /// # Errors
    ///
    /// [`ArbiterError::UnknownZone`] if `id` is not registered.
    pub fn remove_zone(&mut self, id: ZoneId) -> ArbiterResult<Zone> {
        let (zone, slot) = self.zones.remove(&id).ok_or(ArbiterError::UnknownZone(id))?;
        self.index.remove(&zone);
        self.slots[slot.index()].remove_zone(id);
        debug!(zone = %id, slot = %slot, "zone removed");
        Ok(zone)
    }

    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(&id).map(|(zone, _)| zone)
    }

    /// The slot `zone` belongs to.
    pub fn slot_of(&self, zone: ZoneId) -> Option<SlotId> {
        self.zones.get(&zone).map(|&(_, slot)| slot)
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    /// Zones covering `segment`, ascending by id.
    pub fn zones_at(&self, segment: Segment) -> Vec<&Zone> {
        self.index
            .zones_at(segment)
            .into_iter()
            .filter_map(|id| self.zone(id))
            .collect()
    }

    /// Zones within `radius` segments of `segment`, ascending by id.
    pub fn zones_near(&self, segment: Segment, radius: i32) -> Vec<&Zone> {
        self.index
            .zones_near(segment, radius)
            .into_iter()
            .filter_map(|id| self.zone(id))
            .collect()
    }

    // ── Slots ────────────────────────────────────────────────────────────────

    /// The slot called `name`, created if needed.  An empty name always
    /// yields a new anonymous slot.
    pub fn find_slot(&mut self, name: &str) -> SlotId {
        if let Some(&id) = self.by_name.get(name).filter(|_| !name.is_empty()) {
            return id;
        }
        let id = SlotId(self.slots.len() as u32);
        self.slots.push(MutexZoneSlot::new(id, name, self.config));
        if !name.is_empty() {
            self.by_name.insert(name.to_owned(), id);
        }
        id
    }

    pub fn slot_by_name(&self, name: &str) -> Option<SlotId> {
        self.by_name.get(name).copied()
    }

    /// # Errors
    ///
    /// [`ArbiterError::UnknownSlot`] if `id` was never issued.
    pub fn slot(&self, id: SlotId) -> ArbiterResult<&MutexZoneSlot> {
        self.slots.get(id.index()).ok_or(ArbiterError::UnknownSlot(id))
    }

    /// # Errors
    ///
    /// [`ArbiterError::UnknownSlot`] if `id` was never issued.
    pub fn slot_mut(&mut self, id: SlotId) -> ArbiterResult<&mut MutexZoneSlot> {
        self.slots.get_mut(id.index()).ok_or(ArbiterError::UnknownSlot(id))
    }

    pub fn slots(&self) -> impl Iterator<Item = &MutexZoneSlot> + '_ {
        self.slots.iter()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Run the release sweep of every slot.
    pub fn on_tick(&mut self, ctx: &mut ArbiterContext<'_>) {
        for slot in &mut self.slots {
            slot.on_tick(ctx);
        }
    }
}
