//! Spatial lookup of zones by segment.
//!
//! An R-tree (via `rstar`) over the integer boxes of all live zones answers
//! "which zones cover this segment" in O(log Z).  Results are returned sorted
//! by `ZoneId` so callers iterate in a stable order regardless of tree shape.

use rstar::{RTree, RTreeObject, AABB};

use mz_core::{Segment, ZoneId};

use crate::Zone;

/// Entry stored in the R-tree: the inclusive box of one zone.
#[derive(Clone, Debug, PartialEq)]
struct ZoneEntry {
    id: ZoneId,
    lo: [i32; 3],
    hi: [i32; 3],
}

impl ZoneEntry {
    fn of(zone: &Zone) -> Self {
        Self { id: zone.id, lo: zone.min.to_array(), hi: zone.max.to_array() }
    }
}

impl RTreeObject for ZoneEntry {
    type Envelope = AABB<[i32; 3]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.lo, self.hi)
    }
}

/// R-tree of zone boxes.
#[derive(Default)]
pub struct ZoneIndex {
    tree: RTree<ZoneEntry>,
}

impl ZoneIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-load from existing zones.
    pub fn bulk_load<'a>(zones: impl IntoIterator<Item = &'a Zone>) -> Self {
        let entries: Vec<ZoneEntry> = zones.into_iter().map(ZoneEntry::of).collect();
        Self { tree: RTree::bulk_load(entries) }
    }

    pub fn insert(&mut self, zone: &Zone) {
        self.tree.insert(ZoneEntry::of(zone));
    }

    /// Remove `zone`.  Returns `false` if it was not indexed.
    pub fn remove(&mut self, zone: &Zone) -> bool {
        self.tree.remove(&ZoneEntry::of(zone)).is_some()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Zones whose box contains `segment`, ascending by id.
    pub fn zones_at(&self, segment: Segment) -> Vec<ZoneId> {
        let probe = AABB::from_point(segment.to_array());
        self.collect_sorted(self.tree.locate_in_envelope_intersecting(&probe))
    }

    /// Zones whose box comes within `radius` segments of `segment`
    /// (Chebyshev distance), ascending by id.
    pub fn zones_near(&self, segment: Segment, radius: i32) -> Vec<ZoneId> {
        let radius = radius.max(0);
        let probe = AABB::from_corners(
            segment.offset(-radius, -radius, -radius).to_array(),
            segment.offset(radius, radius, radius).to_array(),
        );
        self.collect_sorted(self.tree.locate_in_envelope_intersecting(&probe))
    }

    fn collect_sorted<'a>(&self, hits: impl Iterator<Item = &'a ZoneEntry>) -> Vec<ZoneId> {
        let mut ids: Vec<ZoneId> = hits.map(|e| e.id).collect();
        ids.sort_unstable();
        ids
    }
}
