//! Zone declarations and their geometry.
//!
//! A zone is an axis-aligned box of segments, inclusive on both corners.
//! Once built it never changes; removing the declaration removes the zone.

use mz_core::{LockMode, Segment, ZoneId};

use crate::{ZoneError, ZoneResult};

/// A zone as declared in world data, before validation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZoneDecl {
    /// Position of the declaration itself (e.g. the sign).  Orders the
    /// filters of zones sharing a slot.
    pub anchor:    Segment,
    /// Low corner, inclusive.
    pub min:       Segment,
    /// High corner, inclusive.
    pub max:       Segment,
    pub mode:      LockMode,
    /// Shared slot name.  Empty means the zone gets its own anonymous slot.
    pub slot_name: String,
    /// Filter expression; empty means every agent is seen.
    pub filter:    String,
}

impl ZoneDecl {
    /// A declaration covering `min ..= max` with no name and no filter.
    pub fn new(min: Segment, max: Segment, mode: LockMode) -> Self {
        Self {
            anchor: min,
            min,
            max,
            mode,
            slot_name: String::new(),
            filter:    String::new(),
        }
    }

    pub fn named(mut self, slot_name: impl Into<String>) -> Self {
        self.slot_name = slot_name.into();
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_anchor(mut self, anchor: Segment) -> Self {
        self.anchor = anchor;
        self
    }
}

/// A validated, immutable zone.
#[derive(Clone, Debug, PartialEq)]
pub struct Zone {
    pub id:        ZoneId,
    pub anchor:    Segment,
    pub min:       Segment,
    pub max:       Segment,
    pub mode:      LockMode,
    pub slot_name: String,
    pub filter:    String,
}

impl Zone {
    /// Validate `decl` and assign it `id`.
    ///
    /// # Errors
    ///
    /// [`ZoneError::InvertedBounds`] if `min` exceeds `max` on any axis.
    pub fn new(id: ZoneId, decl: ZoneDecl) -> ZoneResult<Self> {
        let ZoneDecl { anchor, min, max, mode, slot_name, filter } = decl;
        if min.x > max.x || min.y > max.y || min.z > max.z {
            return Err(ZoneError::InvertedBounds { min, max });
        }
        Ok(Self { id, anchor, min, max, mode, slot_name, filter })
    }

    /// `true` if `segment` lies inside the zone.
    #[inline]
    pub fn contains(&self, segment: Segment) -> bool {
        segment.x >= self.min.x && segment.y >= self.min.y && segment.z >= self.min.z
            && segment.x <= self.max.x && segment.y <= self.max.y && segment.z <= self.max.z
    }

    /// `true` if `segment` lies inside the zone grown by `radius` on every side.
    #[inline]
    pub fn is_nearby(&self, segment: Segment, radius: i32) -> bool {
        segment.x >= self.min.x - radius && segment.y >= self.min.y - radius
            && segment.z >= self.min.z - radius
            && segment.x <= self.max.x + radius && segment.y <= self.max.y + radius
            && segment.z <= self.max.z + radius
    }

    /// Number of segments covered.
    pub fn volume(&self) -> u64 {
        let span = |lo: i32, hi: i32| u64::from(lo.abs_diff(hi)) + 1;
        span(self.min.x, self.max.x) * span(self.min.y, self.max.y) * span(self.min.z, self.max.z)
    }

    /// Every segment covered, in x-major order.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        (self.min.x..=self.max.x).flat_map(move |x| {
            (self.min.y..=self.max.y).flat_map(move |y| {
                (self.min.z..=self.max.z).map(move |z| Segment::new(x, y, z))
            })
        })
    }

    /// Distance travelled from `pos` along `motion` until the zone's box is
    /// hit, or `None` if the ray misses it.  Returns `0.0` when `pos` is
    /// already inside.
    ///
    /// The box spans the full volume of its segments: `min .. max + 1` on
    /// every axis.  Slab test; `motion` need not be normalised.
    pub fn hit_test(&self, pos: [f64; 3], motion: [f64; 3]) -> Option<f64> {
        let lo = [self.min.x as f64, self.min.y as f64, self.min.z as f64];
        let hi = [self.max.x as f64 + 1.0, self.max.y as f64 + 1.0, self.max.z as f64 + 1.0];

        let len = motion.iter().map(|m| m * m).sum::<f64>().sqrt();
        let mut t_enter = 0.0_f64;
        let mut t_exit = f64::INFINITY;

        for axis in 0..3 {
            let (p, m) = (pos[axis], motion[axis]);
            if m.abs() < 1e-12 {
                if p < lo[axis] || p > hi[axis] {
                    return None;
                }
                continue;
            }
            let t1 = (lo[axis] - p) / m;
            let t2 = (hi[axis] - p) / m;
            t_enter = t_enter.max(t1.min(t2));
            t_exit = t_exit.min(t1.max(t2));
            if t_exit < t_enter {
                return None;
            }
        }

        if t_enter == 0.0 {
            return Some(0.0);
        }
        Some(t_enter * len)
    }
}
