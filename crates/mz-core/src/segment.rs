//! Track segment coordinate.
//!
//! A `Segment` is one discrete unit of track (a rail block), addressed by its
//! integer world coordinates.  It is the intersection key between the track an
//! agent occupies and the region a zone covers.

use std::fmt;

/// Integer 3-D coordinate of a single track segment.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Segment {
    pub const ORIGIN: Segment = Segment { x: 0, y: 0, z: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The segment displaced by `(dx, dy, dz)`.
    #[inline]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self { x: self.x + dx, y: self.y + dy, z: self.z + dz }
    }

    /// Component-wise minimum: the low corner of the box spanning both.
    #[inline]
    pub fn min(self, other: Segment) -> Segment {
        Segment::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Component-wise maximum: the high corner of the box spanning both.
    #[inline]
    pub fn max(self, other: Segment) -> Segment {
        Segment::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// As an array, for use as an R-tree point.
    #[inline]
    pub fn to_array(self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<(i32, i32, i32)> for Segment {
    #[inline]
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Segment::new(x, y, z)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}/{}]", self.x, self.y, self.z)
    }
}
