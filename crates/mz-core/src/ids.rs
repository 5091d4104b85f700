//! Typed identifiers.
//!
//! Each id is a plain `u32` newtype.  Slot ids double as indices into the
//! registry's slot table, hence [`SlotId::index`].

use std::fmt;

macro_rules! typed_id {
    ($(#[$attr:meta])* $label:literal $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub u32);

        impl $name {
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        /// Prints as e.g. `agent 3`.
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, " {}"), self.0)
            }
        }
    };
}

typed_id! {
    /// A train (or any other independently moving agent) competing for track.
    "agent" pub struct AgentId;
}

typed_id! {
    /// A declared zone.  Stable for the lifetime of the declaration.
    "zone" pub struct ZoneId;
}

typed_id! {
    /// Index of an arbitration slot in the slot registry.
    "slot" pub struct SlotId;
}
