//! Zone lock modes.
//!
//! The rule set is small and fixed, so the mode is a closed enum and the
//! arbitration code matches on it directly.

/// How much of a zone a single claim locks.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LockMode {
    /// Claiming any segment excludes every other agent from the whole slot.
    #[default]
    Full,
    /// Exclusion is per segment; disjoint claims may coexist.
    Smart,
}

impl LockMode {
    /// `true` for [`LockMode::Full`].
    #[inline]
    pub fn is_full(self) -> bool {
        matches!(self, LockMode::Full)
    }

    /// Human-readable label, useful for CSV column values and status text.
    pub fn as_str(self) -> &'static str {
        match self {
            LockMode::Full  => "full",
            LockMode::Smart => "smart",
        }
    }
}

impl std::fmt::Display for LockMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
