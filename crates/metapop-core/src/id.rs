//! Strongly-typed identifiers for simulated days and region slots.

use std::fmt;

/// A simulated calendar day, counted from day 0 (the configured start date).
///
/// Incremented once per scheduler step. Day `t` is the day being advanced
/// by step `t`; synchronization for day `t` runs after every region has
/// completed that step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Day(pub u32);

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Day {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Positional index of a region within a scheduler run.
///
/// Regions are registered in configuration order and assigned sequential
/// indices. `RegionIdx(n)` is the n-th region. The index order is
/// load-bearing: the contiguous mobility allocator packs inbound slots
/// ordered by source-region index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionIdx(pub u32);

impl fmt::Display for RegionIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for RegionIdx {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl RegionIdx {
    /// The index as a `usize`, for slice access.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
