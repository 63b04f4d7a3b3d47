//! The immutable per-pair traveler index mapping.

use indexmap::IndexMap;
use metapop_core::RegionIdx;

/// Paired slot ids for one ordered region pair `(from, to)`.
///
/// Position `k` in both lists identifies the same traveling person:
/// `outgoing[k]` is their slot in the home region `from`, `incoming[k]`
/// their visitor slot in the destination region `to`. The lists always
/// have equal length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairIds {
    /// Slot ids in the home region's agent space.
    pub outgoing: Vec<u32>,
    /// Slot ids in the destination region's agent space.
    pub incoming: Vec<u32>,
}

impl PairIds {
    /// Number of travelers on this pair.
    pub fn len(&self) -> usize {
        self.outgoing.len()
    }

    /// `true` if no one travels on this pair.
    pub fn is_empty(&self) -> bool {
        self.outgoing.is_empty()
    }
}

/// The complete traveler index mapping for a scheduler run.
///
/// Computed once at run start by [`allocate`](crate::allocator::allocate)
/// and read-only thereafter; every per-day synchronization shares it.
/// Ordered pairs involving a region without mobility data are absent
/// entirely — those regions never synchronize.
#[derive(Clone, Debug, Default)]
pub struct MobilityIndexMapping {
    n_regions: usize,
    pairs: IndexMap<(u32, u32), PairIds>,
}

impl MobilityIndexMapping {
    pub(crate) fn new(n_regions: usize) -> Self {
        Self {
            n_regions,
            pairs: IndexMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, from: RegionIdx, to: RegionIdx, ids: PairIds) {
        debug_assert_eq!(ids.outgoing.len(), ids.incoming.len());
        self.pairs.insert((from.0, to.0), ids);
    }

    /// Number of regions the mapping was allocated over.
    pub fn n_regions(&self) -> usize {
        self.n_regions
    }

    /// The paired ids for ordered pair `(from, to)`, or `None` if either
    /// region is excluded from synchronization.
    pub fn pair(&self, from: RegionIdx, to: RegionIdx) -> Option<&PairIds> {
        self.pairs.get(&(from.0, to.0))
    }

    /// Number of ordered pairs present in the mapping.
    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    /// Iterate over all present ordered pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = ((RegionIdx, RegionIdx), &PairIds)> {
        self.pairs
            .iter()
            .map(|(&(a, b), ids)| ((RegionIdx(a), RegionIdx(b)), ids))
    }
}
