//! Traveler index allocation strategies.
//!
//! Given the mobility matrix and per-region population sizes, allocation
//! assigns every ordered region pair a pair of equal-length id lists
//! (see [`PairIds`]). Two interchangeable strategies exist:
//!
//! - [`AllocatorStrategy::Contiguous`]: deterministic cumulative-sum
//!   packing. Outgoing ids are a contiguous sub-range of the home
//!   region's local slots; inbound visitor slots pack contiguously after
//!   the destination's local slots, ordered by source-region index.
//! - [`AllocatorStrategy::RandomUnique`]: seeded random draws without
//!   replacement from the whole slot space, ids removed from the pool
//!   immediately so none is reused across pairs. Deterministic for a
//!   fixed seed.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use metapop_core::RegionIdx;

use crate::error::MobilityError;
use crate::mapping::{MobilityIndexMapping, PairIds};
use crate::matrix::MobilityMatrix;

/// Per-region population sizes and data availability for allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionPopulation {
    /// Population excluding inbound visitor slots.
    pub original: u64,
    /// Population including inbound visitor slots.
    pub augmented: u64,
    /// `false` if the region has no mobility data at all; such a region
    /// is excluded from every pair it appears in.
    pub has_mobility_data: bool,
}

/// How traveler slot ids are chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocatorStrategy {
    /// Cumulative-sum packing: outgoing ids in `[0, original)`, incoming
    /// ids in `[original, augmented)`, both ordered by region index.
    Contiguous,
    /// Distinct ids drawn without replacement from `[0, augmented)`
    /// with a ChaCha8 RNG seeded from `seed`.
    RandomUnique {
        /// RNG seed; identical seeds produce identical mappings.
        seed: u64,
    },
}

/// Compute the traveler index mapping for a run.
///
/// `populations[i]` describes the region at matrix index `i`. Pairs
/// where either side lacks mobility data are omitted from the mapping.
///
/// # Errors
///
/// [`MobilityError::RegionCountMismatch`] if the inputs disagree on
/// region count, [`MobilityError::PopulationTooLarge`] if a region's
/// slot space exceeds `u32`, and [`MobilityError::CapacityExceeded`] if
/// a region's slot space cannot hold the ids the strategy must place in
/// it.
pub fn allocate(
    matrix: &MobilityMatrix,
    populations: &[RegionPopulation],
    strategy: AllocatorStrategy,
) -> Result<MobilityIndexMapping, MobilityError> {
    let n = matrix.n_regions();
    if populations.len() != n {
        return Err(MobilityError::RegionCountMismatch {
            matrix: n,
            populations: populations.len(),
        });
    }
    for (region, pop) in populations.iter().enumerate() {
        if u32::try_from(pop.augmented).is_err() {
            return Err(MobilityError::PopulationTooLarge {
                region,
                size: pop.augmented,
            });
        }
    }

    match strategy {
        AllocatorStrategy::Contiguous => allocate_contiguous(matrix, populations),
        AllocatorStrategy::RandomUnique { seed } => allocate_random(matrix, populations, seed),
    }
}

/// `true` if ordered pair `(i, j)` participates in synchronization.
fn pair_eligible(populations: &[RegionPopulation], i: usize, j: usize) -> bool {
    i != j && populations[i].has_mobility_data && populations[j].has_mobility_data
}

fn allocate_contiguous(
    matrix: &MobilityMatrix,
    populations: &[RegionPopulation],
) -> Result<MobilityIndexMapping, MobilityError> {
    let n = matrix.n_regions();

    // Capacity first: outgoing ids must fit the local range, incoming
    // ids the visitor range, before any pair is materialized.
    for (region, pop) in populations.iter().enumerate() {
        if !pop.has_mobility_data {
            continue;
        }
        let out_total = matrix.row_total(region);
        if out_total > pop.original {
            return Err(MobilityError::CapacityExceeded {
                region,
                required: out_total,
                available: pop.original,
            });
        }
        let in_total = matrix.col_total(region);
        if pop.original + in_total > pop.augmented {
            return Err(MobilityError::CapacityExceeded {
                region,
                required: pop.original + in_total,
                available: pop.augmented,
            });
        }
    }

    let mut mapping = MobilityIndexMapping::new(n);
    for i in 0..n {
        for j in 0..n {
            if !pair_eligible(populations, i, j) {
                continue;
            }
            let count = matrix.flow(i, j);
            let out_start = matrix.row_prefix(i, j);
            let in_start = populations[j].original + matrix.col_prefix(j, i);
            mapping.insert(
                RegionIdx(i as u32),
                RegionIdx(j as u32),
                PairIds {
                    outgoing: id_range(out_start, count),
                    incoming: id_range(in_start, count),
                },
            );
        }
    }
    Ok(mapping)
}

fn id_range(start: u64, count: u64) -> Vec<u32> {
    (start..start + count).map(|id| id as u32).collect()
}

fn allocate_random(
    matrix: &MobilityMatrix,
    populations: &[RegionPopulation],
    seed: u64,
) -> Result<MobilityIndexMapping, MobilityError> {
    let n = matrix.n_regions();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    // Per region: one draw of all needed distinct ids, then carved up
    // per counterpart so no id is reused across pairs. Incoming is
    // carved before outgoing for each counterpart, in region order.
    let mut outgoing: Vec<Vec<Vec<u32>>> = vec![vec![Vec::new(); n]; n];
    let mut incoming: Vec<Vec<Vec<u32>>> = vec![vec![Vec::new(); n]; n];

    for i in 0..n {
        if !populations[i].has_mobility_data {
            continue;
        }
        let total: u64 = (0..n)
            .filter(|&j| pair_eligible(populations, i, j))
            .map(|j| matrix.flow(i, j) + matrix.flow(j, i))
            .sum();
        let available = populations[i].augmented;
        if total > available {
            return Err(MobilityError::CapacityExceeded {
                region: i,
                required: total,
                available,
            });
        }

        let pool: Vec<u32> = rand::seq::index::sample(&mut rng, available as usize, total as usize)
            .into_iter()
            .map(|id| id as u32)
            .collect();
        let mut cursor = 0usize;
        let mut take = |count: u64, cursor: &mut usize| -> Vec<u32> {
            let end = *cursor + count as usize;
            let ids = pool[*cursor..end].to_vec();
            *cursor = end;
            ids
        };

        for j in 0..n {
            if !pair_eligible(populations, i, j) {
                continue;
            }
            // Visitor slots in region i for people whose home is j.
            incoming[j][i] = take(matrix.flow(j, i), &mut cursor);
            // Home slots in region i for people commuting to j.
            outgoing[i][j] = take(matrix.flow(i, j), &mut cursor);
        }
    }

    let mut mapping = MobilityIndexMapping::new(n);
    for i in 0..n {
        for j in 0..n {
            if !pair_eligible(populations, i, j) {
                continue;
            }
            mapping.insert(
                RegionIdx(i as u32),
                RegionIdx(j as u32),
                PairIds {
                    outgoing: std::mem::take(&mut outgoing[i][j]),
                    incoming: std::mem::take(&mut incoming[i][j]),
                },
            );
        }
    }
    Ok(mapping)
}
