//! Error types for mobility matrix construction and index allocation.

use std::error::Error;
use std::fmt;

/// Errors detected while building a mobility matrix or allocating
/// traveler indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MobilityError {
    /// A matrix row has a different length than the region count.
    NotSquare {
        /// Index of the offending row.
        row: usize,
        /// Length of that row.
        row_len: usize,
        /// Expected length (number of rows).
        expected: usize,
    },
    /// The matrix and the population vector disagree on region count.
    RegionCountMismatch {
        /// Region count implied by the matrix.
        matrix: usize,
        /// Region count implied by the population vector.
        populations: usize,
    },
    /// A region's population does not fit the `u32` slot index space.
    PopulationTooLarge {
        /// Index of the region.
        region: usize,
        /// The configured augmented population size.
        size: u64,
    },
    /// A region's slot space cannot hold the ids a strategy must draw
    /// from it.
    CapacityExceeded {
        /// Index of the region.
        region: usize,
        /// Number of slots the strategy needs.
        required: u64,
        /// Number of slots available.
        available: u64,
    },
}

impl fmt::Display for MobilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSquare {
                row,
                row_len,
                expected,
            } => {
                write!(
                    f,
                    "mobility matrix row {row} has {row_len} entries, expected {expected}"
                )
            }
            Self::RegionCountMismatch {
                matrix,
                populations,
            } => {
                write!(
                    f,
                    "mobility matrix covers {matrix} regions but {populations} populations given"
                )
            }
            Self::PopulationTooLarge { region, size } => {
                write!(f, "region {region} population {size} exceeds the slot index space")
            }
            Self::CapacityExceeded {
                region,
                required,
                available,
            } => {
                write!(
                    f,
                    "region {region} needs {required} traveler slots but only {available} are available"
                )
            }
        }
    }
}

impl Error for MobilityError {}
