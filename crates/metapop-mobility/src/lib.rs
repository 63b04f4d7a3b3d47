//! Mobility matrices and traveler index allocation for metapop.
//!
//! Movement between regions is modeled as duplicated agent slots, not
//! relocation: a commuter occupies one slot in their home region and one
//! "visitor" slot in the destination region. This crate computes, per
//! ordered region pair, the paired index lists identifying the same
//! traveling person in each region's slot space. The mapping is computed
//! once at run start and is immutable thereafter.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod allocator;
pub mod error;
pub mod mapping;
pub mod matrix;

pub use allocator::{allocate, AllocatorStrategy, RegionPopulation};
pub use error::MobilityError;
pub use mapping::{MobilityIndexMapping, PairIds};
pub use matrix::MobilityMatrix;
