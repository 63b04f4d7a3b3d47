//! Cross-region person-state synchronization.
//!
//! A person who commutes between regions exists as two duplicate agent
//! slots, one per region, that drift apart as each region simulates
//! independently. Once per eligible ordered pair per simulated day, the
//! synchronizer reconciles the duplicates: for every synchronized
//! attribute it finds diverging slots and copies values so both sides
//! agree again. This is the dominant per-day cost of the multi-region
//! model.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod sync;

pub use sync::{synchronize_pair, SyncStats};
