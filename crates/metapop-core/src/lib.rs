//! Core types and traits for the metapop multi-region simulation framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions shared across the metapop workspace:
//! day/region identifiers, the enumerated per-agent attribute sets, the
//! missing-value sentinel convention, the [`RegionEngine`] trait behind
//! which the per-region epidemic engine lives, and the core error kinds.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod attr;
pub mod error;
pub mod id;
pub mod params;
pub mod traits;

pub use attr::{is_missing, ScalarAttr, VariantAttr, MISSING};
pub use error::{EngineError, SyncError};
pub use id::{Day, RegionIdx};
pub use params::{EngineInterventionSpec, ParamValue, PopulationSource, VariantSpec};
pub use traits::{EngineBuildSpec, EngineFactory, EngineSummary, RegionEngine};
