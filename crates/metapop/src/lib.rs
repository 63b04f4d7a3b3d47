//! Metapop: couple independently-running agent-based epidemic
//! simulations, one per geographic region, into one consistent
//! multi-region model.
//!
//! People who commute between regions exist as duplicated agent slots,
//! one in their home region and one "visitor" slot in the destination.
//! Metapop computes a stable index mapping between those slots once per
//! run, then advances every region day by day and reconciles the
//! duplicated state after each step. The per-region epidemic engine is
//! a black box behind the [`prelude::RegionEngine`] trait.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all metapop sub-crates. For most users, adding `metapop` as a
//! single dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use metapop::prelude::*;
//! use metapop_test_utils::ScriptedFactory;
//!
//! // Two regions of 1000 locals; 50 people commute A→B and 30 B→A.
//! let flows = |entries: &[(&str, u64)]| {
//!     Some(
//!         entries
//!             .iter()
//!             .map(|&(code, n)| (code.to_string(), Some(n)))
//!             .collect::<MobilityFlows>(),
//!     )
//! };
//! let region = |code: &str, outgoing, incoming| RegionSpec {
//!     location_code: code.to_string(),
//!     name: code.to_string(),
//!     population_size: 1000,
//!     mobility_outgoing: outgoing,
//!     mobility_incoming: incoming,
//!     region_pars: Default::default(),
//!     interventions: vec![],
//!     variants: vec![],
//! };
//! let config = SchedulerConfig {
//!     regions: vec![
//!         region("A", flows(&[("B", 50)]), flows(&[("B", 30)])),
//!         region("B", flows(&[("A", 30)]), flows(&[("A", 50)])),
//!     ],
//!     mobility_enabled: true,
//!     strategy: ExecStrategy::Sequential,
//!     allocator: AllocatorStrategy::Contiguous,
//!     test: None,
//! };
//!
//! // A real run plugs in an engine factory wrapping the epidemic
//! // simulator; the scripted factory stands in for one here.
//! let factory = ScriptedFactory::new(9);
//! let result = MultiRegionScheduler::new(&config, &factory)
//!     .unwrap()
//!     .run()
//!     .unwrap();
//! assert_eq!(result.simulation_days, 10);
//! assert_eq!(result.regions[0].population, 1030);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in
//! the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `metapop-core` | IDs, attribute enums, engine traits, core errors |
//! | [`mobility`] | `metapop-mobility` | Mobility matrix and traveler index allocation |
//! | [`sync`] | `metapop-sync` | Cross-region person-state synchronization |
//! | [`engine`] | `metapop-engine` | Region coordination and the multi-region scheduler |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`metapop-core`).
///
/// Contains the attribute enums, the missing-value sentinel, the
/// [`types::RegionEngine`] and [`types::EngineFactory`] traits, and the
/// core error kinds.
pub use metapop_core as types;

/// Mobility matrices and traveler index allocation (`metapop-mobility`).
///
/// Build a [`mobility::MobilityMatrix`] and compute the per-pair
/// [`mobility::MobilityIndexMapping`] with
/// [`mobility::allocate`].
pub use metapop_mobility as mobility;

/// Cross-region person-state synchronization (`metapop-sync`).
///
/// [`sync::synchronize_pair`] reconciles one traveling cohort's
/// duplicated state between its home and visited region.
pub use metapop_sync as sync;

/// Region coordination and multi-region scheduling (`metapop-engine`).
///
/// [`engine::MultiRegionScheduler`] owns the day loop;
/// [`engine::RegionCoordinator`] owns one region's engine lifecycle.
pub use metapop_engine as engine;

/// Common imports for typical metapop usage.
///
/// ```rust
/// use metapop::prelude::*;
/// ```
///
/// This imports the most frequently used types: the scheduler and its
/// configuration, the engine traits, the attribute enums, and the
/// error kinds.
pub mod prelude {
    // Core types and traits
    pub use metapop_core::{
        is_missing, Day, EngineBuildSpec, EngineFactory, EngineInterventionSpec, EngineSummary,
        ParamValue, PopulationSource, RegionEngine, RegionIdx, ScalarAttr, VariantAttr,
        VariantSpec, MISSING,
    };

    // Errors
    pub use metapop_core::{EngineError, SyncError};
    pub use metapop_engine::{ConfigError, RunError};
    pub use metapop_mobility::MobilityError;

    // Mobility
    pub use metapop_mobility::{
        allocate, AllocatorStrategy, MobilityIndexMapping, MobilityMatrix, PairIds,
        RegionPopulation,
    };

    // Synchronization
    pub use metapop_sync::{synchronize_pair, SyncStats};

    // Scheduler
    pub use metapop_engine::{
        DayMetrics, ExecStrategy, InterventionSpec, MobilityFlows, MultiRegionResult,
        MultiRegionScheduler, RegionCoordinator, RegionResultSummary, RegionSpec,
        SchedulerConfig, TestSettings,
    };
}
