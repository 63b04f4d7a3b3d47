//! Region coordination and multi-region scheduling for metapop.
//!
//! This crate couples independently-running per-region epidemic engines
//! into one multi-region run: it builds each region from a flat
//! configuration record, computes the traveler index mapping once, then
//! drives the day loop — step every region, synchronize every eligible
//! ordered pair, aggregate per-day metrics — through to finalization.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod metrics;
mod parallel;
pub mod region;
pub mod result;
pub mod scheduler;

pub use config::{
    ConfigError, ConstructorParams, ExecStrategy, InterventionSpec, MobilityFlows, ParamSchema,
    RegionSpec, SchedulerConfig, SplitParams, TestSettings,
};
pub use error::RunError;
pub use metrics::DayMetrics;
pub use region::{MobilityWindow, RegionCoordinator};
pub use result::{MultiRegionResult, RegionResultSummary};
pub use scheduler::MultiRegionScheduler;
