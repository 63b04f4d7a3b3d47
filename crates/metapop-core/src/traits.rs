//! The [`RegionEngine`] and [`EngineFactory`] traits.
//!
//! The per-region epidemic simulation is a black box behind
//! [`RegionEngine`]: this workspace only reads and writes its per-agent
//! state buffers and advances it one day at a time. Engines are built
//! through an [`EngineFactory`] so region construction can be fanned out
//! across worker threads.

use indexmap::IndexMap;

use crate::attr::{ScalarAttr, VariantAttr};
use crate::error::EngineError;
use crate::id::Day;
use crate::params::{EngineInterventionSpec, ParamValue, PopulationSource, VariantSpec};

/// Aggregate epidemic metrics reported by an engine.
///
/// Totals are cumulative from day 0 through the most recent completed
/// step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineSummary {
    /// Total new infections recorded so far.
    pub total_new_infections: u64,
    /// Cumulative deaths recorded so far.
    pub cumulative_deaths: u64,
}

/// Everything an [`EngineFactory`] needs to build one region's engine.
///
/// Produced by the region coordinator after parameter splitting,
/// population sizing, and intervention partitioning. The population size
/// is the augmented size (local agents plus inbound visitor slots).
#[derive(Clone, Debug)]
pub struct EngineBuildSpec {
    /// Display label for the engine (region name by default).
    pub label: String,
    /// Unique location code of the region.
    pub location_code: String,
    /// Augmented population size: agents plus inbound visitor slots.
    pub population_size: u64,
    /// Run-time epidemic parameters, already filtered against the schema.
    pub parameters: IndexMap<String, ParamValue>,
    /// Engine interventions (mobility pauses have been removed).
    pub interventions: Vec<EngineInterventionSpec>,
    /// Disease variants to track.
    pub variants: Vec<VariantSpec>,
    /// Population source mode.
    pub population: PopulationSource,
}

/// One region's epidemic simulation engine.
///
/// # Contract
///
/// - [`step()`](RegionEngine::step) advances exactly one simulated day.
/// - Attribute accessors return buffers of length
///   [`n_agents()`](RegionEngine::n_agents); a variant buffer exists for
///   every variant index below [`n_variants()`](RegionEngine::n_variants).
/// - Buffers use [`MISSING`](crate::attr::MISSING) for "not yet set".
/// - The engine owns its state exclusively; the synchronizer is the only
///   external writer, one region pair at a time.
///
/// # Object safety
///
/// Object-safe; coordinators store engines as `Box<dyn RegionEngine>`.
/// `Send` so a region can be stepped on a worker thread.
pub trait RegionEngine: Send {
    /// Display label for logs and error messages.
    fn label(&self) -> &str;

    /// Number of agent slots, including inbound visitor slots.
    fn n_agents(&self) -> usize;

    /// Number of disease variants tracked by the per-variant buffers.
    fn n_variants(&self) -> usize;

    /// Number of days this engine is configured to simulate.
    ///
    /// The scheduler runs `configured_days() + 1` steps: day 0 through
    /// the final day inclusive.
    fn configured_days(&self) -> u32;

    /// Calendar date string (ISO 8601, `YYYY-MM-DD`) for simulated day
    /// `day`.
    fn date(&self, day: Day) -> String;

    /// Prepare the engine for stepping. Called once, before day 0.
    fn initialize(&mut self) -> Result<(), EngineError>;

    /// Advance the simulation by exactly one day.
    fn step(&mut self) -> Result<(), EngineError>;

    /// Read a scalar attribute buffer.
    fn scalar(&self, attr: ScalarAttr) -> &[f64];

    /// Mutably borrow a scalar attribute buffer.
    fn scalar_mut(&mut self, attr: ScalarAttr) -> &mut [f64];

    /// Read one variant's buffer of a per-variant attribute.
    ///
    /// # Panics
    ///
    /// May panic if `variant >= n_variants()`; the synchronizer checks
    /// variant counts before reading.
    fn variant(&self, attr: VariantAttr, variant: usize) -> &[f64];

    /// Mutably borrow one variant's buffer of a per-variant attribute.
    fn variant_mut(&mut self, attr: VariantAttr, variant: usize) -> &mut [f64];

    /// Aggregate metrics through the most recent completed step.
    fn summary(&self) -> EngineSummary;

    /// Finish the run: close out result series and release transient
    /// state. Called exactly once, after the final step.
    fn finalize(&mut self) -> Result<(), EngineError>;
}

/// Builds [`RegionEngine`] instances from build specs.
///
/// `Send + Sync` so one factory can serve concurrent region
/// construction workers.
pub trait EngineFactory: Send + Sync {
    /// Build an engine for one region.
    ///
    /// Returns [`EngineError::BuildFailed`] or
    /// [`EngineError::MissingPopulationFile`] on rejection; a factory
    /// must never hand back a half-constructed engine.
    fn build(&self, spec: &EngineBuildSpec) -> Result<Box<dyn RegionEngine>, EngineError>;
}
