//! Per-region lifecycle: parameter splitting, population sizing,
//! intervention partitioning, and engine ownership.

use std::fmt;
use std::path::PathBuf;

use metapop_core::{
    Day, EngineBuildSpec, EngineError, EngineFactory, EngineSummary, PopulationSource,
    RegionEngine,
};

use crate::config::{InterventionSpec, MobilityFlows, ParamSchema, RegionSpec, TestSettings};

/// An inclusive day window during which a region does not synchronize.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MobilityWindow {
    /// First paused day.
    pub start_day: u32,
    /// Last paused day, inclusive.
    pub end_day: u32,
}

impl MobilityWindow {
    /// `true` if `day` falls inside the window.
    pub fn contains(&self, day: u32) -> bool {
        self.start_day <= day && day <= self.end_day
    }
}

/// One region of a multi-region run: its sizing, its mobility data, its
/// pause windows, and the engine it owns exclusively.
///
/// Built fully or not at all: a factory or initialization failure
/// surfaces here and never leaves a half-constructed region behind to
/// fail later when stepped.
pub struct RegionCoordinator {
    location_code: String,
    name: String,
    original_population: u64,
    augmented_population: u64,
    outgoing: Option<MobilityFlows>,
    windows: Vec<MobilityWindow>,
    engine: Box<dyn RegionEngine>,
}

impl RegionCoordinator {
    /// Build and initialize one region.
    ///
    /// Applies test-mode overrides, splits the flat parameter record
    /// against `schema` (unknown keys are warned and skipped), computes
    /// the augmented population, partitions interventions so mobility
    /// pauses never reach the engine, then builds and initializes the
    /// engine through `factory`.
    pub fn build(
        spec: &RegionSpec,
        test: Option<&TestSettings>,
        schema: &ParamSchema,
        factory: &dyn EngineFactory,
    ) -> Result<Self, EngineError> {
        let original = match test {
            Some(test) => test.original_size,
            None => spec.population_size,
        };
        let outgoing = apply_test_override(&spec.mobility_outgoing, test);
        let incoming = apply_test_override(&spec.mobility_incoming, test);
        let augmented = original + present_flow_sum(&incoming);

        let split = schema.split(&spec.region_pars);
        if !split.unknown.is_empty() {
            log::warn!(
                "region {}: skipping unknown parameter keys {:?}",
                spec.location_code,
                split.unknown
            );
        }
        let population = match split.constructor.popfile {
            Some(path) if !path.is_empty() => PopulationSource::File(PathBuf::from(path)),
            _ => PopulationSource::Procedural,
        };

        let mut windows = Vec::new();
        let mut engine_interventions = Vec::new();
        for intervention in &spec.interventions {
            match intervention {
                InterventionSpec::MobilityPause {
                    start_day, end_day, ..
                } => windows.push(MobilityWindow {
                    start_day: *start_day,
                    end_day: *end_day,
                }),
                InterventionSpec::Engine(engine) => engine_interventions.push(engine.clone()),
            }
        }

        let build_spec = EngineBuildSpec {
            label: split.constructor.label.unwrap_or_else(|| spec.name.clone()),
            location_code: spec.location_code.clone(),
            population_size: augmented,
            parameters: split.engine,
            interventions: engine_interventions,
            variants: spec.variants.clone(),
            population,
        };
        let mut engine = factory.build(&build_spec)?;
        engine.initialize()?;

        Ok(Self {
            location_code: spec.location_code.clone(),
            name: spec.name.clone(),
            original_population: original,
            augmented_population: augmented,
            outgoing,
            windows,
            engine,
        })
    }

    /// Unique location code.
    pub fn location_code(&self) -> &str {
        &self.location_code
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Population size before inbound visitor slots.
    pub fn original_population(&self) -> u64 {
        self.original_population
    }

    /// Population size including inbound visitor slots.
    pub fn augmented_population(&self) -> u64 {
        self.augmented_population
    }

    /// `true` if the region carries mobility data and participates in
    /// synchronization.
    pub fn has_mobility_data(&self) -> bool {
        self.outgoing.is_some()
    }

    /// Raw outbound flow toward `code`: `None` for a missing entry or a
    /// region without mobility data.
    pub fn raw_outgoing_to(&self, code: &str) -> Option<u64> {
        self.outgoing
            .as_ref()
            .and_then(|flows| flows.get(code).copied())
            .flatten()
    }

    /// `true` if any pause window covers `day`.
    pub fn excluded_on(&self, day: u32) -> bool {
        self.windows.iter().any(|window| window.contains(day))
    }

    /// Advance the region's engine by one simulated day.
    pub fn advance_one_day(&mut self) -> Result<(), EngineError> {
        self.engine.step()
    }

    /// Days the engine is configured to simulate.
    pub fn configured_days(&self) -> u32 {
        self.engine.configured_days()
    }

    /// Calendar date for simulated day `day`.
    pub fn date(&self, day: Day) -> String {
        self.engine.date(day)
    }

    /// Aggregate metrics through the most recent completed step.
    pub fn summary(&self) -> EngineSummary {
        self.engine.summary()
    }

    /// Finish the engine's run.
    pub fn finalize(&mut self) -> Result<(), EngineError> {
        self.engine.finalize()
    }

    /// Shared access to the engine's state buffers.
    pub fn engine(&self) -> &dyn RegionEngine {
        self.engine.as_ref()
    }

    /// Exclusive access to the engine, for synchronization.
    pub fn engine_mut(&mut self) -> &mut dyn RegionEngine {
        self.engine.as_mut()
    }
}

// The engine is a trait object and is elided from the debug output.
impl fmt::Debug for RegionCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionCoordinator")
            .field("location_code", &self.location_code)
            .field("name", &self.name)
            .field("original_population", &self.original_population)
            .field("augmented_population", &self.augmented_population)
            .field("windows", &self.windows)
            .finish_non_exhaustive()
    }
}

/// Test mode forces every present flow to the configured size; missing
/// flows stay missing, and absent maps stay absent.
fn apply_test_override(
    flows: &Option<MobilityFlows>,
    test: Option<&TestSettings>,
) -> Option<MobilityFlows> {
    let flows = flows.as_ref()?;
    let Some(test) = test else {
        return Some(flows.clone());
    };
    Some(
        flows
            .iter()
            .map(|(code, flow)| (code.clone(), flow.map(|_| test.mobility_size)))
            .collect(),
    )
}

fn present_flow_sum(flows: &Option<MobilityFlows>) -> u64 {
    flows
        .iter()
        .flat_map(|flows| flows.values())
        .flatten()
        .sum()
}
