//! Run configuration: region specs, the parameter schema, test-mode
//! settings, and construction-time validation.

use std::error::Error;
use std::fmt;

use indexmap::IndexMap;

use metapop_core::{EngineInterventionSpec, ParamValue, VariantSpec};
use metapop_mobility::AllocatorStrategy;

// ── Region specification ─────────────────────────────────────

/// Daily commuter counts from or to one region, keyed by the counterpart
/// region's location code. A `None` entry is a missing (NaN) flow and
/// reads as zero; an absent map means the region carries no mobility
/// data at all and is excluded from synchronization entirely.
pub type MobilityFlows = IndexMap<String, Option<u64>>;

/// One intervention from a region's configuration.
///
/// Mobility pauses are consumed by the scheduler to gate
/// synchronization; everything else passes through to the engine
/// untouched.
#[derive(Clone, Debug, PartialEq)]
pub enum InterventionSpec {
    /// Suspend this region's synchronization for an inclusive day window.
    MobilityPause {
        /// First day of the pause.
        start_day: u32,
        /// Last day of the pause, inclusive.
        end_day: u32,
        /// Optional display label.
        label: Option<String>,
    },
    /// An intervention the engine interprets itself.
    Engine(EngineInterventionSpec),
}

/// The flat configuration record for one region.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionSpec {
    /// Unique location code, the region's identity throughout a run.
    pub location_code: String,
    /// Display name.
    pub name: String,
    /// Population size before inbound visitor slots are added.
    pub population_size: u64,
    /// Outbound commuter counts, or `None` for a region without
    /// mobility data.
    pub mobility_outgoing: Option<MobilityFlows>,
    /// Inbound commuter counts; present entries enlarge the region's
    /// agent space by that many visitor slots.
    pub mobility_incoming: Option<MobilityFlows>,
    /// Flat run-time parameter record, split by the schema at build.
    pub region_pars: IndexMap<String, ParamValue>,
    /// Interventions, mobility pauses included.
    pub interventions: Vec<InterventionSpec>,
    /// Disease variants to seed.
    pub variants: Vec<VariantSpec>,
}

// ── Parameter schema ─────────────────────────────────────────

/// Keys of the flat parameter record that configure region
/// construction rather than the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ConstructorKey {
    Label,
    PopulationFile,
    LocationCode,
}

/// Constructor-side parameters extracted from a region's flat record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstructorParams {
    /// Display label override.
    pub label: Option<String>,
    /// Path to a pre-generated population file.
    pub popfile: Option<String>,
    /// Location code carried inside the record (informational; the
    /// spec's own code is authoritative).
    pub location_code: Option<String>,
}

/// A flat parameter record split against the schema.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SplitParams {
    /// Parameters consumed by region construction.
    pub constructor: ConstructorParams,
    /// Parameters handed through to the engine.
    pub engine: IndexMap<String, ParamValue>,
    /// Keys the schema does not know; skipped, but recorded so the
    /// caller can warn.
    pub unknown: Vec<String>,
}

/// The immutable split schema for flat parameter records.
///
/// Built once per run; classifies each key as a constructor parameter,
/// a known engine parameter, or unknown.
#[derive(Clone, Debug)]
pub struct ParamSchema {
    constructor: &'static [(&'static str, ConstructorKey)],
    engine: &'static [&'static str],
}

impl ParamSchema {
    /// The standard schema for upstream region records.
    pub fn standard() -> Self {
        Self {
            constructor: &[
                ("label", ConstructorKey::Label),
                ("popfile", ConstructorKey::PopulationFile),
                ("location_code", ConstructorKey::LocationCode),
            ],
            engine: &[
                "pop_size",
                "pop_type",
                "pop_infected",
                "n_days",
                "start_day",
                "end_day",
                "rand_seed",
                "beta",
                "rel_beta",
                "rescale",
                "location",
                "n_imports",
                "verbose",
            ],
        }
    }

    /// Split a flat record into constructor and engine parameters.
    ///
    /// Unknown keys are collected, never dropped silently.
    pub fn split(&self, pars: &IndexMap<String, ParamValue>) -> SplitParams {
        let mut out = SplitParams::default();
        for (key, value) in pars {
            if let Some((_, role)) = self.constructor.iter().find(|(k, _)| k == key) {
                let text = value.as_text().map(str::to_string).or_else(|| {
                    // Tolerate non-text constructor values by rendering.
                    Some(value.to_string())
                });
                match role {
                    ConstructorKey::Label => out.constructor.label = text,
                    ConstructorKey::PopulationFile => out.constructor.popfile = text,
                    ConstructorKey::LocationCode => out.constructor.location_code = text,
                }
            } else if self.engine.contains(&key.as_str()) {
                out.engine.insert(key.clone(), value.clone());
            } else {
                out.unknown.push(key.clone());
            }
        }
        out
    }
}

// ── Test-mode settings ───────────────────────────────────────

/// Shrunk population and flow sizes for fast test runs.
///
/// When active, every region's population is forced to
/// `original_size` and every present mobility flow to `mobility_size`;
/// missing flows stay missing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TestSettings {
    /// Forced population size before visitor slots.
    pub original_size: u64,
    /// Forced commuter count for every present flow.
    pub mobility_size: u64,
}

impl Default for TestSettings {
    fn default() -> Self {
        Self {
            original_size: 20_000,
            mobility_size: 200,
        }
    }
}

// ── Scheduler configuration ──────────────────────────────────

/// How regions are advanced each simulated day.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecStrategy {
    /// One region after another, in configuration order.
    #[default]
    Sequential,
    /// One scoped thread per region per day; the join is the
    /// day-boundary barrier.
    Concurrent,
}

/// Complete configuration for a multi-region run.
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Regions in configuration order; the order assigns matrix indices.
    pub regions: Vec<RegionSpec>,
    /// `false` disables synchronization entirely (regions still step).
    pub mobility_enabled: bool,
    /// Stepping strategy.
    pub strategy: ExecStrategy,
    /// Traveler slot allocation strategy.
    pub allocator: AllocatorStrategy,
    /// Test-mode overrides, if any.
    pub test: Option<TestSettings>,
}

impl SchedulerConfig {
    /// Validate the configuration before any region is built.
    ///
    /// # Errors
    ///
    /// Rejects an empty region list, duplicate location codes, mobility
    /// flows naming unknown codes, pairwise-inconsistent flow
    /// declarations, and zero-sized test settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.regions.is_empty() {
            return Err(ConfigError::NoRegions);
        }
        let mut codes: IndexMap<&str, ()> = IndexMap::new();
        for spec in &self.regions {
            if codes.insert(spec.location_code.as_str(), ()).is_some() {
                return Err(ConfigError::DuplicateRegion {
                    code: spec.location_code.clone(),
                });
            }
        }
        for spec in &self.regions {
            for flows in [&spec.mobility_outgoing, &spec.mobility_incoming]
                .into_iter()
                .flatten()
            {
                for code in flows.keys() {
                    if !codes.contains_key(code.as_str()) {
                        return Err(ConfigError::UnknownRegionCode {
                            region: spec.location_code.clone(),
                            code: code.clone(),
                        });
                    }
                }
            }
        }
        // Declared flows must agree pairwise: the commuter count region
        // `from` sends toward `to` is the same count `to` sizes its
        // visitor slots from. An over-declared outgoing flow would
        // overrun the destination's slot space; an under-declared one
        // would leave visitor slots that are never synchronized.
        for from in &self.regions {
            let Some(outgoing_map) = &from.mobility_outgoing else {
                continue;
            };
            for to in &self.regions {
                if to.location_code == from.location_code || to.mobility_outgoing.is_none() {
                    continue;
                }
                let outgoing = outgoing_map.get(&to.location_code).copied().flatten();
                let incoming = to
                    .mobility_incoming
                    .as_ref()
                    .and_then(|flows| flows.get(&from.location_code).copied())
                    .flatten();
                if outgoing != incoming {
                    return Err(ConfigError::InconsistentFlow {
                        from: from.location_code.clone(),
                        to: to.location_code.clone(),
                        outgoing,
                        incoming,
                    });
                }
            }
        }
        if let Some(test) = &self.test {
            if test.original_size == 0 || test.mobility_size == 0 {
                return Err(ConfigError::InvalidTestSettings {
                    original_size: test.original_size,
                    mobility_size: test.mobility_size,
                });
            }
        }
        Ok(())
    }
}

// ── Errors ───────────────────────────────────────────────────

/// Configuration rejected before any region was built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The region list is empty.
    NoRegions,
    /// Two regions share a location code.
    DuplicateRegion {
        /// The duplicated code.
        code: String,
    },
    /// A mobility flow names a location code outside the region set.
    UnknownRegionCode {
        /// The region whose flows are at fault.
        region: String,
        /// The unknown counterpart code.
        code: String,
    },
    /// A pair of regions with mobility data disagree on the commuter
    /// count between them.
    InconsistentFlow {
        /// The sending region's location code.
        from: String,
        /// The receiving region's location code.
        to: String,
        /// The flow `from` declares outgoing, `None` for missing.
        outgoing: Option<u64>,
        /// The flow `to` declares incoming, `None` for missing.
        incoming: Option<u64>,
    },
    /// Test-mode sizes must both be positive.
    InvalidTestSettings {
        /// Configured population size.
        original_size: u64,
        /// Configured flow size.
        mobility_size: u64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRegions => write!(f, "configuration contains no regions"),
            Self::DuplicateRegion { code } => {
                write!(f, "duplicate region location code '{code}'")
            }
            Self::UnknownRegionCode { region, code } => {
                write!(
                    f,
                    "region '{region}' has a mobility flow to unknown code '{code}'"
                )
            }
            Self::InconsistentFlow {
                from,
                to,
                outgoing,
                incoming,
            } => {
                write!(
                    f,
                    "flow from '{from}' to '{to}' declared inconsistently: {} outgoing, \
                     {} incoming",
                    flow_repr(outgoing),
                    flow_repr(incoming)
                )
            }
            Self::InvalidTestSettings {
                original_size,
                mobility_size,
            } => {
                write!(
                    f,
                    "test settings must be positive (original_size {original_size}, \
                     mobility_size {mobility_size})"
                )
            }
        }
    }
}

fn flow_repr(flow: &Option<u64>) -> String {
    match flow {
        Some(count) => count.to_string(),
        None => "missing".to_string(),
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_region(code: &str) -> RegionSpec {
        RegionSpec {
            location_code: code.to_string(),
            name: code.to_string(),
            population_size: 100,
            mobility_outgoing: None,
            mobility_incoming: None,
            region_pars: IndexMap::new(),
            interventions: Vec::new(),
            variants: Vec::new(),
        }
    }

    #[test]
    fn schema_splits_constructor_engine_and_unknown() {
        let schema = ParamSchema::standard();
        let mut pars = IndexMap::new();
        pars.insert("label".to_string(), ParamValue::Text("Prague".to_string()));
        pars.insert(
            "popfile".to_string(),
            ParamValue::Text("pops/cz010.pop".to_string()),
        );
        pars.insert("n_days".to_string(), ParamValue::Number(60.0));
        pars.insert("beta".to_string(), ParamValue::Number(0.016));
        pars.insert("bogus_key".to_string(), ParamValue::Flag(true));

        let split = schema.split(&pars);
        assert_eq!(split.constructor.label.as_deref(), Some("Prague"));
        assert_eq!(split.constructor.popfile.as_deref(), Some("pops/cz010.pop"));
        assert_eq!(split.engine.len(), 2);
        assert!(split.engine.contains_key("n_days"));
        assert!(!split.engine.contains_key("bogus_key"));
        assert_eq!(split.unknown, vec!["bogus_key".to_string()]);
    }

    #[test]
    fn schema_preserves_engine_parameter_order() {
        let schema = ParamSchema::standard();
        let mut pars = IndexMap::new();
        pars.insert("rand_seed".to_string(), ParamValue::Number(7.0));
        pars.insert("n_days".to_string(), ParamValue::Number(30.0));
        let split = schema.split(&pars);
        let keys: Vec<&str> = split.engine.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["rand_seed", "n_days"]);
    }

    #[test]
    fn validate_rejects_duplicate_codes() {
        let config = SchedulerConfig {
            regions: vec![bare_region("CZ010"), bare_region("CZ010")],
            mobility_enabled: true,
            strategy: ExecStrategy::Sequential,
            allocator: AllocatorStrategy::Contiguous,
            test: None,
        };
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigError::DuplicateRegion {
                code: "CZ010".to_string()
            }
        );
    }

    #[test]
    fn validate_rejects_flow_to_unknown_code() {
        let mut region = bare_region("CZ010");
        let mut flows = MobilityFlows::new();
        flows.insert("CZ999".to_string(), Some(10));
        region.mobility_outgoing = Some(flows);
        let config = SchedulerConfig {
            regions: vec![region, bare_region("CZ020")],
            mobility_enabled: true,
            strategy: ExecStrategy::Sequential,
            allocator: AllocatorStrategy::Contiguous,
            test: None,
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::UnknownRegionCode { ref code, .. } if code == "CZ999"
        ));
    }

    fn paired_regions(outgoing: Option<u64>, incoming: Option<u64>) -> Vec<RegionSpec> {
        let mut a = bare_region("CZ010");
        let mut a_out = MobilityFlows::new();
        if let Some(flow) = outgoing {
            a_out.insert("CZ020".to_string(), Some(flow));
        }
        a.mobility_outgoing = Some(a_out);
        a.mobility_incoming = Some(MobilityFlows::new());

        let mut b = bare_region("CZ020");
        let mut b_in = MobilityFlows::new();
        if let Some(flow) = incoming {
            b_in.insert("CZ010".to_string(), Some(flow));
        }
        b.mobility_outgoing = Some(MobilityFlows::new());
        b.mobility_incoming = Some(b_in);
        vec![a, b]
    }

    #[test]
    fn validate_accepts_matching_pair_flows() {
        let config = SchedulerConfig {
            regions: paired_regions(Some(50), Some(50)),
            mobility_enabled: true,
            strategy: ExecStrategy::Sequential,
            allocator: AllocatorStrategy::Contiguous,
            test: None,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_mismatched_pair_flows() {
        let config = SchedulerConfig {
            regions: paired_regions(Some(50), Some(30)),
            mobility_enabled: true,
            strategy: ExecStrategy::Sequential,
            allocator: AllocatorStrategy::Contiguous,
            test: None,
        };
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigError::InconsistentFlow {
                from: "CZ010".to_string(),
                to: "CZ020".to_string(),
                outgoing: Some(50),
                incoming: Some(30),
            }
        );
    }

    #[test]
    fn validate_rejects_visitor_slots_with_no_declared_sender() {
        // The receiving side sizes 50 visitor slots that no outgoing
        // flow would ever synchronize.
        let config = SchedulerConfig {
            regions: paired_regions(None, Some(50)),
            mobility_enabled: true,
            strategy: ExecStrategy::Sequential,
            allocator: AllocatorStrategy::Contiguous,
            test: None,
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::InconsistentFlow {
                outgoing: None,
                incoming: Some(50),
                ..
            }
        ));
    }

    #[test]
    fn validate_skips_flow_checks_for_regions_without_mobility_data() {
        // A region with no outgoing map is excluded from every pair, so
        // flows declared toward it are never reconciled.
        let mut a = bare_region("CZ010");
        let mut flows = MobilityFlows::new();
        flows.insert("CZ020".to_string(), Some(50));
        a.mobility_outgoing = Some(flows);
        let config = SchedulerConfig {
            regions: vec![a, bare_region("CZ020")],
            mobility_enabled: true,
            strategy: ExecStrategy::Sequential,
            allocator: AllocatorStrategy::Contiguous,
            test: None,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_test_sizes() {
        let config = SchedulerConfig {
            regions: vec![bare_region("CZ010")],
            mobility_enabled: false,
            strategy: ExecStrategy::Sequential,
            allocator: AllocatorStrategy::Contiguous,
            test: Some(TestSettings {
                original_size: 0,
                mobility_size: 200,
            }),
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::InvalidTestSettings { .. }
        ));
    }

    #[test]
    fn default_test_settings_match_upstream_constants() {
        let test = TestSettings::default();
        assert_eq!(test.original_size, 20_000);
        assert_eq!(test.mobility_size, 200);
    }
}
