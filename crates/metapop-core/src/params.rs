//! Parameter values and the opaque specification types handed to an
//! engine factory.
//!
//! Configuration loading itself is an external collaborator; these types
//! are the already-parsed, validated form this core consumes.

use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;

/// A single run-time parameter value.
///
/// Parameters arrive as a flat record and are split by the region
/// coordinator into constructor parameters and engine parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    /// A numeric parameter (counts, rates, day numbers).
    Number(f64),
    /// A textual parameter (labels, file paths, date strings).
    Text(String),
    /// A boolean switch.
    Flag(bool),
}

impl ParamValue {
    /// The numeric value, if this is a [`ParamValue::Number`].
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// The textual value, if this is a [`ParamValue::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
            Self::Flag(v) => write!(f, "{v}"),
        }
    }
}

/// Where a region's agent population comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PopulationSource {
    /// A pre-generated synthetic population loaded from a file.
    File(PathBuf),
    /// A procedurally generated population sized by the engine.
    Procedural,
}

/// An intervention handed through to the epidemic engine unchanged.
///
/// Mobility-pause interventions never appear here; the region
/// coordinator removes them before the engine sees the list.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineInterventionSpec {
    /// Intervention kind name understood by the engine (e.g.
    /// `"beta_change"`, `"per_day_testing"`).
    pub name: String,
    /// Intervention parameters, opaque to this core.
    pub pars: IndexMap<String, ParamValue>,
}

/// A disease variant to seed into a region's engine.
#[derive(Clone, Debug, PartialEq)]
pub struct VariantSpec {
    /// Variant name (e.g. `"wild"`, `"delta"`).
    pub name: String,
    /// Optional display label.
    pub label: Option<String>,
    /// Day on which the variant's imports arrive.
    pub start_day: u32,
    /// Number of imported infections on `start_day`.
    pub n_imports: u64,
}
