//! The scheduler-boundary error type.

use std::error::Error;
use std::fmt;

use metapop_core::{EngineError, RegionIdx, SyncError};
use metapop_mobility::MobilityError;

use crate::config::ConfigError;

/// Any failure of a multi-region run, from configuration through
/// finalization.
///
/// Phases that touch every region (`Build`, `Step`, `Finalize`) collect
/// all failures of the phase rather than reporting only the first, so a
/// log of the error names every broken region at once.
#[derive(Clone, Debug, PartialEq)]
pub enum RunError {
    /// The configuration was rejected before any region was built.
    Config(ConfigError),
    /// The mobility matrix or allocation was rejected.
    Mobility(MobilityError),
    /// One or more regions failed to build or initialize.
    Build {
        /// Every build failure of the phase.
        failures: Vec<EngineError>,
    },
    /// One or more regions failed while advancing a day.
    Step {
        /// The day being advanced.
        day: u32,
        /// Every step failure of the day.
        failures: Vec<EngineError>,
    },
    /// Synchronizing one ordered region pair failed.
    Sync {
        /// The day being synchronized; `None` for the initial pass.
        day: Option<u32>,
        /// Home-side region index.
        from: RegionIdx,
        /// Away-side region index.
        to: RegionIdx,
        /// The underlying synchronizer error.
        source: SyncError,
    },
    /// One or more regions failed to finalize.
    Finalize {
        /// Every finalization failure.
        failures: Vec<EngineError>,
    },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "invalid configuration: {err}"),
            Self::Mobility(err) => write!(f, "mobility allocation failed: {err}"),
            Self::Build { failures } => {
                write!(f, "{} region(s) failed to build: ", failures.len())?;
                write_failures(f, failures)
            }
            Self::Step { day, failures } => {
                write!(f, "{} region(s) failed on day {day}: ", failures.len())?;
                write_failures(f, failures)
            }
            Self::Sync {
                day,
                from,
                to,
                source,
            } => match day {
                Some(day) => write!(
                    f,
                    "synchronization of pair ({from}, {to}) failed on day {day}: {source}"
                ),
                None => write!(
                    f,
                    "initial synchronization of pair ({from}, {to}) failed: {source}"
                ),
            },
            Self::Finalize { failures } => {
                write!(f, "{} region(s) failed to finalize: ", failures.len())?;
                write_failures(f, failures)
            }
        }
    }
}

fn write_failures(f: &mut fmt::Formatter<'_>, failures: &[EngineError]) -> fmt::Result {
    for (i, failure) in failures.iter().enumerate() {
        if i > 0 {
            write!(f, "; ")?;
        }
        write!(f, "{failure}")?;
    }
    Ok(())
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Mobility(err) => Some(err),
            Self::Sync { source, .. } => Some(source),
            Self::Build { failures }
            | Self::Step { failures, .. }
            | Self::Finalize { failures } => {
                failures.first().map(|err| err as &(dyn Error + 'static))
            }
        }
    }
}

impl From<ConfigError> for RunError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<MobilityError> for RunError {
    fn from(err: MobilityError) -> Self {
        Self::Mobility(err)
    }
}
