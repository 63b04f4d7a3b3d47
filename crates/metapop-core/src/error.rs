//! Core error kinds shared across the metapop workspace.
//!
//! Engine and synchronization failures are distinct kinds so the
//! scheduler boundary can tell "one region degraded" from "the whole
//! run must abort". Configuration and mobility errors live with the
//! code that detects them (`metapop-engine`, `metapop-mobility`).

use std::error::Error;
use std::fmt;

/// Errors from constructing, initializing, stepping, or finalizing a
/// per-region epidemic engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// The engine factory rejected the build request.
    BuildFailed {
        /// Location code of the region being built.
        region: String,
        /// Human-readable description of the failure.
        reason: String,
    },
    /// A file-backed population was requested but the file is absent
    /// or unreadable.
    MissingPopulationFile {
        /// Location code of the region being built.
        region: String,
        /// The population file path that could not be used.
        path: String,
    },
    /// An operation requiring an initialized engine was invoked before
    /// `initialize()` succeeded.
    NotInitialized {
        /// Location code of the region.
        region: String,
    },
    /// The engine failed while advancing one simulated day.
    StepFailed {
        /// Location code of the region.
        region: String,
        /// The day being advanced when the failure occurred.
        day: u32,
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The engine failed during finalization.
    FinalizeFailed {
        /// Location code of the region.
        region: String,
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuildFailed { region, reason } => {
                write!(f, "engine build failed for region '{region}': {reason}")
            }
            Self::MissingPopulationFile { region, path } => {
                write!(f, "population file '{path}' missing for region '{region}'")
            }
            Self::NotInitialized { region } => {
                write!(f, "engine for region '{region}' is not initialized")
            }
            Self::StepFailed { region, day, reason } => {
                write!(f, "step failed for region '{region}' on day {day}: {reason}")
            }
            Self::FinalizeFailed { region, reason } => {
                write!(f, "finalize failed for region '{region}': {reason}")
            }
        }
    }
}

impl Error for EngineError {}

/// Errors from the cross-region person-state synchronizer.
///
/// A partial merge silently corrupts epidemic state, so every variant
/// here is detected before any slot is written for the failing
/// attribute pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncError {
    /// The paired id lists have different lengths.
    LengthMismatch {
        /// Number of ids on the home side.
        home: usize,
        /// Number of ids on the away side.
        away: usize,
    },
    /// A paired id does not fit the buffer or id space it indexes.
    SlotOutOfRange {
        /// The attribute buffer or agent id space that was too short
        /// (e.g. `"date_exposed"`, `"home agent space"`).
        buffer: &'static str,
        /// The offending agent slot.
        slot: usize,
        /// Length of the buffer or id space on that side.
        len: usize,
    },
    /// The two engines disagree on the number of disease variants.
    VariantCountMismatch {
        /// Variant count on the home side.
        home: usize,
        /// Variant count on the away side.
        away: usize,
    },
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch { home, away } => {
                write!(f, "paired id lists differ in length: home {home}, away {away}")
            }
            Self::SlotOutOfRange { buffer, slot, len } => {
                write!(f, "slot {slot} out of range for {buffer} (len {len})")
            }
            Self::VariantCountMismatch { home, away } => {
                write!(f, "variant count mismatch: home {home}, away {away}")
            }
        }
    }
}

impl Error for SyncError {}
