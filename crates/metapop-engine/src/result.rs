//! The assembled outcome of a completed multi-region run.

use crate::metrics::DayMetrics;

/// Final per-region totals after finalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionResultSummary {
    /// Unique location code.
    pub location_code: String,
    /// Display name.
    pub name: String,
    /// Agent population, visitor slots included.
    pub population: u64,
    /// Total infections recorded over the run.
    pub total_new_infections: u64,
    /// Total deaths recorded over the run.
    pub cumulative_deaths: u64,
}

/// Everything a completed run produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiRegionResult {
    /// Number of steps the run executed.
    pub simulation_days: u32,
    /// Per-day aggregate metrics, one entry per step in day order.
    pub days: Vec<DayMetrics>,
    /// Per-region totals, in configuration order.
    pub regions: Vec<RegionResultSummary>,
}
