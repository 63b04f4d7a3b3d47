//! Per-day aggregate metrics over all regions.

use metapop_core::EngineSummary;

/// One simulated day's epidemic totals, summed over every region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayMetrics {
    /// The simulated day, counted from 0.
    pub day: u32,
    /// Calendar date of the day (ISO 8601).
    pub date: String,
    /// Infections newly recorded during this day.
    pub new_infections: u64,
    /// Deaths accumulated through this day.
    pub cumulative_deaths: u64,
    /// Total agent population across regions, visitor slots included.
    pub population: u64,
}

/// Folds per-region engine summaries into per-day metrics.
///
/// Engines report cumulative totals; the aggregator differences
/// successive days to recover daily new infections.
#[derive(Clone, Copy, Debug, Default)]
pub struct MetricsAggregator {
    prev_infections: u64,
}

impl MetricsAggregator {
    /// Aggregate one day from the current per-region summaries.
    pub fn aggregate<'a>(
        &mut self,
        day: u32,
        date: String,
        population: u64,
        summaries: impl Iterator<Item = &'a EngineSummary>,
    ) -> DayMetrics {
        let mut infections = 0u64;
        let mut deaths = 0u64;
        for summary in summaries {
            infections += summary.total_new_infections;
            deaths += summary.cumulative_deaths;
        }
        let new_infections = infections.saturating_sub(self.prev_infections);
        self.prev_infections = infections;
        DayMetrics {
            day,
            date,
            new_infections,
            cumulative_deaths: deaths,
            population,
        }
    }
}
