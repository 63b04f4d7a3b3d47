//! The multi-region day loop.
//!
//! The scheduler owns every region coordinator and the immutable
//! traveler index mapping. Each step advances all regions by one day
//! (sequentially or on one scoped thread per region), then runs the
//! pairwise synchronization pass over every eligible ordered pair on
//! the scheduler thread, two regions at a time through disjoint mutable
//! borrows.

use smallvec::SmallVec;

use metapop_core::{Day, EngineFactory, EngineSummary, RegionIdx};
use metapop_mobility::{allocate, MobilityIndexMapping, MobilityMatrix, RegionPopulation};
use metapop_sync::synchronize_pair;

use crate::config::{ExecStrategy, ParamSchema, SchedulerConfig};
use crate::error::RunError;
use crate::metrics::{DayMetrics, MetricsAggregator};
use crate::parallel;
use crate::region::RegionCoordinator;
use crate::result::{MultiRegionResult, RegionResultSummary};

/// Drives a multi-region run from construction through finalization.
pub struct MultiRegionScheduler {
    regions: Vec<RegionCoordinator>,
    mapping: MobilityIndexMapping,
    mobility_enabled: bool,
    strategy: ExecStrategy,
    simulation_days: u32,
    next_day: u32,
    days: Vec<DayMetrics>,
    aggregator: MetricsAggregator,
    total_population: u64,
}

impl MultiRegionScheduler {
    /// Build every region, compute the traveler index mapping, and (if
    /// mobility is enabled) run the initial synchronization pass so
    /// pre-seeded state agrees across regions before day 0.
    ///
    /// Construction honors the configured strategy: sequential builds
    /// run in configuration order; concurrent builds fan out across a
    /// worker pool. Either way, every build failure of the phase is
    /// collected into one [`RunError::Build`].
    ///
    /// # Errors
    ///
    /// [`RunError::Config`] for an invalid configuration,
    /// [`RunError::Build`] if any region fails to build or initialize,
    /// [`RunError::Mobility`] if the matrix or allocation is rejected,
    /// and [`RunError::Sync`] if the initial pass fails.
    pub fn new(
        config: &SchedulerConfig,
        factory: &dyn EngineFactory,
    ) -> Result<Self, RunError> {
        config.validate()?;
        let schema = ParamSchema::standard();
        let test = config.test.as_ref();

        let regions = match config.strategy {
            ExecStrategy::Sequential => {
                let mut regions = Vec::with_capacity(config.regions.len());
                let mut failures = Vec::new();
                for spec in &config.regions {
                    match RegionCoordinator::build(spec, test, &schema, factory) {
                        Ok(region) => regions.push(region),
                        Err(err) => failures.push(err),
                    }
                }
                if !failures.is_empty() {
                    return Err(RunError::Build { failures });
                }
                regions
            }
            ExecStrategy::Concurrent => {
                parallel::build_all(&config.regions, test, &schema, factory)
                    .map_err(|failures| RunError::Build { failures })?
            }
        };

        let matrix = mobility_matrix(&regions)?;
        let populations: Vec<RegionPopulation> = regions
            .iter()
            .map(|region| RegionPopulation {
                original: region.original_population(),
                augmented: region.augmented_population(),
                has_mobility_data: region.has_mobility_data(),
            })
            .collect();
        let mapping = allocate(&matrix, &populations, config.allocator)?;

        // Day 0 through the configured final day, inclusive.
        let simulation_days = regions[0].configured_days() + 1;
        let total_population = regions
            .iter()
            .map(RegionCoordinator::augmented_population)
            .sum();

        let mut scheduler = Self {
            regions,
            mapping,
            mobility_enabled: config.mobility_enabled,
            strategy: config.strategy,
            simulation_days,
            next_day: 0,
            days: Vec::with_capacity(simulation_days as usize),
            aggregator: MetricsAggregator::default(),
            total_population,
        };
        if scheduler.mobility_enabled {
            scheduler.synchronize_eligible(None, &[])?;
        }
        Ok(scheduler)
    }

    /// Number of steps the run executes: configured days plus one.
    pub fn simulation_days(&self) -> u32 {
        self.simulation_days
    }

    /// The next day to be advanced; equals the number of completed steps.
    pub fn current_day(&self) -> u32 {
        self.next_day
    }

    /// The regions, in configuration order.
    pub fn regions(&self) -> &[RegionCoordinator] {
        &self.regions
    }

    /// The immutable traveler index mapping computed at construction.
    pub fn mapping(&self) -> &MobilityIndexMapping {
        &self.mapping
    }

    /// Advance every region one day, synchronize, and aggregate metrics.
    ///
    /// Regions currently inside a mobility pause window are excluded
    /// from every pair this day; if every region is paused, no pair
    /// synchronizes at all.
    ///
    /// # Errors
    ///
    /// [`RunError::Step`] collecting every region that failed the day,
    /// or [`RunError::Sync`] naming the pair that failed to merge.
    pub fn advance(&mut self) -> Result<DayMetrics, RunError> {
        let day = self.next_day;
        let date = self.regions[0].date(Day(day));
        if day == 0 {
            log::info!(
                "starting multi-region run: {} regions, {} days, first date {date}",
                self.regions.len(),
                self.simulation_days,
            );
        }

        let failures = match self.strategy {
            ExecStrategy::Sequential => {
                let mut failures = Vec::new();
                for region in &mut self.regions {
                    if let Err(err) = region.advance_one_day() {
                        failures.push(err);
                    }
                }
                failures
            }
            ExecStrategy::Concurrent => parallel::step_all(&mut self.regions),
        };
        if !failures.is_empty() {
            return Err(RunError::Step { day, failures });
        }

        let excluded: SmallVec<[usize; 8]> = self
            .regions
            .iter()
            .enumerate()
            .filter(|(_, region)| region.excluded_on(day))
            .map(|(idx, _)| idx)
            .collect();
        if self.mobility_enabled && excluded.len() < self.regions.len() {
            self.synchronize_eligible(Some(day), &excluded)?;
        }

        let summaries: Vec<EngineSummary> =
            self.regions.iter().map(RegionCoordinator::summary).collect();
        let metrics = self
            .aggregator
            .aggregate(day, date, self.total_population, summaries.iter());
        log::info!(
            "day {} ({}): {} new infections, {} cumulative deaths",
            metrics.day,
            metrics.date,
            metrics.new_infections,
            metrics.cumulative_deaths,
        );
        self.days.push(metrics.clone());
        self.next_day += 1;
        Ok(metrics)
    }

    /// Run every remaining day, finalize, and assemble the result.
    pub fn run(mut self) -> Result<MultiRegionResult, RunError> {
        while self.next_day < self.simulation_days {
            self.advance()?;
        }
        self.finish()
    }

    /// Finalize every engine and assemble the result from the days
    /// completed so far.
    ///
    /// # Errors
    ///
    /// [`RunError::Finalize`] collecting every region that failed.
    pub fn finish(mut self) -> Result<MultiRegionResult, RunError> {
        let mut failures = Vec::new();
        for region in &mut self.regions {
            if let Err(err) = region.finalize() {
                failures.push(err);
            }
        }
        if !failures.is_empty() {
            return Err(RunError::Finalize { failures });
        }

        let regions = self
            .regions
            .iter()
            .map(|region| {
                let summary = region.summary();
                RegionResultSummary {
                    location_code: region.location_code().to_string(),
                    name: region.name().to_string(),
                    population: region.augmented_population(),
                    total_new_infections: summary.total_new_infections,
                    cumulative_deaths: summary.cumulative_deaths,
                }
            })
            .collect();
        Ok(MultiRegionResult {
            simulation_days: self.simulation_days,
            days: self.days,
            regions,
        })
    }

    /// Synchronize every ordered pair whose both sides are outside
    /// `excluded`. Pairs absent from the mapping (a side without
    /// mobility data) and empty pairs are skipped.
    fn synchronize_eligible(
        &mut self,
        day: Option<u32>,
        excluded: &[usize],
    ) -> Result<(), RunError> {
        let n = self.regions.len();
        for i in 0..n {
            if excluded.contains(&i) {
                continue;
            }
            for j in 0..n {
                if i == j || excluded.contains(&j) {
                    continue;
                }
                let (from, to) = (RegionIdx(i as u32), RegionIdx(j as u32));
                let Some(pair) = self.mapping.pair(from, to) else {
                    continue;
                };
                if pair.is_empty() {
                    continue;
                }
                let (home, away) = pair_mut(&mut self.regions, i, j);
                synchronize_pair(
                    home.engine_mut(),
                    away.engine_mut(),
                    &pair.outgoing,
                    &pair.incoming,
                )
                .map_err(|source| RunError::Sync {
                    day,
                    from,
                    to,
                    source,
                })?;
            }
        }
        Ok(())
    }
}

/// Disjoint mutable borrows of two distinct slice elements.
fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = items.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = items.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

fn mobility_matrix(regions: &[RegionCoordinator]) -> Result<MobilityMatrix, RunError> {
    let codes: Vec<&str> = regions
        .iter()
        .map(RegionCoordinator::location_code)
        .collect();
    let rows = regions
        .iter()
        .map(|region| {
            codes
                .iter()
                .map(|code| {
                    if *code == region.location_code() {
                        None
                    } else {
                        region.raw_outgoing_to(code)
                    }
                })
                .collect()
        })
        .collect();
    MobilityMatrix::from_rows(rows).map_err(RunError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_mut_returns_disjoint_elements_either_order() {
        let mut items = vec![10, 20, 30, 40];
        let (a, b) = pair_mut(&mut items, 3, 1);
        assert_eq!((*a, *b), (40, 20));
        *a += 1;
        *b += 1;
        assert_eq!(items, vec![10, 21, 30, 41]);
    }
}
