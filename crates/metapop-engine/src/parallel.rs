//! Worker-thread fan-out for region construction and stepping.
//!
//! Construction uses a bounded worker pool pulling jobs off a channel;
//! stepping spawns one scoped thread per region, and the scope join is
//! the day-boundary barrier. Neither path shares mutable state: every
//! worker owns exactly one region at a time and reports back over a
//! channel.

use std::thread;

use crossbeam_channel::unbounded;

use metapop_core::{EngineError, EngineFactory};

use crate::config::{ParamSchema, RegionSpec, TestSettings};
use crate::region::RegionCoordinator;

/// Build every region concurrently, bounded by available parallelism.
///
/// Successes come back in configuration order. On failure, all build
/// errors of the phase are returned together, also in configuration
/// order.
pub(crate) fn build_all(
    specs: &[RegionSpec],
    test: Option<&TestSettings>,
    schema: &ParamSchema,
    factory: &dyn EngineFactory,
) -> Result<Vec<RegionCoordinator>, Vec<EngineError>> {
    let workers = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(specs.len())
        .max(1);

    let (job_tx, job_rx) = unbounded();
    let (result_tx, result_rx) = unbounded();
    for job in specs.iter().enumerate() {
        let _ = job_tx.send(job);
    }
    drop(job_tx);

    thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                for (idx, spec) in job_rx.iter() {
                    let built = RegionCoordinator::build(spec, test, schema, factory);
                    let _ = result_tx.send((idx, built));
                }
            });
        }
    });
    drop(result_tx);

    let mut outcomes: Vec<(usize, Result<RegionCoordinator, EngineError>)> =
        result_rx.iter().collect();
    outcomes.sort_by_key(|(idx, _)| *idx);

    let mut regions = Vec::with_capacity(specs.len());
    let mut failures = Vec::new();
    for (_, outcome) in outcomes {
        match outcome {
            Ok(region) => regions.push(region),
            Err(err) => failures.push(err),
        }
    }
    if failures.is_empty() {
        Ok(regions)
    } else {
        Err(failures)
    }
}

/// Advance every region one day, one scoped thread per region.
///
/// Returns the step failures of the day in configuration order; the
/// scope join guarantees every region has finished its step before this
/// returns.
pub(crate) fn step_all(regions: &mut [RegionCoordinator]) -> Vec<EngineError> {
    let (tx, rx) = unbounded();
    thread::scope(|scope| {
        for (idx, region) in regions.iter_mut().enumerate() {
            let tx = tx.clone();
            scope.spawn(move || {
                let _ = tx.send((idx, region.advance_one_day()));
            });
        }
    });
    drop(tx);

    let mut outcomes: Vec<(usize, Result<(), EngineError>)> = rx.iter().collect();
    outcomes.sort_by_key(|(idx, _)| *idx);
    outcomes
        .into_iter()
        .filter_map(|(_, outcome)| outcome.err())
        .collect()
}
