//! End-to-end scheduler runs over scripted engines.

use indexmap::IndexMap;
use metapop_core::{is_missing, ParamValue, RegionIdx, ScalarAttr};
use metapop_engine::{
    ExecStrategy, InterventionSpec, MobilityFlows, MultiRegionScheduler, RegionSpec, RunError,
    SchedulerConfig,
};
use metapop_mobility::AllocatorStrategy;
use metapop_test_utils::{ScriptEvent, ScriptedFactory};

fn flows(entries: &[(&str, u64)]) -> Option<MobilityFlows> {
    let mut map = MobilityFlows::new();
    for &(code, flow) in entries {
        map.insert(code.to_string(), Some(flow));
    }
    Some(map)
}

fn region(
    code: &str,
    population: u64,
    outgoing: Option<MobilityFlows>,
    incoming: Option<MobilityFlows>,
) -> RegionSpec {
    RegionSpec {
        location_code: code.to_string(),
        name: code.to_string(),
        population_size: population,
        mobility_outgoing: outgoing,
        mobility_incoming: incoming,
        region_pars: IndexMap::new(),
        interventions: Vec::new(),
        variants: Vec::new(),
    }
}

fn config(regions: Vec<RegionSpec>) -> SchedulerConfig {
    SchedulerConfig {
        regions,
        mobility_enabled: true,
        strategy: ExecStrategy::Sequential,
        allocator: AllocatorStrategy::Contiguous,
        test: None,
    }
}

/// Two regions, 1000 locals each, 50 commuting A→B and 30 B→A.
fn two_region_config() -> SchedulerConfig {
    config(vec![
        region("A", 1000, flows(&[("B", 50)]), flows(&[("B", 30)])),
        region("B", 1000, flows(&[("A", 30)]), flows(&[("A", 50)])),
    ])
}

#[test]
fn end_to_end_two_region_contiguous_layout() {
    let factory = ScriptedFactory::new(9);
    let scheduler = MultiRegionScheduler::new(&two_region_config(), &factory).unwrap();

    let regions = scheduler.regions();
    assert_eq!(regions[0].augmented_population(), 1030);
    assert_eq!(regions[1].augmented_population(), 1050);
    assert_eq!(regions[0].engine().n_agents(), 1030);
    assert_eq!(regions[1].engine().n_agents(), 1050);

    let pair = scheduler
        .mapping()
        .pair(RegionIdx(0), RegionIdx(1))
        .unwrap();
    assert_eq!(pair.outgoing, (0..50).collect::<Vec<u32>>());
    assert_eq!(pair.incoming, (1000..1050).collect::<Vec<u32>>());
    let back = scheduler
        .mapping()
        .pair(RegionIdx(1), RegionIdx(0))
        .unwrap();
    assert_eq!(back.outgoing, (0..30).collect::<Vec<u32>>());
    assert_eq!(back.incoming, (1000..1030).collect::<Vec<u32>>());

    let result = scheduler.run().unwrap();
    assert_eq!(result.simulation_days, 10);
    assert_eq!(result.days.len(), 10);
    assert_eq!(result.regions.len(), 2);
    assert_eq!(result.regions[0].location_code, "A");
    assert_eq!(result.regions[0].population, 1030);
}

#[test]
fn runs_exactly_configured_days_plus_one() {
    let factory = ScriptedFactory::new(4);
    let scheduler = MultiRegionScheduler::new(&two_region_config(), &factory).unwrap();
    assert_eq!(scheduler.simulation_days(), 5);

    let result = scheduler.run().unwrap();
    assert_eq!(result.days.len(), 5);
    for (expected, metrics) in result.days.iter().enumerate() {
        assert_eq!(metrics.day, expected as u32);
    }
    for code in ["A", "B"] {
        let probe = factory.probe(code).unwrap();
        assert_eq!(probe.steps(), 5);
        assert!(probe.is_finalized());
    }
}

#[test]
fn n_days_parameter_controls_run_length() {
    let mut config = two_region_config();
    for spec in &mut config.regions {
        spec.region_pars
            .insert("n_days".to_string(), ParamValue::Number(6.0));
    }
    let factory = ScriptedFactory::new(30);
    let scheduler = MultiRegionScheduler::new(&config, &factory).unwrap();
    assert_eq!(scheduler.simulation_days(), 7);
}

#[test]
fn first_day_carries_the_start_date() {
    let factory = ScriptedFactory::new(2);
    let result = MultiRegionScheduler::new(&two_region_config(), &factory)
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(result.days[0].date, "2020-03-01");
    assert_eq!(result.days[2].date, "2020-03-03");
}

#[test]
fn initial_sync_propagates_seeded_infections_before_day_zero() {
    let factory = ScriptedFactory::new(9);
    // Agent 0 of A commutes to B (visitor slot 1000) and is already
    // infectious when the run is assembled.
    factory.seed_infection("A", 0);
    let scheduler = MultiRegionScheduler::new(&two_region_config(), &factory).unwrap();

    let away = scheduler.regions()[1].engine();
    assert_eq!(away.scalar(ScalarAttr::Infectious)[1000], 1.0);
    assert_eq!(away.scalar(ScalarAttr::Susceptible)[1000], 0.0);
}

#[test]
fn mobility_disabled_never_synchronizes() {
    let mut config = two_region_config();
    config.mobility_enabled = false;
    let factory = ScriptedFactory::new(9);
    factory.seed_infection("A", 0);
    let mut scheduler = MultiRegionScheduler::new(&config, &factory).unwrap();

    assert!(is_missing(
        scheduler.regions()[1].engine().scalar(ScalarAttr::Infectious)[1000]
    ));
    scheduler.advance().unwrap();
    assert!(is_missing(
        scheduler.regions()[1].engine().scalar(ScalarAttr::Infectious)[1000]
    ));
}

#[test]
fn paused_region_is_excluded_but_other_pairs_still_synchronize() {
    // A and C both send 5 commuters to B. A pauses mobility on day 0
    // only; C never pauses.
    let mut a = region("A", 100, flows(&[("B", 5)]), Some(MobilityFlows::new()));
    a.interventions = vec![InterventionSpec::MobilityPause {
        start_day: 0,
        end_day: 0,
        label: None,
    }];
    let b = region(
        "B",
        100,
        Some(MobilityFlows::new()),
        flows(&[("A", 5), ("C", 5)]),
    );
    let c = region("C", 100, flows(&[("B", 5)]), Some(MobilityFlows::new()));

    let factory = ScriptedFactory::new(9);
    factory.script("A", ScriptEvent::Infect { day: 0, slot: 0 });
    factory.script("C", ScriptEvent::Infect { day: 0, slot: 0 });
    let mut scheduler = MultiRegionScheduler::new(&config(vec![a, b, c]), &factory).unwrap();

    // Contiguous layout in B: visitor slots [100..105) from A, then
    // [105..110) from C.
    scheduler.advance().unwrap();
    {
        let b_engine = scheduler.regions()[1].engine();
        assert!(is_missing(b_engine.scalar(ScalarAttr::Infectious)[100]));
        assert_eq!(b_engine.scalar(ScalarAttr::Infectious)[105], 1.0);
    }

    // Day 1: the pause is over, A's infection catches up.
    scheduler.advance().unwrap();
    let b_engine = scheduler.regions()[1].engine();
    assert_eq!(b_engine.scalar(ScalarAttr::Infectious)[100], 1.0);
}

#[test]
fn all_regions_paused_skips_the_day_entirely() {
    let mut config = two_region_config();
    for spec in &mut config.regions {
        spec.interventions = vec![InterventionSpec::MobilityPause {
            start_day: 0,
            end_day: 9,
            label: None,
        }];
    }
    let factory = ScriptedFactory::new(9);
    factory.script("A", ScriptEvent::Infect { day: 0, slot: 0 });
    let mut scheduler = MultiRegionScheduler::new(&config, &factory).unwrap();

    scheduler.advance().unwrap();
    assert!(is_missing(
        scheduler.regions()[1].engine().scalar(ScalarAttr::Infectious)[1000]
    ));
}

#[test]
fn region_without_mobility_data_never_pairs() {
    let config = config(vec![
        region("A", 100, flows(&[("B", 5)]), None),
        region("B", 100, None, None),
    ]);
    let factory = ScriptedFactory::new(3);
    let scheduler = MultiRegionScheduler::new(&config, &factory).unwrap();
    assert_eq!(scheduler.mapping().pair_count(), 0);
    scheduler.run().unwrap();
}

#[test]
fn sequential_and_concurrent_runs_agree() {
    let run = |strategy: ExecStrategy| {
        let mut config = two_region_config();
        config.strategy = strategy;
        let factory = ScriptedFactory::new(9);
        factory.script("A", ScriptEvent::Infect { day: 1, slot: 2 });
        factory.script("A", ScriptEvent::Infect { day: 3, slot: 7 });
        factory.script("B", ScriptEvent::Kill { day: 2, slot: 3 });
        MultiRegionScheduler::new(&config, &factory)
            .unwrap()
            .run()
            .unwrap()
    };
    assert_eq!(run(ExecStrategy::Sequential), run(ExecStrategy::Concurrent));
}

#[test]
fn metrics_aggregate_daily_infections_across_regions() {
    let factory = ScriptedFactory::new(3);
    factory.script("A", ScriptEvent::Infect { day: 1, slot: 2 });
    factory.script("B", ScriptEvent::Infect { day: 1, slot: 4 });
    factory.script("B", ScriptEvent::Kill { day: 2, slot: 9 });
    let result = MultiRegionScheduler::new(&two_region_config(), &factory)
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(result.days[0].new_infections, 0);
    assert_eq!(result.days[1].new_infections, 2);
    assert_eq!(result.days[2].new_infections, 0);
    assert_eq!(result.days[2].cumulative_deaths, 1);
    assert_eq!(result.days[0].population, 1030 + 1050);

    let totals: u64 = result
        .regions
        .iter()
        .map(|region| region.total_new_infections)
        .sum();
    assert_eq!(totals, 2);
}

#[test]
fn build_failures_are_collected_across_regions() {
    let config = config(vec![
        region("A", 100, None, None),
        region("B", 100, None, None),
        region("C", 100, None, None),
    ]);
    let factory = ScriptedFactory::new(3);
    factory.fail_build("B");
    factory.fail_build("C");
    let err = MultiRegionScheduler::new(&config, &factory)
        .err()
        .expect("construction must fail");
    match err {
        RunError::Build { failures } => assert_eq!(failures.len(), 2),
        other => panic!("expected build failure, got {other:?}"),
    }
}

#[test]
fn step_failure_aborts_with_the_failing_day() {
    let factory = ScriptedFactory::new(9);
    factory.fail_step("B", 2);
    let err = MultiRegionScheduler::new(&two_region_config(), &factory)
        .unwrap()
        .run()
        .unwrap_err();
    match err {
        RunError::Step { day, failures } => {
            assert_eq!(day, 2);
            assert_eq!(failures.len(), 1);
        }
        other => panic!("expected step failure, got {other:?}"),
    }
}

#[test]
fn test_mode_shrinks_populations_and_flows() {
    let mut config = config(vec![
        region("A", 1_000_000, flows(&[("B", 12_345)]), flows(&[("B", 8_000)])),
        region("B", 2_000_000, flows(&[("A", 8_000)]), flows(&[("A", 12_345)])),
    ]);
    config.test = Some(metapop_engine::TestSettings {
        original_size: 500,
        mobility_size: 20,
    });
    let factory = ScriptedFactory::new(3);
    let scheduler = MultiRegionScheduler::new(&config, &factory).unwrap();

    let regions = scheduler.regions();
    assert_eq!(regions[0].original_population(), 500);
    assert_eq!(regions[0].augmented_population(), 520);
    assert_eq!(regions[1].augmented_population(), 520);
    let pair = scheduler
        .mapping()
        .pair(RegionIdx(0), RegionIdx(1))
        .unwrap();
    assert_eq!(pair.len(), 20);
}
