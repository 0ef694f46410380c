//! Property tests for population invariants
//!
//! Random command sequences interleaved with steps must never break the
//! compartment bound or the cohort-sum invariant.

use contagion::core::config::SimulationConfig;
use contagion::core::types::RegionId;
use contagion::disease::DiseaseParams;
use contagion::simulation::SimulationEngine;
use contagion::world::{CompartmentDelta, Compartments, Measure, Scenario};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Command {
    Step,
    Seed(u32, u64),
    Apply(u32, Measure),
    Remove(u32, Measure),
    Quarantine(u32),
    Sever(u32, u32),
    Restore(u32, u32),
    StepBack,
}

fn measure() -> impl Strategy<Value = Measure> {
    prop::sample::select(Measure::ALL.to_vec())
}

fn command() -> impl Strategy<Value = Command> {
    prop_oneof![
        4 => Just(Command::Step),
        1 => (0u32..20, 0u64..2_000_000).prop_map(|(r, n)| Command::Seed(r, n)),
        1 => (0u32..20, measure()).prop_map(|(r, m)| Command::Apply(r, m)),
        1 => (0u32..20, measure()).prop_map(|(r, m)| Command::Remove(r, m)),
        1 => (0u32..20).prop_map(Command::Quarantine),
        1 => (0u32..20, 0u32..20).prop_map(|(a, b)| Command::Sever(a, b)),
        1 => (0u32..20, 0u32..20).prop_map(|(a, b)| Command::Restore(a, b)),
        1 => Just(Command::StepBack),
    ]
}

fn check_invariants(engine: &SimulationEngine) -> Result<(), TestCaseError> {
    for region in engine.regions() {
        let c = region.compartments();
        prop_assert!(
            c.susceptible + c.infected + c.recovered + c.deceased <= c.total,
            "{} overflows its population: {:?}",
            region.name,
            c
        );
        prop_assert_eq!(region.cohort_total(), c.infected, "cohorts of {} drifted", region.name);
        if region.is_quarantined() {
            prop_assert_eq!(region.transmission_factor(), 0.0);
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_commands_preserve_invariants(
        seed in any::<u64>(),
        commands in prop::collection::vec(command(), 1..60),
    ) {
        let config = SimulationConfig { seed, ..SimulationConfig::default() };
        let params = DiseaseParams {
            origin: Some(RegionId(2)),
            ..DiseaseParams::default()
        };
        let mut engine = SimulationEngine::with_scenario(config, Scenario::spain(), params).unwrap();
        engine.set_running(true);

        for command in commands {
            // Failures on bad ids are expected; only panics and broken
            // invariants count.
            let _ = match command {
                Command::Step => engine.step().map(|_| ()),
                Command::Seed(r, n) => engine.seed_infection(RegionId(r), n).map(|_| ()),
                Command::Apply(r, m) => engine.apply_measure(RegionId(r), m).map(|_| ()),
                Command::Remove(r, m) => engine.remove_measure(RegionId(r), m).map(|_| ()),
                Command::Quarantine(r) => engine.toggle_quarantine(RegionId(r)).map(|_| ()),
                Command::Sever(a, b) => engine.sever_route(RegionId(a), RegionId(b)).map(|_| ()),
                Command::Restore(a, b) => engine.restore_route(RegionId(a), RegionId(b)).map(|_| ()),
                Command::StepBack => engine.step_back().map(|_| ()),
            };
            check_invariants(&engine)?;
        }
    }

    #[test]
    fn prop_apply_delta_keeps_bound(
        total in 0u64..10_000_000,
        deltas in prop::collection::vec(
            (-5_000_000i64..5_000_000, -5_000_000i64..5_000_000, -5_000_000i64..5_000_000, -5_000_000i64..5_000_000),
            1..20,
        ),
    ) {
        let mut c = Compartments::new(total);
        for (s, i, r, d) in deltas {
            c.apply_delta(CompartmentDelta {
                susceptible: s,
                infected: i,
                recovered: r,
                deceased: d,
                reinfected: 0,
            });
            prop_assert!(c.accounted() <= c.total);
        }
    }

    #[test]
    fn prop_base_probability_in_bounds(
        traffic in -1.0f64..2.0,
        distance in 0.0f64..20_000.0,
        contagion in 0.0f64..1.0,
    ) {
        use contagion::core::types::TransportMode;
        use contagion::network::{Route, RouteKey};

        let key = RouteKey::new(RegionId(0), RegionId(1)).unwrap();
        for mode in TransportMode::ALL {
            let p = Route::new(key, mode, traffic, distance).base_probability(contagion);
            prop_assert!((0.01..=0.95).contains(&p), "p = {}", p);
        }
    }
}
