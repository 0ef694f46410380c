//! Integration tests for route editing through the engine

use contagion::core::config::SimulationConfig;
use contagion::core::error::EngineError;
use contagion::core::types::{RegionId, TransportMode};
use contagion::disease::DiseaseParams;
use contagion::network::{RouteAction, RouteEnd};
use contagion::simulation::{PropagationFlags, SimulationEngine, SimulationEvent};
use contagion::world::{Scenario, ScenarioRegion, ScenarioRoute};
use rand::rngs::mock::StepRng;

/// Five regions and no routes
fn bare_engine() -> SimulationEngine {
    let regions = (0..5)
        .map(|i| ScenarioRegion {
            name: format!("Region {}", i),
            population_millions: 1.0 + i as f64,
            latitude: i as f64 * 3.0,
            longitude: i as f64 * -2.0,
        })
        .collect();
    let engine = SimulationEngine::with_scenario(
        SimulationConfig {
            route_density: 0.0,
            ..SimulationConfig::default()
        },
        Scenario {
            name: "bare".into(),
            regions,
            routes: Vec::new(),
        },
        DiseaseParams::default(),
    )
    .unwrap();
    assert_eq!(engine.routes().count(), 0);
    engine
}

#[test]
fn test_route_found_in_either_order() {
    let mut engine = bare_engine();
    let key = engine.add_route(RegionId(3), RegionId(1), TransportMode::Air, 0.5).unwrap();
    assert_eq!(key.to_string(), "1-3");

    let forward = engine.route(RegionId(1), RegionId(3)).unwrap();
    let reverse = engine.route(RegionId(3), RegionId(1)).unwrap();
    assert_eq!(forward, reverse);
    assert_eq!(forward.mode, TransportMode::Air);
    assert!(engine.adjacency().is_linked(RegionId(1), RegionId(3)));
    assert!(engine.adjacency().is_linked(RegionId(3), RegionId(1)));
}

#[test]
fn test_sever_twice_changes_once() {
    let mut engine = bare_engine();
    engine.add_route(RegionId(0), RegionId(2), TransportMode::Land, 0.6).unwrap();

    assert!(engine.sever_route(RegionId(2), RegionId(0)).unwrap());
    assert!(!engine.sever_route(RegionId(0), RegionId(2)).unwrap());

    let route = engine.route(RegionId(0), RegionId(2)).unwrap();
    assert!(route.is_severed());
    assert_eq!(route.events().len(), 1);
    assert_eq!(route.events()[0].action, RouteAction::Severed);
    assert_eq!(route.base_probability(0.3), 0.0);

    assert!(engine.restore_route(RegionId(0), RegionId(2)).unwrap());
    assert!(!engine.restore_route(RegionId(0), RegionId(2)).unwrap());
    assert_eq!(engine.route(RegionId(0), RegionId(2)).unwrap().events().len(), 2);
}

#[test]
fn test_invalid_routes_rejected_without_mutation() {
    let mut engine = bare_engine();
    assert!(matches!(
        engine.add_route(RegionId(2), RegionId(2), TransportMode::Sea, 0.5),
        Err(EngineError::SelfLoop(_))
    ));
    assert!(matches!(
        engine.add_route(RegionId(0), RegionId(17), TransportMode::Sea, 0.5),
        Err(EngineError::UnknownRegion(_))
    ));
    engine.add_route(RegionId(0), RegionId(1), TransportMode::Sea, 0.5).unwrap();
    assert!(matches!(
        engine.add_route(RegionId(1), RegionId(0), TransportMode::Air, 0.9),
        Err(EngineError::DuplicateRoute(..))
    ));
    assert!(matches!(
        engine.sever_route(RegionId(3), RegionId(4)),
        Err(EngineError::UnknownRoute(..))
    ));
    assert_eq!(engine.routes().count(), 1);
    assert_eq!(engine.route(RegionId(0), RegionId(1)).unwrap().mode, TransportMode::Sea);
}

#[test]
fn test_remove_route_updates_adjacency() {
    let mut engine = bare_engine();
    engine.add_route(RegionId(1), RegionId(4), TransportMode::Land, 0.4).unwrap();
    assert_eq!(engine.adjacency().degree(RegionId(4)), 1);

    assert!(engine.remove_route(RegionId(4), RegionId(1)).unwrap());
    assert!(!engine.remove_route(RegionId(4), RegionId(1)).unwrap());
    assert!(!engine.adjacency().is_linked(RegionId(1), RegionId(4)));
    assert!(engine.remove_route(RegionId(4), RegionId(40)).is_err());
}

#[test]
fn test_connected_routes_include_severed() {
    let mut engine = bare_engine();
    engine.add_route(RegionId(0), RegionId(1), TransportMode::Air, 0.8).unwrap();
    engine.add_route(RegionId(1), RegionId(2), TransportMode::Land, 0.6).unwrap();
    engine.sever_route(RegionId(1), RegionId(2)).unwrap();

    let connected = engine.connected_routes(RegionId(1)).unwrap();
    assert_eq!(connected.len(), 2);
    let to_zero = connected.iter().find(|c| c.peer == RegionId(0)).unwrap();
    assert_eq!(to_zero.end, RouteEnd::Inbound);
    assert!(!to_zero.severed);
    let to_two = connected.iter().find(|c| c.peer == RegionId(2)).unwrap();
    assert_eq!(to_two.end, RouteEnd::Outbound);
    assert!(to_two.severed);

    assert!(engine.connected_routes(RegionId(9)).is_err());
}

#[test]
fn test_open_route_uses_mode_traffic() {
    let mut engine = bare_engine();
    engine.open_route(RegionId(0), RegionId(4), TransportMode::Sea).unwrap();
    let traffic = engine.route(RegionId(0), RegionId(4)).unwrap().traffic;
    assert!((0.2..=0.6).contains(&traffic), "traffic = {}", traffic);
}

#[test]
fn test_inactive_route_carries_nothing() {
    let mut engine = bare_engine();
    engine.add_route(RegionId(0), RegionId(1), TransportMode::Land, 0.9).unwrap();
    assert!(engine.set_route_active(RegionId(0), RegionId(1), false).unwrap());
    engine.seed_infection(RegionId(0), 100_000).unwrap();
    engine.set_running(true);
    for _ in 0..10 {
        engine.step().unwrap();
    }
    assert!(engine.graph().edges.is_empty());
    assert_eq!(engine.region(RegionId(1)).unwrap().compartments().infected, 0);
}

#[test]
fn test_random_network_is_seeded() {
    let build = |seed| {
        let config = SimulationConfig {
            seed,
            ..SimulationConfig::default()
        };
        let engine = SimulationEngine::with_scenario(config, Scenario::south_america(), DiseaseParams::default())
            .unwrap();
        engine.routes().map(|r| (r.key, r.mode)).collect::<Vec<_>>()
    };
    assert_eq!(build(17), build(17));
    assert!(!build(17).is_empty());
}

/// Two 100M regions on one land route. The zero random source makes every
/// crossing draw succeed.
fn linked_pair() -> SimulationEngine<StepRng> {
    let region = |name: &str, lon: f64| ScenarioRegion {
        name: name.into(),
        population_millions: 100.0,
        latitude: 40.0,
        longitude: lon,
    };
    let scenario = Scenario {
        name: "pair".into(),
        regions: vec![region("West", 0.0), region("East", 3.0)],
        routes: vec![ScenarioRoute {
            from: "West".into(),
            to: "East".into(),
            mode: TransportMode::Land,
            traffic: Some(0.8),
        }],
    };
    let mut engine = SimulationEngine::with_rng(
        SimulationConfig::default(),
        scenario,
        DiseaseParams::default(),
        StepRng::new(0, 0),
    )
    .unwrap();
    engine.set_propagation(PropagationFlags::none());
    engine.set_running(true);
    engine
}

fn crossings(events: &[SimulationEvent]) -> Vec<(RegionId, RegionId, u64, bool)> {
    events
        .iter()
        .filter_map(|event| match event {
            SimulationEvent::RouteTransmission {
                from,
                to,
                infected,
                reinfection,
                ..
            } => Some((*from, *to, *infected, *reinfection)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_infection_crosses_route_with_sized_seed() {
    let mut engine = linked_pair();
    engine.seed_infection(RegionId(0), 1_000_000).unwrap();
    engine.set_propagation(PropagationFlags {
        internal: false,
        cross_region: true,
        reinfection: false,
    });

    let report = engine.step().unwrap().unwrap();

    // floor(sqrt(100M) / 1000) = 10 people per crossing
    let crossed = crossings(&report.events);
    assert_eq!(crossed[0], (RegionId(0), RegionId(1), 10, false));
    assert!(report.events.contains(&SimulationEvent::RouteTransmission {
        from: RegionId(0),
        to: RegionId(1),
        mode: TransportMode::Land,
        infected: 10,
        reinfection: false,
    }));
    assert_eq!(report.imported, crossed.iter().map(|c| c.2).sum::<u64>());

    let east = engine.region(RegionId(1)).unwrap();
    assert_eq!(east.compartments().infected, 10);
    assert_eq!(east.cohort_total(), 10);
    assert_eq!(report.new_infections, 0);
}

#[test]
fn test_reinfection_crosses_into_recovered_region() {
    let mut engine = linked_pair();
    engine.seed_infection(RegionId(1), 1_000_000).unwrap();
    for _ in 0..14 {
        engine.step().unwrap();
    }
    let east = *engine.region(RegionId(1)).unwrap().compartments();
    assert_eq!(east.infected, 0);
    assert!(east.recovered > 900_000);

    engine.seed_infection(RegionId(0), 1_000_000).unwrap();
    engine.set_propagation(PropagationFlags {
        internal: false,
        cross_region: true,
        reinfection: true,
    });
    let report = engine.step().unwrap().unwrap();

    // Reinfection seeds are half the first-infection seed, capped at 10% of
    // the recovered pool
    let crossed = crossings(&report.events);
    assert!(crossed.contains(&(RegionId(0), RegionId(1), 10, false)));
    assert!(crossed.contains(&(RegionId(0), RegionId(1), 5, true)));
    assert!(crossed.iter().all(|&(_, to, _, reinfection)| !reinfection || to == RegionId(1)));

    let east = engine.region(RegionId(1)).unwrap();
    assert_eq!(east.compartments().reinfected, 5);
    assert_eq!(east.compartments().infected, 15);
    assert_eq!(east.cohort_total(), 15);
}
