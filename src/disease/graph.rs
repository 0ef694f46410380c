//! Probabilistic transmission graph
//!
//! A per-day view of the world as the pathogen sees it: one node per region
//! and one edge per route it can currently travel. Built fresh from world
//! state at the start of every step and never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::core::types::{Day, RegionId, TransportMode};
use crate::disease::pathogen::{Disease, DOMINANT_MODE_BOOST, MAX_INFECTION_PROBABILITY};
use crate::network::RouteKey;
use crate::world::region::{InfectiousState, Region};
use crate::world::World;

/// Ceiling of a reinfection edge probability
pub const MAX_REINFECTION_PROBABILITY: f64 = 0.5;

/// Weight of the destination's recovered share in dampening reinfection
pub const RECOVERED_DAMPING: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: RegionId,
    pub name: String,
    pub state: InfectiousState,
    pub infected: u64,
    pub recovered: u64,
    pub reinfected: u64,
    pub transmission_factor: f64,
    pub quarantined: bool,
}

impl GraphNode {
    fn from_region(region: &Region) -> Self {
        let c = region.compartments();
        Self {
            id: region.id,
            name: region.name.clone(),
            state: region.state(),
            infected: c.infected,
            recovered: c.recovered,
            reinfected: c.reinfected,
            transmission_factor: region.transmission_factor(),
            quarantined: region.is_quarantined(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    FirstInfection,
    Reinfection,
}

/// Transmission edge over one route. Routes are bidirectional, so the edge
/// carries one probability per direction: `toward_high` applies to travel
/// from `key.low` into `key.high`, `toward_low` to the reverse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub key: RouteKey,
    pub mode: TransportMode,
    pub kind: EdgeKind,
    pub toward_high: f64,
    pub toward_low: f64,
}

impl GraphEdge {
    /// Both directed traversals as `(origin, destination, probability)`
    pub fn directions(&self) -> [(RegionId, RegionId, f64); 2] {
        [
            (self.key.low, self.key.high, self.toward_high),
            (self.key.high, self.key.low, self.toward_low),
        ]
    }

    /// Probability of reaching `destination`, 0 when it is not an endpoint
    pub fn probability_into(&self, destination: RegionId) -> f64 {
        if destination == self.key.high {
            self.toward_high
        } else if destination == self.key.low {
            self.toward_low
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbabilisticGraph {
    pub day: Day,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl ProbabilisticGraph {
    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(move |e| e.kind == kind)
    }

    pub fn node(&self, id: RegionId) -> Option<&GraphNode> {
        self.nodes.get(id.index())
    }
}

impl Disease {
    /// Derive today's transmission graph from world state
    pub fn build_probabilistic_graph(&self, world: &World, day: Day) -> ProbabilisticGraph {
        let nodes: Vec<GraphNode> = world.regions().iter().map(GraphNode::from_region).collect();
        let mut edges = Vec::new();

        for route in world.network().routes() {
            if !route.is_open() {
                continue;
            }
            let (Some(low), Some(high)) = (world.region(route.key.low), world.region(route.key.high)) else {
                continue;
            };
            if low.is_quarantined() || high.is_quarantined() {
                continue;
            }

            let mut p = route.base_probability(self.contagion_rate());
            if self.is_dominant(route.mode) {
                p *= DOMINANT_MODE_BOOST;
            }
            let into = |dest: &Region| (p * dest.transmission_factor()).min(MAX_INFECTION_PROBABILITY);
            let (toward_high, toward_low) = (into(high), into(low));

            edges.push(GraphEdge {
                key: route.key,
                mode: route.mode,
                kind: EdgeKind::FirstInfection,
                toward_high,
                toward_low,
            });

            let reinfect = |p_first: f64, dest: &Region| {
                if dest.compartments().recovered == 0 {
                    return 0.0;
                }
                let damping = 1.0 - dest.compartments().recovered_share() * RECOVERED_DAMPING;
                (p_first * self.reinfection_resistance() * damping).clamp(0.0, MAX_REINFECTION_PROBABILITY)
            };
            let (re_high, re_low) = (reinfect(toward_high, high), reinfect(toward_low, low));
            if re_high > 0.0 || re_low > 0.0 {
                edges.push(GraphEdge {
                    key: route.key,
                    mode: route.mode,
                    kind: EdgeKind::Reinfection,
                    toward_high: re_high,
                    toward_low: re_low,
                });
            }
        }

        ProbabilisticGraph { day, nodes, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Coordinates;
    use crate::disease::DiseaseParams;
    use crate::world::Measure;

    fn world() -> World {
        let regions = vec![
            Region::new(RegionId(0), "A", 1_000_000, Coordinates::new(0.0, 0.0)),
            Region::new(RegionId(1), "B", 1_000_000, Coordinates::new(0.0, 3.0)),
            Region::new(RegionId(2), "C", 1_000_000, Coordinates::new(3.0, 0.0)),
        ];
        let mut world = World::new("test", regions).unwrap();
        world.add_route(RegionId(0), RegionId(1), TransportMode::Air, 0.8).unwrap();
        world.add_route(RegionId(0), RegionId(2), TransportMode::Sea, 0.4).unwrap();
        world
    }

    #[test]
    fn test_nodes_mirror_regions() {
        let graph = Disease::default().build_probabilistic_graph(&world(), 0);
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.node(RegionId(1)).unwrap().name, "B");
    }

    #[test]
    fn test_dominant_mode_boost() {
        let world = world();
        let disease = Disease::default();
        let graph = disease.build_probabilistic_graph(&world, 0);

        let air = world.network().get(RegionId(0), RegionId(1)).unwrap();
        let expected = (air.base_probability(0.3) * DOMINANT_MODE_BOOST).min(MAX_INFECTION_PROBABILITY);
        let edge = graph.edges_of_kind(EdgeKind::FirstInfection).find(|e| e.mode == TransportMode::Air).unwrap();
        assert!((edge.toward_high - expected).abs() < 1e-12);

        // SEA is not dominant at day zero
        let sea = world.network().get(RegionId(0), RegionId(2)).unwrap();
        let edge = graph.edges_of_kind(EdgeKind::FirstInfection).find(|e| e.mode == TransportMode::Sea).unwrap();
        assert!((edge.toward_low - sea.base_probability(0.3)).abs() < 1e-12);
    }

    #[test]
    fn test_destination_factor_is_per_direction() {
        let mut world = world();
        world.region_mut(RegionId(1)).unwrap().apply_measure(Measure::ClosedBorders, 0);
        let graph = Disease::default().build_probabilistic_graph(&world, 0);

        let edge = graph.edges.iter().find(|e| e.key.high == RegionId(1)).unwrap();
        assert!((edge.toward_high - edge.toward_low * 0.1).abs() < 1e-12);
        assert_eq!(edge.probability_into(RegionId(1)), edge.toward_high);
        assert_eq!(edge.probability_into(RegionId(2)), 0.0);
    }

    #[test]
    fn test_severed_and_quarantined_routes_excluded() {
        let mut world = world();
        world.network_mut().sever(RegionId(0), RegionId(1), 0).unwrap();
        world.region_mut(RegionId(2)).unwrap().toggle_quarantine(true, 0);
        let graph = Disease::default().build_probabilistic_graph(&world, 0);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_reinfection_edge_needs_recovered_destination() {
        let mut world = world();
        let disease = Disease::new(DiseaseParams {
            mortality_percent: 0.0,
            ..DiseaseParams::default()
        });
        assert!(disease
            .build_probabilistic_graph(&world, 0)
            .edges_of_kind(EdgeKind::Reinfection)
            .next()
            .is_none());

        let b = world.region_mut(RegionId(1)).unwrap();
        b.add_infection(10_000, 0, false);
        b.process_cohorts(14, &disease);

        let graph = disease.build_probabilistic_graph(&world, 14);
        let re: Vec<_> = graph.edges_of_kind(EdgeKind::Reinfection).collect();
        assert_eq!(re.len(), 1);
        assert!(re[0].toward_high > 0.0);
        assert_eq!(re[0].toward_low, 0.0);
        assert!(re[0].toward_high <= MAX_REINFECTION_PROBABILITY);
    }
}
