//! World - all regions plus the route network between them

use ahash::AHashMap;
use rand::Rng;

use crate::core::error::{EngineError, Result};
use crate::core::types::{Coordinates, RegionId, TransportMode};
use crate::network::{RouteKey, RouteNetwork};
use crate::world::region::Region;
use crate::world::scenario::Scenario;

/// The simulated world. Regions live in a dense arena: a region's id is its
/// index.
#[derive(Debug, Clone)]
pub struct World {
    pub name: String,
    regions: Vec<Region>,
    network: RouteNetwork,
    name_index: AHashMap<String, RegionId>,
}

impl World {
    /// Build a world from regions, renumbering ids to arena order.
    /// A world needs at least one region.
    pub fn new(name: impl Into<String>, mut regions: Vec<Region>) -> Result<Self> {
        let name = name.into();
        if regions.is_empty() {
            return Err(EngineError::EmptyScenario(name));
        }

        let mut name_index = AHashMap::new();
        for (index, region) in regions.iter_mut().enumerate() {
            region.id = RegionId(index as u32);
            name_index.insert(region.name.to_lowercase(), region.id);
        }

        let network = RouteNetwork::new(regions.len());
        Ok(Self {
            name,
            regions,
            network,
            name_index,
        })
    }

    /// Build a world from a scenario. Explicit scenario routes are added as
    /// given; a scenario without routes gets a random network drawn from `rng`.
    pub fn from_scenario<R: Rng>(scenario: &Scenario, route_density: f64, rng: &mut R) -> Result<Self> {
        let regions = scenario
            .regions
            .iter()
            .enumerate()
            .map(|(index, r)| {
                Region::from_millions(
                    RegionId(index as u32),
                    r.name.clone(),
                    r.population_millions,
                    Coordinates::new(r.latitude, r.longitude),
                )
            })
            .collect();
        let mut world = Self::new(scenario.name.clone(), regions)?;

        if scenario.routes.is_empty() {
            let added = world
                .network
                .generate_random(&world.regions, route_density, rng);
            tracing::debug!(scenario = %scenario.name, routes = added, "generated random route network");
        } else {
            for route in &scenario.routes {
                let from = world.lookup_name(&route.from)?;
                let to = world.lookup_name(&route.to)?;
                let traffic = route.traffic.unwrap_or_else(|| route.mode.base_traffic());
                world.add_route(from, to, route.mode, traffic)?;
            }
        }

        Ok(world)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn regions_mut(&mut self) -> &mut [Region] {
        &mut self.regions
    }

    pub fn region_ids(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.regions.iter().map(|r| r.id)
    }

    pub fn contains(&self, id: RegionId) -> bool {
        id.index() < self.regions.len()
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.index())
    }

    pub fn region_mut(&mut self, id: RegionId) -> Option<&mut Region> {
        self.regions.get_mut(id.index())
    }

    /// Case-insensitive lookup by name
    pub fn region_by_name(&self, name: &str) -> Option<&Region> {
        self.name_index
            .get(&name.to_lowercase())
            .and_then(|id| self.region(*id))
    }

    pub fn network(&self) -> &RouteNetwork {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut RouteNetwork {
        &mut self.network
    }

    /// Borrow regions and network mutably at the same time
    pub fn split_mut(&mut self) -> (&mut [Region], &mut RouteNetwork) {
        (&mut self.regions, &mut self.network)
    }

    pub fn add_route(&mut self, a: RegionId, b: RegionId, mode: TransportMode, traffic: f64) -> Result<RouteKey> {
        let route = self.network.add_route(&self.regions, a, b, mode, traffic)?;
        Ok(route.key)
    }

    fn lookup_name(&self, name: &str) -> Result<RegionId> {
        self.region_by_name(name)
            .map(|r| r.id)
            .ok_or_else(|| EngineError::InvalidConfig(format!("route references unknown region {}", name)))
    }
}
