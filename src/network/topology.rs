//! RouteNetwork - the set of routes between regions
//!
//! Routes live in an ordered map keyed by their canonical key so iteration
//! order is stable (seeded runs stay reproducible). A dense adjacency matrix
//! mirrors the key set and is rebuilt whenever topology changes.

use ahash::AHashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::error::{EngineError, Result};
use crate::core::types::{Day, RegionId, TransportMode};
use crate::network::route::{Route, RouteKey};
use crate::world::region::Region;

/// Symmetric region-by-region link matrix
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdjacencyMatrix {
    size: usize,
    cells: Vec<bool>,
}

impl AdjacencyMatrix {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![false; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_linked(&self, a: RegionId, b: RegionId) -> bool {
        let (a, b) = (a.index(), b.index());
        a < self.size && b < self.size && self.cells[a * self.size + b]
    }

    fn set(&mut self, key: RouteKey, linked: bool) {
        let (a, b) = (key.low.index(), key.high.index());
        if a < self.size && b < self.size {
            self.cells[a * self.size + b] = linked;
            self.cells[b * self.size + a] = linked;
        }
    }

    /// Matrix rows as 0/1 values
    pub fn rows(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.size.max(1))
            .take(self.size)
            .map(|row| row.iter().map(|&c| c as u8).collect())
            .collect()
    }

    /// Number of regions linked to `id`
    pub fn degree(&self, id: RegionId) -> usize {
        let i = id.index();
        if i >= self.size {
            return 0;
        }
        self.cells[i * self.size..(i + 1) * self.size]
            .iter()
            .filter(|&&c| c)
            .count()
    }
}

/// Which end of a route a region sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteEnd {
    /// The region is the canonical low endpoint
    Outbound,
    /// The region is the canonical high endpoint
    Inbound,
}

/// A route as seen from one of its endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedRoute {
    pub key: RouteKey,
    pub peer: RegionId,
    pub end: RouteEnd,
    pub mode: TransportMode,
    pub traffic: f64,
    pub distance_km: f64,
    pub severed: bool,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RouteNetwork {
    routes: BTreeMap<RouteKey, Route>,
    adjacency: AdjacencyMatrix,
    /// Routes cut by each quarantined region; an entry exists exactly while
    /// the region's quarantine is in force.
    quarantine_cuts: AHashMap<RegionId, Vec<RouteKey>>,
}

impl RouteNetwork {
    pub fn new(region_count: usize) -> Self {
        Self {
            routes: BTreeMap::new(),
            adjacency: AdjacencyMatrix::new(region_count),
            quarantine_cuts: AHashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    pub fn adjacency(&self) -> &AdjacencyMatrix {
        &self.adjacency
    }

    /// Order-insensitive lookup
    pub fn get(&self, a: RegionId, b: RegionId) -> Option<&Route> {
        RouteKey::new(a, b).and_then(|key| self.routes.get(&key))
    }

    pub fn get_by_key(&self, key: &RouteKey) -> Option<&Route> {
        self.routes.get(key)
    }

    fn get_mut(&mut self, a: RegionId, b: RegionId) -> Result<&mut Route> {
        RouteKey::new(a, b)
            .and_then(|key| self.routes.get_mut(&key))
            .ok_or(EngineError::UnknownRoute(a, b))
    }

    /// Open a new route between two regions
    pub fn add_route(
        &mut self,
        regions: &[Region],
        a: RegionId,
        b: RegionId,
        mode: TransportMode,
        traffic: f64,
    ) -> Result<&Route> {
        let key = RouteKey::new(a, b).ok_or(EngineError::SelfLoop(a))?;
        let from = regions.get(key.low.index()).ok_or(EngineError::UnknownRegion(key.low))?;
        let to = regions.get(key.high.index()).ok_or(EngineError::UnknownRegion(key.high))?;
        if self.routes.contains_key(&key) {
            return Err(EngineError::DuplicateRoute(key.low, key.high));
        }

        let distance = from.coordinates.haversine_km(&to.coordinates);
        let route = Route::new(key, mode, traffic, distance);
        tracing::debug!(
            route = %key,
            mode = %mode,
            distance_km = distance,
            "route added"
        );

        self.routes.insert(key, route);
        self.rebuild_adjacency(regions.len());
        Ok(&self.routes[&key])
    }

    /// Delete a route. Returns whether one existed.
    pub fn remove_route(&mut self, a: RegionId, b: RegionId) -> bool {
        let Some(key) = RouteKey::new(a, b) else {
            return false;
        };
        if self.routes.remove(&key).is_none() {
            return false;
        }
        for cuts in self.quarantine_cuts.values_mut() {
            cuts.retain(|k| *k != key);
        }
        let size = self.adjacency.size();
        self.rebuild_adjacency(size);
        tracing::debug!(route = %key, "route removed");
        true
    }

    /// Sever a route without deleting it. `Ok(false)` when already severed.
    pub fn sever(&mut self, a: RegionId, b: RegionId, day: Day) -> Result<bool> {
        Ok(self.get_mut(a, b)?.sever(day))
    }

    /// Reopen a severed route. `Ok(false)` when it was not severed.
    pub fn restore(&mut self, a: RegionId, b: RegionId, day: Day) -> Result<bool> {
        Ok(self.get_mut(a, b)?.restore(day))
    }

    pub fn set_active(&mut self, a: RegionId, b: RegionId, active: bool) -> Result<bool> {
        Ok(self.get_mut(a, b)?.set_active(active))
    }

    /// Sever every open route touching `id`, remembering exactly which ones
    /// were cut.
    pub fn sever_all_for_region(&mut self, id: RegionId, day: Day) -> Vec<RouteKey> {
        let mut cut = Vec::new();
        for (key, route) in self.routes.iter_mut() {
            if key.contains(id) && route.is_open() && route.sever(day) {
                cut.push(*key);
            }
        }
        self.quarantine_cuts
            .entry(id)
            .or_default()
            .extend(cut.iter().copied());
        cut
    }

    /// Reopen the routes cut by `id`'s quarantine.
    ///
    /// A cut route whose other endpoint is itself quarantined stays severed
    /// and is handed over to that region's record, so it reopens when the
    /// last quarantine on it lifts.
    pub fn restore_for_region(&mut self, id: RegionId, day: Day) -> Vec<RouteKey> {
        let Some(cuts) = self.quarantine_cuts.remove(&id) else {
            return Vec::new();
        };

        let mut restored = Vec::new();
        for key in cuts {
            let Some(peer) = key.other(id) else {
                continue;
            };
            if let Some(peer_cuts) = self.quarantine_cuts.get_mut(&peer) {
                peer_cuts.push(key);
                continue;
            }
            if let Some(route) = self.routes.get_mut(&key) {
                if route.restore(day) {
                    restored.push(key);
                }
            }
        }
        restored
    }

    /// Routes currently held severed by `id`'s quarantine
    pub fn quarantine_cuts(&self, id: RegionId) -> &[RouteKey] {
        self.quarantine_cuts.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn clear_quarantine_cuts(&mut self) {
        self.quarantine_cuts.clear();
    }

    /// Every route touching `id`, open or severed
    pub fn routes_for_region(&self, id: RegionId) -> Vec<ConnectedRoute> {
        self.routes
            .values()
            .filter_map(|route| {
                let peer = route.key.other(id)?;
                Some(ConnectedRoute {
                    key: route.key,
                    peer,
                    end: if route.key.low == id {
                        RouteEnd::Outbound
                    } else {
                        RouteEnd::Inbound
                    },
                    mode: route.mode,
                    traffic: route.traffic,
                    distance_km: route.distance_km,
                    severed: route.is_severed(),
                    active: route.is_active(),
                })
            })
            .collect()
    }

    /// Link random region pairs, each with probability `density`.
    /// Returns how many routes were added.
    pub fn generate_random<R: Rng>(&mut self, regions: &[Region], density: f64, rng: &mut R) -> usize {
        let mut added = 0;
        for i in 0..regions.len() {
            for j in (i + 1)..regions.len() {
                if rng.gen::<f64>() >= density {
                    continue;
                }
                let mode = TransportMode::ALL[rng.gen_range(0..TransportMode::ALL.len())];
                let traffic = default_traffic(mode, rng);
                if self
                    .add_route(regions, regions[i].id, regions[j].id, mode, traffic)
                    .is_ok()
                {
                    added += 1;
                }
            }
        }
        added
    }

    fn rebuild_adjacency(&mut self, region_count: usize) {
        let mut adjacency = AdjacencyMatrix::new(region_count);
        for key in self.routes.keys() {
            adjacency.set(*key, true);
        }
        self.adjacency = adjacency;
    }
}

/// Traffic coefficient for a new route of `mode`: the mode's base traffic
/// with ±0.2 jitter, kept within [0.1, 0.95]
pub fn default_traffic<R: Rng>(mode: TransportMode, rng: &mut R) -> f64 {
    let jitter = rng.gen_range(-0.2..0.2);
    (mode.base_traffic() + jitter).clamp(0.1, 0.95)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Coordinates;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn regions(n: u32) -> Vec<Region> {
        (0..n)
            .map(|i| {
                Region::new(
                    RegionId(i),
                    format!("R{}", i),
                    1_000_000,
                    Coordinates::new(i as f64, i as f64 * 2.0),
                )
            })
            .collect()
    }

    #[test]
    fn test_add_route_canonical_lookup() {
        let regions = regions(4);
        let mut net = RouteNetwork::new(4);
        net.add_route(&regions, RegionId(3), RegionId(1), TransportMode::Air, 0.5)
            .unwrap();

        let a = net.get(RegionId(1), RegionId(3)).unwrap();
        let b = net.get(RegionId(3), RegionId(1)).unwrap();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.key.low, RegionId(1));
        assert!(net.adjacency().is_linked(RegionId(1), RegionId(3)));
        assert!(net.adjacency().is_linked(RegionId(3), RegionId(1)));
    }

    #[test]
    fn test_add_route_rejections() {
        let regions = regions(3);
        let mut net = RouteNetwork::new(3);
        assert!(matches!(
            net.add_route(&regions, RegionId(1), RegionId(1), TransportMode::Air, 0.5),
            Err(EngineError::SelfLoop(_))
        ));
        assert!(matches!(
            net.add_route(&regions, RegionId(1), RegionId(7), TransportMode::Air, 0.5),
            Err(EngineError::UnknownRegion(RegionId(7)))
        ));
        net.add_route(&regions, RegionId(0), RegionId(1), TransportMode::Land, 0.5)
            .unwrap();
        assert!(matches!(
            net.add_route(&regions, RegionId(1), RegionId(0), TransportMode::Sea, 0.2),
            Err(EngineError::DuplicateRoute(..))
        ));
        assert_eq!(net.len(), 1);
    }

    #[test]
    fn test_remove_route_clears_adjacency() {
        let regions = regions(3);
        let mut net = RouteNetwork::new(3);
        net.add_route(&regions, RegionId(0), RegionId(2), TransportMode::Sea, 0.3)
            .unwrap();
        assert!(net.remove_route(RegionId(2), RegionId(0)));
        assert!(!net.remove_route(RegionId(2), RegionId(0)));
        assert!(!net.adjacency().is_linked(RegionId(0), RegionId(2)));
        assert!(net.is_empty());
    }

    #[test]
    fn test_quarantine_cuts_are_reversible() {
        let regions = regions(4);
        let mut net = RouteNetwork::new(4);
        for (a, b) in [(0, 1), (0, 2), (0, 3), (1, 2)] {
            net.add_route(&regions, RegionId(a), RegionId(b), TransportMode::Land, 0.5)
                .unwrap();
        }
        // Independently severed before quarantine
        net.sever(RegionId(0), RegionId(3), 1).unwrap();

        let cut = net.sever_all_for_region(RegionId(0), 2);
        assert_eq!(cut.len(), 2);

        let restored = net.restore_for_region(RegionId(0), 3);
        assert_eq!(restored.len(), 2);
        assert!(!net.get(RegionId(0), RegionId(1)).unwrap().is_severed());
        assert!(!net.get(RegionId(0), RegionId(2)).unwrap().is_severed());
        assert!(net.get(RegionId(0), RegionId(3)).unwrap().is_severed());
        assert!(!net.get(RegionId(1), RegionId(2)).unwrap().is_severed());
    }

    #[test]
    fn test_overlapping_quarantines_hand_over_cuts() {
        let regions = regions(2);
        let mut net = RouteNetwork::new(2);
        net.add_route(&regions, RegionId(0), RegionId(1), TransportMode::Air, 0.5)
            .unwrap();

        assert_eq!(net.sever_all_for_region(RegionId(0), 1).len(), 1);
        assert!(net.sever_all_for_region(RegionId(1), 1).is_empty());

        assert!(net.restore_for_region(RegionId(0), 2).is_empty());
        assert!(net.get(RegionId(0), RegionId(1)).unwrap().is_severed());
        assert_eq!(net.quarantine_cuts(RegionId(1)).len(), 1);

        assert_eq!(net.restore_for_region(RegionId(1), 3).len(), 1);
        assert!(!net.get(RegionId(0), RegionId(1)).unwrap().is_severed());
    }

    #[test]
    fn test_routes_for_region_includes_severed() {
        let regions = regions(3);
        let mut net = RouteNetwork::new(3);
        net.add_route(&regions, RegionId(0), RegionId(1), TransportMode::Air, 0.5)
            .unwrap();
        net.add_route(&regions, RegionId(2), RegionId(1), TransportMode::Sea, 0.5)
            .unwrap();
        net.sever(RegionId(1), RegionId(2), 0).unwrap();

        let connected = net.routes_for_region(RegionId(1));
        assert_eq!(connected.len(), 2);
        assert!(connected.iter().any(|c| c.peer == RegionId(2) && c.severed));
        assert!(connected
            .iter()
            .any(|c| c.peer == RegionId(0) && c.end == RouteEnd::Inbound));
    }

    #[test]
    fn test_unknown_route_errors() {
        let mut net = RouteNetwork::new(2);
        assert!(matches!(
            net.sever(RegionId(0), RegionId(1), 0),
            Err(EngineError::UnknownRoute(..))
        ));
    }

    #[test]
    fn test_generate_random_is_seeded() {
        let regions = regions(8);
        let mut a = RouteNetwork::new(8);
        let mut b = RouteNetwork::new(8);
        a.generate_random(&regions, 0.5, &mut ChaCha8Rng::seed_from_u64(9));
        b.generate_random(&regions, 0.5, &mut ChaCha8Rng::seed_from_u64(9));

        let keys_a: Vec<_> = a.routes().map(|r| (r.key, r.mode)).collect();
        let keys_b: Vec<_> = b.routes().map(|r| (r.key, r.mode)).collect();
        assert_eq!(keys_a, keys_b);
        assert!(a.routes().all(|r| (0.1..=0.95).contains(&r.traffic)));
    }

    #[test]
    fn test_adjacency_rows() {
        let regions = regions(3);
        let mut net = RouteNetwork::new(3);
        net.add_route(&regions, RegionId(0), RegionId(2), TransportMode::Air, 0.5)
            .unwrap();
        let rows = net.adjacency().rows();
        assert_eq!(rows, vec![vec![0, 0, 1], vec![0, 0, 0], vec![1, 0, 0]]);
        assert_eq!(net.adjacency().degree(RegionId(0)), 1);
    }
}
