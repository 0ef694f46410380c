//! Transport routes between regions
//!
//! Routes are bidirectional. A route is stored once under its canonical key
//! (lower region id first), so `(a, b)` and `(b, a)` always name the same
//! route.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::types::{Day, RegionId, TransportMode};

/// Distance (km) at which the distance term of the base probability halves
pub const DISTANCE_HALF_KM: f64 = 500.0;

/// Travel time (hours) at which the travel-time term halves
pub const TRAVEL_TIME_HALF_HOURS: f64 = 24.0;

/// e-folding time (hours) of the exponential travel-time decay
pub const TRAVEL_DECAY_HOURS: f64 = 48.0;

pub const MIN_BASE_PROBABILITY: f64 = 0.01;
pub const MAX_BASE_PROBABILITY: f64 = 0.95;

/// Canonical unordered region pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RouteKey {
    pub low: RegionId,
    pub high: RegionId,
}

impl RouteKey {
    /// Normalize a pair; `None` for a self-loop
    pub fn new(a: RegionId, b: RegionId) -> Option<Self> {
        if a == b {
            return None;
        }
        Some(Self {
            low: a.min(b),
            high: a.max(b),
        })
    }

    pub fn contains(&self, id: RegionId) -> bool {
        self.low == id || self.high == id
    }

    /// The endpoint opposite `id`
    pub fn other(&self, id: RegionId) -> Option<RegionId> {
        if id == self.low {
            Some(self.high)
        } else if id == self.high {
            Some(self.low)
        } else {
            None
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteAction {
    Severed,
    Restored,
}

/// One entry of a route's sever/restore log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEvent {
    pub day: Day,
    pub action: RouteAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub key: RouteKey,
    pub mode: TransportMode,
    /// Traffic coefficient in [0, 1]
    pub traffic: f64,
    pub distance_km: f64,
    pub travel_time_hours: f64,
    active: bool,
    severed: bool,
    events: Vec<RouteEvent>,
}

impl Route {
    pub fn new(key: RouteKey, mode: TransportMode, traffic: f64, distance_km: f64) -> Self {
        let distance_km = distance_km.max(0.0);
        Self {
            key,
            mode,
            traffic: if traffic.is_nan() { 0.0 } else { traffic.clamp(0.0, 1.0) },
            distance_km,
            travel_time_hours: travel_time_hours(mode, distance_km),
            active: true,
            severed: false,
            events: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_severed(&self) -> bool {
        self.severed
    }

    /// Active and not severed
    pub fn is_open(&self) -> bool {
        self.active && !self.severed
    }

    pub fn events(&self) -> &[RouteEvent] {
        &self.events
    }

    /// Returns true when the route was open and is now severed
    pub fn sever(&mut self, day: Day) -> bool {
        if self.severed {
            return false;
        }
        self.severed = true;
        self.events.push(RouteEvent {
            day,
            action: RouteAction::Severed,
        });
        true
    }

    /// Returns true when the route was severed and is now restored
    pub fn restore(&mut self, day: Day) -> bool {
        if !self.severed {
            return false;
        }
        self.severed = false;
        self.events.push(RouteEvent {
            day,
            action: RouteAction::Restored,
        });
        true
    }

    pub fn set_active(&mut self, active: bool) -> bool {
        let changed = self.active != active;
        self.active = active;
        changed
    }

    /// Transmission probability of this route before disease and
    /// destination adjustments
    pub fn base_probability(&self, contagion_factor: f64) -> f64 {
        if self.severed {
            return 0.0;
        }

        let blend = 0.4 * self.traffic
            + 0.3 / (1.0 + self.distance_km / DISTANCE_HALF_KM)
            + 0.3 / (1.0 + self.travel_time_hours / TRAVEL_TIME_HALF_HOURS);
        let decay = (-self.travel_time_hours / TRAVEL_DECAY_HOURS).exp();
        let p = blend * self.mode.probability_factor() * decay * contagion_factor;

        p.clamp(MIN_BASE_PROBABILITY, MAX_BASE_PROBABILITY)
    }
}

/// Hours needed to cover `distance_km` by `mode`, including processing delay
pub fn travel_time_hours(mode: TransportMode, distance_km: f64) -> f64 {
    distance_km / mode.speed_kmh() + mode.processing_delay_hours()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(a: u32, b: u32) -> RouteKey {
        RouteKey::new(RegionId(a), RegionId(b)).unwrap()
    }

    #[test]
    fn test_key_is_canonical() {
        assert_eq!(key(3, 1), key(1, 3));
        assert_eq!(key(3, 1).low, RegionId(1));
        assert_eq!(key(3, 1).to_string(), "1-3");
        assert!(RouteKey::new(RegionId(2), RegionId(2)).is_none());
    }

    #[test]
    fn test_key_other() {
        let k = key(4, 9);
        assert_eq!(k.other(RegionId(4)), Some(RegionId(9)));
        assert_eq!(k.other(RegionId(9)), Some(RegionId(4)));
        assert_eq!(k.other(RegionId(5)), None);
    }

    #[test]
    fn test_travel_time_by_mode() {
        assert!((travel_time_hours(TransportMode::Air, 800.0) - 3.0).abs() < 1e-12);
        assert!((travel_time_hours(TransportMode::Land, 80.0) - 1.5).abs() < 1e-12);
        assert!((travel_time_hours(TransportMode::Sea, 400.0) - 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_traffic_is_clamped() {
        let r = Route::new(key(0, 1), TransportMode::Air, 3.0, 100.0);
        assert_eq!(r.traffic, 1.0);
        let r = Route::new(key(0, 1), TransportMode::Air, -1.0, 100.0);
        assert_eq!(r.traffic, 0.0);
    }

    #[test]
    fn test_base_probability_bounds() {
        let near = Route::new(key(0, 1), TransportMode::Land, 1.0, 10.0);
        let p = near.base_probability(1.0);
        assert!(p > 0.5 && p <= MAX_BASE_PROBABILITY, "p = {}", p);

        let far = Route::new(key(0, 1), TransportMode::Sea, 0.0, 15_000.0);
        assert_eq!(far.base_probability(1.0), MIN_BASE_PROBABILITY);
    }

    #[test]
    fn test_base_probability_formula() {
        let r = Route::new(key(0, 1), TransportMode::Air, 0.5, 1000.0);
        let t = 1000.0 / 800.0 + 2.0;
        let expected = (0.4 * 0.5 + 0.3 / (1.0 + 2.0) + 0.3 / (1.0 + t / 24.0))
            * 0.8
            * (-t / 48.0_f64).exp()
            * 0.3;
        assert!((r.base_probability(0.3) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_severed_route_has_zero_probability() {
        let mut r = Route::new(key(0, 1), TransportMode::Air, 0.9, 100.0);
        assert!(r.sever(4));
        assert_eq!(r.base_probability(1.0), 0.0);
    }

    #[test]
    fn test_sever_is_idempotent() {
        let mut r = Route::new(key(0, 1), TransportMode::Sea, 0.5, 100.0);
        assert!(r.sever(1));
        assert!(!r.sever(2));
        assert_eq!(r.events().len(), 1);
        assert!(r.restore(3));
        assert!(!r.restore(3));
        assert_eq!(r.events().len(), 2);
        assert_eq!(r.events()[1].action, RouteAction::Restored);
    }
}
