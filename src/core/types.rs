//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::EngineError;

/// Simulated day counter
pub type Day = u32;

/// Stable identifier for a region (index into the world's region arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionId(pub u32);

impl RegionId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transport mode of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransportMode {
    Air,
    Land,
    Sea,
}

impl TransportMode {
    pub const ALL: [TransportMode; 3] = [TransportMode::Air, TransportMode::Land, TransportMode::Sea];

    /// Cruise speed in km/h
    pub fn speed_kmh(&self) -> f64 {
        match self {
            Self::Air => 800.0,
            Self::Land => 80.0,
            Self::Sea => 40.0,
        }
    }

    /// Fixed boarding/customs delay in hours added to every trip
    pub fn processing_delay_hours(&self) -> f64 {
        match self {
            Self::Air => 2.0,
            Self::Land => 0.5,
            Self::Sea => 6.0,
        }
    }

    /// Multiplier applied to a route's base transmission probability
    pub fn probability_factor(&self) -> f64 {
        match self {
            Self::Air => 0.8,
            Self::Land => 0.9,
            Self::Sea => 0.6,
        }
    }

    /// Typical traffic coefficient for a freshly opened route of this mode
    pub fn base_traffic(&self) -> f64 {
        match self {
            Self::Air => 0.8,
            Self::Land => 0.6,
            Self::Sea => 0.4,
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Air => "AIR",
            Self::Land => "LAND",
            Self::Sea => "SEA",
        };
        f.pad(name)
    }
}

impl FromStr for TransportMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AIR" => Ok(Self::Air),
            "LAND" => Ok(Self::Land),
            "SEA" => Ok(Self::Sea),
            other => Err(EngineError::UnknownTransportMode(other.to_string())),
        }
    }
}

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Great-circle distance in kilometres
    pub fn haversine_km(&self, other: &Coordinates) -> f64 {
        use geo::HaversineDistance;

        let a = geo_types::Point::new(self.longitude, self.latitude);
        let b = geo_types::Point::new(other.longitude, other.latitude);
        a.haversine_distance(&b) / 1000.0
    }
}
