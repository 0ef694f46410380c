//! Public-health measures and their effect on transmission

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::EngineError;

/// A public-health measure a region can put in force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    Quarantine,
    ClosedBorders,
    Distancing,
    Masks,
    Vaccination,
}

impl Measure {
    pub const ALL: [Measure; 5] = [
        Measure::Quarantine,
        Measure::ClosedBorders,
        Measure::Distancing,
        Measure::Masks,
        Measure::Vaccination,
    ];

    /// Multiplier applied to the region's transmission factor.
    /// Quarantine is handled as an override, see [`transmission_factor`].
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Quarantine => 0.0,
            Self::ClosedBorders => 0.1,
            Self::Distancing => 0.6,
            Self::Masks => 0.8,
            Self::Vaccination => 0.7,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Quarantine => "quarantine",
            Self::ClosedBorders => "closed_borders",
            Self::Distancing => "distancing",
            Self::Masks => "masks",
            Self::Vaccination => "vaccination",
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Measure {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Measure::ALL
            .into_iter()
            .find(|m| m.name() == normalized)
            .ok_or_else(|| EngineError::UnknownMeasure(s.to_string()))
    }
}

/// Combined transmission factor of a set of measures
///
/// Quarantine forces 0 regardless of anything else.
pub fn transmission_factor(measures: &[Measure]) -> f64 {
    if measures.contains(&Measure::Quarantine) {
        return 0.0;
    }
    measures
        .iter()
        .map(Measure::multiplier)
        .product::<f64>()
        .max(0.0)
}
