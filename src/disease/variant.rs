//! Variant profiles and emergence sampling

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::error::{EngineError, Result};
use crate::core::types::Day;

/// A variant that has emerged during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    pub contagion_rate: f64,
    pub mortality_rate: f64,
    pub emergence_day: Day,
    /// How strongly the variant escapes immunity from earlier infections
    pub immunity_resistance: f64,
}

/// Template a new variant is drawn from. Ranges are inclusive `(min, max)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantProfile {
    pub name: String,
    /// Added to 1.0 to scale the current contagion rate
    pub contagion_boost: (f64, f64),
    /// Added to 1.0 to scale the current mortality rate
    pub mortality_shift: (f64, f64),
    pub immunity_resistance: (f64, f64),
}

impl VariantProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contagion_boost: (0.1, 0.3),
            mortality_shift: (-0.05, 0.05),
            immunity_resistance: (0.3, 0.7),
        }
    }

    pub fn default_table() -> Vec<VariantProfile> {
        ["Alpha", "Beta", "Gamma", "Delta", "Epsilon", "Zeta", "Theta", "Kappa", "Omicron"]
            .into_iter()
            .map(VariantProfile::new)
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        let ranges = [
            ("contagion_boost", self.contagion_boost),
            ("mortality_shift", self.mortality_shift),
            ("immunity_resistance", self.immunity_resistance),
        ];
        for (field, (min, max)) in ranges {
            if !(min <= max) {
                return Err(EngineError::InvalidConfig(format!(
                    "variant {} has an empty {} range ({}, {})",
                    self.name, field, min, max
                )));
            }
        }
        if self.immunity_resistance.0 < 0.0 || self.immunity_resistance.1 > 1.0 {
            return Err(EngineError::InvalidConfig(format!(
                "variant {} immunity_resistance must be within [0, 1]",
                self.name
            )));
        }
        Ok(())
    }

    /// Draw a concrete variant derived from the current rates
    pub fn sample<R: Rng>(
        &self,
        name: String,
        contagion_rate: f64,
        mortality_rate: f64,
        day: Day,
        rng: &mut R,
    ) -> Variant {
        let contagion_multiplier = 1.0 + uniform(self.contagion_boost, rng);
        let mortality_multiplier = 1.0 + uniform(self.mortality_shift, rng);
        Variant {
            name,
            contagion_rate: (contagion_rate * contagion_multiplier).clamp(0.0, 1.0),
            mortality_rate: (mortality_rate * mortality_multiplier).clamp(0.0, 1.0),
            emergence_day: day,
            immunity_resistance: uniform(self.immunity_resistance, rng).clamp(0.0, 1.0),
        }
    }
}

fn uniform<R: Rng>((min, max): (f64, f64), rng: &mut R) -> f64 {
    if min >= max {
        min
    } else {
        rng.gen_range(min..=max)
    }
}
