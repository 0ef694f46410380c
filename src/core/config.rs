//! Simulation configuration with documented constants
//!
//! All engine tuning numbers are collected here with explanations of their
//! purpose and how they interact with each other. Every field has a default,
//! so a TOML override file only needs to name what it changes.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{EngineError, Result};
use crate::disease::variant::VariantProfile;

/// Slowest allowed timer speed (steps per second)
pub const MIN_SPEED: u32 = 1;

/// Fastest allowed timer speed (steps per second)
pub const MAX_SPEED: u32 = 60;

/// Configuration for the simulation engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for the deterministic random generator
    pub seed: u64,

    // === INTERNAL TRANSMISSION ===
    /// Daily contacts per person used for first infections inside a region
    ///
    /// At 8 contacts and 30% contagion a fully mixed region roughly doubles
    /// its infected count every few days until the daily cap kicks in.
    pub contact_rate: f64,

    /// Daily contacts per person between infected and recovered people
    ///
    /// Deliberately lower than `contact_rate`: reinfection needs a second
    /// exposure to overcome acquired immunity.
    pub reinfection_contact_rate: f64,

    /// Maximum share of the susceptible pool infected in one day
    pub daily_infection_cap: f64,

    /// Maximum share of the recovered pool reinfected in one day
    pub daily_reinfection_cap: f64,

    // === CROSS-REGION TRANSMISSION ===
    /// Damping applied to every directed traversal of a route
    ///
    /// Each route is tried twice per day (once per direction), so the raw
    /// edge probability is scaled down to keep seeding plausible.
    pub cross_region_damping: f64,

    /// Share of a destination's recovered pool that a reinfection seed may take
    pub reinfection_seed_share: f64,

    /// Probability that any given region pair is linked when a scenario
    /// without explicit routes generates its network
    pub route_density: f64,

    // === RUN CONTROL ===
    /// Number of engine snapshots kept for stats and step-back
    pub snapshot_capacity: usize,

    /// Timer speed in steps per second
    pub default_speed: u32,

    /// Run infection inside each region
    pub internal_propagation: bool,

    /// Run infection across routes
    pub cross_region_propagation: bool,

    /// Allow recovered people to be infected again
    pub reinfection_enabled: bool,

    // === PATHOGEN EVOLUTION ===
    pub evolution: EvolutionSchedule,

    /// Table of variant profiles drawn from when a new variant emerges
    pub variant_profiles: Vec<VariantProfile>,
}

/// Day thresholds that drive pathogen evolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionSchedule {
    /// Day on which the pathogen adapts to sea routes
    pub sea_mode_day: u32,

    /// A new variant emerges once per multiple of this many days
    pub variant_interval_days: u32,
}

impl Default for EvolutionSchedule {
    fn default() -> Self {
        Self {
            sea_mode_day: 30,
            variant_interval_days: 90,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 12345,

            contact_rate: 8.0,
            reinfection_contact_rate: 2.0,
            daily_infection_cap: 0.05,
            daily_reinfection_cap: 0.01,

            cross_region_damping: 0.3,
            reinfection_seed_share: 0.1,
            route_density: 0.3,

            snapshot_capacity: 100,
            default_speed: 5,
            internal_propagation: true,
            cross_region_propagation: true,
            reinfection_enabled: true,

            evolution: EvolutionSchedule::default(),
            variant_profiles: VariantProfile::default_table(),
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document, filling unspecified fields with defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let unit_fields = [
            ("daily_infection_cap", self.daily_infection_cap),
            ("daily_reinfection_cap", self.daily_reinfection_cap),
            ("cross_region_damping", self.cross_region_damping),
            ("reinfection_seed_share", self.reinfection_seed_share),
            ("route_density", self.route_density),
        ];
        for (name, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::InvalidConfig(format!(
                    "{} ({}) must be within [0, 1]",
                    name, value
                )));
            }
        }

        if self.contact_rate < 0.0 || self.reinfection_contact_rate < 0.0 {
            return Err(EngineError::InvalidConfig("Contact rates must be non-negative".into()));
        }

        if self.reinfection_contact_rate > self.contact_rate {
            return Err(EngineError::InvalidConfig(format!(
                "reinfection_contact_rate ({}) should be <= contact_rate ({})",
                self.reinfection_contact_rate, self.contact_rate
            )));
        }

        if self.snapshot_capacity < 2 {
            return Err(EngineError::InvalidConfig(
                "snapshot_capacity must hold at least two snapshots".into(),
            ));
        }

        if !(MIN_SPEED..=MAX_SPEED).contains(&self.default_speed) {
            return Err(EngineError::InvalidConfig(format!(
                "default_speed ({}) must be within [{}, {}]",
                self.default_speed, MIN_SPEED, MAX_SPEED
            )));
        }

        if self.evolution.variant_interval_days == 0 {
            return Err(EngineError::InvalidConfig("variant_interval_days must be positive".into()));
        }

        if self.variant_profiles.is_empty() {
            return Err(EngineError::InvalidConfig("variant_profiles must not be empty".into()));
        }

        for profile in &self.variant_profiles {
            profile.validate()?;
        }

        Ok(())
    }
}
