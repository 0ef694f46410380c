//! Disease - pathogen parameters and their evolution over a run
//!
//! The disease keeps its user-facing parameters (`DiseaseParams`) separate
//! from the rates currently in effect. Rates start from the parameters and
//! are replaced wholesale each time a variant emerges, so the current rates
//! always equal the latest variant's.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::EvolutionSchedule;
use crate::core::types::{Day, RegionId, TransportMode};
use crate::disease::variant::{Variant, VariantProfile};

/// Multiplier on routes whose mode the pathogen spreads best along
pub const DOMINANT_MODE_BOOST: f64 = 1.5;

/// Immunity left against reinfection before any variant has emerged
pub const DEFAULT_REINFECTION_RESISTANCE: f64 = 0.2;

/// Ceiling of any single infection probability
pub const MAX_INFECTION_PROBABILITY: f64 = 0.99;

/// User-configurable pathogen parameters. Percentages are clamped into
/// [0, 100] when applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiseaseParams {
    pub name: String,
    pub contagion_percent: f64,
    pub mortality_percent: f64,
    pub recovery_days: u32,
    /// Region seeded when the world is reset
    pub origin: Option<RegionId>,
    pub dominant_modes: Vec<TransportMode>,
}

impl Default for DiseaseParams {
    fn default() -> Self {
        Self {
            name: "Novel Pathogen".to_string(),
            contagion_percent: 30.0,
            mortality_percent: 2.0,
            recovery_days: 14,
            origin: None,
            dominant_modes: vec![TransportMode::Air, TransportMode::Land],
        }
    }
}

impl DiseaseParams {
    fn contagion_rate(&self) -> f64 {
        percent_to_rate(self.contagion_percent)
    }

    fn mortality_rate(&self) -> f64 {
        percent_to_rate(self.mortality_percent)
    }
}

fn percent_to_rate(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0) / 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disease {
    params: DiseaseParams,
    contagion_rate: f64,
    mortality_rate: f64,
    dominant_modes: Vec<TransportMode>,
    elapsed_days: Day,
    reinfection_resistance: f64,
    variants: Vec<Variant>,
    /// Number of variant intervals already consumed
    variant_epochs: u32,
    sea_adapted: bool,
    schedule: EvolutionSchedule,
    profiles: Vec<VariantProfile>,
}

impl Disease {
    /// A disease with the default evolution schedule and variant table
    pub fn new(params: DiseaseParams) -> Self {
        Self::with_evolution(params, EvolutionSchedule::default(), VariantProfile::default_table())
    }

    pub fn with_evolution(params: DiseaseParams, schedule: EvolutionSchedule, profiles: Vec<VariantProfile>) -> Self {
        let mut disease = Self {
            contagion_rate: 0.0,
            mortality_rate: 0.0,
            dominant_modes: Vec::new(),
            elapsed_days: 0,
            reinfection_resistance: DEFAULT_REINFECTION_RESISTANCE,
            variants: Vec::new(),
            variant_epochs: 0,
            sea_adapted: false,
            schedule,
            profiles,
            params,
        };
        disease.reset();
        disease
    }

    pub fn name(&self) -> &str {
        &self.params.name
    }

    pub fn params(&self) -> &DiseaseParams {
        &self.params
    }

    pub fn contagion_rate(&self) -> f64 {
        self.contagion_rate
    }

    pub fn mortality_rate(&self) -> f64 {
        self.mortality_rate
    }

    pub fn recovery_days(&self) -> u32 {
        self.params.recovery_days
    }

    pub fn origin(&self) -> Option<RegionId> {
        self.params.origin
    }

    pub fn dominant_modes(&self) -> &[TransportMode] {
        &self.dominant_modes
    }

    pub fn is_dominant(&self, mode: TransportMode) -> bool {
        self.dominant_modes.contains(&mode)
    }

    pub fn elapsed_days(&self) -> Day {
        self.elapsed_days
    }

    pub fn reinfection_resistance(&self) -> f64 {
        self.reinfection_resistance
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub fn current_variant(&self) -> Option<&Variant> {
        self.variants.last()
    }

    /// Replace the parameters without touching elapsed time or variant
    /// history. Current rates follow the new parameters until the next
    /// variant emerges.
    pub fn configure(&mut self, params: DiseaseParams) {
        self.contagion_rate = params.contagion_rate();
        self.mortality_rate = params.mortality_rate();
        self.dominant_modes = params.dominant_modes.clone();
        if self.sea_adapted && !self.dominant_modes.contains(&TransportMode::Sea) {
            self.dominant_modes.push(TransportMode::Sea);
        }
        self.params = params;
        tracing::info!(
            disease = %self.params.name,
            contagion = self.contagion_rate,
            mortality = self.mortality_rate,
            recovery_days = self.params.recovery_days,
            "disease reconfigured"
        );
    }

    /// Back to day zero with the configured parameters
    pub fn reset(&mut self) {
        self.contagion_rate = self.params.contagion_rate();
        self.mortality_rate = self.params.mortality_rate();
        self.dominant_modes = self.params.dominant_modes.clone();
        self.elapsed_days = 0;
        self.reinfection_resistance = DEFAULT_REINFECTION_RESISTANCE;
        self.variants.clear();
        self.variant_epochs = 0;
        self.sea_adapted = false;
    }

    /// Advance the pathogen by `days`. Returns the variants that emerged.
    ///
    /// Sea adaptation happens once, the first time elapsed time reaches the
    /// schedule's sea day. One variant emerges per variant interval crossed.
    pub fn evolve<R: Rng>(&mut self, days: u32, rng: &mut R) -> Vec<Variant> {
        self.elapsed_days = self.elapsed_days.saturating_add(days);

        if !self.sea_adapted && self.elapsed_days >= self.schedule.sea_mode_day {
            self.sea_adapted = true;
            if !self.dominant_modes.contains(&TransportMode::Sea) {
                self.dominant_modes.push(TransportMode::Sea);
                tracing::info!(day = self.elapsed_days, "pathogen adapted to sea routes");
            }
        }

        let mut emerged = Vec::new();
        if self.schedule.variant_interval_days == 0 || self.profiles.is_empty() {
            return emerged;
        }
        let due = self.elapsed_days / self.schedule.variant_interval_days;
        while self.variant_epochs < due {
            self.variant_epochs += 1;
            let variant = self.emerge_variant(rng);
            emerged.push(variant.clone());
            self.variants.push(variant);
        }
        emerged
    }

    fn emerge_variant<R: Rng>(&mut self, rng: &mut R) -> Variant {
        let profile = &self.profiles[rng.gen_range(0..self.profiles.len())];
        let seen = self
            .variants
            .iter()
            .filter(|v| v.name == profile.name || v.name.starts_with(&format!("{}-", profile.name)))
            .count();
        let name = if seen == 0 {
            profile.name.clone()
        } else {
            format!("{}-{}", profile.name, seen + 1)
        };

        let variant = profile.sample(name, self.contagion_rate, self.mortality_rate, self.elapsed_days, rng);
        self.contagion_rate = variant.contagion_rate;
        self.mortality_rate = variant.mortality_rate;
        self.reinfection_resistance = (1.0 - variant.immunity_resistance).clamp(0.0, 1.0);

        tracing::info!(
            variant = %variant.name,
            day = variant.emergence_day,
            contagion = variant.contagion_rate,
            mortality = variant.mortality_rate,
            "new variant emerged"
        );
        variant
    }

    /// Probability that one contact infects someone who has been infected
    /// `times_infected - 1` times before
    pub fn infection_probability(&self, times_infected: u32, is_reinfection: bool) -> f64 {
        let mut p = self.contagion_rate;
        if is_reinfection {
            let prior = times_infected.saturating_sub(2) as i32;
            p *= self.reinfection_resistance * 0.5_f64.powi(prior);
        }
        p.clamp(0.0, MAX_INFECTION_PROBABILITY)
    }
}

impl Default for Disease {
    fn default() -> Self {
        Self::new(DiseaseParams::default())
    }
}
