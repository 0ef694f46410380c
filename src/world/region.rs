//! Region - one geographic area of the simulated world
//!
//! A region owns its population compartments, the infection cohorts that
//! make up its `infected` bucket, the measures in force, and its quarantine
//! state. All mutation goes through methods so that the compartment bound
//! and the cohort-sum invariant hold after every call.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::core::types::{Coordinates, Day, RegionId};
use crate::disease::Disease;
use crate::world::cohort::{self, ActiveCohort, ResolvedCohort};
use crate::world::compartments::{CompartmentDelta, Compartments};
use crate::world::history::{HistoryEntry, RegionHistory};
use crate::world::measures::{self, Measure};

/// Fraction of the recovered pool that loses immunity each day
pub const IMMUNITY_WANING_RATE: f64 = 0.001;

/// Number of resolved cohorts kept per region, oldest dropped first
pub const RESOLVED_COHORT_CAPACITY: usize = 100;

/// Coarse infection level of a region, derived from its infected share
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InfectiousState {
    Free,
    Exposed,
    Infected,
    Outbreak,
    Epidemic,
    Recovered,
}

impl InfectiousState {
    pub fn classify(compartments: &Compartments) -> Self {
        if compartments.infected == 0 {
            return if compartments.recovered > 0 {
                Self::Recovered
            } else {
                Self::Free
            };
        }

        let percent = compartments.infected_share() * 100.0;
        if percent < 1.0 {
            Self::Exposed
        } else if percent < 10.0 {
            Self::Infected
        } else if percent < 30.0 {
            Self::Outbreak
        } else {
            Self::Epidemic
        }
    }

    /// True for any state with people currently infected
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Exposed | Self::Infected | Self::Outbreak | Self::Epidemic)
    }
}

/// Full copy of a region's mutable state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSnapshot {
    pub id: RegionId,
    pub name: String,
    pub compartments: Compartments,
    pub measures: Vec<Measure>,
    pub quarantined: bool,
    pub transmission_factor: f64,
    pub state: InfectiousState,
    pub cohorts: Vec<ActiveCohort>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub coordinates: Coordinates,
    compartments: Compartments,
    measures: Vec<Measure>,
    quarantined: bool,
    transmission_factor: f64,
    state: InfectiousState,
    cohorts: Vec<ActiveCohort>,
    resolved: VecDeque<ResolvedCohort>,
    history: RegionHistory,
}

impl Region {
    pub fn new(id: RegionId, name: impl Into<String>, population: u64, coordinates: Coordinates) -> Self {
        Self {
            id,
            name: name.into(),
            coordinates,
            compartments: Compartments::new(population),
            measures: Vec::new(),
            quarantined: false,
            transmission_factor: 1.0,
            state: InfectiousState::Free,
            cohorts: Vec::new(),
            resolved: VecDeque::with_capacity(RESOLVED_COHORT_CAPACITY),
            history: RegionHistory::default(),
        }
    }

    /// Build a region from a population expressed in millions
    pub fn from_millions(id: RegionId, name: impl Into<String>, millions: f64, coordinates: Coordinates) -> Self {
        let population = (millions.max(0.0) * 1_000_000.0).round() as u64;
        Self::new(id, name, population, coordinates)
    }

    pub fn compartments(&self) -> &Compartments {
        &self.compartments
    }

    pub fn measures(&self) -> &[Measure] {
        &self.measures
    }

    pub fn has_measure(&self, measure: Measure) -> bool {
        self.measures.contains(&measure)
    }

    pub fn is_quarantined(&self) -> bool {
        self.quarantined
    }

    pub fn transmission_factor(&self) -> f64 {
        self.transmission_factor
    }

    pub fn state(&self) -> InfectiousState {
        self.state
    }

    pub fn cohorts(&self) -> &[ActiveCohort] {
        &self.cohorts
    }

    /// Most recently resolved cohorts, oldest first
    pub fn resolved_cohorts(&self) -> &VecDeque<ResolvedCohort> {
        &self.resolved
    }

    pub fn history(&self) -> &RegionHistory {
        &self.history
    }

    pub fn infected_share(&self) -> f64 {
        self.compartments.infected_share()
    }

    pub fn cohort_total(&self) -> u64 {
        self.cohorts.iter().map(|c| c.count).sum()
    }

    /// Infect up to `amount` people on `day`.
    ///
    /// First infections draw from the susceptible pool, reinfections from the
    /// recovered pool. Returns how many people were actually infected; a
    /// quarantined region accepts none.
    pub fn add_infection(&mut self, amount: u64, day: Day, is_reinfection: bool) -> u64 {
        if self.quarantined || amount == 0 {
            return 0;
        }

        let pool = if is_reinfection {
            self.compartments.recovered
        } else {
            self.compartments.susceptible
        };
        let amount = amount.min(pool);
        if amount == 0 {
            return 0;
        }

        self.cohorts.push(ActiveCohort::new(day, amount, is_reinfection));
        let delta = if is_reinfection {
            CompartmentDelta::reinfect(amount)
        } else {
            CompartmentDelta::infect(amount)
        };
        self.apply(delta);
        self.refresh_state();
        self.record(day);
        amount
    }

    /// Resolve every cohort that has been infected for the disease's full
    /// recovery duration, then apply immunity waning.
    pub fn process_cohorts(&mut self, day: Day, disease: &Disease) {
        let recovery_days = disease.recovery_days();
        let mortality = disease.mortality_rate();

        let (mature, pending): (Vec<ActiveCohort>, Vec<ActiveCohort>) = self
            .cohorts
            .drain(..)
            .partition(|c| c.is_mature(day, recovery_days));
        self.cohorts = pending;

        let mut deaths = 0;
        let mut recoveries = 0;
        for matured in mature {
            let (dead, recovered) = cohort::split_outcome(matured.count, mortality);
            deaths += dead;
            recoveries += recovered;
            if self.resolved.len() == RESOLVED_COHORT_CAPACITY {
                self.resolved.pop_front();
            }
            self.resolved.push_back(ResolvedCohort {
                resolution_day: day,
                count: matured.count,
                times_infected: matured.times_infected,
                deaths: dead,
                recoveries: recovered,
            });
        }
        if deaths + recoveries > 0 {
            self.apply(CompartmentDelta::resolve(deaths, recoveries));
        }

        if !self.quarantined && self.compartments.recovered > 0 {
            let recovered = self.compartments.recovered;
            let leak = ((recovered as f64 * IMMUNITY_WANING_RATE).floor() as u64)
                .max(1)
                .min(recovered);
            self.apply(CompartmentDelta::wane(leak));
        }

        self.refresh_state();
        self.record(day);
    }

    /// Set the quarantine flag. Returns true when the flag actually changed.
    pub fn toggle_quarantine(&mut self, active: bool, day: Day) -> bool {
        if self.quarantined == active {
            return false;
        }

        self.quarantined = active;
        if active {
            if !self.measures.contains(&Measure::Quarantine) {
                self.measures.push(Measure::Quarantine);
            }
        } else {
            self.measures.retain(|m| *m != Measure::Quarantine);
        }
        self.recompute_transmission_factor();
        self.record(day);
        true
    }

    /// Put a measure in force. Quarantine is routed through the flag.
    /// Returns true when the measure set changed.
    pub fn apply_measure(&mut self, measure: Measure, day: Day) -> bool {
        if measure == Measure::Quarantine {
            return self.toggle_quarantine(true, day);
        }
        if self.measures.contains(&measure) {
            return false;
        }
        self.measures.push(measure);
        self.recompute_transmission_factor();
        true
    }

    /// Lift a measure. Returns true when the measure set changed.
    pub fn remove_measure(&mut self, measure: Measure, day: Day) -> bool {
        if measure == Measure::Quarantine {
            return self.toggle_quarantine(false, day);
        }
        let before = self.measures.len();
        self.measures.retain(|m| *m != measure);
        if self.measures.len() == before {
            return false;
        }
        self.recompute_transmission_factor();
        true
    }

    pub fn recompute_transmission_factor(&mut self) -> f64 {
        self.transmission_factor = measures::transmission_factor(&self.measures);
        self.transmission_factor
    }

    /// Return to an all-susceptible state with no measures
    pub fn reset(&mut self) {
        let total = self.compartments.total;
        self.compartments = Compartments::new(total);
        self.measures.clear();
        self.quarantined = false;
        self.transmission_factor = 1.0;
        self.state = InfectiousState::Free;
        self.cohorts.clear();
        self.resolved.clear();
        self.history.clear();
    }

    pub fn snapshot(&self) -> RegionSnapshot {
        RegionSnapshot {
            id: self.id,
            name: self.name.clone(),
            compartments: self.compartments,
            measures: self.measures.clone(),
            quarantined: self.quarantined,
            transmission_factor: self.transmission_factor,
            state: self.state,
            cohorts: self.cohorts.clone(),
        }
    }

    /// Restore mutable state from a snapshot taken on `day`
    pub fn restore(&mut self, snapshot: &RegionSnapshot, day: Day) {
        self.compartments = snapshot.compartments;
        self.measures = snapshot.measures.clone();
        self.quarantined = snapshot.quarantined;
        self.cohorts = snapshot.cohorts.clone();
        self.resolved.retain(|r| r.resolution_day <= day);
        self.history.truncate_after(day);
        self.recompute_transmission_factor();
        self.refresh_state();
    }

    fn apply(&mut self, delta: CompartmentDelta) {
        if self.compartments.apply_delta(delta) {
            let excess = self.cohort_total().saturating_sub(self.compartments.infected);
            cohort::trim_newest(&mut self.cohorts, excess);
            tracing::debug!(region = %self.name, "compartments rebalanced to population total");
        }
    }

    fn refresh_state(&mut self) {
        self.state = InfectiousState::classify(&self.compartments);
    }

    fn record(&mut self, day: Day) {
        self.history.record(HistoryEntry {
            day,
            compartments: self.compartments,
            quarantined: self.quarantined,
        });
    }
}
