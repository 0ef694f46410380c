//! Read-only analysis of the running simulation
//!
//! Everything here either reads live state or works on a clone of the
//! engine. Nothing mutates the live simulation.

use ordered_float::OrderedFloat;
use rand::Rng;
use serde::Serialize;

use crate::core::error::Result;
use crate::core::types::{Day, RegionId};
use crate::network::RouteKey;
use crate::simulation::engine::SimulationEngine;

/// Growth above which the next day is classed HIGH risk
pub const HIGH_RISK_GROWTH: f64 = 0.10;

/// Growth above which the next day is classed MEDIUM risk
pub const MEDIUM_RISK_GROWTH: f64 = 0.05;

/// Infected share above which a region is flagged in a prediction
pub const HOTSPOT_SHARE: f64 = 0.05;

/// Summed route risk above which an infection-free region is at risk
pub const AT_RISK_THRESHOLD: f64 = 0.1;

/// Number of regions listed in a forecast
pub const FORECAST_TOP_REGIONS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GlobalStats {
    pub day: Day,
    pub population: u64,
    pub susceptible: u64,
    pub infected: u64,
    pub recovered: u64,
    pub deceased: u64,
    pub reinfected: u64,
    /// Regions with at least one active infection
    pub affected_regions: usize,
    pub quarantined_regions: usize,
    /// Relative change in infected between the two latest snapshots
    pub propagation_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_growth(rate: f64) -> Self {
        if rate > HIGH_RISK_GROWTH {
            Self::High
        } else if rate > MEDIUM_RISK_GROWTH {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub day: Day,
    pub risk: RiskLevel,
    pub propagation_rate: f64,
    /// Infected count if today's growth holds for one more day
    pub projected_infected: u64,
    /// Regions whose infected share exceeds the hotspot threshold
    pub hotspots: Vec<RegionId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionRisk {
    pub region: RegionId,
    pub name: String,
    pub risk: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalRoute {
    pub key: RouteKey,
    pub description: String,
    pub importance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffectedRegion {
    pub region: RegionId,
    pub name: String,
    pub infected: u64,
    pub infected_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub from_day: Day,
    pub days: u32,
    pub stats: GlobalStats,
    pub most_affected: Vec<AffectedRegion>,
}

impl<R: Rng + Clone> SimulationEngine<R> {
    pub fn global_stats(&self) -> GlobalStats {
        let mut stats = GlobalStats {
            day: self.day(),
            propagation_rate: self.propagation_rate(),
            ..Default::default()
        };
        for region in self.regions() {
            let c = region.compartments();
            stats.population += c.total;
            stats.susceptible += c.susceptible;
            stats.infected += c.infected;
            stats.recovered += c.recovered;
            stats.deceased += c.deceased;
            stats.reinfected += c.reinfected;
            if c.infected > 0 {
                stats.affected_regions += 1;
            }
            if region.is_quarantined() {
                stats.quarantined_regions += 1;
            }
        }
        stats
    }

    /// `(latest - previous) / previous` over snapshot infected totals,
    /// 0 without two snapshots or when the previous total is 0
    pub fn propagation_rate(&self) -> f64 {
        let snapshots = self.snapshots();
        let (Some(latest), Some(previous)) = (snapshots.latest(), snapshots.previous()) else {
            return 0.0;
        };
        let before = previous.total_infected();
        if before == 0 {
            return 0.0;
        }
        (latest.total_infected() as f64 - before as f64) / before as f64
    }

    pub fn predict_next_day(&self) -> Prediction {
        let stats = self.global_stats();
        let rate = stats.propagation_rate;
        let projected = (stats.infected as f64 * (1.0 + rate)).max(0.0).round() as u64;
        Prediction {
            day: stats.day + 1,
            risk: RiskLevel::from_growth(rate),
            propagation_rate: rate,
            projected_infected: projected,
            hotspots: self
                .regions()
                .iter()
                .filter(|r| r.infected_share() > HOTSPOT_SHARE)
                .map(|r| r.id)
                .collect(),
        }
    }

    /// Infection-free regions exposed to infected neighbours, most exposed
    /// first
    pub fn regions_at_risk(&self) -> Vec<RegionRisk> {
        let contagion = self.disease().contagion_rate();
        let mut at_risk: Vec<RegionRisk> = self
            .regions()
            .iter()
            .filter(|r| r.compartments().infected == 0)
            .filter_map(|free| {
                let risk: f64 = self
                    .world()
                    .network()
                    .routes()
                    .filter(|route| route.is_open())
                    .filter_map(|route| {
                        let neighbour = self.region(route.key.other(free.id)?)?;
                        (neighbour.compartments().infected > 0)
                            .then(|| route.base_probability(contagion) * neighbour.infected_share())
                    })
                    .sum();
                (risk > AT_RISK_THRESHOLD).then(|| RegionRisk {
                    region: free.id,
                    name: free.name.clone(),
                    risk,
                })
            })
            .collect();
        at_risk.sort_by_key(|r| std::cmp::Reverse(OrderedFloat(r.risk)));
        at_risk
    }

    /// Open routes ranked by how much they could carry the outbreak. The
    /// more infected endpoint is taken as the origin.
    pub fn critical_routes(&self, limit: usize) -> Vec<CriticalRoute> {
        let contagion = self.disease().contagion_rate();
        let mut ranked: Vec<CriticalRoute> = self
            .routes()
            .filter(|route| route.is_open())
            .filter_map(|route| {
                let low = self.region(route.key.low)?;
                let high = self.region(route.key.high)?;
                let (origin, destination) = if high.infected_share() > low.infected_share() {
                    (high, low)
                } else {
                    (low, high)
                };
                let importance =
                    route.traffic * route.base_probability(contagion) * (1.0 + origin.infected_share());
                Some(CriticalRoute {
                    key: route.key,
                    description: format!("{} -> {} ({})", origin.name, destination.name, route.mode),
                    importance,
                })
            })
            .collect();
        ranked.sort_by_key(|r| std::cmp::Reverse(OrderedFloat(r.importance)));
        ranked.truncate(limit);
        ranked
    }

    /// Run a copy of the simulation `days` ahead and report where it ends up
    pub fn forecast(&self, days: u32) -> Result<Forecast> {
        let mut what_if = self.clone();
        what_if.set_running(true);
        for _ in 0..days {
            what_if.step()?;
        }

        let mut most_affected: Vec<AffectedRegion> = what_if
            .regions()
            .iter()
            .filter(|r| r.compartments().infected > 0)
            .map(|r| AffectedRegion {
                region: r.id,
                name: r.name.clone(),
                infected: r.compartments().infected,
                infected_share: r.infected_share(),
            })
            .collect();
        most_affected.sort_by_key(|r| std::cmp::Reverse(r.infected));
        most_affected.truncate(FORECAST_TOP_REGIONS);

        tracing::debug!(from_day = self.day(), days, "forecast complete");
        Ok(Forecast {
            from_day: self.day(),
            days,
            stats: what_if.global_stats(),
            most_affected,
        })
    }
}
