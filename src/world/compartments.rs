//! Population compartments of a single region

use serde::{Deserialize, Serialize};

/// Population buckets of one region
///
/// `reinfected` is a cumulative counter and is not part of the
/// `susceptible + infected + recovered + deceased <= total` bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Compartments {
    pub total: u64,
    pub susceptible: u64,
    pub infected: u64,
    pub recovered: u64,
    pub deceased: u64,
    pub reinfected: u64,
}

/// Signed change to apply to a set of compartments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompartmentDelta {
    pub susceptible: i64,
    pub infected: i64,
    pub recovered: i64,
    pub deceased: i64,
    pub reinfected: i64,
}

impl CompartmentDelta {
    /// Move `amount` people from susceptible to infected
    pub fn infect(amount: u64) -> Self {
        let amount = amount as i64;
        Self {
            susceptible: -amount,
            infected: amount,
            ..Default::default()
        }
    }

    /// Move `amount` people from recovered back to infected
    pub fn reinfect(amount: u64) -> Self {
        let amount = amount as i64;
        Self {
            recovered: -amount,
            infected: amount,
            reinfected: amount,
            ..Default::default()
        }
    }

    /// Resolve infections into deaths and recoveries
    pub fn resolve(deaths: u64, recoveries: u64) -> Self {
        Self {
            infected: -((deaths + recoveries) as i64),
            recovered: recoveries as i64,
            deceased: deaths as i64,
            ..Default::default()
        }
    }

    /// Move `amount` people from recovered back to susceptible
    pub fn wane(amount: u64) -> Self {
        let amount = amount as i64;
        Self {
            recovered: -amount,
            susceptible: amount,
            ..Default::default()
        }
    }
}

impl Compartments {
    /// A fully susceptible population
    pub fn new(total: u64) -> Self {
        Self {
            total,
            susceptible: total,
            ..Default::default()
        }
    }

    /// Sum of the bounded buckets
    pub fn accounted(&self) -> u64 {
        self.susceptible + self.infected + self.recovered + self.deceased
    }

    /// People still alive
    pub fn living(&self) -> u64 {
        self.total.saturating_sub(self.deceased)
    }

    /// Fraction of the total population currently infected
    pub fn infected_share(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.infected as f64 / self.total as f64
        }
    }

    /// Fraction of the total population currently recovered
    pub fn recovered_share(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.recovered as f64 / self.total as f64
        }
    }

    /// Apply a signed delta, clamping negatives to zero and rebalancing
    /// proportionally when the buckets overflow `total`.
    ///
    /// Returns true when a rebalance was needed.
    pub fn apply_delta(&mut self, delta: CompartmentDelta) -> bool {
        self.susceptible = offset(self.susceptible, delta.susceptible);
        self.infected = offset(self.infected, delta.infected);
        self.recovered = offset(self.recovered, delta.recovered);
        self.deceased = offset(self.deceased, delta.deceased);
        self.reinfected = offset(self.reinfected, delta.reinfected);
        self.rebalance()
    }

    /// Scale the bounded buckets down to `total`; the rounding remainder is
    /// given to susceptible.
    pub fn rebalance(&mut self) -> bool {
        let sum = self.accounted();
        if sum <= self.total {
            return false;
        }

        let factor = self.total as f64 / sum as f64;
        self.infected = (self.infected as f64 * factor).floor() as u64;
        self.recovered = (self.recovered as f64 * factor).floor() as u64;
        self.deceased = (self.deceased as f64 * factor).floor() as u64;
        let others = self.infected + self.recovered + self.deceased;
        self.susceptible = self.total.saturating_sub(others);
        true
    }
}

fn offset(value: u64, delta: i64) -> u64 {
    if delta >= 0 {
        value.saturating_add(delta as u64)
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}
