//! Infection cohorts
//!
//! Infections are tracked in batches that share a start day so that each
//! batch resolves into deaths and recoveries exactly once, after the
//! disease's recovery duration.

use serde::{Deserialize, Serialize};

use crate::core::types::Day;

/// A batch of infections that started on the same day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveCohort {
    pub start_day: Day,
    pub count: u64,
    pub is_reinfection: bool,
    /// 1 for a first infection, 2 or more for reinfections
    pub times_infected: u32,
}

impl ActiveCohort {
    pub fn new(start_day: Day, count: u64, is_reinfection: bool) -> Self {
        Self {
            start_day,
            count,
            is_reinfection,
            times_infected: if is_reinfection { 2 } else { 1 },
        }
    }

    pub fn age(&self, day: Day) -> Day {
        day.saturating_sub(self.start_day)
    }

    pub fn is_mature(&self, day: Day, recovery_days: u32) -> bool {
        self.age(day) >= recovery_days
    }
}

/// A cohort that has run its course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCohort {
    pub resolution_day: Day,
    pub count: u64,
    pub times_infected: u32,
    pub deaths: u64,
    pub recoveries: u64,
}

/// Split a mature cohort into (deaths, recoveries)
pub fn split_outcome(count: u64, mortality_rate: f64) -> (u64, u64) {
    let deaths = ((count as f64) * mortality_rate.clamp(0.0, 1.0)).floor() as u64;
    let deaths = deaths.min(count);
    (deaths, count - deaths)
}

/// Remove `excess` people from the newest cohorts first
///
/// Used when a compartment rebalance shrinks `infected` so that the cohort
/// sum keeps matching it.
pub fn trim_newest(cohorts: &mut Vec<ActiveCohort>, mut excess: u64) {
    while excess > 0 {
        let Some(last) = cohorts.last_mut() else {
            break;
        };
        let take = last.count.min(excess);
        last.count -= take;
        excess -= take;
        if last.count == 0 {
            cohorts.pop();
        }
    }
}
