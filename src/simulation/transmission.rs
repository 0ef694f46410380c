//! Transmission formulas
//!
//! Pure functions computing how many people get infected. The engine owns
//! the randomness and applies the results through `Region::add_infection`.

use crate::world::Compartments;

/// New first infections inside one region today.
///
/// Contacts scale with the population, the share of them involving an
/// infected person is damped by the region's transmission factor, and the
/// resulting exposures of susceptible people convert at probability `p`.
/// The result never exceeds `ceil(susceptible * daily_cap)`.
pub fn internal_infections(c: &Compartments, transmission_factor: f64, contact_rate: f64, p: f64, daily_cap: f64) -> u64 {
    let effective = effective_contacts(c, transmission_factor, contact_rate);
    exposures_to_cases(effective, c, c.susceptible, p, daily_cap)
}

/// New reinfections of recovered people inside one region today
pub fn internal_reinfections(c: &Compartments, transmission_factor: f64, contact_rate: f64, p: f64, daily_cap: f64) -> u64 {
    let effective = effective_contacts(c, transmission_factor, contact_rate);
    exposures_to_cases(effective, c, c.recovered, p, daily_cap)
}

fn effective_contacts(c: &Compartments, transmission_factor: f64, contact_rate: f64) -> f64 {
    if c.total == 0 || c.infected == 0 {
        return 0.0;
    }
    let contacts = contact_rate * c.total as f64;
    let with_infected = contacts * c.infected as f64 / c.total as f64;
    with_infected * transmission_factor
}

fn exposures_to_cases(effective: f64, c: &Compartments, pool: u64, p: f64, daily_cap: f64) -> u64 {
    let uninfected = c.total.saturating_sub(c.infected);
    if effective <= 0.0 || uninfected == 0 || pool == 0 {
        return 0;
    }
    let with_pool = effective * pool as f64 / uninfected as f64;
    let cases = (with_pool * p).floor().max(0.0) as u64;
    let cap = (pool as f64 * daily_cap).ceil() as u64;
    cases.min(pool.min(cap))
}

/// Chance that a directed traversal from `origin` seeds its destination today
pub fn crossing_chance(edge_probability: f64, origin: &Compartments, damping: f64) -> f64 {
    if origin.total == 0 || origin.infected == 0 {
        return 0.0;
    }
    edge_probability * origin.infected_share() * damping
}

/// Number of people infected in a destination when a crossing succeeds.
///
/// First infections are capped by the susceptible pool; reinfection seeds
/// are halved and limited to `reinfection_share` of the recovered pool.
pub fn crossing_seed(destination: &Compartments, is_reinfection: bool, reinfection_share: f64) -> u64 {
    let base = ((destination.total as f64).sqrt() / 1000.0).floor().max(1.0) as u64;
    if is_reinfection {
        let limit = (destination.recovered as f64 * reinfection_share).floor() as u64;
        (base / 2).max(1).min(limit)
    } else {
        base.min(destination.susceptible)
    }
}
