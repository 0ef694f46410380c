//! Simulation engine - orchestrates one simulated day at a time
//!
//! Each `step()` runs, in order:
//! disease evolution -> transmission graph rebuild -> cohort maturation ->
//! internal transmission -> cross-region transmission -> snapshot
//!
//! The engine is the single owner of the world and the disease. Every
//! command validates before it mutates, so a failed command leaves the
//! simulation untouched.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::core::config::{SimulationConfig, MAX_SPEED, MIN_SPEED};
use crate::core::error::{EngineError, Result};
use crate::core::types::{Day, RegionId, TransportMode};
use crate::disease::{Disease, DiseaseParams, EdgeKind, ProbabilisticGraph, Variant};
use crate::network::{default_traffic, AdjacencyMatrix, ConnectedRoute, Route, RouteKey};
use crate::simulation::snapshot::{EngineSnapshot, SnapshotBuffer};
use crate::simulation::transmission;
use crate::world::{InfectiousState, Measure, Region, Scenario, ScenarioCatalog, World};

/// Share of the origin population infected when a run starts
pub const ORIGIN_SEED_SHARE: f64 = 0.0001;

/// Minimum number of people infected in the origin when a run starts
pub const ORIGIN_SEED_MIN: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunState {
    Paused,
    Running,
}

/// Which propagation phases run during a step.
///
/// `reinfection` is independent of the other two: it enables reinfection
/// inside regions and reinfection edges across routes even when first
/// infections are switched off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationFlags {
    pub internal: bool,
    pub cross_region: bool,
    pub reinfection: bool,
}

impl PropagationFlags {
    pub fn all() -> Self {
        Self {
            internal: true,
            cross_region: true,
            reinfection: true,
        }
    }

    pub fn none() -> Self {
        Self {
            internal: false,
            cross_region: false,
            reinfection: false,
        }
    }
}

/// Something noteworthy that happened during a step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SimulationEvent {
    VariantEmerged {
        name: String,
        day: Day,
        contagion_rate: f64,
        mortality_rate: f64,
    },
    /// Infection carried along a route into a region
    RouteTransmission {
        from: RegionId,
        to: RegionId,
        mode: TransportMode,
        infected: u64,
        reinfection: bool,
    },
    StateChanged {
        region: RegionId,
        from: InfectiousState,
        to: InfectiousState,
    },
}

/// Summary of one executed step
#[derive(Debug, Clone, Default, Serialize)]
pub struct StepReport {
    pub day: Day,
    /// First infections inside regions
    pub new_infections: u64,
    /// Reinfections inside regions
    pub new_reinfections: u64,
    /// Infections seeded across routes, first and repeat
    pub imported: u64,
    pub events: Vec<SimulationEvent>,
}

#[derive(Debug, Clone)]
pub struct SimulationEngine<R: Rng + Clone = ChaCha8Rng> {
    config: SimulationConfig,
    catalog: ScenarioCatalog,
    scenario: Scenario,
    world: World,
    disease: Disease,
    rng: R,
    day: Day,
    state: RunState,
    speed: u32,
    propagation: PropagationFlags,
    snapshots: SnapshotBuffer,
    /// State right after the last reset, the floor for step-back
    baseline: EngineSnapshot,
    graph: ProbabilisticGraph,
}

impl SimulationEngine<ChaCha8Rng> {
    /// Engine on the `global` scenario, seeded from the config
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let scenario = ScenarioCatalog::builtin().get("global")?.clone();
        Self::with_scenario(config, scenario, DiseaseParams::default())
    }

    pub fn with_scenario(config: SimulationConfig, scenario: Scenario, params: DiseaseParams) -> Result<Self> {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::with_rng(config, scenario, params, rng)
    }
}

impl<R: Rng + Clone> SimulationEngine<R> {
    /// Build an engine with an explicit random source
    pub fn with_rng(config: SimulationConfig, scenario: Scenario, params: DiseaseParams, mut rng: R) -> Result<Self> {
        config.validate()?;
        let world = World::from_scenario(&scenario, config.route_density, &mut rng)?;
        let disease = Disease::with_evolution(params, config.evolution.clone(), config.variant_profiles.clone());
        let propagation = PropagationFlags {
            internal: config.internal_propagation,
            cross_region: config.cross_region_propagation,
            reinfection: config.reinfection_enabled,
        };
        let baseline = EngineSnapshot {
            day: 0,
            regions: Vec::new(),
            disease: disease.clone(),
            network: world.network().clone(),
        };

        let mut engine = Self {
            catalog: ScenarioCatalog::builtin(),
            snapshots: SnapshotBuffer::new(config.snapshot_capacity),
            speed: config.default_speed,
            scenario,
            world,
            disease,
            rng,
            day: 0,
            state: RunState::Paused,
            propagation,
            baseline,
            graph: ProbabilisticGraph::default(),
            config,
        };
        engine.start_fresh();
        Ok(engine)
    }

    // === QUERIES ===

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }

    pub fn scenario_name(&self) -> &str {
        &self.scenario.name
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn disease(&self) -> &Disease {
        &self.disease
    }

    pub fn regions(&self) -> &[Region] {
        self.world.regions()
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.world.region(id)
    }

    pub fn region_by_name(&self, name: &str) -> Option<&Region> {
        self.world.region_by_name(name)
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.world.network().routes()
    }

    pub fn route(&self, a: RegionId, b: RegionId) -> Option<&Route> {
        self.world.network().get(a, b)
    }

    pub fn adjacency(&self) -> &AdjacencyMatrix {
        self.world.network().adjacency()
    }

    /// Every route touching a region, open or severed
    pub fn connected_routes(&self, id: RegionId) -> Result<Vec<ConnectedRoute>> {
        self.require_region(id)?;
        Ok(self.world.network().routes_for_region(id))
    }

    pub fn day(&self) -> Day {
        self.day
    }

    pub fn run_state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    /// Timer period for the current speed
    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.speed.max(MIN_SPEED)))
    }

    pub fn propagation(&self) -> PropagationFlags {
        self.propagation
    }

    pub fn variant_history(&self) -> &[Variant] {
        self.disease.variants()
    }

    pub fn snapshots(&self) -> &SnapshotBuffer {
        &self.snapshots
    }

    /// Transmission graph used by the latest step
    pub fn graph(&self) -> &ProbabilisticGraph {
        &self.graph
    }

    // === RUN CONTROL ===

    pub fn set_running(&mut self, running: bool) {
        let next = if running { RunState::Running } else { RunState::Paused };
        if self.state != next {
            self.state = next;
            tracing::info!(day = self.day, state = ?next, "run state changed");
        }
    }

    /// Set the timer speed in steps per second, clamped to the allowed range.
    /// Returns the speed actually applied.
    pub fn set_speed(&mut self, speed: u32) -> u32 {
        self.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        self.speed
    }

    pub fn set_propagation(&mut self, flags: PropagationFlags) {
        self.propagation = flags;
    }

    /// Advance the simulation by one day. Does nothing while paused.
    pub fn step(&mut self) -> Result<Option<StepReport>> {
        if !self.is_running() {
            return Ok(None);
        }

        let emerged = self.disease.evolve(1, &mut self.rng);
        self.day += 1;
        let day = self.day;

        let mut report = StepReport {
            day,
            ..Default::default()
        };
        report.events.extend(emerged.into_iter().map(|v| SimulationEvent::VariantEmerged {
            name: v.name,
            day: v.emergence_day,
            contagion_rate: v.contagion_rate,
            mortality_rate: v.mortality_rate,
        }));

        let states_before: Vec<InfectiousState> = self.world.regions().iter().map(|r| r.state()).collect();
        self.graph = self.disease.build_probabilistic_graph(&self.world, day);

        for region in self.world.regions_mut() {
            region.process_cohorts(day, &self.disease);
        }

        if self.propagation.internal || self.propagation.reinfection {
            self.spread_within_regions(&mut report);
        }
        if self.propagation.cross_region {
            self.spread_across_routes(&mut report);
        }

        for (region, before) in self.world.regions().iter().zip(states_before) {
            if region.state() != before {
                report.events.push(SimulationEvent::StateChanged {
                    region: region.id,
                    from: before,
                    to: region.state(),
                });
            }
        }

        let snapshot = self.capture();
        self.snapshots.push(snapshot);

        tracing::debug!(
            day,
            new_infections = report.new_infections,
            new_reinfections = report.new_reinfections,
            imported = report.imported,
            edges = self.graph.edges.len(),
            "step complete"
        );
        Ok(Some(report))
    }

    fn spread_within_regions(&mut self, report: &mut StepReport) {
        let day = self.day;
        let p_first = self.disease.infection_probability(1, false);
        let p_repeat = self.disease.infection_probability(2, true);
        let config = &self.config;

        for region in self.world.regions_mut() {
            let factor = region.transmission_factor();
            if self.propagation.internal {
                let cases = transmission::internal_infections(
                    region.compartments(),
                    factor,
                    config.contact_rate,
                    p_first,
                    config.daily_infection_cap,
                );
                report.new_infections += region.add_infection(cases, day, false);
            }

            if self.propagation.reinfection && !region.is_quarantined() && region.compartments().recovered > 0 {
                let repeats = transmission::internal_reinfections(
                    region.compartments(),
                    factor,
                    config.reinfection_contact_rate,
                    p_repeat,
                    config.daily_reinfection_cap,
                );
                report.new_reinfections += region.add_infection(repeats, day, true);
            }
        }
    }

    fn spread_across_routes(&mut self, report: &mut StepReport) {
        let day = self.day;
        let damping = self.config.cross_region_damping;
        let share = self.config.reinfection_seed_share;

        for edge in &self.graph.edges {
            let is_reinfection = edge.kind == EdgeKind::Reinfection;
            if is_reinfection && !self.propagation.reinfection {
                continue;
            }

            for (from, to, probability) in edge.directions() {
                if probability <= 0.0 {
                    continue;
                }
                let (Some(origin), Some(destination)) = (self.world.region(from), self.world.region(to)) else {
                    continue;
                };
                if origin.compartments().infected == 0 || destination.is_quarantined() {
                    continue;
                }

                let chance = transmission::crossing_chance(probability, origin.compartments(), damping);
                if self.rng.gen::<f64>() >= chance {
                    continue;
                }
                let seed = transmission::crossing_seed(destination.compartments(), is_reinfection, share);

                let Some(destination) = self.world.region_mut(to) else {
                    continue;
                };
                let infected = destination.add_infection(seed, day, is_reinfection);
                if infected == 0 {
                    continue;
                }

                tracing::trace!(
                    %from,
                    %to,
                    mode = %edge.mode,
                    infected,
                    reinfection = is_reinfection,
                    "infection crossed route"
                );
                report.imported += infected;
                report.events.push(SimulationEvent::RouteTransmission {
                    from,
                    to,
                    mode: edge.mode,
                    infected,
                    reinfection: is_reinfection,
                });
            }
        }
    }

    /// Return to the state at the end of the previous day. Returns false when
    /// already at the start of the run, or when the previous day has been
    /// evicted from the snapshot buffer; the engine is left as it was.
    pub fn step_back(&mut self) -> Result<bool> {
        let Some(current) = self.snapshots.pop() else {
            return Ok(false);
        };
        let target = match self.snapshots.latest().cloned() {
            Some(snapshot) => snapshot,
            None if current.day <= self.baseline.day + 1 => self.baseline.clone(),
            None => {
                self.snapshots.push(current);
                tracing::debug!(day = self.day, "no earlier snapshot retained");
                return Ok(false);
            }
        };
        self.restore(&target);
        tracing::info!(day = self.day, "stepped back");
        Ok(true)
    }

    // === REGION COMMANDS ===

    /// Infect `amount` people in a region directly. Returns how many were
    /// infected.
    pub fn seed_infection(&mut self, id: RegionId, amount: u64) -> Result<u64> {
        let day = self.day;
        let region = self.world.region_mut(id).ok_or(EngineError::UnknownRegion(id))?;
        let infected = region.add_infection(amount, day, false);
        tracing::debug!(region = %region.name, requested = amount, infected, "infection seeded");
        Ok(infected)
    }

    /// Put a measure in force. Returns whether anything changed.
    pub fn apply_measure(&mut self, id: RegionId, measure: Measure) -> Result<bool> {
        if measure == Measure::Quarantine {
            return self.set_quarantine(id, true);
        }
        let day = self.day;
        let region = self.world.region_mut(id).ok_or(EngineError::UnknownRegion(id))?;
        let changed = region.apply_measure(measure, day);
        if changed {
            tracing::debug!(region = %region.name, %measure, factor = region.transmission_factor(), "measure applied");
        }
        Ok(changed)
    }

    /// Lift a measure. Returns whether anything changed.
    pub fn remove_measure(&mut self, id: RegionId, measure: Measure) -> Result<bool> {
        if measure == Measure::Quarantine {
            return self.set_quarantine(id, false);
        }
        let day = self.day;
        let region = self.world.region_mut(id).ok_or(EngineError::UnknownRegion(id))?;
        let changed = region.remove_measure(measure, day);
        if changed {
            tracing::debug!(region = %region.name, %measure, factor = region.transmission_factor(), "measure removed");
        }
        Ok(changed)
    }

    /// Flip a region's quarantine. Returns the new quarantine state.
    pub fn toggle_quarantine(&mut self, id: RegionId) -> Result<bool> {
        let active = !self.require_region(id)?.is_quarantined();
        self.set_quarantine(id, active)?;
        Ok(active)
    }

    /// Impose or lift quarantine. Imposing it severs every open route of the
    /// region; lifting it reopens exactly those routes. Returns whether the
    /// quarantine state changed.
    pub fn set_quarantine(&mut self, id: RegionId, active: bool) -> Result<bool> {
        let day = self.day;
        let (regions, network) = self.world.split_mut();
        let region = regions.get_mut(id.index()).ok_or(EngineError::UnknownRegion(id))?;
        if !region.toggle_quarantine(active, day) {
            return Ok(false);
        }

        let routes = if active {
            network.sever_all_for_region(id, day)
        } else {
            network.restore_for_region(id, day)
        };
        tracing::info!(
            region = %region.name,
            quarantined = active,
            routes = routes.len(),
            day,
            "quarantine changed"
        );
        Ok(true)
    }

    // === ROUTE COMMANDS ===

    pub fn add_route(&mut self, a: RegionId, b: RegionId, mode: TransportMode, traffic: f64) -> Result<RouteKey> {
        self.world.add_route(a, b, mode, traffic)
    }

    /// Open a route with the typical traffic of its mode
    pub fn open_route(&mut self, a: RegionId, b: RegionId, mode: TransportMode) -> Result<RouteKey> {
        let traffic = default_traffic(mode, &mut self.rng);
        self.world.add_route(a, b, mode, traffic)
    }

    pub fn remove_route(&mut self, a: RegionId, b: RegionId) -> Result<bool> {
        self.require_region(a)?;
        self.require_region(b)?;
        Ok(self.world.network_mut().remove_route(a, b))
    }

    pub fn sever_route(&mut self, a: RegionId, b: RegionId) -> Result<bool> {
        let day = self.day;
        let changed = self.world.network_mut().sever(a, b, day)?;
        if changed {
            tracing::debug!(%a, %b, day, "route severed");
        }
        Ok(changed)
    }

    pub fn restore_route(&mut self, a: RegionId, b: RegionId) -> Result<bool> {
        let day = self.day;
        let changed = self.world.network_mut().restore(a, b, day)?;
        if changed {
            tracing::debug!(%a, %b, day, "route restored");
        }
        Ok(changed)
    }

    pub fn set_route_active(&mut self, a: RegionId, b: RegionId, active: bool) -> Result<bool> {
        self.world.network_mut().set_active(a, b, active)
    }

    // === DISEASE & SCENARIO COMMANDS ===

    /// Change the disease parameters mid-run
    pub fn configure_disease(&mut self, params: DiseaseParams) -> Result<()> {
        if let Some(origin) = params.origin {
            self.require_region(origin)?;
        }
        self.disease.configure(params);
        Ok(())
    }

    /// Load a scenario from the catalog and start over
    pub fn reset(&mut self, scenario_name: &str) -> Result<()> {
        let scenario = self.catalog.get(scenario_name)?.clone();
        self.reset_with(scenario)
    }

    /// Start over on `scenario`: fresh world, fresh disease from the current
    /// parameters, day zero, paused, origin seeded.
    pub fn reset_with(&mut self, scenario: Scenario) -> Result<()> {
        let world = World::from_scenario(&scenario, self.config.route_density, &mut self.rng)?;
        self.world = world;
        self.scenario = scenario;
        self.start_fresh();
        Ok(())
    }

    /// Add a TOML scenario to the catalog. Returns its name.
    pub fn load_scenario_file(&mut self, path: &Path) -> Result<String> {
        let scenario = self.catalog.load_toml_file(path)?;
        Ok(scenario.name.clone())
    }

    fn start_fresh(&mut self) {
        self.disease.reset();
        self.day = 0;
        self.state = RunState::Paused;
        self.snapshots.clear();

        if let Some(origin) = self.disease.origin() {
            match self.world.region_mut(origin) {
                Some(region) => {
                    let amount = ((region.compartments().total as f64 * ORIGIN_SEED_SHARE) as u64).max(ORIGIN_SEED_MIN);
                    region.add_infection(amount, 0, false);
                }
                None => tracing::warn!(%origin, "disease origin is not part of this scenario"),
            }
        }

        self.graph = self.disease.build_probabilistic_graph(&self.world, 0);
        self.baseline = self.capture();
        tracing::info!(
            scenario = %self.scenario.name,
            regions = self.world.len(),
            routes = self.world.network().len(),
            disease = %self.disease.name(),
            "simulation reset"
        );
    }

    fn capture(&self) -> EngineSnapshot {
        EngineSnapshot {
            day: self.day,
            regions: self.world.regions().iter().map(Region::snapshot).collect(),
            disease: self.disease.clone(),
            network: self.world.network().clone(),
        }
    }

    fn restore(&mut self, snapshot: &EngineSnapshot) {
        self.day = snapshot.day;
        self.disease = snapshot.disease.clone();
        *self.world.network_mut() = snapshot.network.clone();
        for saved in &snapshot.regions {
            if let Some(region) = self.world.region_mut(saved.id) {
                region.restore(saved, snapshot.day);
            }
        }
        self.graph = self.disease.build_probabilistic_graph(&self.world, self.day);
    }

    fn require_region(&self, id: RegionId) -> Result<&Region> {
        self.world.region(id).ok_or(EngineError::UnknownRegion(id))
    }
}
