//! Headless Outbreak Runner
//!
//! Runs a scenario for a fixed number of days and prints the outcome as
//! JSON, for batch experiments and parameter sweeps.

use clap::Parser;
use contagion::core::config::SimulationConfig;
use contagion::core::error::{EngineError, Result};
use contagion::core::types::RegionId;
use contagion::disease::{DiseaseParams, Variant};
use contagion::simulation::{CriticalRoute, GlobalStats, SimulationEngine};
use contagion::world::ScenarioCatalog;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Headless Outbreak Runner - run a scenario and report the outcome
#[derive(Parser, Debug)]
#[command(name = "outbreak_runner")]
#[command(about = "Run an outbreak scenario for N days and output the result as JSON")]
struct Args {
    /// Built-in scenario name, or the name of the scenario in --scenario-file
    #[arg(long, default_value = "global")]
    scenario: String,

    /// Load an extra scenario from a TOML file
    #[arg(long)]
    scenario_file: Option<PathBuf>,

    /// Engine configuration TOML file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of days to simulate
    #[arg(long, default_value_t = 120)]
    days: u32,

    /// Random seed for deterministic runs (overrides the config seed)
    #[arg(long)]
    seed: Option<u64>,

    /// Region where the outbreak starts
    #[arg(long, default_value = "China")]
    origin: String,

    /// Contagion rate in percent
    #[arg(long, default_value_t = 30.0)]
    contagion: f64,

    /// Mortality rate in percent
    #[arg(long, default_value_t = 2.0)]
    mortality: f64,

    /// Days from infection to recovery or death
    #[arg(long, default_value_t = 14)]
    recovery_days: u32,

    /// Disable transmission inside regions
    #[arg(long)]
    no_internal: bool,

    /// Disable transmission along routes
    #[arg(long)]
    no_cross_region: bool,

    /// Disable reinfection of recovered people
    #[arg(long)]
    no_reinfection: bool,

    /// Include per-day totals in the output
    #[arg(long)]
    daily: bool,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,
}

#[derive(Serialize)]
struct DaySummary {
    day: u32,
    infected: u64,
    deceased: u64,
    affected_regions: usize,
}

#[derive(Serialize)]
struct RegionOutcome {
    name: String,
    infected: u64,
    recovered: u64,
    deceased: u64,
    state: String,
}

/// JSON output structure
#[derive(Serialize)]
struct RunResult {
    scenario: String,
    seed: u64,
    days: u32,
    stats: GlobalStats,
    variants: Vec<Variant>,
    regions: Vec<RegionOutcome>,
    critical_routes: Vec<CriticalRoute>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    daily: Vec<DaySummary>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("contagion=warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_toml_file(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.internal_propagation = !args.no_internal;
    config.cross_region_propagation = !args.no_cross_region;
    config.reinfection_enabled = !args.no_reinfection;

    let mut catalog = ScenarioCatalog::builtin();
    if let Some(path) = &args.scenario_file {
        catalog.load_toml_file(path)?;
    }
    let scenario = catalog.get(&args.scenario)?.clone();

    let origin = scenario
        .regions
        .iter()
        .position(|r| r.name.eq_ignore_ascii_case(&args.origin))
        .ok_or_else(|| EngineError::InvalidConfig(format!("origin {} is not in scenario {}", args.origin, scenario.name)))?;

    let params = DiseaseParams {
        contagion_percent: args.contagion,
        mortality_percent: args.mortality,
        recovery_days: args.recovery_days,
        origin: Some(RegionId(origin as u32)),
        ..DiseaseParams::default()
    };

    let seed = config.seed;
    let mut engine = SimulationEngine::with_scenario(config, scenario, params)?;
    engine.set_running(true);

    let mut daily = Vec::new();
    for _ in 0..args.days {
        engine.step()?;
        if args.daily {
            let stats = engine.global_stats();
            daily.push(DaySummary {
                day: stats.day,
                infected: stats.infected,
                deceased: stats.deceased,
                affected_regions: stats.affected_regions,
            });
        }
    }

    let result = RunResult {
        scenario: engine.scenario_name().to_string(),
        seed,
        days: engine.day(),
        stats: engine.global_stats(),
        variants: engine.variant_history().to_vec(),
        regions: engine
            .regions()
            .iter()
            .map(|r| RegionOutcome {
                name: r.name.clone(),
                infected: r.compartments().infected,
                recovered: r.compartments().recovered,
                deceased: r.compartments().deceased,
                state: format!("{:?}", r.state()).to_uppercase(),
            })
            .collect(),
        critical_routes: engine.critical_routes(5),
        daily,
    };

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Scenario: {} (seed {})", result.scenario, result.seed);
        println!("Day {}", result.days);
        println!("Infected: {}", result.stats.infected);
        println!("Recovered: {}", result.stats.recovered);
        println!("Deceased: {}", result.stats.deceased);
        println!("Affected regions: {}", result.stats.affected_regions);
        for v in &result.variants {
            println!("Variant {} (day {})", v.name, v.emergence_day);
        }
        for r in &result.regions {
            println!("  {:<20} {:>10} {:>12} infected {:>10} dead", r.name, r.state, r.infected, r.deceased);
        }
    }

    Ok(())
}
