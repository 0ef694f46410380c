//! Contagion - Interactive Console
//!
//! Loads a scenario, then reads commands from stdin to step the outbreak,
//! apply measures, edit routes, and query analysis views. Timed runs go
//! through the tokio interval runner at the configured speed.
//!
//! Usage: `contagion [config.toml]`

use contagion::core::config::SimulationConfig;
use contagion::core::error::{EngineError, Result};
use contagion::core::types::{RegionId, TransportMode};
use contagion::disease::DiseaseParams;
use contagion::simulation::{run_days, SimulationEngine, SimulationEvent};
use contagion::world::Measure;

use std::io::{self, Write};
use std::path::Path;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("contagion=info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimulationConfig::from_toml_file(Path::new(&path))?,
        None => SimulationConfig::default(),
    };

    let rt = Runtime::new()?;
    let mut engine = SimulationEngine::new(config)?;

    println!("\n=== CONTAGION ===");
    println!("Epidemic spread across a network of regions");
    println!();
    print_help();

    loop {
        print!("[day {}] > ", engine.day());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let words: Vec<&str> = input.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            continue;
        };

        if command == "quit" || command == "q" {
            break;
        }

        if let Err(e) = handle(&mut engine, &rt, command, args) {
            println!("Error: {}", e);
        }
    }

    tracing::info!(day = engine.day(), "console closed");
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  step / s                    - Advance one day");
    println!("  run <n>                     - Run n days on the timer");
    println!("  back                        - Step back one day");
    println!("  speed <n>                   - Timer speed in days per second (1-60)");
    println!("  status                      - Global statistics");
    println!("  regions                     - List regions");
    println!("  routes <region>             - Routes touching a region");
    println!("  seed <region> <n>           - Infect n people in a region");
    println!("  origin <region>             - Set the disease origin (applies on reset)");
    println!("  disease <c%> <m%> <days>    - Contagion, mortality and recovery time");
    println!("  measure <region> <measure>  - quarantine, closed_borders, distancing, masks, vaccination");
    println!("  lift <region> <measure>     - Remove a measure");
    println!("  quarantine <region>         - Toggle quarantine");
    println!("  connect <a> <b> <mode>      - Open a route (AIR, LAND, SEA)");
    println!("  disconnect <a> <b>          - Delete a route");
    println!("  sever <a> <b> / restore <a> <b>");
    println!("  predict / risk / critical / forecast [days] / variants");
    println!("  scenarios / reset <scenario> / load <file.toml>");
    println!("  help / quit");
    println!("Region names may use '_' for spaces, or be given as numeric ids.");
    println!();
}

fn handle(engine: &mut SimulationEngine, rt: &Runtime, command: &str, args: &[&str]) -> Result<()> {
    match (command, args) {
        ("help" | "h", _) => print_help(),
        ("step" | "s", _) => {
            engine.set_running(true);
            let report = engine.step()?;
            engine.set_running(false);
            if let Some(report) = report {
                print_events(engine, &report.events);
                println!(
                    "Day {}: +{} infected, +{} reinfected, {} imported",
                    report.day, report.new_infections, report.new_reinfections, report.imported
                );
            }
        }
        ("run", [n]) => {
            let Ok(days) = n.parse::<u32>() else {
                println!("Usage: run <number>");
                return Ok(());
            };
            engine.set_running(true);
            let reports = rt.block_on(run_days(engine, days))?;
            engine.set_running(false);
            for report in &reports {
                print_events(engine, &report.events);
            }
            println!("Ran {} days. Now at day {}.", reports.len(), engine.day());
        }
        ("back", _) => {
            if engine.step_back()? {
                println!("Back at day {}.", engine.day());
            } else {
                println!("Already at the start of the run.");
            }
        }
        ("speed", [n]) => match n.parse::<u32>() {
            Ok(speed) => println!("Speed set to {} days/s.", engine.set_speed(speed)),
            Err(_) => println!("Usage: speed <number>"),
        },
        ("status", _) => print_status(engine),
        ("regions", _) => {
            for region in engine.regions() {
                let c = region.compartments();
                println!(
                    "  [{}] {:<20} {:>9} {:>13} infected {:>11} recovered {:>9} dead{}",
                    region.id,
                    region.name,
                    format!("{:?}", region.state()),
                    c.infected,
                    c.recovered,
                    c.deceased,
                    if region.is_quarantined() { "  QUARANTINED" } else { "" }
                );
            }
        }
        ("routes", [name]) => {
            let id = resolve(engine, name)?;
            for route in engine.connected_routes(id)? {
                let peer = engine.region(route.peer).map(|r| r.name.as_str()).unwrap_or("?");
                println!(
                    "  {} {:<20} {:<4} traffic {:.2} {:>7.0} km{}",
                    route.key,
                    peer,
                    route.mode,
                    route.traffic,
                    route.distance_km,
                    if route.severed { "  SEVERED" } else { "" }
                );
            }
        }
        ("seed", [name, n]) => {
            let id = resolve(engine, name)?;
            let amount = n.parse::<u64>().unwrap_or(0);
            println!("{} people infected.", engine.seed_infection(id, amount)?);
        }
        ("origin", [name]) => {
            let id = resolve(engine, name)?;
            let params = DiseaseParams {
                origin: Some(id),
                ..engine.disease().params().clone()
            };
            engine.configure_disease(params)?;
            println!("Origin set. Reset the scenario to seed it.");
        }
        ("disease", [contagion_pct, mortality_pct, days]) => {
            let params = DiseaseParams {
                contagion_percent: contagion_pct.parse().unwrap_or(engine.disease().params().contagion_percent),
                mortality_percent: mortality_pct.parse().unwrap_or(engine.disease().params().mortality_percent),
                recovery_days: days.parse().unwrap_or(engine.disease().recovery_days()),
                ..engine.disease().params().clone()
            };
            engine.configure_disease(params)?;
            println!(
                "Contagion {:.0}%, mortality {:.1}%, recovery {} days.",
                engine.disease().contagion_rate() * 100.0,
                engine.disease().mortality_rate() * 100.0,
                engine.disease().recovery_days()
            );
        }
        ("measure", [name, measure]) => {
            let id = resolve(engine, name)?;
            let measure: Measure = measure.parse()?;
            if !engine.apply_measure(id, measure)? {
                println!("{} already in force.", measure);
            }
        }
        ("lift", [name, measure]) => {
            let id = resolve(engine, name)?;
            let measure: Measure = measure.parse()?;
            if !engine.remove_measure(id, measure)? {
                println!("{} was not in force.", measure);
            }
        }
        ("quarantine", [name]) => {
            let id = resolve(engine, name)?;
            let active = engine.toggle_quarantine(id)?;
            println!("Quarantine {}.", if active { "imposed" } else { "lifted" });
        }
        ("connect", [a, b, mode]) => {
            let (a, b) = (resolve(engine, a)?, resolve(engine, b)?);
            let mode: TransportMode = mode.parse()?;
            println!("Route {} opened.", engine.open_route(a, b, mode)?);
        }
        ("disconnect", [a, b]) => {
            let (a, b) = (resolve(engine, a)?, resolve(engine, b)?);
            if !engine.remove_route(a, b)? {
                println!("No such route.");
            }
        }
        ("sever", [a, b]) => {
            let (a, b) = (resolve(engine, a)?, resolve(engine, b)?);
            if !engine.sever_route(a, b)? {
                println!("Route already severed.");
            }
        }
        ("restore", [a, b]) => {
            let (a, b) = (resolve(engine, a)?, resolve(engine, b)?);
            if !engine.restore_route(a, b)? {
                println!("Route was not severed.");
            }
        }
        ("predict", _) => {
            let p = engine.predict_next_day();
            println!(
                "Day {}: risk {:?}, growth {:.2}%, ~{} infected",
                p.day,
                p.risk,
                p.propagation_rate * 100.0,
                p.projected_infected
            );
            for id in p.hotspots {
                println!("  hotspot: {}", region_name(engine, id));
            }
        }
        ("risk", _) => {
            let at_risk = engine.regions_at_risk();
            if at_risk.is_empty() {
                println!("No infection-free region is at high risk.");
            }
            for r in at_risk.iter().take(5) {
                println!("  {:<20} risk {:.1}%", r.name, r.risk * 100.0);
            }
        }
        ("critical", _) => {
            for (rank, route) in engine.critical_routes(5).iter().enumerate() {
                println!("  {}. {} importance {:.1}%", rank + 1, route.description, route.importance * 100.0);
            }
        }
        ("forecast", rest) => {
            let days = rest.first().and_then(|d| d.parse().ok()).unwrap_or(30);
            let forecast = engine.forecast(days)?;
            println!(
                "Day {}: {} infected, {} dead, {} regions affected",
                forecast.from_day + forecast.days,
                forecast.stats.infected,
                forecast.stats.deceased,
                forecast.stats.affected_regions
            );
            for r in &forecast.most_affected {
                println!("  {:<20} {:>12} ({:.1}%)", r.name, r.infected, r.infected_share * 100.0);
            }
        }
        ("variants", _) => {
            if engine.variant_history().is_empty() {
                println!("No variants yet.");
            }
            for v in engine.variant_history() {
                println!(
                    "  day {:>4} {:<12} contagion {:.1}% mortality {:.2}%",
                    v.emergence_day,
                    v.name,
                    v.contagion_rate * 100.0,
                    v.mortality_rate * 100.0
                );
            }
        }
        ("scenarios", _) => {
            for name in engine.catalog().names() {
                println!("  {}", name);
            }
        }
        ("reset", [name]) => {
            engine.reset(name)?;
            println!("Loaded {} with {} regions.", engine.scenario_name(), engine.regions().len());
        }
        ("load", [path]) => {
            let name = engine.load_scenario_file(Path::new(path))?;
            println!("Scenario {} added. Use 'reset {}' to start it.", name, name);
        }
        _ => println!("Unknown command. Type 'help' for the list."),
    }
    Ok(())
}

fn resolve(engine: &SimulationEngine, name: &str) -> Result<RegionId> {
    if let Ok(index) = name.parse::<u32>() {
        let id = RegionId(index);
        return engine
            .region(id)
            .map(|r| r.id)
            .ok_or(EngineError::UnknownRegion(id));
    }
    engine
        .region_by_name(&name.replace('_', " "))
        .map(|r| r.id)
        .ok_or_else(|| EngineError::InvalidConfig(format!("no region named {}", name)))
}

fn region_name(engine: &SimulationEngine, id: RegionId) -> &str {
    engine.region(id).map(|r| r.name.as_str()).unwrap_or("?")
}

fn print_events(engine: &SimulationEngine, events: &[SimulationEvent]) {
    for event in events {
        match event {
            SimulationEvent::VariantEmerged { name, day, .. } => {
                println!("  ! Variant {} emerged on day {}", name, day);
            }
            SimulationEvent::RouteTransmission { from, to, mode, infected, .. } => {
                println!(
                    "  {} -> {} by {}: {} infected",
                    region_name(engine, *from),
                    region_name(engine, *to),
                    mode,
                    infected
                );
            }
            SimulationEvent::StateChanged { .. } => {}
        }
    }
}

fn print_status(engine: &SimulationEngine) {
    let stats = engine.global_stats();
    println!("\n--- Day {} ({}) ---", stats.day, engine.scenario_name());
    println!("Population:  {}", stats.population);
    println!("Infected:    {}", stats.infected);
    println!("Recovered:   {}", stats.recovered);
    println!("Deceased:    {}", stats.deceased);
    println!("Reinfected:  {}", stats.reinfected);
    println!("Affected regions: {} / {}", stats.affected_regions, engine.regions().len());
    println!("Quarantined: {}", stats.quarantined_regions);
    println!("Propagation rate: {:.2}%", stats.propagation_rate * 100.0);
    if let Some(variant) = engine.disease().current_variant() {
        println!("Current variant: {}", variant.name);
    }
    println!();
}
