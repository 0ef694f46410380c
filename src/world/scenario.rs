//! Scenario catalog - the static region sets a world can be built from
//!
//! Built-in scenarios ship with the crate; more can be loaded from TOML:
//!
//! ```toml
//! name = "islands"
//!
//! [[regions]]
//! name = "North"
//! population_millions = 1.5
//! latitude = 10.0
//! longitude = 20.0
//!
//! [[routes]]
//! from = "North"
//! to = "South"
//! mode = "SEA"
//! traffic = 0.4
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{EngineError, Result};
use crate::core::types::TransportMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRegion {
    pub name: String,
    pub population_millions: f64,
    pub latitude: f64,
    pub longitude: f64,
}

/// An explicit route between two regions, named by region name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRoute {
    pub from: String,
    pub to: String,
    pub mode: TransportMode,
    /// Defaults to the mode's typical traffic when omitted
    pub traffic: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub regions: Vec<ScenarioRegion>,
    /// When empty, a random network is generated at world construction
    #[serde(default)]
    pub routes: Vec<ScenarioRoute>,
}

impl Scenario {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Ten countries spread over four continents
    pub fn global() -> Self {
        build(
            "global",
            &[
                ("Mexico", 128.9, 23.6345, -102.5528),
                ("Colombia", 51.52, 4.5709, -74.2973),
                ("Argentina", 45.81, -38.4161, -63.6167),
                ("Brazil", 213.99, -14.2350, -51.9253),
                ("Chile", 19.12, -35.6751, -71.5429),
                ("Peru", 33.72, -9.1900, -75.0152),
                ("United States", 331.9, 37.0902, -95.7129),
                ("Spain", 47.35, 40.4637, -3.7492),
                ("China", 1444.22, 35.8617, 104.1954),
                ("India", 1380.0, 20.5937, 78.9629),
            ],
        )
    }

    /// South American countries
    pub fn south_america() -> Self {
        build(
            "south_america",
            &[
                ("Colombia", 51.52, 4.5709, -74.2973),
                ("Venezuela", 28.2, 6.4238, -66.5897),
                ("Ecuador", 17.8, -1.8312, -78.1834),
                ("Peru", 33.72, -9.1900, -75.0152),
                ("Brazil", 213.99, -14.2350, -51.9253),
                ("Bolivia", 11.8, -16.2902, -63.5887),
                ("Paraguay", 7.2, -23.4425, -58.4438),
                ("Chile", 19.12, -35.6751, -71.5429),
                ("Argentina", 45.81, -38.4161, -63.6167),
                ("Uruguay", 3.5, -32.5228, -55.7658),
            ],
        )
    }

    /// Autonomous communities of Spain
    pub fn spain() -> Self {
        build(
            "spain",
            &[
                ("Andalucia", 8.5, 37.5443, -4.7278),
                ("Catalonia", 7.8, 41.5912, 1.5209),
                ("Madrid", 6.8, 40.4168, -3.7038),
                ("Valencia", 5.1, 39.4840, -0.7533),
                ("Galicia", 2.7, 42.5751, -8.1339),
                ("Castilla y Leon", 2.4, 41.8357, -4.3976),
                ("Basque Country", 2.2, 42.9896, -2.6189),
                ("Canary Islands", 2.2, 28.2916, -16.6291),
                ("Castilla-La Mancha", 2.1, 39.2796, -3.0977),
                ("Murcia", 1.5, 37.9922, -1.1307),
                ("Aragon", 1.3, 41.5976, -0.9057),
                ("Balearic Islands", 1.2, 39.6953, 3.0176),
                ("Extremadura", 1.06, 39.4937, -6.0679),
                ("Asturias", 1.0, 43.3614, -5.8593),
                ("Navarre", 0.66, 42.6954, -1.6761),
                ("Cantabria", 0.58, 43.1828, -3.9878),
                ("La Rioja", 0.32, 42.2871, -2.5396),
            ],
        )
    }
}

fn build(name: &str, rows: &[(&str, f64, f64, f64)]) -> Scenario {
    Scenario {
        name: name.to_string(),
        regions: rows
            .iter()
            .map(|&(name, population_millions, latitude, longitude)| ScenarioRegion {
                name: name.to_string(),
                population_millions,
                latitude,
                longitude,
            })
            .collect(),
        routes: Vec::new(),
    }
}

/// Named collection of scenarios
#[derive(Debug, Clone)]
pub struct ScenarioCatalog {
    scenarios: Vec<Scenario>,
}

impl Default for ScenarioCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ScenarioCatalog {
    pub fn builtin() -> Self {
        Self {
            scenarios: vec![Scenario::global(), Scenario::south_america(), Scenario::spain()],
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scenarios.iter().map(|s| s.name.as_str())
    }

    /// Case-insensitive lookup
    pub fn get(&self, name: &str) -> Result<&Scenario> {
        self.scenarios
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| EngineError::UnknownScenario(name.to_string()))
    }

    /// Add or replace a scenario by name
    pub fn insert(&mut self, scenario: Scenario) {
        self.scenarios
            .retain(|s| !s.name.eq_ignore_ascii_case(&scenario.name));
        self.scenarios.push(scenario);
    }

    pub fn load_toml_file(&mut self, path: &Path) -> Result<&Scenario> {
        let scenario = Scenario::from_toml_file(path)?;
        let name = scenario.name.clone();
        self.insert(scenario);
        self.get(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = ScenarioCatalog::builtin();
        let names: Vec<&str> = catalog.names().collect();
        assert_eq!(names, vec!["global", "south_america", "spain"]);
        assert_eq!(catalog.get("GLOBAL").unwrap().regions.len(), 10);
        assert!(matches!(
            catalog.get("atlantis"),
            Err(EngineError::UnknownScenario(_))
        ));
    }

    #[test]
    fn test_parse_toml_scenario() {
        let scenario = Scenario::from_toml_str(
            r#"
            name = "islands"

            [[regions]]
            name = "North"
            population_millions = 1.5
            latitude = 10.0
            longitude = 20.0

            [[regions]]
            name = "South"
            population_millions = 0.5
            latitude = 9.0
            longitude = 20.5

            [[routes]]
            from = "North"
            to = "South"
            mode = "SEA"
            "#,
        )
        .unwrap();

        assert_eq!(scenario.regions.len(), 2);
        assert_eq!(scenario.routes[0].mode, TransportMode::Sea);
        assert_eq!(scenario.routes[0].traffic, None);
    }

    #[test]
    fn test_insert_replaces_by_name() {
        let mut catalog = ScenarioCatalog::builtin();
        let mut custom = Scenario::spain();
        custom.regions.truncate(3);
        catalog.insert(custom);
        assert_eq!(catalog.get("spain").unwrap().regions.len(), 3);
        assert_eq!(catalog.names().count(), 3);
    }
}
