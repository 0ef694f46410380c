use thiserror::Error;

use crate::core::types::RegionId;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Region not found: {0}")]
    UnknownRegion(RegionId),

    #[error("Route not found: {0}-{1}")]
    UnknownRoute(RegionId, RegionId),

    #[error("Route already exists: {0}-{1}")]
    DuplicateRoute(RegionId, RegionId),

    #[error("Self-loop route rejected for region {0}")]
    SelfLoop(RegionId),

    #[error("Unknown measure: {0}")]
    UnknownMeasure(String),

    #[error("Unknown transport mode: {0}")]
    UnknownTransportMode(String),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("Scenario has no regions: {0}")]
    EmptyScenario(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
