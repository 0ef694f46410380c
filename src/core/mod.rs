pub mod config;
pub mod error;
pub mod types;

pub use config::SimulationConfig;
pub use error::{EngineError, Result};
pub use types::{Coordinates, Day, RegionId, TransportMode};
