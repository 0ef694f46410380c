//! Simulation engine and the views derived from it

pub mod analysis;
pub mod engine;
pub mod runner;
pub mod snapshot;
pub mod transmission;

pub use analysis::{AffectedRegion, CriticalRoute, Forecast, GlobalStats, Prediction, RegionRisk, RiskLevel};
pub use engine::{PropagationFlags, RunState, SimulationEngine, SimulationEvent, StepReport};
pub use runner::run_days;
pub use snapshot::{EngineSnapshot, SnapshotBuffer};
