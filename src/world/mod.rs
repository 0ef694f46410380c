//! Regions, their population state, and the world that holds them

pub mod cohort;
pub mod compartments;
pub mod history;
pub mod map;
pub mod measures;
pub mod region;
pub mod scenario;

pub use cohort::{ActiveCohort, ResolvedCohort};
pub use compartments::{CompartmentDelta, Compartments};
pub use history::{HistoryEntry, RegionHistory};
pub use map::World;
pub use measures::Measure;
pub use region::{InfectiousState, Region, RegionSnapshot};
pub use scenario::{Scenario, ScenarioCatalog, ScenarioRegion, ScenarioRoute};
