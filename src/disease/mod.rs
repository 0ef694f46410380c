//! Disease model
//!
//! Pathogen parameters, variant evolution, the per-contact probability
//! formulas, and the probabilistic transmission graph derived from world
//! state each day.

pub mod graph;
pub mod pathogen;
pub mod variant;

pub use graph::{EdgeKind, GraphEdge, GraphNode, ProbabilisticGraph};
pub use pathogen::{Disease, DiseaseParams};
pub use variant::{Variant, VariantProfile};
