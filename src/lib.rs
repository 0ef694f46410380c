//! Contagion - epidemic spread over a network of regions and transport routes

pub mod core;
pub mod disease;
pub mod network;
pub mod simulation;
pub mod world;
