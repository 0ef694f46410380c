//! Route network
//!
//! Bidirectional transport routes between regions, their transmission
//! probability model, and severance bookkeeping.

pub mod route;
pub mod topology;

pub use route::{Route, RouteAction, RouteEvent, RouteKey};
pub use topology::{default_traffic, AdjacencyMatrix, ConnectedRoute, RouteEnd, RouteNetwork};
