//! Standalone transit simulation module
//!
//! This module contains all the core transit simulation logic. Worlds can
//! be stepped and inspected from the console or from tests without any UI.

mod bus;
mod city;
mod config;
mod passenger;
mod router;
mod types;
mod world;

// Re-export public types for external use
// These may not be used within this crate but are part of the public API
#[allow(unused_imports)]
pub use bus::SimBus;
#[allow(unused_imports)]
pub use city::{BlockedRoute, City};
#[allow(unused_imports)]
pub use config::{
    SimConfig, BLOCK_DURATION_RANGE, DISRUPTION_CAP_RANGE, DISRUPTION_INTERVAL,
    DISRUPTION_SPAN_RANGE, FULL_REPAIR_RANGE, MAX_WAITING_TICKS, SPAWN_PROBABILITY,
};
#[allow(unused_imports)]
pub use passenger::SimPassenger;
#[allow(unused_imports)]
pub use router::find_path;
#[allow(unused_imports)]
pub use types::{BusId, GridPos, PassengerId};
#[allow(unused_imports)]
pub use world::{BusSnapshot, PassengerSnapshot, SimMetrics, SimWorld, WorldSnapshot};
