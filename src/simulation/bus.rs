//! Bus movement along a fixed cyclic route
//!
//! A bus serves its stops in order, one grid cell per tick, recomputing its
//! path every tick so fresh blockages take effect immediately. When no path
//! to the next stop exists it falls back to the previous stop and tries
//! again from there.

use anyhow::{ensure, Result};
use log::{debug, warn};

use super::city::City;
use super::passenger::SimPassenger;
use super::router::find_path;
use super::types::{BusId, GridPos, PassengerId};

/// A bus cycling over a fixed sequence of stops
#[derive(Debug, Clone)]
pub struct SimBus {
    pub id: BusId,
    /// Stops visited in order, wrapping at the end
    pub route: Vec<GridPos>,
    pub position: GridPos,
    /// Index of the stop currently being approached
    pub route_index: usize,
    /// Riders currently aboard
    pub passengers: Vec<PassengerId>,
    /// Stop visits so far
    pub stops_served: u64,
    /// Sum over ticks of the riders aboard that tick
    pub passenger_ticks: u64,
}

impl SimBus {
    pub fn new(id: BusId, route: Vec<GridPos>) -> Result<Self> {
        ensure!(!route.is_empty(), "Bus {} needs at least one stop", id.0);
        let position = route[0];
        Ok(Self {
            id,
            route,
            position,
            route_index: 0,
            passengers: Vec::new(),
            stops_served: 0,
            passenger_ticks: 0,
        })
    }

    /// The stop the bus is currently heading for
    pub fn target_stop(&self) -> GridPos {
        self.route[self.route_index]
    }

    /// Advance the bus one tick
    ///
    /// Serves the current stop if standing on it, then takes one step along
    /// a freshly computed path. With no usable path the bus teleports back
    /// to the previous stop on its route and retries from there next tick.
    pub fn advance(&mut self, city: &City) {
        // Everyone aboard rides for this tick, moving or not
        self.passenger_ticks += self.passengers.len() as u64;

        if self.position == self.target_stop() {
            self.route_index = (self.route_index + 1) % self.route.len();
            self.stops_served += 1;
            debug!(
                "Bus {} served the stop at {}, heading for {}",
                self.id.0,
                self.position,
                self.target_stop()
            );
        }

        let target = self.target_stop();
        let path = find_path(self.position, target, city);

        if path.len() > 1 {
            self.position = path[1];
            debug!("Bus {} moved to {}", self.id.0, self.position);
        } else if self.position != target {
            self.route_index = (self.route_index + self.route.len() - 1) % self.route.len();
            self.position = self.route[self.route_index];
            warn!(
                "Bus {} found no path to {}, returning to the stop at {}",
                self.id.0, target, self.position
            );
        }
    }

    /// Take a passenger aboard, keeping both sides of the relation in sync
    pub fn board(&mut self, passenger: &mut SimPassenger) {
        self.passengers.push(passenger.id);
        passenger.on_bus = Some(self.id);
    }

    /// Let a passenger off at the bus's current position
    pub fn disembark(&mut self, passenger: &mut SimPassenger) {
        self.passengers.retain(|&id| id != passenger.id);
        passenger.on_bus = None;
        passenger.position = self.position;
    }
}
