//! Passenger journeys: walk to a stop, wait, ride, arrive
//!
//! Passengers are not bound to the bus routing grid. They walk freely,
//! one step per tick with both axes allowed at once, toward the nearest
//! stop on a route that serves their destination, then wait there for a
//! bus whose route contains it.

use log::{debug, info, warn};

use super::bus::SimBus;
use super::types::{BusId, GridPos, PassengerId};

/// A passenger traveling from an origin cell to a destination stop
#[derive(Debug, Clone)]
pub struct SimPassenger {
    pub id: PassengerId,
    pub position: GridPos,
    pub destination: GridPos,
    /// The bus currently ridden, if any
    pub on_bus: Option<BusId>,
    /// The stop being walked to or waited at; None while no route serves
    /// the destination
    pub target_stop: Option<GridPos>,
    /// Consecutive ticks spent waiting at the target stop
    pub waiting_ticks: u32,
    /// Waiting threshold before the passenger reconsiders its stop
    pub max_waiting_ticks: u32,
    pub journey_complete: bool,
    /// Tick of the first boarding
    pub start_tick: Option<u64>,
    /// Tick of arrival at the destination by bus
    pub end_tick: Option<u64>,
}

impl SimPassenger {
    pub fn new(
        id: PassengerId,
        position: GridPos,
        destination: GridPos,
        max_waiting_ticks: u32,
    ) -> Self {
        Self {
            id,
            position,
            destination,
            on_bus: None,
            target_stop: None,
            waiting_ticks: 0,
            max_waiting_ticks,
            journey_complete: false,
            start_tick: None,
            end_tick: None,
        }
    }

    /// Pick the closest stop on any route that serves the destination
    ///
    /// Distance is Manhattan; the first minimum in bus order wins. With no
    /// serving route the target is cleared and the passenger stays put.
    pub fn find_nearest_stop(&mut self, buses: &[SimBus]) {
        if self.journey_complete {
            return;
        }

        let mut nearest: Option<(u32, GridPos)> = None;
        for bus in buses {
            if !bus.route.contains(&self.destination) {
                continue;
            }
            for stop in &bus.route {
                let distance = self.position.manhattan_distance(stop);
                if nearest.map_or(true, |(best, _)| distance < best) {
                    nearest = Some((distance, *stop));
                }
            }
        }

        self.target_stop = nearest.map(|(_, stop)| stop);
        match self.target_stop {
            Some(stop) => debug!("Passenger {} heads for the stop at {}", self.id.0, stop),
            None => warn!(
                "No route serves passenger {} heading to {}",
                self.id.0, self.destination
            ),
        }
    }

    /// Step one cell toward the target, on both axes at once where they
    /// both differ
    pub fn move_towards(&mut self, target: GridPos) {
        if self.journey_complete {
            return;
        }
        let step = GridPos::new(
            self.position.x + (target.x - self.position.x).signum(),
            self.position.y + (target.y - self.position.y).signum(),
        );
        if step != self.position {
            self.position = step;
            debug!("Passenger {} walked to {}", self.id.0, self.position);
        }
    }

    /// Advance the passenger one tick
    pub fn update(&mut self, buses: &mut [SimBus], tick: u64) {
        if self.journey_complete {
            return;
        }

        if let Some(bus_id) = self.on_bus {
            let bus = match buses.iter_mut().find(|bus| bus.id == bus_id) {
                Some(bus) => bus,
                None => {
                    warn!("Passenger {} references missing bus {}", self.id.0, bus_id.0);
                    self.on_bus = None;
                    return;
                }
            };

            self.position = bus.position;

            if self.position == self.destination {
                if self.end_tick.is_none() {
                    self.end_tick = Some(tick);
                }
                bus.disembark(self);
                self.journey_complete = true;
                info!(
                    "Passenger {} arrived at {} on bus {}",
                    self.id.0, self.destination, bus_id.0
                );
            } else if !bus.route.contains(&self.destination) {
                // Wrong bus. Get off where it stands and look again.
                bus.disembark(self);
                debug!(
                    "Passenger {} left the wrong bus {} at {}",
                    self.id.0, bus_id.0, self.position
                );
                self.find_nearest_stop(buses);
                self.waiting_ticks = 0;
            }
        } else {
            if self.target_stop.is_none() {
                self.find_nearest_stop(buses);
            }

            match self.target_stop {
                Some(target) if self.position != target => self.move_towards(target),
                Some(_) => {
                    self.waiting_ticks += 1;
                    if self.waiting_ticks > self.max_waiting_ticks {
                        debug!(
                            "Passenger {} tired of waiting at {}, reconsidering",
                            self.id.0, self.position
                        );
                        self.find_nearest_stop(buses);
                        self.waiting_ticks = 0;
                    }
                    self.try_board(buses, tick);
                }
                // Nowhere useful to go until the routes change
                None => {}
            }
        }

        if self.position == self.destination && !self.journey_complete {
            debug!(
                "Passenger {} is already at {} and stops moving",
                self.id.0, self.destination
            );
            self.journey_complete = true;
        }
    }

    /// Get off if the bus stands on an endpoint of an active blocked route
    pub fn on_route_blocked(&mut self, blocked: &[(GridPos, GridPos, u64)], bus: &mut SimBus) {
        if self.on_bus != Some(bus.id) {
            return;
        }
        let stranded = blocked
            .iter()
            .any(|(start, end, _)| bus.position == *start || bus.position == *end);
        if stranded {
            info!(
                "Passenger {} left bus {} held up by a blocked route at {}",
                self.id.0, bus.id.0, bus.position
            );
            bus.disembark(self);
        }
    }

    /// Ticks between first boarding and arrival, once both have happened
    pub fn travel_time(&self) -> Option<u64> {
        match (self.start_tick, self.end_tick) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Board the first bus standing here whose route serves the destination
    fn try_board(&mut self, buses: &mut [SimBus], tick: u64) {
        for bus in buses.iter_mut() {
            if bus.position == self.position && bus.route.contains(&self.destination) {
                bus.board(self);
                if self.start_tick.is_none() {
                    self.start_tick = Some(tick);
                }
                info!(
                    "Passenger {} boarded bus {} at the stop at {}",
                    self.id.0, bus.id.0, bus.position
                );
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::city::City;

    fn bus(id: usize, route: Vec<GridPos>) -> SimBus {
        SimBus::new(BusId(id), route).unwrap()
    }

    #[test]
    fn nearest_stop_prefers_the_first_minimum() {
        let buses = vec![bus(
            0,
            vec![GridPos::new(0, 2), GridPos::new(4, 2), GridPos::new(9, 9)],
        )];
        let mut passenger =
            SimPassenger::new(PassengerId(0), GridPos::new(2, 2), GridPos::new(9, 9), 5);

        passenger.find_nearest_stop(&buses);
        assert_eq!(passenger.target_stop, Some(GridPos::new(0, 2)));
    }

    #[test]
    fn routes_not_serving_the_destination_are_ignored() {
        let buses = vec![
            bus(0, vec![GridPos::new(2, 2), GridPos::new(3, 3)]),
            bus(1, vec![GridPos::new(8, 8), GridPos::new(9, 9)]),
        ];
        let mut passenger =
            SimPassenger::new(PassengerId(0), GridPos::new(2, 2), GridPos::new(9, 9), 5);

        passenger.find_nearest_stop(&buses);
        assert_eq!(passenger.target_stop, Some(GridPos::new(8, 8)));
    }

    #[test]
    fn stalls_when_no_route_serves_the_destination() {
        let mut buses = vec![bus(0, vec![GridPos::new(2, 2), GridPos::new(3, 3)])];
        let mut passenger =
            SimPassenger::new(PassengerId(0), GridPos::new(5, 5), GridPos::new(9, 9), 5);

        for tick in 1..=4 {
            passenger.update(&mut buses, tick);
        }
        assert_eq!(passenger.target_stop, None);
        assert_eq!(passenger.position, GridPos::new(5, 5));
        assert!(!passenger.journey_complete);
    }

    #[test]
    fn walks_diagonally_toward_its_stop() {
        let mut buses = vec![bus(0, vec![GridPos::new(3, 2), GridPos::new(9, 9)])];
        let mut passenger =
            SimPassenger::new(PassengerId(0), GridPos::new(0, 0), GridPos::new(9, 9), 5);

        passenger.update(&mut buses, 1);
        assert_eq!(passenger.position, GridPos::new(1, 1));
        passenger.update(&mut buses, 2);
        assert_eq!(passenger.position, GridPos::new(2, 2));
        passenger.update(&mut buses, 3);
        assert_eq!(passenger.position, GridPos::new(3, 2));
    }

    #[test]
    fn waiting_threshold_resets_the_counter() {
        // A bus whose route serves the destination but which never shows up
        let mut buses = vec![bus(0, vec![GridPos::new(0, 0), GridPos::new(5, 0)])];
        buses[0].position = GridPos::new(5, 0);
        let mut passenger =
            SimPassenger::new(PassengerId(0), GridPos::new(0, 0), GridPos::new(5, 0), 5);
        passenger.target_stop = Some(GridPos::new(0, 0));

        for tick in 1..=5 {
            passenger.update(&mut buses, tick);
        }
        assert_eq!(passenger.waiting_ticks, 5);

        passenger.update(&mut buses, 6);
        assert_eq!(passenger.waiting_ticks, 0, "threshold crossed, counter reset");
        assert_eq!(passenger.target_stop, Some(GridPos::new(0, 0)));
    }

    #[test]
    fn boards_only_a_bus_serving_the_destination() {
        let mut buses = vec![
            bus(0, vec![GridPos::new(0, 0), GridPos::new(0, 5)]),
            bus(1, vec![GridPos::new(0, 0), GridPos::new(5, 0)]),
        ];
        let mut passenger =
            SimPassenger::new(PassengerId(0), GridPos::new(0, 0), GridPos::new(5, 0), 5);
        passenger.target_stop = Some(GridPos::new(0, 0));

        // Both buses stand at the stop; only the second serves (5, 0)
        passenger.update(&mut buses, 3);
        assert_eq!(passenger.on_bus, Some(BusId(1)));
        assert_eq!(passenger.start_tick, Some(3));
        assert!(buses[1].passengers.contains(&passenger.id));
        assert!(buses[0].passengers.is_empty());
    }

    #[test]
    fn start_tick_is_recorded_once() {
        let mut buses = vec![bus(0, vec![GridPos::new(0, 0), GridPos::new(5, 0)])];
        let mut passenger =
            SimPassenger::new(PassengerId(0), GridPos::new(0, 0), GridPos::new(5, 0), 5);
        passenger.target_stop = Some(GridPos::new(0, 0));

        passenger.update(&mut buses, 4);
        assert_eq!(passenger.start_tick, Some(4));

        // Forced off, re-boarding later keeps the first boarding tick
        buses[0].disembark(&mut passenger);
        passenger.update(&mut buses, 9);
        assert_eq!(passenger.on_bus, Some(BusId(0)));
        assert_eq!(passenger.start_tick, Some(4));
    }

    #[test]
    fn arrival_detaches_and_freezes_the_passenger() {
        let mut buses = vec![bus(0, vec![GridPos::new(0, 0), GridPos::new(5, 0)])];
        let mut passenger =
            SimPassenger::new(PassengerId(0), GridPos::new(0, 0), GridPos::new(5, 0), 5);
        buses[0].board(&mut passenger);
        buses[0].position = GridPos::new(5, 0);

        passenger.update(&mut buses, 12);
        assert!(passenger.journey_complete);
        assert_eq!(passenger.on_bus, None);
        assert_eq!(passenger.end_tick, Some(12));
        assert_eq!(passenger.position, GridPos::new(5, 0));
        assert!(buses[0].passengers.is_empty());

        // Later ticks change nothing
        buses[0].position = GridPos::new(3, 0);
        passenger.update(&mut buses, 13);
        assert!(passenger.journey_complete);
        assert_eq!(passenger.position, GridPos::new(5, 0));
        assert_eq!(passenger.end_tick, Some(12));
    }

    #[test]
    fn wrong_bus_is_abandoned_at_its_current_position() {
        let mut buses = vec![
            bus(0, vec![GridPos::new(0, 0), GridPos::new(0, 5)]),
            bus(1, vec![GridPos::new(4, 4), GridPos::new(5, 0)]),
        ];
        let mut passenger =
            SimPassenger::new(PassengerId(0), GridPos::new(0, 0), GridPos::new(5, 0), 5);
        buses[0].board(&mut passenger);
        buses[0].position = GridPos::new(0, 3);
        passenger.waiting_ticks = 4;

        passenger.update(&mut buses, 7);
        assert_eq!(passenger.on_bus, None);
        assert_eq!(passenger.position, GridPos::new(0, 3));
        assert_eq!(passenger.waiting_ticks, 0);
        assert_eq!(passenger.target_stop, Some(GridPos::new(4, 4)));
        assert!(buses[0].passengers.is_empty());
    }

    #[test]
    fn origin_equal_to_destination_completes_immediately() {
        let mut buses = vec![bus(0, vec![GridPos::new(0, 0), GridPos::new(5, 0)])];
        let mut passenger =
            SimPassenger::new(PassengerId(0), GridPos::new(5, 0), GridPos::new(5, 0), 5);

        passenger.update(&mut buses, 1);
        assert!(passenger.journey_complete);
        assert_eq!(passenger.travel_time(), None, "never rode a bus");
    }

    #[test]
    fn forced_off_at_a_blocked_endpoint() {
        let mut city = City::new(10, 10, vec![]).unwrap();
        city.block_route(GridPos::new(3, 0), GridPos::new(3, 4), 6).unwrap();
        let blocked = city.blocked_routes();

        let mut carrier = bus(0, vec![GridPos::new(0, 0), GridPos::new(5, 0)]);
        let mut passenger =
            SimPassenger::new(PassengerId(0), GridPos::new(0, 0), GridPos::new(5, 0), 5);
        carrier.board(&mut passenger);

        // Mid-segment cells do not trigger...
        carrier.position = GridPos::new(3, 2);
        passenger.on_route_blocked(&blocked, &mut carrier);
        assert_eq!(passenger.on_bus, Some(carrier.id));

        // ...but an endpoint does
        carrier.position = GridPos::new(3, 0);
        passenger.on_route_blocked(&blocked, &mut carrier);
        assert_eq!(passenger.on_bus, None);
        assert_eq!(passenger.position, GridPos::new(3, 0));
        assert!(carrier.passengers.is_empty());
    }

    #[test]
    fn travel_time_needs_both_endpoints() {
        let mut passenger =
            SimPassenger::new(PassengerId(0), GridPos::new(0, 0), GridPos::new(5, 0), 5);
        assert_eq!(passenger.travel_time(), None);

        passenger.start_tick = Some(10);
        assert_eq!(passenger.travel_time(), None);

        passenger.end_tick = Some(24);
        assert_eq!(passenger.travel_time(), Some(14));
    }
}
