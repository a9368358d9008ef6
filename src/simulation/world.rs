//! Main simulation world that ties everything together
//!
//! This is the entry point for stepping the transit simulation.

use anyhow::{ensure, Result};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use rand::SeedableRng;
use std::collections::HashSet;

use super::bus::SimBus;
use super::city::City;
use super::config::SimConfig;
use super::passenger::SimPassenger;
use super::types::{BusId, GridPos, PassengerId};

/// Aggregate transport metrics for the simulation
///
/// Refreshed at the end of every tick from the entity counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimMetrics {
    /// Passengers that finished their journey so far
    pub journeys_completed: u64,
    /// Stops served across all buses
    pub total_stops_served: u64,
    /// Rider-ticks accumulated across all buses
    pub total_passenger_ticks: u64,
    /// Blockages currently in force
    pub active_blockages: usize,
    /// Share of grid cells occupied by buses, as a percentage
    pub grid_utilization: f64,
}

/// Point-in-time view of one bus
#[derive(Debug, Clone, PartialEq)]
pub struct BusSnapshot {
    pub id: BusId,
    pub position: GridPos,
    pub next_stop: GridPos,
    pub riders: usize,
    pub stops_served: u64,
}

/// Point-in-time view of one passenger
#[derive(Debug, Clone, PartialEq)]
pub struct PassengerSnapshot {
    pub id: PassengerId,
    pub position: GridPos,
    pub destination: GridPos,
    pub target_stop: Option<GridPos>,
    pub on_bus: Option<BusId>,
    pub journey_complete: bool,
    pub travel_time: Option<u64>,
}

/// Full observable state of the world after a tick
///
/// Two worlds built from the same config and seed produce equal
/// snapshots at every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub buses: Vec<BusSnapshot>,
    pub passengers: Vec<PassengerSnapshot>,
    pub blocked_routes: Vec<(GridPos, GridPos, u64)>,
    pub metrics: SimMetrics,
}

/// Directions a blocked segment may extend in from its start cell
const DISRUPTION_DIRECTIONS: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// The main simulation world
pub struct SimWorld {
    /// Street grid with stops and blockages
    pub city: City,

    /// All buses, indexed by `BusId`
    pub buses: Vec<SimBus>,

    /// All passengers, indexed by `PassengerId`
    pub passengers: Vec<SimPassenger>,

    /// Validated parameters the world was built from
    config: SimConfig,

    /// Simulation time
    tick: u64,

    /// Journeys completed, counted once per passenger on arrival
    journeys_completed: u64,

    /// Metrics from the most recent tick
    metrics: SimMetrics,

    /// Optional seeded RNG for reproducible simulations
    rng: Option<StdRng>,
}

impl SimWorld {
    fn new_internal(config: SimConfig, rng: Option<StdRng>) -> Result<Self> {
        config.validate()?;
        let city = City::new(config.width, config.height, config.stops.clone())?;
        let mut buses = Vec::with_capacity(config.routes.len());
        for (index, route) in config.routes.iter().enumerate() {
            buses.push(SimBus::new(BusId(index), route.clone())?);
        }
        Ok(Self {
            city,
            buses,
            passengers: Vec::new(),
            config,
            tick: 0,
            journeys_completed: 0,
            metrics: SimMetrics::default(),
            rng,
        })
    }

    pub fn new(config: SimConfig) -> Result<Self> {
        Self::new_internal(config, None)
    }

    /// Create a new SimWorld with a seeded RNG for reproducible simulations
    pub fn new_with_seed(config: SimConfig, seed: u64) -> Result<Self> {
        Self::new_internal(config, Some(StdRng::seed_from_u64(seed)))
    }

    /// Create the standard demo world
    pub fn create_demo_world() -> Result<Self> {
        Self::new(SimConfig::demo())
    }

    /// Create the standard demo world with a seeded RNG
    pub fn create_demo_world_with_seed(seed: u64) -> Result<Self> {
        Self::new_with_seed(SimConfig::demo(), seed)
    }

    /// Get a random value in the given range, using seeded RNG if available
    fn random_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distr::uniform::SampleUniform,
        R: rand::distr::uniform::SampleRange<T>,
    {
        match &mut self.rng {
            Some(rng) => rng.random_range(range),
            None => rand::rng().random_range(range),
        }
    }

    /// Roll against a probability, using seeded RNG if available
    fn random_bool(&mut self, probability: f64) -> bool {
        match &mut self.rng {
            Some(rng) => rng.random_bool(probability),
            None => rand::rng().random_bool(probability),
        }
    }

    /// Choose a random element from a slice, using seeded RNG if available
    fn choose_random<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        if slice.is_empty() {
            return None;
        }
        match &mut self.rng {
            Some(rng) => slice.choose(rng),
            None => slice.choose(&mut rand::rng()),
        }
    }

    /// Current simulation tick
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Metrics as of the most recent tick
    pub fn metrics(&self) -> &SimMetrics {
        &self.metrics
    }

    /// The parameters the world was built from
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Add a passenger to the world
    ///
    /// Both endpoints must lie inside the grid, and at least one bus
    /// route must serve the destination.
    pub fn add_passenger(
        &mut self,
        position: GridPos,
        destination: GridPos,
    ) -> Result<PassengerId> {
        ensure!(
            self.city.is_valid_position(position),
            "Passenger origin {} is outside the {}x{} grid",
            position,
            self.city.width(),
            self.city.height()
        );
        ensure!(
            self.city.is_valid_position(destination),
            "Passenger destination {} is outside the {}x{} grid",
            destination,
            self.city.width(),
            self.city.height()
        );
        ensure!(
            self.buses
                .iter()
                .any(|bus| bus.route.contains(&destination)),
            "No bus route serves {}",
            destination
        );

        let id = PassengerId(self.passengers.len());
        self.passengers.push(SimPassenger::new(
            id,
            position,
            destination,
            self.config.max_waiting_ticks,
        ));
        debug!(
            "Passenger {} wants to go {} -> {}",
            id.0, position, destination
        );
        Ok(id)
    }

    /// Maybe add a passenger between two random stops, per the configured
    /// spawn probability
    ///
    /// Destinations are drawn only from stops some bus route serves, so
    /// every spawned passenger has a bus worth waiting for.
    pub fn spawn_random_passenger(&mut self) -> Option<PassengerId> {
        if !self.random_bool(self.config.spawn_probability) {
            return None;
        }

        let stops = self.city.stops().to_vec();
        let served: Vec<GridPos> = stops
            .iter()
            .copied()
            .filter(|stop| self.buses.iter().any(|bus| bus.route.contains(stop)))
            .collect();

        let origin = *self.choose_random(&stops)?;
        let destination = *self.choose_random(&served)?;
        match self.add_passenger(origin, destination) {
            Ok(id) => Some(id),
            Err(error) => {
                warn!("Skipped a spawned passenger: {error:#}");
                None
            }
        }
    }

    /// Advance the simulation by one tick
    pub fn step(&mut self) {
        self.tick += 1;
        self.city.age_blocked_routes();

        if self.tick % self.config.disruption_interval == 0 {
            self.spawn_disruption();
        }

        // The repair crew schedule is re-rolled every tick
        let repair_interval = self.random_range(
            self.config.full_repair_interval.0..=self.config.full_repair_interval.1,
        );
        if self.tick % repair_interval == 0 {
            info!("Tick {}: repair crews sweep the grid", self.tick);
            self.city.clear_blocked_routes();
        }

        self.update_buses();
        self.update_passengers();
        self.refresh_metrics();
    }

    /// Try to place one new blocked route
    ///
    /// Skipped whenever a freshly rolled cap is already met. Both endpoints
    /// avoid stops, and the segment extends along one axis by a span drawn
    /// from the configured range.
    fn spawn_disruption(&mut self) {
        let cap = self.random_range(self.config.disruption_cap.0..=self.config.disruption_cap.1);
        if self.city.blocked_route_count() >= cap {
            return;
        }

        let start = match self.pick_disruption_start() {
            Some(start) => start,
            None => return,
        };

        let (span_min, span_max) = self.config.disruption_span;
        let mut candidates = Vec::new();
        for (dx, dy) in DISRUPTION_DIRECTIONS {
            for span in span_min..=span_max {
                let end = GridPos::new(start.x + dx * span, start.y + dy * span);
                if self.city.is_valid_position(end) && !self.city.is_stop(end) {
                    candidates.push(end);
                }
            }
        }

        let end = match self.choose_random(&candidates).copied() {
            Some(end) => end,
            None => {
                debug!("No valid blockage fits from {}", start);
                return;
            }
        };

        let duration =
            self.random_range(self.config.block_duration.0..=self.config.block_duration.1);
        if let Err(error) = self.city.block_route(start, end, duration) {
            warn!("Skipped a disruption: {error:#}");
        }
    }

    /// Pick a start cell for a blockage from the cells that are not stops
    fn pick_disruption_start(&mut self) -> Option<GridPos> {
        let mut cells = Vec::new();
        for x in 0..self.city.width() {
            for y in 0..self.city.height() {
                let cell = GridPos::new(x, y);
                if !self.city.is_stop(cell) {
                    cells.push(cell);
                }
            }
        }
        self.choose_random(&cells).copied()
    }

    /// Advance every bus, then turn out riders whose bus stands on a
    /// blocked endpoint
    fn update_buses(&mut self) {
        let blocked = self.city.blocked_routes();
        for index in 0..self.buses.len() {
            self.buses[index].advance(&self.city);

            // Snapshot the rider list so disembarking cannot skip anyone
            let riders = self.buses[index].passengers.clone();
            for passenger_id in riders {
                let bus = &mut self.buses[index];
                let passenger = &mut self.passengers[passenger_id.0];
                passenger.on_route_blocked(&blocked, bus);
            }
        }
    }

    /// Update every passenger, counting journeys as they complete
    fn update_passengers(&mut self) {
        for index in 0..self.passengers.len() {
            let was_complete = self.passengers[index].journey_complete;
            let passenger = &mut self.passengers[index];
            passenger.update(&mut self.buses, self.tick);
            if !was_complete && passenger.journey_complete {
                self.journeys_completed += 1;
            }
        }
    }

    fn refresh_metrics(&mut self) {
        let occupied: HashSet<GridPos> = self.buses.iter().map(|bus| bus.position).collect();
        let cells = (self.city.width() as u64 * self.city.height() as u64) as f64;
        self.metrics = SimMetrics {
            journeys_completed: self.journeys_completed,
            total_stops_served: self.buses.iter().map(|bus| bus.stops_served).sum(),
            total_passenger_ticks: self.buses.iter().map(|bus| bus.passenger_ticks).sum(),
            active_blockages: self.city.blocked_route_count(),
            grid_utilization: occupied.len() as f64 / cells * 100.0,
        };
    }

    /// Capture the full observable state of the world
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            buses: self
                .buses
                .iter()
                .map(|bus| BusSnapshot {
                    id: bus.id,
                    position: bus.position,
                    next_stop: bus.target_stop(),
                    riders: bus.passengers.len(),
                    stops_served: bus.stops_served,
                })
                .collect(),
            passengers: self
                .passengers
                .iter()
                .map(|passenger| PassengerSnapshot {
                    id: passenger.id,
                    position: passenger.position,
                    destination: passenger.destination,
                    target_stop: passenger.target_stop,
                    on_bus: passenger.on_bus,
                    journey_complete: passenger.journey_complete,
                    travel_time: passenger.travel_time(),
                })
                .collect(),
            blocked_routes: self.city.blocked_routes(),
            metrics: self.metrics.clone(),
        }
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        println!("=== Transit Simulation Summary ===");
        println!("Tick: {}", self.tick);
        println!(
            "Grid: {}x{}, stops: {}",
            self.city.width(),
            self.city.height(),
            self.city.stops().len()
        );
        println!(
            "Buses: {}, passengers: {}",
            self.buses.len(),
            self.passengers.len()
        );
        println!();

        println!("--- Buses ---");
        for bus in &self.buses {
            println!(
                "  Bus {}: at {}, heading for {}, riders={}, stops_served={}",
                bus.id.0,
                bus.position,
                bus.target_stop(),
                bus.passengers.len(),
                bus.stops_served
            );
        }

        let blocked = self.city.blocked_routes();
        if !blocked.is_empty() {
            println!("--- Blocked Routes ---");
            for (start, end, remaining) in blocked {
                println!("  {} -> {} for {} more ticks", start, end, remaining);
            }
        }

        if !self.passengers.is_empty() {
            println!("--- Passengers ---");
            for passenger in &self.passengers {
                let status = match passenger.on_bus {
                    Some(bus_id) => format!("riding bus {}", bus_id.0),
                    None if passenger.journey_complete => "arrived".to_string(),
                    None => "on foot".to_string(),
                };
                println!(
                    "  Passenger {}: at {}, destination {}, {}",
                    passenger.id.0, passenger.position, passenger.destination, status
                );
            }
        }

        println!("--- System Metrics ---");
        println!("  Journeys completed: {}", self.metrics.journeys_completed);
        println!("  Stops served: {}", self.metrics.total_stops_served);
        println!("  Passenger ticks: {}", self.metrics.total_passenger_ticks);
        println!("  Active blockages: {}", self.metrics.active_blockages);
        println!("  Grid utilization: {:.1}%", self.metrics.grid_utilization);
    }

    /// Draw a map of the grid in the terminal
    pub fn draw_map(&self) {
        let width = self.city.width() as usize;
        let height = self.city.height() as usize;
        let mut grid = vec![vec!['.'; width]; height];

        for stop in self.city.stops() {
            grid[stop.y as usize][stop.x as usize] = 'S';
        }
        for cell in self.city.blocked_cells() {
            grid[cell.y as usize][cell.x as usize] = 'x';
        }
        for passenger in &self.passengers {
            if passenger.on_bus.is_none() && !passenger.journey_complete {
                grid[passenger.position.y as usize][passenger.position.x as usize] = 'p';
            }
        }
        for bus in &self.buses {
            grid[bus.position.y as usize][bus.position.x as usize] = 'B';
        }

        println!("\n=== City Map ===");
        println!("Legend: B=Bus, p=Passenger, x=Blocked, S=Stop");
        println!();
        // Row 0 is the bottom of the grid
        for row in grid.iter().rev() {
            let line: String = row.iter().collect();
            println!("{}", line);
        }
        println!();
    }
}
