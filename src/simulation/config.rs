//! Simulation tunables and the demo city layout

use anyhow::{ensure, Result};

use super::types::GridPos;

/// Ticks between attempts to place a new blocked route
pub const DISRUPTION_INTERVAL: u64 = 5;

/// Inclusive range a new blockage's lifetime is drawn from
pub const BLOCK_DURATION_RANGE: (u64, u64) = (2, 8);

/// Inclusive range the blockage cap is re-rolled from on every attempt
pub const DISRUPTION_CAP_RANGE: (usize, usize) = (0, 4);

/// Inclusive range for the length of a blocked segment in cells
pub const DISRUPTION_SPAN_RANGE: (i32, i32) = (4, 6);

/// Inclusive range the full-repair modulus is drawn from each tick
pub const FULL_REPAIR_RANGE: (u64, u64) = (25, 40);

/// Ticks a passenger waits at a stop before reconsidering it
pub const MAX_WAITING_TICKS: u32 = 5;

/// Chance per tick that the demo driver injects a random passenger
pub const SPAWN_PROBABILITY: f64 = 0.1;

/// Tunable parameters for a simulation world
///
/// `new` fills in the standard tuning; callers override fields before
/// handing the config to `SimWorld`, which validates it once.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub width: i32,
    pub height: i32,
    /// Transit stops; every route stop must appear here
    pub stops: Vec<GridPos>,
    /// One bus is created per route, starting at its first stop
    pub routes: Vec<Vec<GridPos>>,
    pub block_duration: (u64, u64),
    pub disruption_interval: u64,
    pub disruption_cap: (usize, usize),
    pub disruption_span: (i32, i32),
    pub full_repair_interval: (u64, u64),
    pub max_waiting_ticks: u32,
    pub spawn_probability: f64,
}

impl SimConfig {
    pub fn new(width: i32, height: i32, stops: Vec<GridPos>, routes: Vec<Vec<GridPos>>) -> Self {
        Self {
            width,
            height,
            stops,
            routes,
            block_duration: BLOCK_DURATION_RANGE,
            disruption_interval: DISRUPTION_INTERVAL,
            disruption_cap: DISRUPTION_CAP_RANGE,
            disruption_span: DISRUPTION_SPAN_RANGE,
            full_repair_interval: FULL_REPAIR_RANGE,
            max_waiting_ticks: MAX_WAITING_TICKS,
            spawn_probability: SPAWN_PROBABILITY,
        }
    }

    /// The demo layout: a 10x10 grid, eight stops, two crossing routes
    pub fn demo() -> Self {
        let stops = vec![
            GridPos::new(1, 0),
            GridPos::new(3, 9),
            GridPos::new(2, 2),
            GridPos::new(5, 9),
            GridPos::new(2, 7),
            GridPos::new(5, 1),
            GridPos::new(1, 5),
            GridPos::new(0, 8),
        ];
        let routes = vec![
            vec![
                GridPos::new(1, 0),
                GridPos::new(2, 7),
                GridPos::new(3, 9),
                GridPos::new(5, 9),
            ],
            vec![
                GridPos::new(2, 2),
                GridPos::new(1, 5),
                GridPos::new(0, 8),
                GridPos::new(5, 1),
            ],
        ];
        Self::new(10, 10, stops, routes)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.width > 0 && self.height > 0,
            "Grid dimensions must be positive, got {}x{}",
            self.width,
            self.height
        );
        ensure!(!self.stops.is_empty(), "At least one stop is required");
        for stop in &self.stops {
            ensure!(
                stop.x >= 0 && stop.x < self.width && stop.y >= 0 && stop.y < self.height,
                "Stop {} is outside the {}x{} grid",
                stop,
                self.width,
                self.height
            );
        }
        ensure!(!self.routes.is_empty(), "At least one bus route is required");
        for (index, route) in self.routes.iter().enumerate() {
            ensure!(!route.is_empty(), "Route {} has no stops", index);
            for stop in route {
                ensure!(
                    self.stops.contains(stop),
                    "Route {} visits {}, which is not a stop",
                    index,
                    stop
                );
            }
        }
        ensure!(
            self.block_duration.0 <= self.block_duration.1,
            "Block duration range is inverted"
        );
        ensure!(
            self.disruption_interval > 0,
            "Disruption interval must be at least one tick"
        );
        ensure!(
            self.disruption_cap.0 <= self.disruption_cap.1,
            "Disruption cap range is inverted"
        );
        ensure!(
            self.disruption_span.0 >= 1 && self.disruption_span.0 <= self.disruption_span.1,
            "Disruption span range must start at one cell or more"
        );
        ensure!(
            self.full_repair_interval.0 >= 1
                && self.full_repair_interval.0 <= self.full_repair_interval.1,
            "Full repair interval range must start at one tick or more"
        );
        ensure!(
            (0.0..=1.0).contains(&self.spawn_probability),
            "Spawn probability {} is not within [0, 1]",
            self.spawn_probability
        );
        Ok(())
    }
}
