//! City grid and blocked-route bookkeeping
//!
//! The city owns the grid bounds, the fixed set of transit stops, and the
//! set of temporarily blocked routes. Each blockage carries an absolute
//! expiry tick; `age_blocked_routes` advances the clock and drops whatever
//! has lapsed in one pass over an ordered expiry index.

use anyhow::{ensure, Result};
use log::{debug, info};
use std::collections::{BTreeMap, HashMap, HashSet};

use super::types::GridPos;

/// A temporarily blocked route between two grid cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockedRoute {
    pub start: GridPos,
    pub end: GridPos,
    /// Clock value at which the blockage stops applying
    pub expires_at: u64,
}

/// The city grid: dimensions, stops, and currently blocked routes
pub struct City {
    width: i32,
    height: i32,
    stops: Vec<GridPos>,

    /// Active blockages keyed by their (start, end) endpoints
    blocked: HashMap<(GridPos, GridPos), BlockedRoute>,

    /// Expiry index: clock value -> keys scheduled to lapse then.
    /// Entries go stale when a key is overwritten or removed early;
    /// `age_blocked_routes` skips those.
    expiry: BTreeMap<u64, Vec<(GridPos, GridPos)>>,

    /// Number of aging passes so far
    clock: u64,
}

impl City {
    pub fn new(width: i32, height: i32, stops: Vec<GridPos>) -> Result<Self> {
        ensure!(
            width > 0 && height > 0,
            "City dimensions must be positive, got {}x{}",
            width,
            height
        );
        for stop in &stops {
            ensure!(
                stop.x >= 0 && stop.x < width && stop.y >= 0 && stop.y < height,
                "Stop {} is outside the {}x{} grid",
                stop,
                width,
                height
            );
        }
        Ok(Self {
            width,
            height,
            stops,
            blocked: HashMap::new(),
            expiry: BTreeMap::new(),
            clock: 0,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Transit stops, in declaration order
    pub fn stops(&self) -> &[GridPos] {
        &self.stops
    }

    /// Whether a position lies inside the grid
    pub fn is_valid_position(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// Whether a cell is one of the transit stops
    pub fn is_stop(&self, pos: GridPos) -> bool {
        self.stops.contains(&pos)
    }

    /// Whether the exact (start, end) pair is currently blocked
    pub fn is_route_blocked(&self, start: GridPos, end: GridPos) -> bool {
        self.blocked
            .get(&(start, end))
            .is_some_and(|route| route.expires_at > self.clock)
    }

    /// Block the route between two cells for `duration` aging passes
    ///
    /// Endpoints must lie on the grid and share a row or a column.
    /// Blocking an already blocked pair replaces its expiry.
    pub fn block_route(&mut self, start: GridPos, end: GridPos, duration: u64) -> Result<()> {
        ensure!(
            self.is_valid_position(start) && self.is_valid_position(end),
            "Blocked route {} -> {} leaves the {}x{} grid",
            start,
            end,
            self.width,
            self.height
        );
        ensure!(
            start.x == end.x || start.y == end.y,
            "Blocked route {} -> {} is not axis-aligned",
            start,
            end
        );

        let expires_at = self.clock + duration;
        self.blocked.insert(
            (start, end),
            BlockedRoute {
                start,
                end,
                expires_at,
            },
        );
        self.expiry.entry(expires_at).or_default().push((start, end));
        info!(
            "Blocked route {} -> {} for {} ticks",
            start, end, duration
        );
        Ok(())
    }

    /// Remove a blockage ahead of its expiry; unknown pairs are ignored
    pub fn unblock_route(&mut self, start: GridPos, end: GridPos) {
        if self.blocked.remove(&(start, end)).is_some() {
            debug!("Unblocked route {} -> {}", start, end);
        }
    }

    /// Advance the clock one tick and drop every lapsed blockage
    pub fn age_blocked_routes(&mut self) {
        self.clock += 1;
        while let Some((&due, _)) = self.expiry.first_key_value() {
            if due > self.clock {
                break;
            }
            let keys = self.expiry.remove(&due).unwrap_or_default();
            for key in keys {
                // Stale index entries point at overwritten or removed
                // blockages; only drop what has actually lapsed
                let lapsed = self
                    .blocked
                    .get(&key)
                    .is_some_and(|route| route.expires_at <= self.clock);
                if lapsed {
                    self.blocked.remove(&key);
                    info!("Blocked route {} -> {} expired", key.0, key.1);
                }
            }
        }
    }

    /// Drop every blockage at once, expired or not
    pub fn clear_blocked_routes(&mut self) {
        if !self.blocked.is_empty() {
            info!("Cleared all {} blocked routes", self.blocked.len());
        }
        self.blocked.clear();
        self.expiry.clear();
    }

    /// Every cell covered by an active blockage, endpoints included
    ///
    /// Walking one unit step per axis from start to end visits exactly the
    /// cells a blockage covers; routes are axis-aligned by construction.
    pub fn blocked_cells(&self) -> HashSet<GridPos> {
        let mut cells = HashSet::new();
        for route in self.blocked.values() {
            if route.expires_at <= self.clock {
                continue;
            }
            let mut cursor = route.start;
            cells.insert(cursor);
            while cursor != route.end {
                cursor.x += (route.end.x - cursor.x).signum();
                cursor.y += (route.end.y - cursor.y).signum();
                cells.insert(cursor);
            }
        }
        cells
    }

    /// Active blockages with their remaining lifetime in ticks, in
    /// ascending endpoint order
    pub fn blocked_routes(&self) -> Vec<(GridPos, GridPos, u64)> {
        let mut routes: Vec<_> = self
            .blocked
            .values()
            .filter(|route| route.expires_at > self.clock)
            .map(|route| (route.start, route.end, route.expires_at - self.clock))
            .collect();
        routes.sort();
        routes
    }

    /// Number of active blockages
    pub fn blocked_route_count(&self) -> usize {
        self.blocked
            .values()
            .filter(|route| route.expires_at > self.clock)
            .count()
    }
}
