//! Core types for the transit simulation
//!
//! Standalone types shared by every other module.

use std::fmt;

/// A cell coordinate on the city grid
///
/// Signed so arithmetic near the edges cannot underflow; whether a
/// coordinate actually lies on the grid is `City::is_valid_position`'s call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another cell
    pub fn manhattan_distance(&self, other: &GridPos) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A wrapper type for bus IDs
///
/// IDs double as indices into the world's bus list; buses are never removed,
/// so an ID stays valid for the lifetime of the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusId(pub usize);

/// A wrapper type for passenger IDs, indexing the world's passenger list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassengerId(pub usize);
