//! Transit Simulation Library
//!
//! A discrete grid transit simulation: buses cycle over fixed routes,
//! passengers walk to stops, wait, ride, and disembark, while blocked
//! routes appear and expire underneath them.

pub mod simulation;
