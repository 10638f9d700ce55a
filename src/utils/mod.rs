//! # Utilities Module
//!
//! Search utilities operating over the field grid.

pub mod pathfinding;

pub use pathfinding::*;
