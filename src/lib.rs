//! # Delve
//!
//! The algorithmic core of a grid-based dungeon-building puzzle: players
//! place tetromino-like pieces ("minos") onto a growing floor grid, placement
//! reconciles the walls shared between pieces, and the resulting maze is
//! queried for shortest routes and bounded-move reachability.
//!
//! ## Architecture Overview
//!
//! The crate is built from four components, leaves first:
//!
//! - **Block**: atomic grid cell with four directional wall flags and
//!   content flags
//! - **Mino**: a 4-cell placeable piece built from Blocks, with shape
//!   creation, wall carving, and 90° rotation
//! - **Field**: the grid container validating and performing placement,
//!   reconciling walls, tracking illumination, and managing pick slots
//! - **PathFinder**: search engine over a Field's grid snapshot, computing
//!   shortest routes and bounded-move reachable sets with reusable per-cell
//!   scratch nodes
//!
//! Everything is single-threaded and synchronous; expected "not found /
//! blocked" outcomes are `Option`s and `bool`s, never errors. Rendering,
//! input capture, and AI decision policy live in external collaborators
//! that consume this crate's surface.

pub mod game;
pub mod utils;

// Core module re-exports
pub use game::*;
pub use utils::*;

/// Core error type for the Delve puzzle engine.
#[derive(thiserror::Error, Debug)]
pub enum DelveError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Field or piece state is invalid
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Operation cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Field construction failed
    #[error("Construction failed: {0}")]
    ConstructionFailed(String),
}

/// Result type used throughout the Delve codebase.
pub type DelveResult<T> = Result<T, DelveError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Game configuration constants.
pub mod config {
    /// Default field width in cells
    pub const DEFAULT_FIELD_WIDTH: i32 = 7;

    /// Default field height in cells
    pub const DEFAULT_FIELD_HEIGHT: i32 = 12;

    /// Default number of pick slots offered to the player
    pub const DEFAULT_PICK_SLOT_COUNT: usize = 3;

    /// Cells in every mino, regardless of shape
    pub const MINO_CELL_COUNT: usize = 4;

    /// Perimeter openings carved into every freshly created mino
    pub const MINO_OPENING_COUNT: usize = 2;
}
