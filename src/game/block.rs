//! # Block
//!
//! The atomic grid cell: four directional wall flags plus content flags.

use crate::Direction;
use serde::{Deserialize, Serialize};

/// A single floor cell, owned either by a [`Mino`](crate::Mino) before
/// placement or by the field grid afterwards, never both.
///
/// A freshly created block is fully open; walls are carved by
/// [`Mino::create`](crate::Mino::create) and reconciled again at placement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Wall flags indexed by [`Direction`]; true means impassable.
    pub walls: [bool; 4],
    /// Whether the cell is currently lit.
    pub illuminated: bool,
    /// Whether the cell holds the exit key.
    pub has_key: bool,
    /// Whether the cell holds a healing item.
    pub has_heal_item: bool,
}

impl Block {
    /// Creates a fully open block with no contents.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the wall on the given side is closed.
    pub fn wall(&self, dir: Direction) -> bool {
        self.walls[dir.index()]
    }

    /// Sets the wall flag on the given side.
    pub fn set_wall(&mut self, dir: Direction, closed: bool) {
        self.walls[dir.index()] = closed;
    }

    /// Number of open sides.
    pub fn open_wall_count(&self) -> usize {
        self.walls.iter().filter(|&&closed| !closed).count()
    }
}
