//! # Mino
//!
//! The placeable 4-cell piece. A mino is created from a fixed shape
//! pattern, carves its perimeter walls with exactly two random openings,
//! and can rotate 90° clockwise about its pivot cell.

use crate::{Block, Direction, Position};
use rand::{rngs::StdRng, Rng};
use serde::{Deserialize, Serialize};

/// The seven mino shapes.
///
/// Each shape is the pivot cell at (0, 0) plus three pattern offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeType {
    /// Straight line
    A,
    /// Square
    B,
    /// S
    C1,
    /// S, mirrored
    C2,
    /// L
    D1,
    /// L, mirrored
    D2,
    /// T
    E,
}

impl ShapeType {
    /// All seven shapes.
    pub const ALL: [ShapeType; 7] = [
        ShapeType::A,
        ShapeType::B,
        ShapeType::C1,
        ShapeType::C2,
        ShapeType::D1,
        ShapeType::D2,
        ShapeType::E,
    ];

    /// The three non-pivot cell offsets of this shape.
    pub fn pattern(self) -> [(i32, i32); 3] {
        match self {
            ShapeType::A => [(-1, 0), (1, 0), (2, 0)],
            ShapeType::B => [(0, 1), (1, 0), (1, 1)],
            ShapeType::C1 => [(-1, 0), (0, 1), (1, 1)],
            ShapeType::C2 => [(-1, 1), (0, 1), (1, 0)],
            ShapeType::D1 => [(-1, 0), (1, 0), (1, 1)],
            ShapeType::D2 => [(-1, 1), (-1, 0), (1, 0)],
            ShapeType::E => [(-1, 0), (1, 0), (0, 1)],
        }
    }

    /// Draws a shape uniformly at random.
    pub fn random(rng: &mut StdRng) -> ShapeType {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

/// One cell of a mino: a block at an offset relative to the pivot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinoCell {
    /// Offset from the pivot cell at (0, 0).
    pub offset: Position,
    /// The block that will be moved into the field grid on placement.
    pub block: Block,
}

/// A placeable piece of exactly four blocks.
///
/// The cell array is fixed-size: a mino always has exactly 4 cells, with
/// unique offsets and the pivot first. Rotation re-indexes the array in
/// place; the blocks themselves are never replaced.
///
/// # Examples
///
/// ```
/// use delve::{Mino, ShapeType};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let mino = Mino::create(ShapeType::E, &mut rng);
/// assert_eq!(mino.cells().len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mino {
    shape: ShapeType,
    cells: [MinoCell; 4],
    /// Grid coordinate of the pivot cell while the piece is being dragged.
    pub anchor: Position,
}

impl Mino {
    /// Creates a mino of the given shape with freshly carved walls.
    pub fn create(shape: ShapeType, rng: &mut StdRng) -> Self {
        let pattern = shape.pattern();
        let cell = |x: i32, y: i32| MinoCell {
            offset: Position::new(x, y),
            block: Block::new(),
        };
        let cells = [
            cell(0, 0),
            cell(pattern[0].0, pattern[0].1),
            cell(pattern[1].0, pattern[1].1),
            cell(pattern[2].0, pattern[2].1),
        ];
        let mut mino = Self {
            shape,
            cells,
            anchor: Position::origin(),
        };
        mino.carve_walls(rng);
        mino
    }

    /// The shape this mino was created from.
    pub fn shape(&self) -> ShapeType {
        self.shape
    }

    /// The four cells, pivot first.
    pub fn cells(&self) -> &[MinoCell; 4] {
        &self.cells
    }

    /// Consumes the mino, handing its cells over for placement.
    pub(crate) fn into_cells(self) -> [MinoCell; 4] {
        self.cells
    }

    /// Whether one of this mino's cells sits at the given offset.
    pub fn contains_offset(&self, offset: Position) -> bool {
        self.cells.iter().any(|cell| cell.offset == offset)
    }

    /// Walls the piece perimeter, then opens exactly two random passages.
    ///
    /// Every side not facing a sibling cell becomes a wall and is recorded
    /// as a boundary entry; two boundary entries drawn uniformly without
    /// replacement are re-opened, so a piece always ends with exactly two
    /// openings regardless of shape.
    fn carve_walls(&mut self, rng: &mut StdRng) {
        let offsets: Vec<Position> = self.cells.iter().map(|cell| cell.offset).collect();
        let mut boundary: Vec<(usize, Direction)> = Vec::new();

        for (i, cell) in self.cells.iter_mut().enumerate() {
            for dir in Direction::ALL {
                let neighbor = cell.offset + dir.delta();
                if !offsets.contains(&neighbor) {
                    cell.block.set_wall(dir, true);
                    boundary.push((i, dir));
                }
            }
        }

        for _ in 0..crate::config::MINO_OPENING_COUNT {
            let pick = rng.gen_range(0..boundary.len());
            let (cell_index, dir) = boundary.remove(pick);
            self.cells[cell_index].block.set_wall(dir, false);
        }
    }

    /// Rotates the piece 90° clockwise about its pivot.
    ///
    /// Each offset (x, y) maps to (y, -x), and each block's wall array is
    /// cyclically shifted one position so the walls keep facing the same
    /// absolute sides. Four rotations reproduce the piece exactly.
    pub fn rotate(&mut self) {
        for cell in &mut self.cells {
            cell.offset = Position::new(cell.offset.y, -cell.offset.x);
            cell.block.walls.rotate_right(1);
        }
    }

    /// Puts the exit key on one uniformly random cell.
    pub fn put_key(&mut self, rng: &mut StdRng) {
        let pick = rng.gen_range(0..self.cells.len());
        self.cells[pick].block.has_key = true;
    }

    /// Puts a healing item on one uniformly random cell.
    pub fn put_heal_item(&mut self, rng: &mut StdRng) {
        let pick = rng.gen_range(0..self.cells.len());
        self.cells[pick].block.has_heal_item = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    /// Directions of a cell that do not face a sibling cell.
    fn boundary_dirs(mino: &Mino, cell: &MinoCell) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|dir| !mino.contains_offset(cell.offset + dir.delta()))
            .collect()
    }

    #[test]
    fn test_every_shape_has_four_unique_cells() {
        let mut rng = rng(1);
        for shape in ShapeType::ALL {
            let mino = Mino::create(shape, &mut rng);
            assert_eq!(mino.cells().len(), 4);
            for (i, a) in mino.cells().iter().enumerate() {
                for b in &mino.cells()[i + 1..] {
                    assert_ne!(a.offset, b.offset, "{:?} has duplicate offsets", shape);
                }
            }
            assert!(mino.contains_offset(Position::origin()), "pivot missing");
        }
    }

    #[test]
    fn test_carve_leaves_exactly_two_openings() {
        for seed in 0..32 {
            let mut rng = rng(seed);
            for shape in ShapeType::ALL {
                let mino = Mino::create(shape, &mut rng);
                let mut open = 0;
                let mut closed = 0;
                for cell in mino.cells() {
                    for dir in boundary_dirs(&mino, cell) {
                        if cell.block.wall(dir) {
                            closed += 1;
                        } else {
                            open += 1;
                        }
                    }
                }
                assert_eq!(open, 2, "{:?} seed {} openings", shape, seed);
                assert!(closed >= 1);
            }
        }
    }

    #[test]
    fn test_interior_faces_stay_open() {
        let mut rng = rng(3);
        let mino = Mino::create(ShapeType::B, &mut rng);
        for cell in mino.cells() {
            for dir in Direction::ALL {
                if mino.contains_offset(cell.offset + dir.delta()) {
                    assert!(!cell.block.wall(dir), "interior wall at {:?}", cell.offset);
                }
            }
        }
    }

    #[test]
    fn test_rotate_maps_front_wall_to_right() {
        let mut rng = rng(5);
        let mut mino = Mino::create(ShapeType::A, &mut rng);
        // Force a known wall on the pivot, then rotate once.
        mino.cells[0].block.walls = [true, false, false, false];
        mino.rotate();
        assert_eq!(mino.cells[0].block.walls, [false, true, false, false]);
    }

    #[test]
    fn test_rotate_moves_offsets_clockwise() {
        let mut rng = rng(5);
        let mut mino = Mino::create(ShapeType::A, &mut rng);
        mino.rotate();
        // The straight piece turns vertical: (x, y) -> (y, -x).
        let offsets: Vec<Position> = mino.cells().iter().map(|c| c.offset).collect();
        assert_eq!(
            offsets,
            vec![
                Position::new(0, 0),
                Position::new(0, 1),
                Position::new(0, -1),
                Position::new(0, -2),
            ]
        );
    }

    #[test]
    fn test_four_rotations_round_trip() {
        for shape in ShapeType::ALL {
            let mut rng = rng(11);
            let mut mino = Mino::create(shape, &mut rng);
            let before = mino.clone();
            for _ in 0..4 {
                mino.rotate();
            }
            assert_eq!(mino, before, "{:?} did not round-trip", shape);
        }
    }

    #[test]
    fn test_put_key_marks_one_cell() {
        let mut rng = rng(13);
        let mut mino = Mino::create(ShapeType::D1, &mut rng);
        mino.put_key(&mut rng);
        let marked = mino.cells().iter().filter(|c| c.block.has_key).count();
        assert_eq!(marked, 1);
    }

    #[test]
    fn test_put_heal_item_marks_one_cell() {
        let mut rng = rng(17);
        let mut mino = Mino::create(ShapeType::C2, &mut rng);
        mino.put_heal_item(&mut rng);
        let marked = mino.cells().iter().filter(|c| c.block.has_heal_item).count();
        assert_eq!(marked, 1);
    }

    proptest! {
        /// Any number of full rotation cycles reproduces offsets and walls.
        #[test]
        fn prop_rotation_cycles_are_identity(seed in 0u64..512, shape_index in 0usize..7, cycles in 1usize..4) {
            let mut rng = rng(seed);
            let mut mino = Mino::create(ShapeType::ALL[shape_index], &mut rng);
            let before = mino.clone();
            for _ in 0..cycles * 4 {
                mino.rotate();
            }
            prop_assert_eq!(mino, before);
        }

        /// Rotation never changes how many walls a piece carries in total.
        #[test]
        fn prop_rotation_preserves_wall_count(seed in 0u64..512, shape_index in 0usize..7, turns in 0usize..8) {
            let mut rng = rng(seed);
            let mut mino = Mino::create(ShapeType::ALL[shape_index], &mut rng);
            let count = |m: &Mino| -> usize {
                m.cells().iter().map(|c| 4 - c.block.open_wall_count()).sum()
            };
            let before = count(&mino);
            for _ in 0..turns {
                mino.rotate();
            }
            prop_assert_eq!(count(&mino), before);
        }
    }
}
