//! # Field
//!
//! The growing floor grid. The field validates and performs mino placement,
//! reconciles the walls between newly adjacent blocks, tracks which rows are
//! illuminated, and manages the pick slots the player drags pieces from.

use crate::{Block, DelveError, DelveResult, Direction, Mino, Position, ShapeType};
use log::{debug, info};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The fixed starting cluster: a 3×3 neighborhood around the start anchor.
/// Diagonal cells close the two walls toward their outward corner; every
/// other cell is fully open.
const START_SPACE: [((i32, i32), &[Direction]); 9] = [
    ((-1, -1), &[Direction::Back, Direction::Left]),
    ((0, -1), &[]),
    ((1, -1), &[Direction::Back, Direction::Right]),
    ((-1, 0), &[]),
    ((0, 0), &[]),
    ((1, 0), &[]),
    ((-1, 1), &[Direction::Front, Direction::Left]),
    ((0, 1), &[]),
    ((1, 1), &[Direction::Front, Direction::Right]),
];

/// Flat storage of placed blocks, exactly one owner per cell.
///
/// A cell outside the nominal bounds always reads as absent. The grid is
/// the read-only snapshot [`PathFinder`](crate::PathFinder) queries run
/// against; only [`Field`] mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Option<Block>>,
}

impl Grid {
    pub(crate) fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            cells: vec![None; (width * height) as usize],
        }
    }

    /// Grid width in cells.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Nominal grid height in cells.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// The placed block at `pos`, or `None` when the cell is vacant or out
    /// of range.
    pub fn block(&self, pos: Position) -> Option<&Block> {
        self.index(pos).and_then(|i| self.cells[i].as_ref())
    }

    /// Number of cells currently holding a placed block.
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Total cell capacity of the nominal grid.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn block_mut(&mut self, pos: Position) -> Option<&mut Block> {
        self.index(pos).and_then(|i| self.cells[i].as_mut())
    }

    pub(crate) fn put(&mut self, pos: Position, block: Block) {
        if let Some(i) = self.index(pos) {
            self.cells[i] = Some(block);
        }
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if pos.x < 0 || pos.x >= self.width || pos.y < 0 || pos.y >= self.height {
            return None;
        }
        Some((pos.y * self.width + pos.x) as usize)
    }
}

/// The dungeon floor under construction.
///
/// Owns the block grid, the pick slots of pending minos, and the
/// illumination bookkeeping. Placement moves a mino's blocks into the grid;
/// the mino is consumed and its slot respawns with a fresh piece.
///
/// # Examples
///
/// ```
/// use delve::{Field, Position};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let field = Field::new(7, 12, Position::new(4, 1), 3, &mut rng).unwrap();
/// assert!(field.get_block(Position::new(4, 1)).is_some());
/// assert!(field.get_block(Position::new(0, 0)).is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    grid: Grid,
    pick_slots: Vec<Option<Mino>>,
    rotate_counts: Vec<u32>,
    picked_mino: Option<Mino>,
    last_stick_count: u32,
    illuminated_rows: BTreeSet<i32>,
    newly_illuminated_rows: Vec<i32>,
}

impl Field {
    /// Creates a field with the fixed starting cluster seeded around
    /// `start_anchor` and `slot_count` pick slots filled with random minos.
    ///
    /// Fails if the dimensions are non-positive, `slot_count` is zero, or
    /// the 3×3 starting cluster does not fit inside the nominal bounds.
    pub fn new(
        width: i32,
        height: i32,
        start_anchor: Position,
        slot_count: usize,
        rng: &mut StdRng,
    ) -> DelveResult<Self> {
        if width <= 0 || height <= 0 {
            return Err(DelveError::ConstructionFailed(format!(
                "field size {}x{} is not positive",
                width, height
            )));
        }
        if slot_count == 0 {
            return Err(DelveError::ConstructionFailed(
                "at least one pick slot is required".to_string(),
            ));
        }
        if start_anchor.x - 1 < 0
            || start_anchor.x + 1 >= width
            || start_anchor.y - 1 < 0
            || start_anchor.y + 1 >= height
        {
            return Err(DelveError::ConstructionFailed(format!(
                "starting cluster around ({}, {}) does not fit a {}x{} field",
                start_anchor.x, start_anchor.y, width, height
            )));
        }

        let mut grid = Grid::new(width, height);
        for (offset, closed_walls) in START_SPACE {
            let mut block = Block::new();
            for &dir in closed_walls {
                block.set_wall(dir, true);
            }
            grid.put(start_anchor + Position::new(offset.0, offset.1), block);
        }

        let mut pick_slots = Vec::with_capacity(slot_count);
        for _ in 0..slot_count {
            pick_slots.push(Some(Mino::create(ShapeType::random(rng), rng)));
        }

        info!(
            "field {}x{} created, start cluster at ({}, {}), {} pick slots",
            width, height, start_anchor.x, start_anchor.y, slot_count
        );

        Ok(Self {
            grid,
            pick_slots,
            rotate_counts: vec![0; slot_count],
            picked_mino: None,
            last_stick_count: 0,
            illuminated_rows: BTreeSet::new(),
            newly_illuminated_rows: Vec::new(),
        })
    }

    /// The read-only grid snapshot.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Field width in cells.
    pub fn width(&self) -> i32 {
        self.grid.width()
    }

    /// Nominal field height in cells.
    pub fn height(&self) -> i32 {
        self.grid.height()
    }

    /// The placed block at `pos`, or `None` when vacant or out of range.
    pub fn get_block(&self, pos: Position) -> Option<&Block> {
        self.grid.block(pos)
    }

    /// Number of neighbor pairs reconciled by the last placement.
    pub fn last_stick_count(&self) -> u32 {
        self.last_stick_count
    }

    /// Rows currently fully built, as of the last [`illuminate`](Self::illuminate) pass.
    pub fn illuminated_rows(&self) -> &BTreeSet<i32> {
        &self.illuminated_rows
    }

    /// Rows that became full between the last two illumination passes.
    pub fn newly_illuminated_rows(&self) -> &[i32] {
        &self.newly_illuminated_rows
    }

    /// Checks whether `mino` can be placed with its pivot at `anchor`.
    ///
    /// A placement is rejected when any cell would land outside the side or
    /// bottom bounds, or on an occupied cell. There is deliberately no
    /// ceiling check: cells at `y >= height` read as vacant and the piece
    /// may extend above the nominal height.
    pub fn can_place(&self, mino: &Mino, anchor: Position) -> bool {
        mino.cells().iter().all(|cell| {
            let pos = anchor + cell.offset;
            if pos.x < 0 || pos.x >= self.grid.width() || pos.y < 0 {
                return false;
            }
            self.grid.block(pos).is_none()
        })
    }

    /// Places `mino` with its pivot at `anchor`, consuming the piece.
    ///
    /// Walls between the piece and every adjacent placed block are
    /// reconciled first: an open side forces the facing side open; two
    /// closed sides stay closed. Each reconciled pair counts toward
    /// [`last_stick_count`](Self::last_stick_count). The piece's blocks are
    /// then moved into the grid.
    ///
    /// Callers must have validated the placement with
    /// [`can_place`](Self::can_place); an invalid placement is rejected
    /// before any state is touched.
    pub fn place(&mut self, mino: Mino, anchor: Position) -> DelveResult<()> {
        // Validate up front so a precondition violation never leaves the
        // grid partially mutated.
        if !self.can_place(&mino, anchor) {
            return Err(DelveError::InvalidAction(format!(
                "mino cannot be placed at ({}, {})",
                anchor.x, anchor.y
            )));
        }

        self.last_stick_count = 0;
        let mut cells = mino.into_cells();
        let offsets: Vec<Position> = cells.iter().map(|cell| cell.offset).collect();

        for cell in &mut cells {
            for dir in Direction::ALL {
                // Adjacency inside the piece needs no reconciliation.
                let neighbor_offset = cell.offset + dir.delta();
                if offsets.contains(&neighbor_offset) {
                    continue;
                }
                let field_pos = anchor + neighbor_offset;
                let reverse = dir.opposite();
                let Some(neighbor) = self.grid.block_mut(field_pos) else {
                    continue;
                };
                self.last_stick_count += 1;

                // An open side wins: if either facing wall is already open,
                // force the other open too. Two closed walls stay closed.
                if !cell.block.wall(dir) {
                    neighbor.set_wall(reverse, false);
                } else if !neighbor.wall(reverse) {
                    cell.block.set_wall(dir, false);
                }
            }
        }

        for cell in cells {
            let pos = anchor + cell.offset;
            if pos.y >= self.grid.height() {
                // Above the nominal ceiling the grid holds no storage and
                // the cell would be unobservable; the block is dropped.
                debug!("block above ceiling at ({}, {}) dropped", pos.x, pos.y);
                continue;
            }
            self.grid.put(pos, cell.block);
        }

        debug!(
            "mino placed at ({}, {}), stick count {}",
            anchor.x, anchor.y, self.last_stick_count
        );
        Ok(())
    }

    /// Recomputes illumination as seen from `viewer`.
    ///
    /// Every placed block goes dark, fully built rows light up, and the
    /// viewer's own block plus its 8-neighborhood are always lit. The delta
    /// of rows that became full since the previous pass is kept in
    /// [`newly_illuminated_rows`](Self::newly_illuminated_rows).
    pub fn illuminate(&mut self, viewer: Position) {
        let width = self.grid.width();
        let mut full_rows = BTreeSet::new();

        for y in 0..self.grid.height() {
            let mut occupied = 0;
            for x in 0..width {
                if let Some(block) = self.grid.block_mut(Position::new(x, y)) {
                    block.illuminated = false;
                    occupied += 1;
                }
            }
            if occupied == width {
                full_rows.insert(y);
            }
        }

        for &y in &full_rows {
            for x in 0..width {
                if let Some(block) = self.grid.block_mut(Position::new(x, y)) {
                    block.illuminated = true;
                }
            }
        }

        if let Some(block) = self.grid.block_mut(viewer) {
            block.illuminated = true;
        }
        for pos in viewer.halo_positions() {
            if let Some(block) = self.grid.block_mut(pos) {
                block.illuminated = true;
            }
        }

        self.newly_illuminated_rows = full_rows
            .difference(&self.illuminated_rows)
            .copied()
            .collect();
        if !self.newly_illuminated_rows.is_empty() {
            debug!("rows newly illuminated: {:?}", self.newly_illuminated_rows);
        }
        self.illuminated_rows = full_rows;
    }

    /// The pending minos, one per slot; `None` marks a slot whose mino is
    /// currently picked or awaiting respawn.
    pub fn pick_slots(&self) -> &[Option<Mino>] {
        &self.pick_slots
    }

    /// Per-slot rotation counters (0–3).
    pub fn rotate_counts(&self) -> &[u32] {
        &self.rotate_counts
    }

    /// The mino currently being dragged, if any.
    pub fn picked_mino(&self) -> Option<&Mino> {
        self.picked_mino.as_ref()
    }

    /// Mutable access to the picked mino, e.g. to move its anchor while
    /// dragging.
    pub fn picked_mino_mut(&mut self) -> Option<&mut Mino> {
        self.picked_mino.as_mut()
    }

    /// Moves the mino in slot `index` into the picked state.
    pub fn pick_mino(&mut self, index: usize) -> DelveResult<()> {
        if self.picked_mino.is_some() {
            return Err(DelveError::InvalidAction(
                "a mino is already picked".to_string(),
            ));
        }
        let slot = self
            .pick_slots
            .get_mut(index)
            .ok_or_else(|| DelveError::InvalidAction(format!("no pick slot {}", index)))?;
        let mino = slot
            .take()
            .ok_or_else(|| DelveError::InvalidAction(format!("pick slot {} is empty", index)))?;
        self.picked_mino = Some(mino);
        debug!("mino picked from slot {}", index);
        Ok(())
    }

    /// Hands the picked mino to the caller, typically to pass it on to
    /// [`place`](Self::place).
    pub fn take_picked(&mut self) -> Option<Mino> {
        self.picked_mino.take()
    }

    /// Discards the picked mino without placing it. The slot it came from
    /// stays empty until the caller respawns it.
    pub fn release_mino(&mut self) {
        if self.picked_mino.take().is_some() {
            debug!("picked mino released");
        }
    }

    /// Fills slot `index` with a freshly created mino of the given shape
    /// and resets the slot's rotation counter. The returned reference lets
    /// content-placement callers stock the fresh piece.
    pub fn spawn_mino(
        &mut self,
        index: usize,
        shape: ShapeType,
        rng: &mut StdRng,
    ) -> DelveResult<&mut Mino> {
        let slot = self
            .pick_slots
            .get_mut(index)
            .ok_or_else(|| DelveError::InvalidAction(format!("no pick slot {}", index)))?;
        self.rotate_counts[index] = 0;
        debug!("slot {} respawned with shape {:?}", index, shape);
        Ok(slot.insert(Mino::create(shape, rng)))
    }

    /// Rotates the picked mino 90° clockwise and advances the rotation
    /// counter of the slot it was picked from, keeping counter and piece
    /// orientation in lockstep. Returns the new counter value.
    pub fn rotate_picked(&mut self, slot: usize) -> DelveResult<u32> {
        if slot >= self.rotate_counts.len() {
            return Err(DelveError::InvalidAction(format!("no pick slot {}", slot)));
        }
        let mino = self
            .picked_mino
            .as_mut()
            .ok_or_else(|| DelveError::InvalidAction("no mino is picked".to_string()))?;
        mino.rotate();
        let count = (self.rotate_counts[slot] + 1) % 4;
        self.rotate_counts[slot] = count;
        Ok(count)
    }
}
