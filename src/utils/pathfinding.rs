//! # Pathfinding
//!
//! Route and reachability queries over a field's grid snapshot.
//!
//! [`PathFinder`] is constructed once per field size and owns a single
//! reusable array of per-cell [`Node`] scratch state, reset at the start of
//! every query. Queries read the grid and never mutate it; movement between
//! two cells requires an open edge: the departing side's wall and the
//! arriving side's facing wall must both be open.

use crate::{Direction, Grid, Position};
use log::trace;
use rand::{rngs::StdRng, Rng};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Per-cell scratch state for one search query.
///
/// Not a domain entity: nodes live only inside [`PathFinder`] and carry no
/// meaning between queries.
#[derive(Debug, Clone)]
pub struct Node {
    position: Position,
    /// Path cost from the start cell; -1 while unscored.
    step: i32,
    /// Manhattan estimate to the goal.
    distance: i32,
    /// The cell this one was discovered from.
    previous: Option<Position>,
}

impl Node {
    fn new(position: Position) -> Self {
        Self {
            position,
            step: -1,
            distance: -1,
            previous: None,
        }
    }

    /// The cell this node scores.
    pub fn position(&self) -> Position {
        self.position
    }

    fn reset(&mut self) {
        self.step = -1;
        self.distance = -1;
        self.previous = None;
    }

    /// Combined score: path cost so far plus the estimate to the goal.
    fn weight(&self) -> i32 {
        self.step + self.distance
    }

    fn scored(&self) -> bool {
        self.step >= 0
    }
}

/// Frontier entry ordered so the `BinaryHeap` pops the lowest weight first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrontierEntry {
    weight: i32,
    position: Position,
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.weight.cmp(&self.weight)
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Search engine over a field grid.
///
/// # Examples
///
/// ```
/// use delve::{Field, PathFinder, Position};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let field = Field::new(7, 12, Position::new(4, 1), 3, &mut rng).unwrap();
/// let mut finder = PathFinder::new(field.width(), field.height());
///
/// let route = finder.shortest_route(Position::new(4, 1), Position::new(4, 2), field.grid());
/// assert_eq!(route.unwrap().len(), 2);
/// ```
#[derive(Debug)]
pub struct PathFinder {
    width: i32,
    height: i32,
    nodes: Vec<Node>,
}

impl PathFinder {
    /// Creates a path finder for a field of the given size.
    pub fn new(width: i32, height: i32) -> Self {
        let mut nodes = Vec::with_capacity((width * height).max(0) as usize);
        for y in 0..height {
            for x in 0..width {
                nodes.push(Node::new(Position::new(x, y)));
            }
        }
        Self {
            width,
            height,
            nodes,
        }
    }

    /// Creates a path finder sized to match `grid`.
    pub fn for_grid(grid: &Grid) -> Self {
        Self::new(grid.width(), grid.height())
    }

    /// Computes a minimum-length route from `start` to `goal`, both
    /// endpoints included, or `None` when no route exists.
    ///
    /// Best-first search with unit edge cost and the Manhattan heuristic;
    /// on this 4-connected unit-cost grid the heuristic is admissible and
    /// consistent, so the first route found is a shortest one. Ties in the
    /// frontier are broken arbitrarily. A route from a cell to itself is
    /// the single-element route `[start]`.
    pub fn shortest_route(
        &mut self,
        start: Position,
        goal: Position,
        grid: &Grid,
    ) -> Option<Vec<Position>> {
        grid.block(start)?;
        grid.block(goal)?;
        if start == goal {
            return Some(vec![start]);
        }

        self.reset_nodes();
        let start_index = self.node_index(start)?;
        self.node_index(goal)?;
        self.nodes[start_index].step = 0;
        self.nodes[start_index].distance = start.manhattan_distance(goal);
        self.nodes[start_index].previous = None;

        let mut frontier = BinaryHeap::new();
        frontier.push(FrontierEntry {
            weight: self.nodes[start_index].weight(),
            position: start,
        });

        while let Some(entry) = frontier.pop() {
            let current = entry.position;
            let Some(current_index) = self.node_index(current) else {
                continue;
            };
            let current_step = self.nodes[current_index].step;
            let Some(block) = grid.block(current) else {
                continue;
            };

            for dir in Direction::ALL {
                if block.wall(dir) {
                    continue;
                }
                let target = current + dir.delta();
                let Some(neighbor) = grid.block(target) else {
                    continue;
                };
                if neighbor.wall(dir.opposite()) {
                    continue;
                }
                let Some(target_index) = self.node_index(target) else {
                    continue;
                };
                if self.nodes[target_index].scored() {
                    continue;
                }

                let node = &mut self.nodes[target_index];
                node.step = current_step + 1;
                node.distance = target.manhattan_distance(goal);
                node.previous = Some(current);

                if target == goal {
                    let route = self.reconstruct(goal);
                    trace!(
                        "route ({}, {}) -> ({}, {}): {} cells",
                        start.x,
                        start.y,
                        goal.x,
                        goal.y,
                        route.len()
                    );
                    return Some(route);
                }
                frontier.push(FrontierEntry {
                    weight: self.nodes[target_index].weight(),
                    position: target,
                });
            }
        }

        trace!(
            "no route ({}, {}) -> ({}, {})",
            start.x,
            start.y,
            goal.x,
            goal.y
        );
        None
    }

    /// Collects every cell reachable from `start` within `max_moves`
    /// single-step moves through open edges, in discovery order.
    ///
    /// The round loop runs exactly `max_moves` times with no early
    /// termination. `start` itself, cells already collected, and cells in
    /// `excluded` (typically occupied by other actors) are skipped; an
    /// excluded cell also blocks expansion through it.
    pub fn reachable_set(
        &mut self,
        start: Position,
        max_moves: u32,
        grid: &Grid,
        excluded: &[Position],
    ) -> Vec<Position> {
        self.reset_nodes();
        let mut reachable = Vec::new();
        if grid.block(start).is_none() {
            return reachable;
        }
        let Some(start_index) = self.node_index(start) else {
            return reachable;
        };
        self.nodes[start_index].step = 0;
        self.nodes[start_index].distance = 0;
        self.nodes[start_index].previous = None;

        let mut frontier = vec![start];
        for _ in 0..max_moves {
            let mut next = Vec::new();
            for &current in &frontier {
                let Some(block) = grid.block(current) else {
                    continue;
                };
                let Some(current_index) = self.node_index(current) else {
                    continue;
                };
                let current_step = self.nodes[current_index].step;

                for dir in Direction::ALL {
                    if block.wall(dir) {
                        continue;
                    }
                    let target = current + dir.delta();
                    let Some(neighbor) = grid.block(target) else {
                        continue;
                    };
                    if neighbor.wall(dir.opposite()) {
                        continue;
                    }
                    if target == start
                        || reachable.contains(&target)
                        || excluded.contains(&target)
                    {
                        continue;
                    }
                    let Some(target_index) = self.node_index(target) else {
                        continue;
                    };

                    let node = &mut self.nodes[target_index];
                    node.step = current_step + 1;
                    node.distance = 0;
                    node.previous = Some(current);
                    reachable.push(target);
                    next.push(target);
                }
            }
            frontier = next;
        }

        trace!(
            "{} cells reachable from ({}, {}) in {} moves",
            reachable.len(),
            start.x,
            start.y,
            max_moves
        );
        reachable
    }

    /// Picks a random destination among the cells reachable from `start`
    /// within `max_moves` moves and returns the route to it, `start` first.
    ///
    /// The draw spans all but the last cell of the reachable list; a
    /// single-candidate list falls back to that candidate. Returns `None`
    /// when nothing is reachable.
    pub fn random_reachable_route(
        &mut self,
        start: Position,
        max_moves: u32,
        grid: &Grid,
        excluded: &[Position],
        rng: &mut StdRng,
    ) -> Option<Vec<Position>> {
        let reachable = self.reachable_set(start, max_moves, grid, excluded);
        if reachable.is_empty() {
            return None;
        }
        let pick = if reachable.len() == 1 {
            0
        } else {
            rng.gen_range(0..reachable.len() - 1)
        };
        Some(self.reconstruct(reachable[pick]))
    }

    /// Follows `previous` pointers from `goal` back to the start of the
    /// last query and returns the chain reversed into route order.
    fn reconstruct(&self, goal: Position) -> Vec<Position> {
        let mut route = vec![goal];
        let mut current = goal;
        while let Some(prev) = self.node_index(current).and_then(|i| self.nodes[i].previous) {
            route.push(prev);
            current = prev;
        }
        route.reverse();
        route
    }

    fn reset_nodes(&mut self) {
        for node in &mut self.nodes {
            node.reset();
        }
    }

    fn node_index(&self, pos: Position) -> Option<usize> {
        if pos.x < 0 || pos.x >= self.width || pos.y < 0 || pos.y >= self.height {
            return None;
        }
        Some((pos.y * self.width + pos.x) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Block;
    use rand::SeedableRng;

    /// Grid of the given size with every cell placed and fully open.
    fn open_grid(width: i32, height: i32) -> Grid {
        let mut grid = Grid::new(width, height);
        for y in 0..height {
            for x in 0..width {
                grid.put(Position::new(x, y), Block::new());
            }
        }
        grid
    }

    fn pos(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn test_route_to_self_is_single_cell() {
        let grid = open_grid(3, 3);
        let mut finder = PathFinder::for_grid(&grid);
        let route = finder.shortest_route(pos(1, 1), pos(1, 1), &grid);
        assert_eq!(route, Some(vec![pos(1, 1)]));
    }

    #[test]
    fn test_route_along_corridor() {
        let grid = open_grid(5, 1);
        let mut finder = PathFinder::for_grid(&grid);
        let route = finder.shortest_route(pos(0, 0), pos(4, 0), &grid).unwrap();
        assert_eq!(
            route,
            vec![pos(0, 0), pos(1, 0), pos(2, 0), pos(3, 0), pos(4, 0)]
        );
    }

    #[test]
    fn test_route_detours_around_hole() {
        let mut grid = Grid::new(3, 3);
        for y in 0..3 {
            for x in 0..3 {
                if (x, y) != (1, 1) {
                    grid.put(pos(x, y), Block::new());
                }
            }
        }
        let mut finder = PathFinder::for_grid(&grid);
        let route = finder.shortest_route(pos(0, 0), pos(2, 2), &grid).unwrap();
        assert_eq!(route.len(), 5, "detour around the missing center");
        assert_eq!(route[0], pos(0, 0));
        assert_eq!(route[4], pos(2, 2));
    }

    #[test]
    fn test_enclosed_goal_has_no_route() {
        let mut grid = open_grid(3, 3);
        let mut sealed = Block::new();
        sealed.walls = [true; 4];
        grid.put(pos(1, 1), sealed);

        let mut finder = PathFinder::for_grid(&grid);
        assert_eq!(finder.shortest_route(pos(0, 0), pos(1, 1), &grid), None);
    }

    #[test]
    fn test_one_closed_edge_blocks_the_pair() {
        let mut grid = open_grid(2, 1);
        // Only the arriving side is walled; the edge still counts as closed.
        let mut right = Block::new();
        right.set_wall(Direction::Left, true);
        grid.put(pos(1, 0), right);

        let mut finder = PathFinder::for_grid(&grid);
        assert_eq!(finder.shortest_route(pos(0, 0), pos(1, 0), &grid), None);
        assert!(finder.reachable_set(pos(0, 0), 1, &grid, &[]).is_empty());
    }

    #[test]
    fn test_route_with_absent_endpoint_is_none() {
        let grid = open_grid(3, 3);
        let mut finder = PathFinder::for_grid(&grid);
        assert_eq!(finder.shortest_route(pos(0, 0), pos(5, 5), &grid), None);
        assert_eq!(finder.shortest_route(pos(-1, 0), pos(1, 1), &grid), None);
    }

    #[test]
    fn test_scratch_nodes_reset_between_queries() {
        let grid = open_grid(5, 1);
        let mut finder = PathFinder::for_grid(&grid);
        let first = finder.shortest_route(pos(0, 0), pos(4, 0), &grid);
        assert_eq!(finder.shortest_route(pos(4, 0), pos(0, 0), &grid).map(|r| r.len()), Some(5));
        assert_eq!(finder.shortest_route(pos(0, 0), pos(4, 0), &grid), first);
    }

    #[test]
    fn test_reachable_zero_moves_is_empty() {
        let grid = open_grid(3, 3);
        let mut finder = PathFinder::for_grid(&grid);
        assert!(finder.reachable_set(pos(1, 1), 0, &grid, &[]).is_empty());
    }

    #[test]
    fn test_reachable_one_move_is_orthogonal_neighbors() {
        let grid = open_grid(3, 3);
        let mut finder = PathFinder::for_grid(&grid);

        let reachable = finder.reachable_set(pos(1, 1), 1, &grid, &[]);
        assert_eq!(reachable.len(), 4);
        for neighbor in pos(1, 1).neighbor_positions() {
            assert!(reachable.contains(&neighbor));
        }

        // In a corner only two neighbors exist.
        let reachable = finder.reachable_set(pos(0, 0), 1, &grid, &[]);
        assert_eq!(reachable.len(), 2);
    }

    #[test]
    fn test_reachable_never_includes_start() {
        let grid = open_grid(3, 3);
        let mut finder = PathFinder::for_grid(&grid);
        let reachable = finder.reachable_set(pos(1, 1), 3, &grid, &[]);
        assert!(!reachable.contains(&pos(1, 1)));
        assert_eq!(reachable.len(), 8, "everything else is within 3 moves");
    }

    #[test]
    fn test_excluded_cell_blocks_expansion_through_it() {
        let grid = open_grid(5, 1);
        let mut finder = PathFinder::for_grid(&grid);
        let reachable = finder.reachable_set(pos(0, 0), 4, &grid, &[pos(2, 0)]);
        assert_eq!(reachable, vec![pos(1, 0)], "corridor blocked at (2, 0)");
    }

    #[test]
    fn test_random_route_starts_at_start_and_follows_edges() {
        let grid = open_grid(4, 1);
        let mut finder = PathFinder::for_grid(&grid);
        let mut rng = StdRng::seed_from_u64(123);

        for _ in 0..16 {
            let route = finder
                .random_reachable_route(pos(0, 0), 3, &grid, &[], &mut rng)
                .unwrap();
            assert_eq!(route[0], pos(0, 0));
            assert!(route.len() >= 2);
            for pair in route.windows(2) {
                assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
            }
        }
    }

    #[test]
    fn test_random_route_skips_last_discovered_cell() {
        // Corridor: discovery order is (1,0), (2,0), (3,0); the draw spans
        // all but (3,0).
        let grid = open_grid(4, 1);
        let mut finder = PathFinder::for_grid(&grid);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..32 {
            let route = finder
                .random_reachable_route(pos(0, 0), 3, &grid, &[], &mut rng)
                .unwrap();
            let destination = *route.last().unwrap();
            assert_ne!(destination, pos(3, 0));
        }
    }

    #[test]
    fn test_random_route_single_candidate_fallback() {
        let grid = open_grid(2, 1);
        let mut finder = PathFinder::for_grid(&grid);
        let mut rng = StdRng::seed_from_u64(5);

        let route = finder
            .random_reachable_route(pos(0, 0), 1, &grid, &[], &mut rng)
            .unwrap();
        assert_eq!(route, vec![pos(0, 0), pos(1, 0)]);
    }

    #[test]
    fn test_random_route_nothing_reachable() {
        let mut grid = Grid::new(3, 1);
        grid.put(pos(0, 0), Block::new());
        let mut finder = PathFinder::for_grid(&grid);
        let mut rng = StdRng::seed_from_u64(5);
        assert!(finder
            .random_reachable_route(pos(0, 0), 2, &grid, &[], &mut rng)
            .is_none());
    }
}
