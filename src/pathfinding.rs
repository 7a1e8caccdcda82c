//! A* search over a region grid.
//!
//! Unit step cost, Manhattan heuristic, 4-directional moves. The open list is a
//! plain vector scanned for the lowest estimate, which is fast enough at region sizes.

use std::collections::{HashMap, HashSet};

use crate::grid::{Grid, Position};
use crate::tile::TileKind;

/// A search node. `parent` indexes the node arena of the search that built it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathNode {
    pub location: Position,
    /// Steps from the start.
    pub cost: u32,
    /// Linear grid index, `y * width + x`.
    pub index: usize,
    pub parent: Option<usize>,
}

/// Ordered nodes from the first step after the start up to and including the goal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    pub nodes: Vec<PathNode>,
    pub cost: u32,
}

impl Path {
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.nodes.iter().map(|n| n.location)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

pub struct PathFinder<'a> {
    grid: &'a Grid,
    passable: Vec<TileKind>,
}

impl<'a> PathFinder<'a> {
    /// Ground tiles are passable.
    pub fn new(grid: &'a Grid) -> Self {
        Self::with_passable(grid, &[TileKind::Ground])
    }

    pub fn with_passable(grid: &'a Grid, passable: &[TileKind]) -> Self {
        Self {
            grid,
            passable: passable.to_vec(),
        }
    }

    fn is_passable(&self, (x, y): Position) -> bool {
        self.passable.contains(&self.grid.get(x, y).kind)
    }

    fn on_grid(&self, (x, y): Position) -> bool {
        x < self.grid.width() && y < self.grid.height()
    }

    fn heuristic(from: Position, to: Position) -> u32 {
        (from.0.abs_diff(to.0) + from.1.abs_diff(to.1)) as u32
    }

    /// Shortest path from `from` to `to`, or `None` if the goal is impassable or
    /// cannot be reached. Positions off the grid never have a path.
    pub fn find_path(&self, from: Position, to: Position) -> Option<Path> {
        let tiles = &self.grid.tiles;
        if !self.on_grid(from) || !self.on_grid(to) {
            return None;
        }
        if from == to {
            return Some(Path {
                nodes: Vec::new(),
                cost: 0,
            });
        }

        let mut arena = vec![PathNode {
            location: from,
            cost: 0,
            index: tiles.index(from.0, from.1),
            parent: None,
        }];
        let mut open: Vec<usize> = vec![0];
        let mut open_by_index: HashMap<usize, usize> = HashMap::new();
        let mut closed: HashSet<usize> = HashSet::new();
        open_by_index.insert(arena[0].index, 0);

        while !open.is_empty() {
            let best = open
                .iter()
                .enumerate()
                .min_by_key(|(_, node)| {
                    let n = &arena[**node];
                    n.cost + Self::heuristic(n.location, to)
                })
                .map(|(slot, _)| slot)?;
            let current = open.remove(best);
            let node = arena[current];
            open_by_index.remove(&node.index);
            closed.insert(node.index);

            for (nx, ny) in tiles.neighbors(node.location.0, node.location.1) {
                if !self.is_passable((nx, ny)) {
                    continue;
                }
                let index = tiles.index(nx, ny);
                let cost = node.cost + 1;

                if (nx, ny) == to {
                    arena.push(PathNode {
                        location: to,
                        cost,
                        index,
                        parent: Some(current),
                    });
                    return Some(Self::trace(&arena, arena.len() - 1));
                }
                if closed.contains(&index) {
                    continue;
                }
                match open_by_index.get(&index) {
                    Some(&existing) => {
                        if cost < arena[existing].cost {
                            arena[existing].cost = cost;
                            arena[existing].parent = Some(current);
                        }
                    }
                    None => {
                        arena.push(PathNode {
                            location: (nx, ny),
                            cost,
                            index,
                            parent: Some(current),
                        });
                        let slot = arena.len() - 1;
                        open.push(slot);
                        open_by_index.insert(index, slot);
                    }
                }
            }
        }

        None
    }

    /// Walk parents back from `goal`, dropping the start node.
    fn trace(arena: &[PathNode], goal: usize) -> Path {
        let cost = arena[goal].cost;
        let mut nodes = Vec::new();
        let mut cursor = Some(goal);
        while let Some(i) = cursor {
            let node = arena[i];
            if node.parent.is_none() {
                break;
            }
            nodes.push(node);
            cursor = node.parent;
        }
        nodes.reverse();
        Path { nodes, cost }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{Tile, TileSubkind};

    fn open_field(width: usize, height: usize) -> Grid {
        Grid::new(width, height, Tile::floor()).unwrap()
    }

    #[test]
    fn test_straight_corridor_is_manhattan() {
        let grid = open_field(15, 3);
        let path = PathFinder::new(&grid).find_path((1, 1), (12, 1)).unwrap();
        assert_eq!(path.cost, 11);
        assert_eq!(path.len(), 11);
        assert_eq!(path.nodes.last().unwrap().location, (12, 1));
        assert!(path.positions().all(|p| p != (1, 1)));
    }

    #[test]
    fn test_open_field_manhattan_and_contiguous() {
        let grid = open_field(21, 21);
        let from = (2, 3);
        let to = (17, 14);
        let path = PathFinder::new(&grid).find_path(from, to).unwrap();
        assert_eq!(path.cost, 15 + 11);
        let mut prev = from;
        for p in path.positions() {
            assert_eq!(prev.0.abs_diff(p.0) + prev.1.abs_diff(p.1), 1);
            prev = p;
        }
    }

    #[test]
    fn test_same_endpoints() {
        let grid = open_field(5, 5);
        let path = PathFinder::new(&grid).find_path((2, 2), (2, 2)).unwrap();
        assert!(path.is_empty());
        assert_eq!(path.cost, 0);
    }

    #[test]
    fn test_off_grid_endpoints() {
        let grid = open_field(5, 5);
        let finder = PathFinder::new(&grid);
        assert!(finder.find_path((1, 1), (9, 1)).is_none());
        assert!(finder.find_path((1, 5), (1, 1)).is_none());
        assert!(finder.find_path((7, 7), (7, 7)).is_none());
    }

    #[test]
    fn test_walled_in_target_unreachable() {
        let mut grid = open_field(9, 9);
        for (x, y) in [(5, 4), (7, 4), (6, 3), (6, 5)] {
            grid.set(x, y, Tile::wall());
        }
        assert!(PathFinder::new(&grid).find_path((1, 1), (6, 4)).is_none());
        grid.set(1, 7, Tile::wall());
        assert!(PathFinder::new(&grid).find_path((1, 1), (1, 7)).is_none());
    }

    #[test]
    fn test_obstacle_never_decreases_cost() {
        let mut grid = open_field(15, 15);
        let finder_cost = |g: &Grid| PathFinder::new(g).find_path((1, 7), (13, 7)).map(|p| p.cost);
        let base = finder_cost(&grid).unwrap();
        for y in 3..12 {
            grid.set(7, y, Tile::wall());
        }
        let blocked = finder_cost(&grid).unwrap();
        assert!(blocked >= base);
        assert_eq!(base, 12);
        // Around the wall: 12 across plus 2 * 5 detour rows.
        assert_eq!(blocked, 22);
    }

    #[test]
    fn test_liquid_passable_when_allowed() {
        let mut grid = open_field(7, 3);
        for y in 0..3 {
            grid.set(3, y, Tile::new(TileSubkind::Water));
        }
        assert!(PathFinder::new(&grid).find_path((0, 1), (6, 1)).is_none());
        let finder = PathFinder::with_passable(&grid, &[TileKind::Ground, TileKind::Liquid]);
        assert_eq!(finder.find_path((0, 1), (6, 1)).unwrap().cost, 6);
    }
}
