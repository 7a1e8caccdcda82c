//! Flood-fill reachability check used to accept or reject generated grids.

use std::collections::{HashSet, VecDeque};

use rand::Rng;

use crate::grid::{Grid, Position};
use crate::tile::TileKind;

/// Which neighbors count as touching.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Adjacency {
    Four,
    Eight,
}

/// Collect every tile of `kind` reachable from `start`.
pub fn flood_fill(grid: &Grid, start: Position, kind: TileKind, adjacency: Adjacency) -> HashSet<Position> {
    let mut flooded = HashSet::new();
    if grid.get(start.0, start.1).kind != kind {
        return flooded;
    }

    let mut queue = VecDeque::new();
    flooded.insert(start);
    queue.push_back(start);

    while let Some((x, y)) = queue.pop_front() {
        let neighbors = match adjacency {
            Adjacency::Four => grid.tiles.neighbors(x, y),
            Adjacency::Eight => grid.tiles.neighbors_8(x, y),
        };
        for (nx, ny) in neighbors {
            if grid.get(nx, ny).kind == kind && flooded.insert((nx, ny)) {
                queue.push_back((nx, ny));
            }
        }
    }

    flooded
}

/// True when all tiles of `kind` form a single 8-connected component.
/// A grid without any tile of `kind` is not considered connected.
pub fn is_connected<R: Rng>(grid: &Grid, kind: TileKind, rng: &mut R) -> bool {
    let Some(start) = grid.random_tile(kind, &HashSet::new(), rng) else {
        return false;
    };
    flood_fill(grid, start, kind, Adjacency::Eight).len() == grid.count(kind)
}

/// The biggest component of `kind` tiles; ties go to the one found first in row order.
pub fn largest_component(grid: &Grid, kind: TileKind, adjacency: Adjacency) -> HashSet<Position> {
    let mut seen: HashSet<Position> = HashSet::new();
    let mut best = HashSet::new();
    for (x, y, tile) in grid.tiles.iter() {
        if tile.kind != kind || seen.contains(&(x, y)) {
            continue;
        }
        let component = flood_fill(grid, (x, y), kind, adjacency);
        seen.extend(component.iter().copied());
        if component.len() > best.len() {
            best = component;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Tile;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_single_region_connected() {
        let mut grid = Grid::new(7, 7, Tile::wall()).unwrap();
        for y in 1..6 {
            for x in 1..6 {
                grid.set(x, y, Tile::floor());
            }
        }
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(is_connected(&grid, TileKind::Ground, &mut rng));
    }

    #[test]
    fn test_diagonal_touch_counts() {
        let mut grid = Grid::new(5, 5, Tile::wall()).unwrap();
        grid.set(1, 1, Tile::floor());
        grid.set(2, 2, Tile::floor());
        grid.set(3, 3, Tile::floor());
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assert!(is_connected(&grid, TileKind::Ground, &mut rng));
    }

    #[test]
    fn test_split_regions_rejected() {
        let mut grid = Grid::new(7, 5, Tile::wall()).unwrap();
        grid.set(1, 2, Tile::floor());
        grid.set(5, 2, Tile::floor());
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(!is_connected(&grid, TileKind::Ground, &mut rng));
        assert_eq!(flood_fill(&grid, (1, 2), TileKind::Ground, Adjacency::Eight).len(), 1);
    }

    #[test]
    fn test_largest_component_four_way() {
        let mut grid = Grid::new(9, 5, Tile::wall()).unwrap();
        // Diagonal pair: one 8-component, two 4-components.
        grid.set(1, 1, Tile::floor());
        grid.set(2, 2, Tile::floor());
        for x in 4..8 {
            grid.set(x, 2, Tile::floor());
        }
        let four = largest_component(&grid, TileKind::Ground, Adjacency::Four);
        assert_eq!(four.len(), 4);
        assert!(four.contains(&(7, 2)));
        let eight = flood_fill(&grid, (1, 1), TileKind::Ground, Adjacency::Eight);
        assert_eq!(eight.len(), 2);
    }

    #[test]
    fn test_no_tiles_not_connected() {
        let grid = Grid::new(5, 5, Tile::wall()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        assert!(!is_connected(&grid, TileKind::Ground, &mut rng));
    }
}
