//! Region grid: typed tile storage, auto-tile weights and spatial queries.
//!
//! Every query that can avoid occupied positions takes the caller's occupied set;
//! the grid itself never tracks entities.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::tile::{Tile, TileKind, TileSubkind};
use crate::tilemap::Tilemap;

/// Tile coordinate within a grid.
pub type Position = (usize, usize);

/// Offsets of the 8 surrounding cells.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Upper bound on blind sampling before `random_tile` falls back to enumeration.
const RANDOM_TILE_SAMPLES: usize = 1024;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub tiles: Tilemap<Tile>,
}

impl Grid {
    /// Create a grid filled with `tile`. Both dimensions must be odd.
    pub fn new(width: usize, height: usize, tile: Tile) -> Result<Self, GenerationError> {
        if width % 2 == 0 || height % 2 == 0 {
            return Err(GenerationError::EvenDimensions { width, height });
        }
        Ok(Self {
            tiles: Tilemap::new_with(width, height, tile),
        })
    }

    pub fn width(&self) -> usize {
        self.tiles.width
    }

    pub fn height(&self) -> usize {
        self.tiles.height
    }

    pub fn get(&self, x: usize, y: usize) -> &Tile {
        self.tiles.get(x, y)
    }

    pub fn get_checked(&self, x: i32, y: i32) -> Option<&Tile> {
        self.tiles.get_checked(x, y)
    }

    pub fn set(&mut self, x: usize, y: usize, tile: Tile) {
        self.tiles.set(x, y, tile);
    }

    pub fn set_subkind(&mut self, x: usize, y: usize, subkind: TileSubkind) {
        let tile = self.tiles.get_mut(x, y);
        tile.kind = subkind.kind();
        tile.subkind = subkind;
    }

    pub fn count(&self, kind: TileKind) -> usize {
        self.tiles.iter().filter(|(_, _, t)| t.kind == kind).count()
    }

    fn matches(tile: &Tile, kinds: &[TileKind], subkinds: Option<&[TileSubkind]>) -> bool {
        kinds.contains(&tile.kind) && subkinds.map_or(true, |s| s.contains(&tile.subkind))
    }

    /// Auto-tile bitmask: 1 north, 8 west, 4 south, 2 east.
    ///
    /// A bit is set when that neighbor matches or lies outside the grid. Edge tiles
    /// then drop the outward bit for combinations the tileset cannot draw.
    pub fn weight(&self, x: usize, y: usize, kinds: &[TileKind], subkinds: Option<&[TileSubkind]>) -> u8 {
        let (w, h) = (self.width(), self.height());
        let hit = |nx: usize, ny: usize| Self::matches(self.get(nx, ny), kinds, subkinds);

        let mut weight = 0u8;
        if y == 0 || hit(x, y - 1) {
            weight += 1;
        }
        if x == 0 || hit(x - 1, y) {
            weight += 8;
        }
        if y == h - 1 || hit(x, y + 1) {
            weight += 4;
        }
        if x == w - 1 || hit(x + 1, y) {
            weight += 2;
        }

        if x == 0 {
            if matches!(weight, 11 | 13 | 14 | 15) {
                weight -= 8;
            }
        } else if x == w - 1 {
            if matches!(weight, 7 | 11 | 14 | 15) {
                weight -= 2;
            }
        } else if y == h - 1 && matches!(weight, 7 | 13 | 14 | 15) {
            weight -= 4;
        }

        weight
    }

    /// A random free tile of `kind`, or `None` if the grid has none.
    pub fn random_tile<R: Rng>(
        &self,
        kind: TileKind,
        occupied: &HashSet<Position>,
        rng: &mut R,
    ) -> Option<Position> {
        for _ in 0..RANDOM_TILE_SAMPLES {
            let x = rng.gen_range(0..self.width());
            let y = rng.gen_range(0..self.height());
            if self.get(x, y).kind == kind && !occupied.contains(&(x, y)) {
                return Some((x, y));
            }
        }
        // Sparse grids: pick among the exhaustive list instead of sampling forever.
        self.all_tiles(&[kind], occupied, None::<&mut R>)
            .choose(rng)
            .copied()
    }

    /// Every free tile whose kind is in `kinds`, row-major, shuffled when an rng is given.
    pub fn all_tiles<R: Rng>(
        &self,
        kinds: &[TileKind],
        occupied: &HashSet<Position>,
        rng: Option<&mut R>,
    ) -> Vec<Position> {
        let mut listing: Vec<Position> = self
            .tiles
            .iter()
            .filter(|(x, y, t)| kinds.contains(&t.kind) && !occupied.contains(&(*x, *y)))
            .map(|(x, y, _)| (x, y))
            .collect();
        if let Some(rng) = rng {
            listing.shuffle(rng);
        }
        listing
    }

    /// Free tiles of `kind` with at least `surround_count` free neighbors of the same kind.
    /// Stops after `limit` results when given.
    pub fn all_isolated_tiles<R: Rng>(
        &self,
        kind: TileKind,
        occupied: &HashSet<Position>,
        surround_count: usize,
        limit: Option<usize>,
        rng: Option<&mut R>,
    ) -> Vec<Position> {
        let mut result = Vec::new();
        for (x, y) in self.all_tiles(&[kind], occupied, None::<&mut R>) {
            let surround = self
                .tiles
                .neighbors_8(x, y)
                .into_iter()
                .filter(|&(nx, ny)| self.get(nx, ny).kind == kind && !occupied.contains(&(nx, ny)))
                .count();
            if surround >= surround_count {
                result.push((x, y));
                if limit.map_or(false, |l| result.len() >= l) {
                    break;
                }
            }
        }
        if let Some(rng) = rng {
            result.shuffle(rng);
        }
        result
    }

    /// A random free neighbor of `reference` with the given kind; `reference` itself if none.
    pub fn close_available_tile<R: Rng>(
        &self,
        reference: Position,
        kind: TileKind,
        occupied: &HashSet<Position>,
        rng: &mut R,
    ) -> Position {
        let mut delta = NEIGHBOR_OFFSETS;
        delta.shuffle(rng);
        for (dx, dy) in delta {
            let (x, y) = (reference.0 as i32 + dx, reference.1 as i32 + dy);
            if let Some(tile) = self.get_checked(x, y) {
                let pos = (x as usize, y as usize);
                if tile.kind == kind && !occupied.contains(&pos) {
                    return pos;
                }
            }
        }
        reference
    }

    /// Turn Block tiles fully enclosed by Block, Void or the grid edge into `replacement`
    /// (Void by default). Returns how many tiles changed.
    pub fn remove_extra_blocks(&mut self, replacement: Option<TileSubkind>) -> usize {
        let enclosed: Vec<Position> = self
            .tiles
            .iter()
            .filter(|(_, _, t)| t.kind == TileKind::Block)
            .filter(|&(x, y, _)| {
                NEIGHBOR_OFFSETS.iter().all(|&(dx, dy)| {
                    self.get_checked(x as i32 + dx, y as i32 + dy)
                        .map_or(true, |t| matches!(t.kind, TileKind::Block | TileKind::Void))
                })
            })
            .map(|(x, y, _)| (x, y))
            .collect();

        for &(x, y) in &enclosed {
            self.set_subkind(x, y, replacement.unwrap_or(TileSubkind::Void));
        }
        enclosed.len()
    }
}
