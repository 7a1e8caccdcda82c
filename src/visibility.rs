//! Ray-cast field of view.
//!
//! Rays leave the origin every `angle_step` degrees and advance one tile length at a
//! time, rounding to the nearest tile. Coarse angles leave occasional single-tile
//! gaps at long range; that approximation is accepted.

use std::collections::HashSet;

use crate::grid::{Grid, Position};
use crate::tile::TileSubkind;
use crate::tilemap::Tilemap;

pub struct VisibilityEngine {
    sin: Vec<f64>,
    cos: Vec<f64>,
    angle_step: usize,
}

impl Default for VisibilityEngine {
    fn default() -> Self {
        Self::new(1)
    }
}

impl VisibilityEngine {
    /// Build the sine/cosine tables at one-degree resolution.
    pub fn new(angle_step: usize) -> Self {
        let (sin, cos) = (0..360)
            .map(|deg| (deg as f64).to_radians())
            .map(|rad| (rad.sin(), rad.cos()))
            .unzip();
        Self {
            sin,
            cos,
            angle_step: angle_step.clamp(1, 360),
        }
    }

    /// Tiles visible from `origin` within `radius` steps.
    ///
    /// A ray stops after the first tile that blocks the view for `blocking_view`
    /// (Void and Block by default) unless that tile is in `exemptions`.
    pub fn visible_tiles(
        &self,
        grid: &Grid,
        origin: Position,
        radius: usize,
        blocking_view: Option<&[TileSubkind]>,
        exemptions: &HashSet<Position>,
    ) -> Tilemap<bool> {
        let mut visible = Tilemap::new_with(grid.width(), grid.height(), false);
        if origin.0 >= grid.width() || origin.1 >= grid.height() {
            return visible;
        }
        visible.set(origin.0, origin.1, true);

        for deg in (0..360).step_by(self.angle_step) {
            let (dx, dy) = (self.sin[deg], self.cos[deg]);
            let (mut fx, mut fy) = (origin.0 as f64, origin.1 as f64);
            for _ in 0..radius {
                fx += dx;
                fy += dy;
                let (x, y) = (fx.round() as i32, fy.round() as i32);
                let Some(tile) = grid.get_checked(x, y) else {
                    break;
                };
                let pos = (x as usize, y as usize);
                visible.set(pos.0, pos.1, true);
                if tile.blocks_view(blocking_view) && !exemptions.contains(&pos) {
                    break;
                }
            }
        }

        visible
    }

    /// Same as [`Self::visible_tiles`], flagging every visible tile as explored
    /// when `flag_explored` is set.
    pub fn compute_visibility(
        &self,
        grid: &mut Grid,
        origin: Position,
        radius: usize,
        flag_explored: bool,
        blocking_view: Option<&[TileSubkind]>,
        exemptions: &HashSet<Position>,
    ) -> Tilemap<bool> {
        let visible = self.visible_tiles(grid, origin, radius, blocking_view, exemptions);
        if flag_explored {
            for (x, y, seen) in visible.iter() {
                if *seen {
                    grid.tiles.get_mut(x, y).explored = true;
                }
            }
        }
        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Tile;

    fn field() -> Grid {
        Grid::new(21, 21, Tile::floor()).unwrap()
    }

    #[test]
    fn test_origin_always_visible() {
        let mut grid = field();
        let engine = VisibilityEngine::default();
        let none = HashSet::new();
        let visible = engine.compute_visibility(&mut grid, (10, 10), 0, true, None, &none);
        assert!(*visible.get(10, 10));
        assert_eq!(visible.count_true(), 1);
        assert!(grid.get(10, 10).explored);
        assert!(!grid.get(11, 10).explored);
    }

    #[test]
    fn test_monotonic_in_radius() {
        let mut grid = field();
        for y in 4..9 {
            grid.set(13, y, Tile::wall());
        }
        grid.set(7, 12, Tile::new(TileSubkind::Tree));
        let engine = VisibilityEngine::default();
        let none = HashSet::new();
        let mut previous = engine.visible_tiles(&grid, (10, 10), 0, None, &none);
        for radius in 1..12 {
            let current = engine.visible_tiles(&grid, (10, 10), radius, None, &none);
            for (x, y, seen) in previous.iter() {
                if *seen {
                    assert!(*current.get(x, y), "({}, {}) lost at radius {}", x, y, radius);
                }
            }
            previous = current;
        }
    }

    #[test]
    fn test_wall_hides_tiles_behind() {
        let mut grid = field();
        for y in 0..21 {
            grid.set(13, y, Tile::wall());
        }
        let engine = VisibilityEngine::default();
        let visible = engine.visible_tiles(&grid, (10, 10), 10, None, &HashSet::new());
        assert!(*visible.get(13, 10));
        for y in 0..21 {
            for x in 14..21 {
                assert!(!*visible.get(x, y), "({}, {}) seen through the wall", x, y);
            }
        }
        assert!(*visible.get(5, 10));
    }

    #[test]
    fn test_exemption_lets_sight_through() {
        let mut grid = field();
        grid.set(12, 10, Tile::wall());
        let engine = VisibilityEngine::default();
        let blocked = engine.visible_tiles(&grid, (10, 10), 5, None, &HashSet::new());
        assert!(!*blocked.get(14, 10));
        let exempt: HashSet<Position> = [(12, 10)].into_iter().collect();
        let open = engine.visible_tiles(&grid, (10, 10), 5, None, &exempt);
        assert!(*open.get(14, 10));
    }

    #[test]
    fn test_custom_view_blocking_list() {
        let mut grid = field();
        grid.set(12, 10, Tile::new(TileSubkind::Tree));
        let engine = VisibilityEngine::default();
        let only_walls: &[TileSubkind] = &[TileSubkind::Wall];
        let visible = engine.visible_tiles(&grid, (10, 10), 5, Some(only_walls), &HashSet::new());
        assert!(*visible.get(14, 10));

        grid.set(10, 12, Tile::new(TileSubkind::Grass));
        let trees_and_grass: &[TileSubkind] = &[TileSubkind::Tree, TileSubkind::Grass];
        let visible = engine.visible_tiles(&grid, (10, 10), 5, Some(trees_and_grass), &HashSet::new());
        assert!(*visible.get(12, 10));
        assert!(!*visible.get(14, 10));
        assert!(*visible.get(10, 12));
        assert!(!*visible.get(10, 14));
        assert!(*visible.get(10, 6));
    }

    #[test]
    fn test_origin_off_grid_sees_nothing() {
        let grid = field();
        let engine = VisibilityEngine::default();
        let visible = engine.visible_tiles(&grid, (30, 4), 5, None, &HashSet::new());
        assert_eq!(visible.count_true(), 0);
    }
}
