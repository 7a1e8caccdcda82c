//! Branching town layout.
//!
//! A 3x3 entrance sits at the center of an empty grid. Each further building grows
//! out of a random wall of an existing one through a straight corridor. Placement
//! is pure retry: a colliding candidate is dropped and a new branch point drawn.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cellular::{decorate_around, AutomatonParams, TerrainLayers};
use crate::error::GenerationError;
use crate::grid::{Grid, Position};
use crate::tile::{Tile, TileKind, TileSubkind};

use super::types::{Building, BuildingId, Direction, Door};

/// Tries at finding a usable wall cell on one branch building.
const WALL_PICK_ATTEMPTS: usize = 32;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TownLayoutParams {
    pub min_building_size: (usize, usize),
    pub max_building_size: (usize, usize),
    /// Inclusive corridor length range; the lower bound must be at least 3.
    pub corridor_length: (usize, usize),
    /// Margin kept around the carved area when cropping.
    pub crop_border: usize,
    pub max_placement_attempts: usize,
    /// Terrain generated around the buildings.
    pub decoration: TerrainLayers,
}

impl Default for TownLayoutParams {
    fn default() -> Self {
        Self {
            min_building_size: (6, 6),
            max_building_size: (9, 9),
            corridor_length: (3, 7),
            crop_border: 3,
            max_placement_attempts: 5_000,
            decoration: TerrainLayers {
                blocking: AutomatonParams::blocking(),
                grass: AutomatonParams::grass(),
                liquid: Some(AutomatonParams::liquid()),
                blocking_subkind: TileSubkind::Boulder,
                liquid_subkind: TileSubkind::Water,
            },
        }
    }
}

/// A generated town grid with its buildings and the deduplicated door registry.
#[derive(Clone, Debug)]
pub struct TownLayout {
    pub grid: Grid,
    pub buildings: Vec<Building>,
    pub doors: Vec<Door>,
}

impl TownLayout {
    pub fn entrance(&self) -> &Building {
        &self.buildings[0]
    }
}

/// Reject requests that can never be satisfied before any carving happens.
pub fn validate_request(
    width: usize,
    height: usize,
    building_count: usize,
    params: &TownLayoutParams,
) -> Result<(), GenerationError> {
    if width % 2 == 0 || height % 2 == 0 {
        return Err(GenerationError::EvenDimensions { width, height });
    }
    if building_count == 0 {
        return Err(GenerationError::InvalidConfig(
            "a town needs at least its entrance building".to_string(),
        ));
    }
    let limit = (width as f64 * height as f64 / 81.0 * 0.9) as usize;
    if building_count >= limit {
        return Err(GenerationError::TooManyBuildings {
            requested: building_count,
            limit,
            width,
            height,
        });
    }
    let (max_w, max_h) = params.max_building_size;
    if width <= max_w || height <= max_h {
        return Err(GenerationError::GridTooSmall {
            width,
            height,
            max_building: max_w.max(max_h),
        });
    }
    let (min_w, min_h) = params.min_building_size;
    if min_w < 4 || min_h < 4 || min_w > max_w || min_h > max_h {
        return Err(GenerationError::InvalidConfig(format!(
            "building sizes {:?}..{:?} must be ordered and at least 4 wide",
            params.min_building_size, params.max_building_size
        )));
    }
    let (min_len, max_len) = params.corridor_length;
    if min_len < 3 || min_len > max_len {
        return Err(GenerationError::InvalidConfig(format!(
            "corridor length range {:?} must start at 3 or more",
            params.corridor_length
        )));
    }
    Ok(())
}

/// Lay out a town of `names.len()` buildings; the first name is the entrance.
pub fn generate_town<R: Rng>(
    width: usize,
    height: usize,
    names: &[String],
    params: &TownLayoutParams,
    rng: &mut R,
) -> Result<TownLayout, GenerationError> {
    validate_request(width, height, names.len(), params)?;

    let mut builder = TownBuilder {
        grid: Grid::new(width, height, Tile::default())?,
        buildings: Vec::with_capacity(names.len()),
    };

    let mut entrance = Building::new(0, &names[0], (3, 3), true);
    entrance.top_left = (width / 2 - 1, height / 2 - 1);
    builder.carve_building(&entrance, false);
    builder.buildings.push(entrance);

    let mut attempts = 0;
    while builder.buildings.len() < names.len() {
        attempts += 1;
        if attempts > params.max_placement_attempts {
            return Err(GenerationError::PlacementExhausted {
                placed: builder.buildings.len(),
                requested: names.len(),
                attempts: params.max_placement_attempts,
            });
        }
        let name = &names[builder.buildings.len()];
        builder.try_branch(name, params, rng);
    }
    debug!(buildings = names.len(), attempts, "placed town buildings");

    builder.open_waypoints();
    let (grid, buildings, doors) = builder.crop(params.crop_border);
    let grid = decorate_around(&grid, &params.decoration, rng)?;

    info!(
        width = grid.width(),
        height = grid.height(),
        buildings = buildings.len(),
        doors = doors.len(),
        "town layout complete"
    );
    Ok(TownLayout { grid, buildings, doors })
}

struct TownBuilder {
    grid: Grid,
    buildings: Vec<Building>,
}

impl TownBuilder {
    fn carve_building(&mut self, building: &Building, force_floor: bool) {
        let (left, top) = building.top_left;
        let (w, h) = building.size;
        for y in top..top + h {
            for x in left..left + w {
                let edge = x == left || x == left + w - 1 || y == top || y == top + h - 1;
                let tile = if edge && !force_floor {
                    Tile::wall()
                } else {
                    Tile::new(TileSubkind::Carpet)
                };
                self.grid.set(x, y, tile);
            }
        }
    }

    fn is_void(&self, x: i32, y: i32) -> bool {
        self.grid.get_checked(x, y).map_or(false, |t| t.kind == TileKind::Void)
    }

    fn is_ground(&self, x: i32, y: i32) -> bool {
        self.grid.get_checked(x, y).map_or(false, |t| t.kind == TileKind::Ground)
    }

    /// A random wall cell of `building` whose side neighbors are not already doors and
    /// whose outward neighbor is untouched.
    fn branch_point<R: Rng>(&self, building: &Building, rng: &mut R) -> Option<(Position, Direction)> {
        for _ in 0..WALL_PICK_ATTEMPTS {
            let side = *Direction::ALL.choose(rng)?;
            let cell = *building.wall(side).choose(rng)?;
            let (x, y) = (cell.0 as i32, cell.1 as i32);
            let (dx, dy) = side.offset();
            // Lateral neighbors run along the wall.
            let lateral = [(x - dy.abs(), y - dx.abs()), (x + dy.abs(), y + dx.abs())];
            if lateral.iter().any(|&(lx, ly)| self.is_ground(lx, ly)) {
                continue;
            }
            if !self.is_void(x + dx, y + dy) {
                continue;
            }
            return Some((cell, side));
        }
        None
    }

    /// Footprint plus a one tile margin must be inside the grid and still Void.
    fn has_space(&self, left: i32, top: i32, size: (usize, usize)) -> bool {
        (top - 1..top + size.1 as i32 + 1)
            .all(|y| (left - 1..left + size.0 as i32 + 1).all(|x| self.is_void(x, y)))
    }

    /// One placement attempt. Returns whether a building was added.
    fn try_branch<R: Rng>(&mut self, name: &str, params: &TownLayoutParams, rng: &mut R) -> bool {
        let candidates: Vec<BuildingId> = self
            .buildings
            .iter()
            .filter(|b| !(b.single_connection_only && !b.connections.is_empty()))
            .map(|b| b.id)
            .collect();
        let Some(&branch_id) = candidates.choose(rng) else {
            return false;
        };
        let Some((anchor, side)) = self.branch_point(&self.buildings[branch_id], rng) else {
            return false;
        };

        let size = (
            rng.gen_range(params.min_building_size.0..=params.max_building_size.0),
            rng.gen_range(params.min_building_size.1..=params.max_building_size.1),
        );
        let length = rng.gen_range(params.corridor_length.0..=params.corridor_length.1) as i32;

        let (ax, ay) = (anchor.0 as i32, anchor.1 as i32);
        let (w, h) = (size.0 as i32, size.1 as i32);
        let (left, top) = match side {
            Direction::North => (ax - w / 2, ay - h + 1 - length),
            Direction::East => (ax + length, ay - h / 2),
            Direction::South => (ax - w / 2, ay + length),
            Direction::West => (ax - w + 1 - length, ay - h / 2),
        };

        if !self.has_space(left, top, size) {
            return false;
        }
        let (dx, dy) = side.offset();
        if !(1..length).all(|i| self.is_void(ax + dx * i, ay + dy * i)) {
            return false;
        }

        let id = self.buildings.len();
        let mut building = Building::new(id, name, size, false);
        building.top_left = (left as usize, top as usize);
        self.carve_building(&building, false);

        // Corridor from the anchor wall to the new building's wall, both ends floored.
        self.grid.set(anchor.0, anchor.1, Tile::new(TileSubkind::Carpet));
        for i in 1..length {
            self.grid
                .set((ax + dx * i) as usize, (ay + dy * i) as usize, Tile::new(TileSubkind::Path));
        }
        let far = ((ax + dx * length) as usize, (ay + dy * length) as usize);
        self.grid.set(far.0, far.1, Tile::new(TileSubkind::Carpet));

        let orientation = side.door_orientation();
        let branch = &mut self.buildings[branch_id];
        if !branch.is_waypoint() {
            branch.doors.push(Door {
                orientation,
                x: anchor.0,
                y: anchor.1,
            });
        }
        branch.connections.push(id);
        if !building.is_waypoint() {
            building.doors.push(Door {
                orientation,
                x: far.0,
                y: far.1,
            });
        }
        building.connections.push(branch_id);
        self.buildings.push(building);
        true
    }

    /// 3x3 buildings lose their walls and any doors.
    fn open_waypoints(&mut self) {
        let waypoints: Vec<Building> = self.buildings.iter().filter(|b| b.is_waypoint()).cloned().collect();
        for building in &waypoints {
            self.carve_building(building, true);
        }
        for building in self.buildings.iter_mut().filter(|b| b.is_waypoint()) {
            building.doors.clear();
        }
    }

    /// Bounding box of carved tiles plus `border`, widened by one where needed to keep
    /// both dimensions odd.
    fn crop_box(&self, border: usize) -> (usize, usize, usize, usize) {
        let (w, h) = (self.grid.width(), self.grid.height());
        let mut min = (w, h);
        let mut max = (0, 0);
        for (x, y, tile) in self.grid.tiles.iter() {
            if tile.kind != TileKind::Void {
                min = (min.0.min(x), min.1.min(y));
                max = (max.0.max(x), max.1.max(y));
            }
        }

        let fit = |lo: usize, hi: usize, len: usize| {
            let mut lo = lo.saturating_sub(border);
            let mut hi = (hi + border).min(len - 1);
            if (hi - lo + 1) % 2 == 0 {
                if hi < len - 1 {
                    hi += 1;
                } else {
                    lo -= 1;
                }
            }
            (lo, hi)
        };
        let (x0, x1) = fit(min.0, max.0, w);
        let (y0, y1) = fit(min.1, max.1, h);
        (x0, y0, x1 - x0 + 1, y1 - y0 + 1)
    }

    fn crop(self, border: usize) -> (Grid, Vec<Building>, Vec<Door>) {
        let (x0, y0, w, h) = self.crop_box(border);
        debug!(x0, y0, w, h, "cropping town");

        let grid = Grid {
            tiles: self.grid.tiles.crop(x0 as i32, y0 as i32, w, h, Tile::default()),
        };
        let mut buildings = self.buildings;
        let mut seen: HashSet<Position> = HashSet::new();
        let mut registry = Vec::new();
        for building in &mut buildings {
            building.translate(x0, y0);
            for door in &building.doors {
                if seen.insert(door.pos()) {
                    registry.push(*door);
                }
            }
        }
        (grid, buildings, registry)
    }
}
