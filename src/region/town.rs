//! Town regions built from a branching layout.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entities::Entity;
use crate::structures::{TownLayout, TownLayoutParams};

use super::{Region, RegionKind};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TownParams {
    pub layout: TownLayoutParams,
    /// Chance for each free north-wall cell of a room to hold a lamp.
    pub wall_lamp_chance: f64,
    /// Chance for a registered door to be locked.
    pub locked_door_chance: f64,
}

impl Default for TownParams {
    fn default() -> Self {
        Self {
            layout: TownLayoutParams::default(),
            wall_lamp_chance: 0.5,
            locked_door_chance: 0.0,
        }
    }
}

/// Populate a town: building markers, one door entity per registered door, then
/// wall lamps along the north wall of every room. The player arrives at the
/// entrance.
pub fn build_town_region<R: Rng>(name: &str, layout: TownLayout, params: &TownParams, rng: &mut R) -> Region {
    let TownLayout { grid, buildings, doors } = layout;
    let mut region = Region::new(name, RegionKind::Town, grid);

    for building in &buildings {
        region.spawn(Entity::building_marker(&building.name, building.id, building.center()));
    }
    for door in &doors {
        let locked = params.locked_door_chance > 0.0 && rng.gen_bool(params.locked_door_chance.min(1.0));
        if locked {
            region.spawn(Entity::locked_door(door.pos(), door.orientation));
        } else {
            region.spawn(Entity::door(door.pos(), door.orientation, true));
        }
    }

    let mut lamps = 0;
    for building in buildings.iter().filter(|b| !b.is_waypoint()) {
        for pos in building.north_wall() {
            if region.entities.at(pos).next().is_some() {
                continue;
            }
            if rng.gen_bool(params.wall_lamp_chance.clamp(0.0, 1.0)) {
                let variant = if rng.gen_bool(0.5) { 1 } else { 2 };
                region.spawn(Entity::wall_lamp(pos, variant));
                lamps += 1;
            }
        }
    }

    region.last_player_position = buildings.first().map(|entrance| entrance.center());
    info!(
        region = name,
        buildings = buildings.len(),
        doors = doors.len(),
        lamps,
        "town ready"
    );
    region.buildings = buildings;
    region.doors = doors;
    region
}
