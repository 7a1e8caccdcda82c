//! Wilderness regions: automaton terrain accepted by the connectivity gate, with
//! settlements anchored on open ground and joined by roads.

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cellular::{compose_terrain, AutomatonParams, TerrainLayers};
use crate::connectivity::{is_connected, largest_component, Adjacency};
use crate::entities::Entity;
use crate::error::GenerationError;
use crate::grid::{Grid, Position};
use crate::pathfinding::PathFinder;
use crate::tile::{TileKind, TileSubkind};

use super::{Region, RegionKind, Road, Settlement};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WildernessParams {
    pub layers: TerrainLayers,
    /// Candidate grids generated before giving up on connectivity.
    pub max_attempts: usize,
    pub wanderers: usize,
    pub wanderer_speed: u64,
    /// Clear tree cores nobody can ever see or reach.
    pub prune_enclosed_blocks: bool,
}

impl Default for WildernessParams {
    fn default() -> Self {
        Self {
            layers: TerrainLayers::default(),
            max_attempts: 500,
            wanderers: 20,
            wanderer_speed: 10,
            prune_enclosed_blocks: true,
        }
    }
}

/// An accepted wilderness grid with its settlement anchors and roads.
#[derive(Clone, Debug)]
pub struct WildernessLayout {
    pub grid: Grid,
    /// One anchor per settlement, in request order.
    pub anchors: Vec<Position>,
    pub roads: Vec<Road>,
}

/// Generate terrain until it passes the connectivity gate, then anchor the
/// settlements and carve a road between every pair of them.
pub fn generate_wilderness<R: Rng>(
    name: &str,
    width: usize,
    height: usize,
    settlements: &[String],
    with_liquid: bool,
    params: &WildernessParams,
    rng: &mut R,
) -> Result<WildernessLayout, GenerationError> {
    let mut layers = params.layers.clone();
    if !with_liquid {
        layers.liquid = None;
    } else if layers.liquid.is_none() {
        layers.liquid = Some(AutomatonParams::liquid());
    }

    let mut accepted = None;
    for attempt in 1..=params.max_attempts {
        let mut grid = compose_terrain(width, height, &layers, rng)?;
        if params.prune_enclosed_blocks {
            grid.remove_extra_blocks(None);
        }
        if is_connected(&grid, TileKind::Ground, rng) {
            debug!(region = name, attempt, "wilderness accepted");
            accepted = Some(grid);
            break;
        }
        debug!(region = name, attempt, "wilderness rejected: ground not connected");
    }
    let Some(mut grid) = accepted else {
        return Err(GenerationError::ConnectivityExhausted {
            region: name.to_string(),
            attempts: params.max_attempts,
        });
    };

    // Roads walk in four directions, so anchors share one 4-connected component.
    let reachable = largest_component(&grid, TileKind::Ground, Adjacency::Four);
    let candidates: Vec<Position> = grid
        .all_tiles(&[TileKind::Ground], &HashSet::new(), Some(&mut *rng))
        .into_iter()
        .filter(|pos| reachable.contains(pos))
        .collect();
    if candidates.len() < settlements.len() {
        return Err(GenerationError::NotEnoughGround {
            region: name.to_string(),
            available: candidates.len(),
            required: settlements.len(),
        });
    }
    let anchors: Vec<Position> = candidates[..settlements.len()].to_vec();

    let mut roads = Vec::new();
    for i in 0..anchors.len() {
        for j in i + 1..anchors.len() {
            let Some(path) = PathFinder::new(&grid).find_path(anchors[i], anchors[j]) else {
                warn!(from = %settlements[i], to = %settlements[j], "no road between settlements");
                continue;
            };
            let tiles: Vec<Position> = path.positions().collect();
            for &(x, y) in &tiles {
                grid.set_subkind(x, y, TileSubkind::Path);
            }
            debug!(from = %settlements[i], to = %settlements[j], length = tiles.len(), "carved road");
            roads.push(Road {
                from: settlements[i].clone(),
                to: settlements[j].clone(),
                tiles,
            });
        }
    }

    Ok(WildernessLayout { grid, anchors, roads })
}

/// Turn a layout into a region: settlement markers on the anchors, then
/// wandering townsfolk on free ground.
pub fn build_wilderness_region<R: Rng>(
    name: &str,
    layout: WildernessLayout,
    settlements: &[String],
    params: &WildernessParams,
    rng: &mut R,
) -> Region {
    let WildernessLayout { grid, anchors, roads } = layout;
    let mut region = Region::new(name, RegionKind::Wilderness, grid);

    for (town, &anchor) in settlements.iter().zip(&anchors) {
        let marker = region.spawn(Entity::settlement_marker(town, anchor));
        region.settlements.push(Settlement {
            town: town.clone(),
            anchor,
            marker,
        });
    }
    region.roads = roads;

    let mut free = region
        .grid
        .all_tiles(&[TileKind::Ground], &region.occupied(), Some(&mut *rng));
    for i in 0..params.wanderers {
        let Some(pos) = free.pop() else {
            warn!(region = name, placed = i, "ran out of ground for wanderers");
            break;
        };
        region.spawn(Entity::wanderer(&format!("Friendly {}", i), pos, params.wanderer_speed));
    }

    info!(
        region = name,
        settlements = region.settlements.len(),
        roads = region.roads.len(),
        entities = region.entities.len(),
        "wilderness ready"
    );
    region
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EntityKind;
    use crate::grid::NEIGHBOR_OFFSETS;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn towns(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Town {}", i)).collect()
    }

    #[test]
    fn test_three_settlements_with_liquid() {
        let names = towns(3);
        let params = WildernessParams::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let layout = generate_wilderness("Wild", 81, 81, &names, true, &params, &mut rng).unwrap();

        let mut check = ChaCha8Rng::seed_from_u64(0);
        assert!(is_connected(&layout.grid, TileKind::Ground, &mut check));
        assert_eq!(layout.anchors.len(), 3);
        for &(x, y) in &layout.anchors {
            assert_eq!(layout.grid.get(x, y).kind, TileKind::Ground);
        }
        let finder = PathFinder::new(&layout.grid);
        for i in 0..3 {
            for j in i + 1..3 {
                assert!(finder.find_path(layout.anchors[i], layout.anchors[j]).is_some());
            }
        }
        assert_eq!(layout.roads.len(), 3);
        for road in &layout.roads {
            for &(x, y) in &road.tiles {
                assert_eq!(layout.grid.get(x, y).subkind, TileSubkind::Path);
            }
        }
    }

    #[test]
    fn test_without_liquid_has_no_water() {
        let params = WildernessParams::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let layout = generate_wilderness("Dry", 41, 41, &towns(2), false, &params, &mut rng).unwrap();
        assert_eq!(layout.grid.count(TileKind::Liquid), 0);
    }

    #[test]
    fn test_connectivity_exhausted() {
        let mut params = WildernessParams::default();
        params.max_attempts = 3;
        params.layers.blocking = AutomatonParams {
            initial_noise_percent: 100,
            rules: Vec::new(),
            empty_center: false,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = generate_wilderness("Stone", 21, 21, &towns(1), false, &params, &mut rng).unwrap_err();
        assert!(matches!(err, GenerationError::ConnectivityExhausted { attempts: 3, .. }));
    }

    #[test]
    fn test_region_has_markers_and_wanderers() {
        let names = towns(2);
        let params = WildernessParams {
            wanderers: 5,
            ..WildernessParams::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let layout = generate_wilderness("Wild", 41, 41, &names, true, &params, &mut rng).unwrap();
        let anchors = layout.anchors.clone();
        let mut region = build_wilderness_region("Wild", layout, &names, &params, &mut rng);

        assert_eq!(region.settlements.len(), 2);
        for (settlement, anchor) in region.settlements.iter().zip(&anchors) {
            assert_eq!(settlement.anchor, *anchor);
            let marker = region.entities.get(settlement.marker).unwrap();
            assert_eq!(
                marker.kind,
                EntityKind::SettlementMarker {
                    town: settlement.town.clone()
                }
            );
        }
        let wanderers: Vec<Position> = region
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Wanderer)
            .map(|e| e.pos)
            .collect();
        assert_eq!(wanderers.len(), 5);
        let unique: HashSet<Position> = wanderers.iter().copied().collect();
        assert_eq!(unique.len(), 5);
        assert_eq!(region.scheduler().len(), 5);
    }

    #[test]
    fn test_same_seed_same_wilderness() {
        let names = towns(3);
        let params = WildernessParams::default();
        let first = generate_wilderness("Wild", 61, 61, &names, true, &params, &mut ChaCha8Rng::seed_from_u64(21)).unwrap();
        let second = generate_wilderness("Wild", 61, 61, &names, true, &params, &mut ChaCha8Rng::seed_from_u64(21)).unwrap();
        assert_eq!(first.grid.tiles, second.grid.tiles);
        assert_eq!(first.anchors, second.anchors);
        assert_eq!(first.roads, second.roads);
    }

    #[test]
    fn test_enclosed_blocks_pruned_by_default() {
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let layout = generate_wilderness("Wild", 61, 61, &towns(2), true, &WildernessParams::default(), &mut rng).unwrap();
        let grid = &layout.grid;
        assert!(grid.count(TileKind::Void) > 0);
        for (x, y, tile) in grid.tiles.iter() {
            if tile.kind != TileKind::Block {
                continue;
            }
            let exposed = NEIGHBOR_OFFSETS.iter().any(|&(dx, dy)| {
                grid.get_checked(x as i32 + dx, y as i32 + dy)
                    .map_or(false, |t| !matches!(t.kind, TileKind::Block | TileKind::Void))
            });
            assert!(exposed, "block at ({}, {}) is enclosed", x, y);
        }
    }
}
