//! World context module
//!
//! Owns the region repository and the process-wide scheduler, and wires the
//! player through regions: building the configured world, entering settlements
//! and playing turns.

use std::collections::HashSet;

use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::{GeneratorConfig, PlayerConfig, WorldConfig};
use crate::entities::{ActionEvent, Entity, EntityId, EntityKind, MoveOutcome};
use crate::error::GenerationError;
use crate::region::{Region, RegionKind, RegionParams, RegionRepository};
use crate::scheduler::TurnScheduler;
use crate::seeds::WorldSeeds;
use crate::tile::TileKind;
use crate::tilemap::Tilemap;
use crate::visibility::VisibilityEngine;

/// Ticks between two wall lamp flickers.
pub const LAMP_FLICKER_TICKS: u64 = 20;

/// Timers run by the process-wide scheduler, independent of any region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorldTimer {
    LampFlicker,
}

pub struct GameContext {
    pub repository: RegionRepository,
    pub global_scheduler: TurnScheduler<WorldTimer>,
    pub visibility: VisibilityEngine,
    pub player: PlayerConfig,
    rng: ChaCha8Rng,
    current_region: Option<String>,
}

impl GameContext {
    pub fn new(config: &GeneratorConfig, seed: u64) -> Self {
        let seeds = WorldSeeds::from_master(seed);
        let mut global_scheduler = TurnScheduler::new();
        global_scheduler.schedule_turn(LAMP_FLICKER_TICKS, WorldTimer::LampFlicker);
        Self {
            repository: RegionRepository::with_params(seeds, config.wilderness.clone(), config.town.clone()),
            global_scheduler,
            visibility: VisibilityEngine::new(config.visibility.angle_step),
            player: config.player.clone(),
            rng: seeds.simulation_rng(),
            current_region: None,
        }
    }

    pub fn current_region_name(&self) -> Option<&str> {
        self.current_region.as_deref()
    }

    pub fn current_region(&self) -> Option<&Region> {
        self.repository.get(self.current_region.as_deref()?)
    }

    pub fn current_region_mut(&mut self) -> Option<&mut Region> {
        let name = self.current_region.as_deref()?;
        self.repository.get_mut(name)
    }

    pub fn player_id(&self) -> Option<EntityId> {
        self.current_region()?.entities.player()
    }

    /// Move the player into the generated region `name`. The player leaves the
    /// current region, which remembers where they stood.
    pub fn enter_region(&mut self, name: &str) -> Result<EntityId, GenerationError> {
        if !self.repository.contains(name) {
            return Err(GenerationError::UnknownRegion(name.to_string()));
        }
        if let Some(previous) = self.current_region_mut() {
            if let Some(player) = previous.entities.player() {
                previous.despawn(player);
            }
        }

        let player = Entity::player((0, 0), self.player.speed, self.player.vision_radius);
        let rng = &mut self.rng;
        let region = self
            .repository
            .get_mut(name)
            .ok_or_else(|| GenerationError::UnknownRegion(name.to_string()))?;
        if region.last_player_position.is_none() {
            region.last_player_position = arrival_point(region, rng);
        }
        let id = region.enter_player(player);
        info!(region = name, pos = ?region.last_player_position, "player entered region");
        self.current_region = Some(name.to_string());
        Ok(id)
    }

    /// Step the player; stepping onto a settlement marker enters that town.
    pub fn move_player(&mut self, dx: i32, dy: i32) -> Result<MoveOutcome, GenerationError> {
        let Some(region) = self.current_region_mut() else {
            return Ok(MoveOutcome::default());
        };
        let outcome = region.move_player(dx, dy);
        for event in &outcome.events {
            if let ActionEvent::EnteredSettlement { town } = event {
                self.enter_region(town)?;
                break;
            }
        }
        Ok(outcome)
    }

    /// Spend the ticks the player's actions cost. Returns how many entity turns ran.
    pub fn play_turn(&mut self) -> usize {
        let rng = &mut self.rng;
        let Some(region) = self.current_region.as_deref().and_then(|n| self.repository.get_mut(n)) else {
            return 0;
        };
        let ticks = region.scheduler().pending();
        let turns = region.advance_pending(rng);
        self.advance_world_timers(ticks);
        turns
    }

    /// Let `ticks` pass without the player acting.
    pub fn wait(&mut self, ticks: u64) -> usize {
        let rng = &mut self.rng;
        let Some(region) = self.current_region.as_deref().and_then(|n| self.repository.get_mut(n)) else {
            return 0;
        };
        let turns = region.advance_turns(ticks, rng);
        self.advance_world_timers(ticks);
        turns
    }

    fn advance_world_timers(&mut self, ticks: u64) {
        let mut flickers = 0;
        self.global_scheduler.advance_ticks(ticks, |s, timer| match timer {
            WorldTimer::LampFlicker => {
                flickers += 1;
                s.schedule_turn(LAMP_FLICKER_TICKS, timer);
            }
        });
        if flickers % 2 == 1 {
            if let Some(region) = self.current_region_mut() {
                flicker_lamps(region);
            }
        }
    }

    /// Field of view of the player in the current region, marking tiles explored.
    pub fn player_visibility(&mut self, radius: Option<usize>) -> Option<Tilemap<bool>> {
        let name = self.current_region.as_deref()?;
        let region = self.repository.get_mut(name)?;
        let player = region.entities.player()?;
        region.compute_visibility(&self.visibility, player, radius, true, &HashSet::new())
    }
}

/// Where a player lands in a region without a remembered position: next to the
/// first settlement of a wilderness, else any free ground.
fn arrival_point(region: &Region, rng: &mut ChaCha8Rng) -> Option<(usize, usize)> {
    let occupied = region.occupied();
    if let Some(settlement) = region.settlements.first() {
        return Some(region.grid.close_available_tile(settlement.anchor, TileKind::Ground, &occupied, rng));
    }
    region.grid.random_tile(TileKind::Ground, &occupied, rng)
}

fn flicker_lamps(region: &mut Region) {
    for entity in region.entities.iter_mut() {
        if let EntityKind::WallLamp { variant } = &mut entity.kind {
            *variant = if *variant == 1 { 2 } else { 1 };
        }
    }
    debug!(region = %region.name, "lamps flickered");
}

/// Generate every configured town, then the wilderness hosting them, and put the
/// player in the wilderness.
pub fn build_world(ctx: &mut GameContext, world: &WorldConfig) -> Result<(), GenerationError> {
    for town in &world.towns {
        ctx.repository.get_or_create(
            &town.name,
            RegionKind::Town,
            town.size,
            Some(RegionParams::Town {
                buildings: town.buildings.clone(),
            }),
        )?;
    }
    let settlements = world.towns.iter().map(|t| t.name.clone()).collect();
    ctx.repository.get_or_create(
        &world.wilderness_name,
        RegionKind::Wilderness,
        world.wilderness_size,
        Some(RegionParams::Wilderness {
            settlements,
            with_liquid: world.with_liquid,
        }),
    )?;
    ctx.enter_region(&world.wilderness_name)?;
    info!(regions = ctx.repository.len(), seed = ctx.repository.seeds().master, "world built");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TownConfig;

    fn small_config() -> GeneratorConfig {
        let mut config = GeneratorConfig::default();
        config.world = WorldConfig {
            seed: Some(5),
            wilderness_name: "Wilds".to_string(),
            wilderness_size: (41, 41),
            with_liquid: true,
            towns: vec![TownConfig {
                name: "Oakvale".to_string(),
                size: (41, 41),
                buildings: vec!["Gate".to_string(), "Inn".to_string(), "Smithy".to_string()],
            }],
        };
        config.wilderness.wanderers = 3;
        config.town.wall_lamp_chance = 1.0;
        config
    }

    fn world() -> GameContext {
        let config = small_config();
        let mut ctx = GameContext::new(&config, 5);
        build_world(&mut ctx, &config.world).unwrap();
        ctx
    }

    #[test]
    fn test_build_world_starts_in_wilderness() {
        let ctx = world();
        assert_eq!(ctx.repository.len(), 2);
        assert_eq!(ctx.current_region_name(), Some("Wilds"));
        let region = ctx.current_region().unwrap();
        let player = region.entities.get(ctx.player_id().unwrap()).unwrap();
        assert_eq!(region.grid.get(player.pos.0, player.pos.1).kind, TileKind::Ground);
        assert_eq!(region.last_player_position, Some(player.pos));
    }

    #[test]
    fn test_stepping_on_marker_enters_town() {
        let mut ctx = world();
        let region = ctx.current_region().unwrap();
        let anchor = region.settlements[0].anchor;
        let pos = region.last_player_position.unwrap();
        assert_ne!(pos, anchor);
        let (dx, dy) = (anchor.0 as i32 - pos.0 as i32, anchor.1 as i32 - pos.1 as i32);

        let outcome = ctx.move_player(dx, dy).unwrap();
        assert!(outcome.moved);
        assert_eq!(ctx.current_region_name(), Some("Oakvale"));
        let town = ctx.current_region().unwrap();
        let entrance = town.buildings[0].center();
        let player = town.entities.get(ctx.player_id().unwrap()).unwrap();
        assert_eq!(player.pos, entrance);

        let wilds = ctx.repository.get("Wilds").unwrap();
        assert!(wilds.entities.player().is_none());
        assert_eq!(wilds.last_player_position, Some(anchor));
    }

    #[test]
    fn test_wait_runs_wanderers() {
        let mut ctx = world();
        assert_eq!(ctx.wait(9), 0);
        assert_eq!(ctx.wait(1), 3);
        assert_eq!(ctx.global_scheduler.now(), 10);
    }

    #[test]
    fn test_lamps_flicker_on_world_timer() {
        let mut ctx = world();
        ctx.enter_region("Oakvale").unwrap();
        let variants = |ctx: &GameContext| -> Vec<u8> {
            ctx.current_region()
                .unwrap()
                .entities
                .iter()
                .filter_map(|e| match e.kind {
                    EntityKind::WallLamp { variant } => Some(variant),
                    _ => None,
                })
                .collect()
        };
        let before = variants(&ctx);
        assert!(!before.is_empty());
        ctx.wait(LAMP_FLICKER_TICKS);
        let after = variants(&ctx);
        for (b, a) in before.iter().zip(&after) {
            assert_ne!(a, b);
        }
    }

    #[test]
    fn test_player_visibility_marks_explored() {
        let mut ctx = world();
        let visible = ctx.player_visibility(None).unwrap();
        let region = ctx.current_region().unwrap();
        let pos = region.last_player_position.unwrap();
        assert!(*visible.get(pos.0, pos.1));
        assert!(region.grid.get(pos.0, pos.1).explored);
    }

    #[test]
    fn test_unknown_region_rejected() {
        let mut ctx = world();
        assert!(matches!(ctx.enter_region("Atlantis"), Err(GenerationError::UnknownRegion(_))));
        assert_eq!(ctx.current_region_name(), Some("Wilds"));
    }
}
