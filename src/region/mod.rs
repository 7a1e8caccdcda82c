//! Regions: one playable map with its grid, entities and turn scheduler.
//!
//! Regions are built by the [`RegionRepository`], which caches them by name.

pub mod repository;
pub mod town;
pub mod wilderness;

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entities::{move_entity, Behavior, Entity, EntityId, EntityTable, MoveOutcome};
use crate::grid::{Grid, Position, NEIGHBOR_OFFSETS};
use crate::scheduler::TurnScheduler;
use crate::structures::{Building, Door};
use crate::tilemap::Tilemap;
use crate::visibility::VisibilityEngine;

pub use repository::{RegionParams, RegionRepository};
pub use town::{build_town_region, TownParams};
pub use wilderness::{build_wilderness_region, generate_wilderness, WildernessLayout, WildernessParams};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionKind {
    Wilderness,
    Town,
}

/// A town placed on a wilderness map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub town: String,
    pub anchor: Position,
    pub marker: EntityId,
}

/// Tiles of a road carved between two settlements, destination included.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Road {
    pub from: String,
    pub to: String,
    pub tiles: Vec<Position>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub kind: RegionKind,
    pub grid: Grid,
    pub entities: EntityTable,
    /// Created on first use; rebuilt with [`Region::reattach_scheduler`] after loading.
    #[serde(skip)]
    scheduler: Option<TurnScheduler<EntityId>>,
    pub last_player_position: Option<Position>,
    pub buildings: Vec<Building>,
    /// Region-wide door registry, one entry per position.
    pub doors: Vec<Door>,
    pub settlements: Vec<Settlement>,
    pub roads: Vec<Road>,
}

impl Region {
    pub fn new(name: &str, kind: RegionKind, grid: Grid) -> Self {
        Self {
            name: name.to_string(),
            kind,
            grid,
            entities: EntityTable::new(),
            scheduler: None,
            last_player_position: None,
            buildings: Vec::new(),
            doors: Vec::new(),
            settlements: Vec::new(),
            roads: Vec::new(),
        }
    }

    pub fn scheduler(&mut self) -> &mut TurnScheduler<EntityId> {
        self.scheduler.get_or_insert_with(TurnScheduler::new)
    }

    pub fn has_scheduler(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Rebuild the scheduler after deserialization, booking every acting entity one
    /// full interval ahead.
    pub fn reattach_scheduler(&mut self) {
        let mut scheduler = TurnScheduler::new();
        for entity in self.entities.iter().filter(|e| e.behavior.is_some()) {
            scheduler.schedule_turn(entity.speed, entity.id);
        }
        debug!(region = %self.name, booked = scheduler.len(), "scheduler reattached");
        self.scheduler = Some(scheduler);
    }

    /// Add an entity; acting entities get their first turn booked.
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        let acts = entity.behavior.is_some();
        let speed = entity.speed;
        let id = self.entities.insert(entity);
        if acts {
            self.scheduler().schedule_turn(speed, id);
        }
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        if let Some(scheduler) = self.scheduler.as_mut() {
            scheduler.unregister(id);
        }
        self.entities.remove(id)
    }

    /// Positions currently holding an entity.
    pub fn occupied(&self) -> HashSet<Position> {
        self.entities.positions()
    }

    pub fn move_entity(&mut self, id: EntityId, dx: i32, dy: i32) -> MoveOutcome {
        move_entity(&mut self.entities, &self.grid, id, dx, dy)
    }

    /// Insert the player at the last known position and return its id.
    pub fn enter_player(&mut self, mut player: Entity) -> EntityId {
        if let Some(pos) = self.last_player_position {
            player.pos = pos;
        }
        self.last_player_position = Some(player.pos);
        self.entities.insert(player)
    }

    /// Move the player; a successful step records its position and owes the
    /// player's speed in pending ticks.
    pub fn move_player(&mut self, dx: i32, dy: i32) -> MoveOutcome {
        let Some(player) = self.entities.player() else {
            return MoveOutcome::default();
        };
        let outcome = self.move_entity(player, dx, dy);
        if outcome.moved {
            if let Some(entity) = self.entities.get(player) {
                let (pos, speed) = (entity.pos, entity.speed);
                self.last_player_position = Some(pos);
                self.scheduler().add_pending(speed);
            }
        }
        outcome
    }

    /// Run `ticks` ticks of entity turns. Returns how many turns were taken.
    pub fn advance_turns<R: Rng>(&mut self, ticks: u64, rng: &mut R) -> usize {
        let mut scheduler = self.scheduler.take().unwrap_or_default();
        let mut turns = 0;
        scheduler.advance_ticks(ticks, |s, id| {
            turns += 1;
            self.take_turn(s, id, rng);
        });
        self.scheduler = Some(scheduler);
        turns
    }

    /// Drain the ticks owed by player actions.
    pub fn advance_pending<R: Rng>(&mut self, rng: &mut R) -> usize {
        let mut scheduler = self.scheduler.take().unwrap_or_default();
        let mut turns = 0;
        scheduler.advance_pending(|s, id| {
            turns += 1;
            self.take_turn(s, id, rng);
        });
        self.scheduler = Some(scheduler);
        turns
    }

    fn take_turn<R: Rng>(&mut self, scheduler: &mut TurnScheduler<EntityId>, id: EntityId, rng: &mut R) {
        let Some(entity) = self.entities.get(id) else {
            return;
        };
        let (speed, behavior) = (entity.speed, entity.behavior);
        match behavior {
            Some(Behavior::Wander) => {
                let mut deltas = NEIGHBOR_OFFSETS;
                deltas.shuffle(rng);
                for (dx, dy) in deltas {
                    if self.move_entity(id, dx, dy).moved {
                        break;
                    }
                }
                scheduler.schedule_turn(speed, id);
            }
            None => {}
        }
    }

    /// Field of view of `actor`, `radius` defaulting to the actor's vision.
    /// Visible tiles are flagged explored when `flag_explored` is set.
    pub fn compute_visibility(
        &mut self,
        engine: &VisibilityEngine,
        actor: EntityId,
        radius: Option<usize>,
        flag_explored: bool,
        exemptions: &HashSet<Position>,
    ) -> Option<Tilemap<bool>> {
        let entity = self.entities.get(actor)?;
        let radius = radius.unwrap_or(entity.vision_radius);
        Some(engine.compute_visibility(
            &mut self.grid,
            entity.pos,
            radius,
            flag_explored,
            entity.blocking_view.as_deref(),
            exemptions,
        ))
    }
}
