//! Region entities and movement resolution.
//!
//! Entities live in a slot table addressed by [`EntityId`]. Movement snapshots the
//! entities it triggers and applies their removals and spawns only after every
//! trigger has run, so an action may safely delete its own entity.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::grid::{Grid, Position};
use crate::structures::{BuildingId, DoorOrientation};
use crate::tile::TileSubkind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub usize);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    /// A locked door stays closed and refuses whoever steps into it.
    Door {
        orientation: DoorOrientation,
        closed: bool,
        #[serde(default)]
        locked: bool,
    },
    WallLamp { variant: u8 },
    /// Stands for a town on the wilderness map.
    SettlementMarker { town: String },
    /// Center of a building inside a town.
    BuildingMarker { building: BuildingId },
    Wanderer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    OpenDoor,
    EnterSettlement,
}

/// Something that fires when another entity steps into its action field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actionable {
    pub radius: usize,
    pub player_only: bool,
    pub action: Action,
}

impl Actionable {
    /// The owner position plus a cross of `radius` tiles in each axis direction.
    pub fn covers(&self, owner: Position, target: Position) -> bool {
        let (ox, oy) = (owner.0 as i64, owner.1 as i64);
        let (tx, ty) = (target.0 as i64, target.1 as i64);
        let r = self.radius as i64;
        (ty == oy && (tx - ox).abs() <= r) || (tx == ox && (ty - oy).abs() <= r)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    /// Step to a random free neighbor every `speed` ticks.
    Wander,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
    pub pos: Position,
    /// Prevents other entities from sharing the tile.
    pub blocks: bool,
    /// Terrain this entity cannot enter; `None` uses the tile defaults.
    pub blocking_tiles: Option<Vec<TileSubkind>>,
    /// Terrain this entity cannot see through; `None` uses the tile defaults.
    pub blocking_view: Option<Vec<TileSubkind>>,
    pub vision_radius: usize,
    pub actionable: Option<Actionable>,
    pub behavior: Option<Behavior>,
    /// Ticks between two turns.
    pub speed: u64,
}

impl Entity {
    fn base(name: &str, kind: EntityKind, pos: Position) -> Self {
        Self {
            id: EntityId(usize::MAX),
            name: name.to_string(),
            kind,
            pos,
            blocks: false,
            blocking_tiles: None,
            blocking_view: None,
            vision_radius: 1,
            actionable: None,
            behavior: None,
            speed: 1,
        }
    }

    pub fn player(pos: Position, speed: u64, vision_radius: usize) -> Self {
        Self {
            speed,
            vision_radius,
            ..Self::base("Player", EntityKind::Player, pos)
        }
    }

    pub fn door(pos: Position, orientation: DoorOrientation, closed: bool) -> Self {
        let name = format!("Door {}", orientation.symbol());
        let kind = EntityKind::Door {
            orientation,
            closed,
            locked: false,
        };
        let mut door = Self::base(&name, kind, pos);
        if closed {
            door.actionable = Some(Actionable {
                radius: 0,
                player_only: true,
                action: Action::OpenDoor,
            });
        }
        door
    }

    pub fn locked_door(pos: Position, orientation: DoorOrientation) -> Self {
        let kind = EntityKind::Door {
            orientation,
            closed: true,
            locked: true,
        };
        Self {
            blocks: true,
            actionable: Some(Actionable {
                radius: 0,
                player_only: true,
                action: Action::OpenDoor,
            }),
            ..Self::base("Locked door", kind, pos)
        }
    }

    pub fn wall_lamp(pos: Position, variant: u8) -> Self {
        Self::base("Wall lamp", EntityKind::WallLamp { variant }, pos)
    }

    pub fn settlement_marker(town: &str, pos: Position) -> Self {
        Self {
            actionable: Some(Actionable {
                radius: 0,
                player_only: true,
                action: Action::EnterSettlement,
            }),
            ..Self::base(town, EntityKind::SettlementMarker { town: town.to_string() }, pos)
        }
    }

    pub fn building_marker(name: &str, building: BuildingId, pos: Position) -> Self {
        Self::base(name, EntityKind::BuildingMarker { building }, pos)
    }

    pub fn wanderer(name: &str, pos: Position, speed: u64) -> Self {
        Self {
            blocks: true,
            behavior: Some(Behavior::Wander),
            speed,
            ..Self::base(name, EntityKind::Wanderer, pos)
        }
    }

    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::Player
    }
}

/// Slot table of entities. Removed slots stay empty so ids are never reused.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityTable {
    slots: Vec<Option<Entity>>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mut entity: Entity) -> EntityId {
        let id = EntityId(self.slots.len());
        entity.id = id;
        self.slots.push(Some(entity));
        id
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.slots.get_mut(id.0).and_then(Option::take)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.slots.iter_mut().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn positions(&self) -> HashSet<Position> {
        self.iter().map(|e| e.pos).collect()
    }

    pub fn at(&self, pos: Position) -> impl Iterator<Item = &Entity> {
        self.iter().filter(move |e| e.pos == pos)
    }

    pub fn player(&self) -> Option<EntityId> {
        self.iter().find(|e| e.is_player()).map(|e| e.id)
    }
}

/// Something a trigger reported during a move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionEvent {
    DoorOpened { at: Position },
    DoorLocked { at: Position },
    EnteredSettlement { town: String },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    pub moved: bool,
    pub events: Vec<ActionEvent>,
}

/// Deferred changes collected while triggers run.
#[derive(Default)]
struct Deferred {
    removals: Vec<EntityId>,
    spawns: Vec<Entity>,
}

/// Run one action. `Some(false)` refuses the move when the owner blocks.
fn perform(action: Action, owner: &Entity, deferred: &mut Deferred, events: &mut Vec<ActionEvent>) -> Option<bool> {
    match action {
        Action::OpenDoor => match owner.kind {
            EntityKind::Door { locked: true, .. } => {
                events.push(ActionEvent::DoorLocked { at: owner.pos });
                Some(false)
            }
            EntityKind::Door {
                orientation,
                closed: true,
                ..
            } => {
                deferred.removals.push(owner.id);
                deferred.spawns.push(Entity::door(owner.pos, orientation, false));
                events.push(ActionEvent::DoorOpened { at: owner.pos });
                Some(true)
            }
            _ => None,
        },
        Action::EnterSettlement => {
            if let EntityKind::SettlementMarker { town } = &owner.kind {
                events.push(ActionEvent::EnteredSettlement { town: town.clone() });
            }
            None
        }
    }
}

/// Try to move entity `id` by `(dx, dy)` on `grid`.
pub fn move_entity(entities: &mut EntityTable, grid: &Grid, id: EntityId, dx: i32, dy: i32) -> MoveOutcome {
    let mut outcome = MoveOutcome::default();
    let Some(mover) = entities.get(id) else {
        return outcome;
    };
    let (tx, ty) = (mover.pos.0 as i32 + dx, mover.pos.1 as i32 + dy);
    let Some(tile) = grid.get_checked(tx, ty) else {
        return outcome;
    };
    let dest = (tx as usize, ty as usize);
    let mover_is_player = mover.is_player();
    let terrain_blocks = tile.blocks_for(mover.blocking_tiles.as_deref());

    let triggers: Vec<EntityId> = entities
        .iter()
        .filter(|e| e.id != id)
        .filter(|e| e.actionable.map_or(false, |a| a.covers(e.pos, dest)))
        .map(|e| e.id)
        .collect();

    let mut deferred = Deferred::default();
    let mut refused = false;
    for trigger in triggers {
        let Some(owner) = entities.get(trigger) else {
            continue;
        };
        let Some(actionable) = owner.actionable else {
            continue;
        };
        if actionable.player_only && !mover_is_player {
            continue;
        }
        let allowed = perform(actionable.action, owner, &mut deferred, &mut outcome.events);
        if owner.blocks && allowed == Some(false) {
            refused = true;
            break;
        }
    }

    for removed in deferred.removals {
        entities.remove(removed);
    }
    for spawn in deferred.spawns {
        entities.insert(spawn);
    }
    if refused || terrain_blocks {
        return outcome;
    }
    if entities.at(dest).any(|e| e.id != id && e.blocks) {
        return outcome;
    }

    if let Some(mover) = entities.get_mut(id) {
        debug!(entity = %mover.name, from = ?mover.pos, to = ?dest, "moved");
        mover.pos = dest;
        outcome.moved = true;
    }
    outcome
}
