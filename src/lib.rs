//! Region generation library
//!
//! Procedural wilderness and town regions for a turn-based tile game, with
//! pathfinding, field of view and a tick scheduler. Re-exports modules for use
//! by binaries and tools.

pub mod ascii;
pub mod cellular;
pub mod config;
pub mod connectivity;
pub mod entities;
pub mod error;
pub mod export;
pub mod grid;
pub mod pathfinding;
pub mod region;
pub mod scheduler;
pub mod seeds;
pub mod structures;
pub mod tile;
pub mod tilemap;
pub mod visibility;
pub mod world;

pub use error::GenerationError;
pub use grid::{Grid, Position};
pub use region::{Region, RegionKind, RegionParams, RegionRepository};
pub use world::{build_world, GameContext};
