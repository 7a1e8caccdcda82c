//! Settlement structures: buildings, doors and the branching town layout.

pub mod layout;
pub mod types;

pub use layout::{generate_town, TownLayout, TownLayoutParams};
pub use types::{Building, BuildingId, Direction, Door, DoorOrientation};
