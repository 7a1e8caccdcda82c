//! Tile types for region grids.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileKind {
    Void,
    /// Rock, walls, trees, deep water. Nothing walks through.
    Block,
    Ground,
    /// Crossable only by actors that do not list it as blocking.
    Liquid,
}

/// Material or decoration tag refining a [`TileKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileSubkind {
    Void,
    Tree,
    Wall,
    Boulder,
    DeepWater,
    Floor,
    Path,
    Grass,
    Carpet,
    Water,
    Lava,
}

impl TileSubkind {
    /// The kind a subkind naturally belongs to.
    pub fn kind(&self) -> TileKind {
        match self {
            TileSubkind::Void => TileKind::Void,
            TileSubkind::Tree | TileSubkind::Wall | TileSubkind::Boulder | TileSubkind::DeepWater => {
                TileKind::Block
            }
            TileSubkind::Floor | TileSubkind::Path | TileSubkind::Grass | TileSubkind::Carpet => {
                TileKind::Ground
            }
            TileSubkind::Water | TileSubkind::Lava => TileKind::Liquid,
        }
    }
}

/// Subkinds an actor cannot enter when it declares no list of its own.
pub const DEFAULT_BLOCKING_SUBKINDS: &[TileSubkind] = &[TileSubkind::Water];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub kind: TileKind,
    pub subkind: TileSubkind,
    /// Set by the visibility engine once the tile has been seen.
    pub explored: bool,
}

impl Default for Tile {
    fn default() -> Self {
        Self::new(TileSubkind::Void)
    }
}

impl Tile {
    pub fn new(subkind: TileSubkind) -> Self {
        Self {
            kind: subkind.kind(),
            subkind,
            explored: false,
        }
    }

    pub fn floor() -> Self {
        Self::new(TileSubkind::Floor)
    }

    pub fn wall() -> Self {
        Self::new(TileSubkind::Wall)
    }

    pub fn is(&self, kind: TileKind) -> bool {
        self.kind == kind
    }

    /// Whether an actor with the given blocking list may not enter this tile.
    /// Void and Block always block; `None` falls back to [`DEFAULT_BLOCKING_SUBKINDS`].
    pub fn blocks_for(&self, blocking: Option<&[TileSubkind]>) -> bool {
        if matches!(self.kind, TileKind::Void | TileKind::Block) {
            return true;
        }
        blocking
            .unwrap_or(DEFAULT_BLOCKING_SUBKINDS)
            .contains(&self.subkind)
    }

    /// Whether sight stops at this tile. Without an actor list, Void and Block stop sight.
    pub fn blocks_view(&self, blocking_view: Option<&[TileSubkind]>) -> bool {
        match blocking_view {
            Some(list) => list.contains(&self.subkind),
            None => matches!(self.kind, TileKind::Void | TileKind::Block),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_blocking() {
        assert!(Tile::wall().blocks_for(None));
        assert!(Tile::default().blocks_for(None));
        assert!(Tile::new(TileSubkind::Water).blocks_for(None));
        assert!(!Tile::new(TileSubkind::Lava).blocks_for(None));
        assert!(!Tile::floor().blocks_for(None));
    }

    #[test]
    fn test_custom_blocking_list() {
        let aquatic: &[TileSubkind] = &[TileSubkind::Lava];
        assert!(!Tile::new(TileSubkind::Water).blocks_for(Some(aquatic)));
        assert!(Tile::new(TileSubkind::Lava).blocks_for(Some(aquatic)));
        // Walls block regardless of the list.
        assert!(Tile::wall().blocks_for(Some(&[])));
    }

    #[test]
    fn test_view_blocking() {
        assert!(Tile::new(TileSubkind::Tree).blocks_view(None));
        assert!(!Tile::new(TileSubkind::Water).blocks_view(None));
        assert!(!Tile::new(TileSubkind::Tree).blocks_view(Some(&[TileSubkind::Wall])));
    }
}
