//! ASCII rendering and export module for regions
//!
//! Provides functions to render a region as ASCII text and export it to files.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::Local;

use crate::entities::{Entity, EntityKind};
use crate::grid::Grid;
use crate::region::Region;
use crate::tile::{TileKind, TileSubkind};

/// ASCII rendering modes
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AsciiMode {
    /// Terrain with entities drawn on top
    Tiles,
    /// Terrain only
    Terrain,
    /// Auto-tile weight of blocking tiles, as a hex digit
    Weights,
    /// Terrain, blank where not yet explored
    Explored,
}

impl AsciiMode {
    pub fn name(&self) -> &'static str {
        match self {
            AsciiMode::Tiles => "Tiles",
            AsciiMode::Terrain => "Terrain",
            AsciiMode::Weights => "Weights",
            AsciiMode::Explored => "Explored",
        }
    }

    pub fn all() -> &'static [AsciiMode] {
        &[AsciiMode::Tiles, AsciiMode::Terrain, AsciiMode::Weights, AsciiMode::Explored]
    }
}

/// Get ASCII character for a tile subkind
pub fn subkind_char(subkind: TileSubkind) -> char {
    match subkind {
        TileSubkind::Void => ' ',
        TileSubkind::Tree => 'T',
        TileSubkind::Wall => '#',
        TileSubkind::Boulder => 'O',
        TileSubkind::DeepWater => '≈',
        TileSubkind::Floor => '.',
        TileSubkind::Path => ':',
        TileSubkind::Grass => '"',
        TileSubkind::Carpet => '_',
        TileSubkind::Water => '~',
        TileSubkind::Lava => '^',
    }
}

/// Get ASCII character for an entity
pub fn entity_char(entity: &Entity) -> char {
    match &entity.kind {
        EntityKind::Player => '@',
        EntityKind::Door { closed: true, .. } => '+',
        EntityKind::Door { closed: false, .. } => '\'',
        EntityKind::WallLamp { .. } => '*',
        EntityKind::SettlementMarker { .. } => 'H',
        EntityKind::BuildingMarker { .. } => 'b',
        EntityKind::Wanderer => 'f',
    }
}

/// Hex digit of the blocking weight of a Block tile, `.` elsewhere
pub fn weight_char(grid: &Grid, x: usize, y: usize) -> char {
    if grid.get(x, y).kind != TileKind::Block {
        return '.';
    }
    let weight = grid.weight(x, y, &[TileKind::Block], None);
    char::from_digit(weight as u32, 16).unwrap_or('?')
}

/// Render a region to ASCII string
pub fn render_ascii_map(region: &Region, mode: AsciiMode) -> String {
    let grid = &region.grid;
    let (width, height) = (grid.width(), grid.height());
    let mut rows: Vec<Vec<char>> = (0..height)
        .map(|y| {
            (0..width)
                .map(|x| {
                    let tile = grid.get(x, y);
                    match mode {
                        AsciiMode::Tiles | AsciiMode::Terrain => subkind_char(tile.subkind),
                        AsciiMode::Weights => weight_char(grid, x, y),
                        AsciiMode::Explored if tile.explored => subkind_char(tile.subkind),
                        AsciiMode::Explored => ' ',
                    }
                })
                .collect()
        })
        .collect();

    if mode == AsciiMode::Tiles {
        // Player last so it stays visible over markers.
        let mut entities: Vec<&Entity> = region.entities.iter().collect();
        entities.sort_by_key(|e| e.is_player());
        for entity in entities {
            let (x, y) = entity.pos;
            rows[y][x] = entity_char(entity);
        }
    }

    let mut result = String::with_capacity((width + 1) * height);
    for row in rows {
        result.extend(row);
        result.push('\n');
    }
    result
}

/// Generate legend for tile and entity characters
pub fn tile_legend() -> String {
    let mut legend = String::new();
    legend.push_str("=== TILE LEGEND ===\n");
    legend.push_str("BLOCK:\n");
    legend.push_str("  T Tree         # Wall        O Boulder     ≈ DeepWater\n");
    legend.push_str("GROUND:\n");
    legend.push_str("  . Floor        : Path        \" Grass       _ Carpet\n");
    legend.push_str("LIQUID:\n");
    legend.push_str("  ~ Water        ^ Lava\n");
    legend.push_str("ENTITIES:\n");
    legend.push_str("  @ Player       + Door        ' Open door   * Wall lamp\n");
    legend.push_str("  H Settlement   b Building    f Wanderer\n");
    legend
}

/// Count tiles per subkind
pub fn calculate_tile_stats(grid: &Grid) -> HashMap<TileSubkind, usize> {
    let mut stats = HashMap::new();
    for (_, _, tile) in grid.tiles.iter() {
        *stats.entry(tile.subkind).or_insert(0) += 1;
    }
    stats
}

/// Export a region to an ASCII file
pub fn export_region_file(region: &Region, seed: u64, path: &Path, verbose: bool) -> io::Result<()> {
    let mut file = File::create(path)?;
    let grid = &region.grid;
    let total = grid.width() * grid.height();

    // Header
    writeln!(file, "=== REGION GENERATOR REGION FILE ===")?;
    writeln!(file, "Region: {} ({:?})", region.name, region.kind)?;
    writeln!(file, "Seed: {}", seed)?;
    writeln!(file, "Size: {}x{}", grid.width(), grid.height())?;
    writeln!(file, "Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(file)?;

    writeln!(file, "=== MAP (Tiles View) ===")?;
    write!(file, "{}", render_ascii_map(region, AsciiMode::Tiles))?;
    writeln!(file)?;

    write!(file, "{}", tile_legend())?;
    writeln!(file)?;

    // Statistics
    writeln!(file, "=== STATISTICS ===")?;
    writeln!(file, "Total tiles: {}", total)?;
    for kind in [TileKind::Ground, TileKind::Block, TileKind::Liquid, TileKind::Void] {
        let count = grid.count(kind);
        writeln!(file, "{:?}: {} ({:.1}%)", kind, count, 100.0 * count as f64 / total as f64)?;
    }
    writeln!(file)?;

    writeln!(file, "Tile Distribution:")?;
    let stats = calculate_tile_stats(grid);
    let mut sorted_stats: Vec<_> = stats.iter().collect();
    sorted_stats.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    for (subkind, count) in sorted_stats {
        let pct = 100.0 * *count as f64 / total as f64;
        writeln!(file, "  {:12} {} {:>6} ({:>5.1}%)", format!("{:?}", subkind), subkind_char(*subkind), count, pct)?;
    }
    writeln!(file)?;

    writeln!(file, "Entities: {}", region.entities.len())?;
    if !region.buildings.is_empty() {
        writeln!(file, "Buildings: {} ({} doors)", region.buildings.len(), region.doors.len())?;
    }
    for settlement in &region.settlements {
        writeln!(file, "Settlement {} at ({}, {})", settlement.town, settlement.anchor.0, settlement.anchor.1)?;
    }
    for road in &region.roads {
        writeln!(file, "Road {} -> {}: {} tiles", road.from, road.to, road.tiles.len())?;
    }
    writeln!(file)?;

    if verbose {
        for &mode in AsciiMode::all().iter().filter(|m| !matches!(m, AsciiMode::Tiles)) {
            writeln!(file, "=== MAP ({} View) ===", mode.name())?;
            write!(file, "{}", render_ascii_map(region, mode))?;
            writeln!(file)?;
        }
        writeln!(file, "=== ENTITY DATA ===")?;
        writeln!(file, "[id,name,x,y,blocks]")?;
        for entity in region.entities.iter() {
            writeln!(file, "{},{},{},{},{}", entity.id.0, entity.name, entity.pos.0, entity.pos.1, entity.blocks)?;
        }
    }

    Ok(())
}

/// Print ASCII map to stdout
pub fn print_ascii_map(region: &Region, mode: AsciiMode) {
    println!("=== {} ({}) ===", region.name, mode.name());
    print!("{}", render_ascii_map(region, mode));
}
