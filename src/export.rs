use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};

use crate::entities::{Entity, EntityKind};
use crate::region::Region;
use crate::tile::TileSubkind;
use crate::tilemap::Tilemap;

/// Pixels per tile in exported previews.
pub const TILE_PIXELS: u32 = 4;

/// Base color of a tile subkind.
pub fn subkind_color(subkind: TileSubkind) -> [u8; 3] {
    match subkind {
        TileSubkind::Void => [0, 0, 0],
        TileSubkind::Tree => [34, 85, 34],
        TileSubkind::Wall => [90, 80, 70],
        TileSubkind::Boulder => [120, 120, 110],
        TileSubkind::DeepWater => [20, 40, 110],
        TileSubkind::Floor => [170, 150, 110],
        TileSubkind::Path => [200, 180, 120],
        TileSubkind::Grass => [90, 160, 70],
        TileSubkind::Carpet => [150, 50, 50],
        TileSubkind::Water => [50, 100, 200],
        TileSubkind::Lava => [230, 90, 20],
    }
}

pub fn entity_color(entity: &Entity) -> [u8; 3] {
    match &entity.kind {
        EntityKind::Player => [255, 255, 255],
        EntityKind::Door { closed: true, .. } => [110, 60, 20],
        EntityKind::Door { closed: false, .. } => [180, 120, 60],
        EntityKind::WallLamp { .. } => [255, 220, 80],
        EntityKind::SettlementMarker { .. } => [220, 30, 200],
        EntityKind::BuildingMarker { .. } => [200, 200, 60],
        EntityKind::Wanderer => [60, 220, 220],
    }
}

/// Darken a color; `factor` 1.0 keeps it, 0.0 turns it black.
fn shade(color: [u8; 3], factor: f32) -> [u8; 3] {
    color.map(|c| (c as f32 * factor).round().clamp(0.0, 255.0) as u8)
}

/// Render a region, one `TILE_PIXELS` square per tile.
///
/// With a visibility map, visible tiles are drawn at full brightness, explored
/// ones dimmed and the rest left black. Entities only show on visible tiles.
pub fn render_region(region: &Region, visible: Option<&Tilemap<bool>>) -> RgbImage {
    let grid = &region.grid;
    let mut img: RgbImage = ImageBuffer::new(grid.width() as u32 * TILE_PIXELS, grid.height() as u32 * TILE_PIXELS);

    let lit = |x: usize, y: usize| visible.map_or(true, |v| *v.get(x, y));
    for (x, y, tile) in grid.tiles.iter() {
        let base = subkind_color(tile.subkind);
        let color = if lit(x, y) {
            base
        } else if tile.explored {
            shade(base, 0.35)
        } else {
            [0, 0, 0]
        };
        fill_tile(&mut img, x, y, color);
    }

    let mut entities: Vec<&Entity> = region.entities.iter().collect();
    entities.sort_by_key(|e| e.is_player());
    for entity in entities {
        let (x, y) = entity.pos;
        if lit(x, y) {
            fill_tile(&mut img, x, y, entity_color(entity));
        }
    }

    img
}

fn fill_tile(img: &mut RgbImage, x: usize, y: usize, color: [u8; 3]) {
    let (px, py) = (x as u32 * TILE_PIXELS, y as u32 * TILE_PIXELS);
    for dy in 0..TILE_PIXELS {
        for dx in 0..TILE_PIXELS {
            img.put_pixel(px + dx, py + dy, Rgb(color));
        }
    }
}

/// Export a region preview to PNG.
pub fn export_region_png(region: &Region, visible: Option<&Tilemap<bool>>, path: &Path) -> Result<(), image::ImageError> {
    render_region(region, visible).save(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::region::RegionKind;
    use crate::tile::Tile;

    fn region() -> Region {
        let mut region = Region::new("Field", RegionKind::Wilderness, Grid::new(5, 5, Tile::floor()).unwrap());
        region.enter_player(Entity::player((2, 2), 10, 2));
        region
    }

    #[test]
    fn test_full_render_dimensions_and_colors() {
        let region = region();
        let img = render_region(&region, None);
        assert_eq!(img.dimensions(), (5 * TILE_PIXELS, 5 * TILE_PIXELS));
        assert_eq!(img.get_pixel(0, 0).0, subkind_color(TileSubkind::Floor));
        let center = 2 * TILE_PIXELS + 1;
        assert_eq!(img.get_pixel(center, center).0, [255, 255, 255]);
    }

    #[test]
    fn test_fog_of_war() {
        let mut region = region();
        region.grid.tiles.get_mut(0, 0).explored = true;
        let mut visible = Tilemap::new_with(5, 5, false);
        visible.set(4, 4, true);
        let img = render_region(&region, Some(&visible));

        assert_eq!(img.get_pixel(0, 0).0, shade(subkind_color(TileSubkind::Floor), 0.35));
        assert_eq!(img.get_pixel(4 * TILE_PIXELS, 4 * TILE_PIXELS).0, subkind_color(TileSubkind::Floor));
        // Unexplored and unseen, the player tile stays dark too.
        assert_eq!(img.get_pixel(TILE_PIXELS, 0).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(2 * TILE_PIXELS, 2 * TILE_PIXELS).0, [0, 0, 0]);
    }

    #[test]
    fn test_export_writes_png() {
        let region = region();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("field.png");
        export_region_png(&region, None, &path).unwrap();
        let loaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(loaded.dimensions(), (20, 20));
    }
}
