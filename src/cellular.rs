//! Cellular automaton terrain masks.
//!
//! A mask starts as random noise with a solid border, then a list of smoothing rules
//! is applied in place. Several masks are layered to compose a region grid:
//! blocking over liquid over grass over plain floor.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GenerationError;
use crate::grid::Grid;
use crate::tile::{Tile, TileKind, TileSubkind};
use crate::tilemap::Tilemap;

/// One smoothing stage. A cell becomes blocked when its 3x3 neighborhood (self
/// included) holds at least `survive_threshold` blocked cells, or when
/// `birth_threshold` is set and the count is at most that value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomatonRule {
    pub repeat: usize,
    pub survive_threshold: usize,
    pub birth_threshold: Option<usize>,
}

impl AutomatonRule {
    pub const fn new(repeat: usize, survive_threshold: usize, birth_threshold: Option<usize>) -> Self {
        Self {
            repeat,
            survive_threshold,
            birth_threshold,
        }
    }

    fn decide(&self, count: usize) -> bool {
        count >= self.survive_threshold || self.birth_threshold.map_or(false, |b| count <= b)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomatonParams {
    /// Chance (0-100) for an interior cell to start blocked.
    pub initial_noise_percent: u32,
    pub rules: Vec<AutomatonRule>,
    /// Clear a horizontal band through the middle of the mask.
    pub empty_center: bool,
}

impl Default for AutomatonParams {
    fn default() -> Self {
        Self::blocking()
    }
}

impl AutomatonParams {
    /// Rock or tree walls: dense islands, then smoothed caves.
    pub fn blocking() -> Self {
        Self {
            initial_noise_percent: 40,
            rules: vec![AutomatonRule::new(3, 5, Some(1)), AutomatonRule::new(2, 5, None)],
            empty_center: false,
        }
    }

    pub fn grass() -> Self {
        Self {
            initial_noise_percent: 50,
            rules: vec![AutomatonRule::new(3, 5, Some(1)), AutomatonRule::new(1, 6, None)],
            empty_center: false,
        }
    }

    pub fn liquid() -> Self {
        Self {
            initial_noise_percent: 40,
            rules: vec![AutomatonRule::new(2, 5, None)],
            empty_center: false,
        }
    }
}

/// Noise pass: border cells blocked, interior blocked with the given chance.
pub fn initial_mask<R: Rng>(width: usize, height: usize, noise_percent: u32, rng: &mut R) -> Tilemap<bool> {
    let mut mask = Tilemap::new_with(width, height, false);
    for (x, y, cell) in mask.iter_mut() {
        let border = x == 0 || y == 0 || x == width - 1 || y == height - 1;
        *cell = border || rng.gen_range(0..100) < noise_percent;
    }
    mask
}

fn count_blocked(mask: &Tilemap<bool>, x: usize, y: usize) -> usize {
    let mut count = 0;
    for ny in y - 1..=y + 1 {
        for nx in x - 1..=x + 1 {
            if *mask.get(nx, ny) {
                count += 1;
            }
        }
    }
    count
}

/// One in-place pass over the interior. Cells updated earlier in the pass are seen
/// by later cells.
pub fn smooth_pass(mask: &mut Tilemap<bool>, rule: &AutomatonRule) {
    for y in 1..mask.height - 1 {
        for x in 1..mask.width - 1 {
            let count = count_blocked(mask, x, y);
            mask.set(x, y, rule.decide(count));
        }
    }
}

/// Clear the middle band (rows `height/6 .. 5*height/6`) between the first open
/// cells found scanning inward from each side.
fn eliminate_center(mask: &mut Tilemap<bool>) {
    let (width, height) = (mask.width, mask.height);
    let half = width / 2;

    for y in height / 6..(5 * height) / 6 {
        let mut x_left = 1;
        let mut x_right = width - 1;
        if let Some(x) = (2..half + 1).find(|&x| !*mask.get(x, y)) {
            x_left = x - 1;
        }
        if let Some(x) = (half + 1..=width - 2).rev().find(|&x| !*mask.get(x, y)) {
            x_right = x + 1;
        }
        for x in x_left..x_right {
            mask.set(x, y, false);
        }
    }
}

/// Build one boolean mask; `true` means the layer applies at that cell.
pub fn generate_mask<R: Rng>(width: usize, height: usize, params: &AutomatonParams, rng: &mut R) -> Tilemap<bool> {
    let mut mask = initial_mask(width, height, params.initial_noise_percent, rng);

    for rule in &params.rules {
        for _ in 0..rule.repeat {
            smooth_pass(&mut mask, rule);
        }
    }

    if params.empty_center {
        eliminate_center(&mut mask);
        if let Some(last) = params.rules.last() {
            // Heal the seam with survival only.
            smooth_pass(&mut mask, &AutomatonRule::new(1, last.survive_threshold, None));
        }
    }

    mask
}

/// Mask parameters and materials for composing a full terrain grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainLayers {
    pub blocking: AutomatonParams,
    pub grass: AutomatonParams,
    /// `None` disables the liquid layer.
    pub liquid: Option<AutomatonParams>,
    pub blocking_subkind: TileSubkind,
    pub liquid_subkind: TileSubkind,
}

impl Default for TerrainLayers {
    fn default() -> Self {
        Self {
            blocking: AutomatonParams::blocking(),
            grass: AutomatonParams::grass(),
            liquid: Some(AutomatonParams::liquid()),
            blocking_subkind: TileSubkind::Tree,
            liquid_subkind: TileSubkind::Water,
        }
    }
}

/// Compose blocking, grass and optional liquid masks over a floor grid.
pub fn compose_terrain<R: Rng>(
    width: usize,
    height: usize,
    layers: &TerrainLayers,
    rng: &mut R,
) -> Result<Grid, GenerationError> {
    let mut grid = Grid::new(width, height, Tile::floor())?;

    let blocking = generate_mask(width, height, &layers.blocking, rng);
    let grass = generate_mask(width, height, &layers.grass, rng);
    let liquid = layers
        .liquid
        .as_ref()
        .map(|params| generate_mask(width, height, params, rng));

    for y in 0..height {
        for x in 0..width {
            if *blocking.get(x, y) {
                grid.set_subkind(x, y, layers.blocking_subkind);
            } else if liquid.as_ref().map_or(false, |m| *m.get(x, y)) {
                grid.set_subkind(x, y, layers.liquid_subkind);
            } else if *grass.get(x, y) {
                grid.set_subkind(x, y, TileSubkind::Grass);
            }
        }
    }

    debug!(
        width,
        height,
        blocked = blocking.count_true(),
        liquid = liquid.as_ref().map_or(0, |m| m.count_true()),
        "composed terrain layers"
    );
    Ok(grid)
}

/// Compose fresh terrain underneath `carved`: every non-Void tile of `carved` wins.
pub fn decorate_around<R: Rng>(
    carved: &Grid,
    layers: &TerrainLayers,
    rng: &mut R,
) -> Result<Grid, GenerationError> {
    let mut grid = compose_terrain(carved.width(), carved.height(), layers, rng)?;
    for (x, y, tile) in carved.tiles.iter() {
        if tile.kind != TileKind::Void {
            grid.set(x, y, *tile);
        }
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_boundary_blocked_after_noise() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mask = initial_mask(21, 15, 0, &mut rng);
        for (x, y, &blocked) in mask.iter() {
            let border = x == 0 || y == 0 || x == 20 || y == 14;
            assert_eq!(blocked, border, "cell ({}, {})", x, y);
        }
    }

    #[test]
    fn test_masks_are_deterministic() {
        let params = AutomatonParams::blocking();
        let a = generate_mask(41, 31, &params, &mut ChaCha8Rng::seed_from_u64(5));
        let b = generate_mask(41, 31, &params, &mut ChaCha8Rng::seed_from_u64(5));
        let c = generate_mask(41, 31, &params, &mut ChaCha8Rng::seed_from_u64(6));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_survive_rule_keeps_solid_mask() {
        let mut mask = Tilemap::new_with(7, 7, true);
        smooth_pass(&mut mask, &AutomatonRule::new(1, 5, None));
        assert_eq!(mask.count_true(), 49);
    }

    #[test]
    fn test_birth_rule_fills_empty_mask() {
        let mut mask = initial_mask(7, 7, 0, &mut ChaCha8Rng::seed_from_u64(1));
        // Interior (2, 2) sees only open cells: count 0 <= birth 0.
        smooth_pass(&mut mask, &AutomatonRule::new(1, 9, Some(0)));
        assert!(*mask.get(2, 2));
    }

    #[test]
    fn test_empty_center_clears_band() {
        let params = AutomatonParams {
            initial_noise_percent: 100,
            rules: vec![AutomatonRule::new(0, 5, None)],
            empty_center: true,
        };
        let mask = generate_mask(31, 31, &params, &mut ChaCha8Rng::seed_from_u64(2));
        assert!(!*mask.get(15, 15));
        assert!(*mask.get(1, 1));
        assert!(*mask.get(0, 15));
        assert!(*mask.get(30, 15));
    }

    #[test]
    fn test_compose_precedence_and_border() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let layers = TerrainLayers::default();
        let grid = compose_terrain(41, 41, &layers, &mut rng).unwrap();
        for x in 0..41 {
            assert_eq!(grid.get(x, 0).subkind, TileSubkind::Tree);
            assert_eq!(grid.get(x, 40).kind, TileKind::Block);
        }
        assert!(grid.count(TileKind::Ground) > 0);
        assert!(compose_terrain(40, 41, &layers, &mut rng).is_err());
    }

    #[test]
    fn test_decorate_keeps_carved_tiles() {
        let mut carved = Grid::new(21, 21, Tile::default()).unwrap();
        for x in 5..15 {
            carved.set(x, 10, Tile::new(TileSubkind::Path));
        }
        carved.set(0, 0, Tile::floor());
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let grid = decorate_around(&carved, &TerrainLayers::default(), &mut rng).unwrap();
        for x in 5..15 {
            assert_eq!(grid.get(x, 10).subkind, TileSubkind::Path);
        }
        assert_eq!(grid.get(0, 0).subkind, TileSubkind::Floor);
        assert_eq!(grid.get(20, 20).kind, TileKind::Block);
    }
}
