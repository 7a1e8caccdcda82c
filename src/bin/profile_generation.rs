//! Profiling tool to identify performance bottlenecks

use std::collections::HashSet;
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use region_generator::cellular::{compose_terrain, TerrainLayers};
use region_generator::connectivity::is_connected;
use region_generator::pathfinding::PathFinder;
use region_generator::region::{generate_wilderness, WildernessParams};
use region_generator::structures::{generate_town, TownLayoutParams};
use region_generator::tile::TileKind;
use region_generator::visibility::VisibilityEngine;

fn main() {
    let (width, height) = (81, 121);
    let seed = 1337u64;

    println!("=== Performance Profiling ===");
    println!("Region size: {}x{} ({} cells)", width, height, width * height);
    println!();

    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    // Single composition, no acceptance gate
    let start = Instant::now();
    let grid = compose_terrain(width, height, &TerrainLayers::default(), &mut rng).expect("odd dimensions");
    let compose_time = start.elapsed();
    println!("Terrain composition: {:?}", compose_time);

    let start = Instant::now();
    let connected = is_connected(&grid, TileKind::Ground, &mut rng);
    let flood_time = start.elapsed();
    println!("Connectivity check: {:?} (connected: {})", flood_time, connected);

    // Full wilderness: retries, anchors and roads
    let towns: Vec<String> = (0..4).map(|i| format!("Town {}", i)).collect();
    let start = Instant::now();
    let layout = generate_wilderness("Profile", width, height, &towns, true, &WildernessParams::default(), &mut rng)
        .expect("wilderness generation failed");
    let wilderness_time = start.elapsed();
    println!("Wilderness generation: {:?} ({} roads)", wilderness_time, layout.roads.len());

    let start = Instant::now();
    let finder = PathFinder::new(&layout.grid);
    let mut searches = 0;
    for from in &layout.anchors {
        for to in &layout.anchors {
            if finder.find_path(*from, *to).is_some() {
                searches += 1;
            }
        }
    }
    let path_time = start.elapsed();
    println!("A* searches: {:?} ({} paths)", path_time, searches);

    let names: Vec<String> = (0..12).map(|i| format!("Building {}", i)).collect();
    let start = Instant::now();
    let town = generate_town(121, 121, &names, &TownLayoutParams::default(), &mut rng).expect("town generation failed");
    let town_time = start.elapsed();
    println!(
        "Town generation: {:?} ({}x{}, {} doors)",
        town_time,
        town.grid.width(),
        town.grid.height(),
        town.doors.len()
    );

    let engine = VisibilityEngine::default();
    let origin = layout.anchors[0];
    let start = Instant::now();
    let mut seen = 0;
    for _ in 0..100 {
        seen = engine.visible_tiles(&layout.grid, origin, 12, None, &HashSet::new()).count_true();
    }
    let fov_time = start.elapsed();
    println!("Field of view x100: {:?} ({} tiles visible)", fov_time, seen);

    // Summary
    let total = compose_time + flood_time + wilderness_time + path_time + town_time + fov_time;
    let pct = |d: std::time::Duration| 100.0 * d.as_secs_f64() / total.as_secs_f64();
    println!("\n=== Summary ===");
    println!("Composition:      {:>8.2}% ({:?})", pct(compose_time), compose_time);
    println!("Connectivity:     {:>8.2}% ({:?})", pct(flood_time), flood_time);
    println!("Wilderness:       {:>8.2}% ({:?})", pct(wilderness_time), wilderness_time);
    println!("Pathfinding:      {:>8.2}% ({:?})", pct(path_time), path_time);
    println!("Town:             {:>8.2}% ({:?})", pct(town_time), town_time);
    println!("Field of view:    {:>8.2}% ({:?})", pct(fov_time), fov_time);
    println!("─────────────────────────────────");
    println!("TOTAL:            {:>8}  {:?}", "100%", total);
}
