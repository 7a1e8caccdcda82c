use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use region_generator::ascii::{self, AsciiMode};
use region_generator::config::GeneratorConfig;
use region_generator::export;
use region_generator::world::{build_world, GameContext};

#[derive(Parser, Debug)]
#[command(name = "region_generator")]
#[command(about = "Generate roguelike wilderness and town regions")]
struct Args {
    /// Random seed (config seed, then a random one, when not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON generator config (builtin config if not specified)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Region to export (default: the wilderness)
    #[arg(short, long)]
    region: Option<String>,

    /// Export the region to an ASCII text file
    #[arg(long)]
    ascii_out: Option<PathBuf>,

    /// Export the region to a PNG preview
    #[arg(long)]
    png_out: Option<PathBuf>,

    /// Ticks to simulate before exporting
    #[arg(short, long, default_value = "0")]
    turns: u64,

    /// Player view radius used for the fog of war (config default if not specified)
    #[arg(long)]
    fov_radius: Option<usize>,

    /// Draw the PNG without fog of war
    #[arg(long)]
    no_fog: bool,

    /// Include block weights and entity data in the ASCII export
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    if let Err(err) = run(&args) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => GeneratorConfig::from_file(path)?,
        None => GeneratorConfig::builtin(),
    };
    let seed = args.seed.or(config.world.seed).unwrap_or_else(rand::random);

    println!("Generating world with seed: {}", seed);
    let mut ctx = GameContext::new(&config, seed);
    build_world(&mut ctx, &config.world)?;
    for name in ctx.repository.names() {
        if let Some(region) = ctx.repository.get(name) {
            println!(
                "  {:16} {:?} {}x{} ({} entities)",
                name,
                region.kind,
                region.grid.width(),
                region.grid.height(),
                region.entities.len()
            );
        }
    }

    if let Some(name) = &args.region {
        ctx.enter_region(name)?;
    }
    if args.turns > 0 {
        let turns = ctx.wait(args.turns);
        println!("Simulated {} ticks ({} entity turns)", args.turns, turns);
    }

    let radius = args.fov_radius.unwrap_or(config.visibility.default_radius);
    let visible = ctx.player_visibility(Some(radius));
    let region = ctx.current_region().ok_or("no current region")?;
    info!(region = %region.name, radius, "exporting");

    if let Some(path) = &args.ascii_out {
        ascii::export_region_file(region, seed, path, args.verbose)?;
        println!("Wrote {}", path.display());
    }
    if let Some(path) = &args.png_out {
        let fog = if args.no_fog { None } else { visible.as_ref() };
        export::export_region_png(region, fog, path)?;
        println!("Wrote {}", path.display());
    }
    if args.ascii_out.is_none() && args.png_out.is_none() {
        ascii::print_ascii_map(region, AsciiMode::Tiles);
    }

    Ok(())
}
