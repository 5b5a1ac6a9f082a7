use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::PathBuf;

use grid_traffic::simulation::{
    SimConfig, SimWorld, WorldLayout, DEFAULT_HEIGHT, DEFAULT_INITIAL_CARS, DEFAULT_LIFETIME_CAP,
    DEFAULT_MAX_CARS, DEFAULT_WIDTH,
};

#[derive(Parser)]
#[command(name = "grid_traffic")]
#[command(about = "Grid city traffic simulation")]
struct Cli {
    /// Number of simulation ticks to run
    #[arg(long, default_value = "100")]
    ticks: u64,

    /// Grid width in cells
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    width: i32,

    /// Grid height in cells
    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    height: i32,

    /// Cars spawned before the first tick
    #[arg(long, default_value_t = DEFAULT_INITIAL_CARS)]
    initial_cars: usize,

    /// Maximum number of cars on the grid at once
    #[arg(long, default_value_t = DEFAULT_MAX_CARS)]
    max_cars: usize,

    /// Maximum number of cars spawned over the whole run
    #[arg(long, default_value_t = DEFAULT_LIFETIME_CAP)]
    lifetime_cap: usize,

    /// Seed for reproducible spot selection
    #[arg(long)]
    seed: Option<u64>,

    /// Feature layout file (buildings, spots, lights, lanes); the demo city is used if omitted
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Extra lane direction layout files
    #[arg(long)]
    directions: Vec<PathBuf>,

    /// Primary-flow layout file
    #[arg(long)]
    flow: Option<PathBuf>,

    /// Print one JSON snapshot per tick instead of maps
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = SimConfig::new(cli.width, cli.height)
        .with_initial_cars(cli.initial_cars)
        .with_max_cars(cli.max_cars)
        .with_lifetime_cap(cli.lifetime_cap);
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    let layout = match &cli.layout {
        Some(path) => WorldLayout::from_files(
            cli.width,
            cli.height,
            path.clone(),
            &cli.directions,
            cli.flow.clone(),
        )?,
        None => WorldLayout::demo(),
    };

    let mut world = SimWorld::from_layout(&layout, config);
    run_headless(&mut world, cli.ticks, cli.json)
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(world: &mut SimWorld, ticks: u64, json: bool) -> Result<()> {
    info!("Running traffic simulation for {} ticks", ticks);

    if !json {
        println!("Initial state:");
        world.print_summary();
        world.draw_map();
    }

    for _ in 0..ticks {
        let snapshot = world.tick();
        if json {
            println!("{}", snapshot.to_json()?);
        } else if world.tick_count % 10 == 0 {
            println!("--- After tick {} ---", world.tick_count);
            world.print_summary();
            world.draw_map();
        }
    }

    let stats = world.stats();
    info!("=== SIMULATION COMPLETE ===");
    info!("Ticks run: {}", stats.ticks);
    info!("Total cars spawned: {}", stats.total_cars_spawned);
    info!("Total cars finished: {}", stats.total_cars_finished);
    info!("Active cars: {}", stats.active_cars);
    info!("Free spots: {}/{}", stats.free_spots, stats.total_spots);
    Ok(())
}
