use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use highway_sim::simulation::{
    load_environment, Command, FileBoostStore, JsonLinesLink, LaneDirection, LaneOccupancy,
    SimConfig, SimWorld, Throttle, DEFAULT_BOOST_FILE,
};

/// How far ahead in its own lane the autopilot starts looking for a way out
const AUTOPILOT_LOOKAHEAD: f32 = 260.0;
/// Vertical clearance the autopilot wants in a lane before moving into it
const AUTOPILOT_CLEARANCE: f32 = 150.0;

#[derive(Parser)]
#[command(name = "highway_sim")]
#[command(about = "Headless lane-based highway driving simulation")]
struct Cli {
    /// Number of simulation ticks to run
    #[arg(long, default_value = "3600")]
    ticks: u32,

    /// Time delta per tick in seconds
    #[arg(long, default_value = "0.0166667")]
    delta: f32,

    /// JSON config file (canvas, lanes, env, tuning, boost)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON environment catalog
    #[arg(long)]
    environments: Option<PathBuf>,

    /// Where the boost record is persisted
    #[arg(long, default_value = DEFAULT_BOOST_FILE)]
    boost_file: PathBuf,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Write one telemetry JSON line per tick to this file
    #[arg(long)]
    telemetry: Option<PathBuf>,

    /// Print the road map every N ticks (0 = only at the end)
    #[arg(long, default_value = "0")]
    map_every: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    run_headless(&cli)
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(cli: &Cli) -> Result<()> {
    info!(
        "Running highway simulation headless: {} ticks of {}s",
        cli.ticks, cli.delta
    );

    let config = SimConfig::load_or_default(cli.config.as_deref());
    let mut env_rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    let environment = load_environment(
        cli.environments.as_deref(),
        config.env.as_deref(),
        &mut env_rng,
    );
    let store = Box::new(FileBoostStore::new(cli.boost_file.clone()));

    let mut world = match cli.seed {
        Some(seed) => SimWorld::new_with_seed(config, environment, store, seed),
        None => SimWorld::new(config, environment, store),
    };

    if let Some(path) = &cli.telemetry {
        let file = File::create(path)
            .with_context(|| format!("Cannot create telemetry file {}", path.display()))?;
        world.attach_telemetry(Box::new(JsonLinesLink::new(BufWriter::new(file))));
    }

    world.apply(Command::Throttle(Throttle::Forward));

    for tick in 1..=cli.ticks {
        if let Some(command) = autopilot(&world) {
            world.apply(command);
        }
        let report = world.tick(cli.delta);
        if report.crashed {
            warn!("Crashed at tick {}", tick);
            break;
        }
        if cli.map_every > 0 && tick % cli.map_every == 0 {
            println!(
                "--- After tick {} ({:.1}s simulated time) ---",
                tick, world.clock.elapsed
            );
            world.print_summary();
            world.draw_map();
        }
    }

    world.flush_boost();

    println!("=== Final State ===");
    world.print_summary();
    world.draw_map();

    let boost = world.boost().resource();
    info!("=== RUN COMPLETE ===");
    info!("Score: {}", world.game_state.display_score());
    info!("Distance: {:.0}", world.game_state.distance);
    info!("Level: {}", world.game_state.level);
    info!("Vehicles passed: {}", world.game_state.vehicles_passed);
    info!(
        "Boost: {:?} {:.2}/{:.0}",
        boost.state(),
        boost.remaining(),
        boost.max()
    );
    Ok(())
}

/// Dodge into the neighbor lane with the most open road when something is
/// close ahead in the player's lane
fn autopilot(world: &SimWorld) -> Option<Command> {
    let player = &world.player;
    if player.lane.is_changing_lane {
        return None;
    }

    let grid = &world.grid;
    let tuning = &world.config().tuning;
    let occupancy = LaneOccupancy::from_map(grid.lane_count(), &world.traffic);
    let lane = player.lane.current_lane;
    let blocked_ahead = occupancy
        .in_window(lane, player.y - AUTOPILOT_LOOKAHEAD, player.y)
        .next()
        .is_some();
    if !blocked_ahead {
        return None;
    }

    [LaneDirection::Left, LaneDirection::Right]
        .into_iter()
        .filter_map(|direction| {
            let target = grid.neighbor(lane, direction.offset())?;
            let clear = !occupancy.any_near(target, player.y, AUTOPILOT_CLEARANCE, None);
            clear.then(|| (direction, occupancy.forward_gap(target, player.y, tuning.safe_behind)))
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(direction, _)| Command::ChangeLane(direction))
}
