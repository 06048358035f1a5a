#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a headless Rocket TD game.
//!
//! The binary lays out a level, spends the starting gold on rocket towers
//! next to the spawn, runs the requested number of frames while buying
//! upgrades with kill bonuses, and prints a summary followed by the level.

mod autoplay;
mod treasury;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rocket_td_core::{Gold, TargetingStrategy};
use rocket_td_rendering::{AsciiSink, ManifestSink, Renderable, SpriteManifest};
use rocket_td_system_maze::Maze;
use rocket_td_system_simulation::{GameConfig, Simulation, RNG_STREAM_LAYOUT};
use rocket_td_world::query;

use treasury::Treasury;

#[derive(Debug, Parser)]
#[command(name = "rocket-td")]
#[command(about = "Play a headless Rocket TD game and print the outcome")]
struct Args {
    /// TOML game configuration; missing keys keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the configured seed
    #[arg(long)]
    seed: Option<u64>,
    /// Overrides the number of maze columns
    #[arg(long)]
    columns: Option<u32>,
    /// Overrides the number of maze rows
    #[arg(long)]
    rows: Option<u32>,
    /// Maximum number of frames to simulate
    #[arg(long, default_value_t = 6_000)]
    frames: u32,
    /// Simulated duration of a frame in milliseconds
    #[arg(long, default_value_t = 50)]
    frame_ms: u64,
    /// Maximum number of towers placed before the first frame
    #[arg(long, default_value_t = 4)]
    towers: usize,
    /// Targeting strategy of the placed towers
    #[arg(long, default_value = "lowest-health")]
    strategy: String,
    /// Starting gold
    #[arg(long, default_value_t = 50)]
    gold: u32,
    /// Starting base health
    #[arg(long, default_value_t = 20)]
    base_hp: u32,
    /// Print the rasterized maze with its solution path and exit
    #[arg(long)]
    dump_maze: bool,
    /// Sprite manifest; assets it lacks are drawn as placeholders
    #[arg(long)]
    sprites: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let sprites = args.sprites.as_deref().map(load_sprites).transpose()?;

    if args.dump_maze {
        print!("{}", dump_maze(&config)?);
        return Ok(());
    }

    let strategy = TargetingStrategy::from_name(&args.strategy).unwrap_or_else(|| {
        tracing::error!(
            strategy = %args.strategy,
            "unknown targeting strategy, using insertion order"
        );
        TargetingStrategy::default()
    });

    let mut simulation = Simulation::new(&config).context("failed to set up the game")?;
    let mut treasury = Treasury::new(Gold::new(args.gold), args.base_hp);
    let mut events = Vec::new();
    let towers = autoplay::place_towers(
        &mut simulation,
        &mut treasury,
        args.towers,
        strategy,
        &mut events,
    );

    let frame = Duration::from_millis(args.frame_ms);
    let mut played = 0;
    let mut upgrades = 0;
    while played < args.frames && !simulation.is_over() && !treasury.is_defeated() {
        events.clear();
        simulation.calculate(frame, &mut events);
        treasury.record(&events);
        upgrades += autoplay::buy_upgrades(&mut simulation, &mut treasury, &mut events);
        played += 1;
    }

    let world = simulation.world();
    let outcome = if treasury.is_defeated() {
        "defeat"
    } else if simulation.is_over() {
        "victory"
    } else {
        "unfinished"
    };

    println!("=== ROCKET TD ===");
    println!("  Seed:       {}", config.seed);
    println!("  Outcome:    {outcome}");
    let waves = simulation.waves();
    println!(
        "  Waves:      {}/{}",
        (waves.current_wave() + 1).min(waves.wave_count()),
        waves.wave_count()
    );
    println!(
        "  Frames:     {played} ({:.1}s)",
        query::elapsed(world).as_secs_f64()
    );
    println!("  Towers:     {towers} ({upgrades} upgrades)");
    println!("  Kills:      {}", treasury.kills());
    println!("  Leaks:      {}", treasury.leaks());
    println!("  Gold:       {}", treasury.gold().get());
    println!("  Base HP:    {}", treasury.base_hp());
    println!();

    let mut sink = AsciiSink::for_level(query::level(world));
    match &sprites {
        Some(manifest) => world.display(&mut ManifestSink::new(manifest, &mut sink)),
        None => world.display(&mut sink),
    }
    print!("{}", sink.render());
    Ok(())
}

fn load_sprites(path: &Path) -> Result<SpriteManifest> {
    let manifest = SpriteManifest::from_path(path)?;
    for asset in manifest.missing() {
        tracing::warn!(asset = asset.name(), "sprite manifest has no image for asset");
    }
    Ok(manifest)
}

fn load_config(args: &Args) -> Result<GameConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read game config at {}", path.display()))?;
            GameConfig::from_toml_str(&contents)
                .with_context(|| format!("invalid game config at {}", path.display()))?
        }
        None => GameConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(columns) = args.columns {
        config.layout.maze_columns = columns;
    }
    if let Some(rows) = args.rows {
        config.layout.maze_rows = rows;
    }
    Ok(config)
}

/// Replays the layout stream up to the solution search and renders the pixels.
fn dump_maze(config: &GameConfig) -> Result<String> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.stream_seed(RNG_STREAM_LAYOUT));
    let maze = Maze::generate(config.layout.maze_columns, config.layout.maze_rows, &mut rng)
        .context("failed to generate the maze")?;
    let mut pixels = maze.rasterize(true);
    let _ = pixels
        .attach_entrance_and_exit(&mut rng)
        .context("failed to attach entrance and exit")?;
    let _ = pixels
        .find_longest_solution_path(false, &mut rng)
        .context("failed to find a solution path")?;
    Ok(pixels.to_ascii())
}
