#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that generates Delve mazes and dungeons.

mod config;
mod report;

use std::{
    io::{self, IsTerminal},
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use delve_core::{DoorOdds, GenerationRng, Mask, Point, SizeRange};
use delve_rendering::{Painter, Presentation, Scene};
use delve_rendering_text::{TextPainter, TextStyle};
use delve_system_bootstrap::{
    generate_dungeon, generate_maze, DungeonOptions, RoomDensity, Sparseness,
};
use delve_world::{query, World};
use tracing::info;
use tracing_subscriber::EnvFilter;

use self::config::FileConfig;

/// Randomness used by `delve maze` when none is configured.
const MAZE_RANDOMNESS: u32 = 50;

#[derive(Debug, Parser)]
#[command(name = "delve", author, version, about = "Generate mazes and roomed dungeons")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Carve a maze and print it as line art.
    Maze(MazeArgs),
    /// Build a dungeon and print its map and room listing.
    Dungeon(DungeonArgs),
}

/// Flags shared by both subcommands.
#[derive(Clone, Debug, Default, Args)]
struct GeneratorArgs {
    /// Maze columns.
    #[arg(long)]
    width: Option<u32>,
    /// Maze rows.
    #[arg(long)]
    height: Option<u32>,
    /// Maze layers.
    #[arg(long)]
    depth: Option<u32>,
    /// Seed for the generator; defaults to the clock.
    #[arg(long)]
    seed: Option<u64>,
    /// Chance out of 100 that the carving walk turns.
    #[arg(long)]
    randomness: Option<u32>,
    /// Number of deadend trimming passes.
    #[arg(long)]
    sparseness: Option<u32>,
    /// Chance out of 100 that each deadend is joined back into the maze.
    #[arg(long)]
    deadends: Option<u32>,
    /// Start cell as `x,y,z`.
    #[arg(long, value_parser = parse_point)]
    start: Option<Point>,
    /// End cell as `x,y,z`.
    #[arg(long, value_parser = parse_point)]
    end: Option<Point>,
    /// Mask file restricting the playable area.
    #[arg(long)]
    mask: Option<PathBuf>,
    /// TOML file providing defaults for any of these flags.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print only this layer.
    #[arg(long)]
    level: Option<u32>,
    /// Force ANSI colors on or off; defaults to on for terminals.
    #[arg(long)]
    color: Option<bool>,
}

#[derive(Clone, Debug, Args)]
struct MazeArgs {
    #[command(flatten)]
    generator: GeneratorArgs,
    /// Mark the route from start to end.
    #[arg(long)]
    solution: bool,
}

#[derive(Clone, Debug, Args)]
struct DungeonArgs {
    #[command(flatten)]
    generator: GeneratorArgs,
    /// Rooms per layer as `min,max`.
    #[arg(long, value_parser = parse_range)]
    room_count: Option<SizeRange>,
    /// Room width as `min,max`.
    #[arg(long, value_parser = parse_range)]
    room_width: Option<SizeRange>,
    /// Room height as `min,max`.
    #[arg(long, value_parser = parse_range)]
    room_height: Option<SizeRange>,
    /// Chance out of 100 that a door is secret.
    #[arg(long)]
    secret: Option<u32>,
    /// Chance out of 100 that a door is concealed.
    #[arg(long)]
    concealed: Option<u32>,
    /// Sparseness preset: dense, crowded, some, quite or very.
    #[arg(long)]
    sparse: Option<Sparseness>,
    /// Room preset: none, few, some, many or lots.
    #[arg(long)]
    rooms: Option<RoomDensity>,
}

/// Entry point for the Delve command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Maze(args) => run_maze(&args),
        Commands::Dungeon(args) => run_dungeon(&args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_maze(args: &MazeArgs) -> Result<()> {
    let file = load_config(&args.generator)?;
    let mut options = resolve_generator(&args.generator, &file)?;
    if args.generator.randomness.is_none() && file.randomness.is_none() {
        options.randomness = MAZE_RANDOMNESS;
    }

    let mut rng = GenerationRng::new(options.seed);
    let run = generate_maze(&options, &mut rng).context("invalid maze options")?;
    let solution = if args.solution { run.solution } else { Vec::new() };
    let world = World::from_maze(&run.maze, &solution);

    paint_layers(&world, &args.generator, TextStyle::Maze, |_| Ok(()))
}

fn run_dungeon(args: &DungeonArgs) -> Result<()> {
    let file = load_config(&args.generator)?;
    let options = resolve_dungeon(args, &file)?;

    let dungeon = generate_dungeon(&options).context("invalid dungeon options")?;
    let world = &dungeon.world;

    paint_layers(world, &args.generator, TextStyle::Dungeon, |layer| {
        print!("{}", report::describe_rooms(world, layer));
        Ok(())
    })
}

fn paint_layers<F>(world: &World, args: &GeneratorArgs, style: TextStyle, mut after: F) -> Result<()>
where
    F: FnMut(u32) -> Result<()>,
{
    let depth = query::extent(world).depth();
    if depth == 0 {
        bail!("nothing to draw: the mask has no playable cells");
    }
    let layers = match args.level {
        Some(level) if level >= depth => bail!("level {level} does not exist (depth {depth})"),
        Some(level) => level..level + 1,
        None => 0..depth,
    };

    let stdout = io::stdout();
    let colored = args.color.unwrap_or_else(|| stdout.is_terminal());
    let mut painter = TextPainter::new(stdout.lock(), style).with_colors(colored);
    let presentation = Presentation::default();
    for layer in layers {
        if depth > 1 {
            println!("Level {}:", layer + 1);
        }
        let scene = Scene::from_world(world, layer, &presentation);
        painter.paint(&scene)?;
        after(layer)?;
    }
    Ok(())
}

fn load_config(args: &GeneratorArgs) -> Result<FileConfig> {
    match &args.config {
        Some(path) => FileConfig::load(path),
        None => Ok(FileConfig::default()),
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() ^ u64::from(elapsed.subsec_nanos()))
        .unwrap_or_default()
}

/// Merges defaults, the config file and flags, in increasing priority.
fn resolve_generator(args: &GeneratorArgs, file: &FileConfig) -> Result<DungeonOptions> {
    let defaults = DungeonOptions::default();
    let seed = match args.seed.or(file.seed) {
        Some(seed) => seed,
        None => {
            let seed = clock_seed();
            info!(seed, "no seed given, using the clock");
            seed
        }
    };

    let mask = match args.mask.as_ref().or(file.mask.as_ref()) {
        Some(path) => {
            let mask = Mask::load_or_empty(path);
            if mask.is_empty() {
                bail!("mask {} has no usable cells", path.display());
            }
            Some(mask)
        }
        None => None,
    };

    Ok(DungeonOptions {
        width: args.width.or(file.width).unwrap_or(defaults.width),
        height: args.height.or(file.height).unwrap_or(defaults.height),
        depth: args.depth.or(file.depth).unwrap_or(defaults.depth),
        seed,
        start: args.start.or(file.start).unwrap_or(defaults.start),
        end: args.end.or(file.end),
        randomness: args.randomness.or(file.randomness).unwrap_or(defaults.randomness),
        sparseness: args.sparseness.or(file.sparseness).unwrap_or(defaults.sparseness),
        deadends: args.deadends.or(file.deadends).unwrap_or(defaults.deadends),
        mask,
        ..defaults
    })
}

fn resolve_dungeon(args: &DungeonArgs, file: &FileConfig) -> Result<DungeonOptions> {
    let mut options = resolve_generator(&args.generator, file)?;
    let defaults = DoorOdds::default();

    if let Some(range) = args.room_width.or(file.room_width) {
        options.room_width = range;
    }
    if let Some(range) = args.room_height.or(file.room_height) {
        options.room_height = range;
    }
    options.doors = DoorOdds::new(
        args.secret.or(file.secret).unwrap_or(defaults.secret),
        args.concealed.or(file.concealed).unwrap_or(defaults.concealed),
    );

    let sparse = match (args.sparse, &file.sparse) {
        (Some(preset), _) => Some(preset),
        (None, Some(name)) => Some(name.parse::<Sparseness>()?),
        (None, None) => None,
    };
    if args.generator.sparseness.or(file.sparseness).is_none() {
        if let Some(preset) = sparse {
            options.apply_sparseness(preset);
        }
    }

    let density = match (args.rooms, &file.density) {
        (Some(preset), _) => Some(preset),
        (None, Some(name)) => Some(name.parse::<RoomDensity>()?),
        (None, None) => None,
    };
    match (args.room_count.or(file.rooms), density) {
        (Some(range), _) => options.rooms = range,
        (None, Some(preset)) => options.apply_room_density(preset),
        (None, None) => {}
    }

    options.validate()?;
    Ok(options)
}

fn parse_point(value: &str) -> Result<Point, String> {
    let parts = parse_numbers(value)?;
    match parts.as_slice() {
        [x, y] => Ok(Point::new(*x, *y, 0)),
        [x, y, z] => Ok(Point::new(*x, *y, *z)),
        _ => Err(format!("expected `x,y` or `x,y,z`, got `{value}`")),
    }
}

fn parse_range(value: &str) -> Result<SizeRange, String> {
    let parts = parse_numbers(value)?;
    match parts.as_slice() {
        [fixed] => Ok(SizeRange::fixed(*fixed)),
        [min, max] => Ok(SizeRange::new(*min, *max)),
        _ => Err(format!("expected `n` or `min,max`, got `{value}`")),
    }
}

fn parse_numbers(value: &str) -> Result<Vec<u32>, String> {
    value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<u32>()
                .map_err(|error| format!("`{part}` is not a whole number: {error}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("arguments should parse")
    }

    fn dungeon_args(args: &[&str]) -> DungeonArgs {
        match parse(args).command {
            Commands::Dungeon(args) => args,
            Commands::Maze(_) => panic!("expected the dungeon subcommand"),
        }
    }

    #[test]
    fn maze_flags_parse() {
        let cli = parse(&[
            "delve", "maze", "--width", "12", "--start", "1,2", "--end", "3,4,1", "--solution",
        ]);
        let Commands::Maze(args) = cli.command else {
            panic!("expected the maze subcommand");
        };

        assert!(args.solution);
        assert_eq!(args.generator.width, Some(12));
        assert_eq!(args.generator.start, Some(Point::new(1, 2, 0)));
        assert_eq!(args.generator.end, Some(Point::new(3, 4, 1)));
    }

    #[test]
    fn malformed_points_are_rejected() {
        assert!(Cli::try_parse_from(["delve", "maze", "--start", "1,x"]).is_err());
        assert!(Cli::try_parse_from(["delve", "maze", "--start", "1,2,3,4"]).is_err());
    }

    #[test]
    fn dungeon_presets_parse() {
        let args = dungeon_args(&["delve", "dungeon", "--sparse", "quite", "--rooms", "many"]);
        assert_eq!(args.sparse, Some(Sparseness::Quite));
        assert_eq!(args.rooms, Some(RoomDensity::Many));
        assert!(Cli::try_parse_from(["delve", "dungeon", "--rooms", "heaps"]).is_err());
    }

    #[test]
    fn flags_override_the_config_file() {
        let args = dungeon_args(&[
            "delve", "dungeon", "--seed", "7", "--width", "20", "--room-width", "2,4",
        ]);
        let file = FileConfig::parse(
            r#"
            width = 30
            height = 14
            seed = 99
            room_width = { min = 5, max = 6 }
            room_height = { min = 1, max = 3 }
            secret = 15
            "#,
        )
        .expect("valid toml");

        let options = resolve_dungeon(&args, &file).expect("consistent options");

        assert_eq!(options.seed, 7);
        assert_eq!((options.width, options.height), (20, 14));
        assert_eq!(options.room_width, SizeRange::new(2, 4));
        assert_eq!(options.room_height, SizeRange::new(1, 3));
        assert_eq!(options.doors, DoorOdds::new(15, 5));
    }

    #[test]
    fn presets_fill_in_unset_numbers() {
        let args = dungeon_args(&[
            "delve", "dungeon", "--seed", "1", "--width", "20", "--height", "12",
            "--room-width", "2,4", "--room-height", "2,4", "--sparse", "some", "--rooms", "few",
        ]);
        let options = resolve_dungeon(&args, &FileConfig::default()).expect("consistent options");

        assert_eq!(options.sparseness, 8);
        // mean side 16, footprint 6
        assert_eq!(options.rooms, SizeRange::new(5, 10));
    }

    #[test]
    fn presets_use_whole_cell_means() {
        let args = dungeon_args(&[
            "delve", "dungeon", "--seed", "1", "--width", "13", "--height", "14",
            "--room-width", "2,3", "--room-height", "2", "--sparse", "quite", "--rooms", "some",
        ]);
        let options = resolve_dungeon(&args, &FileConfig::default()).expect("consistent options");

        assert_eq!(options.sparseness, 9);
        // mean side 13, footprint 4
        assert_eq!(options.rooms, SizeRange::new(13, 26));
    }

    #[test]
    fn explicit_counts_beat_presets() {
        let args = dungeon_args(&[
            "delve", "dungeon", "--seed", "1", "--sparseness", "3", "--sparse", "very",
            "--room-count", "2", "--rooms", "lots",
        ]);
        let options = resolve_dungeon(&args, &FileConfig::default()).expect("consistent options");

        assert_eq!(options.sparseness, 3);
        assert_eq!(options.rooms, SizeRange::fixed(2));
    }

    #[test]
    fn inverted_ranges_fail_resolution() {
        let args = dungeon_args(&["delve", "dungeon", "--seed", "1", "--room-height", "4,2"]);
        let error = resolve_dungeon(&args, &FileConfig::default()).expect_err("inverted range");
        assert!(error.to_string().contains("room height"));
    }

    #[test]
    fn unknown_presets_in_the_file_fail_resolution() {
        let args = dungeon_args(&["delve", "dungeon", "--seed", "1"]);
        let file = FileConfig::parse("density = \"heaps\"").expect("valid toml");
        assert!(resolve_dungeon(&args, &file).is_err());
    }
}
