#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bootstrap system that runs the whole dungeon pipeline from a set of options.
//!
//! A single [`GenerationRng`] seeded from [`DungeonOptions::seed`] drives every
//! step in a fixed order: carve the maze, solve it, sparsify it, close
//! deadends, build the world, place rooms layer by layer, then wall them in.

use std::{fmt, str::FromStr};

use delve_core::{DoorOdds, Event, GenerationRng, Mask, Point, SizeRange};
use delve_system_layout::{DoorPlanner, RoomOutline, RoomPlanner};
use delve_system_maze::{Maze, MazeConfig};
use delve_world::{self as world, query, World};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Everything needed to generate a dungeon.
#[derive(Clone, Debug, PartialEq)]
pub struct DungeonOptions {
    /// Maze columns. Replaced by the mask width when a mask is supplied.
    pub width: u32,
    /// Maze rows. Replaced by the mask height when a mask is supplied.
    pub height: u32,
    /// Maze layers.
    pub depth: u32,
    /// Seed for the generation stream.
    pub seed: u64,
    /// Cell the solution starts from.
    pub start: Point,
    /// Cell the solution ends at; `None` selects the far corner.
    pub end: Option<Point>,
    /// Chance out of 100 that the carving walk turns.
    pub randomness: u32,
    /// Number of sparsify passes.
    pub sparseness: u32,
    /// Chance out of 100 that each deadend is joined back into the maze.
    pub deadends: u32,
    /// Rooms per layer.
    pub rooms: SizeRange,
    /// Room width range.
    pub room_width: SizeRange,
    /// Room height range.
    pub room_height: SizeRange,
    /// Odds that a door is hidden.
    pub doors: DoorOdds,
    /// Optional mask restricting the playable area.
    pub mask: Option<Mask>,
}

impl Default for DungeonOptions {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            depth: 1,
            seed: 0,
            start: Point::new(0, 0, 0),
            end: None,
            randomness: 100,
            sparseness: 0,
            deadends: 0,
            rooms: SizeRange::fixed(0),
            room_width: SizeRange::fixed(0),
            room_height: SizeRange::fixed(0),
            doors: DoorOdds::default(),
            mask: None,
        }
    }
}

impl DungeonOptions {
    /// Checks that every range and percentage is consistent.
    pub fn validate(&self) -> Result<(), OptionsError> {
        for (name, range) in [
            ("rooms", self.rooms),
            ("room width", self.room_width),
            ("room height", self.room_height),
        ] {
            if !range.is_ordered() {
                return Err(OptionsError::InvertedRange {
                    name,
                    min: range.min,
                    max: range.max,
                });
            }
        }

        for (name, value) in [
            ("randomness", self.randomness),
            ("deadends", self.deadends),
            ("secret door", self.doors.secret),
            ("concealed door", self.doors.concealed),
        ] {
            if value > 100 {
                return Err(OptionsError::PercentageOutOfRange { name, value });
            }
        }
        Ok(())
    }

    /// Maze dimensions after the mask, if any, has been taken into account.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32, u32) {
        match &self.mask {
            Some(mask) => (mask.width(), mask.height(), self.depth),
            None => (self.width, self.height, self.depth),
        }
    }

    /// Derives the sparsify pass count from a preset and the current size.
    pub fn apply_sparseness(&mut self, preset: Sparseness) {
        let (width, height, _) = self.dimensions();
        self.sparseness = preset.passes(width, height);
    }

    /// Derives the rooms-per-layer range from a preset, the size and the room sizes.
    pub fn apply_room_density(&mut self, preset: RoomDensity) {
        let (width, height, _) = self.dimensions();
        self.rooms = preset.room_count(width, height, self.room_width, self.room_height);
    }

    fn mask_or_full(&self) -> Mask {
        self.mask
            .clone()
            .unwrap_or_else(|| Mask::new(self.width, self.height))
    }

    fn maze_config(&self) -> MazeConfig {
        let (width, height, depth) = self.dimensions();
        MazeConfig {
            start: self.start,
            end: self.end,
            randomness: self.randomness,
            ..MazeConfig::new(width, height, depth)
        }
    }
}

/// Problems with a set of [`DungeonOptions`] or a preset name.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    /// A range whose minimum exceeds its maximum.
    #[error("{name} range is inverted ({min} > {max})")]
    InvertedRange {
        /// Which range.
        name: &'static str,
        /// Supplied minimum.
        min: u32,
        /// Supplied maximum.
        max: u32,
    },
    /// A percentage above 100.
    #[error("{name} percentage must be at most 100 (received {value})")]
    PercentageOutOfRange {
        /// Which percentage.
        name: &'static str,
        /// Supplied value.
        value: u32,
    },
    /// A preset name that is not recognised.
    #[error("unknown {kind} preset `{value}`")]
    UnknownPreset {
        /// Preset family.
        kind: &'static str,
        /// Supplied name.
        value: String,
    },
}

/// How aggressively deadends are trimmed, scaled by the dungeon size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sparseness {
    /// No trimming.
    Dense,
    /// A quarter of the mean side length.
    Crowded,
    /// Half of the mean side length.
    Some,
    /// Three quarters of the mean side length.
    Quite,
    /// The full mean side length.
    Very,
}

impl Sparseness {
    /// Every preset in increasing order.
    pub const ALL: [Self; 5] = [Self::Dense, Self::Crowded, Self::Some, Self::Quite, Self::Very];

    const fn factor(self) -> f64 {
        match self {
            Self::Dense => 0.0,
            Self::Crowded => 0.25,
            Self::Some => 0.5,
            Self::Quite => 0.75,
            Self::Very => 1.0,
        }
    }

    /// Preset name as accepted by [`FromStr`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dense => "dense",
            Self::Crowded => "crowded",
            Self::Some => "some",
            Self::Quite => "quite",
            Self::Very => "very",
        }
    }

    /// Sparsify passes for a maze of the given size.
    #[must_use]
    pub fn passes(self, width: u32, height: u32) -> u32 {
        to_count(mean_side(width, height) * self.factor())
    }
}

impl fmt::Display for Sparseness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Sparseness {
    type Err = OptionsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| OptionsError::UnknownPreset {
                kind: "sparseness",
                value: value.to_owned(),
            })
    }
}

/// How many rooms each layer receives, scaled by the dungeon and room sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoomDensity {
    /// No rooms.
    None,
    /// Half to one times the base count.
    Few,
    /// One to two times the base count.
    Some,
    /// Two to four times the base count.
    Many,
    /// Four to eight times the base count.
    Lots,
}

impl RoomDensity {
    /// Every preset in increasing order.
    pub const ALL: [Self; 5] = [Self::None, Self::Few, Self::Some, Self::Many, Self::Lots];

    const fn factors(self) -> (f64, f64) {
        match self {
            Self::None => (0.0, 0.0),
            Self::Few => (0.5, 1.0),
            Self::Some => (1.0, 2.0),
            Self::Many => (2.0, 4.0),
            Self::Lots => (4.0, 8.0),
        }
    }

    /// Preset name as accepted by [`FromStr`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Few => "few",
            Self::Some => "some",
            Self::Many => "many",
            Self::Lots => "lots",
        }
    }

    /// Rooms-per-layer range for a maze of the given size and room size ranges.
    ///
    /// The base count is four times the mean side length divided by the mean
    /// room footprint `(w_min + w_max) / 2 + (h_min + h_max) / 2`. Both the
    /// side length and the footprint are truncated to whole cells first.
    #[must_use]
    pub fn room_count(
        self,
        width: u32,
        height: u32,
        room_width: SizeRange,
        room_height: SizeRange,
    ) -> SizeRange {
        let footprint = (f64::from(room_width.min) + f64::from(room_width.max)) / 2.0
            + (f64::from(room_height.min) + f64::from(room_height.max)) / 2.0;
        let footprint = footprint.floor();
        if footprint < 1.0 {
            return SizeRange::fixed(0);
        }
        let base = mean_side(width, height) * 4.0 / footprint;
        let (low, high) = self.factors();
        SizeRange::new(to_count(base * low), to_count(base * high))
    }
}

impl fmt::Display for RoomDensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RoomDensity {
    type Err = OptionsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| OptionsError::UnknownPreset {
                kind: "room density",
                value: value.to_owned(),
            })
    }
}

/// Mean side length in whole cells.
fn mean_side(width: u32, height: u32) -> f64 {
    ((f64::from(width) + f64::from(height)) / 2.0).floor()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_count(value: f64) -> u32 {
    value.floor().clamp(0.0, f64::from(u32::MAX)) as u32
}

/// A carved maze together with the route found before any cycles were added.
#[derive(Clone, Debug)]
pub struct MazeRun {
    /// The maze after sparsifying and closing deadends.
    pub maze: Maze,
    /// Route from start to end in maze coordinates. Empty when none exists.
    pub solution: Vec<Point>,
}

/// Result of the full pipeline.
#[derive(Clone, Debug)]
pub struct Dungeon {
    /// Seed the dungeon was generated from.
    pub seed: u64,
    /// The dungeon state, ready to be queried.
    pub world: World,
}

/// Carves, solves, sparsifies and loops a maze.
pub fn generate_maze(
    options: &DungeonOptions,
    rng: &mut GenerationRng,
) -> Result<MazeRun, OptionsError> {
    options.validate()?;

    let mut maze = Maze::new(options.maze_config(), options.mask_or_full());
    if maze.is_inert() {
        warn!("maze has no cells, generation skipped");
        return Ok(MazeRun {
            maze,
            solution: Vec::new(),
        });
    }

    maze.generate(rng);
    let solution = maze.solve();
    if solution.is_empty() {
        warn!(start = %maze.start(), end = %maze.end(), "no route between start and end");
    }
    maze.sparsify(options.sparseness);
    maze.clear_deadends(options.deadends, rng);

    debug!(
        solution = solution.len(),
        sparseness = options.sparseness,
        deadends = options.deadends,
        "maze ready"
    );
    Ok(MazeRun { maze, solution })
}

/// Runs the whole pipeline and returns the finished dungeon.
pub fn generate_dungeon(options: &DungeonOptions) -> Result<Dungeon, OptionsError> {
    let mut rng = GenerationRng::new(options.seed);
    let MazeRun { maze, solution } = generate_maze(options, &mut rng)?;
    let mut world = World::from_maze(&maze, &solution);

    let mut events = Vec::new();
    place_rooms(&mut world, options, &mut rng, &mut events);
    raise_walls(&mut world, options, &mut rng, &mut events);

    let rejected = events
        .iter()
        .filter(|event| matches!(event, Event::CommandRejected { .. }))
        .count();
    if rejected > 0 {
        warn!(rejected, "world rejected layout commands");
    }

    info!(
        seed = options.seed,
        rooms = query::rooms(&world).len(),
        walls = query::walls(&world).len(),
        "dungeon generated"
    );
    Ok(Dungeon {
        seed: options.seed,
        world,
    })
}

fn place_rooms(
    world: &mut World,
    options: &DungeonOptions,
    rng: &mut GenerationRng,
    events: &mut Vec<Event>,
) {
    let grid = query::extent(world);
    if grid.is_degenerate() {
        return;
    }
    let planner = RoomPlanner::new(options.rooms, options.room_width, options.room_height);

    for layer in 0..grid.depth() {
        let count = planner.room_count(rng);
        for _ in 0..count {
            let mut commands = Vec::new();
            planner.plan_room(
                grid,
                layer,
                query::mask(world),
                |point| query::cell_kind(world, point),
                rng,
                &mut commands,
            );
            for command in commands {
                world::apply(world, command, events);
            }
        }
        debug!(
            layer,
            requested = count,
            placed = query::rooms_on_layer(world, layer).count(),
            "layer furnished"
        );
    }
}

fn raise_walls(
    world: &mut World,
    options: &DungeonOptions,
    rng: &mut GenerationRng,
    events: &mut Vec<Event>,
) {
    let planner = DoorPlanner::new(options.doors);
    let outlines: Vec<RoomOutline> = query::rooms(world)
        .iter()
        .map(|room| RoomOutline {
            room: room.id(),
            origin: room.origin(),
            width: room.width(),
            height: room.height(),
        })
        .collect();

    for outline in outlines {
        let mut commands = Vec::new();
        planner.plan(outline, |point| query::cell_kind(world, point), rng, &mut commands);
        for command in commands {
            world::apply(world, command, events);
        }
    }
}
