#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Delve dungeon generator.
//!
//! This crate defines the vocabulary that connects the maze engine, the
//! authoritative dungeon world, the layout systems and the adapters. Systems
//! describe desired mutations as [`Command`] values, the world executes them
//! through its `apply` entry point and reports the outcome as [`Event`] values.
//! Every randomized decision draws from a single [`GenerationRng`] that the
//! caller owns and threads through each step.

mod mask;
mod rng;
mod weighted;

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

pub use mask::{Mask, MaskError};
pub use rng::GenerationRng;
pub use weighted::WeightedList;

/// Commands that express all permissible dungeon mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Converts a rectangle of the occupancy grid into a room.
    CarveRoom {
        /// Upper-left cell of the room; `z` selects the layer.
        origin: Point,
        /// Number of columns covered by the room.
        width: u32,
        /// Number of rows covered by the room.
        height: u32,
    },
    /// Records a plain wall separating a room cell from its outside neighbor.
    RaiseWall {
        /// Room the wall bounds.
        room: RoomId,
        /// Edge cell that belongs to the room.
        inside: Point,
        /// Neighbor on the far side of the wall.
        outside: Point,
    },
    /// Turns the wall between two points into a door of the given kind.
    HangDoor {
        /// One side of the wall.
        first: Point,
        /// The other side of the wall.
        second: Point,
        /// Door variant to install.
        kind: WallKind,
    },
    /// Attaches externally produced content to a room.
    AttachRoomAttribute {
        /// Room receiving the payload.
        room: RoomId,
        /// Payload to store.
        attribute: Attribute,
    },
    /// Attaches externally produced content to a wall.
    AttachWallAttribute {
        /// Wall receiving the payload.
        wall: WallId,
        /// Payload to store.
        attribute: Attribute,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a room was carved into the grid.
    RoomCarved {
        /// Identifier allocated to the room.
        room: RoomId,
        /// Upper-left cell of the room.
        origin: Point,
        /// Number of columns covered by the room.
        width: u32,
        /// Number of rows covered by the room.
        height: u32,
    },
    /// Confirms that a wall was attached to a room.
    WallRaised {
        /// Room the wall bounds.
        room: RoomId,
        /// Identifier of the wall.
        wall: WallId,
    },
    /// Confirms that a wall became a door.
    DoorHung {
        /// Identifier of the wall that changed.
        wall: WallId,
        /// Door variant now installed.
        kind: WallKind,
    },
    /// Confirms that an attribute payload was stored.
    AttributeAttached {
        /// Entity that received the payload.
        target: AttributeTarget,
    },
    /// Reports that a command could not be applied.
    CommandRejected {
        /// Specific reason the command failed.
        reason: RejectionReason,
    },
}

/// Entity that owns an attribute payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeTarget {
    /// A room in the catalog.
    Room(RoomId),
    /// A wall in the catalog.
    Wall(WallId),
}

/// Reasons the world may refuse a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RejectionReason {
    /// Part of the request lies outside the occupancy grid.
    OutOfBounds,
    /// A room must cover at least one cell.
    DegenerateRoom,
    /// The two points are not orthogonal neighbors.
    NotAdjacent,
    /// No room with the provided identifier exists.
    UnknownRoom,
    /// No wall exists at the requested location or identifier.
    UnknownWall,
    /// Only door variants may be hung.
    NotADoor,
}

/// Location of a single cell in a maze or occupancy grid.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Point {
    x: u32,
    y: u32,
    z: u32,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Column index.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Row index.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Layer index.
    #[must_use]
    pub const fn z(&self) -> u32 {
        self.z
    }

    /// Neighbor one step toward `direction`, or `None` on coordinate underflow.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<Self> {
        let Self { x, y, z } = self;
        match direction {
            Direction::North => y.checked_sub(1).map(|y| Self::new(x, y, z)),
            Direction::South => y.checked_add(1).map(|y| Self::new(x, y, z)),
            Direction::West => x.checked_sub(1).map(|x| Self::new(x, y, z)),
            Direction::East => x.checked_add(1).map(|x| Self::new(x, y, z)),
            Direction::Up => z.checked_sub(1).map(|z| Self::new(x, y, z)),
            Direction::Down => z.checked_add(1).map(|z| Self::new(x, y, z)),
        }
    }

    /// Maps a maze cell onto its cell in the occupancy grid.
    #[must_use]
    pub const fn to_grid(self) -> Self {
        Self {
            x: self.x.saturating_mul(2).saturating_add(1),
            y: self.y.saturating_mul(2).saturating_add(1),
            z: self.z,
        }
    }

    /// Whether `other` differs by exactly one step along exactly one axis.
    #[must_use]
    pub fn is_adjacent(self, other: Self) -> bool {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y) + self.z.abs_diff(other.z) == 1
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Orders a pair of points so the same wall is found from either side.
#[must_use]
pub fn canonical_pair(first: Point, second: Point) -> (Point, Point) {
    if first <= second {
        (first, second)
    } else {
        (second, first)
    }
}

/// Size of a three-dimensional grid stored as one flat buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Extent {
    width: u32,
    height: u32,
    depth: u32,
}

impl Extent {
    /// Creates a new extent.
    #[must_use]
    pub const fn new(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of layers.
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    /// Whether any axis is empty.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0 || self.depth == 0
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let cells = u64::from(self.width) * u64::from(self.height) * u64::from(self.depth);
        usize::try_from(cells).unwrap_or(0)
    }

    /// Whether the point lies inside the extent.
    #[must_use]
    pub const fn contains(&self, point: Point) -> bool {
        point.x < self.width && point.y < self.height && point.z < self.depth
    }

    /// Flat buffer index of the point, or `None` when out of range.
    #[must_use]
    pub fn index(&self, point: Point) -> Option<usize> {
        if !self.contains(point) {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        let height = usize::try_from(self.height).ok()?;
        let x = usize::try_from(point.x).ok()?;
        let y = usize::try_from(point.y).ok()?;
        let z = usize::try_from(point.z).ok()?;
        Some((z * height + y) * width + x)
    }

    /// Iterates every point in buffer order.
    pub fn points(&self) -> impl Iterator<Item = Point> {
        let Self {
            width,
            height,
            depth,
        } = *self;
        (0..depth).flat_map(move |z| {
            (0..height).flat_map(move |y| (0..width).map(move |x| Point::new(x, y, z)))
        })
    }
}

/// The six axis-aligned directions a passage may run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Toward decreasing rows.
    North,
    /// Toward increasing rows.
    South,
    /// Toward decreasing columns.
    West,
    /// Toward increasing columns.
    East,
    /// Toward decreasing layers.
    Up,
    /// Toward increasing layers.
    Down,
}

impl Direction {
    /// Every direction, ordered by exit bit.
    pub const ALL: [Self; 6] = [
        Self::North,
        Self::South,
        Self::West,
        Self::East,
        Self::Up,
        Self::Down,
    ];

    /// Priority order used when searching for a route.
    pub const SEARCH_ORDER: [Self; 6] = [
        Self::North,
        Self::South,
        Self::East,
        Self::West,
        Self::Up,
        Self::Down,
    ];

    /// Direction pointing back the way this one came.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::West => Self::East,
            Self::East => Self::West,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }

    /// Exit bit recorded for a passage in this direction.
    #[must_use]
    pub const fn exit(self) -> Exits {
        match self {
            Self::North => Exits::NORTH,
            Self::South => Exits::SOUTH,
            Self::West => Exits::WEST,
            Self::East => Exits::EAST,
            Self::Up => Exits::UP,
            Self::Down => Exits::DOWN,
        }
    }
}

bitflags! {
    /// Carved passages leaving a maze cell, one bit per [`Direction`].
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Exits: u16 {
        /// Passage toward decreasing rows.
        const NORTH = 0x0001;
        /// Passage toward increasing rows.
        const SOUTH = 0x0002;
        /// Passage toward decreasing columns.
        const WEST = 0x0004;
        /// Passage toward increasing columns.
        const EAST = 0x0008;
        /// Passage toward decreasing layers.
        const UP = 0x0010;
        /// Passage toward increasing layers.
        const DOWN = 0x0020;
        /// Transient bookkeeping bit used while sparsifying.
        const MARK = 0x8000;
    }
}

impl Exits {
    /// Every direction bit, without the mark.
    pub const ALL_DIRECTIONS: Self = Self::from_bits_retain(0x003f);

    /// The single direction of a deadend cell.
    ///
    /// Returns `None` unless exactly one direction bit is set and the cell is
    /// not marked.
    #[must_use]
    pub fn deadend(self) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|direction| self == direction.exit())
    }

    /// Number of carved directions.
    #[must_use]
    pub fn passage_count(self) -> u32 {
        self.intersection(Self::ALL_DIRECTIONS).bits().count_ones()
    }

    /// Carved directions in exit-bit order.
    pub fn directions(self) -> impl Iterator<Item = Direction> {
        Direction::ALL
            .into_iter()
            .filter(move |direction| self.contains(direction.exit()))
    }
}

/// Classification of a cell in the occupancy grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CellKind {
    /// Solid rock.
    #[default]
    Wall,
    /// Corridor carved from the maze.
    Passage,
    /// Floor of a room.
    Room,
}

/// Classification of the boundary between two adjacent cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallKind {
    /// Open floor on both sides.
    #[default]
    None,
    /// Plain wall.
    Wall,
    /// Ordinary door.
    Door,
    /// Door hidden in the wall.
    SecretDoor,
    /// Door hidden behind something.
    ConcealedDoor,
}

impl WallKind {
    /// Whether the boundary can be passed through as a door.
    #[must_use]
    pub const fn is_door(self) -> bool {
        matches!(self, Self::Door | Self::SecretDoor | Self::ConcealedDoor)
    }

    /// Short human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Wall => "wall",
            Self::Door => "normal",
            Self::SecretDoor => "secret",
            Self::ConcealedDoor => "concealed",
        }
    }
}

/// Percentage odds that a door is hidden.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoorOdds {
    /// Chance out of 100 that a door is secret.
    pub secret: u32,
    /// Chance out of 100 that a door is concealed, taken from what secret leaves.
    pub concealed: u32,
}

impl Default for DoorOdds {
    fn default() -> Self {
        Self {
            secret: 5,
            concealed: 5,
        }
    }
}

impl DoorOdds {
    /// Creates new door odds.
    #[must_use]
    pub const fn new(secret: u32, concealed: u32) -> Self {
        Self { secret, concealed }
    }

    /// Door variant selected by a percentile roll in `1..=100`.
    #[must_use]
    pub const fn kind_for_roll(&self, roll: u32) -> WallKind {
        if roll <= self.secret {
            return WallKind::SecretDoor;
        }
        if roll - self.secret <= self.concealed {
            return WallKind::ConcealedDoor;
        }
        WallKind::Door
    }

    /// Rolls a door variant.
    pub fn roll(&self, rng: &mut GenerationRng) -> WallKind {
        self.kind_for_roll(rng.percentile())
    }
}

/// Inclusive range of whole numbers drawn uniformly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SizeRange {
    /// Smallest value that may be drawn.
    pub min: u32,
    /// Largest value that may be drawn.
    pub max: u32,
}

impl SizeRange {
    /// Creates a new range.
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Range that always yields `value`.
    #[must_use]
    pub const fn fixed(value: u32) -> Self {
        Self::new(value, value)
    }

    /// Whether `min` does not exceed `max`.
    #[must_use]
    pub const fn is_ordered(&self) -> bool {
        self.min <= self.max
    }

    /// Draws a value. Fixed ranges consume nothing from the stream.
    pub fn sample(&self, rng: &mut GenerationRng) -> u32 {
        if self.min >= self.max {
            return self.min;
        }
        rng.between(self.min, self.max)
    }
}

/// Unique identifier assigned to a room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(u32);

impl RoomId {
    /// Creates a new room identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a wall.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WallId(u32);

impl WallId {
    /// Creates a new wall identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Opaque content attached to rooms and walls after layout.
///
/// Produced by a description generator outside the layout pipeline; the
/// world stores it but never inspects it.
#[derive(Clone, Debug, PartialEq)]
pub enum Attribute {
    /// Contents of a room.
    Room(RoomContents),
    /// Extra detail for a wall or door.
    Wall(WallFeature),
}

/// Inhabitants and loot found in a room.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoomContents {
    /// Dungeon level the contents were rolled for.
    pub level: u32,
    /// Monsters present.
    pub monsters: Vec<String>,
    /// Notable features.
    pub features: Vec<String>,
    /// Treasure present.
    pub treasure: Vec<String>,
    /// Trap guarding the room, if any.
    pub trap: Option<String>,
}

/// Detail attached to a wall or door.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WallFeature {
    /// Free-form description such as the door's material.
    pub descriptor: String,
    /// Trap on the wall, if any.
    pub trap: Option<String>,
}

impl Attribute {
    /// Renders the payload as human-readable text, one item per line.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut lines = Vec::new();
        match self {
            Self::Room(contents) => {
                push_list(&mut lines, "Monsters", &contents.monsters);
                push_list(&mut lines, "Features", &contents.features);
                push_list(&mut lines, "Treasure", &contents.treasure);
                if let Some(trap) = &contents.trap {
                    lines.push(format!("Trap: {trap}"));
                }
                if lines.is_empty() {
                    lines.push("Empty".to_owned());
                }
            }
            Self::Wall(feature) => {
                if !feature.descriptor.is_empty() {
                    lines.push(feature.descriptor.clone());
                }
                if let Some(trap) = &feature.trap {
                    lines.push(format!("Trap: {trap}"));
                }
            }
        }
        lines.join("\n")
    }
}

fn push_list(lines: &mut Vec<String>, heading: &str, items: &[String]) {
    if !items.is_empty() {
        lines.push(format!("{heading}: {}", items.join(", ")));
    }
}
