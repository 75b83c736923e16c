#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative dungeon state for Delve.
//!
//! The world owns the occupancy grid derived from a carved maze together with
//! the room and wall catalog. It is mutated exclusively through [`apply`] and
//! read through the [`query`] module.

use std::collections::HashMap;

use delve_core::{
    canonical_pair, Attribute, AttributeTarget, CellKind, Command, Direction, Event, Extent, Mask,
    Point, RejectionReason, RoomId, WallId, WallKind,
};
use delve_system_maze::Maze;
use tracing::debug;

/// Rectangular room carved into one layer of the occupancy grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Room {
    id: RoomId,
    origin: Point,
    width: u32,
    height: u32,
    walls: Vec<WallId>,
    attribute: Option<Attribute>,
}

impl Room {
    /// Identifier allocated by the world.
    #[must_use]
    pub const fn id(&self) -> RoomId {
        self.id
    }

    /// Upper-left cell of the room.
    #[must_use]
    pub const fn origin(&self) -> Point {
        self.origin
    }

    /// Number of columns covered.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows covered.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Layer the room was carved into.
    #[must_use]
    pub const fn layer(&self) -> u32 {
        self.origin.z()
    }

    /// Walls bounding the room, in the order they were raised.
    #[must_use]
    pub fn walls(&self) -> &[WallId] {
        &self.walls
    }

    /// Content attached after layout, if any.
    #[must_use]
    pub const fn attribute(&self) -> Option<&Attribute> {
        self.attribute.as_ref()
    }

    /// Whether the point lies within the room's rectangle.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.z() == self.origin.z()
            && point.x() >= self.origin.x()
            && point.y() >= self.origin.y()
            && point.x() - self.origin.x() < self.width
            && point.y() - self.origin.y() < self.height
    }

    /// Whether the two rooms share a layer and their rectangles intersect.
    #[must_use]
    pub fn overlaps(&self, other: &Room) -> bool {
        self.layer() == other.layer()
            && self.origin.x() < other.origin.x() + other.width
            && other.origin.x() < self.origin.x() + self.width
            && self.origin.y() < other.origin.y() + other.height
            && other.origin.y() < self.origin.y() + self.height
    }
}

/// Boundary segment between a room cell and its outside neighbor.
#[derive(Clone, Debug, PartialEq)]
pub struct Wall {
    id: WallId,
    inside: Point,
    outside: Point,
    kind: WallKind,
    attribute: Option<Attribute>,
}

impl Wall {
    /// Identifier allocated by the world.
    #[must_use]
    pub const fn id(&self) -> WallId {
        self.id
    }

    /// Room-side endpoint.
    #[must_use]
    pub const fn inside(&self) -> Point {
        self.inside
    }

    /// Far-side endpoint.
    #[must_use]
    pub const fn outside(&self) -> Point {
        self.outside
    }

    /// Current classification.
    #[must_use]
    pub const fn kind(&self) -> WallKind {
        self.kind
    }

    /// Content attached after layout, if any.
    #[must_use]
    pub const fn attribute(&self) -> Option<&Attribute> {
        self.attribute.as_ref()
    }
}

/// Represents the authoritative dungeon state.
#[derive(Clone, Debug, Default)]
pub struct World {
    extent: Extent,
    mask: Mask,
    cells: Vec<CellKind>,
    solution: Vec<Point>,
    rooms: Vec<Room>,
    walls: Vec<Wall>,
    wall_index: HashMap<(Point, Point), WallId>,
}

impl World {
    /// Creates an empty world with no cells.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the occupancy grid from a carved maze.
    ///
    /// Each maze cell `(x, y)` maps to grid cell `(2x + 1, 2y + 1)`; the cells in
    /// between stay walls unless the maze records a passage through them.
    /// `solution` is given in maze coordinates and stored in grid coordinates.
    #[must_use]
    pub fn from_maze(maze: &Maze, solution: &[Point]) -> Self {
        if maze.is_inert() {
            return Self::new();
        }

        let source = maze.extent();
        let extent = Extent::new(
            source.width() * 2 + 1,
            source.height() * 2 + 1,
            source.depth(),
        );
        let mut world = Self {
            extent,
            mask: maze.mask().clone(),
            cells: vec![CellKind::Wall; extent.cell_count()],
            solution: solution.iter().map(|point| point.to_grid()).collect(),
            ..Self::default()
        };

        for point in source.points() {
            let exits = maze.exits_at(point);
            if exits.is_empty() {
                continue;
            }
            let center = point.to_grid();
            world.set_cell(center, CellKind::Passage);
            for direction in [Direction::North, Direction::West] {
                if exits.contains(direction.exit()) {
                    if let Some(gap) = center.step(direction) {
                        world.set_cell(gap, CellKind::Passage);
                    }
                }
            }
        }

        debug!(
            width = extent.width(),
            height = extent.height(),
            depth = extent.depth(),
            "occupancy grid built"
        );
        world
    }

    fn set_cell(&mut self, point: Point, kind: CellKind) {
        if let Some(slot) = self
            .extent
            .index(point)
            .and_then(|index| self.cells.get_mut(index))
        {
            *slot = kind;
        }
    }

    fn cell(&self, point: Point) -> Option<CellKind> {
        self.extent
            .index(point)
            .and_then(|index| self.cells.get(index).copied())
    }

    fn room_mut(&mut self, room: RoomId) -> Option<&mut Room> {
        let index = usize::try_from(room.get()).ok()?;
        self.rooms.get_mut(index)
    }

    fn wall_mut(&mut self, wall: WallId) -> Option<&mut Wall> {
        let index = usize::try_from(wall.get()).ok()?;
        self.walls.get_mut(index)
    }

    fn carve_room(&mut self, origin: Point, width: u32, height: u32) -> Result<RoomId, RejectionReason> {
        if width == 0 || height == 0 {
            return Err(RejectionReason::DegenerateRoom);
        }
        let far_corner = Point::new(
            origin.x().saturating_add(width - 1),
            origin.y().saturating_add(height - 1),
            origin.z(),
        );
        if !self.extent.contains(origin) || !self.extent.contains(far_corner) {
            return Err(RejectionReason::OutOfBounds);
        }

        for y in origin.y()..origin.y() + height {
            for x in origin.x()..origin.x() + width {
                if self.mask.valid(x >> 1, y >> 1) {
                    self.set_cell(Point::new(x, y, origin.z()), CellKind::Room);
                }
            }
        }

        let id = RoomId::new(u32::try_from(self.rooms.len()).unwrap_or(u32::MAX));
        self.rooms.push(Room {
            id,
            origin,
            width,
            height,
            walls: Vec::new(),
            attribute: None,
        });
        Ok(id)
    }

    fn raise_wall(&mut self, room: RoomId, inside: Point, outside: Point) -> Result<WallId, RejectionReason> {
        if self.room_mut(room).is_none() {
            return Err(RejectionReason::UnknownRoom);
        }
        if !self.extent.contains(inside) || !self.extent.contains(outside) {
            return Err(RejectionReason::OutOfBounds);
        }
        if !inside.is_adjacent(outside) {
            return Err(RejectionReason::NotAdjacent);
        }

        let key = canonical_pair(inside, outside);
        let id = match self.wall_index.get(&key) {
            Some(existing) => *existing,
            None => {
                let id = WallId::new(u32::try_from(self.walls.len()).unwrap_or(u32::MAX));
                self.walls.push(Wall {
                    id,
                    inside,
                    outside,
                    kind: WallKind::Wall,
                    attribute: None,
                });
                let _ = self.wall_index.insert(key, id);
                id
            }
        };

        if let Some(owner) = self.room_mut(room) {
            if !owner.walls.contains(&id) {
                owner.walls.push(id);
            }
        }
        Ok(id)
    }

    fn hang_door(&mut self, first: Point, second: Point, kind: WallKind) -> Result<WallId, RejectionReason> {
        if !kind.is_door() {
            return Err(RejectionReason::NotADoor);
        }
        let id = *self
            .wall_index
            .get(&canonical_pair(first, second))
            .ok_or(RejectionReason::UnknownWall)?;
        let wall = self.wall_mut(id).ok_or(RejectionReason::UnknownWall)?;
        wall.kind = kind;
        Ok(id)
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::CarveRoom {
            origin,
            width,
            height,
        } => match world.carve_room(origin, width, height) {
            Ok(room) => out_events.push(Event::RoomCarved {
                room,
                origin,
                width,
                height,
            }),
            Err(reason) => out_events.push(Event::CommandRejected { reason }),
        },
        Command::RaiseWall {
            room,
            inside,
            outside,
        } => match world.raise_wall(room, inside, outside) {
            Ok(wall) => out_events.push(Event::WallRaised { room, wall }),
            Err(reason) => out_events.push(Event::CommandRejected { reason }),
        },
        Command::HangDoor {
            first,
            second,
            kind,
        } => match world.hang_door(first, second, kind) {
            Ok(wall) => out_events.push(Event::DoorHung { wall, kind }),
            Err(reason) => out_events.push(Event::CommandRejected { reason }),
        },
        Command::AttachRoomAttribute { room, attribute } => match world.room_mut(room) {
            Some(target) => {
                target.attribute = Some(attribute);
                out_events.push(Event::AttributeAttached {
                    target: AttributeTarget::Room(room),
                });
            }
            None => out_events.push(Event::CommandRejected {
                reason: RejectionReason::UnknownRoom,
            }),
        },
        Command::AttachWallAttribute { wall, attribute } => match world.wall_mut(wall) {
            Some(target) => {
                target.attribute = Some(attribute);
                out_events.push(Event::AttributeAttached {
                    target: AttributeTarget::Wall(wall),
                });
            }
            None => out_events.push(Event::CommandRejected {
                reason: RejectionReason::UnknownWall,
            }),
        },
    }
}

/// Edge of a room a door sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoomSide {
    /// Top edge.
    North,
    /// Bottom edge.
    South,
    /// Right edge.
    East,
    /// Left edge.
    West,
}

impl RoomSide {
    /// Lower-case compass name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
        }
    }

    /// Edge the offset of a door on this side is counted from.
    #[must_use]
    pub const fn measured_from(self) -> &'static str {
        match self {
            Self::North | Self::South => "west",
            Self::East | Self::West => "north",
        }
    }
}

/// Where a door sits along a room's boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DoorPlacement {
    /// Wall holding the door.
    pub wall: WallId,
    /// Edge of the room.
    pub side: RoomSide,
    /// One-based cell offset along the edge.
    pub offset: u32,
    /// Door variant.
    pub kind: WallKind,
}

fn door_side(room: &Room, wall: &Wall) -> Option<(RoomSide, u32)> {
    let (low, high) = canonical_pair(wall.inside, wall.outside);
    let min_x = low.x().min(high.x());
    let max_x = low.x().max(high.x());
    let min_y = low.y().min(high.y());
    let max_y = low.y().max(high.y());
    let origin = room.origin;

    if min_x < origin.x() {
        return Some((RoomSide::West, min_y.checked_sub(origin.y())? + 1));
    }
    if max_x >= origin.x() + room.width {
        return Some((RoomSide::East, min_y.checked_sub(origin.y())? + 1));
    }
    if min_y < origin.y() {
        return Some((RoomSide::North, min_x.checked_sub(origin.x())? + 1));
    }
    if max_y >= origin.y() + room.height {
        return Some((RoomSide::South, min_x.checked_sub(origin.x())? + 1));
    }
    None
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{door_side, DoorPlacement, Room, Wall, World};
    use delve_core::{canonical_pair, CellKind, Extent, Mask, Point, RoomId, WallId, WallKind};

    /// Dimensions of the occupancy grid.
    #[must_use]
    pub fn extent(world: &World) -> Extent {
        world.extent
    }

    /// Mask the dungeon was generated with.
    #[must_use]
    pub fn mask(world: &World) -> &Mask {
        &world.mask
    }

    /// Classification of a grid cell, or `None` outside the grid.
    #[must_use]
    pub fn cell_kind(world: &World, point: Point) -> Option<CellKind> {
        world.cell(point)
    }

    /// Route from start to end in grid coordinates. Empty when none was found.
    #[must_use]
    pub fn solution(world: &World) -> &[Point] {
        &world.solution
    }

    /// Every room in the order it was carved.
    #[must_use]
    pub fn rooms(world: &World) -> &[Room] {
        &world.rooms
    }

    /// Rooms carved into the given layer.
    pub fn rooms_on_layer(world: &World, layer: u32) -> impl Iterator<Item = &Room> {
        world.rooms.iter().filter(move |room| room.layer() == layer)
    }

    /// Looks up a room by identifier.
    #[must_use]
    pub fn room(world: &World, room: RoomId) -> Option<&Room> {
        let index = usize::try_from(room.get()).ok()?;
        world.rooms.get(index)
    }

    /// Every wall in the catalog.
    #[must_use]
    pub fn walls(world: &World) -> &[Wall] {
        &world.walls
    }

    /// Looks up a wall by identifier.
    #[must_use]
    pub fn wall(world: &World, wall: WallId) -> Option<&Wall> {
        let index = usize::try_from(wall.get()).ok()?;
        world.walls.get(index)
    }

    /// Walls bounding a room, in the order they were raised.
    #[must_use]
    pub fn walls_of(world: &World, room: RoomId) -> Vec<&Wall> {
        self::room(world, room)
            .map(|room| {
                room.walls()
                    .iter()
                    .filter_map(|id| wall(world, *id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Classifies the boundary between two adjacent cells.
    ///
    /// Catalogued walls report their own kind. Otherwise the boundary is a
    /// plain wall when exactly one side is solid, and open when neither or
    /// both are. Cells outside the grid count as solid.
    #[must_use]
    pub fn wall_between(world: &World, first: Point, second: Point) -> WallKind {
        if let Some(id) = world.wall_index.get(&canonical_pair(first, second)) {
            if let Some(wall) = wall(world, *id) {
                return wall.kind();
            }
        }

        let solid = |point| world.cell(point).map_or(true, |kind| kind == CellKind::Wall);
        if solid(first) != solid(second) {
            WallKind::Wall
        } else {
            WallKind::None
        }
    }

    /// Doors on a room's boundary with their side and offset.
    #[must_use]
    pub fn door_placements(world: &World, room: RoomId) -> Vec<DoorPlacement> {
        let Some(owner) = self::room(world, room) else {
            return Vec::new();
        };
        walls_of(world, room)
            .into_iter()
            .filter(|wall| wall.kind().is_door())
            .filter_map(|wall| {
                door_side(owner, wall).map(|(side, offset)| DoorPlacement {
                    wall: wall.id(),
                    side,
                    offset,
                    kind: wall.kind(),
                })
            })
            .collect()
    }
}
