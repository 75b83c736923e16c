#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Delve painters.
//!
//! A [`Scene`] is a backend-neutral snapshot of one dungeon layer: the cell
//! grid, wall segments, door markers, room labels and the solution route.
//! Painters turn scenes into pixels or text through the [`Painter`] trait.

use anyhow::Result as AnyResult;
use delve_core::{CellKind, Point, WallKind};
use delve_world::{query, World};
use glam::Vec2;
use std::{error::Error, fmt};

/// RGBA color used when presenting scenes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Byte RGB values, ignoring alpha.
    #[must_use]
    pub fn to_rgb_u8(self) -> [u8; 3] {
        [
            channel_to_u8(self.red),
            channel_to_u8(self.green),
            channel_to_u8(self.blue),
        ]
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: self.red + (1.0 - self.red) * amount,
            green: self.green + (1.0 - self.green) * amount,
            blue: self.blue + (1.0 - self.blue) * amount,
            alpha: self.alpha,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel_to_u8(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Colors used for each kind of scene element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    /// Solid rock.
    pub wall: Color,
    /// Corridor floor.
    pub passage: Color,
    /// Room floor.
    pub room: Color,
    /// Plain wall segments.
    pub wall_line: Color,
    /// Ordinary doors.
    pub door: Color,
    /// Secret doors.
    pub secret_door: Color,
    /// Concealed doors.
    pub concealed_door: Color,
    /// Solution route.
    pub solution: Color,
}

impl Default for Palette {
    fn default() -> Self {
        let door = Color::from_rgb_u8(164, 110, 52);
        Self {
            wall: Color::from_rgb_u8(64, 64, 72),
            passage: Color::from_rgb_u8(224, 220, 210),
            room: Color::from_rgb_u8(246, 242, 232),
            wall_line: Color::from_rgb_u8(20, 20, 24),
            door,
            secret_door: Color::from_rgb_u8(160, 40, 40),
            concealed_door: door.lighten(0.4),
            solution: Color::from_rgb_u8(40, 110, 200),
        }
    }
}

impl Palette {
    /// Color for a boundary of the given kind.
    #[must_use]
    pub const fn boundary(&self, kind: WallKind) -> Color {
        match kind {
            WallKind::None | WallKind::Wall => self.wall_line,
            WallKind::Door => self.door,
            WallKind::SecretDoor => self.secret_door,
            WallKind::ConcealedDoor => self.concealed_door,
        }
    }

    /// Fill color for a cell of the given kind.
    #[must_use]
    pub const fn fill(&self, kind: CellKind) -> Color {
        match kind {
            CellKind::Wall => self.wall,
            CellKind::Passage => self.passage,
            CellKind::Room => self.room,
        }
    }
}

/// Geometry and colors applied when building a scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Presentation {
    /// Side length of one grid cell in canvas units.
    pub cell_size: f32,
    /// Empty margin around the grid in canvas units.
    pub border: f32,
    /// Colors for each element.
    pub palette: Palette,
}

impl Presentation {
    /// Default cell side length.
    pub const DEFAULT_CELL_SIZE: f32 = 10.0;

    /// Creates a new presentation descriptor.
    ///
    /// Returns an error when `cell_size` is not positive or `border` is negative.
    pub fn new(cell_size: f32, border: f32, palette: Palette) -> Result<Self, RenderingError> {
        if !(cell_size > 0.0) {
            return Err(RenderingError::InvalidCellSize { cell_size });
        }
        if !(border >= 0.0) {
            return Err(RenderingError::InvalidBorder { border });
        }
        Ok(Self {
            cell_size,
            border,
            palette,
        })
    }
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            cell_size: Self::DEFAULT_CELL_SIZE,
            border: Self::DEFAULT_CELL_SIZE,
            palette: Palette::default(),
        }
    }
}

/// Column and row of a cell within one layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    /// Column index.
    pub column: u32,
    /// Row index.
    pub row: u32,
}

impl GridCell {
    /// Creates a new grid cell.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }
}

/// Straight line drawn along the shared edge of two cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WallSegment {
    /// One end of the line.
    pub from: Vec2,
    /// Other end of the line.
    pub to: Vec2,
}

/// Door drawn across the shared edge of two cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DoorMarker {
    /// West or north cell.
    pub first: GridCell,
    /// East or south cell.
    pub second: GridCell,
    /// Midpoint of the shared edge.
    pub center: Vec2,
    /// Whether the shared edge runs north to south.
    pub vertical: bool,
    /// Door variant.
    pub kind: WallKind,
}

/// Room number printed at the room's center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoomLabel {
    /// One-based room number.
    pub number: u32,
    /// Canvas position of the label.
    pub position: Vec2,
}

/// Backend-neutral snapshot of one dungeon layer.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Layer the scene shows.
    pub layer: u32,
    /// Number of grid columns.
    pub columns: u32,
    /// Number of grid rows.
    pub rows: u32,
    /// Geometry and colors the scene was built with.
    pub presentation: Presentation,
    /// Every cell of the layer in row-major order.
    pub cells: Vec<CellKind>,
    /// Plain wall lines.
    pub walls: Vec<WallSegment>,
    /// Doors of every variant.
    pub doors: Vec<DoorMarker>,
    /// Room numbers.
    pub labels: Vec<RoomLabel>,
    /// Solution cells on this layer, in route order.
    pub route: Vec<GridCell>,
}

impl Scene {
    /// Builds the scene for `layer` of the world.
    ///
    /// Boundaries are examined to the east and south of every cell so each
    /// shared edge is visited once. A layer outside the world yields an empty
    /// scene.
    #[must_use]
    pub fn from_world(world: &World, layer: u32, presentation: &Presentation) -> Self {
        let extent = query::extent(world);
        let (columns, rows) = if layer < extent.depth() {
            (extent.width(), extent.height())
        } else {
            (0, 0)
        };
        let mut scene = Self {
            layer,
            columns,
            rows,
            presentation: *presentation,
            cells: Vec::new(),
            walls: Vec::new(),
            doors: Vec::new(),
            labels: Vec::new(),
            route: Vec::new(),
        };

        for row in 0..rows {
            for column in 0..columns {
                let point = Point::new(column, row, layer);
                scene
                    .cells
                    .push(query::cell_kind(world, point).unwrap_or_default());

                let here = GridCell::new(column, row);
                if column + 1 < columns {
                    let east = Point::new(column + 1, row, layer);
                    let kind = query::wall_between(world, point, east);
                    scene.add_boundary(here, GridCell::new(column + 1, row), true, kind);
                }
                if row + 1 < rows {
                    let south = Point::new(column, row + 1, layer);
                    let kind = query::wall_between(world, point, south);
                    scene.add_boundary(here, GridCell::new(column, row + 1), false, kind);
                }
            }
        }

        if columns > 0 {
            scene.labels = query::rooms_on_layer(world, layer)
                .map(|room| {
                    let corner = GridCell::new(room.origin().x(), room.origin().y());
                    let origin = scene.cell_origin(corner);
                    let size = Vec2::new(room.width() as f32, room.height() as f32)
                        * presentation.cell_size;
                    RoomLabel {
                        number: room.id().get() + 1,
                        position: origin + size * 0.5,
                    }
                })
                .collect();
            scene.route = query::solution(world)
                .iter()
                .filter(|point| point.z() == layer)
                .map(|point| GridCell::new(point.x(), point.y()))
                .collect();
        }

        scene
    }

    fn add_boundary(&mut self, first: GridCell, second: GridCell, vertical: bool, kind: WallKind) {
        if kind == WallKind::None {
            return;
        }
        let cell = self.presentation.cell_size;
        let corner = self.cell_origin(second);
        let (from, to) = if vertical {
            (corner, corner + Vec2::new(0.0, cell))
        } else {
            (corner, corner + Vec2::new(cell, 0.0))
        };

        if kind.is_door() {
            self.doors.push(DoorMarker {
                first,
                second,
                center: (from + to) * 0.5,
                vertical,
                kind,
            });
        } else {
            self.walls.push(WallSegment { from, to });
        }
    }

    /// Total canvas size including the border and a one-unit hairline margin.
    #[must_use]
    pub fn canvas_size(&self) -> Vec2 {
        let grid = Vec2::new(self.columns as f32, self.rows as f32) * self.presentation.cell_size;
        grid + Vec2::splat(self.presentation.border * 2.0 + 1.0)
    }

    /// Canvas position of the upper-left corner of a cell.
    #[must_use]
    pub fn cell_origin(&self, cell: GridCell) -> Vec2 {
        Vec2::new(cell.column as f32, cell.row as f32) * self.presentation.cell_size
            + Vec2::splat(self.presentation.border)
    }

    /// Canvas position of the center of a cell.
    #[must_use]
    pub fn cell_center(&self, cell: GridCell) -> Vec2 {
        self.cell_origin(cell) + Vec2::splat(self.presentation.cell_size * 0.5)
    }

    /// Kind of the cell at `cell`, or `None` outside the layer.
    #[must_use]
    pub fn cell(&self, cell: GridCell) -> Option<CellKind> {
        if cell.column >= self.columns || cell.row >= self.rows {
            return None;
        }
        let index = u64::from(cell.row) * u64::from(self.columns) + u64::from(cell.column);
        let index = usize::try_from(index).ok()?;
        self.cells.get(index).copied()
    }

    /// Door between two neighboring cells, in either order.
    #[must_use]
    pub fn door_between(&self, a: GridCell, b: GridCell) -> Option<&DoorMarker> {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        self.doors
            .iter()
            .find(|door| door.first == first && door.second == second)
    }

    /// Solution route as a polyline through cell centers.
    #[must_use]
    pub fn route_polyline(&self) -> Vec<Vec2> {
        self.route.iter().map(|cell| self.cell_center(*cell)).collect()
    }
}

/// Backend capable of presenting a scene.
pub trait Painter {
    /// Draws the scene.
    fn paint(&mut self, scene: &Scene) -> AnyResult<()>;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Cells must have a positive size.
    InvalidCellSize {
        /// Provided size that failed validation.
        cell_size: f32,
    },
    /// The border may not be negative.
    InvalidBorder {
        /// Provided border that failed validation.
        border: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCellSize { cell_size } => {
                write!(f, "cell_size must be positive (received {cell_size})")
            }
            Self::InvalidBorder { border } => {
                write!(f, "border must not be negative (received {border})")
            }
        }
    }
}

impl Error for RenderingError {}
