#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure layout systems that plan rooms and the doors leading into them.
//!
//! Both planners read the occupancy grid through a caller-provided closure that
//! mirrors the world's `query::cell_kind` and describe their decisions as
//! [`Command`] values. Rooms must be applied one at a time, because each
//! placement scores candidates against the rooms already carved.

use delve_core::{
    CellKind, Command, Direction, DoorOdds, Extent, GenerationRng, Mask, Point, RoomId,
    SizeRange, WallKind, WeightedList,
};
use tracing::{debug, warn};

const EDGE_PASSAGE_COST: u32 = 1;
const INTERIOR_PASSAGE_COST: u32 = 3;
const ROOM_OVERLAP_COST: u32 = 100;
const MASKED_INTERIOR_COST: u32 = 10;

/// Where a room will be carved and how large it ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoomPlacement {
    /// Upper-left cell of the room.
    pub origin: Point,
    /// Number of columns, possibly shrunk from the requested width.
    pub width: u32,
    /// Number of rows, possibly shrunk from the requested height.
    pub height: u32,
}

/// Decides how many rooms a layer receives and where each one goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoomPlanner {
    count: SizeRange,
    width: SizeRange,
    height: SizeRange,
}

impl RoomPlanner {
    /// Creates a planner drawing from the provided ranges.
    #[must_use]
    pub const fn new(count: SizeRange, width: SizeRange, height: SizeRange) -> Self {
        Self {
            count,
            width,
            height,
        }
    }

    /// Draws the number of rooms for the next layer.
    pub fn room_count(&self, rng: &mut GenerationRng) -> u32 {
        self.count.sample(rng)
    }

    /// Draws a room size, widening narrow rooms so neither side exceeds twice the other.
    pub fn room_size(&self, rng: &mut GenerationRng) -> (u32, u32) {
        let mut width = self.width.sample(rng).max(1);
        let mut height = self.height.sample(rng).max(1);
        if width > height * 2 {
            height = width / 2 + 1;
        }
        if height > width * 2 {
            width = height / 2 + 1;
        }
        (width, height)
    }

    /// Plans one room on `layer` and emits the command that carves it.
    ///
    /// Emits nothing when no position avoids overlapping an existing room, in
    /// which case the caller simply moves on to the next room.
    pub fn plan_room<F>(
        &self,
        grid: Extent,
        layer: u32,
        mask: &Mask,
        cell_kind: F,
        rng: &mut GenerationRng,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(Point) -> Option<CellKind>,
    {
        let (width, height) = self.room_size(rng);
        match find_optimal_room_placement(grid, layer, width, height, mask, cell_kind, rng) {
            Some(placement) => {
                debug!(
                    origin = %placement.origin,
                    width = placement.width,
                    height = placement.height,
                    "room placed"
                );
                out.push(Command::CarveRoom {
                    origin: placement.origin,
                    width: placement.width,
                    height: placement.height,
                });
            }
            None => warn!(layer, width, height, "no room for another room, skipping it"),
        }
    }
}

/// Finds the position for a `width` x `height` room that disturbs the layer least.
///
/// Every candidate upper-left cell whose mask cell is valid is scored over the
/// room's rectangle grown by one cell, corners excluded: passages on the rim
/// cost 1, passages inside cost 3, cells of existing rooms cost 100 and
/// interior cells outside the mask cost 10. A uniform draw among the cheapest
/// candidates wins. When even the cheapest candidates overlap a room the larger
/// side shrinks by one and the search repeats, failing once the room is a
/// single cell.
pub fn find_optimal_room_placement<F>(
    grid: Extent,
    layer: u32,
    width: u32,
    height: u32,
    mask: &Mask,
    mut cell_kind: F,
    rng: &mut GenerationRng,
) -> Option<RoomPlacement>
where
    F: FnMut(Point) -> Option<CellKind>,
{
    if grid.width() < 3 || grid.height() < 3 || layer >= grid.depth() {
        return None;
    }

    let mut width = width.clamp(1, grid.width() - 2);
    let mut height = height.clamp(1, grid.height() - 2);

    loop {
        let space_x = grid.width() - width;
        let space_y = grid.height() - height;

        let mut candidates = WeightedList::new();
        let mut lowest = u32::MAX;
        let mut lowest_overlaps = false;

        for x in 1..space_x {
            for y in 1..space_y {
                if !mask.valid(x >> 1, y >> 1) {
                    continue;
                }
                let (tally, overlaps) =
                    score_candidate(x, y, layer, width, height, mask, &mut cell_kind);
                if tally == 0 || tally > lowest {
                    continue;
                }
                if tally < lowest {
                    candidates.clear();
                    lowest = tally;
                    lowest_overlaps = overlaps;
                }
                candidates.push((x, y), 1);
            }
        }

        if lowest_overlaps {
            if width == 1 && height == 1 {
                return None;
            }
            if width > height {
                width -= 1;
            } else {
                height -= 1;
            }
            continue;
        }

        let (x, y) = match candidates.draw(rng) {
            Some(position) => *position,
            None => (
                1 + rng.below(space_x - 1),
                1 + rng.below(space_y - 1),
            ),
        };
        return Some(RoomPlacement {
            origin: Point::new(x, y, layer),
            width,
            height,
        });
    }
}

fn score_candidate<F>(
    x: u32,
    y: u32,
    layer: u32,
    width: u32,
    height: u32,
    mask: &Mask,
    cell_kind: &mut F,
) -> (u32, bool)
where
    F: FnMut(Point) -> Option<CellKind>,
{
    let mut tally = 0u32;
    let mut overlaps = false;

    // The rim spans one cell beyond the room on every side; x and y start at 1.
    for column in x - 1..=x + width {
        for row in y - 1..=y + height {
            let rim_x = column == x - 1 || column == x + width;
            let rim_y = row == y - 1 || row == y + height;
            if rim_x && rim_y {
                continue;
            }
            let on_rim = rim_x || rim_y;

            match cell_kind(Point::new(column, row, layer)) {
                Some(CellKind::Passage) => {
                    tally += if on_rim {
                        EDGE_PASSAGE_COST
                    } else {
                        INTERIOR_PASSAGE_COST
                    };
                }
                Some(CellKind::Room) => {
                    tally += ROOM_OVERLAP_COST;
                    overlaps = true;
                }
                Some(CellKind::Wall) | None => {}
            }
            if !on_rim && !mask.valid(column >> 1, row >> 1) {
                tally += MASKED_INTERIOR_COST;
            }
        }
    }

    (tally, overlaps)
}

/// Rectangle of a carved room as seen by the door planner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoomOutline {
    /// Room the walls will belong to.
    pub room: RoomId,
    /// Upper-left cell of the room.
    pub origin: Point,
    /// Number of columns covered.
    pub width: u32,
    /// Number of rows covered.
    pub height: u32,
}

/// Walls a room off from the corridors around it and opens one door per opening.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DoorPlanner {
    odds: DoorOdds,
}

impl DoorPlanner {
    /// Creates a planner that hides doors with the provided odds.
    #[must_use]
    pub const fn new(odds: DoorOdds) -> Self {
        Self { odds }
    }

    /// Emits the walls and doors for one room.
    ///
    /// The north and south edges are scanned together from west to east, then
    /// the west and east edges from north to south. Every edge cell whose
    /// outside neighbor is open floor gets a wall; each unbroken run of such
    /// walls on one edge receives exactly one door, drawn uniformly from the run.
    pub fn plan<F>(
        &self,
        outline: RoomOutline,
        mut cell_kind: F,
        rng: &mut GenerationRng,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(Point) -> Option<CellKind>,
    {
        let RoomOutline {
            room,
            origin,
            width,
            height,
        } = outline;
        if width == 0 || height == 0 {
            return;
        }
        let layer = origin.z();
        let last_column = origin.x() + width - 1;
        let last_row = origin.y() + height - 1;

        let mut first = EdgeRun::default();
        let mut second = EdgeRun::default();
        for offset in 0..width {
            let x = origin.x() + offset;
            let north = Point::new(x, origin.y(), layer);
            let south = Point::new(x, last_row, layer);
            self.visit(room, north, Direction::North, offset, &mut first, &mut cell_kind, rng, out);
            self.visit(room, south, Direction::South, offset, &mut second, &mut cell_kind, rng, out);
        }
        self.close_run(&mut first, rng, out);
        self.close_run(&mut second, rng, out);

        for offset in 0..height {
            let y = origin.y() + offset;
            let west = Point::new(origin.x(), y, layer);
            let east = Point::new(last_column, y, layer);
            self.visit(room, west, Direction::West, offset, &mut first, &mut cell_kind, rng, out);
            self.visit(room, east, Direction::East, offset, &mut second, &mut cell_kind, rng, out);
        }
        self.close_run(&mut first, rng, out);
        self.close_run(&mut second, rng, out);
    }

    #[allow(clippy::too_many_arguments)]
    fn visit<F>(
        &self,
        room: RoomId,
        inside: Point,
        facing: Direction,
        offset: u32,
        run: &mut EdgeRun,
        cell_kind: &mut F,
        rng: &mut GenerationRng,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(Point) -> Option<CellKind>,
    {
        let Some(outside) = inside.step(facing) else {
            return;
        };
        if matches!(cell_kind(outside), Some(CellKind::Wall) | None) {
            return;
        }

        if run.last_hit.is_some_and(|last| last + 1 != offset) {
            self.close_run(run, rng, out);
        }
        out.push(Command::RaiseWall {
            room,
            inside,
            outside,
        });
        run.walls.push((inside, outside), 1);
        run.last_hit = Some(offset);
    }

    fn close_run(&self, run: &mut EdgeRun, rng: &mut GenerationRng, out: &mut Vec<Command>) {
        if let Some((inside, outside)) = run.walls.draw(rng).copied() {
            let kind: WallKind = self.odds.roll(rng);
            out.push(Command::HangDoor {
                first: inside,
                second: outside,
                kind,
            });
        }
        run.walls.clear();
        run.last_hit = None;
    }
}

#[derive(Debug, Default)]
struct EdgeRun {
    walls: WeightedList<(Point, Point)>,
    last_hit: Option<u32>,
}
