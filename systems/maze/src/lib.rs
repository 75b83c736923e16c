#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Maze engine that carves, solves, sparsifies and loops a three-dimensional maze.
//!
//! The engine owns a flat grid of [`Exits`] bitmasks. Passages are always
//! carved as matched pairs, so a cell recording an exit toward a neighbor
//! implies the neighbor records the opposite exit. Randomness is never
//! global: every randomized operation borrows the caller's [`GenerationRng`].

use delve_core::{Direction, Exits, Extent, GenerationRng, Mask, Point};
use tracing::{debug, warn};

/// Whether the maze still guarantees a single route between any two cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MazePhase {
    /// No cycles have been introduced, so [`Maze::solve`] can be trusted.
    Perfect,
    /// Deadends were closed and cycles may exist; [`Maze::solve`] yields nothing.
    DeadendsClosed,
}

/// Parameters fixed when a maze is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MazeConfig {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Number of layers.
    pub depth: u32,
    /// Cell the solution starts from.
    pub start: Point,
    /// Cell the solution ends at. `None` selects the far corner.
    pub end: Option<Point>,
    /// Chance out of 100 that each step turns instead of running straight.
    pub randomness: u32,
}

impl MazeConfig {
    /// Creates a configuration with the default start, end and randomness.
    #[must_use]
    pub const fn new(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
            start: Point::new(0, 0, 0),
            end: None,
            randomness: 100,
        }
    }
}

/// Three-dimensional maze of exit bitmasks constrained by a [`Mask`].
#[derive(Clone, Debug)]
pub struct Maze {
    extent: Extent,
    start: Point,
    end: Point,
    randomness: u32,
    mask: Mask,
    cells: Vec<Exits>,
    phase: MazePhase,
}

impl Maze {
    /// Creates an uncarved maze.
    ///
    /// A configuration with any axis below one produces an inert maze whose
    /// operations do nothing.
    #[must_use]
    pub fn new(config: MazeConfig, mask: Mask) -> Self {
        let extent = Extent::new(config.width, config.height, config.depth);
        if extent.is_degenerate() {
            return Self {
                extent: Extent::default(),
                start: config.start,
                end: config.start,
                randomness: 0,
                mask,
                cells: Vec::new(),
                phase: MazePhase::Perfect,
            };
        }

        let far_corner = Point::new(
            extent.width() - 1,
            extent.height() - 1,
            extent.depth() - 1,
        );
        Self {
            extent,
            start: config.start,
            end: config.end.unwrap_or(far_corner),
            randomness: config.randomness.min(100),
            mask,
            cells: vec![Exits::empty(); extent.cell_count()],
            phase: MazePhase::Perfect,
        }
    }

    /// Creates an uncarved maze whose every cell is playable.
    #[must_use]
    pub fn unmasked(config: MazeConfig) -> Self {
        Self::new(config, Mask::new(config.width, config.height))
    }

    /// Dimensions of the maze. Inert mazes report an empty extent.
    #[must_use]
    pub const fn extent(&self) -> Extent {
        self.extent
    }

    /// Cell the solution starts from.
    #[must_use]
    pub const fn start(&self) -> Point {
        self.start
    }

    /// Cell the solution ends at.
    #[must_use]
    pub const fn end(&self) -> Point {
        self.end
    }

    /// Turn bias in percent.
    #[must_use]
    pub const fn randomness(&self) -> u32 {
        self.randomness
    }

    /// Mask constraining the maze.
    #[must_use]
    pub const fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Current phase of the maze.
    #[must_use]
    pub const fn phase(&self) -> MazePhase {
        self.phase
    }

    /// Whether the maze was created with a degenerate size.
    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.cells.is_empty()
    }

    /// Carved exits at `point`. Out-of-range points have none.
    #[must_use]
    pub fn exits_at(&self, point: Point) -> Exits {
        self.cell(point).difference(Exits::MARK)
    }

    /// Carves a perfect maze spanning every playable cell.
    ///
    /// The walk keeps running straight with probability `100 - randomness`
    /// percent, capped at half the extent along the current axis. When the
    /// walk boxes itself in it resumes from a random already-carved cell.
    pub fn generate(&mut self, rng: &mut GenerationRng) {
        if self.is_inert() {
            return;
        }
        self.cells.fill(Exits::empty());
        self.phase = MazePhase::Perfect;

        let playable = self.playable_cell_count();
        if playable == 0 {
            warn!("maze has no playable cells, nothing to carve");
            return;
        }

        let mut remaining = playable - 1;
        let mut position = self.random_playable_point(rng);
        let mut excluded = Exits::empty();
        let mut last: Option<Direction> = None;
        let mut stretch = 0u32;
        let mut carved_any = false;
        let mut stalls = 0usize;

        while remaining > 0 {
            if excluded.contains(Exits::ALL_DIRECTIONS) {
                stalls += 1;
                if !carved_any || (stalls > self.cells.len() && !self.has_frontier()) {
                    warn!(
                        remaining,
                        "playable cells are unreachable from the carved region"
                    );
                    break;
                }
                position = self.random_carved_point(rng);
                excluded = self.cell(position);
            }
            excluded |= self.blocked_by_bounds(position);

            let straight = if rng.chance(self.randomness) {
                None
            } else {
                last.filter(|direction| self.can_run_straight(position, *direction, stretch))
            };
            let chosen = match straight {
                Some(direction) => {
                    stretch += 1;
                    Some(direction)
                }
                None => {
                    stretch = 0;
                    self.pick_random_direction(position, &mut excluded, rng)
                }
            };

            let Some(direction) = chosen else {
                continue;
            };
            let Some(next) = self.carve(position, direction) else {
                excluded.insert(direction.exit());
                continue;
            };

            last = Some(direction);
            position = next;
            excluded = self.cell(next);
            remaining -= 1;
            carved_any = true;
            stalls = 0;
        }

        debug!(
            width = self.extent.width(),
            height = self.extent.height(),
            depth = self.extent.depth(),
            playable,
            "maze generated"
        );
    }

    /// Finds the route from the start to the end.
    ///
    /// Depth-first search over an explicit stack, trying north, south, east,
    /// west, up and down in that order. Returns an empty path when the maze is
    /// inert, when no route exists, or once deadends have been closed.
    #[must_use]
    pub fn solve(&self) -> Vec<Point> {
        if self.is_inert() {
            return Vec::new();
        }
        if self.phase == MazePhase::DeadendsClosed {
            debug!("deadends already closed, the maze no longer has a unique route");
            return Vec::new();
        }

        let mut stack = vec![SearchFrame {
            point: self.start,
            tried: Exits::empty(),
        }];

        loop {
            let Some(frame) = stack.last_mut() else {
                return Vec::new();
            };
            if frame.point == self.end {
                break;
            }

            let untried = self.exits_at(frame.point).difference(frame.tried);
            let next = Direction::SEARCH_ORDER
                .into_iter()
                .find(|direction| untried.contains(direction.exit()));

            match next {
                Some(direction) => {
                    frame.tried.insert(direction.exit());
                    let origin = frame.point;
                    if let Some(neighbor) = self.neighbor(origin, direction) {
                        stack.push(SearchFrame {
                            point: neighbor,
                            tried: direction.opposite().exit(),
                        });
                    }
                }
                None => {
                    let _ = stack.pop();
                }
            }
        }

        stack.into_iter().map(|frame| frame.point).collect()
    }

    /// Shortens deadend corridors by `passes` cells.
    ///
    /// Each pass erases every deadend other than the start and end, and marks
    /// the neighbor it retreats into so that the neighbor is not erased again
    /// in the same pass. Removing edges never creates a cycle.
    pub fn sparsify(&mut self, passes: u32) {
        if self.is_inert() {
            return;
        }

        let extent = self.extent;
        for pass in 0..passes {
            let mut erased = 0usize;
            for point in extent.points() {
                if point == self.start || point == self.end {
                    continue;
                }
                let Some(index) = extent.index(point) else {
                    continue;
                };
                let Some(direction) = self.cells[index].deadend() else {
                    continue;
                };

                self.cells[index] = Exits::empty();
                erased += 1;
                if let Some(neighbor) = self
                    .neighbor(point, direction)
                    .and_then(|neighbor| extent.index(neighbor))
                {
                    self.cells[neighbor].remove(direction.opposite().exit());
                    self.cells[neighbor].insert(Exits::MARK);
                }
            }
            self.clear_marks();

            if erased == 0 {
                debug!(pass, "sparsify converged early");
                break;
            }
        }
    }

    /// Joins deadends back into the maze, introducing cycles.
    ///
    /// Each deadend is selected with probability `percentage` out of 100 and
    /// tunnels randomly until it breaks into a cell that already had passages.
    /// Afterwards [`Maze::solve`] returns an empty path.
    pub fn clear_deadends(&mut self, percentage: u32, rng: &mut GenerationRng) {
        if self.is_inert() {
            return;
        }
        self.phase = MazePhase::DeadendsClosed;

        let extent = self.extent;
        for point in extent.points() {
            if self.cell(point).deadend().is_none() {
                continue;
            }
            if rng.percentile() > percentage {
                continue;
            }
            self.tunnel_from(point, rng);
        }
    }

    fn tunnel_from(&mut self, origin: Point, rng: &mut GenerationRng) {
        let mut current = origin;
        loop {
            let mut tested = Exits::empty();
            let (direction, next) = loop {
                if tested.contains(Exits::ALL_DIRECTIONS) {
                    return;
                }
                let direction = random_direction(rng);
                let Some(next) = self.neighbor(current, direction) else {
                    tested.insert(direction.exit());
                    continue;
                };
                if self.cell(current) == direction.exit() || !self.playable(next) {
                    tested.insert(direction.exit());
                    continue;
                }
                break (direction, next);
            };

            let _ = self.carve(current, direction);
            if self.cell(next) != direction.opposite().exit() {
                return;
            }
            current = next;
        }
    }

    fn cell(&self, point: Point) -> Exits {
        self.extent
            .index(point)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or_default()
    }

    fn playable(&self, point: Point) -> bool {
        self.extent.contains(point) && self.mask.valid(point.x(), point.y())
    }

    fn playable_cell_count(&self) -> usize {
        self.extent
            .points()
            .filter(|point| self.playable(*point))
            .count()
    }

    fn neighbor(&self, point: Point, direction: Direction) -> Option<Point> {
        point
            .step(direction)
            .filter(|neighbor| self.extent.contains(*neighbor))
    }

    fn blocked_by_bounds(&self, point: Point) -> Exits {
        Direction::ALL
            .into_iter()
            .filter(|direction| self.neighbor(point, *direction).is_none())
            .fold(Exits::empty(), |blocked, direction| blocked | direction.exit())
    }

    fn can_run_straight(&self, point: Point, direction: Direction, stretch: u32) -> bool {
        let cap = match direction {
            Direction::North | Direction::South => self.extent.height() >> 1,
            Direction::West | Direction::East => self.extent.width() >> 1,
            Direction::Up | Direction::Down => self.extent.depth() >> 1,
        };
        stretch < cap
            && self
                .neighbor(point, direction)
                .is_some_and(|next| self.playable(next) && self.cell(next).is_empty())
    }

    fn pick_random_direction(
        &self,
        point: Point,
        excluded: &mut Exits,
        rng: &mut GenerationRng,
    ) -> Option<Direction> {
        while !excluded.contains(Exits::ALL_DIRECTIONS) {
            let direction = random_direction(rng);
            if excluded.contains(direction.exit()) {
                continue;
            }
            match self.neighbor(point, direction) {
                Some(next) if self.playable(next) && self.cell(next).is_empty() => {
                    return Some(direction);
                }
                _ => excluded.insert(direction.exit()),
            }
        }
        None
    }

    fn carve(&mut self, point: Point, direction: Direction) -> Option<Point> {
        let next = self.neighbor(point, direction)?;
        let from = self.extent.index(point)?;
        let to = self.extent.index(next)?;
        self.cells[from].insert(direction.exit());
        self.cells[to].insert(direction.opposite().exit());
        Some(next)
    }

    fn random_playable_point(&self, rng: &mut GenerationRng) -> Point {
        loop {
            let point = self.random_point(rng);
            if self.playable(point) {
                return point;
            }
        }
    }

    fn random_carved_point(&self, rng: &mut GenerationRng) -> Point {
        loop {
            let point = self.random_point(rng);
            if !self.cell(point).is_empty() {
                return point;
            }
        }
    }

    fn random_point(&self, rng: &mut GenerationRng) -> Point {
        Point::new(
            rng.below(self.extent.width()),
            rng.below(self.extent.height()),
            rng.below(self.extent.depth()),
        )
    }

    fn has_frontier(&self) -> bool {
        self.extent.points().any(|point| {
            !self.cell(point).is_empty()
                && Direction::ALL.into_iter().any(|direction| {
                    self.neighbor(point, direction)
                        .is_some_and(|next| self.playable(next) && self.cell(next).is_empty())
                })
        })
    }

    fn clear_marks(&mut self) {
        for cell in &mut self.cells {
            cell.remove(Exits::MARK);
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct SearchFrame {
    point: Point,
    tried: Exits,
}

fn random_direction(rng: &mut GenerationRng) -> Direction {
    let index = usize::try_from(rng.below(6)).unwrap_or(0);
    Direction::ALL[index % Direction::ALL.len()]
}
