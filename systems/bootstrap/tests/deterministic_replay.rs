use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use delve_core::{CellKind, DoorOdds, Mask, Point, SizeRange, WallKind};
use delve_system_bootstrap::{generate_dungeon, DungeonOptions, RoomDensity, Sparseness};
use delve_world::{query, World};

#[test]
fn deterministic_replay_produces_identical_dungeons() {
    let first = replay(scripted_options(4242));
    let second = replay(scripted_options(4242));

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert!(!first.rooms.is_empty(), "scripted options should furnish rooms");
}

#[test]
fn different_seeds_produce_different_dungeons() {
    let first = replay(scripted_options(1));
    let second = replay(scripted_options(2));

    assert_ne!(first.fingerprint(), second.fingerprint());
}

#[test]
fn every_room_cell_sits_on_the_mask() {
    let mask = Mask::parse(
        "8,6\n\
         11111100\n\
         11111100\n\
         11111111\n\
         00111111\n\
         00111111\n\
         00111111\n",
    )
    .expect("valid mask");
    let options = DungeonOptions {
        mask: Some(mask.clone()),
        ..scripted_options(77)
    };
    let dungeon = generate_dungeon(&options).expect("options are valid");
    let world = &dungeon.world;

    let extent = query::extent(world);
    assert_eq!((extent.width(), extent.height()), (17, 13));
    for point in extent.points() {
        if query::cell_kind(world, point) == Some(CellKind::Room) {
            assert!(
                mask.valid(point.x() >> 1, point.y() >> 1),
                "room cell {point} lies outside the mask"
            );
        }
    }
}

#[test]
fn every_door_sits_between_a_room_and_open_floor() {
    let dungeon = generate_dungeon(&scripted_options(99)).expect("options are valid");
    let world = &dungeon.world;

    let mut doors = 0;
    for room in query::rooms(world) {
        for placement in query::door_placements(world, room.id()) {
            doors += 1;
            let wall = query::wall(world, placement.wall).expect("placement names a wall");
            assert!(placement.kind.is_door());
            assert_eq!(
                query::wall_between(world, wall.outside(), wall.inside()),
                placement.kind
            );
            assert!(placement.offset >= 1);
            let span = match placement.side.name() {
                "north" | "south" => room.width(),
                _ => room.height(),
            };
            assert!(placement.offset <= span);
            assert_ne!(query::cell_kind(world, wall.outside()), Some(CellKind::Wall));
        }
    }
    assert!(doors > 0, "a furnished dungeon should have doors");
}

#[test]
fn solution_is_reported_in_grid_space() {
    let options = DungeonOptions {
        width: 5,
        height: 5,
        ..DungeonOptions::default()
    };
    let dungeon = generate_dungeon(&options).expect("options are valid");
    let solution = query::solution(&dungeon.world);

    assert_eq!(solution.first(), Some(&Point::new(1, 1, 0)));
    assert_eq!(solution.last(), Some(&Point::new(9, 9, 0)));
    for point in solution {
        assert_eq!(query::cell_kind(&dungeon.world, *point), Some(CellKind::Passage));
    }
}

fn scripted_options(seed: u64) -> DungeonOptions {
    let mut options = DungeonOptions {
        width: 16,
        height: 12,
        depth: 2,
        seed,
        randomness: 60,
        deadends: 50,
        room_width: SizeRange::new(2, 4),
        room_height: SizeRange::new(2, 3),
        doors: DoorOdds::new(20, 20),
        ..DungeonOptions::default()
    };
    options.apply_sparseness(Sparseness::Crowded);
    options.apply_room_density(RoomDensity::Few);
    options
}

fn replay(options: DungeonOptions) -> ReplayOutcome {
    let dungeon = generate_dungeon(&options).expect("options are valid");
    ReplayOutcome::capture(&dungeon.world)
}

#[derive(Debug, PartialEq)]
struct ReplayOutcome {
    cells: Vec<CellKind>,
    solution: Vec<Point>,
    rooms: Vec<RoomState>,
    walls: Vec<WallState>,
}

impl ReplayOutcome {
    fn capture(world: &World) -> Self {
        let cells = query::extent(world)
            .points()
            .filter_map(|point| query::cell_kind(world, point))
            .collect();
        let rooms = query::rooms(world)
            .iter()
            .map(|room| RoomState {
                origin: room.origin(),
                width: room.width(),
                height: room.height(),
            })
            .collect();
        let walls = query::walls(world)
            .iter()
            .map(|wall| WallState {
                inside: wall.inside(),
                outside: wall.outside(),
                kind: wall.kind(),
            })
            .collect();
        Self {
            cells,
            solution: query::solution(world).to_vec(),
            rooms,
            walls,
        }
    }

    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.cells.hash(&mut hasher);
        self.solution.hash(&mut hasher);
        self.rooms.hash(&mut hasher);
        self.walls.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct RoomState {
    origin: Point,
    width: u32,
    height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct WallState {
    inside: Point,
    outside: Point,
    kind: WallKind,
}
