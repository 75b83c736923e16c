use std::collections::HashSet;

use delve_core::{
    CellKind, Command, DoorOdds, Event, Extent, GenerationRng, Mask, Point, RoomId, SizeRange,
    WallKind,
};
use delve_system_layout::{
    find_optimal_room_placement, DoorPlanner, RoomOutline, RoomPlanner,
};
use delve_system_maze::{Maze, MazeConfig};
use delve_world::{self as world, query, World};

fn maze_world(maze: Maze, rng: &mut GenerationRng) -> World {
    let mut maze = maze;
    maze.generate(rng);
    let solution = maze.solve();
    World::from_maze(&maze, &solution)
}

fn place_rooms(world: &mut World, planner: &RoomPlanner, rng: &mut GenerationRng) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..planner.room_count(rng) {
        let mut commands = Vec::new();
        planner.plan_room(
            query::extent(world),
            0,
            query::mask(world),
            |point| query::cell_kind(world, point),
            rng,
            &mut commands,
        );
        for command in commands {
            world::apply(world, command, &mut events);
        }
    }
    events
}

fn open_floor(open: &HashSet<Point>) -> impl FnMut(Point) -> Option<CellKind> + '_ {
    move |point| {
        if open.contains(&point) {
            Some(CellKind::Passage)
        } else {
            Some(CellKind::Wall)
        }
    }
}

#[test]
fn rooms_never_overlap_when_space_is_plentiful() {
    for seed in [3, 17, 256, 4096] {
        let mut rng = GenerationRng::new(seed);
        let mut world = maze_world(Maze::unmasked(MazeConfig::new(10, 10, 1)), &mut rng);
        let planner = RoomPlanner::new(
            SizeRange::fixed(4),
            SizeRange::new(2, 3),
            SizeRange::new(2, 3),
        );

        let events = place_rooms(&mut world, &planner, &mut rng);

        assert!(
            events
                .iter()
                .all(|event| !matches!(event, Event::CommandRejected { .. })),
            "placement produced a command the world refused: {events:?}",
        );
        let rooms = query::rooms(&world);
        assert_eq!(rooms.len(), 4, "seed {seed} skipped a room");
        for (index, room) in rooms.iter().enumerate() {
            for other in &rooms[index + 1..] {
                assert!(
                    !room.overlaps(other),
                    "rooms {:?} and {:?} overlap",
                    room.id(),
                    other.id()
                );
            }
        }
    }
}

#[test]
fn single_cell_room_always_fits_a_three_by_three_maze() {
    for seed in 0..32 {
        let mut rng = GenerationRng::new(seed);
        let mut world = maze_world(Maze::unmasked(MazeConfig::new(3, 3, 1)), &mut rng);
        let planner = RoomPlanner::new(
            SizeRange::fixed(1),
            SizeRange::fixed(1),
            SizeRange::fixed(1),
        );

        let _ = place_rooms(&mut world, &planner, &mut rng);

        let rooms = query::rooms(&world);
        assert_eq!(rooms.len(), 1, "seed {seed} failed to place the room");
        assert_eq!((rooms[0].width(), rooms[0].height()), (1, 1));
        assert_eq!(
            query::cell_kind(&world, rooms[0].origin()),
            Some(CellKind::Room)
        );
    }
}

#[test]
fn placement_starts_on_a_valid_mask_cell() {
    let mask = Mask::parse("4,4\n1100\n1100\n0000\n0000\n").expect("valid mask");
    for seed in [1, 2, 3, 4, 5] {
        let mut rng = GenerationRng::new(seed);
        let world = maze_world(Maze::new(MazeConfig::new(4, 4, 1), mask.clone()), &mut rng);

        let placement = find_optimal_room_placement(
            query::extent(&world),
            0,
            1,
            1,
            query::mask(&world),
            |point| query::cell_kind(&world, point),
            &mut rng,
        )
        .expect("a single cell always finds a spot");

        let origin = placement.origin;
        assert!(mask.valid(origin.x() >> 1, origin.y() >> 1), "{origin} is masked");
    }
}

#[test]
fn placement_fails_once_every_spot_is_taken() {
    let mut rng = GenerationRng::new(9);
    let placement = find_optimal_room_placement(
        Extent::new(7, 7, 1),
        0,
        3,
        2,
        &Mask::new(3, 3),
        |_| Some(CellKind::Room),
        &mut rng,
    );
    assert_eq!(placement, None);
}

#[test]
fn oversized_rooms_are_clamped_inside_the_border() {
    let mut rng = GenerationRng::new(10);
    let placement = find_optimal_room_placement(
        Extent::new(7, 5, 1),
        0,
        40,
        40,
        &Mask::new(3, 2),
        |_| Some(CellKind::Passage),
        &mut rng,
    )
    .expect("open floor never overlaps a room");

    assert_eq!((placement.width, placement.height), (5, 3));
    assert_eq!(placement.origin, Point::new(1, 1, 0));
}

#[test]
fn narrow_rooms_are_widened() {
    let mut rng = GenerationRng::new(0);
    let wide = RoomPlanner::new(SizeRange::fixed(1), SizeRange::fixed(9), SizeRange::fixed(2));
    assert_eq!(wide.room_size(&mut rng), (9, 5));

    let tall = RoomPlanner::new(SizeRange::fixed(1), SizeRange::fixed(2), SizeRange::fixed(7));
    assert_eq!(tall.room_size(&mut rng), (4, 7));

    let empty = RoomPlanner::new(SizeRange::fixed(1), SizeRange::fixed(0), SizeRange::fixed(0));
    assert_eq!(empty.room_size(&mut rng), (1, 1));
}

fn sample_outline() -> RoomOutline {
    RoomOutline {
        room: RoomId::new(0),
        origin: Point::new(2, 2, 0),
        width: 3,
        height: 2,
    }
}

fn sample_openings() -> HashSet<Point> {
    HashSet::from([
        // north edge, one run of three
        Point::new(2, 1, 0),
        Point::new(3, 1, 0),
        Point::new(4, 1, 0),
        // south edge, two runs split by rock
        Point::new(2, 4, 0),
        Point::new(4, 4, 0),
        // west edge, one run of two
        Point::new(1, 2, 0),
        Point::new(1, 3, 0),
    ])
}

#[test]
fn every_wall_run_gets_exactly_one_door() {
    let open = sample_openings();
    let mut commands = Vec::new();

    DoorPlanner::new(DoorOdds::default()).plan(
        sample_outline(),
        open_floor(&open),
        &mut GenerationRng::new(44),
        &mut commands,
    );

    let shape: Vec<char> = commands
        .iter()
        .map(|command| match command {
            Command::RaiseWall { .. } => 'R',
            Command::HangDoor { .. } => 'D',
            _ => '?',
        })
        .collect();
    assert_eq!(shape.into_iter().collect::<String>(), "RRRRDRDDRRD");

    let raised: HashSet<(Point, Point)> = commands
        .iter()
        .filter_map(|command| match command {
            Command::RaiseWall { inside, outside, .. } => Some((*inside, *outside)),
            _ => None,
        })
        .collect();
    assert_eq!(raised.len(), 7);
    assert!(raised.iter().all(|(_, outside)| open.contains(outside)));

    let doors: Vec<(Point, Point)> = commands
        .iter()
        .filter_map(|command| match command {
            Command::HangDoor { first, second, .. } => Some((*first, *second)),
            _ => None,
        })
        .collect();
    assert!(doors.iter().all(|door| raised.contains(door)));

    let on_row = |row: u32| doors.iter().filter(|(_, outside)| outside.y() == row).count();
    assert_eq!(on_row(1), 1, "north run");
    assert_eq!(on_row(4), 2, "south runs");
    let on_west = doors.iter().filter(|(_, outside)| outside.x() == 1).count();
    assert_eq!(on_west, 1, "west run");
}

#[test]
fn door_odds_choose_the_variant() {
    let open = sample_openings();
    for (odds, expected) in [
        (DoorOdds::new(0, 0), WallKind::Door),
        (DoorOdds::new(100, 0), WallKind::SecretDoor),
        (DoorOdds::new(0, 100), WallKind::ConcealedDoor),
    ] {
        let mut commands = Vec::new();
        DoorPlanner::new(odds).plan(
            sample_outline(),
            open_floor(&open),
            &mut GenerationRng::new(5),
            &mut commands,
        );

        let kinds: Vec<WallKind> = commands
            .iter()
            .filter_map(|command| match command {
                Command::HangDoor { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec![expected; 4]);
    }
}

#[test]
fn enclosed_rooms_get_no_walls() {
    let mut commands = Vec::new();
    DoorPlanner::default().plan(
        sample_outline(),
        |_| Some(CellKind::Wall),
        &mut GenerationRng::new(1),
        &mut commands,
    );
    assert!(commands.is_empty());
}

#[test]
fn planned_doors_apply_cleanly_to_the_world() {
    let mut rng = GenerationRng::new(2718);
    let mut world = maze_world(Maze::unmasked(MazeConfig::new(8, 8, 1)), &mut rng);
    let planner = RoomPlanner::new(
        SizeRange::new(2, 3),
        SizeRange::new(1, 3),
        SizeRange::new(1, 3),
    );
    let _ = place_rooms(&mut world, &planner, &mut rng);

    let outlines: Vec<RoomOutline> = query::rooms(&world)
        .iter()
        .map(|room| RoomOutline {
            room: room.id(),
            origin: room.origin(),
            width: room.width(),
            height: room.height(),
        })
        .collect();
    assert!(!outlines.is_empty());

    let doors = DoorPlanner::new(DoorOdds::default());
    let mut events = Vec::new();
    for outline in outlines {
        let mut commands = Vec::new();
        doors.plan(outline, |point| query::cell_kind(&world, point), &mut rng, &mut commands);
        for command in commands {
            world::apply(&mut world, command, &mut events);
        }
    }

    assert!(events
        .iter()
        .all(|event| !matches!(event, Event::CommandRejected { .. })));
    for room in query::rooms(&world) {
        for wall in query::walls_of(&world, room.id()) {
            assert!(room.contains(wall.inside()));
            assert!(!room.contains(wall.outside()));
        }
    }
}
