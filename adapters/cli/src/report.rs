//! Room and door listing printed under the dungeon map.

use std::fmt::Write as _;

use delve_world::{query, World};

/// Describes every room on `layer`, one block per room.
pub(crate) fn describe_rooms(world: &World, layer: u32) -> String {
    let mut text = String::new();
    for room in query::rooms_on_layer(world, layer) {
        let origin = room.origin();
        let _ = writeln!(
            text,
            "Room #{}: {}x{} at ({}, {})",
            room.id().get() + 1,
            room.width(),
            room.height(),
            origin.x(),
            origin.y()
        );

        if let Some(attribute) = room.attribute() {
            for line in attribute.describe().lines() {
                let _ = writeln!(text, "  {line}");
            }
        }

        for door in query::door_placements(world, room.id()) {
            let detail = query::wall(world, door.wall)
                .and_then(|wall| wall.attribute())
                .map(|attribute| attribute.describe().replace('\n', "; "))
                .unwrap_or_else(|| door.kind.label().to_owned());
            let _ = writeln!(
                text,
                "  Door ({}, {} from {}): ({detail})",
                door.side.name(),
                door.offset,
                door.side.measured_from()
            );
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_core::{
        Attribute, Command, GenerationRng, Point, RoomContents, RoomId, WallFeature, WallId,
        WallKind,
    };
    use delve_system_bootstrap::{generate_maze, DungeonOptions};

    fn corridor() -> World {
        let options = DungeonOptions {
            width: 2,
            height: 1,
            seed: 1,
            ..DungeonOptions::default()
        };
        let run = generate_maze(&options, &mut GenerationRng::new(1)).expect("valid options");
        World::from_maze(&run.maze, &run.solution)
    }

    fn apply_all(world: &mut World, commands: Vec<Command>) {
        let mut events = Vec::new();
        for command in commands {
            delve_world::apply(world, command, &mut events);
        }
    }

    fn furnish(world: &mut World) {
        apply_all(
            world,
            vec![
                Command::CarveRoom {
                    origin: Point::new(3, 1, 0),
                    width: 1,
                    height: 1,
                },
                Command::RaiseWall {
                    room: RoomId::new(0),
                    inside: Point::new(3, 1, 0),
                    outside: Point::new(2, 1, 0),
                },
                Command::HangDoor {
                    first: Point::new(3, 1, 0),
                    second: Point::new(2, 1, 0),
                    kind: WallKind::SecretDoor,
                },
            ],
        );
    }

    #[test]
    fn rooms_list_their_doors() {
        let mut world = corridor();
        furnish(&mut world);

        assert_eq!(
            describe_rooms(&world, 0),
            "Room #1: 1x1 at (3, 1)\n  Door (west, 1 from north): (secret)\n"
        );
    }

    #[test]
    fn attributes_replace_the_door_kind() {
        let mut world = corridor();
        furnish(&mut world);
        apply_all(
            &mut world,
            vec![
                Command::AttachRoomAttribute {
                    room: RoomId::new(0),
                    attribute: Attribute::Room(RoomContents {
                        level: 1,
                        treasure: vec!["12 sp".to_owned()],
                        ..RoomContents::default()
                    }),
                },
                Command::AttachWallAttribute {
                    wall: WallId::new(0),
                    attribute: Attribute::Wall(WallFeature {
                        descriptor: "stuck".to_owned(),
                        trap: Some("poison needle".to_owned()),
                    }),
                },
            ],
        );

        assert_eq!(
            describe_rooms(&world, 0),
            "Room #1: 1x1 at (3, 1)\n  Treasure: 12 sp\n  Door (west, 1 from north): (stuck; Trap: poison needle)\n"
        );
    }

    #[test]
    fn other_layers_are_empty() {
        let mut world = corridor();
        furnish(&mut world);
        assert!(describe_rooms(&world, 1).is_empty());
    }
}
