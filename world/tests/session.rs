use std::time::Duration;

use crawler_core::{Command, DungeonConfig, Event};
use crawler_system_navigation::find_path;
use crawler_world::{apply, query, SessionStatus, World, EYE_HEIGHT};
use glam::Vec3;

const FRAME: Duration = Duration::from_millis(16);

fn script(seed: u64) -> Vec<Command> {
    let mut commands = vec![Command::StartCampaign { seed }];
    for frame in 0..240_u32 {
        let angle = frame as f32 * 0.05;
        commands.push(Command::FireBullet {
            origin: Vec3::new(0.0, EYE_HEIGHT, 0.0),
            direction: Vec3::new(angle.cos(), 0.0, angle.sin()),
        });
        commands.push(Command::Tick { dt: FRAME });
    }
    commands
}

fn replay(commands: &[Command]) -> (World, Vec<Event>) {
    let mut world = World::new(DungeonConfig::default());
    let mut events = Vec::new();
    for command in commands {
        apply(&mut world, command.clone(), &mut events);
    }
    (world, events)
}

#[test]
fn identical_scripts_replay_identically() {
    let commands = script(12345);
    let (first_world, first_events) = replay(&commands);
    let (second_world, second_events) = replay(&commands);

    assert_eq!(first_events, second_events);
    assert_eq!(query::enemies(&first_world), query::enemies(&second_world));
    assert_eq!(query::player(&first_world), query::player(&second_world));
}

#[test]
fn remaining_enemies_match_spawns_after_load() {
    let mut world = World::new(DungeonConfig::default());
    let mut events = Vec::new();
    apply(&mut world, Command::StartCampaign { seed: 12345 }, &mut events);

    let level = query::level(&world).expect("level loaded");
    let spawns = level.layout().enemy_spawns.len();
    assert_eq!(query::remaining_enemies(&world) as usize, spawns);
    assert_eq!(query::enemies(&world).len(), spawns);
    assert!(matches!(
        events.as_slice(),
        [Event::LevelLoaded { enemies, .. }] if *enemies as usize == spawns
    ));
}

#[test]
fn discovery_grows_as_the_player_walks() {
    let mut world = World::new(DungeonConfig::default());
    let mut events = Vec::new();
    apply(&mut world, Command::StartCampaign { seed: 7 }, &mut events);

    apply(&mut world, Command::Tick { dt: FRAME }, &mut events);
    let revealed_at_start = query::discovered(&world).iter().filter(|cell| **cell).count();
    assert!(revealed_at_start > 0);

    let layout = query::level(&world).expect("level loaded").layout().clone();
    let path = find_path(layout.start_room.center, layout.key_cell, &layout.grid);
    let mapper = crawler_core::GridMapper::from_config(&DungeonConfig::default());
    for cell in path {
        if query::status(&world) != SessionStatus::Playing {
            break;
        }
        apply(
            &mut world,
            Command::MovePlayer {
                position: mapper.grid_to_world(cell),
            },
            &mut events,
        );
        apply(&mut world, Command::Tick { dt: FRAME }, &mut events);
    }

    let revealed_after = query::discovered(&world).iter().filter(|cell| **cell).count();
    assert!(revealed_after >= revealed_at_start);
    assert!(query::level(&world).is_some_and(|level| level.key_discovered()));
}

#[test]
fn advancing_generates_a_different_level() {
    let mut world = World::new(DungeonConfig::default());
    let mut events = Vec::new();
    apply(&mut world, Command::StartCampaign { seed: 99 }, &mut events);
    let first = query::grid(&world).cloned();

    apply(&mut world, Command::AdvanceLevel, &mut events);

    assert_eq!(query::level_number(&world), 2);
    assert_ne!(query::grid(&world).cloned(), first);
    assert!(!query::has_key(&world));
    assert!(!query::lever_activated(&world));
}
