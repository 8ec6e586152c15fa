#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Seeded procedural dungeon generator.
//!
//! [`generate`] carves rooms and corridors into an all-wall grid, then places
//! the key, lever, treasure, doors and spawns. A single [`DungeonRng`] is
//! threaded through every step in a fixed order, so a seed fully determines
//! the resulting [`LevelLayout`]. Generation never fails: degenerate grids fall
//! back to a single centered room.

use crawler_core::{DoorKind, DoorPlacement, DungeonConfig, GridMapper, LevelLayout, RoomTag};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

mod doors;
mod placement;
mod rng;
mod rooms;

pub use rng::DungeonRng;

/// Domain separator mixed into every derived level seed.
const LEVEL_SEED_DOMAIN: &str = "crawler/level";

/// Generates a complete level for the provided seed.
#[must_use]
pub fn generate(config: &DungeonConfig, seed: u64) -> LevelLayout {
    let mapper = GridMapper::from_config(config);
    let mut rng = DungeonRng::new(seed);

    let carved = rooms::carve(config, &mapper, &mut rng);
    let grid = carved.grid;
    let mut rooms = carved.rooms;
    let start = carved.start;
    let exit = carved.exit;

    let key_cell = placement::pick_key_cell(&rooms, &start, &exit, &grid, &mut rng);
    let key_room = rooms
        .iter()
        .find(|room| room.bounds.contains(key_cell))
        .map(|room| room.id);

    placement::assign_room_tags(&mut rooms, start.id, exit.id, key_room, &grid, &mut rng);
    let treasure_room = rooms
        .iter()
        .find(|room| room.tag == Some(RoomTag::Treasure))
        .cloned();

    let enemy_spawns =
        placement::enemy_spawns(&rooms, &start, config.enemy_count, &grid, &mut rng);
    let prop_spawns = placement::prop_spawns(&rooms, &start, &exit, &grid, &mut rng);
    let potion_spawns =
        placement::potion_spawns(&rooms, &start, &exit, key_cell, &grid, &mut rng);
    let lever_cell = placement::pick_lever_cell(
        &rooms,
        &start,
        &exit,
        key_room,
        treasure_room.as_ref(),
        &grid,
        &mut rng,
    );
    let treasure = treasure_room
        .as_ref()
        .map(|room| placement::treasure_spawn(room, &start, &grid, &mut rng));

    let mut doors = Vec::new();
    if exit.id != start.id {
        let mut required = vec![key_cell, lever_cell];
        required.extend(treasure.map(|spawn| spawn.cell));
        let entrances = doors::room_entrances(exit.bounds, &grid);
        let cell = match doors::exit_door_cell(&entrances, &grid, start.center, &required) {
            Some(cell) => cell,
            None => {
                warn!(
                    entrances = entrances.len(),
                    "no exit entrance keeps objectives reachable, blocking exit center"
                );
                exit.center
            }
        };
        doors.push(DoorPlacement {
            cell,
            kind: DoorKind::Exit,
        });
    }

    if let (Some(room), Some(spawn)) = (treasure_room.as_ref(), treasure) {
        let entrances = doors::room_entrances(room.bounds, &grid);
        match doors::treasure_door_cell(&entrances, &grid, start.center, lever_cell, spawn.cell) {
            Some(cell) => doors.push(DoorPlacement {
                cell,
                kind: DoorKind::Treasure,
            }),
            None => debug!(room = room.id.get(), "treasure room left without a door"),
        }
    }

    // Start and exit are never tagged, so the copies stay in sync with `rooms`.
    debug!(
        seed,
        rooms = rooms.len(),
        enemies = enemy_spawns.len(),
        props = prop_spawns.len(),
        potions = potion_spawns.len(),
        doors = doors.len(),
        "generated level"
    );

    LevelLayout {
        seed,
        grid,
        rooms,
        start_room: start,
        exit_room: exit,
        key_cell,
        lever_cell,
        treasure,
        enemy_spawns,
        prop_spawns,
        potion_spawns,
        doors,
    }
}

/// Derives the generation seed of a campaign level from the campaign seed.
///
/// Levels are numbered from one. The mapping is stable across platforms so a
/// whole campaign can be replayed from its seed.
#[must_use]
pub fn derive_level_seed(campaign_seed: u64, level: u32) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(LEVEL_SEED_DOMAIN.as_bytes());
    hasher.update(campaign_seed.to_le_bytes());
    hasher.update(level.to_le_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
