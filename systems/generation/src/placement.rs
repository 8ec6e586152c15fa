//! Objective, tag, and spawn placement inside carved rooms.

use std::cmp::Reverse;
use std::collections::HashSet;

use crawler_core::{
    CellRect, ConsumableKind, EnemyKind, EnemySpawn, Grid, GridPoint, PotionSpawn, PropKind,
    PropSpawn, Room, RoomId, RoomTag, TreasureSpawn,
};

use crate::{doors::room_entrances, DungeonRng};

/// Samples drawn before a room cell search gives up.
const SAMPLE_ATTEMPTS: u32 = 100;

/// Share of the enemy budget spawned as ranged enemies.
const RANGED_SHARE: f64 = 0.3;

/// Minimum Manhattan distance between the start room and the key room.
const KEY_ROOM_MIN_DISTANCE: u32 = 8;

/// Minimum Manhattan distance between the start room and an enemy source room.
const ENEMY_ROOM_MIN_DISTANCE: u32 = 10;

/// Random cell inside `bounds`, preferring floor cells at least
/// `min_distance` away from `reference`.
///
/// The distance is a soft preference: if no sample satisfies both conditions
/// the last sample is still returned when it is floor.
pub(crate) fn sample_room_cell(
    bounds: CellRect,
    min_distance: u32,
    reference: GridPoint,
    grid: &Grid,
    rng: &mut DungeonRng,
) -> Option<GridPoint> {
    let mut cell = bounds.center();
    for _ in 0..SAMPLE_ATTEMPTS {
        let dx = rng.index(bounds.width() as usize).unwrap_or(0) as u32;
        let dy = rng.index(bounds.height() as usize).unwrap_or(0) as u32;
        cell = GridPoint::new(bounds.x() + dx, bounds.y() + dy);
        if grid.is_floor(cell) && cell.manhattan_distance(reference) >= min_distance {
            break;
        }
    }
    grid.is_floor(cell).then_some(cell)
}

fn distance_between(a: &Room, b: &Room) -> u32 {
    a.center.manhattan_distance(b.center)
}

/// Picks the key cell in a room far from the start when one exists.
pub(crate) fn pick_key_cell(
    rooms: &[Room],
    start: &Room,
    exit: &Room,
    grid: &Grid,
    rng: &mut DungeonRng,
) -> GridPoint {
    let candidates: Vec<&Room> = rooms
        .iter()
        .filter(|room| room.id != start.id && room.id != exit.id)
        .collect();
    let far: Vec<&Room> = candidates
        .iter()
        .copied()
        .filter(|room| distance_between(room, start) >= KEY_ROOM_MIN_DISTANCE)
        .collect();

    let key_room = rng
        .pick(&far)
        .copied()
        .or_else(|| rng.pick(&candidates).copied())
        .unwrap_or(start);

    sample_room_cell(key_room.bounds, 4, start.center, grid, rng).unwrap_or(key_room.center)
}

/// Tags the treasure, trap and armory rooms in place.
///
/// Start, exit and key rooms are never tagged. Treasure prefers rooms with at
/// most one entrance; every tag is drawn from the farther half of the
/// remaining candidates.
pub(crate) fn assign_room_tags(
    rooms: &mut [Room],
    start: RoomId,
    exit: RoomId,
    key_room: Option<RoomId>,
    grid: &Grid,
    rng: &mut DungeonRng,
) {
    for room in rooms.iter_mut() {
        room.tag = None;
    }

    let Some(start_center) = rooms.iter().find(|room| room.id == start).map(|room| room.center)
    else {
        return;
    };

    let mut sorted: Vec<&Room> = rooms
        .iter()
        .filter(|room| room.id != start && room.id != exit && Some(room.id) != key_room)
        .collect();
    if sorted.is_empty() {
        return;
    }
    sorted.sort_by_key(|room| Reverse(room.center.manhattan_distance(start_center)));

    let leaves: Vec<&Room> = sorted
        .iter()
        .copied()
        .filter(|room| room_entrances(room.bounds, grid).len() <= 1)
        .collect();
    let treasure_pool = if leaves.is_empty() { &sorted } else { &leaves };
    let treasure = rng.pick_from_top(treasure_pool).map(|room| room.id);

    let remaining: Vec<&Room> = sorted
        .iter()
        .copied()
        .filter(|room| Some(room.id) != treasure)
        .collect();
    let trap = rng.pick_from_top(&remaining).map(|room| room.id);

    let armory_pool: Vec<&Room> = remaining
        .iter()
        .copied()
        .filter(|room| Some(room.id) != trap)
        .collect();
    let armory = rng.pick_from_top(&armory_pool).map(|room| room.id);

    for room in rooms.iter_mut() {
        if Some(room.id) == treasure {
            room.tag = Some(RoomTag::Treasure);
        } else if Some(room.id) == trap {
            room.tag = Some(RoomTag::Trap);
        } else if Some(room.id) == armory {
            room.tag = Some(RoomTag::Armory);
        }
    }
}

/// Plans enemy spawns, farthest rooms first, plus one melee enemy per trap room.
pub(crate) fn enemy_spawns(
    rooms: &[Room],
    start: &Room,
    count: usize,
    grid: &Grid,
    rng: &mut DungeonRng,
) -> Vec<EnemySpawn> {
    let far: Vec<&Room> = rooms
        .iter()
        .filter(|room| distance_between(room, start) >= ENEMY_ROOM_MIN_DISTANCE)
        .collect();
    let mut sources = if far.is_empty() {
        rooms.iter().collect()
    } else {
        far
    };
    sources.sort_by_key(|room| Reverse(distance_between(room, start)));

    let ranged_count = ((count as f64 * RANGED_SHARE).round() as usize).max(1);
    let mut spawns = Vec::with_capacity(count);
    if !sources.is_empty() {
        for index in 0..count {
            let room = sources[index % sources.len()];
            let Some(cell) = sample_room_cell(room.bounds, 8, start.center, grid, rng) else {
                continue;
            };
            let kind = if index < ranged_count {
                EnemyKind::Ranged
            } else {
                EnemyKind::Melee
            };
            spawns.push(EnemySpawn { cell, kind });
        }
    }

    for room in rooms.iter().filter(|room| room.tag == Some(RoomTag::Trap)) {
        if let Some(cell) = sample_room_cell(room.bounds, 4, start.center, grid, rng) {
            spawns.push(EnemySpawn {
                cell,
                kind: EnemyKind::Melee,
            });
        }
    }

    spawns
}

/// Scatters props through every room except start and exit.
pub(crate) fn prop_spawns(
    rooms: &[Room],
    start: &Room,
    exit: &Room,
    grid: &Grid,
    rng: &mut DungeonRng,
) -> Vec<PropSpawn> {
    let mut spawns = Vec::new();
    let mut occupied = HashSet::new();

    for room in rooms {
        if room.id == start.id || room.id == exit.id {
            continue;
        }
        let (min, max) = if room.tag == Some(RoomTag::Armory) {
            (2, 4)
        } else {
            (1, 3)
        };
        let count = rng.range_inclusive(min, max).unwrap_or(min);
        for _ in 0..count {
            let Some(cell) = sample_room_cell(room.bounds, 4, start.center, grid, rng) else {
                continue;
            };
            if !occupied.insert(cell) {
                continue;
            }
            let kind = rng
                .pick(&PropKind::ALL)
                .copied()
                .unwrap_or(PropKind::Crate);
            spawns.push(PropSpawn { cell, kind });
        }
    }

    spawns
}

/// Places two to four potions in random non-start, non-exit rooms.
pub(crate) fn potion_spawns(
    rooms: &[Room],
    start: &Room,
    exit: &Room,
    key_cell: GridPoint,
    grid: &Grid,
    rng: &mut DungeonRng,
) -> Vec<PotionSpawn> {
    let candidates: Vec<&Room> = rooms
        .iter()
        .filter(|room| room.id != start.id && room.id != exit.id)
        .collect();
    let mut occupied = HashSet::from([key_cell]);
    let mut spawns = Vec::new();

    let count = rng.range_inclusive(2, 4).unwrap_or(2);
    for _ in 0..count {
        let room = rng.pick(&candidates).copied().unwrap_or(start);
        let Some(cell) = sample_room_cell(room.bounds, 4, start.center, grid, rng) else {
            continue;
        };
        if occupied.insert(cell) {
            spawns.push(PotionSpawn { cell });
        }
    }

    spawns
}

/// Places the lever, as far from the treasure room as possible when one exists.
pub(crate) fn pick_lever_cell(
    rooms: &[Room],
    start: &Room,
    exit: &Room,
    key_room: Option<RoomId>,
    treasure_room: Option<&Room>,
    grid: &Grid,
    rng: &mut DungeonRng,
) -> GridPoint {
    let treasure_id = treasure_room.map(|room| room.id);
    let candidates: Vec<&Room> = rooms
        .iter()
        .filter(|room| {
            room.id != start.id
                && room.id != exit.id
                && Some(room.id) != key_room
                && Some(room.id) != treasure_id
        })
        .collect();

    let chosen = match (treasure_room, candidates.first()) {
        (Some(treasure), Some(first)) => {
            candidates.iter().copied().fold(*first, |best, room| {
                if distance_between(room, treasure) > distance_between(best, treasure) {
                    room
                } else {
                    best
                }
            })
        }
        (None, Some(_)) => rng.pick(&candidates).copied().unwrap_or(start),
        (_, None) => start,
    };

    sample_room_cell(chosen.bounds, 3, start.center, grid, rng).unwrap_or(chosen.center)
}

/// Rolls the treasure item and its cell inside the treasure room.
pub(crate) fn treasure_spawn(
    room: &Room,
    start: &Room,
    grid: &Grid,
    rng: &mut DungeonRng,
) -> TreasureSpawn {
    let kind = rng
        .pick(&ConsumableKind::ALL)
        .copied()
        .unwrap_or(ConsumableKind::Medkit);
    let cell = sample_room_cell(room.bounds, 4, start.center, grid, rng).unwrap_or(room.center);
    TreasureSpawn { cell, kind }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawler_core::{Cell, GridMapper};

    fn room(id: u32, bounds: CellRect) -> Room {
        let mapper = GridMapper::new(41, 41, 2.0);
        Room {
            id: RoomId::new(id),
            bounds,
            center: bounds.center(),
            center_world: mapper.grid_to_world(bounds.center()),
            tag: None,
        }
    }

    fn carved(rooms: &[Room]) -> Grid {
        let mut grid = Grid::filled(41, 41, Cell::Wall);
        for room in rooms {
            for point in room.bounds.points() {
                grid.set(point, Cell::Floor);
            }
        }
        grid
    }

    #[test]
    fn sampler_prefers_distant_floor_cells() {
        let target = room(0, CellRect::new(10, 10, 6, 6));
        let grid = carved(std::slice::from_ref(&target));
        let reference = GridPoint::new(10, 10);
        let mut rng = DungeonRng::new(4);
        for _ in 0..32 {
            let cell = sample_room_cell(target.bounds, 4, reference, &grid, &mut rng)
                .expect("room is all floor");
            assert!(target.bounds.contains(cell));
            assert!(cell.manhattan_distance(reference) >= 4);
        }
    }

    #[test]
    fn sampler_returns_none_for_solid_rooms() {
        let grid = Grid::filled(41, 41, Cell::Wall);
        let bounds = CellRect::new(3, 3, 4, 4);
        let mut rng = DungeonRng::new(8);
        assert_eq!(
            sample_room_cell(bounds, 0, GridPoint::new(0, 0), &grid, &mut rng),
            None
        );
    }

    #[test]
    fn sampler_keeps_close_floor_cells_as_a_last_resort() {
        let target = room(0, CellRect::new(2, 2, 4, 4));
        let grid = carved(std::slice::from_ref(&target));
        let mut rng = DungeonRng::new(12);
        let cell = sample_room_cell(target.bounds, 100, GridPoint::new(2, 2), &grid, &mut rng);
        assert!(cell.is_some_and(|cell| target.bounds.contains(cell)));
    }

    #[test]
    fn ranged_enemies_come_first() {
        let start = room(0, CellRect::new(1, 1, 4, 4));
        let far = room(1, CellRect::new(25, 25, 6, 6));
        let rooms = vec![start.clone(), far];
        let grid = carved(&rooms);
        let spawns = enemy_spawns(&rooms, &start, 10, &grid, &mut DungeonRng::new(2));

        assert_eq!(spawns.len(), 10);
        let ranged = spawns
            .iter()
            .take_while(|spawn| spawn.kind == EnemyKind::Ranged)
            .count();
        assert_eq!(ranged, 3);
        assert!(spawns[3..].iter().all(|spawn| spawn.kind == EnemyKind::Melee));
    }

    #[test]
    fn trap_rooms_add_a_melee_enemy() {
        let start = room(0, CellRect::new(1, 1, 4, 4));
        let mut trap = room(1, CellRect::new(25, 25, 6, 6));
        trap.tag = Some(RoomTag::Trap);
        let rooms = vec![start.clone(), trap];
        let grid = carved(&rooms);
        let spawns = enemy_spawns(&rooms, &start, 1, &grid, &mut DungeonRng::new(5));

        assert_eq!(spawns.len(), 2);
        assert_eq!(spawns[0].kind, EnemyKind::Ranged);
        assert_eq!(spawns[1].kind, EnemyKind::Melee);
    }

    #[test]
    fn props_never_share_cells_or_enter_start_and_exit() {
        let rooms = vec![
            room(0, CellRect::new(1, 1, 4, 4)),
            room(1, CellRect::new(10, 10, 5, 5)),
            room(2, CellRect::new(20, 5, 4, 6)),
            room(3, CellRect::new(30, 30, 6, 6)),
        ];
        let grid = carved(&rooms);
        let spawns = prop_spawns(&rooms, &rooms[0], &rooms[3], &grid, &mut DungeonRng::new(6));

        let unique: HashSet<_> = spawns.iter().map(|spawn| spawn.cell).collect();
        assert_eq!(unique.len(), spawns.len());
        assert!(spawns
            .iter()
            .all(|spawn| rooms[1].bounds.contains(spawn.cell) || rooms[2].bounds.contains(spawn.cell)));
    }

    #[test]
    fn potions_avoid_the_key_cell() {
        let rooms = vec![
            room(0, CellRect::new(1, 1, 4, 4)),
            room(1, CellRect::new(10, 10, 4, 4)),
            room(2, CellRect::new(30, 30, 6, 6)),
        ];
        let grid = carved(&rooms);
        for seed in 0..16 {
            let key_cell = GridPoint::new(12, 12);
            let spawns = potion_spawns(
                &rooms,
                &rooms[0],
                &rooms[2],
                key_cell,
                &grid,
                &mut DungeonRng::new(seed),
            );
            assert!((0..=4).contains(&spawns.len()));
            assert!(spawns.iter().all(|spawn| spawn.cell != key_cell));
            assert!(spawns.iter().all(|spawn| rooms[1].bounds.contains(spawn.cell)));
        }
    }

    #[test]
    fn lever_goes_to_room_farthest_from_treasure() {
        let rooms = vec![
            room(0, CellRect::new(1, 1, 4, 4)),
            room(1, CellRect::new(8, 20, 4, 4)),
            room(2, CellRect::new(16, 2, 4, 4)),
            room(3, CellRect::new(30, 30, 4, 4)),
            room(4, CellRect::new(34, 2, 4, 4)),
        ];
        let grid = carved(&rooms);
        let treasure = &rooms[3];
        let cell = pick_lever_cell(
            &rooms,
            &rooms[0],
            &rooms[4],
            None,
            Some(treasure),
            &grid,
            &mut DungeonRng::new(9),
        );
        assert!(rooms[2].bounds.contains(cell));
    }

    #[test]
    fn lever_falls_back_to_start_room() {
        let rooms = vec![room(0, CellRect::new(1, 1, 4, 4)), room(1, CellRect::new(20, 20, 4, 4))];
        let grid = carved(&rooms);
        let cell = pick_lever_cell(
            &rooms,
            &rooms[0],
            &rooms[1],
            None,
            None,
            &grid,
            &mut DungeonRng::new(1),
        );
        assert!(rooms[0].bounds.contains(cell));
    }
}
