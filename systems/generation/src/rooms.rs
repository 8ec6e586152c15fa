//! Room carving and corridor connection.

use crawler_core::{Cell, CellRect, DungeonConfig, Grid, GridMapper, GridPoint, Room, RoomId};
use tracing::{debug, warn};

use crate::DungeonRng;

/// Edge length of the room carved when random placement produced nothing.
const FALLBACK_ROOM_SIZE: u32 = 6;

/// Grid geometry plus the rooms carved into it, sorted by center column.
#[derive(Clone, Debug)]
pub(crate) struct CarvedDungeon {
    pub(crate) grid: Grid,
    pub(crate) rooms: Vec<Room>,
    pub(crate) start: Room,
    pub(crate) exit: Room,
}

pub(crate) fn carve(config: &DungeonConfig, mapper: &GridMapper, rng: &mut DungeonRng) -> CarvedDungeon {
    let width = config.grid_width;
    let height = config.grid_height;
    let mut grid = Grid::filled(width, height, Cell::Wall);
    let mut rooms: Vec<Room> = Vec::new();

    for _ in 0..config.room_attempts {
        if rooms.len() >= config.max_rooms {
            break;
        }

        let sizes = (
            rng.range_inclusive(config.room_min_size, config.room_max_size),
            rng.range_inclusive(config.room_min_size, config.room_max_size),
        );
        let (Some(room_width), Some(room_height)) = sizes else {
            continue;
        };
        let x = rng.range_inclusive(1, width.saturating_sub(room_width.saturating_add(2)));
        let y = rng.range_inclusive(1, height.saturating_sub(room_height.saturating_add(2)));
        let (Some(x), Some(y)) = (x, y) else {
            continue;
        };

        let bounds = CellRect::new(x, y, room_width, room_height);
        if touches_floor(&grid, bounds) {
            continue;
        }

        carve_rect(&mut grid, bounds);
        let id = RoomId::new(u32::try_from(rooms.len()).unwrap_or(u32::MAX));
        rooms.push(make_room(id, bounds, mapper));
    }

    rooms.sort_by_key(|room| room.center.x());

    for pair in rooms.windows(2) {
        if let [previous, current] = pair {
            carve_corridor(&mut grid, previous.center, current.center, rng);
        }
    }

    let start = match rooms.first() {
        Some(room) => room.clone(),
        None => {
            let bounds = fallback_bounds(width, height);
            warn!(width, height, "no room fit the grid, carving a fallback room");
            carve_rect(&mut grid, bounds);
            let room = make_room(RoomId::new(0), bounds, mapper);
            rooms.push(room.clone());
            room
        }
    };

    let exit_index = pick_exit(&rooms);
    let exit = rooms.get(exit_index).cloned().unwrap_or_else(|| start.clone());
    debug!(rooms = rooms.len(), exit = exit.id.get(), "carved dungeon");

    CarvedDungeon {
        grid,
        rooms,
        start,
        exit,
    }
}

fn make_room(id: RoomId, bounds: CellRect, mapper: &GridMapper) -> Room {
    let center = bounds.center();
    Room {
        id,
        bounds,
        center,
        center_world: mapper.grid_to_world(center),
        tag: None,
    }
}

/// Reports whether the room grown by one cell on every side overlaps floor.
fn touches_floor(grid: &Grid, bounds: CellRect) -> bool {
    let min_x = bounds.x().saturating_sub(1);
    let min_y = bounds.y().saturating_sub(1);
    let padded = CellRect::new(
        min_x,
        min_y,
        bounds.x() + bounds.width() + 1 - min_x,
        bounds.y() + bounds.height() + 1 - min_y,
    );
    padded.points().any(|point| grid.is_floor(point))
}

fn carve_rect(grid: &mut Grid, bounds: CellRect) {
    for point in bounds.points() {
        grid.set(point, Cell::Floor);
    }
}

fn fallback_bounds(width: u32, height: u32) -> CellRect {
    let room_width = FALLBACK_ROOM_SIZE.min(width);
    let room_height = FALLBACK_ROOM_SIZE.min(height);
    let x = (width / 2).saturating_sub(FALLBACK_ROOM_SIZE / 2).min(width - room_width);
    let y = (height / 2).saturating_sub(FALLBACK_ROOM_SIZE / 2).min(height - room_height);
    CellRect::new(x, y, room_width, room_height)
}

/// Index of the room farthest from the first room; ties keep the last room.
fn pick_exit(rooms: &[Room]) -> usize {
    let Some(start) = rooms.first() else {
        return 0;
    };
    let mut exit_index = rooms.len().saturating_sub(1);
    let mut exit_distance = rooms
        .get(exit_index)
        .map_or(0, |room| room.center.manhattan_distance(start.center));

    for (index, room) in rooms.iter().enumerate() {
        let distance = room.center.manhattan_distance(start.center);
        if distance > exit_distance {
            exit_index = index;
            exit_distance = distance;
        }
    }
    exit_index
}

/// Carves an L-shaped corridor, randomly choosing which leg comes first.
fn carve_corridor(grid: &mut Grid, from: GridPoint, to: GridPoint, rng: &mut DungeonRng) {
    if rng.coin() {
        let corner = GridPoint::new(to.x(), from.y());
        carve_line(grid, from, corner);
        carve_line(grid, corner, to);
    } else {
        let corner = GridPoint::new(from.x(), to.y());
        carve_line(grid, from, corner);
        carve_line(grid, corner, to);
    }
}

/// Carves every cell on an axis-aligned line, endpoints included.
fn carve_line(grid: &mut Grid, from: GridPoint, to: GridPoint) {
    let (x0, x1) = (from.x().min(to.x()), from.x().max(to.x()));
    let (y0, y1) = (from.y().min(to.y()), from.y().max(to.y()));
    for y in y0..=y1 {
        for x in x0..=x1 {
            grid.set(GridPoint::new(x, y), Cell::Floor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carved_rooms_do_not_touch_each_other() {
        let config = DungeonConfig::default();
        let mapper = GridMapper::from_config(&config);
        let dungeon = carve(&config, &mapper, &mut DungeonRng::new(7));

        for (index, room) in dungeon.rooms.iter().enumerate() {
            for other in dungeon.rooms.iter().skip(index + 1) {
                let a = room.bounds;
                let b = other.bounds;
                let separated = a.x() + a.width() < b.x()
                    || b.x() + b.width() < a.x()
                    || a.y() + a.height() < b.y()
                    || b.y() + b.height() < a.y();
                assert!(separated, "rooms {a:?} and {b:?} touch");
            }
        }
    }

    #[test]
    fn rooms_are_sorted_by_center_column() {
        let config = DungeonConfig::default();
        let mapper = GridMapper::from_config(&config);
        let dungeon = carve(&config, &mapper, &mut DungeonRng::new(11));
        assert!(dungeon
            .rooms
            .windows(2)
            .all(|pair| pair[0].center.x() <= pair[1].center.x()));
    }

    #[test]
    fn rooms_stay_clear_of_the_border() {
        let config = DungeonConfig::default();
        let mapper = GridMapper::from_config(&config);
        let dungeon = carve(&config, &mapper, &mut DungeonRng::new(23));
        for room in &dungeon.rooms {
            assert!(room.bounds.x() >= 1 && room.bounds.y() >= 1);
            assert!(room.bounds.x() + room.bounds.width() <= config.grid_width - 2);
            assert!(room.bounds.y() + room.bounds.height() <= config.grid_height - 2);
        }
    }

    #[test]
    fn tiny_grid_falls_back_to_single_room() {
        let config = DungeonConfig {
            grid_width: 5,
            grid_height: 4,
            ..DungeonConfig::default()
        };
        let mapper = GridMapper::from_config(&config);
        let dungeon = carve(&config, &mapper, &mut DungeonRng::new(1));
        assert_eq!(dungeon.rooms.len(), 1);
        assert_eq!(dungeon.exit, dungeon.start);
        assert_eq!(dungeon.rooms[0].bounds, CellRect::new(0, 0, 5, 4));
        assert_eq!(dungeon.grid.floor_count(), 20);
    }

    #[test]
    fn oversized_rooms_are_skipped_instead_of_overflowing() {
        let config = DungeonConfig {
            room_max_size: u32::MAX,
            ..DungeonConfig::default()
        };
        let mapper = GridMapper::from_config(&config);
        let dungeon = carve(&config, &mapper, &mut DungeonRng::new(3));
        assert!(!dungeon.rooms.is_empty());
        for room in &dungeon.rooms {
            assert!(room.bounds.x() + room.bounds.width() <= config.grid_width);
            assert!(room.bounds.y() + room.bounds.height() <= config.grid_height);
        }
    }

    #[test]
    fn fallback_room_is_centered_on_default_grid() {
        assert_eq!(fallback_bounds(41, 41), CellRect::new(17, 17, 6, 6));
    }

    #[test]
    fn exit_prefers_strictly_farther_rooms() {
        let mapper = GridMapper::new(41, 41, 2.0);
        let rooms = vec![
            make_room(RoomId::new(0), CellRect::new(1, 1, 4, 4), &mapper),
            make_room(RoomId::new(1), CellRect::new(20, 20, 4, 4), &mapper),
            make_room(RoomId::new(2), CellRect::new(10, 1, 4, 4), &mapper),
        ];
        assert_eq!(pick_exit(&rooms), 1);

        let tied = vec![
            make_room(RoomId::new(0), CellRect::new(1, 1, 4, 4), &mapper),
            make_room(RoomId::new(1), CellRect::new(11, 1, 4, 4), &mapper),
            make_room(RoomId::new(2), CellRect::new(1, 11, 4, 4), &mapper),
        ];
        assert_eq!(pick_exit(&tied), 2);
    }
}
