//! Door placement that never softlocks the level.

use crawler_core::{CellRect, Grid, GridPoint};
use crawler_system_navigation::{can_reach_all, flood_fill};

/// Floor cells on the room perimeter that touch floor outside the room.
///
/// Cells are reported once each, scanned in row-major order.
pub(crate) fn room_entrances(bounds: CellRect, grid: &Grid) -> Vec<GridPoint> {
    bounds
        .points()
        .filter(|cell| bounds.is_on_perimeter(*cell) && grid.is_floor(*cell))
        .filter(|cell| {
            [(-1, 0), (1, 0), (0, -1), (0, 1)]
                .into_iter()
                .filter_map(|(dx, dy)| cell.offset(dx, dy))
                .any(|neighbor| !bounds.contains(neighbor) && grid.is_floor(neighbor))
        })
        .collect()
}

/// First entrance whose closure keeps every required cell reachable from `start`.
pub(crate) fn exit_door_cell(
    entrances: &[GridPoint],
    grid: &Grid,
    start: GridPoint,
    required: &[GridPoint],
) -> Option<GridPoint> {
    entrances
        .iter()
        .copied()
        .find(|candidate| can_reach_all(grid, start, required, &[*candidate]))
}

/// First entrance whose closure keeps the lever reachable but cuts off the
/// treasure.
pub(crate) fn treasure_door_cell(
    entrances: &[GridPoint],
    grid: &Grid,
    start: GridPoint,
    lever: GridPoint,
    treasure: GridPoint,
) -> Option<GridPoint> {
    entrances.iter().copied().find(|candidate| {
        let reachable = flood_fill(grid, start, |cell| cell == *candidate);
        reachable.contains(lever) && !reachable.contains(treasure)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawler_core::Cell;

    /// Two 3x3 rooms joined by a one-cell corridor at row 2.
    fn twin_rooms() -> (Grid, CellRect, CellRect) {
        let mut grid = Grid::filled(11, 5, Cell::Wall);
        let left = CellRect::new(1, 1, 3, 3);
        let right = CellRect::new(7, 1, 3, 3);
        for point in left.points().chain(right.points()) {
            grid.set(point, Cell::Floor);
        }
        for x in 4..7 {
            grid.set(GridPoint::new(x, 2), Cell::Floor);
        }
        (grid, left, right)
    }

    #[test]
    fn entrances_are_perimeter_cells_touching_outside_floor() {
        let (grid, left, right) = twin_rooms();
        assert_eq!(room_entrances(left, &grid), vec![GridPoint::new(3, 2)]);
        assert_eq!(room_entrances(right, &grid), vec![GridPoint::new(7, 2)]);
    }

    #[test]
    fn exit_door_rejects_cells_that_strand_objectives() {
        let (grid, left, right) = twin_rooms();
        let start = left.center();
        let entrances = room_entrances(right, &grid);

        let stranded = exit_door_cell(&entrances, &grid, start, &[GridPoint::new(8, 2)]);
        assert_eq!(stranded, None);

        let safe = exit_door_cell(&entrances, &grid, start, &[GridPoint::new(5, 2)]);
        assert_eq!(safe, Some(GridPoint::new(7, 2)));
    }

    #[test]
    fn treasure_door_must_cut_off_the_treasure() {
        let (grid, left, right) = twin_rooms();
        let start = left.center();
        let entrances = room_entrances(right, &grid);

        let door = treasure_door_cell(
            &entrances,
            &grid,
            start,
            GridPoint::new(1, 1),
            GridPoint::new(9, 3),
        );
        assert_eq!(door, Some(GridPoint::new(7, 2)));

        let lever_inside = treasure_door_cell(
            &entrances,
            &grid,
            start,
            GridPoint::new(8, 1),
            GridPoint::new(9, 3),
        );
        assert_eq!(lever_inside, None);
    }
}
