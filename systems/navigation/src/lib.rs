#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid navigation primitives shared by the generator and enemy AI.
//!
//! Searches are breadth-first over the 4-connected floor cells of a
//! [`Grid`], visiting neighbours in the fixed order `+x, -x, +y, -y` so that
//! ties always break the same way for a given grid.

use std::collections::VecDeque;

use crawler_core::{Grid, GridPoint};
use crawler_system_collision::{segment_aabb_intersect, Aabb};
use glam::Vec3;

mod cache;

pub use cache::{PathCache, REPATH_INTERVAL};

/// Shortest 4-connected floor path from `start` to `goal`.
///
/// The returned path excludes `start` and ends with `goal`. It is empty when
/// either endpoint is not an in-bounds floor cell, when the goal cannot be
/// reached, or when `start == goal`.
#[must_use]
pub fn find_path(start: GridPoint, goal: GridPoint, grid: &Grid) -> Vec<GridPoint> {
    if !grid.is_floor(start) || !grid.is_floor(goal) {
        return Vec::new();
    }

    let (Some(start_index), Some(goal_index)) = (grid.index(start), grid.index(goal)) else {
        return Vec::new();
    };

    let cell_count = grid.cells().len();
    let mut visited = vec![false; cell_count];
    let mut previous: Vec<Option<usize>> = vec![None; cell_count];
    let mut points: Vec<Option<GridPoint>> = vec![None; cell_count];
    let mut queue = VecDeque::new();

    visited[start_index] = true;
    points[start_index] = Some(start);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        let Some(current_index) = grid.index(current) else {
            continue;
        };
        if current_index == goal_index {
            break;
        }

        for neighbor in grid.neighbors(current) {
            if !grid.is_floor(neighbor) {
                continue;
            }
            let Some(neighbor_index) = grid.index(neighbor) else {
                continue;
            };
            if visited[neighbor_index] {
                continue;
            }

            visited[neighbor_index] = true;
            previous[neighbor_index] = Some(current_index);
            points[neighbor_index] = Some(neighbor);
            queue.push_back(neighbor);
        }
    }

    if !visited[goal_index] {
        return Vec::new();
    }

    let mut path = Vec::new();
    let mut cursor = goal_index;
    while cursor != start_index {
        let Some(point) = points[cursor] else {
            break;
        };
        path.push(point);
        match previous[cursor] {
            Some(parent) => cursor = parent,
            None => break,
        }
    }
    path.reverse();
    path
}

/// Set of cells reached by a flood fill.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reachability {
    width: u32,
    height: u32,
    reached: Vec<bool>,
}

impl Reachability {
    /// Reports whether the flood fill reached the cell.
    #[must_use]
    pub fn contains(&self, point: GridPoint) -> bool {
        if point.x() >= self.width || point.y() >= self.height {
            return false;
        }
        let Ok(width) = usize::try_from(self.width) else {
            return false;
        };
        index(width, point)
            .and_then(|offset| self.reached.get(offset).copied())
            .unwrap_or(false)
    }

    /// Number of cells reached, including the start cell.
    #[must_use]
    pub fn count(&self) -> usize {
        self.reached.iter().filter(|reached| **reached).count()
    }
}

/// Flood fills floor cells outward from `start`, never entering cells for
/// which `is_blocked` returns `true`.
///
/// The start cell is always part of the result, even when it is a wall or
/// blocked itself.
#[must_use]
pub fn flood_fill<F>(grid: &Grid, start: GridPoint, mut is_blocked: F) -> Reachability
where
    F: FnMut(GridPoint) -> bool,
{
    let mut reachability = Reachability {
        width: grid.width(),
        height: grid.height(),
        reached: vec![false; grid.cells().len()],
    };

    let Some(start_index) = grid.index(start) else {
        return reachability;
    };

    reachability.reached[start_index] = true;
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        for neighbor in grid.neighbors(current) {
            if !grid.is_floor(neighbor) || is_blocked(neighbor) {
                continue;
            }
            let Some(neighbor_index) = grid.index(neighbor) else {
                continue;
            };
            if reachability.reached[neighbor_index] {
                continue;
            }

            reachability.reached[neighbor_index] = true;
            queue.push_back(neighbor);
        }
    }

    reachability
}

/// Reports whether every target is reachable from `start` when the cells in
/// `blocked` are impassable.
#[must_use]
pub fn can_reach_all(
    grid: &Grid,
    start: GridPoint,
    targets: &[GridPoint],
    blocked: &[GridPoint],
) -> bool {
    let reachability = flood_fill(grid, start, |cell| blocked.contains(&cell));
    targets.iter().all(|target| reachability.contains(*target))
}

/// Reports whether no wall box intersects the segment between two positions.
///
/// Only the horizontal plane is considered; props and doors never block sight.
#[must_use]
pub fn has_line_of_sight<'a, I>(from: Vec3, to: Vec3, walls: I) -> bool
where
    I: IntoIterator<Item = &'a Aabb>,
{
    !walls
        .into_iter()
        .any(|wall| segment_aabb_intersect(from, to, wall))
}

fn index(width: usize, point: GridPoint) -> Option<usize> {
    let column = usize::try_from(point.x()).ok()?;
    let row = usize::try_from(point.y()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}
