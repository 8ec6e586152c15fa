//! Scripted player driving the `simulate` subcommand.

use std::time::Duration;

use crawler_core::{Cell, Command, GridMapper, GridPoint};
use crawler_system_collision::Aabb;
use crawler_system_navigation::{find_path, has_line_of_sight};
use crawler_world::{query, World};
use glam::Vec3;

const WALK_SPEED: f32 = 5.0;
const WAYPOINT_REACHED: f32 = 0.3;
const ENGAGE_RANGE: f32 = 20.0;
const AIM_HEIGHT: f32 = 1.2;

/// Walks to the key, hunts the remaining enemies, then heads for the portal,
/// shooting at whatever enemy it can see on the way.
#[derive(Debug, Default)]
pub(crate) struct Autopilot {
    route: Vec<GridPoint>,
    goal: Option<GridPoint>,
    walls: Vec<Aabb>,
    walls_seed: Option<u64>,
}

impl Autopilot {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Commands to apply before the next tick.
    pub(crate) fn plan(&mut self, world: &World, dt: Duration) -> Vec<Command> {
        let (Some(level), Some(position)) = (query::level(world), query::player(world).position)
        else {
            return Vec::new();
        };
        let layout = level.layout();
        let mapper = GridMapper::from_config(query::config(world));

        if self.walls_seed != Some(layout.seed) {
            self.walls = layout
                .grid
                .points()
                .filter(|point| !layout.grid.is_floor(*point))
                .map(|point| Aabb::cell(&mapper, point))
                .collect();
            self.walls_seed = Some(layout.seed);
            self.route.clear();
            self.goal = None;
        }

        let enemies = query::enemies(world);
        let nearest = enemies.iter().min_by(|a, b| {
            a.position
                .distance_squared(position)
                .total_cmp(&b.position.distance_squared(position))
        });

        let goal = if !level.has_key() {
            layout.key_cell
        } else if let Some(enemy) = nearest {
            mapper.world_to_grid(enemy.position)
        } else {
            layout.exit_room.center
        };
        if self.goal != Some(goal) || self.route.is_empty() {
            self.replan(world, mapper.world_to_grid(position), goal);
        }

        let mut commands = Vec::new();
        while let Some(next) = self.route.last() {
            if flat_distance(mapper.grid_to_world(*next), position) > WAYPOINT_REACHED {
                break;
            }
            let _ = self.route.pop();
        }
        if let Some(next) = self.route.last() {
            let waypoint = mapper.grid_to_world(*next);
            let offset = Vec3::new(waypoint.x - position.x, 0.0, waypoint.z - position.z);
            let step = offset.length().min(WALK_SPEED * dt.as_secs_f32());
            commands.push(Command::MovePlayer {
                position: position + offset.normalize_or_zero() * step,
            });
        }

        let target = enemies
            .iter()
            .map(|enemy| enemy.position + Vec3::Y * AIM_HEIGHT)
            .filter(|aim| aim.distance(position) <= ENGAGE_RANGE)
            .find(|aim| has_line_of_sight(position, *aim, &self.walls));
        if let Some(aim) = target {
            commands.push(Command::FireBullet {
                origin: position,
                direction: aim - position,
            });
        }
        commands
    }

    /// Plans on a copy of the grid where locked doors count as walls.
    fn replan(&mut self, world: &World, from: GridPoint, goal: GridPoint) {
        let Some(grid) = query::grid(world) else {
            return;
        };
        let mut grid = grid.clone();
        for door in query::doors(world) {
            if door.locked {
                grid.set(door.cell, Cell::Wall);
            }
        }
        self.route = find_path(from, goal, &grid);
        self.route.reverse();
        self.goal = Some(goal);
    }
}

fn flat_distance(a: Vec3, b: Vec3) -> f32 {
    Vec3::new(a.x - b.x, 0.0, a.z - b.z).length()
}
