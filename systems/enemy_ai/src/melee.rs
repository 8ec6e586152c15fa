//! Finite state machine driving melee enemies.

use std::f32::consts::TAU;
use std::time::Duration;

use crawler_core::BehaviorState;
use crawler_system_navigation::PathCache;
use glam::Vec3;
use tracing::trace;

use crate::{AiAction, EnemyContext, Pose};

/// Minimum time between two line-of-sight evaluations.
pub const PERCEPTION_INTERVAL: Duration = Duration::from_millis(300);

/// Radius of the ring of patrol waypoints around the enemy.
pub const PATROL_RADIUS: f32 = 3.0;

const PATROL_WAYPOINTS: usize = 4;
const PATROL_SPEED: f32 = 1.5;
const CHASE_SPEED: f32 = 2.2;
const SEARCH_SPEED: f32 = 1.8;
const WAYPOINT_ARRIVE: f32 = 0.5;
const PATH_ARRIVE: f32 = 0.3;
const SEARCH_TURN_RATE: f32 = 2.0;
const PATROL_TIMEOUT: Duration = Duration::from_secs(10);
const SEARCH_TIMEOUT: Duration = Duration::from_secs(8);

/// State of a melee enemy's behaviour machine and its movement memory.
#[derive(Clone, Debug, PartialEq)]
pub struct MeleeBrain {
    state: BehaviorState,
    path: PathCache,
    last_seen: Option<Vec3>,
    search_timer: Duration,
    last_perception: Option<Duration>,
    waypoints: Vec<Vec3>,
    waypoint_index: usize,
}

impl Default for MeleeBrain {
    fn default() -> Self {
        Self::new()
    }
}

impl MeleeBrain {
    /// Creates an idle brain that perceives on its first update.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: BehaviorState::Idle,
            path: PathCache::new(),
            last_seen: None,
            search_timer: Duration::ZERO,
            last_perception: None,
            waypoints: Vec::new(),
            waypoint_index: 0,
        }
    }

    /// Current behaviour state.
    #[must_use]
    pub const fn state(&self) -> BehaviorState {
        self.state
    }

    /// Patrol waypoints generated on the last idle-to-patrol transition.
    #[must_use]
    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    /// Position where the player was last seen before sight was lost.
    #[must_use]
    pub const fn last_seen(&self) -> Option<Vec3> {
        self.last_seen
    }

    pub(crate) fn update(&mut self, pose: &mut Pose, context: &EnemyContext<'_>, out: &mut Vec<AiAction>) {
        self.perceive(pose, context, out);
        self.search_timer += context.dt;

        let dt = context.dt.as_secs_f32();
        match self.state {
            BehaviorState::Idle => {}
            BehaviorState::Patrol => self.patrol(pose, context, dt),
            BehaviorState::Chase => self.chase(pose, context, dt),
            BehaviorState::Search => self.search(pose, context, dt),
        }

        if matches!(self.state, BehaviorState::Chase | BehaviorState::Search) {
            pose.face(context.player);
        }
    }

    fn perceive(&mut self, pose: &Pose, context: &EnemyContext<'_>, out: &mut Vec<AiAction>) {
        let due = match self.last_perception {
            Some(last) => context.now.saturating_sub(last) > PERCEPTION_INTERVAL,
            None => true,
        };
        if !due {
            return;
        }
        self.last_perception = Some(context.now);

        let visible = context.can_see_player(pose.position);
        let next = match self.state {
            BehaviorState::Idle if visible => BehaviorState::Chase,
            BehaviorState::Idle => {
                self.waypoints = patrol_waypoints(pose.position, context);
                self.waypoint_index = 0;
                BehaviorState::Patrol
            }
            BehaviorState::Patrol if visible => BehaviorState::Chase,
            BehaviorState::Patrol if self.search_timer > PATROL_TIMEOUT => {
                self.search_timer = Duration::ZERO;
                BehaviorState::Idle
            }
            BehaviorState::Chase if !visible => {
                self.last_seen = Some(context.player);
                self.search_timer = Duration::ZERO;
                BehaviorState::Search
            }
            BehaviorState::Search if visible => BehaviorState::Chase,
            BehaviorState::Search if self.search_timer > SEARCH_TIMEOUT => BehaviorState::Patrol,
            state => state,
        };

        if next != self.state {
            trace!(from = ?self.state, to = ?next, "melee state transition");
            out.push(AiAction::Transition {
                from: self.state,
                to: next,
            });
            self.state = next;
        }
    }

    fn patrol(&mut self, pose: &mut Pose, context: &EnemyContext<'_>, dt: f32) {
        let Some(waypoint) = self.waypoints.get(self.waypoint_index).copied() else {
            return;
        };
        if pose.step_toward(waypoint, WAYPOINT_ARRIVE, dt * PATROL_SPEED, context.colliders) {
            self.waypoint_index = (self.waypoint_index + 1) % self.waypoints.len();
        }
    }

    fn chase(&mut self, pose: &mut Pose, context: &EnemyContext<'_>, dt: f32) {
        let from = context.mapper.world_to_grid(pose.position);
        let target = context.mapper.world_to_grid(context.player);
        if self.path.refresh(context.now, from, target, context.grid) {
            trace!(
                from = ?from,
                target = ?target,
                length = self.path.remaining().len(),
                "melee repath"
            );
        }

        let Some(next) = self.path.next_waypoint() else {
            return;
        };
        let waypoint = context.mapper.grid_to_world(next);
        if pose.step_toward(waypoint, PATH_ARRIVE, dt * CHASE_SPEED, context.colliders) {
            self.path.advance();
        }
    }

    fn search(&mut self, pose: &mut Pose, context: &EnemyContext<'_>, dt: f32) {
        let Some(last_seen) = self.last_seen else {
            return;
        };
        if pose.step_toward(last_seen, WAYPOINT_ARRIVE, dt * SEARCH_SPEED, context.colliders) {
            pose.heading += dt * SEARCH_TURN_RATE;
        }
    }
}

/// Up to four points on a ring around `center`, dropping points over walls.
fn patrol_waypoints(center: Vec3, context: &EnemyContext<'_>) -> Vec<Vec3> {
    (0..PATROL_WAYPOINTS)
        .map(|index| {
            let angle = index as f32 / PATROL_WAYPOINTS as f32 * TAU;
            Vec3::new(
                center.x + angle.cos() * PATROL_RADIUS,
                center.y,
                center.z + angle.sin() * PATROL_RADIUS,
            )
        })
        .filter(|waypoint| context.grid.is_floor(context.mapper.world_to_grid(*waypoint)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawler_core::{Cell, Grid, GridMapper, GridPoint};
    use crawler_system_collision::ColliderSet;

    struct Fixture {
        grid: Grid,
        mapper: GridMapper,
        colliders: ColliderSet,
    }

    impl Fixture {
        fn open(size: u32) -> Self {
            let grid = Grid::filled(size, size, Cell::Floor);
            let mapper = GridMapper::new(size, size, 2.0);
            let colliders = ColliderSet::rebuild(&grid, &mapper, [], []);
            Self {
                grid,
                mapper,
                colliders,
            }
        }

        fn context(&self, player: Vec3, now_ms: u64) -> EnemyContext<'_> {
            EnemyContext {
                grid: &self.grid,
                mapper: &self.mapper,
                colliders: &self.colliders,
                player,
                now: Duration::from_millis(now_ms),
                dt: Duration::from_millis(50),
            }
        }
    }

    #[test]
    fn perception_is_throttled() {
        let fixture = Fixture::open(9);
        let start = fixture.mapper.grid_to_world(GridPoint::new(4, 4));
        let far = fixture.mapper.grid_to_world(GridPoint::new(0, 0));
        let mut brain = MeleeBrain::new();
        let mut pose = Pose::at(start);
        let mut actions = Vec::new();

        brain.update(&mut pose, &fixture.context(far, 0), &mut actions);
        assert_eq!(brain.state(), BehaviorState::Chase);

        brain.update(&mut pose, &fixture.context(far, 300), &mut actions);
        assert_eq!(brain.last_perception, Some(Duration::ZERO));

        brain.update(&mut pose, &fixture.context(far, 301), &mut actions);
        assert_eq!(brain.last_perception, Some(Duration::from_millis(301)));
    }

    #[test]
    fn chase_follows_grid_path_toward_player() {
        let fixture = Fixture::open(9);
        let start = fixture.mapper.grid_to_world(GridPoint::new(1, 4));
        let player = fixture.mapper.grid_to_world(GridPoint::new(7, 4)) + Vec3::Y * 1.7;
        let mut brain = MeleeBrain::new();
        let mut pose = Pose::at(start);
        let mut actions = Vec::new();

        for tick in 0..20 {
            brain.update(&mut pose, &fixture.context(player, tick * 50), &mut actions);
        }
        assert_eq!(brain.state(), BehaviorState::Chase);
        assert!(pose.position.x > start.x + 1.0);
        assert!((pose.position.z - start.z).abs() < 1e-3);
        assert!((pose.heading - std::f32::consts::FRAC_PI_2).abs() < 1e-3);
    }

    #[test]
    fn losing_sight_switches_to_search_and_records_position() {
        let mut fixture = Fixture::open(9);
        let start = fixture.mapper.grid_to_world(GridPoint::new(1, 4));
        let player = fixture.mapper.grid_to_world(GridPoint::new(7, 4));
        let mut brain = MeleeBrain::new();
        let mut pose = Pose::at(start);
        let mut actions = Vec::new();
        brain.update(&mut pose, &fixture.context(player, 0), &mut actions);
        assert_eq!(brain.state(), BehaviorState::Chase);

        for y in 0..9 {
            fixture.grid.set(GridPoint::new(4, y), Cell::Wall);
        }
        fixture.colliders = ColliderSet::rebuild(&fixture.grid, &fixture.mapper, [], []);
        actions.clear();
        brain.update(&mut pose, &fixture.context(player, 400), &mut actions);

        assert_eq!(brain.state(), BehaviorState::Search);
        assert_eq!(brain.last_seen(), Some(player));
        assert_eq!(
            actions,
            vec![AiAction::Transition {
                from: BehaviorState::Chase,
                to: BehaviorState::Search,
            }]
        );
    }

    #[test]
    fn search_gives_up_after_timeout() {
        let mut fixture = Fixture::open(9);
        for y in 0..9 {
            fixture.grid.set(GridPoint::new(4, y), Cell::Wall);
        }
        fixture.colliders = ColliderSet::rebuild(&fixture.grid, &fixture.mapper, [], []);
        let start = fixture.mapper.grid_to_world(GridPoint::new(1, 4));
        let hidden = fixture.mapper.grid_to_world(GridPoint::new(7, 4));

        let mut brain = MeleeBrain {
            state: BehaviorState::Search,
            last_seen: Some(start),
            search_timer: Duration::from_millis(7_990),
            ..MeleeBrain::new()
        };
        let mut pose = Pose::at(start);
        let mut actions = Vec::new();
        brain.update(&mut pose, &fixture.context(hidden, 0), &mut actions);
        assert_eq!(brain.state(), BehaviorState::Search);

        brain.update(&mut pose, &fixture.context(hidden, 301), &mut actions);
        assert_eq!(brain.state(), BehaviorState::Patrol);
    }

    #[test]
    fn patrol_returns_to_idle_after_timeout() {
        let mut fixture = Fixture::open(9);
        for y in 0..9 {
            fixture.grid.set(GridPoint::new(4, y), Cell::Wall);
        }
        fixture.colliders = ColliderSet::rebuild(&fixture.grid, &fixture.mapper, [], []);
        let start = fixture.mapper.grid_to_world(GridPoint::new(1, 4));
        let hidden = fixture.mapper.grid_to_world(GridPoint::new(7, 4));

        let mut brain = MeleeBrain {
            state: BehaviorState::Patrol,
            search_timer: Duration::from_millis(9_990),
            ..MeleeBrain::new()
        };
        let mut pose = Pose::at(start);
        let mut actions = Vec::new();
        brain.update(&mut pose, &fixture.context(hidden, 0), &mut actions);
        assert_eq!(brain.state(), BehaviorState::Patrol);
        assert!(actions.is_empty());

        brain.update(&mut pose, &fixture.context(hidden, 301), &mut actions);
        assert_eq!(brain.state(), BehaviorState::Idle);
        assert_eq!(brain.search_timer, Duration::from_millis(50));
        assert_eq!(
            actions,
            vec![AiAction::Transition {
                from: BehaviorState::Patrol,
                to: BehaviorState::Idle,
            }]
        );
    }

    #[test]
    fn searching_enemy_resumes_chase_when_player_reappears() {
        let fixture = Fixture::open(9);
        let start = fixture.mapper.grid_to_world(GridPoint::new(1, 4));
        let player = fixture.mapper.grid_to_world(GridPoint::new(7, 4));

        let mut brain = MeleeBrain {
            state: BehaviorState::Search,
            last_seen: Some(player),
            search_timer: Duration::from_millis(2_000),
            ..MeleeBrain::new()
        };
        let mut pose = Pose::at(start);
        let mut actions = Vec::new();
        brain.update(&mut pose, &fixture.context(player, 0), &mut actions);

        assert_eq!(brain.state(), BehaviorState::Chase);
        assert_eq!(
            actions,
            vec![AiAction::Transition {
                from: BehaviorState::Search,
                to: BehaviorState::Chase,
            }]
        );
    }

    #[test]
    fn patrolling_enemy_chases_once_player_is_seen() {
        let fixture = Fixture::open(9);
        let start = fixture.mapper.grid_to_world(GridPoint::new(4, 4));
        let player = fixture.mapper.grid_to_world(GridPoint::new(8, 8));

        let mut brain = MeleeBrain {
            state: BehaviorState::Patrol,
            waypoints: vec![start + Vec3::X * PATROL_RADIUS],
            ..MeleeBrain::new()
        };
        let mut pose = Pose::at(start);
        let mut actions = Vec::new();
        brain.update(&mut pose, &fixture.context(player, 0), &mut actions);

        assert_eq!(brain.state(), BehaviorState::Chase);
        assert_eq!(
            actions,
            vec![AiAction::Transition {
                from: BehaviorState::Patrol,
                to: BehaviorState::Chase,
            }]
        );
    }
}
