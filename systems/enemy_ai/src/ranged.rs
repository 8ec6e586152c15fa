//! Stationary turret behaviour for ranged enemies.

use std::time::Duration;

use glam::Vec3;

use crate::{AiAction, EnemyContext, Pose, BOLT_MUZZLE_HEIGHT, BOLT_SPEED};

/// Delay between two bolts.
pub const RANGED_COOLDOWN: Duration = Duration::from_millis(1200);

/// Maximum horizontal distance at which ranged enemies open fire.
pub const RANGED_RANGE: f32 = 18.0;

/// Shoot timer of a ranged enemy.
#[derive(Clone, Debug, PartialEq)]
pub struct RangedBrain {
    shoot_timer: Duration,
}

impl RangedBrain {
    /// Creates a brain whose first shot is delayed by `phase`.
    #[must_use]
    pub fn new(phase: Duration) -> Self {
        Self {
            shoot_timer: phase,
        }
    }

    /// Time left until the next bolt may be fired.
    #[must_use]
    pub const fn shoot_timer(&self) -> Duration {
        self.shoot_timer
    }

    pub(crate) fn update(&mut self, pose: &mut Pose, context: &EnemyContext<'_>, out: &mut Vec<AiAction>) {
        let visible = context.can_see_player(pose.position);
        self.shoot_timer = self.shoot_timer.saturating_sub(context.dt);

        if visible
            && pose.flat_distance(context.player) <= RANGED_RANGE
            && self.shoot_timer.is_zero()
        {
            let origin = pose.position + Vec3::Y * BOLT_MUZZLE_HEIGHT;
            let target = Vec3::new(context.player.x, origin.y, context.player.z);
            let velocity = (target - origin).normalize_or_zero() * BOLT_SPEED;
            out.push(AiAction::FireBolt { origin, velocity });
            self.shoot_timer = RANGED_COOLDOWN;
        }

        if visible {
            pose.face(context.player);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawler_core::{Cell, Grid, GridMapper, GridPoint};
    use crawler_system_collision::ColliderSet;

    fn fire_count(actions: &[AiAction]) -> usize {
        actions
            .iter()
            .filter(|action| matches!(action, AiAction::FireBolt { .. }))
            .count()
    }

    #[test]
    fn fires_on_cooldown_while_player_is_visible() {
        let grid = Grid::filled(21, 3, Cell::Floor);
        let mapper = GridMapper::new(21, 3, 2.0);
        let colliders = ColliderSet::new();
        let position = mapper.grid_to_world(GridPoint::new(2, 1));
        let player = mapper.grid_to_world(GridPoint::new(8, 1)) + Vec3::Y * 1.7;

        let mut brain = RangedBrain::new(Duration::from_millis(100));
        let mut pose = Pose::at(position);
        let mut actions = Vec::new();
        for tick in 0..30_u64 {
            let context = EnemyContext {
                grid: &grid,
                mapper: &mapper,
                colliders: &colliders,
                player,
                now: Duration::from_millis(tick * 50),
                dt: Duration::from_millis(50),
            };
            brain.update(&mut pose, &context, &mut actions);
        }

        // Second and twenty-sixth ticks.
        assert_eq!(fire_count(&actions), 2);
        assert_eq!(brain.shoot_timer(), Duration::from_millis(1000));
        let Some(AiAction::FireBolt { origin, velocity }) = actions.first().copied() else {
            panic!("expected a bolt");
        };
        assert!((origin.y - BOLT_MUZZLE_HEIGHT).abs() < 1e-6);
        assert!((velocity.length() - BOLT_SPEED).abs() < 1e-4);
        assert!(velocity.y.abs() < 1e-6);
        assert_eq!(pose.position, position);
    }

    #[test]
    fn holds_fire_beyond_range() {
        let grid = Grid::filled(41, 3, Cell::Floor);
        let mapper = GridMapper::new(41, 3, 2.0);
        let colliders = ColliderSet::new();
        let position = mapper.grid_to_world(GridPoint::new(0, 1));
        let player = mapper.grid_to_world(GridPoint::new(10, 1));

        let mut brain = RangedBrain::new(Duration::ZERO);
        let mut pose = Pose::at(position);
        let mut actions = Vec::new();
        let context = EnemyContext {
            grid: &grid,
            mapper: &mapper,
            colliders: &colliders,
            player,
            now: Duration::ZERO,
            dt: Duration::from_millis(16),
        };
        brain.update(&mut pose, &context, &mut actions);
        assert_eq!(fire_count(&actions), 0);
        assert!((pose.heading - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }
}
