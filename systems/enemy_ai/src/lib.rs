#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-enemy decision making.
//!
//! Each enemy owns a [`Brain`]. Every simulation tick the world hands the
//! brain the enemy's [`Pose`] and a read-only [`EnemyContext`]; the brain moves
//! the pose in place and reports side effects that the world must apply as
//! [`AiAction`] values. Brains never touch the player or other enemies
//! directly.

use std::time::Duration;

use crawler_core::{BehaviorState, EnemyKind, Grid, GridMapper};
use crawler_system_collision::ColliderSet;
use glam::Vec3;

mod melee;
mod ranged;

pub use melee::{MeleeBrain, PATROL_RADIUS, PERCEPTION_INTERVAL};
pub use ranged::{RangedBrain, RANGED_COOLDOWN, RANGED_RANGE};

/// Collision radius of every enemy body.
pub const ENEMY_RADIUS: f32 = 0.65;

/// Horizontal distance within which an enemy damages the player on contact.
pub const CONTACT_RANGE: f32 = 1.2;

/// Contact damage dealt per second of overlap.
pub const CONTACT_DAMAGE_PER_SECOND: f32 = 30.0;

/// Height above the enemy origin from which bolts are released.
pub const BOLT_MUZZLE_HEIGHT: f32 = 1.2;

/// Speed of enemy bolts in units per second.
pub const BOLT_SPEED: f32 = 10.0;

/// Position and facing of an enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    /// World position of the enemy's feet.
    pub position: Vec3,
    /// Facing angle around the vertical axis in radians.
    pub heading: f32,
}

impl Pose {
    /// Creates a pose at the provided position facing along `+z`.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self {
            position,
            heading: 0.0,
        }
    }

    /// Turns the pose to face the target on the horizontal plane.
    pub fn face(&mut self, target: Vec3) {
        let dx = target.x - self.position.x;
        let dz = target.z - self.position.z;
        if dx != 0.0 || dz != 0.0 {
            self.heading = dx.atan2(dz);
        }
    }

    /// Horizontal distance from the pose to the target.
    #[must_use]
    pub fn flat_distance(&self, target: Vec3) -> f32 {
        let dx = target.x - self.position.x;
        let dz = target.z - self.position.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Walks toward the target on the horizontal plane, unless already within
    /// `arrive_radius`, and resolves collisions afterwards.
    ///
    /// Returns `true` when the pose was already within `arrive_radius`.
    pub fn step_toward(
        &mut self,
        target: Vec3,
        arrive_radius: f32,
        distance: f32,
        colliders: &ColliderSet,
    ) -> bool {
        let offset = Vec3::new(target.x - self.position.x, 0.0, target.z - self.position.z);
        let remaining = offset.length();
        if remaining < arrive_radius {
            return true;
        }
        self.position += offset / remaining * distance;
        self.position = colliders.resolve(self.position, ENEMY_RADIUS);
        false
    }
}

/// Read-only view of the level handed to brains each tick.
#[derive(Clone, Copy, Debug)]
pub struct EnemyContext<'a> {
    /// Level geometry.
    pub grid: &'a Grid,
    /// Mapping between cells and world positions.
    pub mapper: &'a GridMapper,
    /// Every obstacle in the level; walls also block sight.
    pub colliders: &'a ColliderSet,
    /// Eye position of the player.
    pub player: Vec3,
    /// Simulation time elapsed since the level was loaded.
    pub now: Duration,
    /// Duration of the current tick.
    pub dt: Duration,
}

impl EnemyContext<'_> {
    /// Reports whether an enemy at `position` can see the player.
    #[must_use]
    pub fn can_see_player(&self, position: Vec3) -> bool {
        crawler_system_navigation::has_line_of_sight(position, self.player, self.colliders.walls())
    }
}

/// Side effects requested by a brain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AiAction {
    /// The behaviour state machine transitioned.
    Transition {
        /// State before the transition.
        from: BehaviorState,
        /// State after the transition.
        to: BehaviorState,
    },
    /// A bolt should be spawned.
    FireBolt {
        /// Spawn position of the bolt.
        origin: Vec3,
        /// Velocity of the bolt.
        velocity: Vec3,
    },
    /// The player should lose health for touching the enemy.
    ContactDamage {
        /// Damage accumulated over the tick.
        amount: f32,
    },
}

/// Behaviour of a single enemy.
#[derive(Clone, Debug, PartialEq)]
pub enum Brain {
    /// Hunts the player through the idle/patrol/chase/search state machine.
    Melee(MeleeBrain),
    /// Holds position and fires bolts at the visible player.
    Ranged(RangedBrain),
}

impl Brain {
    /// Creates the brain matching the enemy kind.
    ///
    /// `shoot_phase` seeds the initial shoot timer of ranged enemies and is
    /// ignored for melee enemies.
    #[must_use]
    pub fn for_kind(kind: EnemyKind, shoot_phase: Duration) -> Self {
        match kind {
            EnemyKind::Melee => Self::Melee(MeleeBrain::new()),
            EnemyKind::Ranged => Self::Ranged(RangedBrain::new(shoot_phase)),
        }
    }

    /// Behavioural family of the brain.
    #[must_use]
    pub const fn kind(&self) -> EnemyKind {
        match self {
            Self::Melee(_) => EnemyKind::Melee,
            Self::Ranged(_) => EnemyKind::Ranged,
        }
    }

    /// Current state of the behaviour machine; ranged enemies report `None`.
    #[must_use]
    pub fn behavior(&self) -> Option<BehaviorState> {
        match self {
            Self::Melee(brain) => Some(brain.state()),
            Self::Ranged(_) => None,
        }
    }

    /// Advances the brain by one tick, moving `pose` and collecting actions.
    pub fn update(&mut self, pose: &mut Pose, context: &EnemyContext<'_>, out: &mut Vec<AiAction>) {
        match self {
            Self::Melee(brain) => brain.update(pose, context, out),
            Self::Ranged(brain) => brain.update(pose, context, out),
        }

        if pose.flat_distance(context.player) < CONTACT_RANGE {
            out.push(AiAction::ContactDamage {
                amount: CONTACT_DAMAGE_PER_SECOND * context.dt.as_secs_f32(),
            });
        }
    }
}
