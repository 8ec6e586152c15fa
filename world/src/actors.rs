//! Runtime entities instantiated from a level layout.

use crawler_core::{ConsumableKind, DoorId, DoorKind, EnemyId, GridPoint, PotionId, PropId, PropKind};
use crawler_system_collision::Aabb;
use crawler_system_enemy_ai::{Brain, Pose};
use glam::Vec3;

/// Health every enemy spawns with.
pub(crate) const ENEMY_HEALTH: i32 = 100;

/// Upper bound for both player health and shield.
pub(crate) const PLAYER_MAX_VITAL: f32 = 100.0;

#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) pose: Pose,
    pub(crate) health: i32,
    pub(crate) hit_flash: f32,
    pub(crate) brain: Brain,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Prop {
    pub(crate) id: PropId,
    pub(crate) kind: PropKind,
    pub(crate) cell: GridPoint,
    pub(crate) aabb: Aabb,
    pub(crate) hit_points: u32,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Door {
    pub(crate) id: DoorId,
    pub(crate) kind: DoorKind,
    pub(crate) cell: GridPoint,
    pub(crate) aabb: Aabb,
}

/// Pickup lying in the level. `touching` suppresses repeated rejections
/// while the player stands on it.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Pickup<T> {
    pub(crate) item: T,
    pub(crate) cell: GridPoint,
    pub(crate) touching: bool,
}

pub(crate) type Potion = Pickup<PotionId>;
pub(crate) type Treasure = Pickup<ConsumableKind>;

impl<T> Pickup<T> {
    pub(crate) const fn new(item: T, cell: GridPoint) -> Self {
        Self {
            item,
            cell,
            touching: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Player {
    pub(crate) position: Option<Vec3>,
    pub(crate) health: f32,
    pub(crate) shield: f32,
    pub(crate) score: u32,
    pub(crate) held: Option<ConsumableKind>,
}

impl Player {
    pub(crate) const fn new() -> Self {
        Self {
            position: None,
            health: PLAYER_MAX_VITAL,
            shield: 0.0,
            score: 0,
            held: None,
        }
    }

    /// Drains the shield first and the remainder from health.
    pub(crate) fn absorb(&mut self, amount: f32) {
        let absorbed = self.shield.min(amount);
        self.shield -= absorbed;
        let remaining = amount - absorbed;
        if remaining > 0.0 {
            self.health = (self.health - remaining).max(0.0);
        }
    }

    /// Contact damage ignores the shield.
    pub(crate) fn bruise(&mut self, amount: f32) {
        self.health = (self.health - amount).max(0.0);
    }

    pub(crate) fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).min(PLAYER_MAX_VITAL);
    }

    pub(crate) fn recharge(&mut self, amount: f32) {
        self.shield = (self.shield + amount).min(PLAYER_MAX_VITAL);
    }
}

/// Bullet or bolt travelling in a straight line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Projectile {
    pub(crate) position: Vec3,
    pub(crate) previous: Vec3,
    pub(crate) velocity: Vec3,
    pub(crate) age: f32,
}

impl Projectile {
    pub(crate) const fn new(origin: Vec3, velocity: Vec3) -> Self {
        Self {
            position: origin,
            previous: origin,
            velocity,
            age: 0.0,
        }
    }

    pub(crate) fn advance(&mut self, dt: f32) {
        self.previous = self.position;
        self.position += self.velocity * dt;
        self.age += dt;
    }
}
