//! Player bullets, enemy bolts and the damage they deal.

use std::time::Duration;

use crawler_core::Event;
use crawler_system_collision::{segment_aabb_intersect, segment_sphere_intersect};
use glam::Vec3;
use tracing::{debug, info};

use crate::actors::Projectile;
use crate::World;

/// Minimum delay between two player shots.
pub const FIRE_COOLDOWN: Duration = Duration::from_millis(180);

const BULLET_SPEED: f32 = 28.0;
const MUZZLE_OFFSET: f32 = 0.6;
const BULLET_LIFETIME: f32 = 2.5;
const BULLET_ARMING_AGE: f32 = 0.02;
const BULLET_DAMAGE: i32 = 60;
const HEADSHOT_DAMAGE: i32 = 120;
const KILL_SCORE: u32 = 25;
const HIT_FLASH: f32 = 0.15;

const BOLT_DAMAGE: f32 = 20.0;
const BOLT_LIFETIME: f32 = 4.0;
const PLAYER_HIT_RADIUS: f32 = 0.9;

// Enemy hit volumes, relative to the enemy's feet.
const BODY_HEIGHT: f32 = 0.8;
const BODY_RADIUS: f32 = 0.6;
const HEAD_HEIGHT: f32 = 1.6;
const HEAD_RADIUS: f32 = 0.35;

impl World {
    pub(crate) fn fire_bullet(&mut self, origin: Vec3, direction: Vec3, out_events: &mut Vec<Event>) {
        if let Some(last) = self.last_shot {
            if self.clock.saturating_sub(last) < FIRE_COOLDOWN {
                return;
            }
        }
        let forward = direction.normalize_or_zero();
        if forward == Vec3::ZERO {
            return;
        }
        self.last_shot = Some(self.clock);

        let muzzle = origin + forward * MUZZLE_OFFSET;
        let velocity = forward * BULLET_SPEED;
        self.bullets.push(Projectile::new(muzzle, velocity));
        out_events.push(Event::BulletFired {
            origin: muzzle,
            velocity,
        });
    }

    /// Moves bullets, breaking props they cross and dropping spent ones.
    pub(crate) fn update_bullets(&mut self, dt: f32, out_events: &mut Vec<Event>) {
        let mut index = self.bullets.len();
        while index > 0 {
            index -= 1;
            let Some(bullet) = self.bullets.get_mut(index) else {
                continue;
            };
            bullet.advance(dt);
            let bullet = *bullet;

            let struck = self
                .props
                .iter()
                .position(|prop| segment_aabb_intersect(bullet.previous, bullet.position, &prop.aabb));
            if let Some(prop) = struck {
                self.damage_prop(prop, out_events);
                let _ = self.bullets.remove(index);
                continue;
            }

            if bullet.age > BULLET_LIFETIME || self.colliders.contains_point(bullet.position) {
                let _ = self.bullets.remove(index);
            }
        }
    }

    fn damage_prop(&mut self, index: usize, out_events: &mut Vec<Event>) {
        let Some(prop) = self.props.get_mut(index) else {
            return;
        };
        prop.hit_points = prop.hit_points.saturating_sub(1);
        if prop.hit_points > 0 {
            out_events.push(Event::PropDamaged {
                prop: prop.id,
                hit_points: prop.hit_points,
            });
            return;
        }

        let destroyed = self.props.remove(index);
        debug!(prop = destroyed.id.get(), kind = ?destroyed.kind, "prop destroyed");
        self.rebuild_colliders();
        out_events.push(Event::PropDestroyed { prop: destroyed.id });
    }

    /// Moves enemy bolts; bolts stop at the first obstacle or at the player.
    pub(crate) fn update_bolts(&mut self, dt: f32, out_events: &mut Vec<Event>) {
        let Some(player) = self.player.position else {
            return;
        };

        let mut index = self.bolts.len();
        while index > 0 {
            index -= 1;
            let Some(bolt) = self.bolts.get_mut(index) else {
                continue;
            };
            bolt.advance(dt);
            let bolt = *bolt;

            if bolt.age > BOLT_LIFETIME || self.colliders.segment_hits(bolt.previous, bolt.position) {
                let _ = self.bolts.remove(index);
                continue;
            }

            if segment_sphere_intersect(bolt.previous, bolt.position, player, PLAYER_HIT_RADIUS) {
                self.player.absorb(BOLT_DAMAGE);
                out_events.push(Event::PlayerDamaged {
                    amount: BOLT_DAMAGE,
                    health: self.player.health,
                    shield: self.player.shield,
                });
                let _ = self.bolts.remove(index);
            }
        }
    }

    /// Applies bullet strikes to enemies; each enemy absorbs at most one
    /// bullet per tick.
    pub(crate) fn handle_bullet_hits(&mut self, out_events: &mut Vec<Event>) {
        let mut index = self.enemies.len();
        while index > 0 {
            index -= 1;
            let Some(position) = self.enemies.get(index).map(|enemy| enemy.pose.position) else {
                continue;
            };
            let hit = self
                .bullets
                .iter()
                .enumerate()
                .rev()
                .find_map(|(bullet, projectile)| strike(projectile, position).map(|headshot| (bullet, headshot)));
            let Some((bullet, headshot)) = hit else {
                continue;
            };
            let _ = self.bullets.remove(bullet);

            let Some(enemy) = self.enemies.get_mut(index) else {
                continue;
            };
            enemy.health -= if headshot { HEADSHOT_DAMAGE } else { BULLET_DAMAGE };
            enemy.hit_flash = HIT_FLASH;
            out_events.push(Event::EnemyHit {
                enemy: enemy.id,
                headshot,
                health: enemy.health,
            });
            if enemy.health > 0 {
                continue;
            }

            let killed = self.enemies.remove(index);
            self.player.score = self.player.score.saturating_add(KILL_SCORE);
            let remaining = crate::id_from_index(self.enemies.len());
            info!(enemy = killed.id.get(), remaining, "enemy killed");
            out_events.push(Event::EnemyKilled {
                enemy: killed.id,
                remaining,
            });
        }
    }
}

/// Reports whether the bullet crossed the enemy standing at `feet`, and
/// whether it crossed the head.
fn strike(bullet: &Projectile, feet: Vec3) -> Option<bool> {
    if bullet.age < BULLET_ARMING_AGE {
        return None;
    }
    if bullet.position.distance(bullet.previous) <= 1e-4 {
        return None;
    }
    let head = feet + Vec3::Y * HEAD_HEIGHT;
    if segment_sphere_intersect(bullet.previous, bullet.position, head, HEAD_RADIUS) {
        return Some(true);
    }
    let body = feet + Vec3::Y * BODY_HEIGHT;
    segment_sphere_intersect(bullet.previous, bullet.position, body, BODY_RADIUS).then_some(false)
}
