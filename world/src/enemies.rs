//! Drives enemy brains and applies the actions they request.

use std::time::Duration;

use crawler_core::Event;
use crawler_system_enemy_ai::{AiAction, EnemyContext};

use crate::actors::Projectile;
use crate::World;

impl World {
    pub(crate) fn update_enemies(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let (Some(level), Some(player)) = (self.level.as_ref(), self.player.position) else {
            return;
        };
        let context = EnemyContext {
            grid: &level.layout().grid,
            mapper: &self.mapper,
            colliders: &self.colliders,
            player,
            now: self.clock,
            dt,
        };

        let seconds = dt.as_secs_f32();
        let mut actions = Vec::new();
        for enemy in &mut self.enemies {
            actions.clear();
            let before = enemy.pose;
            enemy.brain.update(&mut enemy.pose, &context, &mut actions);
            enemy.hit_flash = (enemy.hit_flash - seconds).max(0.0);

            if enemy.pose != before {
                out_events.push(Event::EnemyMoved {
                    enemy: enemy.id,
                    position: enemy.pose.position,
                    heading: enemy.pose.heading,
                });
            }

            for action in actions.drain(..) {
                match action {
                    AiAction::Transition { from, to } => {
                        out_events.push(Event::EnemyBehaviorChanged {
                            enemy: enemy.id,
                            from,
                            to,
                        });
                    }
                    AiAction::FireBolt { origin, velocity } => {
                        self.bolts.push(Projectile::new(origin, velocity));
                        out_events.push(Event::EnemyFired {
                            enemy: enemy.id,
                            origin,
                            velocity,
                        });
                    }
                    AiAction::ContactDamage { amount } => {
                        self.player.bruise(amount);
                        out_events.push(Event::PlayerDamaged {
                            amount,
                            health: self.player.health,
                            shield: self.player.shield,
                        });
                    }
                }
            }
        }
    }
}
