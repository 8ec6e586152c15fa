//! Proximity interactions: pickups, the lever, doors and the exit portal.

use crawler_core::{ConsumableKind, DoorKind, Event, GridPoint, PortalLock};
use glam::Vec3;
use tracing::{debug, info};

use crate::actors::PLAYER_MAX_VITAL;
use crate::{SessionStatus, World};

const KEY_HEIGHT: f32 = 1.2;
const KEY_RANGE: f32 = 1.4;
const POTION_RANGE: f32 = 1.2;
const POTION_HEAL: f32 = 25.0;
const TREASURE_RANGE: f32 = 1.2;
const LEVER_HEIGHT: f32 = 0.65;
const LEVER_RANGE: f32 = 1.3;
const DOOR_HINT_RANGE: f32 = 2.4;
const DOOR_OPEN_RANGE: f32 = 1.8;
const PORTAL_HINT_RANGE: f32 = 4.0;
const PORTAL_ENTER_RANGE: f32 = 3.0;
const MEDKIT_HEAL: f32 = 40.0;
const SHIELD_CHARGE: f32 = 40.0;

fn flat_distance(a: Vec3, b: Vec3) -> f32 {
    Vec3::new(a.x - b.x, 0.0, a.z - b.z).length()
}

impl World {
    fn cell_position(&self, cell: GridPoint, height: f32) -> Vec3 {
        self.mapper.grid_to_world(cell) + Vec3::Y * height
    }

    /// Exit doors open with the key, treasure doors with the lever.
    pub(crate) fn door_unlocked(&self, kind: DoorKind) -> bool {
        let Some(level) = self.level.as_ref() else {
            return false;
        };
        match kind {
            DoorKind::Exit => level.has_key(),
            DoorKind::Treasure => level.lever_activated(),
        }
    }

    pub(crate) fn update_key_pickup(&mut self, out_events: &mut Vec<Event>) {
        let (Some(level), Some(player)) = (self.level.as_ref(), self.player.position) else {
            return;
        };
        if level.has_key() {
            return;
        }
        let key = self.cell_position(level.layout().key_cell, KEY_HEIGHT);
        if key.distance(player) >= KEY_RANGE {
            return;
        }
        if let Some(level) = self.level.as_mut() {
            level.collect_key();
            debug!("key collected");
            out_events.push(Event::KeyCollected);
        }
    }

    pub(crate) fn update_potion_pickups(&mut self, out_events: &mut Vec<Event>) {
        let Some(player) = self.player.position else {
            return;
        };
        let mut index = self.potions.len();
        while index > 0 {
            index -= 1;
            let Some(cell) = self.potions.get(index).map(|potion| potion.cell) else {
                continue;
            };
            let within = flat_distance(self.mapper.grid_to_world(cell), player) < POTION_RANGE;
            let full = self.player.health >= PLAYER_MAX_VITAL;
            let Some(potion) = self.potions.get_mut(index) else {
                continue;
            };
            let touched = within && !potion.touching;
            potion.touching = within;
            if !within {
                continue;
            }
            if full {
                if touched {
                    out_events.push(Event::PotionRejected {
                        potion: potion.item,
                    });
                }
                continue;
            }

            let consumed = self.potions.remove(index);
            self.player.heal(POTION_HEAL);
            out_events.push(Event::PotionCollected {
                potion: consumed.item,
                health: self.player.health,
            });
        }
    }

    pub(crate) fn update_treasure_pickup(&mut self, out_events: &mut Vec<Event>) {
        let Some(player) = self.player.position else {
            return;
        };
        let Some(treasure) = self.treasure.as_mut() else {
            return;
        };
        let within = flat_distance(self.mapper.grid_to_world(treasure.cell), player) < TREASURE_RANGE;
        let touched = within && !treasure.touching;
        treasure.touching = within;
        if !within {
            return;
        }
        if self.player.held.is_some() {
            if touched {
                out_events.push(Event::InventoryFull {
                    kind: treasure.item,
                });
            }
            return;
        }

        let kind = treasure.item;
        self.treasure = None;
        self.player.held = Some(kind);
        out_events.push(Event::TreasureCollected { kind });
    }

    pub(crate) fn update_lever(&mut self, out_events: &mut Vec<Event>) {
        let (Some(level), Some(player)) = (self.level.as_ref(), self.player.position) else {
            return;
        };
        if level.lever_activated() {
            return;
        }
        let lever = self.cell_position(level.layout().lever_cell, LEVER_HEIGHT);
        if lever.distance(player) >= LEVER_RANGE {
            return;
        }
        if let Some(level) = self.level.as_mut() {
            level.activate_lever();
            debug!("lever activated");
            out_events.push(Event::LeverActivated);
        }
    }

    /// Opens unlocked doors the player walks into and tracks the locked-door hint.
    pub(crate) fn update_doors(&mut self, out_events: &mut Vec<Event>) {
        let Some(player) = self.player.position else {
            return;
        };
        let door_center = self.config.wall_height / 2.0;

        let mut hint = None;
        let mut opened = false;
        let mut index = self.doors.len();
        while index > 0 {
            index -= 1;
            let Some(door) = self.doors.get(index).copied() else {
                continue;
            };
            let distance = self.cell_position(door.cell, door_center).distance(player);
            if distance > DOOR_HINT_RANGE {
                continue;
            }
            if !self.door_unlocked(door.kind) {
                hint = hint.or(Some(door.kind));
                continue;
            }
            if distance < DOOR_OPEN_RANGE {
                let removed = self.doors.remove(index);
                opened = true;
                debug!(door = removed.id.get(), kind = ?removed.kind, "door opened");
                out_events.push(Event::DoorOpened {
                    door: removed.id,
                    kind: removed.kind,
                });
            }
        }

        if opened {
            self.rebuild_colliders();
        }
        if hint != self.door_hint {
            self.door_hint = hint;
            out_events.push(Event::DoorHintChanged { locked: hint });
        }
    }

    pub(crate) fn update_discovery(&mut self, out_events: &mut Vec<Event>) {
        let Some(player) = self.player.position else {
            return;
        };
        let cell = self.mapper.world_to_grid(player);
        if let Some(level) = self.level.as_mut() {
            level.reveal_around(cell, out_events);
        }
    }

    pub(crate) fn update_downed(&mut self, out_events: &mut Vec<Event>) {
        if self.player.health > 0.0 {
            return;
        }
        self.status = SessionStatus::Downed;
        info!(level = self.level_number, score = self.player.score, "player downed");
        out_events.push(Event::PlayerDowned);
    }

    /// Shows what still locks the portal and completes the level once the
    /// player steps into the unlocked portal.
    pub(crate) fn check_portal(&mut self, out_events: &mut Vec<Event>) {
        if self.status != SessionStatus::Playing {
            return;
        }
        let (Some(level), Some(player)) = (self.level.as_ref(), self.player.position) else {
            return;
        };
        let distance = level.layout().exit_room.center_world.distance(player);
        let lock = PortalLock {
            enemies_remaining: crate::id_from_index(self.enemies.len()),
            key_missing: !level.has_key(),
        };
        let locked = lock.enemies_remaining > 0 || lock.key_missing;

        let hint = (locked && distance < PORTAL_HINT_RANGE).then_some(lock);
        if hint != self.portal_hint {
            self.portal_hint = hint;
            out_events.push(Event::PortalHintChanged { lock: hint });
        }

        if !locked && distance < PORTAL_ENTER_RANGE {
            self.status = SessionStatus::LevelComplete;
            info!(level = self.level_number, score = self.player.score, "level complete");
            out_events.push(Event::LevelCompleted {
                level: self.level_number,
            });
        }
    }

    pub(crate) fn use_held_item(&mut self, out_events: &mut Vec<Event>) {
        let Some(kind) = self.player.held.take() else {
            return;
        };
        match kind {
            ConsumableKind::Medkit => self.player.heal(MEDKIT_HEAL),
            ConsumableKind::Shield => self.player.recharge(SHIELD_CHARGE),
            ConsumableKind::Scanner => {
                if let Some(level) = self.level.as_mut() {
                    level.reveal_treasure_area(out_events);
                }
            }
        }
        out_events.push(Event::ItemUsed { kind });
    }
}
