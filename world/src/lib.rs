#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for the dungeon crawler.
//!
//! The [`World`] owns the active level, its enemies, pickups and projectiles
//! along with the player's vitals. Every mutation flows through [`apply`],
//! and observers read state through the [`query`] module.

mod actors;
mod combat;
mod enemies;
mod level;
mod pickups;

use std::time::Duration;

use crawler_core::{
    Command, DoorId, DoorKind, DungeonConfig, EnemyId, EnemyKind, Event, GridMapper, PortalLock,
    PotionId, PropId, WELCOME_BANNER,
};
use crawler_system_collision::{Aabb, ColliderSet};
use crawler_system_enemy_ai::{Brain, Pose, RANGED_COOLDOWN};
use crawler_system_generation::{derive_level_seed, generate};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use actors::{Door, Enemy, Pickup, Player, Potion, Projectile, Prop, Treasure, ENEMY_HEALTH};

pub use combat::FIRE_COOLDOWN;
pub use level::LevelState;

/// Longest simulated step a single tick may advance.
pub const MAX_TICK: Duration = Duration::from_millis(50);

/// Height of the player's eye above the floor.
pub const EYE_HEIGHT: f32 = 1.7;

/// Collision radius of the player's body.
pub const PLAYER_RADIUS: f32 = 0.7;

/// Coarse phase of the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    /// The simulation advances on every tick.
    Playing,
    /// The player's health reached zero; only a reset resumes play.
    Downed,
    /// The player entered the unlocked portal and awaits a level decision.
    LevelComplete,
}

/// Represents the authoritative session state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: DungeonConfig,
    mapper: GridMapper,
    campaign_seed: u64,
    level_number: u32,
    level: Option<LevelState>,
    colliders: ColliderSet,
    enemies: Vec<Enemy>,
    props: Vec<Prop>,
    doors: Vec<Door>,
    potions: Vec<Potion>,
    treasure: Option<Treasure>,
    player: Player,
    bullets: Vec<Projectile>,
    bolts: Vec<Projectile>,
    clock: Duration,
    last_shot: Option<Duration>,
    status: SessionStatus,
    door_hint: Option<DoorKind>,
    portal_hint: Option<PortalLock>,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates an idle world that generates levels from the provided configuration.
    ///
    /// No level is active until a [`Command::StartCampaign`] is applied.
    #[must_use]
    pub fn new(config: DungeonConfig) -> Self {
        Self {
            banner: WELCOME_BANNER,
            mapper: GridMapper::from_config(&config),
            config,
            campaign_seed: 0,
            level_number: 0,
            level: None,
            colliders: ColliderSet::new(),
            enemies: Vec::new(),
            props: Vec::new(),
            doors: Vec::new(),
            potions: Vec::new(),
            treasure: None,
            player: Player::new(),
            bullets: Vec::new(),
            bolts: Vec::new(),
            clock: Duration::ZERO,
            last_shot: None,
            status: SessionStatus::Playing,
            door_hint: None,
            portal_hint: None,
            rng: ChaCha8Rng::seed_from_u64(0),
        }
    }

    fn load_level(&mut self, out_events: &mut Vec<Event>) {
        let seed = derive_level_seed(self.campaign_seed, self.level_number);
        self.level = Some(LevelState::new(generate(&self.config, seed)));
        self.populate(out_events);
    }

    /// Instantiates every runtime entity from the active layout.
    fn populate(&mut self, out_events: &mut Vec<Event>) {
        let Some(level) = self.level.as_ref() else {
            return;
        };
        let layout = level.layout();
        self.rng = ChaCha8Rng::seed_from_u64(layout.seed);

        self.enemies.clear();
        for (index, spawn) in layout.enemy_spawns.iter().enumerate() {
            let phase = match spawn.kind {
                EnemyKind::Ranged => {
                    Duration::from_secs_f32(self.rng.gen_range(0.0..RANGED_COOLDOWN.as_secs_f32()))
                }
                EnemyKind::Melee => Duration::ZERO,
            };
            self.enemies.push(Enemy {
                id: EnemyId::new(id_from_index(index)),
                pose: Pose::at(self.mapper.grid_to_world(spawn.cell)),
                health: ENEMY_HEALTH,
                hit_flash: 0.0,
                brain: Brain::for_kind(spawn.kind, phase),
            });
        }

        self.props = layout
            .prop_spawns
            .iter()
            .enumerate()
            .map(|(index, spawn)| Prop {
                id: PropId::new(id_from_index(index)),
                kind: spawn.kind,
                cell: spawn.cell,
                aabb: Aabb::around(self.mapper.grid_to_world(spawn.cell), spawn.kind.half_extent()),
                hit_points: spawn.kind.hit_points(),
            })
            .collect();

        self.doors = layout
            .doors
            .iter()
            .enumerate()
            .map(|(index, placement)| Door {
                id: DoorId::new(id_from_index(index)),
                kind: placement.kind,
                cell: placement.cell,
                aabb: Aabb::cell(&self.mapper, placement.cell),
            })
            .collect();

        self.potions = layout
            .potion_spawns
            .iter()
            .enumerate()
            .map(|(index, spawn)| Pickup::new(PotionId::new(id_from_index(index)), spawn.cell))
            .collect();

        self.treasure = layout
            .treasure
            .map(|spawn| Pickup::new(spawn.kind, spawn.cell));

        let start = layout.start_room.center_world;
        let enemies = id_from_index(self.enemies.len());
        info!(
            level = self.level_number,
            seed = layout.seed,
            rooms = layout.rooms.len(),
            enemies,
            "level loaded"
        );
        out_events.push(Event::LevelLoaded {
            level: self.level_number,
            seed: layout.seed,
            enemies,
        });

        self.player.position = Some(Vec3::new(start.x, EYE_HEIGHT, start.z));
        self.bullets.clear();
        self.bolts.clear();
        self.clock = Duration::ZERO;
        self.last_shot = None;
        self.status = SessionStatus::Playing;
        self.door_hint = None;
        self.portal_hint = None;
        self.rebuild_colliders();
    }

    /// Recreates the collider list after props or doors disappear.
    fn rebuild_colliders(&mut self) {
        let Some(level) = self.level.as_ref() else {
            self.colliders = ColliderSet::new();
            return;
        };
        self.colliders = ColliderSet::rebuild(
            &level.layout().grid,
            &self.mapper,
            self.props.iter().map(|prop| (prop.id, prop.aabb)),
            self.doors.iter().map(|door| (door.id, door.aabb)),
        );
    }

    fn move_player(&mut self, desired: Vec3, out_events: &mut Vec<Event>) {
        let grounded = Vec3::new(desired.x, EYE_HEIGHT, desired.z);
        let position = self.colliders.resolve(grounded, PLAYER_RADIUS);
        self.player.position = Some(position);
        out_events.push(Event::PlayerMoved { position });
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.level.is_none()
            || self.player.position.is_none()
            || self.status != SessionStatus::Playing
        {
            return;
        }

        let dt = dt.min(MAX_TICK);
        self.clock += dt;
        out_events.push(Event::TimeAdvanced { dt });

        let seconds = dt.as_secs_f32();
        self.update_enemies(dt, out_events);
        self.update_bullets(seconds, out_events);
        self.update_bolts(seconds, out_events);
        self.handle_bullet_hits(out_events);
        self.update_key_pickup(out_events);
        self.update_potion_pickups(out_events);
        self.update_treasure_pickup(out_events);
        self.update_lever(out_events);
        self.update_doors(out_events);
        self.update_discovery(out_events);
        self.update_downed(out_events);
        self.check_portal(out_events);
    }
}

fn id_from_index(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartCampaign { seed } => {
            world.campaign_seed = seed;
            world.level_number = 1;
            world.player = Player::new();
            world.load_level(out_events);
        }
        Command::AdvanceLevel => {
            if world.level.is_none() {
                return;
            }
            world.level_number = world.level_number.saturating_add(1);
            world.load_level(out_events);
        }
        Command::ResetLevel => {
            let Some(level) = world.level.as_mut() else {
                return;
            };
            level.reset_progress();
            world.player = Player::new();
            world.populate(out_events);
        }
        Command::StayOnLevel => {
            if world.status != SessionStatus::LevelComplete {
                return;
            }
            world.status = SessionStatus::Playing;
            if let Some(position) = world.player.position {
                world.move_player(position - Vec3::X, out_events);
            }
        }
        Command::MovePlayer { position } => {
            if world.level.is_none() || world.status != SessionStatus::Playing {
                return;
            }
            world.move_player(position, out_events);
        }
        Command::FireBullet { origin, direction } => {
            if world.level.is_none() || world.status != SessionStatus::Playing {
                return;
            }
            world.fire_bullet(origin, direction, out_events);
        }
        Command::UseItem => {
            if world.status != SessionStatus::Playing {
                return;
            }
            world.use_held_item(out_events);
        }
        Command::Tick { dt } => world.tick(dt, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use crawler_core::{
        BehaviorState, ConsumableKind, DoorId, DoorKind, DungeonConfig, EnemyId, EnemyKind, Grid,
        GridPoint, PortalLock, PotionId, PropId, PropKind, Room,
    };
    use glam::Vec3;

    use super::{LevelState, SessionStatus, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Configuration levels are generated from.
    #[must_use]
    pub fn config(world: &World) -> &DungeonConfig {
        &world.config
    }

    /// Active level, if a campaign has started.
    #[must_use]
    pub fn level(world: &World) -> Option<&LevelState> {
        world.level.as_ref()
    }

    /// Geometry of the active level.
    #[must_use]
    pub fn grid(world: &World) -> Option<&Grid> {
        world.level.as_ref().map(|level| &level.layout().grid)
    }

    /// Rooms of the active level sorted by center column.
    #[must_use]
    pub fn rooms(world: &World) -> &[Room] {
        world
            .level
            .as_ref()
            .map(|level| level.layout().rooms.as_slice())
            .unwrap_or_default()
    }

    /// Live enemies left in the level.
    #[must_use]
    pub fn remaining_enemies(world: &World) -> u32 {
        super::id_from_index(world.enemies.len())
    }

    /// Reports whether the player carries the key.
    #[must_use]
    pub fn has_key(world: &World) -> bool {
        world.level.as_ref().is_some_and(LevelState::has_key)
    }

    /// Reports whether the lever has been pulled.
    #[must_use]
    pub fn lever_activated(world: &World) -> bool {
        world.level.as_ref().is_some_and(LevelState::lever_activated)
    }

    /// Row-major fog-of-war matrix of the active level.
    #[must_use]
    pub fn discovered(world: &World) -> &[bool] {
        world
            .level
            .as_ref()
            .map(LevelState::discovered)
            .unwrap_or_default()
    }

    /// One-based number of the active level; zero before the campaign starts.
    #[must_use]
    pub fn level_number(world: &World) -> u32 {
        world.level_number
    }

    /// Seed the active level was generated from.
    #[must_use]
    pub fn seed(world: &World) -> Option<u64> {
        world.level.as_ref().map(|level| level.layout().seed)
    }

    /// Coarse phase of the session.
    #[must_use]
    pub fn status(world: &World) -> SessionStatus {
        world.status
    }

    /// Simulated time elapsed on the current level.
    #[must_use]
    pub fn clock(world: &World) -> std::time::Duration {
        world.clock
    }

    /// Outstanding portal requirements shown while the player is near the portal.
    #[must_use]
    pub fn portal_hint(world: &World) -> Option<PortalLock> {
        world.portal_hint
    }

    /// Kind of locked door the player is standing next to.
    #[must_use]
    pub fn door_hint(world: &World) -> Option<DoorKind> {
        world.door_hint
    }

    /// Captures the player's vitals.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        PlayerSnapshot {
            position: world.player.position,
            health: world.player.health,
            shield: world.player.shield,
            score: world.player.score,
            held: world.player.held,
        }
    }

    /// Captures every live enemy in spawn order.
    #[must_use]
    pub fn enemies(world: &World) -> Vec<EnemySnapshot> {
        world
            .enemies
            .iter()
            .map(|enemy| EnemySnapshot {
                id: enemy.id,
                kind: enemy.brain.kind(),
                position: enemy.pose.position,
                heading: enemy.pose.heading,
                health: enemy.health,
                behavior: enemy.brain.behavior(),
                hit_flash: enemy.hit_flash,
            })
            .collect()
    }

    /// Captures the doors still standing.
    #[must_use]
    pub fn doors(world: &World) -> Vec<DoorSnapshot> {
        world
            .doors
            .iter()
            .map(|door| DoorSnapshot {
                id: door.id,
                kind: door.kind,
                cell: door.cell,
                locked: !world.door_unlocked(door.kind),
            })
            .collect()
    }

    /// Captures the props that have not been destroyed.
    #[must_use]
    pub fn props(world: &World) -> Vec<PropSnapshot> {
        world
            .props
            .iter()
            .map(|prop| PropSnapshot {
                id: prop.id,
                kind: prop.kind,
                cell: prop.cell,
                hit_points: prop.hit_points,
            })
            .collect()
    }

    /// Cells of the potions still lying in the level.
    #[must_use]
    pub fn potions(world: &World) -> Vec<(PotionId, GridPoint)> {
        world
            .potions
            .iter()
            .map(|potion| (potion.item, potion.cell))
            .collect()
    }

    /// Treasure pickup still lying in the level.
    #[must_use]
    pub fn treasure(world: &World) -> Option<(ConsumableKind, GridPoint)> {
        world.treasure.map(|pickup| (pickup.item, pickup.cell))
    }

    /// Captures every projectile in flight.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        let bullets = world.bullets.iter().map(|bullet| ProjectileSnapshot {
            owner: ProjectileOwner::Player,
            position: bullet.position,
            velocity: bullet.velocity,
        });
        let bolts = world.bolts.iter().map(|bolt| ProjectileSnapshot {
            owner: ProjectileOwner::Enemy,
            position: bolt.position,
            velocity: bolt.velocity,
        });
        bullets.chain(bolts).collect()
    }

    /// Immutable representation of the player used for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct PlayerSnapshot {
        /// Eye position; `None` until a level has been loaded.
        pub position: Option<Vec3>,
        /// Current health in `[0, 100]`.
        pub health: f32,
        /// Current shield in `[0, 100]`.
        pub shield: f32,
        /// Points earned by defeating enemies.
        pub score: u32,
        /// Consumable waiting to be used.
        pub held: Option<ConsumableKind>,
    }

    /// Immutable representation of a single enemy used for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct EnemySnapshot {
        /// Unique identifier assigned to the enemy.
        pub id: EnemyId,
        /// Behavioural family.
        pub kind: EnemyKind,
        /// World position of the enemy's feet.
        pub position: Vec3,
        /// Facing angle around the vertical axis in radians.
        pub heading: f32,
        /// Remaining health.
        pub health: i32,
        /// Behaviour state of melee enemies.
        pub behavior: Option<BehaviorState>,
        /// Seconds of hit feedback left.
        pub hit_flash: f32,
    }

    /// Immutable representation of a door used for queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct DoorSnapshot {
        /// Unique identifier assigned to the door.
        pub id: DoorId,
        /// Purpose of the door.
        pub kind: DoorKind,
        /// Cell blocked by the door.
        pub cell: GridPoint,
        /// Whether the door still refuses to open.
        pub locked: bool,
    }

    /// Immutable representation of a prop used for queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PropSnapshot {
        /// Unique identifier assigned to the prop.
        pub id: PropId,
        /// Kind of prop.
        pub kind: PropKind,
        /// Cell occupied by the prop.
        pub cell: GridPoint,
        /// Hits left before the prop breaks.
        pub hit_points: u32,
    }

    /// Side that fired a projectile.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum ProjectileOwner {
        /// Bullet fired by the player.
        Player,
        /// Bolt fired by a ranged enemy.
        Enemy,
    }

    /// Immutable representation of a projectile used for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct ProjectileSnapshot {
        /// Side that fired the projectile.
        pub owner: ProjectileOwner,
        /// Current position.
        pub position: Vec3,
        /// Velocity in units per second.
        pub velocity: Vec3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(seed: u64) -> (World, Vec<Event>) {
        let mut world = World::new(DungeonConfig::default());
        let mut events = Vec::new();
        apply(&mut world, Command::StartCampaign { seed }, &mut events);
        (world, events)
    }

    #[test]
    fn ticks_before_a_campaign_are_ignored() {
        let mut world = World::new(DungeonConfig::default());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(16),
            },
            &mut events,
        );
        assert!(events.is_empty());
        assert_eq!(query::clock(&world), Duration::ZERO);
        assert!(query::player(&world).position.is_none());
    }

    #[test]
    fn starting_a_campaign_loads_level_one() {
        let (world, events) = started(12345);

        assert_eq!(query::level_number(&world), 1);
        assert_eq!(query::seed(&world), Some(derive_level_seed(12345, 1)));
        let spawned = query::level(&world)
            .map(|level| level.layout().enemy_spawns.len())
            .unwrap_or_default();
        assert_eq!(query::remaining_enemies(&world) as usize, spawned);
        assert!(matches!(
            events.as_slice(),
            [Event::LevelLoaded { level: 1, .. }]
        ));

        let start = query::rooms(&world)[0].center_world;
        let position = query::player(&world).position.expect("player placed");
        assert_eq!(position, Vec3::new(start.x, EYE_HEIGHT, start.z));
    }

    #[test]
    fn ticks_are_clamped() {
        let (mut world, _) = started(4);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(3),
            },
            &mut events,
        );
        assert_eq!(events.first(), Some(&Event::TimeAdvanced { dt: MAX_TICK }));
        assert_eq!(query::clock(&world), MAX_TICK);
    }

    #[test]
    fn movement_is_pushed_out_of_walls() {
        let (mut world, _) = started(8);
        let mut events = Vec::new();
        let corner = world.mapper.grid_to_world(crawler_core::GridPoint::new(0, 0));

        apply(
            &mut world,
            Command::MovePlayer { position: corner },
            &mut events,
        );

        let Some(Event::PlayerMoved { position }) = events.last().cloned() else {
            panic!("expected a move event");
        };
        assert_eq!(position.y, EYE_HEIGHT);
        assert_ne!(position, Vec3::new(corner.x, EYE_HEIGHT, corner.z));
    }

    #[test]
    fn advancing_keeps_player_vitals() {
        let (mut world, _) = started(21);
        world.player.health = 42.0;
        world.player.score = 75;
        let mut events = Vec::new();

        apply(&mut world, Command::AdvanceLevel, &mut events);

        assert_eq!(query::level_number(&world), 2);
        assert_eq!(query::seed(&world), Some(derive_level_seed(21, 2)));
        assert_eq!(query::player(&world).health, 42.0);
        assert_eq!(query::player(&world).score, 75);
    }

    #[test]
    fn reset_restores_vitals_and_layout() {
        let (mut world, _) = started(21);
        let before = query::level(&world).map(|level| level.layout().clone());
        world.player.health = 10.0;
        world.player.held = Some(crawler_core::ConsumableKind::Scanner);
        world.enemies.clear();
        let mut events = Vec::new();

        apply(&mut world, Command::ResetLevel, &mut events);

        let after = query::level(&world).map(|level| level.layout().clone());
        assert_eq!(before, after);
        assert_eq!(query::player(&world).health, 100.0);
        assert_eq!(query::player(&world).held, None);
        assert!(query::remaining_enemies(&world) > 0);
    }

    #[test]
    fn downed_player_freezes_the_simulation() {
        let (mut world, _) = started(6);
        world.status = SessionStatus::Downed;
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(16),
            },
            &mut events,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn stay_on_level_resumes_play() {
        let (mut world, _) = started(6);
        world.status = SessionStatus::LevelComplete;
        let before = query::player(&world).position.expect("player placed");
        let mut events = Vec::new();

        apply(&mut world, Command::StayOnLevel, &mut events);

        assert_eq!(query::status(&world), SessionStatus::Playing);
        let after = query::player(&world).position.expect("player placed");
        assert!(after.x < before.x);
    }
}
