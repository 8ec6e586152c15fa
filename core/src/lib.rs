#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the dungeon crawler simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing player intent, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values that presentation
//! layers react to. Generated levels travel between the generator and the
//! world as a single [`LevelLayout`] value.

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

mod config;
pub mod grid;

pub use config::{ConfigError, DungeonConfig};
pub use grid::{manhattan, GridMapper};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to the Dungeon.";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Begins a new campaign at level one, resetting the player.
    StartCampaign {
        /// Seed from which every level seed of the campaign is derived.
        seed: u64,
    },
    /// Generates the next level of the running campaign.
    AdvanceLevel,
    /// Restarts the current level with a fresh player.
    ResetLevel,
    /// Dismisses the level-complete prompt and resumes play on the same level.
    StayOnLevel,
    /// Reports the player's desired position for this frame.
    MovePlayer {
        /// Position produced by the input system before collision resolution.
        position: Vec3,
    },
    /// Requests a player bullet along the provided direction.
    FireBullet {
        /// Eye position the shot originates from.
        origin: Vec3,
        /// Aim direction; normalised by the world.
        direction: Vec3,
    },
    /// Consumes the currently held treasure item, if any.
    UseItem,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Wall-clock time since the previous tick; clamped by the world.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A level became active, either freshly generated or restarted.
    LevelLoaded {
        /// One-based level number within the campaign.
        level: u32,
        /// Seed the level was generated from.
        seed: u64,
        /// Number of enemies spawned for the level.
        enemies: u32,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Clamped duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms the player's collision-resolved position.
    PlayerMoved {
        /// Resolved eye position of the player.
        position: Vec3,
    },
    /// Reports a new pose for an enemy.
    EnemyMoved {
        /// Enemy that moved or turned.
        enemy: EnemyId,
        /// Resolved world position of the enemy.
        position: Vec3,
        /// Facing angle around the vertical axis in radians.
        heading: f32,
    },
    /// Reports a behaviour state transition of a melee enemy.
    EnemyBehaviorChanged {
        /// Enemy whose state machine transitioned.
        enemy: EnemyId,
        /// State before the transition.
        from: BehaviorState,
        /// State after the transition.
        to: BehaviorState,
    },
    /// A ranged enemy released a bolt.
    EnemyFired {
        /// Enemy that fired.
        enemy: EnemyId,
        /// Spawn position of the bolt.
        origin: Vec3,
        /// Velocity of the bolt in units per second.
        velocity: Vec3,
    },
    /// A player bullet left the muzzle.
    BulletFired {
        /// Spawn position of the bullet.
        origin: Vec3,
        /// Velocity of the bullet in units per second.
        velocity: Vec3,
    },
    /// A player bullet struck an enemy.
    EnemyHit {
        /// Enemy that was struck.
        enemy: EnemyId,
        /// Whether the bullet crossed the head volume.
        headshot: bool,
        /// Health remaining after the hit.
        health: i32,
    },
    /// An enemy was destroyed.
    EnemyKilled {
        /// Enemy that was removed.
        enemy: EnemyId,
        /// Live enemies left in the level.
        remaining: u32,
    },
    /// A player bullet damaged a prop.
    PropDamaged {
        /// Prop that was struck.
        prop: PropId,
        /// Hit points left on the prop.
        hit_points: u32,
    },
    /// A prop was destroyed and its collider removed.
    PropDestroyed {
        /// Prop that was removed.
        prop: PropId,
    },
    /// The player lost shield or health.
    PlayerDamaged {
        /// Damage requested before shield absorption.
        amount: f32,
        /// Health after the damage was applied.
        health: f32,
        /// Shield after the damage was applied.
        shield: f32,
    },
    /// The player's health reached zero.
    PlayerDowned,
    /// The player picked up the level key.
    KeyCollected,
    /// The player drank a potion.
    PotionCollected {
        /// Potion that was consumed.
        potion: PotionId,
        /// Health after healing.
        health: f32,
    },
    /// The player touched a potion while already at full health.
    PotionRejected {
        /// Potion that stays in the level.
        potion: PotionId,
    },
    /// The player picked up the treasure item.
    TreasureCollected {
        /// Item now held by the player.
        kind: ConsumableKind,
    },
    /// The player touched treasure while already holding an item.
    InventoryFull {
        /// Item that stays in the level.
        kind: ConsumableKind,
    },
    /// The player consumed the held item.
    ItemUsed {
        /// Item that was consumed.
        kind: ConsumableKind,
    },
    /// The player pulled the lever, unlocking the treasure door.
    LeverActivated,
    /// An unlocked door was opened and removed.
    DoorOpened {
        /// Door that was removed.
        door: DoorId,
        /// Purpose of the door.
        kind: DoorKind,
    },
    /// The locked-door hint changed visibility.
    DoorHintChanged {
        /// Kind of locked door near the player, if any.
        locked: Option<DoorKind>,
    },
    /// The locked-portal hint changed visibility or content.
    PortalHintChanged {
        /// Outstanding portal requirements while near the portal, if any.
        lock: Option<PortalLock>,
    },
    /// The key cell was uncovered on the minimap.
    KeyDiscovered,
    /// The exit portal was uncovered on the minimap.
    PortalDiscovered,
    /// The player entered the unlocked portal.
    LevelCompleted {
        /// Level that was completed.
        level: u32,
    },
}

/// Requirements still blocking the exit portal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortalLock {
    /// Enemies that must still be defeated.
    pub enemies_remaining: u32,
    /// Whether the key has not been collected yet.
    pub key_missing: bool,
}

/// Location of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPoint {
    x: u32,
    y: u32,
}

impl GridPoint {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Manhattan distance between two cells.
    #[must_use]
    pub fn manhattan_distance(self, other: GridPoint) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Returns the cell displaced by the provided offset, if it stays non-negative.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32) -> Option<GridPoint> {
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        Some(GridPoint::new(x, y))
    }
}

/// Contents of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// Walkable floor.
    Floor,
    /// Solid wall block.
    Wall,
}

impl Cell {
    /// Reports whether the cell can be walked on.
    #[must_use]
    pub const fn is_floor(self) -> bool {
        matches!(self, Cell::Floor)
    }
}

/// Neighbour offsets in the order every grid search enumerates them.
const NEIGHBOR_OFFSETS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Dense row-major matrix of cells describing level geometry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates a grid with every cell set to `cell`.
    #[must_use]
    pub fn filled(width: u32, height: u32, cell: Cell) -> Self {
        let capacity_u64 = u64::from(width) * u64::from(height);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            width,
            height,
            cells: vec![cell; capacity],
        }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Cells stored in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, point: GridPoint) -> bool {
        point.x() < self.width && point.y() < self.height
    }

    /// Row-major index of the cell, if it lies inside the grid.
    #[must_use]
    pub fn index(&self, point: GridPoint) -> Option<usize> {
        if !self.contains(point) {
            return None;
        }
        let row = usize::try_from(point.y()).ok()?;
        let column = usize::try_from(point.x()).ok()?;
        let width = usize::try_from(self.width).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Cell kind at the provided location, if it lies inside the grid.
    #[must_use]
    pub fn cell(&self, point: GridPoint) -> Option<Cell> {
        self.index(point)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Reports whether the location is an in-bounds floor cell.
    #[must_use]
    pub fn is_floor(&self, point: GridPoint) -> bool {
        self.cell(point).is_some_and(Cell::is_floor)
    }

    /// Overwrites the cell at the provided location; out-of-bounds writes are ignored.
    pub fn set(&mut self, point: GridPoint, cell: Cell) {
        if let Some(index) = self.index(point) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = cell;
            }
        }
    }

    /// In-bounds 4-connected neighbours, enumerated as `+x, -x, +y, -y`.
    pub fn neighbors(&self, point: GridPoint) -> impl Iterator<Item = GridPoint> + '_ {
        NEIGHBOR_OFFSETS
            .into_iter()
            .filter_map(move |(dx, dy)| point.offset(dx, dy))
            .filter(move |neighbor| self.contains(*neighbor))
    }

    /// Every cell location in row-major order.
    pub fn points(&self) -> impl Iterator<Item = GridPoint> {
        let width = self.width;
        (0..self.height).flat_map(move |y| (0..width).map(move |x| GridPoint::new(x, y)))
    }

    /// Number of floor cells in the grid.
    #[must_use]
    pub fn floor_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_floor()).count()
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl CellRect {
    /// Creates a rectangle anchored at `(x, y)` with the provided size.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Leftmost column of the rectangle.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Topmost row of the rectangle.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the cell lies within the rectangle.
    #[must_use]
    pub const fn contains(&self, point: GridPoint) -> bool {
        point.x() >= self.x
            && point.x() < self.x + self.width
            && point.y() >= self.y
            && point.y() < self.y + self.height
    }

    /// Reports whether the cell lies on the rectangle's outermost ring.
    #[must_use]
    pub const fn is_on_perimeter(&self, point: GridPoint) -> bool {
        self.contains(point)
            && (point.x() == self.x
                || point.x() + 1 == self.x + self.width
                || point.y() == self.y
                || point.y() + 1 == self.y + self.height)
    }

    /// Center cell, rounding toward the origin.
    #[must_use]
    pub const fn center(&self) -> GridPoint {
        GridPoint::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Every cell covered by the rectangle in row-major order.
    pub fn points(&self) -> impl Iterator<Item = GridPoint> {
        let Self {
            x,
            y,
            width,
            height,
        } = *self;
        (y..y + height).flat_map(move |row| (x..x + width).map(move |column| GridPoint::new(column, row)))
    }
}

/// Unique identifier assigned to a room within a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(u32);

impl RoomId {
    /// Creates a new room identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Purpose assigned to a room during generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomTag {
    /// Holds the treasure pickup behind the lever-gated door.
    Treasure,
    /// Dense with props.
    Armory,
    /// Always receives an extra melee enemy.
    Trap,
}

/// Rectangular room carved into the grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Identifier assigned in placement order.
    pub id: RoomId,
    /// Cells covered by the room.
    pub bounds: CellRect,
    /// Center cell of the room.
    pub center: GridPoint,
    /// World position of the center cell.
    pub center_world: Vec3,
    /// Optional purpose tag.
    pub tag: Option<RoomTag>,
}

/// Behavioural family of an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Hunts the player through the state machine and deals contact damage.
    Melee,
    /// Holds position and fires bolts on sight.
    Ranged,
}

/// State of the melee enemy behaviour machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorState {
    /// Standing still, waiting for the next perception tick.
    Idle,
    /// Walking a ring of waypoints around the spawn.
    Patrol,
    /// Following a grid path toward the visible player.
    Chase,
    /// Walking to where the player was last seen.
    Search,
}

/// Destructible decoration that blocks movement and bullets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropKind {
    /// Wooden box.
    Crate,
    /// Wooden barrel.
    Barrel,
    /// Tall stone column.
    Pillar,
    /// Boulder.
    Rock,
}

impl PropKind {
    /// Every prop kind in generation order.
    pub const ALL: [PropKind; 4] = [Self::Crate, Self::Barrel, Self::Pillar, Self::Rock];

    /// Bullet hits the prop absorbs before breaking.
    #[must_use]
    pub const fn hit_points(self) -> u32 {
        match self {
            Self::Pillar => 3,
            Self::Crate | Self::Barrel | Self::Rock => 2,
        }
    }

    /// Half the footprint edge of the prop's collider in world units.
    #[must_use]
    pub const fn half_extent(self) -> f32 {
        match self {
            Self::Crate | Self::Barrel | Self::Pillar => 0.6,
            Self::Rock => 0.65,
        }
    }
}

/// Single-use item found in treasure rooms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsumableKind {
    /// Restores health.
    Medkit,
    /// Restores shield.
    Shield,
    /// Reveals the treasure room on the minimap.
    Scanner,
}

impl ConsumableKind {
    /// Every consumable kind in generation order.
    pub const ALL: [ConsumableKind; 3] = [Self::Medkit, Self::Shield, Self::Scanner];
}

/// Purpose of a door.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoorKind {
    /// Guards the exit room; unlocked by the key.
    Exit,
    /// Guards the treasure room; unlocked by the lever.
    Treasure,
}

/// Planned enemy placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnemySpawn {
    /// Cell the enemy starts in.
    pub cell: GridPoint,
    /// Behavioural family of the enemy.
    pub kind: EnemyKind,
}

/// Planned prop placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropSpawn {
    /// Cell the prop occupies.
    pub cell: GridPoint,
    /// Kind of prop.
    pub kind: PropKind,
}

/// Planned potion placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PotionSpawn {
    /// Cell the potion occupies.
    pub cell: GridPoint,
}

/// Planned treasure pickup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreasureSpawn {
    /// Cell the pickup occupies.
    pub cell: GridPoint,
    /// Item granted by the pickup.
    pub kind: ConsumableKind,
}

/// Planned door placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoorPlacement {
    /// Cell blocked by the door.
    pub cell: GridPoint,
    /// Purpose of the door.
    pub kind: DoorKind,
}

/// Complete output of the dungeon generator for one seed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelLayout {
    /// Seed the layout was generated from.
    pub seed: u64,
    /// Level geometry.
    pub grid: Grid,
    /// Rooms sorted by center column.
    pub rooms: Vec<Room>,
    /// Room the player starts in.
    pub start_room: Room,
    /// Room holding the exit portal.
    pub exit_room: Room,
    /// Cell holding the key.
    pub key_cell: GridPoint,
    /// Cell holding the lever.
    pub lever_cell: GridPoint,
    /// Treasure pickup, when a treasure room exists.
    pub treasure: Option<TreasureSpawn>,
    /// Enemy placements.
    pub enemy_spawns: Vec<EnemySpawn>,
    /// Prop placements.
    pub prop_spawns: Vec<PropSpawn>,
    /// Potion placements.
    pub potion_spawns: Vec<PotionSpawn>,
    /// Door placements; the exit door always comes first.
    pub doors: Vec<DoorPlacement>,
}

impl LevelLayout {
    /// Room tagged as the treasure room, if any.
    #[must_use]
    pub fn treasure_room(&self) -> Option<&Room> {
        self.rooms
            .iter()
            .find(|room| room.tag == Some(RoomTag::Treasure))
    }
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates a new identifier with the provided numeric value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Retrieves the numeric representation of the identifier.
            #[must_use]
            pub const fn get(&self) -> u32 {
                self.0
            }
        }
    };
}

entity_id!(
    /// Unique identifier assigned to an enemy.
    EnemyId
);
entity_id!(
    /// Unique identifier assigned to a prop.
    PropId
);
entity_id!(
    /// Unique identifier assigned to a door.
    DoorId
);
entity_id!(
    /// Unique identifier assigned to a potion.
    PotionId
);
