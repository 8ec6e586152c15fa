#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares a level for presentation.
//!
//! Renderers never read the world directly when a level loads; they receive
//! a [`SceneManifest`] listing everything that needs a visual
//! representation, and follow up with events afterwards.

use crawler_core::{
    DoorId, DoorKind, EnemyId, EnemyKind, GridPoint, PotionId, PropId, PropKind, Room,
    TreasureSpawn,
};
use crawler_world::{query, World};
use glam::Vec3;
use serde::Serialize;

/// Produces data required to stage the active level.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Derives the banner that should be shown when the experience starts.
    #[must_use]
    pub fn welcome_banner<'world>(&self, world: &'world World) -> &'world str {
        query::welcome_banner(world)
    }

    /// Lists everything a presentation layer must instantiate for the active
    /// level, or `None` before a campaign has started.
    #[must_use]
    pub fn scene_manifest(&self, world: &World) -> Option<SceneManifest> {
        let level = query::level(world)?;
        let layout = level.layout();
        let config = query::config(world);
        let player = query::player(world);

        let wall_cells = layout
            .grid
            .points()
            .filter(|point| !layout.grid.is_floor(*point))
            .collect();

        Some(SceneManifest {
            level: query::level_number(world),
            seed: layout.seed,
            columns: layout.grid.width(),
            rows: layout.grid.height(),
            cell_size: config.cell_size,
            wall_height: config.wall_height,
            wall_cells,
            rooms: layout.rooms.clone(),
            player: player.position.unwrap_or(layout.start_room.center_world),
            key: (!level.has_key()).then_some(layout.key_cell),
            lever: (!level.lever_activated()).then_some(layout.lever_cell),
            portal: layout.exit_room.center_world,
            treasure: query::treasure(world).map(|(kind, cell)| TreasureSpawn { cell, kind }),
            doors: query::doors(world)
                .into_iter()
                .map(|door| DoorEntry {
                    id: door.id,
                    kind: door.kind,
                    cell: door.cell,
                    locked: door.locked,
                })
                .collect(),
            props: query::props(world)
                .into_iter()
                .map(|prop| PropEntry {
                    id: prop.id,
                    kind: prop.kind,
                    cell: prop.cell,
                })
                .collect(),
            potions: query::potions(world)
                .into_iter()
                .map(|(id, cell)| PotionEntry { id, cell })
                .collect(),
            enemies: query::enemies(world)
                .into_iter()
                .map(|enemy| EnemyEntry {
                    id: enemy.id,
                    kind: enemy.kind,
                    position: enemy.position,
                    heading: enemy.heading,
                })
                .collect(),
        })
    }
}

/// Everything a renderer needs to build the scene of one level.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SceneManifest {
    /// One-based level number.
    pub level: u32,
    /// Seed the level was generated from.
    pub seed: u64,
    /// Number of grid columns.
    pub columns: u32,
    /// Number of grid rows.
    pub rows: u32,
    /// Side length of a cell in world units.
    pub cell_size: f32,
    /// Height of wall blocks and doors.
    pub wall_height: f32,
    /// Cells that must be rendered as solid blocks.
    pub wall_cells: Vec<GridPoint>,
    /// Rooms with their tags, for lighting and decoration.
    pub rooms: Vec<Room>,
    /// Eye position of the player.
    pub player: Vec3,
    /// Key cell while the key has not been collected.
    pub key: Option<GridPoint>,
    /// Lever cell while the lever has not been pulled.
    pub lever: Option<GridPoint>,
    /// Ground position of the exit portal.
    pub portal: Vec3,
    /// Treasure pickup still lying in the level.
    pub treasure: Option<TreasureSpawn>,
    /// Doors still standing.
    pub doors: Vec<DoorEntry>,
    /// Props not yet destroyed.
    pub props: Vec<PropEntry>,
    /// Potions not yet consumed.
    pub potions: Vec<PotionEntry>,
    /// Live enemies.
    pub enemies: Vec<EnemyEntry>,
}

/// Door to instantiate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DoorEntry {
    /// Identifier referenced by later events.
    pub id: DoorId,
    /// Purpose of the door; drives its colour.
    pub kind: DoorKind,
    /// Cell the door blocks.
    pub cell: GridPoint,
    /// Whether the door is currently locked.
    pub locked: bool,
}

/// Prop to instantiate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PropEntry {
    /// Identifier referenced by later events.
    pub id: PropId,
    /// Kind of prop.
    pub kind: PropKind,
    /// Cell the prop occupies.
    pub cell: GridPoint,
}

/// Potion to instantiate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PotionEntry {
    /// Identifier referenced by later events.
    pub id: PotionId,
    /// Cell the potion occupies.
    pub cell: GridPoint,
}

/// Enemy to instantiate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EnemyEntry {
    /// Identifier referenced by later events.
    pub id: EnemyId,
    /// Behavioural family; drives the model.
    pub kind: EnemyKind,
    /// World position of the enemy's feet.
    pub position: Vec3,
    /// Facing angle around the vertical axis in radians.
    pub heading: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawler_core::{Command, DungeonConfig};
    use crawler_world::apply;

    fn started() -> World {
        let mut world = World::new(DungeonConfig::default());
        let mut events = Vec::new();
        apply(&mut world, Command::StartCampaign { seed: 12345 }, &mut events);
        world
    }

    #[test]
    fn manifest_requires_an_active_level() {
        let world = World::new(DungeonConfig::default());
        assert!(Bootstrap.scene_manifest(&world).is_none());
        assert_eq!(Bootstrap.welcome_banner(&world), crawler_core::WELCOME_BANNER);
    }

    #[test]
    fn manifest_mirrors_the_layout() {
        let world = started();
        let manifest = Bootstrap.scene_manifest(&world).expect("level loaded");
        let layout = query::level(&world).expect("level loaded").layout();

        assert_eq!(manifest.level, 1);
        assert_eq!(
            manifest.wall_cells.len() + layout.grid.floor_count(),
            layout.grid.cells().len()
        );
        assert_eq!(manifest.key, Some(layout.key_cell));
        assert_eq!(manifest.lever, Some(layout.lever_cell));
        assert_eq!(manifest.enemies.len(), layout.enemy_spawns.len());
        assert_eq!(manifest.doors.len(), layout.doors.len());
        assert!(manifest.doors.iter().all(|door| door.locked));
        assert_eq!(manifest.portal, layout.exit_room.center_world);
    }

    #[test]
    fn manifest_serialises_to_json() {
        let world = started();
        let manifest = Bootstrap.scene_manifest(&world).expect("level loaded");
        let json = serde_json::to_value(&manifest).expect("serialise manifest");

        assert_eq!(json["seed"], serde_json::json!(manifest.seed));
        assert_eq!(
            json["wall_cells"].as_array().map(Vec::len),
            Some(manifest.wall_cells.len())
        );
    }
}
