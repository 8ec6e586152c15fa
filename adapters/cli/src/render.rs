//! Text rendering of a staged level.

use crawler_core::{DoorKind, EnemyKind, GridMapper, GridPoint};
use crawler_system_bootstrap::SceneManifest;

/// Draws the manifest as one character per cell, row by row.
///
/// Later layers overwrite earlier ones: walls, then the portal, pickups,
/// doors, props, enemies and finally the player.
pub(crate) fn ascii_map(manifest: &SceneManifest) -> String {
    let mapper = GridMapper::new(manifest.columns, manifest.rows, manifest.cell_size);
    let width = mapper.columns() as usize;
    let rows = mapper.rows() as usize;
    let mut canvas = vec!['.'; width * rows];
    let mut plot = |cell: GridPoint, glyph: char| {
        let index = cell.y() as usize * width + cell.x() as usize;
        if let Some(slot) = canvas.get_mut(index) {
            *slot = glyph;
        }
    };

    for cell in &manifest.wall_cells {
        plot(*cell, '#');
    }
    plot(mapper.world_to_grid(manifest.portal), 'E');
    if let Some(key) = manifest.key {
        plot(key, 'K');
    }
    if let Some(lever) = manifest.lever {
        plot(lever, 'L');
    }
    if let Some(treasure) = manifest.treasure {
        plot(treasure.cell, 'T');
    }
    for potion in &manifest.potions {
        plot(potion.cell, '+');
    }
    for door in &manifest.doors {
        let glyph = match door.kind {
            DoorKind::Exit => 'D',
            DoorKind::Treasure => 'd',
        };
        plot(door.cell, glyph);
    }
    for prop in &manifest.props {
        plot(prop.cell, 'o');
    }
    for enemy in &manifest.enemies {
        let glyph = match enemy.kind {
            EnemyKind::Melee => 'm',
            EnemyKind::Ranged => 'r',
        };
        plot(mapper.world_to_grid(enemy.position), glyph);
    }
    plot(mapper.world_to_grid(manifest.player), '@');

    let mut map = String::with_capacity(canvas.len() + rows);
    for row in canvas.chunks(width.max(1)) {
        map.extend(row);
        map.push('\n');
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawler_core::{Command, DungeonConfig};
    use crawler_system_bootstrap::Bootstrap;
    use crawler_world::{apply, World};

    #[test]
    fn map_has_one_line_per_row() {
        let config = DungeonConfig::default();
        let mut world = World::new(config.clone());
        let mut events = Vec::new();
        apply(&mut world, Command::StartCampaign { seed: 12345 }, &mut events);
        let manifest = Bootstrap.scene_manifest(&world).expect("level loaded");

        let map = ascii_map(&manifest);

        let lines: Vec<&str> = map.lines().collect();
        assert_eq!(lines.len(), config.grid_height as usize);
        assert!(lines
            .iter()
            .all(|line| line.chars().count() == config.grid_width as usize));
        assert_eq!(map.matches('@').count(), 1);
        assert!(lines[0].chars().all(|glyph| glyph == '#'));
    }
}
