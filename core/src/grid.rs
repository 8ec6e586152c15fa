//! Conversions between continuous world space and discrete grid cells.

use glam::Vec3;

use crate::{DungeonConfig, GridPoint};

/// Affine mapping between grid cells and world positions on the XZ plane.
///
/// Cell `(0, 0)` sits at the negative corner of the level and the grid is
/// centered on the world origin. World `y` is ignored when mapping back.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridMapper {
    columns: u32,
    rows: u32,
    cell_size: f32,
}

impl GridMapper {
    /// Creates a mapper for a grid with the provided dimensions.
    #[must_use]
    pub const fn new(columns: u32, rows: u32, cell_size: f32) -> Self {
        Self {
            columns,
            rows,
            cell_size,
        }
    }

    /// Creates a mapper matching the grid described by the configuration.
    #[must_use]
    pub fn from_config(config: &DungeonConfig) -> Self {
        Self::new(config.grid_width, config.grid_height, config.cell_size)
    }

    /// Number of columns covered by the mapping.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows covered by the mapping.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of one cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// World-space center of the provided cell, at floor height.
    #[must_use]
    pub fn grid_to_world(&self, cell: GridPoint) -> Vec3 {
        let half_cell = self.cell_size / 2.0;
        Vec3::new(
            self.cell_size * (cell.x() as f32 - self.columns as f32 / 2.0) + half_cell,
            0.0,
            self.cell_size * (cell.y() as f32 - self.rows as f32 / 2.0) + half_cell,
        )
    }

    /// Cell containing the provided world position.
    ///
    /// Positions outside the level clamp to the nearest border cell, so the
    /// result is always in bounds.
    #[must_use]
    pub fn world_to_grid(&self, position: Vec3) -> GridPoint {
        let half_width = self.columns as f32 * self.cell_size / 2.0;
        let half_depth = self.rows as f32 * self.cell_size / 2.0;
        let column = ((position.x + half_width) / self.cell_size).floor();
        let row = ((position.z + half_depth) / self.cell_size).floor();

        GridPoint::new(
            clamp_axis(column, self.columns),
            clamp_axis(row, self.rows),
        )
    }
}

/// Manhattan distance between two cells.
#[must_use]
pub fn manhattan(a: GridPoint, b: GridPoint) -> u32 {
    a.manhattan_distance(b)
}

fn clamp_axis(value: f32, extent: u32) -> u32 {
    let upper = extent.saturating_sub(1);
    // `as` saturates and maps NaN to zero.
    let index = value as i64;
    index.clamp(0, i64::from(upper)) as u32
}
