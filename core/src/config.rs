//! Tunable parameters that shape generated levels.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parameters consumed by the dungeon generator and the coordinate mapper.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DungeonConfig {
    /// Number of grid columns.
    pub grid_width: u32,
    /// Number of grid rows.
    pub grid_height: u32,
    /// Side length of a single cell measured in world units.
    pub cell_size: f32,
    /// Height of wall blocks in world units; doors share this height.
    pub wall_height: f32,
    /// Upper bound on the number of rooms carved per level.
    pub max_rooms: usize,
    /// Number of random placement attempts made before giving up on new rooms.
    pub room_attempts: usize,
    /// Smallest room edge length in cells.
    pub room_min_size: u32,
    /// Largest room edge length in cells.
    pub room_max_size: u32,
    /// Target number of enemies, excluding guaranteed trap room spawns.
    pub enemy_count: usize,
}

impl Default for DungeonConfig {
    fn default() -> Self {
        Self {
            grid_width: 41,
            grid_height: 41,
            cell_size: 2.0,
            wall_height: 4.0,
            max_rooms: 12,
            room_attempts: 40,
            room_min_size: 4,
            room_max_size: 8,
            enemy_count: 10,
        }
    }
}

impl DungeonConfig {
    /// Checks that the configuration describes a grid the simulation can use.
    ///
    /// Small grids are accepted; the generator degrades to a single fallback
    /// room rather than failing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(ConfigError::ZeroGridDimension {
                width: self.grid_width,
                height: self.grid_height,
            });
        }

        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(ConfigError::InvalidCellSize(self.cell_size));
        }

        if !self.wall_height.is_finite() || self.wall_height <= 0.0 {
            return Err(ConfigError::InvalidWallHeight(self.wall_height));
        }

        if self.room_min_size == 0 || self.room_min_size > self.room_max_size {
            return Err(ConfigError::InvalidRoomSize {
                min: self.room_min_size,
                max: self.room_max_size,
            });
        }

        Ok(())
    }
}

/// Reasons a [`DungeonConfig`] is rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// One of the grid dimensions is zero.
    #[error("grid dimensions must be non-zero, got {width}x{height}")]
    ZeroGridDimension {
        /// Configured column count.
        width: u32,
        /// Configured row count.
        height: u32,
    },
    /// Cell size is not a positive finite number.
    #[error("cell size must be positive and finite, got {0}")]
    InvalidCellSize(f32),
    /// Wall height is not a positive finite number.
    #[error("wall height must be positive and finite, got {0}")]
    InvalidWallHeight(f32),
    /// Room size bounds are empty or inverted.
    #[error("room size range {min}..={max} is invalid")]
    InvalidRoomSize {
        /// Configured minimum edge length.
        min: u32,
        /// Configured maximum edge length.
        max: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(DungeonConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_width_is_rejected() {
        let config = DungeonConfig {
            grid_width: 0,
            ..DungeonConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroGridDimension { width: 0, .. })
        ));
    }

    #[test]
    fn inverted_room_sizes_are_rejected() {
        let config = DungeonConfig {
            room_min_size: 9,
            room_max_size: 4,
            ..DungeonConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidRoomSize { min: 9, max: 4 })
        );
    }

    #[test]
    fn non_finite_cell_size_is_rejected() {
        let config = DungeonConfig {
            cell_size: f32::NAN,
            ..DungeonConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCellSize(_))
        ));
    }
}
