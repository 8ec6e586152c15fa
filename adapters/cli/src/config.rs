//! Loading of dungeon configuration files.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use crawler_core::DungeonConfig;

/// Reads the configuration at `path`, or the defaults when no path is given.
pub(crate) fn load(path: Option<&Path>) -> Result<DungeonConfig> {
    let Some(path) = path else {
        return Ok(DungeonConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read dungeon config at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid dungeon config at {}", path.display()))
}

/// Parses TOML contents; absent keys keep their defaults.
pub(crate) fn parse(contents: &str) -> Result<DungeonConfig> {
    let config: DungeonConfig =
        toml::from_str(contents).context("failed to parse dungeon config toml contents")?;
    config.validate()?;
    Ok(config)
}
