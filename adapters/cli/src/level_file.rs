//! Level snapshots on disk and simulation tuning files.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use opendungeons_core::{Level, SimulationConfig};
use serde::{Deserialize, Serialize};

const LEVEL_FORMAT: &str = "opendungeons-level";
const LEVEL_VERSION: u32 = 1;

/// Versioned envelope wrapping a level written as JSON.
#[derive(Debug, Serialize, Deserialize)]
struct LevelFile {
    format: String,
    version: u32,
    level: Level,
}

/// Encodes a level into its JSON file representation.
pub(crate) fn encode_level(level: &Level) -> Result<String> {
    let file = LevelFile {
        format: LEVEL_FORMAT.to_owned(),
        version: LEVEL_VERSION,
        level: level.clone(),
    };
    serde_json::to_string_pretty(&file).context("failed to serialise level")
}

/// Decodes a level from its JSON file representation.
pub(crate) fn decode_level(contents: &str) -> Result<Level> {
    let file: LevelFile = serde_json::from_str(contents).context("failed to parse level json")?;
    if file.format != LEVEL_FORMAT {
        bail!("level format '{}' is not supported", file.format);
    }
    if file.version != LEVEL_VERSION {
        bail!(
            "unsupported level version {}; expected {}",
            file.version,
            LEVEL_VERSION
        );
    }
    Ok(file.level)
}

/// Reads a level snapshot.
pub(crate) fn load_level(path: &Path) -> Result<Level> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read level {}", path.display()))?;
    decode_level(&contents).with_context(|| format!("invalid level {}", path.display()))
}

/// Writes a level snapshot, replacing any existing file.
pub(crate) fn save_level(level: &Level, path: &Path) -> Result<()> {
    let contents = encode_level(level)?;
    fs::write(path, contents).with_context(|| format!("failed to write level {}", path.display()))
}

/// Reads simulation tuning from TOML. Omitted keys keep their defaults.
pub(crate) fn load_config(path: &Path) -> Result<SimulationConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("invalid config {}", path.display()))
}

fn parse_config(contents: &str) -> Result<SimulationConfig> {
    toml::from_str(contents).context("failed to parse simulation config toml contents")
}

#[cfg(test)]
mod tests {
    use super::*;
    use opendungeons_core::{SeatId, TileCoord, TileKind};

    #[test]
    fn level_survives_the_file_format() {
        let level = Level::new(6, 4)
            .with_seat(SeatId::new(1), 1, 250)
            .with_tile(TileCoord::new(2, 1), TileKind::Gold, 80.0, None)
            .with_creature("Kobold", SeatId::new(1), TileCoord::new(1, 1));

        let encoded = encode_level(&level).expect("level encodes");
        assert!(encoded.contains("\"format\": \"opendungeons-level\""));
        assert_eq!(decode_level(&encoded).expect("level decodes"), level);
    }

    #[test]
    fn foreign_or_future_files_are_refused() {
        let level = Level::new(2, 2);
        let encoded = encode_level(&level).expect("level encodes");

        let future = encoded.replace("\"version\": 1", "\"version\": 7");
        let error = decode_level(&future).expect_err("future version refused");
        assert!(error.to_string().contains("unsupported level version 7"));

        let foreign = encoded.replace(LEVEL_FORMAT, "dungeon-map");
        assert!(decode_level(&foreign).is_err());
        assert!(decode_level("").is_err());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config = parse_config(
            "[rules]\nmax_actions_per_turn = 7\n\n[spawning]\nmax_population = 3\n",
        )
        .expect("config parses");

        assert_eq!(config.rules.max_actions_per_turn, 7);
        assert_eq!(config.spawning.max_population, 3);
        let defaults = SimulationConfig::default();
        assert_eq!(config.economy, defaults.economy);
        assert_eq!(config.creatures, defaults.creatures);
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(parse_config("[rules\nmax_actions_per_turn = 7").is_err());
    }
}
