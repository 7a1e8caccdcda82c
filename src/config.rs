//! Generator configuration: a builtin JSON document, optionally replaced by a file.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::region::{TownParams, WildernessParams};

pub const BUILTIN_GENERATOR_CONFIG: &str = include_str!("data/default_config.json");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub world: WorldConfig,
    pub wilderness: WildernessParams,
    pub town: TownParams,
    pub visibility: VisibilityConfig,
    pub player: PlayerConfig,
}

impl GeneratorConfig {
    pub fn builtin() -> Self {
        serde_json::from_str(BUILTIN_GENERATOR_CONFIG).expect("builtin generator config should parse")
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let config = GeneratorConfig::from_json_str(&contents)?;
        Ok(config)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse generator config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read generator config from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The towns to build and the wilderness hosting them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Random when absent.
    pub seed: Option<u64>,
    pub wilderness_name: String,
    pub wilderness_size: (usize, usize),
    pub with_liquid: bool,
    pub towns: Vec<TownConfig>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: None,
            wilderness_name: "Wilderness".to_string(),
            wilderness_size: (81, 121),
            with_liquid: true,
            towns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TownConfig {
    pub name: String,
    pub size: (usize, usize),
    /// The first building is the entrance.
    pub buildings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    pub angle_step: usize,
    pub default_radius: usize,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            angle_step: 1,
            default_radius: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Ticks one player step costs.
    pub speed: u64,
    pub vision_radius: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: 10,
            vision_radius: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_parses() {
        let config = GeneratorConfig::builtin();
        assert!(!config.world.towns.is_empty());
        assert_eq!(config.wilderness.wanderers, 20);
        assert!(config.wilderness.prune_enclosed_blocks);
        assert_eq!(config.town.locked_door_chance, 0.0);
        assert_eq!(config.town.layout.max_building_size, (9, 9));
        for town in &config.world.towns {
            assert!(town.size.0 % 2 == 1 && town.size.1 % 2 == 1);
        }
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = GeneratorConfig::from_json_str(r#"{ "player": { "speed": 4 } }"#).unwrap();
        assert_eq!(config.player.speed, 4);
        assert_eq!(config.player.vision_radius, 8);
        assert_eq!(config.wilderness, WildernessParams::default());
        assert_eq!(config.world.wilderness_size, (81, 121));
    }

    #[test]
    fn test_from_file_round_trip() {
        let mut config = GeneratorConfig::builtin();
        config.world.seed = Some(77);
        config.town.wall_lamp_chance = 0.25;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string_pretty(&config).unwrap()).unwrap();
        let loaded = GeneratorConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = GeneratorConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFailed { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = GeneratorConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
