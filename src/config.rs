use std::path::{Path, PathBuf};

use crate::storage::DEFAULT_MAX_ENTRIES;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{field} must be {expected}")]
    Invalid { field: &'static str, expected: &'static str },
}

/// Settings for the terminal front end, usually read from a TOML file.
///
/// Every field is optional in the file.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GameConfig {
    /// Where the JSON score file lives.
    #[serde(default = "defaults::scores_path")]
    pub scores_path: PathBuf,

    /// High-score entries kept by the store.
    #[serde(default = "defaults::max_scores")]
    pub max_scores: usize,

    /// Fixed RNG seed for reproducible games. Random when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Skip the name prompt.
    #[serde(default)]
    pub player_name: Option<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            scores_path: defaults::scores_path(),
            max_scores: defaults::max_scores(),
            seed: None,
            player_name: None,
        }
    }
}

impl GameConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_scores == 0 {
            return Err(ConfigError::Invalid { field: "max_scores", expected: "at least 1" });
        }
        Ok(())
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn scores_path() -> PathBuf { PathBuf::from("game2048_scores.json") }
    pub fn max_scores() -> usize { super::DEFAULT_MAX_ENTRIES }
}
