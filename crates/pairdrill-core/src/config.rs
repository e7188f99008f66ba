//! Trainer configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::Direction;
use crate::quiz::Order;

/// Environment variable overriding [`TrainerConfig::data_dir`].
pub const DATA_DIR_ENV: &str = "PAIRDRILL_DATA_DIR";

/// Local config file name looked up in the current directory.
pub const LOCAL_CONFIG: &str = "pairdrill.toml";

/// Top-level pairdrill configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Where mistake books live.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Options per multiple-choice question.
    #[serde(default = "default_choices")]
    pub choices: usize,
    #[serde(default)]
    pub direction: Direction,
    /// Compare fill answers case-insensitively.
    #[serde(default = "default_true")]
    pub ignore_case: bool,
    #[serde(default)]
    pub order: Order,
}

fn default_data_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("pairdrill"),
        None => PathBuf::from(".pairdrill"),
    }
}
fn default_choices() -> usize {
    4
}
fn default_true() -> bool {
    true
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            choices: default_choices(),
            direction: Direction::default(),
            ignore_case: true,
            order: Order::default(),
        }
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `pairdrill.toml` in the current directory
/// 2. `~/.config/pairdrill/config.toml`
///
/// `PAIRDRILL_DATA_DIR` overrides `data_dir`.
pub fn load_config() -> Result<TrainerConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<TrainerConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from(LOCAL_CONFIG);
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            parse_config_file(&path)?
        }
        None => TrainerConfig::default(),
    };

    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
        config.data_dir = PathBuf::from(dir);
    }

    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<TrainerConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<TrainerConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("pairdrill"))
}
