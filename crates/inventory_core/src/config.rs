//! Runtime configuration for inventory core.
//!
//! # Responsibility
//! - Describe where the database lives, how logging is set up and how prices
//!   are rendered.
//! - Load settings from a TOML file and from `INVENTORY_*` environment
//!   variables, environment taking precedence.
//!
//! # Invariants
//! - Every section has defaults; an empty file is a valid configuration.

use crate::logging::default_log_level;
use crate::model::currency::CurrencyFormat;
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Well-known file name of the item database.
pub const DEFAULT_DATABASE_NAME: &str = "item_database.sqlite3";
const DEFAULT_DATA_DIR: &str = "data";

const ENV_DATA_DIR: &str = "INVENTORY_DATA_DIR";
const ENV_DB_NAME: &str = "INVENTORY_DB_NAME";
const ENV_LOG_LEVEL: &str = "INVENTORY_LOG_LEVEL";
const ENV_LOG_DIR: &str = "INVENTORY_LOG_DIR";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub currency: CurrencyFormat,
}

/// Location of the item database file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub data_dir: PathBuf,
    pub name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            name: DEFAULT_DATABASE_NAME.to_string(),
        }
    }
}

impl DatabaseConfig {
    /// Database rooted at `data_dir` with the well-known file name.
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn path(&self) -> PathBuf {
        self.data_dir.join(&self.name)
    }
}

/// File logging settings. Logging stays off when `dir` is unset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

impl InventoryConfig {
    /// Defaults overlaid with `INVENTORY_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Overwrites fields whose environment variable is set and non-empty.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = lookup(ENV_DATA_DIR) {
            self.database.data_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_DB_NAME) {
            self.database.name = value;
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = value;
        }
        if let Some(value) = lookup(ENV_LOG_DIR) {
            self.logging.dir = Some(PathBuf::from(value));
        }
    }
}

/// Loads configuration from a TOML file, then applies environment overrides.
pub fn load_config(path: impl AsRef<Path>) -> Result<InventoryConfig, ConfigError> {
    let path = path.as_ref();
    debug!("event=config_load module=config status=start path={}", path.display());

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: InventoryConfig =
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    config.apply_env_overrides();
    Ok(config)
}
