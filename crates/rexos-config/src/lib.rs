//! Configuration management for RexOS
//!
//! Handles library locations and the settings consumed by the game collection
//! overlay (enabled collections, sorting, bundling, theme set).
//! TOML-based config files, user settings layered over system settings.

mod collections;
mod library;

pub use collections::{CollectionsConfig, comma_list};
pub use library::LibraryConfig;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Standard configuration paths
pub const CONFIG_DIR: &str = "/etc/rexos";
pub const USER_CONFIG_DIR: &str = "/roms/.rexos";

/// Main RexOS configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RexOSConfig {
    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub collections: CollectionsConfig,
}

impl RexOSConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_layered(
            &Path::new(CONFIG_DIR).join("config.toml"),
            &Path::new(USER_CONFIG_DIR).join("config.toml"),
        )
    }

    /// Load the system config with the user config merged on top.
    ///
    /// Either file may be missing; with neither present the defaults are used.
    pub fn load_layered(system: &Path, user: &Path) -> Result<Self, ConfigError> {
        let mut merged: Option<toml::Value> = None;

        for path in [system, user] {
            if !path.exists() {
                continue;
            }
            let contents = std::fs::read_to_string(path)?;
            let value: toml::Value = toml::from_str(&contents)?;
            match merged.as_mut() {
                Some(base) => merge_toml(base, value),
                None => merged = Some(value),
            }
        }

        match merged {
            Some(value) => {
                let config: Self = value.try_into()?;
                config.validate()?;
                Ok(config)
            }
            None => {
                tracing::warn!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Reject values nothing downstream can work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.library.roms_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("library.roms_dir is empty".to_string()));
        }
        if self.collections.theme_set.trim().is_empty() {
            return Err(ConfigError::Invalid("collections.theme_set is empty".to_string()));
        }
        Ok(())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        tracing::info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Save to default user configuration location
    pub fn save_default(&self) -> Result<(), ConfigError> {
        let user_config = Path::new(USER_CONFIG_DIR).join("config.toml");
        self.save(&user_config)
    }
}

/// Helper function to merge TOML values
pub fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                if let Some(base_value) = base_table.get_mut(&key) {
                    merge_toml(base_value, value);
                } else {
                    base_table.insert(key, value);
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
