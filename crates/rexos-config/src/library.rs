//! Library locations

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where games and their metadata live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Root of the ROMs partition, one directory per system
    #[serde(default = "default_roms_dir")]
    pub roms_dir: PathBuf,

    /// SQLite database holding metadata and play statistics
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Systems that are not games (tools, settings menus)
    #[serde(default = "default_non_game_systems")]
    pub non_game_systems: Vec<String>,
}

fn default_roms_dir() -> PathBuf {
    PathBuf::from("/roms")
}

fn default_database() -> PathBuf {
    PathBuf::from("/roms/.rexos/games.db")
}

fn default_non_game_systems() -> Vec<String> {
    vec!["retropie".to_string(), "tools".to_string()]
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            roms_dir: default_roms_dir(),
            database: default_database(),
            non_game_systems: default_non_game_systems(),
        }
    }
}

impl LibraryConfig {
    /// Whether a system directory holds games
    pub fn is_game_system(&self, system: &str) -> bool {
        !self
            .non_game_systems
            .iter()
            .any(|s| s.eq_ignore_ascii_case(system))
    }
}
