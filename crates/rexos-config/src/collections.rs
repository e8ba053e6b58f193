//! Game collection settings

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings consumed by the collection overlay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionsConfig {
    /// Enabled automatic collections, comma separated (e.g. "all,favorites")
    #[serde(default = "default_auto_enabled")]
    pub auto_enabled: String,

    /// Enabled custom collections, comma separated
    #[serde(default)]
    pub custom_enabled: String,

    /// Sort every system and collection alphabetically
    #[serde(default)]
    pub sort_all_systems: bool,

    /// Group custom collections without a theme folder into one bundle
    #[serde(default = "default_true")]
    pub use_custom_collections_system: bool,

    /// Active theme set
    #[serde(default = "default_theme_set")]
    pub theme_set: String,

    /// Directory holding the installed theme sets
    #[serde(default = "default_themes_dir")]
    pub themes_dir: PathBuf,

    /// Override for the membership file directory
    #[serde(default)]
    pub collections_dir: Option<PathBuf>,

    /// Non-game system kept right before the automatic collections when sorting
    #[serde(default = "default_pinned_system")]
    pub pinned_system: String,
}

fn default_auto_enabled() -> String {
    "favorites,recent".to_string()
}

fn default_true() -> bool {
    true
}

fn default_theme_set() -> String {
    "default".to_string()
}

fn default_themes_dir() -> PathBuf {
    PathBuf::from("/usr/share/rexos/themes")
}

fn default_pinned_system() -> String {
    "retropie".to_string()
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            auto_enabled: default_auto_enabled(),
            custom_enabled: String::new(),
            sort_all_systems: false,
            use_custom_collections_system: true,
            theme_set: default_theme_set(),
            themes_dir: default_themes_dir(),
            collections_dir: None,
            pinned_system: default_pinned_system(),
        }
    }
}

impl CollectionsConfig {
    /// Names of the enabled automatic collections
    pub fn enabled_auto(&self) -> Vec<String> {
        comma_list(&self.auto_enabled)
    }

    /// Names of the enabled custom collections
    pub fn enabled_custom(&self) -> Vec<String> {
        comma_list(&self.custom_enabled)
    }

    /// Rewrite the custom list from names
    pub fn set_enabled_custom<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.custom_enabled = join_list(names);
    }

    /// Rewrite the automatic list from names
    pub fn set_enabled_auto<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.auto_enabled = join_list(names);
    }

    /// True if neither list names anything
    pub fn nothing_enabled(&self) -> bool {
        self.enabled_auto().is_empty() && self.enabled_custom().is_empty()
    }
}

/// Split a comma separated settings value, dropping empty items
pub fn comma_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn join_list<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}
