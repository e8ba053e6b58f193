//! Theme folder lookup
//!
//! Collections get their own carousel entry only when the active theme set
//! ships a folder for them. A folder counts when it holds a `theme.xml`.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Folders provided by the active theme set
#[derive(Debug, Clone, Default)]
pub struct ThemeFolders {
    folders: BTreeSet<String>,
}

impl ThemeFolders {
    /// Read `<themes_dir>/<theme_set>`. A missing set yields no folders.
    pub fn scan(themes_dir: &Path, theme_set: &str) -> Self {
        let set_dir = themes_dir.join(theme_set);
        let mut themes = Self::default();

        let Ok(entries) = fs::read_dir(&set_dir) else {
            tracing::debug!("Theme set not found at {}", set_dir.display());
            return themes;
        };

        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.is_dir() && path.join("theme.xml").is_file() {
                themes
                    .folders
                    .insert(entry.file_name().to_string_lossy().to_string());
            }
        }

        themes
    }

    /// Build from a known list of folder names
    pub fn from_folders<I, S>(folders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            folders: folders.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, folder: &str) -> bool {
        self.folders.contains(folder)
    }

    pub fn folders(&self) -> impl Iterator<Item = &str> {
        self.folders.iter().map(String::as_str)
    }
}
