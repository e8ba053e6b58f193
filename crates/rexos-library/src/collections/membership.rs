//! Custom collection membership files
//!
//! One `custom-<name>.cfg` per collection: plain UTF-8, one ROM path per
//! line, in collection order. Paths under the home directory are written as
//! `~/...` so a collection survives a changed mount point of the home.

use crate::LibraryError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const PREFIX: &str = "custom-";
const SUFFIX: &str = ".cfg";

/// Reads and writes membership files in the collections directory
#[derive(Debug, Clone)]
pub struct MembershipStore {
    dir: PathBuf,
    home: PathBuf,
}

impl MembershipStore {
    /// Use `dir` for membership files, creating it if needed
    pub fn new(dir: impl Into<PathBuf>, home: impl Into<PathBuf>) -> Result<Self, LibraryError> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            tracing::info!("Created collections directory {}", dir.display());
        }
        Ok(Self {
            dir,
            home: home.into(),
        })
    }

    /// `<home>/.emulationstation/collections`
    pub fn default_dir(home: &Path) -> PathBuf {
        home.join(".emulationstation").join("collections")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding a collection's members
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}{}{}", PREFIX, name, SUFFIX))
    }

    /// Collection name encoded in a membership file name
    pub fn collection_name(filename: &str) -> Option<&str> {
        let name = filename.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
        if name.is_empty() { None } else { Some(name) }
    }

    /// Resolved member paths in file order, or None if there is no file
    pub fn load(&self, name: &str) -> Result<Option<Vec<String>>, LibraryError> {
        let path = self.path_for(name);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        let paths = contents
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(|line| self.resolve(line))
            .collect();
        Ok(Some(paths))
    }

    /// Replace a collection's file with the given member paths
    pub fn save<S: AsRef<str>>(&self, name: &str, paths: &[S]) -> Result<(), LibraryError> {
        let path = self.path_for(name);
        let mut file = fs::File::create(&path)?;
        for member in paths {
            writeln!(file, "{}", self.relativize(member.as_ref()))?;
        }
        file.flush()?;
        tracing::info!("Saved {} games to {}", paths.len(), path.display());
        Ok(())
    }

    /// Expand a stored line to a canonical path
    pub fn resolve(&self, line: &str) -> String {
        match line.strip_prefix("~/") {
            Some(rest) => self.home.join(rest).to_string_lossy().to_string(),
            None => line.to_string(),
        }
    }

    /// Shorten a canonical path for storage
    pub fn relativize(&self, path: &str) -> String {
        match Path::new(path).strip_prefix(&self.home) {
            Ok(rest) if !rest.as_os_str().is_empty() && !self.home.as_os_str().is_empty() => {
                format!("~/{}", rest.to_string_lossy())
            }
            _ => path.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> MembershipStore {
        MembershipStore::new(dir.path().join("collections"), "/home/ark").unwrap()
    }

    #[test]
    fn test_creates_directory() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(store.dir().is_dir());
    }

    #[test]
    fn test_collection_name() {
        assert_eq!(MembershipStore::collection_name("custom-Shmups.cfg"), Some("Shmups"));
        assert_eq!(MembershipStore::collection_name("custom-.cfg"), None);
        assert_eq!(MembershipStore::collection_name("settings.cfg"), None);
        assert_eq!(MembershipStore::collection_name("custom-x.txt"), None);
    }

    #[test]
    fn test_home_shorthand() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert_eq!(store.relativize("/home/ark/roms/nes/a.nes"), "~/roms/nes/a.nes");
        assert_eq!(store.relativize("/roms/nes/a.nes"), "/roms/nes/a.nes");
        assert_eq!(store.resolve("~/roms/nes/a.nes"), "/home/ark/roms/nes/a.nes");
        assert_eq!(store.resolve("/roms/nes/a.nes"), "/roms/nes/a.nes");
    }

    #[test]
    fn test_save_and_load_keep_order() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let paths = ["/roms/snes/z.sfc", "/home/ark/roms/nes/a.nes", "/roms/gba/m.gba"];

        store.save("Mixed", &paths).unwrap();
        let written = fs::read_to_string(store.path_for("Mixed")).unwrap();
        assert_eq!(
            written,
            "/roms/snes/z.sfc\n~/roms/nes/a.nes\n/roms/gba/m.gba\n"
        );

        let loaded = store.load("Mixed").unwrap().unwrap();
        assert_eq!(loaded, paths);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(store(&dir).load("Nope").unwrap().is_none());
    }
}
