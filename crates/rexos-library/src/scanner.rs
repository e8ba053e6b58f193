//! ROM scanning functionality
//!
//! Systems are scanned concurrently on a bounded pool; the resulting
//! [`GameStore`] is only handed out once every system finished, so nothing
//! downstream ever sees a half-built game list.

use crate::store::{Game, GameStore, SystemLibrary};
use crate::LibraryError;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Result of a ROM scan
#[derive(Debug, Default)]
pub struct ScanResult {
    pub systems_found: usize,
    pub games_found: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

/// ROM scanner configuration
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// File extensions to scan
    pub extensions: HashSet<String>,

    /// Directories to skip
    pub skip_dirs: HashSet<String>,

    /// Scan subdirectories
    pub recursive: bool,

    /// Skip hidden files/directories
    pub skip_hidden: bool,

    /// Upper bound on systems scanned at once (defaults to the CPU count)
    pub max_workers: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        let mut extensions = HashSet::new();
        // Common ROM extensions
        for ext in &[
            "nes", "fds", "smc", "sfc", "n64", "z64", "v64", "gb", "gbc", "gba", "nds", "sms",
            "gg", "md", "gen", "bin", "32x", "pce", "sgx", "iso", "cso", "chd", "pbp", "cue",
            "a26", "a78", "lnx", "ngp", "ngc", "ws", "wsc", "zip", "7z", "sh",
        ] {
            extensions.insert(ext.to_string());
        }

        let mut skip_dirs = HashSet::new();
        skip_dirs.insert("bios".to_string());
        skip_dirs.insert("saves".to_string());
        skip_dirs.insert("states".to_string());
        skip_dirs.insert("screenshots".to_string());
        skip_dirs.insert(".rexos".to_string());

        let max_workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self {
            extensions,
            skip_dirs,
            recursive: true,
            skip_hidden: true,
            max_workers,
        }
    }
}

/// ROM scanner
#[derive(Debug, Clone)]
pub struct RomScanner {
    config: ScanConfig,
}

impl Default for RomScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl RomScanner {
    /// Create a new scanner with default config
    pub fn new() -> Self {
        Self {
            config: ScanConfig::default(),
        }
    }

    /// Create with custom config
    pub fn with_config(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Scan a directory for ROMs
    pub fn scan(&self, path: &Path, system: &str) -> Result<Vec<Game>, LibraryError> {
        let mut games = Vec::new();
        self.scan_dir(path, system, &mut games)?;
        Ok(games)
    }

    /// Recursively scan a directory
    fn scan_dir(
        &self,
        path: &Path,
        system: &str,
        games: &mut Vec<Game>,
    ) -> Result<(), LibraryError> {
        if !path.exists() || !path.is_dir() {
            return Ok(());
        }

        let mut entries: Vec<PathBuf> = fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<_, _>>()?;
        // deterministic scan order
        entries.sort();

        for entry_path in entries {
            let name = entry_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            // Skip hidden files/directories
            if self.config.skip_hidden && name.starts_with('.') {
                continue;
            }

            if entry_path.is_dir() {
                // Skip configured directories
                if self.config.skip_dirs.contains(&name.to_lowercase()) {
                    continue;
                }

                // Recurse into subdirectories
                if self.config.recursive {
                    self.scan_dir(&entry_path, system, games)?;
                }
            } else if entry_path.is_file() {
                // Check extension
                if let Some(ext) = entry_path.extension().and_then(|e| e.to_str())
                    && self.config.extensions.contains(&ext.to_lowercase())
                    && let Some(game) = self.create_game(&entry_path, system)
                {
                    games.push(game);
                }
            }
        }

        Ok(())
    }

    /// Create a Game from a ROM file
    fn create_game(&self, path: &Path, system: &str) -> Option<Game> {
        let name = path.file_stem()?.to_string_lossy().to_string();

        // Clean up name (remove region codes, etc.)
        let clean_name = Self::clean_game_name(&name);

        Some(Game::new(path.to_string_lossy(), system, clean_name))
    }

    /// Clean up a game name (remove region codes, etc.)
    fn clean_game_name(name: &str) -> String {
        let mut clean = name.to_string();

        // Remove common patterns in parentheses/brackets
        let patterns = [
            // Regions
            "(USA)", "(Europe)", "(Japan)", "(World)", "(U)", "(E)", "(J)", "(W)", "(En)", "(Fr)",
            "(De)", "(Es)", "(It)", // Versions
            "(Rev 1)", "(Rev 2)", "(Rev A)", "(Rev B)", "(v1.0)", "(v1.1)", "(v1.2)",
            // Tags
            "(Unl)", "(Proto)", "(Beta)", "(Demo)", "(Sample)", "[!]", "[a]", "[b]", "[h]", "[o]",
            "[t]",
        ];

        for pattern in &patterns {
            clean = clean.replace(pattern, "");
        }

        // Remove anything in square brackets
        while let Some(start) = clean.find('[') {
            if let Some(end) = clean.find(']') {
                if end > start {
                    clean = format!("{}{}", &clean[..start], &clean[end + 1..]);
                } else {
                    break;
                }
            } else {
                break;
            }
        }

        // Clean up whitespace
        clean = clean
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string();

        clean
    }

    /// System directories under a roms directory, sorted by name
    fn system_dirs(&self, roms_dir: &Path) -> Result<Vec<(String, PathBuf)>, LibraryError> {
        let mut systems = Vec::new();

        if !roms_dir.exists() {
            return Ok(systems);
        }

        for entry in fs::read_dir(roms_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.is_dir() {
                let system = entry.file_name().to_string_lossy().to_string();

                // Skip special directories
                if self.config.skip_dirs.contains(&system.to_lowercase())
                    || (self.config.skip_hidden && system.starts_with('.'))
                {
                    continue;
                }

                systems.push((system, path));
            }
        }

        systems.sort();
        Ok(systems)
    }

    /// Scan all systems concurrently and build the game store.
    ///
    /// At most `max_workers` systems are walked at a time. A system that
    /// fails to scan is reported in [`ScanResult::errors`] and left out.
    /// `is_game_system` flags tool/settings directories.
    pub async fn scan_into_store<F>(
        &self,
        roms_dir: &Path,
        is_game_system: F,
    ) -> Result<(GameStore, ScanResult), LibraryError>
    where
        F: Fn(&str) -> bool,
    {
        let start = Instant::now();
        let systems = self.system_dirs(roms_dir)?;
        let permits = Arc::new(Semaphore::new(self.config.max_workers.max(1)));
        let mut tasks = JoinSet::new();

        for (index, (system, path)) in systems.iter().cloned().enumerate() {
            let scanner = self.clone();
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| LibraryError::ScanError(e.to_string()))?;
                let games = tokio::task::spawn_blocking(move || scanner.scan(&path, &system))
                    .await
                    .map_err(|e| LibraryError::ScanError(e.to_string()))??;
                Ok::<_, LibraryError>((index, games))
            });
        }

        let mut scanned: Vec<Option<Vec<Game>>> = vec![None; systems.len()];
        let mut result = ScanResult::default();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok((index, games))) => scanned[index] = Some(games),
                Ok(Err(e)) => result.errors.push(e.to_string()),
                Err(e) => result.errors.push(e.to_string()),
            }
        }

        // every scan has finished; assemble in directory order
        let mut store = GameStore::new();
        for ((system, path), games) in systems.into_iter().zip(scanned) {
            let Some(games) = games else {
                continue;
            };
            if games.is_empty() {
                continue;
            }
            let mut library = SystemLibrary::new(system.clone(), path);
            if !is_game_system(&system) {
                library = library.non_game();
            }
            store.add_system(library);
            result.systems_found += 1;
            result.games_found += games.len();
            for game in games {
                store.insert(game);
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Scanned {} games in {} systems ({} ms)",
            result.games_found,
            result.systems_found,
            result.duration_ms
        );
        for error in &result.errors {
            tracing::warn!("Scan error: {}", error);
        }

        Ok((store, result))
    }
}
