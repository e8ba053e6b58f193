//! In-memory game store
//!
//! Every scanned game lives here exactly once. Collections and indexes refer
//! to records through [`GameId`] and never hold copies.

use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Stable handle to a game record in a [`GameStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameId(usize);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A game in the library
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Game {
    /// Canonical path, the identity key
    pub path: String,
    pub system: String,
    pub name: String,
    pub description: Option<String>,
    /// `YYYYMMDDTHHMMSS`
    pub release_date: Option<String>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub genre: Option<String>,
    pub players: Option<i32>,
    /// 0.0 - 1.0
    pub rating: Option<f32>,
    pub favorite: bool,
    pub hidden: bool,
    pub play_count: i32,
    /// `YYYY-MM-DD HH:MM:SS`
    pub last_played: Option<String>,
    /// Kept out of All Games / Last Played (launchers, tools)
    pub auto_excluded: bool,
    pub video: Option<PathBuf>,
    pub thumbnail: Option<PathBuf>,
    pub image: Option<PathBuf>,
}

impl Game {
    /// Create a bare record for a path
    pub fn new(path: impl Into<String>, system: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            system: system.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A physically scanned system (one directory of ROMs)
#[derive(Debug, Clone)]
pub struct SystemLibrary {
    pub name: String,
    pub full_name: String,
    pub theme_folder: String,
    /// False for tool/settings systems whose entries are not games
    pub is_game_system: bool,
    pub root: PathBuf,
    games: Vec<GameId>,
}

impl SystemLibrary {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        let name = name.into();
        Self {
            full_name: name.clone(),
            theme_folder: name.clone(),
            name,
            is_game_system: true,
            root: root.into(),
            games: Vec::new(),
        }
    }

    /// Builder: display name
    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = full_name.into();
        self
    }

    /// Builder: mark as a non-game system
    pub fn non_game(mut self) -> Self {
        self.is_game_system = false;
        self
    }

    /// All games of the system, subfolders flattened, in scan order
    pub fn games_recursive(&self) -> &[GameId] {
        &self.games
    }
}

/// Owner of every game record and system library
#[derive(Debug, Default)]
pub struct GameStore {
    games: Vec<Option<Game>>,
    systems: Vec<SystemLibrary>,
    by_path: HashMap<String, GameId>,
}

impl GameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a system library. A system with the same name is replaced
    /// but keeps its games.
    pub fn add_system(&mut self, system: SystemLibrary) {
        match self.systems.iter_mut().find(|s| s.name == system.name) {
            Some(existing) => {
                let games = std::mem::take(&mut existing.games);
                *existing = system;
                existing.games = games;
            }
            None => self.systems.push(system),
        }
    }

    /// Insert a game into its system. Inserting a path that already exists
    /// replaces the record in place and returns the existing id.
    pub fn insert(&mut self, game: Game) -> GameId {
        if let Some(&id) = self.by_path.get(&game.path) {
            self.games[id.0] = Some(game);
            return id;
        }

        if !self.systems.iter().any(|s| s.name == game.system) {
            self.systems
                .push(SystemLibrary::new(game.system.clone(), PathBuf::new()));
        }

        let id = GameId(self.games.len());
        self.by_path.insert(game.path.clone(), id);
        if let Some(system) = self.systems.iter_mut().find(|s| s.name == game.system) {
            system.games.push(id);
        }
        self.games.push(Some(game));
        id
    }

    /// Remove a record; its id is never reused
    pub fn remove(&mut self, id: GameId) -> Option<Game> {
        let game = self.games.get_mut(id.0)?.take()?;
        self.by_path.remove(&game.path);
        if let Some(system) = self.systems.iter_mut().find(|s| s.name == game.system) {
            system.games.retain(|g| *g != id);
        }
        Some(game)
    }

    pub fn get(&self, id: GameId) -> Option<&Game> {
        self.games.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: GameId) -> Option<&mut Game> {
        self.games.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Look up a record by canonical path
    pub fn find_by_path(&self, path: &str) -> Option<GameId> {
        self.by_path.get(path).copied()
    }

    pub fn systems(&self) -> &[SystemLibrary] {
        &self.systems
    }

    pub fn system(&self, name: &str) -> Option<&SystemLibrary> {
        self.systems.iter().find(|s| s.name == name)
    }

    /// The library owning a game
    pub fn system_of(&self, id: GameId) -> Option<&SystemLibrary> {
        self.get(id).and_then(|g| self.system(&g.system))
    }

    /// Every live game, in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (GameId, &Game)> {
        self.games
            .iter()
            .enumerate()
            .filter_map(|(i, g)| g.as_ref().map(|g| (GameId(i), g)))
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// Pick one of the given games uniformly at random
    pub fn random_member(&self, ids: &[GameId]) -> Option<GameId> {
        let live: Vec<GameId> = ids.iter().copied().filter(|id| self.get(*id).is_some()).collect();
        live.choose(&mut rand::thread_rng()).copied()
    }
}
