//! Game database using SQLite
//!
//! Persists what a scan cannot rediscover: user metadata (favorite, rating,
//! scraped fields) and play statistics, keyed by ROM path.

use crate::LibraryError;
use crate::store::{Game, GameStore};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};

/// Game statistics
#[derive(Debug, Clone, Default)]
pub struct GameStats {
    pub last_played: Option<String>,
    pub play_count: i32,
    pub play_time_seconds: i64,
}

/// Game database manager
pub struct GameDatabase {
    conn: Connection,
}

const SELECT_GAMES: &str = r#"SELECT g.*, s.last_played, COALESCE(s.play_count, 0) AS play_count
    FROM games g LEFT JOIN game_stats s ON g.id = s.game_id"#;

impl GameDatabase {
    /// Open or create a database
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LibraryError> {
        let conn = Connection::open(path)?;

        let db = Self { conn };
        db.init_schema()?;

        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self, LibraryError> {
        let conn = Connection::open_in_memory()?;

        let db = Self { conn };
        db.init_schema()?;

        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<(), LibraryError> {
        self.conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS games (
                id INTEGER PRIMARY KEY,
                path TEXT NOT NULL UNIQUE,
                system TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                release_date TEXT,
                developer TEXT,
                publisher TEXT,
                genre TEXT,
                players INTEGER,
                rating REAL,
                favorite INTEGER DEFAULT 0,
                hidden INTEGER DEFAULT 0,
                auto_excluded INTEGER DEFAULT 0,
                image TEXT,
                thumbnail TEXT,
                video TEXT,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS game_stats (
                game_id INTEGER PRIMARY KEY,
                last_played TEXT,
                play_count INTEGER DEFAULT 0,
                play_time_seconds INTEGER DEFAULT 0,
                FOREIGN KEY (game_id) REFERENCES games(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_games_system ON games(system);
            CREATE INDEX IF NOT EXISTS idx_games_favorite ON games(favorite);
            CREATE INDEX IF NOT EXISTS idx_game_stats_last_played ON game_stats(last_played);
        "#,
        )?;

        Ok(())
    }

    /// Insert a game, or update the stored metadata of an existing path
    pub fn save_game(&self, game: &Game) -> Result<i64, LibraryError> {
        let id = self.conn.query_row(
            r#"INSERT INTO games
               (path, system, name, description, release_date, developer, publisher,
                genre, players, rating, favorite, hidden, auto_excluded, image, thumbnail,
                video, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                       CURRENT_TIMESTAMP)
               ON CONFLICT(path) DO UPDATE SET
                   system = excluded.system,
                   name = excluded.name,
                   description = excluded.description,
                   release_date = excluded.release_date,
                   developer = excluded.developer,
                   publisher = excluded.publisher,
                   genre = excluded.genre,
                   players = excluded.players,
                   rating = excluded.rating,
                   favorite = excluded.favorite,
                   hidden = excluded.hidden,
                   auto_excluded = excluded.auto_excluded,
                   image = excluded.image,
                   thumbnail = excluded.thumbnail,
                   video = excluded.video,
                   updated_at = CURRENT_TIMESTAMP
               RETURNING id"#,
            params![
                game.path,
                game.system,
                game.name,
                game.description,
                game.release_date,
                game.developer,
                game.publisher,
                game.genre,
                game.players,
                game.rating,
                game.favorite,
                game.hidden,
                game.auto_excluded,
                path_text(&game.image),
                path_text(&game.thumbnail),
                path_text(&game.video),
            ],
            |row| row.get(0),
        )?;

        Ok(id)
    }

    /// Get a game by path
    pub fn get_game_by_path(&self, path: &str) -> Result<Option<Game>, LibraryError> {
        let game = self
            .conn
            .query_row(
                &format!("{} WHERE g.path = ?1", SELECT_GAMES),
                params![path],
                Self::row_to_game,
            )
            .optional()?;

        Ok(game)
    }

    /// Get all stored games, hidden ones included
    pub fn get_all_games(&self) -> Result<Vec<Game>, LibraryError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY g.path", SELECT_GAMES))?;

        let games = stmt
            .query_map([], Self::row_to_game)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(games)
    }

    /// Set game as favorite
    pub fn set_favorite(&self, path: &str, favorite: bool) -> Result<(), LibraryError> {
        let changed = self.conn.execute(
            "UPDATE games SET favorite = ?1, updated_at = CURRENT_TIMESTAMP WHERE path = ?2",
            params![favorite, path],
        )?;
        if changed == 0 {
            return Err(LibraryError::PathNotFound(PathBuf::from(path)));
        }
        Ok(())
    }

    /// Delete a game
    pub fn delete_game(&self, path: &str) -> Result<(), LibraryError> {
        self.conn
            .execute("DELETE FROM games WHERE path = ?1", params![path])?;
        Ok(())
    }

    /// Update game stats (when played)
    pub fn update_play_stats(&self, path: &str, play_time: i64) -> Result<GameStats, LibraryError> {
        let game_id: i64 = self
            .conn
            .query_row("SELECT id FROM games WHERE path = ?1", params![path], |row| {
                row.get(0)
            })
            .optional()?
            .ok_or_else(|| LibraryError::PathNotFound(PathBuf::from(path)))?;

        self.conn.execute(
            r#"INSERT INTO game_stats (game_id, last_played, play_count, play_time_seconds)
               VALUES (?1, strftime('%Y-%m-%d %H:%M:%f', 'now'), 1, ?2)
               ON CONFLICT(game_id) DO UPDATE SET
                   last_played = strftime('%Y-%m-%d %H:%M:%f', 'now'),
                   play_count = play_count + 1,
                   play_time_seconds = play_time_seconds + ?2"#,
            params![game_id, play_time],
        )?;

        self.get_stats(path)
    }

    /// Get game stats
    pub fn get_stats(&self, path: &str) -> Result<GameStats, LibraryError> {
        let stats = self.conn.query_row(
            r#"SELECT s.last_played, s.play_count, s.play_time_seconds
               FROM game_stats s JOIN games g ON g.id = s.game_id WHERE g.path = ?1"#,
            params![path],
            |row| Ok(GameStats {
                last_played: row.get(0)?,
                play_count: row.get(1)?,
                play_time_seconds: row.get(2)?,
            }),
        ).optional()?.unwrap_or_default();

        Ok(stats)
    }

    /// Get total game count
    pub fn game_count(&self) -> Result<i64, LibraryError> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM games WHERE hidden = 0", [], |row| {
                    row.get(0)
                })?;
        Ok(count)
    }

    /// Copy stored metadata and statistics onto freshly scanned records.
    ///
    /// Records without a stored row are inserted so later updates have a row
    /// to land on. Returns how many records were enriched.
    pub fn sync_store(&self, store: &mut GameStore) -> Result<usize, LibraryError> {
        let ids: Vec<_> = store.iter().map(|(id, _)| id).collect();
        let mut enriched = 0;

        for id in ids {
            let Some(game) = store.get_mut(id) else {
                continue;
            };
            match self.get_game_by_path(&game.path)? {
                Some(stored) => {
                    let system = std::mem::take(&mut game.system);
                    *game = Game { system, ..stored };
                    enriched += 1;
                }
                None => {
                    self.save_game(game)?;
                }
            }
        }

        tracing::debug!("Restored metadata for {} games", enriched);
        Ok(enriched)
    }

    /// Delete stored games whose path is no longer in the store.
    /// Returns how many were deleted.
    pub fn prune_missing(&self, store: &GameStore) -> Result<usize, LibraryError> {
        let mut pruned = 0;
        for game in self.get_all_games()? {
            if store.find_by_path(&game.path).is_none() {
                self.delete_game(&game.path)?;
                pruned += 1;
            }
        }
        if pruned > 0 {
            tracing::info!("Pruned {} games no longer on disk", pruned);
        }
        Ok(pruned)
    }

    /// Convert a row to a Game
    fn row_to_game(row: &rusqlite::Row) -> rusqlite::Result<Game> {
        Ok(Game {
            path: row.get("path")?,
            system: row.get("system")?,
            name: row.get("name")?,
            description: row.get("description")?,
            release_date: row.get("release_date")?,
            developer: row.get("developer")?,
            publisher: row.get("publisher")?,
            genre: row.get("genre")?,
            players: row.get("players")?,
            rating: row.get("rating")?,
            favorite: row.get("favorite")?,
            hidden: row.get("hidden")?,
            play_count: row.get("play_count")?,
            last_played: row.get("last_played")?,
            auto_excluded: row.get("auto_excluded")?,
            image: row.get::<_, Option<String>>("image")?.map(PathBuf::from),
            thumbnail: row.get::<_, Option<String>>("thumbnail")?.map(PathBuf::from),
            video: row.get::<_, Option<String>>("video")?.map(PathBuf::from),
        })
    }
}

fn path_text(path: &Option<PathBuf>) -> Option<String> {
    path.as_ref().map(|p| p.to_string_lossy().to_string())
}
