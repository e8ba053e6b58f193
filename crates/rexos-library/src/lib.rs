//! Game library and virtual collections for RexOS
//!
//! Scans ROM directories into a [`GameStore`], persists metadata and play
//! statistics in SQLite, and derives collections (All Games, Favorites,
//! Last Played, custom) from the store.

pub mod collections;
mod database;
mod index;
mod metadata;
mod scanner;
mod sort;
mod store;
mod theme;

pub use collections::{
    Bundle, Catalog, Collection, CollectionDecl, CollectionEntry, CollectionEvent, CollectionKind,
    CollectionManager, EditSession, MembershipStore, ToggleOutcome,
};
pub use database::{GameDatabase, GameStats};
pub use index::{FilterIndex, FilterQuery, FilterType};
pub use metadata::{FolderMetadata, GameMetadata};
pub use scanner::{RomScanner, ScanConfig, ScanResult};
pub use sort::{SortField, SortKey};
pub use store::{Game, GameId, GameStore, SystemLibrary};
pub use theme::ThemeFolders;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Scan error: {0}")]
    ScanError(String),

    #[error("Game not found: {0}")]
    GameNotFound(GameId),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
