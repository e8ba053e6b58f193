//! Collection declarations
//!
//! What a collection is (kind, names, default order, theme folder) as opposed
//! to what it currently holds. Per-kind membership rules live on
//! [`CollectionKind`] so a new automatic kind is added in one place.

use crate::sort::{SortField, SortKey};
use crate::store::{Game, SystemLibrary};

/// Most recent games kept in Last Played
pub const LAST_PLAYED_MAX: usize = 50;

/// Name of the declaration every custom collection derives from, also used
/// by the "My Collections" bundle
pub const CUSTOM_COLLECTIONS_NAME: &str = "collections";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    AllGames,
    LastPlayed,
    Favorites,
    Custom,
}

impl CollectionKind {
    pub fn is_custom(&self) -> bool {
        matches!(self, CollectionKind::Custom)
    }

    /// Membership rule used when an automatic collection is built
    pub fn includes(&self, game: &Game, system: &SystemLibrary) -> bool {
        match self {
            CollectionKind::AllGames => include_in_auto(game, system),
            CollectionKind::LastPlayed => include_in_auto(game, system) && game.play_count > 0,
            // anything can be a favorite, tools included
            CollectionKind::Favorites => game.favorite,
            CollectionKind::Custom => false,
        }
    }

    /// Whether a changed game that is not a member joins the collection
    pub fn admits_on_change(&self, game: &Game, system: &SystemLibrary) -> bool {
        match self {
            CollectionKind::LastPlayed | CollectionKind::Favorites => self.includes(game, system),
            CollectionKind::AllGames | CollectionKind::Custom => false,
        }
    }

    /// Whether a member leaves the collection after its game changed
    pub fn evicts_on_change(&self, game: &Game) -> bool {
        match self {
            CollectionKind::Favorites => !game.favorite,
            _ => false,
        }
    }

    /// Maximum number of members, if bounded
    pub fn trim_limit(&self) -> Option<usize> {
        match self {
            CollectionKind::LastPlayed => Some(LAST_PLAYED_MAX),
            _ => None,
        }
    }
}

/// Base rule for automatic collections: real games of game systems only
pub fn include_in_auto(game: &Game, system: &SystemLibrary) -> bool {
    !game.auto_excluded && system.is_game_system
}

/// Immutable descriptor of a collection
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionDecl {
    pub kind: CollectionKind,
    pub name: String,
    pub display_name: String,
    pub default_sort: SortKey,
    pub theme_folder: String,
}

impl CollectionDecl {
    fn new(
        kind: CollectionKind,
        name: &str,
        display_name: &str,
        default_sort: SortKey,
        theme_folder: &str,
    ) -> Self {
        Self {
            kind,
            name: name.to_string(),
            display_name: display_name.to_string(),
            default_sort,
            theme_folder: theme_folder.to_string(),
        }
    }

    /// The built-in declarations
    pub fn builtins() -> Vec<CollectionDecl> {
        let by_name = SortKey::new(SortField::Name, true);
        vec![
            Self::new(CollectionKind::AllGames, "all", "all games", by_name, "auto-allgames"),
            Self::new(
                CollectionKind::LastPlayed,
                "recent",
                "last played",
                SortKey::new(SortField::LastPlayed, false),
                "auto-lastplayed",
            ),
            Self::new(CollectionKind::Favorites, "favorites", "favorites", by_name, "auto-favorites"),
            Self::new(
                CollectionKind::Custom,
                CUSTOM_COLLECTIONS_NAME,
                "collections",
                by_name,
                "custom-collections",
            ),
        ]
    }

    /// Declaration of a user collection, themed by its own name
    pub fn custom(name: &str) -> Self {
        Self::new(
            CollectionKind::Custom,
            name,
            name,
            SortKey::new(SortField::Name, true),
            name,
        )
    }

    pub fn is_custom(&self) -> bool {
        self.kind.is_custom()
    }
}
