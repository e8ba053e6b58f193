//! Sort orders for game lists
//!
//! Sort keys are written the way gamelist settings spell them,
//! e.g. `"filename, ascending"` or `"last played, descending"`.

use crate::store::{Game, GameId, GameStore};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Field a list is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Rating,
    TimesPlayed,
    LastPlayed,
    Players,
    ReleaseDate,
    Developer,
    Genre,
    System,
}

impl SortField {
    fn label(&self) -> &'static str {
        match self {
            SortField::Name => "filename",
            SortField::Rating => "rating",
            SortField::TimesPlayed => "times played",
            SortField::LastPlayed => "last played",
            SortField::Players => "number players",
            SortField::ReleaseDate => "release date",
            SortField::Developer => "developer",
            SortField::Genre => "genre",
            SortField::System => "system",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        let field = match label {
            "filename" | "name" => SortField::Name,
            "rating" => SortField::Rating,
            "times played" => SortField::TimesPlayed,
            "last played" => SortField::LastPlayed,
            "number players" | "players" => SortField::Players,
            "release date" => SortField::ReleaseDate,
            "developer" => SortField::Developer,
            "genre" => SortField::Genre,
            "system" => SortField::System,
            _ => return None,
        };
        Some(field)
    }

    fn compare(&self, a: &Game, b: &Game) -> Ordering {
        match self {
            SortField::Name => compare_text(&a.name, &b.name),
            SortField::Rating => a
                .rating
                .unwrap_or(0.0)
                .total_cmp(&b.rating.unwrap_or(0.0)),
            SortField::TimesPlayed => a.play_count.cmp(&b.play_count),
            SortField::LastPlayed => a.last_played.cmp(&b.last_played),
            SortField::Players => a.players.unwrap_or(1).cmp(&b.players.unwrap_or(1)),
            SortField::ReleaseDate => a.release_date.cmp(&b.release_date),
            SortField::Developer => compare_text(
                a.developer.as_deref().unwrap_or(""),
                b.developer.as_deref().unwrap_or(""),
            ),
            SortField::Genre => compare_text(
                a.genre.as_deref().unwrap_or(""),
                b.genre.as_deref().unwrap_or(""),
            ),
            SortField::System => compare_text(&a.system, &b.system),
        }
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// A field plus a direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub ascending: bool,
}

impl SortKey {
    pub const fn new(field: SortField, ascending: bool) -> Self {
        Self { field, ascending }
    }

    /// Compare two records. Ties fall back to name then path so the order
    /// is total and stable across rebuilds.
    pub fn compare(&self, a: &Game, b: &Game) -> Ordering {
        let primary = self.field.compare(a, b);
        let primary = if self.ascending { primary } else { primary.reverse() };
        primary
            .then_with(|| compare_text(&a.name, &b.name))
            .then_with(|| a.path.cmp(&b.path))
    }

    /// Compare two ids by their records. Ids with no live record go last.
    pub fn compare_ids(&self, a: GameId, b: GameId, store: &GameStore) -> Ordering {
        match (store.get(a), store.get(b)) {
            (Some(ga), Some(gb)) => self.compare(ga, gb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(&b),
        }
    }

    pub fn sort(&self, ids: &mut [GameId], store: &GameStore) {
        ids.sort_by(|a, b| self.compare_ids(*a, *b, store));
    }
}

impl Default for SortKey {
    fn default() -> Self {
        Self::new(SortField::Name, true)
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.ascending { "ascending" } else { "descending" };
        write!(f, "{}, {}", self.field.label(), direction)
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = s
            .split_once(',')
            .ok_or_else(|| format!("Invalid sort key: {}", s))?;
        let field = SortField::from_label(field.trim().to_lowercase().as_str())
            .ok_or_else(|| format!("Unknown sort field: {}", field.trim()))?;
        let ascending = match direction.trim().to_lowercase().as_str() {
            "ascending" | "asc" => true,
            "descending" | "desc" => false,
            other => return Err(format!("Unknown sort direction: {}", other)),
        };
        Ok(Self { field, ascending })
    }
}
