//! Attribute filter index
//!
//! Secondary index over a catalog's games answering "which games have genre X
//! and 2 players" without walking the records. Catalogs index their own
//! entries; the collections bundle imports the indexes of its members, so an
//! id can be referenced more than once and is reference counted.

use crate::store::{Game, GameId};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Attribute a game can be filtered on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterType {
    Favorite,
    Genre,
    Players,
    Developer,
    Rating,
    System,
}

impl FilterType {
    pub const ALL: [FilterType; 6] = [
        FilterType::Favorite,
        FilterType::Genre,
        FilterType::Players,
        FilterType::Developer,
        FilterType::Rating,
        FilterType::System,
    ];

    /// Indexed value of this attribute for a game
    pub fn value_of(&self, game: &Game) -> String {
        match self {
            FilterType::Favorite => game.favorite.to_string(),
            FilterType::Genre => text_or_unknown(game.genre.as_deref()),
            FilterType::Players => game
                .players
                .map(|p| p.to_string())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            FilterType::Developer => text_or_unknown(game.developer.as_deref()),
            // whole stars, 0-5
            FilterType::Rating => {
                let stars = (game.rating.unwrap_or(0.0).clamp(0.0, 1.0) * 5.0).round() as u8;
                stars.to_string()
            }
            FilterType::System => game.system.clone(),
        }
    }
}

const UNKNOWN: &str = "Unknown";

fn text_or_unknown(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

type FilterKey = (FilterType, String);

#[derive(Debug, Clone)]
struct IndexedEntry {
    keys: Vec<FilterKey>,
    refs: usize,
}

/// A conjunction of attribute filters; values of one attribute are alternatives
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    criteria: BTreeMap<FilterType, BTreeSet<String>>,
}

impl FilterQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an accepted value for an attribute
    pub fn with(mut self, filter: FilterType, value: impl Into<String>) -> Self {
        self.criteria.entry(filter).or_default().insert(value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

/// Secondary index of one catalog
#[derive(Debug, Clone, Default)]
pub struct FilterIndex {
    entries: HashMap<GameId, IndexedEntry>,
    by_value: HashMap<FilterKey, BTreeSet<GameId>>,
}

impl FilterIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a game, or take one more reference to it
    pub fn add(&mut self, id: GameId, game: &Game) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.refs += 1;
            return;
        }
        let keys = keys_for(game);
        self.insert_keys(id, &keys);
        self.entries.insert(id, IndexedEntry { keys, refs: 1 });
    }

    /// Drop one reference; the game leaves the index with its last reference
    pub fn remove(&mut self, id: GameId) {
        let Some(entry) = self.entries.get_mut(&id) else {
            return;
        };
        entry.refs -= 1;
        if entry.refs > 0 {
            return;
        }
        if let Some(entry) = self.entries.remove(&id) {
            self.remove_keys(id, &entry.keys);
        }
    }

    /// Refresh the indexed values of a game after its metadata changed
    pub fn reindex(&mut self, id: GameId, game: &Game) {
        let Some(old_keys) = self.entries.get(&id).map(|e| e.keys.clone()) else {
            return;
        };
        let keys = keys_for(game);
        if keys == old_keys {
            return;
        }
        self.remove_keys(id, &old_keys);
        self.insert_keys(id, &keys);
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.keys = keys;
        }
    }

    /// Merge another index into this one
    pub fn import(&mut self, other: &FilterIndex) {
        for (id, entry) in &other.entries {
            match self.entries.get_mut(id) {
                Some(existing) => existing.refs += entry.refs,
                None => {
                    self.insert_keys(*id, &entry.keys);
                    self.entries.insert(*id, entry.clone());
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_value.clear();
    }

    pub fn contains(&self, id: GameId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Games matching every attribute of the query (all games for an empty query)
    pub fn query(&self, query: &FilterQuery) -> BTreeSet<GameId> {
        let mut result: Option<BTreeSet<GameId>> = None;

        for (filter, values) in &query.criteria {
            let mut matching = BTreeSet::new();
            for value in values {
                if let Some(ids) = self.by_value.get(&(*filter, value.clone())) {
                    matching.extend(ids.iter().copied());
                }
            }
            result = Some(match result {
                Some(acc) => acc.intersection(&matching).copied().collect(),
                None => matching,
            });
        }

        result.unwrap_or_else(|| self.entries.keys().copied().collect())
    }

    /// Distinct values of an attribute with the number of games carrying each
    pub fn values(&self, filter: FilterType) -> BTreeMap<String, usize> {
        self.by_value
            .iter()
            .filter(|((f, _), _)| *f == filter)
            .map(|((_, value), ids)| (value.clone(), ids.len()))
            .collect()
    }

    fn insert_keys(&mut self, id: GameId, keys: &[FilterKey]) {
        for key in keys {
            self.by_value.entry(key.clone()).or_default().insert(id);
        }
    }

    fn remove_keys(&mut self, id: GameId, keys: &[FilterKey]) {
        for key in keys {
            if let Some(ids) = self.by_value.get_mut(key) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.by_value.remove(key);
                }
            }
        }
    }
}

fn keys_for(game: &Game) -> Vec<FilterKey> {
    FilterType::ALL
        .iter()
        .map(|f| (*f, f.value_of(game)))
        .collect()
}
