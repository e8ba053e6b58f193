//! Runtime state of one collection

use super::decl::CollectionDecl;
use crate::index::{FilterIndex, FilterQuery};
use crate::metadata::FolderMetadata;
use crate::store::{Game, GameId, GameStore};
use std::collections::BTreeSet;

/// A member of a collection: a key into the store plus its owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionEntry {
    pub game: GameId,
    pub collection: String,
}

/// Declaration, ordered members, filter index and state flags
#[derive(Debug, Clone)]
pub struct Collection {
    decl: CollectionDecl,
    entries: Vec<CollectionEntry>,
    index: FilterIndex,
    folder: FolderMetadata,
    pub(crate) enabled: bool,
    pub(crate) populated: bool,
    pub(crate) needs_persist: bool,
}

impl Collection {
    pub fn new(decl: CollectionDecl) -> Self {
        Self {
            decl,
            entries: Vec::new(),
            index: FilterIndex::new(),
            folder: FolderMetadata::default(),
            enabled: false,
            populated: false,
            needs_persist: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn decl(&self) -> &CollectionDecl {
        &self.decl
    }

    pub fn entries(&self) -> &[CollectionEntry] {
        &self.entries
    }

    /// Member ids in display order
    pub fn games(&self) -> Vec<GameId> {
        self.entries.iter().map(|e| e.game).collect()
    }

    pub fn contains(&self, id: GameId) -> bool {
        self.index.contains(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> &FilterIndex {
        &self.index
    }

    /// Members matching an attribute query
    pub fn query(&self, query: &FilterQuery) -> BTreeSet<GameId> {
        self.index.query(query)
    }

    pub fn folder_metadata(&self) -> &FolderMetadata {
        &self.folder
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_populated(&self) -> bool {
        self.populated
    }

    pub fn needs_persist(&self) -> bool {
        self.needs_persist
    }

    /// Append a member. Returns false if it was already there.
    pub(crate) fn push(&mut self, id: GameId, game: &Game) -> bool {
        if self.index.contains(id) {
            return false;
        }
        self.entries.push(CollectionEntry {
            game: id,
            collection: self.decl.name.clone(),
        });
        self.index.add(id, game);
        true
    }

    /// Drop a member. Returns false if it was not there.
    pub(crate) fn remove(&mut self, id: GameId) -> bool {
        let Some(position) = self.entries.iter().position(|e| e.game == id) else {
            return false;
        };
        self.entries.remove(position);
        self.index.remove(id);
        true
    }

    pub(crate) fn reindex(&mut self, id: GameId, game: &Game) {
        self.index.reindex(id, game);
    }

    /// Re-apply the default order. Returns true if the order changed.
    pub(crate) fn sort(&mut self, store: &GameStore) -> bool {
        let before = self.games();
        let key = self.decl.default_sort;
        self.entries
            .sort_by(|a, b| key.compare_ids(a.game, b.game, store));
        self.entries.iter().map(|e| e.game).ne(before)
    }

    /// Cut the collection down to its kind's limit, dropping from the end.
    /// Returns the ids that left.
    pub(crate) fn trim(&mut self) -> Vec<GameId> {
        let Some(limit) = self.decl.kind.trim_limit() else {
            return Vec::new();
        };
        if self.entries.len() <= limit {
            return Vec::new();
        }
        let dropped: Vec<GameId> = self.entries.drain(limit..).map(|e| e.game).collect();
        for id in &dropped {
            self.index.remove(*id);
        }
        dropped
    }

    /// Recompute the collection-level summary from current members
    pub(crate) fn refresh_folder_metadata(&mut self, store: &GameStore) {
        let ids = self.games();
        let games: Vec<&Game> = ids.iter().filter_map(|id| store.get(*id)).collect();
        let preview = store.random_member(&ids).and_then(|id| store.get(id));
        self.folder = FolderMetadata::summarize(&games, preview);
    }
}
