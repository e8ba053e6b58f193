//! Display list and the "collections" bundle

use super::collection::Collection;
use super::decl::{CUSTOM_COLLECTIONS_NAME, CollectionDecl};
use super::edit::EditSession;
use super::populate::{populate_automatic, populate_custom};
use super::CollectionManager;
use crate::LibraryError;
use crate::index::{FilterIndex, FilterQuery};
use crate::store::{GameId, GameStore};
use std::collections::{BTreeSet, HashMap};

/// Custom collections shown together under one catalog.
///
/// Members stay owned by the manager; the bundle only knows their names and
/// keeps a merged index of their games.
#[derive(Debug, Clone)]
pub struct Bundle {
    decl: CollectionDecl,
    members: Vec<String>,
    pub(crate) index: FilterIndex,
}

impl Bundle {
    pub(crate) fn new() -> Self {
        let decl = CollectionDecl::builtins()
            .into_iter()
            .find(|d| d.name == CUSTOM_COLLECTIONS_NAME)
            .unwrap_or_else(|| CollectionDecl::custom(CUSTOM_COLLECTIONS_NAME));
        Self {
            decl,
            members: Vec::new(),
            index: FilterIndex::new(),
        }
    }

    pub fn decl(&self) -> &CollectionDecl {
        &self.decl
    }

    /// Names of the grafted collections, in graft order
    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn contains(&self, collection: &str) -> bool {
        self.members.iter().any(|m| m == collection)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Merged index over every grafted collection
    pub fn index(&self) -> &FilterIndex {
        &self.index
    }

    pub fn query(&self, query: &FilterQuery) -> BTreeSet<GameId> {
        self.index.query(query)
    }

    pub(crate) fn graft(&mut self, collection: &Collection) {
        self.members.push(collection.name().to_string());
        self.index.import(collection.index());
    }

    pub(crate) fn clear(&mut self) {
        self.members.clear();
        self.index.clear();
    }
}

/// One entry of the top-level list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Catalog {
    System(String),
    Collection(String),
    Bundle,
}

impl CollectionManager {
    /// Recompose the top-level list from the systems and enabled collections
    pub fn rebuild_display_list(&mut self, store: &GameStore) -> Result<(), LibraryError> {
        self.bundle.clear();
        let mut list = system_catalogs(store);

        let enabled: Vec<String> = self
            .custom
            .values()
            .filter(|c| c.enabled)
            .map(|c| c.name().to_string())
            .collect();
        let mut by_path: Option<HashMap<String, GameId>> = None;

        for name in enabled {
            if self.custom.get(&name).is_some_and(|c| !c.populated) {
                if by_path.is_none() {
                    by_path = Some(self.all_games_map(store));
                }
                if let (Some(map), Some(collection)) = (&by_path, self.custom.get_mut(&name)) {
                    populate_custom(collection, store, &self.membership, map);
                }
            }
            let Some(collection) = self.custom.get(&name) else {
                continue;
            };
            let themed = self.themes.contains(&collection.decl().theme_folder);
            if themed || !self.config.use_custom_collections_system {
                list.push(Catalog::Collection(name));
            } else {
                self.bundle.graft(collection);
            }
        }

        if !self.bundle.is_empty() {
            list.push(Catalog::Bundle);
        }

        if self.config.sort_all_systems {
            list.sort_by_cached_key(|c| self.display_name(c, store).to_lowercase());
            let pinned = &self.config.pinned_system;
            if let Some(position) = list
                .iter()
                .position(|c| matches!(c, Catalog::System(s) if s == pinned))
            {
                let system = list.remove(position);
                list.push(system);
            }
        }

        for collection in self.auto.values_mut() {
            if !collection.enabled {
                continue;
            }
            if !collection.populated {
                populate_automatic(collection, store);
            }
            list.push(Catalog::Collection(collection.name().to_string()));
        }

        tracing::info!(
            "Display list rebuilt: {} catalogs, {} collections bundled",
            list.len(),
            self.bundle.members().len()
        );
        self.display = list;

        let edited_disabled = match &self.edit {
            EditSession::Custom(name) => !self.custom.get(name).is_some_and(|c| c.enabled),
            EditSession::Favorites => false,
        };
        if edited_disabled {
            tracing::info!("Edited collection was disabled, leaving edit mode");
            self.exit_edit_mode(store)?;
        }
        Ok(())
    }

    /// The top-level list, systems and collections in display order
    pub fn display_list(&self) -> &[Catalog] {
        &self.display
    }

    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    /// Games of every grafted collection, grouped by collection
    pub fn bundle_games(&self) -> Vec<GameId> {
        self.bundle
            .members()
            .iter()
            .filter_map(|name| self.custom.get(name))
            .flat_map(|c| c.games())
            .collect()
    }

    /// Name a catalog is shown under
    pub fn display_name(&self, catalog: &Catalog, store: &GameStore) -> String {
        match catalog {
            Catalog::System(name) => store
                .system(name)
                .map(|s| s.full_name.clone())
                .unwrap_or_else(|| name.clone()),
            Catalog::Collection(name) => self
                .get(name)
                .map(|c| c.decl().display_name.clone())
                .unwrap_or_else(|| name.clone()),
            Catalog::Bundle => self.bundle.decl().display_name.clone(),
        }
    }
}

/// Systems that hold at least one game, in store order
pub(crate) fn system_catalogs(store: &GameStore) -> Vec<Catalog> {
    store
        .systems()
        .iter()
        .filter(|s| !s.games_recursive().is_empty())
        .map(|s| Catalog::System(s.name.clone()))
        .collect()
}
