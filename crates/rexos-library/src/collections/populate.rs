//! Building collection membership

use super::collection::Collection;
use super::decl::{CollectionKind, include_in_auto};
use super::membership::MembershipStore;
use super::CollectionManager;
use crate::LibraryError;
use crate::store::{GameId, GameStore};
use std::collections::HashMap;

/// Fill an automatic collection from every system in the store
pub(crate) fn populate_automatic(collection: &mut Collection, store: &GameStore) {
    let kind = collection.decl().kind;
    for system in store.systems() {
        for &id in system.games_recursive() {
            if let Some(game) = store.get(id)
                && kind.includes(game, system)
            {
                collection.push(id, game);
            }
        }
    }
    collection.sort(store);
    collection.trim();
    collection.populated = true;
    tracing::debug!("Populated {} with {} games", collection.name(), collection.len());
}

/// Fill a custom collection from its membership file.
///
/// Lines are looked up in `by_path` first, then in the store, so members
/// kept out of All Games (tools, excluded records) survive a reload. Lines
/// neither resolves are skipped. A missing or unreadable file leaves the
/// collection empty.
pub(crate) fn populate_custom(
    collection: &mut Collection,
    store: &GameStore,
    membership: &MembershipStore,
    by_path: &HashMap<String, GameId>,
) {
    collection.populated = true;
    let name = collection.name().to_string();

    let lines = match membership.load(&name) {
        Ok(Some(lines)) => lines,
        Ok(None) => {
            tracing::info!("No membership file for collection {}, starting empty", name);
            Vec::new()
        }
        Err(e) => {
            tracing::warn!("Failed to read collection {}: {}", name, e);
            Vec::new()
        }
    };

    for path in lines {
        let found = by_path
            .get(&path)
            .copied()
            .or_else(|| store.find_by_path(&path));
        match found.and_then(|id| store.get(id).map(|g| (id, g))) {
            Some((id, game)) => {
                collection.push(id, game);
            }
            None => tracing::info!("Collection {}: {} not found, skipping", name, path),
        }
    }

    collection.sort(store);
    collection.refresh_folder_metadata(store);
    tracing::debug!("Populated {} with {} games", name, collection.len());
}

/// Path lookup over automatic-collection games; the first path wins
pub(crate) fn path_map(
    ids: impl IntoIterator<Item = GameId>,
    store: &GameStore,
) -> HashMap<String, GameId> {
    let mut map = HashMap::new();
    for id in ids {
        if let Some(game) = store.get(id) {
            map.entry(game.path.clone()).or_insert(id);
        }
    }
    map
}

impl CollectionManager {
    /// Canonical path lookup built from All Games
    pub(crate) fn all_games_map(&mut self, store: &GameStore) -> HashMap<String, GameId> {
        let all = self
            .auto
            .values_mut()
            .find(|c| c.decl().kind == CollectionKind::AllGames);
        match all {
            Some(all) => {
                if !all.populated {
                    populate_automatic(all, store);
                }
                path_map(all.games(), store)
            }
            None => {
                let ids = store.systems().iter().flat_map(|system| {
                    system
                        .games_recursive()
                        .iter()
                        .copied()
                        .filter(|id| store.get(*id).is_some_and(|g| include_in_auto(g, system)))
                });
                path_map(ids, store)
            }
        }
    }

    /// Populate a collection if it has not been yet
    pub(crate) fn ensure_populated(&mut self, name: &str, store: &GameStore) -> Result<(), LibraryError> {
        if let Some(collection) = self.auto.get_mut(name) {
            if !collection.populated {
                populate_automatic(collection, store);
            }
            return Ok(());
        }

        match self.custom.get(name) {
            Some(collection) if collection.populated => return Ok(()),
            Some(_) => {}
            None => return Err(LibraryError::CollectionNotFound(name.to_string())),
        }

        let by_path = self.all_games_map(store);
        if let Some(collection) = self.custom.get_mut(name) {
            populate_custom(collection, store, &self.membership, &by_path);
        }
        Ok(())
    }
}
