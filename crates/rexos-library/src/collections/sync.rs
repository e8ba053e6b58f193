//! Keeping populated collections in step with the store

use super::bundle::Bundle;
use super::collection::Collection;
use super::events::CollectionEvent;
use super::{CollectionManager, emit};
use crate::LibraryError;
use crate::metadata::GameMetadata;
use crate::store::{Game, GameId, GameStore, SystemLibrary};
use std::sync::mpsc::Sender;

impl CollectionManager {
    /// Apply a change of a game record to every populated collection.
    ///
    /// Call after favorite, play statistics or metadata of the record
    /// changed in the store.
    pub fn on_game_changed(&mut self, store: &GameStore, id: GameId) {
        let (Some(game), Some(system)) = (store.get(id), store.system_of(id)) else {
            tracing::debug!("Ignoring change of unknown game {}", id);
            return;
        };

        let Self {
            auto,
            custom,
            bundle,
            events,
            ..
        } = self;
        for collection in auto.values_mut().chain(custom.values_mut()) {
            if collection.populated {
                sync_collection(collection, bundle, store, id, game, system, events);
            }
        }
    }

    /// Drop a game from every collection holding it. The record itself is
    /// left to the caller.
    pub fn on_game_deleted(&mut self, id: GameId) {
        let Self {
            auto,
            custom,
            bundle,
            events,
            ..
        } = self;
        for collection in auto.values_mut().chain(custom.values_mut()) {
            if !collection.populated || !collection.remove(id) {
                continue;
            }
            if bundle.contains(collection.name()) {
                bundle.index.remove(id);
            }
            if collection.decl().is_custom() {
                collection.needs_persist = true;
            }
            emit(
                events,
                CollectionEvent::Removed {
                    collection: collection.name().to_string(),
                    game: id,
                },
            );
        }
    }

    /// Apply a metadata edit to a record and propagate it
    pub fn edit_game(
        &mut self,
        store: &mut GameStore,
        id: GameId,
        metadata: &GameMetadata,
    ) -> Result<(), LibraryError> {
        let game = store.get_mut(id).ok_or(LibraryError::GameNotFound(id))?;
        metadata.apply_to(game);
        self.on_game_changed(store, id);
        Ok(())
    }
}

fn sync_collection(
    collection: &mut Collection,
    bundle: &mut Bundle,
    store: &GameStore,
    id: GameId,
    game: &Game,
    system: &SystemLibrary,
    events: &Sender<CollectionEvent>,
) {
    let kind = collection.decl().kind;
    let name = collection.name().to_string();
    let grafted = bundle.contains(&name);
    let mut membership_changed = false;
    let mut admitted = false;

    if collection.contains(id) {
        if kind.evicts_on_change(game) {
            collection.remove(id);
            if grafted {
                bundle.index.remove(id);
            }
            membership_changed = true;
            emit(
                events,
                CollectionEvent::Removed {
                    collection: name.clone(),
                    game: id,
                },
            );
        } else {
            collection.reindex(id, game);
            if grafted {
                bundle.index.reindex(id, game);
            }
            emit(
                events,
                CollectionEvent::MetadataChanged {
                    collection: name.clone(),
                    game: Some(id),
                },
            );
        }
    } else if kind.admits_on_change(game, system) {
        collection.push(id, game);
        if grafted {
            bundle.index.add(id, game);
        }
        membership_changed = true;
        admitted = true;
    } else {
        return;
    }

    let reordered = collection.sort(store);
    let dropped = collection.trim();
    for &gone in &dropped {
        if grafted {
            bundle.index.remove(gone);
        }
    }
    // admitted and cut again in one step: nothing visible changed
    if admitted && dropped == [id] {
        return;
    }
    for gone in dropped {
        membership_changed = true;
        emit(
            events,
            CollectionEvent::Removed {
                collection: name.clone(),
                game: gone,
            },
        );
    }

    if membership_changed || reordered {
        if kind.is_custom() {
            collection.needs_persist = true;
        }
        emit(events, CollectionEvent::Sorted { collection: name });
    }
}
