//! Edit session: where a toggle lands

use super::events::CollectionEvent;
use super::{CollectionManager, emit};
use crate::LibraryError;
use crate::store::{GameId, GameStore};

/// Target of [`CollectionManager::toggle_membership`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditSession {
    /// Toggling flips the favorite flag
    #[default]
    Favorites,
    /// Toggling adds to or removes from a custom collection
    Custom(String),
}

impl EditSession {
    pub fn is_editing(&self) -> bool {
        matches!(self, EditSession::Custom(_))
    }

    /// Name of the collection being edited
    pub fn collection(&self) -> Option<&str> {
        match self {
            EditSession::Custom(name) => Some(name),
            EditSession::Favorites => None,
        }
    }
}

/// Result of a toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added { collection: String },
    Removed { collection: String },
}

impl ToggleOutcome {
    pub fn collection(&self) -> &str {
        match self {
            ToggleOutcome::Added { collection } | ToggleOutcome::Removed { collection } => collection,
        }
    }
}

impl CollectionManager {
    /// Start editing a custom collection, leaving any previous session first
    pub fn set_edit_mode(&mut self, name: &str, store: &GameStore) -> Result<(), LibraryError> {
        if !self.custom.contains_key(name) {
            return Err(LibraryError::CollectionNotFound(name.to_string()));
        }
        if self.edit.collection() == Some(name) {
            return Ok(());
        }
        self.exit_edit_mode(store)?;
        self.ensure_populated(name, store)?;
        self.edit = EditSession::Custom(name.to_string());
        tracing::info!("Editing collection {}", name);
        Ok(())
    }

    /// Stop editing, saving the edited collection if it changed
    pub fn exit_edit_mode(&mut self, store: &GameStore) -> Result<(), LibraryError> {
        let EditSession::Custom(name) = std::mem::take(&mut self.edit) else {
            return Ok(());
        };
        tracing::info!("Finished editing collection {}", name);
        if self.custom.get(&name).is_some_and(|c| c.needs_persist) {
            self.save_custom(&name, store)?;
        }
        Ok(())
    }

    /// Toggle a game in the current edit target
    pub fn toggle_membership(
        &mut self,
        store: &mut GameStore,
        id: GameId,
    ) -> Result<ToggleOutcome, LibraryError> {
        match self.edit.clone() {
            EditSession::Custom(name) => self.toggle_custom(&name, store, id),
            EditSession::Favorites => {
                let game = store.get_mut(id).ok_or(LibraryError::GameNotFound(id))?;
                game.favorite = !game.favorite;
                let favorite = game.favorite;
                tracing::debug!("{} favorite: {}", game.name, favorite);
                self.on_game_changed(store, id);

                let collection = "favorites".to_string();
                Ok(if favorite {
                    ToggleOutcome::Added { collection }
                } else {
                    ToggleOutcome::Removed { collection }
                })
            }
        }
    }

    fn toggle_custom(
        &mut self,
        name: &str,
        store: &GameStore,
        id: GameId,
    ) -> Result<ToggleOutcome, LibraryError> {
        let game = store.get(id).ok_or(LibraryError::GameNotFound(id))?;
        let grafted = self.bundle.contains(name);
        let collection = self
            .custom
            .get_mut(name)
            .ok_or_else(|| LibraryError::CollectionNotFound(name.to_string()))?;

        let outcome = if collection.remove(id) {
            if grafted {
                self.bundle.index.remove(id);
            }
            emit(
                &self.events,
                CollectionEvent::Removed {
                    collection: name.to_string(),
                    game: id,
                },
            );
            tracing::info!("Removed {} from {}", game.name, name);
            ToggleOutcome::Removed {
                collection: name.to_string(),
            }
        } else {
            collection.push(id, game);
            collection.sort(store);
            if grafted {
                self.bundle.index.add(id, game);
            }
            emit(
                &self.events,
                CollectionEvent::Sorted {
                    collection: name.to_string(),
                },
            );
            tracing::info!("Added {} to {}", game.name, name);
            ToggleOutcome::Added {
                collection: name.to_string(),
            }
        };

        collection.needs_persist = true;
        collection.refresh_folder_metadata(store);
        emit(
            &self.events,
            CollectionEvent::MetadataChanged {
                collection: name.to_string(),
                game: None,
            },
        );
        Ok(outcome)
    }
}
