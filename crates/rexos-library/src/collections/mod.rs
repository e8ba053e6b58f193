//! Virtual game collections
//!
//! Secondary catalogs derived from the scanned systems: the automatic
//! All Games, Favorites and Last Played lists plus user-defined custom
//! collections. Collections reference records in the [`GameStore`] by id and
//! are kept in step with it through [`CollectionManager::on_game_changed`].
//!
//! Custom collections without a dedicated theme folder are grouped into one
//! "collections" bundle in the display list.

mod bundle;
mod collection;
mod decl;
mod edit;
mod events;
mod membership;
mod populate;
mod registry;
mod sync;

pub use bundle::{Bundle, Catalog};
pub use collection::{Collection, CollectionEntry};
pub use decl::{
    CUSTOM_COLLECTIONS_NAME, CollectionDecl, CollectionKind, LAST_PLAYED_MAX, include_in_auto,
};
pub use edit::{EditSession, ToggleOutcome};
pub use events::CollectionEvent;
pub use membership::MembershipStore;
pub use registry::discover_custom_declarations;

use crate::LibraryError;
use crate::store::GameStore;
use crate::theme::ThemeFolders;
use rexos_config::CollectionsConfig;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};

/// Owner of every collection and of the display list
pub struct CollectionManager {
    config: CollectionsConfig,
    themes: ThemeFolders,
    membership: MembershipStore,
    decls: BTreeMap<String, CollectionDecl>,
    auto: BTreeMap<String, Collection>,
    custom: BTreeMap<String, Collection>,
    bundle: Bundle,
    edit: EditSession,
    display: Vec<Catalog>,
    events: Sender<CollectionEvent>,
    receiver: Receiver<CollectionEvent>,
}

impl CollectionManager {
    pub fn new(config: CollectionsConfig, themes: ThemeFolders, membership: MembershipStore) -> Self {
        let (events, receiver) = mpsc::channel();
        Self {
            config,
            themes,
            membership,
            decls: BTreeMap::new(),
            auto: BTreeMap::new(),
            custom: BTreeMap::new(),
            bundle: Bundle::new(),
            edit: EditSession::default(),
            display: Vec::new(),
            events,
            receiver,
        }
    }

    /// Build a manager from settings: scans the active theme set and opens
    /// the collections directory (`<home>/.emulationstation/collections`
    /// unless overridden).
    pub fn from_config(config: CollectionsConfig, home: &Path) -> Result<Self, LibraryError> {
        let themes = ThemeFolders::scan(&config.themes_dir, &config.theme_set);
        let dir = config
            .collections_dir
            .clone()
            .unwrap_or_else(|| MembershipStore::default_dir(home));
        let membership = MembershipStore::new(dir, home)?;
        Ok(Self::new(config, themes, membership))
    }

    /// Current settings, including the enabled lists
    pub fn config(&self) -> &CollectionsConfig {
        &self.config
    }

    pub fn membership(&self) -> &MembershipStore {
        &self.membership
    }

    /// A collection by name, populated or not
    pub fn get(&self, name: &str) -> Option<&Collection> {
        self.auto.get(name).or_else(|| self.custom.get(name))
    }

    /// A collection by name, populating it first if needed
    pub fn collection(&mut self, name: &str, store: &GameStore) -> Result<&Collection, LibraryError> {
        self.ensure_populated(name, store)?;
        self.get(name)
            .ok_or_else(|| LibraryError::CollectionNotFound(name.to_string()))
    }

    pub fn auto_collections(&self) -> impl Iterator<Item = &Collection> {
        self.auto.values()
    }

    pub fn custom_collections(&self) -> impl Iterator<Item = &Collection> {
        self.custom.values()
    }

    pub fn edit_session(&self) -> &EditSession {
        &self.edit
    }

    /// Next pending notification, if any
    pub fn try_recv(&self) -> Option<CollectionEvent> {
        self.receiver.try_recv().ok()
    }

    /// Every pending notification
    pub fn drain_events(&self) -> Vec<CollectionEvent> {
        self.receiver.try_iter().collect()
    }

    /// Write a custom collection's members to its file
    pub fn save_custom(&mut self, name: &str, store: &GameStore) -> Result<(), LibraryError> {
        let collection = self
            .custom
            .get_mut(name)
            .ok_or_else(|| LibraryError::CollectionNotFound(name.to_string()))?;
        let paths: Vec<&str> = collection
            .entries()
            .iter()
            .filter_map(|e| store.get(e.game))
            .map(|g| g.path.as_str())
            .collect();
        self.membership.save(name, &paths)?;
        collection.needs_persist = false;
        Ok(())
    }

    /// Leave edit mode and flush every unsaved custom collection.
    ///
    /// Every collection is attempted; the first failure is returned.
    pub fn shutdown(&mut self, store: &GameStore) -> Result<(), LibraryError> {
        self.edit = EditSession::Favorites;
        let dirty: Vec<String> = self
            .custom
            .values()
            .filter(|c| c.populated && c.needs_persist)
            .map(|c| c.name().to_string())
            .collect();

        let mut first_error = None;
        for name in dirty {
            if let Err(e) = self.save_custom(&name, store) {
                tracing::warn!("Failed to save collection {}: {}", name, e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn collection_mut(&mut self, name: &str) -> Option<&mut Collection> {
        match self.auto.get_mut(name) {
            Some(collection) => Some(collection),
            None => self.custom.get_mut(name),
        }
    }
}

fn emit(events: &Sender<CollectionEvent>, event: CollectionEvent) {
    if events.send(event).is_err() {
        tracing::debug!("Collection event dropped, no receiver");
    }
}
