//! Collection declarations and custom collection bookkeeping

use super::bundle::system_catalogs;
use super::collection::Collection;
use super::decl::CollectionDecl;
use super::membership::MembershipStore;
use super::CollectionManager;
use crate::LibraryError;
use crate::store::GameStore;
use std::fs;
use std::path::Path;

const DEFAULT_NAME: &str = "New Collection";

/// Names of the custom collections persisted in `dir`, sorted.
///
/// A missing directory yields no collections.
pub fn discover_custom_declarations(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Cannot read collections directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut names = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        match MembershipStore::collection_name(filename) {
            Some(name) => names.push(name.to_string()),
            None => tracing::info!("Ignoring {} in collections directory", filename),
        }
    }
    names.sort();
    names
}

/// Keep the characters allowed in a collection name
fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '[' | ']' | '(' | ')' | ' '))
        .collect::<String>()
        .trim()
        .to_string()
}

impl CollectionManager {
    /// Register a declaration unless one with the same name exists
    pub fn register_declaration(&mut self, decl: CollectionDecl) -> bool {
        if self.decls.contains_key(&decl.name) {
            return false;
        }
        self.decls.insert(decl.name.clone(), decl);
        true
    }

    pub fn lookup(&self, name: &str) -> Option<&CollectionDecl> {
        self.decls.get(name)
    }

    /// Create the runtime state of a custom collection (unpopulated)
    pub fn add_custom_collection(&mut self, name: &str) -> &Collection {
        let decl = CollectionDecl::custom(name);
        self.register_declaration(decl.clone());
        self.custom
            .entry(name.to_string())
            .or_insert_with(|| Collection::new(decl))
    }

    /// A valid collection name, derived from user input, that clashes with
    /// no system, theme folder or collection
    pub fn generate_unique_name(&self, raw: &str, store: &GameStore) -> String {
        let mut name = sanitize(raw);
        if name.is_empty() {
            name = DEFAULT_NAME.to_string();
        }

        // only the counter appended here is ever replaced
        let base = name.clone();
        let mut counter: u64 = 0;
        while self.name_taken(&name, store) {
            counter += 1;
            name = format!("{} ({})", base, counter);
        }

        if name != raw {
            tracing::info!("Collection name {:?} changed to {:?}", raw, name);
        }
        name
    }

    fn name_taken(&self, name: &str, store: &GameStore) -> bool {
        store
            .systems()
            .iter()
            .any(|s| s.name == name || s.theme_folder == name)
            || CollectionDecl::builtins()
                .iter()
                .any(|d| d.theme_folder == name)
            || self.custom.values().any(|c| c.decl().theme_folder == name)
            || self.decls.contains_key(name)
    }

    /// Create, enable and persist a new empty custom collection.
    /// Returns the name it was created under.
    pub fn create_custom_collection(
        &mut self,
        raw: &str,
        store: &GameStore,
    ) -> Result<String, LibraryError> {
        let name = self.generate_unique_name(raw, store);
        self.membership.save::<&str>(&name, &[])?;
        self.add_custom_collection(&name);
        if let Some(collection) = self.custom.get_mut(&name) {
            collection.populated = true;
            collection.refresh_folder_metadata(store);
        }
        self.set_enabled(&name, true)?;
        tracing::info!("Created collection {}", name);
        Ok(name)
    }

    /// Enable or disable a collection and update the enabled lists.
    ///
    /// Takes effect in the display list on the next rebuild.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<(), LibraryError> {
        let collection = self
            .collection_mut(name)
            .ok_or_else(|| LibraryError::CollectionNotFound(name.to_string()))?;
        collection.enabled = enabled;

        let auto: Vec<&str> = self
            .auto
            .values()
            .filter(|c| c.enabled)
            .map(|c| c.name())
            .collect();
        let custom: Vec<&str> = self
            .custom
            .values()
            .filter(|c| c.enabled)
            .map(|c| c.name())
            .collect();
        self.config.set_enabled_auto(auto);
        self.config.set_enabled_custom(custom);
        Ok(())
    }

    /// Register everything and build the display list.
    ///
    /// Call once the store holds the scanned systems.
    pub fn load_collection_systems(&mut self, store: &GameStore) -> Result<(), LibraryError> {
        for decl in CollectionDecl::builtins() {
            if !decl.is_custom() {
                self.auto
                    .entry(decl.name.clone())
                    .or_insert_with(|| Collection::new(decl.clone()));
            }
            self.register_declaration(decl);
        }

        let builtins = CollectionDecl::builtins();
        for name in discover_custom_declarations(self.membership.dir()) {
            if builtins.iter().any(|d| d.name == name) {
                tracing::warn!("Ignoring custom collection {}: the name is reserved", name);
                continue;
            }
            self.add_custom_collection(&name);
        }
        tracing::info!(
            "Found {} custom collections in {}",
            self.custom.len(),
            self.membership.dir().display()
        );

        self.load_enabled_from_config();
        if self.config.nothing_enabled() {
            self.display = system_catalogs(store);
            return Ok(());
        }
        self.rebuild_display_list(store)
    }

    fn load_enabled_from_config(&mut self) {
        for name in self.config.enabled_auto() {
            match self.auto.get_mut(&name) {
                Some(collection) => collection.enabled = true,
                None => tracing::info!("Unknown automatic collection {} in settings", name),
            }
        }
        for name in self.config.enabled_custom() {
            match self.custom.get_mut(&name) {
                Some(collection) => collection.enabled = true,
                None => tracing::info!("Enabled collection {} has no membership file", name),
            }
        }
    }

    /// Names of all automatic collections
    pub fn auto_names(&self) -> Vec<&str> {
        self.auto.keys().map(String::as_str).collect()
    }

    /// Names of all custom collections
    pub fn custom_names(&self) -> Vec<&str> {
        self.custom.keys().map(String::as_str).collect()
    }
}
