//! Change notifications for the UI

use crate::store::GameId;

/// What changed in a collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionEvent {
    /// Fields of a member (or of the collection itself) changed in place
    MetadataChanged {
        collection: String,
        game: Option<GameId>,
    },
    /// Membership or order changed; the list should be redrawn
    Sorted { collection: String },
    /// A member left the collection
    Removed { collection: String, game: GameId },
}

impl CollectionEvent {
    /// Collection the event is addressed to
    pub fn collection(&self) -> &str {
        match self {
            CollectionEvent::MetadataChanged { collection, .. }
            | CollectionEvent::Sorted { collection }
            | CollectionEvent::Removed { collection, .. } => collection,
        }
    }
}
