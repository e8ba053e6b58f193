//! Game metadata handling

use crate::store::Game;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A partial metadata update for a game
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
    pub release_date: Option<String>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub genre: Option<String>,
    pub players: Option<i32>,
    pub rating: Option<f32>,
    pub image: Option<PathBuf>,
    pub thumbnail: Option<PathBuf>,
    pub video: Option<PathBuf>,
}

impl GameMetadata {
    /// Create empty metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Write every field that is set onto a game record
    pub fn apply_to(&self, game: &mut Game) {
        if let Some(name) = &self.name {
            game.name = name.clone();
        }
        if self.description.is_some() {
            game.description = self.description.clone();
        }
        if self.release_date.is_some() {
            game.release_date = self.release_date.clone();
        }
        if self.developer.is_some() {
            game.developer = self.developer.clone();
        }
        if self.publisher.is_some() {
            game.publisher = self.publisher.clone();
        }
        if self.genre.is_some() {
            game.genre = self.genre.clone();
        }
        if self.players.is_some() {
            game.players = self.players;
        }
        if self.rating.is_some() {
            game.rating = self.rating;
        }
        if self.image.is_some() {
            game.image = self.image.clone();
        }
        if self.thumbnail.is_some() {
            game.thumbnail = self.thumbnail.clone();
        }
        if self.video.is_some() {
            game.video = self.video.clone();
        }
    }
}

pub const EMPTY_COLLECTION: &str = "This collection is empty.";
pub const NONE: &str = "None";
pub const VARIOUS: &str = "Various";

/// Summary shown for a collection as a whole
#[derive(Debug, Clone, PartialEq)]
pub struct FolderMetadata {
    pub description: String,
    /// Highest member rating
    pub rating: f32,
    /// Highest member player count
    pub players: i32,
    /// Earliest member release date
    pub release_date: Option<String>,
    pub developer: String,
    pub genre: String,
    pub video: Option<PathBuf>,
    pub thumbnail: Option<PathBuf>,
    pub image: Option<PathBuf>,
}

impl Default for FolderMetadata {
    fn default() -> Self {
        Self {
            description: EMPTY_COLLECTION.to_string(),
            rating: 0.0,
            players: 1,
            release_date: None,
            developer: NONE.to_string(),
            genre: NONE.to_string(),
            video: None,
            thumbnail: None,
            image: None,
        }
    }
}

impl FolderMetadata {
    /// Aggregate member metadata. `preview` supplies the media paths.
    pub fn summarize(games: &[&Game], preview: Option<&Game>) -> Self {
        let mut folder = Self::default();
        if games.is_empty() {
            return folder;
        }

        let mut titles: Vec<String> = Vec::new();
        let mut developer: Option<&str> = None;
        let mut genre: Option<&str> = None;

        for game in games {
            if let Some(rating) = game.rating
                && rating > folder.rating
            {
                folder.rating = rating;
            }
            if let Some(players) = game.players
                && players > folder.players
            {
                folder.players = players;
            }
            if let Some(date) = game.release_date.as_deref().filter(|d| !d.is_empty())
                && folder.release_date.as_deref().is_none_or(|current| date < current)
            {
                folder.release_date = Some(date.to_string());
            }

            developer = Some(common_value(developer, game.developer.as_deref()));
            genre = Some(common_value(genre, game.genre.as_deref()));

            if titles.len() < 3 {
                titles.push(format!("'{}'", game.name));
            }
        }

        folder.developer = label(developer);
        folder.genre = label(genre);

        folder.description = format!(
            "This collection contains {} games, including {}",
            games.len(),
            titles.join(", ")
        );
        if games.len() > 3 {
            folder.description.push_str(" among other titles.");
        }

        if let Some(game) = preview {
            folder.video = game.video.clone();
            folder.thumbnail = game.thumbnail.clone();
            folder.image = game.image.clone();
        }

        folder
    }
}

fn common_value<'a>(current: Option<&'a str>, next: Option<&'a str>) -> &'a str {
    let next = next.map(str::trim).unwrap_or("");
    match current {
        None => next,
        Some(value) if value == next => value,
        Some(_) => VARIOUS,
    }
}

fn label(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NONE.to_string(),
    }
}
