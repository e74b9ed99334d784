//! Shared Story Context
//!
//! The session-lifetime record of everything the user has told the editors
//! about their story. One instance exists per session; every agent writes to
//! the same instance, including after a handoff.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

/// A character reported by the user.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterData {
    pub name: Option<String>,
    pub background: Option<String>,
}

impl CharacterData {
    pub fn new(name: impl Into<String>, background: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            background: Some(background.into()),
        }
    }
}

/// Story elements gathered over the course of the conversation.
///
/// Characters and locations are append-only and keep insertion order. The
/// theme is last-write-wins. Nothing is ever removed.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryData {
    pub characters: Vec<CharacterData>,
    pub locations: Vec<String>,
    pub theme: Option<String>,
}

impl StoryData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new character at the end of the character list.
    pub fn append_character(&mut self, name: impl Into<String>, background: impl Into<String>) {
        let character = CharacterData::new(name, background);
        info!(
            name = character.name.as_deref().unwrap_or_default(),
            "added character to the story"
        );
        self.characters.push(character);
    }

    /// Records a new location at the end of the location list.
    pub fn append_location(&mut self, location: impl Into<String>) {
        let location = location.into();
        info!(%location, "added location to the story");
        self.locations.push(location);
    }

    /// Replaces the story theme.
    pub fn set_theme(&mut self, theme: impl Into<String>) {
        let theme = theme.into();
        info!(%theme, "set theme of the story");
        self.theme = Some(theme);
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty() && self.locations.is_empty() && self.theme.is_none()
    }
}
