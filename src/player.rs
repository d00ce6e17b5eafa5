//! Player roster records.
//!
//! Players are not entities: they come from a separate roster, and each of
//! their characters contributes its own name and aliases to the identity
//! space at the same priority as entity names.

use serde::{Deserialize, Serialize};

/// A character owned by a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCharacter {
    /// Character name as used in session notes.
    pub name: String,

    /// Nicknames and titles.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl PlayerCharacter {
    /// Creates a character without aliases.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
        }
    }

    /// Adds an alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }
}

/// A player and the characters on their roster.
///
/// # Examples
///
/// ```
/// use kronika::{Player, PlayerCharacter};
///
/// let player = Player::new("Kasia").with_character(PlayerCharacter::new("Sandro Nekromanta"));
/// assert_eq!(player.characters.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Player name.
    pub name: String,

    /// Characters the player runs.
    #[serde(default)]
    pub characters: Vec<PlayerCharacter>,
}

impl Player {
    /// Creates a player with an empty roster.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            characters: Vec::new(),
        }
    }

    /// Adds a character to the roster.
    #[must_use]
    pub fn with_character(mut self, character: PlayerCharacter) -> Self {
        self.characters.push(character);
        self
    }

    /// Finds a character on this roster by exact name.
    #[must_use]
    pub fn character(&self, name: &str) -> Option<&PlayerCharacter> {
        self.characters.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_roster() {
        let player = Player::new("Kasia")
            .with_character(PlayerCharacter::new("Sandro").with_alias("Nekromanta"))
            .with_character(PlayerCharacter::new("Gem"));
        assert_eq!(player.character("Sandro").unwrap().aliases, vec!["Nekromanta"]);
        assert!(player.character("Crag Hack").is_none());
    }

    #[test]
    fn test_player_deserialize_defaults() {
        let player: Player = serde_json::from_str(r#"{"name":"Tomek"}"#).unwrap();
        assert!(player.characters.is_empty());
    }
}
