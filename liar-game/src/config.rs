//! Game settings, already parsed. Loading them from a file is the caller's job.

use crate::agent::DEFAULT_LANGUAGE;
use liar_error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Fewest players a game can start with
pub const MIN_PLAYERS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub name: String,
    pub model_id: String,
}

impl PlayerConfig {
    pub fn new(name: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model_id: model_id.into(),
        }
    }
}

/// When the game stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RoundPolicy {
    /// Play exactly this many completed rounds
    Fixed { rounds: usize },
    /// Keep playing while more than `min_players` remain
    Elimination { min_players: usize },
}

impl Default for RoundPolicy {
    fn default() -> Self {
        RoundPolicy::Elimination { min_players: 2 }
    }
}

impl RoundPolicy {
    /// Whether another round should be played
    pub fn should_continue(&self, completed_rounds: usize, active_players: usize) -> bool {
        match *self {
            RoundPolicy::Fixed { rounds } => completed_rounds < rounds,
            RoundPolicy::Elimination { min_players } => active_players > min_players,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub players: Vec<PlayerConfig>,
    pub judge_model_id: String,
    pub language: String,
    pub topic_genres: Vec<String>,
    pub policy: RoundPolicy,
    /// Seed for liar choice, turn order and genre; `None` seeds from the OS
    pub seed: Option<u64>,
    pub concurrent_votes: bool,
    pub judge_commentary: bool,
    /// Consecutive void rounds after which the game aborts
    pub max_void_rounds: usize,
}

impl GameConfig {
    pub fn new(players: Vec<PlayerConfig>, judge_model_id: impl Into<String>) -> Self {
        Self {
            players,
            judge_model_id: judge_model_id.into(),
            language: DEFAULT_LANGUAGE.to_string(),
            topic_genres: Vec::new(),
            policy: RoundPolicy::default(),
            seed: None,
            concurrent_votes: false,
            judge_commentary: true,
            max_void_rounds: 3,
        }
    }

    pub fn with_policy(mut self, policy: RoundPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_genres(mut self, genres: Vec<String>) -> Self {
        self.topic_genres = genres;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Check everything that would otherwise fail mid-game
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Error::config_invalid(message).with_operation("config::validate");

        if self.players.len() < MIN_PLAYERS {
            return Err(invalid(format!(
                "at least {} players are required, got {}",
                MIN_PLAYERS,
                self.players.len()
            )));
        }

        let mut seen = HashSet::new();
        for player in &self.players {
            if player.name.trim().is_empty() {
                return Err(invalid("player name must not be empty".into()));
            }
            if player.name.trim() != player.name {
                return Err(invalid(format!(
                    "player name '{}' has surrounding whitespace",
                    player.name
                ))
                .with_context("player", player.name.clone()));
            }
            if !seen.insert(player.name.as_str()) {
                return Err(invalid(format!("duplicate player name '{}'", player.name))
                    .with_context("player", player.name.clone()));
            }
            if player.model_id.trim().is_empty() {
                return Err(invalid(format!("player '{}' has no model_id", player.name))
                    .with_context("player", player.name.clone()));
            }
        }

        if self.judge_model_id.trim().is_empty() {
            return Err(invalid("judge model_id must not be empty".into()));
        }
        if self.language.trim().is_empty() {
            return Err(invalid("language must not be empty".into()));
        }
        if self.max_void_rounds == 0 {
            return Err(invalid("max_void_rounds must be at least 1".into()));
        }

        match self.policy {
            RoundPolicy::Fixed { rounds } if rounds == 0 || rounds >= self.players.len() => {
                Err(invalid(format!(
                    "fixed rounds must be between 1 and {} for {} players",
                    self.players.len() - 1,
                    self.players.len()
                )))
            }
            RoundPolicy::Elimination { min_players } if !(1..=2).contains(&min_players) => {
                Err(invalid(format!("min_players must be 1 or 2, got {}", min_players)))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liar_error::ErrorKind;

    fn three() -> Vec<PlayerConfig> {
        vec![
            PlayerConfig::new("Alice", "model-a"),
            PlayerConfig::new("Bob", "model-b"),
            PlayerConfig::new("Carol", "model-c"),
        ]
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = GameConfig::new(three(), "judge");
        assert!(config.validate().is_ok());
        assert_eq!(config.policy, RoundPolicy::Elimination { min_players: 2 });
        assert_eq!(config.language, "English");
    }

    #[test]
    fn test_too_few_players() {
        let err = GameConfig::new(three()[..2].to_vec(), "judge").validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_duplicate_and_blank_names() {
        let mut players = three();
        players[2].name = "Alice".into();
        let err = GameConfig::new(players, "judge").validate().unwrap_err();
        assert_eq!(err.context_value("player"), Some("Alice"));

        let mut players = three();
        players[0].name = "  ".into();
        assert!(GameConfig::new(players, "judge").validate().is_err());
    }

    #[test]
    fn test_policy_bounds() {
        let fixed = |rounds| GameConfig::new(three(), "judge").with_policy(RoundPolicy::Fixed { rounds });
        assert!(fixed(0).validate().is_err());
        assert!(fixed(2).validate().is_ok());
        assert!(fixed(3).validate().is_err());

        let elim = |min_players| {
            GameConfig::new(three(), "judge").with_policy(RoundPolicy::Elimination { min_players })
        };
        assert!(elim(0).validate().is_err());
        assert!(elim(1).validate().is_ok());
        assert!(elim(3).validate().is_err());
    }

    #[test]
    fn test_should_continue() {
        let fixed = RoundPolicy::Fixed { rounds: 2 };
        assert!(fixed.should_continue(1, 10));
        assert!(!fixed.should_continue(2, 10));

        let elim = RoundPolicy::Elimination { min_players: 2 };
        assert!(elim.should_continue(0, 3));
        assert!(!elim.should_continue(1, 2));
    }

    #[test]
    fn test_policy_serde_shape() {
        let policy: RoundPolicy = serde_json::from_str(r#"{"mode":"fixed","rounds":2}"#).unwrap();
        assert_eq!(policy, RoundPolicy::Fixed { rounds: 2 });
    }
}
