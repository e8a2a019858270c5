//! # Liar Game
//!
//! Orchestrates a social-deduction word game between language-model players:
//! 1. The judge invents a main topic and a close-but-different liar topic
//! 2. One random player (the liar) gets the liar topic, everyone else the main topic
//! 3. In a random turn order each player offers one word, seeing the words before theirs
//! 4. Everyone votes for the player they think is the liar
//! 5. The group wins if the most voted player is the liar; one player leaves per round
//! 6. Rounds repeat until the configured round policy says stop
//!
//! Models are reached through [`liar_llm::TextGenerator`]; randomness through an
//! injected [`rand::Rng`] so games replay from a seed.

pub mod extract;
pub mod prompt;
pub mod agent;
pub mod judge;
pub mod tally;
pub mod round;
pub mod config;
pub mod game;

/// Unique player name, stable for the whole game
pub type PlayerId = String;

pub use agent::{Agent, Ballot, Contribution, INVALID_VOTE, INVALID_WORD};
pub use config::{GameConfig, PlayerConfig, RoundPolicy};
pub use extract::extract;
pub use game::{Game, GameHistory, GameReport};
pub use judge::{Judge, TopicPair, ANY_TOPIC, FALLBACK_ANALYSIS, FALLBACK_TOPICS};
pub use round::{
    resolve_target, RoundController, RoundOutcome, RoundPlan, RoundRecord, VoidRound,
};
pub use tally::{tally, Tally};
