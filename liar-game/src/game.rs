//! The game controller: roster, round loop, elimination, standings.

use crate::agent::Agent;
use crate::config::{GameConfig, RoundPolicy};
use crate::judge::Judge;
use crate::round::{RoundController, RoundOutcome, RoundRecord};
use crate::PlayerId;
use liar_error::{Error, Result};
use liar_llm::TextGenerator;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{info, warn};

/// Completed rounds and departed players, both oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GameHistory {
    rounds: Vec<RoundRecord>,
    eliminated: Vec<PlayerId>,
}

impl GameHistory {
    fn record(&mut self, round: RoundRecord) {
        self.eliminated.push(round.eliminated().to_string());
        self.rounds.push(round);
    }

    pub fn rounds(&self) -> &[RoundRecord] {
        &self.rounds
    }

    /// Eliminated players in elimination order, most recent last
    pub fn eliminated(&self) -> &[PlayerId] {
        &self.eliminated
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}

/// Final standings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameReport {
    /// Players still in the game, roster order
    pub winners: Vec<PlayerId>,
    /// Eliminated players, most recently eliminated first
    pub losers: Vec<PlayerId>,
    pub group_wins: usize,
    pub liar_wins: usize,
    pub rounds: Vec<RoundRecord>,
}

pub struct Game<G, R = StdRng> {
    generator: G,
    judge: Judge,
    roster: Vec<Agent>,
    policy: RoundPolicy,
    concurrent_votes: bool,
    judge_commentary: bool,
    max_void_rounds: usize,
    history: GameHistory,
    topics: Vec<String>,
    rng: R,
}

impl<G: TextGenerator> Game<G, StdRng> {
    /// Build a game from validated settings, seeding from `config.seed` if set
    pub fn new(config: GameConfig, generator: G) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, generator, rng)
    }
}

impl<G: TextGenerator, R: Rng> Game<G, R> {
    pub fn with_rng(config: GameConfig, generator: G, rng: R) -> Result<Self> {
        config.validate()?;

        let roster: Vec<Agent> = config
            .players
            .iter()
            .map(|p| {
                Agent::new(p.name.clone(), p.model_id.clone()).with_language(config.language.clone())
            })
            .collect();

        let mut judge = Judge::new(config.judge_model_id.clone(), config.language.clone());
        judge.set_topic_genres(config.topic_genres.clone());

        info!(
            players = roster.len(),
            judge_model = %config.judge_model_id,
            policy = ?config.policy,
            "game initialized"
        );

        Ok(Self {
            generator,
            judge,
            roster,
            policy: config.policy,
            concurrent_votes: config.concurrent_votes,
            judge_commentary: config.judge_commentary,
            max_void_rounds: config.max_void_rounds,
            history: GameHistory::default(),
            topics: Vec::new(),
            rng,
        })
    }

    /// Players still in the game, in roster order
    pub fn active_players(&self) -> impl Iterator<Item = &str> {
        self.roster.iter().map(Agent::name)
    }

    pub fn active_count(&self) -> usize {
        self.roster.len()
    }

    pub fn judge(&self) -> &Judge {
        &self.judge
    }

    pub fn history(&self) -> &GameHistory {
        &self.history
    }

    /// Main topics used so far, including those of void rounds
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    pub fn is_finished(&self) -> bool {
        !self.policy.should_continue(self.history.len(), self.roster.len())
    }

    /// Play until one round completes, then eliminate its loser.
    ///
    /// Void rounds are replayed up to `max_void_rounds` times in a row.
    pub async fn play_round(&mut self) -> Result<&RoundRecord> {
        if self.is_finished() {
            return Err(Error::invalid_argument("the game is already finished")
                .with_operation("game::play_round"));
        }

        let number = self.history.len() + 1;
        let controller = RoundController::new(&self.generator, &self.judge)
            .with_concurrent_votes(self.concurrent_votes)
            .with_commentary(self.judge_commentary);

        let mut void_rounds = 0;
        let record = loop {
            match controller
                .play(number, &self.roster, &mut self.topics, &mut self.rng)
                .await?
            {
                RoundOutcome::Completed(record) => break record,
                RoundOutcome::Void(void) => {
                    void_rounds += 1;
                    warn!(
                        round = number,
                        attempt = void_rounds,
                        main_topic = %void.topics.main_topic,
                        "void round, replaying"
                    );
                    if void_rounds >= self.max_void_rounds {
                        return Err(Error::round_void(void_rounds)
                            .with_operation("game::play_round")
                            .with_context("round", number.to_string())
                            .persist());
                    }
                }
            }
        };

        let eliminated = record.eliminated().to_string();
        let before = self.roster.len();
        self.roster.retain(|p| p.name() != eliminated);
        if self.roster.len() + 1 != before {
            return Err(Error::unexpected(format!(
                "elimination of '{}' did not remove exactly one player",
                eliminated
            ))
            .with_operation("game::play_round"));
        }

        info!(
            round = number,
            eliminated = %eliminated,
            remaining = self.roster.len(),
            group_won = record.group_won(),
            "player eliminated"
        );

        self.history.record(record);
        self.history
            .rounds
            .last()
            .ok_or_else(|| Error::unexpected("history is empty after recording a round"))
    }

    /// Play every remaining round and return the final standings
    pub async fn play(mut self) -> Result<GameReport> {
        while !self.is_finished() {
            self.play_round().await?;
        }
        Ok(self.into_report())
    }

    /// Standings so far
    pub fn report(&self) -> GameReport {
        standings(&self.roster, self.history.clone())
    }

    pub fn into_report(self) -> GameReport {
        standings(&self.roster, self.history)
    }
}

fn standings(roster: &[Agent], history: GameHistory) -> GameReport {
    let group_wins = history.rounds.iter().filter(|r| r.group_won()).count();
    GameReport {
        winners: roster.iter().map(|p| p.name().to_string()).collect(),
        losers: history.eliminated.into_iter().rev().collect(),
        group_wins,
        liar_wins: history.rounds.len() - group_wins,
        rounds: history.rounds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use liar_error::ErrorKind;

    /// Every player says the same word and votes for the first player listed
    struct Unanimous;

    impl TextGenerator for Unanimous {
        async fn invoke(&self, _model_id: &str, prompt: &str) -> Result<String> {
            if prompt.contains("<main_topic>") {
                return Ok("<main_topic>tea</main_topic><liar_topic>coffee</liar_topic>".into());
            }
            if prompt.contains("Time to vote!") {
                let first = prompt
                    .split("Words given by each player:\n")
                    .nth(1)
                    .and_then(|rest| rest.split(':').next())
                    .unwrap_or_default()
                    .to_string();
                return Ok(format!("<target>{}</target>", first));
            }
            Ok("<word>warm</word><analysis>ok</analysis>".into())
        }
    }

    fn config(names: &[&str]) -> GameConfig {
        let players = names.iter().map(|n| PlayerConfig::new(*n, "m")).collect();
        GameConfig::new(players, "judge").with_seed(1)
    }

    #[test]
    fn test_new_validates_config() {
        let err = match Game::new(config(&["A", "B"]), Unanimous) {
            Ok(_) => panic!("expected ConfigInvalid"),
            Err(e) => e,
        };
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_each_round_removes_one_player() {
        let mut game = Game::new(config(&["A", "B", "C", "D"]), Unanimous).unwrap();
        assert!(!game.is_finished());

        let first = tokio_test::block_on(game.play_round()).unwrap().eliminated().to_string();
        assert_eq!(game.active_count(), 3);
        assert!(game.active_players().all(|p| p != first));

        tokio_test::block_on(game.play_round()).unwrap();
        assert!(game.is_finished());

        let report = game.report();
        assert_eq!(report.losers.len(), 2);
        assert_eq!(report.losers[1], first);
        assert_eq!(report.winners.len(), 2);
        assert_eq!(report.group_wins + report.liar_wins, 2);
    }

    #[test]
    fn test_finished_game_refuses_another_round() {
        let config = config(&["A", "B", "C"]).with_policy(RoundPolicy::Fixed { rounds: 1 });
        let mut game = Game::new(config, Unanimous).unwrap();
        tokio_test::block_on(game.play_round()).unwrap();

        let err = tokio_test::block_on(game.play_round()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(game.history().len(), 1);
    }
}
