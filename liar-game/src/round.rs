//! One round: topics, liar, words, votes, verdict.

use crate::agent::{Agent, Ballot, Contribution};
use crate::judge::{Judge, TopicPair};
use crate::tally::tally;
use crate::PlayerId;
use futures_util::future::try_join_all;
use indexmap::IndexMap;
use liar_error::{Error, Result};
use liar_llm::TextGenerator;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Who lies and who speaks when, drawn before any model is asked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundPlan {
    liar: PlayerId,
    turn_order: Vec<PlayerId>,
}

impl RoundPlan {
    /// Uniformly random liar and turn order over `roster`
    pub fn draw<R: Rng + ?Sized>(roster: &[Agent], rng: &mut R) -> Result<Self> {
        let liar = roster
            .choose(rng)
            .ok_or_else(|| {
                Error::invalid_argument("cannot play a round with an empty roster")
                    .with_operation("round::draw")
            })?
            .name()
            .to_string();

        let mut turn_order: Vec<PlayerId> = roster.iter().map(|p| p.name().to_string()).collect();
        turn_order.shuffle(rng);

        Ok(Self { liar, turn_order })
    }

    /// A fixed plan. `turn_order` must be a permutation of `roster` containing `liar`.
    pub fn new(roster: &[Agent], liar: &str, turn_order: &[&str]) -> Result<Self> {
        let mut expected: Vec<&str> = roster.iter().map(Agent::name).collect();
        let mut given: Vec<&str> = turn_order.to_vec();
        expected.sort_unstable();
        given.sort_unstable();

        if expected != given {
            return Err(Error::invalid_argument("turn order is not a permutation of the roster")
                .with_operation("round::plan"));
        }
        if !expected.contains(&liar) {
            return Err(Error::invalid_argument(format!("liar '{}' is not in the roster", liar))
                .with_operation("round::plan")
                .with_context("liar", liar));
        }

        Ok(Self {
            liar: liar.to_string(),
            turn_order: turn_order.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn liar(&self) -> &str {
        &self.liar
    }

    pub fn turn_order(&self) -> &[PlayerId] {
        &self.turn_order
    }
}

/// Snapshot of a completed round. Never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundRecord {
    number: usize,
    #[serde(flatten)]
    topics: TopicPair,
    liar: PlayerId,
    turn_order: Vec<PlayerId>,
    words: IndexMap<PlayerId, String>,
    word_reasons: IndexMap<PlayerId, String>,
    votes: IndexMap<PlayerId, String>,
    vote_reasons: IndexMap<PlayerId, String>,
    most_voted: PlayerId,
    group_won: bool,
    analysis: Option<String>,
}

impl RoundRecord {
    /// 1-based round number within the game
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn main_topic(&self) -> &str {
        &self.topics.main_topic
    }

    pub fn liar_topic(&self) -> &str {
        &self.topics.liar_topic
    }

    pub fn topics(&self) -> &TopicPair {
        &self.topics
    }

    pub fn liar(&self) -> &str {
        &self.liar
    }

    pub fn turn_order(&self) -> &[PlayerId] {
        &self.turn_order
    }

    /// Words in the order they were given
    pub fn words(&self) -> &IndexMap<PlayerId, String> {
        &self.words
    }

    /// Votes in roster order, targets exactly as cast
    pub fn votes(&self) -> &IndexMap<PlayerId, String> {
        &self.votes
    }

    pub fn word_reason(&self, player: &str) -> Option<&str> {
        self.word_reasons.get(player).map(String::as_str)
    }

    pub fn vote_reason(&self, player: &str) -> Option<&str> {
        self.vote_reasons.get(player).map(String::as_str)
    }

    pub fn most_voted(&self) -> &str {
        &self.most_voted
    }

    pub fn group_won(&self) -> bool {
        self.group_won
    }

    /// The player leaving the game: the liar if caught, else the most voted player
    pub fn eliminated(&self) -> &str {
        if self.group_won {
            &self.liar
        } else {
            &self.most_voted
        }
    }

    pub fn analysis(&self) -> Option<&str> {
        self.analysis.as_deref()
    }
}

/// A round in which no vote named an active player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoidRound {
    pub topics: TopicPair,
    pub liar: PlayerId,
    pub votes: IndexMap<PlayerId, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    Completed(RoundRecord),
    Void(VoidRound),
}

/// Runs single rounds against a roster
pub struct RoundController<'a, G> {
    generator: &'a G,
    judge: &'a Judge,
    concurrent_votes: bool,
    commentary: bool,
}

impl<'a, G: TextGenerator> RoundController<'a, G> {
    pub fn new(generator: &'a G, judge: &'a Judge) -> Self {
        Self {
            generator,
            judge,
            concurrent_votes: false,
            commentary: false,
        }
    }

    /// Issue all vote requests at once. Votes are still recorded in roster order.
    pub fn with_concurrent_votes(mut self, enabled: bool) -> Self {
        self.concurrent_votes = enabled;
        self
    }

    /// Ask the judge for commentary on each completed round
    pub fn with_commentary(mut self, enabled: bool) -> Self {
        self.commentary = enabled;
        self
    }

    /// Play round `number` with a randomly drawn liar and turn order.
    ///
    /// The liar and turn order are drawn before the judge is asked for topics.
    /// The main topic is appended to `topics` whatever the outcome.
    pub async fn play<R: Rng + ?Sized>(
        &self,
        number: usize,
        roster: &[Agent],
        topics: &mut Vec<String>,
        rng: &mut R,
    ) -> Result<RoundOutcome> {
        let plan = RoundPlan::draw(roster, rng)?;
        self.play_with_plan(number, roster, topics, plan, rng).await
    }

    /// Play round `number` with a fixed plan. `rng` is only used for the genre.
    pub async fn play_with_plan<R: Rng + ?Sized>(
        &self,
        number: usize,
        roster: &[Agent],
        topics: &mut Vec<String>,
        plan: RoundPlan,
        rng: &mut R,
    ) -> Result<RoundOutcome> {
        info!(round = number, players = roster.len(), "round started");

        let pair = self
            .judge
            .generate_topic_pair(self.generator, topics, rng)
            .await?;
        topics.push(pair.main_topic.clone());
        debug!(round = number, liar = %plan.liar, "liar chosen");

        let (words, word_reasons) = self.collect_words(roster, &pair, &plan).await?;
        let ballots = self.collect_votes(roster, &pair, &plan, &words).await?;

        let mut votes = IndexMap::with_capacity(ballots.len());
        let mut vote_reasons = IndexMap::new();
        for (player, ballot) in roster.iter().zip(ballots) {
            info!(round = number, voter = player.name(), target = %ballot.target, "vote cast");
            if let Some(reason) = ballot.reason {
                vote_reasons.insert(player.name().to_string(), reason);
            }
            votes.insert(player.name().to_string(), ballot.target);
        }

        // Only votes naming an active player are counted.
        let counted = tally(votes.values().filter_map(|target| resolve_target(roster, target)));

        let most_voted = match counted.most_voted() {
            Some(target) => target.to_string(),
            None => {
                warn!(round = number, "no vote named an active player, round is void");
                return Ok(RoundOutcome::Void(VoidRound {
                    topics: pair,
                    liar: plan.liar,
                    votes,
                }));
            }
        };
        let group_won = most_voted == plan.liar;

        let analysis = if self.commentary {
            Some(
                self.judge
                    .evaluate_round(self.generator, &words, &plan.liar, &votes)
                    .await?,
            )
        } else {
            None
        };

        info!(
            round = number,
            liar = %plan.liar,
            most_voted = %most_voted,
            votes = counted.count(&most_voted),
            group_won,
            "round finished"
        );

        Ok(RoundOutcome::Completed(RoundRecord {
            number,
            topics: pair,
            liar: plan.liar,
            turn_order: plan.turn_order,
            words,
            word_reasons,
            votes,
            vote_reasons,
            most_voted,
            group_won,
            analysis,
        }))
    }

    /// Each player in turn order sees every word given before theirs.
    async fn collect_words(
        &self,
        roster: &[Agent],
        pair: &TopicPair,
        plan: &RoundPlan,
    ) -> Result<(IndexMap<PlayerId, String>, IndexMap<PlayerId, String>)> {
        let mut words: IndexMap<PlayerId, String> = IndexMap::with_capacity(roster.len());
        let mut reasons = IndexMap::new();

        for name in &plan.turn_order {
            let player = find(roster, name)?;
            let topic = pair.topic_for(*name == plan.liar);
            let previous: Vec<String> = words.values().cloned().collect();

            let Contribution { word, reason } =
                player.provide_word(self.generator, topic, &previous).await?;
            info!(player = %name, word = %word, "word given");

            if let Some(reason) = reason {
                reasons.insert(name.clone(), reason);
            }
            words.insert(name.clone(), word);
        }

        Ok((words, reasons))
    }

    /// One ballot per player, in roster order
    async fn collect_votes(
        &self,
        roster: &[Agent],
        pair: &TopicPair,
        plan: &RoundPlan,
        words: &IndexMap<PlayerId, String>,
    ) -> Result<Vec<Ballot>> {
        let topic_of = |player: &Agent| pair.topic_for(player.name() == plan.liar);

        if self.concurrent_votes {
            return try_join_all(
                roster
                    .iter()
                    .map(|player| player.vote_for_liar(self.generator, words, topic_of(player))),
            )
            .await;
        }

        let mut ballots = Vec::with_capacity(roster.len());
        for player in roster {
            ballots.push(
                player
                    .vote_for_liar(self.generator, words, topic_of(player))
                    .await?,
            );
        }
        Ok(ballots)
    }
}

/// Map a vote as cast to an active player's id.
///
/// An exact name wins. Otherwise the target is compared ignoring case and
/// surrounding punctuation, and must match exactly one player.
pub fn resolve_target<'r>(roster: &'r [Agent], target: &str) -> Option<&'r str> {
    if let Some(player) = roster.iter().find(|p| p.name() == target) {
        return Some(player.name());
    }

    let wanted = normalize(target);
    if wanted.is_empty() {
        return None;
    }
    let mut matches = roster.iter().filter(|p| normalize(p.name()) == wanted);
    match (matches.next(), matches.next()) {
        (Some(player), None) => Some(player.name()),
        _ => None,
    }
}

fn normalize(name: &str) -> String {
    name.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase()
}

fn find<'r>(roster: &'r [Agent], name: &str) -> Result<&'r Agent> {
    roster.iter().find(|p| p.name() == name).ok_or_else(|| {
        Error::unexpected(format!("player '{}' is not in the roster", name))
            .with_operation("round::find")
            .with_context("player", name)
    })
}
