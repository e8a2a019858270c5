//! The judge: invents topics and comments on rounds.

use crate::agent::Agent;
use crate::extract::extract_non_empty;
use crate::{prompt, PlayerId};
use indexmap::IndexMap;
use liar_error::Result;
use liar_llm::TextGenerator;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Genre used when no genre pool is configured
pub const ANY_TOPIC: &str = "any topic";

/// Topics used when the judge's answer cannot be parsed: (main, liar)
pub const FALLBACK_TOPICS: (&str, &str) = ("beach", "desert");

/// Commentary used when the judge's answer has no `<analysis>` tag
pub const FALLBACK_ANALYSIS: &str = "Round complete.";

/// The two topics of a round. Both are non-empty and differ from each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicPair {
    pub main_topic: String,
    pub liar_topic: String,
}

impl TopicPair {
    pub fn new(main_topic: impl Into<String>, liar_topic: impl Into<String>) -> Self {
        Self {
            main_topic: main_topic.into(),
            liar_topic: liar_topic.into(),
        }
    }

    pub fn fallback() -> Self {
        Self::new(FALLBACK_TOPICS.0, FALLBACK_TOPICS.1)
    }

    /// The topic a given player should see
    pub fn topic_for(&self, is_liar: bool) -> &str {
        if is_liar {
            &self.liar_topic
        } else {
            &self.main_topic
        }
    }
}

#[derive(Debug, Clone)]
pub struct Judge {
    agent: Agent,
    genres: Vec<String>,
}

impl Judge {
    pub fn new(model_id: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            agent: Agent::new("Judge", model_id).with_language(language),
            genres: Vec::new(),
        }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    /// Replace the genre pool. An empty pool means any topic.
    pub fn set_topic_genres(&mut self, genres: Vec<String>) {
        if !genres.is_empty() {
            info!(genres = %genres.join(", "), "judge genre pool set");
        }
        self.genres = genres;
    }

    /// Pick a genre and ask for a fresh pair of related topics.
    ///
    /// Unusable answers (a missing or blank tag, or two identical topics)
    /// yield [`FALLBACK_TOPICS`]; only generator errors are returned as `Err`.
    pub async fn generate_topic_pair<G: TextGenerator, R: Rng + ?Sized>(
        &self,
        generator: &G,
        previous_topics: &[String],
        rng: &mut R,
    ) -> Result<TopicPair> {
        let genre = self
            .genres
            .choose(rng)
            .map(String::as_str)
            .unwrap_or(ANY_TOPIC);

        let context = prompt::topic_context(genre, previous_topics);
        let response = self.agent.respond(generator, "the judge", &context).await?;

        let main_topic = extract_non_empty(&response, "main_topic");
        let liar_topic = extract_non_empty(&response, "liar_topic");

        match (main_topic, liar_topic) {
            (Some(main), Some(liar)) if main != liar => {
                info!(genre, main_topic = %main, liar_topic = %liar, "topics chosen");
                Ok(TopicPair::new(main, liar))
            }
            _ => {
                warn!(genre, "judge gave no usable topic pair, using fallback topics");
                Ok(TopicPair::fallback())
            }
        }
    }

    /// Short commentary on a finished round
    pub async fn evaluate_round<G: TextGenerator>(
        &self,
        generator: &G,
        all_words: &IndexMap<PlayerId, String>,
        true_liar: &str,
        votes: &IndexMap<PlayerId, String>,
    ) -> Result<String> {
        let context = prompt::evaluation_context(all_words, true_liar, votes);
        let response = self.agent.respond(generator, "the judge", &context).await?;

        Ok(extract_non_empty(&response, "analysis").unwrap_or_else(|| {
            warn!("judge analysis had no <analysis> tag");
            FALLBACK_ANALYSIS.to_string()
        }))
    }
}
