//! Player agents.
//!
//! An agent is an identity plus a model id. It holds no game state; every
//! operation is one prompt, one model call, one tag extraction.

use crate::extract::extract_non_empty;
use crate::{prompt, PlayerId};
use indexmap::IndexMap;
use liar_error::Result;
use liar_llm::TextGenerator;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Word recorded when a response has no usable `<word>` tag
pub const INVALID_WORD: &str = "invalid_response";

/// Vote recorded when a response has no usable `<target>` tag
pub const INVALID_VOTE: &str = "invalid_vote";

pub const DEFAULT_LANGUAGE: &str = "English";

/// A player's word for the round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub word: String,
    pub reason: Option<String>,
}

impl Contribution {
    pub fn is_valid(&self) -> bool {
        self.word != INVALID_WORD
    }
}

/// A player's vote for the liar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub target: String,
    pub reason: Option<String>,
}

impl Ballot {
    pub fn is_valid(&self) -> bool {
        self.target != INVALID_VOTE
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    name: PlayerId,
    model_id: String,
    language: String,
}

impl Agent {
    pub fn new(name: impl Into<PlayerId>, model_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model_id: model_id.into(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Frame `context` for this agent and send it to the model.
    ///
    /// Generator errors are returned untouched.
    pub(crate) async fn respond<G: TextGenerator>(
        &self,
        generator: &G,
        role: &str,
        context: &str,
    ) -> Result<String> {
        let prompt = prompt::frame(&self.name, role, &self.language, context);
        let response = generator.invoke(&self.model_id, &prompt).await?;
        debug!(agent = %self.name, role, response = %response, "agent responded");
        Ok(response)
    }

    /// Offer one word about `topic`, having seen `previous_words` in the order they were given.
    pub async fn provide_word<G: TextGenerator>(
        &self,
        generator: &G,
        topic: &str,
        previous_words: &[String],
    ) -> Result<Contribution> {
        let context = prompt::word_context(topic, previous_words);
        let response = self.respond(generator, "a player", &context).await?;

        let reason = extract_non_empty(&response, "reason");
        let word = extract_non_empty(&response, "word").unwrap_or_else(|| {
            warn!(agent = %self.name, "response had no <word> tag");
            INVALID_WORD.to_string()
        });

        Ok(Contribution { word, reason })
    }

    /// Name the player this agent believes is the liar.
    ///
    /// The target is returned as written; it may not be a real player.
    pub async fn vote_for_liar<G: TextGenerator>(
        &self,
        generator: &G,
        all_words: &IndexMap<PlayerId, String>,
        topic: &str,
    ) -> Result<Ballot> {
        let context = prompt::vote_context(all_words, topic);
        let response = self.respond(generator, "a player voting", &context).await?;

        let reason = extract_non_empty(&response, "reason");
        let target = extract_non_empty(&response, "target").unwrap_or_else(|| {
            warn!(agent = %self.name, "response had no <target> tag");
            INVALID_VOTE.to_string()
        });

        Ok(Ballot { target, reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liar_error::{Error, ErrorKind};
    use std::sync::Mutex;

    /// Answers every call with the same text and records prompts
    struct Fixed {
        reply: std::result::Result<String, ErrorKind>,
        prompts: Mutex<Vec<(String, String)>>,
    }

    impl Fixed {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(kind: ErrorKind) -> Self {
            Self {
                reply: Err(kind),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for Fixed {
        async fn invoke(&self, model_id: &str, prompt: &str) -> Result<String> {
            self.prompts
                .lock()
                .unwrap()
                .push((model_id.to_string(), prompt.to_string()));
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(kind) => Err(Error::new(*kind, "quota exceeded")),
            }
        }
    }

    #[test]
    fn test_provide_word_extracts_word_and_reason() {
        let generator = Fixed::ok("Hmm. <word>wave</word> <reason>oceans have waves</reason>");
        let agent = Agent::new("Alice", "model-a");

        let contribution =
            tokio_test::block_on(agent.provide_word(&generator, "ocean", &["salt".into()])).unwrap();
        assert_eq!(contribution.word, "wave");
        assert_eq!(contribution.reason.as_deref(), Some("oceans have waves"));
        assert!(contribution.is_valid());

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].0, "model-a");
        assert!(prompts[0].1.contains("The topic is: ocean"));
        assert!(prompts[0].1.contains("so far: salt"));
    }

    #[test]
    fn test_provide_word_malformed_output_is_sentinel() {
        let generator = Fixed::ok("I refuse to use tags. <reason>tags are boring</reason>");
        let agent = Agent::new("Bob", "model-b");

        let contribution =
            tokio_test::block_on(agent.provide_word(&generator, "desert", &[])).unwrap();
        assert_eq!(contribution.word, INVALID_WORD);
        assert_eq!(contribution.reason.as_deref(), Some("tags are boring"));
        assert!(!contribution.is_valid());
    }

    #[test]
    fn test_vote_returns_target_verbatim() {
        let generator = Fixed::ok("<target>Nobody In Particular</target>");
        let agent = Agent::new("Carol", "model-c").with_language("French");
        let mut words = IndexMap::new();
        words.insert("Alice".to_string(), "wave".to_string());

        let ballot = tokio_test::block_on(agent.vote_for_liar(&generator, &words, "ocean")).unwrap();
        assert_eq!(ballot.target, "Nobody In Particular");
        assert_eq!(ballot.reason, None);

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].1.contains("write it in French"));
        assert!(prompts[0].1.contains("Alice: wave"));
    }

    #[test]
    fn test_vote_missing_target_is_sentinel() {
        let generator = Fixed::ok("<target></target>");
        let agent = Agent::new("Carol", "model-c");

        let ballot =
            tokio_test::block_on(agent.vote_for_liar(&generator, &IndexMap::new(), "ocean")).unwrap();
        assert_eq!(ballot.target, INVALID_VOTE);
        assert!(!ballot.is_valid());
    }

    #[test]
    fn test_generator_errors_propagate() {
        let generator = Fixed::failing(ErrorKind::RateLimited);
        let agent = Agent::new("Alice", "model-a");

        let err = tokio_test::block_on(agent.provide_word(&generator, "ocean", &[])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert_eq!(err.message(), "quota exceeded");
        assert_eq!(generator.prompts.lock().unwrap().len(), 1);
    }
}
