//! YAML game file.
//!
//! ```yaml
//! players:
//!   - { name: Alice, model_id: gpt-4o-mini }
//!   - { name: Bob, model_id: gpt-4o-mini }
//!   - { name: Carol, model_id: gpt-4o-mini }
//! judge:
//!   model_id: gpt-4o
//! game:
//!   topic_genres: [animals, food]
//!   rounds: 2
//! provider:
//!   kind: openai
//!   api_key_env: OPENAI_API_KEY
//! ```

use liar_error::{Error, ErrorKind, Result};
use liar_game::{GameConfig, PlayerConfig, RoundPolicy};
use liar_llm::{ProviderConfig, ProviderType, SamplingParams};
use serde::Deserialize;
use std::path::Path;

const LOCAL_BASE_URL: &str = "http://localhost:11434/v1";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub players: Vec<PlayerConfig>,
    pub judge: JudgeSection,
    #[serde(default)]
    pub game: GameSection,
    #[serde(default)]
    pub provider: ProviderSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JudgeSection {
    pub model_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GameSection {
    pub language: Option<String>,
    #[serde(default)]
    pub topic_genres: Vec<String>,
    /// Fixed number of rounds
    #[serde(alias = "num_turns")]
    pub rounds: Option<usize>,
    /// Play until this many players remain
    pub min_players: Option<usize>,
    pub seed: Option<u64>,
    #[serde(default)]
    pub concurrent_votes: bool,
    pub judge_commentary: Option<bool>,
    pub max_void_rounds: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSection {
    #[serde(default = "default_kind")]
    pub kind: ProviderType,
    pub base_url: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: Option<String>,
    /// Used only when a request names no model
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<usize>,
    pub timeout_secs: Option<u64>,
}

fn default_kind() -> ProviderType {
    ProviderType::OpenAI
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            base_url: None,
            api_key_env: None,
            model: None,
            temperature: None,
            top_p: None,
            max_tokens: None,
            timeout_secs: None,
        }
    }
}

/// Everything needed to build a provider, minus the secret
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub kind: ProviderType,
    pub base_url: Option<String>,
    pub api_key_env: String,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub sampling: SamplingParams,
}

impl FileConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::from(e)
                .with_operation("config::load")
                .with_context("path", path.display().to_string())
        })?;
        Self::parse(&content).map_err(|e| e.with_context("path", path.display().to_string()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| {
            Error::new(ErrorKind::ConfigInvalid, format!("malformed game file: {}", e))
                .with_operation("config::parse")
                .set_source(e)
        })
    }

    /// Split into validated game settings and provider settings
    pub fn into_parts(self) -> Result<(GameConfig, ProviderSettings)> {
        let policy = match (self.game.rounds, self.game.min_players) {
            (Some(_), Some(_)) => {
                return Err(Error::config_invalid(
                    "game.rounds and game.min_players are mutually exclusive",
                )
                .with_operation("config::into_parts"))
            }
            (Some(rounds), None) => RoundPolicy::Fixed { rounds },
            (None, Some(min_players)) => RoundPolicy::Elimination { min_players },
            (None, None) => RoundPolicy::default(),
        };

        let mut game = GameConfig::new(self.players, self.judge.model_id)
            .with_policy(policy)
            .with_genres(self.game.topic_genres);
        if let Some(language) = self.game.language {
            game = game.with_language(language);
        }
        if let Some(seed) = self.game.seed {
            game = game.with_seed(seed);
        }
        if let Some(commentary) = self.game.judge_commentary {
            game.judge_commentary = commentary;
        }
        if let Some(max) = self.game.max_void_rounds {
            game.max_void_rounds = max;
        }
        game.concurrent_votes = self.game.concurrent_votes;
        game.validate()?;

        let p = self.provider;
        let defaults = SamplingParams::default();
        let settings = ProviderSettings {
            kind: p.kind,
            api_key_env: p.api_key_env.unwrap_or_else(|| default_key_env(p.kind).to_string()),
            base_url: p.base_url,
            model: p.model,
            timeout_secs: p.timeout_secs,
            sampling: SamplingParams {
                temperature: p.temperature.or(defaults.temperature),
                top_p: p.top_p.or(defaults.top_p),
                max_tokens: p.max_tokens.or(defaults.max_tokens),
            },
        };

        Ok((game, settings))
    }
}

fn default_key_env(kind: ProviderType) -> &'static str {
    match kind {
        ProviderType::OpenAI => "OPENAI_API_KEY",
        ProviderType::Anthropic => "ANTHROPIC_API_KEY",
        ProviderType::Local => "LOCAL_API_KEY",
    }
}

impl ProviderSettings {
    /// Resolve against the process environment
    pub fn provider_config(&self) -> Result<ProviderConfig> {
        self.provider_config_with(|key| std::env::var(key).ok())
    }

    /// Resolve with an explicit variable lookup. Local servers need no key.
    pub fn provider_config_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ProviderConfig> {
        let api_key = lookup(&self.api_key_env).filter(|k| !k.trim().is_empty());

        let mut config = match (self.kind, api_key) {
            (ProviderType::Local, key) => {
                let mut config = ProviderConfig::local(
                    self.base_url.as_deref().unwrap_or(LOCAL_BASE_URL),
                    self.model.as_deref().unwrap_or("default"),
                );
                config.api_key = key;
                config
            }
            (ProviderType::OpenAI, Some(key)) => ProviderConfig::openai(key),
            (ProviderType::Anthropic, Some(key)) => ProviderConfig::anthropic(key),
            (_, None) => {
                return Err(Error::new(
                    ErrorKind::AuthenticationFailed,
                    format!("environment variable {} is not set", self.api_key_env),
                )
                .with_operation("config::provider_config")
                .with_context("env", self.api_key_env.clone()))
            }
        };

        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(secs);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
players:
  - name: Alice
    model_id: gpt-4o-mini
  - name: Bob
    model_id: claude-3-5-haiku
  - name: Carol
    model_id: llama3
judge:
  model_id: gpt-4o
game:
  topic_genres: [animals, food]
  num_turns: 2
  seed: 42
provider:
  kind: anthropic
  temperature: 0.7
"#;

    fn write(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_sample() {
        let file = write(SAMPLE);
        let (game, provider) = FileConfig::load(file.path()).unwrap().into_parts().unwrap();

        assert_eq!(game.players.len(), 3);
        assert_eq!(game.players[1], PlayerConfig::new("Bob", "claude-3-5-haiku"));
        assert_eq!(game.judge_model_id, "gpt-4o");
        assert_eq!(game.policy, RoundPolicy::Fixed { rounds: 2 });
        assert_eq!(game.topic_genres, vec!["animals", "food"]);
        assert_eq!(game.seed, Some(42));
        assert!(game.judge_commentary);

        assert_eq!(provider.kind, ProviderType::Anthropic);
        assert_eq!(provider.api_key_env, "ANTHROPIC_API_KEY");
        assert_eq!(provider.sampling.temperature, Some(0.7));
        assert_eq!(provider.sampling.top_p, Some(0.9));
    }

    #[test]
    fn test_default_policy_is_elimination() {
        let yaml = SAMPLE.replace("  num_turns: 2\n", "");
        let (game, _) = FileConfig::parse(&yaml).unwrap().into_parts().unwrap();
        assert_eq!(game.policy, RoundPolicy::Elimination { min_players: 2 });
    }

    #[test]
    fn test_rounds_and_min_players_conflict() {
        let yaml = SAMPLE.replace("num_turns: 2", "rounds: 2\n  min_players: 1");
        let err = FileConfig::parse(&yaml).unwrap().into_parts().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_invalid_game_is_rejected() {
        let yaml = SAMPLE.replace("num_turns: 2", "num_turns: 3");
        let err = FileConfig::parse(&yaml).unwrap().into_parts().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_unknown_field_and_missing_file() {
        let err = FileConfig::parse(&format!("{}\nextra: 1\n", SAMPLE)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let dir = tempfile::tempdir().unwrap();
        let err = FileConfig::load(dir.path().join("missing.yaml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert!(err.context_value("path").is_some());
    }

    #[test]
    fn test_provider_key_lookup() {
        let (_, settings) = FileConfig::parse(SAMPLE).unwrap().into_parts().unwrap();

        let err = settings.provider_config_with(|_| None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
        assert_eq!(err.context_value("env"), Some("ANTHROPIC_API_KEY"));

        let config = settings
            .provider_config_with(|key| (key == "ANTHROPIC_API_KEY").then(|| "sk-test".to_string()))
            .unwrap();
        assert_eq!(config.provider_type, ProviderType::Anthropic);
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_local_provider_needs_no_key() {
        let yaml = SAMPLE.replace("kind: anthropic", "kind: local\n  base_url: http://127.0.0.1:8000/v1");
        let (_, settings) = FileConfig::parse(&yaml).unwrap().into_parts().unwrap();

        let config = settings.provider_config_with(|_| None).unwrap();
        assert_eq!(config.provider_type, ProviderType::Local);
        assert_eq!(config.base_url.as_deref(), Some("http://127.0.0.1:8000/v1"));
        assert!(config.api_key.is_none());
    }
}
