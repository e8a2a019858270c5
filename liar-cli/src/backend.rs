use crate::config::ProviderSettings;
use liar_error::Result;
use liar_llm::{
    provider_error, AnthropicProvider, OpenAIProvider, ProviderGenerator, ProviderType,
    TextGenerator,
};

/// The configured provider behind a single generator type
pub enum Backend {
    OpenAI(ProviderGenerator<OpenAIProvider>),
    Anthropic(ProviderGenerator<AnthropicProvider>),
}

impl Backend {
    pub fn connect(settings: &ProviderSettings) -> Result<Self> {
        let config = settings.provider_config()?;
        let label = settings.model.as_deref().unwrap_or("default");

        let backend = match settings.kind {
            ProviderType::OpenAI | ProviderType::Local => {
                let provider = OpenAIProvider::new(config)
                    .map_err(|e| provider_error(e, label).with_operation("backend::connect"))?;
                Backend::OpenAI(ProviderGenerator::new(provider).with_sampling(settings.sampling))
            }
            ProviderType::Anthropic => {
                let provider = AnthropicProvider::new(config)
                    .map_err(|e| provider_error(e, label).with_operation("backend::connect"))?;
                Backend::Anthropic(
                    ProviderGenerator::new(provider).with_sampling(settings.sampling),
                )
            }
        };
        Ok(backend)
    }
}

impl TextGenerator for Backend {
    async fn invoke(&self, model_id: &str, prompt: &str) -> Result<String> {
        match self {
            Backend::OpenAI(generator) => generator.invoke(model_id, prompt).await,
            Backend::Anthropic(generator) => generator.invoke(model_id, prompt).await,
        }
    }
}
