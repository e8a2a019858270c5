//! The text-generation seam.
//!
//! The game only ever needs "generate text for this prompt with this model".
//! `TextGenerator` is that capability; `ProviderGenerator` implements it on
//! top of any `LlmProvider`. Provider errors become `liar_error::Error` here
//! and nowhere else.

use crate::provider::{ChatMessage, CompletionRequest, LlmProvider, ProviderError};
use liar_error::{Error, ErrorKind, Result};
use tracing::debug;

/// Generate text for a prompt.
///
/// One call, one model response. Implementations must not retry.
#[allow(async_fn_in_trait)]
pub trait TextGenerator: Send + Sync {
    async fn invoke(&self, model_id: &str, prompt: &str) -> Result<String>;
}

impl<T: TextGenerator> TextGenerator for &T {
    async fn invoke(&self, model_id: &str, prompt: &str) -> Result<String> {
        (**self).invoke(model_id, prompt).await
    }
}

impl<T: TextGenerator> TextGenerator for std::sync::Arc<T> {
    async fn invoke(&self, model_id: &str, prompt: &str) -> Result<String> {
        (**self).invoke(model_id, prompt).await
    }
}

/// Sampling settings applied to every request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<usize>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: Some(1.0),
            top_p: Some(0.9),
            max_tokens: None,
        }
    }
}

/// `TextGenerator` backed by a chat completion provider
pub struct ProviderGenerator<P> {
    provider: P,
    sampling: SamplingParams,
}

impl<P: LlmProvider> ProviderGenerator<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            sampling: SamplingParams::default(),
        }
    }

    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn request(&self, model_id: &str, prompt: &str) -> CompletionRequest {
        let mut request =
            CompletionRequest::new(vec![ChatMessage::user(prompt)]).with_model(model_id);
        if let Some(temperature) = self.sampling.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(top_p) = self.sampling.top_p {
            request = request.with_top_p(top_p);
        }
        if let Some(max) = self.sampling.max_tokens {
            request = request.with_max_tokens(max);
        }
        request
    }
}

impl<P: LlmProvider> TextGenerator for ProviderGenerator<P> {
    async fn invoke(&self, model_id: &str, prompt: &str) -> Result<String> {
        debug!(
            provider = self.provider.name(),
            model = model_id,
            prompt_chars = prompt.len(),
            "invoking model"
        );

        let response = self
            .provider
            .complete(self.request(model_id, prompt))
            .await
            .map_err(|e| provider_error(e, model_id))?;

        let content = response.content.ok_or_else(|| {
            Error::inference_failed("model returned no text content")
                .with_operation("generator::invoke")
                .with_context("model", model_id)
        })?;

        debug!(
            model = model_id,
            response_chars = content.len(),
            total_tokens = response.usage.total_tokens,
            "model responded"
        );
        Ok(content.trim().to_string())
    }
}

/// Convert a provider failure into the workspace error, keeping its message
pub fn provider_error(err: ProviderError, model_id: &str) -> Error {
    let kind = match &err {
        ProviderError::Network(_) => ErrorKind::NetworkFailed,
        ProviderError::Api { status, .. } if *status == 502 || *status == 503 => {
            ErrorKind::ProviderUnavailable
        }
        ProviderError::Api { .. } => ErrorKind::InferenceFailed,
        ProviderError::Parse(_) => ErrorKind::ParseFailed,
        ProviderError::RateLimited { .. } => ErrorKind::RateLimited,
        ProviderError::InvalidRequest(_) => ErrorKind::InvalidArgument,
        ProviderError::ModelNotFound(_) => ErrorKind::ModelNotFound,
        ProviderError::AuthenticationFailed => ErrorKind::AuthenticationFailed,
        ProviderError::Other(_) => ErrorKind::InferenceFailed,
    };

    let mut error = Error::new(kind, err.to_string())
        .with_operation("generator::invoke")
        .with_context("model", model_id);

    match &err {
        ProviderError::Api { status, .. } => {
            error = error.with_context("status", status.to_string());
        }
        ProviderError::RateLimited { retry_after: Some(secs) } => {
            error = error.with_context("retry_after", secs.to_string());
        }
        _ => {}
    }

    error.set_source(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{CompletionResponse, FinishReason, Usage};
    use std::sync::Mutex;

    /// Replays canned results and remembers the requests it saw
    struct CannedProvider {
        replies: Mutex<Vec<std::result::Result<Option<String>, ProviderError>>>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl CannedProvider {
        fn new(replies: Vec<std::result::Result<Option<String>, ProviderError>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl LlmProvider for CannedProvider {
        fn name(&self) -> &str {
            "canned"
        }

        fn default_model(&self) -> &str {
            "canned-1"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            self.seen.lock().unwrap().push(request);
            let content = self.replies.lock().unwrap().remove(0)?;
            Ok(CompletionResponse {
                id: "1".into(),
                model: "canned-1".into(),
                content,
                finish_reason: FinishReason::Stop,
                usage: Usage::default(),
            })
        }
    }

    #[test]
    fn test_invoke_sends_model_and_sampling() {
        let generator = ProviderGenerator::new(CannedProvider::new(vec![Ok(Some(
            "  <word>tide</word>\n".into(),
        ))]));

        let text = tokio_test::block_on(generator.invoke("model-a", "give a word")).unwrap();
        assert_eq!(text, "<word>tide</word>");

        let seen = generator.provider().seen.lock().unwrap();
        assert_eq!(seen[0].model.as_deref(), Some("model-a"));
        assert_eq!(seen[0].messages, vec![ChatMessage::user("give a word")]);
        assert_eq!(seen[0].top_p, Some(0.9));
        assert_eq!(seen[0].temperature, Some(1.0));
    }

    #[test]
    fn test_custom_sampling_reaches_request() {
        let generator = ProviderGenerator::new(CannedProvider::new(vec![Ok(Some("ok".into()))]))
            .with_sampling(SamplingParams {
                temperature: None,
                top_p: Some(0.5),
                max_tokens: Some(64),
            });

        tokio_test::block_on(generator.invoke("model-a", "hi")).unwrap();

        let seen = generator.provider().seen.lock().unwrap();
        assert_eq!(seen[0].temperature, None);
        assert_eq!(seen[0].top_p, Some(0.5));
        assert_eq!(seen[0].max_tokens, Some(64));
    }

    #[test]
    fn test_empty_content_is_inference_failure() {
        let generator = ProviderGenerator::new(CannedProvider::new(vec![Ok(None)]));
        let err = tokio_test::block_on(generator.invoke("model-a", "hi")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InferenceFailed);
        assert_eq!(err.context_value("model"), Some("model-a"));
    }

    #[test]
    fn test_provider_errors_keep_message() {
        let generator = ProviderGenerator::new(CannedProvider::new(vec![Err(
            ProviderError::RateLimited { retry_after: Some(5) },
        )]));

        let err = tokio_test::block_on(generator.invoke("model-b", "hi")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert_eq!(err.message(), "Rate limited (retry after 5s)");
        assert_eq!(err.context_value("retry_after"), Some("5"));
        assert!(err.is_retryable());
        assert!(err.source_ref().is_some());
    }

    #[test]
    fn test_provider_error_kinds() {
        let err = provider_error(ProviderError::Api { status: 503, message: "down".into() }, "m");
        assert_eq!(err.kind(), ErrorKind::ProviderUnavailable);
        assert_eq!(err.context_value("status"), Some("503"));

        let err = provider_error(ProviderError::AuthenticationFailed, "m");
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
        assert!(!err.is_retryable());
    }
}
