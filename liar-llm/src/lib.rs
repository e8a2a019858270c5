//! # liar-llm
//!
//! Everything between the game and a hosted language model.
//!
//! - **Provider**: trait-based chat completion backends (OpenAI-compatible, Anthropic)
//! - **Generator**: the single `invoke(model_id, prompt)` capability the game talks to

pub mod provider;
pub mod generator;

pub use generator::{provider_error, ProviderGenerator, SamplingParams, TextGenerator};
pub use provider::{
    AnthropicProvider, ChatMessage, CompletionRequest, CompletionResponse, FinishReason,
    LlmProvider, OpenAIProvider, ProviderConfig, ProviderError, ProviderType, Role, Usage,
};
