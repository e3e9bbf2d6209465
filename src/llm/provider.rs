//! LLM Provider trait
//!
//! Abstracts the model backend so the orchestrator can drive Anthropic, OpenAI
//! or Bedrock interchangeably.

use anyhow::Result;
use std::sync::Arc;

use super::types::{Message, ToolDefinition};

/// Sampling parameters shared by every backend
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    /// Backend model identifier
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens to generate per response
    pub max_tokens: u32,
}

impl GenerationSettings {
    pub fn new(model: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            temperature,
            max_tokens,
        }
    }
}

/// Trait for model backends used by the orchestrator.
///
/// A provider receives the full ordered history (including any System message)
/// plus the tool schemas bound for the run, and returns exactly one
/// [`Message::Ai`]. Tool calls in that message carry unique ids; providers
/// whose backend does not supply ids must generate them.
///
/// Any backend failure (network, authentication, non-success status,
/// malformed body) is returned as `Err`.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Produce the next AI message for `history`.
    async fn invoke(&self, history: &[Message], tools: &[ToolDefinition]) -> Result<Message>;

    /// Get the current model name.
    fn model(&self) -> String;

    /// Get the provider name (e.g., "anthropic", "openai", "bedrock").
    fn provider_name(&self) -> &str;

    /// Create a lightweight variant of this provider with a different model and
    /// sampling settings, sharing the same credentials.
    ///
    /// Used by the summarization tool to run on a cheaper model.
    fn create_variant(&self, settings: GenerationSettings) -> Arc<dyn LlmProvider>;
}

/// Split a leading System message off `history`.
///
/// Backends that take the system prompt as a separate request field (Anthropic,
/// Bedrock) use this; System messages appearing later are ignored.
pub(crate) fn split_system(history: &[Message]) -> (Option<&str>, &[Message]) {
    match history.first() {
        Some(Message::System { content }) => (Some(content.as_str()), &history[1..]),
        _ => (None, history),
    }
}
