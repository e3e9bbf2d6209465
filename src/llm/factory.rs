//! Provider selection
//!
//! Maps the `llm_provider` field of an [`AgentConfig`] to a concrete backend.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::anthropic::AnthropicProvider;
use super::bedrock::BedrockProvider;
use super::openai::OpenAiProvider;
use super::provider::{GenerationSettings, LlmProvider};
use crate::agent::AgentConfig;
use crate::core::{AgentError, AgentResult};

/// Supported model backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// First-party hosted API
    Anthropic,
    /// Third-party hosted API
    OpenAi,
    /// Managed-cloud runtime
    Bedrock,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Bedrock => "bedrock",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(ProviderKind::Anthropic),
            "openai" => Ok(ProviderKind::OpenAi),
            "bedrock" => Ok(ProviderKind::Bedrock),
            _ => Err(AgentError::UnsupportedProvider(s.to_string())),
        }
    }
}

/// Generation settings taken from a configuration
pub fn settings_for(config: &AgentConfig) -> GenerationSettings {
    GenerationSettings::new(&config.model_id, config.temperature, config.max_tokens)
}

/// Build the backend named by `config`, reading credentials from the
/// environment.
///
/// Unknown kinds and missing credentials are rejected as validation failures,
/// before anything talks to the network.
pub fn create_provider(config: &AgentConfig) -> AgentResult<Arc<dyn LlmProvider>> {
    let kind = config.provider_kind()?;
    let settings = settings_for(config);

    tracing::info!(
        "[ProviderFactory] Creating {} provider for model {}",
        kind,
        settings.model
    );

    let provider: Arc<dyn LlmProvider> = match kind {
        ProviderKind::Anthropic => Arc::new(
            AnthropicProvider::from_env(settings).map_err(|e| credentials_error(kind, e))?,
        ),
        ProviderKind::OpenAi => Arc::new(
            OpenAiProvider::from_env(settings).map_err(|e| credentials_error(kind, e))?,
        ),
        ProviderKind::Bedrock => Arc::new(
            BedrockProvider::from_env(settings).map_err(|e| credentials_error(kind, e))?,
        ),
    };

    Ok(provider)
}

fn credentials_error(kind: ProviderKind, err: anyhow::Error) -> AgentError {
    AgentError::invalid(format!("cannot create {} provider: {:#}", kind, err))
}
