//! Anthropic Messages API client
//!
//! First-party hosted backend. Translates the conversation into Anthropic
//! content blocks and back.
//!
//! ```ignore
//! // Reads ANTHROPIC_API_KEY (and optionally ANTHROPIC_BASE_URL)
//! let llm = AnthropicProvider::from_env(GenerationSettings::new("claude-3-5-sonnet-20241022", 0.7, 4096))?;
//! ```

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::auth::{auth_provider, AuthConfig, AuthSource};
use super::provider::{split_system, GenerationSettings, LlmProvider};
use super::types::{Message, ToolCall, ToolDefinition};

const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<AnthropicTool<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "std::ops::Not::not", default)]
        is_error: bool,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Serialize)]
struct AnthropicTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: Value,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

// ============================================================================
// AnthropicProvider
// ============================================================================

/// Anthropic LLM provider
pub struct AnthropicProvider {
    client: Client,
    auth: AuthSource,
    settings: GenerationSettings,
}

impl AnthropicProvider {
    /// Create a provider from `ANTHROPIC_API_KEY` / `ANTHROPIC_BASE_URL`
    pub fn from_env(settings: GenerationSettings) -> Result<Self> {
        tracing::info!("Creating Anthropic provider from environment");
        let auth = AuthConfig::from_env("ANTHROPIC_API_KEY", "ANTHROPIC_BASE_URL")?;
        Self::new(auth, settings)
    }

    /// Create a provider with static credentials
    pub fn new(auth: AuthConfig, settings: GenerationSettings) -> Result<Self> {
        tracing::info!("[Anthropic] Using model: {}", settings.model);
        Ok(Self {
            client: build_client()?,
            auth: AuthSource::Static(auth),
            settings,
        })
    }

    /// Create a provider that fetches credentials before every request
    pub fn with_auth_provider<F, Fut>(settings: GenerationSettings, provider: F) -> Result<Self>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<AuthConfig>> + Send + 'static,
    {
        Ok(Self {
            client: build_client()?,
            auth: AuthSource::Dynamic(Arc::new(auth_provider(provider))),
            settings,
        })
    }

    /// Convert the transcript into Anthropic messages.
    ///
    /// Tool results travel as `tool_result` blocks in a user turn; consecutive
    /// turns with the same role are merged since the API requires alternation.
    fn convert_messages(messages: &[Message]) -> Vec<AnthropicMessage> {
        let mut converted: Vec<AnthropicMessage> = Vec::new();

        for msg in messages {
            let (role, blocks) = match msg {
                Message::System { .. } => {
                    tracing::warn!("[Anthropic] Ignoring System message after position 0");
                    continue;
                }
                Message::Human { content } => (
                    "user",
                    vec![AnthropicBlock::Text {
                        text: content.clone(),
                    }],
                ),
                Message::Ai {
                    content,
                    tool_calls,
                } => {
                    let mut blocks = Vec::with_capacity(tool_calls.len() + 1);
                    if !content.is_empty() {
                        blocks.push(AnthropicBlock::Text {
                            text: content.clone(),
                        });
                    }
                    blocks.extend(tool_calls.iter().map(|call| AnthropicBlock::ToolUse {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        input: call.args.clone(),
                    }));
                    ("assistant", blocks)
                }
                Message::Tool {
                    tool_call_id,
                    content,
                    is_error,
                } => (
                    "user",
                    vec![AnthropicBlock::ToolResult {
                        tool_use_id: tool_call_id.clone(),
                        content: content.clone(),
                        is_error: *is_error,
                    }],
                ),
            };

            if blocks.is_empty() {
                continue;
            }

            match converted.last_mut() {
                Some(last) if last.role == role => last.content.extend(blocks),
                _ => converted.push(AnthropicMessage {
                    role,
                    content: blocks,
                }),
            }
        }

        converted
    }

    fn convert_tools(tools: &[ToolDefinition]) -> Vec<AnthropicTool<'_>> {
        tools
            .iter()
            .map(|tool| AnthropicTool {
                name: &tool.name,
                description: &tool.description,
                input_schema: tool.schema_json(),
            })
            .collect()
    }

    fn convert_response(response: AnthropicResponse) -> Message {
        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for block in response.content {
            match block {
                AnthropicBlock::Text { text: t } => text.push_str(&t),
                AnthropicBlock::ToolUse { id, name, input } => {
                    tool_calls.push(ToolCall::new(id, name, input));
                }
                AnthropicBlock::ToolResult { .. } | AnthropicBlock::Unsupported => {}
            }
        }

        tracing::debug!(
            "[Anthropic] stop_reason={:?}, tool_calls={}",
            response.stop_reason,
            tool_calls.len()
        );

        Message::ai_with_tool_calls(text, tool_calls)
    }
}

fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    async fn invoke(&self, history: &[Message], tools: &[ToolDefinition]) -> Result<Message> {
        let (system, rest) = split_system(history);

        let request = AnthropicRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            messages: Self::convert_messages(rest),
            system,
            tools: Self::convert_tools(tools),
        };

        let auth = self.auth.get_auth().await?;
        let url = format!(
            "{}/v1/messages",
            AuthSource::resolve_base(&auth, DEFAULT_API_BASE)
        );

        tracing::info!(
            "[Anthropic] Sending {} messages with {} tools",
            request.messages.len(),
            request.tools.len()
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &auth.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Anthropic API")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read Anthropic response body")?;

        tracing::debug!("[Anthropic] Response status: {}", status);

        if !status.is_success() {
            tracing::error!("[Anthropic] API error: {} - {}", status, body);
            anyhow::bail!("Anthropic API error ({}): {}", status, body);
        }

        let parsed: AnthropicResponse =
            serde_json::from_str(&body).context("Failed to parse Anthropic API response")?;

        Ok(Self::convert_response(parsed))
    }

    fn model(&self) -> String {
        self.settings.model.clone()
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }

    fn create_variant(&self, settings: GenerationSettings) -> Arc<dyn LlmProvider> {
        Arc::new(Self {
            client: self.client.clone(),
            auth: self.auth.clone(),
            settings,
        })
    }
}
