//! OpenAI Chat Completions client
//!
//! Third-party hosted backend. System, human, AI and tool messages map one to
//! one onto chat-completion roles; tool calls use the `function` format with
//! JSON-encoded argument strings.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use super::auth::{AuthConfig, AuthSource};
use super::provider::{GenerationSettings, LlmProvider};
use super::types::{Message, ToolCall, ToolDefinition};

const DEFAULT_API_BASE: &str = "https://api.openai.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Value>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ChatToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ChatToolCall {
    #[serde(default)]
    id: Option<String>,
    function: ChatFunction,
}

#[derive(Debug, Deserialize)]
struct ChatFunction {
    name: String,
    #[serde(default)]
    arguments: Option<String>,
}

// ============================================================================
// OpenAiProvider
// ============================================================================

/// OpenAI-compatible chat completions provider
pub struct OpenAiProvider {
    client: Client,
    auth: AuthSource,
    settings: GenerationSettings,
}

impl OpenAiProvider {
    /// Create a provider from `OPENAI_API_KEY` / `OPENAI_BASE_URL`
    pub fn from_env(settings: GenerationSettings) -> Result<Self> {
        tracing::info!("Creating OpenAI provider from environment");
        let auth = AuthConfig::from_env("OPENAI_API_KEY", "OPENAI_BASE_URL")?;
        Self::new(auth, settings)
    }

    /// Create a provider with static credentials
    pub fn new(auth: AuthConfig, settings: GenerationSettings) -> Result<Self> {
        tracing::info!("[OpenAI] Using model: {}", settings.model);
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            auth: AuthSource::Static(auth),
            settings,
        })
    }

    fn convert_messages(messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|msg| match msg {
                Message::System { content } => json!({"role": "system", "content": content}),
                Message::Human { content } => json!({"role": "user", "content": content}),
                Message::Ai {
                    content,
                    tool_calls,
                } => {
                    let mut value = json!({"role": "assistant", "content": content});
                    if !tool_calls.is_empty() {
                        value["tool_calls"] = tool_calls
                            .iter()
                            .map(|call| {
                                json!({
                                    "id": call.id,
                                    "type": "function",
                                    "function": {
                                        "name": call.name,
                                        "arguments": call.args.to_string(),
                                    }
                                })
                            })
                            .collect();
                    }
                    value
                }
                Message::Tool {
                    tool_call_id,
                    content,
                    ..
                } => json!({
                    "role": "tool",
                    "tool_call_id": tool_call_id,
                    "content": content,
                }),
            })
            .collect()
    }

    fn convert_tools(tools: &[ToolDefinition]) -> Vec<Value> {
        tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.schema_json(),
                    }
                })
            })
            .collect()
    }

    fn convert_response(response: ChatResponse) -> Result<Message> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .context("No choices in OpenAI response")?;

        tracing::debug!("[OpenAI] finish_reason={:?}", choice.finish_reason);

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| {
                let arguments = call.function.arguments.unwrap_or_default();
                let args: Value = if arguments.trim().is_empty() {
                    json!({})
                } else {
                    serde_json::from_str(&arguments).with_context(|| {
                        format!(
                            "Malformed arguments for tool call '{}': {}",
                            call.function.name, arguments
                        )
                    })?
                };
                Ok(match call.id {
                    Some(id) => ToolCall::new(id, call.function.name, args),
                    None => ToolCall::with_generated_id(call.function.name, args),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Message::ai_with_tool_calls(
            choice.message.content.unwrap_or_default(),
            tool_calls,
        ))
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    async fn invoke(&self, history: &[Message], tools: &[ToolDefinition]) -> Result<Message> {
        let request = ChatRequest {
            model: &self.settings.model,
            messages: Self::convert_messages(history),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            tools: Self::convert_tools(tools),
        };

        let auth = self.auth.get_auth().await?;
        let url = format!(
            "{}/v1/chat/completions",
            AuthSource::resolve_base(&auth, DEFAULT_API_BASE)
        );

        tracing::info!(
            "[OpenAI] Sending {} messages with {} tools",
            request.messages.len(),
            request.tools.len()
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&auth.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to OpenAI API")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read OpenAI response body")?;

        if !status.is_success() {
            tracing::error!("[OpenAI] API error: {} - {}", status, body);
            anyhow::bail!("OpenAI API error ({}): {}", status, body);
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).context("Failed to parse OpenAI API response")?;

        Self::convert_response(parsed)
    }

    fn model(&self) -> String {
        self.settings.model.clone()
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    fn create_variant(&self, settings: GenerationSettings) -> Arc<dyn LlmProvider> {
        Arc::new(Self {
            client: self.client.clone(),
            auth: self.auth.clone(),
            settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_convert_messages_roles() {
        let history = vec![
            Message::system("sys"),
            Message::human("hi"),
            Message::ai_with_tool_calls(
                "",
                vec![ToolCall::new("c1", "search_internet", json!({"url": "u", "keyword": "k"}))],
            ),
            Message::tool("c1", "page text"),
        ];
        let converted = OpenAiProvider::convert_messages(&history);
        let roles: Vec<_> = converted.iter().map(|m| m["role"].as_str().unwrap()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "tool"]);
        assert_eq!(
            converted[2]["tool_calls"][0]["function"]["arguments"],
            "{\"keyword\":\"k\",\"url\":\"u\"}"
        );
        assert_eq!(converted[3]["tool_call_id"], "c1");
    }

    #[test]
    fn test_missing_ids_are_generated() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [
                        {"type": "function", "function": {"name": "a", "arguments": "{}"}},
                        {"type": "function", "function": {"name": "b", "arguments": ""}}
                    ]
                },
                "finish_reason": "tool_calls"
            }]
        }))
        .unwrap();

        let msg = OpenAiProvider::convert_response(response).unwrap();
        assert_eq!(msg.content(), "");
        let calls = msg.tool_calls();
        assert_eq!(calls.len(), 2);
        assert_ne!(calls[0].id, calls[1].id);
        assert_eq!(calls[1].args, json!({}));
    }

    #[test]
    fn test_null_tool_calls_and_arguments() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {"role": "assistant", "content": "Final answer", "tool_calls": null},
                "finish_reason": "stop"
            }]
        }))
        .unwrap();
        let msg = OpenAiProvider::convert_response(response).unwrap();
        assert_eq!(msg.content(), "Final answer");
        assert!(!msg.has_tool_calls());

        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"tool_calls": [
                {"id": "n1", "function": {"name": "noop", "arguments": null}}
            ]}}]
        }))
        .unwrap();
        let msg = OpenAiProvider::convert_response(response).unwrap();
        assert_eq!(msg.tool_calls()[0].id, "n1");
        assert_eq!(msg.tool_calls()[0].args, json!({}));
    }

    #[test]
    fn test_malformed_arguments_fail() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"tool_calls": [
                {"id": "x", "function": {"name": "a", "arguments": "{not json"}}
            ]}}]
        }))
        .unwrap();
        assert!(OpenAiProvider::convert_response(response).is_err());
    }

    #[tokio::test]
    async fn test_invoke_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-openai"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Verdict: FALSE"}, "finish_reason": "stop"}]
            })))
            .mount(&server)
            .await;

        let llm = OpenAiProvider::new(
            AuthConfig::with_base_url("sk-openai", server.uri()),
            GenerationSettings::new("gpt-4o", 0.7, 512),
        )
        .unwrap();
        let reply = llm.invoke(&[Message::human("claim")], &[]).await.unwrap();
        assert_eq!(reply.content(), "Verdict: FALSE");
        assert!(!reply.has_tool_calls());
    }
}
