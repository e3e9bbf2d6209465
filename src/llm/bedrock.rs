//! AWS Bedrock Converse API client
//!
//! Managed-cloud backend. Authenticates with a Bedrock API key sent as a bearer
//! token, so no request signing is needed. Short-lived keys can be refreshed per
//! request through [`BedrockProvider::with_auth_provider`].
//!
//! ```ignore
//! // Reads AWS_BEARER_TOKEN_BEDROCK, AWS_REGION and optionally BEDROCK_BASE_URL
//! let llm = BedrockProvider::from_env(GenerationSettings::new(
//!     "anthropic.claude-3-5-sonnet-20241022-v2:0",
//!     0.7,
//!     4096,
//! ))?;
//! ```

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::auth::{auth_provider, AuthConfig, AuthSource};
use super::provider::{split_system, GenerationSettings, LlmProvider};
use super::types::{Message, ToolCall, ToolDefinition};

const DEFAULT_REGION: &str = "us-east-1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConverseRequest<'a> {
    messages: Vec<BedrockMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    system: Vec<SystemBlock<'a>>,
    inference_config: InferenceConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<ToolConfig<'a>>,
}

#[derive(Debug, Serialize)]
struct SystemBlock<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InferenceConfig {
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ToolConfig<'a> {
    tools: Vec<ToolEntry<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolEntry<'a> {
    tool_spec: ToolSpec<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolSpec<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: InputSchema,
}

#[derive(Debug, Serialize)]
struct InputSchema {
    json: Value,
}

#[derive(Debug, Serialize)]
struct BedrockMessage {
    role: &'static str,
    content: Vec<BedrockBlock>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum BedrockBlock {
    Text(String),
    ToolUse(ToolUseBlock),
    ToolResult(ToolResultBlock),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolUseBlock {
    tool_use_id: String,
    name: String,
    #[serde(default)]
    input: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolResultBlock {
    tool_use_id: String,
    content: Vec<TextContent>,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct TextContent {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseResponse {
    output: ConverseOutput,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConverseOutput {
    message: OutputMessage,
}

#[derive(Debug, Deserialize)]
struct OutputMessage {
    #[serde(default)]
    content: Vec<OutputBlock>,
}

/// Response content block; blocks other than text and tool use are skipped.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutputBlock {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    tool_use: Option<ToolUseBlock>,
}

// ============================================================================
// BedrockProvider
// ============================================================================

/// Bedrock Converse provider
pub struct BedrockProvider {
    client: Client,
    auth: AuthSource,
    region: String,
    settings: GenerationSettings,
}

impl BedrockProvider {
    /// Create a provider from `AWS_BEARER_TOKEN_BEDROCK`, `AWS_REGION` and
    /// `BEDROCK_BASE_URL`
    pub fn from_env(settings: GenerationSettings) -> Result<Self> {
        tracing::info!("Creating Bedrock provider from environment");
        let auth = AuthConfig::from_env("AWS_BEARER_TOKEN_BEDROCK", "BEDROCK_BASE_URL")?;
        let region = env::var("AWS_REGION")
            .ok()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        Self::new(auth, region, settings)
    }

    /// Create a provider with static credentials
    pub fn new(
        auth: AuthConfig,
        region: impl Into<String>,
        settings: GenerationSettings,
    ) -> Result<Self> {
        let region = region.into();
        tracing::info!("[Bedrock] Using model: {} in {}", settings.model, region);
        Ok(Self {
            client: build_client()?,
            auth: AuthSource::Static(auth),
            region,
            settings,
        })
    }

    /// Create a provider that fetches a fresh API key before every request
    pub fn with_auth_provider<F, Fut>(
        settings: GenerationSettings,
        region: impl Into<String>,
        provider: F,
    ) -> Result<Self>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<AuthConfig>> + Send + 'static,
    {
        Ok(Self {
            client: build_client()?,
            auth: AuthSource::Dynamic(Arc::new(auth_provider(provider))),
            region: region.into(),
            settings,
        })
    }

    fn endpoint(&self, auth: &AuthConfig) -> Result<Url> {
        let default_base = format!("https://bedrock-runtime.{}.amazonaws.com", self.region);
        let base = AuthSource::resolve_base(auth, &default_base);
        let mut url = Url::parse(&base).with_context(|| format!("Invalid Bedrock URL: {}", base))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Bedrock URL cannot be a base: {}", base))?
            .pop_if_empty()
            .extend(["model", self.settings.model.as_str(), "converse"]);
        Ok(url)
    }

    fn convert_messages(messages: &[Message]) -> Vec<BedrockMessage> {
        let mut converted: Vec<BedrockMessage> = Vec::new();

        for msg in messages {
            let (role, blocks) = match msg {
                Message::System { .. } => {
                    tracing::warn!("[Bedrock] Ignoring System message after position 0");
                    continue;
                }
                Message::Human { content } => ("user", vec![BedrockBlock::Text(content.clone())]),
                Message::Ai {
                    content,
                    tool_calls,
                } => {
                    let mut blocks = Vec::with_capacity(tool_calls.len() + 1);
                    if !content.is_empty() {
                        blocks.push(BedrockBlock::Text(content.clone()));
                    }
                    blocks.extend(tool_calls.iter().map(|call| {
                        BedrockBlock::ToolUse(ToolUseBlock {
                            tool_use_id: call.id.clone(),
                            name: call.name.clone(),
                            input: call.args.clone(),
                        })
                    }));
                    ("assistant", blocks)
                }
                Message::Tool {
                    tool_call_id,
                    content,
                    is_error,
                } => (
                    "user",
                    vec![BedrockBlock::ToolResult(ToolResultBlock {
                        tool_use_id: tool_call_id.clone(),
                        content: vec![TextContent {
                            text: content.clone(),
                        }],
                        status: if *is_error { "error" } else { "success" },
                    })],
                ),
            };

            if blocks.is_empty() {
                continue;
            }

            match converted.last_mut() {
                Some(last) if last.role == role => last.content.extend(blocks),
                _ => converted.push(BedrockMessage {
                    role,
                    content: blocks,
                }),
            }
        }

        converted
    }

    fn convert_tools(tools: &[ToolDefinition]) -> Option<ToolConfig<'_>> {
        if tools.is_empty() {
            return None;
        }
        Some(ToolConfig {
            tools: tools
                .iter()
                .map(|tool| ToolEntry {
                    tool_spec: ToolSpec {
                        name: &tool.name,
                        description: &tool.description,
                        input_schema: InputSchema {
                            json: tool.schema_json(),
                        },
                    },
                })
                .collect(),
        })
    }

    fn convert_response(response: ConverseResponse) -> Message {
        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for block in response.output.message.content {
            if let Some(t) = block.text {
                text.push_str(&t);
            }
            if let Some(tool_use) = block.tool_use {
                tool_calls.push(ToolCall::new(
                    tool_use.tool_use_id,
                    tool_use.name,
                    tool_use.input,
                ));
            }
        }

        tracing::debug!(
            "[Bedrock] stopReason={:?}, tool_calls={}",
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
impl LlmProvider for BedrockProvider {
    async fn invoke(&self, history: &[Message], tools: &[ToolDefinition]) -> Result<Message> {
        let (system, rest) = split_system(history);

        let request = ConverseRequest {
            messages: Self::convert_messages(rest),
            system: system.map(|text| vec![SystemBlock { text }]).unwrap_or_default(),
            inference_config: InferenceConfig {
                max_tokens: self.settings.max_tokens,
                temperature: self.settings.temperature,
            },
            tool_config: Self::convert_tools(tools),
        };

        let auth = self.auth.get_auth().await?;
        let url = self.endpoint(&auth)?;

        tracing::info!(
            "[Bedrock] Sending {} messages with {} tools",
            request.messages.len(),
            tools.len()
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(&auth.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Bedrock API")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read Bedrock response body")?;

        if !status.is_success() {
            tracing::error!("[Bedrock] API error: {} - {}", status, body);
            anyhow::bail!("Bedrock API error ({}): {}", status, body);
        }

        let parsed: ConverseResponse =
            serde_json::from_str(&body).context("Failed to parse Bedrock API response")?;

        Ok(Self::convert_response(parsed))
    }

    fn model(&self) -> String {
        self.settings.model.clone()
    }

    fn provider_name(&self) -> &str {
        "bedrock"
    }

    fn create_variant(&self, settings: GenerationSettings) -> Arc<dyn LlmProvider> {
        Arc::new(Self {
            client: self.client.clone(),
            auth: self.auth.clone(),
            region: self.region.clone(),
            settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings() -> GenerationSettings {
        GenerationSettings::new("anthropic.claude-test", 0.5, 1024)
    }

    #[test]
    fn test_default_endpoint_uses_region() {
        let llm = BedrockProvider::new(AuthConfig::new("tok"), "eu-west-1", settings()).unwrap();
        let url = llm.endpoint(&AuthConfig::new("tok")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://bedrock-runtime.eu-west-1.amazonaws.com/model/anthropic.claude-test/converse"
        );
    }

    #[test]
    fn test_tool_result_blocks() {
        let history = vec![
            Message::human("verify"),
            Message::ai_with_tool_calls(
                "",
                vec![ToolCall::new("t1", "verify_on_platform", json!({"claim": "c"}))],
            ),
            Message::tool_error("t1", "Error: boom"),
        ];
        let converted = BedrockProvider::convert_messages(&history);
        let json = serde_json::to_value(&converted).unwrap();

        assert_eq!(json[0]["content"][0]["text"], "verify");
        assert_eq!(json[1]["content"][0]["toolUse"]["toolUseId"], "t1");
        assert_eq!(json[2]["role"], "user");
        assert_eq!(json[2]["content"][0]["toolResult"]["status"], "error");
        assert_eq!(
            json[2]["content"][0]["toolResult"]["content"][0]["text"],
            "Error: boom"
        );
    }

    #[tokio::test]
    async fn test_invoke_converse() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/model/anthropic.claude-test/converse"))
            .and(header("authorization", "Bearer bedrock-key"))
            .and(body_partial_json(json!({
                "system": [{"text": "sys"}],
                "inferenceConfig": {"maxTokens": 1024}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "output": {"message": {"role": "assistant", "content": [
                    {"text": "Checking."},
                    {"toolUse": {"toolUseId": "tooluse_1", "name": "search_internet", "input": {"url": "https://example.com", "keyword": "x"}}}
                ]}},
                "stopReason": "tool_use",
                "usage": {"inputTokens": 3, "outputTokens": 4, "totalTokens": 7}
            })))
            .mount(&server)
            .await;

        let llm = BedrockProvider::new(
            AuthConfig::with_base_url("bedrock-key", server.uri()),
            "us-east-1",
            settings(),
        )
        .unwrap();
        let reply = llm
            .invoke(&[Message::system("sys"), Message::human("go")], &[])
            .await
            .unwrap();

        assert_eq!(reply.content(), "Checking.");
        assert_eq!(reply.tool_calls()[0].id, "tooluse_1");
        assert_eq!(reply.tool_calls()[0].name, "search_internet");
    }

    #[tokio::test]
    async fn test_invoke_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("{\"message\":\"denied\"}"))
            .mount(&server)
            .await;

        let llm = BedrockProvider::new(
            AuthConfig::with_base_url("bad", server.uri()),
            "us-east-1",
            settings(),
        )
        .unwrap();
        let err = llm.invoke(&[Message::human("go")], &[]).await.unwrap_err();
        assert!(err.to_string().contains("Bedrock API error (403"));
    }
}
