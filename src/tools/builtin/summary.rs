//! Summarization of long text on a cheaper model

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::llm::{AnthropicProvider, GenerationSettings, LlmProvider, Message, ToolInputSchema};
use crate::tools::tool::{required_str, Tool, ToolResult};

/// Model used for summaries when built from the environment
pub const SUMMARY_MODEL: &str = "claude-3-haiku-20240307";

const SUMMARY_MAX_TOKENS: u32 = 1024;
const DEFAULT_MAX_WORDS: u64 = 500;
/// Upper bound on the requested summary length, in words
const MAX_SUMMARY_WORDS: u64 = 5000;
/// Texts shorter than this many characters are returned unchanged
const MIN_SUMMARY_CHARS: usize = 1000;
/// Rough characters-per-word ratio for the fallback excerpt
const CHARS_PER_WORD: u64 = 5;

/// Condenses long text so it fits the conversation window.
pub struct SummaryTool {
    summarizer: Result<Arc<dyn LlmProvider>, String>,
}

impl SummaryTool {
    /// Summarize with the given model
    pub fn new(summarizer: Arc<dyn LlmProvider>) -> Self {
        Self {
            summarizer: Ok(summarizer),
        }
    }

    /// Summarize with a low-temperature variant of `provider`
    pub fn variant_of(provider: &dyn LlmProvider, model: impl Into<String>) -> Self {
        Self::new(provider.create_variant(GenerationSettings::new(
            model,
            0.0,
            SUMMARY_MAX_TOKENS,
        )))
    }

    /// Summarizer for a run driven by `provider`.
    ///
    /// An Anthropic provider is reused as a cheaper variant; any other backend
    /// falls back to [`from_env`](Self::from_env).
    pub fn for_provider(provider: &dyn LlmProvider) -> Self {
        if provider.provider_name() == "anthropic" {
            Self::variant_of(provider, SUMMARY_MODEL)
        } else {
            Self::from_env()
        }
    }

    /// Summarize with the Anthropic summary model, using `ANTHROPIC_API_KEY`.
    ///
    /// Missing credentials do not fail construction; every call then returns
    /// the fallback excerpt.
    pub fn from_env() -> Self {
        let settings = GenerationSettings::new(SUMMARY_MODEL, 0.0, SUMMARY_MAX_TOKENS);
        let summarizer = AnthropicProvider::from_env(settings)
            .map(|p| Arc::new(p) as Arc<dyn LlmProvider>)
            .map_err(|e| format!("{:#}", e));

        if let Err(reason) = &summarizer {
            tracing::warn!("[summary_long_text] Summaries unavailable: {}", reason);
        }

        Self { summarizer }
    }

    async fn summarize(&self, text: &str, max_words: u64) -> Result<String> {
        let llm = self
            .summarizer
            .as_ref()
            .map_err(|reason| anyhow::anyhow!("{}", reason))?;

        let prompt = format!(
            "Summarize the following text in {} words or less. \n\
             Focus on key facts, claims, and important details.\n\n\
             Text:\n{}\n\n\
             Summary:",
            max_words, text
        );

        let reply = llm.invoke(&[Message::human(prompt)], &[]).await?;
        Ok(reply.content().to_string())
    }
}

#[async_trait]
impl Tool for SummaryTool {
    fn name(&self) -> &str {
        "summary_long_text"
    }

    fn description(&self) -> &str {
        "Summarize long text to manage context window. Use this tool when you encounter \
         articles or text longer than 1000 characters."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::new()
            .with_properties(json!({
                "text": {
                    "type": "string",
                    "description": "The long text to summarize"
                },
                "max_length": {
                    "type": "integer",
                    "description": "Maximum length of summary in words (default: 500)"
                }
            }))
            .with_required(vec!["text".to_string()])
    }

    async fn execute(&self, input: &Value) -> Result<ToolResult> {
        let text = required_str(input, "text")?;
        let max_words = input
            .get("max_length")
            .and_then(|v| v.as_u64())
            .unwrap_or(DEFAULT_MAX_WORDS)
            .clamp(1, MAX_SUMMARY_WORDS);

        if text.chars().count() < MIN_SUMMARY_CHARS {
            return Ok(ToolResult::success(text));
        }

        match self.summarize(text, max_words).await {
            Ok(summary) => Ok(ToolResult::success(summary)),
            Err(e) => {
                tracing::warn!("[summary_long_text] Falling back to excerpt: {:#}", e);
                let fallback_len = max_words.saturating_mul(CHARS_PER_WORD) as usize;
                let excerpt: String = text.chars().take(fallback_len).collect();
                Ok(ToolResult::success(format!(
                    "[Summary unavailable: {:#}]\n\nFirst {} chars:\n{}...",
                    e, fallback_len, excerpt
                )))
            }
        }
    }
}
