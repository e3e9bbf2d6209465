//! Keyword lookup in a fetched web page

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use scraper::Html;
use serde_json::{json, Value};
use std::time::Duration;

use crate::llm::ToolInputSchema;
use crate::tools::tool::{required_str, Tool, ToolResult};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const CONTEXT_CHARS: usize = 500;
const PREVIEW_CHARS: usize = 1000;

/// Fetches a URL and reports the text around the first occurrence of a keyword.
pub struct SearchInternetTool;

impl SearchInternetTool {
    pub fn new() -> Self {
        Self
    }

    async fn fetch_text(url: &str) -> Result<String> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        let response = client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        Ok(extract_text(&body))
    }
}

impl Default for SearchInternetTool {
    fn default() -> Self {
        Self::new()
    }
}

const HIDDEN_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

/// Readable text of an HTML page: text nodes outside scripts and styles,
/// entities decoded by the parser, whitespace collapsed.
fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let pieces: Vec<&str> = document
        .root_element()
        .descendants()
        .filter(|node| {
            !node.ancestors().any(|parent| {
                parent
                    .value()
                    .as_element()
                    .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
            })
        })
        .filter_map(|node| node.value().as_text().map(|text| &**text))
        .collect();

    pieces.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Up to `CONTEXT_CHARS` characters either side of the first case-insensitive
/// match of `keyword`, or `None` when it does not occur.
fn keyword_context(text: &str, keyword: &str) -> Result<Option<String>> {
    let pattern = Regex::new(&format!("(?i){}", regex::escape(keyword)))?;
    let Some(found) = pattern.find(text) else {
        return Ok(None);
    };

    let start = text[..found.start()]
        .char_indices()
        .rev()
        .nth(CONTEXT_CHARS - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let end = text[found.end()..]
        .char_indices()
        .nth(CONTEXT_CHARS)
        .map(|(i, _)| found.end() + i)
        .unwrap_or(text.len());

    Ok(Some(text[start..end].to_string()))
}

#[async_trait]
impl Tool for SearchInternetTool {
    fn name(&self) -> &str {
        "search_internet"
    }

    fn description(&self) -> &str {
        "Search the internet by fetching content from a URL and looking for a keyword. \
         Returns the text surrounding the keyword, or the beginning of the page if the \
         keyword does not occur."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::new()
            .with_properties(json!({
                "url": {
                    "type": "string",
                    "description": "The URL to fetch and search"
                },
                "keyword": {
                    "type": "string",
                    "description": "The keyword or phrase to search for in the content"
                }
            }))
            .with_required(vec!["url".to_string(), "keyword".to_string()])
    }

    async fn execute(&self, input: &Value) -> Result<ToolResult> {
        let url = required_str(input, "url")?;
        let keyword = required_str(input, "keyword")?;

        tracing::debug!("[search_internet] Fetching {} for '{}'", url, keyword);

        let text = match Self::fetch_text(url).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("[search_internet] Fetch failed for {}: {:#}", url, e);
                return Ok(ToolResult::error(format!("Error searching {}: {:#}", url, e)));
            }
        };

        let output = match keyword_context(&text, keyword)? {
            Some(context) => format!("Found '{}' in URL {}:\n\n{}", keyword, url, context),
            None => {
                let preview: String = text.chars().take(PREVIEW_CHARS).collect();
                format!(
                    "Keyword '{}' not found in {}. Returning first {} chars:\n\n{}",
                    keyword, url, PREVIEW_CHARS, preview
                )
            }
        };

        Ok(ToolResult::success(output))
    }
}
