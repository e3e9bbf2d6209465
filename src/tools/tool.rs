//! Tool trait definition
//!
//! All tools implement this trait to provide a consistent interface.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::{ToolDefinition, ToolInputSchema};

/// Result of executing a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The output of the tool
    pub output: String,
    /// Whether the tool execution resulted in an error
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: false,
        }
    }

    /// Create an error tool result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            output: message.into(),
            is_error: true,
        }
    }
}

/// Trait for tools that the agent can use
///
/// A failing `execute` never aborts a run: the executor turns the error into
/// a Tool message the model can read.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the name of this tool
    fn name(&self) -> &str;

    /// Get a description of this tool
    fn description(&self) -> &str;

    /// JSON schema of the arguments
    fn input_schema(&self) -> ToolInputSchema;

    /// Definition sent to the model
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }

    /// Execute the tool with the given input
    ///
    /// The input is a JSON value that matches the tool's input schema.
    async fn execute(&self, input: &Value) -> Result<ToolResult>;
}

/// Read a required string argument
pub fn required_str<'a>(input: &'a Value, field: &str) -> Result<&'a str> {
    input
        .get(field)
        .and_then(|v| v.as_str())
        .with_context(|| format!("missing required string argument '{}'", field))
}
