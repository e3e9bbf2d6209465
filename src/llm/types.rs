//! Provider-neutral conversation types
//!
//! Every backend translates between these types and its own wire format at the
//! boundary, so the agent loop only ever sees a [`Message`] tagged union.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Messages
// ============================================================================

/// Role tag of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    Human,
    Ai,
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::Human => write!(f, "human"),
            Role::Ai => write!(f, "ai"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call identifier, echoed back by the answering Tool message
    pub id: String,
    /// Name of the tool to invoke
    pub name: String,
    /// Structured arguments (a JSON object)
    pub args: Value,
}

impl ToolCall {
    /// Create a tool call with an explicit id
    pub fn new(id: impl Into<String>, name: impl Into<String>, args: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            args,
        }
    }

    /// Create a tool call with a freshly generated id.
    ///
    /// Used by backends whose responses do not carry call ids.
    pub fn with_generated_id(name: impl Into<String>, args: Value) -> Self {
        Self::new(
            format!("call_{}", uuid::Uuid::new_v4().simple()),
            name,
            args,
        )
    }
}

/// A message in the conversation transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    /// Instructions for the model
    System { content: String },

    /// The user's request
    Human { content: String },

    /// Model output, optionally requesting tool calls
    Ai {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },

    /// Result of one tool call
    Tool {
        tool_call_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

impl Message {
    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        Message::System {
            content: text.into(),
        }
    }

    /// Create a human message
    pub fn human(text: impl Into<String>) -> Self {
        Message::Human {
            content: text.into(),
        }
    }

    /// Create an AI message without tool calls
    pub fn ai(text: impl Into<String>) -> Self {
        Message::Ai {
            content: text.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Create an AI message requesting tool calls
    pub fn ai_with_tool_calls(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Message::Ai {
            content: text.into(),
            tool_calls,
        }
    }

    /// Create a tool result message
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Message::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// Create a tool result message that reports a failure
    pub fn tool_error(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Message::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            is_error: true,
        }
    }

    /// Role tag of this message
    pub fn role(&self) -> Role {
        match self {
            Message::System { .. } => Role::System,
            Message::Human { .. } => Role::Human,
            Message::Ai { .. } => Role::Ai,
            Message::Tool { .. } => Role::Tool,
        }
    }

    /// Text content of this message
    pub fn content(&self) -> &str {
        match self {
            Message::System { content }
            | Message::Human { content }
            | Message::Ai { content, .. }
            | Message::Tool { content, .. } => content,
        }
    }

    /// Tool calls requested by this message (empty unless AI)
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Message::Ai { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    /// Whether this is an AI message with at least one tool call
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls().is_empty()
    }

    /// Call id answered by this message (Tool messages only)
    pub fn tool_call_id(&self) -> Option<&str> {
        match self {
            Message::Tool { tool_call_id, .. } => Some(tool_call_id),
            _ => None,
        }
    }
}

// ============================================================================
// Tool Definitions
// ============================================================================

/// Schema a model sees for one callable tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,

    /// Tool description
    pub description: String,

    /// JSON schema for the tool input
    pub input_schema: ToolInputSchema,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: ToolInputSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// Full JSON schema object (`{"type": "object", "properties": ..., "required": ...}`)
    pub fn schema_json(&self) -> Value {
        serde_json::to_value(&self.input_schema).unwrap_or_else(|_| serde_json::json!({"type": "object"}))
    }
}

/// JSON schema for tool input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInputSchema {
    /// Type (always "object")
    #[serde(rename = "type")]
    pub schema_type: String,

    /// Properties of the input object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,

    /// Required properties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl ToolInputSchema {
    /// Create a new tool input schema
    pub fn new() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: None,
            required: None,
        }
    }

    /// Set the properties
    pub fn with_properties(mut self, properties: Value) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Set the required fields
    pub fn with_required(mut self, required: Vec<String>) -> Self {
        self.required = Some(required);
        self
    }
}

impl Default for ToolInputSchema {
    fn default() -> Self {
        Self::new()
    }
}
