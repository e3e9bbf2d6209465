//! Run state types

use serde::{Deserialize, Serialize};

use crate::llm::Message;

/// One executed tool call, kept for auditing and metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRecord {
    /// Name the model asked for
    pub tool_name: String,
    /// Text handed back to the model
    pub output: String,
}

impl ToolRecord {
    pub fn new(tool_name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            output: output.into(),
        }
    }
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model answered without requesting tools
    Completed,
    /// The iteration cap was reached
    IterationCap,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Completed => write!(f, "completed"),
            StopReason::IterationCap => write!(f, "iteration cap reached"),
        }
    }
}

/// Position of the orchestrator in its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Start,
    ModelTurn,
    Decide,
    ToolTurn,
    Terminal(StopReason),
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoopState::Start => write!(f, "Start"),
            LoopState::ModelTurn => write!(f, "ModelTurn"),
            LoopState::Decide => write!(f, "Decide"),
            LoopState::ToolTurn => write!(f, "ToolTurn"),
            LoopState::Terminal(reason) => write!(f, "Terminal ({})", reason),
        }
    }
}

/// State of a single agent run.
///
/// Created fresh per request. The message transcript only ever grows; the
/// orchestrator is the only writer while a run is in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    messages: Vec<Message>,
    user_input: String,
    tool_results: Vec<ToolRecord>,
    iteration_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    final_output: Option<String>,
}

impl ConversationState {
    /// Initial state: a single Human message carrying `user_input`
    pub fn new(user_input: impl Into<String>) -> Self {
        let user_input = user_input.into();
        Self {
            messages: vec![Message::human(user_input.clone())],
            user_input,
            tool_results: Vec::new(),
            iteration_count: 0,
            final_output: None,
        }
    }

    /// Ordered transcript
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The original request text
    pub fn user_input(&self) -> &str {
        &self.user_input
    }

    /// One entry per executed tool call, in execution order
    pub fn tool_results(&self) -> &[ToolRecord] {
        &self.tool_results
    }

    /// Number of model invocations so far
    pub fn iteration_count(&self) -> u32 {
        self.iteration_count
    }

    /// Final answer, once the caller has filled it in
    pub fn final_output(&self) -> Option<&str> {
        self.final_output.as_deref()
    }

    /// Record the final answer
    pub fn set_final_output(&mut self, output: impl Into<String>) {
        self.final_output = Some(output.into());
    }

    /// Last message of the transcript
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub(crate) fn insert_system(&mut self, prompt: impl Into<String>) {
        self.messages.insert(0, Message::system(prompt));
    }

    pub(crate) fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub(crate) fn record_model_turn(&mut self, message: Message) {
        self.messages.push(message);
        self.iteration_count += 1;
    }

    pub(crate) fn push_tool_result(&mut self, record: ToolRecord) {
        self.tool_results.push(record);
    }
}

/// Summary of a finished run, persisted with its execution record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    /// Model invocations
    pub iterations: u32,
    /// Executed tool calls
    pub tool_calls: usize,
    pub tool_results: Vec<ToolRecord>,
    /// Transcript length, including any system message
    pub total_messages: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,
}

impl ExecutionMetadata {
    pub fn from_state(state: &ConversationState, stop_reason: StopReason) -> Self {
        Self {
            iterations: state.iteration_count(),
            tool_calls: state.tool_results().len(),
            tool_results: state.tool_results().to_vec(),
            total_messages: state.messages().len(),
            stop_reason: Some(stop_reason),
        }
    }
}
