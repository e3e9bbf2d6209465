//! Tool Executor
//!
//! Runs the tool calls of one AI message against the run's registry. Every
//! call produces exactly one Tool message, whether it succeeds, fails, panics
//! or names an unknown tool; the executor never returns an error.

use std::any::Any;

use crate::core::ToolRecord;
use crate::llm::{Message, ToolCall};
use crate::tools::ToolRegistry;

/// Messages and records produced by one tool turn, in request order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolTurn {
    pub messages: Vec<Message>,
    pub records: Vec<ToolRecord>,
}

/// Handles tool execution for the orchestrator
pub struct ToolExecutor;

impl ToolExecutor {
    /// Execute `calls` one at a time, in order.
    ///
    /// Returns only the new messages; the caller appends them to the history.
    pub async fn execute_calls(registry: &ToolRegistry, calls: &[ToolCall]) -> ToolTurn {
        let mut turn = ToolTurn::default();

        for call in calls {
            let (message, record) = Self::execute_call(registry, call).await;
            turn.messages.push(message);
            turn.records.push(record);
        }

        turn
    }

    /// Execute a single call inside a failure boundary
    pub async fn execute_call(registry: &ToolRegistry, call: &ToolCall) -> (Message, ToolRecord) {
        let Some(tool) = registry.get(&call.name) else {
            tracing::warn!("[ToolExecutor] Unknown tool requested: {}", call.name);
            let output = format!("Error: Tool '{}' not found in available tools", call.name);
            return (
                Message::tool_error(&call.id, output.clone()),
                ToolRecord::new(&call.name, output),
            );
        };

        tracing::info!("[ToolExecutor] Executing tool: {} ({})", call.name, call.id);
        tracing::debug!("[ToolExecutor] Input: {}", call.args);

        // Each call runs on its own task so a panicking tool cannot take the run down
        let args = call.args.clone();
        let task = tokio::spawn(async move { tool.execute(&args).await });

        let (output, is_error) = match task.await {
            Ok(Ok(result)) => {
                tracing::debug!(
                    "[ToolExecutor] Tool {} completed. Is error: {}",
                    call.name,
                    result.is_error
                );
                (result.output, result.is_error)
            }
            Ok(Err(e)) => {
                tracing::warn!("[ToolExecutor] Tool {} failed: {:#}", call.name, e);
                (
                    format!("Error executing tool '{}': {:#}", call.name, e),
                    true,
                )
            }
            Err(e) => {
                let reason = if e.is_panic() {
                    format!("tool panicked: {}", panic_message(e.into_panic()))
                } else {
                    "tool task was cancelled".to_string()
                };
                tracing::error!("[ToolExecutor] Tool {} aborted: {}", call.name, reason);
                (
                    format!("Error executing tool '{}': {}", call.name, reason),
                    true,
                )
            }
        };

        let message = if is_error {
            Message::tool_error(&call.id, output.clone())
        } else {
            Message::tool(&call.id, output.clone())
        };

        (message, ToolRecord::new(&call.name, output))
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown panic".to_string()),
    }
}
