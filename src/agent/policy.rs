//! Termination policy
//!
//! Decides after every model turn whether the loop runs the requested tools
//! or stops.

use crate::core::StopReason;
use crate::llm::Message;

/// Outcome of the policy check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Run the requested tools, then invoke the model again
    Continue,
    /// End the loop
    Stop(StopReason),
}

/// Decide whether to continue after a model turn.
///
/// The iteration cap is checked first, so a capped run stops even when the
/// last message requests tools. Otherwise the run continues exactly when the
/// last message is an AI message with at least one tool call.
pub fn decide(iteration_count: u32, max_iterations: u32, last: Option<&Message>) -> Decision {
    if iteration_count >= max_iterations {
        return Decision::Stop(StopReason::IterationCap);
    }

    match last {
        Some(message @ Message::Ai { .. }) if message.has_tool_calls() => Decision::Continue,
        _ => Decision::Stop(StopReason::Completed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ToolCall;
    use serde_json::json;

    fn with_call() -> Message {
        Message::ai_with_tool_calls("", vec![ToolCall::new("1", "verify_on_platform", json!({}))])
    }

    #[test]
    fn test_tool_calls_continue() {
        assert_eq!(decide(1, 10, Some(&with_call())), Decision::Continue);
    }

    #[test]
    fn test_plain_answer_completes() {
        assert_eq!(
            decide(1, 10, Some(&Message::ai("done"))),
            Decision::Stop(StopReason::Completed)
        );
        assert_eq!(decide(0, 10, None), Decision::Stop(StopReason::Completed));
    }

    #[test]
    fn test_cap_has_priority() {
        assert_eq!(
            decide(3, 3, Some(&with_call())),
            Decision::Stop(StopReason::IterationCap)
        );
        assert_eq!(
            decide(5, 3, Some(&Message::ai("done"))),
            Decision::Stop(StopReason::IterationCap)
        );
    }
}
