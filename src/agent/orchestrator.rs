//! Orchestrator
//!
//! The bounded tool-calling loop:
//!
//! ```text
//! Start -> ModelTurn -> Decide -> ToolTurn -> ModelTurn -> ...
//!                          \-> Terminal
//! ```
//!
//! A run is strictly sequential: one model call at a time, and the tool calls
//! of one AI message are executed in order before the model is asked again.
//!
//! ```ignore
//! let orchestrator = Orchestrator::new(llm, Arc::new(registry), 10)
//!     .with_system_prompt("You are a fact checker.");
//! let outcome = orchestrator.run(ConversationState::new("Does 5G cause COVID?")).await?;
//! println!("{}", outcome.final_text());
//! ```

use anyhow::anyhow;
use std::sync::Arc;

use super::executor::ToolExecutor;
use super::policy::{decide, Decision};
use crate::core::{AgentError, AgentResult, ConversationState, LoopState, StopReason};
use crate::llm::{LlmProvider, Message, Role};
use crate::tools::ToolRegistry;

/// Final state of a run and why it stopped
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub state: ConversationState,
    pub stop_reason: StopReason,
}

impl RunOutcome {
    /// Text of the last message, the run's answer
    pub fn final_text(&self) -> &str {
        self.state.last_message().map(|m| m.content()).unwrap_or("")
    }
}

/// Drives one agent run against a provider and a tool registry
pub struct Orchestrator {
    llm: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    system_prompt: Option<String>,
    max_iterations: u32,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>, max_iterations: u32) -> Self {
        Self {
            llm,
            tools,
            system_prompt: None,
            max_iterations,
        }
    }

    /// Set the system prompt. Blank prompts are ignored.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.system_prompt = (!prompt.trim().is_empty()).then_some(prompt);
        self
    }

    /// Run the loop to completion.
    ///
    /// `state` must be fresh: exactly one Human message with non-empty text.
    /// Provider failures abort the run with [`AgentError::ExecutionFailed`];
    /// tool failures never do.
    pub async fn run(&self, mut state: ConversationState) -> AgentResult<RunOutcome> {
        let tool_defs = self.tools.get_definitions();
        let mut loop_state = LoopState::Start;

        loop {
            tracing::trace!("[Orchestrator] {}", loop_state);

            loop_state = match loop_state {
                LoopState::Start => {
                    self.check_initial(&state)?;
                    if let Some(prompt) = &self.system_prompt {
                        state.insert_system(prompt.clone());
                    }
                    tracing::info!(
                        "[Orchestrator] Starting run with {} tools, max_iterations={}",
                        tool_defs.len(),
                        self.max_iterations
                    );
                    LoopState::ModelTurn
                }

                LoopState::ModelTurn => {
                    tracing::info!(
                        "[Orchestrator] Model turn {} ({} messages)",
                        state.iteration_count() + 1,
                        state.messages().len()
                    );

                    let reply = self
                        .llm
                        .invoke(state.messages(), &tool_defs)
                        .await
                        .map_err(AgentError::ExecutionFailed)?;

                    if reply.role() != Role::Ai {
                        return Err(AgentError::ExecutionFailed(anyhow!(
                            "{} provider returned a {} message instead of an ai message",
                            self.llm.provider_name(),
                            reply.role()
                        )));
                    }

                    state.record_model_turn(reply);
                    LoopState::Decide
                }

                LoopState::Decide => {
                    match decide(
                        state.iteration_count(),
                        self.max_iterations,
                        state.last_message(),
                    ) {
                        Decision::Continue => LoopState::ToolTurn,
                        Decision::Stop(reason) => LoopState::Terminal(reason),
                    }
                }

                LoopState::ToolTurn => {
                    let calls = state
                        .last_message()
                        .map(|m| m.tool_calls().to_vec())
                        .unwrap_or_default();

                    tracing::info!("[Orchestrator] Executing {} tool call(s)", calls.len());

                    let turn = ToolExecutor::execute_calls(&self.tools, &calls).await;
                    for message in turn.messages {
                        state.push_message(message);
                    }
                    for record in turn.records {
                        state.push_tool_result(record);
                    }
                    LoopState::ModelTurn
                }

                LoopState::Terminal(stop_reason) => {
                    match stop_reason {
                        StopReason::Completed => tracing::info!(
                            "[Orchestrator] Completed after {} iteration(s)",
                            state.iteration_count()
                        ),
                        StopReason::IterationCap => tracing::warn!(
                            "[Orchestrator] Max iterations ({}) reached",
                            self.max_iterations
                        ),
                    }
                    return Ok(RunOutcome { state, stop_reason });
                }
            };
        }
    }

    fn check_initial(&self, state: &ConversationState) -> AgentResult<()> {
        if self.max_iterations == 0 {
            return Err(AgentError::invalid("max_iterations must be at least 1"));
        }
        if state.user_input().trim().is_empty() {
            return Err(AgentError::invalid("user_input cannot be empty"));
        }
        match state.messages() {
            [Message::Human { .. }] if state.iteration_count() == 0 => Ok(()),
            _ => Err(AgentError::invalid(
                "run must start from a single human message",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorKind;
    use crate::llm::{MockProvider, ToolCall};
    use crate::tools::{VerifyOnPlatformTool, Tool};
    use serde_json::json;

    fn verify_call(id: &str, claim: &str) -> Message {
        Message::ai_with_tool_calls(
            "",
            vec![ToolCall::new(id, "verify_on_platform", json!({"claim": claim}))],
        )
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(VerifyOnPlatformTool::new());
        Arc::new(registry)
    }

    fn orchestrator(mock: &Arc<MockProvider>, max_iterations: u32) -> Orchestrator {
        Orchestrator::new(mock.clone(), registry(), max_iterations)
    }

    #[tokio::test]
    async fn test_fact_check_round_trip() {
        let mock = Arc::new(MockProvider::new(vec![
            verify_call("call_1", "bleach cures covid"),
            Message::ai("Verdict: FALSE. Bleach does not cure COVID-19."),
        ]));

        let outcome = orchestrator(&mock, 10)
            .run(ConversationState::new("Bleach cures covid"))
            .await
            .unwrap();

        assert_eq!(outcome.stop_reason, StopReason::Completed);
        assert_eq!(mock.call_count(), 2);
        assert_eq!(outcome.state.iteration_count(), 2);
        assert_eq!(outcome.state.tool_results().len(), 1);
        assert!(outcome.state.tool_results()[0].output.contains("Status: FALSE"));
        assert_eq!(outcome.final_text(), "Verdict: FALSE. Bleach does not cure COVID-19.");

        let roles: Vec<_> = outcome.state.messages().iter().map(|m| m.role()).collect();
        assert_eq!(roles, vec![Role::Human, Role::Ai, Role::Tool, Role::Ai]);

        // The second model call saw the tool result
        let second = &mock.calls()[1];
        assert_eq!(second.len(), 3);
        assert_eq!(second[2].tool_call_id(), Some("call_1"));
    }

    #[tokio::test]
    async fn test_cap_stops_before_tools() {
        let mock = Arc::new(MockProvider::new(vec![verify_call("c1", "5g causes covid")]));

        let outcome = orchestrator(&mock, 1)
            .run(ConversationState::new("5g causes covid"))
            .await
            .unwrap();

        assert_eq!(outcome.stop_reason, StopReason::IterationCap);
        assert_eq!(mock.call_count(), 1);
        assert!(outcome.state.tool_results().is_empty());
        assert_eq!(outcome.state.last_message().map(|m| m.role()), Some(Role::Ai));
        assert!(outcome.state.last_message().unwrap().has_tool_calls());
    }

    #[tokio::test]
    async fn test_never_exceeds_cap() {
        for cap in 1..=4 {
            let script = (0..10).map(|i| verify_call(&format!("c{}", i), "x")).collect();
            let mock = Arc::new(MockProvider::new(script));

            let outcome = orchestrator(&mock, cap)
                .run(ConversationState::new("loop forever"))
                .await
                .unwrap();

            assert_eq!(mock.call_count(), cap as usize);
            assert_eq!(outcome.state.iteration_count(), cap);
            assert_eq!(outcome.state.tool_results().len(), cap as usize - 1);
            assert_eq!(outcome.stop_reason, StopReason::IterationCap);
        }
    }

    #[tokio::test]
    async fn test_direct_answer_is_one_invocation() {
        let mock = Arc::new(MockProvider::new(vec![Message::ai("Hello!")]));
        let outcome = orchestrator(&mock, 50)
            .run(ConversationState::new("hi"))
            .await
            .unwrap();

        assert_eq!(mock.call_count(), 1);
        assert_eq!(outcome.stop_reason, StopReason::Completed);
        assert_eq!(outcome.state.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_tool_messages_match_requests() {
        let mock = Arc::new(MockProvider::new(vec![
            Message::ai_with_tool_calls(
                "Checking both.",
                vec![
                    ToolCall::new("a", "verify_on_platform", json!({"claim": "5g causes covid"})),
                    ToolCall::new("b", "unknown_tool", json!({})),
                    ToolCall::new("c", "verify_on_platform", json!({})),
                ],
            ),
            Message::ai("done"),
        ]));

        let outcome = orchestrator(&mock, 10)
            .run(ConversationState::new("check"))
            .await
            .unwrap();

        let messages = outcome.state.messages();
        let ids: Vec<_> = messages[2..5].iter().filter_map(|m| m.tool_call_id()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(messages[3].content().contains("not found in available tools"));
        assert!(messages[4]
            .content()
            .starts_with("Error executing tool 'verify_on_platform'"));
        // The model was still invoked after the failures
        assert_eq!(mock.call_count(), 2);
        assert_eq!(outcome.state.tool_results().len(), 3);
    }

    #[tokio::test]
    async fn test_system_prompt_sent_once() {
        let mock = Arc::new(MockProvider::new(vec![
            verify_call("c1", "bleach cures covid"),
            verify_call("c2", "5g causes covid"),
            Message::ai("done"),
        ]));

        let outcome = orchestrator(&mock, 10)
            .with_system_prompt("You are a fact checker.")
            .run(ConversationState::new("check"))
            .await
            .unwrap();

        for history in mock.calls() {
            let systems = history.iter().filter(|m| m.role() == Role::System).count();
            assert_eq!(systems, 1);
            assert_eq!(history[0], Message::system("You are a fact checker."));
        }
        let systems = outcome
            .state
            .messages()
            .iter()
            .filter(|m| m.role() == Role::System)
            .count();
        assert_eq!(systems, 1);
    }

    #[tokio::test]
    async fn test_tools_bound_every_turn() {
        let mock = Arc::new(MockProvider::new(vec![verify_call("c1", "x"), Message::ai("ok")]));
        orchestrator(&mock, 10)
            .run(ConversationState::new("check"))
            .await
            .unwrap();

        let expected = VerifyOnPlatformTool::new().name().to_string();
        for tools in mock.tools_seen() {
            assert_eq!(tools, vec![expected.clone()]);
        }
    }

    #[tokio::test]
    async fn test_empty_input_rejected_before_model() {
        let mock = Arc::new(MockProvider::new(vec![Message::ai("unused")]));
        let err = orchestrator(&mock, 10)
            .run(ConversationState::new("   "))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_is_execution_error() {
        let mock = Arc::new(
            MockProvider::new(vec![verify_call("c1", "bleach cures covid")])
                .then_fail("Anthropic API error (529): overloaded"),
        );
        let err = orchestrator(&mock, 10)
            .run(ConversationState::new("check"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Execution);
        assert!(err.to_string().contains("overloaded"));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_reused_state_rejected() {
        let mock = Arc::new(MockProvider::new(vec![Message::ai("a")]));
        let orchestrator = orchestrator(&mock, 10);
        let outcome = orchestrator.run(ConversationState::new("q")).await.unwrap();

        let err = orchestrator.run(outcome.state).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
