//! Request handler
//!
//! Entry point for a one-off agent request: look up the configuration, gather
//! tools, build the provider, run the loop and persist the execution. Errors
//! are folded into a [`HandlerResponse`] instead of being returned.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::{AgentConfig, Orchestrator, RunOutcome};
use crate::core::{AgentError, AgentResult, ConversationState, ErrorKind, ExecutionMetadata};
use crate::llm::{create_provider, LlmProvider};
use crate::store::{ConfigStore, ExecutionRecord, ExecutionStore, PromptStore};
use crate::tools::{builtin_tools, SummaryTool, Tool, ToolProvider, ToolRegistry};

/// Builds the model backend for a configuration
pub type ProviderFactory =
    Arc<dyn Fn(&AgentConfig) -> AgentResult<Arc<dyn LlmProvider>> + Send + Sync>;

/// Answer and metadata of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub result: String,
    pub metadata: ExecutionMetadata,
}

/// Run `orchestrator` on `user_input`.
///
/// Fills in the final output of the returned state and summarizes it.
pub async fn invoke_agent(
    orchestrator: &Orchestrator,
    user_input: &str,
) -> AgentResult<(ExecutionResult, RunOutcome)> {
    if user_input.trim().is_empty() {
        return Err(AgentError::invalid("user_input cannot be empty"));
    }

    let mut outcome = orchestrator.run(ConversationState::new(user_input)).await?;
    let result = outcome.final_text().to_string();
    outcome.state.set_final_output(result.clone());

    let metadata = ExecutionMetadata::from_state(&outcome.state, outcome.stop_reason);
    Ok((ExecutionResult { result, metadata }, outcome))
}

/// What the caller of [`StandaloneHandler::handle`] gets back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
    pub result: Option<String>,
    #[serde(default)]
    pub metadata: Option<ExecutionMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HandlerResponse {
    fn ok(execution_id: String, result: ExecutionResult) -> Self {
        Self {
            success: true,
            execution_id: Some(execution_id),
            result: Some(result.result),
            metadata: Some(result.metadata),
            error: None,
        }
    }

    fn failed(error: &AgentError) -> Self {
        Self {
            success: false,
            execution_id: None,
            result: None,
            metadata: None,
            error: Some(describe_error(error)),
        }
    }
}

/// User-facing error text, prefixed by the error's kind
pub fn describe_error(error: &AgentError) -> String {
    match (error.kind(), error) {
        (_, AgentError::ConfigNotFound(_)) => error.to_string(),
        (ErrorKind::Validation, _) => format!("Validation error: {}", error),
        (ErrorKind::NotFound, _) => format!("Not found: {}", error),
        (ErrorKind::Execution, _) => format!("Execution error: {}", error),
        (ErrorKind::Internal, _) => format!("Unexpected error: {}", error),
    }
}

/// A finished, persisted execution
#[derive(Debug, Clone)]
pub struct Execution {
    pub execution_id: String,
    pub result: ExecutionResult,
    pub outcome: RunOutcome,
}

/// Runs stored agent configurations on request
pub struct StandaloneHandler {
    configs: Arc<dyn ConfigStore>,
    prompts: Arc<dyn PromptStore>,
    executions: Arc<dyn ExecutionStore>,
    tool_providers: Vec<Arc<dyn ToolProvider>>,
    builtin_tools: Option<Vec<Arc<dyn Tool>>>,
    provider_factory: ProviderFactory,
}

impl StandaloneHandler {
    pub fn new(
        configs: Arc<dyn ConfigStore>,
        prompts: Arc<dyn PromptStore>,
        executions: Arc<dyn ExecutionStore>,
    ) -> Self {
        Self {
            configs,
            prompts,
            executions,
            tool_providers: Vec::new(),
            builtin_tools: None,
            provider_factory: Arc::new(create_provider),
        }
    }

    /// Add a source of externally discovered tools
    pub fn with_tool_provider(mut self, provider: Arc<dyn ToolProvider>) -> Self {
        self.tool_providers.push(provider);
        self
    }

    /// Replace the built-in tool set
    pub fn with_builtin_tools(mut self, tools: Vec<Arc<dyn Tool>>) -> Self {
        self.builtin_tools = Some(tools);
        self
    }

    /// Replace how model backends are built
    pub fn with_provider_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&AgentConfig) -> AgentResult<Arc<dyn LlmProvider>> + Send + Sync + 'static,
    {
        self.provider_factory = Arc::new(factory);
        self
    }

    /// Handle one request. Never fails; errors end up in the response.
    pub async fn handle(&self, config_id: &str, user_input: &str) -> HandlerResponse {
        match self.execute(config_id, user_input).await {
            Ok(execution) => HandlerResponse::ok(execution.execution_id, execution.result),
            Err(e) => {
                tracing::error!("[Handler] Request for {} failed: {}", config_id, e);
                HandlerResponse::failed(&e)
            }
        }
    }

    /// Like [`handle`](Self::handle) but returns the final state too
    pub async fn execute(&self, config_id: &str, user_input: &str) -> AgentResult<Execution> {
        if user_input.trim().is_empty() {
            return Err(AgentError::invalid("user_input cannot be empty"));
        }

        let execution_id = Uuid::new_v4().to_string();
        tracing::info!("[Handler] Execution {} for {}", execution_id, config_id);

        let config = self
            .configs
            .get_config(config_id)?
            .ok_or_else(|| AgentError::ConfigNotFound(config_id.to_string()))?;
        config.validate()?;

        let orchestrator = self.instantiate(&config).await?;
        let (result, outcome) = invoke_agent(&orchestrator, user_input).await?;

        let record = ExecutionRecord::new(
            config_id,
            execution_id,
            user_input,
            result.result.clone(),
            result.metadata.clone(),
        );
        let execution_id = self.executions.save_execution(&record)?;

        tracing::info!(
            "[Handler] Execution {} finished: {} after {} iteration(s)",
            execution_id,
            outcome.stop_reason,
            result.metadata.iterations
        );

        Ok(Execution {
            execution_id,
            result,
            outcome,
        })
    }

    async fn instantiate(&self, config: &AgentConfig) -> AgentResult<Orchestrator> {
        let system_prompt = match config.prompt_id.trim() {
            "" => String::new(),
            prompt_id => self.prompts.get_prompt(prompt_id)?,
        };

        let llm = (self.provider_factory)(config)?;

        let builtins = match &self.builtin_tools {
            Some(tools) => tools.clone(),
            None => builtin_tools(SummaryTool::for_provider(llm.as_ref())),
        };
        let registry = ToolRegistry::build(&config.tools, builtins, &self.tool_providers).await;
        tracing::info!(
            "[Handler] {} tool(s) for {}: {:?}",
            registry.len(),
            config.config_id,
            registry.tool_names()
        );

        Ok(
            Orchestrator::new(llm, Arc::new(registry), config.max_iterations)
                .with_system_prompt(system_prompt),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StopReason;
    use crate::llm::{Message, MockProvider, Role, ToolCall};
    use crate::store::MemoryStore;
    use crate::tools::VerifyOnPlatformTool;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fact_checker() -> AgentConfig {
        AgentConfig::new("Fact Checker", "fact-checker")
            .with_prompt("fact-check")
            .with_tools(vec!["verify_on_platform".to_string()])
    }

    fn handler(store: Arc<MemoryStore>, llm: Arc<MockProvider>) -> StandaloneHandler {
        StandaloneHandler::new(store.clone(), store.clone(), store)
            .with_builtin_tools(vec![Arc::new(VerifyOnPlatformTool::new())])
            .with_provider_factory(move |_| Ok(llm.clone() as Arc<dyn LlmProvider>))
    }

    #[tokio::test]
    async fn test_fact_check_request_is_persisted() {
        let store = Arc::new(
            MemoryStore::new()
                .with_config(fact_checker())
                .with_prompt("fact-check", "You are a fact checker."),
        );
        let llm = Arc::new(MockProvider::new(vec![
            Message::ai_with_tool_calls(
                "",
                vec![ToolCall::new(
                    "call_1",
                    "verify_on_platform",
                    json!({"claim": "5G causes COVID"}),
                )],
            ),
            Message::ai("FALSE: 5G does not cause COVID-19."),
        ]));

        let response = handler(store.clone(), llm.clone())
            .handle("fact-checker", "Does 5G cause COVID?")
            .await;

        assert!(response.success, "{:?}", response.error);
        assert_eq!(
            response.result.as_deref(),
            Some("FALSE: 5G does not cause COVID-19.")
        );
        let metadata = response.metadata.unwrap();
        assert_eq!(metadata.iterations, 2);
        assert_eq!(metadata.tool_calls, 1);
        assert_eq!(metadata.total_messages, 5);
        assert_eq!(metadata.stop_reason, Some(StopReason::Completed));

        let execution_id = response.execution_id.unwrap();
        assert!(Uuid::parse_str(&execution_id).is_ok());
        let record = store.load_execution(&execution_id).unwrap().unwrap();
        assert_eq!(record.config_id, "fact-checker");
        assert_eq!(record.user_input, "Does 5G cause COVID?");

        let first_call = &llm.calls()[0];
        assert_eq!(first_call[0].role(), Role::System);
        assert_eq!(llm.tools_seen()[0], vec!["verify_on_platform"]);
    }

    #[tokio::test]
    async fn test_empty_input_is_validation_error() {
        let store = Arc::new(
            MemoryStore::new()
                .with_config(fact_checker())
                .with_prompt("fact-check", "p"),
        );
        let llm = Arc::new(MockProvider::new(vec![Message::ai("unused")]));

        let response = handler(store.clone(), llm.clone()).handle("fact-checker", "").await;

        assert!(!response.success);
        assert_eq!(
            response.error.as_deref(),
            Some("Validation error: Invalid request: user_input cannot be empty")
        );
        assert_eq!(llm.call_count(), 0);
        assert_eq!(store.execution_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_input_is_rejected_before_any_lookup() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = built.clone();
        let handler = StandaloneHandler::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        )
        .with_provider_factory(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(AgentError::invalid("no credentials"))
        });

        let response = handler.handle("missing", "  \n").await;

        assert_eq!(
            response.error.as_deref(),
            Some("Validation error: Invalid request: user_input cannot be empty")
        );
        assert_eq!(built.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_config() {
        let store = Arc::new(MemoryStore::new());
        let response = handler(store, Arc::new(MockProvider::new(vec![])))
            .handle("nope", "hi")
            .await;

        assert!(!response.success);
        assert_eq!(
            response.error.as_deref(),
            Some("Agent configuration not found for config_id: nope")
        );
        assert!(response.result.is_none());
    }

    #[tokio::test]
    async fn test_missing_prompt_is_not_found() {
        let store = Arc::new(MemoryStore::new().with_config(fact_checker()));
        let response = handler(store, Arc::new(MockProvider::new(vec![])))
            .handle("fact-checker", "hi")
            .await;

        assert_eq!(
            response.error.as_deref(),
            Some("Not found: Prompt fact-check not found")
        );
    }

    #[tokio::test]
    async fn test_provider_failure_is_execution_error() {
        let store = Arc::new(
            MemoryStore::new()
                .with_config(fact_checker())
                .with_prompt("fact-check", "p"),
        );
        let llm = Arc::new(MockProvider::new(vec![]).then_fail("rate limited"));

        let response = handler(store.clone(), llm).handle("fact-checker", "hi").await;

        let error = response.error.unwrap();
        assert!(error.starts_with("Execution error:"), "{}", error);
        assert!(error.contains("rate limited"));
        assert_eq!(store.execution_count(), 0);
    }

    #[tokio::test]
    async fn test_invoke_agent_without_tools() {
        let llm = Arc::new(MockProvider::new(vec![Message::ai("Paris")]));
        let orchestrator = Orchestrator::new(llm, Arc::new(ToolRegistry::new()), 3);

        let (result, outcome) = invoke_agent(&orchestrator, "Capital of France?").await.unwrap();

        assert_eq!(result.result, "Paris");
        assert_eq!(result.metadata.iterations, 1);
        assert_eq!(result.metadata.tool_calls, 0);
        assert_eq!(outcome.state.final_output(), Some("Paris"));
    }

    #[test]
    fn test_response_serialization() {
        let response = HandlerResponse::failed(&AgentError::invalid("bad"));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Validation error: Invalid request: bad");
        assert!(json["result"].is_null());
        assert!(json.get("execution_id").is_none());
    }
}
