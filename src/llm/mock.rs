//! Scripted provider for tests and offline runs

use anyhow::{anyhow, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::provider::{GenerationSettings, LlmProvider};
use super::types::{Message, ToolDefinition};

/// A mock provider that returns pre-configured responses in order.
///
/// Every invocation records the history and tool names it was given. Once the
/// script is exhausted it answers with an empty AI message.
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<Result<Message, String>>>>,
    calls: Arc<Mutex<Vec<Vec<Message>>>>,
    tools_seen: Arc<Mutex<Vec<Vec<String>>>>,
    settings: GenerationSettings,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of responses
    pub fn new(responses: Vec<Message>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().map(Ok).collect())),
            calls: Arc::new(Mutex::new(Vec::new())),
            tools_seen: Arc::new(Mutex::new(Vec::new())),
            settings: GenerationSettings::new("mock-model", 0.0, 1024),
        }
    }

    /// Queue a backend failure after the responses given so far
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(Err(message.into()));
        }
        self
    }

    /// Number of times `invoke` was called
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    /// Histories received, one per invocation
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Tool names bound on each invocation
    pub fn tools_seen(&self) -> Vec<Vec<String>> {
        self.tools_seen.lock().map(|t| t.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl LlmProvider for MockProvider {
    async fn invoke(&self, history: &[Message], tools: &[ToolDefinition]) -> Result<Message> {
        self.calls
            .lock()
            .map_err(|_| anyhow!("mock provider lock poisoned"))?
            .push(history.to_vec());
        self.tools_seen
            .lock()
            .map_err(|_| anyhow!("mock provider lock poisoned"))?
            .push(tools.iter().map(|t| t.name.clone()).collect());

        let next = self
            .responses
            .lock()
            .map_err(|_| anyhow!("mock provider lock poisoned"))?
            .pop_front();

        match next {
            Some(Ok(message)) => Ok(message),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Ok(Message::ai("")),
        }
    }

    fn model(&self) -> String {
        self.settings.model.clone()
    }

    fn provider_name(&self) -> &str {
        "mock"
    }

    /// Variants share the script and the call log
    fn create_variant(&self, settings: GenerationSettings) -> Arc<dyn LlmProvider> {
        Arc::new(Self {
            responses: self.responses.clone(),
            calls: self.calls.clone(),
            tools_seen: self.tools_seen.clone(),
            settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_then_empty() {
        let mock = MockProvider::new(vec![Message::ai("first")]);
        let reply = mock.invoke(&[Message::human("hi")], &[]).await.unwrap();
        assert_eq!(reply.content(), "first");

        let reply = mock.invoke(&[Message::human("hi")], &[]).await.unwrap();
        assert_eq!(reply, Message::ai(""));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let mock = MockProvider::new(vec![]).then_fail("backend down");
        let err = mock.invoke(&[], &[]).await.unwrap_err();
        assert_eq!(err.to_string(), "backend down");
    }
}
