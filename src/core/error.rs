//! Agent error types

use thiserror::Error;

/// Broad classification of an [`AgentError`], used by callers to tell
/// "nothing to run" apart from "ran and broke".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request was rejected before the loop started
    Validation,
    /// A configuration or prompt referenced by the request does not exist
    NotFound,
    /// The loop started and a model backend failed
    Execution,
    /// Storage or serialization problems outside the loop
    Internal,
}

/// Errors that can occur while preparing or running an agent
#[derive(Error, Debug)]
pub enum AgentError {
    /// Request rejected before any model call (empty input, bad config, ...)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration id has no stored configuration
    #[error("Agent configuration not found for config_id: {0}")]
    ConfigNotFound(String),

    /// Prompt id has no stored prompt
    #[error("Prompt {0} not found")]
    PromptNotFound(String),

    /// Configuration names a provider kind we cannot build
    #[error("Unsupported LLM provider: {0}")]
    UnsupportedProvider(String),

    /// Model backend failed during the run
    #[error("Agent execution failed: {0:#}")]
    ExecutionFailed(#[source] anyhow::Error),

    /// Persistence collaborator failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AgentError {
    /// Create an invalid request error
    pub fn invalid(msg: impl Into<String>) -> Self {
        AgentError::InvalidRequest(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        AgentError::Storage(msg.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AgentError::InvalidRequest(_) | AgentError::UnsupportedProvider(_) => {
                ErrorKind::Validation
            }
            AgentError::ConfigNotFound(_) | AgentError::PromptNotFound(_) => ErrorKind::NotFound,
            AgentError::ExecutionFailed(_) => ErrorKind::Execution,
            AgentError::Storage(_) | AgentError::Io(_) | AgentError::Serialization(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Result type alias for agent operations
pub type AgentResult<T> = Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AgentError::ConfigNotFound("fake-news".into());
        assert_eq!(
            err.to_string(),
            "Agent configuration not found for config_id: fake-news"
        );

        let err = AgentError::UnsupportedProvider("cohere".into());
        assert_eq!(err.to_string(), "Unsupported LLM provider: cohere");
    }

    #[test]
    fn test_execution_failure_keeps_cause() {
        let cause = anyhow::anyhow!("connection refused").context("Failed to reach Anthropic API");
        let err = AgentError::ExecutionFailed(cause);
        let text = err.to_string();
        assert!(text.contains("Failed to reach Anthropic API"));
        assert!(text.contains("connection refused"));
        assert_eq!(err.kind(), ErrorKind::Execution);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(AgentError::invalid("empty").kind(), ErrorKind::Validation);
        assert_eq!(
            AgentError::UnsupportedProvider("x".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(AgentError::PromptNotFound("p".into()).kind(), ErrorKind::NotFound);
        assert_eq!(AgentError::storage("disk full").kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let agent_err: AgentError = io_err.into();
        assert!(matches!(agent_err, AgentError::Io(_)));
    }
}
