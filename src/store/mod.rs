//! Persistence collaborators
//!
//! The runner needs three lookups: agent configurations, system prompts and a
//! place to record finished executions. Each is a small trait so the handler
//! can run against files on disk ([`FileStore`]) or in memory
//! ([`MemoryStore`]).

mod file;
mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::AgentConfig;
use crate::core::{AgentError, AgentResult, ExecutionMetadata};

pub use file::FileStore;
pub use memory::MemoryStore;

/// Environment variable naming the store directory
pub const STORE_DIR_ENV: &str = "AGENT_STORE_DIR";

/// Default store directory
pub const DEFAULT_STORE_DIR: &str = "store";

/// Agent configuration lookup
pub trait ConfigStore: Send + Sync {
    /// Configuration for `config_id`, or `None` when absent
    fn get_config(&self, config_id: &str) -> AgentResult<Option<AgentConfig>>;

    /// Create or replace a configuration
    fn save_config(&self, config: &AgentConfig) -> AgentResult<()>;

    /// All stored configurations, ordered by config id
    fn list_configs(&self) -> AgentResult<Vec<AgentConfig>>;

    fn delete_config(&self, config_id: &str) -> AgentResult<()>;
}

/// System prompt lookup
pub trait PromptStore: Send + Sync {
    /// Prompt text; a missing prompt is [`AgentError::PromptNotFound`]
    fn get_prompt(&self, prompt_id: &str) -> AgentResult<String>;

    /// Create or replace a prompt
    fn save_prompt(&self, prompt_id: &str, content: &str) -> AgentResult<()>;

    /// Ids of all stored prompts, sorted
    fn list_prompts(&self) -> AgentResult<Vec<String>>;
}

/// Execution history
pub trait ExecutionStore: Send + Sync {
    /// Persist a finished execution and return its id
    fn save_execution(&self, record: &ExecutionRecord) -> AgentResult<String>;

    fn load_execution(&self, execution_id: &str) -> AgentResult<Option<ExecutionRecord>>;

    /// Executions of one configuration, most recent first, at most `max_results`
    fn list_executions(&self, config_id: &str, max_results: usize)
        -> AgentResult<Vec<ExecutionRecord>>;

    fn delete_execution(&self, execution_id: &str) -> AgentResult<()>;
}

/// One persisted agent execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub execution_id: String,
    pub config_id: String,
    pub user_input: String,
    /// Text of the final message
    pub result: String,
    pub metadata: ExecutionMetadata,
    /// When the record was created (UTC)
    pub timestamp: DateTime<Utc>,
}

impl ExecutionRecord {
    /// Create a record stamped with the current time
    pub fn new(
        config_id: impl Into<String>,
        execution_id: impl Into<String>,
        user_input: impl Into<String>,
        result: impl Into<String>,
        metadata: ExecutionMetadata,
    ) -> Self {
        Self {
            execution_id: execution_id.into(),
            config_id: config_id.into(),
            user_input: user_input.into(),
            result: result.into(),
            metadata,
            timestamp: Utc::now(),
        }
    }
}

/// Reject ids that cannot be used as a single file name
pub(crate) fn check_id(kind: &str, id: &str) -> AgentResult<()> {
    if id.trim().is_empty() {
        return Err(AgentError::invalid(format!("{} cannot be empty", kind)));
    }
    if id.contains(['/', '\\']) || id == "." || id == ".." {
        return Err(AgentError::invalid(format!("invalid {}: {}", kind, id)));
    }
    Ok(())
}

/// Most recent first, truncated to `max_results`
pub(crate) fn newest_first(mut records: Vec<ExecutionRecord>, max_results: usize) -> Vec<ExecutionRecord> {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records.truncate(max_results);
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_id() {
        assert!(check_id("config_id", "fake-news-detector").is_ok());
        assert!(check_id("config_id", "").is_err());
        assert!(check_id("config_id", "../etc/passwd").is_err());
        assert!(check_id("prompt_id", "..").is_err());
    }

    #[test]
    fn test_record_serializes_rfc3339() {
        let record = ExecutionRecord::new("cfg", "exec", "q", "a", ExecutionMetadata::default());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["execution_id"], "exec");
        let ts = json["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
    }
}
