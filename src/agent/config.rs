//! Agent Configuration
//!
//! Stored, read-only description of an agent: which model backend to drive,
//! which prompt to load and which tools to bind. Loaded through a
//! [`ConfigStore`](crate::store::ConfigStore) and never mutated by a run.
//!
//! ```ignore
//! let config = AgentConfig::new("Fake News Detector", "fake-news-detector")
//!     .with_prompt("fake-news-prompt")
//!     .with_tools(vec!["verify_on_platform".into()])
//!     .with_max_iterations(5);
//! config.validate()?;
//! ```

use serde::{Deserialize, Serialize};

use crate::core::{AgentError, AgentResult};
use crate::llm::ProviderKind;

fn default_provider() -> String {
    "anthropic".to_string()
}

fn default_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_max_iterations() -> u32 {
    10
}

/// Retrieval settings attached to an agent. Carried as data only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "KnowledgeBaseConfig::default_vector_store")]
    pub vector_store: String,
    #[serde(default)]
    pub index_name: String,
    #[serde(default = "KnowledgeBaseConfig::default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "KnowledgeBaseConfig::default_top_k")]
    pub top_k: u32,
}

impl KnowledgeBaseConfig {
    fn default_vector_store() -> String {
        "chroma".to_string()
    }

    fn default_embedding_model() -> String {
        "text-embedding-3-small".to_string()
    }

    fn default_top_k() -> u32 {
        5
    }
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            vector_store: Self::default_vector_store(),
            index_name: String::new(),
            embedding_model: Self::default_embedding_model(),
            top_k: Self::default_top_k(),
        }
    }
}

/// Leaf sub-agent description.
///
/// Same shape as [`AgentConfig`] without nested sub-agents. Sub-agents are
/// stored and displayed but never executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubAgentConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub config_id: String,
    /// Config id of the owning agent
    #[serde(default)]
    pub agent_config_id: String,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub prompt_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_base: Option<KnowledgeBaseConfig>,
    #[serde(default = "default_provider")]
    pub llm_provider: String,
    #[serde(default = "default_model")]
    pub model_id: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

/// Configuration for one runnable agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Display name
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Lookup key used by callers
    pub config_id: String,

    /// Tool names to bind; empty means every built-in tool
    #[serde(default)]
    pub tools: Vec<String>,

    /// Id of the system prompt; empty means no system prompt
    #[serde(default)]
    pub prompt_id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_agents: Vec<SubAgentConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_base: Option<KnowledgeBaseConfig>,

    /// Backend kind: "anthropic", "openai" or "bedrock"
    #[serde(default = "default_provider")]
    pub llm_provider: String,

    /// Backend model identifier
    #[serde(default = "default_model")]
    pub model_id: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Upper bound on model invocations per run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

impl AgentConfig {
    /// Create a configuration with the default model settings
    pub fn new(name: impl Into<String>, config_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            config_id: config_id.into(),
            tools: Vec::new(),
            prompt_id: String::new(),
            sub_agents: Vec::new(),
            knowledge_base: None,
            llm_provider: default_provider(),
            model_id: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_iterations: default_max_iterations(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the system prompt id
    pub fn with_prompt(mut self, prompt_id: impl Into<String>) -> Self {
        self.prompt_id = prompt_id.into();
        self
    }

    /// Restrict the run to the named tools
    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.tools = tools;
        self
    }

    /// Set provider kind and model id
    pub fn with_model(mut self, provider: impl Into<String>, model_id: impl Into<String>) -> Self {
        self.llm_provider = provider.into();
        self.model_id = model_id.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the iteration cap
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_sub_agent(mut self, sub_agent: SubAgentConfig) -> Self {
        self.sub_agents.push(sub_agent);
        self
    }

    /// Parsed provider kind
    pub fn provider_kind(&self) -> AgentResult<ProviderKind> {
        self.llm_provider.parse()
    }

    /// Check the configuration before a run.
    ///
    /// Rejects missing required fields, a zero iteration cap or token budget,
    /// a temperature outside `[0, 2]` and unknown provider kinds.
    pub fn validate(&self) -> AgentResult<()> {
        if self.name.trim().is_empty() {
            return Err(AgentError::invalid("missing required field 'name'"));
        }
        if self.config_id.trim().is_empty() {
            return Err(AgentError::invalid("missing required field 'config_id'"));
        }
        if self.llm_provider.trim().is_empty() {
            return Err(AgentError::invalid("missing required field 'llm_provider'"));
        }
        if self.model_id.trim().is_empty() {
            return Err(AgentError::invalid("missing required field 'model_id'"));
        }
        if self.max_iterations == 0 {
            return Err(AgentError::invalid("max_iterations must be at least 1"));
        }
        if self.max_tokens == 0 {
            return Err(AgentError::invalid("max_tokens must be at least 1"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AgentError::invalid(format!(
                "temperature must be within [0, 2], got {}",
                self.temperature
            )));
        }
        self.provider_kind()?;
        Ok(())
    }
}
