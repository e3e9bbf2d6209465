//! Agent loop
//!
//! - `AgentConfig` - stored description of an agent
//! - `Orchestrator` - the bounded tool-calling loop
//! - `ToolExecutor` - runs one AI message's tool calls
//! - `decide` - termination policy

pub mod config;
pub mod executor;
pub mod orchestrator;
pub mod policy;

pub use config::{AgentConfig, KnowledgeBaseConfig, SubAgentConfig};
pub use executor::{ToolExecutor, ToolTurn};
pub use orchestrator::{Orchestrator, RunOutcome};
pub use policy::{decide, Decision};
