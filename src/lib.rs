//! Standalone tool-calling agent runner
//!
//! Runs a stored agent configuration once against a user request: the model is
//! invoked in a bounded loop, any tool calls it makes are executed and fed
//! back, and the final answer is persisted with execution metadata.

pub mod core;
pub mod tools;

// Model backends
pub mod llm;

// The orchestrator and its configuration
pub mod agent;

// Persistence and the request entry point
pub mod handler;
pub mod store;

// Optional components
pub mod cli;
pub mod logging;

pub use agent::{AgentConfig, Orchestrator, RunOutcome};
pub use core::{AgentError, AgentResult, ConversationState, ExecutionMetadata, StopReason};
pub use handler::{invoke_agent, ExecutionResult, HandlerResponse, StandaloneHandler};
