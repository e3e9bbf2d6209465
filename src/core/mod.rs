//! Core types for the agent runner
//!
//! This module provides the fundamental types used throughout the crate:
//! - `ConversationState` - The state of one run
//! - `LoopState` / `StopReason` - Orchestrator progress
//! - `AgentError` - Error types

pub mod error;
pub mod state;

pub use error::{AgentError, AgentResult, ErrorKind};
pub use state::{ConversationState, ExecutionMetadata, LoopState, StopReason, ToolRecord};
