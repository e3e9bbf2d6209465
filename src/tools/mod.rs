//! Tool system for the agent runner
//!
//! This module provides:
//! - `Tool` trait - Interface for implementing tools
//! - `ToolResult` - Result type for tool execution
//! - `ToolRegistry` - The tools bound to one run
//! - `ToolProvider` trait - Interface for dynamically discovered tool sources
//! - `builtin` - search_internet, summary_long_text, verify_on_platform

mod provider;
mod registry;
mod tool;

pub mod builtin;

// Core exports
pub use provider::ToolProvider;
pub use registry::ToolRegistry;
pub use tool::{required_str, Tool, ToolResult};

pub use builtin::{
    builtin_tools, SearchInternetTool, SummaryTool, VerifyOnPlatformTool, BUILTIN_TOOL_NAMES,
};
