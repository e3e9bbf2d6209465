//! Tool Provider trait
//!
//! Abstraction for dynamically discovered tool sources (protocol servers and
//! similar). None ship with the crate; embedders plug their own in.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::tool::Tool;

/// Trait for dynamic tool providers
///
/// Tools are fetched once when a run's registry is built.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Get all tools from this provider
    async fn get_tools(&self) -> Result<Vec<Arc<dyn Tool>>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &str;
}
