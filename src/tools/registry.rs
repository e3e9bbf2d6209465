//! Tool registry for managing available tools
//!
//! The registry holds the tools bound to one run. It is built from
//! dynamically discovered tools (via [`ToolProvider`]s) followed by the
//! built-in set, filtered by the configured tool names, and shared read-only
//! afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use super::provider::ToolProvider;
use super::tool::Tool;
use crate::llm::ToolDefinition;

/// Registry that holds all available tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Registration order, used for deterministic definitions
    order: Vec<String>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Build the registry for one run.
    ///
    /// An empty `names` list keeps every tool; otherwise only tools whose name
    /// is listed are kept and unknown names are ignored. Discovered tools are
    /// registered before built-ins, so a built-in replaces a discovered tool of
    /// the same name. A provider that fails to list its tools is skipped.
    pub async fn build(
        names: &[String],
        builtins: Vec<Arc<dyn Tool>>,
        providers: &[Arc<dyn ToolProvider>],
    ) -> Self {
        let wanted = |name: &str| names.is_empty() || names.iter().any(|n| n == name);
        let mut registry = Self::new();

        for provider in providers {
            match provider.get_tools().await {
                Ok(tools) => {
                    for tool in tools.into_iter().filter(|t| wanted(t.name())) {
                        tracing::info!(
                            "[ToolRegistry] Registering tool '{}' from provider '{}'",
                            tool.name(),
                            provider.name()
                        );
                        registry.register_arc(tool);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        "[ToolRegistry] Skipping provider '{}': {:#}",
                        provider.name(),
                        e
                    );
                }
            }
        }

        for tool in builtins.into_iter().filter(|t| wanted(t.name())) {
            registry.register_arc(tool);
        }

        for name in names.iter().filter(|n| !registry.contains(n.as_str())) {
            tracing::debug!("[ToolRegistry] Ignoring unknown tool '{}'", name);
        }

        tracing::info!("[ToolRegistry] Bound tools: {:?}", registry.tool_names());
        registry
    }

    /// Register a static tool in the registry
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    /// Register a shared tool, replacing any tool with the same name
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::warn!("[ToolRegistry] Tool '{}' replaced", name);
        } else {
            tracing::info!("Registering tool: {}", name);
            self.order.push(name);
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Whether a tool with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tool definitions in registration order
    pub fn get_definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| t.definition())
            .collect()
    }

    /// Get the list of tool names in registration order
    pub fn tool_names(&self) -> Vec<&str> {
        self.order.iter().map(|s| s.as_str()).collect()
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ToolInputSchema;
    use crate::tools::ToolResult;
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::Value;

    struct NamedTool(&'static str);

    #[async_trait]
    impl Tool for NamedTool {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "test tool"
        }

        fn input_schema(&self) -> ToolInputSchema {
            ToolInputSchema::new()
        }

        async fn execute(&self, _input: &Value) -> Result<ToolResult> {
            Ok(ToolResult::success(self.0))
        }
    }

    struct StaticProvider(Vec<&'static str>);

    #[async_trait]
    impl ToolProvider for StaticProvider {
        async fn get_tools(&self) -> Result<Vec<Arc<dyn Tool>>> {
            Ok(self
                .0
                .iter()
                .map(|n| Arc::new(NamedTool(*n)) as Arc<dyn Tool>)
                .collect())
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    struct BrokenProvider;

    #[async_trait]
    impl ToolProvider for BrokenProvider {
        async fn get_tools(&self) -> Result<Vec<Arc<dyn Tool>>> {
            anyhow::bail!("server unreachable")
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    fn builtins() -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(NamedTool("search_internet")),
            Arc::new(NamedTool("summary_long_text")),
            Arc::new(NamedTool("verify_on_platform")),
        ]
    }

    #[test]
    fn test_empty_registry() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.get("nonexistent").is_none());
    }

    #[tokio::test]
    async fn test_empty_names_bind_all_builtins() {
        let registry = ToolRegistry::build(&[], builtins(), &[]).await;
        assert_eq!(
            registry.tool_names(),
            vec!["search_internet", "summary_long_text", "verify_on_platform"]
        );
    }

    #[tokio::test]
    async fn test_unknown_names_are_dropped() {
        let names = vec!["verify_on_platform".to_string(), "teleport".to_string()];
        let registry = ToolRegistry::build(&names, builtins(), &[]).await;
        assert_eq!(registry.tool_names(), vec!["verify_on_platform"]);
        assert!(registry.get("teleport").is_none());
    }

    #[tokio::test]
    async fn test_discovered_tools_use_same_filter() {
        let providers: Vec<Arc<dyn ToolProvider>> = vec![
            Arc::new(BrokenProvider),
            Arc::new(StaticProvider(vec!["fact_db", "weather"])),
        ];
        let names = vec!["fact_db".to_string(), "search_internet".to_string()];
        let registry = ToolRegistry::build(&names, builtins(), &providers).await;

        assert_eq!(registry.tool_names(), vec!["fact_db", "search_internet"]);
        let defs = registry.get_definitions();
        assert_eq!(defs[0].name, "fact_db");
    }

    #[tokio::test]
    async fn test_builtin_replaces_discovered_tool() {
        let providers: Vec<Arc<dyn ToolProvider>> =
            vec![Arc::new(StaticProvider(vec!["verify_on_platform"]))];
        let registry = ToolRegistry::build(&[], builtins(), &providers).await;
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.tool_names()[0], "verify_on_platform");
    }
}
