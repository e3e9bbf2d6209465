//! In-memory store, used by tests and embedders that keep state elsewhere

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{
    check_id, newest_first, ConfigStore, ExecutionRecord, ExecutionStore, PromptStore,
};
use crate::agent::AgentConfig;
use crate::core::{AgentError, AgentResult};

#[derive(Debug, Default)]
pub struct MemoryStore {
    configs: RwLock<BTreeMap<String, AgentConfig>>,
    prompts: RwLock<BTreeMap<String, String>>,
    executions: RwLock<HashMap<String, ExecutionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a configuration
    pub fn with_config(self, config: AgentConfig) -> Self {
        if let Ok(mut configs) = self.configs.write() {
            configs.insert(config.config_id.clone(), config);
        }
        self
    }

    /// Seed a prompt
    pub fn with_prompt(self, prompt_id: impl Into<String>, content: impl Into<String>) -> Self {
        if let Ok(mut prompts) = self.prompts.write() {
            prompts.insert(prompt_id.into(), content.into());
        }
        self
    }

    /// Number of stored executions across all configurations
    pub fn execution_count(&self) -> usize {
        self.executions.read().map(|e| e.len()).unwrap_or(0)
    }
}

fn read<T>(lock: &RwLock<T>) -> AgentResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| AgentError::storage("memory store lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> AgentResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| AgentError::storage("memory store lock poisoned"))
}

impl ConfigStore for MemoryStore {
    fn get_config(&self, config_id: &str) -> AgentResult<Option<AgentConfig>> {
        Ok(read(&self.configs)?.get(config_id).cloned())
    }

    fn save_config(&self, config: &AgentConfig) -> AgentResult<()> {
        check_id("config_id", &config.config_id)?;
        write(&self.configs)?.insert(config.config_id.clone(), config.clone());
        Ok(())
    }

    fn list_configs(&self) -> AgentResult<Vec<AgentConfig>> {
        Ok(read(&self.configs)?.values().cloned().collect())
    }

    fn delete_config(&self, config_id: &str) -> AgentResult<()> {
        write(&self.configs)?.remove(config_id);
        Ok(())
    }
}

impl PromptStore for MemoryStore {
    fn get_prompt(&self, prompt_id: &str) -> AgentResult<String> {
        read(&self.prompts)?
            .get(prompt_id)
            .cloned()
            .ok_or_else(|| AgentError::PromptNotFound(prompt_id.to_string()))
    }

    fn save_prompt(&self, prompt_id: &str, content: &str) -> AgentResult<()> {
        check_id("prompt_id", prompt_id)?;
        write(&self.prompts)?.insert(prompt_id.to_string(), content.to_string());
        Ok(())
    }

    fn list_prompts(&self) -> AgentResult<Vec<String>> {
        Ok(read(&self.prompts)?.keys().cloned().collect())
    }
}

impl ExecutionStore for MemoryStore {
    fn save_execution(&self, record: &ExecutionRecord) -> AgentResult<String> {
        check_id("execution_id", &record.execution_id)?;
        write(&self.executions)?.insert(record.execution_id.clone(), record.clone());
        Ok(record.execution_id.clone())
    }

    fn load_execution(&self, execution_id: &str) -> AgentResult<Option<ExecutionRecord>> {
        Ok(read(&self.executions)?.get(execution_id).cloned())
    }

    fn list_executions(
        &self,
        config_id: &str,
        max_results: usize,
    ) -> AgentResult<Vec<ExecutionRecord>> {
        let records = read(&self.executions)?
            .values()
            .filter(|r| r.config_id == config_id)
            .cloned()
            .collect();
        Ok(newest_first(records, max_results))
    }

    fn delete_execution(&self, execution_id: &str) -> AgentResult<()> {
        write(&self.executions)?.remove(execution_id);
        Ok(())
    }
}
