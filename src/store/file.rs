//! File-backed store
//!
//! Layout under the base directory:
//!
//! ```text
//! agents/<config_id>.json
//! prompts/<prompt_id>.txt
//! executions/<execution_id>.json
//! ```

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{
    check_id, newest_first, ConfigStore, ExecutionRecord, ExecutionStore, PromptStore,
    DEFAULT_STORE_DIR, STORE_DIR_ENV,
};
use crate::agent::AgentConfig;
use crate::core::{AgentError, AgentResult};

const AGENTS_DIR: &str = "agents";
const PROMPTS_DIR: &str = "prompts";
const EXECUTIONS_DIR: &str = "executions";

/// Store that keeps everything as files under one directory
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a new store with the default directory
    pub fn new() -> Self {
        Self::with_dir(DEFAULT_STORE_DIR)
    }

    /// Create a new store with a custom directory
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: dir.into(),
        }
    }

    /// Store at `AGENT_STORE_DIR`, or the default directory
    pub fn from_env() -> Self {
        match std::env::var(STORE_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => Self::with_dir(dir),
            _ => Self::new(),
        }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config_path(&self, config_id: &str) -> PathBuf {
        self.base_dir.join(AGENTS_DIR).join(format!("{}.json", config_id))
    }

    pub fn prompt_path(&self, prompt_id: &str) -> PathBuf {
        self.base_dir.join(PROMPTS_DIR).join(format!("{}.txt", prompt_id))
    }

    pub fn execution_path(&self, execution_id: &str) -> PathBuf {
        self.base_dir
            .join(EXECUTIONS_DIR)
            .join(format!("{}.json", execution_id))
    }

    /// Every configuration file with its parse result, sorted by file name.
    ///
    /// Unlike [`ConfigStore::list_configs`] a broken file does not fail the
    /// whole listing.
    pub fn load_all_configs(&self) -> AgentResult<Vec<(PathBuf, AgentResult<AgentConfig>)>> {
        Ok(self
            .files_with_extension(AGENTS_DIR, "json")?
            .into_iter()
            .map(|path| {
                let config = read_json::<AgentConfig>(&path);
                (path, config)
            })
            .collect())
    }

    /// Every prompt file with its content, sorted by file name
    pub fn load_all_prompts(&self) -> AgentResult<Vec<(PathBuf, AgentResult<String>)>> {
        Ok(self
            .files_with_extension(PROMPTS_DIR, "txt")?
            .into_iter()
            .map(|path| {
                let content = fs::read_to_string(&path).map_err(AgentError::from);
                (path, content)
            })
            .collect())
    }

    fn ensure_dir(&self, sub: &str) -> AgentResult<PathBuf> {
        let dir = self.base_dir.join(sub);
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(dir)
    }

    fn files_with_extension(&self, sub: &str, ext: &str) -> AgentResult<Vec<PathBuf>> {
        let dir = self.base_dir.join(sub);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(ext) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> AgentResult<T> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> AgentResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

impl ConfigStore for FileStore {
    fn get_config(&self, config_id: &str) -> AgentResult<Option<AgentConfig>> {
        check_id("config_id", config_id)?;
        let path = self.config_path(config_id);
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    fn save_config(&self, config: &AgentConfig) -> AgentResult<()> {
        check_id("config_id", &config.config_id)?;
        self.ensure_dir(AGENTS_DIR)?;
        write_json(&self.config_path(&config.config_id), config)?;
        tracing::info!("[FileStore] Saved config {}", config.config_id);
        Ok(())
    }

    fn list_configs(&self) -> AgentResult<Vec<AgentConfig>> {
        let mut configs = self
            .files_with_extension(AGENTS_DIR, "json")?
            .iter()
            .map(|path| read_json::<AgentConfig>(path))
            .collect::<AgentResult<Vec<_>>>()?;
        configs.sort_by(|a, b| a.config_id.cmp(&b.config_id));
        Ok(configs)
    }

    fn delete_config(&self, config_id: &str) -> AgentResult<()> {
        check_id("config_id", config_id)?;
        let path = self.config_path(config_id);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

impl PromptStore for FileStore {
    fn get_prompt(&self, prompt_id: &str) -> AgentResult<String> {
        check_id("prompt_id", prompt_id)?;
        let path = self.prompt_path(prompt_id);
        if !path.exists() {
            return Err(AgentError::PromptNotFound(prompt_id.to_string()));
        }
        Ok(fs::read_to_string(&path)?)
    }

    fn save_prompt(&self, prompt_id: &str, content: &str) -> AgentResult<()> {
        check_id("prompt_id", prompt_id)?;
        self.ensure_dir(PROMPTS_DIR)?;
        fs::write(self.prompt_path(prompt_id), content)?;
        tracing::info!("[FileStore] Saved prompt {}", prompt_id);
        Ok(())
    }

    fn list_prompts(&self) -> AgentResult<Vec<String>> {
        Ok(self
            .files_with_extension(PROMPTS_DIR, "txt")?
            .iter()
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect())
    }
}

impl ExecutionStore for FileStore {
    fn save_execution(&self, record: &ExecutionRecord) -> AgentResult<String> {
        check_id("execution_id", &record.execution_id)?;
        self.ensure_dir(EXECUTIONS_DIR)?;
        write_json(&self.execution_path(&record.execution_id), record).map_err(|e| {
            AgentError::storage(format!(
                "Failed to save execution {}: {}",
                record.execution_id, e
            ))
        })?;
        tracing::info!(
            "[FileStore] Saved execution {} for {}",
            record.execution_id,
            record.config_id
        );
        Ok(record.execution_id.clone())
    }

    fn load_execution(&self, execution_id: &str) -> AgentResult<Option<ExecutionRecord>> {
        check_id("execution_id", execution_id)?;
        let path = self.execution_path(execution_id);
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    fn list_executions(
        &self,
        config_id: &str,
        max_results: usize,
    ) -> AgentResult<Vec<ExecutionRecord>> {
        let mut records = Vec::new();
        for path in self.files_with_extension(EXECUTIONS_DIR, "json")? {
            match read_json::<ExecutionRecord>(&path) {
                Ok(record) if record.config_id == config_id => records.push(record),
                Ok(_) => {}
                Err(e) => tracing::warn!("[FileStore] Skipping {}: {}", path.display(), e),
            }
        }
        Ok(newest_first(records, max_results))
    }

    fn delete_execution(&self, execution_id: &str) -> AgentResult<()> {
        check_id("execution_id", execution_id)?;
        let path = self.execution_path(execution_id);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}
