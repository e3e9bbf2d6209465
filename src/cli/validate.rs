//! Store validation
//!
//! Checks every configuration and prompt file in a [`FileStore`] without
//! stopping at the first broken one.

use std::path::Path;

use crate::core::AgentResult;
use crate::store::FileStore;

/// Outcome for one file
#[derive(Debug, Clone, PartialEq)]
pub struct FileCheck {
    pub file: String,
    pub ok: bool,
    pub message: String,
}

impl FileCheck {
    fn pass(file: String, message: impl Into<String>) -> Self {
        Self {
            file,
            ok: true,
            message: message.into(),
        }
    }

    fn fail(file: String, message: impl Into<String>) -> Self {
        Self {
            file,
            ok: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub configs: Vec<FileCheck>,
    pub prompts: Vec<FileCheck>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.configs.iter().chain(&self.prompts).all(|c| c.ok)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Validate all configurations and prompts in `store`.
///
/// A configuration fails when it does not parse, fails
/// [`AgentConfig::validate`](crate::agent::AgentConfig::validate) or names a
/// prompt that is not stored. A prompt fails when it is blank.
pub fn validate_store(store: &FileStore) -> AgentResult<ValidationReport> {
    let mut report = ValidationReport::default();
    let mut prompt_ids = Vec::new();

    for (path, content) in store.load_all_prompts()? {
        let name = file_name(&path);
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            prompt_ids.push(stem.to_string());
        }
        let check = match content {
            Ok(text) if text.trim().is_empty() => FileCheck::fail(name, "empty prompt"),
            Ok(text) => FileCheck::pass(name, format!("valid ({} chars)", text.chars().count())),
            Err(e) => FileCheck::fail(name, format!("error - {}", e)),
        };
        report.prompts.push(check);
    }

    for (path, parsed) in store.load_all_configs()? {
        let name = file_name(&path);
        let check = match parsed {
            Err(e) => FileCheck::fail(name, format!("invalid JSON - {}", e)),
            Ok(config) => match config.validate() {
                Err(e) => FileCheck::fail(name, e.to_string()),
                Ok(()) if !config.prompt_id.is_empty()
                    && !prompt_ids.contains(&config.prompt_id) =>
                {
                    FileCheck::fail(name, format!("prompt '{}' not found", config.prompt_id))
                }
                Ok(()) => FileCheck::pass(name, "valid"),
            },
        };
        report.configs.push(check);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentConfig;
    use crate::store::{ConfigStore, PromptStore};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_valid_store() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::with_dir(temp.path());
        store.save_prompt("p", "You are careful.").unwrap();
        store
            .save_config(&AgentConfig::new("Checker", "checker").with_prompt("p"))
            .unwrap();

        let report = validate_store(&store).unwrap();
        assert!(report.passed());
        assert_eq!(report.configs[0].file, "checker.json");
        assert_eq!(report.prompts[0].message, "valid (16 chars)");
    }

    #[test]
    fn test_reports_every_problem() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::with_dir(temp.path());
        store.save_prompt("blank", "   ").unwrap();
        store
            .save_config(&AgentConfig::new("A", "a").with_prompt("missing"))
            .unwrap();
        store
            .save_config(&AgentConfig::new("B", "b").with_max_iterations(0))
            .unwrap();
        fs::write(temp.path().join("agents").join("c.json"), "[1, 2").unwrap();

        let report = validate_store(&store).unwrap();
        assert!(!report.passed());
        assert_eq!(report.configs.len(), 3);
        assert!(report.configs.iter().all(|c| !c.ok));
        assert_eq!(report.configs[0].message, "prompt 'missing' not found");
        assert!(report.configs[2].message.starts_with("invalid JSON"));
        assert_eq!(report.prompts[0].message, "empty prompt");
    }

    #[test]
    fn test_empty_store_passes() {
        let temp = TempDir::new().unwrap();
        let report = validate_store(&FileStore::with_dir(temp.path())).unwrap();
        assert!(report.passed());
        assert!(report.configs.is_empty());
    }
}
