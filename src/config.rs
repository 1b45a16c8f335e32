//! Editor configuration persistence
//!
//! Stores settings in `~/.config/xfl-editor/config.yaml`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::FormulaOptions;
use crate::parser::DEFAULT_ITERATION_LIMIT;
use crate::structure::{RuntimeContext, DEFAULT_CACHE_CAPACITY};

/// Editor configuration that persists across sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Tokenizer iterations before a parse gives up
    pub parse_iteration_limit: usize,
    /// Number of resolved structures kept in memory
    pub structure_cache_capacity: usize,
    /// Hide a lone trailing `?` from the visible window
    pub hide_question_mark: bool,
    /// Workspace/version the structure lookups run against
    pub runtime_context: String,
    /// YAML or JSON structure catalog
    pub structure_catalog: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            parse_iteration_limit: DEFAULT_ITERATION_LIMIT,
            structure_cache_capacity: DEFAULT_CACHE_CAPACITY,
            hide_question_mark: true,
            runtime_context: RuntimeContext::default().0,
            structure_catalog: None,
        }
    }
}

impl EditorConfig {
    /// Load config from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load config from a specific file, or return defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save config to disk
    pub fn save(&self) -> Result<(), String> {
        let path = crate::config_paths::config_file()
            .ok_or_else(|| "No config directory available".to_string())?;
        self.save_to(&path)
    }

    /// Save config to a specific file, creating its directory
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write config to {}: {}", path.display(), e))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn formula_options(&self) -> FormulaOptions {
        FormulaOptions {
            iteration_limit: self.parse_iteration_limit,
            hide_question_mark: self.hide_question_mark,
        }
    }

    pub fn context(&self) -> RuntimeContext {
        RuntimeContext(self.runtime_context.clone())
    }

    /// Configured catalog, else the default one when it exists
    pub fn catalog_path(&self) -> Option<PathBuf> {
        self.structure_catalog.clone().or_else(|| {
            crate::config_paths::default_catalog_file().filter(|path| path.exists())
        })
    }
}
