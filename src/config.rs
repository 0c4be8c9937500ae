use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::template::builtin::SKILL_SKELETON;
use crate::template::TemplateStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub templates: TemplatesConfig,
    #[serde(default)]
    pub init: InitConfig,
    #[serde(default)]
    pub autofill: AutofillConfig,
}

/// Limits used by the metadata checker and the size budget rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Hard limit for `description` (characters).
    pub max_description_len: usize,
    /// Fraction of `max_description_len` at which a warning is raised.
    pub description_warn_ratio: f64,
    /// Opt-in floor for `description` (characters); 0 disables it.
    pub min_description_len: usize,
    pub max_name_len: usize,
    /// Metadata keys every manifest must carry.
    pub required_keys: Vec<String>,
    /// Manifest body budget (lines).
    pub max_body_lines: usize,
    /// Manifest body budget (characters).
    pub max_body_chars: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_description_len: 1024,
            description_warn_ratio: 0.9,
            min_description_len: 0,
            max_name_len: 64,
            required_keys: vec!["name".to_string(), "description".to_string()],
            max_body_lines: 500,
            max_body_chars: 40_000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Directories holding user templates (`<dir>/<template-id>/`). `~` is expanded.
    pub dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitConfig {
    /// Where new skills are created when `--path` is not given.
    pub registry_path: PathBuf,
    pub default_template: String,
    pub status: String,
    pub quick_start_minutes: u32,
    /// Research logs go to `<path>/<research_log_dir>/<skill>.md`.
    pub research_log_dir: PathBuf,
    /// Remove a partially written skill directory when a write fails.
    pub rollback_on_failure: bool,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from("."),
            default_template: SKILL_SKELETON.to_string(),
            status: "Beta".to_string(),
            quick_start_minutes: 5,
            research_log_dir: PathBuf::from("research-logs"),
            rollback_on_failure: true,
        }
    }
}

/// Extra literal bindings applied by `--auto-fill`, keyed by placeholder name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutofillConfig {
    pub extra: BTreeMap<String, String>,
}

impl Config {
    /// Load config from the working directory or user config directory
    pub fn load() -> Result<Self> {
        Self::load_with_path(None)
    }

    /// Load configuration from a specific path, or use default search paths
    pub fn load_with_path(path: Option<String>) -> Result<Self> {
        // If explicit path provided, use it
        if let Some(config_path) = path {
            debug!("Loading config from explicit path: {}", config_path);
            return Self::load_from_path(&config_path)
                .with_context(|| format!("Failed to load config from {}", config_path));
        }

        // Per-directory config first
        if Path::new("skillforge.toml").exists() {
            debug!("Loading config from ./skillforge.toml");
            return Self::load_from_path("skillforge.toml");
        }

        // Then the user config directory
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("skillforge").join("config.toml");
            if config_path.exists() {
                debug!("Loading config from {:?}", config_path);
                return Self::load_from_path(&config_path);
            }
        }

        debug!("Using default config");
        Ok(Self::default())
    }

    fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Cannot read {}", path.as_ref().display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in {}", path.as_ref().display()))?;
        Ok(config)
    }

    pub fn template_store(&self) -> TemplateStore {
        TemplateStore::new(&self.templates.dirs)
    }
}
