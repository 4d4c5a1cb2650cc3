//! Configuration for skiff.
//!
//! Settings come from `~/.skiff/config.json` with environment variables
//! taking precedence, so a bare `OPENROUTER_API_KEY` in the shell is enough
//! to run without any file on disk.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub mod paths;

pub use paths::{base_dir, config_path};

/// Errors in configuration handling
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing API key: set OPENROUTER_API_KEY or add it to {0}")]
    MissingApiKey(PathBuf),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Model provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
        }
    }
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_model() -> String {
    "openrouter/auto".to_string()
}

/// Agent loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Workspace root for file tools; defaults to the current directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    /// Directory scanned for `SKILL.md` files at startup.
    #[serde(default = "default_skills_dir")]
    pub skills_dir: String,
    #[serde(default = "default_max_rounds")]
    pub max_tool_rounds: u32,
    #[serde(default = "default_shell_timeout")]
    pub shell_timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            workspace: None,
            skills_dir: default_skills_dir(),
            max_tool_rounds: default_max_rounds(),
            shell_timeout_secs: default_shell_timeout(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_skills_dir() -> String {
    "skills".to_string()
}

fn default_max_rounds() -> u32 {
    15
}

fn default_shell_timeout() -> u64 {
    30
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.2
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

impl Config {
    /// Load configuration: file (if present), then environment overrides.
    pub async fn load() -> Result<Self> {
        let mut config = Self::load_from(&config_path()).await?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from a specific file, falling back to defaults when absent.
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("no config at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        debug!("loading config from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save to a specific location.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Environment variables win over file values.
    pub fn apply_env_overrides(&mut self) {
        if let Some(key) = env_non_empty("SKIFF_API_KEY").or_else(|| env_non_empty("OPENROUTER_API_KEY")) {
            self.provider.api_key = key;
        }
        if let Some(base) = env_non_empty("OPENROUTER_BASE_URL") {
            self.provider.base_url = base;
        }
        if let Some(model) = env_non_empty("OPENROUTER_MODEL") {
            self.provider.model = model;
        }
        if let Some(dir) = env_non_empty("SKIFF_SKILLS_DIR") {
            self.agent.skills_dir = dir;
        }
    }

    /// API key, or a descriptive error pointing at the config file.
    pub fn require_api_key(&self) -> Result<String> {
        let key = self.provider.api_key.trim();
        if key.is_empty() {
            return Err(ConfigError::MissingApiKey(config_path()));
        }
        Ok(key.to_string())
    }

    /// Workspace root for file tools, captured once at startup.
    pub fn workspace_path(&self) -> PathBuf {
        match &self.agent.workspace {
            Some(path) if !path.is_empty() => expand_tilde(path),
            _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    pub fn skills_dir(&self) -> PathBuf {
        expand_tilde(&self.agent.skills_dir)
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
