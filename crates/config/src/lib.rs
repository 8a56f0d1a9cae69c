//! Configuration loading, validation, and management for Hearth.
//!
//! Loads configuration from `~/.hearth/config.toml` with environment
//! variable overrides. Validates all settings at startup; every field
//! has a default so a missing file yields a working configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.hearth/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model name sent to the backend
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens for the backend request
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Soft cap on tokens per assistant response
    #[serde(default = "default_max_tokens_per_response")]
    pub max_tokens_per_response: u32,

    /// Maximum sentence units played per speech request
    #[serde(default = "default_max_sentences")]
    pub max_sentences: usize,

    /// Maximum backend response time, in milliseconds
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,

    /// Minutes of inactivity after which a conversation is considered stale
    #[serde(default = "default_chat_reset_minutes")]
    pub chat_reset_minutes: u32,

    /// Memory service endpoint (same process by default)
    #[serde(default = "default_memory_endpoint")]
    pub memory_endpoint: String,

    /// Path to a knowledge base JSON file; built-in defaults when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_base_path: Option<PathBuf>,

    /// The companion's display name
    #[serde(default = "default_persona_name")]
    pub persona_name: String,

    /// System prompt establishing the persona
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Model backend configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_model() -> String {
    "mistral".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    8192
}
fn default_max_tokens_per_response() -> u32 {
    250
}
fn default_max_sentences() -> usize {
    5
}
fn default_response_timeout_ms() -> u64 {
    30_000
}
fn default_chat_reset_minutes() -> u32 {
    30
}
fn default_memory_endpoint() -> String {
    "http://localhost:3000/api/memory".into()
}
fn default_persona_name() -> String {
    "Scarlett".into()
}
fn default_system_prompt() -> String {
    "You are an AI companion with a unique personality.\n\
     - Be natural and engaging\n\
     - Express genuine thoughts and feelings\n\
     - Share relevant knowledge\n\
     - Maintain conversation context\n\
     - Be helpful and supportive"
        .into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the Ollama-compatible backend
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "http://localhost:11434".into()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    3000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.hearth/config.toml).
    ///
    /// Environment variable overrides (highest priority):
    /// - `HEARTH_MODEL`
    /// - `HEARTH_BASE_URL`
    /// - `HEARTH_KNOWLEDGE_BASE`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(model) = std::env::var("HEARTH_MODEL") {
            config.model = model;
        }
        if let Ok(base_url) = std::env::var("HEARTH_BASE_URL") {
            config.provider.base_url = base_url;
        }
        if let Ok(path) = std::env::var("HEARTH_KNOWLEDGE_BASE") {
            config.knowledge_base_path = Some(PathBuf::from(path));
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".hearth")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }
        if self.max_sentences == 0 {
            return Err(ConfigError::ValidationError(
                "max_sentences must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Generate a default config TOML string (for `hearth doctor`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_tokens_per_response: default_max_tokens_per_response(),
            max_sentences: default_max_sentences(),
            response_timeout_ms: default_response_timeout_ms(),
            chat_reset_minutes: default_chat_reset_minutes(),
            memory_endpoint: default_memory_endpoint(),
            knowledge_base_path: None,
            persona_name: default_persona_name(),
            system_prompt: default_system_prompt(),
            provider: ProviderConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
