//! Configuration management for the multimodal hub.
//!
//! The service reads an optional configuration file at `~/.mmhub/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (HUB_* prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `HUB_BIND_ADDRESS` → server.host
//! - `HUB_PORT` → server.port
//! - `HUB_MAX_TURNS` → conversation.max_turns
//! - `HUB_LOG_LEVEL` → observability.log_level
//! - `HUB_LOG_FORMAT` → observability.log_format
//! - `HUB_CHAT_BACKEND` → models.chat.backend
//! - `OLLAMA_BASE_URL` → models.chat.base_url
//! - `HUB_CLASSIFIER_URL` → models.classifier.endpoint

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".mmhub"),
        |dirs| dirs.home_dir().join(".mmhub"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Top-level Configuration
// ============================================================================

/// Root configuration for the hub service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Conversation history retention
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Model backends
    #[serde(default)]
    pub models: ModelsConfig,

    /// Logging configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with environment variable overrides.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using an arbitrary variable lookup.
    ///
    /// Unparseable numeric values are ignored with a warning.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HUB_BIND_ADDRESS") {
            self.server.host = host;
        }
        if let Some(port) = lookup("HUB_PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid HUB_PORT"),
            }
        }
        if let Some(max_turns) = lookup("HUB_MAX_TURNS") {
            match max_turns.parse() {
                Ok(n) => self.conversation.max_turns = n,
                Err(_) => tracing::warn!(value = %max_turns, "Ignoring invalid HUB_MAX_TURNS"),
            }
        }
        if let Some(level) = lookup("HUB_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("HUB_LOG_FORMAT") {
            self.observability.log_format = format;
        }
        if let Some(backend) = lookup("HUB_CHAT_BACKEND") {
            match backend.parse() {
                Ok(b) => self.models.chat.backend = b,
                Err(_) => tracing::warn!(value = %backend, "Ignoring unknown HUB_CHAT_BACKEND"),
            }
        }
        if let Some(url) = lookup("OLLAMA_BASE_URL") {
            self.models.chat.base_url = url;
        }
        if let Some(url) = lookup("HUB_CLASSIFIER_URL") {
            self.models.classifier.endpoint = Some(url);
        }
    }

    /// Socket address string the server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

// ============================================================================
// Server
// ============================================================================

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    /// Default: "0.0.0.0"
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted request body, in bytes (image uploads).
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

// ============================================================================
// Conversation
// ============================================================================

/// Conversation history retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Maximum turns kept per session (user and assistant turns both count).
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
        }
    }
}

// ============================================================================
// Models
// ============================================================================

/// Model backend configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default)]
    pub chat: ChatModelConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Which chat generator to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatBackend {
    /// Keyword rules with canned replies; needs no model runtime.
    #[default]
    RuleBased,
    /// A local multimodal model served through the Ollama chat API.
    Ollama,
}

impl std::str::FromStr for ChatBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rule_based" | "rule-based" | "rules" => Ok(Self::RuleBased),
            "ollama" => Ok(Self::Ollama),
            other => Err(format!("unknown chat backend: {other}")),
        }
    }
}

/// Chat model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatModelConfig {
    #[serde(default)]
    pub backend: ChatBackend,

    /// Base URL of the model server (Ollama backend only).
    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    /// Model name passed to the model server.
    #[serde(default = "default_chat_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: i64,

    /// Optional system prompt prepended to every request.
    #[serde(default)]
    pub system_prompt: Option<String>,

    #[serde(default = "default_chat_timeout")]
    pub timeout_secs: u64,
}

impl Default for ChatModelConfig {
    fn default() -> Self {
        Self {
            backend: ChatBackend::default(),
            base_url: default_ollama_url(),
            model: default_chat_model(),
            temperature: default_temperature(),
            max_new_tokens: default_max_new_tokens(),
            system_prompt: None,
            timeout_secs: default_chat_timeout(),
        }
    }
}

/// Image classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Inference endpoint accepting a multipart `file` upload.
    /// When unset, `/predict` reports the classifier as unavailable.
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_classifier_timeout")]
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_classifier_timeout(),
        }
    }
}

// ============================================================================
// Observability
// ============================================================================

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets forced to `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8002
}
fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}
fn default_max_turns() -> usize {
    20 // 10 exchanges
}
fn default_ollama_url() -> String {
    "http://localhost:11434".into()
}
fn default_chat_model() -> String {
    "llava".into()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_max_new_tokens() -> i64 {
    500
}
fn default_chat_timeout() -> u64 {
    300 // local models may be slow
}
fn default_classifier_timeout() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "pretty".into()
}
