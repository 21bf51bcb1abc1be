pub mod validation;

use std::path::Path;

use serde::{Deserialize, Serialize};

use self::validation::validate_config;

/// Error type for configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for crate::error::RelayError {
    fn from(err: ConfigError) -> Self {
        crate::error::RelayError::Config(err.to_string())
    }
}

/// Inbound listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_index_path")]
    pub index_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_worker_threads: Option<usize>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5900
}
fn default_index_path() -> String {
    "index.html".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            index_path: default_index_path(),
            runtime_worker_threads: None,
        }
    }
}

/// Upstream chat-completion service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_true")]
    pub streaming: bool,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub temperature: f64,
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}
fn default_model() -> String {
    "llama-3.1-8b-instant".to_string()
}
fn default_true() -> bool {
    true
}
fn default_max_tokens() -> u32 {
    400
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            streaming: true,
            max_tokens: default_max_tokens(),
            temperature: 0.0,
        }
    }
}

impl LlmConfig {
    /// Full URL of the chat-completions endpoint.
    #[must_use]
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful answering assistant. \
Your task is to reply and respond to the user politely and concisely. \
Answer in plain text (concisely, maximum 3 sentences) and not in Markdown format.";

/// Feature flags and settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_log_level() -> String {
    "INFO".to_string()
}
fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}
fn default_history_window() -> usize {
    4
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            system_prompt: default_system_prompt(),
            history_window: default_history_window(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
}

impl AppConfig {
    /// Apply environment overrides on top of file values.
    ///
    /// `lookup` abstracts `std::env::var` so overrides can be tested without
    /// touching the process environment. Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(base_url) = get("LLM_API_BASE_URL") {
            self.llm.base_url = base_url;
        }
        if let Some(api_key) = get("LLM_API_KEY").or_else(|| get("OPENAI_API_KEY")) {
            self.llm.api_key = Some(api_key);
        }
        if let Some(model) = get("LLM_CHAT_MODEL") {
            self.llm.model = model;
        }
        if let Some(streaming) = get("LLM_STREAMING") {
            self.llm.streaming = streaming != "no";
        }
        if let Some(port) = get("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("ignoring invalid PORT value '{port}'"),
            }
        }
        if let Some(level) = get("LOG_LEVEL") {
            self.features.log_level = level;
        }
    }

    fn normalize(&mut self) {
        let trimmed = self.llm.base_url.trim().trim_end_matches('/').to_string();
        self.llm.base_url = trimmed;
        if self
            .llm
            .api_key
            .as_deref()
            .is_some_and(|key| key.trim().is_empty())
        {
            self.llm.api_key = None;
        }
    }
}

/// Load configuration from an optional YAML file, apply environment
/// overrides and validate the result.
///
/// A missing file is not an error: defaults plus environment apply.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when an existing file cannot be read,
/// [`ConfigError::Yaml`] when parsing fails, or [`ConfigError::Validation`]
/// when semantic validation fails.
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let mut config = if Path::new(path).exists() {
        let contents = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&contents)?
    } else {
        AppConfig::default()
    };
    config.apply_env_overrides(|key| std::env::var(key).ok());
    config.normalize();
    validate_config(&config)?;
    Ok(config)
}

/// Parse configuration from YAML text without touching the environment.
///
/// # Errors
///
/// Returns [`ConfigError::Yaml`] on parse failure or
/// [`ConfigError::Validation`] when validation fails.
pub fn parse_config(yaml: &str) -> Result<AppConfig, ConfigError> {
    let mut config: AppConfig = serde_yaml::from_str(yaml)?;
    config.normalize();
    validate_config(&config)?;
    Ok(config)
}
