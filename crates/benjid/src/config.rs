//! Configuration management for benjid.
//!
//! Loads settings from /etc/benji/config.toml or uses defaults. The LLM API
//! key is never stored in the file; it is read from the environment variable
//! named in `llm.api_key_env`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/benji/config.toml";

/// LLM gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the generative-language API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for every generation call
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Per-request timeout in seconds. Timeout counts as a gateway failure:
    /// generators fall back, the chat path errors.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Retries for transport-level failures only (connect/timeout), with
    /// linear backoff. HTTP error statuses are not retried.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Character budget for the serialized fact bundle embedded in
    /// generation prompts
    #[serde(default = "default_fact_budget")]
    pub fact_excerpt_chars: usize,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_fact_budget() -> usize {
    2000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            request_timeout_secs: default_request_timeout(),
            max_retries: default_max_retries(),
            fact_excerpt_chars: default_fact_budget(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: default_bind_addr() }
    }
}

/// Fact store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_db_path() -> String {
    "/var/lib/benji/facts.db".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { db_path: default_db_path() }
    }
}

/// Top-level daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenjiConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl BenjiConfig {
    /// Load from the standard path, falling back to defaults when the file
    /// is missing. A malformed file is an error, not a silent default.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_PATH))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Resolve the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.llm.api_key_env).ok().filter(|k| !k.is_empty())
    }
}
