//! Service configuration
//!
//! TOML-backed configuration with operator-tunable values for the server,
//! rate limiting, and the two external collaborators.
//!
//! ## Loading Order
//!
//! 1. explicit `--config` path
//! 2. `STEPWISE_CONFIG` environment variable (path to TOML file)
//! 3. `stepwise.toml` in the current working directory
//! 4. built-in defaults
//!
//! The loaded config is injected into the application context at startup;
//! there is no global config state.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Environment variable naming an alternate config file path.
pub const CONFIG_PATH_ENV: &str = "STEPWISE_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "stepwise.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub rate_limit: RateLimitConfig,
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub kb: KbConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address for the HTTP API.
    pub addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests admitted per window per caller.
    pub max_requests: usize,
    /// Sliding window length in seconds.
    pub window_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama-compatible endpoint base URL.
    pub base_url: String,
    /// Model name passed to the chat endpoint.
    pub model: String,
    /// Bounded call window for one generation.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Tavily-compatible endpoint base URL.
    pub base_url: String,
    /// Maximum chunks requested per query.
    pub max_results: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KbConfig {
    /// Path to the KB JSON asset.
    pub path: String,
    /// Path to the feedback database directory.
    pub feedback_db: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_secs: 60,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            model: "qwen3:8b".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.tavily.com".to_string(),
            max_results: 5,
            timeout_secs: 20,
        }
    }
}

impl Default for KbConfig {
    fn default() -> Self {
        Self {
            path: "data/kb.json".to_string(),
            feedback_db: "data/feedback.db".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            rate_limit: RateLimitConfig::default(),
            llm: LlmConfig::default(),
            search: SearchConfig::default(),
            kb: KbConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration following the documented order.
    pub fn load(explicit_path: Option<&str>) -> Result<Self, ConfigError> {
        let candidate = explicit_path
            .map(str::to_string)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok());

        if let Some(path) = candidate {
            let config = Self::from_file(&path)?;
            info!(path, "loaded config file");
            return config.validated();
        }

        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            let config = Self::from_file(DEFAULT_CONFIG_FILE)?;
            info!(path = DEFAULT_CONFIG_FILE, "loaded config file");
            return config.validated();
        }

        info!("no config file found, using built-in defaults");
        Self::default().validated()
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Ok(toml::from_str(&raw)?)
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.rate_limit.max_requests == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit.max_requests must be at least 1".to_string(),
            ));
        }
        if self.rate_limit.window_secs == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit.window_secs must be at least 1".to_string(),
            ));
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "llm.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }
}
