//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/caresense/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/caresense/` (~/.config/caresense/)
//! - Data: `$XDG_DATA_HOME/caresense/` (~/.local/share/caresense/)
//! - State/Logs: `$XDG_STATE_HOME/caresense/` (~/.local/state/caresense/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// LLM configuration for risk analysis (required at call time)
    #[serde(default)]
    pub llm: Option<LlmConfig>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// LLM provider configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// Provider type
    pub provider: LlmProvider,
    /// Model or deployment identifier
    pub model: String,
    /// API endpoint (optional, uses default for provider)
    pub endpoint: Option<String>,
    /// API key (can also use env var)
    pub api_key: Option<String>,
    /// HTTP request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

/// Supported LLM providers
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Ollama,
    Claude,
    OpenAI,
}

impl LlmProvider {
    /// Returns the default endpoint for this provider
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            LlmProvider::Ollama => "http://localhost:11434",
            LlmProvider::Claude => "https://api.anthropic.com",
            LlmProvider::OpenAI => "https://api.openai.com",
        }
    }

    /// Environment variable consulted when `api_key` is not set in config
    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self {
            LlmProvider::Ollama => None,
            LlmProvider::Claude => Some("ANTHROPIC_API_KEY"),
            LlmProvider::OpenAI => Some("OPENAI_API_KEY"),
        }
    }
}

fn default_llm_timeout() -> u64 {
    60
}

impl LlmConfig {
    /// Resolve the API key from config or the provider's env var.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key.clone().or_else(|| {
            self.provider
                .api_key_env_var()
                .and_then(|var| std::env::var(var).ok())
        })
    }

    /// Resolve the endpoint, falling back to the provider default.
    pub fn resolved_endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| self.provider.default_endpoint().to_string())
            .trim_end_matches('/')
            .to_string()
    }

    /// Validate configuration, returning error message if invalid.
    ///
    /// This is the pre-network check: a missing model or missing credentials
    /// must fail here, before any request is attempted.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::Config(
                "llm.model is required for risk analysis".to_string(),
            ));
        }
        if matches!(self.provider, LlmProvider::Claude | LlmProvider::OpenAI)
            && self.resolved_api_key().is_none()
        {
            return Err(Error::Config(format!(
                "llm.api_key (or {}) is required",
                self.provider.api_key_env_var().unwrap_or("provider env var")
            )));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/caresense/config.toml` (~/.config/caresense/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("caresense").join("config.toml")
    }

    /// Returns the data directory path (for the history file)
    ///
    /// `$XDG_DATA_HOME/caresense/` (~/.local/share/caresense/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("caresense")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/caresense/` (~/.local/state/caresense/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("caresense")
    }

    /// Returns the risk history file path
    ///
    /// `$XDG_DATA_HOME/caresense/history.json`
    pub fn history_path() -> PathBuf {
        Self::data_dir().join("history.json")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/caresense/caresense.log`
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("caresense.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.llm.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[llm]
provider = "ollama"
model = "llama3.2"

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        let llm = config.llm.unwrap();
        assert_eq!(llm.provider, LlmProvider::Ollama);
        assert_eq!(llm.model, "llama3.2");
        assert_eq!(llm.timeout_secs, 60);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_llm_provider_endpoints() {
        assert_eq!(
            LlmProvider::Ollama.default_endpoint(),
            "http://localhost:11434"
        );
        assert_eq!(
            LlmProvider::Claude.default_endpoint(),
            "https://api.anthropic.com"
        );
    }

    #[test]
    fn test_llm_config_validation() {
        // Ollama needs no key
        let config = LlmConfig {
            provider: LlmProvider::Ollama,
            model: "llama3.2".to_string(),
            endpoint: None,
            api_key: None,
            timeout_secs: 60,
        };
        assert!(config.validate().is_ok());

        // Empty model is rejected
        let config = LlmConfig {
            provider: LlmProvider::Ollama,
            model: "  ".to_string(),
            endpoint: None,
            api_key: None,
            timeout_secs: 60,
        };
        assert!(config.validate().is_err());

        // Cloud provider with explicit key passes
        let config = LlmConfig {
            provider: LlmProvider::OpenAI,
            model: "gpt-4o-mini".to_string(),
            endpoint: None,
            api_key: Some("sk-test".to_string()),
            timeout_secs: 60,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolved_endpoint_trims_trailing_slash() {
        let config = LlmConfig {
            provider: LlmProvider::OpenAI,
            model: "gpt-4o-mini".to_string(),
            endpoint: Some("https://example.openai.azure.com/".to_string()),
            api_key: Some("sk-test".to_string()),
            timeout_secs: 60,
        };
        assert_eq!(
            config.resolved_endpoint(),
            "https://example.openai.azure.com"
        );
    }
}
