//! Application configuration
//!
//! One TOML file with a section per component. Secrets may come from the
//! environment instead of the file.

use annuaire_extractor::ExtractorConfig;
use annuaire_llm::{LlmConfig, ProviderKind};
use annuaire_pipeline::AcquisitionConfig;
use annuaire_resolver::ResolverConfig;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Environment variable read when `[llm] api_key` is absent
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// A section holds an unusable value
    #[error("Invalid configuration in [{section}]: {reason}")]
    Invalid {
        /// TOML section
        section: &'static str,
        /// What is wrong
        reason: String,
    },
}

/// Whole-application configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `[database]`
    pub database: DatabaseConfig,

    /// `[llm]`
    #[serde(default)]
    pub llm: LlmConfig,

    /// `[extractor]`
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// `[resolver]`
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// `[acquisition]`
    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    /// `[server]`
    #[serde(default)]
    pub server: ServerConfig,
}

/// `[database]` section
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path, or `:memory:`
    pub path: String,
}

/// `[server]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port
    pub bind_port: u16,

    /// Largest accepted request body, uploads included (bytes)
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 5000,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, with secrets from the process
    /// environment
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_with_env(&contents, |key| std::env::var(key).ok())
    }

    /// Parse and validate configuration, resolving secrets through `env`
    pub fn from_toml_with_env<F>(contents: &str, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: AppConfig = toml::from_str(contents)?;

        if config.llm.api_key.as_deref().map_or(true, str::is_empty) {
            config.llm.api_key = env(OPENAI_API_KEY_ENV).filter(|key| !key.is_empty());
        }

        config.validate()?;
        Ok(config)
    }

    /// Check every section, failing on the first unusable one
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::MissingField("database.path".to_string()));
        }
        if self.llm.provider == ProviderKind::OpenAi && self.llm.api_key.is_none() {
            return Err(ConfigError::MissingField(format!(
                "llm.api_key (or {})",
                OPENAI_API_KEY_ENV
            )));
        }
        self.llm.validate().map_err(|e| ConfigError::Invalid {
            section: "llm",
            reason: e.to_string(),
        })?;
        self.extractor.validate().map_err(|e| ConfigError::Invalid {
            section: "extractor",
            reason: e.to_string(),
        })?;
        self.resolver.validate().map_err(|e| ConfigError::Invalid {
            section: "resolver",
            reason: e.to_string(),
        })?;
        self.acquisition
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                section: "acquisition",
                reason,
            })?;
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid {
                section: "server",
                reason: "max_upload_bytes must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// In-memory store and mock model, for tests and local trials
    pub fn default_test_config() -> Self {
        AppConfig {
            database: DatabaseConfig {
                path: ":memory:".to_string(),
            },
            llm: LlmConfig {
                provider: ProviderKind::Mock,
                ..Default::default()
            },
            extractor: ExtractorConfig::default(),
            resolver: ResolverConfig::default(),
            acquisition: AcquisitionConfig::default(),
            server: ServerConfig::default(),
        }
    }
}
