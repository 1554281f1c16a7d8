//! Provider selection and connection settings

use crate::LlmError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which backend answers extraction prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI chat completions
    #[default]
    #[serde(alias = "open_ai")]
    OpenAi,
    /// Local Ollama server
    Ollama,
    /// Canned responses, no network
    Mock,
}

/// `[llm]` section of the application config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend to use
    pub provider: ProviderKind,

    /// Model identifier passed to the backend
    pub model: String,

    /// Base URL override; each provider has its own default
    pub endpoint: Option<String>,

    /// API key (OpenAI). Usually injected from `OPENAI_API_KEY` rather than
    /// written to disk.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Per-request HTTP timeout in seconds
    pub timeout_secs: u64,

    /// Attempts per request before giving up (Ollama)
    pub max_retries: u32,

    /// Fixed reply of the mock provider
    pub mock_response: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            model: crate::openai::DEFAULT_MODEL.to_string(),
            endpoint: None,
            api_key: None,
            timeout_secs: 60,
            max_retries: crate::ollama::DEFAULT_MAX_RETRIES,
            mock_response: None,
        }
    }
}

impl LlmConfig {
    /// Check the settings before any provider is built
    pub fn validate(&self) -> Result<(), LlmError> {
        if self.model.trim().is_empty() {
            return Err(LlmError::Config("model must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(LlmError::Config("timeout_secs must be greater than 0".to_string()));
        }
        if self.provider == ProviderKind::Ollama && self.max_retries == 0 {
            return Err(LlmError::Config("max_retries must be at least 1".to_string()));
        }
        if self.provider == ProviderKind::OpenAi
            && self.api_key.as_deref().map(str::trim).unwrap_or("").is_empty()
        {
            return Err(LlmError::Config("api_key is required for openai".to_string()));
        }
        Ok(())
    }

    /// Endpoint, falling back to the provider default
    pub fn endpoint_or_default(&self) -> String {
        match (&self.endpoint, self.provider) {
            (Some(endpoint), _) => endpoint.trim_end_matches('/').to_string(),
            (None, ProviderKind::Ollama) => crate::ollama::DEFAULT_ENDPOINT.to_string(),
            (None, _) => crate::openai::DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LlmConfig::default();
        assert_eq!(config.provider, ProviderKind::OpenAi);
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert_eq!(config.endpoint_or_default(), "https://api.openai.com/v1");
        // No key yet
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_ollama_section() {
        let config: LlmConfig = toml::from_str(
            r#"
            provider = "ollama"
            model = "llama3"
            endpoint = "http://gpu-box:11434/"
            timeout_secs = 120
            "#,
        )
        .unwrap();
        assert_eq!(config.provider, ProviderKind::Ollama);
        assert_eq!(config.endpoint_or_default(), "http://gpu-box:11434");
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = LlmConfig {
            provider: ProviderKind::Mock,
            timeout_secs: 0,
            ..LlmConfig::default()
        };
        assert!(config.validate().is_err());

        let config = LlmConfig {
            provider: ProviderKind::Mock,
            model: "  ".to_string(),
            ..LlmConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let config = LlmConfig {
            api_key: Some("sk-secret".to_string()),
            ..LlmConfig::default()
        };
        let text = toml::to_string(&config).unwrap();
        assert!(!text.contains("sk-secret"));
    }
}
