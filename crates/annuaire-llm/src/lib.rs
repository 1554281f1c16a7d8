//! Annuaire LLM Provider Layer
//!
//! Pluggable LLM provider implementations of the `LlmProvider` trait from
//! `annuaire-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OllamaProvider`: Local Ollama API integration
//! - `OpenAiProvider`: OpenAI chat completions in JSON mode
//! - `AnyProvider`: one of the above, chosen from an `LlmConfig`
//!
//! # Examples
//!
//! ```
//! use annuaire_llm::MockProvider;
//! use annuaire_domain::traits::LlmProvider;
//!
//! let provider = MockProvider::new(r#"{"entries": []}"#);
//! let result = provider.generate("test prompt").unwrap();
//! assert_eq!(result, r#"{"entries": []}"#);
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod ollama;
pub mod openai;

use annuaire_domain::traits::LlmProvider as LlmProviderTrait;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use config::{LlmConfig, ProviderKind};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Provider configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Drive an HTTP future from a synchronous trait method
///
/// Must run off the async worker threads (for example inside
/// `tokio::task::spawn_blocking`); outside any runtime a private
/// current-thread runtime is started for the call.
pub(crate) fn block_on<F: Future>(fut: F) -> Result<F::Output, LlmError> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => Ok(handle.block_on(fut)),
        Err(_) => tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map(|rt| rt.block_on(fut))
            .map_err(|e| LlmError::Other(format!("Failed to start runtime: {}", e))),
    }
}

/// Mock LLM provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
/// Queued responses are served first, in order; then prompt-specific
/// responses; then the default.
///
/// # Examples
///
/// ```
/// use annuaire_llm::MockProvider;
/// use annuaire_domain::traits::LlmProvider;
///
/// let provider = MockProvider::new("Fixed response");
/// assert_eq!(provider.generate("any prompt").unwrap(), "Fixed response");
///
/// let mut provider = MockProvider::default();
/// provider.add_response("prompt1", "response1");
/// assert_eq!(provider.generate("prompt1").unwrap(), "response1");
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, String>>>,
    queue: Arc<Mutex<VecDeque<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

const MOCK_ERROR: &str = "ERROR";

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a specific response for a given prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(prompt.into(), response.into());
    }

    /// Queue a response for the next unanswered call, whatever its prompt
    pub fn push_response(&self, response: impl Into<String>) {
        self.queue.lock().unwrap().push_back(response.into());
    }

    /// Queue a failure for the next unanswered call
    pub fn push_error(&self) {
        self.push_response(MOCK_ERROR);
    }

    /// Configure to return an error for a specific prompt
    pub fn add_error(&mut self, prompt: impl Into<String>) {
        self.add_response(prompt, MOCK_ERROR);
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Reset the call history
    pub fn reset_call_count(&self) {
        self.prompts.lock().unwrap().clear();
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let response = self
            .queue
            .lock()
            .unwrap()
            .pop_front()
            .or_else(|| self.responses.lock().unwrap().get(prompt).cloned())
            .unwrap_or_else(|| self.default_response.clone());

        if response == MOCK_ERROR {
            return Err(LlmError::Other("Mock error".to_string()));
        }
        Ok(response)
    }

    fn generate_structured(&self, prompt: &str, _schema: &str) -> Result<String, Self::Error> {
        self.generate(prompt)
    }
}

/// A provider chosen at startup from configuration
pub enum AnyProvider {
    /// Deterministic mock
    Mock(MockProvider),
    /// Local Ollama
    Ollama(OllamaProvider),
    /// OpenAI
    OpenAi(OpenAiProvider),
}

impl AnyProvider {
    /// Build the provider described by `config`
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        config.validate()?;
        let provider = match config.provider {
            ProviderKind::Mock => AnyProvider::Mock(MockProvider::new(
                config.mock_response.clone().unwrap_or_else(|| r#"{"entries": []}"#.to_string()),
            )),
            ProviderKind::Ollama => AnyProvider::Ollama(
                OllamaProvider::new(config.endpoint_or_default(), &config.model)
                    .with_timeout(config.timeout())
                    .with_max_retries(config.max_retries),
            ),
            ProviderKind::OpenAi => {
                let api_key = config
                    .api_key
                    .clone()
                    .ok_or_else(|| LlmError::Config("api_key is required for openai".to_string()))?;
                AnyProvider::OpenAi(
                    OpenAiProvider::new(api_key, &config.model)
                        .with_base_url(config.endpoint_or_default())
                        .with_timeout(config.timeout()),
                )
            }
        };
        Ok(provider)
    }

    /// Model identifier for logs and metadata
    pub fn model_name(&self) -> &str {
        match self {
            AnyProvider::Mock(_) => "mock",
            AnyProvider::Ollama(p) => p.model(),
            AnyProvider::OpenAi(p) => p.model(),
        }
    }
}

impl LlmProviderTrait for AnyProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        match self {
            AnyProvider::Mock(p) => p.generate(prompt),
            AnyProvider::Ollama(p) => LlmProviderTrait::generate(p, prompt),
            AnyProvider::OpenAi(p) => LlmProviderTrait::generate(p, prompt),
        }
    }

    fn generate_structured(&self, prompt: &str, schema: &str) -> Result<String, Self::Error> {
        match self {
            AnyProvider::Mock(p) => p.generate_structured(prompt, schema),
            AnyProvider::Ollama(p) => LlmProviderTrait::generate_structured(p, prompt, schema),
            AnyProvider::OpenAi(p) => LlmProviderTrait::generate_structured(p, prompt, schema),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.generate("any prompt");
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "Test response");
    }

    #[test]
    fn test_mock_provider_specific_responses() {
        let mut provider = MockProvider::default();
        provider.add_response("hello", "world");
        provider.add_response("foo", "bar");

        assert_eq!(provider.generate("hello").unwrap(), "world");
        assert_eq!(provider.generate("foo").unwrap(), "bar");
        assert_eq!(provider.generate("unknown").unwrap(), "Default mock response");
    }

    #[test]
    fn test_mock_provider_queue_is_served_first() {
        let mut provider = MockProvider::new("fallback");
        provider.add_response("hello", "world");
        provider.push_response("first");
        provider.push_response("second");

        assert_eq!(provider.generate("hello").unwrap(), "first");
        assert_eq!(provider.generate("hello").unwrap(), "second");
        assert_eq!(provider.generate("hello").unwrap(), "world");
        assert_eq!(provider.generate("other").unwrap(), "fallback");
    }

    #[test]
    fn test_mock_provider_call_history() {
        let provider = MockProvider::new("test");
        assert_eq!(provider.call_count(), 0);

        provider.generate("prompt1").unwrap();
        provider.generate_structured("prompt2", "{}").unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.prompts(), vec!["prompt1", "prompt2"]);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn test_mock_provider_error() {
        let mut provider = MockProvider::default();
        provider.add_error("bad prompt");
        assert!(matches!(provider.generate("bad prompt"), Err(LlmError::Other(_))));

        provider.push_error();
        assert!(provider.generate("good prompt").is_err());
        assert!(provider.generate("good prompt").is_ok());
    }

    #[test]
    fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.generate("test").unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }

    #[test]
    fn test_any_provider_from_mock_config() {
        let config = LlmConfig {
            provider: ProviderKind::Mock,
            mock_response: Some("[]".to_string()),
            ..LlmConfig::default()
        };
        let provider = AnyProvider::from_config(&config).unwrap();
        assert_eq!(provider.model_name(), "mock");
        assert_eq!(provider.generate("x").unwrap(), "[]");
    }

    #[test]
    fn test_any_provider_openai_requires_key() {
        let config = LlmConfig {
            provider: ProviderKind::OpenAi,
            api_key: None,
            ..LlmConfig::default()
        };
        assert!(matches!(AnyProvider::from_config(&config), Err(LlmError::Config(_))));
    }
}
