//! Configuration for the Extractor

use crate::error::ExtractorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How prose is split when it exceeds `max_chunk_size`
///
/// Tabular input (a JSON array of rows) is always split on row boundaries,
/// whatever the strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ChunkStrategy {
    /// Split on blank lines
    #[default]
    ByParagraph,
    /// Split before markdown headers and numbered headings
    BySection,
    /// Split on sentence ends
    BySentence,
}

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum input text length (characters)
    pub max_text_length: usize,

    /// Maximum time for a single model call (seconds)
    pub extraction_timeout_secs: u64,

    /// Text chunking strategy for large documents
    pub chunk_strategy: ChunkStrategy,

    /// Maximum chunk size (characters)
    pub max_chunk_size: usize,
}

impl ExtractorConfig {
    /// Get the extraction timeout as a Duration
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExtractorError> {
        let fail = |msg: &str| Err(ExtractorError::Config(msg.to_string()));
        if self.max_text_length == 0 {
            return fail("max_text_length must be greater than 0");
        }
        if self.max_chunk_size == 0 {
            return fail("max_chunk_size must be greater than 0");
        }
        if self.max_chunk_size > self.max_text_length {
            return fail("max_chunk_size cannot exceed max_text_length");
        }
        if self.extraction_timeout_secs == 0 {
            return fail("extraction_timeout_secs must be greater than 0");
        }
        Ok(())
    }

    /// Smaller chunks and a shorter timeout
    pub fn aggressive() -> Self {
        Self {
            max_text_length: 40_000,
            extraction_timeout_secs: 60,
            chunk_strategy: ChunkStrategy::ByParagraph,
            max_chunk_size: 4_000,
        }
    }

    /// Larger chunks and a longer timeout, for slow local models
    pub fn lenient() -> Self {
        Self {
            max_text_length: 400_000,
            extraction_timeout_secs: 600,
            chunk_strategy: ChunkStrategy::BySection,
            max_chunk_size: 24_000,
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| ExtractorError::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        toml::to_string_pretty(self)
            .map_err(|e| ExtractorError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_text_length: 200_000,
            extraction_timeout_secs: 180,
            chunk_strategy: ChunkStrategy::ByParagraph,
            max_chunk_size: 12_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(ExtractorConfig::default().validate().is_ok());
        assert!(ExtractorConfig::aggressive().validate().is_ok());
        assert!(ExtractorConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        let mut config = ExtractorConfig::default();
        config.max_text_length = 0;
        assert!(config.validate().is_err());

        let mut config = ExtractorConfig::default();
        config.max_chunk_size = config.max_text_length + 1;
        assert!(config.validate().is_err());

        let mut config = ExtractorConfig::default();
        config.extraction_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ExtractorError::Config(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractorConfig::lenient();
        let toml_str = config.to_toml().unwrap();
        let parsed = ExtractorConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = ExtractorConfig::from_toml("max_chunk_size = 500").unwrap();
        assert_eq!(parsed.max_chunk_size, 500);
        assert_eq!(parsed.max_text_length, ExtractorConfig::default().max_text_length);
    }

    #[test]
    fn test_from_toml_rejects_invalid() {
        assert!(ExtractorConfig::from_toml("extraction_timeout_secs = 0").is_err());
        assert!(ExtractorConfig::from_toml("max_chunk_size = \"big\"").is_err());
    }
}
