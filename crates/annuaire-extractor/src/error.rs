//! Error types for the Extractor

use annuaire_domain::RecordError;
use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Nothing to extract from
    #[error("Text is empty")]
    EmptyText,

    /// Text exceeds maximum length
    #[error("Text too long: {0} chars (max: {1})")]
    TextTooLong(usize, usize),

    /// Extraction timeout
    #[error("Extraction timeout after {0}s")]
    Timeout(u64),

    /// The reply is not the expected JSON shape
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    /// One extracted entry violates the schema
    #[error("Invalid entry at index {index}: {source}")]
    InvalidEntry {
        /// Zero-based position in the extracted list
        index: usize,
        /// What is wrong with it
        source: RecordError,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::InvalidFormat(format!("JSON parse error: {}", e))
    }
}
