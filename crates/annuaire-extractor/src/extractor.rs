//! Core Extractor implementation

use crate::chunking::TextChunker;
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::parser::parse_llm_response;
use crate::prompt::{response_schema, PromptBuilder};
use crate::types::{ExtractionMetadata, ExtractionResult};
use annuaire_domain::traits::LlmProvider;
use annuaire_domain::{Record, RecordKind};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, info};

/// The Extractor converts unstructured text into typed records
pub struct Extractor<L>
where
    L: LlmProvider,
{
    llm_provider: Arc<L>,
    config: ExtractorConfig,
    model_name: String,
}

impl<L> Extractor<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display,
{
    /// Create a new Extractor
    pub fn new(llm_provider: L, config: ExtractorConfig) -> Self {
        Self::from_shared(Arc::new(llm_provider), config)
    }

    /// Create an Extractor around a provider shared with other components
    pub fn from_shared(llm_provider: Arc<L>, config: ExtractorConfig) -> Self {
        Self {
            llm_provider,
            config,
            model_name: "llm".to_string(),
        }
    }

    /// Create a new Extractor with a specific model name
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract records of `kind` from `text`
    ///
    /// Large inputs are chunked and the chunks extracted in order; the
    /// records come back in document order. Any chunk failure fails the
    /// whole call.
    pub async fn extract(
        &self,
        text: &str,
        kind: RecordKind,
    ) -> Result<ExtractionResult, ExtractorError> {
        let started = Instant::now();
        let text_length = text.chars().count();

        if text.trim().is_empty() {
            return Err(ExtractorError::EmptyText);
        }
        if text_length > self.config.max_text_length {
            return Err(ExtractorError::TextTooLong(
                text_length,
                self.config.max_text_length,
            ));
        }

        let chunks = TextChunker::new(self.config.chunk_strategy, self.config.max_chunk_size)
            .chunk(text);

        info!(
            %kind,
            text_length,
            chunks = chunks.len(),
            model = %self.model_name,
            "Starting extraction"
        );

        let mut records = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            debug!("Processing chunk {}/{}", idx + 1, chunks.len());
            let chunk_records = self.extract_chunk(chunk, kind).await?;
            debug!(chunk = idx + 1, records = chunk_records.len(), "chunk extracted");
            records.extend(chunk_records);
        }

        let metadata = ExtractionMetadata {
            kind,
            model_name: self.model_name.clone(),
            chunk_count: chunks.len(),
            text_length,
            processing_time_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            %kind,
            records = records.len(),
            elapsed_ms = metadata.processing_time_ms,
            "Extraction complete"
        );

        Ok(ExtractionResult { records, metadata })
    }

    async fn extract_chunk(
        &self,
        chunk: &str,
        kind: RecordKind,
    ) -> Result<Vec<Record>, ExtractorError> {
        let prompt = PromptBuilder::new(kind, chunk).build();
        let schema = response_schema(kind).to_string();
        debug!("Prompt length: {} chars", prompt.len());

        let response = timeout(
            self.config.extraction_timeout(),
            self.call_llm(prompt, schema),
        )
        .await
        .map_err(|_| ExtractorError::Timeout(self.config.extraction_timeout_secs))??;

        debug!("LLM response length: {} chars", response.len());
        parse_llm_response(kind, &response)
    }

    /// Call the LLM provider on the blocking pool
    async fn call_llm(&self, prompt: String, schema: String) -> Result<String, ExtractorError> {
        let llm = Arc::clone(&self.llm_provider);

        tokio::task::spawn_blocking(move || {
            llm.generate_structured(&prompt, &schema)
                .map_err(|e| ExtractorError::Llm(e.to_string()))
        })
        .await
        .map_err(|e| ExtractorError::Llm(format!("Task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annuaire_llm::MockProvider;

    #[tokio::test]
    async fn test_extract_empty_response() {
        let extractor = Extractor::new(MockProvider::new(r#"{"entries": []}"#), ExtractorConfig::default());
        let result = extractor.extract("Some text", RecordKind::EventEntry).await.unwrap();
        assert!(result.records.is_empty());
        assert_eq!(result.metadata.chunk_count, 1);
    }

    #[test]
    fn test_extract_from_sync_context() {
        let extractor = Extractor::new(
            MockProvider::new(r#"[{"nom_evenement": "Salon"}]"#),
            ExtractorConfig::default(),
        );
        let result = tokio_test::block_on(extractor.extract("Salon", RecordKind::EventEntry)).unwrap();
        assert_eq!(result.records.len(), 1);
    }

    #[tokio::test]
    async fn test_extract_text_too_long() {
        let llm = MockProvider::default();
        let extractor = Extractor::new(llm.clone(), ExtractorConfig::aggressive());
        let long_text = "a".repeat(ExtractorConfig::aggressive().max_text_length + 1);

        let result = extractor.extract(&long_text, RecordKind::DirectoryEntry).await;
        assert!(matches!(result, Err(ExtractorError::TextTooLong(_, _))));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_text_is_rejected_without_calling_the_model() {
        let llm = MockProvider::default();
        let extractor = Extractor::new(llm.clone(), ExtractorConfig::default());
        let result = extractor.extract("  \n ", RecordKind::DirectoryEntry).await;
        assert!(matches!(result, Err(ExtractorError::EmptyText)));
        assert_eq!(llm.call_count(), 0);
    }
}
