//! Result types for extraction

use annuaire_domain::{Record, RecordKind};
use serde::Serialize;

/// Records extracted from one text, in document order
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Candidate records (no ids)
    pub records: Vec<Record>,

    /// Metadata about the extraction
    pub metadata: ExtractionMetadata,
}

/// Metadata about an extraction run
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionMetadata {
    /// Kind requested
    pub kind: RecordKind,

    /// Model that produced the records
    pub model_name: String,

    /// Number of model calls made
    pub chunk_count: usize,

    /// Input length in characters
    pub text_length: usize,

    /// Wall-clock time spent
    pub processing_time_ms: u64,
}
