//! Error taxonomy of an ingestion, replace or add request

use crate::acquisition::AcquisitionError;
use annuaire_extractor::ExtractorError;
use thiserror::Error;

/// Errors surfaced to callers of the pipeline
///
/// Input, acquisition and extraction errors are raised before the store is
/// touched. A database error means the whole call was rolled back.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestError {
    /// No usable input was supplied
    #[error("{0}")]
    Input(String),

    /// The source could not be turned into text
    #[error("{0}")]
    Acquisition(String),

    /// The model call failed or produced schema-invalid output
    #[error("Failed to process input: {0}")]
    Extraction(String),

    /// A client payload is malformed (missing id, unknown field, bad type)
    #[error("{0}")]
    Validation(String),

    /// A store operation failed; nothing from this call was kept
    #[error("Database error: {0}")]
    Database(String),
}

impl IngestError {
    pub(crate) fn database(e: impl std::fmt::Display) -> Self {
        IngestError::Database(e.to_string())
    }
}

impl From<AcquisitionError> for IngestError {
    fn from(e: AcquisitionError) -> Self {
        match e {
            AcquisitionError::Input(msg) => IngestError::Input(msg),
            other => IngestError::Acquisition(other.to_string()),
        }
    }
}

impl From<ExtractorError> for IngestError {
    fn from(e: ExtractorError) -> Self {
        match e {
            ExtractorError::EmptyText => IngestError::Input("No input provided".to_string()),
            ExtractorError::TextTooLong(..) => IngestError::Input(e.to_string()),
            other => IngestError::Extraction(other.to_string()),
        }
    }
}
