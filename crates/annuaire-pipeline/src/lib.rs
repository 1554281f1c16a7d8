//! Annuaire Ingestion Pipeline
//!
//! Ties the pieces of an ingestion request together:
//!
//! 1. **Acquisition**: a [`Source`] (page URL, uploaded file or pasted text)
//!    becomes raw text through a [`TextSource`]
//! 2. **Extraction**: the text becomes typed candidate records
//!    (`annuaire-extractor`)
//! 3. **Batch commit**: each candidate is checked for close matches among
//!    stored records and either inserted or held back as a
//!    [`DuplicateGroup`]; the whole batch is one transaction
//!
//! The replace and add paths share the same normalization and transaction
//! handling.
//!
//! # Example
//!
//! ```no_run
//! use annuaire_domain::RecordKind;
//! use annuaire_extractor::{Extractor, ExtractorConfig};
//! use annuaire_llm::MockProvider;
//! use annuaire_pipeline::{AcquisitionConfig, BatchCoordinator, Ingestor, Source, SourceReader};
//! use annuaire_resolver::DuplicateResolver;
//! use annuaire_store::SqliteStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let extractor = Extractor::new(MockProvider::default(), ExtractorConfig::default());
//! let ingestor = Ingestor::new(
//!     extractor,
//!     BatchCoordinator::new(DuplicateResolver::default_config()),
//!     SqliteStore::in_memory()?,
//!     SourceReader::new(AcquisitionConfig::default())?,
//! );
//!
//! let result = ingestor
//!     .ingest(RecordKind::DirectoryEntry, Source::Text("Jean Dupont, Lausanne".into()))
//!     .await?;
//! println!("{:?}", result.status());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod acquisition;
mod batch;
mod config;
mod error;
mod ingest;
mod payload;

pub use acquisition::{AcquisitionError, Source, SourceReader, TextSource};
pub use batch::{BatchCoordinator, BatchResult, BatchScope, BatchStatus, DuplicateGroup};
pub use config::AcquisitionConfig;
pub use error::IngestError;
pub use ingest::Ingestor;
pub use payload::{parse_add_payload, parse_replace_payload};

pub use annuaire_resolver::MatchCandidate;
