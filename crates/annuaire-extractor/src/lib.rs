//! Annuaire Extractor
//!
//! Turns unstructured text into typed records of one kind using an LLM.
//!
//! # Architecture
//!
//! ```text
//! Text → chunker → prompt → LLM → JSON → coerced, validated Records
//! ```
//!
//! The extractor never touches the store. A failure of any chunk (provider
//! error, timeout, malformed reply, schema violation) fails the whole call;
//! no partial list is returned.
//!
//! # Example Usage
//!
//! ```no_run
//! use annuaire_domain::RecordKind;
//! use annuaire_extractor::{Extractor, ExtractorConfig};
//! use annuaire_llm::MockProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::new(r#"{"entries": [{"nom": "Dupont", "prenom": "Jean"}]}"#);
//! let extractor = Extractor::new(llm, ExtractorConfig::default());
//!
//! let result = extractor
//!     .extract("Jean Dupont, Genève", RecordKind::DirectoryEntry)
//!     .await?;
//! println!("{} records", result.records.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunking;
mod config;
mod error;
mod extractor;
mod parser;
mod prompt;
mod types;


pub use chunking::TextChunker;
pub use config::{ChunkStrategy, ExtractorConfig};
pub use error::ExtractorError;
pub use extractor::Extractor;
pub use parser::parse_llm_response;
pub use prompt::{response_schema, PromptBuilder};
pub use types::{ExtractionMetadata, ExtractionResult};
