//! Annuaire Domain Layer
//!
//! Core record model shared by every other crate of the ingestion pipeline.
//!
//! ## Key Concepts
//!
//! - **RecordKind**: directory entry or event entry; fixes the schema and the
//!   duplicate-matching fields
//! - **Record**: tagged variant over the typed entry structs
//! - **FieldValue**: scalar values with lenient coercion from JSON
//! - **StoredRecord**: a record paired with its store-assigned id
//! - **Similarity**: trigram scoring used by duplicate resolution
//!
//! ## Architecture
//!
//! - Pure data and validation, no I/O
//! - Schemas are static; SQL and prompts are generated from them, never from
//!   request keys
//! - Trait definitions for the store and the model provider

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod kind;
pub mod record;
pub mod similarity;
pub mod traits;
pub mod value;

// Re-exports for convenience
pub use kind::{FieldDef, FieldType, RecordKind, ID_FIELD, LAST_MODIFIED_FIELD};
pub use record::{DirectoryEntry, EventEntry, KeyPolicy, Record, RecordId, StoredRecord};
pub use value::{FieldValue, RecordError};

/// Current processing date as `YYYY-MM-DD` (local clock)
pub fn processing_date() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}
