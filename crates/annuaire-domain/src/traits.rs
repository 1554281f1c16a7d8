//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and its
//! infrastructure. Implementations live in other crates.

use crate::{Record, RecordId, RecordKind, StoredRecord};

/// Trait for the persistent record collection
///
/// Implemented by the infrastructure layer (annuaire-store). Writes issued
/// between [`begin`](RecordStore::begin) and
/// [`commit`](RecordStore::commit) form one all-or-nothing unit.
pub trait RecordStore {
    /// Error type for store operations
    type Error;

    /// All stored records of a kind, ordered by id
    fn fetch_all(&self, kind: RecordKind) -> Result<Vec<StoredRecord>, Self::Error>;

    /// Stored records of a kind whose primary field scores above
    /// `threshold` against `primary`, or whose secondary field starts with
    /// the same character as `secondary`
    fn find_similar(
        &self,
        kind: RecordKind,
        primary: &str,
        secondary: &str,
        threshold: f64,
    ) -> Result<Vec<StoredRecord>, Self::Error>;

    /// Insert a record and return its newly assigned id
    fn insert(&mut self, record: &Record) -> Result<RecordId, Self::Error>;

    /// Overwrite every field of the record with the given id
    fn update(&mut self, id: RecordId, record: &Record) -> Result<(), Self::Error>;

    /// Open a transaction
    fn begin(&mut self) -> Result<(), Self::Error>;

    /// Commit the open transaction
    fn commit(&mut self) -> Result<(), Self::Error>;

    /// Discard every write of the open transaction
    fn rollback(&mut self) -> Result<(), Self::Error>;
}

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (annuaire-llm)
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Generate text completion
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Generate a JSON document constrained by `schema` (a JSON schema)
    fn generate_structured(&self, prompt: &str, schema: &str) -> Result<String, Self::Error>;
}
