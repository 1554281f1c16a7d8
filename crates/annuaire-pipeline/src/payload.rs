//! Client payloads for the replace and add paths

use crate::error::IngestError;
use annuaire_domain::{KeyPolicy, Record, RecordError, RecordId, RecordKind, ID_FIELD};
use serde_json::Value;

/// Parse a replace payload: a JSON array of full records, each with its id
///
/// Every entry is checked before anything is written. Unknown keys are
/// rejected; empty strings become nulls.
pub fn parse_replace_payload(
    kind: RecordKind,
    payload: &Value,
) -> Result<Vec<(RecordId, Record)>, IngestError> {
    let entries = payload.as_array().ok_or_else(|| {
        IngestError::Validation("Expected a JSON array of entries".to_string())
    })?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let (id, record) = Record::from_json(kind, entry, KeyPolicy::Reject)
                .map_err(|e| IngestError::Validation(format!("entry {}: {}", index, e)))?;
            let id = id.ok_or_else(|| {
                IngestError::Validation(format!(
                    "entry {}: {}",
                    index,
                    RecordError::MissingId(ID_FIELD)
                ))
            })?;
            Ok((id, record))
        })
        .collect()
}

/// Parse an add payload: one JSON record
///
/// A `numero` key is accepted and discarded; the store assigns the id.
pub fn parse_add_payload(kind: RecordKind, payload: &Value) -> Result<Record, IngestError> {
    Record::from_json(kind, payload, KeyPolicy::Reject)
        .map(|(_, record)| record)
        .map_err(|e| IngestError::Validation(e.to_string()))
}
