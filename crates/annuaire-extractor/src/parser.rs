//! Parse LLM output into candidate records

use crate::error::ExtractorError;
use annuaire_domain::{KeyPolicy, Record, RecordKind};
use serde_json::Value;

/// Parse an LLM reply into validated records of `kind`
///
/// Accepts `{"entries": [...]}` or a bare array, optionally wrapped in a
/// markdown code block. Every entry is coerced to the schema; the first
/// entry that does not fit fails the whole reply.
pub fn parse_llm_response(kind: RecordKind, response: &str) -> Result<Vec<Record>, ExtractorError> {
    let json: Value = serde_json::from_str(extract_json(response)?)?;

    let entries = match json {
        Value::Array(entries) => entries,
        Value::Object(mut obj) => match obj.remove("entries") {
            Some(Value::Array(entries)) => entries,
            Some(Value::Null) => Vec::new(),
            Some(_) => {
                return Err(ExtractorError::InvalidFormat(
                    "'entries' is not an array".to_string(),
                ))
            }
            None => {
                return Err(ExtractorError::InvalidFormat(
                    "Expected an object with an 'entries' array".to_string(),
                ))
            }
        },
        _ => {
            return Err(ExtractorError::InvalidFormat(
                "Expected a JSON object or array".to_string(),
            ))
        }
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let (_, mut record) = Record::from_json(kind, entry, KeyPolicy::Ignore)
                .map_err(|source| ExtractorError::InvalidEntry { index, source })?;
            record.normalize();
            record
                .validate()
                .map_err(|source| ExtractorError::InvalidEntry { index, source })?;
            Ok(record)
        })
        .collect()
}

/// Extract JSON from response, handling markdown code blocks
fn extract_json(response: &str) -> Result<&str, ExtractorError> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(ExtractorError::InvalidFormat("Empty response".to_string()));
    }

    if let Some(rest) = trimmed.strip_prefix("```") {
        // Drop the info string (```json) and the closing fence
        let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or("");
        let body = body.trim_end().strip_suffix("```").unwrap_or(body);
        if body.trim().is_empty() {
            return Err(ExtractorError::InvalidFormat("Empty code block".to_string()));
        }
        return Ok(body.trim());
    }

    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use annuaire_domain::{DirectoryEntry, EventEntry, RecordError};

    #[test]
    fn test_parse_entries_object() {
        let response = r#"{"entries": [
            {"nom": "Dupont", "prenom": "Jean", "npa": "1205", "medecin": "oui"},
            {"nom": "Martin", "prenom": "Anne", "coord_geo_lat": "46,2"}
        ]}"#;
        let records = parse_llm_response(RecordKind::DirectoryEntry, response).unwrap();
        assert_eq!(records.len(), 2);
        match &records[0] {
            Record::Directory(DirectoryEntry { nom, npa, medecin, .. }) => {
                assert_eq!(nom, "Dupont");
                assert_eq!(*npa, Some(1205));
                assert_eq!(*medecin, Some(true));
            }
            other => panic!("Expected directory entry, got {:?}", other),
        }
        match &records[1] {
            Record::Directory(e) => assert_eq!(e.coord_geo_lat, Some(46.2)),
            other => panic!("Expected directory entry, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_bare_array_in_code_block() {
        let response = "```json\n[{\"nom_evenement\": \"Salon\", \"date_debut\": \"03.05.2024\"}]\n```";
        let records = parse_llm_response(RecordKind::EventEntry, response).unwrap();
        match &records[0] {
            Record::Event(EventEntry { nom_evenement, date_debut, .. }) => {
                assert_eq!(nom_evenement, "Salon");
                assert_eq!(date_debut.as_deref(), Some("2024-05-03"));
            }
            other => panic!("Expected event entry, got {:?}", other),
        }
    }

    #[test]
    fn test_client_id_and_unknown_keys_are_ignored() {
        let response = r#"{"entries": [{"numero": 7, "nom": "Dupont", "prenom": "Jean", "age": 40}]}"#;
        let records = parse_llm_response(RecordKind::DirectoryEntry, response).unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].to_json().contains_key("numero"));
    }

    #[test]
    fn test_empty_strings_become_null() {
        let response = r#"[{"nom": " Dupont ", "prenom": "Jean", "courriel": "  ", "npa": ""}]"#;
        let records = parse_llm_response(RecordKind::DirectoryEntry, response).unwrap();
        match &records[0] {
            Record::Directory(e) => {
                assert_eq!(e.nom, "Dupont");
                assert_eq!(e.courriel, None);
                assert_eq!(e.npa, None);
            }
            other => panic!("Expected directory entry, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_list() {
        let records = parse_llm_response(RecordKind::EventEntry, r#"{"entries": []}"#).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_missing_required_field_reports_index() {
        let response = r#"[{"nom": "Dupont", "prenom": "Jean"}, {"nom": "Martin"}]"#;
        match parse_llm_response(RecordKind::DirectoryEntry, response) {
            Err(ExtractorError::InvalidEntry { index, source }) => {
                assert_eq!(index, 1);
                assert_eq!(source, RecordError::MissingField("prenom"));
            }
            other => panic!("Expected InvalidEntry, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_type_reports_field() {
        let response = r#"[{"nom": "Dupont", "prenom": "Jean", "npa": "Genève"}]"#;
        let err = parse_llm_response(RecordKind::DirectoryEntry, response).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("index 0"), "{}", message);
        assert!(message.contains("npa"), "{}", message);
    }

    #[test]
    fn test_invalid_shapes() {
        for response in ["not json", "", "42", r#"{"items": []}"#, r#"{"entries": {}}"#, "```\n```"] {
            let result = parse_llm_response(RecordKind::DirectoryEntry, response);
            assert!(
                matches!(result, Err(ExtractorError::InvalidFormat(_))),
                "{:?} -> {:?}",
                response,
                result
            );
        }
    }
}
