//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use annuaire_domain::{RecordKind, StoredRecord, LAST_MODIFIED_FIELD};
use annuaire_pipeline::BatchResult;
use colored::*;
use serde_json::{Map, Value};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Columns shown in table output, as (header, field)
fn table_columns(kind: RecordKind) -> &'static [(&'static str, &'static str)] {
    match kind {
        RecordKind::DirectoryEntry => &[
            ("Nom", "nom"),
            ("Prénom", "prenom"),
            ("Localité", "localite"),
            ("Téléphone", "telephone"),
            ("Courriel", "courriel"),
            ("Modifié", LAST_MODIFIED_FIELD),
        ],
        RecordKind::EventEntry => &[
            ("Événement", "nom_evenement"),
            ("Début", "date_debut"),
            ("Fin", "date_fin"),
            ("Partenaire", "nom_partenaire"),
            ("Modifié", LAST_MODIFIED_FIELD),
        ],
    }
}

fn cell(fields: &Map<String, Value>, name: &str) -> String {
    match fields.get(name) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format stored records.
    pub fn format_records(&self, kind: RecordKind, records: &[StoredRecord]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
            OutputFormat::Table => Ok(self.records_table(kind, records)),
            OutputFormat::Quiet => Ok(ids(records)),
        }
    }

    /// Format the outcome of an ingestion.
    pub fn format_batch(&self, kind: RecordKind, result: &BatchResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "status": result.status(),
                "inserted_records": result.inserted_records,
                "duplicate_groups": result.duplicate_groups,
            }))?),
            OutputFormat::Quiet => Ok(ids(&result.inserted_records)),
            OutputFormat::Table => {
                let mut out = Vec::new();
                out.push(self.success(&format!(
                    "Inserted {} record(s)",
                    result.inserted_records.len()
                )));
                if !result.inserted_records.is_empty() {
                    out.push(self.records_table(kind, &result.inserted_records));
                }
                for group in &result.duplicate_groups {
                    out.push(self.warning(&format!(
                        "Possible duplicate, not inserted: {}",
                        group.candidate.display_name()
                    )));
                    for m in &group.matches {
                        let reason = if m.initial_match {
                            format!("similarity {:.2}, same initial", m.similarity)
                        } else {
                            format!("similarity {:.2}", m.similarity)
                        };
                        out.push(format!(
                            "    #{} {} ({})",
                            m.existing.id,
                            m.existing.record.display_name(),
                            reason
                        ));
                    }
                }
                Ok(out.join("\n"))
            }
        }
    }

    fn records_table(&self, kind: RecordKind, records: &[StoredRecord]) -> String {
        if records.is_empty() {
            return self.colorize("No records found.", "yellow");
        }

        let columns = table_columns(kind);
        let mut builder = Builder::default();
        builder.push_record(
            std::iter::once("Numero").chain(columns.iter().map(|(header, _)| *header)),
        );

        for stored in records {
            let fields = stored.record.to_json();
            builder.push_record(
                std::iter::once(stored.id.to_string())
                    .chain(columns.iter().map(|(_, name)| cell(&fields, name))),
            );
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn ids(records: &[StoredRecord]) -> String {
    records
        .iter()
        .map(|r| r.id.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use annuaire_domain::{DirectoryEntry, RecordId};
    use annuaire_pipeline::{DuplicateGroup, MatchCandidate};

    fn stored(id: i64, nom: &str, prenom: &str) -> StoredRecord {
        StoredRecord::new(
            RecordId(id),
            DirectoryEntry {
                nom: nom.to_string(),
                prenom: prenom.to_string(),
                localite: Some("Lausanne".to_string()),
                ..Default::default()
            }
            .into(),
        )
    }

    fn conflict() -> BatchResult {
        let existing = stored(1, "Dupont", "Jean");
        BatchResult {
            inserted_records: vec![stored(2, "Rochat", "Anne")],
            duplicate_groups: vec![DuplicateGroup {
                candidate: stored(0, "Dupond", "Jeanne").record,
                matches: vec![MatchCandidate {
                    existing,
                    similarity: 0.5556,
                    initial_match: true,
                }],
            }],
        }
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter
            .format_records(RecordKind::DirectoryEntry, &[stored(1, "Dupont", "Jean")])
            .unwrap();
        assert!(output.contains("Prénom"));
        assert!(output.contains("Dupont"));
        assert!(output.contains("Lausanne"));
    }

    #[test]
    fn test_table_shows_last_modified() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let mut record = stored(1, "Dupont", "Jean");
        record.record.touch("2024-05-01");
        let output = formatter
            .format_records(RecordKind::DirectoryEntry, &[record])
            .unwrap();
        assert!(output.contains("Modifié"));
        assert!(output.contains("2024-05-01"));
    }

    #[test]
    fn test_empty_records() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_records(RecordKind::EventEntry, &[]).unwrap();
        assert!(output.contains("No records found"));
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter
            .format_records(RecordKind::DirectoryEntry, &[stored(7, "Dupont", "Jean")])
            .unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0]["numero"], 7);
        assert_eq!(parsed[0]["prenom"], "Jean");
    }

    #[test]
    fn test_quiet_format() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = formatter
            .format_records(
                RecordKind::DirectoryEntry,
                &[stored(3, "A", "B"), stored(4, "C", "D")],
            )
            .unwrap();
        assert_eq!(output, "3\n4");
    }

    #[test]
    fn test_batch_table_lists_duplicates() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter
            .format_batch(RecordKind::DirectoryEntry, &conflict())
            .unwrap();
        assert!(output.starts_with("✓ Inserted 1 record(s)"));
        assert!(output.contains("⚠ Possible duplicate, not inserted: Dupond Jeanne"));
        assert!(output.contains("#1 Dupont Jean (similarity 0.56, same initial)"));
    }

    #[test]
    fn test_batch_json_carries_status() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter
            .format_batch(RecordKind::DirectoryEntry, &conflict())
            .unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["status"], "conflict");
        assert_eq!(parsed["duplicate_groups"][0]["matches"][0]["existing"]["numero"], 1);
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
    }
}
