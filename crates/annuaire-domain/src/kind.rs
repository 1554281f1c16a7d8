//! Record kinds and their static schemas

use crate::record::{DIRECTORY_FIELDS, EVENT_FIELDS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two families of records the pipeline ingests
///
/// A kind fixes the table, the typed field set and the pair of fields used
/// when looking for possible duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// Directory-style contact entry (`annuaire` table)
    #[serde(rename = "annuaire")]
    DirectoryEntry,

    /// Event entry (`evenement` table)
    #[serde(rename = "evenement")]
    EventEntry,
}

/// Scalar type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Free text
    Text,
    /// Signed integer
    Integer,
    /// Floating point number
    Float,
    /// Boolean flag
    Bool,
    /// ISO date string (`YYYY-MM-DD`)
    Date,
    /// Time of day string (`HH:MM`)
    Time,
}

impl FieldType {
    /// Short name used in prompts and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "number",
            FieldType::Bool => "boolean",
            FieldType::Date => "date (YYYY-MM-DD)",
            FieldType::Time => "time (HH:MM)",
        }
    }

    /// JSON schema type keyword
    pub fn json_type(&self) -> &'static str {
        match self {
            FieldType::Text | FieldType::Date | FieldType::Time => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "number",
            FieldType::Bool => "boolean",
        }
    }
}

/// One column of a record schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Column name, identical on the wire and in the store
    pub name: &'static str,
    /// Scalar type
    pub ty: FieldType,
    /// Whether the field must be present and non-empty
    pub required: bool,
}

/// Name of the surrogate id column shared by both tables
pub const ID_FIELD: &str = "numero";

/// Name of the last-modified column shared by both tables
pub const LAST_MODIFIED_FIELD: &str = "date_derniere_modification";

impl RecordKind {
    /// All kinds, in a stable order
    pub const ALL: [RecordKind; 2] = [RecordKind::DirectoryEntry, RecordKind::EventEntry];

    /// Wire and table name
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::DirectoryEntry => "annuaire",
            RecordKind::EventEntry => "evenement",
        }
    }

    /// Store table holding records of this kind
    pub fn table(&self) -> &'static str {
        self.as_str()
    }

    /// Ordered schema of this kind (id column excluded)
    pub fn fields(&self) -> &'static [FieldDef] {
        match self {
            RecordKind::DirectoryEntry => DIRECTORY_FIELDS,
            RecordKind::EventEntry => EVENT_FIELDS,
        }
    }

    /// Look up a field definition by name
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields().iter().find(|f| f.name == name)
    }

    /// Field compared by trigram similarity during duplicate resolution
    pub fn primary_field(&self) -> &'static str {
        match self {
            RecordKind::DirectoryEntry => "nom",
            RecordKind::EventEntry => "nom_evenement",
        }
    }

    /// Field whose first character is compared during duplicate resolution
    pub fn secondary_field(&self) -> &'static str {
        match self {
            RecordKind::DirectoryEntry => "prenom",
            RecordKind::EventEntry => "nom_evenement",
        }
    }

    /// Human label used in prompts
    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::DirectoryEntry => "directory entries (partner contacts)",
            RecordKind::EventEntry => "event entries",
        }
    }

    /// Parse a kind from its wire name or an English alias
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "annuaire" | "directory" | "directory_entry" => Some(RecordKind::DirectoryEntry),
            "evenement" | "evenements" | "event" | "event_entry" => Some(RecordKind::EventEntry),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid record kind: {}", s))
    }
}
