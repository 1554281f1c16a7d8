//! Typed records
//!
//! Each kind is declared once with [`record_entry!`], which produces the
//! entry struct, its static schema and its positional conversions. Required
//! fields are plain `String`s; every other field is an `Option` of its
//! scalar type.

use crate::kind::{FieldDef, FieldType, RecordKind, ID_FIELD};
use crate::value::{optional_scalar, required_text, FieldValue, RecordError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

macro_rules! field_rust_type {
    (Text) => { String };
    (Integer) => { i64 };
    (Float) => { f64 };
    (Bool) => { bool };
    (Date) => { String };
    (Time) => { String };
}

macro_rules! record_entry {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:expr, $schema:ident {
            required { $( $rfield:ident ),* $(,)? }
            optional { $( $ofield:ident : $oty:ident ),* $(,)? }
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
        pub struct $name {
            $(
                #[doc = concat!("`", stringify!($rfield), "` (required)")]
                pub $rfield: String,
            )*
            $(
                #[doc = concat!("`", stringify!($ofield), "`")]
                #[serde(default)]
                pub $ofield: Option<field_rust_type!($oty)>,
            )*
        }

        #[doc = concat!("Ordered schema of [`", stringify!($name), "`]")]
        pub const $schema: &[FieldDef] = &[
            $( FieldDef { name: stringify!($rfield), ty: FieldType::Text, required: true }, )*
            $( FieldDef { name: stringify!($ofield), ty: FieldType::$oty, required: false }, )*
        ];

        impl $name {
            /// Kind of this entry
            pub const KIND: RecordKind = $kind;

            /// Field values in schema order
            pub fn values(&self) -> Vec<FieldValue> {
                vec![
                    $( FieldValue::Text(self.$rfield.clone()), )*
                    $( self.$ofield.clone().into(), )*
                ]
            }

            /// Build an entry from values in schema order
            pub fn from_values(values: Vec<FieldValue>) -> Result<Self, RecordError> {
                let mut it = values.into_iter();
                Ok(Self {
                    $( $rfield: required_text(stringify!($rfield), it.next())?, )*
                    $( $ofield: optional_scalar(stringify!($ofield), it.next())?, )*
                })
            }

            /// Trim text fields and turn empty ones into nulls
            fn normalize_text(&mut self) {
                $( self.$rfield = self.$rfield.trim().to_string(); )*
                $( normalize_optional(&mut self.$ofield); )*
            }

            fn check_required(&self) -> Result<(), RecordError> {
                $(
                    if self.$rfield.trim().is_empty() {
                        return Err(RecordError::MissingField(stringify!($rfield)));
                    }
                )*
                Ok(())
            }
        }
    };
}

/// Empty-string normalization for optional fields of any scalar type
trait NormalizeOptional {
    fn normalize(slot: &mut Option<Self>)
    where
        Self: Sized;
}

impl NormalizeOptional for String {
    fn normalize(slot: &mut Option<Self>) {
        if let Some(s) = slot.take() {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                *slot = Some(trimmed.to_string());
            }
        }
    }
}

macro_rules! keep_as_is {
    ($($t:ty),*) => {
        $( impl NormalizeOptional for $t { fn normalize(_slot: &mut Option<Self>) {} } )*
    };
}

keep_as_is!(i64, f64, bool);

fn normalize_optional<T: NormalizeOptional>(slot: &mut Option<T>) {
    T::normalize(slot);
}

record_entry! {
    /// A directory-style contact entry
    DirectoryEntry, RecordKind::DirectoryEntry, DIRECTORY_FIELDS {
        required { nom, prenom }
        optional {
            type_de_partenaire: Text,
            personnalite_juridique: Text,
            type_de_fournisseur: Text,
            voie: Text,
            complement: Text,
            npa: Integer,
            localite: Text,
            pays: Text,
            telephone: Text,
            portable: Text,
            courriel: Text,
            site_web: Text,
            activite_specialite: Text,
            medecin: Bool,
            medecin_intra_hospitalier: Bool,
            horaires_ouverture: Text,
            coord_geo_nord: Float,
            coord_geo_est: Float,
            coord_geo_long: Float,
            coord_geo_lat: Float,
            besoin_convention: Bool,
            type_de_convention: Text,
            date_convention_soumise: Date,
            date_convention_valide_recue: Date,
            date_derniere_modification: Date,
            date_saisie: Date,
            date_dernier_appel_actualisation: Date,
        }
    }
}

record_entry! {
    /// An event entry
    EventEntry, RecordKind::EventEntry, EVENT_FIELDS {
        required { nom_evenement }
        optional {
            titre_evenement: Text,
            date_debut: Date,
            date_fin: Date,
            horaire_debut: Time,
            horaire_fin: Time,
            texte_libre: Text,
            court_descriptif: Text,
            numero_partenaire: Integer,
            nom_partenaire: Text,
            partenaire_de_la_selection: Text,
            sites_originaux: Text,
            date_creation: Date,
            mode_creation: Text,
            date_derniere_modification: Date,
            mode_modification: Text,
            id_dernier_modificateur: Text,
            date_de_peremption: Date,
        }
    }
}

/// Store-assigned surrogate id (`numero`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl RecordId {
    /// Raw integer value
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How unknown keys in a JSON payload are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPolicy {
    /// Drop keys that are not in the schema (model output)
    Ignore,
    /// Fail on keys that are not in the schema (client payloads)
    Reject,
}

/// A record of either kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    /// Directory entry
    Directory(DirectoryEntry),
    /// Event entry
    Event(EventEntry),
}

impl Record {
    /// Kind of the record
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Directory(_) => RecordKind::DirectoryEntry,
            Record::Event(_) => RecordKind::EventEntry,
        }
    }

    /// Field values in schema order
    pub fn values(&self) -> Vec<FieldValue> {
        match self {
            Record::Directory(e) => e.values(),
            Record::Event(e) => e.values(),
        }
    }

    /// Build a record from values in schema order
    pub fn from_values(kind: RecordKind, values: Vec<FieldValue>) -> Result<Self, RecordError> {
        match kind {
            RecordKind::DirectoryEntry => DirectoryEntry::from_values(values).map(Record::Directory),
            RecordKind::EventEntry => EventEntry::from_values(values).map(Record::Event),
        }
    }

    /// Build a record from a JSON object, coercing each field to its type
    ///
    /// The `numero` key is returned separately and never becomes part of the
    /// record. Empty strings are read as nulls.
    pub fn from_json(
        kind: RecordKind,
        value: &Value,
        policy: KeyPolicy,
    ) -> Result<(Option<RecordId>, Record), RecordError> {
        let obj = value.as_object().ok_or(RecordError::NotAnObject)?;

        if policy == KeyPolicy::Reject {
            if let Some(key) = obj
                .keys()
                .find(|k| k.as_str() != ID_FIELD && kind.field(k).is_none())
            {
                return Err(RecordError::UnknownField(key.clone()));
            }
        }

        let id = match obj.get(ID_FIELD) {
            None => None,
            Some(raw) => match FieldValue::coerce(raw, FieldType::Integer) {
                Ok(FieldValue::Integer(i)) => Some(RecordId(i)),
                Ok(_) => None,
                Err(reason) => {
                    return Err(RecordError::InvalidField {
                        field: ID_FIELD.to_string(),
                        reason,
                    })
                }
            },
        };

        let values = kind
            .fields()
            .iter()
            .map(|def| match obj.get(def.name) {
                None => Ok(FieldValue::Null),
                Some(raw) => FieldValue::coerce(raw, def.ty).map_err(|reason| {
                    RecordError::InvalidField {
                        field: def.name.to_string(),
                        reason,
                    }
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok((id, Record::from_values(kind, values)?))
    }

    /// Flat JSON object of the record, nulls included
    pub fn to_json(&self) -> Map<String, Value> {
        self.kind()
            .fields()
            .iter()
            .zip(self.values())
            .map(|(def, v)| (def.name.to_string(), v.to_json()))
            .collect()
    }

    /// Trim text and turn empty optional strings into nulls
    pub fn normalize(&mut self) {
        match self {
            Record::Directory(e) => e.normalize_text(),
            Record::Event(e) => e.normalize_text(),
        }
    }

    /// Check required-field presence
    pub fn validate(&self) -> Result<(), RecordError> {
        match self {
            Record::Directory(e) => e.check_required(),
            Record::Event(e) => e.check_required(),
        }
    }

    /// Set the last-modified date (`YYYY-MM-DD`)
    pub fn touch(&mut self, date: &str) {
        let slot = match self {
            Record::Directory(e) => &mut e.date_derniere_modification,
            Record::Event(e) => &mut e.date_derniere_modification,
        };
        *slot = Some(date.to_string());
    }

    /// Last-modified date, if set
    pub fn last_modified(&self) -> Option<&str> {
        match self {
            Record::Directory(e) => e.date_derniere_modification.as_deref(),
            Record::Event(e) => e.date_derniere_modification.as_deref(),
        }
    }

    /// Value of the field compared by similarity
    pub fn primary_value(&self) -> &str {
        match self {
            Record::Directory(e) => &e.nom,
            Record::Event(e) => &e.nom_evenement,
        }
    }

    /// Value of the field compared by first character
    pub fn secondary_value(&self) -> &str {
        match self {
            Record::Directory(e) => &e.prenom,
            Record::Event(e) => &e.nom_evenement,
        }
    }

    /// Short human label (`Dupont Jean`, `Fête de la musique`)
    pub fn display_name(&self) -> String {
        match self {
            Record::Directory(e) => format!("{} {}", e.nom, e.prenom),
            Record::Event(e) => e.nom_evenement.clone(),
        }
    }
}

impl From<DirectoryEntry> for Record {
    fn from(entry: DirectoryEntry) -> Self {
        Record::Directory(entry)
    }
}

impl From<EventEntry> for Record {
    fn from(entry: EventEntry) -> Self {
        Record::Event(entry)
    }
}

/// A record as persisted, with its store-assigned id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRecord {
    /// Surrogate id
    #[serde(rename = "numero")]
    pub id: RecordId,

    /// Field values
    #[serde(flatten)]
    pub record: Record,
}

impl StoredRecord {
    /// Pair a record with its id
    pub fn new(id: RecordId, record: Record) -> Self {
        Self { id, record }
    }

    /// Kind of the stored record
    pub fn kind(&self) -> RecordKind {
        self.record.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::LAST_MODIFIED_FIELD;
    use serde_json::json;

    fn dupont() -> DirectoryEntry {
        DirectoryEntry {
            nom: "Dupont".to_string(),
            prenom: "Jean".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_schema_order_matches_values() {
        let mut entry = dupont();
        entry.npa = Some(1201);
        entry.medecin = Some(true);
        let values = entry.values();
        assert_eq!(values.len(), DIRECTORY_FIELDS.len());
        let npa_pos = DIRECTORY_FIELDS.iter().position(|f| f.name == "npa").unwrap();
        assert_eq!(values[npa_pos], FieldValue::Integer(1201));
        assert_eq!(values[0], FieldValue::Text("Dupont".into()));
    }

    #[test]
    fn test_from_values_rejects_missing_required() {
        let mut values = dupont().values();
        values[1] = FieldValue::Null;
        assert_eq!(
            DirectoryEntry::from_values(values),
            Err(RecordError::MissingField("prenom"))
        );
    }

    #[test]
    fn test_from_json_strips_id_and_coerces() {
        let payload = json!({
            "numero": 42,
            "nom": "Dupont",
            "prenom": "Jean",
            "npa": "1201",
            "medecin": "Oui",
            "courriel": "",
            "bogus": "ignored"
        });
        let (id, record) =
            Record::from_json(RecordKind::DirectoryEntry, &payload, KeyPolicy::Ignore).unwrap();
        assert_eq!(id, Some(RecordId(42)));
        let Record::Directory(entry) = record else {
            panic!("Expected directory entry");
        };
        assert_eq!(entry.npa, Some(1201));
        assert_eq!(entry.medecin, Some(true));
        assert_eq!(entry.courriel, None);
    }

    #[test]
    fn test_from_json_reject_policy() {
        let payload = json!({"nom_evenement": "Fête", "bogus": 1});
        let err = Record::from_json(RecordKind::EventEntry, &payload, KeyPolicy::Reject).unwrap_err();
        assert_eq!(err, RecordError::UnknownField("bogus".into()));
    }

    #[test]
    fn test_from_json_names_bad_field() {
        let payload = json!({"nom": "Dupont", "prenom": "Jean", "coord_geo_lat": "north"});
        let err = Record::from_json(RecordKind::DirectoryEntry, &payload, KeyPolicy::Ignore).unwrap_err();
        match err {
            RecordError::InvalidField { field, .. } => assert_eq!(field, "coord_geo_lat"),
            other => panic!("Expected InvalidField, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_required_field_is_missing() {
        let payload = json!({"nom": "", "prenom": "Jean"});
        let err = Record::from_json(RecordKind::DirectoryEntry, &payload, KeyPolicy::Ignore).unwrap_err();
        assert_eq!(err, RecordError::MissingField("nom"));
    }

    #[test]
    fn test_normalize_and_touch() {
        let mut entry = dupont();
        entry.voie = Some("   ".to_string());
        entry.localite = Some(" Genève ".to_string());
        let mut record = Record::from(entry);
        record.normalize();
        record.touch("2024-05-01");

        let Record::Directory(entry) = &record else { unreachable!() };
        assert_eq!(entry.voie, None);
        assert_eq!(entry.localite.as_deref(), Some("Genève"));
        assert_eq!(record.last_modified(), Some("2024-05-01"));
    }

    #[test]
    fn test_touch_writes_last_modified_column() {
        for mut record in [Record::from(dupont()), Record::from(EventEntry::default())] {
            record.touch("2024-05-01");
            assert_eq!(record.to_json()[LAST_MODIFIED_FIELD], json!("2024-05-01"));
        }
    }

    #[test]
    fn test_missing_id_message() {
        assert_eq!(
            RecordError::MissingId(ID_FIELD).to_string(),
            "missing 'numero' field for replacement"
        );
    }

    #[test]
    fn test_validate_after_manual_construction() {
        let record = Record::from(EventEntry::default());
        assert_eq!(record.validate(), Err(RecordError::MissingField("nom_evenement")));
    }

    #[test]
    fn test_stored_record_serializes_flat() {
        let stored = StoredRecord::new(RecordId(7), dupont().into());
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["numero"], 7);
        assert_eq!(json["nom"], "Dupont");
        assert!(json["npa"].is_null());
    }

    #[test]
    fn test_match_values() {
        let record = Record::from(dupont());
        assert_eq!(record.primary_value(), "Dupont");
        assert_eq!(record.secondary_value(), "Jean");
        let event = Record::from(EventEntry {
            nom_evenement: "Marché de Noël".into(),
            ..Default::default()
        });
        assert_eq!(event.primary_value(), event.secondary_value());
    }

    #[test]
    fn test_to_json_covers_schema() {
        let record = Record::from(dupont());
        let map = record.to_json();
        assert_eq!(map.len(), DIRECTORY_FIELDS.len());
        assert_eq!(map["prenom"], json!("Jean"));
    }
}
