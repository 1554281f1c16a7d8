//! Scalar field values and type coercion
//!
//! Every record field crosses a boundary as a [`FieldValue`]: model output and
//! client payloads are coerced into one, store rows are read into one, and the
//! typed entry structs are built from an ordered list of them.

use crate::kind::FieldType;
use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while building or validating a record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    /// A required field is absent, null or empty
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    /// A field value cannot be coerced to the schema type
    #[error("invalid value for field '{field}': {reason}")]
    InvalidField {
        /// Offending field
        field: String,
        /// What went wrong
        reason: String,
    },

    /// A key that is not part of the schema
    #[error("unknown field '{0}'")]
    UnknownField(String),

    /// The payload is not a JSON object
    #[error("record is not a JSON object")]
    NotAnObject,

    /// A replace entry without its id
    #[error("missing '{0}' field for replacement")]
    MissingId(&'static str),
}

/// A single scalar value of a record field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Absent value
    Null,
    /// Text, date and time values
    Text(String),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// Boolean value
    Bool(bool),
}

impl FieldValue {
    /// Whether the value is absent
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// JSON form of the value
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Bool(b) => Value::Bool(*b),
        }
    }

    /// Coerce a JSON value to the given schema type
    ///
    /// Empty and whitespace-only strings become [`FieldValue::Null`] for every
    /// type. The error string describes the mismatch without the field name;
    /// callers attach it.
    pub fn coerce(value: &Value, ty: FieldType) -> Result<FieldValue, String> {
        if let Value::String(s) = value {
            if s.trim().is_empty() {
                return Ok(FieldValue::Null);
            }
        }
        if value.is_null() {
            return Ok(FieldValue::Null);
        }

        match ty {
            FieldType::Text => coerce_text(value),
            FieldType::Integer => coerce_integer(value),
            FieldType::Float => coerce_float(value),
            FieldType::Bool => coerce_bool(value),
            FieldType::Date => coerce_date(value),
            FieldType::Time => coerce_time(value),
        }
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map(FieldValue::Text).unwrap_or(FieldValue::Null)
    }
}

impl From<Option<i64>> for FieldValue {
    fn from(value: Option<i64>) -> Self {
        value.map(FieldValue::Integer).unwrap_or(FieldValue::Null)
    }
}

impl From<Option<f64>> for FieldValue {
    fn from(value: Option<f64>) -> Self {
        value.map(FieldValue::Float).unwrap_or(FieldValue::Null)
    }
}

impl From<Option<bool>> for FieldValue {
    fn from(value: Option<bool>) -> Self {
        value.map(FieldValue::Bool).unwrap_or(FieldValue::Null)
    }
}

/// Rust scalar types a typed entry field can hold
pub trait FieldScalar: Sized {
    /// Convert an already-typed value; `None` on mismatch
    fn from_field_value(value: FieldValue) -> Option<Self>;
}

impl FieldScalar for String {
    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl FieldScalar for i64 {
    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Integer(i) => Some(i),
            _ => None,
        }
    }
}

impl FieldScalar for f64 {
    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Float(f) => Some(f),
            // SQLite hands back integral REAL values as integers
            FieldValue::Integer(i) => Some(i as f64),
            _ => None,
        }
    }
}

impl FieldScalar for bool {
    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Bool(b) => Some(b),
            FieldValue::Integer(i) => Some(i != 0),
            _ => None,
        }
    }
}

/// Read an optional typed field out of a positional value
pub(crate) fn optional_scalar<T: FieldScalar>(
    field: &'static str,
    value: Option<FieldValue>,
) -> Result<Option<T>, RecordError> {
    match value {
        None | Some(FieldValue::Null) => Ok(None),
        Some(v) => T::from_field_value(v).map(Some).ok_or_else(|| RecordError::InvalidField {
            field: field.to_string(),
            reason: "stored value has the wrong type".to_string(),
        }),
    }
}

/// Read a required text field out of a positional value
pub(crate) fn required_text(
    field: &'static str,
    value: Option<FieldValue>,
) -> Result<String, RecordError> {
    match value {
        Some(FieldValue::Text(s)) if !s.trim().is_empty() => Ok(s),
        _ => Err(RecordError::MissingField(field)),
    }
}

fn mismatch(expected: FieldType, value: &Value) -> String {
    let mut shown = value.to_string();
    if shown.chars().count() > 40 {
        shown = shown.chars().take(40).collect::<String>() + "...";
    }
    format!("expected {}, got {}", expected.as_str(), shown)
}

fn coerce_text(value: &Value) -> Result<FieldValue, String> {
    match value {
        Value::String(s) => Ok(FieldValue::Text(s.trim().to_string())),
        Value::Number(n) => Ok(FieldValue::Text(n.to_string())),
        Value::Bool(b) => Ok(FieldValue::Text(b.to_string())),
        other => Err(mismatch(FieldType::Text, other)),
    }
}

fn coerce_integer(value: &Value) -> Result<FieldValue, String> {
    let integral = |f: f64| {
        (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
    };
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.replace(',', ".").parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    };
    parsed
        .map(FieldValue::Integer)
        .ok_or_else(|| mismatch(FieldType::Integer, value))
}

fn coerce_float(value: &Value) -> Result<FieldValue, String> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|f| f.is_finite())
        .map(FieldValue::Float)
        .ok_or_else(|| mismatch(FieldType::Float, value))
}

fn coerce_bool(value: &Value) -> Result<FieldValue, String> {
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "oui" | "yes" | "true" | "vrai" | "1" => Some(true),
            "non" | "no" | "false" | "faux" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed
        .map(FieldValue::Bool)
        .ok_or_else(|| mismatch(FieldType::Bool, value))
}

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%Y/%m/%d"];

/// Normalize a date string to `YYYY-MM-DD`
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    // Accept full timestamps by keeping their date part
    let head = raw.get(..10).filter(|_| raw.len() > 10 && raw.is_char_boundary(10));
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| head.and_then(|h| NaiveDate::parse_from_str(h, "%Y-%m-%d").ok()))
        .map(|d| d.format("%Y-%m-%d").to_string())
}

const TIME_FORMATS: [&str; 3] = ["%H:%M:%S", "%H:%M", "%Hh%M"];

/// Normalize a time-of-day string to `HH:MM`
pub fn normalize_time(raw: &str) -> Option<String> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            // "14h" on its own
            raw.strip_suffix('h')
                .and_then(|h| h.parse::<u32>().ok())
                .and_then(|h| NaiveTime::from_hms_opt(h, 0, 0))
        })
        .map(|t| t.format("%H:%M").to_string())
}

fn coerce_date(value: &Value) -> Result<FieldValue, String> {
    value
        .as_str()
        .and_then(normalize_date)
        .map(FieldValue::Text)
        .ok_or_else(|| mismatch(FieldType::Date, value))
}

fn coerce_time(value: &Value) -> Result<FieldValue, String> {
    value
        .as_str()
        .and_then(normalize_time)
        .map(FieldValue::Text)
        .ok_or_else(|| mismatch(FieldType::Time, value))
}
